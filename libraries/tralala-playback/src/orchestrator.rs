//! Playback orchestrator - core state machine
//!
//! Owns the playlist, the cursor and the intent to play, drives the engine, and
//! reconciles the engine's push events against what was asked of it.

use crate::{
    config::PlayerConfig,
    reconcile::{clamp_secs, Correlation, TrackChange},
    types::{CommandOutcome, PlayerSnapshot, Progress, SkipReason},
};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use tralala_core::{
    AudioEngine, CatalogItem, Cover, EngineEvent, EngineItem, EngineState, RemoteCommand,
    Result as CoreResult, Track,
};

/// Render inputs
#[derive(Debug, Default)]
struct PlayerState {
    playlist: Vec<Track>,
    current_index: Option<usize>,
    ui_intends_to_play: bool,
    engine_confirmed_playing: bool,
}

impl PlayerState {
    fn load(&mut self, tracks: Vec<Track>, index: usize) {
        self.current_index = (index < tracks.len()).then_some(index);
        self.playlist = tracks;
    }

    fn set_current(&mut self, index: usize) {
        if index < self.playlist.len() {
            self.current_index = Some(index);
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            playlist: self.playlist.clone(),
            current_index: self.current_index,
            current_track: self
                .current_index
                .and_then(|index| self.playlist.get(index))
                .cloned(),
            ui_intends_to_play: self.ui_intends_to_play,
            engine_confirmed_playing: self.engine_confirmed_playing,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: PlayerState,
    control: Correlation,
}

/// Central playback orchestration
///
/// Shared as `Arc<PlaybackOrchestrator>` between the UI, the progress sampler and
/// the engine event listener. All mutation of the playlist, cursor and intent
/// happens here; everyone else reads snapshots.
///
/// At most one composite command (queue rebuild, skip, post-seek correction) is in
/// flight at a time. Requests arriving meanwhile are dropped rather than queued,
/// which turns a burst of taps into a single action. `stop` is the exception: it
/// waits its turn.
pub struct PlaybackOrchestrator {
    engine: Arc<dyn AudioEngine>,
    config: PlayerConfig,
    inner: Mutex<Inner>,
    command_lock: tokio::sync::Mutex<()>,
    snapshot_tx: watch::Sender<PlayerSnapshot>,
    subscription: Mutex<Option<EventSubscription>>,
}

impl PlaybackOrchestrator {
    /// Create an orchestrator that is not yet listening to engine events
    ///
    /// Events can be fed through [`Self::handle_event`]. Use [`Self::start`] to
    /// subscribe to the engine.
    pub fn new(engine: Arc<dyn AudioEngine>, config: PlayerConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(PlayerSnapshot::default());
        Self {
            engine,
            config,
            inner: Mutex::new(Inner::default()),
            command_lock: tokio::sync::Mutex::new(()),
            snapshot_tx,
            subscription: Mutex::new(None),
        }
    }

    /// Create an orchestrator and subscribe it to the engine's events
    ///
    /// Must be called from within a tokio runtime. The subscription lives as long
    /// as the orchestrator, or until [`Self::shutdown`].
    pub fn start(engine: Arc<dyn AudioEngine>, config: PlayerConfig) -> Arc<Self> {
        let events = engine.subscribe();
        let orchestrator = Arc::new(Self::new(engine, config));
        let subscription = EventSubscription::spawn(Arc::downgrade(&orchestrator), events);
        *orchestrator.subscription.lock() = Some(subscription);
        orchestrator
    }

    /// Stop listening to engine events
    pub fn shutdown(&self) {
        if self.subscription.lock().take().is_some() {
            debug!("Engine event subscription disposed");
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription
            .lock()
            .as_ref()
            .is_some_and(EventSubscription::is_active)
    }

    // ===== State =====

    /// Current render state
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.inner.lock().state.snapshot()
    }

    /// Receive a fresh snapshot after every state change
    pub fn watch(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.inner.lock().state.current_index
    }

    /// Whether a composite command is in flight
    pub fn is_busy(&self) -> bool {
        self.command_lock.try_lock().is_err()
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<dyn AudioEngine> {
        &self.engine
    }

    /// Mutate state and publish the resulting snapshot
    fn update<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let mut inner = self.inner.lock();
        let result = f(&mut inner);
        self.snapshot_tx.send_replace(inner.state.snapshot());
        result
    }

    fn roll_back(&self) {
        self.update(|inner| {
            inner.state.ui_intends_to_play = false;
            inner.control.suppression = None;
        });
    }

    // ===== Loading =====

    /// Replace the playlist with the playable entries of `items` and start playing
    ///
    /// `start_index` refers to `items` as the caller rendered them. Entries without
    /// a URL are dropped; if the chosen entry is one of them, the next playable
    /// entry starts instead (or the last one).
    ///
    /// The playlist, cursor and intent are updated before the engine is touched so
    /// the UI reflects the choice immediately.
    pub async fn play_from_list(
        &self,
        items: &[CatalogItem],
        start_index: usize,
        cover: Option<&Cover>,
    ) -> CommandOutcome {
        match build_playlist(items, start_index, cover) {
            Some((tracks, start)) => self.load_playlist(tracks, start).await,
            None => {
                warn!(
                    items = items.len(),
                    "play_from_list: no playable items, ignoring"
                );
                self.update(|inner| inner.state.ui_intends_to_play = false);
                CommandOutcome::Skipped(SkipReason::NothingPlayable)
            }
        }
    }

    /// Play a single track, or stop everything if it has no audio
    pub async fn play_single(&self, track: &Track) -> CommandOutcome {
        if !track.is_playable() {
            info!(title = %track.title, "Selected track has no audio, stopping");
            return self.stop().await;
        }
        let item = CatalogItem::from(track);
        self.play_from_list(std::slice::from_ref(&item), 0, None)
            .await
    }

    /// Track row tap
    ///
    /// Tapping the track that is already current toggles play/pause instead of
    /// rebuilding the queue.
    pub async fn select_track(
        &self,
        items: &[CatalogItem],
        index: usize,
        cover: Option<&Cover>,
    ) -> CommandOutcome {
        let Some((tracks, start)) = build_playlist(items, index, cover) else {
            return self.play_from_list(items, index, cover).await;
        };

        let same_track = {
            let inner = self.inner.lock();
            inner.state.current_index == Some(start) && inner.state.playlist == tracks
        };
        if same_track {
            debug!(index = start, "Current track tapped again, toggling");
            return self.toggle_play().await;
        }

        self.load_playlist(tracks, start).await
    }

    async fn load_playlist(&self, tracks: Vec<Track>, start: usize) -> CommandOutcome {
        let Ok(_guard) = self.command_lock.try_lock() else {
            debug!("load: command in flight, dropping request");
            return CommandOutcome::Skipped(SkipReason::Busy);
        };

        let queue: Vec<EngineItem> = tracks
            .iter()
            .enumerate()
            .filter_map(|(index, track)| EngineItem::for_queue(index, track))
            .collect();
        info!(tracks = queue.len(), start, "Loading playlist");

        self.update(|inner| {
            inner.state.load(tracks, start);
            inner.state.ui_intends_to_play = true;
            // Rebuilding the queue makes the engine report every entry it passes
            inner.control.expect_index(start);
        });

        match self.rebuild_queue(queue, start).await {
            Ok(()) => CommandOutcome::Issued,
            Err(e) => {
                warn!(error = %e, "Failed to load playlist");
                self.roll_back();
                CommandOutcome::RolledBack
            }
        }
    }

    async fn rebuild_queue(&self, queue: Vec<EngineItem>, start: usize) -> CoreResult<()> {
        self.engine.reset().await?;
        self.engine.add(queue).await?;
        self.engine.skip(start).await?;
        self.engine.play().await
    }

    /// Clear the playlist and reset the engine
    ///
    /// The UI is cleared at once. The reset itself waits for any load or skip in
    /// flight, so the engine never ends up playing a queue that was thrown away.
    pub async fn stop(&self) -> CommandOutcome {
        self.update(|inner| {
            inner.state.clear();
            inner.control.clear();
            inner.control.resume_after_scrub = false;
        });

        let _guard = self.command_lock.lock().await;
        match self.engine.reset().await {
            Ok(()) => CommandOutcome::Issued,
            Err(e) => {
                warn!(error = %e, "Failed to reset engine");
                CommandOutcome::RolledBack
            }
        }
    }

    // ===== Playback Control =====

    /// Play/pause button
    ///
    /// Calls within the debounce window of the previous one are ignored. If play
    /// was already requested and the engine is still getting there, nothing is
    /// sent.
    pub async fn toggle_play(&self) -> CommandOutcome {
        let now = Instant::now();
        let debounce = self.config.orchestrator.toggle_debounce();
        {
            let mut inner = self.inner.lock();
            if let Some(last) = inner.control.last_toggle {
                if now.saturating_duration_since(last) < debounce {
                    debug!("toggle_play: debounced");
                    return CommandOutcome::Skipped(SkipReason::Debounced);
                }
            }
            inner.control.last_toggle = Some(now);
            if inner.state.current_index.is_none() {
                return CommandOutcome::Skipped(SkipReason::NoTrack);
            }
        }

        let engine_state = match self.engine.state().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "toggle_play: could not read engine state");
                self.roll_back();
                return CommandOutcome::RolledBack;
            }
        };

        let intends = self.update(|inner| {
            inner.state.engine_confirmed_playing = engine_state.is_playing();
            inner.state.ui_intends_to_play
        });

        if engine_state.is_playing() {
            self.pause().await
        } else if intends {
            debug!(state = ?engine_state, "toggle_play: play already requested");
            CommandOutcome::Skipped(SkipReason::AwaitingEngine)
        } else {
            self.resume().await
        }
    }

    /// Pause and drop the intent to play
    pub async fn pause(&self) -> CommandOutcome {
        self.update(|inner| inner.state.ui_intends_to_play = false);
        match self.engine.pause().await {
            Ok(()) => CommandOutcome::Issued,
            Err(e) => {
                warn!(error = %e, "Failed to pause");
                CommandOutcome::RolledBack
            }
        }
    }

    /// Resume the current track
    pub async fn resume(&self) -> CommandOutcome {
        let has_track = self.update(|inner| {
            let has_track = inner.state.current_index.is_some();
            if has_track {
                inner.state.ui_intends_to_play = true;
            }
            has_track
        });
        if !has_track {
            return CommandOutcome::Skipped(SkipReason::NoTrack);
        }

        match self.engine.play().await {
            Ok(()) => CommandOutcome::Issued,
            Err(e) => {
                warn!(error = %e, "Failed to play");
                self.roll_back();
                CommandOutcome::RolledBack
            }
        }
    }

    /// Skip to next track; no-op on the last one
    pub async fn skip_next(&self) -> CommandOutcome {
        match self.current_index() {
            Some(current) => self.skip_to(current + 1).await,
            None => CommandOutcome::Skipped(SkipReason::NoTrack),
        }
    }

    /// Go to previous track
    ///
    /// If more than the restart threshold into the current track, restarts it
    /// instead. The first track restarts as well.
    pub async fn skip_previous(&self) -> CommandOutcome {
        let Some(current) = self.current_index() else {
            return CommandOutcome::Skipped(SkipReason::NoTrack);
        };

        let position = match self.engine.position().await {
            Ok(position) => position,
            Err(e) => {
                debug!(error = %e, "skip_previous: position unavailable, assuming start");
                0.0
            }
        };

        if position > self.config.orchestrator.restart_threshold_secs || current == 0 {
            debug!(position, "skip_previous: restarting current track");
            return match self.engine.seek_to(0.0).await {
                Ok(()) => CommandOutcome::Issued,
                Err(e) => {
                    warn!(error = %e, "Failed to restart track");
                    CommandOutcome::RolledBack
                }
            };
        }

        self.skip_to(current - 1).await
    }

    async fn skip_to(&self, target: usize) -> CommandOutcome {
        if target >= self.inner.lock().state.playlist.len() {
            debug!(target, "skip: index out of range");
            return CommandOutcome::Skipped(SkipReason::OutOfRange);
        }

        let Ok(_guard) = self.command_lock.try_lock() else {
            debug!(target, "skip: command in flight, dropping request");
            return CommandOutcome::Skipped(SkipReason::Busy);
        };

        self.update(|inner| {
            inner.state.ui_intends_to_play = true;
            inner.control.expect_index(target);
        });

        match self.skip_and_play(target).await {
            Ok(()) => CommandOutcome::Issued,
            Err(e) => {
                warn!(target, error = %e, "Failed to skip");
                self.roll_back();
                CommandOutcome::RolledBack
            }
        }
    }

    async fn skip_and_play(&self, target: usize) -> CoreResult<()> {
        self.engine.skip(target).await?;
        self.engine.play().await
    }

    // ===== Seek =====

    /// Seek within the current track
    pub async fn seek(&self, seconds: f64) -> CommandOutcome {
        if self.current_index().is_none() {
            return CommandOutcome::Skipped(SkipReason::NoTrack);
        }
        if !seconds.is_finite() {
            return CommandOutcome::Skipped(SkipReason::OutOfRange);
        }

        let duration = self.duration_or_unknown().await;
        let target = if duration > 0.0 {
            seconds.clamp(0.0, duration)
        } else {
            seconds.max(0.0)
        };
        self.seek_with_hold(target).await
    }

    /// A scrub gesture started: pause and remember whether we were playing
    pub async fn begin_scrub(&self) -> CommandOutcome {
        let has_track = self.update(|inner| {
            inner.control.resume_after_scrub =
                inner.state.ui_intends_to_play || inner.state.engine_confirmed_playing;
            inner.state.ui_intends_to_play = false;
            inner.state.current_index.is_some()
        });
        if !has_track {
            return CommandOutcome::Skipped(SkipReason::NoTrack);
        }

        match self.engine.pause().await {
            Ok(()) => CommandOutcome::Issued,
            Err(e) => {
                warn!(error = %e, "Failed to pause for scrub");
                CommandOutcome::RolledBack
            }
        }
    }

    /// A scrub gesture ended at `final_seconds`
    ///
    /// The target is kept away from the very end of the track so the engine does
    /// not immediately auto-advance. Playback resumes only if it was playing when
    /// the scrub began.
    pub async fn end_scrub(&self, final_seconds: f64) -> CommandOutcome {
        let resume = std::mem::take(&mut self.inner.lock().control.resume_after_scrub);
        if self.current_index().is_none() {
            return CommandOutcome::Skipped(SkipReason::NoTrack);
        }

        let duration = self.duration_or_unknown().await;
        let target = self.scrub_target(final_seconds, duration);

        let outcome = self.seek_with_hold(target).await;
        if !resume || !outcome.is_issued() {
            return outcome;
        }
        self.resume().await
    }

    /// Where a scrub released at `final_seconds` lands on a track of `duration`
    pub fn scrub_target(&self, final_seconds: f64, duration: f64) -> f64 {
        let scrub = &self.config.scrub;
        let requested = if final_seconds.is_finite() {
            final_seconds
        } else {
            0.0
        };
        if duration > 0.0 {
            clamp_secs(
                requested,
                scrub.min_start_secs,
                duration - scrub.end_gap(duration),
            )
        } else {
            requested.max(scrub.min_start_secs)
        }
    }

    async fn seek_with_hold(&self, target: f64) -> CommandOutcome {
        self.inner.lock().control.hold_seek(target, Instant::now());
        debug!(target, "Seeking");

        match self.engine.seek_to(target).await {
            Ok(()) => CommandOutcome::Issued,
            Err(e) => {
                warn!(target, error = %e, "Failed to seek");
                self.update(|inner| {
                    inner.state.ui_intends_to_play = false;
                    inner.control.seek_hold = None;
                });
                CommandOutcome::RolledBack
            }
        }
    }

    async fn duration_or_unknown(&self) -> f64 {
        match self.engine.duration().await {
            Ok(duration) if duration.is_finite() => duration,
            Ok(_) => 0.0,
            Err(e) => {
                debug!(error = %e, "Duration unavailable");
                0.0
            }
        }
    }

    /// Sample position and duration from the engine
    pub async fn progress(&self) -> CoreResult<Progress> {
        let position = self.engine.position().await?;
        let duration = self.engine.duration().await?;
        Ok(Progress { position, duration })
    }

    // ===== Engine Events =====

    /// Reconcile one engine event
    pub async fn handle_event(&self, event: EngineEvent) {
        match event {
            EngineEvent::StateChanged { state } => self.on_state_changed(state),
            EngineEvent::TrackChanged { index } => self.on_track_changed(index).await,
            EngineEvent::QueueEnded => self.on_queue_ended(),
            EngineEvent::Error { message } => self.on_engine_error(&message),
            EngineEvent::Remote(command) => {
                let outcome = self.on_remote(command).await;
                debug!(?command, ?outcome, "Remote command handled");
            }
        }
    }

    fn on_state_changed(&self, state: EngineState) {
        if state == EngineState::Error {
            self.on_engine_error("engine entered error state");
            return;
        }
        self.update(|inner| inner.state.engine_confirmed_playing = state.is_playing());
    }

    async fn on_track_changed(&self, index: Option<usize>) {
        let now = Instant::now();
        let hold_window = self.config.orchestrator.seek_hold();

        let decision = self.update(|inner| {
            let decision = inner.control.on_track_changed(
                index,
                inner.state.current_index,
                inner.state.playlist.len(),
                now,
                hold_window,
            );
            if let TrackChange::Accept(next) = decision {
                inner.state.set_current(next);
            }
            decision
        });

        match decision {
            TrackChange::Accept(next) => debug!(index = next, "Track changed"),
            TrackChange::Discard(reason) => {
                debug!(?index, ?reason, "Ignoring track change");
            }
            TrackChange::Reassert { index, target } => {
                self.reassert_after_seek(index, target).await;
            }
        }
    }

    /// Undo an auto-advance triggered by seeking close to the end of a track
    async fn reassert_after_seek(&self, index: usize, target: f64) {
        let Ok(_guard) = self.command_lock.try_lock() else {
            debug!(index, "Auto-advance after seek while busy, leaving it");
            return;
        };
        info!(index, target, "Engine advanced right after a seek, restoring track");

        match self.restore_position(index, target).await {
            Ok(()) => self.update(|inner| inner.state.ui_intends_to_play = true),
            Err(e) => {
                warn!(error = %e, "Failed to restore track after seek");
                self.roll_back();
            }
        }
    }

    async fn restore_position(&self, index: usize, target: f64) -> CoreResult<()> {
        self.engine.skip(index).await?;
        let duration = self.engine.duration().await?;
        let settings = &self.config.orchestrator;
        let position = if duration > 0.0 {
            clamp_secs(
                target,
                settings.reseek_min_secs,
                duration - settings.reseek_end_guard_secs,
            )
        } else {
            target.max(settings.reseek_min_secs)
        };
        self.engine.seek_to(position).await?;
        self.engine.play().await
    }

    fn on_queue_ended(&self) {
        info!("Queue ended");
        self.update(|inner| {
            inner.control.suppression = None;
            inner.state.ui_intends_to_play = false;
            inner.state.engine_confirmed_playing = false;
        });
    }

    fn on_engine_error(&self, message: &str) {
        warn!(error = message, "Engine playback error");
        self.update(|inner| {
            inner.control.clear();
            inner.state.ui_intends_to_play = false;
            inner.state.engine_confirmed_playing = false;
        });
    }

    async fn on_remote(&self, command: RemoteCommand) -> CommandOutcome {
        match command {
            RemoteCommand::Play => self.resume().await,
            RemoteCommand::Pause => self.pause().await,
            RemoteCommand::Next => self.skip_next().await,
            RemoteCommand::Previous => self.skip_previous().await,
            RemoteCommand::Seek { position } => self.seek(position).await,
        }
    }
}

/// Playable tracks of `items` in order, plus the remapped start index
fn build_playlist(
    items: &[CatalogItem],
    start_index: usize,
    cover: Option<&Cover>,
) -> Option<(Vec<Track>, usize)> {
    let mut tracks = Vec::with_capacity(items.len());
    let mut start = None;

    for (index, item) in items.iter().enumerate() {
        if !item.is_playable() {
            continue;
        }
        if start.is_none() && index >= start_index {
            start = Some(tracks.len());
        }
        tracks.push(item.to_track(cover));
    }

    let last = tracks.len().checked_sub(1)?;
    Some((tracks, start.unwrap_or(last)))
}

/// Engine event listener owned by the orchestrator
///
/// The task only holds a weak reference, so it never keeps the orchestrator
/// alive. Dropping the subscription aborts the task.
pub struct EventSubscription {
    handle: JoinHandle<()>,
}

impl EventSubscription {
    fn spawn(
        orchestrator: Weak<PlaybackOrchestrator>,
        mut events: broadcast::Receiver<EngineEvent>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let Some(orchestrator) = orchestrator.upgrade() else {
                            break;
                        };
                        orchestrator.handle_event(event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Engine events lagged, some were dropped");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Engine event stream closed");
                        break;
                    }
                }
            }
        });
        Self { handle }
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, url: &str) -> CatalogItem {
        CatalogItem::new(title, url)
    }

    #[test]
    fn build_playlist_drops_items_without_url() {
        let items = vec![
            item("A", "https://cdn/a.mp3"),
            item("B", ""),
            item("C", "https://cdn/c.mp3"),
        ];
        let (tracks, start) = build_playlist(&items, 2, None).unwrap();
        let titles: Vec<_> = tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["A", "C"]);
        assert_eq!(start, 1);
    }

    #[test]
    fn build_playlist_moves_past_unplayable_start() {
        let items = vec![
            item("A", "https://cdn/a.mp3"),
            item("B", " "),
            item("C", "https://cdn/c.mp3"),
        ];
        let (_, start) = build_playlist(&items, 1, None).unwrap();
        assert_eq!(start, 1);

        let items = vec![item("A", "https://cdn/a.mp3"), item("B", "")];
        let (_, start) = build_playlist(&items, 1, None).unwrap();
        assert_eq!(start, 0);
    }

    #[test]
    fn build_playlist_with_nothing_playable() {
        assert!(build_playlist(&[item("A", ""), item("B", "")], 0, None).is_none());
        assert!(build_playlist(&[], 0, None).is_none());
    }

    #[test]
    fn state_snapshot_derives_current_track() {
        let mut state = PlayerState::default();
        let tracks = vec![
            Track::new("A", "https://cdn/a.mp3", Cover::Asset(1)),
            Track::new("B", "https://cdn/b.mp3", Cover::Asset(1)),
        ];
        state.load(tracks.clone(), 1);
        assert_eq!(state.snapshot().current_track, Some(tracks[1].clone()));

        state.set_current(7);
        assert_eq!(state.current_index, Some(1));

        state.clear();
        let snapshot = state.snapshot();
        assert!(snapshot.current_index.is_none() && snapshot.current_track.is_none());
    }
}
