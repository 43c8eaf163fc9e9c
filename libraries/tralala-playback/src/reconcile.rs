//! Correlation between issued commands and engine events
//!
//! The engine reports track changes asynchronously, and a good share of them are
//! side effects of our own commands: rebuilding the queue walks through
//! intermediate entries, and a seek that lands near the end of a track can race the
//! engine's natural auto-advance. Two short-lived records let the orchestrator tell
//! those apart from genuine advances:
//!
//! - the suppression window (`Some(desired_index)`) swallows every track change
//!   until the engine arrives where we asked it to go
//! - the seek hold remembers the last seek for a short while so that an advance
//!   right after it can be undone
//!
//! Neither is render state; they never appear in the snapshot.

use std::time::Duration;
use tokio::time::Instant;

/// Last seek issued by the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SeekHold {
    pub at: Instant,
    pub target: f64,
}

/// Control-flow bookkeeping owned by the orchestrator
#[derive(Debug, Default)]
pub(crate) struct Correlation {
    /// Index the engine is expected to report next
    pub suppression: Option<usize>,
    pub seek_hold: Option<SeekHold>,
    /// Last accepted `toggle_play`
    pub last_toggle: Option<Instant>,
    /// Playing state captured when a scrub began
    pub resume_after_scrub: bool,
}

/// What to do with a `track-changed` event
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum TrackChange {
    /// Move the cursor
    Accept(usize),

    /// Ignore the event
    Discard(DiscardReason),

    /// Spurious auto-advance after a seek: put the engine back on `index` at `target`
    Reassert { index: usize, target: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DiscardReason {
    /// Event carried no index
    NoIndex,
    /// Engine re-reported the track we are already on
    AlreadyCurrent,
    /// Our own command sequence is still settling
    OwnCommand,
    /// Intermediate entry while the queue was rebuilt
    Intermediate,
    /// Index does not exist in the current playlist
    StaleIndex,
}

impl Correlation {
    /// Record a seek
    pub fn hold_seek(&mut self, target: f64, now: Instant) {
        self.seek_hold = Some(SeekHold { at: now, target });
    }

    /// Start expecting the engine to report `index`
    pub fn expect_index(&mut self, index: usize) {
        self.suppression = Some(index);
        self.seek_hold = None;
    }

    /// Drop suppression and seek hold
    pub fn clear(&mut self) {
        self.suppression = None;
        self.seek_hold = None;
    }

    /// The seek hold, if it is still inside `window`; expired holds are dropped
    pub fn active_hold(&mut self, now: Instant, window: Duration) -> Option<SeekHold> {
        match self.seek_hold {
            Some(hold) if now.saturating_duration_since(hold.at) <= window => Some(hold),
            Some(_) => {
                self.seek_hold = None;
                None
            }
            None => None,
        }
    }

    /// Classify a `track-changed(next)` event
    pub fn on_track_changed(
        &mut self,
        next: Option<usize>,
        current: Option<usize>,
        playlist_len: usize,
        now: Instant,
        hold_window: Duration,
    ) -> TrackChange {
        let Some(next) = next else {
            return TrackChange::Discard(DiscardReason::NoIndex);
        };

        let intentional = self.suppression == Some(next);
        if !intentional {
            if let Some(hold) = self.active_hold(now, hold_window) {
                if current == Some(next) {
                    return TrackChange::Discard(DiscardReason::AlreadyCurrent);
                }
                if self.suppression.is_some() {
                    return TrackChange::Discard(DiscardReason::OwnCommand);
                }
                return match current {
                    Some(index) => TrackChange::Reassert {
                        index,
                        target: hold.target,
                    },
                    None => TrackChange::Discard(DiscardReason::StaleIndex),
                };
            }
        }

        if let Some(desired) = self.suppression {
            if next != desired {
                return TrackChange::Discard(DiscardReason::Intermediate);
            }
            self.suppression = None;
        }

        if next < playlist_len {
            TrackChange::Accept(next)
        } else {
            TrackChange::Discard(DiscardReason::StaleIndex)
        }
    }
}

/// Clamp that tolerates an inverted range by collapsing onto `min`
pub(crate) fn clamp_secs(value: f64, min: f64, max: f64) -> f64 {
    value.min(max).max(min)
}
