//! Render-facing types for playback management

use serde::{Deserialize, Serialize};
use tralala_core::Track;

/// Conceptual player state, derived from the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackPhase {
    /// Nothing queued
    Idle,

    /// The UI asked to play and the engine has not confirmed yet
    Loading,

    /// Engine confirmed playback
    Playing,

    /// Track selected, not playing
    Paused,
}

/// Everything the UI renders against
///
/// Produced only by the orchestrator. `current_track` is always derived from
/// `playlist[current_index]`, so the two never disagree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Tracks of the active playlist, all playable
    pub playlist: Vec<Track>,

    /// Position of the current track in `playlist`
    pub current_index: Option<usize>,

    /// `playlist[current_index]`
    pub current_track: Option<Track>,

    /// Optimistic intent, set the moment the user taps
    pub ui_intends_to_play: bool,

    /// Playing as confirmed by the engine
    pub engine_confirmed_playing: bool,
}

impl PlayerSnapshot {
    /// Show the pause affordance?
    ///
    /// Intent and confirmation are combined so a tap flips the button immediately
    /// while the engine is still buffering.
    pub fn is_playing(&self) -> bool {
        self.ui_intends_to_play || self.engine_confirmed_playing
    }

    pub fn phase(&self) -> PlaybackPhase {
        if self.current_index.is_none() {
            PlaybackPhase::Idle
        } else if self.engine_confirmed_playing {
            PlaybackPhase::Playing
        } else if self.ui_intends_to_play {
            PlaybackPhase::Loading
        } else {
            PlaybackPhase::Paused
        }
    }
}

/// Why an operation sent nothing to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Another composite command is in flight
    Busy,

    /// Repeated tap inside the debounce window
    Debounced,

    /// No item had a usable URL
    NothingPlayable,

    /// Target index outside the playlist
    OutOfRange,

    /// Play already requested, engine has not confirmed yet
    AwaitingEngine,

    /// Nothing is queued
    NoTrack,
}

/// Result of an orchestrator operation
///
/// Operations never fail towards the UI; failures are rolled back locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub enum CommandOutcome {
    /// Commands were accepted by the engine
    Issued,

    /// Nothing was sent to the engine
    Skipped(SkipReason),

    /// The engine rejected a command and intent was rolled back
    RolledBack,
}

impl CommandOutcome {
    pub fn is_issued(self) -> bool {
        matches!(self, Self::Issued)
    }
}

/// Sampled playback position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Seconds into the current track
    pub position: f64,

    /// Track length in seconds, 0 when unknown
    pub duration: f64,
}
