/// Engine-facing queue items, states, and push events
use serde::{Deserialize, Serialize};

use super::track::{Cover, Track};

/// A queue entry as handed to the audio engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineItem {
    /// Queue-unique identifier
    pub id: String,

    /// Media URL
    pub url: String,

    /// Title shown on the lock screen
    pub title: String,

    /// Lock screen artwork
    pub artwork: Cover,
}

impl EngineItem {
    /// Build the engine entry for the track at `index` of a queue
    ///
    /// Returns `None` for tracks without audio. The id combines position, title and
    /// URL so that repeated titles still get distinct queue entries.
    #[must_use]
    pub fn for_queue(index: usize, track: &Track) -> Option<Self> {
        let url = track.playable_url()?;
        Some(Self {
            id: format!("{index}:{}:{url}", track.title),
            url: url.to_string(),
            title: track.title.clone(),
            artwork: track.cover.clone(),
        })
    }
}

/// Playback state as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    /// Not set up or nothing queued
    #[default]
    None,
    /// Entry loaded, not started
    Ready,
    /// Fetching the entry
    Loading,
    /// Waiting for data mid-playback
    Buffering,
    /// Audible
    Playing,
    /// Paused by a command
    Paused,
    /// Stopped by a command
    Stopped,
    /// Current entry played to the end
    Ended,
    /// Playback failed
    Error,
}

impl EngineState {
    /// Only `Playing` counts as confirmed playback
    #[must_use]
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }
}

/// Controls the engine exposes to the OS (lock screen, headset, notification)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Start or resume
    Play,
    /// Pause
    Pause,
    /// Next entry
    SkipToNext,
    /// Previous entry
    SkipToPrevious,
    /// Stop and clear
    Stop,
    /// Jump within the entry
    SeekTo,
}

/// Capabilities the player registers at setup
pub const DEFAULT_CAPABILITIES: &[Capability] = &[
    Capability::Play,
    Capability::Pause,
    Capability::SkipToNext,
    Capability::SkipToPrevious,
    Capability::Stop,
];

/// Capabilities shown in the compact notification
pub const COMPACT_CAPABILITIES: &[Capability] = &[Capability::Play, Capability::Pause];

/// A control request coming from outside the app UI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum RemoteCommand {
    /// Play button
    Play,
    /// Pause button
    Pause,
    /// Next button
    Next,
    /// Previous button
    Previous,
    /// Position scrubbed on the lock screen
    Seek {
        /// Target position in seconds
        position: f64,
    },
}

/// Events pushed by the engine
///
/// Delivery is at-least-once and ordering relative to command completion is not
/// guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Engine playback state changed
    StateChanged {
        /// New state
        state: EngineState,
    },

    /// Engine moved to another queue entry (`None` when the queue was cleared)
    TrackChanged {
        /// Queue position of the new entry
        index: Option<usize>,
    },

    /// Last queue entry finished
    QueueEnded,

    /// Playback failed
    Error {
        /// Engine-provided description
        message: String,
    },

    /// Lock screen / headset control
    Remote(RemoteCommand),
}
