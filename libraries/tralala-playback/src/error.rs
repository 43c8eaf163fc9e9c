//! Error types for playback management

use thiserror::Error;
use tralala_core::TralalaError;

/// Playback errors
///
/// These never reach the UI from the orchestrator operations, which roll back and
/// report a [`crate::CommandOutcome`] instead. They surface from startup and config
/// loading.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Engine or remote collaborator failure
    #[error(transparent)]
    Core(#[from] TralalaError),

    /// Local configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for PlaybackError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
