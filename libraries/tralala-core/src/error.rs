/// Core error types for Tralala Player
use thiserror::Error;

/// Result type alias using `TralalaError`
pub type Result<T> = std::result::Result<T, TralalaError>;

/// Core error type for Tralala Player
#[derive(Error, Debug)]
pub enum TralalaError {
    /// The audio engine refused a command
    #[error("Engine rejected {command}: {reason}")]
    EngineRejected {
        /// Command name, e.g. `skip`
        command: &'static str,
        /// Reason given by the engine
        reason: String,
    },

    /// The audio engine is not set up or has gone away
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Remote configuration could not be fetched
    #[error("Remote config error: {0}")]
    RemoteConfig(String),
}

impl TralalaError {
    /// Create an engine rejection for the named command
    pub fn rejected(command: &'static str, reason: impl Into<String>) -> Self {
        Self::EngineRejected {
            command,
            reason: reason.into(),
        }
    }

    /// Create an engine unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::EngineUnavailable(msg.into())
    }

    /// Create a remote config error
    pub fn remote_config(msg: impl Into<String>) -> Self {
        Self::RemoteConfig(msg.into())
    }
}
