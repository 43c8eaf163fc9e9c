/// Collaborator traits for Tralala Player
use crate::error::Result;
use crate::types::{Capability, EngineEvent, EngineItem, EngineState, SettingRow};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Asynchronous audio engine
///
/// Implemented by the host on top of the native media pipeline. Every command
/// resolves once the engine has *accepted* it, not once it is audible, and commands
/// issued back to back are not serialized by the engine itself.
///
/// State changes reach the caller through [`AudioEngine::subscribe`], possibly out of
/// order with respect to command completion.
#[async_trait]
pub trait AudioEngine: Send + Sync {
    /// One-time setup, registering the controls exposed to the OS
    async fn setup(&self, capabilities: &[Capability], compact: &[Capability]) -> Result<()>;

    /// Append items to the engine queue
    async fn add(&self, items: Vec<EngineItem>) -> Result<()>;

    /// Stop playback and clear the engine queue
    async fn reset(&self) -> Result<()>;

    /// Jump to the queue entry at `index`
    async fn skip(&self, index: usize) -> Result<()>;

    /// Start or resume playback
    async fn play(&self) -> Result<()>;

    /// Pause playback
    async fn pause(&self) -> Result<()>;

    /// Seek within the current entry
    async fn seek_to(&self, seconds: f64) -> Result<()>;

    /// Current position in seconds
    async fn position(&self) -> Result<f64>;

    /// Duration of the current entry in seconds (0 when unknown)
    async fn duration(&self) -> Result<f64>;

    /// Current engine state
    async fn state(&self) -> Result<EngineState>;

    /// Set output volume (0.0 - 1.0)
    async fn set_volume(&self, volume: f64) -> Result<()>;

    /// Current output volume
    async fn volume(&self) -> Result<f64>;

    /// Subscribe to engine push events
    fn subscribe(&self) -> broadcast::Receiver<EngineEvent>;
}

/// Remote key/value settings store
#[async_trait]
pub trait RemoteConfigSource: Send + Sync {
    /// Fetch the rows for the given keys; missing keys are simply absent
    async fn fetch_settings(&self, keys: Vec<String>) -> Result<Vec<SettingRow>>;
}
