//! Player startup lifecycle

use crate::{
    config::PlayerConfig,
    error::Result,
    favorites::Favorites,
    orchestrator::PlaybackOrchestrator,
    progress::{ProgressSampler, ScrubController},
    volume::{VolumeDebugInfo, VolumeLayer},
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;
use tralala_core::{AudioEngine, RemoteConfigSource, COMPACT_CAPABILITIES, DEFAULT_CAPABILITIES};

/// A running player: orchestrator, progress sampler, volume and favorites
///
/// Created once at app start with [`PlayerSession::start`].
pub struct PlayerSession {
    orchestrator: Arc<PlaybackOrchestrator>,
    progress: ProgressSampler,
    volume: VolumeLayer,
    favorites: Mutex<Favorites>,
}

impl PlayerSession {
    /// Set up the engine, start listening to it and apply the remote volume
    ///
    /// Engine setup is the only step that can fail; volume problems fall back to
    /// the defaults.
    pub async fn start(
        engine: Arc<dyn AudioEngine>,
        remote_config: &dyn RemoteConfigSource,
        config: PlayerConfig,
    ) -> Result<Self> {
        engine
            .setup(DEFAULT_CAPABILITIES, COMPACT_CAPABILITIES)
            .await?;
        info!("Audio engine ready");

        let sample_interval = config.scrub.sample_interval();
        let orchestrator = PlaybackOrchestrator::start(Arc::clone(&engine), config);
        let progress = ProgressSampler::spawn(&orchestrator, sample_interval);

        let volume = VolumeLayer::new();
        volume.load_and_apply(remote_config, engine.as_ref()).await;

        Ok(Self {
            orchestrator,
            progress,
            volume,
            favorites: Mutex::new(Favorites::new()),
        })
    }

    pub fn orchestrator(&self) -> &Arc<PlaybackOrchestrator> {
        &self.orchestrator
    }

    pub fn progress(&self) -> &ProgressSampler {
        &self.progress
    }

    pub fn volume(&self) -> &VolumeLayer {
        &self.volume
    }

    pub fn favorites(&self) -> &Mutex<Favorites> {
        &self.favorites
    }

    /// Scrub controller configured for this session
    pub fn scrub_controller(&self) -> ScrubController {
        ScrubController::new(self.orchestrator.config().scrub.clone())
    }

    pub async fn volume_debug_info(&self) -> VolumeDebugInfo {
        self.volume
            .debug_info(self.orchestrator.engine().as_ref())
            .await
    }

    /// Stop reacting to engine events
    pub fn shutdown(&self) {
        self.orchestrator.shutdown();
        info!("Player session shut down");
    }
}
