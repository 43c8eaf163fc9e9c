//! Tralala Player - Playback Orchestration
//!
//! Drives an asynchronous audio engine on behalf of a children's music player.
//!
//! This crate provides:
//! - Playlist loading from catalog items, dropping entries without audio
//! - Play/pause with optimistic intent and a debounce for repeated taps
//! - Next/previous with the "restart if past 3 s" rule
//! - Reconciliation of engine events against the commands that caused them
//! - Scrub gestures with pause-during-drag and resume-after-release
//! - Remote-configured volume normalization
//!
//! # Architecture
//!
//! The engine is a collaborator behind [`tralala_core::AudioEngine`]. Commands are
//! accepted asynchronously and events may arrive out of order, so the
//! [`PlaybackOrchestrator`] is the only owner of playlist, cursor and intent. The
//! UI reads [`PlayerSnapshot`]s and never mutates state directly.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tralala_core::{AudioEngine, CatalogItem, Cover, RemoteConfigSource};
//! use tralala_playback::{PlayerConfig, PlayerSession};
//!
//! async fn run(
//!     engine: Arc<dyn AudioEngine>,
//!     settings: &dyn RemoteConfigSource,
//! ) -> tralala_playback::Result<()> {
//!     let session = PlayerSession::start(engine, settings, PlayerConfig::default()).await?;
//!     let player = session.orchestrator();
//!
//!     let album = vec![
//!         CatalogItem::new("Twinkle Twinkle", "https://cdn.example.com/twinkle.mp3"),
//!         CatalogItem::new("Coming soon", ""),
//!         CatalogItem::new("Baa Baa", "https://cdn.example.com/baa.mp3"),
//!     ];
//!     let _ = player.play_from_list(&album, 0, Some(&Cover::Asset(1))).await;
//!
//!     let snapshot = player.snapshot();
//!     assert_eq!(snapshot.playlist.len(), 2);
//!
//!     let _ = player.toggle_play().await;
//!     Ok(())
//! }
//! ```

pub mod config;
mod error;
pub mod favorites;
mod orchestrator;
pub mod progress;
mod reconcile;
mod session;
pub mod types;
pub mod volume;

// Public exports
pub use config::{OrchestratorSettings, PlayerConfig, ScrubSettings};
pub use error::{PlaybackError, Result};
pub use favorites::Favorites;
pub use orchestrator::{EventSubscription, PlaybackOrchestrator};
pub use progress::{format_clock, ProgressSampler, ScrubAction, ScrubController, TrackGeometry};
pub use session::PlayerSession;
pub use types::{CommandOutcome, PlaybackPhase, PlayerSnapshot, Progress, SkipReason};
pub use volume::{VolumeDebugInfo, VolumeLayer, VolumeSettings};
