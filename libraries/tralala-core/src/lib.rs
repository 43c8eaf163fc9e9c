//! Tralala Player Core
//!
//! Platform-agnostic core types, traits, and error handling for Tralala Player.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `Cover`, `CatalogItem`, and the engine-facing
//!   `EngineItem`, `EngineState`, `EngineEvent`
//! - **Core Traits**: `AudioEngine` (native media playback) and `RemoteConfigSource`
//!   (remote app settings)
//! - **Error Handling**: Unified `TralalaError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use tralala_core::{CatalogItem, Cover, EngineItem};
//!
//! let item = CatalogItem::new("Twinkle Twinkle", "https://cdn.example.com/twinkle.mp3");
//! let track = item.to_track(Some(&Cover::Asset(1)));
//!
//! let queued = EngineItem::for_queue(0, &track).unwrap();
//! assert_eq!(queued.title, "Twinkle Twinkle");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{Result, TralalaError};
pub use traits::{AudioEngine, RemoteConfigSource};

pub use types::{
    find_setting, Capability, CatalogItem, Cover, EngineEvent, EngineItem, EngineState,
    RemoteCommand, SettingRow, Track, COMPACT_CAPABILITIES, DEFAULT_CAPABILITIES,
};
