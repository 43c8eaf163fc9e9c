/// Player tunables
///
/// The windows and gaps below were found empirically against real engines on
/// phones; they are configurable rather than derived.
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_orchestrator")]
    pub orchestrator: OrchestratorSettings,

    #[serde(default = "default_scrub")]
    pub scrub: ScrubSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrchestratorSettings {
    /// Repeated `toggle_play` calls inside this window are ignored
    #[serde(default = "default_toggle_debounce_ms")]
    pub toggle_debounce_ms: u64,

    /// How long after a seek a track change is suspected to be an auto-advance
    #[serde(default = "default_seek_hold_ms")]
    pub seek_hold_ms: u64,

    /// Past this position, "previous" restarts the current track
    #[serde(default = "default_restart_threshold_secs")]
    pub restart_threshold_secs: f64,

    /// Lowest position a corrective re-seek lands on
    #[serde(default = "default_min_start_secs")]
    pub reseek_min_secs: f64,

    /// Distance from the end a corrective re-seek keeps
    #[serde(default = "default_reseek_end_guard_secs")]
    pub reseek_end_guard_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScrubSettings {
    /// Position sampling interval
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// Lowest position a scrub lands on
    #[serde(default = "default_min_start_secs")]
    pub min_start_secs: f64,

    /// Minimum distance a scrub keeps from the end of the track
    #[serde(default = "default_end_gap_min_secs")]
    pub end_gap_min_secs: f64,

    /// Distance from the end as a fraction of the duration (larger of the two wins)
    #[serde(default = "default_end_gap_ratio")]
    pub end_gap_ratio: f64,

    /// Seek while the knob is still being dragged
    #[serde(default)]
    pub live_seek: bool,

    #[serde(default = "default_live_throttle_ms")]
    pub live_throttle_ms: u64,

    /// How long the knob stays at the released target while the engine catches up
    #[serde(default = "default_display_hold_ms")]
    pub display_hold_ms: u64,

    #[serde(default = "default_release_tolerance_secs")]
    pub release_tolerance_secs: f64,

    #[serde(default = "default_knob_size")]
    pub knob_size: f64,
}

impl PlayerConfig {
    /// Load configuration from an optional TOML file and the environment
    ///
    /// Environment variables use the `TRALALA` prefix and `__` between sections,
    /// e.g. `TRALALA__ORCHESTRATOR__SEEK_HOLD_MS=1200`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if path.exists() {
                settings = settings.add_source(config::File::from(path));
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("TRALALA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings.build()?;
        Ok(config.try_deserialize()?)
    }
}

impl OrchestratorSettings {
    pub fn toggle_debounce(&self) -> Duration {
        Duration::from_millis(self.toggle_debounce_ms)
    }

    pub fn seek_hold(&self) -> Duration {
        Duration::from_millis(self.seek_hold_ms)
    }
}

impl ScrubSettings {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn live_throttle(&self) -> Duration {
        Duration::from_millis(self.live_throttle_ms)
    }

    pub fn display_hold(&self) -> Duration {
        Duration::from_millis(self.display_hold_ms)
    }

    /// Trailing gap reserved at the end of a track of `duration` seconds
    pub fn end_gap(&self, duration: f64) -> f64 {
        self.end_gap_min_secs.max(duration * self.end_gap_ratio)
    }
}

// Default values
fn default_orchestrator() -> OrchestratorSettings {
    OrchestratorSettings {
        toggle_debounce_ms: default_toggle_debounce_ms(),
        seek_hold_ms: default_seek_hold_ms(),
        restart_threshold_secs: default_restart_threshold_secs(),
        reseek_min_secs: default_min_start_secs(),
        reseek_end_guard_secs: default_reseek_end_guard_secs(),
    }
}

fn default_toggle_debounce_ms() -> u64 {
    250
}

fn default_seek_hold_ms() -> u64 {
    900
}

fn default_restart_threshold_secs() -> f64 {
    3.0
}

fn default_min_start_secs() -> f64 {
    0.05
}

fn default_reseek_end_guard_secs() -> f64 {
    2.0
}

fn default_scrub() -> ScrubSettings {
    ScrubSettings {
        sample_interval_ms: default_sample_interval_ms(),
        min_start_secs: default_min_start_secs(),
        end_gap_min_secs: default_end_gap_min_secs(),
        end_gap_ratio: default_end_gap_ratio(),
        live_seek: false,
        live_throttle_ms: default_live_throttle_ms(),
        display_hold_ms: default_display_hold_ms(),
        release_tolerance_secs: default_release_tolerance_secs(),
        knob_size: default_knob_size(),
    }
}

fn default_sample_interval_ms() -> u64 {
    250
}

fn default_end_gap_min_secs() -> f64 {
    8.0
}

fn default_end_gap_ratio() -> f64 {
    0.1
}

fn default_live_throttle_ms() -> u64 {
    120
}

fn default_display_hold_ms() -> u64 {
    700
}

fn default_release_tolerance_secs() -> f64 {
    0.5
}

fn default_knob_size() -> f64 {
    20.0
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            orchestrator: default_orchestrator(),
            scrub: default_scrub(),
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        default_orchestrator()
    }
}

impl Default for ScrubSettings {
    fn default() -> Self {
        default_scrub()
    }
}
