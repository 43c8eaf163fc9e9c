//! Remote-configured volume normalization
//!
//! The maximum output volume is managed remotely so it can be tuned without a
//! release. Three keys are read from the settings table:
//!
//! - `max_volume`: ceiling in 0-1, or a percentage when greater than 1
//! - `volume_curve`: exponent (1-5) applied to the ceiling
//! - `volume_debug`: any value > 0 enables verbose volume logging
//!
//! The engine volume is `max_volume ^ volume_curve`.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use tralala_core::{find_setting, AudioEngine, RemoteConfigSource, SettingRow};

pub const MAX_VOLUME_KEY: &str = "max_volume";
pub const VOLUME_CURVE_KEY: &str = "volume_curve";
pub const VOLUME_DEBUG_KEY: &str = "volume_debug";

pub const DEFAULT_MAX_VOLUME: f64 = 0.7;
pub const DEFAULT_VOLUME_CURVE: f64 = 1.0;

const MAX_VOLUME_CURVE: f64 = 5.0;

/// Normalized volume settings plus the raw values they came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeSettings {
    max_volume: f64,
    curve: f64,
    debug_enabled: bool,
    raw_max_volume: Value,
    raw_curve: Value,
    raw_debug: Value,
    loaded_at: Option<DateTime<Utc>>,
}

impl VolumeSettings {
    /// Normalize the rows fetched from the settings table
    pub fn from_rows(rows: &[SettingRow], loaded_at: DateTime<Utc>) -> Self {
        let raw = |key| find_setting(rows, key).cloned().unwrap_or(Value::Null);
        let raw_max_volume = raw(MAX_VOLUME_KEY);
        let raw_curve = raw(VOLUME_CURVE_KEY);
        let raw_debug = raw(VOLUME_DEBUG_KEY);

        Self {
            max_volume: normalize_max_volume(&raw_max_volume),
            curve: normalize_volume_curve(&raw_curve),
            debug_enabled: normalize_debug_flag(&raw_debug),
            raw_max_volume,
            raw_curve,
            raw_debug,
            loaded_at: Some(loaded_at),
        }
    }

    /// Defaults, stamped as loaded at `loaded_at`
    fn fallback(loaded_at: DateTime<Utc>) -> Self {
        Self {
            loaded_at: Some(loaded_at),
            ..Self::default()
        }
    }

    /// Base ceiling, 0-1
    pub fn max_volume(&self) -> f64 {
        self.max_volume
    }

    pub fn curve(&self) -> f64 {
        self.curve
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug_enabled
    }

    pub fn raw_max_volume(&self) -> &Value {
        &self.raw_max_volume
    }

    pub fn raw_curve(&self) -> &Value {
        &self.raw_curve
    }

    /// When the remote values were last fetched, `None` before the first load
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    /// Volume handed to the engine
    pub fn effective(&self) -> f64 {
        self.max_volume.powf(self.curve)
    }
}

impl Default for VolumeSettings {
    fn default() -> Self {
        Self {
            max_volume: DEFAULT_MAX_VOLUME,
            curve: DEFAULT_VOLUME_CURVE,
            debug_enabled: false,
            raw_max_volume: Value::Null,
            raw_curve: Value::Null,
            raw_debug: Value::Null,
            loaded_at: None,
        }
    }
}

/// Snapshot for a developer overlay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeDebugInfo {
    pub raw: Value,
    pub normalized: f64,
    pub effective: f64,
    /// Volume reported by the engine, if it answered
    pub engine: Option<f64>,
    pub debug_enabled: bool,
    pub debug_raw: Value,
    pub curve: f64,
    pub curve_raw: Value,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Owner of the current volume settings
///
/// Defaults are active from construction until the first [`VolumeLayer::load`]
/// completes.
#[derive(Debug, Default)]
pub struct VolumeLayer {
    settings: Mutex<VolumeSettings>,
}

impl VolumeLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current settings
    pub fn get(&self) -> VolumeSettings {
        self.settings.lock().clone()
    }

    pub fn effective(&self) -> f64 {
        self.settings.lock().effective()
    }

    /// Fetch and normalize the remote settings
    ///
    /// A failed fetch restores the defaults.
    pub async fn load(&self, source: &dyn RemoteConfigSource) -> VolumeSettings {
        let keys = vec![
            MAX_VOLUME_KEY.to_string(),
            VOLUME_DEBUG_KEY.to_string(),
            VOLUME_CURVE_KEY.to_string(),
        ];

        let settings = match source.fetch_settings(keys).await {
            Ok(rows) => {
                let settings = VolumeSettings::from_rows(&rows, Utc::now());
                info!(
                    raw = %settings.raw_max_volume,
                    max_volume = settings.max_volume,
                    raw_curve = %settings.raw_curve,
                    curve = settings.curve,
                    "Loaded volume settings"
                );
                settings
            }
            Err(e) => {
                warn!(error = %e, "Failed to load volume settings, using defaults");
                VolumeSettings::fallback(Utc::now())
            }
        };

        *self.settings.lock() = settings.clone();
        settings
    }

    /// Push the effective volume to the engine
    ///
    /// Failures are logged; the settings are kept either way.
    pub async fn apply(&self, engine: &dyn AudioEngine) {
        let settings = self.get();
        let effective = settings.effective();

        if let Err(e) = engine.set_volume(effective).await {
            warn!(error = %e, effective, "Failed to apply volume");
            return;
        }

        if settings.debug_enabled {
            match engine.volume().await {
                Ok(current) => info!(
                    effective,
                    current,
                    base = settings.max_volume,
                    curve = settings.curve,
                    "Volume applied"
                ),
                Err(e) => info!(effective, error = %e, "Volume applied, read-back failed"),
            }
        } else {
            debug!(effective, "Volume applied");
        }
    }

    pub async fn load_and_apply(
        &self,
        source: &dyn RemoteConfigSource,
        engine: &dyn AudioEngine,
    ) -> VolumeSettings {
        let settings = self.load(source).await;
        self.apply(engine).await;
        settings
    }

    pub async fn debug_info(&self, engine: &dyn AudioEngine) -> VolumeDebugInfo {
        let settings = self.get();
        let engine_volume = engine.volume().await.ok();

        VolumeDebugInfo {
            effective: settings.effective(),
            raw: settings.raw_max_volume,
            normalized: settings.max_volume,
            engine: engine_volume,
            debug_enabled: settings.debug_enabled,
            debug_raw: settings.raw_debug,
            curve: settings.curve,
            curve_raw: settings.raw_curve,
            loaded_at: settings.loaded_at,
        }
    }
}

/// Read a loosely typed setting as a finite number
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            // Blank means unset and falls back to the default, never 0 (silence)
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    number.filter(|n| n.is_finite())
}

/// Ceiling in 0-1; values above 1 are read as percentages
pub fn normalize_max_volume(value: &Value) -> f64 {
    coerce_number(value)
        .map(|n| if n > 1.0 { n / 100.0 } else { n })
        .map(|n| n.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_MAX_VOLUME)
}

pub fn normalize_volume_curve(value: &Value) -> f64 {
    coerce_number(value)
        .map(|n| n.clamp(DEFAULT_VOLUME_CURVE, MAX_VOLUME_CURVE))
        .unwrap_or(DEFAULT_VOLUME_CURVE)
}

pub fn normalize_debug_flag(value: &Value) -> bool {
    coerce_number(value).is_some_and(|n| n > 0.0)
}
