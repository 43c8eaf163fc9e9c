//! Progress sampling and scrub gestures
//!
//! The sampler polls the engine for position and duration. The scrub controller
//! turns taps and drags on the progress bar into seek targets; it is a plain state
//! machine that hands back [`ScrubAction`]s, which the host forwards to the
//! orchestrator with [`ScrubAction::apply`].

use crate::{
    config::ScrubSettings,
    orchestrator::PlaybackOrchestrator,
    reconcile::clamp_secs,
    types::{CommandOutcome, Progress},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

// ===== Sampler =====

/// Periodic position/duration sampler
///
/// The latest sample is available through a watch channel. The task stops when the
/// orchestrator goes away and is aborted when the sampler is dropped.
pub struct ProgressSampler {
    progress: watch::Receiver<Progress>,
    handle: JoinHandle<()>,
}

impl ProgressSampler {
    pub fn spawn(orchestrator: &Arc<PlaybackOrchestrator>, interval: Duration) -> Self {
        let (tx, progress) = watch::channel(Progress::default());
        let orchestrator = Arc::downgrade(orchestrator);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let Some(orchestrator) = orchestrator.upgrade() else {
                    break;
                };
                match orchestrator.progress().await {
                    Ok(sample) => {
                        tx.send_if_modified(|current| {
                            if *current == sample {
                                return false;
                            }
                            *current = sample;
                            true
                        });
                    }
                    Err(e) => debug!(error = %e, "Progress sample failed"),
                }
            }
        });

        Self { progress, handle }
    }

    /// Most recent sample
    pub fn latest(&self) -> Progress {
        *self.progress.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress.clone()
    }
}

impl Drop for ProgressSampler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ===== Geometry =====

/// Measured progress bar: track width and knob diameter, in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackGeometry {
    pub width: f64,
    pub knob_size: f64,
}

impl TrackGeometry {
    pub fn new(width: f64, knob_size: f64) -> Self {
        Self { width, knob_size }
    }

    /// Whether the bar has been laid out
    pub fn is_measured(&self) -> bool {
        self.width > 0.0
    }

    /// Rightmost knob offset
    pub fn max_x(&self) -> f64 {
        (self.width - self.knob_size).max(0.0)
    }

    /// Knob offset for a touch at `x`, with the knob centred under the finger
    pub fn knob_x_at(&self, x: f64) -> f64 {
        clamp_secs(x - self.knob_size / 2.0, 0.0, self.max_x())
    }

    /// Fraction of the track represented by knob offset `knob_x`
    pub fn fraction_for(&self, knob_x: f64) -> f64 {
        clamp_secs(knob_x, 0.0, self.max_x()) / self.max_x().max(1.0)
    }

    /// Fraction of the track for a touch at `x`
    pub fn fraction_at(&self, x: f64) -> f64 {
        self.fraction_for(self.knob_x_at(x))
    }

    /// Knob offset for `seconds` into a track of `duration`
    pub fn x_for(&self, seconds: f64, duration: f64) -> f64 {
        if duration <= 0.0 || !self.is_measured() {
            return 0.0;
        }
        let fraction = clamp_secs(seconds / duration, 0.0, 1.0);
        clamp_secs(fraction * (self.width - self.knob_size), 0.0, self.max_x())
    }

    /// Width of the filled part of the track for knob offset `knob_x`
    pub fn fill_width(&self, knob_x: f64) -> f64 {
        clamp_secs(knob_x + self.knob_size / 2.0, 0.0, self.width)
    }
}

// ===== Scrub =====

/// What the host should tell the orchestrator after a gesture step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrubAction {
    /// Gesture started: pause and remember whether we were playing
    Begin,

    /// Live seek while dragging
    Seek(f64),

    /// Gesture finished at this position
    Commit(f64),
}

impl ScrubAction {
    /// Forward this action to the orchestrator
    pub async fn apply(self, orchestrator: &PlaybackOrchestrator) -> CommandOutcome {
        match self {
            Self::Begin => orchestrator.begin_scrub().await,
            Self::Seek(seconds) => orchestrator.seek(seconds).await,
            Self::Commit(seconds) => orchestrator.end_scrub(seconds).await,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ReleaseHold {
    target: f64,
    until: Instant,
}

/// Progress bar gesture state
#[derive(Debug)]
pub struct ScrubController {
    settings: ScrubSettings,
    geometry: TrackGeometry,
    interactive: bool,
    dragging: bool,
    knob_x: f64,
    preview: f64,
    last_live_seek: Option<Instant>,
    hold: Option<ReleaseHold>,
}

impl ScrubController {
    /// Unmeasured, interactive controller
    pub fn new(settings: ScrubSettings) -> Self {
        let geometry = TrackGeometry::new(0.0, settings.knob_size);
        Self {
            settings,
            geometry,
            interactive: true,
            dragging: false,
            knob_x: 0.0,
            preview: 0.0,
            last_live_seek: None,
            hold: None,
        }
    }

    pub fn set_track_width(&mut self, width: f64) {
        self.geometry.width = width.max(0.0);
        debug!(width, "Progress bar measured");
    }

    /// Disable gestures, e.g. while nothing is loaded
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub fn geometry(&self) -> TrackGeometry {
        self.geometry
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Seconds under the knob while dragging
    pub fn preview(&self) -> Option<f64> {
        self.dragging.then_some(self.preview)
    }

    fn accepts_gestures(&self) -> bool {
        self.interactive && self.geometry.is_measured()
    }

    /// Tap-to-seek at `x`
    pub fn tap(&mut self, x: f64, duration: f64) -> Vec<ScrubAction> {
        if !self.accepts_gestures() || duration <= 0.0 {
            return Vec::new();
        }

        self.knob_x = self.geometry.knob_x_at(x);
        let seconds = self.geometry.fraction_for(self.knob_x) * duration;
        self.hold_at(seconds);
        debug!(seconds, duration, x, "Scrub tap");

        vec![ScrubAction::Begin, ScrubAction::Commit(seconds)]
    }

    /// Drag started with the engine at `position`
    pub fn pan_begin(&mut self, position: f64, duration: f64) -> Option<ScrubAction> {
        if !self.accepts_gestures() {
            return None;
        }

        self.dragging = true;
        self.preview = position;
        self.knob_x = self.geometry.x_for(position, duration);
        self.last_live_seek = None;
        debug!(position, duration, "Scrub drag begin");
        Some(ScrubAction::Begin)
    }

    /// Finger moved by `delta_x` since the previous update
    ///
    /// Returns a live seek when enabled and outside the throttle window.
    pub fn pan_update(&mut self, delta_x: f64, duration: f64) -> Option<ScrubAction> {
        if !self.dragging || !self.geometry.is_measured() || duration <= 0.0 {
            return None;
        }

        self.knob_x = clamp_secs(self.knob_x + delta_x, 0.0, self.geometry.max_x());
        self.preview = self.geometry.fraction_for(self.knob_x) * duration;

        if !self.settings.live_seek {
            return None;
        }
        let now = Instant::now();
        let throttled = self
            .last_live_seek
            .is_some_and(|last| now.saturating_duration_since(last) < self.settings.live_throttle());
        if throttled {
            return None;
        }
        self.last_live_seek = Some(now);
        Some(ScrubAction::Seek(self.preview))
    }

    /// Drag released; always produces the final seek
    pub fn pan_end(&mut self) -> Option<ScrubAction> {
        if !self.dragging {
            return None;
        }
        self.dragging = false;
        let seconds = self.preview;
        self.hold_at(seconds);
        debug!(seconds, "Scrub drag end");
        Some(ScrubAction::Commit(seconds))
    }

    fn hold_at(&mut self, target: f64) {
        self.hold = Some(ReleaseHold {
            target,
            until: Instant::now() + self.settings.display_hold(),
        });
    }

    /// Seconds the knob should show for the sampled `progress`
    ///
    /// After a release the knob stays on the target until the engine catches up or
    /// the display hold runs out, so it does not jump back to the old position.
    pub fn displayed_position(&mut self, progress: Progress) -> f64 {
        if self.dragging {
            return self.preview;
        }

        if let Some(hold) = self.hold {
            let near = (progress.position - hold.target).abs() <= self.settings.release_tolerance_secs;
            if !near && Instant::now() < hold.until {
                return hold.target;
            }
            self.hold = None;
        }
        progress.position
    }

    /// Knob offset for the sampled `progress`
    pub fn knob_x(&mut self, progress: Progress) -> f64 {
        if self.dragging {
            return self.knob_x;
        }
        let seconds = self.displayed_position(progress);
        self.geometry.x_for(seconds, progress.duration)
    }
}

/// Render seconds as `m:ss`
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
