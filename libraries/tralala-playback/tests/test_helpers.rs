#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::{Arc, Once};
use tokio::sync::{broadcast, Notify};
use tralala_core::{
    AudioEngine, Capability, CatalogItem, EngineEvent, EngineItem, EngineState, Result,
    TralalaError,
};
use tralala_playback::{PlaybackOrchestrator, PlayerConfig};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Engine command as seen by the fake
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Setup(Vec<Capability>),
    Add(Vec<String>),
    Reset,
    Skip(usize),
    Play,
    Pause,
    SeekTo(f64),
    SetVolume(f64),
}

/// Fake engine that records commands and lets tests script its answers
///
/// Queries (position, duration, state, volume) are not recorded.
pub struct RecordingEngine {
    calls: Mutex<Vec<Call>>,
    position: Mutex<f64>,
    duration: Mutex<f64>,
    state: Mutex<EngineState>,
    volume: Mutex<f64>,
    failing: Mutex<Vec<&'static str>>,
    reset_gate: Mutex<Option<Arc<Notify>>>,
    events: broadcast::Sender<EngineEvent>,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        init_tracing();
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            position: Mutex::new(0.0),
            duration: Mutex::new(0.0),
            state: Mutex::new(EngineState::None),
            volume: Mutex::new(1.0),
            failing: Mutex::new(Vec::new()),
            reset_gate: Mutex::new(None),
            events,
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Return and forget the commands recorded so far
    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock())
    }

    pub fn set_position(&self, seconds: f64) {
        *self.position.lock() = seconds;
    }

    pub fn set_duration(&self, seconds: f64) {
        *self.duration.lock() = seconds;
    }

    pub fn set_state(&self, state: EngineState) {
        *self.state.lock() = state;
    }

    pub fn current_volume(&self) -> f64 {
        *self.volume.lock()
    }

    /// Make every future `command` fail
    pub fn fail_on(&self, command: &'static str) {
        self.failing.lock().push(command);
    }

    /// Make `reset` block until the returned gate is notified
    pub fn hold_reset(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.reset_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }

    fn record(&self, command: &'static str, call: Call) -> Result<()> {
        if self.failing.lock().contains(&command) {
            return Err(TralalaError::rejected(command, "scripted failure"));
        }
        self.calls.lock().push(call);
        Ok(())
    }
}

#[async_trait]
impl AudioEngine for RecordingEngine {
    async fn setup(&self, capabilities: &[Capability], _compact: &[Capability]) -> Result<()> {
        self.record("setup", Call::Setup(capabilities.to_vec()))
    }

    async fn add(&self, items: Vec<EngineItem>) -> Result<()> {
        let titles = items.into_iter().map(|item| item.title).collect();
        self.record("add", Call::Add(titles))
    }

    async fn reset(&self) -> Result<()> {
        let result = self.record("reset", Call::Reset);
        let gate = self.reset_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        result
    }

    async fn skip(&self, index: usize) -> Result<()> {
        self.record("skip", Call::Skip(index))
    }

    async fn play(&self) -> Result<()> {
        self.record("play", Call::Play)
    }

    async fn pause(&self) -> Result<()> {
        self.record("pause", Call::Pause)
    }

    async fn seek_to(&self, seconds: f64) -> Result<()> {
        self.record("seek_to", Call::SeekTo(seconds))
    }

    async fn position(&self) -> Result<f64> {
        if self.failing.lock().contains(&"position") {
            return Err(TralalaError::unavailable("position"));
        }
        Ok(*self.position.lock())
    }

    async fn duration(&self) -> Result<f64> {
        Ok(*self.duration.lock())
    }

    async fn state(&self) -> Result<EngineState> {
        if self.failing.lock().contains(&"state") {
            return Err(TralalaError::unavailable("state"));
        }
        Ok(*self.state.lock())
    }

    async fn set_volume(&self, volume: f64) -> Result<()> {
        self.record("set_volume", Call::SetVolume(volume))?;
        *self.volume.lock() = volume;
        Ok(())
    }

    async fn volume(&self) -> Result<f64> {
        Ok(*self.volume.lock())
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }
}

pub fn orchestrator(engine: &Arc<RecordingEngine>) -> PlaybackOrchestrator {
    PlaybackOrchestrator::new(Arc::clone(engine) as Arc<dyn AudioEngine>, PlayerConfig::default())
}

/// Catalog of `count` playable songs titled "Song 0", "Song 1", ...
pub fn songs(count: usize) -> Vec<CatalogItem> {
    (0..count)
        .map(|i| CatalogItem::new(format!("Song {i}"), format!("https://cdn.test/{i}.mp3")))
        .collect()
}

pub fn titles(calls: &[Call]) -> Option<Vec<String>> {
    calls.iter().find_map(|call| match call {
        Call::Add(titles) => Some(titles.clone()),
        _ => None,
    })
}
