//! Volume normalization and session startup against a mocked settings source

mod test_helpers;

use async_trait::async_trait;
use mockall::mock;
use serde_json::json;
use std::sync::Arc;
use test_helpers::{songs, Call, RecordingEngine};
use tralala_core::{
    AudioEngine, RemoteConfigSource, Result, SettingRow, TralalaError, COMPACT_CAPABILITIES,
    DEFAULT_CAPABILITIES,
};
use tralala_playback::{CommandOutcome, PlayerConfig, PlayerSession, VolumeLayer};

mock! {
    pub Settings {}

    #[async_trait]
    impl RemoteConfigSource for Settings {
        async fn fetch_settings(&self, keys: Vec<String>) -> Result<Vec<SettingRow>>;
    }
}

fn settings_returning(rows: Vec<SettingRow>) -> MockSettings {
    let mut source = MockSettings::new();
    source
        .expect_fetch_settings()
        .withf(|keys| {
            ["max_volume", "volume_curve", "volume_debug"]
                .iter()
                .all(|key| keys.iter().any(|k| k == key))
        })
        .times(1)
        .returning(move |_| Ok(rows.clone()));
    source
}

fn failing_settings() -> MockSettings {
    let mut source = MockSettings::new();
    source
        .expect_fetch_settings()
        .times(1)
        .returning(|_| Err(TralalaError::remote_config("network unreachable")));
    source
}

fn applied_volume(calls: &[Call]) -> Option<f64> {
    calls.iter().rev().find_map(|call| match call {
        Call::SetVolume(volume) => Some(*volume),
        _ => None,
    })
}

// ===== Volume Layer =====

#[tokio::test]
async fn load_and_apply_uses_curve() {
    let engine = RecordingEngine::new();
    let source = settings_returning(vec![
        SettingRow::new("max_volume", 80),
        SettingRow::new("volume_curve", "2"),
        SettingRow::new("volume_debug", 1),
    ]);
    let volume = VolumeLayer::new();

    let settings = volume.load_and_apply(&source, &*engine).await;

    assert!((settings.max_volume() - 0.8).abs() < 1e-9);
    assert_eq!(settings.curve(), 2.0);
    assert!(settings.debug_enabled());
    let applied = applied_volume(&engine.calls()).expect("volume applied");
    assert!((applied - 0.64).abs() < 1e-9);
    assert_eq!(volume.get(), settings);
}

#[tokio::test]
async fn failed_fetch_restores_defaults_and_still_applies() {
    let engine = RecordingEngine::new();
    let volume = VolumeLayer::new();

    let first = settings_returning(vec![SettingRow::new("max_volume", 0.3)]);
    volume.load(&first).await;
    assert_eq!(volume.get().max_volume(), 0.3);

    let settings = volume.load_and_apply(&failing_settings(), &*engine).await;

    assert_eq!(settings.max_volume(), 0.7);
    assert_eq!(settings.curve(), 1.0);
    assert!(settings.raw_max_volume().is_null());
    assert!(settings.loaded_at().is_some());
    assert_eq!(applied_volume(&engine.calls()), Some(0.7));
}

#[tokio::test]
async fn apply_failure_keeps_settings() {
    let engine = RecordingEngine::new();
    engine.fail_on("set_volume");
    let volume = VolumeLayer::new();

    let settings = volume
        .load_and_apply(
            &settings_returning(vec![SettingRow::new("max_volume", 50)]),
            &*engine,
        )
        .await;

    assert_eq!(settings.max_volume(), 0.5);
    assert_eq!(volume.effective(), 0.5);
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn debug_info_reports_raw_and_engine_values() {
    let engine = RecordingEngine::new();
    let volume = VolumeLayer::new();
    volume
        .load_and_apply(
            &settings_returning(vec![
                SettingRow::new("max_volume", "90"),
                SettingRow::new("volume_curve", json!(null)),
            ]),
            &*engine,
        )
        .await;

    let info = volume.debug_info(&*engine).await;

    assert_eq!(info.raw, json!("90"));
    assert!((info.normalized - 0.9).abs() < 1e-9);
    assert!((info.effective - 0.9).abs() < 1e-9);
    assert_eq!(info.engine, Some(engine.current_volume()));
    assert_eq!(info.curve, 1.0);
    assert!(info.curve_raw.is_null());
    assert!(!info.debug_enabled);
    assert!(info.loaded_at.is_some());

    let rendered = serde_json::to_value(&info).unwrap();
    assert_eq!(rendered["raw"], json!("90"));
}

// ===== Session =====

#[tokio::test]
async fn session_start_sets_up_engine_and_volume() {
    let engine = RecordingEngine::new();
    let source = settings_returning(vec![SettingRow::new("max_volume", 0.5)]);

    let session = PlayerSession::start(
        Arc::clone(&engine) as Arc<dyn AudioEngine>,
        &source,
        PlayerConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(
        engine.calls(),
        vec![
            Call::Setup(DEFAULT_CAPABILITIES.to_vec()),
            Call::SetVolume(0.5),
        ]
    );
    assert_eq!(COMPACT_CAPABILITIES.len(), 2);
    assert!(session.orchestrator().is_subscribed());

    let outcome = session
        .orchestrator()
        .play_from_list(&songs(2), 0, None)
        .await;
    assert_eq!(outcome, CommandOutcome::Issued);

    session.favorites().lock().add("Song 0");
    assert!(session.favorites().lock().contains("Song 0"));

    let info = session.volume_debug_info().await;
    assert_eq!(info.engine, Some(0.5));

    session.shutdown();
    assert!(!session.orchestrator().is_subscribed());
}

#[tokio::test]
async fn session_start_fails_when_engine_setup_fails() {
    let engine = RecordingEngine::new();
    engine.fail_on("setup");
    let source = MockSettings::new();

    let result = PlayerSession::start(
        Arc::clone(&engine) as Arc<dyn AudioEngine>,
        &source,
        PlayerConfig::default(),
    )
    .await;

    assert!(result.is_err());
    assert!(engine.calls().is_empty());
}
