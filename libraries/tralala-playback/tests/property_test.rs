//! Property-based tests for the orchestrator and volume normalization
//!
//! Random catalogs and random engine event sequences must never break the
//! playlist or cursor invariants.

mod test_helpers;

use proptest::prelude::*;
use serde_json::json;
use test_helpers::{orchestrator, RecordingEngine};
use tralala_core::{CatalogItem, EngineEvent, EngineState};
use tralala_playback::{volume, PlayerSnapshot};

// ===== Helpers =====

fn arbitrary_catalog() -> impl Strategy<Value = Vec<CatalogItem>> {
    prop::collection::vec(any::<bool>(), 0..20).prop_map(|playable| {
        playable
            .into_iter()
            .enumerate()
            .map(|(i, has_url)| {
                let url = if has_url {
                    format!("https://cdn.test/{i}.mp3")
                } else {
                    String::new()
                };
                CatalogItem::new(format!("Song {i}"), url)
            })
            .collect()
    })
}

fn arbitrary_event() -> impl Strategy<Value = EngineEvent> {
    prop_oneof![
        proptest::option::of(0usize..25).prop_map(|index| EngineEvent::TrackChanged { index }),
        Just(EngineEvent::QueueEnded),
        Just(EngineEvent::StateChanged {
            state: EngineState::Playing
        }),
        Just(EngineEvent::StateChanged {
            state: EngineState::Paused
        }),
        Just(EngineEvent::Error {
            message: "decoder failure".to_string()
        }),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("test runtime")
}

fn assert_cursor_consistent(snapshot: &PlayerSnapshot) -> Result<(), TestCaseError> {
    match snapshot.current_index {
        None => {
            prop_assert!(snapshot.current_track.is_none());
        }
        Some(index) => {
            prop_assert!(index < snapshot.playlist.len());
            prop_assert_eq!(snapshot.current_track.as_ref(), snapshot.playlist.get(index));
        }
    }
    Ok(())
}

// ===== Property Tests =====

proptest! {
    /// Property: the playlist holds exactly the playable items, in catalog order
    #[test]
    fn playlist_is_filtered_catalog(catalog in arbitrary_catalog(), start in 0usize..25) {
        let rt = runtime();
        let snapshot = rt.block_on(async {
            let engine = RecordingEngine::new();
            let player = orchestrator(&engine);
            let _ = player.play_from_list(&catalog, start, None).await;
            player.snapshot()
        });

        let expected: Vec<&str> = catalog
            .iter()
            .filter(|item| item.is_playable())
            .map(|item| item.title.as_str())
            .collect();
        let actual: Vec<&str> = snapshot.playlist.iter().map(|t| t.title.as_str()).collect();

        prop_assert_eq!(actual, expected.clone());
        prop_assert!(snapshot.playlist.iter().all(|t| t.is_playable()));
        prop_assert_eq!(snapshot.current_index.is_some(), !expected.is_empty());
        assert_cursor_consistent(&snapshot)?;
    }

    /// Property: a playable chosen item is the one that starts
    #[test]
    fn chosen_playable_item_starts(catalog in arbitrary_catalog(), start in 0usize..20) {
        prop_assume!(catalog.get(start).is_some_and(CatalogItem::is_playable));

        let rt = runtime();
        let snapshot = rt.block_on(async {
            let engine = RecordingEngine::new();
            let player = orchestrator(&engine);
            let _ = player.play_from_list(&catalog, start, None).await;
            player.snapshot()
        });

        let current = snapshot.current_track.map(|t| t.title);
        prop_assert_eq!(current, Some(catalog[start].title.clone()));
    }

    /// Property: no engine event sequence can desynchronize cursor and playlist
    #[test]
    fn events_keep_cursor_consistent(
        catalog in arbitrary_catalog(),
        start in 0usize..20,
        events in prop::collection::vec(arbitrary_event(), 0..30),
    ) {
        let rt = runtime();
        let snapshots = rt.block_on(async {
            let engine = RecordingEngine::new();
            let player = orchestrator(&engine);
            let _ = player.play_from_list(&catalog, start, None).await;

            let mut snapshots = vec![player.snapshot()];
            for event in events {
                player.handle_event(event).await;
                snapshots.push(player.snapshot());
            }
            snapshots
        });

        let playlist = &snapshots[0].playlist;
        for snapshot in &snapshots {
            prop_assert_eq!(&snapshot.playlist, playlist);
            assert_cursor_consistent(snapshot)?;
        }
    }

    /// Property: normalized volume is always within range and effective <= base
    #[test]
    fn volume_normalization_is_bounded(base in -500.0f64..500.0, curve in -10.0f64..10.0) {
        let max_volume = volume::normalize_max_volume(&json!(base));
        let curve = volume::normalize_volume_curve(&json!(curve));

        prop_assert!((0.0..=1.0).contains(&max_volume));
        prop_assert!((1.0..=5.0).contains(&curve));
        prop_assert!(max_volume.powf(curve) <= max_volume + 1e-12);
    }
}
