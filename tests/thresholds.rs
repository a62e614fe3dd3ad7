// tests/thresholds.rs
//
// Media-spike, stale-source and air-quality thresholds as seen through the
// change pulse after a cycle.

mod common;

use city_pulse_fusion::ingest::types::{ResiliencePatch, SocialSignal, SyncResult};
use city_pulse_fusion::model::ThresholdState;
use city_pulse_fusion::FusionStore;
use common::at;

fn signal(mentions: u64) -> SocialSignal {
    SocialSignal {
        mention_count: mentions,
        sentiment_score: 60.0,
        source_count: 1,
        positive_share: 0.5,
        dominant_source: "Feed".into(),
        top_terms: vec!["flood".into()],
        source_name: "Listener".into(),
    }
}

fn media_state(mentions: u64) -> ThresholdState {
    let store = FusionStore::new();
    store.apply_sync_results_at(
        vec![SyncResult::live("listener", "ok", "").with_social_signal(signal(mentions))],
        at(0),
    );
    store
        .change_pulse()
        .threshold("threshold-media")
        .unwrap()
        .state
}

#[test]
fn media_spike_boundaries() {
    assert_eq!(media_state(9), ThresholdState::Ok);
    assert_eq!(media_state(10), ThresholdState::Watch);
    assert_eq!(media_state(19), ThresholdState::Watch);
    assert_eq!(media_state(20), ThresholdState::Alert);
}

#[test]
fn observed_signals_are_weighted_by_mentions() {
    let store = FusionStore::new();
    let mut loud = signal(30);
    loud.sentiment_score = 70.0;
    loud.dominant_source = "Loud".into();
    let mut quiet = signal(10);
    quiet.sentiment_score = 30.0;

    store.apply_sync_results_at(
        vec![
            SyncResult::live("a", "ok", "").with_social_signal(quiet),
            SyncResult::live("b", "ok", "").with_social_signal(loud),
        ],
        at(0),
    );

    let social = store.social_listening();
    assert_eq!(social.mention_count, 40);
    assert_eq!(social.sentiment_score, 60);
    assert_eq!(social.dominant_source, "Loud");
    assert_eq!(social.source_count, 2);
}

fn stale_state(results: Vec<SyncResult>) -> ThresholdState {
    let store = FusionStore::new();
    // reset every catalog source to live first
    let live_all: Vec<SyncResult> = store
        .sources()
        .iter()
        .map(|s| SyncResult::live(&s.id, "ok", ""))
        .collect();
    store.apply_sync_results_at(live_all, at(0));
    store.apply_sync_results_at(results, at(60));
    store
        .change_pulse()
        .threshold("threshold-stale")
        .unwrap()
        .state
}

#[test]
fn stale_source_boundaries() {
    assert_eq!(stale_state(vec![]), ThresholdState::Ok);
    assert_eq!(
        stale_state(vec![SyncResult::stale("citydata", "down", "")]),
        ThresholdState::Watch
    );
    assert_eq!(
        stale_state(vec![
            SyncResult::stale("citydata", "down", ""),
            SyncResult::stale("urbanis", "down", ""),
        ]),
        ThresholdState::Alert
    );
}

fn air_state(aqi: u32) -> ThresholdState {
    let store = FusionStore::new();
    let patch = ResiliencePatch {
        aqi: Some(aqi),
        ..Default::default()
    };
    store.apply_sync_results_at(
        vec![SyncResult::live("open-meteo-air", "ok", "").with_resilience(patch)],
        at(0),
    );
    store
        .change_pulse()
        .threshold("threshold-air")
        .unwrap()
        .state
}

#[test]
fn air_quality_boundaries() {
    assert_eq!(air_state(59), ThresholdState::Ok);
    assert_eq!(air_state(60), ThresholdState::Watch);
    assert_eq!(air_state(89), ThresholdState::Watch);
    assert_eq!(air_state(90), ThresholdState::Alert);
}
