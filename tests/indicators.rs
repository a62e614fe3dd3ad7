// tests/indicators.rs
//
// Official impact and change-pulse items as recomputed by the store after a
// cycle.

mod common;

use city_pulse_fusion::ingest::types::{ResiliencePatch, SocialSignal, SyncResult};
use city_pulse_fusion::model::*;
use city_pulse_fusion::seed::{self, COVERAGE_LAYER_ID, OFFICIAL_PUBLISHER};
use city_pulse_fusion::store::StoreState;
use city_pulse_fusion::FusionStore;
use common::{at, external, media, project};

fn quiet() -> SyncResult {
    SyncResult::live("time-sync", "tick", "")
}

fn signal(mentions: u64) -> SocialSignal {
    SocialSignal {
        mention_count: mentions,
        sentiment_score: 20.0,
        source_count: 1,
        positive_share: 0.6,
        dominant_source: "GDELT Signals".into(),
        top_terms: vec!["transit".into()],
        source_name: "GDELT Signals".into(),
    }
}

#[test]
fn impact_is_delayed_while_any_source_is_stale() {
    let store = FusionStore::new();
    store.apply_sync_results_at(vec![SyncResult::stale("gdelt-signals", "down", "")], at(0));
    assert_eq!(
        store.official_impact().source.freshness_status,
        FreshnessStatus::Delayed
    );

    store.apply_sync_results_at(vec![SyncResult::live("gdelt-signals", "back", "")], at(60));
    assert_eq!(
        store.official_impact().source.freshness_status,
        FreshnessStatus::Live
    );
}

#[test]
fn tracked_cities_use_coverage_layer_then_city_count() {
    let store = FusionStore::new();
    store.apply_sync_results_at(vec![quiet()], at(0));
    let coverage = seed::map_feature_collections()
        .into_iter()
        .find(|c| c.layer_id == COVERAGE_LAYER_ID)
        .unwrap();
    assert_eq!(
        store.official_impact().tracked_cities,
        coverage.features.len() as u64
    );

    let mut state = StoreState::from_seed();
    state.map_features.retain(|c| c.layer_id != COVERAGE_LAYER_ID);
    let store = FusionStore::from_state(state);
    store.apply_sync_results_at(vec![quiet()], at(0));
    assert_eq!(
        store.official_impact().tracked_cities,
        seed::cities().len() as u64
    );
}

#[test]
fn official_updates_and_public_signals_follow_store_contents() {
    let store = FusionStore::new();
    store.apply_sync_results_at(vec![quiet()], at(0));
    let base = store.official_impact();

    let bulletin = NewsItem {
        kind: NewsKind::Official,
        ..external("Office bulletin", at(-30))
    };
    let roadmap = ProjectRecord {
        source: SourceMeta::live(OFFICIAL_PUBLISHER, "https://office.test", at(0), 0.9),
        ..project("office-roadmap", 30, at(0))
    };
    let batch = SyncResult::live("x", "ok", "")
        .with_news(vec![bulletin, external("Street story", at(-10))])
        .with_projects(vec![roadmap, project("vendor-pilot", 10, at(0))])
        .with_media(vec![media("cam-offline", MediaStatus::Offline)]);
    store.apply_sync_results_at(vec![batch], at(60));

    let impact = store.official_impact();
    assert_eq!(impact.official_updates, base.official_updates + 2);
    // one external story this cycle plus every media feed, live or not
    assert_eq!(impact.public_signals, 1 + seed::media_feeds().len() as u64 + 1);
}

#[test]
fn live_sources_item_warns_on_stale() {
    let store = FusionStore::new();
    store.apply_sync_results_at(vec![quiet()], at(0));
    let pulse = store.change_pulse();
    assert_eq!(pulse.item("change-live-sources").unwrap().tone, Tone::Neutral);

    store.apply_sync_results_at(vec![SyncResult::stale("urbanis", "down", "")], at(60));
    let item = store.change_pulse().item("change-live-sources").cloned().unwrap();
    assert_eq!(item.tone, Tone::Warning);
    assert_eq!(item.value, store.official_impact().live_sources);
}

#[test]
fn social_item_turns_positive_at_twelve_mentions() {
    let tone_at = |mentions: u64| {
        let store = FusionStore::new();
        store.apply_sync_results_at(
            vec![SyncResult::live("gdelt-signals", "ok", "").with_social_signal(signal(mentions))],
            at(0),
        );
        let pulse = store.change_pulse();
        let item = pulse.item("change-social").unwrap();
        assert_eq!(item.value, mentions);
        item.tone
    };
    assert_eq!(tone_at(11), Tone::Neutral);
    assert_eq!(tone_at(12), Tone::Positive);
}

#[test]
fn alerts_item_mirrors_resilience_warnings() {
    let store = FusionStore::new();
    let flood = LocalizedText::new("น้ำท่วมฉับพลัน", "Flash flood near the canal");
    let patch = ResiliencePatch {
        warnings: Some(vec![flood.clone(), LocalizedText::both("Hotspot")]),
        ..Default::default()
    };
    store.apply_sync_results_at(
        vec![SyncResult::live("gistda-disaster", "ok", "").with_resilience(patch)],
        at(0),
    );
    let pulse = store.change_pulse();
    let alerts = pulse.item("change-alerts").unwrap();
    assert_eq!(alerts.value, 2);
    assert_eq!(alerts.tone, Tone::Warning);
    assert_eq!(alerts.detail, flood);

    let cleared = ResiliencePatch {
        warnings: Some(Vec::new()),
        ..Default::default()
    };
    store.apply_sync_results_at(
        vec![SyncResult::live("gistda-disaster", "ok", "").with_resilience(cleared)],
        at(60),
    );
    let pulse = store.change_pulse();
    let alerts = pulse.item("change-alerts").unwrap();
    assert_eq!(alerts.value, 0);
    assert_eq!(alerts.tone, Tone::Neutral);
    assert_eq!(alerts.detail.en, "No active warnings");
}
