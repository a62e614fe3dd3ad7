// tests/fusion_scenarios.rs
//
// End-to-end merge behavior of the fusion store across sync cycles.

mod common;

use city_pulse_fusion::ingest::types::SyncResult;
use city_pulse_fusion::model::*;
use city_pulse_fusion::store::views::{NewsFilter, ProjectFilter};
use city_pulse_fusion::FusionStore;
use common::{at, external, media, minutes, project};

fn externals(store: &FusionStore) -> Vec<NewsItem> {
    store
        .news(&NewsFilter::default())
        .into_iter()
        .filter(|n| n.kind == NewsKind::External)
        .collect()
}

#[test]
fn mixed_batch_merges_news_and_health() {
    let store = FusionStore::new();
    let x = SyncResult::live("x", "ok", "https://x.test")
        .at(at(0))
        .with_news(vec![external("A", at(-60)), external("B", at(-30))]);
    let y = SyncResult::stale("y", "upstream 503", "https://y.test").at(at(0));

    let health = store.apply_sync_results_at(vec![x, y], at(5));

    assert_eq!(health.len(), 2);
    assert_eq!(health[0].status, FreshnessStatus::Live);
    assert_eq!(health[1].status, FreshnessStatus::Stale);

    let titles: Vec<String> = externals(&store).into_iter().map(|n| n.title.en).collect();
    assert_eq!(titles, vec!["A", "B"]);

    let pulse = store.change_pulse();
    let new_signals = pulse.item("change-new-signals").unwrap();
    assert!(new_signals.value >= 2);
    assert_eq!(new_signals.tone, Tone::Positive);
    assert_eq!(store.last_sync_at(), Some(at(5)));
}

#[test]
fn later_cycle_wins_for_same_project_slug() {
    let store = FusionStore::new();
    let first = SyncResult::live("projects", "ok", "")
        .with_projects(vec![project("p1", 40, at(0))]);
    store.apply_sync_results_at(vec![first], at(0));

    let second = SyncResult::live("projects", "ok", "")
        .with_projects(vec![project("p1", 55, at(0) + minutes(10))]);
    store.apply_sync_results_at(vec![second], at(600));

    let p1: Vec<ProjectRecord> = store
        .projects(&ProjectFilter::default())
        .into_iter()
        .filter(|p| p.slug == "p1")
        .collect();
    assert_eq!(p1.len(), 1);
    assert_eq!(p1[0].completion_percent, 55);
    // incoming records are listed first
    assert_eq!(store.projects(&ProjectFilter::default())[0].slug, "p1");
}

#[test]
fn same_batch_applied_twice_is_stable() {
    let store = FusionStore::new();
    let batch = || {
        vec![SyncResult::live("x", "ok", "https://x.test")
            .with_news(vec![external("A", at(0)), external("A", at(0))])
            .with_projects(vec![project("p1", 10, at(0))])
            .with_media(vec![media("cam-1", MediaStatus::Live)])]
    };

    store.apply_sync_results_at(batch(), at(10));
    let news_once = store.news(&NewsFilter::default());
    let projects_once = store.projects(&ProjectFilter::default());
    let media_once = store.media_feeds(None);

    store.apply_sync_results_at(batch(), at(20));
    assert_eq!(store.news(&NewsFilter::default()), news_once);
    assert_eq!(store.projects(&ProjectFilter::default()), projects_once);
    assert_eq!(store.media_feeds(None), media_once);
    assert_eq!(externals(&store).len(), 1);
}

#[test]
fn official_news_survives_external_refresh() {
    let store = FusionStore::new();
    let officials_before: Vec<NewsItem> = store
        .news(&NewsFilter::default())
        .into_iter()
        .filter(|n| n.kind == NewsKind::Official)
        .collect();
    assert!(!officials_before.is_empty());

    let result = SyncResult::live("google-news-rss", "ok", "")
        .with_news(vec![external("Fresh headline", at(0))]);
    store.apply_sync_results_at(vec![result], at(1));

    let officials_after: Vec<NewsItem> = store
        .news(&NewsFilter::default())
        .into_iter()
        .filter(|n| n.kind == NewsKind::Official)
        .collect();
    assert_eq!(officials_before, officials_after);
    assert_eq!(externals(&store).len(), 1);
}

#[test]
fn empty_cycle_keeps_cached_lists() {
    let store = FusionStore::new();
    let news_before = store.news(&NewsFilter::default());
    let projects_before = store.projects(&ProjectFilter::default());

    store.apply_sync_results_at(vec![SyncResult::stale("x", "down", "")], at(1));

    assert_eq!(store.news(&NewsFilter::default()), news_before);
    assert_eq!(store.projects(&ProjectFilter::default()), projects_before);
}

#[test]
fn health_keeps_one_record_per_source() {
    let store = FusionStore::new();
    store.apply_sync_results_at(
        vec![
            SyncResult::live("a", "first", ""),
            SyncResult::stale("b", "down", ""),
            SyncResult::manual("a", "second", ""),
        ],
        at(0),
    );

    let health = store.sync_health();
    let ids: Vec<&str> = health.iter().map(|h| h.source_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(health[0].status, FreshnessStatus::Manual);
    assert_eq!(health[0].message, "second");

    store.apply_sync_results_at(vec![SyncResult::live("b", "back", "")], at(60));
    let b = store
        .sync_health()
        .into_iter()
        .find(|h| h.source_id == "b")
        .unwrap();
    assert_eq!(b.status, FreshnessStatus::Live);
}

#[test]
fn map_layer_is_replaced_not_merged() {
    let store = FusionStore::new();
    let collection = |ids: &[&str]| MapFeatureCollection {
        layer_id: "pollution".into(),
        updated_at: at(0),
        features: ids
            .iter()
            .map(|id| GeoFeatureRecord {
                id: id.to_string(),
                layer_id: "pollution".into(),
                geometry_type: GeometryType::Point,
                coordinates: serde_json::json!([100.5, 13.7]),
                title: id.to_string(),
                description: None,
                properties: Default::default(),
                source: common::meta("Air"),
            })
            .collect(),
        bounds: None,
        source: common::meta("Air"),
    };

    store.apply_sync_results_at(
        vec![SyncResult::live("air", "ok", "").with_map(vec![collection(&["f1", "f2", "f3"])])],
        at(0),
    );
    store.apply_sync_results_at(
        vec![SyncResult::live("air", "ok", "").with_map(vec![collection(&["f9"])])],
        at(300),
    );

    let layers = store.map_features(Some("pollution"));
    assert_eq!(layers.len(), 1);
    let ids: Vec<&str> = layers[0].features.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["f9"]);
    assert_eq!(layers[0].updated_at, at(300));
}

#[test]
fn media_dedup_prefers_incoming() {
    let store = FusionStore::new();
    store.apply_sync_results_at(
        vec![SyncResult::live("m", "ok", "").with_media(vec![media("cam-1", MediaStatus::Offline)])],
        at(0),
    );
    store.apply_sync_results_at(
        vec![SyncResult::live("m", "ok", "").with_media(vec![media("cam-1", MediaStatus::Live)])],
        at(60),
    );

    let cams: Vec<MediaFeedItem> = store
        .media_feeds(None)
        .into_iter()
        .filter(|m| m.id == "cam-1")
        .collect();
    assert_eq!(cams.len(), 1);
    assert_eq!(cams[0].status, MediaStatus::Live);
}

#[test]
fn activity_log_is_capped_newest_first() {
    let store = FusionStore::new();
    for i in 0..30 {
        let id = format!("src-{i}");
        store.apply_sync_results_at(vec![SyncResult::live(&id, "ok", "")], at(i));
    }

    let log = store.activity(None);
    assert_eq!(log.len(), 24);
    assert_eq!(log[0].source_id, "src-29");
    assert_eq!(log[23].source_id, "src-6");
    assert_eq!(store.activity(Some(3)).len(), 3);
}
