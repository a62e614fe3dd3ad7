//! Read accessors. Every method takes the read lock briefly and returns owned
//! copies, so callers never share memory with the canonical state.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::*;

use super::{derived, FusionStore};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectFilter {
    pub city: Option<String>,
    pub domain: Option<String>,
    pub status: Option<ProjectStatus>,
}

impl ProjectFilter {
    fn matches(&self, p: &ProjectRecord) -> bool {
        self.city.as_ref().is_none_or(|c| &p.city_slug == c)
            && self.domain.as_ref().is_none_or(|d| &p.domain_slug == d)
            && self.status.is_none_or(|s| p.status == s)
    }
}

/// News filter. Items without a city/domain tag match any city/domain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsFilter {
    pub city: Option<String>,
    pub domain: Option<String>,
    pub kind: Option<NewsKind>,
    pub limit: Option<usize>,
}

impl NewsFilter {
    fn matches(&self, n: &NewsItem) -> bool {
        let tag_ok = |want: &Option<String>, have: &Option<String>| match (want, have) {
            (Some(w), Some(h)) => w == h,
            _ => true,
        };
        tag_ok(&self.city, &n.city_slug)
            && tag_ok(&self.domain, &n.domain_slug)
            && self.kind.is_none_or(|k| n.kind == k)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverviewFilter {
    pub city: Option<String>,
    pub domain: Option<String>,
    /// Comma-separated layer ids; defaults to the active layers.
    pub layers: Option<String>,
}

fn split_ids(raw: Option<&str>) -> Option<Vec<String>> {
    let ids: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (!ids.is_empty()).then_some(ids)
}

fn pulse_metric(id: &str, label: LocalizedText, value: u64, tone: Tone) -> PulseMetric {
    PulseMetric {
        id: id.to_string(),
        label,
        value,
        display_value: format!("{value:02}"),
        tone,
    }
}

impl FusionStore {
    pub fn projects(&self, filter: &ProjectFilter) -> Vec<ProjectRecord> {
        self.read()
            .projects
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect()
    }

    /// Lookup by id or slug.
    pub fn project(&self, id: &str) -> Option<ProjectRecord> {
        self.read()
            .projects
            .iter()
            .find(|p| p.id == id || p.slug == id)
            .cloned()
    }

    pub fn news(&self, filter: &NewsFilter) -> Vec<NewsItem> {
        let state = self.read();
        let limit = filter.limit.unwrap_or(usize::MAX);
        state
            .news
            .iter()
            .filter(|n| filter.matches(n))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Lookup by id or slug.
    pub fn news_item(&self, id: &str) -> Option<NewsItem> {
        self.read()
            .news
            .iter()
            .find(|n| n.id == id || n.slug == id)
            .cloned()
    }

    pub fn map_layers(&self) -> Vec<MapLayerConfig> {
        self.read().layers.clone()
    }

    /// Collections for one layer, or every layer when `layer` is `None`.
    pub fn map_features(&self, layer: Option<&str>) -> Vec<MapFeatureCollection> {
        let state = self.read();
        match layer {
            Some(id) => state.map_collection(id).cloned().into_iter().collect(),
            None => state.map_features.clone(),
        }
    }

    pub fn media_feeds(&self, kind: Option<MediaKind>) -> Vec<MediaFeedItem> {
        self.read()
            .media_feeds
            .iter()
            .filter(|m| kind.is_none_or(|k| m.kind == k))
            .cloned()
            .collect()
    }

    pub fn resilience(&self) -> ResilienceSnapshot {
        self.read().resilience.clone()
    }

    pub fn change_pulse(&self) -> ChangePulse {
        self.read().change_pulse.clone()
    }

    /// Most recent entries first.
    pub fn activity(&self, limit: Option<usize>) -> Vec<ActivityLogItem> {
        self.read().activity.snapshot(limit)
    }

    pub fn social_listening(&self) -> SocialListeningSnapshot {
        self.read().social_listening.clone()
    }

    pub fn official_impact(&self) -> OfficialImpactSnapshot {
        self.read().official_impact.clone()
    }

    pub fn sources(&self) -> Vec<SourceRecord> {
        self.read().health.catalog().to_vec()
    }

    pub fn sync_health(&self) -> Vec<SourceHealthRecord> {
        self.read().health.records().to_vec()
    }

    pub fn market(&self) -> MarketSnapshot {
        self.read().market.clone()
    }

    pub fn time(&self) -> TimeSnapshot {
        self.read().latest_time.clone()
    }

    pub fn cities(&self) -> Vec<CityProfile> {
        self.read().cities.clone()
    }

    pub fn domains(&self) -> Vec<DomainScorecard> {
        self.read().domains.clone()
    }

    pub fn briefing(&self) -> BriefingNote {
        self.read().briefing.clone()
    }

    pub fn last_sync_at(&self) -> Option<DateTime<Utc>> {
        self.read().last_sync_at
    }

    pub fn overview(&self, filter: &OverviewFilter) -> OverviewSnapshot {
        let state = self.read();

        let active_projects = state
            .projects
            .iter()
            .filter(|p| filter.city.as_ref().is_none_or(|c| &p.city_slug == c))
            .count() as u64;
        let tracked = derived::tracked_cities(&state);
        let warnings = state.resilience.warnings.len() as u64;
        let live_sources = state.health.status_counts().live;

        let active_layers = split_ids(filter.layers.as_deref()).unwrap_or_else(|| {
            state
                .layers
                .iter()
                .filter(|l| l.active)
                .map(|l| l.id.clone())
                .collect()
        });

        OverviewSnapshot {
            updated_at: Utc::now(),
            selected_city: filter.city.clone(),
            selected_domain: filter.domain.clone(),
            active_layers,
            metrics: vec![
                pulse_metric(
                    "active-projects",
                    LocalizedText::new("โครงการที่กำลังเดินหน้า", "Active Programs"),
                    active_projects,
                    Tone::Positive,
                ),
                pulse_metric(
                    "cities-tracked",
                    LocalizedText::new("เมืองที่ติดตาม", "Cities Tracked"),
                    tracked,
                    Tone::Neutral,
                ),
                pulse_metric(
                    "resilience-watch",
                    LocalizedText::new("สัญญาณเฝ้าระวัง", "Watch Signals"),
                    warnings,
                    Tone::Warning,
                ),
                pulse_metric(
                    "data-sources",
                    LocalizedText::new("แหล่งข้อมูลพร้อมใช้งาน", "Healthy Sources"),
                    live_sources,
                    Tone::Positive,
                ),
            ],
            briefing: state.briefing.clone(),
            last_sync_at: state.last_sync_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn news_limit_and_kind() {
        let store = FusionStore::new();
        let all = store.news(&NewsFilter::default());
        assert_eq!(all.len(), 3);

        let officials = store.news(&NewsFilter {
            kind: Some(NewsKind::Official),
            ..Default::default()
        });
        assert!(officials.iter().all(|n| n.kind == NewsKind::Official));

        let one = store.news(&NewsFilter {
            limit: Some(1),
            ..Default::default()
        });
        assert_eq!(one.len(), 1);
    }

    #[test]
    fn untagged_news_matches_any_city() {
        let store = FusionStore::new();
        let items = store.news(&NewsFilter {
            city: Some("bangkok".into()),
            ..Default::default()
        });
        // The Chiang Mai item is tagged and excluded; untagged items stay.
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn project_lookup_by_id_or_slug() {
        let store = FusionStore::new();
        let first = store.projects(&ProjectFilter::default()).remove(0);
        assert_eq!(store.project(&first.id).map(|p| p.slug), Some(first.slug.clone()));
        assert!(store.project(&first.slug).is_some());
        assert!(store.project("nope").is_none());
    }

    #[test]
    fn returned_copies_are_independent() {
        let store = FusionStore::new();
        let mut copy = store.resilience();
        copy.aqi = 999;
        copy.warnings.clear();
        assert_eq!(store.resilience().aqi, 68);
        assert_eq!(store.resilience().warnings.len(), 2);
    }

    #[test]
    fn unknown_layer_yields_nothing() {
        let store = FusionStore::new();
        assert!(store.map_features(Some("missing")).is_empty());
        assert_eq!(store.map_features(None).len(), 1);
    }

    #[test]
    fn overview_counts_coverage_features() {
        let store = FusionStore::new();
        let o = store.overview(&OverviewFilter::default());
        let tracked = o.metrics.iter().find(|m| m.id == "cities-tracked");
        assert_eq!(tracked.map(|m| m.value), Some(8));
        assert_eq!(tracked.map(|m| m.display_value.as_str()), Some("08"));
        assert!(o.last_sync_at.is_none());
    }
}
