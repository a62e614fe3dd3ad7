// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    FreshnessStatus, LocalizedText, MapFeatureCollection, MarketItem, MarketSnapshot,
    MediaFeedItem, NewsItem, OfficialImpactSnapshot, ProjectRecord, ResilienceSnapshot,
    SocialListeningSnapshot, SourceHealthRecord, SourceMeta, TimeSnapshot,
};

/// Canonical output of one source adapter for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub source_id: String,
    pub status: FreshnessStatus,
    pub fetched_at: DateTime<Utc>,
    pub message: String,
    pub source_url: String,
    #[serde(default)]
    pub news_items: Vec<NewsItem>,
    #[serde(default)]
    pub project_records: Vec<ProjectRecord>,
    #[serde(default)]
    pub map_feature_collections: Vec<MapFeatureCollection>,
    #[serde(default)]
    pub media_feeds: Vec<MediaFeedItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resilience_patch: Option<ResiliencePatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_listening_patch: Option<SocialListeningPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub official_impact_patch: Option<OfficialImpactPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_snapshot_patch: Option<MarketSnapshotPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_signal: Option<SocialSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_snapshot: Option<TimeSnapshot>,
}

impl SyncResult {
    /// Bare result with no patches, stamped now.
    pub fn new(
        source_id: impl Into<String>,
        status: FreshnessStatus,
        message: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            status,
            fetched_at: Utc::now(),
            message: message.into(),
            source_url: source_url.into(),
            news_items: Vec::new(),
            project_records: Vec::new(),
            map_feature_collections: Vec::new(),
            media_feeds: Vec::new(),
            resilience_patch: None,
            social_listening_patch: None,
            official_impact_patch: None,
            market_snapshot_patch: None,
            social_signal: None,
            time_snapshot: None,
        }
    }

    /// Source not configured: keep serving cached data.
    pub fn manual(source_id: &str, message: impl Into<String>, source_url: &str) -> Self {
        Self::new(source_id, FreshnessStatus::Manual, message, source_url)
    }

    /// Configured but failed or empty.
    pub fn stale(source_id: &str, message: impl Into<String>, source_url: &str) -> Self {
        Self::new(source_id, FreshnessStatus::Stale, message, source_url)
    }

    /// Synthetic result for an adapter that crashed instead of reporting.
    pub fn fallback(source_id: &str) -> Self {
        Self::new(
            source_id,
            FreshnessStatus::Stale,
            "Sync failed unexpectedly.",
            "",
        )
    }

    pub fn live(source_id: &str, message: impl Into<String>, source_url: &str) -> Self {
        Self::new(source_id, FreshnessStatus::Live, message, source_url)
    }

    pub fn at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = fetched_at;
        self
    }

    pub fn with_news(mut self, items: Vec<NewsItem>) -> Self {
        self.news_items = items;
        self
    }

    pub fn with_projects(mut self, items: Vec<ProjectRecord>) -> Self {
        self.project_records = items;
        self
    }

    pub fn with_map(mut self, items: Vec<MapFeatureCollection>) -> Self {
        self.map_feature_collections = items;
        self
    }

    pub fn with_media(mut self, items: Vec<MediaFeedItem>) -> Self {
        self.media_feeds = items;
        self
    }

    pub fn with_resilience(mut self, patch: ResiliencePatch) -> Self {
        self.resilience_patch = Some(patch);
        self
    }

    pub fn with_social_signal(mut self, signal: SocialSignal) -> Self {
        self.social_signal = Some(signal);
        self
    }

    pub fn with_time(mut self, snapshot: TimeSnapshot) -> Self {
        self.time_snapshot = Some(snapshot);
        self
    }

    pub fn health_record(&self) -> SourceHealthRecord {
        SourceHealthRecord {
            source_id: self.source_id.clone(),
            status: self.status,
            fetched_at: self.fetched_at,
            message: self.message.clone(),
        }
    }
}

/// Social-listening observation reported by one adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialSignal {
    pub mention_count: u64,
    pub sentiment_score: f64,
    pub source_count: u64,
    pub positive_share: f64,
    pub dominant_source: String,
    pub top_terms: Vec<String>,
    pub source_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResiliencePatch {
    pub weather_summary: Option<LocalizedText>,
    pub pollution_summary: Option<LocalizedText>,
    pub warnings: Option<Vec<LocalizedText>>,
    pub weather_temperature_c: Option<f64>,
    pub aqi: Option<u32>,
}

impl ResiliencePatch {
    pub fn apply_to(self, target: &mut ResilienceSnapshot) {
        if let Some(v) = self.weather_summary {
            target.weather_summary = v;
        }
        if let Some(v) = self.pollution_summary {
            target.pollution_summary = v;
        }
        if let Some(v) = self.warnings {
            target.warnings = v;
        }
        if let Some(v) = self.weather_temperature_c {
            target.weather_temperature_c = v;
        }
        if let Some(v) = self.aqi {
            target.aqi = v;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialListeningPatch {
    pub mention_count: Option<u64>,
    pub sentiment_score: Option<i64>,
    pub source_count: Option<u64>,
    pub positive_share: Option<f64>,
    pub dominant_source: Option<String>,
    pub top_terms: Option<Vec<String>>,
}

impl SocialListeningPatch {
    pub fn apply_to(self, target: &mut SocialListeningSnapshot) {
        if let Some(v) = self.mention_count {
            target.mention_count = v;
        }
        if let Some(v) = self.sentiment_score {
            target.sentiment_score = v;
        }
        if let Some(v) = self.source_count {
            target.source_count = v;
        }
        if let Some(v) = self.positive_share {
            target.positive_share = v.clamp(0.0, 1.0);
        }
        if let Some(v) = self.dominant_source {
            target.dominant_source = v;
        }
        if let Some(v) = self.top_terms {
            target.top_terms = v;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficialImpactPatch {
    pub official_updates: Option<u64>,
    pub live_sources: Option<u64>,
    pub tracked_cities: Option<u64>,
    pub public_signals: Option<u64>,
    pub latest_headline: Option<LocalizedText>,
}

impl OfficialImpactPatch {
    pub fn apply_to(self, target: &mut OfficialImpactSnapshot) {
        if let Some(v) = self.official_updates {
            target.official_updates = v;
        }
        if let Some(v) = self.live_sources {
            target.live_sources = v;
        }
        if let Some(v) = self.tracked_cities {
            target.tracked_cities = v;
        }
        if let Some(v) = self.public_signals {
            target.public_signals = v;
        }
        if let Some(v) = self.latest_headline {
            target.latest_headline = v;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshotPatch {
    pub items: Option<Vec<MarketItem>>,
    pub source: Option<SourceMeta>,
}

impl MarketSnapshotPatch {
    pub fn apply_to(self, target: &mut MarketSnapshot) {
        if let Some(v) = self.items {
            target.items = v;
        }
        if let Some(v) = self.source {
            target.source = v;
        }
    }
}

/// Upstream payload could not be turned into canonical entities.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("endpoint not configured")]
    NotConfigured,
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
    #[error("payload was empty")]
    Empty,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("value out of range for `{field}`: {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl PayloadError {
    /// Status an adapter reports for this failure.
    pub fn status(&self) -> FreshnessStatus {
        match self {
            PayloadError::NotConfigured => FreshnessStatus::Manual,
            _ => FreshnessStatus::Stale,
        }
    }
}

/// One upstream source. Expected failures are reported through the returned
/// `SyncResult` (`manual`/`stale`); an `Err` means the adapter itself is broken.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn sync(&self) -> Result<SyncResult>;
    fn source_id(&self) -> &'static str;
}
