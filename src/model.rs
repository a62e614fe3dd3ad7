//! # Canonical model
//! Entity types owned by the fusion store and exchanged with source adapters.
//!
//! Everything serializes as camelCase JSON so the serving layer can hand the
//! structures out unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How current/trustworthy a source's latest result is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreshnessStatus {
    Live,
    Delayed,
    Stale,
    Manual,
}

impl FreshnessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FreshnessStatus::Live => "live",
            FreshnessStatus::Delayed => "delayed",
            FreshnessStatus::Stale => "stale",
            FreshnessStatus::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    Live,
    Cached,
    Manual,
}

/// Bilingual label (Thai / English).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalizedText {
    pub th: String,
    pub en: String,
}

impl LocalizedText {
    pub fn new(th: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            th: th.into(),
            en: en.into(),
        }
    }

    /// Same text in both locales.
    pub fn both(text: impl Into<String>) -> Self {
        let t = text.into();
        Self {
            th: t.clone(),
            en: t,
        }
    }
}

/// Provenance attached to every entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMeta {
    pub source_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub fetched_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub freshness_status: FreshnessStatus,
    pub confidence: f32,
    pub fallback_mode: FallbackMode,
}

impl SourceMeta {
    /// Provenance for data observed live at `at`.
    pub fn live(
        source_name: impl Into<String>,
        source_url: impl Into<String>,
        at: DateTime<Utc>,
        confidence: f32,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            source_url: Some(source_url.into()),
            fetched_at: at,
            published_at: Some(at),
            freshness_status: FreshnessStatus::Live,
            confidence,
            fallback_mode: FallbackMode::Live,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Steady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    Neutral,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainScorecard {
    pub id: String,
    pub slug: String,
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub score: u32,
    pub trend: TrendDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityScore {
    pub domain_slug: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityProfile {
    pub id: String,
    pub slug: String,
    pub name: LocalizedText,
    pub region: LocalizedText,
    pub population: u64,
    pub focus: LocalizedText,
    pub scores: Vec<CityScore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Watch,
    Delayed,
    Planned,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Watch => "watch",
            ProjectStatus::Delayed => "delayed",
            ProjectStatus::Planned => "planned",
        }
    }
}

/// A tracked program. Unique by `slug`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: String,
    pub slug: String,
    pub title: LocalizedText,
    pub city_slug: String,
    pub domain_slug: String,
    pub status: ProjectStatus,
    pub completion_percent: u8,
    pub owner: LocalizedText,
    pub summary: LocalizedText,
    pub next_milestone: LocalizedText,
    pub updated_at: DateTime<Utc>,
    pub source: SourceMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsKind {
    /// Manually curated; never removed by a sync cycle.
    Official,
    External,
}

impl NewsKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsKind::Official => "official",
            NewsKind::External => "external",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub slug: String,
    pub title: LocalizedText,
    pub excerpt: LocalizedText,
    pub kind: NewsKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_slug: Option<String>,
    pub published_at: DateTime<Utc>,
    pub source: SourceMeta,
}

impl NewsItem {
    /// External identity: (English title, publishedAt).
    pub fn identity(&self) -> (&str, DateTime<Utc>) {
        (self.title.en.as_str(), self.published_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Signal,
    Dataset,
    External,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapLayerConfig {
    pub id: String,
    pub label: LocalizedText,
    pub active: bool,
    pub color: String,
    pub kind: LayerKind,
    pub default_views: Vec<String>,
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
}

/// Scalar property value attached to a map feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Number(f64),
    Flag(bool),
    Null,
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Number(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Number(v as f64)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(PropertyValue::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoFeatureRecord {
    pub id: String,
    pub layer_id: String,
    pub geometry_type: GeometryType,
    pub coordinates: serde_json::Value,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub properties: BTreeMap<String, PropertyValue>,
    pub source: SourceMeta,
}

/// All features of one layer. Replaced wholesale, never merged per feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapFeatureCollection {
    pub layer_id: String,
    pub updated_at: DateTime<Utc>,
    pub features: Vec<GeoFeatureRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<[f64; 4]>,
    pub source: SourceMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Tv,
    Webcam,
    Stream,
    Link,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Tv => "tv",
            MediaKind::Webcam => "webcam",
            MediaKind::Stream => "stream",
            MediaKind::Link => "link",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaStatus {
    Live,
    Offline,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFeedItem {
    #[serde(default)]
    pub id: String,
    pub kind: MediaKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    pub is_embeddable: bool,
    pub status: MediaStatus,
    pub source: SourceMeta,
}

impl MediaFeedItem {
    /// Identity: id, else externalUrl, else label. Empty strings count as absent.
    pub fn identity(&self) -> &str {
        if !self.id.is_empty() {
            return &self.id;
        }
        match self.external_url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => &self.label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResilienceSnapshot {
    pub updated_at: DateTime<Utc>,
    pub weather_summary: LocalizedText,
    pub pollution_summary: LocalizedText,
    pub warnings: Vec<LocalizedText>,
    pub weather_temperature_c: f64,
    pub aqi: u32,
    pub source: SourceMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePulseItem {
    pub id: String,
    pub label: LocalizedText,
    pub value: u64,
    pub tone: Tone,
    pub detail: LocalizedText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdState {
    Ok,
    Watch,
    Alert,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePulseThreshold {
    pub id: String,
    pub label: LocalizedText,
    pub state: ThresholdState,
    pub detail: LocalizedText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePulse {
    pub updated_at: DateTime<Utc>,
    pub items: Vec<ChangePulseItem>,
    pub thresholds: Vec<ChangePulseThreshold>,
}

impl ChangePulse {
    pub fn item(&self, id: &str) -> Option<&ChangePulseItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn threshold(&self, id: &str) -> Option<&ChangePulseThreshold> {
        self.thresholds.iter().find(|t| t.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogItem {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub source_id: String,
    pub label: String,
    pub detail: String,
    pub status: FreshnessStatus,
}

/// Invariant: `positive_share` in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialListeningSnapshot {
    pub updated_at: DateTime<Utc>,
    pub mention_count: u64,
    pub sentiment_score: i64,
    pub source_count: u64,
    pub positive_share: f64,
    pub dominant_source: String,
    pub top_terms: Vec<String>,
    pub source: SourceMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficialImpactSnapshot {
    pub updated_at: DateTime<Utc>,
    pub official_updates: u64,
    pub live_sources: u64,
    pub tracked_cities: u64,
    pub public_signals: u64,
    pub latest_headline: LocalizedText,
    pub source: SourceMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketItem {
    pub id: String,
    pub label: LocalizedText,
    pub value: String,
    pub change_text: LocalizedText,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub updated_at: DateTime<Utc>,
    pub items: Vec<MarketItem>,
    pub source: SourceMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceCategory {
    Catalog,
    News,
    Environment,
    Time,
    Geospatial,
    Other,
}

/// Catalog entry for a registered upstream source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
    pub id: String,
    pub name: String,
    pub category: SourceCategory,
    pub url: String,
    pub freshness_status: FreshnessStatus,
    pub last_checked_at: DateTime<Utc>,
    pub message: String,
}

/// Latest status of one source; overwritten each cycle it reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceHealthRecord {
    pub source_id: String,
    pub status: FreshnessStatus,
    pub fetched_at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BriefingNote {
    pub id: String,
    pub headline: LocalizedText,
    pub body: LocalizedText,
    pub updated_at: DateTime<Utc>,
    pub source: SourceMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeZoneReading {
    pub label: String,
    pub time_zone: String,
    pub local_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSnapshot {
    pub updated_at: DateTime<Utc>,
    pub utc_iso: String,
    pub bangkok_iso: String,
    pub zones: Vec<TimeZoneReading>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PulseMetric {
    pub id: String,
    pub label: LocalizedText,
    pub value: u64,
    pub display_value: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewSnapshot {
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_domain: Option<String>,
    pub active_layers: Vec<String>,
    pub metrics: Vec<PulseMetric>,
    pub briefing: BriefingNote,
    pub last_sync_at: Option<DateTime<Utc>>,
}
