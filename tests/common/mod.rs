// tests/common/mod.rs
// Shared builders for integration tests.
#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use city_pulse_fusion::ingest::types::{SourceAdapter, SyncResult};
use city_pulse_fusion::model::*;

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_772_300_000 + secs, 0).unwrap()
}

pub fn meta(name: &str) -> SourceMeta {
    SourceMeta::live(name, "https://source.test", at(0), 0.8)
}

pub fn external(title: &str, published: DateTime<Utc>) -> NewsItem {
    let slug = title.to_lowercase().replace(' ', "-");
    NewsItem {
        id: slug.clone(),
        slug,
        title: LocalizedText::both(title),
        excerpt: LocalizedText::both(format!("{title} excerpt")),
        kind: NewsKind::External,
        city_slug: None,
        domain_slug: None,
        published_at: published,
        source: meta("Feed X"),
    }
}

pub fn project(slug: &str, completion: u8, updated: DateTime<Utc>) -> ProjectRecord {
    ProjectRecord {
        id: format!("id-{slug}"),
        slug: slug.into(),
        title: LocalizedText::both(slug),
        city_slug: "bangkok".into(),
        domain_slug: "mobility".into(),
        status: ProjectStatus::Active,
        completion_percent: completion,
        owner: LocalizedText::both("Owner"),
        summary: LocalizedText::both("Summary"),
        next_milestone: LocalizedText::both("Next"),
        updated_at: updated,
        source: meta("Projects API"),
    }
}

pub fn media(id: &str, status: MediaStatus) -> MediaFeedItem {
    MediaFeedItem {
        id: id.into(),
        kind: MediaKind::Stream,
        label: format!("Label {id}"),
        region: None,
        embed_url: None,
        external_url: Some(format!("https://media.test/{id}")),
        is_embeddable: true,
        status,
        source: meta("Media Y"),
    }
}

pub fn minutes(n: i64) -> Duration {
    Duration::minutes(n)
}

/// Adapter returning a fixed result.
pub struct Fixed(pub SyncResult);

#[async_trait::async_trait]
impl SourceAdapter for Fixed {
    async fn sync(&self) -> anyhow::Result<SyncResult> {
        Ok(self.0.clone())
    }
    fn source_id(&self) -> &'static str {
        "fixed"
    }
}

/// Adapter that fails with an error.
pub struct Failing(pub &'static str);

#[async_trait::async_trait]
impl SourceAdapter for Failing {
    async fn sync(&self) -> anyhow::Result<SyncResult> {
        anyhow::bail!("upstream client exploded")
    }
    fn source_id(&self) -> &'static str {
        self.0
    }
}

/// Adapter that panics.
pub struct Panicking(pub &'static str);

#[async_trait::async_trait]
impl SourceAdapter for Panicking {
    async fn sync(&self) -> anyhow::Result<SyncResult> {
        panic!("adapter bug")
    }
    fn source_id(&self) -> &'static str {
        self.0
    }
}
