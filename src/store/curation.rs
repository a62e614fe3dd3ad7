//! Manual curation actions. Curated news is `official` kind, so no sync cycle
//! ever removes it.

use chrono::Utc;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

use crate::model::*;
use crate::seed::OFFICIAL_PUBLISHER;

use super::FusionStore;

static ID_SEQ: AtomicU64 = AtomicU64::new(1);

fn next_id(prefix: &str) -> String {
    let seq = ID_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{seq}", Utc::now().timestamp_millis())
}

#[derive(Debug, Error, PartialEq)]
pub enum CurationError {
    #[error("no {kind} with id {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("invalid input: {0}")]
    Invalid(String),
}

fn manual_meta(source_name: Option<String>, source_url: Option<String>) -> SourceMeta {
    let now = Utc::now();
    SourceMeta {
        source_name: source_name.unwrap_or_else(|| OFFICIAL_PUBLISHER.to_string()),
        source_url,
        fetched_at: now,
        published_at: Some(now),
        freshness_status: FreshnessStatus::Manual,
        confidence: 0.9,
        fallback_mode: FallbackMode::Manual,
    }
}

fn check_percent(value: u8) -> Result<u8, CurationError> {
    if value > 100 {
        return Err(CurationError::Invalid(format!(
            "completionPercent {value} exceeds 100"
        )));
    }
    Ok(value)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsDraft {
    pub title: LocalizedText,
    pub excerpt: LocalizedText,
    #[serde(default)]
    pub city_slug: Option<String>,
    #[serde(default)]
    pub domain_slug: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsPatch {
    pub title: Option<LocalizedText>,
    pub excerpt: Option<LocalizedText>,
    pub city_slug: Option<String>,
    pub domain_slug: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub title: LocalizedText,
    pub city_slug: String,
    pub domain_slug: String,
    pub status: ProjectStatus,
    pub completion_percent: u8,
    pub owner: LocalizedText,
    pub summary: LocalizedText,
    pub next_milestone: LocalizedText,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    pub title: Option<LocalizedText>,
    pub status: Option<ProjectStatus>,
    pub completion_percent: Option<u8>,
    pub owner: Option<LocalizedText>,
    pub summary: Option<LocalizedText>,
    pub next_milestone: Option<LocalizedText>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BriefingDraft {
    pub headline: LocalizedText,
    pub body: LocalizedText,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFeedDraft {
    pub kind: MediaKind,
    pub label: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub embed_url: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub is_embeddable: bool,
    #[serde(default = "default_media_status")]
    pub status: MediaStatus,
}

fn default_media_status() -> MediaStatus {
    MediaStatus::Unknown
}

impl FusionStore {
    pub fn create_news(&self, draft: NewsDraft) -> NewsItem {
        let id = next_id("news");
        let item = NewsItem {
            slug: id.clone(),
            id,
            title: draft.title,
            excerpt: draft.excerpt,
            kind: NewsKind::Official,
            city_slug: draft.city_slug,
            domain_slug: draft.domain_slug,
            published_at: Utc::now(),
            source: manual_meta(draft.source_name, draft.source_url),
        };
        self.write().news.insert(0, item.clone());
        tracing::info!(target: "curation", id = %item.id, "official news created");
        item
    }

    pub fn update_news(&self, id: &str, patch: NewsPatch) -> Result<NewsItem, CurationError> {
        let mut state = self.write();
        let item = state
            .news
            .iter_mut()
            .find(|n| n.id == id || n.slug == id)
            .ok_or_else(|| CurationError::NotFound {
                kind: "news item",
                id: id.to_string(),
            })?;

        if let Some(v) = patch.title {
            item.title = v;
        }
        if let Some(v) = patch.excerpt {
            item.excerpt = v;
        }
        if patch.city_slug.is_some() {
            item.city_slug = patch.city_slug;
        }
        if patch.domain_slug.is_some() {
            item.domain_slug = patch.domain_slug;
        }
        Ok(item.clone())
    }

    pub fn create_project(&self, draft: ProjectDraft) -> Result<ProjectRecord, CurationError> {
        let completion_percent = check_percent(draft.completion_percent)?;
        let id = next_id("project");
        let record = ProjectRecord {
            slug: id.clone(),
            id,
            title: draft.title,
            city_slug: draft.city_slug,
            domain_slug: draft.domain_slug,
            status: draft.status,
            completion_percent,
            owner: draft.owner,
            summary: draft.summary,
            next_milestone: draft.next_milestone,
            updated_at: Utc::now(),
            source: manual_meta(draft.source_name, draft.source_url),
        };
        self.write().projects.insert(0, record.clone());
        tracing::info!(target: "curation", slug = %record.slug, "project created");
        Ok(record)
    }

    pub fn update_project(
        &self,
        id: &str,
        patch: ProjectPatch,
    ) -> Result<ProjectRecord, CurationError> {
        let completion = patch.completion_percent.map(check_percent).transpose()?;

        let mut state = self.write();
        let record = state
            .projects
            .iter_mut()
            .find(|p| p.id == id || p.slug == id)
            .ok_or_else(|| CurationError::NotFound {
                kind: "project",
                id: id.to_string(),
            })?;

        if let Some(v) = patch.title {
            record.title = v;
        }
        if let Some(v) = patch.status {
            record.status = v;
        }
        if let Some(v) = completion {
            record.completion_percent = v;
        }
        if let Some(v) = patch.owner {
            record.owner = v;
        }
        if let Some(v) = patch.summary {
            record.summary = v;
        }
        if let Some(v) = patch.next_milestone {
            record.next_milestone = v;
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    /// Replace the briefing; official impact's headline follows it.
    pub fn set_briefing(&self, draft: BriefingDraft) -> BriefingNote {
        let now = Utc::now();
        let mut state = self.write();
        let briefing = &mut state.briefing;
        briefing.headline = draft.headline;
        briefing.body = draft.body;
        briefing.updated_at = now;
        briefing.source.fetched_at = now;
        briefing.source.published_at = Some(now);
        briefing.source.freshness_status = FreshnessStatus::Manual;

        let note = briefing.clone();
        state.official_impact.latest_headline = note.headline.clone();
        note
    }

    pub fn create_media_feed(&self, draft: MediaFeedDraft) -> Result<MediaFeedItem, CurationError> {
        if draft.label.trim().is_empty() {
            return Err(CurationError::Invalid("label must not be empty".into()));
        }
        let item = MediaFeedItem {
            id: next_id("media"),
            kind: draft.kind,
            source: manual_meta(Some("Curated Media Feeds".into()), draft.external_url.clone()),
            label: draft.label,
            region: draft.region,
            embed_url: draft.embed_url,
            external_url: draft.external_url,
            is_embeddable: draft.is_embeddable,
            status: draft.status,
        };
        self.write().media_feeds.insert(0, item.clone());
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::SyncResult;

    fn draft() -> NewsDraft {
        NewsDraft {
            title: LocalizedText::both("Council approves data charter"),
            excerpt: LocalizedText::both("Charter covers open datasets."),
            city_slug: None,
            domain_slug: None,
            source_name: None,
            source_url: None,
        }
    }

    #[test]
    fn curated_news_survives_sync() {
        let store = FusionStore::new();
        let created = store.create_news(draft());
        assert_eq!(created.kind, NewsKind::Official);

        let external = store.news(&Default::default())[2].clone();
        store.apply_sync_results(vec![
            SyncResult::live("google-news-rss", "ok", "").with_news(vec![external])
        ]);

        assert_eq!(store.news_item(&created.id), Some(created));
    }

    #[test]
    fn ids_are_unique() {
        let store = FusionStore::new();
        let a = store.create_news(draft());
        let b = store.create_news(draft());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn update_project_validates_and_404s() {
        let store = FusionStore::new();
        let err = store
            .update_project("project-1", ProjectPatch {
                completion_percent: Some(101),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, CurationError::Invalid(_)));

        let missing = store.update_project("nope", ProjectPatch::default());
        assert!(matches!(missing, Err(CurationError::NotFound { .. })));

        let ok = store
            .update_project("bangkok-flood-command", ProjectPatch {
                completion_percent: Some(90),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(ok.completion_percent, 90);
        assert_eq!(store.project("project-1").unwrap().completion_percent, 90);
    }

    #[test]
    fn briefing_updates_impact_headline() {
        let store = FusionStore::new();
        let note = store.set_briefing(BriefingDraft {
            headline: LocalizedText::both("New headline"),
            body: LocalizedText::both("Body"),
        });
        assert_eq!(store.official_impact().latest_headline, note.headline);
        assert_eq!(note.source.freshness_status, FreshnessStatus::Manual);
    }
}
