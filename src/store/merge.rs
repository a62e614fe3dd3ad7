//! Merge rules applied once per cycle. Every step treats an empty input as a
//! no-op so cached data survives cycles in which a source had nothing to say.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::health::HealthRegistry;
use crate::ingest::types::SyncResult;
use crate::model::{
    ActivityLogItem, MapFeatureCollection, MediaFeedItem, NewsItem, NewsKind, ProjectRecord,
};

use super::StoreState;

/// Shallow-merge the optional singleton patches of one result.
pub fn apply_singleton_patches(state: &mut StoreState, result: &mut SyncResult, now: DateTime<Utc>) {
    if let Some(patch) = result.resilience_patch.take() {
        patch.apply_to(&mut state.resilience);
        state.resilience.updated_at = now;
        state.resilience.source.fetched_at = now;
        state.resilience.source.freshness_status = result.status;
    }

    if let Some(patch) = result.social_listening_patch.take() {
        patch.apply_to(&mut state.social_listening);
        state.social_listening.updated_at = now;
    }

    if let Some(patch) = result.official_impact_patch.take() {
        patch.apply_to(&mut state.official_impact);
        state.official_impact.updated_at = now;
    }

    if let Some(patch) = result.market_snapshot_patch.take() {
        patch.apply_to(&mut state.market);
        state.market.updated_at = now;
    }

    if let Some(snapshot) = result.time_snapshot.take() {
        state.latest_time = snapshot;
    }
}

/// Official items stay untouched; externals are replaced by the deduplicated
/// incoming set, identity (title, publishedAt), first occurrence wins.
pub fn fuse_news(current: &mut Vec<NewsItem>, incoming: Vec<NewsItem>) {
    if incoming.is_empty() {
        return;
    }

    let mut seen = HashSet::new();
    let external: Vec<NewsItem> = incoming
        .into_iter()
        .filter(|item| seen.insert((item.title.en.clone(), item.published_at)))
        .collect();

    let mut merged: Vec<NewsItem> = current
        .drain(..)
        .filter(|item| item.kind == NewsKind::Official)
        .collect();
    merged.extend(external);
    *current = merged;
}

/// New-first precedence: incoming records shadow existing ones with the same
/// slug, first occurrence wins.
pub fn fuse_projects(current: &mut Vec<ProjectRecord>, incoming: Vec<ProjectRecord>) {
    if incoming.is_empty() {
        return;
    }

    for record in &incoming {
        if let Some(existing) = current.iter().find(|p| p.slug == record.slug) {
            if record.updated_at < existing.updated_at {
                tracing::warn!(
                    target: "store",
                    slug = %record.slug,
                    incoming = %record.updated_at,
                    existing = %existing.updated_at,
                    "older project record replaces newer one"
                );
            }
        }
    }

    let mut seen = HashSet::new();
    let merged: Vec<ProjectRecord> = incoming
        .into_iter()
        .chain(current.drain(..))
        .filter(|p| seen.insert(p.slug.clone()))
        .collect();
    *current = merged;
}

/// Each supplied collection replaces its layer wholesale.
pub fn fuse_map_layers(
    current: &mut Vec<MapFeatureCollection>,
    incoming: Vec<MapFeatureCollection>,
    now: DateTime<Utc>,
) {
    for mut collection in incoming {
        collection.updated_at = now;
        match current.iter_mut().find(|c| c.layer_id == collection.layer_id) {
            Some(slot) => *slot = collection,
            None => current.push(collection),
        }
    }
}

/// Incoming feeds first, deduplicated by id / externalUrl / label.
pub fn fuse_media(current: &mut Vec<MediaFeedItem>, incoming: Vec<MediaFeedItem>) {
    if incoming.is_empty() {
        return;
    }

    let mut seen = HashSet::new();
    let merged: Vec<MediaFeedItem> = incoming
        .into_iter()
        .chain(current.drain(..))
        .filter(|m| seen.insert(m.identity().to_string()))
        .collect();
    *current = merged;
}

/// One activity entry per result, in batch order.
pub fn activity_entries(results: &[SyncResult], health: &HealthRegistry) -> Vec<ActivityLogItem> {
    results
        .iter()
        .enumerate()
        .map(|(index, r)| ActivityLogItem {
            id: format!(
                "activity-{}-{}-{}",
                r.source_id,
                r.fetched_at.to_rfc3339(),
                index
            ),
            timestamp: r.fetched_at,
            source_id: r.source_id.clone(),
            label: health.display_name(&r.source_id).to_string(),
            detail: r.message.clone(),
            status: r.status,
        })
        .collect()
}
