//! # Fusion Store
//! The single mutable source of truth for every canonical entity.
//!
//! `FusionStore` is a cheap, cloneable handle around one `StoreState`. A sync
//! batch is merged under a single write lock with no suspension point inside,
//! so readers only ever see the state before or after a whole cycle. Every
//! accessor hands out owned copies.

pub mod curation;
pub mod derived;
pub mod merge;
pub mod views;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::activity::ActivityLog;
use crate::health::HealthRegistry;
use crate::ingest::types::{SocialSignal, SyncResult};
use crate::model::*;
use crate::seed;

use self::derived::{CycleCounts, SocialBasis};

#[derive(Debug, Clone)]
pub struct StoreState {
    pub projects: Vec<ProjectRecord>,
    pub news: Vec<NewsItem>,
    pub health: HealthRegistry,
    pub briefing: BriefingNote,
    pub resilience: ResilienceSnapshot,
    pub change_pulse: ChangePulse,
    pub activity: ActivityLog,
    pub social_listening: SocialListeningSnapshot,
    pub official_impact: OfficialImpactSnapshot,
    pub market: MarketSnapshot,
    pub layers: Vec<MapLayerConfig>,
    /// Keyed by `layer_id`, kept in first-seen order.
    pub map_features: Vec<MapFeatureCollection>,
    pub media_feeds: Vec<MediaFeedItem>,
    pub cities: Vec<CityProfile>,
    pub domains: Vec<DomainScorecard>,
    pub latest_time: TimeSnapshot,
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl StoreState {
    pub fn from_seed() -> Self {
        let health = HealthRegistry::new(seed::sources());
        let social_listening = seed::social_listening();
        let resilience = seed::resilience();
        let change_pulse = derived::change_pulse(
            CycleCounts::default(),
            health.status_counts(),
            &social_listening,
            &resilience,
            seed::seeded_at(),
        );
        Self {
            projects: seed::projects(),
            news: seed::news(),
            health,
            briefing: seed::briefing(),
            resilience,
            change_pulse,
            activity: ActivityLog::default(),
            social_listening,
            official_impact: seed::official_impact(),
            market: seed::market(),
            layers: seed::map_layers(),
            map_features: seed::map_feature_collections(),
            media_feeds: seed::media_feeds(),
            cities: seed::cities(),
            domains: seed::domains(),
            latest_time: seed::time(),
            last_sync_at: None,
        }
    }

    pub fn map_collection(&self, layer_id: &str) -> Option<&MapFeatureCollection> {
        self.map_features.iter().find(|c| c.layer_id == layer_id)
    }

    /// Merge one cycle's results and recompute every derived indicator.
    pub fn apply(&mut self, results: Vec<SyncResult>, now: DateTime<Utc>) -> Vec<SourceHealthRecord> {
        self.last_sync_at = Some(now);

        // 1) health
        let batch_health = self.health.apply_batch(&results);
        let activity_entries = merge::activity_entries(&results, &self.health);

        // 2) singleton patches + gather list patches
        let mut incoming_news = Vec::new();
        let mut incoming_projects = Vec::new();
        let mut incoming_maps = Vec::new();
        let mut incoming_media = Vec::new();
        let mut signals: Vec<SocialSignal> = Vec::new();

        for mut result in results {
            merge::apply_singleton_patches(self, &mut result, now);
            incoming_news.extend(result.news_items);
            incoming_projects.extend(result.project_records);
            incoming_maps.extend(result.map_feature_collections);
            incoming_media.extend(result.media_feeds);
            signals.extend(result.social_signal);
        }

        let counts = CycleCounts {
            external_news: incoming_news.len() as u64,
            map_updates: incoming_maps.len() as u64,
            project_changes: incoming_projects.len() as u64,
        };

        // 3-6) list fusion
        merge::fuse_news(&mut self.news, incoming_news);
        merge::fuse_projects(&mut self.projects, incoming_projects);
        merge::fuse_map_layers(&mut self.map_features, incoming_maps, now);
        merge::fuse_media(&mut self.media_feeds, incoming_media);

        // 7) social listening
        let basis = if signals.is_empty() {
            SocialBasis::Heuristic {
                external_news: self
                    .news
                    .iter()
                    .filter(|n| n.kind == NewsKind::External)
                    .collect(),
                live_media: self
                    .media_feeds
                    .iter()
                    .filter(|m| m.status == MediaStatus::Live)
                    .collect(),
            }
        } else {
            SocialBasis::Observed(signals)
        };
        let social = derived::resolve_social_listening(basis, &self.social_listening, now);
        self.social_listening = social;

        // 8) change pulse
        let status_counts = self.health.status_counts();
        self.change_pulse = derived::change_pulse(
            counts,
            status_counts,
            &self.social_listening,
            &self.resilience,
            now,
        );

        // 9) activity
        self.activity.prepend(activity_entries);

        // 10) official impact
        self.official_impact = derived::official_impact(self, status_counts, now);

        for rec in &batch_health {
            counter!("sync_results_total", "status" => rec.status.as_str()).increment(1);
        }
        gauge!("sync_last_cycle_ts").set(now.timestamp() as f64);

        tracing::info!(
            target: "store",
            sources = batch_health.len(),
            live = status_counts.live,
            stale = status_counts.stale,
            delayed = status_counts.delayed,
            manual = status_counts.manual,
            new_signals = counts.total(),
            "sync cycle applied"
        );

        batch_health
    }
}

/// Shared handle to the canonical snapshot.
#[derive(Debug, Clone)]
pub struct FusionStore {
    inner: Arc<RwLock<StoreState>>,
}

impl FusionStore {
    /// Fresh store initialized from the static seed.
    pub fn new() -> Self {
        Self::from_state(StoreState::from_seed())
    }

    pub fn from_state(state: StoreState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Apply one batch stamped with the current time.
    pub fn apply_sync_results(&self, results: Vec<SyncResult>) -> Vec<SourceHealthRecord> {
        self.apply_sync_results_at(results, Utc::now())
    }

    pub fn apply_sync_results_at(
        &self,
        results: Vec<SyncResult>,
        now: DateTime<Utc>,
    ) -> Vec<SourceHealthRecord> {
        let mut state = self.write();
        state.apply(results, now)
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.inner.read().expect("store lock poisoned")
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.inner.write().expect("store lock poisoned")
    }
}

impl Default for FusionStore {
    fn default() -> Self {
        Self::new()
    }
}
