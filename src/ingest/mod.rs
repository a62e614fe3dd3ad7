// src/ingest/mod.rs
pub mod config;
pub mod http;
pub mod providers;
pub mod scheduler;
pub mod types;

use futures::future::join_all;
use futures::FutureExt;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::ingest::config::SyncConfig;
use crate::ingest::http::Fetcher;
use crate::ingest::providers::{
    citydata::CitydataAdapter, data_go_th::DataGoThAdapter, gdelt::GdeltAdapter,
    gistda_disaster::GistdaDisasterAdapter, google_news_rss::GoogleNewsRssAdapter,
    open_meteo_air::OpenMeteoAirAdapter, open_meteo_weather::OpenMeteoWeatherAdapter,
    time_sync::TimeSyncAdapter, urbanis::UrbanisAdapter, youtube_signals::YoutubeSignalsAdapter,
};
use crate::ingest::types::{SourceAdapter, SyncResult};
use crate::model::SourceHealthRecord;
use crate::store::FusionStore;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("sync_cycles_total", "Completed sync cycles.");
        describe_counter!(
            "sync_adapter_defects_total",
            "Adapters that errored or panicked instead of reporting a status."
        );
        describe_counter!("sync_results_total", "Sync results applied, by status.");
        describe_counter!("sync_http_errors_total", "Upstream HTTP failures.");
        describe_counter!("sync_news_items_total", "External news items imported.");
        describe_histogram!("sync_cycle_ms", "Fan-out/fan-in time per cycle in milliseconds.");
        describe_histogram!("sync_rss_parse_ms", "RSS parse time in milliseconds.");
        describe_gauge!("sync_last_cycle_ts", "Unix ts of the last applied cycle.");
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

/// Runs every registered adapter concurrently and hands the batch to the store.
#[derive(Clone)]
pub struct SyncOrchestrator {
    adapters: Arc<Vec<Arc<dyn SourceAdapter>>>,
    store: FusionStore,
}

impl SyncOrchestrator {
    pub fn new(store: FusionStore, adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        ensure_metrics_described();
        Self {
            adapters: Arc::new(adapters),
            store,
        }
    }

    /// Orchestrator over the built-in adapter set.
    pub fn with_default_adapters(store: FusionStore, cfg: &SyncConfig) -> Self {
        Self::new(store, default_adapters(cfg))
    }

    pub fn store(&self) -> &FusionStore {
        &self.store
    }

    pub fn source_ids(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.source_id()).collect()
    }

    /// Exactly one result per adapter, in registration order. An adapter that
    /// returns `Err` or panics yields a stale fallback under its own id.
    pub async fn collect(&self) -> Vec<SyncResult> {
        let tasks = self.adapters.iter().map(|adapter| {
            let adapter = Arc::clone(adapter);
            async move {
                let source_id = adapter.source_id();
                let outcome = AssertUnwindSafe(async { adapter.sync().await })
                    .catch_unwind()
                    .await;
                match outcome {
                    Ok(Ok(result)) => result,
                    Ok(Err(e)) => {
                        tracing::warn!(target: "sync", source_id, error = ?e, "adapter failed");
                        counter!("sync_adapter_defects_total").increment(1);
                        SyncResult::fallback(source_id)
                    }
                    Err(payload) => {
                        let msg = panic_message(payload.as_ref());
                        tracing::warn!(target: "sync", source_id, panic = %msg, "adapter panicked");
                        counter!("sync_adapter_defects_total").increment(1);
                        SyncResult::fallback(source_id)
                    }
                }
            }
        });
        join_all(tasks).await
    }

    /// One full cycle: fan out, fan in, merge.
    pub async fn run_once(&self) -> Vec<SourceHealthRecord> {
        let t0 = std::time::Instant::now();
        let results = self.collect().await;
        histogram!("sync_cycle_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let health = self.store.apply_sync_results(results);
        counter!("sync_cycles_total").increment(1);
        health
    }
}

/// Built-in adapters in registration order.
pub fn default_adapters(cfg: &SyncConfig) -> Vec<Arc<dyn SourceAdapter>> {
    let fetcher = Fetcher::new(cfg.allow_live_fetch);
    vec![
        Arc::new(CitydataAdapter::new(cfg, fetcher.clone())),
        Arc::new(DataGoThAdapter::new(cfg, fetcher.clone())),
        Arc::new(UrbanisAdapter::new(cfg, fetcher.clone())),
        Arc::new(GistdaDisasterAdapter::new(cfg, fetcher.clone())),
        Arc::new(GoogleNewsRssAdapter::new(cfg, fetcher.clone())),
        Arc::new(GdeltAdapter::new(cfg, fetcher.clone())),
        Arc::new(YoutubeSignalsAdapter::new(cfg, fetcher.clone())),
        Arc::new(OpenMeteoWeatherAdapter::new(cfg, fetcher.clone())),
        Arc::new(OpenMeteoAirAdapter::new(cfg, fetcher)),
        Arc::new(TimeSyncAdapter),
    ]
}
