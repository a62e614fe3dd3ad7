// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod activity;
pub mod api;
pub mod health;
pub mod ingest;
pub mod metrics;
pub mod model;
pub mod seed;
pub mod store;

pub use crate::api::{create_router, AppState};
pub use crate::ingest::{config::SyncConfig, SyncOrchestrator};
pub use crate::store::FusionStore;

/// Build the in-process app (store, orchestrator, router) from a config.
/// Does not install the metrics recorder or start the scheduler.
pub fn app(cfg: &SyncConfig) -> (axum::Router, SyncOrchestrator) {
    let store = FusionStore::new();
    let orchestrator = SyncOrchestrator::with_default_adapters(store, cfg);
    let state = AppState::new(orchestrator.clone(), cfg.admin_token.as_str());
    (create_router(state), orchestrator)
}
