//! City Pulse Fusion: binary entrypoint.
//! Loads config, starts the sync scheduler and serves the read model over HTTP.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use city_pulse_fusion::ingest::scheduler::{spawn_sync_scheduler, SyncSchedulerCfg};
use city_pulse_fusion::metrics::Metrics;
use city_pulse_fusion::{create_router, AppState, FusionStore, SyncConfig, SyncOrchestrator};

/// Compact logs by default; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("city_pulse_fusion=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = SyncConfig::load_default().context("loading sync config")?;
    if cfg.admin_token == "change-me" {
        tracing::warn!(target: "boot", "ADMIN_TOKEN is the default value");
    }

    let metrics = Metrics::init(cfg.sync_interval_ms)?;

    let store = FusionStore::new();
    let orchestrator = SyncOrchestrator::with_default_adapters(store, &cfg);
    let _scheduler = spawn_sync_scheduler(orchestrator.clone(), SyncSchedulerCfg::from_config(&cfg));

    let state = AppState::new(orchestrator, cfg.admin_token.as_str());
    let app = create_router(state).merge(metrics.router());

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!(
        target: "boot",
        %addr,
        live_fetch = cfg.allow_live_fetch,
        interval_ms = cfg.sync_interval_ms,
        "city pulse fusion listening"
    );
    axum::serve(listener, app).await.context("http server")?;
    Ok(())
}
