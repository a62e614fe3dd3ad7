// src/ingest/scheduler.rs
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ingest::SyncOrchestrator;

#[derive(Clone, Copy, Debug)]
pub struct SyncSchedulerCfg {
    pub interval: Duration,
    /// Run a cycle immediately instead of waiting one interval.
    pub eager: bool,
}

impl SyncSchedulerCfg {
    pub fn from_config(cfg: &crate::ingest::config::SyncConfig) -> Self {
        Self {
            interval: Duration::from_millis(cfg.sync_interval_ms.max(1)),
            eager: cfg.allow_live_fetch,
        }
    }
}

/// Spawn the periodic sync trigger. Each tick spawns its own cycle, so a slow
/// cycle never delays the next tick; overlapping cycles are allowed.
pub fn spawn_sync_scheduler(orchestrator: SyncOrchestrator, cfg: SyncSchedulerCfg) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cfg.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first tick completes immediately.
        ticker.tick().await;
        if cfg.eager {
            spawn_cycle(&orchestrator, "startup");
        }

        loop {
            ticker.tick().await;
            spawn_cycle(&orchestrator, "interval");
        }
    })
}

fn spawn_cycle(orchestrator: &SyncOrchestrator, trigger: &'static str) {
    let o = orchestrator.clone();
    tokio::spawn(async move {
        let health = o.run_once().await;
        tracing::info!(target: "sync", trigger, sources = health.len(), "scheduled sync finished");
    });
}
