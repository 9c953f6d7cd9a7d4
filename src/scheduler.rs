// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::harvest::Harvester;
use crate::store::StoreGateway;

#[derive(Clone, Copy, Debug)]
pub struct HarvestSchedulerCfg {
    pub interval: Duration,
    /// Stop after this many runs; `None` runs until the task is aborted.
    pub max_runs: Option<usize>,
}

impl HarvestSchedulerCfg {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            max_runs: None,
        }
    }
}

/// Spawns the repeating harvest. The first run starts immediately; a run
/// that overruns the interval delays the next tick instead of bursting.
/// The task resolves to the number of completed runs.
pub fn spawn_harvest_scheduler<S>(
    harvester: Arc<Harvester>,
    store: Arc<S>,
    cfg: HarvestSchedulerCfg,
) -> JoinHandle<usize>
where
    S: StoreGateway + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cfg.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut runs = 0usize;
        loop {
            ticker.tick().await;
            let summary = harvester.run(store.as_ref()).await;
            summary.log();
            runs += 1;

            tracing::info!(
                target: "harvest",
                run = runs,
                next_in_secs = cfg.interval.as_secs(),
                "scheduled harvest tick"
            );
            if cfg.max_runs.is_some_and(|max| runs >= max) {
                return runs;
            }
        }
    })
}
