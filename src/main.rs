//! L&D job harvester binary.
//! One-shot run by default; `--daemon` repeats on an interval, `--dry-run`
//! scrapes and prints without touching the store.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ld_job_harvester::clock::SystemClock;
use ld_job_harvester::config::{self, AppConfig};
use ld_job_harvester::scheduler::{spawn_harvest_scheduler, HarvestSchedulerCfg};
use ld_job_harvester::{metrics, Harvester, JsonFileStore};

#[derive(Debug, Parser)]
#[command(name = "ld-job-harvester", version, about = "Harvest L&D job postings into the job store")]
struct Cli {
    /// Keep running, harvesting every interval.
    #[arg(long)]
    daemon: bool,

    /// Scrape and print results without saving.
    #[arg(long)]
    dry_run: bool,

    /// Jobs per source in dry-run mode.
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// Override SCRAPE_INTERVAL_HOURS.
    #[arg(long)]
    interval_hours: Option<u64>,
}

/// `LOG_FORMAT=json` for structured output; compact text otherwise.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ld_job_harvester=info,warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environments set variables directly
    let _ = dotenvy::dotenv();
    init_tracing();
    let cli = Cli::parse();

    let mut cfg = AppConfig::from_env().context("loading configuration")?;
    if let Some(h) = cli.interval_hours {
        cfg.interval = config::interval_from_hours(h).context("--interval-hours")?;
    }
    if let Some(addr) = cfg.metrics_addr {
        metrics::serve(addr)?;
    }

    let harvester = Harvester::from_config(&cfg, Arc::new(SystemClock));
    let enabled: Vec<&str> = harvester
        .sources()
        .iter()
        .filter(|s| s.enabled)
        .map(|s| s.name.as_str())
        .collect();
    tracing::info!(sources = ?enabled, "configured sources");

    if cli.dry_run {
        let batch = harvester.dry_run(cli.limit).await;
        println!("Found {} jobs:", batch.record_count());
        for job in batch.records() {
            println!("  - {} at {} ({})", job.title, job.company, job.source_site);
            println!("    {} | {} | {}", job.category, job.location, job.source_url);
        }
        return Ok(());
    }

    let store = JsonFileStore::open(&cfg.store_dir)
        .await
        .with_context(|| format!("opening job store at {}", cfg.store_dir.display()))?;
    let store = Arc::new(store);

    if cli.daemon {
        tracing::info!(interval_hours = cfg.interval.as_secs() / 3600, "starting scheduler");
        let handle = spawn_harvest_scheduler(
            Arc::new(harvester),
            store,
            HarvestSchedulerCfg::every(cfg.interval),
        );
        handle.await.context("scheduler task")?;
    } else {
        let summary = harvester.run(store.as_ref()).await;
        summary.log();
    }
    Ok(())
}
