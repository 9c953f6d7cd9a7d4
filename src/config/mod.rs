// src/config/mod.rs
//! Environment-driven runtime configuration.

pub mod keywords;
pub mod sources;

use anyhow::{anyhow, bail, Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::Credentials;

pub const DEFAULT_STORE_DIR: &str = "data/store";
pub const DEFAULT_INTERVAL_HOURS: u64 = 6;
pub const DEFAULT_MAX_JOBS_PER_SOURCE: usize = 100;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const MAX_INTERVAL_HOURS: u64 = 24 * 365;
pub const MAX_EXPIRY_DAYS: i64 = 3650;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub store_dir: PathBuf,
    pub interval: Duration,
    pub max_jobs_per_source: usize,
    pub expiry_days: i64,
    pub fetch_timeout: Duration,
    pub metrics_addr: Option<SocketAddr>,
    pub sources: Vec<sources::SourceConfig>,
    pub keywords: keywords::Keywords,
}

impl AppConfig {
    /// Reads the process environment (call `dotenvy::dotenv()` first).
    pub fn from_env() -> Result<Self> {
        let lookup = |k: &str| std::env::var(k).ok();
        let mut cfg = Self::from_lookup(lookup)?;
        cfg.sources = sources::load_sources_default()?;
        cfg.keywords = keywords::load_keywords_default()?;
        Ok(cfg)
    }

    /// Scalar settings only; sources/keywords stay at their built-in defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let interval_hours: u64 = parse_or(non_empty("SCRAPE_INTERVAL_HOURS"), DEFAULT_INTERVAL_HOURS)
            .context("SCRAPE_INTERVAL_HOURS")?;
        let metrics_addr = match non_empty("METRICS_ADDR") {
            Some(raw) => Some(
                raw.parse::<SocketAddr>()
                    .with_context(|| format!("METRICS_ADDR is not a socket address: {raw}"))?,
            ),
            None => None,
        };

        Ok(Self {
            credentials: Credentials {
                zenrows_api_key: non_empty("ZENROWS_API_KEY"),
                scraperapi_key: non_empty("SCRAPERAPI_KEY"),
            },
            store_dir: non_empty("JOB_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR)),
            interval: interval_from_hours(interval_hours).context("SCRAPE_INTERVAL_HOURS")?,
            max_jobs_per_source: parse_or(non_empty("MAX_JOBS_PER_SOURCE"), DEFAULT_MAX_JOBS_PER_SOURCE)
                .context("MAX_JOBS_PER_SOURCE")?,
            expiry_days: parse_or(non_empty("JOB_EXPIRY_DAYS"), crate::job::DEFAULT_EXPIRY_DAYS)
                .and_then(expiry_days_in_range)
                .context("JOB_EXPIRY_DAYS")?,
            fetch_timeout: Duration::from_secs(
                parse_or(non_empty("FETCH_TIMEOUT_SECS"), DEFAULT_FETCH_TIMEOUT_SECS)
                    .context("FETCH_TIMEOUT_SECS")?,
            ),
            metrics_addr,
            sources: sources::default_sources(),
            keywords: keywords::Keywords::default(),
        })
    }
}

/// Daemon interval from whole hours, 1 to [`MAX_INTERVAL_HOURS`].
pub fn interval_from_hours(hours: u64) -> Result<Duration> {
    if !(1..=MAX_INTERVAL_HOURS).contains(&hours) {
        bail!("interval must be 1..={MAX_INTERVAL_HOURS} hours, got {hours}");
    }
    hours
        .checked_mul(3600)
        .map(Duration::from_secs)
        .ok_or_else(|| anyhow!("interval of {hours} hours overflows"))
}

fn expiry_days_in_range(days: i64) -> Result<i64> {
    if !(1..=MAX_EXPIRY_DAYS).contains(&days) {
        bail!("expiry must be 1..={MAX_EXPIRY_DAYS} days, got {days}");
    }
    Ok(days)
}

fn parse_or<T>(raw: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(v) => v.parse::<T>().with_context(|| format!("invalid value {v:?}")),
        None => Ok(default),
    }
}
