// src/sources/mod.rs
//! Source adapters: one per job board, all behind [`SourceAdapter`].
//!
//! `enumerate` lists candidate URLs (and may cache structured items it got
//! along the way), `parse` turns one URL plus optional fetched content into a
//! [`JobRecord`], and the provided `scrape` drives both through the page
//! fetcher, recording an explicit [`ItemOutcome`] per URL.

pub mod markup;
pub mod providers;
pub mod registry;
pub mod structured;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clock::SharedClock;
use crate::config::keywords::Keywords;
use crate::fetch::{Credentials, FetchError, FetchSettings, PageFetcher};
use crate::job::{JobDraft, JobRecord, RecordError};

pub use registry::{Adapter, SourceKind};

/// Everything an adapter needs besides its own endpoint.
pub struct AdapterContext {
    pub fetcher: PageFetcher,
    pub keywords: Arc<Keywords>,
    pub clock: SharedClock,
    pub expiry_days: i64,
}

impl AdapterContext {
    pub fn new(
        credentials: Credentials,
        settings: FetchSettings,
        keywords: Arc<Keywords>,
        clock: SharedClock,
        expiry_days: i64,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            fetcher: PageFetcher::new(credentials, settings)?,
            keywords,
            clock,
            expiry_days,
        })
    }

    /// Classifies and stamps a draft.
    pub fn record(&self, draft: JobDraft) -> Result<JobRecord, RecordError> {
        JobRecord::build(
            draft,
            &self.keywords.categories,
            self.clock.now(),
            self.expiry_days,
        )
    }

    pub fn is_relevant(&self, text: &str) -> bool {
        self.keywords.relevance.is_relevant(text)
    }
}

impl std::fmt::Debug for AdapterContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterContext")
            .field("fetcher", &self.fetcher)
            .field("relevance", &self.keywords.relevance.keywords().len())
            .field("expiry_days", &self.expiry_days)
            .finish_non_exhaustive()
    }
}

/// Result for one candidate URL.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Parsed(JobRecord),
    /// Content was available but required fields were missing.
    Absent { url: String },
    FetchFailed { url: String, reason: String },
    ParseFailed { url: String, reason: String },
}

impl ItemOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            ItemOutcome::Parsed(_) => "parsed",
            ItemOutcome::Absent { .. } => "absent",
            ItemOutcome::FetchFailed { .. } => "fetch_failed",
            ItemOutcome::ParseFailed { .. } => "parse_failed",
        }
    }

    fn log(&self, source: &str) {
        match self {
            ItemOutcome::Parsed(r) => {
                info!(source, title = %r.title, company = %r.company, "scraped")
            }
            ItemOutcome::Absent { url } => debug!(source, url = %url, "no record in page"),
            ItemOutcome::FetchFailed { url, reason } => {
                warn!(source, url = %url, reason = %reason, "fetch failed, skipping")
            }
            ItemOutcome::ParseFailed { url, reason } => {
                warn!(source, url = %url, reason = %reason, "parse failed, skipping")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub parsed: usize,
    pub absent: usize,
    pub fetch_failed: usize,
    pub parse_failed: usize,
}

/// Everything one `scrape` call produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeReport {
    pub source: String,
    /// URLs returned by `enumerate`, before the limit was applied.
    pub enumerated: usize,
    pub outcomes: Vec<ItemOutcome>,
}

impl ScrapeReport {
    pub fn new(source: &str, enumerated: usize) -> Self {
        Self {
            source: source.to_string(),
            enumerated,
            outcomes: Vec::new(),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &JobRecord> {
        self.outcomes.iter().filter_map(|o| match o {
            ItemOutcome::Parsed(r) => Some(r),
            _ => None,
        })
    }

    pub fn into_records(self) -> Vec<JobRecord> {
        self.outcomes
            .into_iter()
            .filter_map(|o| match o {
                ItemOutcome::Parsed(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn counts(&self) -> OutcomeCounts {
        let mut c = OutcomeCounts::default();
        for o in &self.outcomes {
            match o {
                ItemOutcome::Parsed(_) => c.parsed += 1,
                ItemOutcome::Absent { .. } => c.absent += 1,
                ItemOutcome::FetchFailed { .. } => c.fetch_failed += 1,
                ItemOutcome::ParseFailed { .. } => c.parse_failed += 1,
            }
        }
        c
    }
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Human-readable board name, stored as `sourceSite`.
    fn name(&self) -> &str;

    /// Canonical endpoint (feed, API or listing page).
    fn base_url(&self) -> &str;

    fn fetcher(&self) -> &PageFetcher;

    /// Candidate URLs in board order. Resets any structured-item cache.
    async fn enumerate(&mut self) -> Result<Vec<String>>;

    /// True when `enumerate` already holds structured data for `url`, so the
    /// page itself need not be fetched.
    fn has_cached(&self, _url: &str) -> bool {
        false
    }

    /// `Ok(None)` when required fields cannot be extracted.
    fn parse(&self, url: &str, content: Option<&str>) -> Result<Option<JobRecord>>;

    /// Releases the transport and drops cached items.
    fn close(&mut self);

    /// Enumerate, then fetch and parse up to `limit` URLs. Per-URL failures
    /// are recorded in the report; only an enumeration failure is an `Err`.
    async fn scrape(&mut self, limit: usize) -> Result<ScrapeReport> {
        let name = self.name().to_string();
        info!(source = %name, "starting scrape");
        let urls = self
            .enumerate()
            .await
            .with_context(|| format!("enumerating {name}"))?;
        info!(source = %name, found = urls.len(), "enumerated job urls");

        let mut report = ScrapeReport::new(&name, urls.len());
        for url in urls.into_iter().take(limit) {
            let outcome = self.scrape_one(&url).await;
            outcome.log(&name);
            report.outcomes.push(outcome);
        }

        let c = report.counts();
        info!(
            source = %name,
            parsed = c.parsed,
            absent = c.absent,
            fetch_failed = c.fetch_failed,
            parse_failed = c.parse_failed,
            "completed scrape"
        );
        Ok(report)
    }

    async fn scrape_one(&self, url: &str) -> ItemOutcome {
        let fetched = if self.has_cached(url) {
            None
        } else {
            match self.fetcher().fetch(url).await {
                Ok(body) => Some(body),
                Err(e) => {
                    return ItemOutcome::FetchFailed {
                        url: url.to_string(),
                        reason: e.to_string(),
                    }
                }
            }
        };
        match self.parse(url, fetched.as_deref()) {
            Ok(Some(record)) => ItemOutcome::Parsed(record),
            Ok(None) => ItemOutcome::Absent {
                url: url.to_string(),
            },
            Err(e) => ItemOutcome::ParseFailed {
                url: url.to_string(),
                reason: format!("{e:#}"),
            },
        }
    }
}
