// src/harvest.rs
//! Harvest orchestration: scrape every enabled source, upsert the records,
//! then sweep expired ones.
//!
//! Nothing in here is fatal. A source that cannot be built or enumerated
//! contributes zero records, a record that cannot be written is logged and
//! skipped, and an expiry query the store cannot serve skips the sweep.

use metrics::{counter, gauge, histogram};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::clock::SharedClock;
use crate::config::keywords::Keywords;
use crate::config::sources::SourceConfig;
use crate::config::AppConfig;
use crate::fetch::{Credentials, FetchSettings};
use crate::job::{JobRecord, JobStatus};
use crate::metrics::ensure_metrics_described;
use crate::sources::{AdapterContext, ScrapeReport, SourceAdapter, SourceKind};
use crate::store::{timestamp_value, Document, Predicate, StoreError, StoreGateway, JOBS_COLLECTION};

/// What happened to one configured source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    Scraped(ScrapeReport),
    /// Construction or enumeration failed; the reason is already logged.
    Failed { reason: String },
    /// `parser` names no known board.
    Unregistered,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceRun {
    pub name: String,
    pub parser: String,
    pub outcome: SourceOutcome,
}

impl SourceRun {
    pub fn records(&self) -> impl Iterator<Item = &JobRecord> {
        let report = match &self.outcome {
            SourceOutcome::Scraped(r) => Some(r),
            _ => None,
        };
        report.into_iter().flat_map(|r| r.records())
    }
}

/// Scrape results for every enabled source, in configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarvestBatch {
    pub runs: Vec<SourceRun>,
}

impl HarvestBatch {
    pub fn records(&self) -> impl Iterator<Item = &JobRecord> {
        self.runs.iter().flat_map(|r| r.records())
    }

    pub fn record_count(&self) -> usize {
        self.records().count()
    }

    pub fn failed_sources(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| !matches!(r.outcome, SourceOutcome::Scraped(_)))
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Inserted,
    /// Existing scraper record: `scrapedAt` refreshed, status forced active.
    Refreshed,
    SkippedDirectPost,
}

impl UpsertAction {
    fn label(&self) -> &'static str {
        match self {
            UpsertAction::Inserted => "inserted",
            UpsertAction::Refreshed => "refreshed",
            UpsertAction::SkippedDirectPost => "skipped_direct_post",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub inserted: usize,
    pub refreshed: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpirySummary {
    pub expired: usize,
    /// Past-due records left alone because they are direct posts.
    pub protected: usize,
    pub failed: usize,
    /// The store could not serve the expiry query.
    pub skipped: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub batch: HarvestBatch,
    pub upserts: UpsertSummary,
    pub expiry: ExpirySummary,
}

impl RunSummary {
    pub fn log(&self) {
        for run in &self.batch.runs {
            match &run.outcome {
                SourceOutcome::Scraped(r) => {
                    let c = r.counts();
                    info!(
                        source = %run.name,
                        enumerated = r.enumerated,
                        parsed = c.parsed,
                        skipped = c.absent + c.fetch_failed + c.parse_failed,
                        "source summary"
                    );
                }
                SourceOutcome::Failed { reason } => {
                    warn!(source = %run.name, reason = %reason, "source summary: failed")
                }
                SourceOutcome::Unregistered => {
                    warn!(source = %run.name, parser = %run.parser, "source summary: no adapter")
                }
            }
        }
        info!(
            records = self.batch.record_count(),
            inserted = self.upserts.inserted,
            refreshed = self.upserts.refreshed,
            skipped = self.upserts.skipped,
            failed = self.upserts.failed,
            expired = self.expiry.expired,
            expiry_skipped = self.expiry.skipped,
            "harvest run complete"
        );
    }
}

fn is_direct_post(doc: &Document) -> bool {
    doc.get("isDirectPost").and_then(Value::as_bool).unwrap_or(false)
}

/// Applies the upsert policy for one record.
///
/// Absent: insert the full document. Direct post: leave it alone. Otherwise:
/// refresh `scrapedAt` and force `status=active`; every other stored field,
/// manual edits included, is kept.
pub async fn upsert_record<S>(store: &S, record: &JobRecord) -> Result<UpsertAction, StoreError>
where
    S: StoreGateway + ?Sized,
{
    match store.get_document(JOBS_COLLECTION, record.id()).await? {
        None => {
            store
                .set_document(JOBS_COLLECTION, record.id(), record.to_document())
                .await?;
            Ok(UpsertAction::Inserted)
        }
        Some(existing) if is_direct_post(&existing) => Ok(UpsertAction::SkippedDirectPost),
        Some(_) => {
            let mut patch = Document::new();
            patch.insert("scrapedAt".into(), timestamp_value(record.scraped_at));
            patch.insert("status".into(), Value::from(JobStatus::Active.as_str()));
            store.update_document(JOBS_COLLECTION, record.id(), patch).await?;
            Ok(UpsertAction::Refreshed)
        }
    }
}

/// Runs `scrape(limit)` and closes the adapter whether or not it succeeded.
pub async fn scrape_and_close<A>(adapter: &mut A, limit: usize) -> anyhow::Result<ScrapeReport>
where
    A: SourceAdapter + ?Sized,
{
    let scraped = adapter.scrape(limit).await;
    adapter.close();
    scraped
}

pub struct Harvester {
    sources: Vec<SourceConfig>,
    credentials: Credentials,
    fetch: FetchSettings,
    keywords: Arc<Keywords>,
    clock: SharedClock,
    max_per_source: usize,
    expiry_days: i64,
}

impl Harvester {
    pub fn new(sources: Vec<SourceConfig>, keywords: Keywords, clock: SharedClock) -> Self {
        Self {
            sources,
            credentials: Credentials::default(),
            fetch: FetchSettings::default(),
            keywords: Arc::new(keywords),
            clock,
            max_per_source: crate::config::DEFAULT_MAX_JOBS_PER_SOURCE,
            expiry_days: crate::job::DEFAULT_EXPIRY_DAYS,
        }
    }

    pub fn from_config(cfg: &AppConfig, clock: SharedClock) -> Self {
        Self::new(cfg.sources.clone(), cfg.keywords.clone(), clock)
            .with_credentials(cfg.credentials.clone())
            .with_fetch_settings(FetchSettings {
                timeout: cfg.fetch_timeout,
                ..FetchSettings::default()
            })
            .with_max_per_source(cfg.max_jobs_per_source)
            .with_expiry_days(cfg.expiry_days)
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_fetch_settings(mut self, fetch: FetchSettings) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn with_max_per_source(mut self, n: usize) -> Self {
        self.max_per_source = n;
        self
    }

    pub fn with_expiry_days(mut self, days: i64) -> Self {
        self.expiry_days = days;
        self
    }

    pub fn sources(&self) -> &[SourceConfig] {
        &self.sources
    }

    fn context(&self) -> Result<AdapterContext, crate::fetch::FetchError> {
        AdapterContext::new(
            self.credentials.clone(),
            self.fetch.clone(),
            Arc::clone(&self.keywords),
            Arc::clone(&self.clock),
            self.expiry_days,
        )
    }

    /// Scrapes one source. The adapter is closed whether or not scraping
    /// succeeded.
    pub async fn collect_source(&self, source: &SourceConfig, limit: usize) -> SourceRun {
        let run = |outcome| SourceRun {
            name: source.name.clone(),
            parser: source.parser.clone(),
            outcome,
        };
        let Some(kind) = SourceKind::from_parser(&source.parser) else {
            warn!(source = %source.name, parser = %source.parser, "no adapter registered for parser");
            counter!("harvest_source_errors_total").increment(1);
            return run(SourceOutcome::Unregistered);
        };

        let built = self
            .context()
            .map_err(anyhow::Error::from)
            .and_then(|ctx| kind.build(ctx, Some(source.name.as_str()), source.base_url.as_deref()));
        let mut adapter = match built {
            Ok(a) => a,
            Err(e) => {
                error!(source = %source.name, error = ?e, "could not construct adapter");
                counter!("harvest_source_errors_total").increment(1);
                return run(SourceOutcome::Failed {
                    reason: format!("{e:#}"),
                });
            }
        };

        let t0 = Instant::now();
        let scraped = scrape_and_close(&mut adapter, limit).await;
        histogram!("harvest_source_duration_ms").record(t0.elapsed().as_secs_f64() * 1000.0);

        match scraped {
            Ok(report) => {
                for o in &report.outcomes {
                    counter!("harvest_items_total", "outcome" => o.kind()).increment(1);
                }
                run(SourceOutcome::Scraped(report))
            }
            Err(e) => {
                error!(source = %source.name, error = ?e, "source scrape failed");
                counter!("harvest_source_errors_total").increment(1);
                run(SourceOutcome::Failed {
                    reason: format!("{e:#}"),
                })
            }
        }
    }

    /// Scrapes every enabled source, one at a time, up to `limit` URLs each.
    pub async fn collect(&self, limit: usize) -> HarvestBatch {
        ensure_metrics_described();
        let mut batch = HarvestBatch::default();
        for source in self.sources.iter().filter(|s| s.enabled) {
            batch.runs.push(self.collect_source(source, limit).await);
        }
        for source in self.sources.iter().filter(|s| !s.enabled) {
            info!(source = %source.name, "source disabled, skipping");
        }
        info!(
            sources = batch.runs.len(),
            records = batch.record_count(),
            "collected jobs"
        );
        batch
    }

    /// Upserts records one by one; a failed write is logged and counted.
    pub async fn persist<'a, S, I>(&self, store: &S, records: I) -> UpsertSummary
    where
        S: StoreGateway + ?Sized,
        I: IntoIterator<Item = &'a JobRecord>,
    {
        ensure_metrics_described();
        let mut summary = UpsertSummary::default();
        for record in records {
            match upsert_record(store, record).await {
                Ok(action) => {
                    match action {
                        UpsertAction::Inserted => summary.inserted += 1,
                        UpsertAction::Refreshed => summary.refreshed += 1,
                        UpsertAction::SkippedDirectPost => {
                            info!(id = record.id(), title = %record.title, "direct post, not touching");
                            summary.skipped += 1
                        }
                    }
                    counter!("harvest_upserts_total", "action" => action.label()).increment(1);
                }
                Err(e) => {
                    error!(id = record.id(), url = %record.source_url, error = %e, "upsert failed");
                    counter!("harvest_upserts_total", "action" => "failed").increment(1);
                    summary.failed += 1;
                }
            }
        }
        info!(
            inserted = summary.inserted,
            refreshed = summary.refreshed,
            skipped = summary.skipped,
            failed = summary.failed,
            "saved jobs"
        );
        summary
    }

    /// Marks active records whose `expiresAt` has passed as expired. Direct
    /// posts are never touched.
    pub async fn expire<S>(&self, store: &S) -> ExpirySummary
    where
        S: StoreGateway + ?Sized,
    {
        ensure_metrics_described();
        let now = self.clock.now();
        let predicate = Predicate::new()
            .eq("status", JobStatus::Active.as_str())
            .lt("expiresAt", timestamp_value(now));

        let due = match store.query(JOBS_COLLECTION, &predicate).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!(error = %e, "expiry query failed, skipping sweep (index may be missing)");
                return ExpirySummary {
                    skipped: true,
                    ..ExpirySummary::default()
                };
            }
        };

        let mut summary = ExpirySummary::default();
        for (id, doc) in due {
            if is_direct_post(&doc) {
                summary.protected += 1;
                continue;
            }
            let mut patch = Document::new();
            patch.insert("status".into(), Value::from(JobStatus::Expired.as_str()));
            match store.update_document(JOBS_COLLECTION, &id, patch).await {
                Ok(()) => summary.expired += 1,
                Err(e) => {
                    error!(id = %id, error = %e, "could not expire job");
                    summary.failed += 1;
                }
            }
        }
        counter!("harvest_expired_total").increment(summary.expired as u64);
        info!(expired = summary.expired, protected = summary.protected, "expiry sweep done");
        summary
    }

    /// One full harvest: collect, persist, expire.
    pub async fn run<S>(&self, store: &S) -> RunSummary
    where
        S: StoreGateway + ?Sized,
    {
        info!(sources = self.sources.len(), "starting harvest run");
        let batch = self.collect(self.max_per_source).await;
        let upserts = if batch.record_count() == 0 {
            info!("no jobs to save");
            UpsertSummary::default()
        } else {
            self.persist(store, batch.records()).await
        };
        let expiry = self.expire(store).await;
        gauge!("harvest_last_run_ts").set(self.clock.now().timestamp().max(0) as f64);
        RunSummary {
            batch,
            upserts,
            expiry,
        }
    }

    /// Scrape without persisting.
    pub async fn dry_run(&self, limit: usize) -> HarvestBatch {
        info!(limit, "dry run, nothing will be saved");
        self.collect(limit).await
    }
}
