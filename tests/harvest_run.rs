// tests/harvest_run.rs
// Full run against mocked boards: collect from every enabled source, upsert,
// sweep. Broken sources are reported, not fatal.
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use ld_job_harvester::clock::FixedClock;
use ld_job_harvester::config::keywords::Keywords;
use ld_job_harvester::config::sources::SourceConfig;
use ld_job_harvester::fetch::{Credentials, FetchError, FetchSettings};
use ld_job_harvester::harvest::{scrape_and_close, Harvester, SourceOutcome};
use ld_job_harvester::sources::{AdapterContext, SourceAdapter, SourceKind};
use ld_job_harvester::store::{Predicate, JOBS_COLLECTION};
use ld_job_harvester::{MemoryStore, StoreGateway};
use wiremock::matchers::path;
use wiremock::{Mock, MockServer, ResponseTemplate};

const FEED: &str = include_str!("fixtures/wwr_rss.xml");
const API: &str = include_str!("fixtures/remoteok_api.json");

async fn boards() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(path("/wwr.rss"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(FEED, "application/rss+xml"))
        .mount(&server)
        .await;
    Mock::given(path("/remoteok/api"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(API, "application/json"))
        .mount(&server)
        .await;
    Mock::given(path("/guild/jobs/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    server
}

fn sources(uri: &str) -> Vec<SourceConfig> {
    vec![
        SourceConfig::new("We Work Remotely", "weworkremotely").with_base_url(format!("{uri}/wwr.rss")),
        SourceConfig::new("RemoteOK", "remoteok").with_base_url(format!("{uri}/remoteok/api")),
        SourceConfig::new("Learning Guild", "learningguild").with_base_url(format!("{uri}/guild/jobs/")),
        SourceConfig::new("Training Industry", "trainingindustry"),
        SourceConfig::new("eLearning Industry", "elearning_industry")
            .with_base_url(format!("{uri}/never-called"))
            .disabled(),
    ]
}

#[tokio::test]
async fn run_collects_persists_and_reports_per_source() {
    let server = boards().await;
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 4, 3, 8, 0, 0).unwrap());
    let h = Harvester::new(sources(&server.uri()), Keywords::default(), Arc::new(clock.clone()))
        .with_max_per_source(10);
    let store = MemoryStore::new();

    let summary = h.run(&store).await;
    summary.log();

    let names: Vec<&str> = summary.batch.runs.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["We Work Remotely", "RemoteOK", "Learning Guild", "Training Industry"],
        "disabled sources are not run"
    );
    assert!(matches!(summary.batch.runs[2].outcome, SourceOutcome::Failed { .. }));
    assert_eq!(summary.batch.runs[3].outcome, SourceOutcome::Unregistered);
    assert_eq!(summary.batch.failed_sources(), 2);

    assert_eq!(summary.batch.record_count(), 4);
    assert_eq!(summary.upserts.inserted, 4);
    assert_eq!(summary.expiry.expired, 0);
    assert_eq!(store.len(JOBS_COLLECTION).await, 4);

    let received = server.received_requests().await.unwrap();
    assert!(received.iter().all(|r| r.url.path() != "/never-called"));

    // identical second run only refreshes
    let again = h.run(&store).await;
    assert_eq!(again.upserts.inserted, 0);
    assert_eq!(again.upserts.refreshed, 4);
    assert_eq!(store.len(JOBS_COLLECTION).await, 4);
}

#[tokio::test]
async fn max_per_source_bounds_each_board() {
    let server = boards().await;
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 4, 3, 8, 0, 0).unwrap());
    let h = Harvester::new(sources(&server.uri())[..2].to_vec(), Keywords::default(), Arc::new(clock))
        .with_max_per_source(1);
    let store = MemoryStore::new();

    let summary = h.run(&store).await;
    assert_eq!(summary.batch.record_count(), 2);
    let active = store
        .query(JOBS_COLLECTION, &Predicate::new().eq("status", "active"))
        .await
        .unwrap();
    assert_eq!(active.len(), 2);
}

#[tokio::test]
async fn dry_run_never_touches_a_store() {
    let server = boards().await;
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 4, 3, 8, 0, 0).unwrap());
    let h = Harvester::new(sources(&server.uri())[..1].to_vec(), Keywords::default(), Arc::new(clock));
    let batch = h.dry_run(1).await;
    assert_eq!(batch.record_count(), 1);
}

fn context() -> AdapterContext {
    AdapterContext::new(
        Credentials::default(),
        FetchSettings::default(),
        Arc::new(Keywords::default()),
        Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 4, 3, 8, 0, 0).unwrap())),
        30,
    )
    .unwrap()
}

#[tokio::test]
async fn adapter_is_closed_after_a_failed_scrape() {
    let server = boards().await;
    let listing = format!("{}/guild/jobs/", server.uri());
    let mut adapter = SourceKind::LearningGuild
        .build(context(), None, Some(&listing))
        .unwrap();

    assert!(scrape_and_close(&mut adapter, 10).await.is_err());
    assert!(adapter.fetcher().is_closed());
    assert_eq!(adapter.fetcher().fetch(&listing).await, Err(FetchError::Closed));
}

#[tokio::test]
async fn adapter_is_closed_after_a_successful_scrape() {
    let server = boards().await;
    let mut adapter = SourceKind::WeWorkRemotely
        .build(context(), None, Some(&format!("{}/wwr.rss", server.uri())))
        .unwrap();

    let report = scrape_and_close(&mut adapter, 10).await.unwrap();
    assert_eq!(report.records().count(), 2);
    assert!(adapter.fetcher().is_closed());
    assert!(!adapter.has_cached("https://weworkremotely.com/remote-jobs/brightpath-senior-instructional-designer"));
}
