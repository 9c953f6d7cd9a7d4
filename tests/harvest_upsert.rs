// tests/harvest_upsert.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use ld_job_harvester::classify::CategoryMap;
use ld_job_harvester::clock::FixedClock;
use ld_job_harvester::config::keywords::Keywords;
use ld_job_harvester::harvest::{upsert_record, Harvester, UpsertAction, UpsertSummary};
use ld_job_harvester::store::{Document, Predicate, StoreError, JOBS_COLLECTION};
use ld_job_harvester::{JobDraft, JobRecord, MemoryStore, StoreGateway};
use serde_json::json;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 1, 7, 0, 0).unwrap()
}

fn record(url: &str, title: &str, at: DateTime<Utc>) -> JobRecord {
    JobRecord::build(
        JobDraft {
            title: title.into(),
            company: Some("Acme".into()),
            location: "Remote".into(),
            description: "Design courses".into(),
            source_url: url.into(),
            source_site: "Test Board".into(),
            ..JobDraft::default()
        },
        &CategoryMap::default(),
        at,
        30,
    )
    .unwrap()
}

fn harvester() -> Harvester {
    Harvester::new(Vec::new(), Keywords::default(), Arc::new(FixedClock::new(t0())))
}

async fn all_jobs(store: &MemoryStore) -> Vec<(String, Document)> {
    store.query(JOBS_COLLECTION, &Predicate::new()).await.unwrap()
}

#[tokio::test]
async fn second_identical_upsert_changes_nothing() {
    let store = MemoryStore::new();
    let h = harvester();
    let batch = vec![
        record("https://jobs.example.com/a", "Instructional Designer", t0()),
        record("https://jobs.example.com/b", "Training Specialist", t0()),
    ];

    let first = h.persist(&store, &batch).await;
    assert_eq!(
        first,
        UpsertSummary {
            inserted: 2,
            ..UpsertSummary::default()
        }
    );
    let after_first = all_jobs(&store).await;
    assert_eq!(after_first.len(), 2);

    let second = h.persist(&store, &batch).await;
    assert_eq!(
        second,
        UpsertSummary {
            refreshed: 2,
            ..UpsertSummary::default()
        }
    );
    assert_eq!(all_jobs(&store).await, after_first);
}

#[tokio::test]
async fn stored_document_uses_persisted_field_names() {
    let store = MemoryStore::new();
    let r = record("https://jobs.example.com/a#top", "Instructional Designer", t0());
    upsert_record(&store, &r).await.unwrap();

    let doc = store.get_document(JOBS_COLLECTION, r.id()).await.unwrap().unwrap();
    for key in [
        "id", "title", "company", "location", "locationType", "description", "requirements",
        "category", "experienceLevel", "employmentType", "sourceUrl", "sourceSite", "postedAt",
        "expiresAt", "scrapedAt", "isFeatured", "isDirectPost", "status",
    ] {
        assert!(doc.contains_key(key), "missing {key}");
    }
    assert_eq!(doc["id"], r.id());
    assert_eq!(doc["sourceUrl"], "https://jobs.example.com/a");
    assert_eq!(doc["status"], "active");
    assert_eq!(doc["isDirectPost"], false);
    assert_eq!(doc["isFeatured"], false);
}

#[tokio::test]
async fn direct_posts_are_left_byte_identical() {
    let store = MemoryStore::new();
    let r = record("https://jobs.example.com/curated", "Learning Designer", t0());
    let curated = json!({
        "id": r.id(),
        "title": "Hand-written title",
        "company": "Curated Co",
        "status": "expired",
        "scrapedAt": "2023-01-01T00:00:00Z",
        "isDirectPost": true
    });
    store
        .set_document(JOBS_COLLECTION, r.id(), curated.as_object().cloned().unwrap())
        .await
        .unwrap();
    let before = serde_json::to_string(&store.get_document(JOBS_COLLECTION, r.id()).await.unwrap()).unwrap();

    let later = record("https://jobs.example.com/curated", "Learning Designer", t0() + chrono::Duration::days(5));
    assert_eq!(upsert_record(&store, &later).await.unwrap(), UpsertAction::SkippedDirectPost);

    let after = serde_json::to_string(&store.get_document(JOBS_COLLECTION, r.id()).await.unwrap()).unwrap();
    assert_eq!(before, after);
}

/// Rejects writes for one id; everything else goes to the inner store.
struct FlakyStore {
    inner: MemoryStore,
    poisoned_id: String,
}

#[async_trait]
impl StoreGateway for FlakyStore {
    async fn get_document(&self, c: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.inner.get_document(c, id).await
    }

    async fn set_document(&self, c: &str, id: &str, fields: Document) -> Result<(), StoreError> {
        if id == self.poisoned_id {
            return Err(StoreError::Backend("write rejected".into()));
        }
        self.inner.set_document(c, id, fields).await
    }

    async fn update_document(&self, c: &str, id: &str, fields: Document) -> Result<(), StoreError> {
        self.inner.update_document(c, id, fields).await
    }

    async fn delete_document(&self, c: &str, id: &str) -> Result<(), StoreError> {
        self.inner.delete_document(c, id).await
    }

    async fn query(&self, c: &str, p: &Predicate) -> Result<Vec<(String, Document)>, StoreError> {
        self.inner.query(c, p).await
    }
}

#[tokio::test]
async fn one_failed_write_does_not_abort_the_batch() {
    let bad = record("https://jobs.example.com/bad", "Trainer", t0());
    let good = record("https://jobs.example.com/good", "Trainer", t0());
    let store = FlakyStore {
        inner: MemoryStore::new(),
        poisoned_id: bad.id().to_string(),
    };

    let summary = harvester().persist(&store, [&bad, &good]).await;
    assert_eq!((summary.inserted, summary.failed), (1, 1));
    assert!(store.get_document(JOBS_COLLECTION, good.id()).await.unwrap().is_some());
    assert!(store.get_document(JOBS_COLLECTION, bad.id()).await.unwrap().is_none());
}
