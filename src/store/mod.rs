// src/store/mod.rs
//! Store gateway: the document database the harvester writes into.
//!
//! Documents are JSON objects keyed by `(collection, id)`. Timestamps are
//! RFC 3339 strings; [`Predicate`] compares them as instants.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use thiserror::Error;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

pub type Document = Map<String, Value>;

pub const JOBS_COLLECTION: &str = "jobs";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {collection}/{id} not found")]
    NotFound { collection: String, id: String },
    #[error("query needs an index that does not exist: {0}")]
    MissingIndex(String),
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("store encoding: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("store backend: {0}")]
    Backend(String),
}

#[async_trait]
pub trait StoreGateway: Send + Sync {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;
    async fn set_document(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError>;
    /// Merges `fields` into an existing document.
    async fn update_document(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError>;
    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError>;
    /// Returns `(id, document)` pairs matching every filter.
    async fn query(&self, collection: &str, predicate: &Predicate) -> Result<Vec<(String, Document)>, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Lt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: Op,
    pub value: Value,
}

/// Conjunction of field filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    pub filters: Vec<Filter>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, field: &str, op: Op, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field, Op::Eq, value)
    }

    pub fn lt(self, field: &str, value: impl Into<Value>) -> Self {
        self.push(field, Op::Lt, value)
    }

    /// Fields filtered with a range operator.
    pub fn range_fields(&self) -> Vec<&str> {
        self.filters
            .iter()
            .filter(|f| f.op != Op::Eq)
            .map(|f| f.field.as_str())
            .collect()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|f| {
            let Some(actual) = doc.get(&f.field) else {
                return false;
            };
            match f.op {
                Op::Eq => compare(actual, &f.value) == Some(Ordering::Equal),
                Op::Lt => compare(actual, &f.value) == Some(Ordering::Less),
            }
        })
    }
}

fn as_instant(v: &Value) -> Option<DateTime<Utc>> {
    v.as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Orders two JSON scalars: instants, then numbers, then strings/bools.
/// Mismatched kinds are incomparable.
pub(crate) fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_instant(a), as_instant(b)) {
        return Some(x.cmp(&y));
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// RFC 3339 form used for every timestamp written by the harvester.
pub fn timestamp_value(t: DateTime<Utc>) -> Value {
    serde_json::to_value(t).unwrap_or(Value::Null)
}
