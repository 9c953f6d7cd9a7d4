// src/store/memory.rs
//! In-process document store. Backs tests and dry runs, and is the cache
//! under [`super::JsonFileStore`].

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::{Document, Predicate, StoreError, StoreGateway};

type Collections = HashMap<String, BTreeMap<String, Document>>;

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
    /// When set, queries mixing an equality filter with a range filter fail
    /// with `MissingIndex`, like a hosted store without a composite index.
    require_composite_index: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_composite_index(mut self) -> Self {
        self.require_composite_index = true;
        self
    }

    pub(crate) fn from_collections(collections: Collections) -> Self {
        Self {
            inner: RwLock::new(collections),
            require_composite_index: false,
        }
    }

    pub(crate) async fn snapshot_collection(&self, collection: &str) -> BTreeMap<String, Document> {
        self.inner
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) async fn replace_collection(&self, collection: &str, docs: BTreeMap<String, Document>) {
        self.inner.write().await.insert(collection.to_string(), docs);
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.inner.read().await.get(collection).map_or(0, |c| c.len())
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

#[async_trait]
impl StoreGateway for MemoryStore {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned())
    }

    async fn set_document(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        Ok(())
    }

    async fn update_document(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let doc = guard
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        for (k, v) in fields {
            doc.insert(k, v);
        }
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        if let Some(c) = self.inner.write().await.get_mut(collection) {
            c.remove(id);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, predicate: &Predicate) -> Result<Vec<(String, Document)>, StoreError> {
        let ranges = predicate.range_fields();
        if self.require_composite_index && !ranges.is_empty() && predicate.filters.len() > ranges.len() {
            return Err(StoreError::MissingIndex(format!(
                "{collection}: composite index on equality + {}",
                ranges.join(",")
            )));
        }
        let guard = self.inner.read().await;
        Ok(guard
            .get(collection)
            .map(|c| {
                c.iter()
                    .filter(|(_, d)| predicate.matches(d))
                    .map(|(id, d)| (id.clone(), d.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}
