// src/store/file.rs
//! Directory-backed document store: one `<collection>.json` file per
//! collection, rewritten atomically (temp file + rename) after each write.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::memory::MemoryStore;
use super::{Document, Predicate, StoreError, StoreGateway};

#[derive(Debug)]
pub struct JsonFileStore {
    root: PathBuf,
    cache: MemoryStore,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens (creating if needed) the store directory and loads every
    /// collection file. Failure here is the one fatal startup condition.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;

        let mut collections: HashMap<String, BTreeMap<String, Document>> = HashMap::new();
        let mut entries = fs::read_dir(&root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let raw = fs::read_to_string(&path).await?;
            let docs: BTreeMap<String, Document> = if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)?
            };
            collections.insert(name, docs);
        }
        info!(root = %root.display(), collections = collections.len(), "document store opened");

        Ok(Self {
            root,
            cache: MemoryStore::from_collections(collections),
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.json"))
    }

    async fn flush(&self, collection: &str, docs: &BTreeMap<String, Document>) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(docs)?;
        let path = self.collection_path(collection);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Applies `change` to a copy of the collection and publishes the copy
    /// to the cache only once it is on disk. A failed write changes nothing.
    async fn commit<F>(&self, collection: &str, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, Document>) -> Result<(), StoreError> + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut next = self.cache.snapshot_collection(collection).await;
        change(&mut next)?;
        if let Err(e) = self.flush(collection, &next).await {
            warn!(collection, error = %e, "store write failed; cache left unchanged");
            return Err(e);
        }
        self.cache.replace_collection(collection, next).await;
        Ok(())
    }
}

#[async_trait]
impl StoreGateway for JsonFileStore {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.cache.get_document(collection, id).await
    }

    async fn set_document(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError> {
        self.commit(collection, |docs| {
            docs.insert(id.to_string(), fields);
            Ok(())
        })
        .await
    }

    async fn update_document(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError> {
        self.commit(collection, |docs| {
            let doc = docs.get_mut(id).ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
            for (k, v) in fields {
                doc.insert(k, v);
            }
            Ok(())
        })
        .await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.commit(collection, |docs| {
            docs.remove(id);
            Ok(())
        })
        .await
    }

    async fn query(&self, collection: &str, predicate: &Predicate) -> Result<Vec<(String, Document)>, StoreError> {
        self.cache.query(collection, predicate).await
    }
}
