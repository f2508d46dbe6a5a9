//! Key-value table holding metadata records.
//!
//! The table is addressed by `Id` only. Writes follow key-value `SET`
//! semantics: an attribute update on an unknown key creates the item, and two
//! writers racing on the same key resolve last-write-wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use timed_metadata_proto::protocol::StoredRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Attributes to `SET` on an item. `None` leaves the attribute as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeUpdate {
    pub channel: Option<String>,
    pub title: Option<String>,
    pub metadata: Option<String>,
    pub sent: Option<String>,
}

impl AttributeUpdate {
    /// Applies the update, creating the item when it does not exist yet.
    pub fn apply(&self, id: &str, existing: Option<StoredRecord>) -> StoredRecord {
        let mut item = existing.unwrap_or_else(|| StoredRecord {
            id: id.to_string(),
            channel: String::new(),
            title: String::new(),
            metadata: String::new(),
            created_date: None,
            sent: None,
        });
        if let Some(channel) = &self.channel {
            item.channel = channel.clone();
        }
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(metadata) = &self.metadata {
            item.metadata = metadata.clone();
        }
        if let Some(sent) = &self.sent {
            item.sent = Some(sent.clone());
        }
        item
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Writes the whole item, replacing any item with the same id.
    async fn put(&self, item: StoredRecord) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<StoredRecord>, StoreError>;

    /// Sets the given attributes and returns every attribute of the new item.
    async fn update(&self, id: &str, update: AttributeUpdate) -> Result<StoredRecord, StoreError>;

    /// Every item, in no particular order.
    async fn scan(&self) -> Result<Vec<StoredRecord>, StoreError>;

    /// Removes the item. Unknown ids are not an error.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

// ── In-memory table ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
    table: RwLock<HashMap<String, StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_items(items: Vec<StoredRecord>) -> Self {
        let table = items.into_iter().map(|i| (i.id.clone(), i)).collect();
        Self {
            table: RwLock::new(table),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn put(&self, item: StoredRecord) -> Result<(), StoreError> {
        self.table.write().await.insert(item.id.clone(), item);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<StoredRecord>, StoreError> {
        Ok(self.table.read().await.get(id).cloned())
    }

    async fn update(&self, id: &str, update: AttributeUpdate) -> Result<StoredRecord, StoreError> {
        let mut table = self.table.write().await;
        let item = update.apply(id, table.remove(id));
        table.insert(id.to_string(), item.clone());
        Ok(item)
    }

    async fn scan(&self) -> Result<Vec<StoredRecord>, StoreError> {
        Ok(self.table.read().await.values().cloned().collect())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.table.write().await.remove(id);
        Ok(())
    }
}

// ── File-backed table ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
struct TableFile {
    #[serde(rename = "Items", default)]
    items: Vec<StoredRecord>,
}

/// The in-memory table, rewritten to a JSON file after every mutation.
///
/// A mutation is applied to a copy of the table and only becomes visible once
/// the copy is on disk; a failed save leaves the table as it was.
pub struct FileStore {
    table: MemoryStore,
    path: PathBuf,
}

impl FileStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let items = Self::load(&path).await?;
        info!("Record table {:?} opened with {} item(s)", path, items.len());
        Ok(Self {
            table: MemoryStore::with_items(items),
            path,
        })
    }

    async fn load(path: &Path) -> Result<Vec<StoredRecord>, StoreError> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => Ok(serde_json::from_str::<TableFile>(&content)?.items),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, table: &HashMap<String, StoredRecord>) -> Result<(), StoreError> {
        let mut items: Vec<StoredRecord> = table.values().cloned().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&TableFile { items })?;
        tokio::fs::write(&self.path, json).await?;
        debug!("Record table saved to {:?}", self.path);
        Ok(())
    }

    /// Applies `mutate` to a copy of the table, saves the copy, then swaps it
    /// in. The write lock is held throughout so saves land in commit order.
    async fn commit<T, F>(&self, mutate: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut HashMap<String, StoredRecord>) -> T + Send,
        T: Send,
    {
        let mut table = self.table.table.write().await;
        let mut next = table.clone();
        let out = mutate(&mut next);
        if let Err(e) = self.save(&next).await {
            warn!("Record table save to {:?} failed, change discarded: {}", self.path, e);
            return Err(e);
        }
        *table = next;
        Ok(out)
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn put(&self, item: StoredRecord) -> Result<(), StoreError> {
        self.commit(move |table| {
            table.insert(item.id.clone(), item);
        })
        .await
    }

    async fn get(&self, id: &str) -> Result<Option<StoredRecord>, StoreError> {
        self.table.get(id).await
    }

    async fn update(&self, id: &str, update: AttributeUpdate) -> Result<StoredRecord, StoreError> {
        self.commit(move |table| {
            let item = update.apply(id, table.remove(id));
            table.insert(id.to_string(), item.clone());
            item
        })
        .await
    }

    async fn scan(&self) -> Result<Vec<StoredRecord>, StoreError> {
        self.table.scan().await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.commit(move |table| {
            table.remove(id);
        })
        .await
    }
}
