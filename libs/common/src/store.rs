//! Persisted key-value store
//!
//! Session state survives restarts by being cached in a small string
//! key-value store. The [`KeyValueStore`] trait is the only way the rest of
//! the application reaches that state; backends are picked at startup.
//!
//! ```rust,no_run
//! use common::store::{FileStore, KeyValueStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = FileStore::new(".renovar/state.json");
//!     store.set("onboarding-completed", "true").await?;
//!     println!("Flag: {:?}", store.get("onboarding-completed").await?);
//!     Ok(())
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::cache::RedisStore;
use crate::error::StoreResult;

/// String key-value persistence used as the cache of session state
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key is absent
    fn get(&self, key: &str) -> impl Future<Output = StoreResult<Option<String>>> + Send;

    /// Insert or overwrite a value
    fn set(&self, key: &str, value: &str) -> impl Future<Output = StoreResult<()>> + Send;

    /// Remove a key. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> impl Future<Output = StoreResult<()>> + Send;
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Arc<Mutex<()>>,
}

impl FileStore {
    /// Create a store persisting to `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> StoreResult<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let contents = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, contents).await?;
        debug!("Persisted {} keys to {}", entries.len(), self.path.display());
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.save(&entries).await?;
        }
        Ok(())
    }
}

/// Backend chosen at runtime from configuration
#[derive(Clone)]
pub enum AnyStore {
    Memory(MemoryStore),
    File(FileStore),
    Redis(RedisStore),
}

impl KeyValueStore for AnyStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match self {
            AnyStore::Memory(store) => store.get(key).await,
            AnyStore::File(store) => store.get(key).await,
            AnyStore::Redis(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        match self {
            AnyStore::Memory(store) => store.set(key, value).await,
            AnyStore::File(store) => store.set(key, value).await,
            AnyStore::Redis(store) => store.set(key, value).await,
        }
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        match self {
            AnyStore::Memory(store) => store.delete(key).await,
            AnyStore::File(store) => store.delete(key).await,
            AnyStore::Redis(store) => store.delete(key).await,
        }
    }
}
