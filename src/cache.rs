//! Persisted per-endpoint content cache.
//!
//! Each fetched page is stored as one JSON entry keyed by the endpoint's cache key.
//! Entries live for the configured TTL and are removed lazily: an expired entry is
//! deleted by the `get` that finds it. Every storage failure degrades to a miss.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;

use crate::clock::Clock;

/// Minimal durable key-value store the content cache writes through.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, io::Error>;
    async fn write(&self, key: &str, value: &[u8]) -> Result<(), io::Error>;
    async fn delete(&self, key: &str) -> Result<(), io::Error>;
    async fn list(&self) -> Result<Vec<String>, io::Error>;
}

/// One `{key}.json` file per entry inside a directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl KvStore for FsStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, io::Error> {
        match fs::read(self.path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write(&self, key: &str, value: &[u8]) -> Result<(), io::Error> {
        fs::create_dir_all(&self.dir).await?;
        fs::write(self.path(key), value).await
    }

    async fn delete(&self, key: &str) -> Result<(), io::Error> {
        match fs::remove_file(self.path(key)).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    async fn list(&self) -> Result<Vec<String>, io::Error> {
        if !fs::try_exists(&self.dir).await? {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub source_url: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContentCacheStatus {
    pub has_cache: bool,
    pub count: usize,
}

pub struct ContentCache {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl ContentCache {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.clock.now() - entry.timestamp < self.ttl
    }

    pub async fn get(&self, id: &str) -> Option<String> {
        let bytes = match self.store.read(id).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Error reading cache for {}: {}", id, e);
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Corrupt cache entry for {}: {}. Discarding.", id, e);
                self.evict(id).await;
                return None;
            }
        };

        if !self.is_fresh(&entry) {
            tracing::debug!("Cache entry for {} stored at {} has expired", id, entry.timestamp);
            self.evict(id).await;
            return None;
        }

        tracing::debug!("Cache hit for endpoint: {}", id);
        Some(entry.content)
    }

    pub async fn put(&self, id: &str, source_url: &str, content: &str) {
        let entry = CacheEntry {
            content: content.to_string(),
            timestamp: self.clock.now(),
            source_url: source_url.to_string(),
        };
        let serialized = match serde_json::to_vec_pretty(&entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Error serializing cache entry for {}: {}", id, e);
                return;
            }
        };
        match self.store.write(id, &serialized).await {
            Ok(()) => tracing::debug!("Cached content for endpoint: {}", id),
            Err(e) => tracing::warn!("Error caching content for {}: {}", id, e),
        }
    }

    pub async fn clear(&self) {
        let keys = match self.store.list().await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!("Error clearing cache: {}", e);
                return;
            }
        };
        for key in &keys {
            self.evict(key).await;
        }
        tracing::info!("Content cache cleared ({} entries)", keys.len());
    }

    pub async fn status(&self) -> ContentCacheStatus {
        let count = self.store.list().await.map(|keys| keys.len()).unwrap_or(0);
        ContentCacheStatus {
            has_cache: count > 0,
            count,
        }
    }

    async fn evict(&self, id: &str) {
        if let Err(e) = self.store.delete(id).await {
            tracing::warn!("Failed to remove cache entry {}: {}", id, e);
        }
    }
}
