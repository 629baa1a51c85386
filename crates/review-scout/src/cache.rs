//! Review cache: a single JSON document mapping source URL to the last
//! successful scrape.
//!
//! The document is read fully on every lookup and rewritten fully on every
//! write. There is no locking: concurrent writers race and the last one
//! wins. The cache is an optimization only, so every I/O or parse failure
//! is logged and treated as an empty cache (reads) or a no-op (writes).
//!
//! ## Bounded mode
//!
//! Entries are never deleted by default. When `max_entries` is set, a write
//! that would exceed the bound evicts the oldest entries by timestamp.

use crate::error::CacheError;
use crate::types::{now_millis, CacheEntry, ReviewBundle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// In-memory form of the cache document.
pub type CacheDocument = BTreeMap<String, CacheEntry>;

/// File-backed review cache with TTL reads.
#[derive(Debug, Clone)]
pub struct ReviewCache {
    path: PathBuf,
    ttl: Duration,
    max_entries: Option<usize>,
}

impl ReviewCache {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
            max_entries: None,
        }
    }

    /// Bound the number of cached URLs. `None` keeps every entry.
    pub fn with_max_entries(mut self, max_entries: Option<usize>) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for `key`, if any.
    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        self.get_at(key, now_millis()).await
    }

    /// Fresh entry for `key` as of `now_ms`.
    pub async fn get_at(&self, key: &str, now_ms: i64) -> Option<CacheEntry> {
        let mut document = self.load().await;
        let entry = document.remove(key)?;
        if entry.is_fresh(now_ms, self.ttl) {
            Some(entry)
        } else {
            tracing::debug!(url = key, "cache entry expired");
            None
        }
    }

    /// Store `bundle` under `key` with the given write time.
    pub async fn put(&self, key: &str, bundle: &ReviewBundle, timestamp: i64) {
        let mut document = self.load().await;
        document.insert(
            key.to_string(),
            CacheEntry {
                data: bundle.clone(),
                timestamp,
            },
        );
        if let Some(max) = self.max_entries {
            evict_oldest(&mut document, max);
        }
        if let Err(e) = self.store(&document).await {
            tracing::warn!(path = %self.path.display(), "failed to write review cache: {e}");
        }
    }

    /// The whole document, or an empty one when it cannot be read.
    pub async fn load(&self) -> CacheDocument {
        match self.try_load().await {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "failed to read review cache: {e}");
                CacheDocument::new()
            }
        }
    }

    async fn try_load(&self) -> Result<CacheDocument, CacheError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CacheDocument::new());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    async fn store(&self, document: &CacheDocument) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(document)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

/// Drop the oldest entries until at most `max` remain.
fn evict_oldest(document: &mut CacheDocument, max: usize) {
    while document.len() > max {
        let oldest = document
            .iter()
            .min_by_key(|(_, entry)| entry.timestamp)
            .map(|(key, _)| key.clone());
        match oldest {
            Some(key) => {
                tracing::info!(url = %key, "evicting oldest review cache entry");
                document.remove(&key);
            }
            None => break,
        }
    }
}
