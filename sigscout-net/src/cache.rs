//! File-based TTL cache for fetched content
//!
//! Entries are keyed by a SHA-256 hash over the URL plus a canonical
//! (sorted) serialization of query params: identical requests always
//! collide, differing requests never do. Expiry is checked on `get`; an
//! expired entry is deleted as a side effect of being read, not found.
//! A corrupted entry is treated as absent and deleted.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

/// Short TTL for volatile discovery results
pub const TTL_SHORT: Duration = Duration::from_secs(60 * 60);
/// Default TTL for scraped advisories
pub const TTL_DEFAULT: Duration = Duration::from_secs(24 * 60 * 60);
/// Long TTL for rarely-changing reference data
pub const TTL_LONG: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Errors from cache I/O
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache directory error: {0}")]
    Dir(std::io::Error),

    #[error("Cache write error: {0}")]
    Write(std::io::Error),

    #[error("Cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// On-disk entry. The URL and params exist only as the hashed key;
/// persisting them would write discovery API credentials to disk.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    cached_at: DateTime<Utc>,
    ttl_secs: u64,
    payload: String,
}

/// Cache statistics for the admin surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_bytes: u64,
    pub dir: String,
}

/// Derive the content-addressed cache key for a URL + params pair
pub fn cache_key(url: &str, params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    for (k, v) in sorted {
        hasher.update(b"\0");
        hasher.update(k.as_bytes());
        hasher.update(b"=");
        hasher.update(v.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Content-addressed, TTL-expiring local cache.
///
/// Shared read-mostly across all adapter workers. The read-check-write-on-
/// miss sequence is not atomic across workers; two workers racing on the
/// same key may both fetch and both write, and the last write wins.
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(CacheError::Dir)?;
        Ok(Self { dir })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Get an unexpired cached payload, deleting expired or corrupted
    /// entries as a side effect.
    pub fn get(&self, url: &str, params: &[(String, String)]) -> Option<String> {
        self.get_at(url, params, Utc::now())
    }

    /// Expiry evaluated against an explicit clock; `get` passes `now`.
    pub fn get_at(
        &self,
        url: &str,
        params: &[(String, String)],
        now: DateTime<Utc>,
    ) -> Option<String> {
        let key = cache_key(url, params);
        let path = self.entry_path(&key);

        let raw = fs::read_to_string(&path).ok()?;

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Corrupted cache entry {}: {}", key, e);
                let _ = fs::remove_file(&path);
                return None;
            }
        };

        let age = now.signed_duration_since(entry.cached_at);
        if age.num_seconds() >= entry.ttl_secs as i64 || age.num_seconds() < 0 {
            debug!("Cache entry {} expired, deleting", key);
            let _ = fs::remove_file(&path);
            return None;
        }

        Some(entry.payload)
    }

    pub fn set(
        &self,
        url: &str,
        params: &[(String, String)],
        payload: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let key = cache_key(url, params);
        let entry = CacheEntry {
            cached_at: Utc::now(),
            ttl_secs: ttl.as_secs(),
            payload: payload.to_string(),
        };
        let json = serde_json::to_string(&entry)?;
        fs::write(self.entry_path(&key), json).map_err(CacheError::Write)
    }

    /// Delete one entry by key. Missing entries are not an error.
    pub fn delete(&self, key: &str) -> bool {
        fs::remove_file(self.entry_path(key)).is_ok()
    }

    /// Delete all cached entries
    pub fn clear(&self) -> usize {
        let mut removed = 0;
        if let Ok(entries) = fs::read_dir(&self.dir) {
            for entry in entries.flatten() {
                if entry.path().extension().is_some_and(|ext| ext == "json")
                    && fs::remove_file(entry.path()).is_ok()
                {
                    removed += 1;
                }
            }
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let mut entries = 0;
        let mut total_bytes = 0;
        if let Ok(dir_entries) = fs::read_dir(&self.dir) {
            for entry in dir_entries.flatten() {
                if entry.path().extension().is_some_and(|ext| ext == "json") {
                    entries += 1;
                    if let Ok(meta) = entry.metadata() {
                        total_bytes += meta.len();
                    }
                }
            }
        }
        CacheStats {
            entries,
            total_bytes,
            dir: self.dir.display().to_string(),
        }
    }
}
