//! Operational surface: cache management and source listing

use serde::Serialize;
use sigscout_net::CacheStats;

use crate::engine::Engine;

/// One registered adapter as reported to operators
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub name: String,
    pub signal_type: String,
    pub requests_per_minute: u32,
    pub cache_ttl_secs: u64,
}

impl Engine {
    pub fn cache_stats(&self) -> CacheStats {
        self.cache().stats()
    }

    /// Drop every cache entry, returning how many were removed
    pub fn clear_cache(&self) -> usize {
        self.cache().clear()
    }

    /// Remove one entry by its content-addressed key
    pub fn delete_cache_entry(&self, key: &str) -> bool {
        self.cache().delete(key)
    }

    /// Registered adapters, discovery included when configured
    pub fn sources(&self) -> Vec<SourceInfo> {
        self.all_adapters()
            .map(|adapter| SourceInfo {
                name: adapter.name().to_string(),
                signal_type: adapter.signal_type().as_str().to_string(),
                requests_per_minute: adapter.requests_per_minute(),
                cache_ttl_secs: adapter.cache_ttl().as_secs(),
            })
            .collect()
    }
}
