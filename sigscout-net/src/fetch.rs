//! The adapter-facing fetch path
//!
//! `Fetcher` composes the network leaves in the order every adapter
//! follows: permission check -> cache lookup -> rate-limited fetch ->
//! cache write-back. The cache and permission checker are shared across
//! adapters; the rate limiter belongs to one adapter alone.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::{CacheStore, NetError, RateLimiter, RobotsChecker};

/// Counters shared by all fetchers, observed by the engine and tests
#[derive(Debug, Default)]
pub struct FetchStats {
    network_fetches: AtomicU64,
    cache_hits: AtomicU64,
    permission_denials: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSnapshot {
    pub network_fetches: u64,
    pub cache_hits: u64,
    pub permission_denials: u64,
}

impl FetchStats {
    pub fn snapshot(&self) -> FetchSnapshot {
        FetchSnapshot {
            network_fetches: self.network_fetches.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            permission_denials: self.permission_denials.load(Ordering::Relaxed),
        }
    }
}

/// One adapter's fetch pipeline
pub struct Fetcher {
    client: Client,
    user_agent: String,
    limiter: RateLimiter,
    cache: Arc<CacheStore>,
    robots: Arc<RobotsChecker>,
    stats: Arc<FetchStats>,
    cache_ttl: Duration,
}

impl Fetcher {
    pub fn new(
        client: Client,
        user_agent: &str,
        requests_per_minute: u32,
        cache_ttl: Duration,
        cache: Arc<CacheStore>,
        robots: Arc<RobotsChecker>,
        stats: Arc<FetchStats>,
    ) -> Self {
        Self {
            client,
            user_agent: user_agent.to_string(),
            limiter: RateLimiter::new(requests_per_minute),
            cache,
            robots,
            stats,
            cache_ttl,
        }
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.limiter.requests_per_minute()
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// Fetch URL content through permission check, cache, and rate limit.
    ///
    /// `Ok(None)` means the origin's exclusion policy denied the fetch;
    /// that is an expected outcome, not a failure. Transport failures and
    /// non-success statuses are errors for the adapter to recover from.
    pub async fn fetch(
        &self,
        url: &str,
        params: &[(String, String)],
        use_cache: bool,
    ) -> Result<Option<String>, NetError> {
        if !self.robots.can_fetch(url, &self.user_agent).await {
            debug!("Blocked by exclusion policy: {}", url);
            self.stats.permission_denials.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        }

        if use_cache {
            if let Some(payload) = self.cache.get(url, params) {
                debug!("Cache hit: {}", url);
                self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Some(payload));
            }
        }

        self.limiter.wait_if_needed().await;

        self.stats.network_fetches.fetch_add(1, Ordering::Relaxed);
        let mut request = self.client.get(url);
        if !params.is_empty() {
            request = request.query(params);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(NetError::Status(response.status()));
        }

        let body = response.text().await?;

        if use_cache {
            if let Err(e) = self.cache.set(url, params, &body, self.cache_ttl) {
                warn!("Cache write failed for {}: {}", url, e);
            }
        }

        Ok(Some(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cache_key, HttpConfig, RobotsPolicy, TTL_DEFAULT};
    use std::fs;
    use std::path::PathBuf;

    fn temp_cache() -> (Arc<CacheStore>, PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "sigscout-fetch-test-{}",
            uuid::Uuid::new_v4().simple()
        ));
        (Arc::new(CacheStore::new(&dir).unwrap()), dir)
    }

    fn fetcher(cache: Arc<CacheStore>, robots: Arc<RobotsChecker>, stats: Arc<FetchStats>) -> Fetcher {
        let config = HttpConfig::default();
        Fetcher::new(
            Client::new(),
            &config.user_agent,
            60,
            TTL_DEFAULT,
            cache,
            robots,
            stats,
        )
    }

    #[tokio::test]
    async fn test_permission_denial_short_circuits() {
        let (cache, dir) = temp_cache();
        let robots = Arc::new(RobotsChecker::new(Client::new()));
        robots.insert_policy(
            "https://blocked.gov",
            RobotsPolicy::parse("User-agent: *\nDisallow: /\n"),
        );
        let stats = Arc::new(FetchStats::default());

        let fetcher = fetcher(cache, robots, stats.clone());
        let result = fetcher.fetch("https://blocked.gov/notices", &[], true).await;

        assert!(matches!(result, Ok(None)));
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.permission_denials, 1);
        assert_eq!(snapshot.network_fetches, 0);
        let _ = fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_unexpired_entry_serves_without_network() {
        let (cache, dir) = temp_cache();
        cache
            .set("https://example.gov/warnings", &[], "<html>cached</html>", TTL_DEFAULT)
            .unwrap();

        let robots = Arc::new(RobotsChecker::new(Client::new()));
        robots.insert_policy("https://example.gov", RobotsPolicy::allow_all());
        let stats = Arc::new(FetchStats::default());

        let fetcher = fetcher(cache.clone(), robots, stats.clone());
        let body = fetcher
            .fetch("https://example.gov/warnings", &[], true)
            .await
            .unwrap();

        assert_eq!(body, Some("<html>cached</html>".to_string()));
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.network_fetches, 0);

        // the cached entry is addressable for admin deletion
        assert!(cache.delete(&cache_key("https://example.gov/warnings", &[])));
        let _ = fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_use_cache_false_skips_lookup() {
        let (cache, dir) = temp_cache();
        cache
            .set("https://unreachable.invalid/x", &[], "stale", TTL_DEFAULT)
            .unwrap();

        let robots = Arc::new(RobotsChecker::new(Client::new()));
        robots.insert_policy("https://unreachable.invalid", RobotsPolicy::allow_all());
        let stats = Arc::new(FetchStats::default());

        let fetcher = fetcher(cache, robots, stats.clone());
        // bypassing cache forces a network attempt against a dead host
        let result = fetcher.fetch("https://unreachable.invalid/x", &[], false).await;

        assert!(result.is_err());
        assert_eq!(stats.snapshot().cache_hits, 0);
        assert_eq!(stats.snapshot().network_fetches, 1);
        let _ = fs::remove_dir_all(dir);
    }
}
