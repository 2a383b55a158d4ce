//! The enrichment engine
//!
//! One engine instance is built per process and shared across requests.
//! Adapters share the cache, the exclusion-policy checker, and the fetch
//! counters, but each keeps its own rate limiter.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::stream::{self, StreamExt};
use sigscout_core::{rank_and_aggregate, Request, RequestError, Response, Signal};
use sigscout_net::{
    create_client, CacheError, CacheStore, FetchSnapshot, FetchStats, HttpConfig, NetError,
    RobotsChecker,
};
use sigscout_sources::{
    DiscoveryAdapter, FuelAdapter, LogisticsAdapter, RoadsAdapter, ScrapeQuery, SourceAdapter,
    WeatherAdapter,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::mock;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error("Cache initialization failed: {0}")]
    Cache(#[from] CacheError),

    #[error("HTTP client construction failed: {0}")]
    Net(#[from] NetError),
}

pub struct Engine {
    config: EngineConfig,
    cache: Arc<CacheStore>,
    stats: Arc<FetchStats>,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    discovery: Option<Arc<dyn SourceAdapter>>,
}

impl Engine {
    /// Build an engine with the four scraping adapters and, when
    /// credentials are configured, the discovery adapter. An adapter whose
    /// client cannot be built is logged and left out of the registry; the
    /// engine still starts.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let cache = Arc::new(CacheStore::new(&config.cache_dir)?);
        let robots = Arc::new(RobotsChecker::new(create_client(&config.http_config())?));
        let stats = Arc::new(FetchStats::default());

        let client_for = |family: &str, browser_agent: bool| {
            let http = HttpConfig {
                browser_agent,
                ..config.http_config()
            };
            match create_client(&http) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!("{} adapter unavailable: {}", family, e);
                    None
                }
            }
        };

        let ua = config.user_agent.as_str();
        let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::new();
        if let Some(client) = client_for("weather", false) {
            adapters.push(Arc::new(WeatherAdapter::new(
                client,
                ua,
                cache.clone(),
                robots.clone(),
                stats.clone(),
            )));
        }
        if let Some(client) = client_for("roads", false) {
            adapters.push(Arc::new(RoadsAdapter::new(
                client,
                ua,
                cache.clone(),
                robots.clone(),
                stats.clone(),
            )));
        }
        // the commercial price tracker serves error pages to bot agents
        if let Some(client) = client_for("fuel", true) {
            adapters.push(Arc::new(FuelAdapter::new(
                client,
                ua,
                cache.clone(),
                robots.clone(),
                stats.clone(),
            )));
        }
        if let Some(client) = client_for("logistics", false) {
            adapters.push(Arc::new(LogisticsAdapter::new(
                client,
                ua,
                cache.clone(),
                robots.clone(),
                stats.clone(),
            )));
        }

        let discovery: Option<Arc<dyn SourceAdapter>> = match &config.discovery {
            Some(dc) if dc.is_configured() => {
                client_for("discovery", false).map(|client| {
                    Arc::new(DiscoveryAdapter::new(
                        dc.clone(),
                        client,
                        ua,
                        cache.clone(),
                        robots.clone(),
                        stats.clone(),
                    )) as Arc<dyn SourceAdapter>
                })
            }
            Some(_) => {
                warn!("Discovery credentials incomplete, discovery disabled");
                None
            }
            None => None,
        };

        info!(
            "Engine ready: {} adapters, discovery {}",
            adapters.len(),
            if discovery.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            config,
            cache,
            stats,
            adapters,
            discovery,
        })
    }

    /// Build an engine around a caller-supplied adapter set (tests)
    pub fn with_adapters(
        config: EngineConfig,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        discovery: Option<Arc<dyn SourceAdapter>>,
    ) -> Result<Self, EngineError> {
        let cache = Arc::new(CacheStore::new(&config.cache_dir)?);
        Ok(Self {
            config,
            cache,
            stats: Arc::new(FetchStats::default()),
            adapters,
            discovery,
        })
    }

    pub fn fetch_stats(&self) -> FetchSnapshot {
        self.stats.snapshot()
    }

    pub(crate) fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub(crate) fn all_adapters(&self) -> impl Iterator<Item = &Arc<dyn SourceAdapter>> {
        self.adapters.iter().chain(self.discovery.iter())
    }

    /// Run one enrichment request end to end
    pub async fn enrich(&self, request: &Request) -> Result<Response, EngineError> {
        request.validate()?;

        let started = Instant::now();
        let request_id = generate_request_id();
        info!(
            "Enrichment {} for site '{}' (region {:?})",
            request_id, request.site, request.region
        );

        if request.mock_mode {
            return Ok(mock::mock_response(request, &request_id, started));
        }

        let before = self.stats.snapshot();
        let collected = self.collect_signals(request).await;
        let (signals, aggregate) = rank_and_aggregate(collected, request);
        let after = self.stats.snapshot();

        let mut sources_used: Vec<String> = Vec::new();
        for signal in &signals {
            if !sources_used.contains(&signal.source.name) {
                sources_used.push(signal.source.name.clone());
            }
        }
        sources_used.sort();

        Ok(Response {
            request_id,
            site: request.site.clone(),
            region: request.region.clone(),
            materials: request.materials.clone(),
            signals,
            aggregate,
            sources_used,
            cache_hit: after.cache_hits > before.cache_hits,
            processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            generated_at: Utc::now(),
        })
    }

    /// Fan the request out across the selected adapters.
    ///
    /// Each adapter runs under its own timeout; a timeout, error, or empty
    /// result from one adapter never affects its siblings.
    async fn collect_signals(&self, request: &Request) -> Vec<Signal> {
        let mut selected: Vec<Arc<dyn SourceAdapter>> = Vec::new();
        if request.use_scrapers {
            selected.extend(self.adapters.iter().cloned());
        }
        if request.use_discovery {
            match &self.discovery {
                Some(adapter) => selected.push(adapter.clone()),
                None => debug!("Discovery requested but not configured, skipping"),
            }
        }
        if selected.is_empty() {
            return Vec::new();
        }

        let query = ScrapeQuery::from_request(request);
        let timeout = Duration::from_secs(self.config.adapter_timeout_secs);

        let results: Vec<Vec<Signal>> = stream::iter(selected)
            .map(|adapter| {
                let query = query.clone();
                async move {
                    match tokio::time::timeout(timeout, adapter.scrape(&query)).await {
                        Ok(Ok(signals)) => {
                            debug!("{}: {} signals", adapter.name(), signals.len());
                            signals
                        }
                        Ok(Err(e)) => {
                            warn!("{} failed: {}", adapter.name(), e);
                            Vec::new()
                        }
                        Err(_) => {
                            warn!("{} timed out after {:?}", adapter.name(), timeout);
                            Vec::new()
                        }
                    }
                }
            })
            .buffer_unordered(self.config.max_workers)
            .collect()
            .await;

        results.into_iter().flatten().collect()
    }
}

/// Request id like `req_20260825_143059_9f2c1a0b`
fn generate_request_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("req_{}_{}", Utc::now().format("%Y%m%d_%H%M%S"), &hex[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sigscout_core::{SignalEffect, SignalType, Source, SourceKind};
    use sigscout_sources::AdapterError;
    use std::path::PathBuf;

    fn temp_config() -> (EngineConfig, PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "sigscout-engine-test-{}",
            Uuid::new_v4().simple()
        ));
        let config = EngineConfig {
            cache_dir: dir.clone(),
            ..EngineConfig::default()
        };
        (config, dir)
    }

    struct StaticAdapter {
        name: &'static str,
        relevance: f64,
        impact: f64,
    }

    #[async_trait]
    impl SourceAdapter for StaticAdapter {
        fn name(&self) -> &str {
            self.name
        }

        fn signal_type(&self) -> SignalType {
            SignalType::Market
        }

        fn requests_per_minute(&self) -> u32 {
            60
        }

        fn cache_ttl(&self) -> Duration {
            Duration::from_secs(3600)
        }

        async fn scrape(&self, query: &ScrapeQuery) -> Result<Vec<Signal>, AdapterError> {
            Ok(vec![Signal::builder(
                SignalType::Market,
                Source::new(self.name, SourceKind::Scraper, None, 0.8),
            )
            .id(&format!("{}_sig", self.name))
            .title("static signal")
            .region(query.region.clone())
            .relevance(self.relevance)
            .impact(self.impact)
            .effects(vec![SignalEffect::RiskIncreased])
            .build()])
        }
    }

    struct FailingAdapter;

    #[async_trait]
    impl SourceAdapter for FailingAdapter {
        fn name(&self) -> &str {
            "Failing Source"
        }

        fn signal_type(&self) -> SignalType {
            SignalType::Market
        }

        fn requests_per_minute(&self) -> u32 {
            60
        }

        fn cache_ttl(&self) -> Duration {
            Duration::from_secs(3600)
        }

        async fn scrape(&self, _query: &ScrapeQuery) -> Result<Vec<Signal>, AdapterError> {
            Err(AdapterError::Parse("malformed page".to_string()))
        }
    }

    struct HangingAdapter;

    #[async_trait]
    impl SourceAdapter for HangingAdapter {
        fn name(&self) -> &str {
            "Hanging Source"
        }

        fn signal_type(&self) -> SignalType {
            SignalType::Market
        }

        fn requests_per_minute(&self) -> u32 {
            60
        }

        fn cache_ttl(&self) -> Duration {
            Duration::from_secs(3600)
        }

        async fn scrape(&self, _query: &ScrapeQuery) -> Result<Vec<Signal>, AdapterError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }
    }

    fn cleanup(dir: PathBuf) {
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let (config, dir) = temp_config();
        let engine = Engine::with_adapters(
            config,
            vec![
                Arc::new(StaticAdapter {
                    name: "Healthy Source",
                    relevance: 0.8,
                    impact: 0.7,
                }),
                Arc::new(FailingAdapter),
            ],
            None,
        )
        .unwrap();

        let request = Request::new("Site A", vec![]);
        let response = engine.enrich(&request).await.unwrap();

        assert_eq!(response.signals.len(), 1);
        assert_eq!(response.sources_used, vec!["Healthy Source".to_string()]);
        cleanup(dir);
    }

    #[tokio::test]
    async fn test_slow_adapter_times_out_without_sinking_others() {
        let (mut config, dir) = temp_config();
        config.adapter_timeout_secs = 1;
        let engine = Engine::with_adapters(
            config,
            vec![
                Arc::new(HangingAdapter),
                Arc::new(StaticAdapter {
                    name: "Fast Source",
                    relevance: 0.9,
                    impact: 0.6,
                }),
            ],
            None,
        )
        .unwrap();

        let request = Request::new("Site A", vec![]);
        let response = engine.enrich(&request).await.unwrap();

        assert_eq!(response.signals.len(), 1);
        assert_eq!(response.signals[0].id, "Fast Source_sig");
        cleanup(dir);
    }

    #[tokio::test]
    async fn test_mock_mode_makes_no_network_calls() {
        let (config, dir) = temp_config();
        let engine = Engine::with_adapters(config, vec![Arc::new(FailingAdapter)], None).unwrap();

        let mut request = Request::new("Site A", vec!["Steel".to_string()]);
        request.mock_mode = true;
        request.region = Some("Maharashtra".to_string());

        let response = engine.enrich(&request).await.unwrap();

        assert_eq!(response.sources_used, vec!["Mock Data".to_string()]);
        assert_eq!(response.signals.len(), 3);
        assert!(response.signals.iter().any(|s| s.id == "mock_weather_001"));
        // the bypass never touches adapters or the network
        let stats = engine.fetch_stats();
        assert_eq!(stats.network_fetches, 0);
        assert_eq!(stats.cache_hits, 0);
        cleanup(dir);
    }

    #[tokio::test]
    async fn test_invalid_request_rejected_at_boundary() {
        let (config, dir) = temp_config();
        let engine = Engine::with_adapters(config, vec![], None).unwrap();

        let request = Request::new("", vec![]);
        let result = engine.enrich(&request).await;
        assert!(matches!(result, Err(EngineError::InvalidRequest(_))));
        cleanup(dir);
    }

    #[tokio::test]
    async fn test_scrapers_disabled_yields_empty_response() {
        let (config, dir) = temp_config();
        let engine = Engine::with_adapters(
            config,
            vec![Arc::new(StaticAdapter {
                name: "Unused Source",
                relevance: 0.9,
                impact: 0.9,
            })],
            None,
        )
        .unwrap();

        let mut request = Request::new("Site A", vec![]);
        request.use_scrapers = false;
        let response = engine.enrich(&request).await.unwrap();

        assert!(response.signals.is_empty());
        assert!(response.sources_used.is_empty());
        assert_eq!(response.aggregate.total_signals, 0);
        cleanup(dir);
    }

    #[tokio::test]
    async fn test_ranked_output_and_request_id_shape() {
        let (config, dir) = temp_config();
        let engine = Engine::with_adapters(
            config,
            vec![
                Arc::new(StaticAdapter {
                    name: "Low Source",
                    relevance: 0.5,
                    impact: 0.5,
                }),
                Arc::new(StaticAdapter {
                    name: "High Source",
                    relevance: 0.9,
                    impact: 0.9,
                }),
            ],
            None,
        )
        .unwrap();

        let request = Request::new("Site A", vec![]);
        let response = engine.enrich(&request).await.unwrap();

        assert_eq!(response.signals.len(), 2);
        assert_eq!(response.signals[0].id, "High Source_sig");
        assert!(response.request_id.starts_with("req_"));
        // req_ + yyyymmdd + _ + hhmmss + _ + 8 hex chars
        assert_eq!(response.request_id.len(), "req_20260825_143059_9f2c1a0b".len());
        assert!(response.processing_time_ms >= 0.0);
        cleanup(dir);
    }
}
