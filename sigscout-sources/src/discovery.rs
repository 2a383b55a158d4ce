//! Keyword-search discovery adapter
//!
//! Queries a programmable search API, restricted to the same whitelisted
//! domains the scraping adapters cover, and converts search hits into
//! lower-confidence signals. The search endpoint is a paid API with its
//! own terms, so it is exempt from the exclusion-policy check.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use sigscout_core::{
    infer_effects, score_relevance, site_restriction_clause, Signal, SignalEffect, SignalType,
    Source, SourceKind, DISCOVERY_RELEVANCE, DISCOVERY_RULES,
};
use sigscout_net::{
    origin_of, CacheStore, Fetcher, FetchStats, RobotsChecker, RobotsPolicy, TTL_SHORT,
};
use tracing::{debug, warn};

use crate::adapter::{AdapterError, ScrapeQuery, SourceAdapter};

const SOURCE_NAME: &str = "Custom Search Discovery";
const RELIABILITY: f64 = 0.7;
const CONFIDENCE: f64 = 0.65;
const IMPACT: f64 = 0.5;

pub const DISCOVERY_REQUESTS_PER_MINUTE: u32 = 10;
pub const DISCOVERY_CACHE_TTL: Duration = TTL_SHORT;
pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
pub const MAX_RESULTS: u32 = 10;

/// Search API credentials and endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    pub api_key: String,
    pub engine_id: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_max_results() -> u32 {
    MAX_RESULTS
}

impl DiscoveryConfig {
    pub fn new(api_key: &str, engine_id: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            engine_id: engine_id.to_string(),
            endpoint: default_endpoint(),
            max_results: default_max_results(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.engine_id.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    link: String,
}

pub struct DiscoveryAdapter {
    config: DiscoveryConfig,
    fetcher: Fetcher,
}

impl DiscoveryAdapter {
    pub fn new(
        config: DiscoveryConfig,
        client: Client,
        user_agent: &str,
        cache: Arc<CacheStore>,
        robots: Arc<RobotsChecker>,
        stats: Arc<FetchStats>,
    ) -> Self {
        // The API endpoint is governed by its terms of use, not robots.txt
        if let Ok(origin) = origin_of(&config.endpoint) {
            robots.insert_policy(&origin, RobotsPolicy::allow_all());
        }
        Self {
            config,
            fetcher: Fetcher::new(
                client,
                user_agent,
                DISCOVERY_REQUESTS_PER_MINUTE,
                DISCOVERY_CACHE_TTL,
                cache,
                robots,
                stats,
            ),
        }
    }

    fn build_query(query: &ScrapeQuery) -> String {
        let mut parts = vec!["procurement".to_string(), query.site.clone()];
        if let Some(region) = &query.region {
            parts.push(region.clone());
        }
        parts.extend(query.materials.iter().take(2).cloned());
        format!("{} {}", parts.join(" "), site_restriction_clause())
    }
}

#[async_trait::async_trait]
impl SourceAdapter for DiscoveryAdapter {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn signal_type(&self) -> SignalType {
        SignalType::Market
    }

    fn requests_per_minute(&self) -> u32 {
        self.fetcher.requests_per_minute()
    }

    fn cache_ttl(&self) -> Duration {
        self.fetcher.cache_ttl()
    }

    async fn scrape(&self, query: &ScrapeQuery) -> Result<Vec<Signal>, AdapterError> {
        if !self.config.is_configured() {
            return Err(AdapterError::NotConfigured(
                "search credentials missing".to_string(),
            ));
        }

        let params = vec![
            ("key".to_string(), self.config.api_key.clone()),
            ("cx".to_string(), self.config.engine_id.clone()),
            ("q".to_string(), Self::build_query(query)),
            ("num".to_string(), self.config.max_results.min(MAX_RESULTS).to_string()),
        ];

        let body = match self
            .fetcher
            .fetch(&self.config.endpoint, &params, query.use_cache)
            .await
        {
            Ok(Some(body)) => body,
            Ok(None) => return Ok(Vec::new()),
            Err(e) => {
                warn!("Search API request failed: {}", e);
                return Ok(Vec::new());
            }
        };

        let response: SearchResponse = serde_json::from_str(&body)
            .map_err(|e| AdapterError::Parse(format!("search response: {}", e)))?;

        debug!("Discovery returned {} items", response.items.len());
        Ok(response
            .items
            .into_iter()
            .map(|item| item_to_signal(item, query))
            .collect())
    }
}

fn item_to_signal(item: SearchItem, query: &ScrapeQuery) -> Signal {
    let content = format!("{} {}", item.title, item.snippet);
    let signal_type = infer_signal_type(&item.link, &content);
    let (effects, _) = infer_effects(&content, DISCOVERY_RULES, SignalEffect::RiskIncreased);
    let relevance = score_relevance(
        &DISCOVERY_RELEVANCE,
        &content,
        query.region.as_deref(),
        &query.materials,
    );

    Signal::builder(
        signal_type,
        Source::new(SOURCE_NAME, SourceKind::Discovery, Some(&item.link), RELIABILITY),
    )
    .id_prefix("cse")
    .title(&item.title)
    .summary(&item.snippet)
    .url(&item.link)
    .region(query.region.clone())
    .materials(query.materials.clone())
    .relevance(relevance)
    .confidence(CONFIDENCE)
    .impact(IMPACT)
    .effects(effects)
    .tags(&["cse", "discovered"])
    .build()
}

/// Hits keep the signal type of the family their origin belongs to
fn infer_signal_type(url: &str, content: &str) -> SignalType {
    let url_lower = url.to_lowercase();
    let content_lower = content.to_lowercase();

    if url_lower.contains("imd.gov.in") || url_lower.contains("mausam") {
        SignalType::Weather
    } else if url_lower.contains("pwd") || content_lower.contains("traffic") {
        SignalType::Traffic
    } else if url_lower.contains("port") || content_lower.contains("shipping") {
        SignalType::Logistics
    } else if url_lower.contains("fuel")
        || content_lower.contains("petrol")
        || content_lower.contains("diesel")
    {
        SignalType::FuelPrice
    } else {
        SignalType::Market
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> ScrapeQuery {
        ScrapeQuery {
            site: "Metro depot, Charkop".to_string(),
            region: Some("Maharashtra".to_string()),
            materials: vec!["Steel".to_string(), "Cement".to_string(), "Sand".to_string()],
            time_window_days: 30,
            use_cache: true,
        }
    }

    #[test]
    fn test_build_query_restricts_to_whitelist() {
        let q = DiscoveryAdapter::build_query(&query());
        assert!(q.starts_with("procurement Metro depot, Charkop Maharashtra Steel Cement"));
        // only the top two materials are included
        assert!(!q.contains("Sand"));
        assert!(q.contains("site:mausam.imd.gov.in"));
        assert!(q.ends_with(')'));
    }

    #[test]
    fn test_unconfigured_adapter_reports_it() {
        let config = DiscoveryConfig::new("", "");
        assert!(!config.is_configured());
    }

    #[test]
    fn test_config_defaults() {
        let config: DiscoveryConfig =
            serde_json::from_str(r#"{"api_key": "k", "engine_id": "cx"}"#).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.max_results, MAX_RESULTS);
        assert!(config.is_configured());
    }

    #[test]
    fn test_item_conversion_and_type_inference() {
        let item = SearchItem {
            title: "Cement price hike announced".to_string(),
            snippet: "Latest increase affects Maharashtra suppliers".to_string(),
            link: "https://mypetrolprice.com/fuel-news".to_string(),
        };

        let signal = item_to_signal(item, &query());
        assert_eq!(signal.signal_type, SignalType::FuelPrice);
        assert!(signal.id.starts_with("cse_"));
        assert_eq!(signal.confidence_score, CONFIDENCE);
        assert_eq!(signal.impact_score, IMPACT);
        assert!(signal.effects.contains(&SignalEffect::PriceIncrease));
        assert_eq!(signal.source.kind, SourceKind::Discovery);
        // region + material + recency bonuses apply
        assert!(signal.relevance_score > 0.5);
    }

    #[test]
    fn test_signal_type_from_origin() {
        assert_eq!(
            infer_signal_type("https://mausam.imd.gov.in/warnings", ""),
            SignalType::Weather
        );
        assert_eq!(
            infer_signal_type("https://pwd.maharashtra.gov.in/x", ""),
            SignalType::Traffic
        );
        assert_eq!(
            infer_signal_type("https://jnport.gov.in/notices", ""),
            SignalType::Logistics
        );
        assert_eq!(
            infer_signal_type("https://example.gov.in", "coastal shipping rates"),
            SignalType::Logistics
        );
        assert_eq!(infer_signal_type("https://other.gov.in", "tender"), SignalType::Market);
    }

    #[test]
    fn test_empty_results_parse() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(response.items.is_empty());
    }
}
