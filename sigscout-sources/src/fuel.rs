//! Fuel price adapter
//!
//! Reads the price tracker page for the region's major city and emits one
//! signal per fuel grade found. Diesel moves transport cost directly, so
//! it carries higher relevance and impact than petrol. Also the home of
//! the canned signals served in mock mode.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use reqwest::Client;
use sigscout_core::{city_for_region, Signal, SignalEffect, SignalType, Source, SourceKind};
use sigscout_net::{CacheStore, Fetcher, FetchStats, RobotsChecker};
use tracing::{debug, warn};

use crate::adapter::{AdapterError, ScrapeQuery, SourceAdapter};
use crate::html;

const SOURCE_NAME: &str = "Fuel Price Tracker";
const BASE_URL: &str = "https://www.mypetrolprice.com";
const RELIABILITY: f64 = 0.85;
const CONFIDENCE: f64 = 0.9;

pub const FUEL_REQUESTS_PER_MINUTE: u32 = 10;
pub const FUEL_CACHE_TTL: Duration = Duration::from_secs(24 * 3600);

pub const MOCK_DIESEL_PRICE: f64 = 89.50;
pub const MOCK_PETROL_PRICE: f64 = 102.30;

static PRICE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"₹?\s*(\d+\.\d+|\d+)").unwrap());

pub struct FuelAdapter {
    fetcher: Fetcher,
}

impl FuelAdapter {
    pub fn new(
        client: Client,
        user_agent: &str,
        cache: Arc<CacheStore>,
        robots: Arc<RobotsChecker>,
        stats: Arc<FetchStats>,
    ) -> Self {
        Self {
            fetcher: Fetcher::new(
                client,
                user_agent,
                FUEL_REQUESTS_PER_MINUTE,
                FUEL_CACHE_TTL,
                cache,
                robots,
                stats,
            ),
        }
    }

    /// Canned price signals, served when a request asks for mock mode
    pub fn mock_signals(region: Option<&str>, materials: &[String]) -> Vec<Signal> {
        let city = city_for_region(region);
        vec![
            fuel_signal(
                "Diesel",
                MOCK_DIESEL_PRICE,
                region,
                city,
                materials,
                Some("mock_fuel_diesel_001"),
            ),
            fuel_signal(
                "Petrol",
                MOCK_PETROL_PRICE,
                region,
                city,
                materials,
                Some("mock_fuel_petrol_001"),
            ),
        ]
    }
}

#[async_trait::async_trait]
impl SourceAdapter for FuelAdapter {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn signal_type(&self) -> SignalType {
        SignalType::FuelPrice
    }

    fn requests_per_minute(&self) -> u32 {
        self.fetcher.requests_per_minute()
    }

    fn cache_ttl(&self) -> Duration {
        self.fetcher.cache_ttl()
    }

    async fn scrape(&self, query: &ScrapeQuery) -> Result<Vec<Signal>, AdapterError> {
        let city = city_for_region(query.region.as_deref());
        let url = format!("{}/{}", BASE_URL, city.to_lowercase());

        let body = match self.fetcher.fetch(&url, &[], query.use_cache).await {
            Ok(Some(body)) => body,
            Ok(None) => {
                debug!("Fuel page skipped by policy: {}", url);
                return Ok(Vec::new());
            }
            Err(e) => {
                warn!("Fuel fetch failed for {}: {}", url, e);
                return Ok(Vec::new());
            }
        };

        Ok(parse_page(&body, query, city))
    }
}

fn parse_page(body: &str, query: &ScrapeQuery, city: &str) -> Vec<Signal> {
    let mut signals = Vec::new();
    let region = query.region.as_deref();

    if let Some(price) = extract_price(body, "diesel") {
        signals.push(fuel_signal("Diesel", price, region, city, &query.materials, None));
    }
    if let Some(price) = extract_price(body, "petrol") {
        signals.push(fuel_signal("Petrol", price, region, city, &query.materials, None));
    }

    signals
}

/// First plausible per-liter price near a mention of the fuel grade
fn extract_price(body: &str, fuel: &str) -> Option<f64> {
    for mention in html::keyword_mentions(body, fuel, 10) {
        if let Some(captures) = PRICE_REGEX.captures(&mention) {
            if let Ok(price) = captures[1].parse::<f64>() {
                return Some(price);
            }
        }
    }
    None
}

fn fuel_signal(
    fuel: &str,
    price: f64,
    region: Option<&str>,
    city: &str,
    materials: &[String],
    fixed_id: Option<&str>,
) -> Signal {
    let fuel_lower = fuel.to_lowercase();
    let (relevance, impact) = if fuel_lower == "diesel" {
        (0.8, 0.6)
    } else {
        (0.5, 0.4)
    };

    let materials = if materials.is_empty() {
        vec!["General".to_string()]
    } else {
        materials.to_vec()
    };

    let now = Utc::now();
    let mut builder = Signal::builder(
        SignalType::FuelPrice,
        Source::new(SOURCE_NAME, SourceKind::Scraper, Some(BASE_URL), RELIABILITY),
    )
    .id_prefix(&format!("fuel_{}", fuel_lower))
    .title(&format!("{} Price in {}: ₹{:.2}/L", fuel, city, price))
    .summary(&format!(
        "Current {} price in {} is ₹{:.2} per liter. \
         This affects transportation and logistics costs for material delivery.",
        fuel_lower, city, price
    ))
    .region(region.map(|r| r.to_string()))
    .location(city)
    .materials(materials)
    .published_at(now)
    .effective_at(now)
    .relevance(relevance)
    .confidence(CONFIDENCE)
    .impact(impact)
    .effects(vec![SignalEffect::PriceIncrease])
    .effect_magnitude(price)
    .tags(&["fuel", &fuel_lower, "transport", "logistics"])
    .metadata("fuel_type", serde_json::json!(fuel))
    .metadata("price_per_liter", serde_json::json!(price))
    .metadata("currency", serde_json::json!("INR"))
    .metadata("city", serde_json::json!(city));

    if let Some(id) = fixed_id {
        builder = builder.id(id);
    }
    builder.build()
}
