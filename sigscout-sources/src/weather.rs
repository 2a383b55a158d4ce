//! Weather authority adapter
//!
//! Fetches warning and bulletin pages from the meteorological authority,
//! regional center first when the region maps to one, and parses
//! advisory sections and warning tables into weather signals.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use regex::Regex;
use reqwest::Client;
use scraper::Selector;
use sigscout_core::{
    infer_effects, score_relevance, Signal, SignalEffect, SignalType, Source, SourceKind,
    WEATHER_RELEVANCE, WEATHER_RULES,
};
use sigscout_net::{CacheStore, Fetcher, FetchStats, RobotsChecker};
use tracing::{debug, warn};

use crate::adapter::{clip, AdapterError, ScrapeQuery, SourceAdapter};
use crate::html;

const SOURCE_NAME: &str = "India Meteorological Department";
const BASE_URL: &str = "https://mausam.imd.gov.in";
const RELIABILITY: f64 = 0.95;
const CONFIDENCE: f64 = 0.9;
const VALIDITY_DAYS: i64 = 7;

pub const WEATHER_REQUESTS_PER_MINUTE: u32 = 6;
pub const WEATHER_CACHE_TTL: Duration = Duration::from_secs(6 * 3600);

/// Materials assumed exposed when the request names none
static DEFAULT_MATERIALS: &[&str] = &["Concrete", "Steel", "Cement", "Sand", "Aggregates"];

static SECTION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div, article, section").unwrap());

static SECTION_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("(?i)(warning|alert|bulletin)").unwrap());

static TABLE_CLASS: LazyLock<Regex> = LazyLock::new(|| Regex::new("(?i)(warning|forecast)").unwrap());

/// Regional center page per recognized region
static REGION_PAGES: &[(&str, &str)] = &[
    ("Maharashtra", "mumbai"),
    ("Gujarat", "ahmedabad"),
    ("Karnataka", "bengaluru"),
    ("Tamil Nadu", "chennai"),
    ("Delhi", "delhi"),
];

pub struct WeatherAdapter {
    fetcher: Fetcher,
}

impl WeatherAdapter {
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
                WEATHER_REQUESTS_PER_MINUTE,
                WEATHER_CACHE_TTL,
                cache,
                robots,
                stats,
            ),
        }
    }

    fn candidate_urls(region: Option<&str>) -> Vec<String> {
        if let Some(region) = region {
            for (name, page) in REGION_PAGES {
                if name.eq_ignore_ascii_case(region) {
                    return vec![
                        format!("{}/{}", BASE_URL, page),
                        format!("{}/warnings", BASE_URL),
                    ];
                }
            }
        }
        vec![format!("{}/warnings", BASE_URL), format!("{}/", BASE_URL)]
    }
}

#[async_trait::async_trait]
impl SourceAdapter for WeatherAdapter {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn signal_type(&self) -> SignalType {
        SignalType::Weather
    }

    fn requests_per_minute(&self) -> u32 {
        self.fetcher.requests_per_minute()
    }

    fn cache_ttl(&self) -> Duration {
        self.fetcher.cache_ttl()
    }

    async fn scrape(&self, query: &ScrapeQuery) -> Result<Vec<Signal>, AdapterError> {
        let mut signals = Vec::new();

        for url in Self::candidate_urls(query.region.as_deref()) {
            match self.fetcher.fetch(&url, &[], query.use_cache).await {
                Ok(Some(body)) => signals.extend(parse_page(&body, query)),
                Ok(None) => debug!("Weather page skipped by policy: {}", url),
                Err(e) => warn!("Weather fetch failed for {}: {}", url, e),
            }
        }

        Ok(signals)
    }
}

fn parse_page(body: &str, query: &ScrapeQuery) -> Vec<Signal> {
    let mut signals = Vec::new();

    for section in html::class_filtered_sections(body, &SECTION_SELECTOR, &SECTION_CLASS) {
        let Some(title) = section.title else {
            continue;
        };
        signals.push(advisory_signal(&title, &section.text, query));
    }

    for row in html::class_filtered_table_rows(body, &TABLE_CLASS) {
        if let Some(region) = &query.region {
            if !row.to_lowercase().contains(&region.to_lowercase()) {
                continue;
            }
        }
        signals.push(table_signal(&row, query));
    }

    signals
}

fn advisory_signal(title: &str, text: &str, query: &ScrapeQuery) -> Signal {
    let (effects, impact) = infer_effects(text, WEATHER_RULES, SignalEffect::RiskIncreased);
    let relevance = score_relevance(
        &WEATHER_RELEVANCE,
        text,
        query.region.as_deref(),
        &query.materials,
    );
    let published = html::extract_date(text).unwrap_or_else(Utc::now);

    let materials = if query.materials.is_empty() {
        DEFAULT_MATERIALS.iter().map(|m| m.to_string()).collect()
    } else {
        query.materials.clone()
    };

    Signal::builder(
        SignalType::Weather,
        Source::new(SOURCE_NAME, SourceKind::Scraper, Some(BASE_URL), RELIABILITY),
    )
    .id_prefix("imd")
    .title(title)
    .summary(text)
    .full_text(text)
    .url(BASE_URL)
    .region(
        query
            .region
            .clone()
            .or_else(|| sigscout_core::region_from_text(text)),
    )
    .materials(materials)
    .published_at(published)
    .effective_at(published)
    .expires_at(published + ChronoDuration::days(VALIDITY_DAYS))
    .relevance(relevance)
    .confidence(CONFIDENCE)
    .impact(impact)
    .effects(effects)
    .tags(&["weather", "imd", "official"])
    .build()
}

fn table_signal(row: &str, query: &ScrapeQuery) -> Signal {
    Signal::builder(
        SignalType::Weather,
        Source::new(SOURCE_NAME, SourceKind::Scraper, Some(BASE_URL), RELIABILITY),
    )
    .id_prefix("imd_table")
    .title(&format!("Weather advisory: {}", clip(row, 100)))
    .summary(row)
    .region(
        query
            .region
            .clone()
            .or_else(|| sigscout_core::region_from_text(row)),
    )
    .materials(query.materials.clone())
    .relevance(0.7)
    .confidence(CONFIDENCE)
    .impact(0.6)
    .effects(vec![SignalEffect::LeadTimeIncreased])
    .tags(&["weather", "imd", "table"])
    .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(region: Option<&str>) -> ScrapeQuery {
        ScrapeQuery {
            site: "Pune Metro Line 3".to_string(),
            region: region.map(|r| r.to_string()),
            materials: vec!["Steel".to_string(), "Cement".to_string()],
            time_window_days: 30,
            use_cache: true,
        }
    }

    #[test]
    fn test_parse_advisory_sections() {
        let body = r#"
            <div class="warning-box">
                <h3>Orange Alert for Maharashtra</h3>
                <p>Heavy rain expected over Mumbai and Pune, issued 05-08-2026.</p>
            </div>
            <div class="content"><p>Navigation links</p></div>
        "#;

        let signals = parse_page(body, &query(Some("Maharashtra")));
        assert_eq!(signals.len(), 1);

        let signal = &signals[0];
        assert_eq!(signal.signal_type, SignalType::Weather);
        assert_eq!(signal.title, "Orange Alert for Maharashtra");
        assert!(signal.id.starts_with("imd_"));
        // heavy rain rule
        assert_eq!(signal.impact_score, 0.8);
        assert!(signal.effects.contains(&SignalEffect::AvailabilityReduced));
        // region + severity lift relevance above base
        assert!(signal.relevance_score > 0.7);
        // date from text, validity window applied
        let published = signal.published_at;
        assert_eq!(signal.expires_at, Some(published + ChronoDuration::days(7)));
    }

    #[test]
    fn test_table_rows_filtered_by_region() {
        let body = r#"
            <table class="warning-table">
                <tr><th>District</th><th>Warning</th></tr>
                <tr><td>Mumbai, Maharashtra</td><td>Thunderstorm likely</td></tr>
                <tr><td>Jaipur</td><td>Heat wave</td></tr>
            </table>
        "#;

        let signals = parse_page(body, &query(Some("Maharashtra")));
        assert_eq!(signals.len(), 1);
        assert!(signals[0].title.starts_with("Weather advisory:"));
        assert_eq!(signals[0].relevance_score, 0.7);
        assert_eq!(signals[0].region.as_deref(), Some("Maharashtra"));
    }

    #[test]
    fn test_unscoped_request_keeps_all_rows() {
        let body = r#"
            <table class="forecast">
                <tr><th>District</th><th>Warning</th></tr>
                <tr><td>Jaipur</td><td>Heat wave</td></tr>
            </table>
        "#;

        let signals = parse_page(body, &query(None));
        assert_eq!(signals.len(), 1);
    }

    #[test]
    fn test_candidate_urls() {
        let urls = WeatherAdapter::candidate_urls(Some("Gujarat"));
        assert_eq!(urls[0], "https://mausam.imd.gov.in/ahmedabad");
        assert_eq!(urls[1], "https://mausam.imd.gov.in/warnings");

        let urls = WeatherAdapter::candidate_urls(None);
        assert_eq!(urls[0], "https://mausam.imd.gov.in/warnings");
    }
}
