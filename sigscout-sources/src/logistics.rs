//! Port and logistics adapter
//!
//! Fetches notice boards of port authorities near the region and turns
//! cargo-relevant notices and loose delay mentions into logistics signals.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use regex::Regex;
use reqwest::Client;
use scraper::Selector;
use sigscout_core::{
    infer_effects, score_relevance, Signal, SignalEffect, SignalType, Source, SourceKind,
    DEFAULT_MIN_RELEVANCE, LOGISTICS_RELEVANCE, LOGISTICS_RULES,
};
use sigscout_net::{CacheStore, Fetcher, FetchStats, RobotsChecker};
use tracing::{debug, warn};

use crate::adapter::{clip, materials_in_text, AdapterError, ScrapeQuery, SourceAdapter};
use crate::html;

const SOURCE_NAME: &str = "Logistics & Port Tracker";
const RELIABILITY: f64 = 0.80;
const MENTION_RELIABILITY: f64 = 0.70;
const CONFIDENCE: f64 = 0.75;
const MENTION_CONFIDENCE: f64 = 0.65;
const VALIDITY_DAYS: i64 = 14;
const MENTIONS_PER_KEYWORD: usize = 3;

pub const LOGISTICS_REQUESTS_PER_MINUTE: u32 = 8;
pub const LOGISTICS_CACHE_TTL: Duration = Duration::from_secs(12 * 3600);

static REGION_PORTS: &[(&str, &[&str])] = &[
    ("Maharashtra", &["https://jnport.gov.in", "https://mumbaiport.gov.in"]),
    ("Gujarat", &["https://www.indianports.gov.in"]),
    ("Karnataka", &["https://www.indianports.gov.in"]),
    ("Tamil Nadu", &["https://www.indianports.gov.in"]),
];

static DEFAULT_PORTS: &[&str] = &["https://jnport.gov.in", "https://www.indianports.gov.in"];

/// Content gate for notice boards full of tenders and circulars
static CARGO_KEYWORDS: &[&str] = &[
    "cargo", "container", "ship", "vessel", "import", "export", "customs", "clearance", "delay",
    "schedule",
];

static DELAY_KEYWORDS: &[&str] = &["delay", "congestion", "backlog", "waiting", "queue"];

static SECTION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div, article, li, tr").unwrap());

static SECTION_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("(?i)(notice|alert|update|news|announcement)").unwrap());

pub struct LogisticsAdapter {
    fetcher: Fetcher,
}

impl LogisticsAdapter {
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
                LOGISTICS_REQUESTS_PER_MINUTE,
                LOGISTICS_CACHE_TTL,
                cache,
                robots,
                stats,
            ),
        }
    }

    fn candidate_urls(region: Option<&str>) -> Vec<String> {
        if let Some(region) = region {
            for (name, ports) in REGION_PORTS {
                if name.eq_ignore_ascii_case(region) {
                    return ports.iter().map(|p| p.to_string()).collect();
                }
            }
        }
        DEFAULT_PORTS.iter().map(|p| p.to_string()).collect()
    }
}

#[async_trait::async_trait]
impl SourceAdapter for LogisticsAdapter {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn signal_type(&self) -> SignalType {
        SignalType::Logistics
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
                Ok(None) => debug!("Port page skipped by policy: {}", url),
                Err(e) => warn!("Port fetch failed for {}: {}", url, e),
            }
        }

        Ok(signals)
    }
}

fn parse_page(body: &str, query: &ScrapeQuery) -> Vec<Signal> {
    let mut signals = Vec::new();
    let mut seen_texts: Vec<String> = Vec::new();

    for section in html::class_filtered_sections(body, &SECTION_SELECTOR, &SECTION_CLASS) {
        if let Some(signal) = notice_signal(&section.title, &section.text, query) {
            seen_texts.push(section.text);
            signals.push(signal);
        }
    }

    for keyword in DELAY_KEYWORDS {
        for mention in html::keyword_mentions(body, keyword, MENTIONS_PER_KEYWORD) {
            // notices already captured above should not reappear as mentions
            if mention.chars().count() < 20 || seen_texts.iter().any(|t| t.contains(&mention)) {
                continue;
            }
            seen_texts.push(mention.clone());
            signals.push(mention_signal(&mention, query));
        }
    }

    signals
}

fn notice_signal(title: &Option<String>, text: &str, query: &ScrapeQuery) -> Option<Signal> {
    if text.chars().count() < 30 {
        return None;
    }

    let text_lower = text.to_lowercase();
    if !CARGO_KEYWORDS.iter().any(|kw| text_lower.contains(kw)) {
        return None;
    }

    let relevance = score_relevance(
        &LOGISTICS_RELEVANCE,
        text,
        query.region.as_deref(),
        &query.materials,
    );
    if relevance < DEFAULT_MIN_RELEVANCE {
        return None;
    }

    let (effects, impact) = infer_effects(text, LOGISTICS_RULES, SignalEffect::LeadTimeIncreased);
    let published = html::extract_date(text).unwrap_or_else(Utc::now);

    let materials = if query.materials.is_empty() {
        materials_in_text(text)
    } else {
        query.materials.clone()
    };

    Some(
        Signal::builder(
            SignalType::Logistics,
            Source::new(SOURCE_NAME, SourceKind::Scraper, None, RELIABILITY),
        )
        .id_prefix("logistics")
        .title(&title.clone().unwrap_or_else(|| clip(text, 100)))
        .summary(text)
        .full_text(text)
        .region(query.region.clone())
        .materials(materials)
        .published_at(published)
        .effective_at(published)
        .expires_at(published + ChronoDuration::days(VALIDITY_DAYS))
        .relevance(relevance)
        .confidence(CONFIDENCE)
        .impact(impact)
        .effects(effects)
        .tags(&["logistics", "port", "shipping"])
        .build(),
    )
}

fn mention_signal(text: &str, query: &ScrapeQuery) -> Signal {
    let materials = if query.materials.is_empty() {
        vec!["General".to_string()]
    } else {
        query.materials.clone()
    };

    Signal::builder(
        SignalType::Logistics,
        Source::new(SOURCE_NAME, SourceKind::Scraper, None, MENTION_RELIABILITY),
    )
    .id_prefix("logistics_delay")
    .title(&format!("Logistics delay indicator: {}", clip(text, 100)))
    .summary(text)
    .region(query.region.clone())
    .materials(materials)
    .relevance(0.6)
    .confidence(MENTION_CONFIDENCE)
    .impact(0.6)
    .effects(vec![
        SignalEffect::LeadTimeIncreased,
        SignalEffect::AvailabilityReduced,
    ])
    .tags(&["logistics", "delay"])
    .build()
}
