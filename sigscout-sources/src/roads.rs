//! Public works road adapter
//!
//! Fetches notice and advisory pages from state public works departments
//! and turns closure/diversion/maintenance notices, plus linked PDF
//! documents, into traffic signals.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use regex::Regex;
use reqwest::Client;
use scraper::Selector;
use sigscout_core::{
    infer_effects, score_relevance, Signal, SignalEffect, SignalType, Source, SourceKind,
    DEFAULT_MIN_RELEVANCE, ROAD_RELEVANCE, ROAD_RULES,
};
use sigscout_net::{CacheStore, Fetcher, FetchStats, RobotsChecker};
use tracing::{debug, warn};

use crate::adapter::{clip, AdapterError, ScrapeQuery, SourceAdapter};
use crate::html;

const SOURCE_NAME: &str = "Public Works Department";
const RELIABILITY: f64 = 0.85;
const CONFIDENCE: f64 = 0.8;
const PDF_CONFIDENCE: f64 = 0.85;
const VALIDITY_DAYS: i64 = 30;
const MAX_PDF_NOTICES: usize = 5;

pub const ROADS_REQUESTS_PER_MINUTE: u32 = 8;
pub const ROADS_CACHE_TTL: Duration = Duration::from_secs(12 * 3600);

/// Materials assumed exposed when the request names none
static DEFAULT_MATERIALS: &[&str] = &["Steel", "Concrete", "Cement", "Aggregates", "General"];

static STATE_SITES: &[(&str, &str)] = &[
    ("Maharashtra", "https://pwd.maharashtra.gov.in"),
    ("Gujarat", "https://gujaratpwd.gov.in"),
    ("Karnataka", "https://karnatakapwd.gov.in"),
];

static PDF_KEYWORDS: &[&str] = &["notice", "advisory", "closure", "diversion", "work"];

static SECTION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div, article, li").unwrap());

static SECTION_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("(?i)(notice|advisory|alert|announcement)").unwrap());

pub struct RoadsAdapter {
    fetcher: Fetcher,
}

impl RoadsAdapter {
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
                ROADS_REQUESTS_PER_MINUTE,
                ROADS_CACHE_TTL,
                cache,
                robots,
                stats,
            ),
        }
    }

    fn candidate_urls(region: Option<&str>) -> Vec<String> {
        if let Some(region) = region {
            for (state, base) in STATE_SITES {
                if state.eq_ignore_ascii_case(region) {
                    return vec![
                        base.to_string(),
                        format!("{}/notices", base),
                        format!("{}/advisories", base),
                        format!("{}/traffic", base),
                    ];
                }
            }
        }
        // unmapped regions fall back to the busiest corridor
        vec![STATE_SITES[0].1.to_string()]
    }
}

#[async_trait::async_trait]
impl SourceAdapter for RoadsAdapter {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn signal_type(&self) -> SignalType {
        SignalType::Traffic
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
                Ok(None) => debug!("Road page skipped by policy: {}", url),
                Err(e) => warn!("Road fetch failed for {}: {}", url, e),
            }
        }

        Ok(signals)
    }
}

fn parse_page(body: &str, query: &ScrapeQuery) -> Vec<Signal> {
    let mut signals = Vec::new();

    for section in html::class_filtered_sections(body, &SECTION_SELECTOR, &SECTION_CLASS) {
        if let Some(signal) = advisory_signal(&section.title, &section.text, query) {
            signals.push(signal);
        }
    }

    for (href, text) in html::pdf_links(body).into_iter().take(MAX_PDF_NOTICES) {
        if let Some(signal) = pdf_signal(&href, &text, query) {
            signals.push(signal);
        }
    }

    signals
}

fn advisory_signal(title: &Option<String>, text: &str, query: &ScrapeQuery) -> Option<Signal> {
    if text.chars().count() < 20 {
        return None;
    }

    let relevance = score_relevance(&ROAD_RELEVANCE, text, query.region.as_deref(), &query.materials);
    if relevance < DEFAULT_MIN_RELEVANCE {
        return None;
    }

    let (effects, impact) = infer_effects(text, ROAD_RULES, SignalEffect::LeadTimeIncreased);
    let published = html::extract_date(text).unwrap_or_else(Utc::now);
    let title = title.clone().unwrap_or_else(|| clip(text, 100));

    let materials = if query.materials.is_empty() {
        DEFAULT_MATERIALS.iter().map(|m| m.to_string()).collect()
    } else {
        query.materials.clone()
    };

    Some(
        Signal::builder(
            SignalType::Traffic,
            Source::new(SOURCE_NAME, SourceKind::Scraper, None, RELIABILITY),
        )
        .id_prefix("pwd")
        .title(&title)
        .summary(text)
        .full_text(text)
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
        .tags(&["traffic", "pwd", "infrastructure"])
        .build(),
    )
}

fn pdf_signal(href: &str, link_text: &str, query: &ScrapeQuery) -> Option<Signal> {
    let text_lower = link_text.to_lowercase();
    if !PDF_KEYWORDS.iter().any(|kw| text_lower.contains(kw)) {
        return None;
    }

    let materials = if query.materials.is_empty() {
        vec!["General".to_string()]
    } else {
        query.materials.clone()
    };

    Some(
        Signal::builder(
            SignalType::Traffic,
            Source::new(SOURCE_NAME, SourceKind::Scraper, None, RELIABILITY),
        )
        .id_prefix("pwd_pdf")
        .title(&format!("PWD Notice: {}", clip(link_text, 150)))
        .summary(&format!("Official PWD document: {}", link_text))
        .url(href)
        .region(query.region.clone())
        .materials(materials)
        .relevance(0.6)
        .confidence(PDF_CONFIDENCE)
        .impact(0.5)
        .effects(vec![SignalEffect::LeadTimeIncreased])
        .tags(&["traffic", "pwd", "document"])
        .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> ScrapeQuery {
        ScrapeQuery {
            site: "Warehouse expansion, Bhiwandi".to_string(),
            region: Some("Maharashtra".to_string()),
            materials: vec!["Cement".to_string()],
            time_window_days: 30,
            use_cache: true,
        }
    }

    #[test]
    fn test_closure_notice_scored_high() {
        let body = r#"
            <div class="notice-item">
                <strong>NH-48 road closed near Panvel</strong>
                <p>Road closed for truck movement in Maharashtra from 10-09-2026. Use alternate route.</p>
            </div>
        "#;

        let signals = parse_page(body, &query());
        assert_eq!(signals.len(), 1);

        let signal = &signals[0];
        assert_eq!(signal.signal_type, SignalType::Traffic);
        assert!(signal.id.starts_with("pwd_"));
        assert_eq!(signal.impact_score, 0.8);
        assert!(signal.effects.contains(&SignalEffect::PriceIncrease));
        // base 0.4 + region 0.3 + transport 0.2
        assert!(signal.relevance_score >= 0.9);
        assert_eq!(
            signal.expires_at,
            Some(signal.published_at + ChronoDuration::days(30))
        );
    }

    #[test]
    fn test_short_sections_dropped() {
        let body = r#"
            <div class="notice">Short</div>
            <div class="announcement">Office timings revised for the festive season break.</div>
        "#;

        let mut q = query();
        q.region = None;
        let signals = parse_page(body, &q);
        // the one-word notice is dropped; a generic announcement keeps base relevance
        assert_eq!(signals.len(), 1);
        assert!((signals[0].relevance_score - 0.4).abs() < 1e-9);
        assert_eq!(signals[0].impact_score, 0.5);
    }

    #[test]
    fn test_pdf_links_filtered_and_capped() {
        let mut body = String::new();
        for i in 0..8 {
            body.push_str(&format!(
                r#"<a href="/docs/n{i}.pdf">Closure notice {i}</a>"#
            ));
        }
        body.push_str(r#"<a href="/docs/tender.pdf">Tender results</a>"#);

        let signals = parse_page(&body, &query());
        assert_eq!(signals.len(), MAX_PDF_NOTICES);
        assert!(signals[0].title.starts_with("PWD Notice:"));
        assert_eq!(signals[0].confidence_score, PDF_CONFIDENCE);
    }

    #[test]
    fn test_candidate_urls_per_state() {
        let urls = RoadsAdapter::candidate_urls(Some("Karnataka"));
        assert_eq!(urls.len(), 4);
        assert!(urls[0].contains("karnatakapwd"));

        let urls = RoadsAdapter::candidate_urls(Some("Kerala"));
        assert_eq!(urls, vec!["https://pwd.maharashtra.gov.in".to_string()]);
    }
}
