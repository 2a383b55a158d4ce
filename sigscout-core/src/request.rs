//! Request/Response wire types for the enrichment engine

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Signal, SignalType, DEFAULT_MIN_RELEVANCE, DEFAULT_TIME_WINDOW_DAYS};

/// Errors from request validation
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("site must be non-empty")]
    EmptySite,

    #[error("time_window_days must be 1-365, got {0}")]
    TimeWindowOutOfRange(u32),

    #[error("min_relevance must be 0.0-1.0, got {0}")]
    MinRelevanceOutOfRange(f64),
}

fn default_time_window() -> u32 {
    DEFAULT_TIME_WINDOW_DAYS
}

fn default_min_relevance() -> f64 {
    DEFAULT_MIN_RELEVANCE
}

fn default_true() -> bool {
    true
}

/// Caller input for one enrichment run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Project site/location identifier
    pub site: String,
    /// Materials to track (may be empty)
    pub materials: Vec<String>,
    /// Geographic region (e.g., "Maharashtra")
    #[serde(default)]
    pub region: Option<String>,
    /// Time window in days (1-365)
    #[serde(default = "default_time_window")]
    pub time_window_days: u32,

    /// Enable web scraping adapters
    #[serde(default = "default_true")]
    pub use_scrapers: bool,
    /// Enable the discovery-search adapter
    #[serde(default)]
    pub use_discovery: bool,
    /// Serve repeated fetches from the local cache
    #[serde(default = "default_true")]
    pub use_cache: bool,
    /// Return a deterministic synthetic signal set, no network I/O
    #[serde(default)]
    pub mock_mode: bool,

    /// Minimum relevance score for a signal to survive filtering
    #[serde(default = "default_min_relevance")]
    pub min_relevance: f64,
    /// Optional allow-list of signal types
    #[serde(default)]
    pub signal_types: Option<Vec<SignalType>>,
}

impl Request {
    pub fn new(site: &str, materials: Vec<String>) -> Self {
        Self {
            site: site.to_string(),
            materials,
            region: None,
            time_window_days: default_time_window(),
            use_scrapers: true,
            use_discovery: false,
            use_cache: true,
            mock_mode: false,
            min_relevance: default_min_relevance(),
            signal_types: None,
        }
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    pub fn with_min_relevance(mut self, min_relevance: f64) -> Self {
        self.min_relevance = min_relevance;
        self
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        if self.site.trim().is_empty() {
            return Err(RequestError::EmptySite);
        }
        if !(1..=365).contains(&self.time_window_days) {
            return Err(RequestError::TimeWindowOutOfRange(self.time_window_days));
        }
        if !(0.0..=1.0).contains(&self.min_relevance) {
            return Err(RequestError::MinRelevanceOutOfRange(self.min_relevance));
        }
        Ok(())
    }
}

/// Aggregate statistics over a ranked signal set
///
/// Recomputed fresh on every request, never cached. Maps are BTreeMaps so
/// serialized output is byte-identical across re-runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Aggregate {
    pub total_signals: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_effect: BTreeMap<String, usize>,
    pub avg_relevance: f64,
    pub avg_confidence: f64,
    pub avg_impact: f64,
    /// Signals with impact_score above the high-impact threshold
    pub high_impact_count: usize,
    /// Matching signal count per requested material
    pub materials_coverage: BTreeMap<String, usize>,
}

/// Engine output for one enrichment run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub request_id: String,
    pub site: String,
    pub region: Option<String>,
    pub materials: Vec<String>,

    /// Most relevant first
    pub signals: Vec<Signal>,
    pub aggregate: Aggregate,

    /// Deduplicated names of sources that contributed signals
    pub sources_used: Vec<String>,
    /// Whether any underlying fetch was served from cache
    pub cache_hit: bool,
    pub processing_time_ms: f64,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = Request::new("Site A", vec!["Steel".to_string()]);
        assert_eq!(req.time_window_days, 30);
        assert_eq!(req.min_relevance, 0.3);
        assert!(req.use_scrapers);
        assert!(req.use_cache);
        assert!(!req.use_discovery);
        assert!(!req.mock_mode);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_site() {
        let req = Request::new("  ", vec![]);
        assert!(matches!(req.validate(), Err(RequestError::EmptySite)));
    }

    #[test]
    fn test_validate_bounds() {
        let mut req = Request::new("Site A", vec![]);
        req.time_window_days = 0;
        assert!(req.validate().is_err());
        req.time_window_days = 366;
        assert!(req.validate().is_err());
        req.time_window_days = 365;
        assert!(req.validate().is_ok());

        req.min_relevance = 1.1;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let req: Request =
            serde_json::from_str(r#"{"site": "Mumbai Metro", "materials": ["Steel"]}"#).unwrap();
        assert_eq!(req.time_window_days, 30);
        assert!(req.use_scrapers);
        assert_eq!(req.min_relevance, 0.3);
    }
}
