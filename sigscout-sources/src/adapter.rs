//! The source adapter capability contract

use std::time::Duration;

use async_trait::async_trait;
use sigscout_core::{Request, Signal, SignalType};
use sigscout_net::NetError;
use thiserror::Error;

/// Errors from adapter operations
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Network error: {0}")]
    Network(#[from] NetError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Adapter not configured: {0}")]
    NotConfigured(String),
}

/// The per-invocation slice of a Request that adapters see
#[derive(Debug, Clone)]
pub struct ScrapeQuery {
    pub site: String,
    pub region: Option<String>,
    pub materials: Vec<String>,
    pub time_window_days: u32,
    pub use_cache: bool,
}

impl ScrapeQuery {
    pub fn from_request(request: &Request) -> Self {
        Self {
            site: request.site.clone(),
            region: request.region.clone(),
            materials: request.materials.clone(),
            time_window_days: request.time_window_days,
            use_cache: request.use_cache,
        }
    }
}

/// First `max` characters of text, on a char boundary
pub(crate) fn clip(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Materials recognizable by name in free text, "General" when none
pub(crate) fn materials_in_text(text: &str) -> Vec<String> {
    static MATERIAL_NAMES: &[(&str, &str)] = &[
        ("steel", "Steel"),
        ("iron", "Steel"),
        ("cement", "Cement"),
        ("concrete", "Concrete"),
        ("copper", "Copper"),
        ("aluminum", "Aluminum"),
        ("aluminium", "Aluminum"),
    ];

    let text_lower = text.to_lowercase();
    let mut materials: Vec<String> = Vec::new();
    for (keyword, material) in MATERIAL_NAMES {
        if text_lower.contains(keyword) && !materials.iter().any(|m| m == material) {
            materials.push(material.to_string());
        }
    }
    if materials.is_empty() {
        materials.push("General".to_string());
    }
    materials
}

/// Common interface for all source adapters.
///
/// Every variant follows the same discipline: resolve candidate origin
/// URLs from the region, fetch each through the permission/cache/rate-limit
/// pipeline, and parse fetched content into zero or more scored signals.
/// A fetch denied by an exclusion policy or lost to a transport failure
/// costs that URL's signals only; the adapter's other candidates proceed.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Human-readable source name
    fn name(&self) -> &str;

    /// The type of signals this adapter produces
    fn signal_type(&self) -> SignalType;

    /// Effective rate limit, for the admin sources listing
    fn requests_per_minute(&self) -> u32;

    /// Effective cache TTL, for the admin sources listing
    fn cache_ttl(&self) -> Duration;

    /// Fetch and parse this adapter's origins into signals
    async fn scrape(&self, query: &ScrapeQuery) -> Result<Vec<Signal>, AdapterError>;
}
