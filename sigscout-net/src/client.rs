//! HTTP client construction
//!
//! Builds the reqwest clients adapters fetch through, with a courteous
//! identifying user agent for whitelisted origins.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Identifying agent string sent to whitelisted origins and checked
    /// against their exclusion policies
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Present a rotating browser agent instead of the identifying one.
    /// Commercial sources reject bot agents outright.
    pub browser_agent: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "sigscout-bot/0.1 (procurement signal enrichment)".to_string(),
            timeout_secs: 10,
            browser_agent: false,
        }
    }
}

impl HttpConfig {
    /// The agent string the built client will present
    pub fn resolve_agent(&self) -> String {
        if self.browser_agent {
            random_browser_agent().to_string()
        } else {
            self.user_agent.clone()
        }
    }
}

/// Errors from HTTP plumbing
#[derive(Debug, Error)]
pub enum NetError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Browser user agents for sources that reject bot agents outright
const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:137.0) Gecko/20100101 Firefox/137.0",
];

/// Get a random browser user agent
fn random_browser_agent() -> &'static str {
    use rand::Rng;
    let idx = rand::thread_rng().gen_range(0..BROWSER_USER_AGENTS.len());
    BROWSER_USER_AGENTS[idx]
}

/// Create an HTTP client for adapter fetching
pub fn create_client(config: &HttpConfig) -> Result<Client, NetError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.resolve_agent())
        .build()
        .map_err(|e| NetError::ClientBuild(e.to_string()))
}

/// Extract `scheme://host[:port]` from a URL
pub fn origin_of(url: &str) -> Result<String, NetError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| NetError::InvalidUrl(e.to_string()))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| NetError::InvalidUrl(format!("no host in {}", url)))?;
    match parsed.port() {
        Some(port) => Ok(format!("{}://{}:{}", parsed.scheme(), host, port)),
        None => Ok(format!("{}://{}", parsed.scheme(), host)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert!(config.user_agent.contains("sigscout"));
        assert_eq!(config.timeout_secs, 10);
        assert!(!config.browser_agent);
    }

    #[test]
    fn test_agent_resolution() {
        let config = HttpConfig::default();
        assert_eq!(config.resolve_agent(), config.user_agent);

        let config = HttpConfig {
            browser_agent: true,
            ..HttpConfig::default()
        };
        assert!(config.resolve_agent().contains("Mozilla"));
    }

    #[test]
    fn test_origin_of() {
        assert_eq!(
            origin_of("https://mausam.imd.gov.in/mumbai?x=1").unwrap(),
            "https://mausam.imd.gov.in"
        );
        assert_eq!(
            origin_of("http://localhost:8080/path").unwrap(),
            "http://localhost:8080"
        );
        assert!(origin_of("not a url").is_err());
    }
}
