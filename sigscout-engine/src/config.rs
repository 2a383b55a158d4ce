//! Engine configuration
//!
//! All fields default to sensible values, so `EngineConfig::default()` is a
//! working configuration. A TOML file can override any subset; discovery
//! stays off unless credentials are present.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use sigscout_net::HttpConfig;
use sigscout_sources::DiscoveryConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

fn default_max_workers() -> usize {
    4
}

fn default_adapter_timeout_secs() -> u64 {
    30
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".cache/sigscout")
}

fn default_user_agent() -> String {
    HttpConfig::default().user_agent
}

fn default_http_timeout_secs() -> u64 {
    HttpConfig::default().timeout_secs
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Concurrent adapter fan-out bound
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Per-adapter scrape timeout in seconds
    #[serde(default = "default_adapter_timeout_secs")]
    pub adapter_timeout_secs: u64,

    /// Directory for the on-disk fetch cache
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Search discovery credentials; absent means discovery is unavailable
    #[serde(default)]
    pub discovery: Option<DiscoveryConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            adapter_timeout_secs: default_adapter_timeout_secs(),
            cache_dir: default_cache_dir(),
            user_agent: default_user_agent(),
            http_timeout_secs: default_http_timeout_secs(),
            discovery: None,
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            user_agent: self.user_agent.clone(),
            timeout_secs: self.http_timeout_secs,
            browser_agent: false,
        }
    }
}
