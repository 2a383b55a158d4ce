//! sigscout-core - Domain model for procurement signal enrichment
//!
//! This crate provides the foundational primitives:
//! - Scored, typed Signal records with provenance
//! - Request/Response/Aggregate wire types
//! - Keyword rule tables for effect and relevance inference
//! - Aggregation and ranking over signal sets
//! - The origin whitelist shared by scrapers and discovery

pub mod geo;
pub mod rank;
pub mod request;
pub mod rules;
pub mod signal;
pub mod whitelist;

pub use geo::*;
pub use rank::*;
pub use request::*;
pub use rules::*;
pub use signal::*;
pub use whitelist::*;

/// Impact score above which a signal counts as high-impact
pub const HIGH_IMPACT_THRESHOLD: f64 = 0.7;

/// Default minimum relevance for a request
pub const DEFAULT_MIN_RELEVANCE: f64 = 0.3;

/// Default enrichment time window in days
pub const DEFAULT_TIME_WINDOW_DAYS: u32 = 30;

/// Maximum title length carried on a signal
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum summary length carried on a signal
pub const MAX_SUMMARY_LEN: usize = 500;
