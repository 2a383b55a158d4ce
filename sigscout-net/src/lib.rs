//! sigscout-net - Network layer for signal enrichment
//!
//! Provides the plumbing every source adapter fetches through:
//! - HTTP client construction with user-agent rotation
//! - Per-adapter minimum-interval rate limiting
//! - File-based, TTL-expiring content cache
//! - Per-origin fetch-permission (robots.txt) checking, memoized
//! - A `Fetcher` composing permission -> cache -> rate limit -> fetch

pub mod cache;
pub mod client;
pub mod fetch;
pub mod ratelimit;
pub mod robots;

pub use cache::*;
pub use client::*;
pub use fetch::*;
pub use ratelimit::*;
pub use robots::*;
