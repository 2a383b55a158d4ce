//! sigscout-engine - Orchestration of the signal enrichment run
//!
//! Owns the shared cache, exclusion-policy checker, and fetch counters;
//! fans a request out across the source adapters with bounded concurrency
//! and per-adapter timeouts; ranks and aggregates what comes back.

pub mod admin;
pub mod config;
pub mod engine;
pub mod mock;

pub use admin::*;
pub use config::*;
pub use engine::*;
