//! sigscout-sources - Source adapters for signal enrichment
//!
//! Each adapter knows how to fetch and parse one family of whitelisted
//! origins into scored Signal records:
//! - Weather authority advisories (IMD)
//! - Public works road/traffic notices (PWD)
//! - Fuel price trackers
//! - Port and logistics authorities
//! - A keyword-search discovery service confined to the same whitelist

pub mod adapter;
pub mod discovery;
pub mod fuel;
pub mod html;
pub mod logistics;
pub mod roads;
pub mod weather;

pub use adapter::*;
pub use discovery::*;
pub use fuel::*;
pub use logistics::*;
pub use roads::*;
pub use weather::*;
