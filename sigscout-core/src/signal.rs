//! Signal records - the unit of enrichment output
//!
//! A Signal is one scored, typed record describing an external condition
//! relevant to procurement (a weather warning, a road closure, a fuel price
//! move). Signals are created once by a source adapter at parse time and are
//! immutable afterwards.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{MAX_SUMMARY_LEN, MAX_TITLE_LEN};

/// Type of procurement signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Weather,
    Traffic,
    Disaster,
    FuelPrice,
    Supplier,
    Logistics,
    Port,
    Regulatory,
    Market,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Weather => "weather",
            SignalType::Traffic => "traffic",
            SignalType::Disaster => "disaster",
            SignalType::FuelPrice => "fuel_price",
            SignalType::Supplier => "supplier",
            SignalType::Logistics => "logistics",
            SignalType::Port => "port",
            SignalType::Regulatory => "regulatory",
            SignalType::Market => "market",
        }
    }

    /// Default validity window when a source does not state an expiry
    pub fn default_validity(&self) -> Duration {
        match self {
            SignalType::Weather => Duration::hours(6),
            SignalType::FuelPrice => Duration::days(1),
            SignalType::Traffic | SignalType::Logistics | SignalType::Port => Duration::days(3),
            _ => Duration::days(7),
        }
    }
}

/// Directional effect on procurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalEffect {
    PriceIncrease,
    PriceDecrease,
    AvailabilityReduced,
    AvailabilityIncreased,
    LeadTimeIncreased,
    LeadTimeDecreased,
    RiskIncreased,
    RiskDecreased,
    DemandIncreased,
    DemandDecreased,
}

impl SignalEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalEffect::PriceIncrease => "price_increase",
            SignalEffect::PriceDecrease => "price_decrease",
            SignalEffect::AvailabilityReduced => "availability_reduced",
            SignalEffect::AvailabilityIncreased => "availability_increased",
            SignalEffect::LeadTimeIncreased => "lead_time_increased",
            SignalEffect::LeadTimeDecreased => "lead_time_decreased",
            SignalEffect::RiskIncreased => "risk_increased",
            SignalEffect::RiskDecreased => "risk_decreased",
            SignalEffect::DemandIncreased => "demand_increased",
            SignalEffect::DemandDecreased => "demand_decreased",
        }
    }
}

/// How a source was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Api,
    Scraper,
    Discovery,
    Mock,
}

/// Provenance metadata embedded in each signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Source name (e.g., "India Meteorological Department")
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub url: Option<String>,
    /// Estimated reliability (0.0 - 1.0)
    pub reliability_score: f64,
    pub last_updated: DateTime<Utc>,
}

impl Source {
    pub fn new(name: &str, kind: SourceKind, url: Option<&str>, reliability: f64) -> Self {
        Self {
            name: name.to_string(),
            kind,
            url: url.map(|u| u.to_string()),
            reliability_score: reliability.clamp(0.0, 1.0),
            last_updated: Utc::now(),
        }
    }
}

/// One scored enrichment signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Unique signal id, never reused
    pub id: String,

    #[serde(rename = "type")]
    pub signal_type: SignalType,

    pub source: Source,

    pub title: String,
    pub summary: String,
    pub full_text: Option<String>,
    pub url: Option<String>,

    /// Geographic region (e.g., "Maharashtra")
    pub region: Option<String>,
    /// Specific location within the region
    pub location: Option<String>,
    /// Materials impacted; empty means unscoped
    pub materials_affected: Vec<String>,

    pub published_at: DateTime<Utc>,
    pub effective_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,

    /// How well the signal matches the query (0.0 - 1.0)
    pub relevance_score: f64,
    /// Confidence in the signal itself (0.0 - 1.0)
    pub confidence_score: f64,
    /// Estimated procurement severity (0.0 - 1.0)
    pub impact_score: f64,

    /// Procurement effects; always non-empty
    pub effects: Vec<SignalEffect>,
    /// Magnitude of the effect where quantifiable (e.g., a price)
    pub effect_magnitude: Option<f64>,

    pub tags: Vec<String>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Signal {
    /// Create a new signal builder
    pub fn builder(signal_type: SignalType, source: Source) -> SignalBuilder {
        SignalBuilder::new(signal_type, source)
    }

    /// Ranking key: relevance and impact combined
    pub fn rank_score(&self) -> f64 {
        self.relevance_score * self.impact_score
    }
}

/// Generate an id like `imd_9f2c1a0b44de`
fn generate_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &hex[..12])
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

/// Builder for signals
///
/// Enforces the signal invariants at construction: scores are clamped into
/// [0.0, 1.0], the effect set is never empty (falling back to the builder's
/// conservative default), and missing timestamps default to the creation
/// time / the type's validity window.
pub struct SignalBuilder {
    signal_type: SignalType,
    source: Source,
    id: Option<String>,
    id_prefix: String,
    title: String,
    summary: String,
    full_text: Option<String>,
    url: Option<String>,
    region: Option<String>,
    location: Option<String>,
    materials_affected: Vec<String>,
    published_at: Option<DateTime<Utc>>,
    effective_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    relevance_score: f64,
    confidence_score: f64,
    impact_score: f64,
    effects: Vec<SignalEffect>,
    default_effect: SignalEffect,
    effect_magnitude: Option<f64>,
    tags: Vec<String>,
    metadata: HashMap<String, serde_json::Value>,
}

impl SignalBuilder {
    pub fn new(signal_type: SignalType, source: Source) -> Self {
        Self {
            signal_type,
            source,
            id: None,
            id_prefix: "sig".to_string(),
            title: String::new(),
            summary: String::new(),
            full_text: None,
            url: None,
            region: None,
            location: None,
            materials_affected: Vec::new(),
            published_at: None,
            effective_at: None,
            expires_at: None,
            relevance_score: 0.5,
            confidence_score: 0.5,
            impact_score: 0.5,
            effects: Vec::new(),
            default_effect: SignalEffect::RiskIncreased,
            effect_magnitude: None,
            tags: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Use a fixed id instead of a generated one (mock signals)
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn id_prefix(mut self, prefix: &str) -> Self {
        self.id_prefix = prefix.to_string();
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = truncate_chars(title, MAX_TITLE_LEN);
        self
    }

    pub fn summary(mut self, summary: &str) -> Self {
        self.summary = truncate_chars(summary, MAX_SUMMARY_LEN);
        self
    }

    pub fn full_text(mut self, text: &str) -> Self {
        self.full_text = Some(text.to_string());
        self
    }

    pub fn url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    pub fn location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn materials(mut self, materials: Vec<String>) -> Self {
        self.materials_affected = materials;
        self
    }

    pub fn published_at(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    pub fn effective_at(mut self, at: DateTime<Utc>) -> Self {
        self.effective_at = Some(at);
        self
    }

    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    pub fn relevance(mut self, score: f64) -> Self {
        self.relevance_score = score.clamp(0.0, 1.0);
        self
    }

    pub fn confidence(mut self, score: f64) -> Self {
        self.confidence_score = score.clamp(0.0, 1.0);
        self
    }

    pub fn impact(mut self, score: f64) -> Self {
        self.impact_score = score.clamp(0.0, 1.0);
        self
    }

    pub fn effects(mut self, effects: Vec<SignalEffect>) -> Self {
        self.effects = effects;
        self
    }

    /// Effect applied when no stronger signal is detected
    pub fn default_effect(mut self, effect: SignalEffect) -> Self {
        self.default_effect = effect;
        self
    }

    pub fn effect_magnitude(mut self, magnitude: f64) -> Self {
        self.effect_magnitude = Some(magnitude);
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> Signal {
        let published_at = self.published_at.unwrap_or_else(Utc::now);
        let expires_at = self
            .expires_at
            .or_else(|| Some(published_at + self.signal_type.default_validity()));

        // Dedup while preserving priority order
        let mut effects: Vec<SignalEffect> = Vec::new();
        for effect in self.effects {
            if !effects.contains(&effect) {
                effects.push(effect);
            }
        }
        if effects.is_empty() {
            effects.push(self.default_effect);
        }

        Signal {
            id: self.id.unwrap_or_else(|| generate_id(&self.id_prefix)),
            signal_type: self.signal_type,
            source: self.source,
            title: self.title,
            summary: self.summary,
            full_text: self.full_text,
            url: self.url,
            region: self.region,
            location: self.location,
            materials_affected: self.materials_affected,
            published_at,
            effective_at: self.effective_at,
            expires_at,
            relevance_score: self.relevance_score.clamp(0.0, 1.0),
            confidence_score: self.confidence_score.clamp(0.0, 1.0),
            impact_score: self.impact_score.clamp(0.0, 1.0),
            effects,
            effect_magnitude: self.effect_magnitude,
            tags: self.tags,
            metadata: self.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_source() -> Source {
        Source::new("Test Source", SourceKind::Scraper, None, 0.8)
    }

    #[test]
    fn test_builder_clamps_scores() {
        let signal = Signal::builder(SignalType::Weather, test_source())
            .title("Heavy rainfall warning")
            .relevance(1.7)
            .confidence(-0.2)
            .impact(0.8)
            .build();

        assert_eq!(signal.relevance_score, 1.0);
        assert_eq!(signal.confidence_score, 0.0);
        assert_eq!(signal.impact_score, 0.8);
    }

    #[test]
    fn test_builder_never_leaves_effects_empty() {
        let signal = Signal::builder(SignalType::Traffic, test_source())
            .default_effect(SignalEffect::LeadTimeIncreased)
            .build();

        assert_eq!(signal.effects, vec![SignalEffect::LeadTimeIncreased]);
    }

    #[test]
    fn test_builder_dedups_effects() {
        let signal = Signal::builder(SignalType::Logistics, test_source())
            .effects(vec![
                SignalEffect::LeadTimeIncreased,
                SignalEffect::AvailabilityReduced,
                SignalEffect::LeadTimeIncreased,
            ])
            .build();

        assert_eq!(signal.effects.len(), 2);
    }

    #[test]
    fn test_default_expiry_follows_type_window() {
        let signal = Signal::builder(SignalType::FuelPrice, test_source()).build();
        let expires = signal.expires_at.expect("fuel signals always expire");
        assert_eq!(expires - signal.published_at, Duration::days(1));

        let weather = Signal::builder(SignalType::Weather, test_source()).build();
        let expires = weather.expires_at.unwrap();
        assert_eq!(expires - weather.published_at, Duration::hours(6));
    }

    #[test]
    fn test_title_and_summary_truncated() {
        let long = "x".repeat(1000);
        let signal = Signal::builder(SignalType::Market, test_source())
            .title(&long)
            .summary(&long)
            .build();

        assert_eq!(signal.title.chars().count(), MAX_TITLE_LEN);
        assert_eq!(signal.summary.chars().count(), MAX_SUMMARY_LEN);
    }

    #[test]
    fn test_generated_ids_unique() {
        let a = Signal::builder(SignalType::Weather, test_source())
            .id_prefix("imd")
            .build();
        let b = Signal::builder(SignalType::Weather, test_source())
            .id_prefix("imd")
            .build();

        assert!(a.id.starts_with("imd_"));
        assert_ne!(a.id, b.id);
    }
}
