//! Aggregation and ranking
//!
//! Pure functions over a signal list and the request: filter by relevance
//! and type allow-list, sort by combined relevance*impact, and compute
//! aggregate statistics. Signals are never mutated; given identical inputs
//! the output ordering and statistics are byte-identical.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::{Aggregate, Request, Signal, HIGH_IMPACT_THRESHOLD};

/// Material name that counts as matching every requested material
const GENERAL_MATERIAL: &str = "General";

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Filter, sort, and summarize signals for a request.
///
/// Returns the surviving signals (most relevant first) and the aggregate
/// computed over them.
pub fn rank_and_aggregate(signals: Vec<Signal>, request: &Request) -> (Vec<Signal>, Aggregate) {
    let mut survivors: Vec<Signal> = signals
        .into_iter()
        .filter(|s| s.relevance_score >= request.min_relevance)
        .filter(|s| match &request.signal_types {
            Some(allowed) => allowed.contains(&s.signal_type),
            None => true,
        })
        .collect();

    // Descending by relevance*impact; id tiebreak keeps re-runs identical
    survivors.sort_by(|a, b| {
        b.rank_score()
            .partial_cmp(&a.rank_score())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    let aggregate = compute_aggregate(&survivors, &request.materials);
    (survivors, aggregate)
}

/// Compute aggregate statistics over a signal set
pub fn compute_aggregate(signals: &[Signal], materials: &[String]) -> Aggregate {
    if signals.is_empty() {
        return Aggregate::default();
    }

    let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_effect: BTreeMap<String, usize> = BTreeMap::new();

    for signal in signals {
        *by_type.entry(signal.signal_type.as_str().to_string()).or_default() += 1;
        for effect in &signal.effects {
            *by_effect.entry(effect.as_str().to_string()).or_default() += 1;
        }
    }

    let n = signals.len() as f64;
    let avg_relevance = signals.iter().map(|s| s.relevance_score).sum::<f64>() / n;
    let avg_confidence = signals.iter().map(|s| s.confidence_score).sum::<f64>() / n;
    let avg_impact = signals.iter().map(|s| s.impact_score).sum::<f64>() / n;

    let high_impact_count = signals
        .iter()
        .filter(|s| s.impact_score > HIGH_IMPACT_THRESHOLD)
        .count();

    let mut materials_coverage: BTreeMap<String, usize> = BTreeMap::new();
    for material in materials {
        let count = signals
            .iter()
            .filter(|s| {
                s.materials_affected.iter().any(|m| m == material)
                    || s.materials_affected.iter().any(|m| m == GENERAL_MATERIAL)
            })
            .count();
        materials_coverage.insert(material.clone(), count);
    }

    Aggregate {
        total_signals: signals.len(),
        by_type,
        by_effect,
        avg_relevance: round2(avg_relevance),
        avg_confidence: round2(avg_confidence),
        avg_impact: round2(avg_impact),
        high_impact_count,
        materials_coverage,
    }
}
