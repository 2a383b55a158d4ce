//! Keyword rule tables for effect and relevance inference
//!
//! Adapters share one evaluation path over ordered, data-driven tables
//! instead of per-adapter branching. A rule maps a keyword class to an
//! effect set and an impact magnitude; rules are evaluated in table order
//! and the strongest matched impact wins.

use crate::SignalEffect;

/// One keyword class mapped to effects and an impact magnitude
pub struct EffectRule {
    pub keywords: &'static [&'static str],
    pub effects: &'static [SignalEffect],
    pub impact: f64,
}

/// Impact assumed when no rule matches
pub const DEFAULT_IMPACT: f64 = 0.5;

/// Weather advisories (meteorological authority pages)
pub static WEATHER_RULES: &[EffectRule] = &[
    EffectRule {
        keywords: &["heavy rain", "very heavy", "extremely heavy", "torrential"],
        effects: &[
            SignalEffect::LeadTimeIncreased,
            SignalEffect::AvailabilityReduced,
            SignalEffect::DemandIncreased,
        ],
        impact: 0.8,
    },
    EffectRule {
        keywords: &["cyclone", "storm", "hurricane", "depression"],
        effects: &[
            SignalEffect::RiskIncreased,
            SignalEffect::LeadTimeIncreased,
            SignalEffect::AvailabilityReduced,
        ],
        impact: 0.9,
    },
    EffectRule {
        keywords: &["heat wave", "cold wave", "extreme temperature"],
        effects: &[SignalEffect::LeadTimeIncreased],
        impact: 0.6,
    },
    EffectRule {
        keywords: &["dense fog", "poor visibility"],
        effects: &[SignalEffect::LeadTimeIncreased],
        impact: 0.5,
    },
];

/// Road and traffic advisories (public works pages)
pub static ROAD_RULES: &[EffectRule] = &[
    EffectRule {
        keywords: &["road closed", "closure", "blocked", "shut"],
        effects: &[
            SignalEffect::LeadTimeIncreased,
            SignalEffect::AvailabilityReduced,
            SignalEffect::PriceIncrease,
        ],
        impact: 0.8,
    },
    EffectRule {
        keywords: &["diversion", "alternate route", "detour"],
        effects: &[SignalEffect::LeadTimeIncreased],
        impact: 0.6,
    },
    EffectRule {
        keywords: &["construction", "maintenance", "repair", "work in progress"],
        effects: &[SignalEffect::LeadTimeIncreased],
        impact: 0.5,
    },
    EffectRule {
        keywords: &["heavy traffic", "congestion", "jam"],
        effects: &[SignalEffect::LeadTimeIncreased],
        impact: 0.4,
    },
];

/// Port and logistics notices
pub static LOGISTICS_RULES: &[EffectRule] = &[
    EffectRule {
        keywords: &["strike", "closed", "shutdown", "suspended"],
        effects: &[
            SignalEffect::AvailabilityReduced,
            SignalEffect::PriceIncrease,
            SignalEffect::RiskIncreased,
        ],
        impact: 0.9,
    },
    EffectRule {
        keywords: &["container shortage", "lack of containers"],
        effects: &[
            SignalEffect::AvailabilityReduced,
            SignalEffect::PriceIncrease,
        ],
        impact: 0.8,
    },
    EffectRule {
        keywords: &["delay", "delayed", "postponed"],
        effects: &[
            SignalEffect::LeadTimeIncreased,
            SignalEffect::AvailabilityReduced,
        ],
        impact: 0.7,
    },
    EffectRule {
        keywords: &["congestion", "backlog", "queue", "waiting"],
        effects: &[SignalEffect::LeadTimeIncreased],
        impact: 0.6,
    },
];

/// Search hits with indirect provenance
pub static DISCOVERY_RULES: &[EffectRule] = &[
    EffectRule {
        keywords: &["price increase", "hike", "surge"],
        effects: &[SignalEffect::PriceIncrease],
        impact: 0.6,
    },
    EffectRule {
        keywords: &["shortage", "unavailable", "out of stock"],
        effects: &[SignalEffect::AvailabilityReduced],
        impact: 0.6,
    },
    EffectRule {
        keywords: &["delay", "postpone", "late"],
        effects: &[SignalEffect::LeadTimeIncreased],
        impact: 0.5,
    },
    EffectRule {
        keywords: &["risk", "warning", "alert"],
        effects: &[SignalEffect::RiskIncreased],
        impact: 0.5,
    },
];

/// Evaluate a rule table against text.
///
/// Returns the union of matched effect sets (deduplicated, table order) and
/// the strongest matched impact. When nothing matches, returns the caller's
/// conservative default effect at moderate impact.
pub fn infer_effects(
    text: &str,
    rules: &[EffectRule],
    default_effect: SignalEffect,
) -> (Vec<SignalEffect>, f64) {
    let text_lower = text.to_lowercase();
    let mut effects: Vec<SignalEffect> = Vec::new();
    let mut impact: f64 = 0.0;

    for rule in rules {
        if rule.keywords.iter().any(|kw| text_lower.contains(kw)) {
            for effect in rule.effects {
                if !effects.contains(effect) {
                    effects.push(*effect);
                }
            }
            impact = impact.max(rule.impact);
        }
    }

    if effects.is_empty() {
        (vec![default_effect], DEFAULT_IMPACT)
    } else {
        (effects, impact)
    }
}

/// A keyword bonus clause within a relevance rubric
pub struct KeywordBonus {
    pub keywords: &'static [&'static str],
    /// Bonus granted per matching keyword
    pub per_match: f64,
    /// Ceiling on the total bonus from this clause
    pub cap: f64,
}

/// Per-adapter relevance scoring rubric
pub struct RelevanceRubric {
    pub base: f64,
    /// Bonus when the requested region appears in the text
    pub region_bonus: f64,
    /// Bonus per requested material mentioned in the text
    pub material_per_match: f64,
    pub material_cap: f64,
    pub bonuses: &'static [KeywordBonus],
}

pub static WEATHER_RELEVANCE: RelevanceRubric = RelevanceRubric {
    base: 0.5,
    region_bonus: 0.3,
    material_per_match: 0.1,
    material_cap: 0.2,
    bonuses: &[KeywordBonus {
        keywords: &["warning", "alert", "severe", "extreme", "heavy", "very"],
        per_match: 0.05,
        cap: 0.2,
    }],
};

pub static ROAD_RELEVANCE: RelevanceRubric = RelevanceRubric {
    base: 0.4,
    region_bonus: 0.3,
    material_per_match: 0.0,
    material_cap: 0.0,
    bonuses: &[
        KeywordBonus {
            keywords: &["truck", "vehicle", "transport", "delivery", "supply", "logistics"],
            per_match: 0.2,
            cap: 0.2,
        },
        KeywordBonus {
            keywords: &["urgent", "immediate", "emergency", "critical"],
            per_match: 0.1,
            cap: 0.1,
        },
    ],
};

pub static LOGISTICS_RELEVANCE: RelevanceRubric = RelevanceRubric {
    base: 0.4,
    region_bonus: 0.0,
    material_per_match: 0.0,
    material_cap: 0.0,
    bonuses: &[
        KeywordBonus {
            keywords: &["steel", "iron", "metal", "cement", "concrete", "copper", "aluminum"],
            per_match: 0.3,
            cap: 0.3,
        },
        KeywordBonus {
            keywords: &["import", "export", "cargo", "shipment"],
            per_match: 0.2,
            cap: 0.2,
        },
        KeywordBonus {
            keywords: &["critical", "severe", "major", "significant"],
            per_match: 0.1,
            cap: 0.1,
        },
    ],
};

pub static DISCOVERY_RELEVANCE: RelevanceRubric = RelevanceRubric {
    base: 0.5,
    region_bonus: 0.2,
    material_per_match: 0.1,
    material_cap: 0.2,
    bonuses: &[KeywordBonus {
        keywords: &["today", "latest", "current", "now"],
        per_match: 0.1,
        cap: 0.1,
    }],
};

/// Score how well text matches the requested region and materials, per the
/// rubric. Capped at 1.0.
pub fn score_relevance(
    rubric: &RelevanceRubric,
    text: &str,
    region: Option<&str>,
    materials: &[String],
) -> f64 {
    let text_lower = text.to_lowercase();
    let mut score = rubric.base;

    if let Some(region) = region {
        if text_lower.contains(&region.to_lowercase()) {
            score += rubric.region_bonus;
        }
    }

    if rubric.material_per_match > 0.0 {
        let mentions = materials
            .iter()
            .filter(|m| text_lower.contains(&m.to_lowercase()))
            .count();
        score += (mentions as f64 * rubric.material_per_match).min(rubric.material_cap);
    }

    for bonus in rubric.bonuses {
        let matches = bonus
            .keywords
            .iter()
            .filter(|kw| text_lower.contains(*kw))
            .count();
        score += (matches as f64 * bonus.per_match).min(bonus.cap);
    }

    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_rules_heavy_rain() {
        let (effects, impact) = infer_effects(
            "Orange alert: heavy rain expected over Mumbai",
            WEATHER_RULES,
            SignalEffect::RiskIncreased,
        );
        assert!(effects.contains(&SignalEffect::LeadTimeIncreased));
        assert!(effects.contains(&SignalEffect::AvailabilityReduced));
        assert!(effects.contains(&SignalEffect::DemandIncreased));
        assert_eq!(impact, 0.8);
    }

    #[test]
    fn test_strongest_matched_impact_wins() {
        let (effects, impact) = infer_effects(
            "Cyclone warning with heavy rain and dense fog",
            WEATHER_RULES,
            SignalEffect::RiskIncreased,
        );
        assert_eq!(impact, 0.9);
        assert!(effects.contains(&SignalEffect::RiskIncreased));
    }

    #[test]
    fn test_no_match_yields_conservative_default() {
        let (effects, impact) = infer_effects(
            "Routine bulletin, nothing notable",
            WEATHER_RULES,
            SignalEffect::RiskIncreased,
        );
        assert_eq!(effects, vec![SignalEffect::RiskIncreased]);
        assert_eq!(impact, DEFAULT_IMPACT);
    }

    #[test]
    fn test_logistics_strike_is_severe() {
        let (effects, impact) = infer_effects(
            "Port workers strike continues, operations suspended",
            LOGISTICS_RULES,
            SignalEffect::LeadTimeIncreased,
        );
        assert_eq!(impact, 0.9);
        assert!(effects.contains(&SignalEffect::PriceIncrease));
    }

    #[test]
    fn test_relevance_region_and_materials() {
        let materials = vec!["Steel".to_string(), "Concrete".to_string()];
        let score = score_relevance(
            &WEATHER_RELEVANCE,
            "Severe warning for Maharashtra: steel yards flooding",
            Some("Maharashtra"),
            &materials,
        );
        // base 0.5 + region 0.3 + one material 0.1 + severity
        assert!(score > 0.8);
        assert!(score <= 1.0);
    }

    #[test]
    fn test_relevance_caps_at_one() {
        let materials: Vec<String> =
            ["Steel", "Concrete", "Cement", "Copper"].iter().map(|s| s.to_string()).collect();
        let score = score_relevance(
            &WEATHER_RELEVANCE,
            "severe extreme heavy very warning alert steel concrete cement copper maharashtra",
            Some("Maharashtra"),
            &materials,
        );
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_road_relevance_transport_keywords() {
        let score = score_relevance(
            &ROAD_RELEVANCE,
            "Truck movement restricted on NH-48 for urgent repairs",
            None,
            &[],
        );
        // base 0.4 + transport 0.2 + urgency 0.1
        assert!((score - 0.7).abs() < 1e-9);
    }
}
