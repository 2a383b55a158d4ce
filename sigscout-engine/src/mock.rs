//! Deterministic mock responses
//!
//! Serves a fixed synthetic signal set with zero network I/O, for callers
//! exercising the pipeline shape without touching any origin. Mock signals
//! skip relevance filtering so the set is stable regardless of thresholds.

use std::time::Instant;

use chrono::Utc;
use sigscout_core::{
    compute_aggregate, Request, Response, Signal, SignalEffect, SignalType, Source, SourceKind,
};
use sigscout_sources::FuelAdapter;

pub fn mock_response(request: &Request, request_id: &str, started: Instant) -> Response {
    let mut signals = FuelAdapter::mock_signals(request.region.as_deref(), &request.materials);
    signals.push(mock_weather_signal(request));

    let aggregate = compute_aggregate(&signals, &request.materials);

    Response {
        request_id: request_id.to_string(),
        site: request.site.clone(),
        region: request.region.clone(),
        materials: request.materials.clone(),
        signals,
        aggregate,
        sources_used: vec!["Mock Data".to_string()],
        cache_hit: false,
        processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        generated_at: Utc::now(),
    }
}

fn mock_weather_signal(request: &Request) -> Signal {
    Signal::builder(
        SignalType::Weather,
        Source::new("Mock Weather Service", SourceKind::Mock, None, 1.0),
    )
    .id("mock_weather_001")
    .title("Mock: Heavy rainfall expected")
    .summary(
        "This is mock data for testing. Heavy rainfall expected in the region for next 3 days.",
    )
    .region(Some(
        request
            .region
            .clone()
            .unwrap_or_else(|| "Maharashtra".to_string()),
    ))
    .materials(request.materials.clone())
    .relevance(0.85)
    .confidence(0.9)
    .impact(0.75)
    .effects(vec![
        SignalEffect::LeadTimeIncreased,
        SignalEffect::DemandIncreased,
    ])
    .tags(&["mock", "weather"])
    .build()
}
