//! Region lookup tables shared by the source adapters

/// States recognized in advisory text
pub static STATES: &[&str] = &[
    "Maharashtra",
    "Gujarat",
    "Karnataka",
    "Tamil Nadu",
    "Delhi",
    "Uttar Pradesh",
    "Rajasthan",
    "West Bengal",
    "Madhya Pradesh",
];

/// Major cities mapped to their state
pub static CITY_TO_STATE: &[(&str, &str)] = &[
    ("Mumbai", "Maharashtra"),
    ("Pune", "Maharashtra"),
    ("Ahmedabad", "Gujarat"),
    ("Bangalore", "Karnataka"),
    ("Chennai", "Tamil Nadu"),
];

/// Region mapped to its major city (fuel price lookups)
pub static REGION_TO_CITY: &[(&str, &str)] = &[
    ("Maharashtra", "Mumbai"),
    ("Gujarat", "Ahmedabad"),
    ("Karnataka", "Bangalore"),
    ("Tamil Nadu", "Chennai"),
    ("Delhi", "Delhi"),
];

/// Extract a region from free text, matching states first, then cities
pub fn region_from_text(text: &str) -> Option<String> {
    let text_lower = text.to_lowercase();

    for state in STATES {
        if text_lower.contains(&state.to_lowercase()) {
            return Some(state.to_string());
        }
    }

    for (city, state) in CITY_TO_STATE {
        if text_lower.contains(&city.to_lowercase()) {
            return Some(state.to_string());
        }
    }

    None
}

/// Major city for a region, defaulting to Mumbai for unmapped regions
pub fn city_for_region(region: Option<&str>) -> &'static str {
    if let Some(region) = region {
        for (r, city) in REGION_TO_CITY {
            if r.eq_ignore_ascii_case(region) {
                return city;
            }
        }
    }
    "Mumbai"
}
