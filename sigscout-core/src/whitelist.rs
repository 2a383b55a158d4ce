//! Origin whitelist
//!
//! The fixed, explicit set of domains the system is permitted to contact,
//! grouped by adapter family. The discovery adapter restricts its search
//! query to the same set via a site-restriction clause.

/// Meteorological authority domains
pub static WEATHER_DOMAINS: &[&str] = &["mausam.imd.gov.in", "imd.gov.in", "rmc.imd.gov.in"];

/// Public works / road authority domains
pub static ROAD_DOMAINS: &[&str] = &[
    "pwd.maharashtra.gov.in",
    "mahapwd.com",
    "gujaratpwd.gov.in",
    "karnatakapwd.gov.in",
];

/// Fuel price tracker domains
pub static FUEL_DOMAINS: &[&str] = &[
    "mypetrolprice.com",
    "goodreturns.in",
    "iocl.com",
    "bharatpetroleum.in",
];

/// Port and shipping authority domains
pub static PORT_DOMAINS: &[&str] = &[
    "indianports.gov.in",
    "jnport.gov.in",
    "mumbaiport.gov.in",
    "cochinport.gov.in",
    "shipmin.gov.in",
];

/// Domains the discovery search is confined to
pub static DISCOVERY_DOMAINS: &[&str] = &[
    "mausam.imd.gov.in",
    "imd.gov.in",
    "pwd.maharashtra.gov.in",
    "gujaratpwd.gov.in",
    "indianports.gov.in",
    "jnport.gov.in",
    "mypetrolprice.com",
    "shipmin.gov.in",
];

/// Build the search service's native site-restriction clause,
/// e.g. `(site:a.gov.in OR site:b.gov.in)`
pub fn site_restriction_clause() -> String {
    let parts: Vec<String> = DISCOVERY_DOMAINS
        .iter()
        .map(|d| format!("site:{}", d))
        .collect();
    format!("({})", parts.join(" OR "))
}
