//! JSON record served to the map page.

use serde::{Deserialize, Serialize};

/// One live spawn as the front end sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRecord {
    /// Title-cased species name.
    pub name: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Expiry as RFC 3339 with the zone's UTC offset.
    pub expires: String,
    /// Expiry formatted for humans, e.g. `Sun, 01 Jun 2025 11:59:59 PM PDT`.
    pub expires_str: String,
    /// Marker image path or URL.
    pub icon: String,
}
