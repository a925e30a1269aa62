//! Live spawns to wire records.
//!
//! Pure transformation: the caller has already filtered by expiry, so the
//! clock is never consulted here.

use spawnmap_types::{SpawnEvent, SpawnRecord};

/// Human-readable expiry, e.g. `Sun, 01 Jun 2025 11:59:59 PM PDT`.
const DISPLAY_FORMAT: &str = "%a, %d %b %Y %I:%M:%S %p %Z";

/// One record per event, in the order given.
pub fn serialize(events: &[SpawnEvent]) -> Vec<SpawnRecord> {
    events.iter().map(to_record).collect()
}

/// Project a single event.
pub fn to_record(event: &SpawnEvent) -> SpawnRecord {
    SpawnRecord {
        name: event.display_name(),
        lat: event.location.lat,
        lon: event.location.lon,
        expires: event.expires_at.to_rfc3339(),
        expires_str: event.expires_at.format(DISPLAY_FORMAT).to_string(),
        icon: event.icon.as_str().to_owned(),
    }
}
