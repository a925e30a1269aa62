//! The spawn entity and the value types it is built from.
//!
//! A [`SpawnEvent`] is created once by the extractor and never updated in
//! place. Identity for deduplication is the exact coordinate pair, see
//! [`Coordinates::key`].

use core::fmt;

use chrono::DateTime;
use chrono_tz::Tz;

/// Normalized species identifier.
///
/// Always non-empty, lower-case, and restricted to ASCII letters and
/// hyphens. The restriction also makes the value safe to use as a file
/// stem in the sprite cache.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Species(String);

impl Species {
    /// Normalize a captured name into a species key.
    ///
    /// Returns `None` if the name is empty or contains anything other than
    /// ASCII letters and hyphens.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
            return None;
        }
        Some(Self(raw.to_ascii_lowercase()))
    }

    /// The lower-case key used for lookups.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Title-cased name for display.
    ///
    /// Every letter that follows a non-letter is capitalised, so
    /// `ho-oh` becomes `Ho-Oh`.
    pub fn display_name(&self) -> String {
        let mut out = String::with_capacity(self.0.len());
        let mut at_word_start = true;
        for c in self.0.chars() {
            if at_word_start {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
            at_word_start = !c.is_ascii_alphabetic();
        }
        out
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl Coordinates {
    /// Create a coordinate pair.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Exact-match identity of this location.
    ///
    /// Two spawns are duplicates iff their keys are equal. The key is the
    /// bit pattern of each component with negative zero folded into
    /// positive zero, so it agrees with `==` on every parsed value.
    pub const fn key(&self) -> (u64, u64) {
        (canonical_bits(self.lat), canonical_bits(self.lon))
    }
}

/// `-0.0 + 0.0` is `+0.0`; every other value is unchanged.
const fn canonical_bits(value: f64) -> u64 {
    (value + 0.0).to_bits()
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

/// Reference to a displayable image: a local path or an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IconRef(String);

impl IconRef {
    /// Wrap a path or URL.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The path or URL as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IconRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for IconRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A reported, time-boxed spawn at a fixed location.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnEvent {
    /// Normalized species.
    pub species: Species,
    /// Where the spawn is.
    pub location: Coordinates,
    /// Absolute expiry in the service's configured zone.
    pub expires_at: DateTime<Tz>,
    /// Image shown on the map marker.
    pub icon: IconRef,
}

impl SpawnEvent {
    /// Whether the spawn is still live at `now`.
    ///
    /// Strict: a spawn expiring exactly at `now` is already gone.
    pub fn is_live(&self, now: &DateTime<Tz>) -> bool {
        self.expires_at > *now
    }

    /// Title-cased species name.
    pub fn display_name(&self) -> String {
        self.species.display_name()
    }
}
