//! Message parsing into typed spawn sightings.
//!
//! A channel bot announces spawns as embeds shaped roughly like:
//!
//! ```text
//! title:       100% Mewtwo
//! description: ... https://maps.example/?q=37.1,-121.9 ...
//!              End: 11:59:59 PM (29m 10s)
//! ```
//!
//! [`Extractor::parse`] runs a short chain of steps over the first embed
//! (title, coordinates, end time), stopping at the first failing step and
//! reporting which one failed. [`Extractor::extract`] wraps the chain,
//! resolves the icon, and logs rejections instead of returning them.

use std::num::ParseFloatError;

use chrono::{DateTime, NaiveTime};
use chrono_tz::Tz;
use regex::Regex;
use spawnmap_types::{Coordinates, Embed, IconRef, RawMessage, SpawnEvent, Species};
use tracing::debug;

use crate::clock::{self, ClockError};
use crate::icons::IconResolver;

/// Title of an announcement worth mapping.
const TITLE_PATTERN: &str = r"^100% ([A-Za-z\-]+)";

/// Coordinate forms, in priority order.
const COORDINATE_PATTERNS: [&str; 2] = [
    r"coordinate=([-+]?\d+\.\d+),([-+]?\d+\.\d+)",
    r"q=([-+]?\d+\.\d+),([-+]?\d+\.\d+)",
];

/// The end-time marker. The capture is trimmed before parsing.
const END_TIME_PATTERN: &str = r"End: ([0-9:APM ]+)";

/// 12-hour clock format of the end time.
const END_TIME_FORMAT: &str = "%I:%M:%S %p";

/// Why a message did not yield a spawn.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The message carries no embed.
    #[error("message has no embed")]
    MissingEmbed,

    /// The first embed's title is not a `100% <Name>` announcement.
    #[error("title is not a 100% announcement: {title:?}")]
    TitleMismatch {
        /// The title that was checked.
        title: String,
    },

    /// No coordinate form matched the description.
    #[error("description has no coordinate pair")]
    MissingCoordinates,

    /// A coordinate component matched the pattern but did not parse.
    #[error("invalid coordinate {value:?}: {source}")]
    BadCoordinate {
        /// The captured text.
        value: String,
        /// The underlying parse error.
        source: ParseFloatError,
    },

    /// The description has no `End: <time>` marker.
    #[error("description has no end time")]
    MissingEndTime,

    /// The end-time marker did not hold a 12-hour `HH:MM:SS AM/PM` time.
    #[error("invalid end time {value:?}: {source}")]
    BadEndTime {
        /// The trimmed captured text.
        value: String,
        /// The underlying parse error.
        source: chrono::ParseError,
    },

    /// The end time could not be placed on the calendar.
    #[error("cannot place end time: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// A parsed announcement, before icon resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Sighting {
    /// Normalized species.
    pub species: Species,
    /// Announced location.
    pub location: Coordinates,
    /// Absolute, drift-corrected expiry.
    pub expires_at: DateTime<Tz>,
}

impl Sighting {
    /// Attach an icon, producing the canonical event.
    pub fn into_event(self, icon: IconRef) -> SpawnEvent {
        SpawnEvent {
            species: self.species,
            location: self.location,
            expires_at: self.expires_at,
            icon,
        }
    }
}

/// Compiled announcement patterns.
#[derive(Debug, Clone)]
pub struct Extractor {
    title: Regex,
    coordinates: [Regex; 2],
    end_time: Regex,
}

impl Extractor {
    /// Compile the announcement patterns.
    ///
    /// # Errors
    ///
    /// Returns the regex error if a pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        let [primary, fallback] = COORDINATE_PATTERNS;
        Ok(Self {
            title: Regex::new(TITLE_PATTERN)?,
            coordinates: [Regex::new(primary)?, Regex::new(fallback)?],
            end_time: Regex::new(END_TIME_PATTERN)?,
        })
    }

    /// Extract a spawn from one message, or nothing.
    ///
    /// Never fails: a rejected message is logged at `debug` with the reason
    /// and yields `None`. On success the icon is resolved through `icons`.
    pub async fn extract<R: IconResolver>(
        &self,
        message: &RawMessage,
        now: &DateTime<Tz>,
        icons: &R,
    ) -> Option<SpawnEvent> {
        let sighting = self.sighting(message, now)?;
        let icon = icons.resolve(&sighting.species).await;
        Some(sighting.into_event(icon))
    }

    /// Parse one message without resolving an icon.
    ///
    /// A rejected message is logged at `debug` with the reason and yields
    /// `None`.
    pub fn sighting(&self, message: &RawMessage, now: &DateTime<Tz>) -> Option<Sighting> {
        self.parse(message, now)
            .inspect_err(|e| {
                debug!(
                    error = %e,
                    message_id = message.id.as_deref().unwrap_or("-"),
                    "message skipped"
                );
            })
            .ok()
    }

    /// Parse the first embed of `message` into a [`Sighting`].
    pub fn parse(&self, message: &RawMessage, now: &DateTime<Tz>) -> Result<Sighting, ExtractError> {
        let embed = message.first_embed().ok_or(ExtractError::MissingEmbed)?;
        let species = self.species(embed)?;
        let location = self.location(embed.description())?;
        let time = self.end_time(embed.description())?;
        let expires_at = clock::resolve_end_time(time, now)?;

        Ok(Sighting {
            species,
            location,
            expires_at,
        })
    }

    fn species(&self, embed: &Embed) -> Result<Species, ExtractError> {
        let title = embed.title();
        self.title
            .captures(title)
            .and_then(|caps| caps.get(1))
            .and_then(|name| Species::parse(name.as_str()))
            .ok_or_else(|| ExtractError::TitleMismatch {
                title: title.to_owned(),
            })
    }

    fn location(&self, description: &str) -> Result<Coordinates, ExtractError> {
        let (lat, lon) = self
            .coordinates
            .iter()
            .find_map(|pattern| {
                let caps = pattern.captures(description)?;
                Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
            })
            .ok_or(ExtractError::MissingCoordinates)?;

        Ok(Coordinates::new(parse_degrees(lat)?, parse_degrees(lon)?))
    }

    fn end_time(&self, description: &str) -> Result<NaiveTime, ExtractError> {
        let raw = self
            .end_time
            .captures(description)
            .and_then(|caps| caps.get(1))
            .ok_or(ExtractError::MissingEndTime)?
            .as_str()
            .trim();

        NaiveTime::parse_from_str(raw, END_TIME_FORMAT).map_err(|source| ExtractError::BadEndTime {
            value: raw.to_owned(),
            source,
        })
    }
}

fn parse_degrees(value: &str) -> Result<f64, ExtractError> {
    value.parse().map_err(|source| ExtractError::BadCoordinate {
        value: value.to_owned(),
        source,
    })
}
