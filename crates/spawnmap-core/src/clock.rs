//! Zoned clock and placement of dateless end times on the calendar.
//!
//! Announcements only carry a time of day. The extractor places that time on
//! the current calendar date in the configured zone and then applies drift
//! correction: an expiry landing almost exactly one day ahead is taken to be
//! a same-day time that was pushed onto tomorrow, and is pulled back by one
//! day.
//!
//! # Design Principles
//!
//! - `now` is always passed in. Nothing below [`Clock::now`] reads the
//!   system time, so every rule is testable at a fixed instant.
//! - All date arithmetic is checked; an unrepresentable result is an error,
//!   never a panic.

use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::config::TimeConfig;

/// Errors that can occur while building a clock or placing an end time.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The configured zone is not an IANA time zone name.
    #[error("unknown time zone {name:?}: {reason}")]
    UnknownZone {
        /// The rejected zone name.
        name: String,
        /// Parser message.
        reason: String,
    },

    /// The pinned instant is not RFC 3339.
    #[error("invalid pinned time {value:?}: {source}")]
    InvalidPinnedTime {
        /// The rejected value.
        value: String,
        /// The underlying parse error.
        source: chrono::ParseError,
    },

    /// The wall time does not exist in the zone and could not be shifted
    /// past the gap.
    #[error("local time {naive} does not exist in {zone}")]
    NonexistentLocalTime {
        /// The wall-clock time that was requested.
        naive: NaiveDateTime,
        /// The zone it was requested in.
        zone: Tz,
    },

    /// Date arithmetic left the representable range.
    #[error("date arithmetic overflow")]
    Overflow,
}

/// Source of the current instant in the service's zone.
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    /// Wall-clock time, viewed in the given zone.
    System(Tz),
    /// A pinned instant, used to replay a captured batch as of its capture
    /// time.
    Fixed(DateTime<Tz>),
}

impl Clock {
    /// Build the clock described by the `time` config section.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::UnknownZone`] for a bad zone name and
    /// [`ClockError::InvalidPinnedTime`] for a malformed `now`.
    pub fn from_config(config: &TimeConfig) -> Result<Self, ClockError> {
        let zone = parse_zone(&config.zone)?;
        match &config.now {
            None => Ok(Self::System(zone)),
            Some(value) => {
                let pinned = DateTime::parse_from_rfc3339(value).map_err(|source| {
                    ClockError::InvalidPinnedTime {
                        value: value.clone(),
                        source,
                    }
                })?;
                Ok(Self::Fixed(pinned.with_timezone(&zone)))
            }
        }
    }

    /// The current instant.
    pub fn now(&self) -> DateTime<Tz> {
        match self {
            Self::System(zone) => Utc::now().with_timezone(zone),
            Self::Fixed(instant) => *instant,
        }
    }

    /// The zone every timestamp is expressed in.
    pub fn zone(&self) -> Tz {
        match self {
            Self::System(zone) => *zone,
            Self::Fixed(instant) => instant.timezone(),
        }
    }
}

/// Parse an IANA zone name such as `America/Los_Angeles`.
///
/// # Errors
///
/// Returns [`ClockError::UnknownZone`] if the name is not in the database.
pub fn parse_zone(name: &str) -> Result<Tz, ClockError> {
    name.parse::<Tz>().map_err(|e| ClockError::UnknownZone {
        name: name.to_owned(),
        reason: e.to_string(),
    })
}

/// Lower bound of the drift window (exclusive): 23h59m.
const fn drift_floor() -> TimeDelta {
    TimeDelta::seconds(86_340)
}

/// Upper bound of the drift window (exclusive): 24h01m.
const fn drift_ceiling() -> TimeDelta {
    TimeDelta::seconds(86_460)
}

/// Place a dateless end time on today's date in `now`'s zone, then apply
/// drift correction.
///
/// An ambiguous wall time (the repeated hour when clocks fall back) resolves
/// to the later, standard-time instant. A wall time inside the
/// spring-forward gap is read with the offset in force before the gap, which
/// moves it forward by the size of the gap.
///
/// # Errors
///
/// Returns [`ClockError::NonexistentLocalTime`] if the wall time cannot be
/// placed even after shifting past the gap.
pub fn resolve_end_time(time: NaiveTime, now: &DateTime<Tz>) -> Result<DateTime<Tz>, ClockError> {
    let zone = now.timezone();
    let naive = now.date_naive().and_time(time);

    let expires = match zone.from_local_datetime(&naive).latest() {
        Some(instant) => instant,
        None => localize_in_gap(zone, naive)?,
    };

    Ok(correct_drift(expires, now))
}

/// Read a wall time inside a DST gap with the pre-gap offset.
fn localize_in_gap(zone: Tz, naive: NaiveDateTime) -> Result<DateTime<Tz>, ClockError> {
    let hour = TimeDelta::hours(1);
    let before_gap = naive.checked_sub_signed(hour).ok_or(ClockError::Overflow)?;
    zone.from_local_datetime(&before_gap)
        .latest()
        .and_then(|instant| instant.checked_add_signed(hour))
        .ok_or(ClockError::NonexistentLocalTime { naive, zone })
}

/// Pull an expiry back by one day if it sits just about a day ahead of
/// `now`.
///
/// The window is `23h59m < expires - now < 24h01m`, exclusive at both ends.
/// Outside the window the expiry is returned unchanged.
pub fn correct_drift(expires: DateTime<Tz>, now: &DateTime<Tz>) -> DateTime<Tz> {
    let ahead = expires.signed_duration_since(*now);
    if drift_floor() < ahead
        && ahead < drift_ceiling()
        && let Some(corrected) = expires.checked_sub_signed(TimeDelta::days(1))
    {
        tracing::debug!(
            raw = %expires.to_rfc3339(),
            corrected = %corrected.to_rfc3339(),
            "pulled future-drifted end time back one day"
        );
        return corrected;
    }
    expires
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono_tz::America::Los_Angeles;

    use super::*;

    fn la(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Tz> {
        Los_Angeles.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn end_time_lands_on_todays_date() {
        let now = la(2025, 6, 1, 12, 0, 0);
        let expires = resolve_end_time(hms(23, 59, 59), &now).unwrap();
        assert_eq!(expires, la(2025, 6, 1, 23, 59, 59));
        assert_eq!(expires.to_rfc3339(), "2025-06-01T23:59:59-07:00");
    }

    #[test]
    fn earlier_time_today_is_in_the_past() {
        let now = la(2025, 6, 1, 12, 0, 0);
        let expires = resolve_end_time(hms(11, 0, 0), &now).unwrap();
        assert!(expires < now);
    }

    #[test]
    fn drift_inside_window_subtracts_one_day() {
        let now = la(2025, 6, 1, 0, 0, 1);
        let raw = now + TimeDelta::seconds(86_430);
        assert_eq!(correct_drift(raw, &now), raw - TimeDelta::days(1));
    }

    #[test]
    fn drift_outside_window_is_untouched() {
        let now = la(2025, 6, 1, 0, 0, 1);
        let raw = now + TimeDelta::hours(22);
        assert_eq!(correct_drift(raw, &now), raw);
    }

    #[test]
    fn drift_window_bounds_are_exclusive() {
        let now = la(2025, 6, 1, 0, 0, 1);

        let at_floor = now + drift_floor();
        assert_eq!(correct_drift(at_floor, &now), at_floor);

        let at_ceiling = now + drift_ceiling();
        assert_eq!(correct_drift(at_ceiling, &now), at_ceiling);

        let just_inside = now + drift_floor() + TimeDelta::microseconds(1);
        assert_eq!(
            correct_drift(just_inside, &now),
            just_inside - TimeDelta::days(1)
        );
    }

    #[test]
    fn end_time_just_before_midnight_seen_after_midnight_rolls_back() {
        // 00:00:30 now, "11:59:59 PM" is 23h59m29s ahead: inside the window.
        let now = la(2025, 6, 2, 0, 0, 30);
        let expires = resolve_end_time(hms(23, 59, 59), &now).unwrap();
        assert_eq!(expires, la(2025, 6, 1, 23, 59, 59));
    }

    #[test]
    fn ambiguous_fall_back_time_picks_standard_offset() {
        let now = la(2025, 11, 2, 0, 30, 0);
        let expires = resolve_end_time(hms(1, 30, 0), &now).unwrap();
        assert_eq!(expires.to_rfc3339(), "2025-11-02T01:30:00-08:00");
    }

    #[test]
    fn gap_time_moves_forward_past_spring_forward() {
        let now = la(2025, 3, 9, 0, 30, 0);
        let expires = resolve_end_time(hms(2, 30, 0), &now).unwrap();
        assert_eq!(expires.to_rfc3339(), "2025-03-09T03:30:00-07:00");
    }

    #[test]
    fn clock_from_config() {
        let config = TimeConfig {
            zone: "America/Los_Angeles".to_owned(),
            now: Some("2025-06-01T19:00:00Z".to_owned()),
        };
        let clock = Clock::from_config(&config).unwrap();
        assert_eq!(clock.now(), la(2025, 6, 1, 12, 0, 0));
        assert_eq!(clock.zone(), Los_Angeles);

        let system = Clock::from_config(&TimeConfig {
            zone: "Europe/Berlin".to_owned(),
            now: None,
        })
        .unwrap();
        assert_eq!(system.zone(), chrono_tz::Europe::Berlin);
    }

    #[test]
    fn bad_zone_and_bad_pin_are_rejected() {
        assert!(matches!(
            parse_zone("Mars/Olympus_Mons"),
            Err(ClockError::UnknownZone { .. })
        ));
        let config = TimeConfig {
            zone: "America/Los_Angeles".to_owned(),
            now: Some("yesterday".to_owned()),
        };
        assert!(matches!(
            Clock::from_config(&config),
            Err(ClockError::InvalidPinnedTime { .. })
        ));
    }
}
