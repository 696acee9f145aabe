//! Time handling for archive timestamps and CF time coordinates.
//!
//! Fields store time coordinates as seconds since 1970-01-01T00:00:00 UTC.

use chrono::{DateTime, Duration, DurationRound, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// Timestamp format used by the archive catalogue, e.g. `20170328T1200`.
pub const CATALOGUE_TIME_FORMAT: &str = "%Y%m%dT%H%M";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("invalid timestamp: {0}")]
    InvalidFormat(String),

    #[error("unsupported CF time units: {0}")]
    UnsupportedUnits(String),
}

/// Parse a catalogue timestamp like `20170328T1200`.
pub fn parse_catalogue_time(s: &str) -> Result<NaiveDateTime, TimeParseError> {
    NaiveDateTime::parse_from_str(s.trim(), CATALOGUE_TIME_FORMAT)
        .map_err(|_| TimeParseError::InvalidFormat(s.to_string()))
}

/// Seconds since the Unix epoch for a naive UTC timestamp.
pub fn to_epoch_seconds(t: NaiveDateTime) -> f64 {
    let utc = t.and_utc();
    utc.timestamp() as f64 + utc.timestamp_subsec_nanos() as f64 * 1e-9
}

/// Convert an epoch-seconds coordinate value back to a timestamp.
///
/// Values are rounded to the nearest millisecond.
pub fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let millis = (seconds * 1000.0).round() as i64;
    Utc.timestamp_millis_opt(millis).single()
}

/// Time window of model-level pressure needed to cover `[start, end]`.
///
/// Pressure is only stored hourly, so both ends are rolled back to the hour
/// and then widened by one hour.
pub fn hourly_window(start: DateTime<Utc>, end: DateTime<Utc>) -> (NaiveDateTime, NaiveDateTime) {
    let hour = Duration::hours(1);
    let floor = |t: DateTime<Utc>| t.duration_trunc(hour).unwrap_or(t);
    (
        (floor(start) - hour).naive_utc(),
        (floor(end) + hour).naive_utc(),
    )
}

/// Parsed CF `"<unit> since <reference>"` time units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CfTimeUnits {
    /// Length of one unit in seconds.
    pub scale: f64,
    /// Reference time as epoch seconds.
    pub epoch_offset: f64,
}

impl CfTimeUnits {
    /// Parse units such as `hours since 1970-01-01 00:00:00`.
    pub fn parse(units: &str) -> Result<Self, TimeParseError> {
        let (unit, reference) = units
            .split_once(" since ")
            .ok_or_else(|| TimeParseError::UnsupportedUnits(units.to_string()))?;

        let scale = match unit.trim().to_lowercase().as_str() {
            "seconds" | "second" | "secs" | "s" => 1.0,
            "minutes" | "minute" | "mins" => 60.0,
            "hours" | "hour" | "hrs" | "h" => 3600.0,
            "days" | "day" | "d" => 86400.0,
            _ => return Err(TimeParseError::UnsupportedUnits(units.to_string())),
        };

        let reference = parse_reference_time(reference.trim())
            .ok_or_else(|| TimeParseError::UnsupportedUnits(units.to_string()))?;

        Ok(Self {
            scale,
            epoch_offset: to_epoch_seconds(reference),
        })
    }

    /// Convert a raw coordinate value to epoch seconds.
    pub fn to_epoch_seconds(&self, value: f64) -> f64 {
        self.epoch_offset + value * self.scale
    }
}

fn parse_reference_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim_end_matches('Z').trim_end_matches(" UTC");
    const FORMATS: [&str; 5] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
