//! Timestamp parsing and delay handling.
//!
//! The live-train feed sends timestamps as ISO 8601 strings in UTC, e.g.
//! `2024-03-15T10:00:00.000Z`. Times are kept as `DateTime<Utc>` throughout
//! and only converted to local clock time for display.

use std::fmt;

use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};

/// Error returned when parsing an invalid timestamp.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid timestamp: {input}")]
pub struct TimeError {
    input: String,
}

/// Parse a feed timestamp.
///
/// Accepts RFC 3339 (with offset or `Z`). A timestamp without any offset is
/// taken to be UTC.
///
/// # Examples
///
/// ```
/// use train_board::domain::parse_timestamp;
///
/// let t = parse_timestamp("2024-03-15T10:00:00.000Z").unwrap();
/// assert_eq!(t.to_rfc3339(), "2024-03-15T10:00:00+00:00");
///
/// assert!(parse_timestamp("10:00").is_err());
/// ```
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, TimeError> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| TimeError {
            input: s.to_string(),
        })
}

/// Format an instant as local `HH:MM:SS`.
pub fn format_clock(t: DateTime<Utc>) -> String {
    format_clock_in(t, &Local)
}

/// Format an instant as `HH:MM:SS` in the given zone.
pub fn format_clock_in<Tz: TimeZone>(t: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    t.with_timezone(tz).format("%H:%M:%S").to_string()
}

/// Difference between the effective and the scheduled time of a stop.
///
/// Negative when the train is early.
///
/// ```
/// use chrono::Duration;
/// use train_board::domain::Delay;
///
/// assert_eq!(Delay::from(Duration::minutes(7)).to_string(), "+7 min");
/// assert_eq!(Delay::from(Duration::seconds(-90)).to_string(), "-1 min");
/// assert_eq!(Delay::from(Duration::seconds(20)).to_string(), "on time");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Delay(Duration);

impl Delay {
    /// Returns the underlying duration.
    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Whole minutes, truncated toward zero.
    pub fn whole_minutes(&self) -> i64 {
        self.0.num_minutes()
    }

    /// True if the train runs at least a full minute late.
    pub fn is_late(&self) -> bool {
        self.whole_minutes() > 0
    }
}

impl From<Duration> for Delay {
    fn from(value: Duration) -> Self {
        Delay(value)
    }
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.whole_minutes() {
            0 => f.write_str("on time"),
            m if m > 0 => write!(f, "+{m} min"),
            m => write!(f, "{m} min"),
        }
    }
}
