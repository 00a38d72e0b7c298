//! Timetable row types.
//!
//! A `TimetableRow` is one stop event for one train: either the arrival at
//! or the departure from a station. A train calling at an intermediate
//! station therefore has two rows for it.

use chrono::{DateTime, Utc};

use super::{Delay, StationCode};

/// Whether a row describes an arrival or a departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowType {
    Arrival,
    Departure,
}

impl RowType {
    /// Parse the feed's `ARRIVAL` / `DEPARTURE` strings.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ARRIVAL" => Some(RowType::Arrival),
            "DEPARTURE" => Some(RowType::Departure),
            _ => None,
        }
    }
}

/// One stop event for one train.
///
/// # Time Semantics
///
/// - `scheduled` is always present
/// - `actual` is set once the event has happened
/// - `live_estimate` is the feed's forecast before that
///
/// The effective time prefers `actual` over `live_estimate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimetableRow {
    /// Station short code
    pub station: StationCode,
    /// Arrival or departure
    pub row_type: RowType,
    /// Scheduled time
    pub scheduled: DateTime<Utc>,
    /// Recorded time, once the event has happened
    pub actual: Option<DateTime<Utc>>,
    /// Live forecast
    pub live_estimate: Option<DateTime<Utc>>,
    /// Commercial track (platform), if published
    pub track: Option<String>,
    /// Whether the train halts here
    pub stops: bool,
}

impl TimetableRow {
    /// Creates a stopping row with only a scheduled time.
    pub fn new(station: StationCode, row_type: RowType, scheduled: DateTime<Utc>) -> Self {
        Self {
            station,
            row_type,
            scheduled,
            actual: None,
            live_estimate: None,
            track: None,
            stops: true,
        }
    }

    /// Returns the actual time if recorded, else the live estimate.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use train_board::domain::{RowType, StationCode, TimetableRow};
    ///
    /// let at = |h, m| Utc.with_ymd_and_hms(2024, 3, 15, h, m, 0).unwrap();
    /// let mut row = TimetableRow::new(StationCode::parse("HKI").unwrap(), RowType::Departure, at(9, 0));
    /// assert_eq!(row.effective_time(), None);
    ///
    /// row.live_estimate = Some(at(9, 7));
    /// assert_eq!(row.effective_time(), Some(at(9, 7)));
    ///
    /// row.actual = Some(at(9, 5));
    /// assert_eq!(row.effective_time(), Some(at(9, 5)));
    /// ```
    pub fn effective_time(&self) -> Option<DateTime<Utc>> {
        self.actual.or(self.live_estimate)
    }

    /// Returns the effective time minus the scheduled time, if known.
    pub fn delay(&self) -> Option<Delay> {
        self.effective_time()
            .map(|t| Delay::from(t.signed_duration_since(self.scheduled)))
    }

    /// Returns true if this row is the departure of a stopping train from `station`.
    pub fn is_departure_from(&self, station: &StationCode) -> bool {
        self.stops && self.row_type == RowType::Departure && &self.station == station
    }

    /// Returns true if this row is an arrival at `station`.
    pub fn is_arrival_at(&self, station: &StationCode) -> bool {
        self.row_type == RowType::Arrival && &self.station == station
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, h, m, 0).unwrap()
    }

    fn code(s: &str) -> StationCode {
        StationCode::parse(s).unwrap()
    }

    #[test]
    fn row_type_parse() {
        assert_eq!(RowType::parse("ARRIVAL"), Some(RowType::Arrival));
        assert_eq!(RowType::parse("DEPARTURE"), Some(RowType::Departure));
        assert_eq!(RowType::parse("departure"), None);
        assert_eq!(RowType::parse(""), None);
    }

    #[test]
    fn estimate_only_gives_delay() {
        let mut row = TimetableRow::new(code("HKI"), RowType::Departure, at(9, 0));
        row.live_estimate = Some(at(9, 7));

        assert_eq!(row.effective_time(), Some(at(9, 7)));
        assert_eq!(row.delay(), Some(Delay::from(Duration::minutes(7))));
    }

    #[test]
    fn actual_wins_over_estimate() {
        let mut row = TimetableRow::new(code("HKI"), RowType::Departure, at(9, 0));
        row.live_estimate = Some(at(9, 7));
        row.actual = Some(at(9, 3));

        assert_eq!(row.delay(), Some(Delay::from(Duration::minutes(3))));
    }

    #[test]
    fn early_train_has_negative_delay() {
        let mut row = TimetableRow::new(code("PSL"), RowType::Arrival, at(9, 5));
        row.actual = Some(at(9, 4));

        assert_eq!(row.delay().unwrap().whole_minutes(), -1);
    }

    #[test]
    fn no_realtime_means_unknown_delay() {
        let row = TimetableRow::new(code("HKI"), RowType::Departure, at(9, 0));
        assert_eq!(row.effective_time(), None);
        assert_eq!(row.delay(), None);
    }

    #[test]
    fn non_stopping_row_never_matches_departure() {
        let mut row = TimetableRow::new(code("HKI"), RowType::Departure, at(9, 0));
        assert!(row.is_departure_from(&code("HKI")));

        row.stops = false;
        assert!(!row.is_departure_from(&code("HKI")));
    }

    #[test]
    fn departure_match_checks_station_and_type() {
        let row = TimetableRow::new(code("HKI"), RowType::Arrival, at(9, 0));
        assert!(!row.is_departure_from(&code("HKI")));
        assert!(row.is_arrival_at(&code("HKI")));
        assert!(!row.is_arrival_at(&code("PSL")));
    }
}
