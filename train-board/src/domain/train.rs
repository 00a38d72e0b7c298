//! Train views built for one reference station.
//!
//! A `Train` wraps the timetable of one live train and knows which of its
//! rows is "the departure from the station the user is standing at". All
//! board facts (scheduled time, effective time, delay, track) are derived
//! from that row. If the train has no such row every fact is `None`; the
//! train is still listed.

use chrono::{DateTime, Utc};

use super::{Delay, StationCode, TimetableRow};

/// A live train as seen from a reference station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Train {
    /// Train number, e.g. 8455; `None` if the feed omitted it
    pub number: Option<u32>,
    /// Commuter line letter, e.g. "I"
    pub commuter_line: Option<String>,
    /// Whether the whole train is cancelled
    pub cancelled: bool,
    /// Stopping rows in feed order
    timetable: Vec<TimetableRow>,
    /// Station the view was built for
    reference: StationCode,
    /// Index of the departure row in `timetable`
    departure_idx: Option<usize>,
}

impl Train {
    /// Build a view of a train for `reference`.
    ///
    /// Rows where the train does not stop are dropped; the rest keep their
    /// order.
    pub fn new(
        number: impl Into<Option<u32>>,
        commuter_line: Option<String>,
        cancelled: bool,
        rows: impl IntoIterator<Item = TimetableRow>,
        reference: StationCode,
    ) -> Self {
        let timetable: Vec<TimetableRow> = rows.into_iter().filter(|r| r.stops).collect();
        let departure_idx = timetable
            .iter()
            .position(|r| r.is_departure_from(&reference));

        Self {
            number: number.into(),
            commuter_line,
            cancelled,
            timetable,
            reference,
            departure_idx,
        }
    }

    /// Returns the stopping rows in feed order.
    pub fn timetable(&self) -> &[TimetableRow] {
        &self.timetable
    }

    /// Returns the station this view was built for.
    pub fn reference(&self) -> &StationCode {
        &self.reference
    }

    /// Returns the first departure row at the reference station.
    pub fn departure_row(&self) -> Option<&TimetableRow> {
        self.departure_idx.map(|i| &self.timetable[i])
    }

    /// Returns the terminal row (last stop).
    pub fn destination_row(&self) -> Option<&TimetableRow> {
        self.timetable.last()
    }

    /// Returns true if the train arrives at `station`.
    pub fn calls_at(&self, station: &StationCode) -> bool {
        self.timetable.iter().any(|r| r.is_arrival_at(station))
    }

    /// Scheduled departure from the reference station.
    pub fn scheduled_time(&self) -> Option<DateTime<Utc>> {
        self.departure_row().map(|r| r.scheduled)
    }

    /// Actual or estimated departure from the reference station.
    pub fn effective_time(&self) -> Option<DateTime<Utc>> {
        self.departure_row().and_then(|r| r.effective_time())
    }

    /// Departure delay at the reference station.
    pub fn delay(&self) -> Option<Delay> {
        self.departure_row().and_then(|r| r.delay())
    }

    /// Departure track at the reference station.
    pub fn track(&self) -> Option<&str> {
        self.departure_row().and_then(|r| r.track.as_deref())
    }

    /// Short label for the board: commuter line letter if any, else the
    /// number, else empty.
    pub fn label(&self) -> String {
        match (&self.commuter_line, self.number) {
            (Some(line), _) if !line.is_empty() => line.clone(),
            (_, Some(number)) => number.to_string(),
            _ => String::new(),
        }
    }
}
