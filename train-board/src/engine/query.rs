//! Filtering and ordering of train views.
//!
//! These are pure functions over `Train` views; the engine applies them
//! to each fresh response before publishing.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::domain::{StationCode, Train};

/// One published board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    /// Sequence number of the request that produced this result.
    pub seq: u64,
    /// Station the board is for.
    pub reference: StationCode,
    /// Destination filter, if any.
    pub destination: Option<StationCode>,
    /// Trains ordered by scheduled departure from `reference`.
    pub trains: Vec<Train>,
    /// When the response was received.
    pub received_at: DateTime<Utc>,
}

impl QueryResult {
    /// Index of the first train still to depart after `now`.
    ///
    /// Uses the effective departure time when known, else the scheduled
    /// one. Trains with no departure at the reference station are skipped.
    pub fn next_departure(&self, now: DateTime<Utc>) -> Option<usize> {
        self.trains.iter().position(|train| {
            train
                .effective_time()
                .or(train.scheduled_time())
                .is_some_and(|t| t > now)
        })
    }

    pub fn len(&self) -> usize {
        self.trains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trains.is_empty()
    }
}

/// Keep only trains that arrive at `destination`.
///
/// With no destination every train is kept.
pub fn filter_by_destination(trains: Vec<Train>, destination: Option<&StationCode>) -> Vec<Train> {
    match destination {
        Some(dest) => trains.into_iter().filter(|t| t.calls_at(dest)).collect(),
        None => trains,
    }
}

/// Order trains by scheduled departure from their reference station.
///
/// The sort is stable. Trains without a departure row sort last, keeping
/// their relative order.
pub fn sort_by_departure(mut trains: Vec<Train>) -> Vec<Train> {
    trains.sort_by(compare_departure);
    trains
}

fn compare_departure(a: &Train, b: &Train) -> Ordering {
    match (a.scheduled_time(), b.scheduled_time()) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Filter and order trains for a board.
pub fn arrange(trains: Vec<Train>, destination: Option<&StationCode>) -> Vec<Train> {
    sort_by_departure(filter_by_destination(trains, destination))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{RowType, TimetableRow};
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    const STATIONS: [&str; 4] = ["HKI", "PSL", "TKL", "MÄK"];

    fn code(s: &str) -> StationCode {
        StationCode::parse(s).unwrap()
    }

    /// A train described by (departure minute at HKI if any, stations it arrives at).
    fn arb_train() -> impl Strategy<Value = (Option<i64>, Vec<usize>)> {
        (
            proptest::option::of(0i64..180),
            proptest::collection::vec(1usize..STATIONS.len(), 0..4),
        )
    }

    fn build(number: u32, shape: &(Option<i64>, Vec<usize>)) -> Train {
        let base = Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap();
        let mut rows = Vec::new();
        if let Some(minute) = shape.0 {
            rows.push(TimetableRow::new(
                code("HKI"),
                RowType::Departure,
                base + Duration::minutes(minute),
            ));
        }
        for (i, &idx) in shape.1.iter().enumerate() {
            rows.push(TimetableRow::new(
                code(STATIONS[idx]),
                RowType::Arrival,
                base + Duration::minutes(200 + i as i64),
            ));
        }
        Train::new(number, None, false, rows, code("HKI"))
    }

    fn build_all(shapes: &[(Option<i64>, Vec<usize>)]) -> Vec<Train> {
        shapes
            .iter()
            .enumerate()
            .map(|(i, s)| build(i as u32, s))
            .collect()
    }

    proptest! {
        /// Filtering with a destination never adds trains
        #[test]
        fn filter_is_subset(shapes in proptest::collection::vec(arb_train(), 0..20), dest in 1usize..STATIONS.len()) {
            let all = arrange(build_all(&shapes), None);
            let filtered = arrange(build_all(&shapes), Some(&code(STATIONS[dest])));

            for train in &filtered {
                prop_assert!(all.contains(train));
            }
        }

        /// Every kept departure row is a departure from the reference station
        #[test]
        fn departure_rows_match_reference(shapes in proptest::collection::vec(arb_train(), 0..20)) {
            for train in arrange(build_all(&shapes), None) {
                if let Some(row) = train.departure_row() {
                    prop_assert_eq!(&row.station, train.reference());
                    prop_assert_eq!(row.row_type, RowType::Departure);
                }
            }
        }

        /// Known times ascend, unknown times trail in input order
        #[test]
        fn sort_is_ordered_and_stable(shapes in proptest::collection::vec(arb_train(), 0..20)) {
            let sorted = sort_by_departure(build_all(&shapes));

            let first_unknown = sorted
                .iter()
                .position(|t| t.scheduled_time().is_none())
                .unwrap_or(sorted.len());

            prop_assert!(sorted[first_unknown..].iter().all(|t| t.scheduled_time().is_none()));

            for pair in sorted[..first_unknown].windows(2) {
                let (a, b) = (pair[0].scheduled_time(), pair[1].scheduled_time());
                prop_assert!(a <= b);
                if a == b {
                    prop_assert!(pair[0].number < pair[1].number);
                }
            }

            for pair in sorted[first_unknown..].windows(2) {
                prop_assert!(pair[0].number < pair[1].number);
            }
        }

        /// Sorting identical input twice gives identical output
        #[test]
        fn sort_is_deterministic(shapes in proptest::collection::vec(arb_train(), 0..20)) {
            let once = sort_by_departure(build_all(&shapes));
            let twice = sort_by_departure(build_all(&shapes));
            prop_assert_eq!(once, twice);
        }
    }
}
