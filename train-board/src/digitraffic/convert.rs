//! Conversion from feed DTOs to domain types.
//!
//! A malformed row is skipped and a malformed train keeps its remaining
//! rows. Trains are never dropped: a missing train-level field only leaves
//! the matching fact unknown.

use tracing::warn;

use crate::domain::{RowType, StationCode, TimetableRow, Train, parse_timestamp};

use super::types::{LiveTrainDto, TimeTableRowDto};

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// Failed to parse a station code
    #[error("invalid station code: {0}")]
    InvalidStation(String),

    /// Failed to parse a timestamp
    #[error("invalid time: {0}")]
    InvalidTime(String),

    /// Unknown row type
    #[error("invalid row type: {0}")]
    InvalidRowType(String),

    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Convert a `live-trains` response into train views for `reference`.
///
/// One view per record, in response order.
pub fn convert_live_trains(trains: &[LiveTrainDto], reference: &StationCode) -> Vec<Train> {
    trains
        .iter()
        .map(|dto| convert_train(dto, reference))
        .collect()
}

/// Convert one train record into a view for `reference`.
pub fn convert_train(dto: &LiveTrainDto, reference: &StationCode) -> Train {
    let number = dto.train_number;
    if number.is_none() {
        warn!(station = %reference, "train record without trainNumber");
    }

    let rows = dto
        .time_table_rows
        .iter()
        .filter_map(|row| match convert_row(row) {
            Ok(row) => Some(row),
            Err(e) => {
                warn!(train = ?number, error = %e, "skipping timetable row");
                None
            }
        });

    let commuter_line = dto
        .commuter_line_id
        .as_ref()
        .filter(|line| !line.is_empty())
        .cloned();

    Train::new(
        number,
        commuter_line,
        dto.cancelled.unwrap_or(false),
        rows,
        reference.clone(),
    )
}

/// Convert a single timetable row.
pub fn convert_row(dto: &TimeTableRowDto) -> Result<TimetableRow, ConversionError> {
    let code = dto
        .station_short_code
        .as_ref()
        .ok_or(ConversionError::MissingField("stationShortCode"))?;
    let station =
        StationCode::parse(code).map_err(|_| ConversionError::InvalidStation(code.clone()))?;

    let row_type = dto
        .row_type
        .as_ref()
        .ok_or(ConversionError::MissingField("type"))?;
    let row_type =
        RowType::parse(row_type).ok_or_else(|| ConversionError::InvalidRowType(row_type.clone()))?;

    let scheduled = dto
        .scheduled_time
        .as_ref()
        .ok_or(ConversionError::MissingField("scheduledTime"))?;
    let scheduled =
        parse_timestamp(scheduled).map_err(|_| ConversionError::InvalidTime(scheduled.clone()))?;

    Ok(TimetableRow {
        station,
        row_type,
        scheduled,
        actual: parse_optional_time(dto.actual_time.as_deref()),
        live_estimate: parse_optional_time(dto.live_estimate_time.as_deref()),
        track: dto.commercial_track.clone().filter(|t| !t.is_empty()),
        // Absent means the feed does not promise a stop
        stops: dto.train_stopping.unwrap_or(false),
    })
}

/// Parse an optional realtime field; unparseable values count as unknown.
fn parse_optional_time(s: Option<&str>) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s?;
    match parse_timestamp(s) {
        Ok(t) => Some(t),
        Err(e) => {
            warn!(error = %e, "ignoring realtime value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn code(s: &str) -> StationCode {
        StationCode::parse(s).unwrap()
    }

    fn row_dto(station: &str, row_type: &str, scheduled: &str) -> TimeTableRowDto {
        TimeTableRowDto {
            station_short_code: Some(station.to_string()),
            row_type: Some(row_type.to_string()),
            train_stopping: Some(true),
            scheduled_time: Some(scheduled.to_string()),
            ..Default::default()
        }
    }

    fn train_dto(number: u32, rows: Vec<TimeTableRowDto>) -> LiveTrainDto {
        LiveTrainDto {
            train_number: Some(number),
            cancelled: Some(false),
            time_table_rows: rows,
            ..Default::default()
        }
    }

    #[test]
    fn convert_complete_row() {
        let mut dto = row_dto("HKI", "DEPARTURE", "2024-03-15T09:00:00.000Z");
        dto.live_estimate_time = Some("2024-03-15T09:07:00.000Z".into());
        dto.commercial_track = Some("4".into());

        let row = convert_row(&dto).unwrap();
        assert_eq!(row.station, code("HKI"));
        assert_eq!(row.row_type, RowType::Departure);
        assert_eq!(
            row.scheduled,
            Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap()
        );
        assert_eq!(row.delay().unwrap().whole_minutes(), 7);
        assert_eq!(row.track.as_deref(), Some("4"));
        assert!(row.stops);
    }

    #[test]
    fn row_without_scheduled_time_is_rejected() {
        let mut dto = row_dto("HKI", "DEPARTURE", "");
        dto.scheduled_time = None;
        assert_eq!(
            convert_row(&dto),
            Err(ConversionError::MissingField("scheduledTime"))
        );
    }

    #[test]
    fn row_with_unknown_type_is_rejected() {
        let dto = row_dto("HKI", "PASS", "2024-03-15T09:00:00.000Z");
        assert_eq!(
            convert_row(&dto),
            Err(ConversionError::InvalidRowType("PASS".into()))
        );
    }

    #[test]
    fn bad_realtime_value_degrades_to_unknown() {
        let mut dto = row_dto("HKI", "DEPARTURE", "2024-03-15T09:00:00.000Z");
        dto.actual_time = Some("soon".into());

        let row = convert_row(&dto).unwrap();
        assert_eq!(row.actual, None);
        assert_eq!(row.delay(), None);
    }

    #[test]
    fn missing_train_stopping_means_not_stopping() {
        let mut dto = row_dto("PSL", "DEPARTURE", "2024-03-15T09:05:00.000Z");
        dto.train_stopping = None;
        assert!(!convert_row(&dto).unwrap().stops);
    }

    #[test]
    fn empty_track_is_unknown() {
        let mut dto = row_dto("HKI", "DEPARTURE", "2024-03-15T09:00:00.000Z");
        dto.commercial_track = Some(String::new());
        assert_eq!(convert_row(&dto).unwrap().track, None);
    }

    #[test]
    fn convert_train_skips_bad_rows() {
        let dto = train_dto(
            8455,
            vec![
                row_dto("HKI", "DEPARTURE", "2024-03-15T10:00:00.000Z"),
                row_dto("psl", "ARRIVAL", "2024-03-15T10:05:00.000Z"),
                row_dto("MÄK", "ARRIVAL", "2024-03-15T10:12:00.000Z"),
            ],
        );

        let train = convert_train(&dto, &code("HKI"));
        assert_eq!(train.timetable().len(), 2);
        assert!(train.departure_row().is_some());
        assert!(train.calls_at(&code("MÄK")));
    }

    #[test]
    fn non_stopping_entry_never_matches() {
        let mut passing = row_dto("PSL", "DEPARTURE", "2024-03-15T10:06:00.000Z");
        passing.train_stopping = Some(false);
        let dto = train_dto(
            1,
            vec![
                row_dto("HKI", "DEPARTURE", "2024-03-15T10:00:00.000Z"),
                passing,
                row_dto("TPE", "ARRIVAL", "2024-03-15T11:40:00.000Z"),
            ],
        );

        let train = convert_train(&dto, &code("PSL"));
        assert!(train.departure_row().is_none());
    }

    #[test]
    fn empty_commuter_line_is_none() {
        let mut dto = train_dto(45, Vec::new());
        dto.commuter_line_id = Some(String::new());

        let train = convert_train(&dto, &code("HKI"));
        assert_eq!(train.commuter_line, None);
    }

    #[test]
    fn train_without_number_is_kept_and_sorted() {
        let mut nameless = train_dto(
            0,
            vec![
                row_dto("HKI", "DEPARTURE", "2024-03-15T09:30:00.000Z"),
                row_dto("PSL", "ARRIVAL", "2024-03-15T09:35:00.000Z"),
            ],
        );
        nameless.train_number = None;
        let numbered = train_dto(
            1,
            vec![
                row_dto("HKI", "DEPARTURE", "2024-03-15T10:00:00.000Z"),
                row_dto("PSL", "ARRIVAL", "2024-03-15T10:05:00.000Z"),
            ],
        );

        let trains = convert_live_trains(&[numbered, nameless], &code("HKI"));
        assert_eq!(trains.len(), 2);

        let board = crate::engine::sort_by_departure(trains);
        assert_eq!(board[0].number, None);
        assert_eq!(board[0].label(), "");
        assert_eq!(
            board[0].scheduled_time(),
            Some(Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap())
        );
        assert_eq!(board[1].number, Some(1));
    }
}
