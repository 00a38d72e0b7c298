//! Live-train feed response DTOs.
//!
//! These types map directly to the JSON returned by the `live-trains`
//! endpoint. Every field is optional and read leniently: an absent field or
//! one of the wrong type becomes `None` (or an empty list), so a malformed
//! field degrades one train rather than failing the whole response.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// One train in the `live-trains` response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LiveTrainDto {
    /// Train number, unique per departure date.
    #[serde(deserialize_with = "lenient")]
    pub train_number: Option<u32>,

    /// Departure date of the train from its origin (YYYY-MM-DD).
    #[serde(deserialize_with = "lenient")]
    pub departure_date: Option<String>,

    /// Operator short code, e.g. "vr".
    #[serde(deserialize_with = "lenient")]
    pub operator_short_code: Option<String>,

    /// Train type, e.g. "HL" (commuter) or "IC".
    #[serde(deserialize_with = "lenient")]
    pub train_type: Option<String>,

    /// Train category, e.g. "Commuter" or "Long-distance".
    #[serde(deserialize_with = "lenient")]
    pub train_category: Option<String>,

    /// Commuter line letter, e.g. "I". Empty or absent for non-commuter trains.
    #[serde(rename = "commuterLineID", deserialize_with = "lenient")]
    pub commuter_line_id: Option<String>,

    /// Whether the train is currently running.
    #[serde(deserialize_with = "lenient")]
    pub running_currently: Option<bool>,

    /// Whether the whole train is cancelled.
    #[serde(deserialize_with = "lenient")]
    pub cancelled: Option<bool>,

    /// Change counter maintained by the feed.
    #[serde(deserialize_with = "lenient")]
    pub version: Option<u64>,

    /// Timetable rows in running order.
    #[serde(deserialize_with = "lenient_rows")]
    pub time_table_rows: Vec<TimeTableRowDto>,
}

/// One stop event in a train's timetable.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeTableRowDto {
    /// Station short code, e.g. "HKI".
    #[serde(deserialize_with = "lenient")]
    pub station_short_code: Option<String>,

    /// Numeric UIC code of the station.
    #[serde(rename = "stationUICCode", deserialize_with = "lenient")]
    pub station_uic_code: Option<u32>,

    /// "ARRIVAL" or "DEPARTURE".
    #[serde(rename = "type", deserialize_with = "lenient")]
    pub row_type: Option<String>,

    /// Whether the train halts at this station.
    #[serde(deserialize_with = "lenient")]
    pub train_stopping: Option<bool>,

    /// Whether the stop is open to passengers.
    #[serde(deserialize_with = "lenient")]
    pub commercial_stop: Option<bool>,

    /// Platform/track as shown to passengers.
    #[serde(deserialize_with = "lenient")]
    pub commercial_track: Option<String>,

    /// Whether this single stop is cancelled.
    #[serde(deserialize_with = "lenient")]
    pub cancelled: Option<bool>,

    /// Scheduled time (ISO 8601).
    #[serde(deserialize_with = "lenient")]
    pub scheduled_time: Option<String>,

    /// Live estimate (ISO 8601), before the event happens.
    #[serde(deserialize_with = "lenient")]
    pub live_estimate_time: Option<String>,

    /// Recorded time (ISO 8601), after the event happens.
    #[serde(deserialize_with = "lenient")]
    pub actual_time: Option<String>,

    /// Feed-computed difference in minutes.
    #[serde(deserialize_with = "lenient")]
    pub difference_in_minutes: Option<i64>,
}

/// Parse a `live-trains` response body.
///
/// Only a body that is not a JSON array is an error. An element that is not
/// an object is logged and skipped.
pub fn parse_live_trains(body: &str) -> Result<Vec<LiveTrainDto>, serde_json::Error> {
    let records: Vec<Value> = serde_json::from_str(body)?;

    Ok(records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value::<LiveTrainDto>(record) {
            Ok(train) => Some(train),
            Err(e) => {
                warn!(index, error = %e, "skipping malformed train record");
                None
            }
        })
        .collect())
}

/// Read a field, treating a value of the wrong type as absent.
fn lenient<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: DeserializeOwned,
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }

    match serde_json::from_value(value) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            warn!(error = %e, "ignoring malformed field");
            Ok(None)
        }
    }
}

/// Read the timetable, skipping rows that are not objects.
fn lenient_rows<'de, D>(deserializer: D) -> Result<Vec<TimeTableRowDto>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows: Option<Vec<Value>> = lenient(deserializer)?;

    Ok(rows
        .unwrap_or_default()
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<TimeTableRowDto>(row) {
            Ok(row) => Some(row),
            Err(e) => {
                warn!(error = %e, "skipping malformed timetable row");
                None
            }
        })
        .collect())
}
