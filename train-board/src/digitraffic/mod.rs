//! Finnish rail traffic (digitraffic) live-train client.
//!
//! This module provides an HTTP client for the `live-trains` endpoint,
//! which returns every train serving a station in a time window together
//! with its full timetable and realtime data.
//!
//! Key characteristics of the feed:
//! - Each train carries all of its timetable rows, not just the queried station
//! - Intermediate stations have separate ARRIVAL and DEPARTURE rows
//! - Rows where the train passes without stopping are included, flagged
//!   with `trainStopping: false`
//! - Times are ISO 8601 instants in UTC

mod client;
mod convert;
mod error;
mod mock;
mod types;

pub use client::{DEFAULT_BASE_URL, FeedConfig, LiveTrainClient, QueryWindow};
pub use convert::{ConversionError, convert_live_trains, convert_row, convert_train};
pub use error::FeedError;
pub use mock::MockFeed;
pub use types::{LiveTrainDto, TimeTableRowDto, parse_live_trains};
