//! Domain types for the departure board.
//!
//! This module contains validated representations of live train data.
//! Types enforce their invariants at construction time, so code that
//! receives them can trust their validity.

mod row;
mod station;
mod time;
mod train;

pub use row::{RowType, TimetableRow};
pub use station::{InvalidStationCode, Station, StationCode, display_name};
pub use time::{Delay, TimeError, format_clock, format_clock_in, parse_timestamp};
pub use train::Train;
