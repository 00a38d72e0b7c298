//! Live departure board.
//!
//! Shows the trains leaving a chosen station, optionally only those that
//! also reach a chosen destination, with scheduled and realtime times,
//! delays and tracks, refreshed periodically.

pub mod digitraffic;
pub mod domain;
pub mod engine;
pub mod stations;
