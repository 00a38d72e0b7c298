//! Live departure board engine.
//!
//! Given a departure station and an optional destination, the engine
//! fetches the live trains at the departure station, builds a view of each
//! train anchored on its departure from that station, drops trains that do
//! not reach the destination, orders the rest by scheduled departure and
//! publishes the board. A background task repeats the search periodically.

mod config;
mod error;
mod query;
mod search;
mod source;


pub use config::{DEFAULT_REFRESH_INTERVAL, EngineConfig};
pub use error::{SearchError, SelectionError};
pub use query::{QueryResult, arrange, filter_by_destination, sort_by_departure};
pub use search::{QueryEngine, SearchOutcome, Selection};
pub use source::TrainSource;
