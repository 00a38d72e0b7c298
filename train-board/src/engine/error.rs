//! Query engine error types.

use crate::digitraffic::FeedError;
use crate::domain::StationCode;

/// A station selection the engine refuses.
///
/// A rejected selection never reaches the network and leaves the current
/// selection untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// Code not in the station directory (or directory not loaded yet)
    #[error("unknown station: {0}")]
    UnknownStation(StationCode),

    /// Destination equals the reference station
    #[error("destination must differ from departure station {0}")]
    SameStation(StationCode),

    /// Operation needs a reference station and none is selected
    #[error("no departure station selected")]
    NoReference,
}

/// Errors from a search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The stations were rejected before any request was made
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// The live-train request failed; the previous result stays published
    #[error("failed to fetch trains for {station}: {source}")]
    Feed {
        station: StationCode,
        #[source]
        source: FeedError,
    },
}
