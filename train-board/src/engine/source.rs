//! Sources of live-train data for the engine.

use std::future::Future;

use crate::digitraffic::{FeedError, LiveTrainClient, LiveTrainDto, MockFeed, QueryWindow};
use crate::domain::StationCode;

/// Trait for fetching the live trains serving a station.
///
/// This abstraction allows for different implementations (live API, mock
/// data, test doubles).
pub trait TrainSource: Send + Sync {
    /// Fetch every train serving `station` within `window`.
    fn live_trains(
        &self,
        station: &StationCode,
        window: &QueryWindow,
    ) -> impl Future<Output = Result<Vec<LiveTrainDto>, FeedError>> + Send;
}

impl TrainSource for LiveTrainClient {
    async fn live_trains(
        &self,
        station: &StationCode,
        window: &QueryWindow,
    ) -> Result<Vec<LiveTrainDto>, FeedError> {
        LiveTrainClient::live_trains(self, station, window).await
    }
}

impl TrainSource for MockFeed {
    async fn live_trains(
        &self,
        station: &StationCode,
        _window: &QueryWindow,
    ) -> Result<Vec<LiveTrainDto>, FeedError> {
        MockFeed::live_trains(self, station).await
    }
}
