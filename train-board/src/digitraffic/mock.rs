//! Mock live-train feed for running without network access.
//!
//! Loads recorded `live-trains` responses from JSON files and serves them
//! as if they were live API responses.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::StationCode;

use super::error::FeedError;
use super::types::{LiveTrainDto, parse_live_trains};

/// Mock feed that serves data from JSON files.
#[derive(Clone)]
pub struct MockFeed {
    /// Pre-loaded responses, keyed by station.
    responses: Arc<RwLock<HashMap<StationCode, Vec<LiveTrainDto>>>>,
}

impl MockFeed {
    /// Create a mock feed by loading JSON files from a directory.
    ///
    /// Expects files named `{CODE}.json` (e.g. `HKI.json`), each holding a
    /// `live-trains` response array.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, FeedError> {
        let responses = load_dir(data_dir.as_ref())?;

        Ok(Self {
            responses: Arc::new(RwLock::new(responses)),
        })
    }

    /// Create a mock feed from in-memory responses.
    pub fn from_responses(responses: HashMap<StationCode, Vec<LiveTrainDto>>) -> Self {
        Self {
            responses: Arc::new(RwLock::new(responses)),
        }
    }

    /// Get the recorded trains for a station.
    pub async fn live_trains(&self, station: &StationCode) -> Result<Vec<LiveTrainDto>, FeedError> {
        let responses = self.responses.read().await;

        responses.get(station).cloned().ok_or_else(|| FeedError::Api {
            status: 404,
            message: format!(
                "No mock data for station {}. Available: {:?}",
                station,
                responses.keys().map(|c| c.as_str()).collect::<Vec<_>>()
            ),
        })
    }

    /// List stations with recorded data.
    pub async fn available_stations(&self) -> Vec<StationCode> {
        let responses = self.responses.read().await;
        responses.keys().cloned().collect()
    }

    /// Reload mock data from disk.
    pub async fn reload(&self, data_dir: impl AsRef<Path>) -> Result<(), FeedError> {
        let fresh = load_dir(data_dir.as_ref())?;
        let mut responses = self.responses.write().await;
        *responses = fresh;
        Ok(())
    }
}

fn load_dir(data_dir: &Path) -> Result<HashMap<StationCode, Vec<LiveTrainDto>>, FeedError> {
    let mut responses = HashMap::new();

    let entries = std::fs::read_dir(data_dir).map_err(|e| {
        FeedError::NotConfigured(format!("failed to read mock data directory: {}", e))
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| {
            FeedError::NotConfigured(format!("failed to read directory entry: {}", e))
        })?;

        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }

        // "HKI.json" -> "HKI"
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| FeedError::NotConfigured(format!("invalid filename: {:?}", path)))?;

        let code = StationCode::parse(stem).map_err(|_| {
            FeedError::NotConfigured(format!("invalid station code in filename: {}", stem))
        })?;

        let json = std::fs::read_to_string(&path)
            .map_err(|e| FeedError::NotConfigured(format!("failed to read {:?}: {}", path, e)))?;

        let trains = parse_live_trains(&json).map_err(|e| FeedError::Json {
            message: format!("{:?}: {}", path, e),
            body: None,
        })?;

        responses.insert(code, trains);
    }

    if responses.is_empty() {
        return Err(FeedError::NotConfigured(format!(
            "no mock files found in {:?}",
            data_dir
        )));
    }

    Ok(responses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const HKI: &str = r#"[
        {
            "trainNumber": 8455,
            "commuterLineID": "I",
            "cancelled": false,
            "timeTableRows": [
                {"stationShortCode": "HKI", "type": "DEPARTURE", "trainStopping": true,
                 "scheduledTime": "2024-03-15T10:00:00.000Z"}
            ]
        }
    ]"#;

    fn code(s: &str) -> StationCode {
        StationCode::parse(s).unwrap()
    }

    #[tokio::test]
    async fn load_mock_data() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("HKI.json"), HKI).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let feed = MockFeed::new(dir.path()).unwrap();
        assert_eq!(feed.available_stations().await, vec![code("HKI")]);

        let trains = feed.live_trains(&code("HKI")).await.unwrap();
        assert_eq!(trains.len(), 1);
        assert_eq!(trains[0].train_number, Some(8455));
    }

    #[tokio::test]
    async fn unknown_station_returns_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("HKI.json"), HKI).unwrap();

        let feed = MockFeed::new(dir.path()).unwrap();
        let result = feed.live_trains(&code("TPE")).await;

        assert!(matches!(result, Err(FeedError::Api { status: 404, .. })));
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(MockFeed::new(dir.path()).is_err());
    }

    #[test]
    fn invalid_filename_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("hki.json"), HKI).unwrap();
        assert!(MockFeed::new(dir.path()).is_err());
    }

    #[tokio::test]
    async fn reload_replaces_data() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("HKI.json"), HKI).unwrap();
        let feed = MockFeed::new(dir.path()).unwrap();

        std::fs::remove_file(dir.path().join("HKI.json")).unwrap();
        std::fs::write(dir.path().join("TPE.json"), "[]").unwrap();
        feed.reload(dir.path()).await.unwrap();

        assert_eq!(feed.available_stations().await, vec![code("TPE")]);
    }
}
