//! Station directory and its loader.
//!
//! `StationDirectory` is the code → station lookup the engine consumes. It
//! starts empty and is populated by a `DirectoryLoader`, which prefers the
//! disk cache, falls back to the API, and falls back again to a stale
//! cache if the API is down.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::domain::{Station, StationCode};

use super::cache::StationCache;
use super::client::{StationClient, StationDto};
use super::error::StationError;

/// Shared station lookup.
///
/// Cloning is cheap; clones share the same data.
#[derive(Clone, Default)]
pub struct StationDirectory {
    inner: Arc<RwLock<Option<HashMap<StationCode, Station>>>>,
}

impl StationDirectory {
    /// Create an empty, not yet loaded directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loaded directory from stations.
    pub fn from_stations(stations: impl IntoIterator<Item = Station>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(build_map(stations)))),
        }
    }

    /// Replace the directory contents.
    pub async fn populate(&self, stations: impl IntoIterator<Item = Station>) -> usize {
        let map = build_map(stations);
        let count = map.len();

        let mut guard = self.inner.write().await;
        *guard = Some(map);

        count
    }

    /// Display name for `code`, or the code itself if unknown.
    ///
    /// Never fails: before the directory has loaded every code resolves to
    /// itself.
    pub async fn lookup(&self, code: &StationCode) -> String {
        let guard = self.inner.read().await;
        guard
            .as_ref()
            .and_then(|map| map.get(code))
            .map(|station| station.display_name().to_string())
            .unwrap_or_else(|| code.to_string())
    }

    /// Find a station by code.
    pub async fn find(&self, code: &StationCode) -> Option<Station> {
        let guard = self.inner.read().await;
        guard.as_ref().and_then(|map| map.get(code)).cloned()
    }

    /// Returns true if `code` is a known station.
    pub async fn contains(&self, code: &StationCode) -> bool {
        let guard = self.inner.read().await;
        guard.as_ref().is_some_and(|map| map.contains_key(code))
    }

    /// Returns true once the directory has been populated.
    pub async fn is_loaded(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// Number of known stations.
    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.as_ref().map_or(0, HashMap::len)
    }

    /// Returns true if no stations are known.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// All stations, sorted by display name.
    pub async fn stations(&self) -> Vec<Station> {
        let guard = self.inner.read().await;
        let mut stations: Vec<Station> = guard
            .as_ref()
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default();
        stations.sort_by(|a, b| a.display_name().cmp(b.display_name()));
        stations
    }
}

#[cfg(test)]
impl StationDirectory {
    /// Hold the directory exclusively, stalling every lookup.
    pub(crate) async fn write_lock(
        &self,
    ) -> tokio::sync::RwLockWriteGuard<'_, Option<HashMap<StationCode, Station>>> {
        self.inner.write().await
    }
}

fn build_map(stations: impl IntoIterator<Item = Station>) -> HashMap<StationCode, Station> {
    stations.into_iter().map(|s| (s.code.clone(), s)).collect()
}

/// Where the loaded directory came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorySource {
    Cache,
    Network,
    StaleCache,
}

/// Populates a `StationDirectory` from the disk cache or the API.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    client: StationClient,
    cache: StationCache,
}

impl DirectoryLoader {
    pub fn new(client: StationClient, cache: StationCache) -> Self {
        Self { client, cache }
    }

    /// Load from a fresh cache, else fetch and write the cache.
    ///
    /// If the fetch fails, a stale cache is used instead. Only when neither
    /// is available is an error returned, and the directory is left as it was.
    pub async fn load_or_fetch(
        &self,
        directory: &StationDirectory,
    ) -> Result<DirectorySource, StationError> {
        if let Some(cached) = self.cache.load() {
            let count = directory.populate(passenger_stations(&cached)).await;
            info!(count, path = %self.cache.path().display(), "loaded stations from cache");
            return Ok(DirectorySource::Cache);
        }

        match self.fetch(directory).await {
            Ok(()) => Ok(DirectorySource::Network),
            Err(e) => {
                let Some(stale) = self.cache.load_stale() else {
                    return Err(e);
                };
                warn!(error = %e, "station fetch failed, using stale cache");
                directory.populate(passenger_stations(&stale)).await;
                Ok(DirectorySource::StaleCache)
            }
        }
    }

    /// Like [`load_or_fetch`](Self::load_or_fetch), but retries every
    /// `retry` until a load succeeds.
    pub async fn load_with_retry(
        &self,
        directory: &StationDirectory,
        retry: Duration,
    ) -> DirectorySource {
        loop {
            match self.load_or_fetch(directory).await {
                Ok(source) => return source,
                Err(e) => {
                    warn!(error = %e, retry_secs = retry.as_secs(), "station directory unavailable");
                    tokio::time::sleep(retry).await;
                }
            }
        }
    }

    /// Fetch from the API, bypassing the cache.
    ///
    /// On failure the existing directory contents are kept.
    pub async fn refresh(&self, directory: &StationDirectory) -> Result<usize, StationError> {
        self.fetch(directory).await?;
        Ok(directory.len().await)
    }

    async fn fetch(&self, directory: &StationDirectory) -> Result<(), StationError> {
        let all = self.client.fetch_all().await?;
        let kept: Vec<StationDto> = all.into_iter().filter(|s| s.passenger_traffic).collect();

        if let Err(e) = self.cache.save(&kept) {
            warn!(error = %e, "failed to write station cache");
        }

        let count = directory.populate(passenger_stations(&kept)).await;
        info!(count, "fetched stations");
        Ok(())
    }
}

/// Passenger stations with valid codes.
fn passenger_stations(dtos: &[StationDto]) -> Vec<Station> {
    dtos.iter()
        .filter(|s| s.passenger_traffic)
        .filter_map(StationDto::to_station)
        .collect()
}
