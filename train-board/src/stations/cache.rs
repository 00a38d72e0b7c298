//! Disk cache for the station directory.
//!
//! The directory changes rarely, so it is fetched once and kept on disk.
//! A stale cache is still useful when the API cannot be reached.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use super::client::StationDto;
use super::error::StationError;

/// Default cache TTL: 24 hours.
const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// On-disk layout.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    /// Unix timestamp when the file was written.
    written_at_secs: u64,
    stations: Vec<StationDto>,
}

/// Configuration for the station disk cache.
#[derive(Debug, Clone)]
pub struct StationCacheConfig {
    /// Path to the cache file.
    pub path: PathBuf,
    /// How long a written cache counts as fresh.
    pub ttl: Duration,
}

impl StationCacheConfig {
    /// Create a cache config with the given path and a 24 hour TTL.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: DEFAULT_TTL,
        }
    }

    /// Set a custom TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl Default for StationCacheConfig {
    fn default() -> Self {
        Self::new("stations_cache.json")
    }
}

/// Disk cache for station metadata.
#[derive(Debug, Clone)]
pub struct StationCache {
    config: StationCacheConfig,
}

impl StationCache {
    pub fn new(config: StationCacheConfig) -> Self {
        Self { config }
    }

    /// Load stations if the cache exists and is younger than the TTL.
    pub fn load(&self) -> Option<Vec<StationDto>> {
        let file = self.read()?;
        let age = now_secs()?.saturating_sub(file.written_at_secs);

        if age >= self.config.ttl.as_secs() {
            return None;
        }

        Some(file.stations)
    }

    /// Load stations regardless of age.
    pub fn load_stale(&self) -> Option<Vec<StationDto>> {
        self.read().map(|file| file.stations)
    }

    /// Write stations to the cache, creating parent directories as needed.
    pub fn save(&self, stations: &[StationDto]) -> Result<(), StationError> {
        let written_at_secs = now_secs().ok_or_else(|| StationError::Cache {
            message: "system time before unix epoch".to_string(),
        })?;

        let file = CacheFile {
            written_at_secs,
            stations: stations.to_vec(),
        };

        if let Some(parent) = self.config.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| StationError::Cache {
                message: format!("failed to create cache directory: {}", e),
            })?;
        }

        let json = serde_json::to_string(&file).map_err(|e| StationError::Cache {
            message: format!("failed to serialize cache: {}", e),
        })?;

        std::fs::write(&self.config.path, json).map_err(|e| StationError::Cache {
            message: format!("failed to write cache file: {}", e),
        })
    }

    /// Get the cache file path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    fn read(&self) -> Option<CacheFile> {
        let contents = std::fs::read_to_string(&self.config.path).ok()?;
        serde_json::from_str(&contents).ok()
    }
}

fn now_secs() -> Option<u64> {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn dto(code: &str, name: &str) -> StationDto {
        StationDto {
            station_short_code: code.to_string(),
            station_name: name.to_string(),
            station_uic_code: None,
            passenger_traffic: true,
        }
    }

    #[test]
    fn save_and_load_cache() {
        let dir = tempdir().unwrap();
        let cache = StationCache::new(StationCacheConfig::new(dir.path().join("stations.json")));

        cache
            .save(&[dto("HKI", "Helsinki asema"), dto("MÄK", "Mäkkylä")])
            .unwrap();

        let loaded = cache.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].station_short_code, "HKI");
        assert_eq!(loaded[1].station_short_code, "MÄK");
    }

    #[test]
    fn expired_cache_is_only_available_as_stale() {
        let dir = tempdir().unwrap();
        let config =
            StationCacheConfig::new(dir.path().join("stations.json")).with_ttl(Duration::ZERO);
        let cache = StationCache::new(config);

        cache.save(&[dto("HKI", "Helsinki asema")]).unwrap();

        assert!(cache.load().is_none());
        assert_eq!(cache.load_stale().unwrap().len(), 1);
    }

    #[test]
    fn missing_cache_returns_none() {
        let cache = StationCache::new(StationCacheConfig::new("/nonexistent/path/stations.json"));

        assert!(cache.load().is_none());
        assert!(cache.load_stale().is_none());
    }

    #[test]
    fn corrupt_cache_returns_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stations.json");
        std::fs::write(&path, "{not json").unwrap();

        let cache = StationCache::new(StationCacheConfig::new(&path));
        assert!(cache.load_stale().is_none());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("dir").join("stations.json");
        let cache = StationCache::new(StationCacheConfig::new(&path));

        cache.save(&[dto("HKI", "Helsinki asema")]).unwrap();
        assert!(path.exists());
    }
}
