//! Query engine configuration.

use std::time::Duration;

use crate::digitraffic::QueryWindow;

/// How often the board re-queries by default.
///
/// One second longer than the API's 120 second cache, so each refresh sees
/// new data.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(121);

/// Configuration for the query engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Time window sent with each live-train query.
    pub window: QueryWindow,

    /// Interval between scheduled refreshes.
    pub refresh_interval: Duration,
}

impl EngineConfig {
    /// Set the query window.
    pub fn with_window(mut self, window: QueryWindow) -> Self {
        self.window = window;
        self
    }

    /// Set the refresh interval.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: QueryWindow::default(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();

        assert_eq!(config.refresh_interval, Duration::from_secs(121));
        assert_eq!(config.window.minutes_before_departure, 120);
        assert_eq!(config.window.minutes_after_departure, 15);
        assert_eq!(config.window.minutes_before_arrival, 0);
        assert_eq!(config.window.minutes_after_arrival, 0);
    }

    #[test]
    fn custom_config() {
        let window = QueryWindow {
            minutes_before_departure: 60,
            ..QueryWindow::default()
        };
        let config = EngineConfig::default()
            .with_window(window)
            .with_refresh_interval(Duration::from_secs(30));

        assert_eq!(config.window.minutes_before_departure, 60);
        assert_eq!(config.refresh_interval, Duration::from_secs(30));
    }
}
