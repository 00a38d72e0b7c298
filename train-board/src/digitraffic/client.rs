//! Live-train HTTP client.
//!
//! Queries the `live-trains` endpoint for the trains serving one station
//! within a time window around now.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::domain::StationCode;

use super::error::FeedError;
use super::types::{LiveTrainDto, parse_live_trains};

/// Default base URL for the rail traffic API.
pub const DEFAULT_BASE_URL: &str = "https://rata.digitraffic.fi/api/v1";

/// Header the API uses to identify calling applications.
const USER_HEADER: &str = "digitraffic-user";

/// Default value for the user header.
const DEFAULT_USER: &str = "train-board";

/// Time window of a live-train query, in minutes relative to now.
///
/// The defaults list trains departing within the next two hours, and
/// keep them listed until fifteen minutes after their scheduled
/// departure. Arrivals are not queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub minutes_before_departure: u32,
    pub minutes_after_departure: u32,
    pub minutes_before_arrival: u32,
    pub minutes_after_arrival: u32,
}

impl QueryWindow {
    /// Returns the window as query parameters.
    pub fn to_query(&self) -> [(&'static str, String); 4] {
        [
            (
                "minutes_before_departure",
                self.minutes_before_departure.to_string(),
            ),
            (
                "minutes_before_arrival",
                self.minutes_before_arrival.to_string(),
            ),
            (
                "minutes_after_departure",
                self.minutes_after_departure.to_string(),
            ),
            (
                "minutes_after_arrival",
                self.minutes_after_arrival.to_string(),
            ),
        ]
    }
}

impl Default for QueryWindow {
    fn default() -> Self {
        Self {
            minutes_before_departure: 120,
            minutes_after_departure: 15,
            minutes_before_arrival: 0,
            minutes_after_arrival: 0,
        }
    }
}

/// Configuration for the live-train client.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Value sent in the user identification header
    pub user: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl FeedConfig {
    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the user identification header value.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user: DEFAULT_USER.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Live-train API client.
#[derive(Debug, Clone)]
pub struct LiveTrainClient {
    http: reqwest::Client,
    base_url: String,
}

impl LiveTrainClient {
    /// Create a new client with the given configuration.
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let mut headers = HeaderMap::new();

        let user = HeaderValue::from_str(&config.user)
            .map_err(|_| FeedError::NotConfigured(format!("invalid user header: {}", config.user)))?;
        headers.insert(HeaderName::from_static(USER_HEADER), user);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the live trains serving `station` within `window`.
    pub async fn live_trains(
        &self,
        station: &StationCode,
        window: &QueryWindow,
    ) -> Result<Vec<LiveTrainDto>, FeedError> {
        let url = format!("{}/live-trains", self.base_url);

        debug!(%station, "requesting live trains");

        let response = self
            .http
            .get(&url)
            .query(&[("station", station.as_str())])
            .query(&window.to_query())
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FeedError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        parse_live_trains(&body).map_err(|e| FeedError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }
}
