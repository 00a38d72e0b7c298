//! Station metadata API client.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::digitraffic::DEFAULT_BASE_URL;
use crate::domain::{Station, StationCode};

use super::error::StationError;

/// Minimal DTO for station metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationDto {
    pub station_short_code: String,
    pub station_name: String,
    #[serde(rename = "stationUICCode", default)]
    pub station_uic_code: Option<u32>,
    #[serde(default)]
    pub passenger_traffic: bool,
}

impl StationDto {
    /// Convert to a domain station, if the code is valid.
    pub fn to_station(&self) -> Option<Station> {
        let code = StationCode::parse(&self.station_short_code).ok()?;
        Some(Station {
            code,
            name: self.station_name.clone(),
            uic_code: self.station_uic_code,
            passenger_traffic: self.passenger_traffic,
        })
    }
}

/// Configuration for the station metadata client.
#[derive(Debug, Clone)]
pub struct StationClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Value sent in the user identification header
    pub user: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl StationClientConfig {
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
}

impl Default for StationClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user: "train-board".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Client for the station metadata endpoint.
#[derive(Debug, Clone)]
pub struct StationClient {
    http: reqwest::Client,
    base_url: String,
}

impl StationClient {
    /// Create a new station metadata client.
    pub fn new(config: StationClientConfig) -> Result<Self, StationError> {
        let mut headers = HeaderMap::new();

        let user = HeaderValue::from_str(&config.user).map_err(|_| {
            StationError::NotConfigured(format!("invalid user header: {}", config.user))
        })?;
        headers.insert(HeaderName::from_static("digitraffic-user"), user);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch all stations, including ones without passenger traffic.
    pub async fn fetch_all(&self) -> Result<Vec<StationDto>, StationError> {
        let url = format!("{}/metadata/stations", self.base_url);

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StationError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| StationError::Json {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = StationClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn config_with_base_url() {
        let config = StationClientConfig::default().with_base_url("http://localhost:8080");
        assert_eq!(config.base_url, "http://localhost:8080");
    }

    #[test]
    fn invalid_user_header_is_rejected() {
        let config = StationClientConfig::default().with_user("bad\nvalue");
        assert!(matches!(
            StationClient::new(config),
            Err(StationError::NotConfigured(_))
        ));
    }

    #[test]
    fn deserialize_station_metadata() {
        let json = r#"[{
            "passengerTraffic": true,
            "type": "STATION",
            "stationName": "Helsinki asema",
            "stationShortCode": "HKI",
            "stationUICCode": 1,
            "countryCode": "FI",
            "longitude": 24.941249,
            "latitude": 60.172097
        }]"#;

        let stations: Vec<StationDto> = serde_json::from_str(json).unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].station_short_code, "HKI");
        assert_eq!(stations[0].station_uic_code, Some(1));
        assert!(stations[0].passenger_traffic);
    }

    #[test]
    fn to_station_rejects_invalid_code() {
        let dto = StationDto {
            station_short_code: "hki".into(),
            station_name: "Helsinki asema".into(),
            station_uic_code: None,
            passenger_traffic: true,
        };
        assert!(dto.to_station().is_none());

        let dto = StationDto {
            station_short_code: "HKI".into(),
            ..dto
        };
        let station = dto.to_station().unwrap();
        assert_eq!(station.display_name(), "Helsinki");
    }
}
