//! EFA HTTP client.
//!
//! Provides async methods for querying the VRR EFA stop finder and
//! departure monitor. Handles timeouts, concurrency limiting, and
//! conversion to domain types.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;

use crate::domain::{Departure, Stop};

use super::convert::{normalize_departures, normalize_stop_finder};
use super::error::EfaError;
use super::types::{DepartureResponse, StopFinderResponse};

/// Default base URL for the VRR EFA API.
pub const DEFAULT_BASE_URL: &str = "https://efa.vrr.de/vrr/";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Default connect and read timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Queries shorter than this return nothing without a request.
pub const MIN_QUERY_LEN: usize = 3;

const STOP_FINDER_ENDPOINT: &str = "XSLT_STOPFINDER_REQUEST";
const DEPARTURE_MONITOR_ENDPOINT: &str = "XSLT_DM_REQUEST";
const COORD_FORMAT: &str = "WGS84[DD.ddddd]";

/// Configuration for the EFA client.
#[derive(Debug, Clone)]
pub struct EfaConfig {
    /// Base URL for the API (defaults to VRR production)
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Read timeout in seconds
    pub timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for EfaConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EfaConfig {
    /// Create a config pointing at the production API.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set read timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set connect timeout.
    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }
}

/// VRR EFA API client.
///
/// Uses a semaphore to limit concurrent requests so a board with many
/// stops does not flood the upstream server.
#[derive(Debug, Clone)]
pub struct EfaClient {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl EfaClient {
    /// Create a new EFA client with the given configuration.
    pub fn new(config: EfaConfig) -> Result<Self, EfaError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// Search stops by free text.
    ///
    /// Queries shorter than [`MIN_QUERY_LEN`] characters return an empty
    /// list without a request. Failures are logged and also yield an empty
    /// list; search is best-effort.
    pub async fn search_stops(&self, query: &str) -> Vec<Stop> {
        if query.chars().count() < MIN_QUERY_LEN {
            return Vec::new();
        }

        match self
            .fetch_json::<StopFinderResponse>(STOP_FINDER_ENDPOINT, &stop_finder_params(query))
            .await
        {
            Ok(response) => {
                let stops = normalize_stop_finder(response);
                tracing::debug!(query, count = stops.len(), "stop search complete");
                stops
            }
            Err(e) => {
                tracing::warn!(query, error = %e, "stop search failed");
                Vec::new()
            }
        }
    }

    /// Get the current departures for a stop.
    pub async fn get_departures(&self, stop_id: &str) -> Result<Vec<Departure>, EfaError> {
        self.get_departures_at(stop_id, Local::now().naive_local())
            .await
    }

    /// Get departures for a stop as seen at `now` (local wall-clock time).
    ///
    /// `now` both selects the departure monitor's date/time window and
    /// anchors the minutes-until computation.
    pub async fn get_departures_at(
        &self,
        stop_id: &str,
        now: NaiveDateTime,
    ) -> Result<Vec<Departure>, EfaError> {
        let response: DepartureResponse = self
            .fetch_json(DEPARTURE_MONITOR_ENDPOINT, &departure_params(stop_id, now))
            .await?;

        let departures = normalize_departures(response, now.time());
        tracing::debug!(stop_id, count = departures.len(), "departures fetched");
        Ok(departures)
    }

    /// GET an endpoint and decode its JSON body.
    ///
    /// The body is decoded regardless of the advertised content type,
    /// which EFA reports inconsistently.
    async fn fetch_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, EfaError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| EfaError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let url = format!("{}/{}", self.base_url, endpoint);

        let response = self.http.get(&url).query(params).send().await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EfaError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| EfaError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }
}

/// Query parameters for a free-text stop search.
fn stop_finder_params(query: &str) -> Vec<(&'static str, String)> {
    vec![
        ("outputFormat", "JSON".to_string()),
        ("type_sf", "any".to_string()),
        ("name_sf", query.to_string()),
        ("coordOutputFormat", COORD_FORMAT.to_string()),
        ("locationServerActive", "1".to_string()),
        ("odvSugMacro", "true".to_string()),
    ]
}

/// Query parameters for a realtime departure monitor request.
fn departure_params(stop_id: &str, now: NaiveDateTime) -> Vec<(&'static str, String)> {
    vec![
        ("outputFormat", "JSON".to_string()),
        ("language", "de".to_string()),
        ("stateless", "1".to_string()),
        ("coordOutputFormat", COORD_FORMAT.to_string()),
        ("type_dm", "any".to_string()),
        ("name_dm", stop_id.to_string()),
        ("itdDateDay", now.day().to_string()),
        ("itdDateMonth", now.month().to_string()),
        ("itdDateYear", now.year().to_string()),
        ("itdTimeHour", now.hour().to_string()),
        ("itdTimeMinute", now.minute().to_string()),
        ("mode", "direct".to_string()),
        ("ptOptionsActive", "1".to_string()),
        ("deleteAssignedStops_dm", "1".to_string()),
        ("useProxFootSearch", "0".to_string()),
        ("useRealtime", "1".to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn param<'a>(params: &'a [(&str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn config_builder() {
        let config = EfaConfig::new()
            .with_base_url("http://localhost:8080")
            .with_max_concurrent(10)
            .with_timeout(60)
            .with_connect_timeout(5);

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.max_concurrent, 10);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.connect_timeout_secs, 5);
    }

    #[test]
    fn config_defaults() {
        let config = EfaConfig::default();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_concurrent, DEFAULT_MAX_CONCURRENT);
        assert_eq!(config.timeout_secs, 15);
        assert_eq!(config.connect_timeout_secs, 15);
    }

    #[test]
    fn client_creation_trims_base_url() {
        let client = EfaClient::new(EfaConfig::new()).unwrap();
        assert_eq!(client.base_url, "https://efa.vrr.de/vrr");
    }

    #[test]
    fn stop_finder_request_params() {
        let params = stop_finder_params("Essen Hbf");

        assert_eq!(param(&params, "outputFormat"), Some("JSON"));
        assert_eq!(param(&params, "type_sf"), Some("any"));
        assert_eq!(param(&params, "name_sf"), Some("Essen Hbf"));
        assert_eq!(param(&params, "coordOutputFormat"), Some("WGS84[DD.ddddd]"));
        assert_eq!(param(&params, "locationServerActive"), Some("1"));
        assert_eq!(param(&params, "odvSugMacro"), Some("true"));
    }

    #[test]
    fn departure_request_params() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(7, 9, 30)
            .unwrap();
        let params = departure_params("20009289", now);

        assert_eq!(param(&params, "name_dm"), Some("20009289"));
        assert_eq!(param(&params, "type_dm"), Some("any"));
        assert_eq!(param(&params, "itdDateDay"), Some("5"));
        assert_eq!(param(&params, "itdDateMonth"), Some("3"));
        assert_eq!(param(&params, "itdDateYear"), Some("2024"));
        assert_eq!(param(&params, "itdTimeHour"), Some("7"));
        assert_eq!(param(&params, "itdTimeMinute"), Some("9"));
        assert_eq!(param(&params, "mode"), Some("direct"));
        assert_eq!(param(&params, "useRealtime"), Some("1"));
        assert_eq!(param(&params, "stateless"), Some("1"));
        assert_eq!(param(&params, "language"), Some("de"));
        assert_eq!(param(&params, "deleteAssignedStops_dm"), Some("1"));
        assert_eq!(param(&params, "useProxFootSearch"), Some("0"));
        assert_eq!(param(&params, "ptOptionsActive"), Some("1"));
    }

    #[tokio::test]
    async fn short_query_returns_empty_without_request() {
        // Unroutable base URL: any request would fail loudly in the log,
        // but a short query must not even try.
        let client = EfaClient::new(EfaConfig::new().with_base_url("http://127.0.0.1:1")).unwrap();

        assert!(client.search_stops("").await.is_empty());
        assert!(client.search_stops("Es").await.is_empty());
        assert!(client.search_stops("Öß").await.is_empty());
    }
}
