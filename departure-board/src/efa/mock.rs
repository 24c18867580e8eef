//! Mock EFA client for testing without API access.
//!
//! Serves canned EFA payloads through the real normalizer, so everything
//! downstream of the HTTP layer behaves exactly as it would live.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{Local, NaiveTime};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::{Departure, Stop};

use super::client::MIN_QUERY_LEN;
use super::convert::{normalize_departures, normalize_stop_finder};
use super::error::EfaError;
use super::source::TransitSource;
use super::types::{DepartureResponse, StopFinderResponse};

/// File stem under which [`MockEfaClient::from_dir`] looks for the stop
/// search payload.
pub const STOP_FINDER_FILE: &str = "stop_finder";

/// A failure the mock reports instead of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Timeout,
    Offline,
    Connect,
    /// Non-success HTTP status
    Status(u16),
    /// Body that is not JSON
    Malformed,
}

impl MockFailure {
    fn to_error(self) -> EfaError {
        match self {
            MockFailure::Timeout => EfaError::Timeout,
            MockFailure::Offline => EfaError::Offline("network is unreachable".into()),
            MockFailure::Connect => EfaError::Connect("connection refused".into()),
            MockFailure::Status(status) => EfaError::Api {
                status,
                message: "mock failure".into(),
            },
            MockFailure::Malformed => EfaError::Json {
                message: "expected value at line 1 column 1".into(),
                body: Some("<html>".into()),
            },
        }
    }
}

#[derive(Debug, Clone)]
enum MockResponse {
    Payload(Value),
    Failure(MockFailure),
}

/// Errors loading mock payloads from disk.
#[derive(Debug, thiserror::Error)]
pub enum MockLoadError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("no mock payload files found in {0:?}")]
    Empty(PathBuf),
}

/// Mock EFA client that serves raw EFA JSON from memory.
///
/// Departure payloads are keyed by stop id. Unknown stops answer with a
/// 404 API error. Cloning shares the underlying payloads and counters.
#[derive(Clone, Default)]
pub struct MockEfaClient {
    departures: Arc<RwLock<HashMap<String, MockResponse>>>,
    stop_finder: Arc<RwLock<Option<MockResponse>>>,
    clock: Option<NaiveTime>,
    latency: Arc<RwLock<Option<Duration>>>,
    departure_calls: Arc<AtomicUsize>,
    search_calls: Arc<AtomicUsize>,
}

impl MockEfaClient {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load payloads from a directory.
    ///
    /// Expects files named `{stop_id}.json` holding `XSLT_DM_REQUEST`
    /// responses, plus an optional `stop_finder.json`.
    pub fn from_dir(data_dir: impl AsRef<Path>) -> Result<Self, MockLoadError> {
        let data_dir = data_dir.as_ref();
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| MockLoadError::Io { path, source }
        };

        let mut departures = HashMap::new();
        let mut stop_finder = None;

        for entry in std::fs::read_dir(data_dir).map_err(io_err(data_dir))? {
            let path = entry.map_err(io_err(data_dir))?.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_owned) else {
                continue;
            };

            let json = std::fs::read_to_string(&path).map_err(io_err(&path))?;
            let payload: Value = serde_json::from_str(&json)
                .map_err(|source| MockLoadError::Json {
                    path: path.clone(),
                    source,
                })?;

            if stem == STOP_FINDER_FILE {
                stop_finder = Some(MockResponse::Payload(payload));
            } else {
                departures.insert(stem, MockResponse::Payload(payload));
            }
        }

        if departures.is_empty() && stop_finder.is_none() {
            return Err(MockLoadError::Empty(data_dir.to_path_buf()));
        }

        tracing::info!(
            dir = %data_dir.display(),
            stops = departures.len(),
            "loaded mock EFA payloads"
        );

        Ok(Self {
            departures: Arc::new(RwLock::new(departures)),
            stop_finder: Arc::new(RwLock::new(stop_finder)),
            ..Self::default()
        })
    }

    /// Compute minutes-until against a fixed time of day instead of the
    /// wall clock.
    pub fn with_clock(mut self, now: NaiveTime) -> Self {
        self.clock = Some(now);
        self
    }

    /// Delay responses to requests issued from now on. `None` answers
    /// immediately.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write().await = latency;
    }

    /// Serve a raw `XSLT_DM_REQUEST` payload for a stop.
    pub async fn set_departures(&self, stop_id: impl Into<String>, payload: Value) {
        self.departures
            .write()
            .await
            .insert(stop_id.into(), MockResponse::Payload(payload));
    }

    /// Make departure requests for a stop fail.
    pub async fn set_failure(&self, stop_id: impl Into<String>, failure: MockFailure) {
        self.departures
            .write()
            .await
            .insert(stop_id.into(), MockResponse::Failure(failure));
    }

    /// Serve a raw `XSLT_STOPFINDER_REQUEST` payload for every search.
    pub async fn set_stop_finder(&self, payload: Value) {
        *self.stop_finder.write().await = Some(MockResponse::Payload(payload));
    }

    /// Make stop searches fail.
    pub async fn set_stop_finder_failure(&self, failure: MockFailure) {
        *self.stop_finder.write().await = Some(MockResponse::Failure(failure));
    }

    /// Number of departure requests served.
    pub fn departure_calls(&self) -> usize {
        self.departure_calls.load(Ordering::SeqCst)
    }

    /// Number of stop searches that reached the mock "server".
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    fn now(&self) -> NaiveTime {
        self.clock.unwrap_or_else(|| Local::now().time())
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.read().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl TransitSource for MockEfaClient {
    async fn search_stops(&self, query: &str) -> Vec<Stop> {
        if query.chars().count() < MIN_QUERY_LEN {
            return Vec::new();
        }
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        let response = self.stop_finder.read().await.clone();
        match response {
            Some(MockResponse::Payload(payload)) => {
                match serde_json::from_value::<StopFinderResponse>(payload) {
                    Ok(response) => normalize_stop_finder(response),
                    Err(e) => {
                        tracing::warn!(query, error = %e, "stop search failed");
                        Vec::new()
                    }
                }
            }
            Some(MockResponse::Failure(failure)) => {
                tracing::warn!(query, error = %failure.to_error(), "stop search failed");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    async fn get_departures(&self, stop_id: &str) -> Result<Vec<Departure>, EfaError> {
        self.departure_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        let response = self.departures.read().await.get(stop_id).cloned();
        match response {
            Some(MockResponse::Payload(payload)) => {
                let response: DepartureResponse =
                    serde_json::from_value(payload).map_err(|e| EfaError::Json {
                        message: e.to_string(),
                        body: None,
                    })?;
                Ok(normalize_departures(response, self.now()))
            }
            Some(MockResponse::Failure(failure)) => Err(failure.to_error()),
            None => Err(EfaError::Api {
                status: 404,
                message: format!("No mock data for stop {stop_id}"),
            }),
        }
    }
}
