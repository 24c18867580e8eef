//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::StopConfig;

/// Query for stop search.
#[derive(Debug, Deserialize)]
pub struct StopSearchRequest {
    /// Free-text query, at least three characters to get results
    #[serde(default)]
    pub q: String,
}

/// Lifecycle signal from the client (page visible / hidden).
#[derive(Debug, Deserialize)]
pub struct LifecycleRequest {
    pub active: bool,
}

/// Lifecycle state after a signal.
#[derive(Debug, Serialize)]
pub struct LifecycleResponse {
    pub active: bool,
}

/// Request to add a stop to the board.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddStopRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub platforms: Vec<String>,
    pub time_from: Option<i64>,
    pub time_to: Option<i64>,
}

impl AddStopRequest {
    pub fn into_config(self) -> StopConfig {
        let defaults = StopConfig::new(self.id, self.name);
        let time_from = self.time_from.unwrap_or(defaults.time_from);
        let time_to = self.time_to.unwrap_or(defaults.time_to);
        defaults
            .with_label(self.label)
            .with_platforms(self.platforms)
            .with_time_window(time_from, time_to)
    }
}

/// Partial update of a configured stop. Absent fields keep their value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStopRequest {
    pub name: Option<String>,
    pub label: Option<String>,
    pub platforms: Option<Vec<String>>,
    pub time_from: Option<i64>,
    pub time_to: Option<i64>,
}

impl UpdateStopRequest {
    pub fn apply(self, mut config: StopConfig) -> StopConfig {
        if let Some(name) = self.name {
            config.name = name;
        }
        if let Some(label) = self.label {
            config.label = label;
        }
        if let Some(platforms) = self.platforms {
            config.platforms = platforms;
        }
        if let Some(from) = self.time_from {
            config.time_from = from;
        }
        if let Some(to) = self.time_to {
            config.time_to = to;
        }
        config
    }
}

/// New refresh interval.
#[derive(Debug, Deserialize)]
pub struct RefreshIntervalRequest {
    pub seconds: u64,
}

/// New per-stop departure limit.
#[derive(Debug, Deserialize)]
pub struct MaxDeparturesRequest {
    pub count: usize,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
