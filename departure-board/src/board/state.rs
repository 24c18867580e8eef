//! Observable board state.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::{Departure, StopConfig};
use crate::efa::EfaError;

/// User-facing category of a failed refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    NoConnectivity,
    TimedOut,
    CannotConnect,
    Generic,
}

impl FailureKind {
    /// Short message suitable for display next to the stop.
    pub fn message(self) -> &'static str {
        match self {
            FailureKind::NoConnectivity => "No internet connection",
            FailureKind::TimedOut => "Request timed out",
            FailureKind::CannotConnect => "Cannot reach the server",
            FailureKind::Generic => "Could not load departures",
        }
    }
}

impl From<&EfaError> for FailureKind {
    fn from(err: &EfaError) -> Self {
        match err {
            EfaError::Offline(_) => FailureKind::NoConnectivity,
            EfaError::Timeout => FailureKind::TimedOut,
            EfaError::Connect(_) => FailureKind::CannotConnect,
            EfaError::Http(_) | EfaError::Api { .. } | EfaError::Json { .. } => {
                FailureKind::Generic
            }
        }
    }
}

/// Error shown for a stop whose last refresh failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardError {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&EfaError> for BoardError {
    fn from(err: &EfaError) -> Self {
        let kind = FailureKind::from(err);
        Self {
            kind,
            message: kind.message().to_string(),
        }
    }
}

/// Display state of one configured stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopBoardState {
    pub config: StopConfig,
    /// Filtered, limited departures from the last successful refresh.
    pub departures: Vec<Departure>,
    pub is_loading: bool,
    pub error: Option<BoardError>,
    /// "HH:MM:SS" local time of the last successful refresh.
    pub last_update: Option<String>,
    /// Sequence number of the most recently issued request.
    #[serde(skip)]
    issued: u64,
    /// Sequence number of the most recently applied completion.
    #[serde(skip)]
    applied: u64,
}

impl StopBoardState {
    pub fn new(config: StopConfig) -> Self {
        Self {
            config,
            departures: Vec::new(),
            is_loading: false,
            error: None,
            last_update: None,
            issued: 0,
            applied: 0,
        }
    }

    /// Mark a refresh as started and return its sequence number.
    pub fn begin_request(&mut self) -> u64 {
        self.issued += 1;
        self.is_loading = true;
        self.issued
    }

    /// Apply the outcome of request `seq`.
    ///
    /// Completions older than one already applied are discarded and `false`
    /// is returned. A failure keeps the previous departures so the board
    /// does not blank out on a transient error.
    pub fn complete(
        &mut self,
        seq: u64,
        outcome: Result<Vec<Departure>, BoardError>,
        at: &str,
    ) -> bool {
        if seq <= self.applied {
            return false;
        }
        self.applied = seq;
        self.is_loading = self.issued > seq;

        match outcome {
            Ok(departures) => {
                self.departures = departures;
                self.error = None;
                self.last_update = Some(at.to_string());
            }
            Err(error) => self.error = Some(error),
        }
        true
    }
}

/// Whole-board view published to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    /// Whether periodic polling is running.
    pub active: bool,
    /// One entry per configured stop, in configured order.
    pub stops: Vec<StopBoardState>,
    pub refresh_interval_secs: u64,
    pub max_departures: usize,
    /// "HH:MM:SS" local time of the last successful refresh of any stop.
    pub last_global_update: Option<String>,
}

impl BoardSnapshot {
    pub fn new(refresh_interval_secs: u64, max_departures: usize) -> Self {
        Self {
            active: false,
            stops: Vec::new(),
            refresh_interval_secs,
            max_departures,
            last_global_update: None,
        }
    }

    /// Align the stop list with `configs`.
    ///
    /// Existing state is kept for ids still configured, with the config
    /// itself updated; new ids start empty; removed ids are dropped.
    /// Returns whether anything changed.
    pub fn sync_stops(&mut self, configs: &[StopConfig]) -> bool {
        let previous = std::mem::take(&mut self.stops);
        let unchanged = previous.len() == configs.len()
            && previous.iter().zip(configs).all(|(s, c)| s.config == *c);

        let mut by_id: HashMap<String, StopBoardState> = previous
            .into_iter()
            .map(|s| (s.config.id.clone(), s))
            .collect();

        self.stops = configs
            .iter()
            .map(|config| match by_id.remove(&config.id) {
                Some(mut state) => {
                    state.config = config.clone();
                    state
                }
                None => StopBoardState::new(config.clone()),
            })
            .collect();

        !unchanged
    }

    pub fn stop(&self, id: &str) -> Option<&StopBoardState> {
        self.stops.iter().find(|s| s.config.id == id)
    }

    pub fn stop_mut(&mut self, id: &str) -> Option<&mut StopBoardState> {
        self.stops.iter_mut().find(|s| s.config.id == id)
    }
}
