//! Stop types.

use serde::{Deserialize, Serialize};

/// A transit stop usable as a departure query target.
///
/// `id` is the upstream stateless identifier and, together with `name`,
/// is never empty: the normalizer drops candidates that fail to resolve
/// either field instead of constructing a `Stop`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub locality: Option<String>,
}

impl Stop {
    /// Create a stop, returning `None` if `id` or `name` is empty.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        locality: Option<String>,
    ) -> Option<Self> {
        let id = id.into();
        let name = name.into();
        if id.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self { id, name, locality })
    }

    /// Name qualified with the locality, e.g. "Essen, Hauptbahnhof".
    pub fn qualified_name(&self) -> String {
        match &self.locality {
            Some(place) if !place.is_empty() && !self.name.starts_with(place.as_str()) => {
                format!("{place}, {}", self.name)
            }
            _ => self.name.clone(),
        }
    }
}

/// A user-configured board entry.
///
/// Persisted by the settings store and read by the board on every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopConfig {
    pub id: String,
    pub name: String,
    /// Display override; blank means use `name`.
    #[serde(default)]
    pub label: String,
    /// Platforms to include. Empty means all platforms.
    #[serde(default)]
    pub platforms: Vec<String>,
    /// Lower bound (inclusive) of the minutes-until window.
    #[serde(default)]
    pub time_from: i64,
    /// Upper bound (inclusive) of the minutes-until window.
    #[serde(default = "default_time_to")]
    pub time_to: i64,
}

/// Default upper bound of the minutes-until window.
pub const DEFAULT_TIME_TO: i64 = 60;

fn default_time_to() -> i64 {
    DEFAULT_TIME_TO
}

impl StopConfig {
    /// Create a config for a stop with default filters (all platforms, 0-60 minutes).
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            label: String::new(),
            platforms: Vec::new(),
            time_from: 0,
            time_to: DEFAULT_TIME_TO,
        }
    }

    /// Set the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Restrict to the given platforms.
    pub fn with_platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms = platforms.into_iter().map(Into::into).collect();
        self
    }

    /// Set the inclusive minutes-until window.
    pub fn with_time_window(mut self, from: i64, to: i64) -> Self {
        self.time_from = from;
        self.time_to = to;
        self
    }

    /// The label if set, otherwise the stop name.
    pub fn display_name(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.name
        } else {
            &self.label
        }
    }
}
