//! Observable, optionally file-backed board settings.
//!
//! Each setting lives in its own [`watch`] channel so consumers can react to
//! exactly the values they care about. Every mutation is written through to
//! the settings file when one is configured.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::domain::StopConfig;

/// Default seconds between board refreshes.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

/// Default number of departures shown per stop.
pub const DEFAULT_MAX_DEPARTURES: usize = 10;

/// Errors persisting settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// The persisted settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub stops: Vec<StopConfig>,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_max_departures")]
    pub max_departures: usize,
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

fn default_max_departures() -> usize {
    DEFAULT_MAX_DEPARTURES
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stops: Vec::new(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            max_departures: DEFAULT_MAX_DEPARTURES,
        }
    }
}

impl Settings {
    /// Force numeric settings into their valid ranges.
    fn clamped(mut self) -> Self {
        self.refresh_interval_secs = self.refresh_interval_secs.max(1);
        self.max_departures = self.max_departures.max(1);
        self
    }
}

/// Shared settings service.
///
/// Cheap to clone; clones share the same channels and file.
#[derive(Clone)]
pub struct SettingsStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    stops: watch::Sender<Vec<StopConfig>>,
    refresh_interval: watch::Sender<u64>,
    max_departures: watch::Sender<usize>,
    path: Option<PathBuf>,
    /// Serializes mutate-then-persist so the file reflects the last write.
    write_lock: Mutex<()>,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::in_memory(Settings::default())
    }
}

impl SettingsStore {
    /// In-memory store with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// In-memory store seeded with `settings`. Nothing is persisted.
    pub fn in_memory(settings: Settings) -> Self {
        Self::build(settings, None)
    }

    /// Open a store backed by a JSON file.
    ///
    /// A missing file yields defaults. An unreadable or unparsable file is
    /// logged and also yields defaults; the next write replaces it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();

        let settings = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Settings>(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable settings file");
                    Settings::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Settings::default(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            path = %path.display(),
            stops = settings.stops.len(),
            "loaded settings"
        );

        Ok(Self::build(settings, Some(path)))
    }

    fn build(settings: Settings, path: Option<PathBuf>) -> Self {
        let settings = settings.clamped();
        let (stops, _) = watch::channel(settings.stops);
        let (refresh_interval, _) = watch::channel(settings.refresh_interval_secs);
        let (max_departures, _) = watch::channel(settings.max_departures);

        Self {
            inner: Arc::new(StoreInner {
                stops,
                refresh_interval,
                max_departures,
                path,
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// Current settings as one document.
    pub fn snapshot(&self) -> Settings {
        Settings {
            stops: self.stops(),
            refresh_interval_secs: self.refresh_interval_secs(),
            max_departures: self.max_departures(),
        }
    }

    pub fn stops(&self) -> Vec<StopConfig> {
        self.inner.stops.borrow().clone()
    }

    pub fn refresh_interval_secs(&self) -> u64 {
        *self.inner.refresh_interval.borrow()
    }

    pub fn max_departures(&self) -> usize {
        *self.inner.max_departures.borrow()
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    pub fn subscribe_stops(&self) -> watch::Receiver<Vec<StopConfig>> {
        self.inner.stops.subscribe()
    }

    pub fn subscribe_refresh_interval(&self) -> watch::Receiver<u64> {
        self.inner.refresh_interval.subscribe()
    }

    pub fn subscribe_max_departures(&self) -> watch::Receiver<usize> {
        self.inner.max_departures.subscribe()
    }

    /// Append a stop. Returns `false` without change if its id is already
    /// configured.
    pub fn add_stop(&self, config: StopConfig) -> Result<bool, SettingsError> {
        self.mutate(|next| {
            if next.stops.iter().any(|s| s.id == config.id) {
                return false;
            }
            next.stops.push(config);
            true
        })
    }

    /// Replace the config for an existing stop id. Returns `false` if the
    /// id is not configured.
    pub fn update_stop(&self, config: StopConfig) -> Result<bool, SettingsError> {
        self.mutate(|next| match next.stops.iter_mut().find(|s| s.id == config.id) {
            Some(existing) => replace_if_changed(existing, config),
            None => false,
        })
    }

    /// Remove a stop. Returns `false` if the id was not configured.
    pub fn remove_stop(&self, id: &str) -> Result<bool, SettingsError> {
        self.mutate(|next| {
            let before = next.stops.len();
            next.stops.retain(|s| s.id != id);
            next.stops.len() != before
        })
    }

    /// Replace the whole stop list.
    pub fn set_stops(&self, configs: Vec<StopConfig>) -> Result<(), SettingsError> {
        self.mutate(|next| replace_if_changed(&mut next.stops, configs))
            .map(|_| ())
    }

    /// Set seconds between refreshes, clamped to at least 1.
    pub fn set_refresh_interval(&self, secs: u64) -> Result<(), SettingsError> {
        self.mutate(|next| replace_if_changed(&mut next.refresh_interval_secs, secs.max(1)))
            .map(|_| ())
    }

    /// Set departures shown per stop, clamped to at least 1.
    pub fn set_max_departures(&self, count: usize) -> Result<(), SettingsError> {
        self.mutate(|next| replace_if_changed(&mut next.max_departures, count.max(1)))
            .map(|_| ())
    }

    /// Apply a change to a copy of the current settings, persist it, then
    /// publish. Nothing is published if the write fails.
    fn mutate(&self, change: impl FnOnce(&mut Settings) -> bool) -> Result<bool, SettingsError> {
        let _guard = self
            .inner
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut next = self.snapshot();
        if !change(&mut next) {
            return Ok(false);
        }

        self.save(&next)?;
        self.publish(next);
        Ok(true)
    }

    /// Send each field on its channel; only changed fields notify.
    fn publish(&self, settings: Settings) {
        let inner = &self.inner;
        inner
            .stops
            .send_if_modified(|current| replace_if_changed(current, settings.stops));
        inner
            .refresh_interval
            .send_if_modified(|current| replace_if_changed(current, settings.refresh_interval_secs));
        inner
            .max_departures
            .send_if_modified(|current| replace_if_changed(current, settings.max_departures));
    }

    /// Write settings to the backing file.
    ///
    /// Creates parent directories if they don't exist.
    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let Some(path) = &self.inner.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(path, json)?;

        tracing::debug!(path = %path.display(), "saved settings");
        Ok(())
    }
}

fn replace_if_changed<T: PartialEq>(current: &mut T, new: T) -> bool {
    if *current == new {
        return false;
    }
    *current = new;
    true
}
