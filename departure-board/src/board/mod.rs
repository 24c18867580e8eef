//! Polling coordinator for the departure board.
//!
//! The board owns one [`StopBoardState`] per configured stop and keeps them
//! fresh by polling a [`TransitSource`]. Polling is gated by an explicit
//! lifecycle:
//!
//! - **Inactive**: no timer runs. Settings changes only resync the stop list.
//! - **Active**: a timer task refreshes every stop each refresh interval.
//!   Entering Active refreshes immediately; a settings change refreshes
//!   immediately and restarts the timer.
//!
//! Each stop refreshes in its own task. A refresh replaces that stop's
//! state as a whole record inside the published [`BoardSnapshot`], and a
//! per-stop sequence number discards completions overtaken by a newer
//! request.

mod filter;
mod settings;
mod state;

use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use chrono::Local;
use futures::future::join_all;
use tokio::sync::{Mutex, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

use crate::domain::Stop;
use crate::efa::{EfaError, TransitSource};

pub use filter::{distinct_platforms, filter_departures};
pub use settings::{
    DEFAULT_MAX_DEPARTURES, DEFAULT_REFRESH_INTERVAL_SECS, Settings, SettingsError, SettingsStore,
};
pub use state::{BoardError, BoardSnapshot, FailureKind, StopBoardState};

/// Format of `last_update` timestamps.
const UPDATE_TIME_FORMAT: &str = "%H:%M:%S";

enum Lifecycle {
    Inactive,
    Active { ticker: JoinHandle<()> },
}

/// The departure board coordinator.
///
/// Cheap to clone; clones share state.
pub struct Board<S> {
    inner: Arc<BoardInner<S>>,
}

impl<S> Clone for Board<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct BoardInner<S> {
    source: S,
    settings: SettingsStore,
    snapshot: watch::Sender<BoardSnapshot>,
    lifecycle: Mutex<Lifecycle>,
    settings_watcher: OnceLock<AbortHandle>,
}

impl<S> Drop for BoardInner<S> {
    fn drop(&mut self) {
        if let Lifecycle::Active { ticker } = self.lifecycle.get_mut() {
            ticker.abort();
        }
        if let Some(watcher) = self.settings_watcher.get() {
            watcher.abort();
        }
    }
}

impl<S: TransitSource> Board<S> {
    /// Create an inactive board.
    ///
    /// Must be called within a Tokio runtime: the board spawns a task that
    /// follows `settings`.
    pub fn new(source: S, settings: SettingsStore) -> Self {
        let mut snapshot = BoardSnapshot::new(
            settings.refresh_interval_secs(),
            settings.max_departures(),
        );
        snapshot.sync_stops(&settings.stops());
        let (snapshot, _) = watch::channel(snapshot);

        let board = Self {
            inner: Arc::new(BoardInner {
                source,
                settings,
                snapshot,
                lifecycle: Mutex::new(Lifecycle::Inactive),
                settings_watcher: OnceLock::new(),
            }),
        };

        let watcher = board.spawn_settings_watcher();
        let _ = board.inner.settings_watcher.set(watcher.abort_handle());
        board
    }

    /// Current board state.
    pub fn snapshot(&self) -> BoardSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Observe board state changes.
    pub fn subscribe(&self) -> watch::Receiver<BoardSnapshot> {
        self.inner.snapshot.subscribe()
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.inner.settings
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// Whether periodic polling is running.
    pub async fn is_active(&self) -> bool {
        matches!(*self.inner.lifecycle.lock().await, Lifecycle::Active { .. })
    }

    /// Deliver a lifecycle signal.
    ///
    /// Becoming active starts the timer and refreshes every stop at once.
    /// Becoming inactive stops the timer; refreshes already in flight still
    /// complete. Repeating the current state does nothing.
    pub async fn set_active(&self, active: bool) {
        let mut lifecycle = self.inner.lifecycle.lock().await;
        let is_active = matches!(*lifecycle, Lifecycle::Active { .. });

        match (is_active, active) {
            (false, true) => {
                self.sync_from_settings();
                *lifecycle = Lifecycle::Active {
                    ticker: self.spawn_ticker(),
                };
                drop(lifecycle);

                self.inner.snapshot.send_modify(|s| s.active = true);
                info!("board active");
                self.spawn_refresh_all();
            }
            (true, false) => {
                if let Lifecycle::Active { ticker } =
                    std::mem::replace(&mut *lifecycle, Lifecycle::Inactive)
                {
                    ticker.abort();
                }
                drop(lifecycle);

                self.inner.snapshot.send_modify(|s| s.active = false);
                info!("board inactive");
            }
            _ => {}
        }
    }

    /// Refresh every configured stop concurrently and wait for all of them.
    pub async fn refresh_all(&self) {
        let ids: Vec<String> = self
            .inner
            .snapshot
            .borrow()
            .stops
            .iter()
            .map(|s| s.config.id.clone())
            .collect();

        debug!(stops = ids.len(), "refreshing board");

        let tasks = ids.into_iter().map(|id| {
            let board = self.clone();
            tokio::spawn(async move { board.refresh_stop(&id).await })
        });

        for result in join_all(tasks).await {
            if let Err(e) = result
                && e.is_panic()
            {
                tracing::error!(error = %e, "stop refresh panicked");
            }
        }
    }

    /// Refresh one stop.
    ///
    /// Returns `false` if the stop is not configured or the result was
    /// overtaken by a newer refresh of the same stop.
    pub async fn refresh_stop(&self, stop_id: &str) -> bool {
        let mut seq = None;
        self.inner.snapshot.send_if_modified(|snapshot| {
            match snapshot.stop_mut(stop_id) {
                Some(stop) => {
                    seq = Some(stop.begin_request());
                    true
                }
                None => false,
            }
        });
        let Some(seq) = seq else {
            return false;
        };

        let outcome = self.inner.source.get_departures(stop_id).await;
        let at = Local::now().format(UPDATE_TIME_FORMAT).to_string();

        self.inner.snapshot.send_if_modified(|snapshot| {
            let max = snapshot.max_departures;
            let Some(stop) = snapshot.stop_mut(stop_id) else {
                return false;
            };

            let outcome = match outcome {
                Ok(departures) => Ok(filter_departures(departures, &stop.config, max)),
                Err(e) => {
                    warn!(stop_id, error = %e, "departure refresh failed");
                    Err(BoardError::from(&e))
                }
            };
            let succeeded = outcome.is_ok();

            let applied = stop.complete(seq, outcome, &at);
            if !applied {
                debug!(stop_id, seq, "discarding stale refresh");
            } else if succeeded {
                snapshot.last_global_update = Some(at.clone());
            }
            applied
        })
    }

    /// Search stops by free text.
    pub async fn search_stops(&self, query: &str) -> Vec<Stop> {
        self.inner.source.search_stops(query).await
    }

    /// Platform labels currently served at a stop.
    ///
    /// Used when configuring a stop's platform filter.
    pub async fn available_platforms(&self, stop_id: &str) -> Result<Vec<String>, EfaError> {
        let departures = self.inner.source.get_departures(stop_id).await?;
        Ok(distinct_platforms(&departures))
    }

    /// Pull the stop list and numeric settings into the snapshot.
    fn sync_from_settings(&self) {
        let settings = self.inner.settings.snapshot();
        self.inner.snapshot.send_if_modified(|snapshot| {
            let mut changed = snapshot.sync_stops(&settings.stops);
            if snapshot.refresh_interval_secs != settings.refresh_interval_secs
                || snapshot.max_departures != settings.max_departures
            {
                snapshot.refresh_interval_secs = settings.refresh_interval_secs;
                snapshot.max_departures = settings.max_departures;
                changed = true;
            }
            changed
        });
    }

    async fn on_settings_changed(&self) {
        self.sync_from_settings();

        let restarted = {
            let mut lifecycle = self.inner.lifecycle.lock().await;
            match &mut *lifecycle {
                Lifecycle::Active { ticker } => {
                    ticker.abort();
                    *ticker = self.spawn_ticker();
                    true
                }
                Lifecycle::Inactive => false,
            }
        };

        if restarted {
            debug!("settings changed, restarting refresh timer");
            self.spawn_refresh_all();
        }
    }

    fn spawn_refresh_all(&self) {
        let board = self.clone();
        tokio::spawn(async move { board.refresh_all().await });
    }

    /// Timer task: sleep one interval, refresh, repeat.
    ///
    /// Each tick spawns its refresh so stopping the timer never cancels
    /// a refresh in flight.
    fn spawn_ticker(&self) -> JoinHandle<()> {
        let interval = Duration::from_secs(self.inner.settings.refresh_interval_secs());
        let weak = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let Some(board) = upgrade(&weak) else {
                    break;
                };
                board.spawn_refresh_all();
            }
        })
    }

    fn spawn_settings_watcher(&self) -> JoinHandle<()> {
        let settings = &self.inner.settings;
        let mut stops = settings.subscribe_stops();
        let mut interval = settings.subscribe_refresh_interval();
        let mut max_departures = settings.subscribe_max_departures();
        let weak = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            loop {
                let changed = tokio::select! {
                    r = stops.changed() => r,
                    r = interval.changed() => r,
                    r = max_departures.changed() => r,
                };
                if changed.is_err() {
                    break;
                }
                let Some(board) = upgrade(&weak) else {
                    break;
                };
                board.on_settings_changed().await;
            }
        })
    }
}

fn upgrade<S>(weak: &Weak<BoardInner<S>>) -> Option<Board<S>> {
    weak.upgrade().map(|inner| Board { inner })
}
