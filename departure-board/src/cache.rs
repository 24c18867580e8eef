//! Caching layer for stop search.
//!
//! Stop search is driven by user typing and repeats the same queries
//! often, while the stop list itself changes rarely. Results are cached per
//! normalized query for a few minutes. Departures are never cached: the
//! board polls precisely to see fresh realtime data.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;

use crate::domain::{Departure, Stop};
use crate::efa::{EfaClient, EfaError, TransitSource};

/// Cached search result.
type SearchEntry = Arc<Vec<Stop>>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_capacity: 500,
        }
    }
}

impl CacheConfig {
    /// Set the time to live.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Transit source with cached stop search.
///
/// Wraps any [`TransitSource`], usually the live [`EfaClient`].
pub struct CachedEfaClient<S = EfaClient> {
    inner: S,
    searches: MokaCache<String, SearchEntry>,
}

impl<S: TransitSource> CachedEfaClient<S> {
    /// Create a new cached client.
    pub fn new(inner: S, config: &CacheConfig) -> Self {
        let searches = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, searches }
    }

    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        self.searches.invalidate_all();
    }
}

/// Queries differing only in case or surrounding whitespace share an entry.
fn cache_key(query: &str) -> String {
    query.trim().to_lowercase()
}

impl<S: TransitSource> TransitSource for CachedEfaClient<S> {
    async fn search_stops(&self, query: &str) -> Vec<Stop> {
        let query = query.trim();
        let key = cache_key(query);

        // Try cache first
        if let Some(cached) = self.searches.get(&key).await {
            tracing::trace!(query, "stop search cache hit");
            return cached.as_ref().clone();
        }

        let stops = self.inner.search_stops(query).await;

        // Failures also come back empty, so don't pin them for the TTL
        if !stops.is_empty() {
            self.searches.insert(key, Arc::new(stops.clone())).await;
        }

        stops
    }

    async fn get_departures(&self, stop_id: &str) -> Result<Vec<Departure>, EfaError> {
        self.inner.get_departures(stop_id).await
    }
}
