//! The seam between the board and wherever departures come from.

use std::future::Future;

use crate::domain::{Departure, Stop};

use super::client::EfaClient;
use super::error::EfaError;

/// A provider of stop search and departure data.
///
/// Implemented by the live [`EfaClient`], the caching wrapper and the
/// in-memory mock. Stop search is best-effort and never fails; departure
/// lookups report failures to the caller.
pub trait TransitSource: Send + Sync + 'static {
    /// Search stops by free text.
    fn search_stops(&self, query: &str) -> impl Future<Output = Vec<Stop>> + Send;

    /// Fetch the current departures for a stop.
    fn get_departures(
        &self,
        stop_id: &str,
    ) -> impl Future<Output = Result<Vec<Departure>, EfaError>> + Send;
}

impl TransitSource for EfaClient {
    async fn search_stops(&self, query: &str) -> Vec<Stop> {
        EfaClient::search_stops(self, query).await
    }

    async fn get_departures(&self, stop_id: &str) -> Result<Vec<Departure>, EfaError> {
        EfaClient::get_departures(self, stop_id).await
    }
}
