//! VRR EFA (Elektronische Fahrplanauskunft) client.
//!
//! This module provides an HTTP client for the EFA JSON API served by the
//! Verkehrsverbund Rhein-Ruhr, which answers stop searches and realtime
//! departure monitor queries.
//!
//! Key characteristics of EFA:
//! - Container fields are sometimes absent, sometimes a single object and
//!   sometimes an array; see [`Entries`]
//! - Numbers arrive as strings or numbers depending on the field and server
//! - Responses declare `text/html` or `text/plain` even when the body is JSON
//! - Times are separate hour/minute components in local time

mod client;
mod convert;
mod error;
mod mock;
mod source;
mod types;

pub use client::{DEFAULT_BASE_URL, EfaClient, EfaConfig, MIN_QUERY_LEN};
pub use convert::{
    ConversionError, convert_departure, convert_stop_point, normalize_departures,
    normalize_stop_finder,
};
pub use error::EfaError;
pub use mock::{MockEfaClient, MockFailure, MockLoadError, STOP_FINDER_FILE};
pub use source::TransitSource;
pub use types::{
    DateTimeDto, DepartureDto, DepartureResponse, Entries, ServingLineDto, StopFinder,
    StopFinderResponse, StopPointDto, StopRefDto,
};
