//! Live departure board for VRR public transport.
//!
//! Polls the VRR EFA API for the stops a user has configured, normalizes
//! the loosely typed responses into departures with countdown and delay,
//! and serves the result as a web page and JSON API.

pub mod board;
pub mod cache;
pub mod config;
pub mod domain;
pub mod efa;
pub mod web;
