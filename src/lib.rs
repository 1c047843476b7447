#![deny(missing_docs)]

//! Core library for the Tika Relay HTTP server.

/// HTTP routing and JSON handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Relay request counters.
pub mod metrics;
/// Text statistics for extraction responses.
pub mod stats;
/// Apache Tika client and result types.
pub mod tika;
/// Upload staging and temp-file cleanup.
pub mod upload;
