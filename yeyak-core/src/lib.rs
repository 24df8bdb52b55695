//! Core types and pipeline for the Seoul public-service reservation digest.

/// Start-up configuration and environment snapshot.
pub mod config;
/// Text digest rendering for the filtered listings.
pub mod digest;
/// Two-stage listing filter.
pub mod filter;
/// Listing records, fields and page ranges.
pub mod model;
/// Artifact building and file writers.
pub mod output;
/// Traits describing listing backends.
pub mod ports;
/// Retry state machine with exponential backoff.
pub mod retry;
/// Paginated fetch loop.
pub mod service;
/// Timestamp parsing and sort keys.
pub mod timestamp;

pub use config::*;
pub use filter::*;
pub use model::*;
pub use output::*;
pub use ports::*;
pub use retry::*;
pub use service::*;
pub use timestamp::*;
