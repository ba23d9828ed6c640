//! PATH train GTFS Realtime feed.
//!
//! Polls per-station realtime arrivals for the PATH system, merges them
//! into a snapshot that tolerates individual station failures, and
//! publishes the result as a GTFS Realtime protobuf document. A rolling
//! status history records how each update went.

pub mod aggregator;
pub mod clock;
pub mod config;
pub mod domain;
pub mod feed;
pub mod gtfsrt;
pub mod metrics;
pub mod monitor;
pub mod source;
pub mod topology;
pub mod web;
