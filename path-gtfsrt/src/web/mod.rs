//! HTTP surface for the feed.
//!
//! Serves the latest GTFS Realtime document, the status history and
//! Prometheus metrics.

mod routes;
mod state;
pub mod templates;

pub use routes::create_router;
pub use state::AppState;
pub use templates::*;
