//! Application state for the web layer.

use std::sync::Arc;

use crate::feed::FeedReader;
use crate::metrics::FeedMetrics;
use crate::monitor::StatusMonitor;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Read side of the feed, empty until the first publish
    pub feed: FeedReader,

    pub monitor: StatusMonitor,

    pub metrics: Arc<FeedMetrics>,
}

impl AppState {
    pub fn new(feed: FeedReader, monitor: StatusMonitor, metrics: Arc<FeedMetrics>) -> Self {
        Self {
            feed,
            monitor,
            metrics,
        }
    }
}
