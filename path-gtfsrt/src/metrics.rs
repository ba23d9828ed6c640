//! Prometheus metrics for the feed.
//!
//! All collectors live in a registry owned by [`FeedMetrics`], so separate
//! instances (one per test, say) never collide.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use prometheus::{Encoder, Gauge, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};

use crate::monitor::{CycleOutcome, StationOutcome};

pub struct FeedMetrics {
    registry: Registry,
    num_updates: IntCounterVec,
    last_update: GaugeVec,
    successful_update_latency: Gauge,
    num_trip_stop_times: GaugeVec,
    num_requests: IntCounterVec,
    last_success: Mutex<Option<DateTime<Utc>>>,
}

impl FeedMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let num_updates = IntCounterVec::new(
            Opts::new(
                "path_train_gtfsrt_num_updates",
                "The total number of updates that have occurred",
            ),
            &["has_error"],
        )?;
        let last_update = GaugeVec::new(
            Opts::new("path_train_gtfsrt_last_update", "The time of the last update"),
            &["has_error"],
        )?;
        let successful_update_latency = Gauge::new(
            "path_train_gtfsrt_successful_update_latency",
            "The time since the last successful update",
        )?;
        let num_trip_stop_times = GaugeVec::new(
            Opts::new(
                "path_train_gtfsrt_num_trip_stop_times",
                "The number of trip stop times per station and direction",
            ),
            &["station", "direction"],
        )?;
        let num_requests = IntCounterVec::new(
            Opts::new(
                "path_train_gtfsrt_num_requests",
                "The number of times the GTFS-RT feed is requested",
            ),
            &["code"],
        )?;

        registry.register(Box::new(num_updates.clone()))?;
        registry.register(Box::new(last_update.clone()))?;
        registry.register(Box::new(successful_update_latency.clone()))?;
        registry.register(Box::new(num_trip_stop_times.clone()))?;
        registry.register(Box::new(num_requests.clone()))?;

        Ok(Self {
            registry,
            num_updates,
            last_update,
            successful_update_latency,
            num_trip_stop_times,
            num_requests,
            last_success: Mutex::new(None),
        })
    }

    /// Update collectors from one cycle outcome.
    pub fn observe(&self, outcome: &CycleOutcome) {
        for (station, result) in &outcome.stations {
            if let StationOutcome::Fetched { to_ny, to_nj, .. } = result {
                let name = station.api_name();
                self.num_trip_stop_times
                    .with_label_values(&[name, "NY"])
                    .set(*to_ny as f64);
                self.num_trip_stop_times
                    .with_label_values(&[name, "NJ"])
                    .set(*to_nj as f64);
            }
        }

        let mut last_success = self.last_success.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(t) = *last_success {
            let latency = outcome.completed_at.signed_duration_since(t);
            self.successful_update_latency
                .set(latency.num_milliseconds() as f64 / 1000.0);
        }

        let has_error = !outcome.is_clean();
        if !has_error {
            *last_success = Some(outcome.completed_at);
        }
        let label = if has_error { "true" } else { "false" };
        self.num_updates.with_label_values(&[label]).inc();
        self.last_update
            .with_label_values(&[label])
            .set(outcome.completed_at.timestamp() as f64);
    }

    /// Count one request for the feed document by response status.
    pub fn record_request(&self, code: u16) {
        self.num_requests
            .with_label_values(&[&code.to_string()])
            .inc();
    }

    /// Text exposition of every collector.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
