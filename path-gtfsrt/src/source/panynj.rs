//! Port Authority (PANYNJ) ridepath gateway.
//!
//! This is the feed behind the official realtime boards on the PATH
//! website. One response covers every station, so it goes through a
//! [`SharedResponseCache`] and each `trains_at` call re-parses the cached
//! body for its own station.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use super::cache::SharedResponseCache;
use super::error::SourceError;
use super::http::HttpFetch;
use super::static_ids::{gtfs_route_ids, gtfs_stop_ids};
use super::{Deadline, SourceGateway};
use crate::clock::Clock;
use crate::domain::{Direction, Route, Station, Train};

/// Production ridepath endpoint.
pub const PANYNJ_URL: &str = "https://www.panynj.gov/bin/portauthority/ridepath.json";

/// Default lifetime of a cached ridepath response.
const DEFAULT_CACHE_TTL_SECS: i64 = 10;

// Wire format. Everything is optional upstream, so every field defaults.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RidePathResponse {
    results: Vec<StationResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StationResult {
    considered_station: String,
    destinations: Vec<Destination>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Destination {
    label: String,
    messages: Vec<Message>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Message {
    line_color: String,
    head_sign: String,
    /// Sent as a string, occasionally as a number.
    seconds_to_arrival: Option<serde_json::Value>,
    last_updated: String,
}

impl Message {
    fn seconds_to_arrival(&self) -> Option<i64> {
        match self.seconds_to_arrival.as_ref()? {
            serde_json::Value::String(s) => s.trim().parse().ok(),
            serde_json::Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }
}

/// Gateway for the PANYNJ ridepath feed.
pub struct PanynjGateway {
    fetcher: Arc<dyn HttpFetch>,
    clock: Arc<dyn Clock>,
    cache: SharedResponseCache,
    url: String,
}

impl PanynjGateway {
    pub fn new(fetcher: Arc<dyn HttpFetch>, clock: Arc<dyn Clock>) -> Self {
        let cache = SharedResponseCache::new(
            chrono::Duration::seconds(DEFAULT_CACHE_TTL_SECS),
            clock.clone(),
        );
        Self {
            fetcher,
            clock,
            cache,
            url: PANYNJ_URL.to_string(),
        }
    }

    /// Override how long a fetched response is reused.
    pub fn with_cache_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.cache = SharedResponseCache::new(ttl, self.clock.clone());
        self
    }

    /// Point at a different endpoint (for testing).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn cache(&self) -> &SharedResponseCache {
        &self.cache
    }

    /// The endpoint carries a millisecond timestamp to defeat upstream
    /// HTTP caching.
    fn request_url(&self) -> String {
        format!(
            "{}?timeStamp={}",
            self.url,
            self.clock.now().timestamp() * 1000
        )
    }

    fn parse_trains(&self, body: &[u8], station: Station) -> Result<Vec<Train>, SourceError> {
        let response: RidePathResponse = serde_json::from_slice(body).map_err(SourceError::json)?;
        let now = self.clock.now().timestamp();

        let mut trains = Vec::new();
        for result in response.results {
            if Station::from_panynj_code(&result.considered_station) != Some(station) {
                continue;
            }
            for destination in result.destinations {
                let direction = Direction::from_panynj_label(&destination.label);
                for message in destination.messages {
                    let projected_arrival = message
                        .seconds_to_arrival()
                        .and_then(|secs| DateTime::from_timestamp(now + secs, 0));
                    let last_updated = parse_last_updated(&message.last_updated);
                    let mut train = Train::new(
                        Route::from_line_color(&message.line_color),
                        direction,
                        projected_arrival,
                        last_updated,
                    );
                    if !message.head_sign.is_empty() {
                        train = train.with_line_name(message.head_sign);
                    }
                    trains.push(train);
                }
            }
        }
        Ok(trains)
    }
}

/// Upstream stamps look like `2023-12-18T20:42:07.827997-05:00`. Anything
/// unparseable is treated as missing.
fn parse_last_updated(s: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(t) => Some(t.with_timezone(&Utc)),
        Err(e) => {
            if !s.is_empty() {
                debug!(value = s, error = %e, "unparseable lastUpdated");
            }
            None
        }
    }
}

#[async_trait]
impl SourceGateway for PanynjGateway {
    fn name(&self) -> &'static str {
        "panynj"
    }

    async fn station_topology(
        &self,
        _deadline: &Deadline,
    ) -> Result<BTreeMap<Station, String>, SourceError> {
        Ok(gtfs_stop_ids())
    }

    async fn route_topology(
        &self,
        _deadline: &Deadline,
    ) -> Result<BTreeMap<Route, String>, SourceError> {
        Ok(gtfs_route_ids())
    }

    async fn trains_at(
        &self,
        station: Station,
        deadline: &Deadline,
    ) -> Result<Vec<Train>, SourceError> {
        let timeout = deadline.timeout();
        let body = deadline
            .run(self.cache.get_or_fetch(|| async {
                let url = self.request_url();
                self.fetcher.get(&url, timeout).await
            }))
            .await
            .inspect_err(|e| warn!(%station, error = %e, "ridepath fetch failed"))?;
        self.parse_trains(&body, station)
    }
}
