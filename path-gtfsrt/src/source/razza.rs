//! Razza PATH API gateway.
//!
//! A thin JSON API over the same upstream data with real topology
//! endpoints. Each operation is one uncached request.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::SourceError;
use super::http::HttpFetch;
use super::qa::apply_route_qa;
use super::{Deadline, SourceGateway};
use crate::domain::{Direction, Route, Station, Train};

/// Production API root.
pub const RAZZA_BASE_URL: &str = "https://path.api.razza.dev/v1/";

#[derive(Debug, Deserialize)]
struct ListStationsResponse {
    #[serde(default)]
    stations: Vec<StationData>,
}

#[derive(Debug, Deserialize)]
struct StationData {
    station: String,
    id: String,
}

#[derive(Debug, Deserialize)]
struct ListRoutesResponse {
    #[serde(default)]
    routes: Vec<RouteData>,
}

#[derive(Debug, Deserialize)]
struct RouteData {
    route: String,
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpcomingTrainsResponse {
    #[serde(default)]
    upcoming_trains: Vec<UpcomingTrain>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct UpcomingTrain {
    projected_arrival: String,
    last_updated: String,
    route: String,
    direction: String,
    line_name: String,
}

impl UpcomingTrain {
    fn into_train(self) -> Train {
        let mut train = Train::new(
            Route::from_api_name(&self.route),
            Direction::from_api_name(&self.direction),
            parse_time(&self.projected_arrival),
            parse_time(&self.last_updated),
        );
        if !self.line_name.is_empty() {
            train = train.with_line_name(self.line_name);
        }
        apply_route_qa(&mut train);
        train
    }
}

fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Gateway for the Razza HTTP API.
pub struct RazzaGateway {
    fetcher: Arc<dyn HttpFetch>,
    base_url: String,
}

impl RazzaGateway {
    pub fn new(fetcher: Arc<dyn HttpFetch>) -> Self {
        Self {
            fetcher,
            base_url: RAZZA_BASE_URL.to_string(),
        }
    }

    /// Set a custom base URL (for testing). Must end with `/`.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        deadline: &Deadline,
    ) -> Result<T, SourceError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, "razza request");
        let body = deadline
            .run(self.fetcher.get(&url, deadline.timeout()))
            .await?;
        serde_json::from_slice(&body).map_err(SourceError::json)
    }
}

#[async_trait]
impl SourceGateway for RazzaGateway {
    fn name(&self) -> &'static str {
        "razza"
    }

    async fn station_topology(
        &self,
        deadline: &Deadline,
    ) -> Result<BTreeMap<Station, String>, SourceError> {
        let response: ListStationsResponse = self.get_json("stations/", deadline).await?;
        let mut stops = BTreeMap::new();
        for data in response.stations {
            match Station::from_api_name(&data.station) {
                Some(station) => {
                    stops.insert(station, data.id);
                }
                None => warn!(station = %data.station, "skipping unknown station"),
            }
        }
        Ok(stops)
    }

    async fn route_topology(
        &self,
        deadline: &Deadline,
    ) -> Result<BTreeMap<Route, String>, SourceError> {
        let response: ListRoutesResponse = self.get_json("routes/", deadline).await?;
        let mut routes = BTreeMap::new();
        for data in response.routes {
            match Route::from_api_name(&data.route) {
                Route::Unspecified => warn!(route = %data.route, "skipping unknown route"),
                route => {
                    routes.insert(route, data.id);
                }
            }
        }
        Ok(routes)
    }

    async fn trains_at(
        &self,
        station: Station,
        deadline: &Deadline,
    ) -> Result<Vec<Train>, SourceError> {
        let endpoint = format!(
            "stations/{}/realtime/",
            station.api_name().to_ascii_lowercase()
        );
        let response: UpcomingTrainsResponse = self.get_json(&endpoint, deadline).await?;
        Ok(response
            .upcoming_trains
            .into_iter()
            .map(UpcomingTrain::into_train)
            .collect())
    }
}
