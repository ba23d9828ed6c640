//! Scriptable in-memory gateway for tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{Deadline, SourceError, SourceGateway};
use crate::domain::{Route, Station, Train};

/// What the gateway does for one station.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Trains(Vec<Train>),
    Fail(u16),
    Hang,
    Panic,
}

/// Gateway whose per-station replies can be changed between cycles.
pub(crate) struct ScriptedGateway {
    stations: BTreeMap<Station, String>,
    routes: BTreeMap<Route, String>,
    replies: Mutex<BTreeMap<Station, Reply>>,
    delay: Option<Duration>,
    pub(crate) calls: Mutex<Vec<Station>>,
    in_flight: AtomicUsize,
    pub(crate) max_in_flight: AtomicUsize,
}

impl ScriptedGateway {
    pub(crate) fn new(stations: &[(Station, &str)], routes: &[(Route, &str)]) -> Self {
        Self {
            stations: stations
                .iter()
                .map(|(s, id)| (*s, id.to_string()))
                .collect(),
            routes: routes.iter().map(|(r, id)| (*r, id.to_string())).collect(),
            replies: Mutex::new(BTreeMap::new()),
            delay: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Stations without a reply return an empty list.
    pub(crate) fn set(&self, station: Station, reply: Reply) {
        self.replies.lock().unwrap().insert(station, reply);
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SourceGateway for ScriptedGateway {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn station_topology(
        &self,
        _deadline: &Deadline,
    ) -> Result<BTreeMap<Station, String>, SourceError> {
        Ok(self.stations.clone())
    }

    async fn route_topology(
        &self,
        _deadline: &Deadline,
    ) -> Result<BTreeMap<Route, String>, SourceError> {
        Ok(self.routes.clone())
    }

    async fn trains_at(
        &self,
        station: Station,
        _deadline: &Deadline,
    ) -> Result<Vec<Train>, SourceError> {
        self.calls.lock().unwrap().push(station);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&station)
            .cloned()
            .unwrap_or(Reply::Trains(Vec::new()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            Reply::Trains(trains) => Ok(trains),
            Reply::Fail(status) => Err(SourceError::Status {
                status,
                message: format!("scripted failure at {station}"),
            }),
            Reply::Hang => std::future::pending().await,
            Reply::Panic => panic!("scripted panic at {station}"),
        }
    }
}
