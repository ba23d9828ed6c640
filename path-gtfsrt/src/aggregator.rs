//! One update cycle: fetch every station concurrently and fold the results
//! into a new snapshot.
//!
//! Each station is fetched by its own task and reports back on a channel
//! sized to the station count, so no task ever waits to report. The
//! orchestrator receives exactly one message per station. A station whose
//! fetch fails keeps the list it had in the previous snapshot, untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{Snapshot, Station, Train};
use crate::source::{Deadline, SourceError, SourceGateway};
use crate::topology::StaticTopology;

/// Result of fetching every station once.
#[derive(Debug)]
pub struct CycleFetch {
    /// Previous snapshot with every successfully fetched station replaced.
    pub snapshot: Snapshot,
    /// Stations whose fetch failed this cycle.
    pub errors: BTreeMap<Station, SourceError>,
}

impl CycleFetch {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Runs fetch cycles against a gateway.
pub struct Aggregator {
    gateway: Arc<dyn SourceGateway>,
    timeout: Duration,
    max_concurrent: usize,
}

impl Aggregator {
    /// `timeout` is the deadline applied to each individual station fetch.
    pub fn new(gateway: Arc<dyn SourceGateway>, timeout: Duration) -> Self {
        Self {
            gateway,
            timeout,
            max_concurrent: usize::MAX,
        }
    }

    /// Cap the number of station fetches in flight at once. By default every
    /// station is fetched at the same time.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    pub async fn run_cycle(&self, topology: &StaticTopology, previous: &Snapshot) -> CycleFetch {
        let station_count = topology.station_count();

        // Cancels any fetch still running if this future is dropped mid-cycle
        let cycle_token = CancellationToken::new();
        let _abort_on_drop = cycle_token.clone().drop_guard();
        let deadline = Deadline::new(self.timeout, cycle_token);

        let permits = Arc::new(Semaphore::new(
            self.max_concurrent
                .min(station_count.max(1))
                .min(Semaphore::MAX_PERMITS),
        ));
        let (tx, mut rx) = mpsc::channel::<(Station, Result<Vec<Train>, SourceError>)>(
            station_count.max(1),
        );

        for station in topology.stations() {
            let tx = tx.clone();
            let gateway = self.gateway.clone();
            let deadline = deadline.clone();
            let permits = permits.clone();
            tokio::spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => deadline.run(gateway.trains_at(station, &deadline)).await,
                    Err(_) => Err(SourceError::Cancelled),
                };
                // The receiver only goes away if the cycle itself was dropped
                let _ = tx.send((station, result)).await;
            });
        }
        drop(tx);

        let mut snapshot = previous.clone();
        let mut errors = BTreeMap::new();
        let mut reported = BTreeSet::new();

        while let Some((station, result)) = rx.recv().await {
            reported.insert(station);
            match result {
                Ok(trains) => {
                    debug!(%station, trains = trains.len(), "station fetched");
                    snapshot.replace(station, trains);
                }
                Err(e) => {
                    warn!(
                        %station,
                        stop_id = topology.stop_id(station).unwrap_or("?"),
                        error = %e,
                        "station fetch failed, keeping previous data"
                    );
                    errors.insert(station, e);
                }
            }
        }

        // A task that panicked drops its sender without reporting
        for station in topology.stations().filter(|s| !reported.contains(s)) {
            warn!(%station, "station fetch task ended without reporting");
            errors.insert(
                station,
                SourceError::Task(format!("fetch task for {station} did not report")),
            );
        }

        info!(
            stations = station_count,
            failed = errors.len(),
            trains = snapshot.train_count(),
            "fetch cycle complete"
        );

        CycleFetch { snapshot, errors }
    }
}
