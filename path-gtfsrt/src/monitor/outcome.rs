//! Summary of one completed update cycle.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregator::CycleFetch;
use crate::domain::{Direction, Station};
use crate::gtfsrt::RenderError;
use crate::topology::StaticTopology;

/// What happened at one station during a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StationOutcome {
    Fetched {
        trains: usize,
        to_ny: usize,
        to_nj: usize,
    },
    Failed {
        error: String,
    },
}

impl StationOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StationOutcome::Failed { .. })
    }

    /// Train count, or `None` for a failed fetch.
    pub fn train_count(&self) -> Option<usize> {
        match self {
            StationOutcome::Fetched { trains, .. } => Some(*trains),
            StationOutcome::Failed { .. } => None,
        }
    }
}

/// Outcome of a cycle as reported to callbacks and the status monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleOutcome {
    pub completed_at: DateTime<Utc>,
    pub stations: BTreeMap<Station, StationOutcome>,
    pub builder_error: Option<String>,
}

impl CycleOutcome {
    pub fn from_fetch(
        completed_at: DateTime<Utc>,
        topology: &StaticTopology,
        fetch: &CycleFetch,
        builder_error: Option<&RenderError>,
    ) -> Self {
        let stations = topology
            .stations()
            .map(|station| {
                let outcome = match fetch.errors.get(&station) {
                    Some(e) => StationOutcome::Failed {
                        error: e.to_string(),
                    },
                    None => {
                        let trains = fetch.snapshot.trains_at(station);
                        let count = |d| trains.iter().filter(|t| t.direction == d).count();
                        StationOutcome::Fetched {
                            trains: trains.len(),
                            to_ny: count(Direction::ToNy),
                            to_nj: count(Direction::ToNj),
                        }
                    }
                };
                (station, outcome)
            })
            .collect();

        Self {
            completed_at,
            stations,
            builder_error: builder_error.map(|e| e.to_string()),
        }
    }

    pub fn failed_stations(&self) -> usize {
        self.stations.values().filter(|o| o.is_failed()).count()
    }

    /// Station failures plus the builder failure, if any.
    pub fn error_count(&self) -> usize {
        self.failed_stations() + usize::from(self.builder_error.is_some())
    }

    pub fn is_clean(&self) -> bool {
        self.error_count() == 0
    }
}
