//! Per-station view of the most recently fetched trains.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{Station, Train};

/// Most recently known trains for every station.
///
/// Lists are held behind `Arc` so cloning a snapshot is cheap and a station
/// that was not refreshed keeps pointing at exactly the same list as before.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    trains: BTreeMap<Station, Arc<[Train]>>,
}

impl Snapshot {
    /// A snapshot with an empty list for each of the given stations.
    pub fn empty_for(stations: impl IntoIterator<Item = Station>) -> Self {
        Self {
            trains: stations
                .into_iter()
                .map(|s| (s, Arc::from(Vec::new())))
                .collect(),
        }
    }

    /// Trains at a station; empty if the station has never been fetched.
    pub fn trains_at(&self, station: Station) -> &[Train] {
        self.trains.get(&station).map(|t| &t[..]).unwrap_or(&[])
    }

    /// The shared list for a station, if present.
    pub fn shared_trains_at(&self, station: Station) -> Option<&Arc<[Train]>> {
        self.trains.get(&station)
    }

    /// Replace a station's list wholesale.
    pub fn replace(&mut self, station: Station, trains: Vec<Train>) {
        self.trains.insert(station, Arc::from(trains));
    }

    pub fn stations(&self) -> impl Iterator<Item = Station> + '_ {
        self.trains.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Station, &[Train])> {
        self.trains.iter().map(|(s, t)| (*s, &t[..]))
    }

    /// Total number of trains across all stations.
    pub fn train_count(&self) -> usize {
        self.trains.values().map(|t| t.len()).sum()
    }
}
