//! Fixed-capacity ring of status entries.

use std::collections::VecDeque;

use super::entry::StatusEntry;

/// Oldest entries are evicted once `capacity` is reached.
#[derive(Debug, Clone)]
pub struct StatusHistory {
    capacity: usize,
    entries: VecDeque<StatusEntry>,
}

impl StatusHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Merge into the newest entry if allowed, otherwise append.
    ///
    /// Returns true if the entry was merged.
    pub fn push(&mut self, entry: StatusEntry) -> bool {
        if let Some(newest) = self.entries.back_mut() {
            if newest.can_merge(&entry) {
                newest.merge(entry);
                return true;
            }
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        false
    }

    /// Copy of all entries, newest first.
    pub fn newest_first(&self) -> Vec<StatusEntry> {
        self.entries.iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Station;
    use crate::monitor::{CycleOutcome, StationOutcome};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::collections::BTreeMap;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn entry(secs: i64, trains: usize) -> StatusEntry {
        StatusEntry::new(
            CycleOutcome {
                completed_at: at(secs),
                stations: BTreeMap::from([(
                    Station::Newark,
                    StationOutcome::Fetched {
                        trains,
                        to_ny: trains,
                        to_nj: 0,
                    },
                )]),
                builder_error: None,
            },
            Some(Duration::seconds(5)),
            false,
        )
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut history = StatusHistory::new(3);
        for i in 0..5 {
            // Alternate counts so nothing merges
            assert!(!history.push(entry(i * 5, (i % 2) as usize)));
        }
        assert_eq!(history.len(), 3);

        let entries = history.newest_first();
        assert_eq!(entries[0].first_occurred, at(20));
        assert_eq!(entries[2].first_occurred, at(10));
    }

    #[test]
    fn merges_into_newest() {
        let mut history = StatusHistory::new(3);
        assert!(!history.push(entry(0, 2)));
        assert!(history.push(entry(5, 2)));
        assert!(!history.push(entry(10, 3)));
        assert!(history.push(entry(15, 3)));

        let entries = history.newest_first();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].repeat_count, 2);
        assert_eq!(entries[1].repeat_count, 2);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut history = StatusHistory::new(0);
        history.push(entry(0, 1));
        history.push(entry(5, 2));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.len(), 1);
    }
}
