//! History entries and the rule for coalescing them.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::outcome::{CycleOutcome, StationOutcome};
use crate::domain::Station;

/// Longest span a single merged entry may cover, in seconds.
pub const MAX_MERGED_SPAN_SECS: i64 = 60 * 60;

/// Running statistics over successful-update latencies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyStats {
    pub mean_secs: f64,
    pub max_secs: f64,
    pub samples: u32,
}

impl LatencyStats {
    pub fn single(latency: Duration) -> Self {
        let secs = latency.num_milliseconds() as f64 / 1000.0;
        Self {
            mean_secs: secs,
            max_secs: secs,
            samples: 1,
        }
    }

    fn fold(self, other: LatencyStats) -> Self {
        let samples = self.samples + other.samples;
        Self {
            mean_secs: (self.mean_secs * f64::from(self.samples)
                + other.mean_secs * f64::from(other.samples))
                / f64::from(samples),
            max_secs: self.max_secs.max(other.max_secs),
            samples,
        }
    }
}

/// One row of status history, covering one or more consecutive cycles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEntry {
    pub first_occurred: DateTime<Utc>,
    pub last_occurred: DateTime<Utc>,
    pub repeat_count: u32,
    pub stations: BTreeMap<Station, StationOutcome>,
    pub builder_error: Option<String>,
    /// `None` until a successful cycle has been seen.
    pub latency: Option<LatencyStats>,
    pub sla_breached: bool,
}

impl StatusEntry {
    pub fn new(outcome: CycleOutcome, latency: Option<Duration>, sla_breached: bool) -> Self {
        Self {
            first_occurred: outcome.completed_at,
            last_occurred: outcome.completed_at,
            repeat_count: 1,
            stations: outcome.stations,
            builder_error: outcome.builder_error,
            latency: latency.map(LatencyStats::single),
            sla_breached,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.builder_error.is_some() || self.stations.values().any(StationOutcome::is_failed)
    }

    /// Error-free and within SLA.
    pub fn is_boring(&self) -> bool {
        !self.has_errors() && !self.sla_breached
    }

    /// Whether `next` may be folded into this entry.
    ///
    /// Both must be boring, their per-station train counts must agree, and
    /// the combined entry may not span more than an hour.
    pub fn can_merge(&self, next: &StatusEntry) -> bool {
        self.is_boring()
            && next.is_boring()
            && self.same_counts(next)
            && next.last_occurred.signed_duration_since(self.first_occurred)
                <= Duration::seconds(MAX_MERGED_SPAN_SECS)
    }

    fn same_counts(&self, other: &StatusEntry) -> bool {
        self.stations.len() == other.stations.len()
            && self.stations.iter().all(|(station, outcome)| {
                other
                    .stations
                    .get(station)
                    .is_some_and(|o| o.train_count() == outcome.train_count())
            })
    }

    /// Fold `next` into this entry. Callers check [`Self::can_merge`] first.
    pub fn merge(&mut self, next: StatusEntry) {
        self.last_occurred = next.last_occurred;
        self.repeat_count += next.repeat_count;
        self.latency = match (self.latency, next.latency) {
            (Some(a), Some(b)) => Some(a.fold(b)),
            (a, b) => a.or(b),
        };
        // Direction split may drift while totals stay put; keep the latest
        self.stations = next.stations;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn fetched(n: usize) -> StationOutcome {
        StationOutcome::Fetched {
            trains: n,
            to_ny: n,
            to_nj: 0,
        }
    }

    fn entry(secs: i64, hoboken: StationOutcome, latency: Option<i64>) -> StatusEntry {
        StatusEntry::new(
            CycleOutcome {
                completed_at: at(secs),
                stations: BTreeMap::from([(Station::Hoboken, hoboken)]),
                builder_error: None,
            },
            latency.map(Duration::seconds),
            false,
        )
    }

    #[test]
    fn merges_identical_counts() {
        let mut a = entry(0, fetched(3), None);
        let b = entry(5, fetched(3), Some(5));
        assert!(a.can_merge(&b));

        a.merge(b);
        assert_eq!(a.repeat_count, 2);
        assert_eq!(a.first_occurred, at(0));
        assert_eq!(a.last_occurred, at(5));
        assert_eq!(a.latency.unwrap().samples, 1);
    }

    #[test]
    fn different_counts_do_not_merge() {
        let a = entry(0, fetched(3), Some(5));
        let b = entry(5, fetched(4), Some(5));
        assert!(!a.can_merge(&b));
    }

    #[test]
    fn errors_and_breaches_do_not_merge() {
        let failed = StationOutcome::Failed {
            error: "boom".into(),
        };
        let a = entry(0, failed.clone(), Some(5));
        let b = entry(5, failed, Some(5));
        assert!(!a.can_merge(&b));

        let ok = entry(0, fetched(1), Some(5));
        let mut breached = entry(5, fetched(1), Some(30));
        breached.sla_breached = true;
        assert!(!ok.can_merge(&breached));

        let mut builder_failed = entry(5, fetched(1), Some(5));
        builder_failed.builder_error = Some("encode".into());
        assert!(!ok.can_merge(&builder_failed));
    }

    #[test]
    fn span_limited_to_an_hour() {
        let a = entry(0, fetched(1), Some(5));
        assert!(a.can_merge(&entry(3600, fetched(1), Some(5))));
        assert!(!a.can_merge(&entry(3601, fetched(1), Some(5))));
    }

    #[test]
    fn latency_statistics_fold() {
        let mut a = entry(0, fetched(1), Some(4));
        a.merge(entry(5, fetched(1), Some(6)));
        a.merge(entry(10, fetched(1), Some(8)));

        let stats = a.latency.unwrap();
        assert_eq!(stats.samples, 3);
        assert!((stats.mean_secs - 6.0).abs() < 1e-9);
        assert!((stats.max_secs - 8.0).abs() < 1e-9);
        assert_eq!(a.repeat_count, 3);
    }
}
