//! Rolling history of update cycle outcomes.
//!
//! [`StatusMonitor::record`] only enqueues. A single background worker
//! drains the queue, works out latency and SLA state, and merges or appends
//! into a fixed-capacity [`StatusHistory`]. Being the only writer, the
//! worker needs no locking for its own bookkeeping; the history itself sits
//! behind a reader/writer lock so HTTP handlers can read it at any time.
//!
//! A long healthy run collapses into a handful of entries, while every
//! error, SLA breach, or change in per-station train counts gets its own
//! row.

mod entry;
mod history;
mod outcome;

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

pub use entry::{LatencyStats, MAX_MERGED_SPAN_SECS, StatusEntry};
pub use history::StatusHistory;
pub use outcome::{CycleOutcome, StationOutcome};

/// Latency above this many update periods is an SLA breach.
pub const SLA_PERIOD_MULTIPLE: i32 = 3;

enum Command {
    Record(CycleOutcome),
    Flush(oneshot::Sender<()>),
}

/// Tracks time since the last fully successful cycle.
#[derive(Debug)]
struct LatencyTracker {
    update_period: Duration,
    last_success: Option<DateTime<Utc>>,
}

impl LatencyTracker {
    fn entry_for(&mut self, outcome: CycleOutcome) -> StatusEntry {
        let latency = self
            .last_success
            .map(|t| outcome.completed_at.signed_duration_since(t));
        let sla_breached = latency.is_some_and(|l| l > self.update_period * SLA_PERIOD_MULTIPLE);
        if outcome.is_clean() {
            self.last_success = Some(outcome.completed_at);
        }
        if sla_breached {
            warn!(latency = ?latency, "successful update latency above SLA");
        }
        StatusEntry::new(outcome, latency, sla_breached)
    }
}

/// Handle to the status worker. Clones share the same worker and history.
#[derive(Clone)]
pub struct StatusMonitor {
    tx: mpsc::UnboundedSender<Command>,
    history: Arc<RwLock<StatusHistory>>,
}

impl StatusMonitor {
    /// Spawn the worker on the current tokio runtime.
    ///
    /// `update_period` is the feed's configured period, used for the SLA
    /// threshold.
    pub fn spawn(capacity: usize, update_period: std::time::Duration) -> Self {
        let history = Arc::new(RwLock::new(StatusHistory::new(capacity)));
        let (tx, rx) = mpsc::unbounded_channel();
        let tracker = LatencyTracker {
            update_period: Duration::from_std(update_period).unwrap_or(Duration::MAX),
            last_success: None,
        };
        tokio::spawn(run_worker(rx, tracker, history.clone()));
        Self { tx, history }
    }

    /// Queue an outcome. Never waits on the worker.
    pub fn record(&self, outcome: CycleOutcome) {
        if self.tx.send(Command::Record(outcome)).is_err() {
            warn!("status worker has stopped, dropping outcome");
        }
    }

    /// Wait until everything recorded so far has been applied.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(Command::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    /// Copy of the history, newest first.
    pub fn history(&self) -> Vec<StatusEntry> {
        self.history
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .newest_first()
    }

    pub fn history_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.history())
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<Command>,
    mut tracker: LatencyTracker,
    history: Arc<RwLock<StatusHistory>>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Record(outcome) => {
                let entry = tracker.entry_for(outcome);
                let merged = history
                    .write()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(entry);
                debug!(merged, "status recorded");
            }
            Command::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("status worker stopped");
}
