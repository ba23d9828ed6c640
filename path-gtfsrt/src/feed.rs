//! The periodic feed driver.
//!
//! [`FeedBuilder::start`] loads the topology, runs one update cycle
//! synchronously and only then returns, so a started [`Feed`] always has a
//! document to serve. After that a background task repeats the cycle every
//! update period until the cancellation token fires.
//!
//! Each cycle builds a fresh document and swaps it in atomically; readers
//! holding the previous one are unaffected. If rendering fails the previous
//! document stays published.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::aggregator::Aggregator;
use crate::clock::Clock;
use crate::config::FeedConfig;
use crate::domain::Snapshot;
use crate::gtfsrt::{self, FeedMessage, RenderError};
use crate::monitor::{CycleOutcome, StationOutcome, StatusMonitor};
use crate::source::{Deadline, SourceGateway};
use crate::topology::{StaticTopology, TopologyError};

/// Startup failures. Once a feed has started it never fails as a whole.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// The first cycle must be clean. Its document is never published, so
    /// the feed never starts out serving a partial one
    #[error("initial update failed: {}", .errors.join("; "))]
    InitialCycle { errors: Vec<String> },
}

/// Everything a subscriber learns about a finished cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    /// The document built this cycle, absent if rendering failed.
    pub message: Option<Arc<FeedMessage>>,
}

pub type UpdateCallback = Arc<dyn Fn(&CycleReport) + Send + Sync>;

/// Serializes a built document.
type Renderer = Arc<dyn Fn(&FeedMessage) -> Result<Bytes, RenderError> + Send + Sync>;

/// A published document.
#[derive(Debug)]
pub struct Published {
    pub bytes: Bytes,
    pub message: Arc<FeedMessage>,
    pub published_at: DateTime<Utc>,
}

/// Read side of the feed. Cheap to clone; usable before the feed starts.
#[derive(Clone, Default)]
pub struct FeedReader {
    published: Arc<ArcSwapOption<Published>>,
}

impl FeedReader {
    /// Latest serialized document, or `None` before the first publish.
    pub fn get(&self) -> Option<Bytes> {
        self.published.load().as_ref().map(|p| p.bytes.clone())
    }

    pub fn latest(&self) -> Option<Arc<Published>> {
        self.published.load_full()
    }

    fn publish(&self, published: Published) {
        self.published.store(Some(Arc::new(published)));
    }
}

/// Configures and starts a [`Feed`].
pub struct FeedBuilder {
    config: FeedConfig,
    gateway: Arc<dyn SourceGateway>,
    clock: Arc<dyn Clock>,
    monitor: Option<StatusMonitor>,
    callbacks: Vec<UpdateCallback>,
    cancel: CancellationToken,
    reader: FeedReader,
    renderer: Renderer,
}

impl FeedBuilder {
    pub fn new(config: FeedConfig, gateway: Arc<dyn SourceGateway>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            gateway,
            clock,
            monitor: None,
            callbacks: Vec::new(),
            cancel: CancellationToken::new(),
            reader: FeedReader::default(),
            renderer: Arc::new(gtfsrt::render),
        }
    }

    #[cfg(test)]
    fn with_renderer(
        mut self,
        renderer: impl Fn(&FeedMessage) -> Result<Bytes, RenderError> + Send + Sync + 'static,
    ) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Record every cycle outcome in a status monitor.
    pub fn with_monitor(mut self, monitor: StatusMonitor) -> Self {
        self.monitor = Some(monitor);
        self
    }

    /// Run `callback` after every cycle, including the initial one.
    pub fn on_update(mut self, callback: impl Fn(&CycleReport) + Send + Sync + 'static) -> Self {
        self.callbacks.push(Arc::new(callback));
        self
    }

    /// Stop the driver when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// A reader that will see documents once the feed starts.
    pub fn reader(&self) -> FeedReader {
        self.reader.clone()
    }

    pub async fn start(self) -> Result<Feed, FeedError> {
        let topology = match &self.config.topology_path {
            Some(path) => StaticTopology::from_file(path)?,
            None => {
                let deadline = Deadline::new(self.config.timeout, self.cancel.child_token());
                StaticTopology::load(self.gateway.as_ref(), &deadline).await?
            }
        };

        let mut driver = Driver {
            aggregator: Aggregator::new(self.gateway, self.config.timeout),
            snapshot: Snapshot::empty_for(topology.stations()),
            topology,
            clock: self.clock,
            reader: self.reader.clone(),
            monitor: self.monitor,
            callbacks: self.callbacks,
            renderer: self.renderer,
            started: false,
        };

        let first = driver.run_once().await;
        if !first.outcome.is_clean() {
            return Err(FeedError::InitialCycle {
                errors: describe_errors(&first.outcome),
            });
        }
        driver.started = true;

        let cancel = self.cancel.clone();
        let period = self.config.update_period;
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await; // First tick is immediate, skip it
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("feed driver stopped");
                        return;
                    }
                    _ = interval.tick() => {
                        driver.run_once().await;
                    }
                }
            }
        });

        info!(period = ?period, "feed started");
        Ok(Feed {
            reader: self.reader,
            cancel: self.cancel,
            task,
        })
    }
}

fn describe_errors(outcome: &CycleOutcome) -> Vec<String> {
    let mut errors: Vec<String> = outcome
        .stations
        .iter()
        .filter_map(|(station, o)| match o {
            StationOutcome::Failed { error } => Some(format!("{station}: {error}")),
            StationOutcome::Fetched { .. } => None,
        })
        .collect();
    if let Some(e) = &outcome.builder_error {
        errors.push(format!("builder: {e}"));
    }
    errors
}

/// A running feed.
pub struct Feed {
    reader: FeedReader,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Feed {
    /// Latest serialized document.
    pub fn get(&self) -> Option<Bytes> {
        self.reader.get()
    }

    pub fn reader(&self) -> FeedReader {
        self.reader.clone()
    }

    /// Stop the driver and wait for it to exit. A cycle already in progress
    /// runs to completion first.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "feed driver panicked");
        }
    }
}

/// Owns the snapshot and everything needed to run a cycle.
struct Driver {
    aggregator: Aggregator,
    topology: StaticTopology,
    snapshot: Snapshot,
    clock: Arc<dyn Clock>,
    reader: FeedReader,
    monitor: Option<StatusMonitor>,
    callbacks: Vec<UpdateCallback>,
    renderer: Renderer,
    /// Until set, only clean cycles publish
    started: bool,
}

impl Driver {
    async fn run_once(&mut self) -> CycleReport {
        info!("updating GTFS realtime feed");
        let fetch = self.aggregator.run_cycle(&self.topology, &self.snapshot).await;
        let now = self.clock.now();

        let rendered = gtfsrt::build(&self.topology, &fetch.snapshot, now)
            .and_then(|msg| (self.renderer)(&msg).map(|bytes| (Arc::new(msg), bytes)));
        let (rendered, builder_error) = match rendered {
            Ok(doc) => (Some(doc), None),
            Err(e) => {
                error!(error = %e, "failed to render feed, keeping previous document");
                (None, Some(e))
            }
        };

        let outcome = CycleOutcome::from_fetch(now, &self.topology, &fetch, builder_error.as_ref());
        self.snapshot = fetch.snapshot;

        let message = rendered.map(|(msg, bytes)| {
            if self.started || outcome.is_clean() {
                self.reader.publish(Published {
                    bytes,
                    message: msg.clone(),
                    published_at: now,
                });
            }
            msg
        });

        info!(
            errors = outcome.error_count(),
            entities = message.as_ref().map_or(0, |m| m.entity.len()),
            "finished updating"
        );

        let report = CycleReport { outcome, message };
        if let Some(monitor) = &self.monitor {
            monitor.record(report.outcome.clone());
        }
        for callback in &self.callbacks {
            callback(&report);
        }
        report
    }
}
