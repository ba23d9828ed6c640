//! Askama templates for the status pages.

use askama::Template;
use chrono::{DateTime, Utc};

use crate::domain::Station;
use crate::feed::Published;
use crate::monitor::{StationOutcome, StatusEntry};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

// ============================================================================
// Page Templates
// ============================================================================

/// Landing page.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub published: Option<PublishedView>,
}

/// Status history table.
#[derive(Template)]
#[template(path = "status.html")]
pub struct StatusTemplate {
    pub rows: Vec<StatusRowView>,
}

// ============================================================================
// View Models
// ============================================================================

/// Summary of the currently published document.
#[derive(Debug, Clone)]
pub struct PublishedView {
    pub published_at: String,
    pub entity_count: usize,
    pub size_bytes: usize,
}

impl PublishedView {
    pub fn from_published(published: &Published) -> Self {
        Self {
            published_at: format_time(published.published_at),
            entity_count: published.message.entity.len(),
            size_bytes: published.bytes.len(),
        }
    }
}

/// One row of the status table.
#[derive(Debug, Clone)]
pub struct StatusRowView {
    pub first_occurred: String,
    pub last_occurred: String,
    pub repeat_count: u32,
    pub healthy: bool,
    pub sla_breached: bool,
    /// "mean / max" in seconds, or "n/a" before the first success
    pub latency: String,
    pub stations: Vec<StationCellView>,
    pub builder_error: String,
}

impl StatusRowView {
    pub fn from_entry(entry: &StatusEntry) -> Self {
        let latency = match &entry.latency {
            Some(stats) => format!("{:.1}s / {:.1}s", stats.mean_secs, stats.max_secs),
            None => "n/a".to_string(),
        };

        Self {
            first_occurred: format_time(entry.first_occurred),
            last_occurred: format_time(entry.last_occurred),
            repeat_count: entry.repeat_count,
            healthy: !entry.has_errors(),
            sla_breached: entry.sla_breached,
            latency,
            stations: entry
                .stations
                .iter()
                .map(|(station, outcome)| StationCellView::new(*station, outcome))
                .collect(),
            builder_error: entry.builder_error.clone().unwrap_or_default(),
        }
    }

    /// Whether the row covers more than one cycle.
    pub fn is_merged(&self) -> bool {
        self.repeat_count > 1
    }
}

/// A station's result within one row.
#[derive(Debug, Clone)]
pub struct StationCellView {
    pub name: String,
    pub failed: bool,
    /// Train counts, or the error text for a failed station
    pub detail: String,
}

impl StationCellView {
    pub fn new(station: Station, outcome: &StationOutcome) -> Self {
        let (failed, detail) = match outcome {
            StationOutcome::Fetched { to_ny, to_nj, .. } => {
                (false, format!("{to_ny} NY / {to_nj} NJ"))
            }
            StationOutcome::Failed { error } => (true, error.clone()),
        };
        Self {
            name: station.display_name().to_string(),
            failed,
            detail,
        }
    }
}

fn format_time(t: DateTime<Utc>) -> String {
    t.format(TIME_FORMAT).to_string()
}
