//! Upcoming train records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Route;

/// Direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    #[default]
    #[serde(rename = "DIRECTION_UNSPECIFIED")]
    Unspecified,
    ToNy,
    ToNj,
}

impl Direction {
    /// Parse an upstream direction string (`"TO_NY"`, `"TO_NJ"`).
    ///
    /// Anything else, including the explicit unspecified value, maps to
    /// `Unspecified`.
    pub fn from_api_name(name: &str) -> Self {
        match name {
            "TO_NY" => Direction::ToNy,
            "TO_NJ" => Direction::ToNj,
            _ => Direction::Unspecified,
        }
    }

    /// Parse a PANYNJ destination label (`"ToNY"`, `"ToNJ"`), ignoring case.
    pub fn from_panynj_label(label: &str) -> Self {
        match label.to_ascii_uppercase().as_str() {
            "TONY" => Direction::ToNy,
            "TONJ" => Direction::ToNj,
            _ => Direction::Unspecified,
        }
    }

    /// GTFS static direction id: 1 towards New York, 0 towards New Jersey.
    pub fn gtfs_direction_id(&self) -> Option<u32> {
        match self {
            Direction::ToNy => Some(1),
            Direction::ToNj => Some(0),
            Direction::Unspecified => None,
        }
    }
}

/// One upcoming train at a station.
///
/// Trains are created fresh every cycle and never modified afterwards; a
/// station's list is replaced wholesale on a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Train {
    pub route: Route,
    pub direction: Direction,
    pub projected_arrival: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    /// Display name of the line, e.g. "33rd Street via Hoboken".
    pub line_name: Option<String>,
}

impl Train {
    pub fn new(
        route: Route,
        direction: Direction,
        projected_arrival: Option<DateTime<Utc>>,
        last_updated: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            route,
            direction,
            projected_arrival,
            last_updated,
            line_name: None,
        }
    }

    pub fn with_line_name(mut self, line_name: impl Into<String>) -> Self {
        self.line_name = Some(line_name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_from_api_name() {
        assert_eq!(Direction::from_api_name("TO_NY"), Direction::ToNy);
        assert_eq!(Direction::from_api_name("TO_NJ"), Direction::ToNj);
        assert_eq!(
            Direction::from_api_name("DIRECTION_UNSPECIFIED"),
            Direction::Unspecified
        );
        assert_eq!(Direction::from_api_name("random"), Direction::Unspecified);
    }

    #[test]
    fn direction_from_panynj_label() {
        assert_eq!(Direction::from_panynj_label("ToNY"), Direction::ToNy);
        assert_eq!(Direction::from_panynj_label("tonj"), Direction::ToNj);
        assert_eq!(Direction::from_panynj_label("To NY"), Direction::Unspecified);
    }

    #[test]
    fn gtfs_direction_ids() {
        assert_eq!(Direction::ToNy.gtfs_direction_id(), Some(1));
        assert_eq!(Direction::ToNj.gtfs_direction_id(), Some(0));
        assert_eq!(Direction::Unspecified.gtfs_direction_id(), None);
    }

    #[test]
    fn builder_sets_line_name() {
        let train = Train::new(Route::Hob33, Direction::ToNy, None, None)
            .with_line_name("33rd Street");
        assert_eq!(train.line_name.as_deref(), Some("33rd Street"));
    }
}
