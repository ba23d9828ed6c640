//! Domain types for the PATH realtime feed.
//!
//! Stations and routes are closed enumerations of the PATH network. Trains
//! are immutable records produced fresh each update cycle, and a
//! [`Snapshot`] holds the latest list per station.

mod route;
mod snapshot;
mod station;
mod train;

pub use route::Route;
pub use snapshot::Snapshot;
pub use station::Station;
pub use train::{Direction, Train};
