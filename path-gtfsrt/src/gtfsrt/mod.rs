//! GTFS Realtime output: message types and the transcoder that builds them
//! from a snapshot.

mod builder;
mod proto;

pub use builder::{RenderError, build, decode, render};
pub use proto::{
    FeedEntity, FeedHeader, FeedMessage, GTFS_REALTIME_VERSION, Incrementality, StopTimeEvent,
    StopTimeUpdate, TripDescriptor, TripUpdate,
};
