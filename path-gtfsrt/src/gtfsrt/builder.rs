//! Snapshot to GTFS Realtime transcoder.

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use prost::Message;
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::proto::{
    FeedEntity, FeedHeader, FeedMessage, GTFS_REALTIME_VERSION, Incrementality, StopTimeEvent,
    StopTimeUpdate, TripDescriptor, TripUpdate,
};
use crate::domain::{Snapshot, Train};
use crate::topology::StaticTopology;

/// A document could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Record identity could not be serialized for hashing
    #[error("failed to serialize record identity: {0}")]
    Identity(#[from] serde_json::Error),

    /// Protobuf encoding failed
    #[error("failed to encode feed message: {0}")]
    Encode(#[from] prost::EncodeError),
}

/// Everything that makes a record distinct. Its hash is the record id.
#[derive(Serialize)]
struct RecordIdentity<'a> {
    route_id: &'a str,
    direction_id: u32,
    stop_id: &'a str,
    arrival: i64,
    last_updated: u64,
}

impl RecordIdentity<'_> {
    fn id(&self) -> Result<String, RenderError> {
        let json = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&json)))
    }
}

/// Build the document for a snapshot.
///
/// One entity is emitted per train whose route has an id, whose direction is
/// known, and which has both an arrival and a last-updated time. Others are
/// dropped silently. Entities come out in topology station order, then in
/// the order the upstream listed the trains.
///
/// ```
/// use std::collections::BTreeMap;
/// use chrono::{TimeZone, Utc};
/// use path_gtfsrt::domain::{Direction, Route, Snapshot, Station, Train};
/// use path_gtfsrt::gtfsrt;
/// use path_gtfsrt::topology::StaticTopology;
///
/// let topology = StaticTopology::new(
///     BTreeMap::from([(Station::Hoboken, "26730".to_string())]),
///     BTreeMap::from([(Route::Hob33, "859".to_string())]),
/// )
/// .unwrap();
/// let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
///
/// let mut snapshot = Snapshot::default();
/// snapshot.replace(
///     Station::Hoboken,
///     vec![Train::new(Route::Hob33, Direction::ToNy, Some(now), Some(now))],
/// );
///
/// let msg = gtfsrt::build(&topology, &snapshot, now).unwrap();
/// assert_eq!(msg.entity.len(), 1);
/// assert_eq!(msg.header.timestamp, Some(now.timestamp() as u64));
/// ```
pub fn build(
    topology: &StaticTopology,
    snapshot: &Snapshot,
    now: DateTime<Utc>,
) -> Result<FeedMessage, RenderError> {
    let mut entity = Vec::new();

    for station in topology.stations() {
        let Some(stop_id) = topology.stop_id(station) else {
            continue;
        };
        for train in snapshot.trains_at(station) {
            if let Some(e) = entity_for(topology, stop_id, train)? {
                entity.push(e);
            }
        }
    }

    Ok(FeedMessage {
        header: FeedHeader {
            gtfs_realtime_version: GTFS_REALTIME_VERSION.to_string(),
            incrementality: Some(Incrementality::FullDataset as i32),
            timestamp: u64::try_from(now.timestamp()).ok(),
        },
        entity,
    })
}

fn entity_for(
    topology: &StaticTopology,
    stop_id: &str,
    train: &Train,
) -> Result<Option<FeedEntity>, RenderError> {
    let Some(route_id) = topology.route_id(train.route) else {
        return Ok(None);
    };
    let Some(direction_id) = train.direction.gtfs_direction_id() else {
        return Ok(None);
    };
    let (Some(arrival), Some(last_updated)) = (train.projected_arrival, train.last_updated) else {
        return Ok(None);
    };
    let arrival = arrival.timestamp();
    let Ok(last_updated) = u64::try_from(last_updated.timestamp()) else {
        return Ok(None);
    };

    let id = RecordIdentity {
        route_id,
        direction_id,
        stop_id,
        arrival,
        last_updated,
    }
    .id()?;

    Ok(Some(FeedEntity {
        id: id.clone(),
        trip_update: Some(TripUpdate {
            trip: TripDescriptor {
                trip_id: Some(id),
                route_id: Some(route_id.to_string()),
                direction_id: Some(direction_id),
            },
            stop_time_update: vec![StopTimeUpdate {
                arrival: Some(StopTimeEvent {
                    time: Some(arrival),
                }),
                stop_id: Some(stop_id.to_string()),
            }],
            timestamp: Some(last_updated),
        }),
    }))
}

/// Serialize a document to protobuf bytes.
pub fn render(msg: &FeedMessage) -> Result<Bytes, RenderError> {
    let mut buf = BytesMut::with_capacity(msg.encoded_len());
    msg.encode(&mut buf)?;
    Ok(buf.freeze())
}

/// Parse protobuf bytes back into a document.
pub fn decode(bytes: &[u8]) -> Result<FeedMessage, prost::DecodeError> {
    FeedMessage::decode(bytes)
}
