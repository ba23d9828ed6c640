//! Static topology: the station and route id maps loaded once at startup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::domain::{Route, Station};
use crate::source::{Deadline, SourceError, SourceGateway};

/// Errors loading the static topology. All of them stop the process from
/// starting.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    /// The gateway could not provide the maps
    #[error("failed to load topology from source: {0}")]
    Source(#[from] SourceError),

    /// Override file could not be read
    #[error("failed to read topology file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Override file is not valid JSON
    #[error("invalid topology file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown station in topology: {0}")]
    UnknownStation(String),

    #[error("unknown route in topology: {0}")]
    UnknownRoute(String),

    /// A topology without stations would publish nothing, forever
    #[error("topology has no stations")]
    Empty,
}

/// Immutable station and route id maps.
///
/// Stations iterate in their declaration order, which fixes the order of
/// records in every output document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StaticTopology {
    stations: BTreeMap<Station, String>,
    routes: BTreeMap<Route, String>,
}

#[derive(Debug, Deserialize)]
struct TopologyFile {
    stations: BTreeMap<String, String>,
    #[serde(default)]
    routes: BTreeMap<String, String>,
}

impl StaticTopology {
    pub fn new(
        stations: BTreeMap<Station, String>,
        routes: BTreeMap<Route, String>,
    ) -> Result<Self, TopologyError> {
        if stations.is_empty() {
            return Err(TopologyError::Empty);
        }
        Ok(Self { stations, routes })
    }

    /// Ask the gateway for both maps. Routes are fetched first, matching the
    /// order the upstream APIs are usually warmed in.
    pub async fn load(
        gateway: &dyn SourceGateway,
        deadline: &Deadline,
    ) -> Result<Self, TopologyError> {
        let routes = gateway.route_topology(deadline).await?;
        let stations = gateway.station_topology(deadline).await?;
        info!(
            source = gateway.name(),
            stations = stations.len(),
            routes = routes.len(),
            "loaded topology"
        );
        Self::new(stations, routes)
    }

    /// Load the maps from a JSON file of the form
    /// `{"stations": {"HOBOKEN": "26730"}, "routes": {"HOB_33": "859"}}`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TopologyError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| TopologyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let topology = Self::from_json(&json)?;
        info!(path = %path.display(), stations = topology.stations.len(), "loaded topology file");
        Ok(topology)
    }

    pub fn from_json(json: &str) -> Result<Self, TopologyError> {
        let file: TopologyFile = serde_json::from_str(json)?;

        let stations = file
            .stations
            .into_iter()
            .map(|(name, id)| {
                Station::from_api_name(&name)
                    .map(|s| (s, id))
                    .ok_or(TopologyError::UnknownStation(name))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        let routes = file
            .routes
            .into_iter()
            .map(|(name, id)| match Route::from_api_name(&name) {
                Route::Unspecified => Err(TopologyError::UnknownRoute(name)),
                route => Ok((route, id)),
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Self::new(stations, routes)
    }

    /// Stations in iteration order.
    pub fn stations(&self) -> impl Iterator<Item = Station> + '_ {
        self.stations.keys().copied()
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn stop_id(&self, station: Station) -> Option<&str> {
        self.stations.get(&station).map(String::as_str)
    }

    pub fn route_id(&self, route: Route) -> Option<&str> {
        self.routes.get(&route).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Train;
    use async_trait::async_trait;
    use std::io::Write;
    use std::time::Duration;

    struct FixedGateway {
        stations: Result<BTreeMap<Station, String>, u16>,
    }

    #[async_trait]
    impl SourceGateway for FixedGateway {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn station_topology(
            &self,
            _deadline: &Deadline,
        ) -> Result<BTreeMap<Station, String>, SourceError> {
            self.stations.clone().map_err(|status| SourceError::Status {
                status,
                message: "down".into(),
            })
        }

        async fn route_topology(
            &self,
            _deadline: &Deadline,
        ) -> Result<BTreeMap<Route, String>, SourceError> {
            Ok(BTreeMap::from([(Route::Hob33, "859".to_string())]))
        }

        async fn trains_at(
            &self,
            _station: Station,
            _deadline: &Deadline,
        ) -> Result<Vec<Train>, SourceError> {
            Ok(Vec::new())
        }
    }

    fn deadline() -> Deadline {
        Deadline::after(Duration::from_secs(1))
    }

    #[tokio::test]
    async fn load_from_gateway() {
        let gw = FixedGateway {
            stations: Ok(BTreeMap::from([
                (Station::Hoboken, "26730".to_string()),
                (Station::Newark, "26733".to_string()),
            ])),
        };
        let topology = StaticTopology::load(&gw, &deadline()).await.unwrap();
        assert_eq!(
            topology.stations().collect::<Vec<_>>(),
            vec![Station::Newark, Station::Hoboken]
        );
        assert_eq!(topology.stop_id(Station::Hoboken), Some("26730"));
        assert_eq!(topology.route_id(Route::Hob33), Some("859"));
        assert_eq!(topology.route_id(Route::Unspecified), None);
    }

    #[tokio::test]
    async fn gateway_failure_is_fatal() {
        let gw = FixedGateway { stations: Err(500) };
        let err = StaticTopology::load(&gw, &deadline()).await.unwrap_err();
        assert!(matches!(err, TopologyError::Source(_)));
    }

    #[tokio::test]
    async fn empty_topology_is_rejected() {
        let gw = FixedGateway {
            stations: Ok(BTreeMap::new()),
        };
        let err = StaticTopology::load(&gw, &deadline()).await.unwrap_err();
        assert!(matches!(err, TopologyError::Empty));
    }

    #[test]
    fn from_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"stations": {{"HOBOKEN": "h", "WORLD_TRADE_CENTER": "w"}}, "routes": {{"HOB_WTC": "r"}}}}"#
        )
        .unwrap();

        let topology = StaticTopology::from_file(file.path()).unwrap();
        assert_eq!(topology.station_count(), 2);
        assert_eq!(topology.stop_id(Station::WorldTradeCenter), Some("w"));
        assert_eq!(topology.route_id(Route::HobWtc), Some("r"));
    }

    #[test]
    fn from_file_errors() {
        let err = StaticTopology::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, TopologyError::Io { .. }));

        let err = StaticTopology::from_json("{").unwrap_err();
        assert!(matches!(err, TopologyError::Json(_)));

        let err = StaticTopology::from_json(r#"{"stations": {"SECAUCUS": "1"}}"#).unwrap_err();
        assert!(matches!(err, TopologyError::UnknownStation(s) if s == "SECAUCUS"));

        let err =
            StaticTopology::from_json(r#"{"stations": {"NEWARK": "1"}, "routes": {"X": "2"}}"#)
                .unwrap_err();
        assert!(matches!(err, TopologyError::UnknownRoute(_)));
    }
}
