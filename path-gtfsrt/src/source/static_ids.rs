//! GTFS static identifiers for the PATH network.
//!
//! Taken from the PATH GTFS static feed published by the Port Authority.
//! The PANYNJ upstream has no topology endpoint, so these tables stand in
//! for one.

use std::collections::BTreeMap;

use crate::domain::{Route, Station};

fn stop_id(station: Station) -> &'static str {
    match station {
        Station::FourteenthStreet => "26722",
        Station::TwentyThirdStreet => "26723",
        Station::ThirtyThirdStreet => "26724",
        Station::NinthStreet => "26725",
        Station::ChristopherStreet => "26726",
        Station::ExchangePlace => "26727",
        Station::GroveStreet => "26728",
        Station::Harrison => "26729",
        Station::Hoboken => "26730",
        Station::JournalSquare => "26731",
        Station::Newport => "26732",
        Station::Newark => "26733",
        Station::WorldTradeCenter => "26734",
    }
}

fn route_id(route: Route) -> Option<&'static str> {
    match route {
        Route::Hob33 => Some("859"),
        Route::HobWtc => Some("860"),
        Route::Jsq33 => Some("861"),
        Route::NwkWtc => Some("862"),
        Route::Jsq33Hob => Some("1024"),
        Route::Unspecified => None,
    }
}

/// Every station mapped to its GTFS stop id.
pub fn gtfs_stop_ids() -> BTreeMap<Station, String> {
    Station::ALL
        .into_iter()
        .map(|s| (s, stop_id(s).to_string()))
        .collect()
}

/// Every known route mapped to its GTFS route id.
pub fn gtfs_route_ids() -> BTreeMap<Route, String> {
    Route::KNOWN
        .into_iter()
        .filter_map(|r| route_id(r).map(|id| (r, id.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_station_has_a_distinct_stop() {
        let stops = gtfs_stop_ids();
        assert_eq!(stops.len(), 13);
        let unique: HashSet<_> = stops.values().collect();
        assert_eq!(unique.len(), 13);
        assert_eq!(stops[&Station::Hoboken], "26730");
    }

    #[test]
    fn unspecified_route_is_absent() {
        let routes = gtfs_route_ids();
        assert_eq!(routes.len(), 5);
        assert!(!routes.contains_key(&Route::Unspecified));
        assert_eq!(routes[&Route::Jsq33Hob], "1024");
    }
}
