//! PATH routes (service lines).

use std::fmt;

use serde::{Deserialize, Serialize};

/// A PATH service line.
///
/// `Unspecified` stands in for anything the upstream reports that we do not
/// recognise. It never has an external id, so trains carrying it are
/// dropped when the feed is built.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Route {
    #[serde(rename = "ROUTE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "JSQ_33")]
    Jsq33,
    #[serde(rename = "HOB_33")]
    Hob33,
    #[serde(rename = "HOB_WTC")]
    HobWtc,
    #[serde(rename = "NWK_WTC")]
    NwkWtc,
    #[serde(rename = "JSQ_33_HOB")]
    Jsq33Hob,
}

impl Route {
    /// Every known route, excluding `Unspecified`.
    pub const KNOWN: [Route; 5] = [
        Route::Jsq33,
        Route::Hob33,
        Route::HobWtc,
        Route::NwkWtc,
        Route::Jsq33Hob,
    ];

    pub fn api_name(&self) -> &'static str {
        match self {
            Route::Unspecified => "ROUTE_UNSPECIFIED",
            Route::Jsq33 => "JSQ_33",
            Route::Hob33 => "HOB_33",
            Route::HobWtc => "HOB_WTC",
            Route::NwkWtc => "NWK_WTC",
            Route::Jsq33Hob => "JSQ_33_HOB",
        }
    }

    /// Parse an upstream API route name. Unknown names map to `Unspecified`.
    pub fn from_api_name(name: &str) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|r| r.api_name() == name)
            .unwrap_or(Route::Unspecified)
    }

    /// Map a PANYNJ line colour (e.g. `"4D92FB,FF9900"`) to a route.
    ///
    /// Matching is case-insensitive; unknown colours map to `Unspecified`.
    pub fn from_line_color(color: &str) -> Self {
        match color.to_ascii_uppercase().as_str() {
            "4D92FB" => Route::Hob33,
            "4D92FB,FF9900" => Route::Jsq33Hob,
            "65C100" => Route::HobWtc,
            "FF9900" => Route::Jsq33,
            "D93A30" => Route::NwkWtc,
            _ => Route::Unspecified,
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Route({})", self.api_name())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}
