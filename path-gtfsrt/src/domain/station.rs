//! PATH station identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A PATH station as known to the upstream source APIs.
///
/// Stations are a closed set. The declaration order is the order in which
/// stations are iterated everywhere in the crate, so documents and status
/// tables built from the same data always come out in the same order.
///
/// # Examples
///
/// ```
/// use path_gtfsrt::domain::Station;
///
/// let hoboken = Station::from_api_name("HOBOKEN").unwrap();
/// assert_eq!(hoboken, Station::Hoboken);
/// assert_eq!(hoboken.api_name(), "HOBOKEN");
///
/// // PANYNJ uses short codes for the same stations
/// assert_eq!(Station::from_panynj_code("HOB"), Some(Station::Hoboken));
///
/// // Unknown names are rejected
/// assert!(Station::from_api_name("SECAUCUS").is_none());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Station {
    Newark,
    Harrison,
    JournalSquare,
    GroveStreet,
    ExchangePlace,
    WorldTradeCenter,
    Newport,
    Hoboken,
    ChristopherStreet,
    NinthStreet,
    FourteenthStreet,
    TwentyThirdStreet,
    ThirtyThirdStreet,
}

impl Station {
    /// Every station, in iteration order.
    pub const ALL: [Station; 13] = [
        Station::Newark,
        Station::Harrison,
        Station::JournalSquare,
        Station::GroveStreet,
        Station::ExchangePlace,
        Station::WorldTradeCenter,
        Station::Newport,
        Station::Hoboken,
        Station::ChristopherStreet,
        Station::NinthStreet,
        Station::FourteenthStreet,
        Station::TwentyThirdStreet,
        Station::ThirtyThirdStreet,
    ];

    /// The upstream API name, e.g. `"JOURNAL_SQUARE"`.
    pub fn api_name(&self) -> &'static str {
        match self {
            Station::Newark => "NEWARK",
            Station::Harrison => "HARRISON",
            Station::JournalSquare => "JOURNAL_SQUARE",
            Station::GroveStreet => "GROVE_STREET",
            Station::ExchangePlace => "EXCHANGE_PLACE",
            Station::WorldTradeCenter => "WORLD_TRADE_CENTER",
            Station::Newport => "NEWPORT",
            Station::Hoboken => "HOBOKEN",
            Station::ChristopherStreet => "CHRISTOPHER_STREET",
            Station::NinthStreet => "NINTH_STREET",
            Station::FourteenthStreet => "FOURTEENTH_STREET",
            Station::TwentyThirdStreet => "TWENTY_THIRD_STREET",
            Station::ThirtyThirdStreet => "THIRTY_THIRD_STREET",
        }
    }

    /// Parse an upstream API name. Matching is exact.
    pub fn from_api_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.api_name() == name)
    }

    /// The three character code the PANYNJ ridepath feed uses.
    pub fn panynj_code(&self) -> &'static str {
        match self {
            Station::Newark => "NWK",
            Station::Harrison => "HAR",
            Station::JournalSquare => "JSQ",
            Station::GroveStreet => "GRV",
            Station::ExchangePlace => "EXP",
            Station::WorldTradeCenter => "WTC",
            Station::Newport => "NEW",
            Station::Hoboken => "HOB",
            Station::ChristopherStreet => "CHR",
            Station::NinthStreet => "09S",
            Station::FourteenthStreet => "14S",
            Station::TwentyThirdStreet => "23S",
            Station::ThirtyThirdStreet => "33S",
        }
    }

    /// Parse a PANYNJ station code.
    pub fn from_panynj_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.panynj_code() == code)
    }

    /// Short human readable name used on the status page.
    pub fn display_name(&self) -> &'static str {
        match self {
            Station::Newark => "Newark",
            Station::Harrison => "Harrison",
            Station::JournalSquare => "Journal Sq",
            Station::GroveStreet => "Grove St",
            Station::ExchangePlace => "Exchange Pl",
            Station::WorldTradeCenter => "WTC",
            Station::Newport => "Newport",
            Station::Hoboken => "Hoboken",
            Station::ChristopherStreet => "Christopher St",
            Station::NinthStreet => "9th St",
            Station::FourteenthStreet => "14th St",
            Station::TwentyThirdStreet => "23rd St",
            Station::ThirtyThirdStreet => "33rd St",
        }
    }
}

impl fmt::Debug for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Station({})", self.api_name())
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}
