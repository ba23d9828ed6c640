//! Corrections applied to upstream train records.

use crate::domain::{Route, Train};

const VIA_HOBOKEN_SUFFIX: &str = "via hoboken";

/// Fix up a train's route where the upstream is known to mislabel it.
///
/// The upstream reports some Journal Square to 33rd Street trains as the
/// Hoboken variant. Only a line name ending in "via Hoboken" (any case)
/// is trusted to mean the train actually runs through Hoboken.
///
/// ```
/// use path_gtfsrt::domain::{Direction, Route, Train};
/// use path_gtfsrt::source::apply_route_qa;
///
/// let mut train = Train::new(Route::Jsq33Hob, Direction::ToNy, None, None)
///     .with_line_name("Journal Square - 33rd Street");
/// apply_route_qa(&mut train);
/// assert_eq!(train.route, Route::Jsq33);
/// ```
pub fn apply_route_qa(train: &mut Train) {
    if train.route != Route::Jsq33Hob {
        return;
    }
    let via_hoboken = train
        .line_name
        .as_deref()
        .is_some_and(|name| name.to_lowercase().ends_with(VIA_HOBOKEN_SUFFIX));
    if !via_hoboken {
        train.route = Route::Jsq33;
    }
}
