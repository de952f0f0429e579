//! Human-readable distance labels.

use crate::Coordinate;

/// Label used when either end of a distance is unknown.
pub const UNKNOWN_DISTANCE: &str = "Unknown";

/// Formats a distance in meters as kilometres with one decimal place.
///
/// ```
/// assert_eq!(truckstop_geo::format_kilometers(2_340.0), "2.3 km");
/// ```
pub fn format_kilometers(meters: f64) -> String {
    format!("{:.1} km", meters / 1000.0)
}

/// Builds the distance label between two optional coordinates.
///
/// `measure` returns meters; the label falls back to [`UNKNOWN_DISTANCE`]
/// exactly when either coordinate is missing.
pub fn distance_label<F>(from: Option<&Coordinate>, to: Option<&Coordinate>, measure: F) -> String
where
    F: FnOnce(&Coordinate, &Coordinate) -> f64,
{
    match (from, to) {
        (Some(from), Some(to)) => format_kilometers(measure(from, to)),
        _ => UNKNOWN_DISTANCE.to_string(),
    }
}
