//! Haversine great-circle distance.

use crate::Coordinate;

/// Earth's mean radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Earth's mean radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates in kilometers.
///
/// ```
/// use truckstop_geo::{haversine_distance, Coordinate};
///
/// let stockholm = Coordinate::new(59.3293, 18.0686);
/// let gothenburg = Coordinate::new(57.7089, 11.9746);
///
/// let distance = haversine_distance(&stockholm, &gothenburg);
/// assert!((distance - 398.0).abs() < 5.0);
/// ```
#[inline]
pub fn haversine_distance(from: &Coordinate, to: &Coordinate) -> f64 {
    central_angle(from, to) * EARTH_RADIUS_KM
}

/// Great-circle distance between two coordinates in meters.
///
/// This is the default spherical-distance utility used when a maps backend
/// does not bring its own geometry library.
#[inline]
pub fn haversine_distance_meters(from: &Coordinate, to: &Coordinate) -> f64 {
    central_angle(from, to) * EARTH_RADIUS_M
}

#[inline]
fn central_angle(from: &Coordinate, to: &Coordinate) -> f64 {
    let (lat1, lon1) = from.to_radians();
    let (lat2, lon2) = to.to_radians();

    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}
