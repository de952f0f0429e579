//! Geographic primitives for the nearby-place finder.
//!
//! This crate provides:
//! - [`Coordinate`], an immutable latitude/longitude pair
//! - Haversine great-circle distance
//! - Kilometre distance labels with an `"Unknown"` fallback
//!
//! # Example
//!
//! ```
//! use truckstop_geo::{distance_label, haversine_distance_meters, Coordinate};
//!
//! let depot = Coordinate::new(59.3293, 18.0686); // Stockholm
//! let station = Coordinate::new(59.3326, 18.0649);
//!
//! let label = distance_label(Some(&depot), Some(&station), haversine_distance_meters);
//! assert_eq!(label, "0.4 km");
//! ```

mod error;
mod format;
mod haversine;

pub use error::{GeoError, GeoErrorCode, Result};
pub use format::{distance_label, format_kilometers, UNKNOWN_DISTANCE};
pub use haversine::{haversine_distance, haversine_distance_meters, EARTH_RADIUS_KM, EARTH_RADIUS_M};

/// A geographic coordinate with latitude and longitude.
///
/// Captured once by the location provider and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a new coordinate without range checks.
    #[inline]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Creates a coordinate, rejecting values outside the valid degree ranges.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(latitude.is_finite() && longitude.is_finite()) {
            return Err(GeoError::NotFinite { latitude, longitude });
        }
        let coord = Self::new(latitude, longitude);
        if coord.is_valid() {
            Ok(coord)
        } else {
            Err(GeoError::OutOfRange { latitude, longitude })
        }
    }

    /// Returns true if the coordinate has valid values.
    #[inline]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Converts degrees to radians for internal calculations.
    #[inline]
    pub(crate) fn to_radians(self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_creation() {
        let coord = Coordinate::new(59.3293, 18.0686);
        assert_eq!(coord.latitude, 59.3293);
        assert_eq!(coord.longitude, 18.0686);
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(0.0, 0.0).is_valid());
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 181.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_try_new_rejects_out_of_range() {
        assert!(Coordinate::try_new(59.0, 18.0).is_ok());
        let err = Coordinate::try_new(120.0, 18.0).unwrap_err();
        assert_eq!(err.code(), GeoErrorCode::OutOfRange);
        let err = Coordinate::try_new(f64::NAN, 18.0).unwrap_err();
        assert_eq!(err.code(), GeoErrorCode::NotFinite);
    }

    #[test]
    fn test_coordinate_from_tuple() {
        let coord: Coordinate = (59.3293, 18.0686).into();
        assert_eq!(coord.latitude, 59.3293);
    }

    #[test]
    fn test_coordinate_display() {
        assert_eq!(Coordinate::new(59.3293, 18.0686).to_string(), "59.32930, 18.06860");
    }
}
