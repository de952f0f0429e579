//! Coordinate errors.

use thiserror::Error;

/// Result type alias for geo operations.
pub type Result<T> = std::result::Result<T, GeoError>;

/// A position that cannot be placed on a map.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    /// Latitude or longitude is NaN or infinite
    #[error("Coordinate ({latitude}, {longitude}) is not a finite number")]
    NotFinite { latitude: f64, longitude: f64 },

    /// Outside -90..90 latitude or -180..180 longitude
    #[error("Coordinate ({latitude}, {longitude}) is outside -90..90 / -180..180")]
    OutOfRange { latitude: f64, longitude: f64 },
}

/// Error code for integration with truckstop-core error handling.
/// Range: 10xxx for geo errors.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoErrorCode {
    NotFinite = 10001,
    OutOfRange = 10002,
}

impl GeoError {
    /// Returns the error code for this error.
    pub fn code(&self) -> GeoErrorCode {
        match self {
            Self::NotFinite { .. } => GeoErrorCode::NotFinite,
            Self::OutOfRange { .. } => GeoErrorCode::OutOfRange,
        }
    }
}
