//! Location provider: one device position request per call.
//!
//! The device capability is callback based, like the SDK. The provider turns
//! it into a future, enforces the configured timeout itself, and never retries;
//! callers re-invoke [`LocationProvider::request_location`] to try again.

use crate::callback::{callback, Callback};
use crate::error::LocationError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use truckstop_core::config::{ConfigSchema, GeolocationConfig};
use truckstop_geo::Coordinate;

/// Options for a single position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Ask for the most accurate fix the device can produce
    pub enable_high_accuracy: bool,
    /// Give up after this long
    pub timeout: Duration,
    /// Oldest cached fix that may be returned; zero means always fresh
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self::from(&GeolocationConfig::default())
    }
}

impl From<&GeolocationConfig> for PositionOptions {
    fn from(config: &GeolocationConfig) -> Self {
        Self {
            enable_high_accuracy: config.enable_high_accuracy,
            timeout: Duration::from_millis(config.timeout_ms),
            maximum_age: Duration::from_millis(config.maximum_age_ms),
        }
    }
}

/// Why the device could not produce a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PositionErrorCode {
    /// The user refused the prompt
    PermissionDenied = 1,
    /// No position could be determined
    PositionUnavailable = 2,
    /// No fix within the timeout
    Timeout = 3,
}

/// Failure reported by the device capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionError {
    /// Failure class
    pub code: PositionErrorCode,
    /// Device-provided reason
    pub message: String,
}

impl PositionError {
    /// Builds an error with the device's own message.
    pub fn new(code: PositionErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The user refused the permission prompt.
    pub fn permission_denied() -> Self {
        Self::new(PositionErrorCode::PermissionDenied, "User denied Geolocation")
    }

    /// The device could not determine a position.
    pub fn unavailable() -> Self {
        Self::new(PositionErrorCode::PositionUnavailable, "Position unavailable")
    }

    /// No fix within the timeout.
    pub fn timeout() -> Self {
        Self::new(PositionErrorCode::Timeout, "Timeout expired")
    }
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<PositionError> for LocationError {
    fn from(err: PositionError) -> Self {
        match err.code {
            PositionErrorCode::PermissionDenied => LocationError::PermissionDenied(err.message),
            PositionErrorCode::PositionUnavailable => {
                LocationError::PositionUnavailable(err.message)
            }
            PositionErrorCode::Timeout => LocationError::Timeout(err.message),
        }
    }
}

/// Callback receiving one position answer.
pub type PositionCallback = Callback<Result<Coordinate, PositionError>>;

/// A device positioning capability.
pub trait Geolocation: Send + Sync {
    /// Requests the current position; `callback` is invoked at most once.
    fn get_current_position(&self, options: &PositionOptions, callback: PositionCallback);
}

/// A device pinned to one position, e.g. from configuration.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocation {
    position: Coordinate,
}

impl FixedGeolocation {
    /// Always answers with `position`.
    pub fn new(position: Coordinate) -> Self {
        Self { position }
    }
}

impl Geolocation for FixedGeolocation {
    fn get_current_position(&self, _options: &PositionOptions, callback: PositionCallback) {
        callback.invoke(Ok(self.position));
    }
}

/// Request/response wrapper around the device capability.
#[derive(Clone)]
pub struct LocationProvider {
    capability: Option<Arc<dyn Geolocation>>,
    options: PositionOptions,
}

impl LocationProvider {
    /// Wraps a capability; `None` models a host without positioning.
    pub fn new(capability: Option<Arc<dyn Geolocation>>, options: PositionOptions) -> Self {
        Self {
            capability,
            options,
        }
    }

    /// A fixed capability when the configuration pins a position, otherwise
    /// no capability at all.
    pub fn from_config(config: &ConfigSchema) -> Self {
        let capability = config
            .fixed_position()
            .map(|position| Arc::new(FixedGeolocation::new(position)) as Arc<dyn Geolocation>);
        Self::new(capability, PositionOptions::from(&config.geolocation))
    }

    /// Whether the host can produce positions at all.
    pub fn is_supported(&self) -> bool {
        self.capability.is_some()
    }

    /// Options sent with every request.
    pub fn options(&self) -> &PositionOptions {
        &self.options
    }

    /// Issues one position request.
    pub async fn request_location(&self) -> Result<Coordinate, LocationError> {
        let Some(capability) = &self.capability else {
            warn!("Geolocation requested on a host without positioning");
            return Err(LocationError::Unsupported);
        };

        let (cb, pending) = callback("geolocation");
        capability.get_current_position(&self.options, cb);
        debug!(timeout_ms = self.options.timeout.as_millis(), "Position requested");

        let answer = match tokio::time::timeout(self.options.timeout, pending.wait()).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(dropped)) => Err(PositionError::new(
                PositionErrorCode::PositionUnavailable,
                dropped.to_string(),
            )),
            Err(_) => Err(PositionError::timeout()),
        };

        match answer {
            Ok(position) => {
                info!(latitude = position.latitude, longitude = position.longitude, "Location found");
                Ok(position)
            }
            Err(e) => {
                warn!(code = ?e.code, reason = %e, "Could not get location");
                Err(e.into())
            }
        }
    }
}
