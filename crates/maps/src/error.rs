//! Error taxonomy for the nearby-place finder.
//!
//! Each stage owns its error type. None of them cascade: a [`SearchError`]
//! leaves an initialized map session untouched, and every variant renders as
//! the sentence shown to the driver.

use thiserror::Error;
use truckstop_core::{Error as CoreError, ErrorCode};

/// Shown when the loader script cannot be fetched.
pub const SCRIPT_LOAD_FAILED: &str = "Failed to load Google Maps API. Please try again later.";

/// Shown when the SDK rejects the API key after loading.
pub const AUTH_FAILURE: &str = "Google Maps API key error: Billing is not enabled or the API is not activated. Please check your API key configuration.";

/// The mapping SDK is missing, failed to load, or rejected the API key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptLoadError {
    /// `ensure_loaded` has not completed yet
    #[error("Maps are still loading")]
    NotLoaded,

    /// Network or script failure while injecting the loader
    #[error("{0}")]
    LoadFailed(String),

    /// The out-of-band authentication hook fired
    #[error("{0}")]
    AuthFailure(String),
}

/// The device position could not be acquired.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// No positioning capability on this host
    #[error("Geolocation is not supported by your device")]
    Unsupported,

    /// The user refused the permission prompt
    #[error("Error getting location: {0}")]
    PermissionDenied(String),

    /// No fix arrived within the configured timeout
    #[error("Error getting location: {0}")]
    Timeout(String),

    /// The device could not determine a position
    #[error("Error getting location: {0}")]
    PositionUnavailable(String),
}

/// The map surface could not be constructed or never became ready.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapInitError {
    /// The SDK is not usable
    #[error(transparent)]
    SdkUnavailable(#[from] ScriptLoadError),

    /// No coordinate has been captured yet
    #[error("Map cannot be shown before your location is known")]
    MissingLocation,

    /// Map construction threw
    #[error("Failed to initialize map: {0}")]
    Construction(String),

    /// The idle observer went away without firing
    #[error("Map never finished loading: {0}")]
    IdleSignalLost(String),
}

/// The proximity search failed or came back empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The SDK is not usable
    #[error(transparent)]
    SdkUnavailable(#[from] ScriptLoadError),

    /// The map session is not ready for drawing yet
    #[error("Map is not ready for searching yet")]
    MapNotReady,

    /// The place index answered with a non-OK status
    #[error("Could not find any gas stations nearby")]
    NoResults {
        /// Raw status reported by the place index
        status: String,
    },

    /// Building or issuing the request threw
    #[error("Error finding gas stations: {0}")]
    Request(String),
}

/// Any failure of the finder, tagged by stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapsError {
    /// SDK loading stage
    #[error(transparent)]
    Script(#[from] ScriptLoadError),

    /// Location stage
    #[error(transparent)]
    Location(#[from] LocationError),

    /// Map construction stage
    #[error(transparent)]
    MapInit(#[from] MapInitError),

    /// Search stage
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Error code for integration with truckstop-core error handling.
/// Range: 11xxx for finder errors.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapsErrorCode {
    ScriptNotLoaded = 11001,
    ScriptLoadFailed = 11002,
    ScriptAuthFailure = 11003,
    LocationUnsupported = 11101,
    LocationDenied = 11102,
    LocationTimeout = 11103,
    LocationUnavailable = 11104,
    MapMissingLocation = 11201,
    MapConstruction = 11202,
    MapIdleLost = 11203,
    SearchMapNotReady = 11301,
    SearchNoResults = 11302,
    SearchRequest = 11303,
}

impl ScriptLoadError {
    fn code(&self) -> MapsErrorCode {
        match self {
            Self::NotLoaded => MapsErrorCode::ScriptNotLoaded,
            Self::LoadFailed(_) => MapsErrorCode::ScriptLoadFailed,
            Self::AuthFailure(_) => MapsErrorCode::ScriptAuthFailure,
        }
    }
}

impl MapsError {
    /// Returns the error code for this error.
    pub fn code(&self) -> MapsErrorCode {
        match self {
            Self::Script(e)
            | Self::MapInit(MapInitError::SdkUnavailable(e))
            | Self::Search(SearchError::SdkUnavailable(e)) => e.code(),
            Self::Location(LocationError::Unsupported) => MapsErrorCode::LocationUnsupported,
            Self::Location(LocationError::PermissionDenied(_)) => MapsErrorCode::LocationDenied,
            Self::Location(LocationError::Timeout(_)) => MapsErrorCode::LocationTimeout,
            Self::Location(LocationError::PositionUnavailable(_)) => {
                MapsErrorCode::LocationUnavailable
            }
            Self::MapInit(MapInitError::MissingLocation) => MapsErrorCode::MapMissingLocation,
            Self::MapInit(MapInitError::Construction(_)) => MapsErrorCode::MapConstruction,
            Self::MapInit(MapInitError::IdleSignalLost(_)) => MapsErrorCode::MapIdleLost,
            Self::Search(SearchError::MapNotReady) => MapsErrorCode::SearchMapNotReady,
            Self::Search(SearchError::NoResults { .. }) => MapsErrorCode::SearchNoResults,
            Self::Search(SearchError::Request(_)) => MapsErrorCode::SearchRequest,
        }
    }

    /// The workspace-wide error code this failure belongs to.
    pub fn core_code(&self) -> ErrorCode {
        match self.code() {
            MapsErrorCode::ScriptNotLoaded => ErrorCode::SdkError,
            MapsErrorCode::ScriptLoadFailed => ErrorCode::ScriptLoadFailed,
            MapsErrorCode::ScriptAuthFailure => ErrorCode::SdkAuthFailure,
            MapsErrorCode::LocationUnsupported => ErrorCode::LocationUnsupported,
            MapsErrorCode::LocationDenied => ErrorCode::LocationDenied,
            MapsErrorCode::LocationTimeout => ErrorCode::LocationTimeout,
            MapsErrorCode::LocationUnavailable => ErrorCode::LocationUnavailable,
            MapsErrorCode::MapMissingLocation | MapsErrorCode::MapIdleLost => ErrorCode::MapError,
            MapsErrorCode::MapConstruction => ErrorCode::MapInitFailed,
            MapsErrorCode::SearchMapNotReady => ErrorCode::SearchError,
            MapsErrorCode::SearchNoResults => ErrorCode::NoResults,
            MapsErrorCode::SearchRequest => ErrorCode::SearchRequestFailed,
        }
    }
}

impl From<MapsError> for CoreError {
    fn from(err: MapsError) -> Self {
        let code = err.core_code();
        let message = err.to_string();
        match code.category() {
            "Sdk" => CoreError::sdk(code, message),
            "Location" => CoreError::location(code, message),
            _ => CoreError::new(code, message),
        }
        .with_source(err)
    }
}
