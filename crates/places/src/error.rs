//! Error types for the maps web-service client

use thiserror::Error;
use truckstop_core::{Error as CoreError, ErrorCode};

/// Result type alias for client operations
pub type PlacesResult<T> = Result<T, PlacesError>;

/// Maps web-service client errors
#[derive(Error, Debug)]
pub enum PlacesError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No API key configured
    #[error("No Google Maps API key configured")]
    MissingApiKey,

    /// The service answered with a non-success HTTP status
    #[error("API error ({status}): {message}")]
    ApiResponse {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl PlacesError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an API response error
    pub fn api_response(status: u16, message: impl Into<String>) -> Self {
        Self::ApiResponse {
            status,
            message: message.into(),
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiResponse { status, .. } if (400..500).contains(status))
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiResponse { status, .. } if *status >= 500)
    }
}

impl From<PlacesError> for CoreError {
    fn from(err: PlacesError) -> Self {
        match &err {
            PlacesError::MissingApiKey => CoreError::invalid_config(
                "maps.api_key",
                "set it in the config file or via TRUCKSTOP_MAPS_API_KEY",
            ),
            PlacesError::Config(msg) | PlacesError::InvalidUrl(msg) => {
                CoreError::config(msg.clone())
            }
            PlacesError::Request(_) | PlacesError::ApiResponse { .. } => {
                CoreError::sdk(ErrorCode::SdkError, err.to_string())
            }
        }
        .with_source(err)
    }
}
