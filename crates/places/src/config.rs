//! Configuration for the maps web-service client
//!
//! Built from the `[maps]` section of the truckstop configuration, with
//! builder-style overrides for tests and embedding.

use crate::error::{PlacesError, PlacesResult};
use std::time::Duration;
use truckstop_core::config::MapsConfig;

/// Client configuration
#[derive(Debug, Clone)]
pub struct PlacesConfig {
    /// Base URL of the web services, e.g. `https://maps.googleapis.com/maps/api`
    pub base_url: String,
    /// Google Maps API key
    pub api_key: Option<String>,
    /// Map id; advanced markers are only offered when set
    pub map_id: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self::from(&MapsConfig::default())
    }
}

impl From<&MapsConfig> for PlacesConfig {
    fn from(maps: &MapsConfig) -> Self {
        Self {
            base_url: maps.api_base_url.clone(),
            api_key: maps.api_key.clone(),
            map_id: maps.map_id.clone(),
            timeout: Duration::from_secs(maps.timeout_secs),
        }
    }
}

impl PlacesConfig {
    /// Builder-style method to set the web-service base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Builder-style method to set the API key
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Builder-style method to set the map id
    #[must_use]
    pub fn with_map_id(mut self, map_id: impl Into<String>) -> Self {
        self.map_id = Some(map_id.into());
        self
    }

    /// Builder-style method to set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> PlacesResult<()> {
        if self.base_url.is_empty() {
            return Err(PlacesError::config("base_url cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(PlacesError::InvalidUrl(
                "base_url must start with http:// or https://".into(),
            ));
        }

        if self.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(PlacesError::MissingApiKey);
        }

        if self.timeout.is_zero() {
            return Err(PlacesError::config("timeout cannot be zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlacesConfig::default();
        assert_eq!(config.base_url, "https://maps.googleapis.com/maps/api");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.map_id.is_none());
    }

    #[test]
    fn test_from_maps_section() {
        let maps = MapsConfig {
            api_key: Some("k".into()),
            map_id: Some("DEMO".into()),
            ..MapsConfig::default()
        };
        let config = PlacesConfig::from(&maps);
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.map_id.as_deref(), Some("DEMO"));
    }

    #[test]
    fn test_builder_pattern() {
        let config = PlacesConfig::default()
            .with_base_url("http://127.0.0.1:9000/maps/api")
            .with_api_key("test-key")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.base_url, "http://127.0.0.1:9000/maps/api");
        assert_eq!(config.api_key.as_deref(), Some("test-key"));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            PlacesConfig::default().validate(),
            Err(PlacesError::MissingApiKey)
        ));

        let valid = PlacesConfig::default().with_api_key("k");
        assert!(valid.validate().is_ok());

        let bad_url = valid.clone().with_base_url("maps.local");
        assert!(matches!(bad_url.validate(), Err(PlacesError::InvalidUrl(_))));

        let zero = valid.with_timeout(Duration::ZERO);
        assert!(zero.validate().is_err());
    }
}
