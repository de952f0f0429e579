//! Configuration schema definitions

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use truckstop_geo::Coordinate;

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    #[serde(default)]
    pub maps: MapsConfig,

    #[serde(default)]
    pub geolocation: GeolocationConfig,

    #[serde(default)]
    pub map: MapConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub pricing: PricingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ConfigSchema {
    /// Validate every section, returning the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.maps.timeout_secs == 0 {
            return Err(Error::invalid_config("maps.timeout_secs", "must be greater than zero"));
        }
        for (field, url) in [
            ("maps.script_url", &self.maps.script_url),
            ("maps.api_base_url", &self.maps.api_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::invalid_config(field, "must start with http:// or https://"));
            }
        }

        if self.geolocation.timeout_ms == 0 {
            return Err(Error::invalid_config("geolocation.timeout_ms", "must be greater than zero"));
        }
        match (self.geolocation.latitude, self.geolocation.longitude) {
            (Some(lat), Some(lng)) => {
                Coordinate::try_new(lat, lng)
                    .map_err(|e| Error::invalid_config("geolocation", e.to_string()))?;
            }
            (None, None) => {}
            _ => {
                return Err(Error::invalid_config(
                    "geolocation",
                    "latitude and longitude must be set together",
                ));
            }
        }

        if !(MIN_ZOOM..=MAX_ZOOM).contains(&self.map.zoom) {
            return Err(Error::invalid_config(
                "map.zoom",
                format!("must be between {MIN_ZOOM} and {MAX_ZOOM}"),
            ));
        }

        if self.search.radius_m == 0 {
            return Err(Error::invalid_config("search.radius_m", "must be greater than zero"));
        }
        if self.search.max_results == 0 {
            return Err(Error::invalid_config("search.max_results", "must be greater than zero"));
        }
        if self.search.place_type.trim().is_empty() {
            return Err(Error::invalid_config("search.place_type", "cannot be empty"));
        }

        if !(self.pricing.min.is_finite() && self.pricing.max.is_finite())
            || self.pricing.min >= self.pricing.max
        {
            return Err(Error::invalid_config("pricing", "min must be lower than max"));
        }

        Ok(())
    }

    /// The fixed device position, if one is configured.
    pub fn fixed_position(&self) -> Option<Coordinate> {
        match (self.geolocation.latitude, self.geolocation.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
            _ => None,
        }
    }
}

/// Lowest zoom level a map surface accepts.
pub const MIN_ZOOM: u8 = 0;
/// Highest zoom level a map surface accepts.
pub const MAX_ZOOM: u8 = 22;

/// Maps SDK configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapsConfig {
    /// API key sent with the loader script and web service calls
    #[serde(default)]
    pub api_key: Option<String>,

    /// Loader script location
    #[serde(default = "default_script_url")]
    pub script_url: String,

    /// Base URL of the maps web services
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// SDK libraries requested with the loader
    #[serde(default = "default_libraries")]
    pub libraries: Vec<String>,

    /// SDK release channel
    #[serde(default = "default_version")]
    pub version: String,

    /// Map id; advanced markers are only available when one is set
    #[serde(default)]
    pub map_id: Option<String>,

    /// HTTP timeout for SDK requests
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            script_url: default_script_url(),
            api_base_url: default_api_base_url(),
            libraries: default_libraries(),
            version: default_version(),
            map_id: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_script_url() -> String {
    "https://maps.googleapis.com/maps/api/js".to_string()
}

fn default_api_base_url() -> String {
    "https://maps.googleapis.com/maps/api".to_string()
}

fn default_libraries() -> Vec<String> {
    vec!["places".to_string(), "geometry".to_string()]
}

fn default_version() -> String {
    "weekly".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Device geolocation request options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationConfig {
    /// Ask the device for its most accurate fix
    #[serde(default = "default_true")]
    pub enable_high_accuracy: bool,

    /// How long to wait for a fix
    #[serde(default = "default_location_timeout_ms")]
    pub timeout_ms: u64,

    /// Oldest cached fix that may be returned (0 = always fresh)
    #[serde(default)]
    pub maximum_age_ms: u64,

    /// Fixed latitude for hosts without a positioning capability
    #[serde(default)]
    pub latitude: Option<f64>,

    /// Fixed longitude for hosts without a positioning capability
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout_ms: default_location_timeout_ms(),
            maximum_age_ms: 0,
            latitude: None,
            longitude: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_location_timeout_ms() -> u64 {
    5000
}

/// Map surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Initial zoom level
    #[serde(default = "default_zoom")]
    pub zoom: u8,

    /// Style rules applied to the base map
    #[serde(default = "default_styles")]
    pub styles: Vec<StyleRule>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            zoom: default_zoom(),
            styles: default_styles(),
        }
    }
}

fn default_zoom() -> u8 {
    13
}

/// One base-map style rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRule {
    /// Element selector, e.g. `geometry` or `labels.icon`
    pub element_type: String,
    /// Fill/stroke color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// `on` / `off`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
}

impl StyleRule {
    fn color(element_type: &str, color: &str) -> Self {
        Self {
            element_type: element_type.to_string(),
            color: Some(color.to_string()),
            visibility: None,
        }
    }

    fn hidden(element_type: &str) -> Self {
        Self {
            element_type: element_type.to_string(),
            color: None,
            visibility: Some("off".to_string()),
        }
    }
}

/// Muted base map: light geometry, grey labels, no label icons
fn default_styles() -> Vec<StyleRule> {
    vec![
        StyleRule::color("geometry", "#f5f5f5"),
        StyleRule::hidden("labels.icon"),
        StyleRule::color("labels.text.fill", "#616161"),
        StyleRule::color("labels.text.stroke", "#f5f5f5"),
    ]
}

/// Proximity search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search radius in meters
    #[serde(default = "default_radius_m")]
    pub radius_m: u32,

    /// Place category
    #[serde(default = "default_place_type")]
    pub place_type: String,

    /// Maximum number of results kept from one search
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Listing name for places without a name
    #[serde(default = "default_unnamed_label")]
    pub unnamed_label: String,

    /// Marker title for places without a name
    #[serde(default = "default_marker_label")]
    pub marker_label: String,

    /// Listing vicinity for places without one
    #[serde(default = "default_unknown_vicinity")]
    pub unknown_vicinity: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            radius_m: default_radius_m(),
            place_type: default_place_type(),
            max_results: default_max_results(),
            unnamed_label: default_unnamed_label(),
            marker_label: default_marker_label(),
            unknown_vicinity: default_unknown_vicinity(),
        }
    }
}

fn default_radius_m() -> u32 {
    5000
}

fn default_place_type() -> String {
    "gas_station".to_string()
}

fn default_max_results() -> usize {
    5
}

fn default_unnamed_label() -> String {
    "Unnamed Gas Station".to_string()
}

fn default_marker_label() -> String {
    "Gas Station".to_string()
}

fn default_unknown_vicinity() -> String {
    "Unknown location".to_string()
}

/// Band for the synthetic price source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_price_min")]
    pub min: f64,

    #[serde(default = "default_price_max")]
    pub max: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            min: default_price_min(),
            max: default_price_max(),
        }
    }
}

fn default_price_min() -> f64 {
    15.0
}

fn default_price_max() -> f64 {
    17.0
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of the compact human format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_finder_contract() {
        let schema = ConfigSchema::default();
        assert_eq!(schema.map.zoom, 13);
        assert_eq!(schema.search.radius_m, 5000);
        assert_eq!(schema.search.place_type, "gas_station");
        assert_eq!(schema.search.max_results, 5);
        assert!(schema.geolocation.enable_high_accuracy);
        assert_eq!(schema.geolocation.timeout_ms, 5000);
        assert_eq!(schema.geolocation.maximum_age_ms, 0);
        assert_eq!(schema.maps.libraries, vec!["places", "geometry"]);
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_default_style_is_muted() {
        let styles = MapConfig::default().styles;
        assert_eq!(styles.len(), 4);
        assert!(styles
            .iter()
            .any(|s| s.element_type == "labels.icon" && s.visibility.as_deref() == Some("off")));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let schema: ConfigSchema = toml::from_str(
            r#"
            [search]
            radius_m = 8000

            [geolocation]
            latitude = 59.33
            longitude = 18.07
            "#,
        )
        .unwrap();

        assert_eq!(schema.search.radius_m, 8000);
        assert_eq!(schema.search.max_results, 5);
        assert_eq!(schema.fixed_position(), Some(Coordinate::new(59.33, 18.07)));
    }

    #[test]
    fn test_logging_section() {
        assert!(!LoggingConfig::default().json);

        let schema: ConfigSchema = toml::from_str(
            r#"
            [logging]
            level = "debug"
            json = true
            "#,
        )
        .unwrap();
        assert_eq!(schema.logging.level, "debug");
        assert!(schema.logging.json);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut schema = ConfigSchema::default();
        schema.search.max_results = 0;
        assert!(schema.validate().is_err());

        let mut schema = ConfigSchema::default();
        schema.pricing.min = 20.0;
        assert!(schema.validate().is_err());

        let mut schema = ConfigSchema::default();
        schema.geolocation.latitude = Some(59.0);
        assert!(schema.validate().is_err());

        let mut schema = ConfigSchema::default();
        schema.geolocation.latitude = Some(95.0);
        schema.geolocation.longitude = Some(18.0);
        assert!(schema.validate().is_err());

        let mut schema = ConfigSchema::default();
        schema.map.zoom = 30;
        assert!(schema.validate().is_err());
    }
}
