//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, Result};
use std::path::Path;

/// API key for the maps SDK
pub const ENV_API_KEY: &str = "TRUCKSTOP_MAPS_API_KEY";
/// Checked when [`ENV_API_KEY`] is unset
pub const ENV_API_KEY_FALLBACK: &str = "GOOGLE_MAPS_API_KEY";
/// Fixed device latitude
pub const ENV_LATITUDE: &str = "TRUCKSTOP_LAT";
/// Fixed device longitude
pub const ENV_LONGITUDE: &str = "TRUCKSTOP_LNG";
/// Default log directive
pub const ENV_LOG: &str = "TRUCKSTOP_LOG";

/// Configuration wrapper
#[derive(Debug, Clone)]
pub struct Config {
    pub schema: ConfigSchema,
    pub path: Option<String>,
}

impl Config {
    /// Load configuration from a file path (or the standard locations),
    /// apply environment overrides and validate the result.
    pub fn load(path: Option<&str>) -> Result<Self> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with an explicit environment lookup.
    pub fn load_with_env<F>(path: Option<&str>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(p) = path {
            if !Path::new(p).exists() {
                return Err(Error::config_not_found(p));
            }
        }

        let config_path = path.map(String::from).or_else(find_config_file);

        let mut schema = if let Some(ref p) = config_path {
            load_config_file(p)?
        } else {
            ConfigSchema::default()
        };

        apply_env_overrides(&mut schema, env)?;
        schema.validate()?;

        Ok(Self {
            schema,
            path: config_path,
        })
    }

    /// Load with defaults only (no file, no environment)
    pub fn defaults() -> Self {
        Self {
            schema: ConfigSchema::default(),
            path: None,
        }
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<String> {
    let candidates = [".truckstop.toml", "truckstop.toml", ".config/truckstop.toml"];

    candidates
        .into_iter()
        .find(|candidate| Path::new(candidate).exists())
        .map(String::from)
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &str) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("Failed to read config file {path}: {e}")))?;

    toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse config file {path}: {e}")))
}

fn apply_env_overrides<F>(schema: &mut ConfigSchema, env: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = non_empty(ENV_API_KEY).or_else(|| non_empty(ENV_API_KEY_FALLBACK)) {
        schema.maps.api_key = Some(key);
    }

    if let Some(raw) = non_empty(ENV_LATITUDE) {
        schema.geolocation.latitude = Some(parse_degrees(ENV_LATITUDE, &raw)?);
    }
    if let Some(raw) = non_empty(ENV_LONGITUDE) {
        schema.geolocation.longitude = Some(parse_degrees(ENV_LONGITUDE, &raw)?);
    }

    if let Some(level) = non_empty(ENV_LOG) {
        schema.logging.level = level;
    }

    Ok(())
}

fn parse_degrees(key: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::invalid_config(key, format!("`{raw}` is not a number")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::defaults();
        assert!(config.path.is_none());
        assert_eq!(config.schema.map.zoom, 13);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let err = Config::load_with_env(Some("/nonexistent/truckstop.toml"), env_from(&[]))
            .unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::ConfigNotFound);
    }

    #[test]
    fn test_load_file_and_env_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[maps]\napi_key = \"from-file\"\n[search]\nmax_results = 3").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = Config::load_with_env(
            Some(path.as_str()),
            env_from(&[
                (ENV_API_KEY_FALLBACK, "from-env"),
                (ENV_LATITUDE, "59.3293"),
                (ENV_LONGITUDE, "18.0686"),
            ]),
        )
        .unwrap();

        assert_eq!(config.path.as_deref(), Some(path.as_str()));
        assert_eq!(config.schema.maps.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.schema.search.max_results, 3);
        assert!(config.schema.fixed_position().is_some());
    }

    #[test]
    fn test_primary_key_wins_over_fallback() {
        let mut schema = ConfigSchema::default();
        apply_env_overrides(
            &mut schema,
            env_from(&[(ENV_API_KEY, "primary"), (ENV_API_KEY_FALLBACK, "fallback")]),
        )
        .unwrap();
        assert_eq!(schema.maps.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn test_bad_latitude_is_rejected() {
        let mut schema = ConfigSchema::default();
        let err = apply_env_overrides(&mut schema, env_from(&[(ENV_LATITUDE, "north")]))
            .unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::ConfigValidationError);
    }
}
