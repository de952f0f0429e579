//! The mapping SDK seam.
//!
//! Everything the finder needs from the external mapping library is expressed
//! here: loading the library into a host, constructing map surfaces, the two
//! marker APIs, the place index and the spherical distance utility. Backends
//! (an HTTP client, a browser binding, test fakes) implement these traits;
//! nothing else in the crate talks to a backend directly.

use crate::callback::Callback;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use truckstop_core::config::{MapsConfig, StyleRule};
use truckstop_geo::{haversine_distance_meters, Coordinate};

/// A failure reported by the SDK while constructing something.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SdkError(pub String);

impl SdkError {
    /// Builds an error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The host element a map surface is drawn into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapRegion(String);

impl MapRegion {
    /// Names a region, e.g. the id of a container element.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The region id.
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MapRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to a constructed map surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapHandle {
    id: u64,
    region: MapRegion,
}

impl MapHandle {
    /// Backends mint handles when they construct a map.
    pub fn new(id: u64, region: MapRegion) -> Self {
        Self { id, region }
    }

    /// Backend-assigned id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Region the map is bound to.
    pub fn region(&self) -> &MapRegion {
        &self.region
    }
}

/// Construction options for a map surface.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    /// Initial camera center
    pub center: Coordinate,
    /// Initial zoom level
    pub zoom: u8,
    /// Base map style rules
    pub styles: Vec<StyleRule>,
    /// Map id enabling advanced markers
    pub map_id: Option<String>,
}

/// A constructed map surface.
pub trait MapSurface: Send + Sync {
    /// The handle other SDK calls refer to this surface by.
    fn handle(&self) -> &MapHandle;

    /// Registers an observer fired once, the first time the camera and tiles
    /// settle. Further drawing is only safe after it fires.
    fn add_idle_listener_once(&self, callback: Callback<()>);
}

/// Symbol shapes for legacy marker icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolPath {
    /// Filled circle
    Circle,
}

/// Vector icon for a legacy marker.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolIcon {
    /// Symbol shape
    pub path: SymbolPath,
    /// Symbol size multiplier
    pub scale: f64,
    /// Fill color as `#rrggbb`
    pub fill_color: String,
    /// Fill opacity, 0 to 1
    pub fill_opacity: f64,
    /// Outline width in pixels
    pub stroke_weight: f64,
    /// Outline color as `#rrggbb`
    pub stroke_color: String,
}

/// Pin styling for an advanced marker.
#[derive(Debug, Clone, PartialEq)]
pub struct PinStyle {
    /// Pin body color
    pub background: String,
    /// Pin outline color
    pub border_color: String,
    /// Color of the dot inside the pin
    pub glyph_color: String,
    /// Size multiplier
    pub scale: f64,
}

/// Construction options for a legacy marker.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyMarkerOptions {
    /// Map to attach to
    pub map: MapHandle,
    /// Marker position
    pub position: Coordinate,
    /// Hover title
    pub title: String,
    /// Vector icon
    pub icon: SymbolIcon,
}

/// Construction options for an advanced marker.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvancedMarkerOptions {
    /// Map to attach to
    pub map: MapHandle,
    /// Marker position
    pub position: Coordinate,
    /// Hover title
    pub title: String,
    /// Pin styling
    pub pin: PinStyle,
}

/// A marker built with the legacy API; detached with `set_map(None)`.
pub trait LegacyMarker: Send + Sync {
    /// Attaches to, or with `None` detaches from, a map.
    fn set_map(&self, map: Option<&MapHandle>);
}

/// A marker element built with the advanced API; detached by clearing its map.
pub trait AdvancedMarkerElement: Send + Sync {
    /// Removes the element from its map.
    fn clear_map(&self);
}

/// Proximity search request.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbySearchRequest {
    /// Search center
    pub location: Coordinate,
    /// Radius in meters
    pub radius_m: u32,
    /// Place category, e.g. `gas_station`
    pub place_type: String,
}

/// Status codes reported by the place index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum PlacesStatus {
    Ok,
    ZeroResults,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    NotFound,
    UnknownError,
}

impl PlacesStatus {
    /// Wire spelling of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::ZeroResults => "ZERO_RESULTS",
            Self::OverQueryLimit => "OVER_QUERY_LIMIT",
            Self::RequestDenied => "REQUEST_DENIED",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Parses the wire spelling; unrecognised values map to `UnknownError`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "OK" => Self::Ok,
            "ZERO_RESULTS" => Self::ZeroResults,
            "OVER_QUERY_LIMIT" => Self::OverQueryLimit,
            "REQUEST_DENIED" => Self::RequestDenied,
            "INVALID_REQUEST" => Self::InvalidRequest,
            "NOT_FOUND" => Self::NotFound,
            _ => Self::UnknownError,
        }
    }
}

impl fmt::Display for PlacesStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw place as returned by the place index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    /// Stable place id
    pub place_id: Option<String>,
    /// Display name
    pub name: Option<String>,
    /// Short address
    pub vicinity: Option<String>,
    /// Place position
    pub location: Option<Coordinate>,
}

/// Callback receiving one nearby-search answer.
pub type NearbySearchCallback = Callback<(PlacesStatus, Vec<PlaceRecord>)>;

/// The loaded mapping SDK.
pub trait MapsSdk: Send + Sync {
    /// Constructs a map bound to `region`.
    fn create_map(
        &self,
        region: &MapRegion,
        options: &MapOptions,
    ) -> Result<Arc<dyn MapSurface>, SdkError>;

    /// Whether the advanced marker API can be used.
    fn advanced_markers_available(&self) -> bool;

    /// Constructs an advanced marker attached to `options.map`.
    fn new_advanced_marker(
        &self,
        options: AdvancedMarkerOptions,
    ) -> Result<Box<dyn AdvancedMarkerElement>, SdkError>;

    /// Constructs a legacy marker attached to `options.map`.
    fn new_legacy_marker(
        &self,
        options: LegacyMarkerOptions,
    ) -> Result<Box<dyn LegacyMarker>, SdkError>;

    /// Issues a proximity search against the place index bound to `map`.
    ///
    /// An `Err` means the request could not even be built; otherwise the
    /// callback is invoked exactly once with the answer.
    fn nearby_search(
        &self,
        map: &MapHandle,
        request: NearbySearchRequest,
        callback: NearbySearchCallback,
    ) -> Result<(), SdkError>;

    /// Spherical distance in meters.
    fn compute_distance_between(&self, from: &Coordinate, to: &Coordinate) -> f64 {
        haversine_distance_meters(from, to)
    }
}

/// Invoked when the SDK rejects its credentials after loading.
pub type AuthFailureHook = Arc<dyn Fn() + Send + Sync>;

/// The loader resource injected into the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTag {
    src: String,
}

impl ScriptTag {
    /// Builds the loader URL: API key, requested libraries, async loading and
    /// release channel.
    pub fn from_config(config: &MapsConfig) -> Self {
        let mut src = format!("{}?", config.script_url);
        if let Some(key) = &config.api_key {
            src.push_str(&format!("key={key}&"));
        }
        src.push_str(&format!(
            "libraries={}&loading=async&v={}",
            config.libraries.join(","),
            config.version
        ));
        Self { src }
    }

    /// Full loader URL.
    pub fn src(&self) -> &str {
        &self.src
    }
}

/// The environment the SDK is loaded into.
///
/// Owns the process-wide pieces: the injected loader resource and the
/// authentication-failure hook. Only [`crate::ScriptLoader`] calls into it.
#[async_trait]
pub trait SdkHost: Send + Sync {
    /// The SDK if something already brought it in.
    fn installed_sdk(&self) -> Option<Arc<dyn MapsSdk>>;

    /// Injects the loader resource and resolves when it has loaded.
    async fn inject_script(&self, script: &ScriptTag) -> Result<Arc<dyn MapsSdk>, SdkError>;

    /// Removes a previously injected loader resource.
    fn remove_script(&self, script: &ScriptTag);

    /// Installs, or with `None` clears, the authentication-failure hook.
    fn set_auth_failure_hook(&self, hook: Option<AuthFailureHook>);
}
