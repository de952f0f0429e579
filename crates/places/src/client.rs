//! HTTP client for the maps web services

use crate::config::PlacesConfig;
use crate::error::{PlacesError, PlacesResult};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};
use truckstop_geo::Coordinate;
use truckstop_maps::sdk::{NearbySearchRequest, PlaceRecord, PlacesStatus};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// Path of the nearby search endpoint below the base URL
const NEARBY_SEARCH_PATH: &str = "place/nearbysearch/json";

/// Nearby search response as sent by the service
#[derive(Debug, Clone, Deserialize)]
pub struct NearbySearchResponse {
    /// Status string, e.g. `OK` or `ZERO_RESULTS`
    pub status: String,
    /// Matching places
    #[serde(default)]
    pub results: Vec<WirePlace>,
    /// Reason given alongside a failure status
    #[serde(default)]
    pub error_message: Option<String>,
}

impl NearbySearchResponse {
    /// Parsed status.
    pub fn status(&self) -> PlacesStatus {
        PlacesStatus::parse(&self.status)
    }
}

/// One place in a nearby search response
#[derive(Debug, Clone, Deserialize)]
pub struct WirePlace {
    /// Stable place id
    #[serde(default)]
    pub place_id: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Short address
    #[serde(default)]
    pub vicinity: Option<String>,
    /// Place geometry
    #[serde(default)]
    pub geometry: Option<WireGeometry>,
}

/// Geometry block of a place
#[derive(Debug, Clone, Deserialize)]
pub struct WireGeometry {
    /// Place position
    pub location: WireLatLng,
}

/// A latitude/longitude pair as sent by the service
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WireLatLng {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
}

impl From<WirePlace> for PlaceRecord {
    fn from(place: WirePlace) -> Self {
        Self {
            place_id: place.place_id,
            name: place.name,
            vicinity: place.vicinity,
            location: place
                .geometry
                .map(|g| Coordinate::new(g.location.lat, g.location.lng))
                .filter(Coordinate::is_valid),
        }
    }
}

/// Client for the loader script and the Places web service
#[derive(Clone)]
pub struct PlacesClient {
    inner: Client,
    config: Arc<PlacesConfig>,
}

impl PlacesClient {
    /// Create a new client with specific configuration
    pub fn with_config(config: PlacesConfig) -> PlacesResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("truckstop-places/", env!("CARGO_PKG_VERSION"))),
        );

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(PlacesError::Request)?;

        Ok(Self {
            inner,
            config: Arc::new(config),
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &PlacesConfig {
        &self.config
    }

    /// Fetches the loader script at `url`; succeeds when the service serves it.
    #[instrument(skip(self, url), fields(request_id))]
    pub async fn fetch_script(&self, url: &str) -> PlacesResult<()> {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());
        let start = Instant::now();

        let response = self
            .inner
            .get(url)
            .header(X_REQUEST_ID, &request_id)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;

        debug!(
            request_id = %request_id,
            size = bytes.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Loader script fetched"
        );
        Ok(())
    }

    /// Runs one nearby search.
    #[instrument(skip(self, request), fields(request_id, radius_m = request.radius_m))]
    pub async fn nearby_search(
        &self,
        request: &NearbySearchRequest,
    ) -> PlacesResult<NearbySearchResponse> {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());
        let url = format!(
            "{}/{NEARBY_SEARCH_PATH}",
            self.config.base_url.trim_end_matches('/')
        );
        let location = format!("{},{}", request.location.latitude, request.location.longitude);
        let radius = request.radius_m.to_string();
        let key = self.config.api_key.as_deref().unwrap_or_default();
        let start = Instant::now();

        let response = self
            .inner
            .get(&url)
            .header(X_REQUEST_ID, &request_id)
            .query(&[
                ("location", location.as_str()),
                ("radius", radius.as_str()),
                ("type", request.place_type.as_str()),
                ("key", key),
            ])
            .send()
            .await?;
        let body: NearbySearchResponse = self.handle_response(response).await?;

        debug!(
            request_id = %request_id,
            status = %body.status,
            results = body.results.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Nearby search answered"
        );
        Ok(body)
    }

    async fn check_status(response: Response) -> PlacesResult<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(PlacesError::api_response(status.as_u16(), message))
        }
    }

    /// Handle HTTP response and deserialize
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> PlacesResult<T> {
        let response = Self::check_status(response).await?;
        response.json().await.map_err(PlacesError::Request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_key() {
        assert!(PlacesClient::with_config(PlacesConfig::default()).is_err());
        assert!(PlacesClient::with_config(PlacesConfig::default().with_api_key("k")).is_ok());
    }

    #[test]
    fn test_wire_place_conversion() {
        let place = WirePlace {
            place_id: Some("abc".into()),
            name: Some("Pilot".into()),
            vicinity: None,
            geometry: Some(WireGeometry {
                location: WireLatLng { lat: 47.6, lng: -122.3 },
            }),
        };
        let record = PlaceRecord::from(place);
        assert_eq!(record.name.as_deref(), Some("Pilot"));
        assert_eq!(record.location, Some(Coordinate::new(47.6, -122.3)));
    }

    #[test]
    fn test_out_of_range_geometry_is_dropped() {
        let place = WirePlace {
            place_id: None,
            name: None,
            vicinity: None,
            geometry: Some(WireGeometry {
                location: WireLatLng { lat: 123.0, lng: 0.0 },
            }),
        };
        assert!(PlaceRecord::from(place).location.is_none());
    }

    #[test]
    fn test_response_status_parsing() {
        let response = NearbySearchResponse {
            status: "REQUEST_DENIED".into(),
            results: Vec::new(),
            error_message: Some("API key invalid".into()),
        };
        assert_eq!(response.status(), PlacesStatus::RequestDenied);
    }
}
