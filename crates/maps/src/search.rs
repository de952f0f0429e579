//! Place search: one proximity query per call, turned into display records.

use crate::callback::callback;
use crate::error::SearchError;
use crate::loader::ScriptLoader;
use crate::markers::{MarkerKind, MarkerRegistry};
use crate::pricing::{format_price, PriceSource, UniformPriceSource};
use crate::sdk::{NearbySearchRequest, PlaceRecord, PlacesStatus};
use crate::session::MapSession;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use truckstop_core::config::{ConfigSchema, SearchConfig};
use truckstop_geo::{distance_label, Coordinate};

/// A nearby place ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceResult {
    /// Place name, or the unnamed fallback
    pub name: String,
    /// Short address, or the unknown fallback
    pub vicinity: String,
    /// Distance from the driver, e.g. `"2.4 km"` or `"Unknown"`
    pub distance: String,
    /// Fuel price with two decimals, when the price source knows one
    pub price: Option<String>,
    /// Place position, when the index reported one
    pub location: Option<Coordinate>,
}

/// Issues proximity searches and populates result markers.
#[derive(Clone)]
pub struct PlaceSearch {
    config: SearchConfig,
    prices: Arc<dyn PriceSource>,
}

impl PlaceSearch {
    /// A search with its settings and price source.
    pub fn new(config: SearchConfig, prices: Arc<dyn PriceSource>) -> Self {
        Self { config, prices }
    }

    /// The `[search]` settings with the uniform price source over `[pricing]`.
    pub fn from_config(config: &ConfigSchema) -> Self {
        Self::new(
            config.search.clone(),
            Arc::new(UniformPriceSource::from_config(&config.pricing)),
        )
    }

    /// Search settings in use.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Runs one search around `origin` on a ready session.
    ///
    /// Result markers are added to `markers` without clearing it first; the
    /// caller starts the cycle with [`MapSession::place_self_marker`].
    pub async fn search(
        &self,
        loader: &ScriptLoader,
        markers: &MarkerRegistry,
        session: &MapSession,
        origin: Coordinate,
    ) -> Result<Vec<PlaceResult>, SearchError> {
        if !session.is_ready() {
            return Err(SearchError::MapNotReady);
        }
        let sdk = loader.sdk()?;

        let request = NearbySearchRequest {
            location: origin,
            radius_m: self.config.radius_m,
            place_type: self.config.place_type.clone(),
        };
        debug!(radius_m = request.radius_m, place_type = %request.place_type, "Searching nearby places");

        let (cb, pending) = callback("nearby_search");
        sdk.nearby_search(session.handle(), request, cb).map_err(|e| {
            warn!(error = %e, "Error finding gas stations");
            SearchError::Request(e.to_string())
        })?;
        let (status, places) = pending.wait().await.map_err(|e| {
            warn!(error = %e, "Nearby search never answered");
            SearchError::Request(e.to_string())
        })?;

        if status != PlacesStatus::Ok {
            warn!(%status, "Places search failed");
            return Err(SearchError::NoResults {
                status: status.to_string(),
            });
        }

        let total = places.len();
        let results: Vec<PlaceResult> = places
            .into_iter()
            .take(self.config.max_results)
            .map(|place| {
                let result = self.to_result(&place, &origin, |a, b| {
                    sdk.compute_distance_between(a, b)
                });
                if let Some(position) = place.location {
                    let title = place.name.as_deref().unwrap_or(&self.config.marker_label);
                    markers.add_marker(session.handle(), position, title, MarkerKind::Result);
                }
                result
            })
            .collect();

        info!(found = total, shown = results.len(), "Gas stations found");
        Ok(results)
    }

    fn to_result<F>(&self, place: &PlaceRecord, origin: &Coordinate, measure: F) -> PlaceResult
    where
        F: FnOnce(&Coordinate, &Coordinate) -> f64,
    {
        PlaceResult {
            name: place
                .name
                .clone()
                .unwrap_or_else(|| self.config.unnamed_label.clone()),
            vicinity: place
                .vicinity
                .clone()
                .unwrap_or_else(|| self.config.unknown_vicinity.clone()),
            distance: distance_label(Some(origin), place.location.as_ref(), measure),
            price: self.prices.price_for(place).map(format_price),
            location: place.location,
        }
    }
}
