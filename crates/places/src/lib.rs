//! Google Maps web-service backend for the nearby-place finder
//!
//! This crate implements the SDK seam of `truckstop-maps` over HTTP:
//!
//! - **Loader**: [`HttpSdkHost`] fetches the maps loader script once and
//!   yields an [`HttpMapsSdk`]
//! - **Places**: nearby search against `place/nearbysearch/json`, with a
//!   `REQUEST_DENIED` answer raising the auth-failure signal
//! - **Headless maps**: map surfaces and markers that draw nothing but keep
//!   the idle and attachment contracts
//! - **Request correlation**: every request carries a unique `X-Request-ID`
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use truckstop_core::config::ConfigSchema;
//! use truckstop_maps::{LocationProvider, MapRegion, NearbyFinder, ScriptLoader};
//! use truckstop_places::{HttpSdkHost, PlacesConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigSchema::default();
//!     let host = HttpSdkHost::new(PlacesConfig::from(&config.maps).with_api_key("key"))?;
//!     let loader = ScriptLoader::new(Arc::new(host), &config.maps);
//!     let finder = NearbyFinder::new(loader, LocationProvider::from_config(&config), &config);
//!
//!     finder.start().await;
//!     let snapshot = finder.locate_and_search(&MapRegion::new("nearby-map")).await;
//!     println!("{} stations", snapshot.stations.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod host;
pub mod sdk;
pub mod surface;

pub use client::{NearbySearchResponse, PlacesClient};
pub use config::PlacesConfig;
pub use error::{PlacesError, PlacesResult};
pub use host::HttpSdkHost;
pub use sdk::HttpMapsSdk;
pub use surface::{HeadlessMap, HeadlessMarker};
