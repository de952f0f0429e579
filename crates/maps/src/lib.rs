//! Nearby-place finder for the truckstop companion.
//!
//! The crate coordinates five units around an external mapping SDK:
//!
//! - **Script loader** ([`loader`]): brings the SDK in exactly once and
//!   publishes [`LoadState`], including late authentication failures
//! - **Location provider** ([`location`]): one high-accuracy position request
//!   with a timeout and no cached fixes
//! - **Map session** ([`session`]): at most one map surface per region, ready
//!   only after the SDK reports the camera idle
//! - **Marker registry** ([`markers`]): owns every pin, hiding the legacy vs.
//!   advanced marker APIs behind one factory
//! - **Place search** ([`search`]): one proximity query, capped results,
//!   distance labels and result markers
//!
//! [`NearbyFinder`] drives them end to end and exposes a snapshot suitable for
//! rendering. The SDK itself is reached only through the traits in [`sdk`].
//!
//! # Example
//!
//! ```rust,ignore
//! use truckstop_maps::{LocationProvider, MapRegion, NearbyFinder, ScriptLoader};
//!
//! let loader = ScriptLoader::new(host, &config.maps);
//! let finder = NearbyFinder::new(loader, LocationProvider::from_config(&config), &config);
//!
//! finder.start().await;
//! let snapshot = finder.locate_and_search(&MapRegion::new("nearby-map")).await;
//! for station in &snapshot.stations {
//!     println!("{} ({})", station.name, station.distance);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod callback;
pub mod error;
pub mod finder;
pub mod loader;
pub mod location;
pub mod markers;
pub mod pricing;
pub mod sdk;
pub mod search;
pub mod session;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use callback::{callback, Callback, CallbackDropped, Pending};
pub use error::{LocationError, MapInitError, MapsError, MapsErrorCode, ScriptLoadError, SearchError};
pub use finder::{FinderSnapshot, FinderState, NearbyFinder};
pub use loader::{LoadState, LoaderGuard, ScriptLoader};
pub use location::{FixedGeolocation, Geolocation, LocationProvider, PositionError, PositionErrorCode, PositionOptions};
pub use markers::{MarkerApi, MarkerKind, MarkerRegistry, PlacedMarker};
pub use pricing::{PriceSource, UniformPriceSource};
pub use sdk::{MapHandle, MapRegion, MapsSdk, PlaceRecord, PlacesStatus, SdkError, SdkHost};
pub use search::{PlaceResult, PlaceSearch};
pub use session::{Initialized, MapSession, MapSessions};

pub use truckstop_geo::Coordinate;
