//! Map sessions: at most one map surface per region.
//!
//! A surface is not ready for drawing when construction returns; it becomes
//! ready the first time the SDK reports the camera idle. [`MapSession`] keeps
//! the one-shot idle observer and turns it into [`MapSession::wait_until_ready`],
//! which places the self marker exactly once when the signal arrives.

use crate::callback::{callback, Pending};
use crate::error::MapInitError;
use crate::loader::ScriptLoader;
use crate::markers::{MarkerKind, MarkerRegistry, PlacedMarker};
use crate::sdk::{MapHandle, MapOptions, MapRegion, MapSurface};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OnceCell};
use tracing::{debug, error, info};
use truckstop_core::config::{ConfigSchema, StyleRule};
use truckstop_geo::Coordinate;

/// Title of the driver's own marker.
pub const SELF_MARKER_TITLE: &str = "Your Location";

/// One map surface bound to one region.
pub struct MapSession {
    surface: Arc<dyn MapSurface>,
    center: Coordinate,
    zoom: u8,
    idle: AsyncMutex<Option<Pending<()>>>,
    ready: OnceCell<()>,
}

impl MapSession {
    fn new(surface: Arc<dyn MapSurface>, center: Coordinate, zoom: u8) -> Self {
        let (cb, pending) = callback("map_idle");
        surface.add_idle_listener_once(cb);
        Self {
            surface,
            center,
            zoom,
            idle: AsyncMutex::new(Some(pending)),
            ready: OnceCell::new(),
        }
    }

    /// Handle for SDK calls against this surface.
    pub fn handle(&self) -> &MapHandle {
        self.surface.handle()
    }

    /// Coordinate the map was centered on at construction.
    pub fn center(&self) -> Coordinate {
        self.center
    }

    /// Zoom level the map was constructed with.
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// True once the idle signal has fired and the self marker is placed.
    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }

    /// Waits for the first idle signal, then places the self marker at the
    /// session center. Later calls return immediately.
    ///
    /// A caller that goes away mid-wait leaves the observer in place, so the
    /// next caller still sees the signal.
    pub async fn wait_until_ready(&self, markers: &MarkerRegistry) -> Result<(), MapInitError> {
        self.ready
            .get_or_try_init(|| async {
                let mut idle = self.idle.lock().await;
                let Some(pending) = idle.as_mut() else {
                    return Err(MapInitError::IdleSignalLost(
                        "idle observer already consumed".into(),
                    ));
                };
                let signal = pending.await;
                *idle = None;
                drop(idle);
                signal.map_err(|e| MapInitError::IdleSignalLost(e.to_string()))?;

                debug!(region = %self.handle().region(), "Map idle");
                self.place_self_marker(markers, self.center);
                Ok(())
            })
            .await
            .map(|_| ())
    }

    /// Starts a new clear + populate cycle: every marker is removed and the
    /// self marker is placed at `position`.
    pub fn place_self_marker(
        &self,
        markers: &MarkerRegistry,
        position: Coordinate,
    ) -> Option<PlacedMarker> {
        markers.clear_markers();
        markers.add_marker(self.handle(), position, SELF_MARKER_TITLE, MarkerKind::SelfLocation)
    }
}

/// Result of [`MapSessions::initialize`].
#[derive(Clone)]
pub enum Initialized {
    /// A new surface was constructed
    Created(Arc<MapSession>),
    /// The region already had a session; nothing was constructed
    Existing(Arc<MapSession>),
}

impl Initialized {
    /// The session either way.
    pub fn session(&self) -> &Arc<MapSession> {
        match self {
            Self::Created(session) | Self::Existing(session) => session,
        }
    }

    /// True when this call constructed the surface.
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Registry of map sessions keyed by region.
pub struct MapSessions {
    sessions: Mutex<HashMap<MapRegion, Arc<MapSession>>>,
    zoom: u8,
    styles: Vec<StyleRule>,
    map_id: Option<String>,
}

impl MapSessions {
    /// Sessions built with the `[map]` settings and the configured map id.
    pub fn from_config(config: &ConfigSchema) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            zoom: config.map.zoom,
            styles: config.map.styles.clone(),
            map_id: config.maps.map_id.clone(),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<MapRegion, Arc<MapSession>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Constructs the map for `region` centered on `center`, unless the region
    /// already has one. Requires a loaded, non-errored SDK.
    pub fn initialize(
        &self,
        loader: &ScriptLoader,
        region: &MapRegion,
        center: Coordinate,
    ) -> Result<Initialized, MapInitError> {
        let sdk = loader.sdk()?;

        let mut sessions = self.sessions();
        if let Some(existing) = sessions.get(region) {
            debug!(%region, "Map already initialized");
            return Ok(Initialized::Existing(Arc::clone(existing)));
        }

        let options = MapOptions {
            center,
            zoom: self.zoom,
            styles: self.styles.clone(),
            map_id: self.map_id.clone(),
        };
        let surface = sdk.create_map(region, &options).map_err(|e| {
            error!(%region, error = %e, "Error initializing map");
            MapInitError::Construction(e.to_string())
        })?;

        info!(%region, latitude = center.latitude, longitude = center.longitude, zoom = self.zoom, "Map created");
        let session = Arc::new(MapSession::new(surface, center, self.zoom));
        sessions.insert(region.clone(), Arc::clone(&session));
        Ok(Initialized::Created(session))
    }

    /// The session bound to `region`, if any.
    pub fn get(&self, region: &MapRegion) -> Option<Arc<MapSession>> {
        self.sessions().get(region).cloned()
    }

    /// Forgets the session for `region`; a later `initialize` builds a new one.
    pub fn release(&self, region: &MapRegion) -> Option<Arc<MapSession>> {
        self.sessions().remove(region)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    /// True when no session exists.
    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScriptLoadError;
    use crate::testing::{FakeHost, FakeSdk};

    async fn loaded(sdk: &Arc<FakeSdk>) -> Arc<ScriptLoader> {
        let host = Arc::new(FakeHost::new(sdk.clone()));
        let loader = ScriptLoader::new(host, &ConfigSchema::default().maps);
        loader.ensure_loaded().await;
        loader
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent_per_region() {
        let sdk = Arc::new(FakeSdk::new());
        let loader = loaded(&sdk).await;
        let sessions = MapSessions::from_config(&ConfigSchema::default());
        let region = MapRegion::new("nearby-map");

        let first = sessions.initialize(&loader, &region, Coordinate::new(1.0, 2.0)).unwrap();
        let second = sessions.initialize(&loader, &region, Coordinate::new(3.0, 4.0)).unwrap();

        assert!(first.is_created());
        assert!(!second.is_created());
        assert!(Arc::ptr_eq(first.session(), second.session()));
        assert_eq!(sdk.maps_created(), 1);
        assert_eq!(second.session().center(), Coordinate::new(1.0, 2.0));
    }

    #[tokio::test]
    async fn test_separate_regions_get_separate_maps() {
        let sdk = Arc::new(FakeSdk::new());
        let loader = loaded(&sdk).await;
        let sessions = MapSessions::from_config(&ConfigSchema::default());

        sessions.initialize(&loader, &MapRegion::new("a"), Coordinate::new(0.0, 0.0)).unwrap();
        sessions.initialize(&loader, &MapRegion::new("b"), Coordinate::new(0.0, 0.0)).unwrap();

        assert_eq!(sdk.maps_created(), 2);
        assert_eq!(sessions.len(), 2);
    }

    #[tokio::test]
    async fn test_map_options_use_zoom_and_muted_styles() {
        let sdk = Arc::new(FakeSdk::new());
        let loader = loaded(&sdk).await;
        let sessions = MapSessions::from_config(&ConfigSchema::default());

        sessions.initialize(&loader, &MapRegion::new("m"), Coordinate::new(5.0, 6.0)).unwrap();

        let options = sdk.last_map_options().unwrap();
        assert_eq!(options.zoom, 13);
        assert_eq!(options.center, Coordinate::new(5.0, 6.0));
        assert!(options.styles.iter().any(|s| s.element_type == "labels.icon"
            && s.visibility.as_deref() == Some("off")));
    }

    #[tokio::test]
    async fn test_construction_failure_is_reported() {
        let sdk = Arc::new(FakeSdk::new().with_failing_maps());
        let loader = loaded(&sdk).await;
        let sessions = MapSessions::from_config(&ConfigSchema::default());

        let err = sessions
            .initialize(&loader, &MapRegion::new("m"), Coordinate::new(0.0, 0.0))
            .err()
            .unwrap();

        assert!(matches!(err, MapInitError::Construction(_)));
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn test_requires_loaded_sdk() {
        let sdk = Arc::new(FakeSdk::new());
        let host = Arc::new(FakeHost::new(sdk.clone()));
        let loader = ScriptLoader::new(host, &ConfigSchema::default().maps);
        let sessions = MapSessions::from_config(&ConfigSchema::default());

        let err = sessions
            .initialize(&loader, &MapRegion::new("m"), Coordinate::new(0.0, 0.0))
            .err()
            .unwrap();

        assert_eq!(err, MapInitError::SdkUnavailable(ScriptLoadError::NotLoaded));
        assert_eq!(sdk.maps_created(), 0);
    }

    #[tokio::test]
    async fn test_self_marker_waits_for_idle() {
        let sdk = Arc::new(FakeSdk::new().with_manual_idle());
        let loader = loaded(&sdk).await;
        let sessions = MapSessions::from_config(&ConfigSchema::default());
        let markers = MarkerRegistry::new(loader.sdk().unwrap());

        let init = sessions.initialize(&loader, &MapRegion::new("m"), Coordinate::new(1.0, 1.0)).unwrap();
        let session = Arc::clone(init.session());

        let mut wait = tokio_test::task::spawn(session.wait_until_ready(&markers));
        assert!(wait.poll().is_pending());
        assert!(markers.is_empty());
        assert!(!session.is_ready());

        assert_eq!(sdk.fire_idle(), 1);
        assert!(wait.is_woken());
        assert!(matches!(wait.poll(), std::task::Poll::Ready(Ok(()))));
        drop(wait);

        assert!(session.is_ready());
        let placed = markers.markers();
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].kind, MarkerKind::SelfLocation);
        assert_eq!(placed[0].title, SELF_MARKER_TITLE);

        session.wait_until_ready(&markers).await.unwrap();
        assert_eq!(markers.len(), 1);
        assert_eq!(sdk.markers_created(), 1);
    }

    #[tokio::test]
    async fn test_place_self_marker_clears_previous_cycle() {
        let sdk = Arc::new(FakeSdk::new());
        let loader = loaded(&sdk).await;
        let sessions = MapSessions::from_config(&ConfigSchema::default());
        let markers = MarkerRegistry::new(loader.sdk().unwrap());
        let init = sessions.initialize(&loader, &MapRegion::new("m"), Coordinate::new(1.0, 1.0)).unwrap();
        let session = init.session();
        session.wait_until_ready(&markers).await.unwrap();
        markers.add_marker(session.handle(), Coordinate::new(1.1, 1.1), "Shell", MarkerKind::Result);
        assert_eq!(markers.len(), 2);

        session.place_self_marker(&markers, Coordinate::new(2.0, 2.0));

        let placed = markers.markers();
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].position, Coordinate::new(2.0, 2.0));
    }

    #[tokio::test]
    async fn test_release_allows_fresh_session() {
        let sdk = Arc::new(FakeSdk::new());
        let loader = loaded(&sdk).await;
        let sessions = MapSessions::from_config(&ConfigSchema::default());
        let region = MapRegion::new("m");

        sessions.initialize(&loader, &region, Coordinate::new(0.0, 0.0)).unwrap();
        assert!(sessions.release(&region).is_some());
        let again = sessions.initialize(&loader, &region, Coordinate::new(0.0, 0.0)).unwrap();

        assert!(again.is_created());
        assert_eq!(sdk.maps_created(), 2);
    }
}
