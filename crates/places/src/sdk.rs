//! [`MapsSdk`] over the maps web services.

use crate::client::PlacesClient;
use crate::surface::{HeadlessMap, HeadlessMarker};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tracing::{debug, warn};
use truckstop_maps::sdk::{
    AdvancedMarkerElement, AdvancedMarkerOptions, AuthFailureHook, LegacyMarker,
    LegacyMarkerOptions, MapHandle, MapOptions, MapRegion, MapSurface, MapsSdk,
    NearbySearchCallback, NearbySearchRequest, PlaceRecord, PlacesStatus, SdkError,
};

/// Slot shared between the host, which installs the hook, and the SDK, which
/// fires it.
pub(crate) type HookSlot = Arc<Mutex<Option<AuthFailureHook>>>;

/// The loaded SDK: headless maps plus the Places web service.
pub struct HttpMapsSdk {
    client: PlacesClient,
    next_map: AtomicU64,
    auth_hook: HookSlot,
}

impl HttpMapsSdk {
    pub(crate) fn new(client: PlacesClient, auth_hook: HookSlot) -> Self {
        Self {
            client,
            next_map: AtomicU64::new(1),
            auth_hook,
        }
    }
}

fn fire_auth_failure(slot: &HookSlot) {
    let hook = slot.lock().unwrap_or_else(PoisonError::into_inner).clone();
    match hook {
        Some(hook) => hook(),
        None => debug!("Request denied with no auth-failure hook installed"),
    }
}

impl MapsSdk for HttpMapsSdk {
    fn create_map(
        &self,
        region: &MapRegion,
        options: &MapOptions,
    ) -> Result<Arc<dyn MapSurface>, SdkError> {
        if region.id().trim().is_empty() {
            return Err(SdkError::new("map container not found"));
        }
        let handle = MapHandle::new(self.next_map.fetch_add(1, Ordering::Relaxed), region.clone());
        debug!(%region, zoom = options.zoom, "Headless map created");
        Ok(Arc::new(HeadlessMap::new(handle, options.clone())))
    }

    fn advanced_markers_available(&self) -> bool {
        self.client.config().map_id.is_some()
    }

    fn new_advanced_marker(
        &self,
        options: AdvancedMarkerOptions,
    ) -> Result<Box<dyn AdvancedMarkerElement>, SdkError> {
        if !self.advanced_markers_available() {
            return Err(SdkError::new("advanced markers require a map id"));
        }
        Ok(Box::new(HeadlessMarker::attached(options.position, options.title)))
    }

    fn new_legacy_marker(
        &self,
        options: LegacyMarkerOptions,
    ) -> Result<Box<dyn LegacyMarker>, SdkError> {
        Ok(Box::new(HeadlessMarker::attached(options.position, options.title)))
    }

    fn nearby_search(
        &self,
        _map: &MapHandle,
        request: NearbySearchRequest,
        callback: NearbySearchCallback,
    ) -> Result<(), SdkError> {
        let runtime = Handle::try_current()
            .map_err(|e| SdkError::new(format!("no async runtime available: {e}")))?;
        let client = self.client.clone();
        let auth_hook = Arc::clone(&self.auth_hook);

        runtime.spawn(async move {
            let answer = match client.nearby_search(&request).await {
                Ok(response) => {
                    let status = response.status();
                    if status == PlacesStatus::RequestDenied {
                        warn!(
                            reason = response.error_message.as_deref().unwrap_or("none given"),
                            "Places request denied"
                        );
                        fire_auth_failure(&auth_hook);
                    }
                    let places: Vec<PlaceRecord> =
                        response.results.into_iter().map(PlaceRecord::from).collect();
                    (status, places)
                }
                Err(e) => {
                    warn!(error = %e, "Nearby search request failed");
                    (PlacesStatus::UnknownError, Vec::new())
                }
            };
            callback.invoke(answer);
        });
        Ok(())
    }
}
