//! Headless map surface and markers.
//!
//! Nothing is drawn: a headless map settles as soon as it exists, so the idle
//! signal is delivered on the next scheduler turn. Markers only track whether
//! they are attached.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::runtime::Handle;
use tracing::trace;
use truckstop_geo::Coordinate;
use truckstop_maps::callback::Callback;
use truckstop_maps::sdk::{AdvancedMarkerElement, LegacyMarker, MapHandle, MapOptions, MapSurface};

/// A map surface with no pixels.
pub struct HeadlessMap {
    handle: MapHandle,
    options: MapOptions,
}

impl HeadlessMap {
    /// A surface for `handle` built with `options`.
    pub fn new(handle: MapHandle, options: MapOptions) -> Self {
        Self { handle, options }
    }

    /// Options the map was built with.
    pub fn options(&self) -> &MapOptions {
        &self.options
    }
}

impl MapSurface for HeadlessMap {
    fn handle(&self) -> &MapHandle {
        &self.handle
    }

    fn add_idle_listener_once(&self, callback: Callback<()>) {
        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    tokio::task::yield_now().await;
                    callback.invoke(());
                });
            }
            Err(_) => callback.invoke(()),
        }
    }
}

/// A marker that remembers whether it is on a map.
pub struct HeadlessMarker {
    position: Coordinate,
    title: String,
    attached: AtomicBool,
}

impl HeadlessMarker {
    /// A marker already attached to its map.
    pub fn attached(position: Coordinate, title: impl Into<String>) -> Self {
        Self {
            position,
            title: title.into(),
            attached: AtomicBool::new(true),
        }
    }

    /// Whether the marker is on a map.
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    fn set_attached(&self, attached: bool) {
        self.attached.store(attached, Ordering::Release);
        trace!(title = %self.title, position = %self.position, attached, "Marker attachment changed");
    }
}

impl LegacyMarker for HeadlessMarker {
    fn set_map(&self, map: Option<&MapHandle>) {
        self.set_attached(map.is_some());
    }
}

impl AdvancedMarkerElement for HeadlessMarker {
    fn clear_map(&self) {
        self.set_attached(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use truckstop_maps::callback::callback;
    use truckstop_maps::sdk::MapRegion;

    fn map() -> HeadlessMap {
        HeadlessMap::new(
            MapHandle::new(1, MapRegion::new("m")),
            MapOptions {
                center: Coordinate::new(0.0, 0.0),
                zoom: 13,
                styles: Vec::new(),
                map_id: None,
            },
        )
    }

    #[tokio::test]
    async fn test_idle_fires_on_runtime() {
        let (cb, pending) = callback("idle");
        map().add_idle_listener_once(cb);
        assert_eq!(pending.wait().await, Ok(()));
    }

    #[test]
    fn test_idle_fires_without_runtime() {
        let (cb, pending) = callback("idle");
        map().add_idle_listener_once(cb);
        assert_eq!(tokio_test::block_on(pending.wait()), Ok(()));
    }

    #[test]
    fn test_marker_detach() {
        let marker = HeadlessMarker::attached(Coordinate::new(1.0, 1.0), "Your Location");
        assert!(marker.is_attached());
        LegacyMarker::set_map(&marker, None);
        assert!(!marker.is_attached());
    }
}
