//! Marker registry: the only owner of pins drawn on the map.
//!
//! The SDK offers two marker APIs. Which one is used is decided per marker by
//! a capability check, and the two are unified behind a private enum so the
//! registry can detach either kind the same way.

use crate::sdk::{
    AdvancedMarkerElement, AdvancedMarkerOptions, LegacyMarker, LegacyMarkerOptions, MapHandle,
    MapsSdk, PinStyle, SdkError, SymbolIcon, SymbolPath,
};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error};
use truckstop_geo::Coordinate;

const SELF_COLOR: &str = "#1a73e8";
const RESULT_COLOR: &str = "#ff6d01";
const OUTLINE_COLOR: &str = "#ffffff";

/// What a marker stands for; drives its styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// The driver's own position
    SelfLocation,
    /// A search result
    Result,
}

impl MarkerKind {
    fn fill_color(self) -> &'static str {
        match self {
            Self::SelfLocation => SELF_COLOR,
            Self::Result => RESULT_COLOR,
        }
    }

    fn icon(self) -> SymbolIcon {
        SymbolIcon {
            path: SymbolPath::Circle,
            scale: match self {
                Self::SelfLocation => 10.0,
                Self::Result => 8.0,
            },
            fill_color: self.fill_color().to_string(),
            fill_opacity: 1.0,
            stroke_weight: 2.0,
            stroke_color: OUTLINE_COLOR.to_string(),
        }
    }

    fn pin(self) -> PinStyle {
        PinStyle {
            background: self.fill_color().to_string(),
            border_color: OUTLINE_COLOR.to_string(),
            glyph_color: OUTLINE_COLOR.to_string(),
            scale: match self {
                Self::SelfLocation => 1.25,
                Self::Result => 1.0,
            },
        }
    }
}

/// Which SDK API built a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerApi {
    /// Classic marker with a vector icon
    Legacy,
    /// Advanced marker element with a pin
    Advanced,
}

/// Description of a pin currently on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedMarker {
    /// Marker position
    pub position: Coordinate,
    /// Hover title
    pub title: String,
    /// Self or result
    pub kind: MarkerKind,
    /// API that built it
    pub api: MarkerApi,
}

enum Marker {
    Legacy(Box<dyn LegacyMarker>),
    Modern(Box<dyn AdvancedMarkerElement>),
}

impl Marker {
    fn detach(&self) {
        match self {
            Self::Legacy(marker) => marker.set_map(None),
            Self::Modern(element) => element.clear_map(),
        }
    }
}

struct Entry {
    marker: Marker,
    placed: PlacedMarker,
}

/// Owns every marker on the map.
pub struct MarkerRegistry {
    sdk: Arc<dyn MapsSdk>,
    entries: Mutex<Vec<Entry>>,
}

impl MarkerRegistry {
    /// An empty registry building markers through `sdk`.
    pub fn new(sdk: Arc<dyn MapsSdk>) -> Self {
        Self {
            sdk,
            entries: Mutex::new(Vec::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Builds a marker with whichever API is available and records it.
    ///
    /// Construction failures are logged and swallowed; the caller's flow goes
    /// on without the pin.
    pub fn add_marker(
        &self,
        map: &MapHandle,
        position: Coordinate,
        title: &str,
        kind: MarkerKind,
    ) -> Option<PlacedMarker> {
        match self.build(map, position, title, kind) {
            Ok((marker, api)) => {
                let placed = PlacedMarker {
                    position,
                    title: title.to_string(),
                    kind,
                    api,
                };
                debug!(?kind, ?api, title, "Marker added");
                self.entries().push(Entry {
                    marker,
                    placed: placed.clone(),
                });
                Some(placed)
            }
            Err(e) => {
                error!(error = %e, title, "Error adding marker");
                None
            }
        }
    }

    fn build(
        &self,
        map: &MapHandle,
        position: Coordinate,
        title: &str,
        kind: MarkerKind,
    ) -> Result<(Marker, MarkerApi), SdkError> {
        if self.sdk.advanced_markers_available() {
            let element = self.sdk.new_advanced_marker(AdvancedMarkerOptions {
                map: map.clone(),
                position,
                title: title.to_string(),
                pin: kind.pin(),
            })?;
            Ok((Marker::Modern(element), MarkerApi::Advanced))
        } else {
            let marker = self.sdk.new_legacy_marker(LegacyMarkerOptions {
                map: map.clone(),
                position,
                title: title.to_string(),
                icon: kind.icon(),
            })?;
            Ok((Marker::Legacy(marker), MarkerApi::Legacy))
        }
    }

    /// Detaches every marker from the map and empties the registry.
    pub fn clear_markers(&self) {
        let drained: Vec<Entry> = self.entries().drain(..).collect();
        for entry in &drained {
            entry.marker.detach();
        }
        if !drained.is_empty() {
            debug!(count = drained.len(), "Markers cleared");
        }
    }

    /// Number of markers on the map.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// True when no marker is on the map.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// The markers currently on the map, in insertion order.
    pub fn markers(&self) -> Vec<PlacedMarker> {
        self.entries().iter().map(|e| e.placed.clone()).collect()
    }
}

impl Drop for MarkerRegistry {
    fn drop(&mut self) {
        self.clear_markers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::MapRegion;
    use crate::testing::FakeSdk;
    use proptest::prelude::*;

    fn handle() -> MapHandle {
        MapHandle::new(1, MapRegion::new("map"))
    }

    #[test]
    fn test_legacy_markers_when_advanced_unavailable() {
        let sdk = Arc::new(FakeSdk::new());
        let registry = MarkerRegistry::new(sdk.clone());

        let placed = registry
            .add_marker(&handle(), Coordinate::new(1.0, 2.0), "Your Location", MarkerKind::SelfLocation)
            .unwrap();

        assert_eq!(placed.api, MarkerApi::Legacy);
        let icon = sdk.last_legacy_icon().unwrap();
        assert_eq!(icon.scale, 10.0);
        assert_eq!(icon.fill_color, "#1a73e8");
        assert_eq!(icon.stroke_color, "#ffffff");
    }

    #[test]
    fn test_advanced_markers_when_available() {
        let sdk = Arc::new(FakeSdk::new().with_advanced_markers());
        let registry = MarkerRegistry::new(sdk.clone());

        let placed = registry
            .add_marker(&handle(), Coordinate::new(1.0, 2.0), "Shell", MarkerKind::Result)
            .unwrap();

        assert_eq!(placed.api, MarkerApi::Advanced);
        assert_eq!(sdk.last_pin().unwrap().background, "#ff6d01");
    }

    #[test]
    fn test_construction_failure_is_swallowed() {
        let sdk = Arc::new(FakeSdk::new().with_failing_markers());
        let registry = MarkerRegistry::new(sdk);

        let placed =
            registry.add_marker(&handle(), Coordinate::new(1.0, 2.0), "Shell", MarkerKind::Result);

        assert!(placed.is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clear_detaches_every_marker() {
        let sdk = Arc::new(FakeSdk::new());
        let registry = MarkerRegistry::new(sdk.clone());
        for i in 0..3 {
            registry.add_marker(&handle(), Coordinate::new(i as f64, 0.0), "m", MarkerKind::Result);
        }
        assert_eq!(sdk.attached_markers(), 3);

        registry.clear_markers();

        assert!(registry.is_empty());
        assert_eq!(sdk.attached_markers(), 0);
        registry.clear_markers();
        assert_eq!(sdk.attached_markers(), 0);
    }

    #[test]
    fn test_drop_detaches_markers() {
        let sdk = Arc::new(FakeSdk::new().with_advanced_markers());
        {
            let registry = MarkerRegistry::new(sdk.clone());
            registry.add_marker(&handle(), Coordinate::new(0.0, 0.0), "m", MarkerKind::Result);
            assert_eq!(sdk.attached_markers(), 1);
        }
        assert_eq!(sdk.attached_markers(), 0);
    }

    proptest! {
        #[test]
        fn clear_then_add_leaves_exactly_the_new_markers(before in 0usize..8, after in 0usize..8, advanced: bool) {
            let sdk = if advanced {
                Arc::new(FakeSdk::new().with_advanced_markers())
            } else {
                Arc::new(FakeSdk::new())
            };
            let registry = MarkerRegistry::new(sdk.clone());
            for _ in 0..before {
                registry.add_marker(&handle(), Coordinate::new(0.0, 0.0), "old", MarkerKind::Result);
            }

            registry.clear_markers();
            for _ in 0..after {
                registry.add_marker(&handle(), Coordinate::new(0.0, 0.0), "new", MarkerKind::Result);
            }

            prop_assert_eq!(registry.len(), after);
            prop_assert_eq!(sdk.attached_markers(), after);
        }
    }
}
