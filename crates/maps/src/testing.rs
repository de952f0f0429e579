//! In-memory fakes of the SDK host, the SDK and the device position.
//!
//! Enabled for this crate's tests and, through the `testing` feature, for
//! downstream crates that want to drive a [`crate::NearbyFinder`] without a
//! network.

#![allow(missing_docs)]

use crate::location::{Geolocation, PositionCallback, PositionError, PositionOptions};
use crate::sdk::{
    AdvancedMarkerElement, AdvancedMarkerOptions, AuthFailureHook, LegacyMarker,
    LegacyMarkerOptions, MapHandle, MapOptions, MapRegion, MapSurface, MapsSdk,
    NearbySearchCallback, NearbySearchRequest, PinStyle, PlaceRecord, PlacesStatus, ScriptTag,
    SdkError, SdkHost, SymbolIcon,
};
use crate::callback::Callback;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use truckstop_geo::Coordinate;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A host whose loader resource either resolves to a fixed SDK or fails.
pub struct FakeHost {
    sdk: Option<Arc<FakeSdk>>,
    preinstalled: bool,
    inject_calls: AtomicUsize,
    removed: AtomicUsize,
    hook: Mutex<Option<AuthFailureHook>>,
}

impl FakeHost {
    /// The loader resource resolves to `sdk`.
    pub fn new(sdk: Arc<FakeSdk>) -> Self {
        Self {
            sdk: Some(sdk),
            preinstalled: false,
            inject_calls: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
            hook: Mutex::new(None),
        }
    }

    /// `sdk` is already present before anything is injected.
    pub fn preinstalled(sdk: Arc<FakeSdk>) -> Self {
        Self {
            preinstalled: true,
            ..Self::new(sdk)
        }
    }

    /// The loader resource fails to load.
    pub fn failing() -> Self {
        Self {
            sdk: None,
            preinstalled: false,
            inject_calls: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
            hook: Mutex::new(None),
        }
    }

    pub fn inject_calls(&self) -> usize {
        self.inject_calls.load(Ordering::SeqCst)
    }

    pub fn removed_scripts(&self) -> usize {
        self.removed.load(Ordering::SeqCst)
    }

    pub fn has_auth_hook(&self) -> bool {
        lock(&self.hook).is_some()
    }

    /// Invokes the installed auth-failure hook; false when none is installed.
    pub fn fire_auth_failure(&self) -> bool {
        let hook = lock(&self.hook).clone();
        match hook {
            Some(hook) => {
                hook();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl SdkHost for FakeHost {
    fn installed_sdk(&self) -> Option<Arc<dyn MapsSdk>> {
        if self.preinstalled {
            self.sdk.clone().map(|sdk| sdk as Arc<dyn MapsSdk>)
        } else {
            None
        }
    }

    async fn inject_script(&self, _script: &ScriptTag) -> Result<Arc<dyn MapsSdk>, SdkError> {
        self.inject_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        match &self.sdk {
            Some(sdk) => Ok(Arc::clone(sdk) as Arc<dyn MapsSdk>),
            None => Err(SdkError::new("network error")),
        }
    }

    fn remove_script(&self, _script: &ScriptTag) {
        self.removed.fetch_add(1, Ordering::SeqCst);
    }

    fn set_auth_failure_hook(&self, hook: Option<AuthFailureHook>) {
        *lock(&self.hook) = hook;
    }
}

/// How the fake answers a nearby search.
#[derive(Debug, Clone)]
pub enum SearchReply {
    /// Invoke the callback with this answer
    Respond(PlacesStatus, Vec<PlaceRecord>),
    /// Fail while building the request
    Throw(String),
    /// Drop the callback without invoking it
    Drop,
    /// Keep the callback and never answer
    Hold,
}

struct FakeSurface {
    handle: MapHandle,
    manual_idle: bool,
    idle: Mutex<Option<Callback<()>>>,
}

impl MapSurface for FakeSurface {
    fn handle(&self) -> &MapHandle {
        &self.handle
    }

    fn add_idle_listener_once(&self, callback: Callback<()>) {
        if self.manual_idle {
            *lock(&self.idle) = Some(callback);
        } else {
            callback.invoke(());
        }
    }
}

struct FakeMarker {
    attached: Arc<AtomicUsize>,
    on_map: AtomicBool,
}

impl FakeMarker {
    fn attach(attached: &Arc<AtomicUsize>) -> Self {
        attached.fetch_add(1, Ordering::SeqCst);
        Self {
            attached: Arc::clone(attached),
            on_map: AtomicBool::new(true),
        }
    }

    fn detach(&self) {
        if self.on_map.swap(false, Ordering::SeqCst) {
            self.attached.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl LegacyMarker for FakeMarker {
    fn set_map(&self, map: Option<&MapHandle>) {
        match map {
            Some(_) => {
                if !self.on_map.swap(true, Ordering::SeqCst) {
                    self.attached.fetch_add(1, Ordering::SeqCst);
                }
            }
            None => self.detach(),
        }
    }
}

impl AdvancedMarkerElement for FakeMarker {
    fn clear_map(&self) {
        self.detach();
    }
}

/// A scripted SDK that records what it was asked to build.
pub struct FakeSdk {
    advanced: bool,
    fail_maps: bool,
    fail_markers: bool,
    manual_idle: bool,
    next_map_id: AtomicU64,
    surfaces: Mutex<Vec<Arc<FakeSurface>>>,
    last_map_options: Mutex<Option<MapOptions>>,
    markers_created: AtomicUsize,
    attached: Arc<AtomicUsize>,
    last_icon: Mutex<Option<SymbolIcon>>,
    last_pin: Mutex<Option<PinStyle>>,
    reply: Mutex<SearchReply>,
    searches: AtomicUsize,
    last_search: Mutex<Option<NearbySearchRequest>>,
    held: Mutex<Vec<NearbySearchCallback>>,
}

impl Default for FakeSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSdk {
    /// Legacy markers only, idle fires immediately, searches return no places.
    pub fn new() -> Self {
        Self {
            advanced: false,
            fail_maps: false,
            fail_markers: false,
            manual_idle: false,
            next_map_id: AtomicU64::new(1),
            surfaces: Mutex::new(Vec::new()),
            last_map_options: Mutex::new(None),
            markers_created: AtomicUsize::new(0),
            attached: Arc::new(AtomicUsize::new(0)),
            last_icon: Mutex::new(None),
            last_pin: Mutex::new(None),
            reply: Mutex::new(SearchReply::Respond(PlacesStatus::Ok, Vec::new())),
            searches: AtomicUsize::new(0),
            last_search: Mutex::new(None),
            held: Mutex::new(Vec::new()),
        }
    }

    pub fn with_advanced_markers(mut self) -> Self {
        self.advanced = true;
        self
    }

    pub fn with_failing_maps(mut self) -> Self {
        self.fail_maps = true;
        self
    }

    pub fn with_failing_markers(mut self) -> Self {
        self.fail_markers = true;
        self
    }

    /// Idle only fires on [`FakeSdk::fire_idle`].
    pub fn with_manual_idle(mut self) -> Self {
        self.manual_idle = true;
        self
    }

    /// Sets how every following search is answered.
    pub fn reply_with(&self, reply: SearchReply) {
        *lock(&self.reply) = reply;
    }

    /// Answers searches with `OK` and the given places.
    pub fn respond_with(&self, places: Vec<PlaceRecord>) {
        self.reply_with(SearchReply::Respond(PlacesStatus::Ok, places));
    }

    /// Fires every pending idle observer; returns how many fired.
    pub fn fire_idle(&self) -> usize {
        let pending: Vec<Callback<()>> = lock(&self.surfaces)
            .iter()
            .filter_map(|surface| lock(&surface.idle).take())
            .collect();
        let fired = pending.len();
        for cb in pending {
            cb.invoke(());
        }
        fired
    }

    pub fn maps_created(&self) -> usize {
        lock(&self.surfaces).len()
    }

    pub fn last_map_options(&self) -> Option<MapOptions> {
        lock(&self.last_map_options).clone()
    }

    pub fn markers_created(&self) -> usize {
        self.markers_created.load(Ordering::SeqCst)
    }

    /// Markers currently attached to a map.
    pub fn attached_markers(&self) -> usize {
        self.attached.load(Ordering::SeqCst)
    }

    pub fn last_legacy_icon(&self) -> Option<SymbolIcon> {
        lock(&self.last_icon).clone()
    }

    pub fn last_pin(&self) -> Option<PinStyle> {
        lock(&self.last_pin).clone()
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn last_search(&self) -> Option<NearbySearchRequest> {
        lock(&self.last_search).clone()
    }
}

impl MapsSdk for FakeSdk {
    fn create_map(&self, region: &MapRegion, options: &MapOptions) -> Result<Arc<dyn MapSurface>, SdkError> {
        if self.fail_maps {
            return Err(SdkError::new("map container not found"));
        }
        *lock(&self.last_map_options) = Some(options.clone());
        let surface = Arc::new(FakeSurface {
            handle: MapHandle::new(self.next_map_id.fetch_add(1, Ordering::SeqCst), region.clone()),
            manual_idle: self.manual_idle,
            idle: Mutex::new(None),
        });
        lock(&self.surfaces).push(Arc::clone(&surface));
        Ok(surface)
    }

    fn advanced_markers_available(&self) -> bool {
        self.advanced
    }

    fn new_advanced_marker(&self, options: AdvancedMarkerOptions) -> Result<Box<dyn AdvancedMarkerElement>, SdkError> {
        if self.fail_markers {
            return Err(SdkError::new("marker library missing"));
        }
        self.markers_created.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_pin) = Some(options.pin);
        Ok(Box::new(FakeMarker::attach(&self.attached)))
    }

    fn new_legacy_marker(&self, options: LegacyMarkerOptions) -> Result<Box<dyn LegacyMarker>, SdkError> {
        if self.fail_markers {
            return Err(SdkError::new("marker library missing"));
        }
        self.markers_created.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_icon) = Some(options.icon);
        Ok(Box::new(FakeMarker::attach(&self.attached)))
    }

    fn nearby_search(
        &self,
        _map: &MapHandle,
        request: NearbySearchRequest,
        callback: NearbySearchCallback,
    ) -> Result<(), SdkError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_search) = Some(request);
        let reply = lock(&self.reply).clone();
        match reply {
            SearchReply::Respond(status, places) => {
                callback.invoke((status, places));
                Ok(())
            }
            SearchReply::Throw(message) => Err(SdkError::new(message)),
            SearchReply::Drop => Ok(()),
            SearchReply::Hold => {
                lock(&self.held).push(callback);
                Ok(())
            }
        }
    }
}

enum Fix {
    Answer(Result<Coordinate, PositionError>),
    Silent,
}

/// A device whose answer is scripted.
pub struct FakeGeolocation {
    fix: Mutex<Fix>,
    calls: AtomicUsize,
    last_options: Mutex<Option<PositionOptions>>,
    unanswered: Mutex<Vec<PositionCallback>>,
}

impl FakeGeolocation {
    fn with_fix(fix: Fix) -> Self {
        Self {
            fix: Mutex::new(fix),
            calls: AtomicUsize::new(0),
            last_options: Mutex::new(None),
            unanswered: Mutex::new(Vec::new()),
        }
    }

    /// Answers with `position`.
    pub fn at(position: Coordinate) -> Self {
        Self::with_fix(Fix::Answer(Ok(position)))
    }

    /// Answers with `error`.
    pub fn failing(error: PositionError) -> Self {
        Self::with_fix(Fix::Answer(Err(error)))
    }

    /// Never answers; the request has to time out.
    pub fn silent() -> Self {
        Self::with_fix(Fix::Silent)
    }

    /// Changes the answer for following requests.
    pub fn set_fix(&self, fix: Result<Coordinate, PositionError>) {
        *lock(&self.fix) = Fix::Answer(fix);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<PositionOptions> {
        *lock(&self.last_options)
    }
}

impl Geolocation for FakeGeolocation {
    fn get_current_position(&self, options: &PositionOptions, callback: PositionCallback) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_options) = Some(*options);
        match &*lock(&self.fix) {
            Fix::Answer(answer) => callback.invoke(answer.clone()),
            Fix::Silent => lock(&self.unanswered).push(callback),
        }
    }
}

/// `count` places around `origin`, a few hundred meters apart.
pub fn places_around(origin: Coordinate, count: usize) -> Vec<PlaceRecord> {
    (0..count)
        .map(|i| PlaceRecord {
            place_id: Some(format!("place-{i}")),
            name: Some(format!("Station {i}")),
            vicinity: Some(format!("{i} Main Street")),
            location: Some(Coordinate::new(
                origin.latitude + 0.003 * (i as f64 + 1.0),
                origin.longitude,
            )),
        })
        .collect()
}
