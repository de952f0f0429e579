//! End-to-end nearby-station flow.
//!
//! [`NearbyFinder`] chains the units: the script loader at start, then on
//! request the location provider, the map session for a region, and the place
//! search once the map is idle. Failures never escape as errors from the
//! driving calls; they are recorded as the strings a UI shows and reflected in
//! [`FinderState`]. Every stage can be retried by calling it again.

use crate::error::{MapInitError, MapsError, ScriptLoadError, SearchError};
use crate::loader::{LoadState, LoaderGuard, ScriptLoader};
use crate::location::LocationProvider;
use crate::markers::{MarkerRegistry, PlacedMarker};
use crate::pricing::PriceSource;
use crate::sdk::MapRegion;
use crate::search::{PlaceResult, PlaceSearch};
use crate::session::{Initialized, MapSession, MapSessions};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use truckstop_core::config::ConfigSchema;
use truckstop_geo::Coordinate;

/// Where the flow currently is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "kebab-case")]
pub enum FinderState {
    /// Nothing started yet
    Idle,
    /// The SDK is loading
    ScriptLoading,
    /// The SDK failed to load or rejected its key
    ScriptError(String),
    /// The SDK is usable
    ScriptReady,
    /// Waiting for the device position
    LocationRequesting,
    /// The device position could not be acquired
    LocationError(String),
    /// The device position is known
    LocationReady,
    /// Constructing the map surface
    MapInitializing,
    /// Map constructed, waiting for the first idle signal
    MapIdleWait,
    /// Map idle and ready for drawing
    MapReady,
    /// Proximity search in flight
    SearchRunning,
    /// The search failed or found nothing
    SearchEmpty(String),
    /// The search produced this many results
    SearchResults(usize),
}

impl FinderState {
    /// Kebab-case name of the state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ScriptLoading => "script-loading",
            Self::ScriptError(_) => "script-error",
            Self::ScriptReady => "script-ready",
            Self::LocationRequesting => "location-requesting",
            Self::LocationError(_) => "location-error",
            Self::LocationReady => "location-ready",
            Self::MapInitializing => "map-initializing",
            Self::MapIdleWait => "map-idle-wait",
            Self::MapReady => "map-ready",
            Self::SearchRunning => "search-running",
            Self::SearchEmpty(_) => "search-empty",
            Self::SearchResults(_) => "search-results",
        }
    }

    /// True for the terminal error states of each sub-flow.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::ScriptError(_) | Self::LocationError(_) | Self::SearchEmpty(_)
        )
    }
}

impl fmt::Display for FinderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a view needs to render the finder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinderSnapshot {
    /// Current flow state
    pub state: FinderState,
    /// The SDK is loaded and not errored
    pub map_loaded: bool,
    /// A location request or search is in flight
    pub loading: bool,
    /// Location or search failure shown in the banner
    pub error: Option<String>,
    /// SDK or map construction failure
    pub map_error: Option<String>,
    /// Last acquired position
    pub user_location: Option<Coordinate>,
    /// Results of the last completed search
    pub stations: Vec<PlaceResult>,
    /// Markers currently on the map
    pub markers: Vec<PlacedMarker>,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Locating,
    Searching,
}

impl Stage {
    fn running_state(self) -> FinderState {
        match self {
            Self::Locating => FinderState::LocationRequesting,
            Self::Searching => FinderState::SearchRunning,
        }
    }
}

/// One location request or search in flight.
///
/// The `loading` count is released when the guard drops, on every exit path.
/// A guard dropped without [`InFlight::settle`] belongs to an abandoned
/// future: the finder goes back to the state it was in before the stage
/// started, unless another call has moved it on since.
struct InFlight<'a> {
    finder: &'a NearbyFinder,
    stage: Stage,
    resume: Option<FinderState>,
}

impl<'a> InFlight<'a> {
    fn enter(finder: &'a NearbyFinder, stage: Stage) -> Self {
        let resume = finder.state();
        {
            let mut progress = finder.progress();
            match stage {
                Stage::Locating => {
                    progress.locating += 1;
                    progress.location_error = None;
                }
                Stage::Searching => {
                    progress.searching += 1;
                    progress.search_error = None;
                }
            }
        }
        finder.transition(stage.running_state());
        Self {
            finder,
            stage,
            resume: Some(resume),
        }
    }

    /// The stage produced an outcome; the caller records it.
    fn settle(mut self) {
        self.resume = None;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        {
            let mut progress = self.finder.progress();
            let count = match self.stage {
                Stage::Locating => &mut progress.locating,
                Stage::Searching => &mut progress.searching,
            };
            *count = count.saturating_sub(1);
        }
        if let Some(resume) = self.resume.take() {
            let running = self.stage.running_state();
            let restored = self.finder.state.send_if_modified(|state| {
                if *state == running {
                    *state = resume;
                    true
                } else {
                    false
                }
            });
            debug!(stage = ?self.stage, restored, "In-flight stage abandoned");
        }
    }
}

#[derive(Default)]
struct Progress {
    user_location: Option<Coordinate>,
    stations: Vec<PlaceResult>,
    location_error: Option<String>,
    search_error: Option<String>,
    map_error: Option<String>,
    last_failure: Option<MapsError>,
    locating: usize,
    searching: usize,
}

/// Drives the loader, location, map and search units for one view.
pub struct NearbyFinder {
    loader: Arc<ScriptLoader>,
    _guard: LoaderGuard,
    location: LocationProvider,
    sessions: MapSessions,
    search: PlaceSearch,
    markers: OnceLock<MarkerRegistry>,
    progress: Mutex<Progress>,
    state: watch::Sender<FinderState>,
}

impl NearbyFinder {
    /// A finder sharing `loader` with any other view. The loader's resources
    /// are torn down when the last finder using it is dropped.
    pub fn new(loader: Arc<ScriptLoader>, location: LocationProvider, config: &ConfigSchema) -> Self {
        let (state, _) = watch::channel(FinderState::Idle);
        Self {
            _guard: loader.attach(),
            loader,
            location,
            sessions: MapSessions::from_config(config),
            search: PlaceSearch::from_config(config),
            markers: OnceLock::new(),
            progress: Mutex::new(Progress::default()),
            state,
        }
    }

    /// Replaces the price source used for results.
    pub fn with_prices(mut self, prices: Arc<dyn PriceSource>) -> Self {
        self.search = PlaceSearch::new(self.search.config().clone(), prices);
        self
    }

    fn progress(&self) -> MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, next: FinderState) {
        debug!(state = %next, "Finder state");
        self.state.send_replace(next);
    }

    fn record(&self, failure: impl Into<MapsError>) -> MapsError {
        let failure = failure.into();
        self.progress().last_failure = Some(failure.clone());
        failure
    }

    /// The marker registry, only while the SDK is usable.
    fn markers(&self) -> Result<&MarkerRegistry, ScriptLoadError> {
        let sdk = self.loader.sdk()?;
        Ok(self.markers.get_or_init(|| MarkerRegistry::new(sdk)))
    }

    /// The shared loader.
    pub fn loader(&self) -> &Arc<ScriptLoader> {
        &self.loader
    }

    /// Map sessions owned by this finder.
    pub fn sessions(&self) -> &MapSessions {
        &self.sessions
    }

    /// Loads the SDK. Safe to call repeatedly; only the first call loads.
    pub async fn start(&self) -> LoadState {
        self.transition(FinderState::ScriptLoading);
        let state = self.loader.ensure_loaded().await;
        match &state.error {
            Some(message) => {
                warn!(error = %message, "Maps unavailable");
                if let Err(e) = self.loader.sdk() {
                    self.record(e);
                }
                self.transition(FinderState::ScriptError(message.clone()));
            }
            None => self.transition(FinderState::ScriptReady),
        }
        state
    }

    /// Whether the location button is enabled: the SDK is loaded without error.
    pub fn can_request_location(&self) -> bool {
        self.loader.state().is_ready()
    }

    /// Requests the device position once.
    pub async fn request_location(&self) -> Result<Coordinate, MapsError> {
        if let Err(e) = self.loader.sdk() {
            return Err(self.record(e));
        }

        let in_flight = InFlight::enter(self, Stage::Locating);
        let outcome = self.location.request_location().await;
        in_flight.settle();

        let mut progress = self.progress();
        match outcome {
            Ok(position) => {
                progress.user_location = Some(position);
                drop(progress);
                self.transition(FinderState::LocationReady);
                Ok(position)
            }
            Err(e) => {
                progress.location_error = Some(e.to_string());
                drop(progress);
                self.transition(FinderState::LocationError(e.to_string()));
                Err(self.record(e))
            }
        }
    }

    /// Builds the map for `region` around the last position and waits until
    /// it is idle. An existing session for the region is reused as is.
    pub async fn initialize_map(&self, region: &MapRegion) -> Result<Initialized, MapsError> {
        let result = self.try_initialize_map(region).await;
        if let Err(e) = &result {
            self.progress().map_error = Some(e.to_string());
            self.record(e.clone());
        }
        result
    }

    async fn try_initialize_map(&self, region: &MapRegion) -> Result<Initialized, MapsError> {
        let center = self
            .progress()
            .user_location
            .ok_or(MapInitError::MissingLocation)?;
        let markers = self.markers().map_err(MapInitError::from)?;

        self.transition(FinderState::MapInitializing);
        let initialized = self.sessions.initialize(&self.loader, region, center)?;
        self.progress().map_error = None;

        if !initialized.session().is_ready() {
            self.transition(FinderState::MapIdleWait);
        }
        initialized.session().wait_until_ready(markers).await?;
        self.transition(FinderState::MapReady);
        Ok(initialized)
    }

    /// The full user-triggered chain: position, map, search. Returns the
    /// resulting snapshot; failures are reported in it.
    pub async fn locate_and_search(&self, region: &MapRegion) -> FinderSnapshot {
        let Ok(position) = self.request_location().await else {
            return self.snapshot();
        };
        let was_ready = self.sessions.get(region).is_some_and(|s| s.is_ready());
        let initialized = match self.initialize_map(region).await {
            Ok(initialized) => initialized,
            Err(_) => return self.snapshot(),
        };

        match initialized {
            // The idle signal that just made the map ready already placed the
            // self marker at `position`.
            Initialized::Existing(session) if was_ready || session.center() != position => {
                self.repopulate(&session, position).await;
            }
            Initialized::Created(session) | Initialized::Existing(session) => {
                self.run_search(&session, position).await;
            }
        }
        self.snapshot()
    }

    /// Re-runs the clear, self-marker and search cycle on the existing map
    /// for `region` without re-creating it.
    pub async fn refresh(&self, region: &MapRegion) -> FinderSnapshot {
        let position = self.progress().user_location;
        let session = self.sessions.get(region).filter(|s| s.is_ready());
        match (position, session) {
            (Some(position), Some(session)) => self.repopulate(&session, position).await,
            (None, _) => {
                let e = self.record(MapInitError::MissingLocation);
                self.progress().map_error = Some(e.to_string());
            }
            (Some(_), None) => {
                let e = self.record(SearchError::MapNotReady);
                self.progress().search_error = Some(e.to_string());
            }
        }
        self.snapshot()
    }

    async fn repopulate(&self, session: &MapSession, position: Coordinate) {
        match self.markers() {
            Ok(markers) => {
                session.place_self_marker(markers, position);
                self.run_search(session, position).await;
            }
            Err(e) => self.fail_search(SearchError::from(e)),
        }
    }

    async fn run_search(&self, session: &MapSession, origin: Coordinate) {
        let markers = match self.markers() {
            Ok(markers) => markers,
            Err(e) => return self.fail_search(SearchError::from(e)),
        };

        let in_flight = InFlight::enter(self, Stage::Searching);
        let outcome = self.search.search(&self.loader, markers, session, origin).await;
        in_flight.settle();

        match outcome {
            Ok(stations) => {
                let count = stations.len();
                self.progress().stations = stations;
                info!(count, "Nearby search complete");
                self.transition(FinderState::SearchResults(count));
            }
            Err(e) => self.fail_search(e),
        }
    }

    fn fail_search(&self, e: SearchError) {
        let message = e.to_string();
        {
            let mut progress = self.progress();
            progress.search_error = Some(message.clone());
            progress.stations.clear();
        }
        self.record(e);
        self.transition(FinderState::SearchEmpty(message));
    }

    /// Current state.
    pub fn state(&self) -> FinderState {
        self.state.borrow().clone()
    }

    /// Watches state transitions.
    pub fn subscribe(&self) -> watch::Receiver<FinderState> {
        self.state.subscribe()
    }

    /// The most recent failure of any stage, with its error code.
    pub fn last_failure(&self) -> Option<MapsError> {
        self.progress().last_failure.clone()
    }

    /// Renders the current view state.
    pub fn snapshot(&self) -> FinderSnapshot {
        let load = self.loader.state();
        let markers = self.markers.get().map(MarkerRegistry::markers).unwrap_or_default();
        let progress = self.progress();
        FinderSnapshot {
            state: self.state(),
            map_loaded: load.is_ready(),
            loading: progress.locating > 0 || progress.searching > 0,
            error: progress
                .location_error
                .clone()
                .or_else(|| progress.search_error.clone()),
            map_error: load.error.or_else(|| progress.map_error.clone()),
            user_location: progress.user_location,
            stations: progress.stations.clone(),
            markers,
        }
    }
}
