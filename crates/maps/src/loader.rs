//! Script loader: brings the mapping SDK into the host exactly once.
//!
//! The loader owns the process-wide SDK state. Consumers share one
//! `Arc<ScriptLoader>`, register with [`ScriptLoader::attach`], and only see
//! the SDK through [`ScriptLoader::state`], [`ScriptLoader::subscribe`] and
//! [`ScriptLoader::sdk`]. When the last [`LoaderGuard`] drops, the injected
//! loader resource is removed and the auth-failure hook is cleared.
//!
//! Load failures are terminal: once `error` is set no further attempt is made
//! for the lifetime of the loader.

use crate::error::{ScriptLoadError, AUTH_FAILURE, SCRIPT_LOAD_FAILED};
use crate::sdk::{MapsSdk, ScriptTag, SdkHost};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::{watch, OnceCell};
use tracing::{debug, error, info, warn};
use truckstop_core::config::MapsConfig;

/// SDK readiness as seen by every dependent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadState {
    /// The loader resource finished loading
    pub loaded: bool,
    /// Terminal failure message, if any
    pub error: Option<String>,
}

impl LoadState {
    /// Loaded and not errored; the only state in which the SDK may be used.
    pub fn is_ready(&self) -> bool {
        self.loaded && self.error.is_none()
    }
}

/// Process-wide owner of the SDK load.
pub struct ScriptLoader {
    host: Arc<dyn SdkHost>,
    script: ScriptTag,
    state: Arc<watch::Sender<LoadState>>,
    auth_failed: Arc<AtomicBool>,
    sdk: OnceLock<Arc<dyn MapsSdk>>,
    attempt: OnceCell<()>,
    injected: AtomicBool,
    consumers: AtomicUsize,
}

/// Keeps the loader's shared resources alive; the last one dropped tears
/// them down.
#[must_use = "dropping the guard may tear the SDK down"]
pub struct LoaderGuard {
    loader: Arc<ScriptLoader>,
}

impl ScriptLoader {
    /// Creates the loader for a host. Nothing is injected until
    /// [`ScriptLoader::ensure_loaded`] runs.
    pub fn new(host: Arc<dyn SdkHost>, config: &MapsConfig) -> Arc<Self> {
        let (state, _) = watch::channel(LoadState::default());
        Arc::new(Self {
            host,
            script: ScriptTag::from_config(config),
            state: Arc::new(state),
            auth_failed: Arc::new(AtomicBool::new(false)),
            sdk: OnceLock::new(),
            attempt: OnceCell::new(),
            injected: AtomicBool::new(false),
            consumers: AtomicUsize::new(0),
        })
    }

    /// Registers a consumer of the shared SDK resources.
    pub fn attach(self: &Arc<Self>) -> LoaderGuard {
        self.consumers.fetch_add(1, Ordering::AcqRel);
        LoaderGuard {
            loader: Arc::clone(self),
        }
    }

    /// Number of live [`LoaderGuard`]s.
    pub fn consumers(&self) -> usize {
        self.consumers.load(Ordering::Acquire)
    }

    /// Loads the SDK on first call; later and concurrent calls share that
    /// single attempt and return the current state.
    pub async fn ensure_loaded(&self) -> LoadState {
        self.attempt.get_or_init(|| self.load_once()).await;
        self.state()
    }

    /// Current load state.
    pub fn state(&self) -> LoadState {
        self.state.borrow().clone()
    }

    /// Watches load state changes, including late auth failures.
    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.state.subscribe()
    }

    /// The SDK, only when loaded and not errored.
    pub fn sdk(&self) -> Result<Arc<dyn MapsSdk>, ScriptLoadError> {
        if let Some(message) = self.state().error {
            return Err(if self.auth_failed.load(Ordering::Acquire) {
                ScriptLoadError::AuthFailure(message)
            } else {
                ScriptLoadError::LoadFailed(message)
            });
        }
        self.sdk.get().cloned().ok_or(ScriptLoadError::NotLoaded)
    }

    async fn load_once(&self) {
        if let Some(sdk) = self.host.installed_sdk() {
            debug!("Maps SDK already present, skipping loader injection");
            let _ = self.sdk.set(sdk);
            self.state.send_modify(|s| s.loaded = true);
            return;
        }

        let state = Arc::clone(&self.state);
        let auth_failed = Arc::clone(&self.auth_failed);
        self.host.set_auth_failure_hook(Some(Arc::new(move || {
            error!("Maps SDK rejected the API key");
            auth_failed.store(true, Ordering::Release);
            state.send_modify(|s| s.error = Some(AUTH_FAILURE.to_string()));
        })));

        self.injected.store(true, Ordering::Release);
        debug!("Injecting maps loader script");

        match self.host.inject_script(&self.script).await {
            Ok(sdk) => {
                let _ = self.sdk.set(sdk);
                self.state.send_modify(|s| s.loaded = true);
                info!("Maps loaded successfully");
            }
            Err(e) => {
                warn!(error = %e, "Failed to load maps loader script");
                self.state.send_modify(|s| {
                    s.loaded = false;
                    s.error = Some(SCRIPT_LOAD_FAILED.to_string());
                });
            }
        }
    }

    fn teardown(&self) {
        if self.injected.swap(false, Ordering::AcqRel) {
            self.host.remove_script(&self.script);
        }
        self.host.set_auth_failure_hook(None);
        debug!("Maps loader torn down");
    }
}

impl LoaderGuard {
    /// The loader this guard keeps alive.
    pub fn loader(&self) -> &Arc<ScriptLoader> {
        &self.loader
    }
}

impl Drop for LoaderGuard {
    fn drop(&mut self) {
        if self.loader.consumers.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.loader.teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeHost, FakeSdk};

    fn loader_for(host: &Arc<FakeHost>) -> Arc<ScriptLoader> {
        ScriptLoader::new(host.clone(), &MapsConfig::default())
    }

    #[tokio::test]
    async fn test_preinstalled_sdk_resolves_without_injection() {
        let host = Arc::new(FakeHost::preinstalled(Arc::new(FakeSdk::new())));
        let loader = loader_for(&host);

        let state = loader.ensure_loaded().await;

        assert!(state.is_ready());
        assert_eq!(host.inject_calls(), 0);
        assert!(!host.has_auth_hook());
        assert!(loader.sdk().is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_injection() {
        let host = Arc::new(FakeHost::new(Arc::new(FakeSdk::new())));
        let loader = loader_for(&host);

        let (a, b, c) = tokio::join!(
            loader.ensure_loaded(),
            loader.ensure_loaded(),
            loader.ensure_loaded()
        );

        assert!(a.is_ready() && b.is_ready() && c.is_ready());
        assert_eq!(host.inject_calls(), 1);
        assert!(host.has_auth_hook());
    }

    #[tokio::test]
    async fn test_load_failure_is_terminal() {
        let host = Arc::new(FakeHost::failing());
        let loader = loader_for(&host);

        let state = loader.ensure_loaded().await;
        assert!(!state.loaded);
        assert_eq!(state.error.as_deref(), Some(SCRIPT_LOAD_FAILED));

        let again = loader.ensure_loaded().await;
        assert_eq!(again, state);
        assert_eq!(host.inject_calls(), 1);
        assert!(matches!(loader.sdk(), Err(ScriptLoadError::LoadFailed(_))));
    }

    #[tokio::test]
    async fn test_sdk_not_available_before_load() {
        let host = Arc::new(FakeHost::new(Arc::new(FakeSdk::new())));
        let loader = loader_for(&host);
        assert!(matches!(loader.sdk(), Err(ScriptLoadError::NotLoaded)));
    }

    #[tokio::test]
    async fn test_auth_failure_after_load_is_observed() {
        let host = Arc::new(FakeHost::new(Arc::new(FakeSdk::new())));
        let loader = loader_for(&host);
        let mut updates = loader.subscribe();

        assert!(loader.ensure_loaded().await.is_ready());
        updates.mark_unchanged();

        assert!(host.fire_auth_failure());

        updates.changed().await.unwrap();
        let seen = updates.borrow().clone();
        assert!(seen.loaded);
        assert_eq!(seen.error.as_deref(), Some(AUTH_FAILURE));
        assert!(!loader.state().is_ready());
        assert!(matches!(loader.sdk(), Err(ScriptLoadError::AuthFailure(_))));
    }

    #[tokio::test]
    async fn test_last_guard_tears_down_shared_resources() {
        let host = Arc::new(FakeHost::new(Arc::new(FakeSdk::new())));
        let loader = loader_for(&host);

        let first = loader.attach();
        let second = loader.attach();
        loader.ensure_loaded().await;
        assert_eq!(loader.consumers(), 2);

        drop(first);
        assert_eq!(host.removed_scripts(), 0);
        assert!(host.has_auth_hook());

        drop(second);
        assert_eq!(loader.consumers(), 0);
        assert_eq!(host.removed_scripts(), 1);
        assert!(!host.has_auth_hook());
        assert!(!host.fire_auth_failure());
    }
}
