//! [`SdkHost`] backed by the maps web services.
//!
//! "Injecting" the loader script means fetching it once; a successful fetch
//! yields an [`HttpMapsSdk`]. The auth-failure hook is fired later by the SDK
//! whenever the Places service denies a request.

use crate::client::PlacesClient;
use crate::config::PlacesConfig;
use crate::error::PlacesResult;
use crate::sdk::{HookSlot, HttpMapsSdk};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};
use truckstop_maps::sdk::{AuthFailureHook, MapsSdk, ScriptTag, SdkError, SdkHost};

/// Host that loads the SDK over HTTP.
pub struct HttpSdkHost {
    client: PlacesClient,
    auth_hook: HookSlot,
    script_present: AtomicBool,
}

impl HttpSdkHost {
    /// Creates a host; fails on invalid configuration or a missing API key.
    pub fn new(config: PlacesConfig) -> PlacesResult<Self> {
        Ok(Self {
            client: PlacesClient::with_config(config)?,
            auth_hook: Arc::new(Mutex::new(None)),
            script_present: AtomicBool::new(false),
        })
    }

    /// The underlying client.
    pub fn client(&self) -> &PlacesClient {
        &self.client
    }

    /// Whether the loader script is currently considered injected.
    pub fn script_present(&self) -> bool {
        self.script_present.load(Ordering::Acquire)
    }

    /// Whether an auth-failure hook is installed.
    pub fn has_auth_hook(&self) -> bool {
        self.auth_hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

#[async_trait]
impl SdkHost for HttpSdkHost {
    fn installed_sdk(&self) -> Option<Arc<dyn MapsSdk>> {
        None
    }

    async fn inject_script(&self, script: &ScriptTag) -> Result<Arc<dyn MapsSdk>, SdkError> {
        debug!(src = %redact_key(script.src()), "Fetching maps loader script");
        self.client.fetch_script(script.src()).await.map_err(|e| {
            warn!(error = %e, "Loader script fetch failed");
            SdkError::new(e.to_string())
        })?;
        self.script_present.store(true, Ordering::Release);
        Ok(Arc::new(HttpMapsSdk::new(
            self.client.clone(),
            Arc::clone(&self.auth_hook),
        )))
    }

    fn remove_script(&self, _script: &ScriptTag) {
        self.script_present.store(false, Ordering::Release);
        debug!("Maps loader script removed");
    }

    fn set_auth_failure_hook(&self, hook: Option<AuthFailureHook>) {
        *self.auth_hook.lock().unwrap_or_else(PoisonError::into_inner) = hook;
    }
}

/// Replaces the `key` query value so URLs can be logged.
fn redact_key(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let query: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some(("key", _)) => "key=***".to_string(),
            _ => pair.to_string(),
        })
        .collect();
    format!("{base}?{}", query.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_key() {
        assert_eq!(
            redact_key("https://x/js?key=secret&libraries=places&v=weekly"),
            "https://x/js?key=***&libraries=places&v=weekly"
        );
        assert_eq!(redact_key("https://x/js"), "https://x/js");
    }

    #[test]
    fn test_hook_slot_round_trip() {
        let host = HttpSdkHost::new(PlacesConfig::default().with_api_key("k")).unwrap();
        assert!(!host.has_auth_hook());
        host.set_auth_failure_hook(Some(Arc::new(|| {})));
        assert!(host.has_auth_hook());
        host.set_auth_failure_hook(None);
        assert!(!host.has_auth_hook());
    }
}
