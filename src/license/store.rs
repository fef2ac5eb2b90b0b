//! License status store, the single owner of the current license snapshot.
//!
//! Lifecycle: idle -> loading -> (ready | errored), re-entered by `refresh`.
//! Concurrent refreshes are not serialized; whichever resolves last wins.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::client::LicenseClient;
use super::entitlements;
use super::error::TransportError;
use super::normalize::normalize;
use super::types::LicenseSnapshot;

/// Point-in-time copy of the store's state.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub snapshot: Option<Arc<LicenseSnapshot>>,
    pub loading: bool,
    pub last_error: Option<TransportError>,
}

pub struct LicenseStore {
    state: RwLock<StoreState>,
    client: Arc<dyn LicenseClient>,
    activated: AtomicBool,
    refresh_seq: AtomicU64,
}

impl LicenseStore {
    /// Create an empty store. Nothing is fetched until `activate` or `refresh`.
    pub fn new(client: Arc<dyn LicenseClient>) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            client,
            activated: AtomicBool::new(false),
            refresh_seq: AtomicU64::new(0),
        }
    }

    /// Start the automatic initial refresh on first activation.
    ///
    /// Returns the spawned task the first time; later calls return `None`.
    pub fn activate(self: &Arc<Self>) -> Option<tokio::task::JoinHandle<()>> {
        if self.activated.swap(true, Ordering::SeqCst) {
            return None;
        }
        let store = Arc::clone(self);
        Some(tokio::spawn(async move {
            store.refresh().await;
        }))
    }

    /// Fetch, normalize and install a fresh snapshot.
    ///
    /// Failures are recorded in `last_error`, never returned.
    pub async fn refresh(&self) {
        let seq = self.refresh_seq.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.write();
            state.loading = true;
            state.last_error = None;
        }
        debug!(seq, "License refresh started");

        let result = self.client.fetch_license_status().await;

        let mut state = self.state.write();
        match result {
            Ok(raw) => {
                let snapshot = normalize(Some(&raw)).map(Arc::new);
                if let Some(snapshot) = &snapshot {
                    info!(
                        seq,
                        status = %snapshot.status,
                        is_valid = snapshot.is_valid,
                        "License status refreshed"
                    );
                } else {
                    warn!(seq, "License server returned an empty status document");
                }
                state.snapshot = snapshot;
                state.last_error = None;
            }
            Err(e) => {
                warn!(seq, error = %e, "License refresh failed");
                state.snapshot = None;
                state.last_error = Some(e);
            }
        }
        state.loading = false;
    }

    pub fn snapshot(&self) -> Option<Arc<LicenseSnapshot>> {
        self.state.read().snapshot.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.read().loading
    }

    pub fn last_error(&self) -> Option<TransportError> {
        self.state.read().last_error.clone()
    }

    pub fn state(&self) -> StoreState {
        self.state.read().clone()
    }

    pub fn can_use(&self, feature_key: Option<&str>) -> bool {
        let snapshot = self.snapshot();
        entitlements::can_use(snapshot.as_deref(), feature_key)
    }

    pub fn disabled_reason(&self, feature_key: &str, allowed: bool) -> Option<String> {
        let snapshot = self.snapshot();
        entitlements::disabled_reason(snapshot.as_deref(), feature_key, allowed)
    }

    pub(crate) fn client(&self) -> &Arc<dyn LicenseClient> {
        &self.client
    }
}
