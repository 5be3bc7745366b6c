use std::sync::Arc;

use futures::future::try_join_all;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::CacheStorage;
use crate::http::{Request, Served};
use crate::network::Network;

use super::error::WorkerError;
use super::fetch::{network_first, FetchContext};
use super::lifecycle::{LifecycleEvent, WorkerState};
use super::script::{ControlMessage, WorkerScript};

/// One cache manager version.
///
/// The worker owns the work attached to each lifecycle transition and
/// applies the transition only after that work has finished or failed.
pub struct CacheWorker {
    id: u64,
    script: WorkerScript,
    app_url: Url,
    storage: Arc<CacheStorage>,
    network: Arc<dyn Network>,
    state: watch::Sender<WorkerState>,
}

impl CacheWorker {
    /// A freshly evaluated worker, about to install
    pub fn new(
        id: u64,
        script: WorkerScript,
        app_url: Url,
        storage: Arc<CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self::with_state(id, script, app_url, storage, network, WorkerState::Installing)
    }

    /// A worker restored in a known state (e.g. from a saved registration)
    pub fn with_state(
        id: u64,
        script: WorkerScript,
        app_url: Url,
        storage: Arc<CacheStorage>,
        network: Arc<dyn Network>,
        state: WorkerState,
    ) -> Self {
        let (state, _) = watch::channel(state);
        Self {
            id,
            script,
            app_url,
            storage,
            network,
            state,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn script(&self) -> &WorkerScript {
        &self.script
    }

    /// Name of this version's cache store
    pub fn cache_name(&self) -> &str {
        &self.script.cache_name
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Observe state changes
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    /// Apply a lifecycle event
    pub fn advance(&self, event: LifecycleEvent) -> Result<WorkerState, WorkerError> {
        let next = self.state().on(event)?;
        self.state.send_replace(next);
        debug!(worker = self.id, cache = self.cache_name(), state = ?next, "Worker state changed");
        Ok(next)
    }

    // ===== Install =====

    /// Fetch the whole manifest and store it in this version's store.
    ///
    /// All assets are fetched before anything is written, so a failure
    /// leaves no partial entries. Re-running it overwrites the same keys.
    pub async fn precache(&self) -> Result<usize, WorkerError> {
        let requests = self
            .script
            .precache
            .iter()
            .map(|asset| {
                self.app_url
                    .join(asset)
                    .map(Request::get)
                    .map_err(|_| WorkerError::InvalidAsset(asset.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.storage.open(self.cache_name()).await?;

        let network = self.network.as_ref();
        let entries = try_join_all(requests.into_iter().map(|request| async move {
            let response =
                network
                    .fetch(&request)
                    .await
                    .map_err(|source| WorkerError::AssetUnreachable {
                        url: request.url.to_string(),
                        source,
                    })?;
            if !response.is_success() {
                return Err(WorkerError::AssetStatus {
                    url: request.url.to_string(),
                    status: response.status,
                });
            }
            Ok((request, response))
        }))
        .await?;

        let count = entries.len();
        self.storage.put_precached(self.cache_name(), entries).await?;
        Ok(count)
    }

    /// Install this version: precache the manifest, then move to `Waiting`,
    /// or to `Redundant` if any asset could not be cached.
    pub async fn install(&self) -> Result<usize, WorkerError> {
        let from = self.state();
        if from != WorkerState::Installing {
            return Err(WorkerError::InvalidTransition {
                from,
                event: LifecycleEvent::InstallSucceeded,
            });
        }

        match self.precache().await {
            Ok(count) => {
                self.advance(LifecycleEvent::InstallSucceeded)?;
                info!(cache = self.cache_name(), assets = count, "Cached static assets");
                Ok(count)
            }
            Err(e) => {
                self.advance(LifecycleEvent::InstallFailed)?;
                warn!(cache = self.cache_name(), error = %e, "Install failed, discarding worker");
                Err(e)
            }
        }
    }

    // ===== Activate =====

    /// Delete every cache store except this version's, then move to
    /// `Active`. Returns the names of the deleted stores.
    pub async fn activate(&self) -> Result<Vec<String>, WorkerError> {
        let from = self.state();
        if from != WorkerState::Waiting {
            return Err(WorkerError::InvalidTransition {
                from,
                event: LifecycleEvent::Activated,
            });
        }

        let mut deleted = Vec::new();
        for name in self.storage.keys().await {
            if name == self.cache_name() {
                continue;
            }
            match self.storage.delete(&name).await {
                Ok(_) => {
                    info!(cache = %name, "Deleted stale cache store");
                    deleted.push(name);
                }
                // The in-memory store is gone; only its file lingers
                Err(e) => {
                    warn!(cache = %name, error = %e, "Failed to remove stale cache file");
                    deleted.push(name);
                }
            }
        }

        self.advance(LifecycleEvent::Activated)?;
        Ok(deleted)
    }

    // ===== Fetch & message =====

    /// Answer a request network-first from this version's store
    pub async fn handle_fetch(&self, request: &Request) -> Served {
        let ctx = FetchContext {
            storage: self.storage.as_ref(),
            cache_name: &self.script.cache_name,
            app_url: &self.app_url,
        };
        network_first(request, &ctx, self.network.as_ref()).await
    }

    /// Decode a posted message; only skip-waiting is understood
    pub fn handle_message(&self, message: &serde_json::Value) -> Option<ControlMessage> {
        let parsed = ControlMessage::parse(message);
        if let Some(msg) = parsed {
            debug!(worker = self.id, message = ?msg, "Received control message");
        }
        parsed
    }
}
