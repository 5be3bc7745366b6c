//! The platform side of worker registration.
//!
//! `WorkerHost` plays the role the browser plays for a service worker: it
//! fetches the worker script, runs installs and activations as serialized
//! jobs, keeps the installing / waiting / active slots, and routes the
//! page's fetches through the active worker once the page is controlled.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::cache::{CacheStorage, RetentionPolicy};
use crate::http::{Request, ResponseSource, Served};
use crate::network::error::truncate_body;
use crate::network::{Network, NetworkError};
use crate::worker::{CacheWorker, ControlMessage, LifecycleEvent, WorkerScript, WorkerState};

use super::error::RegistrationError;
use super::record::{RecordFile, RegistrationRecord};
use super::status::{RegistrationStatus, UpdateOutcome};

/// Subdirectory of the cache directory holding the cache stores
const STORES_DIR: &str = "stores";

struct Registration {
    scope: String,
    script_url: Url,
    installing: Option<Arc<CacheWorker>>,
    waiting: Option<Arc<CacheWorker>>,
    active: Option<Arc<CacheWorker>>,
}

#[derive(Default)]
struct HostState {
    registration: Option<Registration>,
    /// The page loaded while a worker was active
    controlled: bool,
}

pub struct WorkerHost {
    app_url: Url,
    storage: Arc<CacheStorage>,
    network: Arc<dyn Network>,
    supported: bool,
    record_dir: Option<PathBuf>,
    // Register / update / promote run one at a time
    jobs: Mutex<()>,
    state: Mutex<HostState>,
    next_id: AtomicU64,
}

impl WorkerHost {
    /// An in-memory host with no saved registration
    pub fn new(app_url: Url, storage: Arc<CacheStorage>, network: Arc<dyn Network>) -> Self {
        Self {
            app_url,
            storage,
            network,
            supported: true,
            record_dir: None,
            jobs: Mutex::new(()),
            state: Mutex::new(HostState::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// A host backed by `cache_dir`: cache stores and the registration
    /// record are loaded from it and kept up to date there.
    ///
    /// A restarted process is a fresh page load, so it is controlled right
    /// away when a version was active.
    pub fn open(
        app_url: Url,
        cache_dir: &Path,
        network: Arc<dyn Network>,
        policy: RetentionPolicy,
    ) -> Result<Self> {
        let storage = CacheStorage::open_dir(cache_dir.join(STORES_DIR))
            .context("Failed to open cache storage")?
            .with_policy(policy);

        let mut host = Self::new(app_url, Arc::new(storage), network);
        host.record_dir = Some(cache_dir.to_path_buf());

        let mut file = RecordFile::new(cache_dir.to_path_buf());
        if let Err(e) = file.load() {
            warn!(error = %e, "Ignoring unreadable registration record");
        }
        if let Some(record) = file.data {
            let state = host.restore(record)?;
            host.state = Mutex::new(state);
        }

        Ok(host)
    }

    /// Mark the platform as lacking worker support
    pub fn without_worker_support(mut self) -> Self {
        self.supported = false;
        self
    }

    pub fn supports_workers(&self) -> bool {
        self.supported
    }

    pub fn app_url(&self) -> &Url {
        &self.app_url
    }

    pub fn storage(&self) -> &Arc<CacheStorage> {
        &self.storage
    }

    // ===== Registration =====

    /// Register the worker script at `scope`.
    ///
    /// Registering the already registered script returns the existing
    /// registration. Otherwise the script is fetched and installed. When
    /// the install fails and no earlier version exists, the registration is
    /// dropped and `InstallFailed` returned; with an earlier version in
    /// place the failure only shows in the logs and the status.
    pub async fn register(
        &self,
        script_url: &str,
        scope: &str,
    ) -> Result<RegistrationStatus, RegistrationError> {
        if !self.supported {
            return Err(RegistrationError::Unsupported);
        }
        let script_url = self.validate(script_url, scope)?;

        let _job = self.jobs.lock().await;
        {
            let state = self.state.lock().await;
            if let Some(reg) = &state.registration {
                if reg.script_url == script_url {
                    debug!(script = %script_url, "Already registered");
                    return Ok(snapshot(reg, state.controlled));
                }
            }
        }

        let script = self.fetch_script(&script_url).await?;
        {
            let mut state = self.state.lock().await;
            let reg = state.registration.get_or_insert_with(|| Registration {
                scope: scope.to_string(),
                script_url: script_url.clone(),
                installing: None,
                waiting: None,
                active: None,
            });
            reg.script_url = script_url.clone();
        }

        let outcome = self.run_install(script).await;
        debug!(?outcome, "Registration install finished");

        if let UpdateOutcome::InstallFailed { cache_name, reason } = outcome {
            // A registration that never installed a version is cleared so
            // the next register starts over
            let cleared = {
                let mut state = self.state.lock().await;
                let empty = state
                    .registration
                    .as_ref()
                    .is_some_and(|reg| reg.waiting.is_none() && reg.active.is_none());
                if empty {
                    state.registration = None;
                }
                empty
            };
            if cleared {
                self.save_record().await;
                return Err(RegistrationError::InstallFailed { cache_name, reason });
            }
        }
        self.save_record().await;

        self.status().await.ok_or(RegistrationError::NotRegistered)
    }

    /// Re-fetch the script and install it if it differs from the newest
    /// installed version. The active version keeps running meanwhile.
    pub async fn update(&self) -> Result<UpdateOutcome, RegistrationError> {
        let _job = self.jobs.lock().await;
        let (script_url, newest) = {
            let state = self.state.lock().await;
            let reg = state
                .registration
                .as_ref()
                .ok_or(RegistrationError::NotRegistered)?;
            let newest = reg
                .waiting
                .as_ref()
                .or(reg.active.as_ref())
                .map(|w| w.script().clone());
            (reg.script_url.clone(), newest)
        };

        let script = self.fetch_script(&script_url).await?;
        if newest.as_ref() == Some(&script) {
            debug!(cache = %script.cache_name, "Worker script unchanged");
            return Ok(UpdateOutcome::Unchanged);
        }

        let outcome = self.run_install(script).await;
        self.save_record().await;
        Ok(outcome)
    }

    /// Deliver a message to the waiting worker. A skip-waiting message
    /// promotes it to active right away. Returns whether a version was
    /// promoted.
    pub async fn post_message(&self, message: &serde_json::Value) -> bool {
        let _job = self.jobs.lock().await;
        let waiting = {
            let state = self.state.lock().await;
            state
                .registration
                .as_ref()
                .and_then(|reg| reg.waiting.clone())
        };
        let Some(waiting) = waiting else {
            debug!("No waiting worker to receive message");
            return false;
        };

        match waiting.handle_message(message) {
            Some(ControlMessage::SkipWaiting) => {
                let promoted = self.promote_waiting().await;
                self.save_record().await;
                promoted
            }
            None => false,
        }
    }

    /// Reload the page: from now on its fetches go through whichever
    /// version is active.
    pub async fn reload(&self) {
        let mut state = self.state.lock().await;
        let active = state
            .registration
            .as_ref()
            .and_then(|reg| reg.active.as_ref())
            .map(|w| w.cache_name().to_string());
        state.controlled = active.is_some();
        info!(controller = ?active, "Page reloaded");
    }

    /// Drop the registration. Workers become redundant and the page is no
    /// longer controlled; cached data stays until the next activation.
    pub async fn unregister(&self) -> bool {
        let _job = self.jobs.lock().await;
        let removed = {
            let mut state = self.state.lock().await;
            state.controlled = false;
            state.registration.take()
        };
        let Some(reg) = removed else {
            return false;
        };

        for worker in [reg.installing, reg.waiting, reg.active].into_iter().flatten() {
            if let Err(e) = worker.advance(LifecycleEvent::Superseded) {
                debug!(error = %e, "Worker already redundant");
            }
        }
        if let Some(dir) = &self.record_dir {
            if let Err(e) = RecordFile::new(dir.clone()).clear() {
                warn!(error = %e, "Failed to remove registration record");
            }
        }
        info!("Service worker unregistered");
        true
    }

    pub async fn status(&self) -> Option<RegistrationStatus> {
        let state = self.state.lock().await;
        state
            .registration
            .as_ref()
            .map(|reg| snapshot(reg, state.controlled))
    }

    /// The active worker, if any
    pub async fn active(&self) -> Option<Arc<CacheWorker>> {
        let state = self.state.lock().await;
        state.registration.as_ref().and_then(|reg| reg.active.clone())
    }

    pub async fn has_active(&self) -> bool {
        self.active().await.is_some()
    }

    // ===== Fetch =====

    /// Perform a page fetch. Controlled pages go through the active worker
    /// and never fail; uncontrolled pages hit the network directly.
    pub async fn fetch(&self, request: &Request) -> Result<Served, NetworkError> {
        let controller = {
            let state = self.state.lock().await;
            if state.controlled {
                state.registration.as_ref().and_then(|reg| reg.active.clone())
            } else {
                None
            }
        };

        match controller {
            Some(worker) => {
                let served = worker.handle_fetch(request).await;
                debug!(url = %request.url, source = served.source.label(), "Served by worker");
                Ok(served)
            }
            None => {
                let response = self.network.fetch(request).await?;
                Ok(Served::new(response, ResponseSource::Network))
            }
        }
    }

    // ===== Jobs =====

    /// Install `script` as a new version. Caller holds the job lock.
    async fn run_install(&self, script: WorkerScript) -> UpdateOutcome {
        let cache_name = script.cache_name.clone();
        let worker = Arc::new(CacheWorker::new(
            self.next_id.fetch_add(1, Ordering::Relaxed),
            script,
            self.app_url.clone(),
            self.storage.clone(),
            self.network.clone(),
        ));

        {
            let mut state = self.state.lock().await;
            if let Some(reg) = state.registration.as_mut() {
                reg.installing = Some(worker.clone());
            }
        }
        info!(cache = %cache_name, "Service worker installing");

        let result = worker.install().await;

        let needs_activation = {
            let mut state = self.state.lock().await;
            let Some(reg) = state.registration.as_mut() else {
                return UpdateOutcome::InstallFailed {
                    cache_name,
                    reason: "registration removed during install".to_string(),
                };
            };
            reg.installing = None;

            if let Err(e) = result {
                return UpdateOutcome::InstallFailed {
                    cache_name,
                    reason: e.to_string(),
                };
            }

            if let Some(previous) = reg.waiting.replace(worker) {
                if let Err(e) = previous.advance(LifecycleEvent::Superseded) {
                    debug!(error = %e, "Previous waiting worker already redundant");
                }
            }
            reg.active.is_none()
        };

        if needs_activation {
            self.promote_waiting().await;
        } else {
            info!(cache = %cache_name, "Service worker installed, waiting to activate");
        }

        UpdateOutcome::Installed {
            cache_name,
            activated: needs_activation,
        }
    }

    /// Move the waiting worker into the active slot. The outgoing version
    /// leaves the slot before stale stores are deleted, so nothing writes
    /// into them afterwards. Caller holds the job lock.
    async fn promote_waiting(&self) -> bool {
        let (incoming, outgoing) = {
            let mut state = self.state.lock().await;
            let Some(reg) = state.registration.as_mut() else {
                return false;
            };
            let Some(incoming) = reg.waiting.take() else {
                return false;
            };
            (incoming, reg.active.take())
        };

        if let Some(old) = outgoing {
            if let Err(e) = old.advance(LifecycleEvent::Superseded) {
                debug!(error = %e, "Outgoing worker already redundant");
            }
        }

        match incoming.activate().await {
            Ok(deleted) => {
                info!(cache = incoming.cache_name(), deleted = deleted.len(), "Service worker active");
            }
            Err(e) => {
                error!(cache = incoming.cache_name(), error = %e, "Activation failed");
                return false;
            }
        }

        let mut state = self.state.lock().await;
        if let Some(reg) = state.registration.as_mut() {
            reg.active = Some(incoming);
        }
        true
    }

    // ===== Helpers =====

    /// Resolve the script URL and check that it can control the root scope
    fn validate(&self, script_url: &str, scope: &str) -> Result<Url, RegistrationError> {
        if scope != "/" {
            return Err(RegistrationError::InvalidScope(format!(
                "scope must be the root path, got {}",
                scope
            )));
        }
        let url = self
            .app_url
            .join(script_url)
            .map_err(|e| RegistrationError::InvalidScope(format!("{}: {}", script_url, e)))?;
        if url.origin() != self.app_url.origin() {
            return Err(RegistrationError::InvalidScope(format!(
                "script {} is not served from the app origin",
                url
            )));
        }
        if url.path().rfind('/') != Some(0) {
            return Err(RegistrationError::InvalidScope(format!(
                "script {} must be served from the root path",
                url
            )));
        }
        Ok(url)
    }

    /// Fetch and parse the worker script straight from the network
    async fn fetch_script(&self, url: &Url) -> Result<WorkerScript, RegistrationError> {
        let response = self
            .network
            .fetch(&Request::get(url.clone()))
            .await
            .map_err(|source| RegistrationError::ScriptFetch {
                url: url.to_string(),
                source,
            })?;

        if !response.is_success() {
            return Err(RegistrationError::ScriptStatus {
                url: url.to_string(),
                status: response.status,
                body: truncate_body(&response.text()),
            });
        }

        WorkerScript::from_slice(&response.body).map_err(|source| RegistrationError::InvalidScript {
            url: url.to_string(),
            source,
        })
    }

    /// Rebuild the registration from a saved record
    fn restore(&self, record: RegistrationRecord) -> Result<HostState> {
        let script_url = Url::parse(&record.script_url)
            .with_context(|| format!("Invalid script URL in record: {}", record.script_url))?;

        let restore_worker = |script: WorkerScript, state: WorkerState| {
            Arc::new(CacheWorker::with_state(
                self.next_id.fetch_add(1, Ordering::Relaxed),
                script,
                self.app_url.clone(),
                self.storage.clone(),
                self.network.clone(),
                state,
            ))
        };
        let active = record.active.map(|s| restore_worker(s, WorkerState::Active));
        let waiting = record.waiting.map(|s| restore_worker(s, WorkerState::Waiting));
        debug!(
            active = ?active.as_ref().map(|w| w.cache_name().to_string()),
            waiting = ?waiting.as_ref().map(|w| w.cache_name().to_string()),
            "Restored registration"
        );

        Ok(HostState {
            controlled: active.is_some(),
            registration: Some(Registration {
                scope: record.scope,
                script_url,
                installing: None,
                waiting,
                active,
            }),
        })
    }

    async fn save_record(&self) {
        let Some(dir) = &self.record_dir else {
            return;
        };
        let record = {
            let state = self.state.lock().await;
            state.registration.as_ref().map(|reg| RegistrationRecord {
                scope: reg.scope.clone(),
                script_url: reg.script_url.to_string(),
                active: reg.active.as_ref().map(|w| w.script().clone()),
                waiting: reg.waiting.as_ref().map(|w| w.script().clone()),
                updated_at: Utc::now(),
            })
        };
        let mut file = RecordFile::new(dir.clone());
        let Some(record) = record else {
            if let Err(e) = file.clear() {
                warn!(error = %e, "Failed to remove registration record");
            }
            return;
        };

        file.update(record);
        if let Err(e) = file.save() {
            warn!(error = %e, "Failed to save registration record");
        }
    }
}

fn snapshot(reg: &Registration, controlled: bool) -> RegistrationStatus {
    let name = |slot: &Option<Arc<CacheWorker>>| slot.as_ref().map(|w| w.cache_name().to_string());
    RegistrationStatus {
        scope: reg.scope.clone(),
        script_url: reg.script_url.to_string(),
        installing: name(&reg.installing),
        waiting: name(&reg.waiting),
        active: name(&reg.active),
        controlled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Response;
    use crate::test_support::{app_url, get, navigate, StubNetwork};
    use crate::worker::SHELL_ASSETS;

    const SCRIPT: &str = "/service-worker.json";

    fn serve_script(network: &StubNetwork, script: &WorkerScript) {
        network.route(SCRIPT, Response::ok(serde_json::to_vec(script).unwrap()));
    }

    fn host(network: &Arc<StubNetwork>) -> WorkerHost {
        WorkerHost::new(app_url(), Arc::new(CacheStorage::in_memory()), network.clone())
    }

    fn shell_network() -> Arc<StubNetwork> {
        let network = Arc::new(StubNetwork::new());
        network.serve_shell();
        serve_script(&network, &WorkerScript::default());
        network
    }

    #[tokio::test]
    async fn test_first_registration_activates_immediately() {
        let network = shell_network();
        let host = host(&network);

        let status = host.register(SCRIPT, "/").await.unwrap();
        assert_eq!(status.active.as_deref(), Some("kazi-cash-v1"));
        assert_eq!(status.waiting, None);
        // Not controlling the page that registered it
        assert!(!status.controlled);
        assert_eq!(host.storage().entry_count("kazi-cash-v1").await, SHELL_ASSETS.len());
    }

    #[tokio::test]
    async fn test_register_twice_is_a_no_op() {
        let network = shell_network();
        let host = host(&network);

        host.register(SCRIPT, "/").await.unwrap();
        let calls = network.calls();
        let status = host.register(SCRIPT, "/").await.unwrap();

        assert_eq!(network.calls(), calls);
        assert_eq!(status.active.as_deref(), Some("kazi-cash-v1"));
    }

    #[tokio::test]
    async fn test_register_rejects_non_root_scope_and_script() {
        let network = shell_network();
        let host = host(&network);

        assert!(matches!(
            host.register(SCRIPT, "/app/").await,
            Err(RegistrationError::InvalidScope(_))
        ));
        assert!(matches!(
            host.register("/js/service-worker.json", "/").await,
            Err(RegistrationError::InvalidScope(_))
        ));
        assert!(matches!(
            host.register("https://cdn.example.com/service-worker.json", "/").await,
            Err(RegistrationError::InvalidScope(_))
        ));
    }

    #[tokio::test]
    async fn test_register_unsupported() {
        let network = shell_network();
        let host = host(&network).without_worker_support();
        assert!(matches!(
            host.register(SCRIPT, "/").await,
            Err(RegistrationError::Unsupported)
        ));
    }

    #[tokio::test]
    async fn test_register_script_errors() {
        let network = Arc::new(StubNetwork::new());
        let host = host(&network);
        assert!(matches!(
            host.register(SCRIPT, "/").await,
            Err(RegistrationError::ScriptStatus { status: 404, .. })
        ));

        network.route(SCRIPT, Response::ok("self.addEventListener('fetch', ...)"));
        assert!(matches!(
            host.register(SCRIPT, "/").await,
            Err(RegistrationError::InvalidScript { .. })
        ));

        network.set_offline(true);
        assert!(matches!(
            host.register(SCRIPT, "/").await,
            Err(RegistrationError::ScriptFetch { .. })
        ));
        assert!(host.status().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_first_install_leaves_nothing_active() {
        let network = shell_network();
        network.make_unreachable("/index.html");
        let host = host(&network);

        let err = host.register(SCRIPT, "/").await.unwrap_err();
        assert!(matches!(err, RegistrationError::InstallFailed { .. }));
        assert!(host.status().await.is_none());
        assert_eq!(host.storage().entry_count("kazi-cash-v1").await, 0);
    }

    #[tokio::test]
    async fn test_register_retries_after_failed_first_install() {
        let network = shell_network();
        network.route("/index.html", Response::new(500, "deploy in progress"));
        let host = host(&network);
        assert!(host.register(SCRIPT, "/").await.is_err());

        // Same script URL installs from scratch once the asset is back
        network.route("/index.html", Response::ok("shell:/index.html"));
        let status = host.register(SCRIPT, "/").await.unwrap();
        assert_eq!(status.active.as_deref(), Some("kazi-cash-v1"));
        assert_eq!(host.storage().entry_count("kazi-cash-v1").await, SHELL_ASSETS.len());
    }

    #[tokio::test]
    async fn test_update_unchanged() {
        let network = shell_network();
        let host = host(&network);
        host.register(SCRIPT, "/").await.unwrap();

        assert_eq!(host.update().await.unwrap(), UpdateOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_update_requires_registration() {
        let network = shell_network();
        let host = host(&network);
        assert!(matches!(host.update().await, Err(RegistrationError::NotRegistered)));
    }

    #[tokio::test]
    async fn test_update_installs_new_version_as_waiting() {
        let network = shell_network();
        let host = host(&network);
        host.register(SCRIPT, "/").await.unwrap();

        serve_script(&network, &WorkerScript::shell("kazi-cash-v2"));
        let outcome = host.update().await.unwrap();
        assert_eq!(
            outcome,
            UpdateOutcome::Installed {
                cache_name: "kazi-cash-v2".to_string(),
                activated: false
            }
        );

        let status = host.status().await.unwrap();
        assert_eq!(status.active.as_deref(), Some("kazi-cash-v1"));
        assert_eq!(status.waiting.as_deref(), Some("kazi-cash-v2"));
        // Both stores exist until v2 activates
        assert!(host.storage().has("kazi-cash-v1").await);
        assert!(host.storage().has("kazi-cash-v2").await);

        // A second check sees the waiting version as newest
        assert_eq!(host.update().await.unwrap(), UpdateOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_failed_update_keeps_previous_version() {
        let network = shell_network();
        let host = host(&network);
        host.register(SCRIPT, "/").await.unwrap();
        host.reload().await;

        network.make_unreachable("/src/main.tsx");
        serve_script(&network, &WorkerScript::shell("kazi-cash-v2"));
        let outcome = host.update().await.unwrap();
        assert!(matches!(outcome, UpdateOutcome::InstallFailed { .. }));

        let status = host.status().await.unwrap();
        assert_eq!(status.active.as_deref(), Some("kazi-cash-v1"));
        assert_eq!(status.waiting, None);
        assert!(status.controlled);
    }

    #[tokio::test]
    async fn test_skip_waiting_promotes_and_cleans_up() {
        let network = shell_network();
        let host = host(&network);
        host.register(SCRIPT, "/").await.unwrap();
        let v1 = host.active().await.unwrap();
        serve_script(&network, &WorkerScript::shell("kazi-cash-v2"));
        host.update().await.unwrap();

        assert!(host.post_message(&ControlMessage::SkipWaiting.to_value()).await);

        let status = host.status().await.unwrap();
        assert_eq!(status.active.as_deref(), Some("kazi-cash-v2"));
        assert_eq!(status.waiting, None);
        assert_eq!(v1.state(), WorkerState::Redundant);
        assert_eq!(host.storage().keys().await, vec!["kazi-cash-v2"]);
    }

    #[tokio::test]
    async fn test_other_messages_do_not_promote() {
        let network = shell_network();
        let host = host(&network);
        host.register(SCRIPT, "/").await.unwrap();
        serve_script(&network, &WorkerScript::shell("kazi-cash-v2"));
        host.update().await.unwrap();

        assert!(!host.post_message(&serde_json::json!({"type": "CLAIM"})).await);
        let status = host.status().await.unwrap();
        assert_eq!(status.waiting.as_deref(), Some("kazi-cash-v2"));
    }

    #[tokio::test]
    async fn test_skip_waiting_without_waiting_worker() {
        let network = shell_network();
        let host = host(&network);
        host.register(SCRIPT, "/").await.unwrap();
        assert!(!host.post_message(&ControlMessage::SkipWaiting.to_value()).await);
    }

    #[tokio::test]
    async fn test_uncontrolled_page_uses_network_directly() {
        let network = shell_network();
        let host = host(&network);
        host.register(SCRIPT, "/").await.unwrap();
        network.set_offline(true);

        assert!(host.fetch(&get("/")).await.is_err());

        host.reload().await;
        let served = host.fetch(&navigate("/wallet")).await.unwrap();
        assert_eq!(served.source, ResponseSource::OfflineFallback);
    }

    #[tokio::test]
    async fn test_unregister() {
        let network = shell_network();
        let host = host(&network);
        host.register(SCRIPT, "/").await.unwrap();
        host.reload().await;
        let v1 = host.active().await.unwrap();

        assert!(host.unregister().await);
        assert!(host.status().await.is_none());
        assert_eq!(v1.state(), WorkerState::Redundant);
        // Cached data is left alone
        assert!(host.storage().has("kazi-cash-v1").await);
        assert!(!host.unregister().await);
    }

    #[tokio::test]
    async fn test_open_restores_registration() {
        let dir = tempfile::tempdir().unwrap();
        let network = shell_network();
        {
            let host = WorkerHost::open(
                app_url(),
                dir.path(),
                network.clone(),
                RetentionPolicy::default(),
            )
            .unwrap();
            host.register(SCRIPT, "/").await.unwrap();
            serve_script(&network, &WorkerScript::shell("kazi-cash-v2"));
            host.update().await.unwrap();
        }

        let host =
            WorkerHost::open(app_url(), dir.path(), network.clone(), RetentionPolicy::default())
                .unwrap();
        let status = host.status().await.unwrap();
        assert_eq!(status.active.as_deref(), Some("kazi-cash-v1"));
        assert_eq!(status.waiting.as_deref(), Some("kazi-cash-v2"));
        assert!(status.controlled);

        network.set_offline(true);
        let served = host.fetch(&get("/index.html")).await.unwrap();
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.text(), "shell:/index.html");
    }
}
