use std::sync::Arc;

use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::worker::ControlMessage;

use super::error::RegistrationError;
use super::host::WorkerHost;
use super::status::{RegistrationPhase, UpdateOutcome};

/// Well-known URL of the worker script
pub const SCRIPT_URL: &str = "/service-worker.json";

/// Scope the worker controls
pub const ROOT_SCOPE: &str = "/";

/// Main-context side of the offline cache.
///
/// Every operation contains its own failures: errors are logged and the app
/// carries on online-only.
pub struct RegistrationController {
    host: Arc<WorkerHost>,
    script_url: String,
    scope: String,
    registered: OnceCell<Option<RegistrationPhase>>,
}

impl RegistrationController {
    pub fn new(host: Arc<WorkerHost>) -> Self {
        Self::with_script_url(host, SCRIPT_URL)
    }

    pub fn with_script_url(host: Arc<WorkerHost>, script_url: impl Into<String>) -> Self {
        Self {
            host,
            script_url: script_url.into(),
            scope: ROOT_SCOPE.to_string(),
            registered: OnceCell::new(),
        }
    }

    pub fn host(&self) -> &Arc<WorkerHost> {
        &self.host
    }

    /// Register the worker once per controller. Later calls return the
    /// first result without touching the host.
    pub async fn register(&self) -> Option<RegistrationPhase> {
        *self
            .registered
            .get_or_init(|| async { self.register_once().await })
            .await
    }

    /// Run `register` in the background
    pub fn spawn_register(self: &Arc<Self>) -> JoinHandle<Option<RegistrationPhase>> {
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.register().await })
    }

    async fn register_once(&self) -> Option<RegistrationPhase> {
        if !self.host.supports_workers() {
            info!("Service workers not supported");
            return None;
        }

        match self.host.register(&self.script_url, &self.scope).await {
            Ok(status) => {
                let phase = status.phase();
                match phase {
                    Some(RegistrationPhase::Installing) => info!("Service worker installing"),
                    Some(RegistrationPhase::Waiting) => info!("Service worker installed"),
                    Some(RegistrationPhase::Active) => info!("Service worker active"),
                    None => warn!(script = %status.script_url, "Service worker registered without a working version"),
                }
                phase
            }
            Err(RegistrationError::Unsupported) => {
                info!("Service workers not supported");
                None
            }
            Err(e) => {
                error!(error = %e, "Service worker registration failed");
                None
            }
        }
    }

    /// Ask the host to re-fetch the worker script
    pub async fn check_for_updates(&self) -> Option<UpdateOutcome> {
        match self.host.update().await {
            Ok(outcome) => {
                match &outcome {
                    UpdateOutcome::Unchanged => info!("Service worker up to date"),
                    UpdateOutcome::Installed { cache_name, activated } => {
                        info!(cache = %cache_name, activated, "Service worker update installed")
                    }
                    UpdateOutcome::InstallFailed { cache_name, reason } => {
                        warn!(cache = %cache_name, %reason, "Service worker update failed to install")
                    }
                }
                Some(outcome)
            }
            Err(e) => {
                error!(error = %e, "Service worker update check failed");
                None
            }
        }
    }

    /// Tell the waiting version to take over, then reload so it controls
    /// the page. Returns false when nothing is registered.
    pub async fn force_update(&self) -> bool {
        if !self.host.has_active().await {
            warn!("No active service worker to update");
            return false;
        }

        let promoted = self
            .host
            .post_message(&ControlMessage::SkipWaiting.to_value())
            .await;
        if !promoted {
            info!("No waiting service worker, reloading");
        }
        self.host.reload().await;
        true
    }
}
