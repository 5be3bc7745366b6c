use serde::{Deserialize, Serialize};

/// The most advanced slot that is currently filled, in the order the app
/// reports it: installing, then waiting, then active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "snake_case")]
pub enum RegistrationPhase {
    Installing,
    Waiting,
    Active,
}

impl RegistrationPhase {
    pub fn label(&self) -> &'static str {
        match self {
            RegistrationPhase::Installing => "installing",
            RegistrationPhase::Waiting => "installed",
            RegistrationPhase::Active => "active",
        }
    }
}

/// Snapshot of a registration. Slots hold the cache name of the worker
/// occupying them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationStatus {
    pub scope: String,
    pub script_url: String,
    pub installing: Option<String>,
    pub waiting: Option<String>,
    pub active: Option<String>,
    /// Whether the current page's fetches go through the active worker
    pub controlled: bool,
}

impl RegistrationStatus {
    pub fn phase(&self) -> Option<RegistrationPhase> {
        if self.installing.is_some() {
            Some(RegistrationPhase::Installing)
        } else if self.waiting.is_some() {
            Some(RegistrationPhase::Waiting)
        } else if self.active.is_some() {
            Some(RegistrationPhase::Active)
        } else {
            None
        }
    }
}

/// Result of re-checking the worker script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Script identical to the newest installed version
    Unchanged,
    /// New version installed; `activated` when nothing was active before
    Installed { cache_name: String, activated: bool },
    /// New version discarded; the previous one keeps running
    InstallFailed { cache_name: String, reason: String },
}
