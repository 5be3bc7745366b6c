//! Worker lifecycle state machine.
//!
//! ```text
//! Installing --InstallSucceeded--> Waiting --Activated--> Active
//!     |                               |                     |
//!     +--InstallFailed/Superseded--> Redundant <--Superseded+
//! ```
//!
//! The work attached to a transition (populating the manifest, deleting
//! stale stores) finishes or fails before the transition is applied.

use serde::{Deserialize, Serialize};

use super::error::WorkerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Installing,
    /// Installed, not yet controlling anything
    Waiting,
    Active,
    /// Discarded: failed install or replaced by a newer version
    Redundant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    InstallSucceeded,
    InstallFailed,
    Activated,
    Superseded,
}

impl WorkerState {
    /// Next state for `event`, or an error when the event does not apply.
    pub fn on(self, event: LifecycleEvent) -> Result<WorkerState, WorkerError> {
        use LifecycleEvent::*;
        use WorkerState::*;

        match (self, event) {
            (Installing, InstallSucceeded) => Ok(Waiting),
            (Installing, InstallFailed) => Ok(Redundant),
            (Waiting, Activated) => Ok(Active),
            (Installing | Waiting | Active, Superseded) => Ok(Redundant),
            (from, event) => Err(WorkerError::InvalidTransition { from, event }),
        }
    }

    pub fn is_terminal(self) -> bool {
        self == WorkerState::Redundant
    }

    /// Only an active worker answers fetches
    pub fn can_intercept_fetch(self) -> bool {
        self == WorkerState::Active
    }

    pub fn label(self) -> &'static str {
        match self {
            WorkerState::Installing => "installing",
            WorkerState::Waiting => "installed (waiting)",
            WorkerState::Active => "active",
            WorkerState::Redundant => "redundant",
        }
    }
}
