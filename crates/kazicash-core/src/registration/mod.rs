//! Installing and updating the cache manager.
//!
//! This module provides:
//! - `WorkerHost`: the platform side; owns the registration slots
//!   (installing / waiting / active), the page controller, the cache
//!   storage and the network
//! - `RegistrationController`: the app side; registers once per session,
//!   checks for updates and forces a waiting version to take over
//! - `RecordFile`: the registration persisted between runs
//!
//! Registration state is saved to `registration.json` in the cache
//! directory, next to the cache stores.

pub mod controller;
pub mod error;
pub mod host;
pub mod record;
pub mod status;

pub use controller::{RegistrationController, ROOT_SCOPE, SCRIPT_URL};
pub use error::RegistrationError;
pub use host::WorkerHost;
pub use record::{RecordFile, RegistrationRecord};
pub use status::{RegistrationPhase, RegistrationStatus, UpdateOutcome};
