//! The cache manager: one versioned worker that precaches the app shell,
//! garbage-collects stale cache stores and answers fetches network-first
//! with cache fallback.
//!
//! - `script`: the version descriptor served at the well-known script URL
//! - `lifecycle`: Installing -> Waiting -> Active -> Redundant
//! - `fetch`: the network-first strategy as a plain async function
//! - `manager`: `CacheWorker`, tying the three together

pub mod error;
pub mod fetch;
pub mod lifecycle;
pub mod manager;
pub mod script;

pub use error::WorkerError;
pub use fetch::{network_first, FetchContext};
pub use lifecycle::{LifecycleEvent, WorkerState};
pub use manager::CacheWorker;
pub use script::{ControlMessage, WorkerScript, DEFAULT_CACHE_NAME, SHELL_ASSETS};
