//! KaziCash Core - offline cache for the KaziCash app.
//!
//! This crate provides:
//! - A cache manager that precaches the app shell, answers requests
//!   network-first with cache fallback and cleans up old cache versions
//! - A registration controller that installs, updates and promotes cache
//!   manager versions
//! - An offline status signal for the UI banner
//! - Optional TypeScript type generation (with the `ts` feature)

pub mod cache;
pub mod connectivity;
pub mod http;
pub mod network;
pub mod registration;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use cache::{CacheStorage, RetentionPolicy};
pub use connectivity::{Connectivity, OfflineSignal, OfflineStatus};
pub use http::{Request, Response, ResponseSource, Served};
pub use network::{HttpNetwork, Network, NetworkError};
pub use registration::{RegistrationController, WorkerHost};
pub use worker::{CacheWorker, WorkerScript};
