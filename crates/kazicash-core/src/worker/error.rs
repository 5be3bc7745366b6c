use thiserror::Error;

use crate::cache::CacheError;
use crate::network::NetworkError;

use super::lifecycle::{LifecycleEvent, WorkerState};

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Manifest asset {url} unreachable: {source}")]
    AssetUnreachable {
        url: String,
        #[source]
        source: NetworkError,
    },

    #[error("Manifest asset {url} returned status {status}")]
    AssetStatus { url: String, status: u16 },

    #[error("Invalid manifest entry {0}")]
    InvalidAsset(String),

    #[error("Cache storage failed: {0}")]
    Cache(#[from] CacheError),

    #[error("Cannot apply {event:?} to a worker in state {from:?}")]
    InvalidTransition {
        from: WorkerState,
        event: LifecycleEvent,
    },
}
