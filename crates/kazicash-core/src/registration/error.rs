use thiserror::Error;

use crate::network::NetworkError;

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Service workers are not supported on this platform")]
    Unsupported,

    #[error("Invalid registration: {0}")]
    InvalidScope(String),

    #[error("Failed to fetch worker script {url}: {source}")]
    ScriptFetch {
        url: String,
        #[source]
        source: NetworkError,
    },

    #[error("Worker script {url} returned status {status}: {body}")]
    ScriptStatus { url: String, status: u16, body: String },

    #[error("Invalid worker script {url}: {source}")]
    InvalidScript {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Worker {cache_name} failed to install: {reason}")]
    InstallFailed { cache_name: String, reason: String },

    #[error("No service worker is registered")]
    NotRegistered,
}
