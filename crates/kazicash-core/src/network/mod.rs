//! Network access for the cache manager and the worker host.
//!
//! The cache manager never talks to `reqwest` directly; it goes through the
//! `Network` trait so the fetch strategy can be exercised without a real
//! network. `HttpNetwork` is the production implementation.

pub mod client;
pub mod error;

use async_trait::async_trait;

use crate::http::{Request, Response};

pub use client::HttpNetwork;
pub use error::NetworkError;

/// Something that can perform a request.
///
/// Any HTTP status counts as a completed fetch; only transport-level
/// failures (unreachable host, timeout, malformed request) are errors.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}
