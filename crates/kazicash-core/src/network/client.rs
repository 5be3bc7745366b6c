//! HTTP network backed by `reqwest`.
//!
//! Requests are forwarded as-is and the full body is buffered so the
//! response can be both returned to the page and written to a cache store.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::http::{Request, Response};

use super::{Network, NetworkError};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// Slow mobile links still finish within 30s; past that the cache is the better answer.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Network implementation over a shared `reqwest::Client`.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpNetwork {
    client: Client,
}

impl HttpNetwork {
    /// Create a network with the default request timeout
    pub fn new() -> Result<Self, NetworkError> {
        Self::with_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(NetworkError::classify)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(NetworkError::classify)?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(NetworkError::classify)?
            .to_vec();

        debug!(url = %request.url, status = status.as_u16(), bytes = body.len(), "Fetched");

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}
