//! Network-first fetch strategy with cache fallback.
//!
//! 1. Try the network. Any completed response goes back to the caller and,
//!    for same-origin GETs, is written to the current store.
//! 2. On a network failure, answer from the current store.
//! 3. Failed navigations with no hit get the cached root document.
//! 4. Everything else gets a synthetic 408 "unavailable offline" response.
//!
//! Cache writes are best-effort: a failed put is logged and never reaches
//! the caller.

use reqwest::Method;
use tracing::{debug, warn};
use url::Url;

use crate::cache::CacheStorage;
use crate::http::request::cache_key;
use crate::http::{Request, Response, ResponseSource, Served};
use crate::network::Network;

/// Status the cache refuses to store.
const PARTIAL_CONTENT: u16 = 206;

/// Where a fetch may read and write cached responses.
pub struct FetchContext<'a> {
    pub storage: &'a CacheStorage,
    /// Name of the current version's store
    pub cache_name: &'a str,
    /// The app's own root URL; defines the origin and the fallback page
    pub app_url: &'a Url,
}

impl FetchContext<'_> {
    fn is_cacheable(&self, request: &Request, response: &Response) -> bool {
        request.method == Method::GET
            && response.status != PARTIAL_CONTENT
            && request.is_same_origin(&self.app_url.origin())
    }

    fn root_document_key(&self) -> Option<String> {
        self.app_url
            .join("/")
            .ok()
            .map(|root| cache_key(&Method::GET, &root))
    }
}

/// Answer `request` network-first. Never fails: the worst outcome is the
/// synthetic offline response.
pub async fn network_first(
    request: &Request,
    ctx: &FetchContext<'_>,
    network: &dyn Network,
) -> Served {
    match network.fetch(request).await {
        Ok(response) => {
            if ctx.is_cacheable(request, &response) {
                if let Err(e) = ctx.storage.put(ctx.cache_name, request, &response).await {
                    warn!(url = %request.url, error = %e, "Failed to cache response");
                }
            } else {
                debug!(url = %request.url, method = %request.method, "Response not cacheable");
            }
            Served::new(response, ResponseSource::Network)
        }
        Err(e) => {
            debug!(url = %request.url, error = %e, "Network failed, falling back to cache");
            from_cache(request, ctx).await
        }
    }
}

async fn from_cache(request: &Request, ctx: &FetchContext<'_>) -> Served {
    if let Some(cached) = ctx.storage.lookup(ctx.cache_name, request).await {
        return Served::new(cached, ResponseSource::Cache);
    }

    if request.is_navigation() {
        if let Some(key) = ctx.root_document_key() {
            if let Some(shell) = ctx.storage.lookup_key(ctx.cache_name, &key).await {
                debug!(url = %request.url, "Serving cached root document for offline navigation");
                return Served::new(shell, ResponseSource::OfflineFallback);
            }
        }
    }

    debug!(url = %request.url, "Unavailable offline");
    Served::new(Response::offline_unavailable(), ResponseSource::Synthetic)
}
