use reqwest::Method;
use serde::{Deserialize, Serialize};
use url::{Origin, Url};

/// How the request was initiated by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level page navigation
    Navigate,
    SameOrigin,
    NoCors,
    #[default]
    Cors,
}

/// An outgoing request as seen by the cache manager.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            mode: RequestMode::default(),
            headers: Vec::new(),
        }
    }

    /// A plain GET subresource request
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// A page navigation (always GET)
    pub fn navigate(url: Url) -> Self {
        Self {
            mode: RequestMode::Navigate,
            ..Self::get(url)
        }
    }

    /// Parse an absolute URL into a GET request
    pub fn parse(raw: &str) -> Result<Self, url::ParseError> {
        Ok(Self::get(Url::parse(raw)?))
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    pub fn is_same_origin(&self, origin: &Origin) -> bool {
        self.url.origin() == *origin
    }

    /// Identity used to key this request in a cache store.
    pub fn cache_key(&self) -> String {
        cache_key(&self.method, &self.url)
    }
}

/// Build a cache key from method and URL. Fragments never reach the server,
/// so they are not part of the identity.
pub fn cache_key(method: &Method, url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    format!("{} {}", method.as_str(), url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_ignores_fragment() {
        let a = Request::parse("https://app.kazicash.test/jobs#top").unwrap();
        let b = Request::parse("https://app.kazicash.test/jobs").unwrap();
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), "GET https://app.kazicash.test/jobs");
    }

    #[test]
    fn test_cache_key_includes_method_and_query() {
        let url = Url::parse("https://app.kazicash.test/api/jobs?page=2").unwrap();
        let get = Request::get(url.clone());
        let post = Request::new(Method::POST, url);
        assert_ne!(get.cache_key(), post.cache_key());
        assert!(get.cache_key().ends_with("?page=2"));
    }

    #[test]
    fn test_same_origin() {
        let origin = Url::parse("https://app.kazicash.test/").unwrap().origin();
        let own = Request::parse("https://app.kazicash.test/index.html").unwrap();
        let other_port = Request::parse("https://app.kazicash.test:8443/index.html").unwrap();
        let third_party = Request::parse("https://fonts.example.com/inter.css").unwrap();

        assert!(own.is_same_origin(&origin));
        assert!(!other_port.is_same_origin(&origin));
        assert!(!third_party.is_same_origin(&origin));
    }

    #[test]
    fn test_navigate_mode() {
        let req = Request::navigate(Url::parse("https://app.kazicash.test/wallet").unwrap());
        assert!(req.is_navigation());
        assert_eq!(req.method, Method::GET);
        assert!(!Request::parse("https://app.kazicash.test/").unwrap().is_navigation());
    }
}
