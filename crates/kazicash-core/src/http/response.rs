use serde::{Deserialize, Serialize};

/// Status used for the synthetic "unavailable offline" response.
pub const OFFLINE_STATUS: u16 = 408;

/// Body of the synthetic "unavailable offline" response.
const OFFLINE_BODY: &str = "Network error";

/// A complete HTTP response, storable in a cache store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Stored as base64 so cached bundles stay close to their real size
    #[serde(default, with = "base64_body")]
    pub body: Vec<u8>,
}

mod base64_body {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(serde::de::Error::custom)
    }
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or_default()
                .to_string(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// 200 OK with the given body
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body)
    }

    /// The response handed to callers when a resource is neither reachable
    /// nor cached. Callers treat it as "unavailable offline".
    pub fn offline_unavailable() -> Self {
        Self::new(OFFLINE_STATUS, OFFLINE_BODY).with_header("Content-Type", "text/plain")
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Which tier of the fetch strategy produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    /// Cached root document served for a failed navigation
    OfflineFallback,
    /// Generated "unavailable offline" response
    Synthetic,
}

impl ResponseSource {
    pub fn label(&self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::OfflineFallback => "offline fallback",
            ResponseSource::Synthetic => "synthetic",
        }
    }
}

/// A response together with the tier that answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
}

impl Served {
    pub fn new(response: Response, source: ResponseSource) -> Self {
        Self { response, source }
    }

    pub fn is_offline_unavailable(&self) -> bool {
        self.source == ResponseSource::Synthetic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_is_stored_compactly() {
        let resp = Response::ok(vec![0u8; 3000]);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.len() < 4200, "{} bytes", json.len());
        assert!(json.contains("\"body\":\"AAAA"));

        let decoded: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, resp);
    }

    #[test]
    fn test_offline_unavailable_shape() {
        let resp = Response::offline_unavailable();
        assert_eq!(resp.status, 408);
        assert_eq!(resp.status_text, "Request Timeout");
        assert_eq!(resp.header("content-type"), Some("text/plain"));
        assert_eq!(resp.text(), "Network error");
        assert!(!resp.is_success());
    }

    #[test]
    fn test_unknown_status_has_empty_reason() {
        let resp = Response::new(599, "");
        assert_eq!(resp.status_text, "");
    }

    #[test]
    fn test_response_source_labels() {
        assert_eq!(ResponseSource::OfflineFallback.label(), "offline fallback");
        let served = Served::new(Response::offline_unavailable(), ResponseSource::Synthetic);
        assert!(served.is_offline_unavailable());
    }
}
