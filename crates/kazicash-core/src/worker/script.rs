use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cache store name of the shipped cache manager version.
/// Bumping it is the only way to invalidate everything cached before.
pub const DEFAULT_CACHE_NAME: &str = "kazi-cash-v1";

/// App shell cached eagerly at install time.
pub const SHELL_ASSETS: [&str; 4] = ["/", "/index.html", "/src/main.tsx", "/src/index.css"];

/// One cache manager version, as served at the script URL.
///
/// Two scripts are the same version iff they are equal field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerScript {
    pub cache_name: String,
    #[serde(default)]
    pub precache: Vec<String>,
}

impl Default for WorkerScript {
    fn default() -> Self {
        Self {
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            precache: SHELL_ASSETS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl WorkerScript {
    pub fn new(cache_name: impl Into<String>, precache: Vec<String>) -> Self {
        Self {
            cache_name: cache_name.into(),
            precache,
        }
    }

    /// The shipped shell manifest under a different cache name
    pub fn shell(cache_name: impl Into<String>) -> Self {
        Self {
            cache_name: cache_name.into(),
            ..Self::default()
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Messages the app may post to a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Activate a waiting worker now instead of after the current session
    SkipWaiting,
}

impl ControlMessage {
    /// Decode a posted message. Anything that is not a known control
    /// message is ignored.
    pub fn parse(value: &serde_json::Value) -> Option<Self> {
        match serde_json::from_value(value.clone()) {
            Ok(message) => Some(message),
            Err(e) => {
                debug!(error = %e, "Ignoring unrecognized worker message");
                None
            }
        }
    }

    pub fn to_value(self) -> serde_json::Value {
        serde_json::json!(self)
    }
}
