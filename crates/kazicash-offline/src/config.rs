//! Application configuration management.
//!
//! Configuration is stored at `~/.config/kazicash/config.json`. The app
//! origin and the cache directory can be overridden from the command line
//! (`--origin`, `--cache-dir` or `KAZICASH_ORIGIN`, `KAZICASH_CACHE_DIR`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use kazicash_core::cache::RetentionPolicy;
use kazicash_core::registration::SCRIPT_URL;
use serde::{Deserialize, Serialize};
use url::Url;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "kazicash";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_ORIGIN: &str = "http://localhost:8080/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the app is served from
    pub origin: String,
    pub script_url: String,
    pub cache_dir: Option<PathBuf>,
    pub max_cache_entries: Option<usize>,
    pub max_entry_age_minutes: Option<i64>,
    pub request_timeout_secs: u64,
    /// Set to false to behave like a platform without worker support
    pub workers_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            script_url: SCRIPT_URL.to_string(),
            cache_dir: None,
            max_cache_entries: RetentionPolicy::default().max_entries,
            max_entry_age_minutes: None,
            request_timeout_secs: 30,
            workers_enabled: true,
        }
    }
}

impl Config {
    /// Load the config file, or defaults when there is none
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply command-line overrides; empty values are ignored
    pub fn apply_overrides(&mut self, origin: Option<String>, cache_dir: Option<PathBuf>) {
        if let Some(origin) = origin.filter(|v| !v.is_empty()) {
            self.origin = origin;
        }
        if let Some(dir) = cache_dir.filter(|d| !d.as_os_str().is_empty()) {
            self.cache_dir = Some(dir);
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn app_url(&self) -> Result<Url> {
        Url::parse(&self.origin).with_context(|| format!("Invalid origin: {}", self.origin))
    }

    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy {
            max_entries: self.max_cache_entries,
            max_age: self.max_entry_age_minutes.map(Duration::minutes),
        }
    }
}
