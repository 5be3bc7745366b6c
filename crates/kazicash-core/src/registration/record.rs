use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::worker::WorkerScript;

/// Registration file name in cache directory
const RECORD_FILE: &str = "registration.json";

/// What survives a restart: the registration and the versions occupying
/// its waiting and active slots. Installing workers are never saved; an
/// interrupted install simply did not happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub scope: String,
    pub script_url: String,
    pub active: Option<WorkerScript>,
    pub waiting: Option<WorkerScript>,
    pub updated_at: DateTime<Utc>,
}

pub struct RecordFile {
    cache_dir: PathBuf,
    pub data: Option<RegistrationRecord>,
}

impl RecordFile {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            data: None,
        }
    }

    /// Load the record from disk
    pub fn load(&mut self) -> Result<bool> {
        let path = self.record_path();
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read registration file")?;
            let data: RegistrationRecord = serde_json::from_str(&contents)
                .context("Failed to parse registration file")?;
            self.data = Some(data);
            return Ok(true);
        }
        Ok(false)
    }

    /// Save the record to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.record_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents).context("Failed to write registration file")?;
        }
        Ok(())
    }

    /// Forget the registration
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.record_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn update(&mut self, data: RegistrationRecord) {
        self.data = Some(data);
    }

    fn record_path(&self) -> PathBuf {
        self.cache_dir.join(RECORD_FILE)
    }
}
