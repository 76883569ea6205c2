//! Tracker configuration

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tunables for the poller and the discovery engine.
///
/// Loaded from a JSON file; every field falls back to its default when
/// absent so a partial config stays valid across versions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Executable name of the target player process
    pub process_name: String,
    /// Poller tick interval in milliseconds
    pub poll_interval_ms: u64,
    /// Cadence of discovery scan rounds in milliseconds
    pub scan_interval_ms: u64,
    /// Upper bound for plausible timecode values admitted into the initial
    /// snapshot, in seconds
    pub max_timecode_secs: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            process_name: "TIDAL".to_string(),
            poll_interval_ms: 1000,
            scan_interval_ms: 2000,
            max_timecode_secs: 24.0 * 3600.0,
        }
    }
}

impl TrackerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }
}
