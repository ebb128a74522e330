use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, WaypointError};
use crate::sample::ProviderKind;

/// Options for GPX export.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    /// Value of the `creator` attribute and the metadata author (default: "MushroomGPS")
    pub creator: String,

    /// Prefix for exported file names and the metadata name (default: "MushroomGPS")
    pub name_prefix: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            creator: "MushroomGPS".to_string(),
            name_prefix: "MushroomGPS".to_string(),
        }
    }
}

/// Application settings, read from an optional JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Directory holding the store and exports (default: ".")
    pub storage_dir: PathBuf,

    /// File name of the waypoint store inside `storage_dir` (default: "MushroomGPS.json")
    pub store_file_name: String,

    pub export: ExportOptions,

    /// Location polling period in milliseconds (default: 300)
    pub poll_interval_ms: u64,

    /// Provider whose fix is used for new waypoints (default: fused)
    pub active_provider: ProviderKind,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("."),
            store_file_name: "MushroomGPS.json".to_string(),
            export: ExportOptions::default(),
            poll_interval_ms: 300,
            active_provider: ProviderKind::Fused,
        }
    }
}

impl Settings {
    pub fn from_json_str(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads settings from `path`. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| WaypointError::io(path, e))?;
        Self::from_json_str(&text).map_err(|source| WaypointError::InvalidSettings {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn store_path(&self) -> PathBuf {
        self.storage_dir.join(&self.store_file_name)
    }

    pub fn ensure_storage_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.storage_dir)
            .map_err(|e| WaypointError::io(&self.storage_dir, e))
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }
}
