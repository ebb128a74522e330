//! JSON-backed, append-only waypoint log.
//!
//! The whole array is rewritten on every mutation. The file is replaced
//! atomically, so a crash mid-write leaves the previous version intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{Result, WaypointError};
use crate::fsutil::write_atomic;
use crate::waypoint::Waypoint;

/// Ordered waypoints in capture order, mirrored to a single JSON file.
#[derive(Debug)]
pub struct WaypointLog {
    path: PathBuf,
    waypoints: Vec<Waypoint>,
}

impl WaypointLog {
    /// Reads the waypoints stored at `path`.
    ///
    /// A missing file is an empty log. A file that exists but does not parse
    /// is reported as [`WaypointError::CorruptStore`].
    pub fn load(path: &Path) -> Result<Vec<Waypoint>> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("no waypoint store at {}, starting empty", path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(WaypointError::io(path, e)),
        };
        serde_json::from_slice(&bytes).map_err(|source| WaypointError::CorruptStore {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Opens the log at `path`, failing on a corrupt store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let waypoints = Self::load(&path)?;
        log::debug!("loaded {} waypoints from {}", waypoints.len(), path.display());
        Ok(Self { path, waypoints })
    }

    /// Opens the log at `path`, starting empty if it cannot be read.
    ///
    /// The unreadable file is left in place until the next mutation
    /// overwrites it.
    pub fn open_or_empty(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::load(&path) {
            Ok(waypoints) => Self { path, waypoints },
            Err(e) => {
                log::warn!("discarding unreadable waypoint store: {e}");
                Self {
                    path,
                    waypoints: Vec::new(),
                }
            }
        }
    }

    /// Re-reads the backing file, replacing the in-memory sequence.
    /// On error the current contents are kept.
    pub fn reload(&mut self) -> Result<()> {
        self.waypoints = Self::load(&self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn last(&self) -> Option<&Waypoint> {
        self.waypoints.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Waypoint> {
        self.waypoints.iter()
    }

    /// Owned copy of the current sequence, for exporters.
    pub fn snapshot(&self) -> Vec<Waypoint> {
        self.waypoints.clone()
    }

    /// Appends `waypoint` and persists the log. If the write fails the
    /// waypoint is dropped again and the error returned.
    pub fn append(&mut self, waypoint: Waypoint) -> Result<()> {
        self.waypoints.push(waypoint);
        if let Err(e) = self.persist() {
            self.waypoints.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Removes and returns the newest waypoint.
    pub fn remove_last(&mut self) -> Result<Waypoint> {
        let removed = self.waypoints.pop().ok_or(WaypointError::EmptyLog)?;
        if let Err(e) = self.persist() {
            self.waypoints.push(removed);
            return Err(e);
        }
        Ok(removed)
    }

    /// Empties the log and persists the empty array.
    pub fn clear(&mut self) -> Result<()> {
        let previous = std::mem::take(&mut self.waypoints);
        if let Err(e) = self.persist() {
            self.waypoints = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Appends several waypoints with a single rewrite.
    pub fn extend(&mut self, waypoints: impl IntoIterator<Item = Waypoint>) -> Result<usize> {
        let before = self.waypoints.len();
        self.waypoints.extend(waypoints);
        if let Err(e) = self.persist() {
            self.waypoints.truncate(before);
            return Err(e);
        }
        Ok(self.waypoints.len() - before)
    }

    /// Writes a timestamped copy of the log into `dir` and returns its path.
    pub fn save_copy(&self, dir: &Path, prefix: &str, now: DateTime<Utc>) -> Result<PathBuf> {
        let path = dir.join(format!("{prefix}_{}.json", now.format("%Y-%m-%d-%H-%M-%S")));
        write_atomic(&path, &encode(&self.waypoints)?)?;
        log::info!("saved waypoint copy to {}", path.display());
        Ok(path)
    }

    fn persist(&self) -> Result<()> {
        write_atomic(&self.path, &encode(&self.waypoints)?)?;
        log::debug!(
            "wrote {} waypoints to {}",
            self.waypoints.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl<'a> IntoIterator for &'a WaypointLog {
    type Item = &'a Waypoint;
    type IntoIter = std::slice::Iter<'a, Waypoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Pretty JSON with two-space indentation.
fn encode(waypoints: &[Waypoint]) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(waypoints).map_err(WaypointError::Encode)?;
    bytes.push(b'\n');
    Ok(bytes)
}
