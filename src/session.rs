//! The context object a front-end drives: the waypoint log plus the latest
//! fix from each location provider.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{Result, WaypointError};
use crate::exporter::GpxExporter;
use crate::sample::{LocationSample, ProviderKind};
use crate::store::WaypointLog;
use crate::waypoint::Waypoint;

/// Result of polling one provider. `sample` is `None` while it has no fix.
#[derive(Debug, Clone, PartialEq)]
pub struct FixUpdate {
    pub kind: ProviderKind,
    pub sample: Option<LocationSample>,
}

/// Fire-and-forget user notification.
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// Sends notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        log::info!("{message}");
    }
}

/// Files written by [`Session::export_files`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub json_path: PathBuf,
    pub gpx_path: PathBuf,
    pub count: usize,
}

#[derive(Debug)]
pub struct Session {
    log: WaypointLog,
    fixes: HashMap<ProviderKind, LocationSample>,
    active: ProviderKind,
}

impl Session {
    pub fn new(log: WaypointLog, active: ProviderKind) -> Self {
        Self {
            log,
            fixes: HashMap::new(),
            active,
        }
    }

    pub fn log(&self) -> &WaypointLog {
        &self.log
    }

    pub fn active_provider(&self) -> ProviderKind {
        self.active
    }

    pub fn set_active_provider(&mut self, kind: ProviderKind) {
        self.active = kind;
    }

    pub fn apply(&mut self, update: FixUpdate) {
        match update.sample {
            Some(sample) => {
                self.fixes.insert(update.kind, sample);
            }
            None => {
                self.fixes.remove(&update.kind);
            }
        }
    }

    pub fn fix(&self, kind: ProviderKind) -> Option<&LocationSample> {
        self.fixes.get(&kind)
    }

    /// Fix of the active provider.
    pub fn current_fix(&self) -> Option<&LocationSample> {
        self.fix(self.active)
    }

    /// Tags the current fix and appends it to the log.
    pub fn save_point(&mut self, title: &str, color: &str, category: &str) -> Result<()> {
        let sample = self
            .current_fix()
            .cloned()
            .ok_or_else(|| WaypointError::NoFixAvailable {
                provider: self.active.to_string(),
            })?;
        let waypoint = Waypoint::parse(sample, title, color, category)?;
        self.log.append(waypoint)
    }

    pub fn remove_last(&mut self) -> Result<Waypoint> {
        self.log.remove_last()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.log.clear()
    }

    /// Appends imported waypoints in their given order.
    pub fn import(&mut self, waypoints: Vec<Waypoint>) -> Result<usize> {
        self.log.extend(waypoints)
    }

    /// Writes a timestamped JSON copy and a GPX export of the log into `dir`.
    pub fn export_files(
        &self,
        exporter: &GpxExporter,
        dir: &Path,
        now: DateTime<Utc>,
        notifier: &dyn Notifier,
    ) -> Result<ExportReport> {
        let snapshot = self.log.snapshot();
        let json_path = self
            .log
            .save_copy(dir, &exporter.options().name_prefix, now)?;
        let gpx_path = exporter.export_to_dir(&snapshot, dir, now)?;
        let name = gpx_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        notifier.notify(&format!("Saved {name}"));
        Ok(ExportReport {
            json_path,
            gpx_path,
            count: snapshot.len(),
        })
    }
}
