use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WaypointError>;

#[derive(Error, Debug)]
pub enum WaypointError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt waypoint store {}: {source}", path.display())]
    CorruptStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid settings file {}: {source}", path.display())]
    InvalidSettings {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("waypoint log is empty")]
    EmptyLog,

    #[error("unknown category '{0}' (expected mushroom, berry, orientir or other)")]
    InvalidCategory(String),

    #[error("no location fix available from provider '{provider}'")]
    NoFixAvailable { provider: String },

    #[error("waypoint title must not be empty")]
    EmptyTitle,

    #[error("invalid color '{0}': expected #RRGGBB")]
    InvalidColor(String),

    #[error("coordinates out of range: lat={lat}, lon={lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },

    #[error("invalid {field}: {value}")]
    InvalidMeasurement { field: &'static str, value: f64 },

    #[error("JSON encoding error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("GPX write error: {0}")]
    GpxWrite(String),

    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("missing attribute '{attribute}' on <{element}>")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("invalid value '{value}' for attribute '{attribute}' on <{element}>")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },

    #[error("invalid value '{value}' in <{element}>")]
    InvalidValue {
        element: &'static str,
        value: String,
    },
}

impl WaypointError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
