pub mod category;
pub mod error;
pub mod exporter;
mod fsutil;
pub mod options;
pub mod parser;
pub mod poller;
pub mod provider;
pub mod sample;
pub mod session;
pub mod store;
pub mod waypoint;

#[cfg(target_arch = "wasm32")]
mod wasm;

pub use category::Category;
pub use error::{Result, WaypointError};
pub use exporter::GpxExporter;
pub use options::{ExportOptions, Settings};
pub use poller::Poller;
pub use provider::{LocationProvider, StaticProvider};
pub use sample::{LocationSample, ProviderKind};
pub use session::{ExportReport, FixUpdate, LogNotifier, Notifier, Session};
pub use store::WaypointLog;
pub use waypoint::{HexColor, Waypoint};
