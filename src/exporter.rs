use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{Result, WaypointError};
use crate::fsutil::write_atomic;
use crate::options::ExportOptions;
use crate::sample::{format_date, format_iso8601, utc_to_epoch};
use crate::waypoint::Waypoint;

pub const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";
pub const OSMAND_NAMESPACE: &str = "https://osmand.net";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const GPX_SCHEMA_LOCATION: &str =
    "http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd";

/// Writes waypoint snapshots as GPX 1.1 with OsmAnd favourite extensions.
///
/// Output is fully determined by the waypoints, the options and the
/// generation time: waypoints keep their log order and every number is
/// written in plain decimal notation.
#[derive(Debug, Clone, Default)]
pub struct GpxExporter {
    options: ExportOptions,
}

impl GpxExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// `MushroomGPS_2024-09-01-10-00-05.gpx`
    pub fn file_name(&self, generated_at: DateTime<Utc>) -> String {
        format!("{}_{}.gpx", self.options.name_prefix, file_stamp(generated_at))
    }

    /// Renders the full document.
    pub fn render(&self, waypoints: &[Waypoint], generated_at: DateTime<Utc>) -> Result<String> {
        let mut out = GpxWriter::new();
        out.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        out.newline()?;

        let mut root = BytesStart::new("gpx");
        root.push_attribute(("version", "1.1"));
        root.push_attribute(("creator", self.options.creator.as_str()));
        root.push_attribute(("xmlns", GPX_NAMESPACE));
        root.push_attribute(("xmlns:osmand", OSMAND_NAMESPACE));
        root.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
        root.push_attribute(("xsi:schemaLocation", GPX_SCHEMA_LOCATION));
        out.event(Event::Start(root))?;
        out.newline()?;

        out.start("metadata")?;
        let name = format!("{} {}", self.options.name_prefix, file_stamp(generated_at));
        out.text_element("name", &name)?;
        out.start("author")?;
        out.text_element("name", &self.options.creator)?;
        out.end("author")?;
        out.text_element("time", &format_iso8601(utc_to_epoch(generated_at)))?;
        out.end("metadata")?;
        out.newline()?;

        for waypoint in waypoints {
            write_waypoint(&mut out, waypoint)?;
        }

        out.end("gpx")?;
        out.newline()?;
        out.finish()
    }

    /// Writes the document to `destination`, replacing any existing file
    /// only once the new one is complete.
    pub fn export(
        &self,
        waypoints: &[Waypoint],
        destination: &Path,
        generated_at: DateTime<Utc>,
    ) -> Result<()> {
        let document = self.render(waypoints, generated_at)?;
        write_atomic(destination, document.as_bytes())?;
        log::info!(
            "exported {} waypoints to {}",
            waypoints.len(),
            destination.display()
        );
        Ok(())
    }

    /// Exports into `dir` under [`GpxExporter::file_name`] and returns the path.
    pub fn export_to_dir(
        &self,
        waypoints: &[Waypoint],
        dir: &Path,
        generated_at: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let path = dir.join(self.file_name(generated_at));
        self.export(waypoints, &path, generated_at)?;
        Ok(path)
    }
}

fn file_stamp(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d-%H-%M-%S").to_string()
}

/// Plain decimal form; `f64`'s `Display` never uses exponents and always
/// uses `.` as the separator.
fn decimal(value: f64) -> String {
    format!("{value}")
}

fn write_waypoint(out: &mut GpxWriter, waypoint: &Waypoint) -> Result<()> {
    let sample = waypoint.sample();
    let category = waypoint.category();

    let mut wpt = BytesStart::new("wpt");
    wpt.push_attribute(("lat", decimal(sample.latitude).as_str()));
    wpt.push_attribute(("lon", decimal(sample.longitude).as_str()));
    out.event(Event::Start(wpt))?;
    out.newline()?;

    out.line("ele", &decimal(sample.altitude))?;
    out.line("time", &format_iso8601(sample.capture_time))?;
    out.line("name", waypoint.title())?;
    let desc = format!(
        "provider={}, category={}, date={}",
        sample.provider,
        category,
        format_date(sample.capture_time)
    );
    out.line("desc", &desc)?;
    out.line("type", category.as_str())?;
    out.line("hdop", &decimal(sample.accuracy))?;

    out.start("extensions")?;
    out.newline()?;
    out.line("osmand:color", waypoint.color().as_str())?;
    out.line("osmand:icon", category.osmand_icon())?;
    out.end("extensions")?;
    out.newline()?;

    out.end("wpt")?;
    out.newline()?;
    out.newline()
}

struct GpxWriter {
    inner: Writer<Vec<u8>>,
}

impl GpxWriter {
    fn new() -> Self {
        Self {
            inner: Writer::new(Vec::new()),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.inner
            .write_event(event)
            .map_err(|e| WaypointError::GpxWrite(e.to_string()))
    }

    fn start(&mut self, name: &str) -> Result<()> {
        self.event(Event::Start(BytesStart::new(name)))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn newline(&mut self) -> Result<()> {
        self.event(Event::Text(BytesText::new("\n")))
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start(name)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    /// A text element on its own line.
    fn line(&mut self, name: &str, text: &str) -> Result<()> {
        self.text_element(name, text)?;
        self.newline()
    }

    fn finish(self) -> Result<String> {
        String::from_utf8(self.inner.into_inner())
            .map_err(|e| WaypointError::GpxWrite(e.to_string()))
    }
}
