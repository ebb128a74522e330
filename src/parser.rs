//! Reads waypoints back from GPX documents written by [`GpxExporter`](crate::GpxExporter).

use chrono::DateTime;
use quick_xml::Reader;
use quick_xml::events::{BytesRef, BytesStart, Event};

use crate::category::Category;
use crate::error::{Result, WaypointError};
use crate::sample::{LocationSample, utc_to_epoch};
use crate::waypoint::{HexColor, Waypoint};

const DEFAULT_COLOR: &str = "#ffffff";
const IMPORT_PROVIDER: &str = "gpx";

/// Raw `<wpt>` contents before validation.
#[derive(Debug, Default)]
struct RawWaypoint {
    lat: f64,
    lon: f64,
    ele: Option<f64>,
    time: Option<String>,
    name: Option<String>,
    desc: Option<String>,
    point_type: Option<String>,
    category: Option<String>,
    hdop: Option<f64>,
    color: Option<String>,
    icon: Option<String>,
}

/// Parse every `<wpt>` of a GPX document into validated waypoints.
///
/// Points without usable coordinates or with out-of-range measurements are
/// skipped. Both sample times are taken from `<time>`, since GPX keeps no
/// separate fix time.
pub fn read_waypoints(xml: &str) -> Result<Vec<Waypoint>> {
    let mut reader = Reader::from_str(xml);
    let mut waypoints = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"wpt" => {
                match parse_lat_lon(&e) {
                    Ok((lat, lon)) => {
                        let raw = parse_wpt_children(lat, lon, &mut reader)?;
                        push_valid(&mut waypoints, build_waypoint(raw))?;
                    }
                    Err(err) => {
                        log::warn!("skipping waypoint: {err}");
                        reader.read_to_end(e.name())?;
                    }
                }
            }
            Event::Empty(e) if e.local_name().as_ref() == b"wpt" => {
                if let Ok((lat, lon)) = parse_lat_lon(&e) {
                    let raw = RawWaypoint {
                        lat,
                        lon,
                        ..RawWaypoint::default()
                    };
                    push_valid(&mut waypoints, build_waypoint(raw))?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    log::info!("read {} waypoints from GPX", waypoints.len());
    Ok(waypoints)
}

/// Keeps a built waypoint. A point rejected for its coordinates or
/// measurements is dropped on its own; any other error ends the import.
fn push_valid(waypoints: &mut Vec<Waypoint>, built: Result<Waypoint>) -> Result<()> {
    match built {
        Ok(waypoint) => waypoints.push(waypoint),
        Err(
            e @ (WaypointError::InvalidCoordinates { .. }
            | WaypointError::InvalidMeasurement { .. }),
        ) => log::warn!("skipping waypoint: {e}"),
        Err(e) => return Err(e),
    }
    Ok(())
}

fn parse_lat_lon(e: &BytesStart<'_>) -> Result<(f64, f64)> {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for attr in e.attributes() {
        let attr = attr.map_err(|e| WaypointError::XmlParse(e.into()))?;
        let val = std::str::from_utf8(&attr.value).unwrap_or_default();
        let slot = match attr.key.local_name().as_ref() {
            b"lat" => (&mut lat, "lat"),
            b"lon" => (&mut lon, "lon"),
            _ => continue,
        };
        let parsed = val
            .trim()
            .parse::<f64>()
            .map_err(|_| WaypointError::InvalidAttribute {
                element: "wpt",
                attribute: slot.1,
                value: val.to_string(),
            })?;
        *slot.0 = Some(parsed);
    }

    let lat = lat.ok_or(WaypointError::MissingAttribute {
        element: "wpt",
        attribute: "lat",
    })?;
    let lon = lon.ok_or(WaypointError::MissingAttribute {
        element: "wpt",
        attribute: "lon",
    })?;
    Ok((lat, lon))
}

/// Called after the `<wpt>` start tag; consumes up to its end tag.
fn parse_wpt_children(lat: f64, lon: f64, reader: &mut Reader<&[u8]>) -> Result<RawWaypoint> {
    let mut raw = RawWaypoint {
        lat,
        lon,
        ..RawWaypoint::default()
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"ele" => raw.ele = element_text(reader, &e)?.trim().parse().ok(),
                b"hdop" => raw.hdop = element_text(reader, &e)?.trim().parse().ok(),
                b"time" => raw.time = Some(element_text(reader, &e)?),
                b"name" => raw.name = Some(element_text(reader, &e)?),
                b"desc" => raw.desc = Some(element_text(reader, &e)?),
                b"type" => raw.point_type = Some(element_text(reader, &e)?),
                b"category" => raw.category = Some(element_text(reader, &e)?),
                // Descend into <extensions>; its children are matched by local name.
                b"extensions" => {}
                b"color" => raw.color = Some(element_text(reader, &e)?),
                b"icon" => raw.icon = Some(element_text(reader, &e)?),
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::End(e) if e.local_name().as_ref() == b"wpt" => break,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(raw)
}

fn build_waypoint(raw: RawWaypoint) -> Result<Waypoint> {
    let time = match raw.time.as_deref().map(str::trim) {
        Some(text) => {
            let parsed =
                DateTime::parse_from_rfc3339(text).map_err(|_| WaypointError::InvalidValue {
                    element: "time",
                    value: text.to_string(),
                })?;
            utc_to_epoch(parsed.to_utc())
        }
        None => 0.0,
    };

    let category = [raw.point_type.as_deref(), raw.category.as_deref()]
        .into_iter()
        .flatten()
        .find_map(|t| t.trim().parse::<Category>().ok())
        .or_else(|| raw.icon.as_deref().and_then(|i| Category::from_osmand_icon(i.trim())))
        .unwrap_or(Category::Other);

    let color: HexColor = raw
        .color
        .as_deref()
        .map(str::trim)
        .unwrap_or(DEFAULT_COLOR)
        .parse()?;

    let provider = raw
        .desc
        .as_deref()
        .and_then(desc_provider)
        .unwrap_or(IMPORT_PROVIDER)
        .to_string();

    let title = raw
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| category.as_str().to_string());

    let sample = LocationSample {
        provider,
        latitude: raw.lat,
        longitude: raw.lon,
        altitude: raw.ele.unwrap_or(0.0),
        accuracy: raw.hdop.unwrap_or(0.0),
        fix_time: time,
        capture_time: time,
    };
    Waypoint::new(sample, title, color, category)
}

/// `provider=gps, category=berry, date=...` -> `gps`
fn desc_provider(desc: &str) -> Option<&str> {
    desc.split(',')
        .filter_map(|part| part.trim().strip_prefix("provider="))
        .find(|p| !p.is_empty())
}

/// Character data of `start` up to its end tag, with character and
/// predefined entity references resolved.
fn element_text(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<String> {
    let mut text = String::new();
    loop {
        let chunk = match reader.read_event()? {
            Event::Text(t) => t.into_inner(),
            Event::CData(c) => c.into_inner(),
            Event::GeneralRef(r) => {
                push_reference(&mut text, &r);
                continue;
            }
            Event::End(e) if e.name() == start.name() => return Ok(text),
            Event::Eof => return Ok(text),
            _ => continue,
        };
        text.push_str(&String::from_utf8_lossy(&chunk));
    }
}

fn push_reference(text: &mut String, reference: &BytesRef<'_>) {
    if let Ok(Some(ch)) = reference.resolve_char_ref() {
        text.push(ch);
        return;
    }
    let ch = match &**reference {
        b"amp" => '&',
        b"lt" => '<',
        b"gt" => '>',
        b"quot" => '"',
        b"apos" => '\'',
        other => {
            log::debug!("dropping unknown entity &{};", String::from_utf8_lossy(other));
            return;
        }
    };
    text.push(ch);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exporter_dialect() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<gpx version="1.1" creator="MushroomGPS" xmlns="http://www.topografix.com/GPX/1/1" xmlns:osmand="https://osmand.net">
<wpt lat="55.1" lon="37.2">
<ele>120</ele>
<time>1970-01-01T00:16:45Z</time>
<name>Boletus &amp; co</name>
<desc>provider=gps, category=mushroom, date=1970-01-01 00:16:45</desc>
<type>mushroom</type>
<hdop>5</hdop>
<extensions>
<osmand:color>#ff0000</osmand:color>
<osmand:icon>power_tower</osmand:icon>
</extensions>
</wpt>
</gpx>"#;
        let points = read_waypoints(xml).unwrap();
        assert_eq!(points.len(), 1);
        let w = &points[0];
        assert_eq!(w.title(), "Boletus & co");
        assert_eq!(w.category(), Category::Mushroom);
        assert_eq!(w.color().as_str(), "#ff0000");
        assert_eq!(w.sample().provider, "gps");
        assert_eq!(w.sample().latitude, 55.1);
        assert_eq!(w.sample().altitude, 120.0);
        assert_eq!(w.sample().accuracy, 5.0);
        assert_eq!(w.sample().capture_time, 1005.0);
    }

    #[test]
    fn test_category_from_icon_when_type_missing() {
        let xml = r#"<gpx><wpt lat="1" lon="2"><name>x</name>
<extensions><osmand:icon>sport_soccer</osmand:icon></extensions></wpt></gpx>"#;
        let points = read_waypoints(xml).unwrap();
        assert_eq!(points[0].category(), Category::Berry);
        assert_eq!(points[0].color().as_str(), "#ffffff");
        assert_eq!(points[0].sample().provider, "gpx");
    }

    #[test]
    fn test_missing_lat_lon_skipped() {
        let xml = r#"<gpx>
  <wpt lat="35.0" lon="139.0"><name>Good</name></wpt>
  <wpt><name>Bad - no coords</name></wpt>
  <wpt lat="36.0" lon="140.0"/>
</gpx>"#;
        let points = read_waypoints(xml).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].title(), "Good");
        // Unnamed points are titled after their category.
        assert_eq!(points[1].title(), "other");
    }

    #[test]
    fn test_out_of_range_points_skipped() {
        let xml = r#"<gpx>
  <wpt lat="1" lon="2"><name>Kept</name></wpt>
  <wpt lat="95" lon="2"><name>Too far north</name></wpt>
  <wpt lat="NaN" lon="2"/>
  <wpt lat="3" lon="4"><name>Bad hdop</name><hdop>-2</hdop></wpt>
</gpx>"#;
        let points = read_waypoints(xml).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].title(), "Kept");
    }

    #[test]
    fn test_category_extension() {
        let xml = r#"<gpx><wpt lat="1" lon="2"><name>x</name>
<extensions><category>berry</category><color>#00ff00</color></extensions></wpt></gpx>"#;
        let points = read_waypoints(xml).unwrap();
        assert_eq!(points[0].category(), Category::Berry);
        assert_eq!(points[0].color().as_str(), "#00ff00");
    }

    #[test]
    fn test_element_text_references_and_cdata() {
        let xml = r#"<gpx><wpt lat="1" lon="2"><name>A &lt;&#66;&gt; &unknown;<![CDATA[ & C]]></name></wpt></gpx>"#;
        let points = read_waypoints(xml).unwrap();
        assert_eq!(points[0].title(), "A <B>  & C");
    }

    #[test]
    fn test_bad_time_is_rejected() {
        let xml = r#"<gpx><wpt lat="1" lon="2"><time>yesterday</time></wpt></gpx>"#;
        assert!(matches!(
            read_waypoints(xml),
            Err(WaypointError::InvalidValue { element: "time", .. })
        ));
    }

    #[test]
    fn test_desc_provider() {
        assert_eq!(
            desc_provider("provider=fused, category=berry, date=x"),
            Some("fused")
        );
        assert_eq!(desc_provider("a lovely spot"), None);
    }
}
