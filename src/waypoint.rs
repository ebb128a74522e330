use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::{Result, WaypointError};
use crate::sample::{LocationSample, format_date};

/// `#RRGGBB` marker color.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HexColor(String);

impl HexColor {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Channels scaled to `0.0..=1.0`, alpha fixed at 1.
    pub fn to_rgba(&self) -> (f32, f32, f32, f32) {
        let channel = |i: usize| {
            u8::from_str_radix(&self.0[i..i + 2], 16).map_or(0.0, |v| f32::from(v) / 255.0)
        };
        (channel(1), channel(3), channel(5), 1.0)
    }
}

impl FromStr for HexColor {
    type Err = WaypointError;

    fn from_str(s: &str) -> Result<Self> {
        let valid = s.len() == 7
            && s.starts_with('#')
            && s[1..].bytes().all(|b| b.is_ascii_hexdigit());
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(WaypointError::InvalidColor(s.to_string()))
        }
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A committed, user-tagged location sample.
///
/// Construction validates every field, so a `Waypoint` in hand always has a
/// non-empty title, a well-formed color, in-range coordinates and finite
/// measurements that survive a JSON round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WaypointRecord", try_from = "WaypointRecord")]
pub struct Waypoint {
    sample: LocationSample,
    title: String,
    color: HexColor,
    category: Category,
}

impl Waypoint {
    pub fn new(
        sample: LocationSample,
        title: impl Into<String>,
        color: HexColor,
        category: Category,
    ) -> Result<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(WaypointError::EmptyTitle);
        }
        let (lat, lon) = (sample.latitude, sample.longitude);
        let in_range = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        if !in_range {
            return Err(WaypointError::InvalidCoordinates { lat, lon });
        }
        // JSON has no encoding for NaN or infinity, so every stored number
        // must be finite. Accuracy is a radius and cannot be negative.
        let measurements = [
            ("altitude", sample.altitude),
            ("accuracy", sample.accuracy),
            ("fix time", sample.fix_time),
            ("capture time", sample.capture_time),
        ];
        for (field, value) in measurements {
            if !value.is_finite() {
                return Err(WaypointError::InvalidMeasurement { field, value });
            }
        }
        if sample.accuracy < 0.0 {
            return Err(WaypointError::InvalidMeasurement {
                field: "accuracy",
                value: sample.accuracy,
            });
        }
        if sample.fix_time > sample.capture_time {
            log::warn!(
                "fix time {} is after capture time {} for '{}' (provider {})",
                sample.fix_time,
                sample.capture_time,
                title,
                sample.provider
            );
        }
        Ok(Self {
            sample,
            title,
            color,
            category,
        })
    }

    /// Like [`Waypoint::new`] but takes color and category as raw strings.
    pub fn parse(
        sample: LocationSample,
        title: impl Into<String>,
        color: &str,
        category: &str,
    ) -> Result<Self> {
        Self::new(sample, title, color.parse()?, category.parse()?)
    }

    pub fn sample(&self) -> &LocationSample {
        &self.sample
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn color(&self) -> &HexColor {
        &self.color
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// `2024-09-01 10:00:05 Boletus [mushroom]`, as shown in the point list.
    pub fn list_line(&self) -> String {
        format!(
            "{} {} [{}]",
            format_date(self.sample.capture_time),
            self.title,
            self.category
        )
    }
}

/// On-disk layout of one waypoint. Fields are declared in alphabetical order
/// so the serialized keys come out sorted.
#[derive(Serialize, Deserialize)]
struct WaypointRecord {
    acc: f64,
    alt: f64,
    category: Category,
    color: String,
    #[serde(default)]
    date: String,
    lat: f64,
    lon: f64,
    prov: String,
    #[serde(default)]
    realdate: String,
    realtime: f64,
    time: f64,
    title: String,
}

impl From<Waypoint> for WaypointRecord {
    fn from(w: Waypoint) -> Self {
        let s = w.sample;
        Self {
            acc: s.accuracy,
            alt: s.altitude,
            category: w.category,
            color: w.color.0,
            date: format_date(s.fix_time),
            lat: s.latitude,
            lon: s.longitude,
            prov: s.provider,
            realdate: format_date(s.capture_time),
            realtime: s.capture_time,
            time: s.fix_time,
            title: w.title,
        }
    }
}

impl TryFrom<WaypointRecord> for Waypoint {
    type Error = WaypointError;

    fn try_from(r: WaypointRecord) -> Result<Self> {
        let sample = LocationSample {
            provider: r.prov,
            latitude: r.lat,
            longitude: r.lon,
            altitude: r.alt,
            accuracy: r.acc,
            fix_time: r.time,
            capture_time: r.realtime,
        };
        Waypoint::new(sample, r.title, r.color.parse()?, r.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LocationSample {
        LocationSample {
            provider: "fused".to_string(),
            latitude: 55.1,
            longitude: 37.2,
            altitude: 120.0,
            accuracy: 5.0,
            fix_time: 1000.0,
            capture_time: 1005.0,
        }
    }

    #[test]
    fn test_parse_rejects_unknown_category() {
        let err = Waypoint::parse(sample(), "Boletus", "#ff0000", "truffle").unwrap_err();
        assert!(matches!(err, WaypointError::InvalidCategory(_)));
    }

    #[test]
    fn test_rejects_bad_title_color_coords() {
        assert!(matches!(
            Waypoint::parse(sample(), "  ", "#ff0000", "berry"),
            Err(WaypointError::EmptyTitle)
        ));
        assert!(matches!(
            Waypoint::parse(sample(), "x", "red", "berry"),
            Err(WaypointError::InvalidColor(_))
        ));
        let mut s = sample();
        s.latitude = 91.0;
        assert!(matches!(
            Waypoint::parse(s, "x", "#ff0000", "berry"),
            Err(WaypointError::InvalidCoordinates { .. })
        ));
    }

    #[test]
    fn test_rejects_unstorable_measurements() {
        let cases: [(fn(&mut LocationSample), &str); 5] = [
            (|s| s.altitude = f64::NAN, "altitude"),
            (|s| s.accuracy = f64::INFINITY, "accuracy"),
            (|s| s.accuracy = -1.0, "accuracy"),
            (|s| s.fix_time = f64::NEG_INFINITY, "fix time"),
            (|s| s.capture_time = f64::NAN, "capture time"),
        ];
        for (mutate, expected) in cases {
            let mut s = sample();
            mutate(&mut s);
            let err = Waypoint::parse(s, "x", "#ff0000", "berry").unwrap_err();
            assert!(
                matches!(err, WaypointError::InvalidMeasurement { field, .. } if field == expected),
                "{err}"
            );
        }
        let mut s = sample();
        s.accuracy = 0.0;
        assert!(Waypoint::parse(s, "x", "#ff0000", "berry").is_ok());
    }

    #[test]
    fn test_rgba() {
        let c: HexColor = "#ff0080".parse().unwrap();
        let (r, g, b, a) = c.to_rgba();
        assert_eq!(r, 1.0);
        assert_eq!(g, 0.0);
        assert!((b - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(a, 1.0);
    }

    #[test]
    fn test_json_keys_sorted() {
        let w = Waypoint::parse(sample(), "Boletus", "#ff0000", "mushroom").unwrap();
        let json = serde_json::to_string(&w).unwrap();
        let keys: Vec<&str> = [
            "acc", "alt", "category", "color", "date", "lat", "lon", "prov", "realdate",
            "realtime", "time", "title",
        ]
        .to_vec();
        let positions: Vec<usize> = keys
            .iter()
            .map(|k| json.find(&format!("\"{k}\":")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|p| p[0] < p[1]), "{json}");
        assert!(json.contains("\"date\":\"1970-01-01 00:16:40\""));
        assert!(json.contains("\"realdate\":\"1970-01-01 00:16:45\""));
    }

    #[test]
    fn test_legacy_record_extra_keys_ignored() {
        let json = r##"{"acc": 0, "alt": 0, "category": "other", "color": "#00ff00",
            "date": "1970-01-01 00:00:00", "dt": 0, "lat": 0, "lon": 0, "prov": "fake",
            "realdate": "1970-01-01 00:00:00", "realtime": 0, "sdate": "00:00",
            "srealdate": "00:00", "time": 0, "title": "Camp"}"##;
        let w: Waypoint = serde_json::from_str(json).unwrap();
        assert_eq!(w.title(), "Camp");
        assert_eq!(w.category(), Category::Other);
        assert_eq!(w.sample().provider, "fake");
    }

    #[test]
    fn test_list_line() {
        let w = Waypoint::parse(sample(), "Boletus", "#ff0000", "mushroom").unwrap();
        assert_eq!(w.list_line(), "1970-01-01 00:16:45 Boletus [mushroom]");
    }
}
