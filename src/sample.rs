use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Named source of location fixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Fused,
    Gps,
    Network,
    Passive,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Fused => "fused",
            ProviderKind::Gps => "gps",
            ProviderKind::Network => "network",
            ProviderKind::Passive => "passive",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fused" => Ok(ProviderKind::Fused),
            "gps" => Ok(ProviderKind::Gps),
            "network" => Ok(ProviderKind::Network),
            "passive" => Ok(ProviderKind::Passive),
            other => Err(format!("unknown location provider '{other}'")),
        }
    }
}

/// One read of a location provider.
///
/// Times are Unix seconds and may carry a fractional part. `fix_time` is
/// expected to be at or before `capture_time`, but skew is kept as reported.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSample {
    pub provider: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Meters above the WGS84 ellipsoid.
    pub altitude: f64,
    /// Horizontal accuracy radius in meters.
    pub accuracy: f64,
    pub fix_time: f64,
    pub capture_time: f64,
}

impl LocationSample {
    /// Seconds between the provider computing the fix and the app reading it.
    /// Negative when the provider clock runs ahead.
    pub fn staleness_secs(&self) -> f64 {
        self.capture_time - self.fix_time
    }

    /// Short position line, e.g. `55.1N 37.2E ± 5.0m [120.0m ^] <g>`.
    pub fn summary(&self) -> String {
        let ns = if self.latitude >= 0.0 { 'N' } else { 'S' };
        let ew = if self.longitude >= 0.0 { 'E' } else { 'W' };
        let prov = self.provider.chars().next().unwrap_or('?');
        format!(
            "{:.1}{ns} {:.1}{ew} ± {:.1}m [{:.1}m ^] <{prov}>",
            self.latitude.abs(),
            self.longitude.abs(),
            self.accuracy,
            self.altitude,
        )
    }

    /// Fix age line, e.g. `16:40 <gps> [+5.0s] {±5.0m}`.
    pub fn fix_summary(&self) -> String {
        format!(
            "{} <{}> [{:+.1}s] {{±{:.1}m}}",
            epoch_to_utc(self.fix_time).format("%M:%S"),
            self.provider,
            self.staleness_secs(),
            self.accuracy,
        )
    }
}

/// Converts Unix seconds to a UTC timestamp. Values chrono cannot represent
/// collapse to the epoch.
pub fn epoch_to_utc(secs: f64) -> DateTime<Utc> {
    if !secs.is_finite() {
        return DateTime::UNIX_EPOCH;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos).unwrap_or(DateTime::UNIX_EPOCH)
}

/// `2024-09-01 10:00:05` style, as stored in the informational JSON fields.
pub fn format_date(secs: f64) -> String {
    epoch_to_utc(secs).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// RFC 3339 with second precision, as used by GPX `<time>`.
pub fn format_iso8601(secs: f64) -> String {
    epoch_to_utc(secs).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Unix seconds for a UTC timestamp, keeping sub-second precision.
pub fn utc_to_epoch(time: DateTime<Utc>) -> f64 {
    time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) / 1e9
}
