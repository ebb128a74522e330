use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WaypointError;

/// What a waypoint marks. The set is closed: anything else is rejected
/// when the waypoint is built or loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Mushroom,
    Berry,
    Orientir,
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Mushroom,
        Category::Berry,
        Category::Orientir,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Mushroom => "mushroom",
            Category::Berry => "berry",
            Category::Orientir => "orientir",
            Category::Other => "other",
        }
    }

    /// OsmAnd favourite icon used for this category in GPX exports.
    pub fn osmand_icon(self) -> &'static str {
        match self {
            Category::Mushroom => "power_tower",
            Category::Berry => "sport_soccer",
            Category::Orientir => "special_flag_stroke",
            Category::Other => "special_marker",
        }
    }

    /// Reverse of [`Category::osmand_icon`].
    pub fn from_osmand_icon(icon: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.osmand_icon() == icon)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = WaypointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| WaypointError::InvalidCategory(s.to_string()))
    }
}
