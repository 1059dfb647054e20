use serde::{Deserialize, Serialize};
use tally_proto::Point;

use crate::geometry::point_in_polygon;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub polygon: Vec<Point>,
}

impl Zone {
    pub fn new(name: impl Into<String>, polygon: Vec<Point>) -> Self {
        Self { name: name.into(), polygon }
    }

    pub fn contains(&self, p: Point) -> bool {
        point_in_polygon(&self.polygon, p)
    }
}

/// Zones in configuration order. Lookups return the first match, so where two
/// zones overlap the one listed first owns the shared area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneSet(Vec<Zone>);

impl ZoneSet {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self(zones)
    }

    pub fn locate(&self, p: Point) -> Option<&Zone> {
        self.0.iter().find(|z| z.contains(p))
    }

    pub fn get(&self, name: &str) -> Option<&Zone> {
        self.0.iter().find(|z| z.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|z| z.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Zone>> for ZoneSet {
    fn from(v: Vec<Zone>) -> Self {
        Self(v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Consecutive frames inside a zone before the visit is recorded.
    pub min_frames_to_enter_zone: u32,
    #[serde(rename = "zone", default)]
    pub zones: ZoneSet,
}
