use std::collections::BTreeSet;

use tally_proto::{BoundingBox, Detection, Point};

/// Per-vehicle record shared by the tracker, the zone logic and the counter.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedObject {
    pub id: u64,
    pub class_label: String,
    /// Label seen at registration. This is what gets tallied.
    pub initial_class_label: String,
    pub centroid: Point,
    pub bounding_box: BoundingBox,

    pub missed_count: u32,  // frames since last match
    pub frames_active: u32, // matched frames, 1 at creation

    /// Consecutive frames inside `current_zone`.
    pub zone_dwell_count: u32,
    pub current_zone: Option<String>,
    pub zones_passed: Vec<String>,
    pub zones_visited: BTreeSet<String>,

    pub counted: bool,
    pub count_frame: Option<u64>,
}

impl TrackedObject {
    pub(crate) fn register(id: u64, det: &Detection) -> Self {
        Self {
            id,
            class_label: det.label.clone(),
            initial_class_label: det.label.clone(),
            centroid: det.bbox.centroid(),
            bounding_box: det.bbox,
            missed_count: 0,
            frames_active: 1,
            zone_dwell_count: 0,
            current_zone: None,
            zones_passed: Vec::new(),
            zones_visited: BTreeSet::new(),
            counted: false,
            count_frame: None,
        }
    }

    pub(crate) fn observe(&mut self, bbox: BoundingBox, centroid: Point) {
        self.centroid = centroid;
        self.bounding_box = bbox;
        self.missed_count = 0;
        self.frames_active += 1;
    }

    /// "origin->destination" once at least two zones were visited.
    pub fn route(&self) -> Option<String> {
        match self.zones_passed.as_slice() {
            [origin, .., destination] => Some(format!("{}->{}", origin, destination)),
            _ => None,
        }
    }
}
