use std::collections::{BTreeMap, BTreeSet};

use tally_proto::Detection;
use tracing::debug;

use crate::object::TrackedObject;

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Pixels. A detection farther than this from every track starts a new one.
    pub max_distance: f64,
    pub max_missed: u32,
    /// Frames a counted track may stay alive before it is dropped.
    pub max_tracking_time: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self { max_distance: 80.0, max_missed: 5, max_tracking_time: 300 }
    }
}

/// Centroid tracker with greedy nearest-neighbour association.
///
/// Association is greedy rather than a global assignment: detections are matched in
/// input order, each against the nearest still unclaimed track within
/// `max_distance`. Uncounted tracks are scanned before counted ones and, within
/// each group, fresher tracks (lower `missed_count`) before stale ones, so on an
/// exact distance tie the earlier candidate wins.
#[derive(Debug, Clone)]
pub struct Tracker {
    cfg: TrackerConfig,
    next_id: u64,
    tracks: BTreeMap<u64, TrackedObject>,
}

impl Tracker {
    pub fn new(cfg: TrackerConfig) -> Self {
        Self { cfg, next_id: 0, tracks: BTreeMap::new() }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.cfg
    }

    /// Id the next registered track will get.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&TrackedObject> {
        self.tracks.get(&id)
    }

    /// Live tracks by ascending id.
    pub fn iter(&self) -> impl Iterator<Item = &TrackedObject> {
        self.tracks.values()
    }

    /// Mutable access for the downstream stages. Tracks can be changed, never
    /// added or removed, from outside the tracker.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TrackedObject> {
        self.tracks.values_mut()
    }

    /// Advances the tracker by exactly one frame.
    pub fn update(&mut self, dets: &[Detection]) -> &BTreeMap<u64, TrackedObject> {
        self.cleanup();

        // Scan order: uncounted first, then fewer misses, then id.
        let mut order: Vec<(bool, u32, u64)> = self
            .tracks
            .values()
            .map(|t| (t.counted, t.missed_count, t.id))
            .collect();
        order.sort_unstable();

        let mut claimed: BTreeSet<u64> = BTreeSet::new();
        let mut unmatched: Vec<&Detection> = Vec::new();

        for det in dets {
            let c = det.bbox.centroid();
            let mut best_id = None;
            let mut best_dist = self.cfg.max_distance;

            for &(_, _, id) in &order {
                if claimed.contains(&id) {
                    continue;
                }
                let Some(t) = self.tracks.get(&id) else { continue };
                let dist = c.distance(&t.centroid);
                if dist < best_dist {
                    best_dist = dist;
                    best_id = Some(id);
                }
            }

            match best_id.and_then(|id| self.tracks.get_mut(&id)) {
                Some(t) => {
                    t.observe(det.bbox, c);
                    claimed.insert(t.id);
                }
                None => unmatched.push(det),
            }
        }

        for t in self.tracks.values_mut() {
            if !claimed.contains(&t.id) {
                t.missed_count += 1;
            }
        }

        // Registered last: a fresh track is never aged or matched in its own frame.
        for det in unmatched {
            let id = self.next_id;
            self.next_id += 1;
            let t = TrackedObject::register(id, det);
            debug!(id, class = %t.class_label, x = t.centroid.x, y = t.centroid.y, "track registered");
            self.tracks.insert(id, t);
        }

        &self.tracks
    }

    fn cleanup(&mut self) {
        let cfg = &self.cfg;
        self.tracks.retain(|id, t| {
            let lost = t.missed_count > cfg.max_missed;
            let expired = t.counted && t.frames_active > cfg.max_tracking_time;
            if lost || expired {
                debug!(id = *id, lost, expired, missed = t.missed_count, frames = t.frames_active, "track dropped");
            }
            !(lost || expired)
        });
    }
}
