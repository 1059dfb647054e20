use std::collections::{BTreeMap, BTreeSet};

use tally_track::TrackedObject;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TallyError {
    #[error("class {0:?} is not one of the configured classes")]
    UnknownClass(String),
}

/// Completed "origin->destination" routes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTally(BTreeMap<String, u64>);

impl RouteTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, route: &str) {
        *self.0.entry(route.to_string()).or_insert(0) += 1;
    }

    pub fn get(&self, route: &str) -> u64 {
        self.0.get(route).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn as_map(&self) -> &BTreeMap<String, u64> {
        &self.0
    }
}

/// Per-class counts. Seeded with every configured class at construction and
/// never grows afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassTally(BTreeMap<String, u64>);

impl ClassTally {
    pub fn seeded<'a>(classes: impl IntoIterator<Item = &'a str>) -> Self {
        Self(classes.into_iter().map(|c| (c.to_string(), 0)).collect())
    }

    pub fn increment(&mut self, class: &str) -> Result<(), TallyError> {
        let n = self
            .0
            .get_mut(class)
            .ok_or_else(|| TallyError::UnknownClass(class.to_string()))?;
        *n += 1;
        Ok(())
    }

    pub fn contains(&self, class: &str) -> bool {
        self.0.contains_key(class)
    }

    pub fn get(&self, class: &str) -> Option<u64> {
        self.0.get(class).copied()
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn classes(&self) -> BTreeSet<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn as_map(&self) -> &BTreeMap<String, u64> {
        &self.0
    }
}

/// Counts the object's route the first time it has visited two zones.
///
/// Returns `Ok(true)` when this call did the counting. An object is counted at
/// most once; later calls are no-ops even if more zones get appended.
pub fn update_counting(
    obj: &mut TrackedObject,
    frame_number: u64,
    od_tally: &mut RouteTally,
    class_tally: &mut ClassTally,
) -> Result<bool, TallyError> {
    if obj.counted {
        return Ok(false);
    }
    let Some(route) = obj.route() else {
        return Ok(false);
    };

    // class first: an unknown label must leave both tallies untouched
    class_tally.increment(&obj.initial_class_label)?;
    od_tally.increment(&route);
    obj.counted = true;
    obj.count_frame = Some(frame_number);

    debug!(id = obj.id, %route, class = %obj.initial_class_label, frame = frame_number, "route counted");
    Ok(true)
}
