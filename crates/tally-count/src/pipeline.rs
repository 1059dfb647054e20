use std::collections::BTreeSet;

use anyhow::Result;
use tally_proto::{CountSnapshot, Detection};
use tally_track::{Tracker, TrackerConfig, TrackedObject};
use tally_zones::{update_zone, ZoneConfig};
use thiserror::Error;
use tracing::info;

use crate::routes::{update_counting, ClassTally, RouteTally, TallyError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("frame {got} out of order, expected frame {expected}")]
    FrameOutOfOrder { expected: u64, got: u64 },
    #[error("track {id}: {source}")]
    Tally { id: u64, source: TallyError },
    #[error("pipeline halted by an error in frame {frame}")]
    Halted { frame: u64 },
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub tracker: TrackerConfig,
    pub zones: ZoneConfig,
    pub classes_to_count: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSummary {
    pub frame: u64,
    pub active_tracks: usize,
    /// Ids whose route was counted during this frame.
    pub newly_counted: Vec<u64>,
}

/// Tracker, zone logic and counter run back to back, once per frame.
#[derive(Debug, Clone)]
pub struct FramePipeline {
    tracker: Tracker,
    zones: ZoneConfig,
    od_tally: RouteTally,
    class_tally: ClassTally,
    last_frame: u64,
    /// Frame that failed half-way; no further frame is accepted after it.
    halted_at: Option<u64>,
}

impl FramePipeline {
    /// Fails on any configuration the doctor checks reject.
    pub fn new(cfg: PipelineConfig) -> Result<Self> {
        tally_track::doctor::check_thresholds(&cfg.tracker)?;
        tally_zones::doctor::check_zones(&cfg.zones)?;
        crate::doctor::check_classes(&cfg.classes_to_count)?;

        info!(
            zones = cfg.zones.zones.len(),
            classes = cfg.classes_to_count.len(),
            max_distance = cfg.tracker.max_distance,
            max_missed = cfg.tracker.max_missed,
            "pipeline ready"
        );
        Ok(Self {
            class_tally: ClassTally::seeded(cfg.classes_to_count.iter().map(String::as_str)),
            tracker: Tracker::new(cfg.tracker),
            zones: cfg.zones,
            od_tally: RouteTally::new(),
            last_frame: 0,
            halted_at: None,
        })
    }

    /// Frames are numbered from 1 and must arrive without gaps.
    ///
    /// A `Tally` error leaves that frame partly applied, so the pipeline halts:
    /// every later call returns `Halted`. The tallies stay readable.
    pub fn process_frame(&mut self, frame: u64, dets: &[Detection]) -> Result<FrameSummary, PipelineError> {
        if let Some(at) = self.halted_at {
            return Err(PipelineError::Halted { frame: at });
        }
        let expected = self.last_frame + 1;
        if frame != expected {
            return Err(PipelineError::FrameOutOfOrder { expected, got: frame });
        }
        self.last_frame = frame;

        self.tracker.update(dets);

        let mut newly_counted = Vec::new();
        for obj in self.tracker.iter_mut() {
            update_zone(obj, &self.zones);
            match update_counting(obj, frame, &mut self.od_tally, &mut self.class_tally) {
                Ok(true) => newly_counted.push(obj.id),
                Ok(false) => {}
                Err(source) => {
                    self.halted_at = Some(frame);
                    return Err(PipelineError::Tally { id: obj.id, source });
                }
            }
        }

        Ok(FrameSummary { frame, active_tracks: self.tracker.len(), newly_counted })
    }

    pub fn last_frame(&self) -> u64 {
        self.last_frame
    }

    pub fn is_halted(&self) -> bool {
        self.halted_at.is_some()
    }

    pub fn tracked(&self) -> impl Iterator<Item = &TrackedObject> {
        self.tracker.iter()
    }

    pub fn routes(&self) -> &RouteTally {
        &self.od_tally
    }

    pub fn classes(&self) -> &ClassTally {
        &self.class_tally
    }

    pub fn zones(&self) -> &ZoneConfig {
        &self.zones
    }

    /// Owned copy of the tallies for consumers that outlive the current frame.
    pub fn snapshot(&self) -> CountSnapshot {
        CountSnapshot {
            frame: self.last_frame,
            active_tracks: self.tracker.len(),
            routes: self.od_tally.as_map().clone(),
            classes: self.class_tally.as_map().clone(),
        }
    }
}
