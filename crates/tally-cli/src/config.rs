use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;

use tally_count::PipelineConfig;
use tally_track::TrackerConfig;
use tally_zones::ZoneConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub tracking: TrackingCfg,
    pub zones: ZoneConfig,
    pub classes: ClassesCfg,
    #[serde(default)]
    pub detector: DetectorCfg,
    #[serde(default)]
    pub output: OutputCfg,
}

#[derive(Debug, Deserialize)]
pub struct TrackingCfg {
    pub max_distance: f64,
    pub max_missed: u32,
    pub max_tracking_time: u32,
}

#[derive(Debug, Deserialize)]
pub struct ClassesCfg {
    pub to_count: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetectorCfg {
    /// Detections scoring below this are dropped before tracking.
    pub min_score: f32,
}

impl Default for DetectorCfg {
    fn default() -> Self {
        Self { min_score: 0.5 }
    }
}

#[derive(Debug, Deserialize)]
pub struct OutputCfg {
    #[serde(default = "default_results_root")]
    pub results_root: String,
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,
}

impl Default for OutputCfg {
    fn default() -> Self {
        Self { results_root: default_results_root(), progress_every: default_progress_every() }
    }
}

fn default_results_root() -> String {
    ".".into()
}

fn default_progress_every() -> u64 {
    100
}

impl Config {
    pub fn classes_to_count(&self) -> BTreeSet<String> {
        self.classes.to_count.iter().cloned().collect()
    }

    /// Checks the driver-side settings; the pipeline checks its own on construction.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.detector.min_score),
            "detector.min_score must be within 0..=1, got {}",
            self.detector.min_score
        );
        anyhow::ensure!(self.output.progress_every >= 1, "output.progress_every must be >= 1");
        anyhow::ensure!(!self.output.results_root.trim().is_empty(), "output.results_root must not be empty");
        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            tracker: TrackerConfig {
                max_distance: self.tracking.max_distance,
                max_missed: self.tracking.max_missed,
                max_tracking_time: self.tracking.max_tracking_time,
            },
            zones: self.zones.clone(),
            classes_to_count: self.classes_to_count(),
        }
    }
}

pub fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).with_context(|| format!("read config {}", path))?;
    parse_config(&s)
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_proto::Point;

    const EXAMPLE: &str = include_str!("../../../config/tally.example.toml");

    #[test]
    fn example_config_parses() {
        let cfg = parse_config(EXAMPLE).unwrap();
        assert_eq!(cfg.tracking.max_distance, 80.0);
        assert_eq!(cfg.tracking.max_missed, 5);
        assert_eq!(cfg.tracking.max_tracking_time, 300);
        assert_eq!(cfg.zones.min_frames_to_enter_zone, 3);
        assert_eq!(cfg.zones.zones.names().collect::<Vec<_>>(), vec!["Rua 1", "Rua 2", "Rua 3", "Rua 4"]);
        assert_eq!(cfg.classes_to_count().len(), 4);
        assert_eq!(cfg.detector.min_score, 0.5);
        assert_eq!(cfg.output.progress_every, 100);

        let pc = cfg.pipeline_config();
        assert_eq!(pc.tracker.max_distance, 80.0);
        assert_eq!(pc.zones.zones.get("Rua 3").map(|z| z.polygon[0]), Some(Point::new(1300, 960)));
    }

    #[test]
    fn optional_sections_default() {
        let cfg = parse_config(
            r#"
            [tracking]
            max_distance = 50.0
            max_missed = 2
            max_tracking_time = 100

            [zones]
            min_frames_to_enter_zone = 1
            [[zones.zone]]
            name = "A"
            polygon = [[0, 0], [10, 0], [10, 10]]

            [classes]
            to_count = ["car", "car"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.detector.min_score, 0.5);
        assert_eq!(cfg.output.results_root, ".");
        assert_eq!(cfg.output.progress_every, 100);
        assert_eq!(cfg.classes_to_count().len(), 1);
    }

    #[test]
    fn validate_rejects_bad_driver_settings() {
        assert!(parse_config(EXAMPLE).unwrap().validate().is_ok());

        let mut cfg = parse_config(EXAMPLE).unwrap();
        cfg.detector.min_score = 5.0;
        assert!(cfg.validate().is_err());
        cfg.detector.min_score = -0.1;
        assert!(cfg.validate().is_err());
        cfg.detector.min_score = f32::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = parse_config(EXAMPLE).unwrap();
        cfg.output.progress_every = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = parse_config(EXAMPLE).unwrap();
        cfg.output.results_root = " ".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_section_is_an_error() {
        assert!(parse_config("[tracking]\nmax_distance = 1.0\n").is_err());
    }
}
