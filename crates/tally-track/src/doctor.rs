use anyhow::Result;
use crate::tracker::TrackerConfig;

pub fn check_thresholds(cfg: &TrackerConfig) -> Result<()> {
    anyhow::ensure!(cfg.max_distance.is_finite() && cfg.max_distance > 0.0, "tracking.max_distance must be a positive number");
    anyhow::ensure!(cfg.max_tracking_time >= 1, "tracking.max_tracking_time must be >= 1");
    Ok(())
}
