use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::OffsetDateTime;
use tokio::fs;
use tracing::info;

use tally_proto::CountSnapshot;

pub const OD_FILE: &str = "od_counter.json";
pub const CLASS_FILE: &str = "class_counter.json";

pub fn results_dir_name(now: OffsetDateTime) -> Result<String> {
    let fmt = format_description!("results_[year][month][day]_[hour][minute][second]");
    now.format(&fmt).context("format results dir name")
}

/// Writes both tallies under a fresh timestamped directory and returns it.
pub async fn write_results(root: &Path, snap: &CountSnapshot, now: OffsetDateTime) -> Result<PathBuf> {
    let dir = root.join(results_dir_name(now)?);
    fs::create_dir_all(&dir).await.with_context(|| format!("create {}", dir.display()))?;

    let od = serde_json::to_vec_pretty(&snap.routes)?;
    fs::write(dir.join(OD_FILE), od).await.with_context(|| format!("write {}", OD_FILE))?;

    let classes = serde_json::to_vec_pretty(&snap.classes)?;
    fs::write(dir.join(CLASS_FILE), classes).await.with_context(|| format!("write {}", CLASS_FILE))?;

    info!(dir = %dir.display(), frame = snap.frame, "results saved");
    Ok(dir)
}

pub fn log_summary(snap: &CountSnapshot) {
    info!(frames = snap.frame, routes = snap.total_routes(), "final counts");
    if snap.routes.is_empty() {
        info!("no routes counted");
    }
    for (route, n) in &snap.routes {
        info!("route {}: {}", route, n);
    }
    for (class, n) in &snap.classes {
        info!("class {}: {}", class, n);
    }
}
