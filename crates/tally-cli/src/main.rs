use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::Path;
use tokio::io::AsyncBufRead;
use tokio::sync::mpsc;
use tracing::{info, warn};

use tally_count::{doctor as count_doctor, FramePipeline};
use tally_proto::{CountSnapshot, Point};
use tally_track::doctor as track_doctor;
use tally_zones::doctor as zones_doctor;

mod config;
mod progress;
mod results;
mod source;

use config::{load_config, Config};
use source::{BoundaryFilter, DetectionSource};

#[derive(Debug, Parser)]
#[command(name = "tally", version, about = "Vehicle route and class counter over zone polygons")]
struct Cli {
    #[arg(long)]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate the configuration.
    Doctor,
    Zones { #[command(subcommand)] cmd: ZonesCmd },
    /// Count routes over a detections file (one JSON line per frame).
    Run {
        #[arg(long)]
        detections: String,
        /// Enables percentage and ETA in progress lines.
        #[arg(long)]
        total_frames: Option<u64>,
        /// Overrides output.results_root.
        #[arg(long)]
        results_root: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ZonesCmd {
    List,
    /// Print the zone owning a pixel, if any.
    Probe {
        #[arg(long, allow_negative_numbers = true)]
        x: i64,
        #[arg(long, allow_negative_numbers = true)]
        y: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.cmd {
        Command::Doctor => doctor(&cfg)?,
        Command::Zones { cmd } => zones_cmd(&cfg, cmd),
        Command::Run { detections, total_frames, results_root } => {
            run(&cfg, &detections, total_frames, results_root).await?
        }
    }
    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");

    let pc = cfg.pipeline_config();
    track_doctor::check_thresholds(&pc.tracker)?;
    zones_doctor::check_zones(&pc.zones)?;
    count_doctor::check_classes(&pc.classes_to_count)?;

    cfg.validate()?;
    if cfg.classes.to_count.len() != pc.classes_to_count.len() {
        warn!("classes.to_count lists a class more than once");
    }

    info!(zones = pc.zones.zones.len(), classes = pc.classes_to_count.len(), "doctor: OK");
    Ok(())
}

fn zones_cmd(cfg: &Config, cmd: ZonesCmd) {
    match cmd {
        ZonesCmd::List => {
            println!("min_frames_to_enter_zone={}", cfg.zones.min_frames_to_enter_zone);
            for z in cfg.zones.zones.iter() {
                let pts: Vec<String> = z.polygon.iter().map(|p| format!("({},{})", p.x, p.y)).collect();
                println!("{} vertices={} {}", z.name, z.polygon.len(), pts.join(" "));
            }
        }
        ZonesCmd::Probe { x, y } => match cfg.zones.zones.locate(Point::new(x, y)) {
            Some(z) => println!("({},{}) -> {}", x, y, z.name),
            None => println!("({},{}) -> none", x, y),
        },
    }
}

async fn run(cfg: &Config, detections: &str, total_frames: Option<u64>, results_root: Option<String>) -> Result<()> {
    info!(detections, "run: starting");
    cfg.validate()?;

    let src = DetectionSource::open(detections).await?;
    let root = results_root.unwrap_or_else(|| cfg.output.results_root.clone());
    count_source(cfg, src, total_frames, Path::new(&root)).await
}

/// Runs the pipeline over `src` and saves the results under `root`, whatever
/// stopped the loop. The loop's own error wins over a failed save.
async fn count_source<R: AsyncBufRead + Unpin>(
    cfg: &Config,
    mut src: DetectionSource<R>,
    total_frames: Option<u64>,
    root: &Path,
) -> Result<()> {
    let mut pipeline = FramePipeline::new(cfg.pipeline_config())?;
    let filter = BoundaryFilter::new(cfg.classes_to_count(), cfg.detector.min_score);

    let (tx, reporter) = progress::spawn_reporter(total_frames);
    let every = cfg.output.progress_every.max(1);

    let outcome = drive(&mut pipeline, &mut src, &filter, &tx, every).await;
    if let Err(e) = &outcome {
        warn!("run stopped at frame {}: {:#}", pipeline.last_frame(), e);
    }

    let snap = pipeline.snapshot();
    if tx.send(snap.clone()).await.is_err() {
        warn!("progress reporter gone");
    }
    drop(tx);
    if let Err(e) = reporter.await {
        warn!("progress reporter failed: {}", e);
    }

    results::log_summary(&snap);
    let saved = results::write_results(root, &snap, time::OffsetDateTime::now_utc()).await;

    match (outcome, saved) {
        (Err(e), Err(save_err)) => {
            warn!("results not saved: {:#}", save_err);
            Err(e)
        }
        (Err(e), Ok(_)) => Err(e),
        (Ok(()), saved) => saved.map(|_| ()),
    }
}

/// Feeds frames until the input ends or Ctrl-C arrives.
async fn drive<R: AsyncBufRead + Unpin>(
    pipeline: &mut FramePipeline,
    src: &mut DetectionSource<R>,
    filter: &BoundaryFilter,
    tx: &mpsc::Sender<CountSnapshot>,
    every: u64,
) -> Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut dropped_total = 0usize;

    loop {
        let next = tokio::select! {
            r = src.next_frame() => r?,
            _ = &mut ctrl_c => {
                warn!(frame = pipeline.last_frame(), "interrupted, stopping early");
                return Ok(());
            }
        };
        let Some((frame, recs)) = next else { break };

        let (dets, dropped) = filter.apply(recs);
        dropped_total += dropped;

        let summary = pipeline.process_frame(frame, &dets)?;
        for id in &summary.newly_counted {
            info!(id, frame, "vehicle counted");
        }

        if frame % every == 0 && tx.send(pipeline.snapshot()).await.is_err() {
            warn!("progress reporter gone");
        }
    }

    if dropped_total > 0 {
        warn!(dropped = dropped_total, "detections dropped by score or class filter");
    }
    info!(frames = pipeline.last_frame(), "run: input exhausted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    const CONFIG: &str = r#"
        [tracking]
        max_distance = 80.0
        max_missed = 5
        max_tracking_time = 300

        [zones]
        min_frames_to_enter_zone = 3
        [[zones.zone]]
        name = "West"
        polygon = [[0, 0], [100, 0], [100, 100], [0, 100]]
        [[zones.zone]]
        name = "East"
        polygon = [[200, 0], [300, 0], [300, 100], [200, 100]]

        [classes]
        to_count = ["car", "bus"]

        [output]
        progress_every = 2
    "#;

    /// A car crossing West -> East over seven frames, one JSON line each.
    fn crossing() -> String {
        [80, 80, 80, 150, 220, 220, 220]
            .iter()
            .map(|x| format!("{{\"detections\": [{{\"bbox\": [{}, 35, {}, 65], \"label\": \"car\"}}]}}\n", x - 20, x + 20))
            .collect()
    }

    fn temp_root(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tally-run-{}-{}", tag, std::process::id()))
    }

    async fn saved_routes(root: &Path) -> BTreeMap<String, u64> {
        let mut dirs = tokio::fs::read_dir(root).await.unwrap();
        let dir = dirs.next_entry().await.unwrap().expect("no results dir written").path();
        let raw = tokio::fs::read(dir.join(results::OD_FILE)).await.unwrap();
        serde_json::from_slice(&raw).unwrap()
    }

    #[tokio::test]
    async fn drive_stops_on_bad_line_with_counts_intact() {
        let cfg = config::parse_config(CONFIG).unwrap();
        let mut pipeline = FramePipeline::new(cfg.pipeline_config()).unwrap();
        let filter = BoundaryFilter::new(cfg.classes_to_count(), cfg.detector.min_score);
        let input = format!("{}not json\n", crossing());
        let mut src = DetectionSource::from_reader(input.as_bytes(), "mem");
        let (tx, mut rx) = mpsc::channel(16);

        let err = drive(&mut pipeline, &mut src, &filter, &tx, 2).await.unwrap_err();
        assert!(format!("{:#}", err).contains("mem:8"));

        let snap = pipeline.snapshot();
        assert_eq!(snap.frame, 7);
        assert_eq!(snap.routes.get("West->East"), Some(&1));
        assert_eq!(snap.classes.get("car"), Some(&1));

        drop(tx);
        let mut reported = Vec::new();
        while let Some(s) = rx.recv().await {
            reported.push(s.frame);
        }
        assert_eq!(reported, vec![2, 4, 6]);
    }

    #[tokio::test]
    async fn results_saved_when_input_is_exhausted() {
        let cfg = config::parse_config(CONFIG).unwrap();
        let root = temp_root("ok");
        let input = crossing();
        let src = DetectionSource::from_reader(input.as_bytes(), "mem");

        count_source(&cfg, src, Some(7), &root).await.unwrap();
        assert_eq!(saved_routes(&root).await.get("West->East"), Some(&1));
        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn results_saved_when_input_is_bad() {
        let cfg = config::parse_config(CONFIG).unwrap();
        let root = temp_root("bad");
        let input = format!("{}{{\"frame\": 3}}\n", crossing());
        let src = DetectionSource::from_reader(input.as_bytes(), "mem");

        let err = count_source(&cfg, src, None, &root).await.unwrap_err();
        assert!(format!("{:#}", err).contains("frame 3"));
        assert_eq!(saved_routes(&root).await.get("West->East"), Some(&1));
        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
