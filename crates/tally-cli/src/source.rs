use anyhow::{Context, Result};
use std::collections::BTreeSet;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

use tally_proto::{Detection, DetectionRecord, FrameRecord};

/// Reads one JSON object per line, one line per frame. Line order is the frame
/// order; an explicit `frame` field must agree with it.
pub struct DetectionSource<R> {
    reader: R,
    name: String,
    line_no: u64,
    frame: u64,
}

impl DetectionSource<BufReader<File>> {
    pub async fn open(path: &str) -> Result<Self> {
        let f = File::open(path).await.with_context(|| format!("open detections file {}", path))?;
        Ok(Self::from_reader(BufReader::new(f), path))
    }
}

impl<R: AsyncBufRead + Unpin> DetectionSource<R> {
    pub fn from_reader(reader: R, name: &str) -> Self {
        Self { reader, name: name.to_string(), line_no: 0, frame: 0 }
    }

    /// `None` once the input is exhausted.
    pub async fn next_frame(&mut self) -> Result<Option<(u64, Vec<DetectionRecord>)>> {
        let mut line = String::new();
        loop {
            line.clear();
            let n = self.reader.read_line(&mut line).await.with_context(|| format!("read {}", self.name))?;
            if n == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }

            let rec: FrameRecord = serde_json::from_str(line.trim())
                .with_context(|| format!("{}:{}: bad detection line", self.name, self.line_no))?;
            self.frame += 1;
            if let Some(f) = rec.frame {
                anyhow::ensure!(
                    f == self.frame,
                    "{}:{}: frame {} found where frame {} was expected",
                    self.name,
                    self.line_no,
                    f,
                    self.frame
                );
            }
            return Ok(Some((self.frame, rec.detections)));
        }
    }
}

/// The detector-side contract: only confident detections of counted classes
/// reach the tracker.
#[derive(Debug, Clone)]
pub struct BoundaryFilter {
    classes: BTreeSet<String>,
    min_score: f32,
}

impl BoundaryFilter {
    pub fn new(classes: BTreeSet<String>, min_score: f32) -> Self {
        Self { classes, min_score }
    }

    /// Returns the kept detections and how many were dropped.
    pub fn apply(&self, recs: Vec<DetectionRecord>) -> (Vec<Detection>, usize) {
        let total = recs.len();
        let kept: Vec<Detection> = recs
            .into_iter()
            .filter(|r| r.score() >= self.min_score && self.classes.contains(&r.label))
            .map(DetectionRecord::into_detection)
            .collect();
        let dropped = total - kept.len();
        if dropped > 0 {
            debug!(kept = kept.len(), dropped, "boundary filter");
        }
        (kept, dropped)
    }
}
