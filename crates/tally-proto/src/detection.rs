use serde::{Deserialize, Serialize};

/// Integer pixel position. Centroids and zone vertices live on this grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i64; 2]", into = "[i64; 2]")]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        dx.hypot(dy)
    }
}

impl From<[i64; 2]> for Point {
    fn from([x, y]: [i64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [i64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Detector box in corner format (x1, y1, x2, y2), image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Corners are truncated to integers first, then halved with floor division.
    /// Out-of-range corners saturate instead of overflowing.
    pub fn centroid(&self) -> Point {
        Point {
            x: midpoint(self.x1 as i64, self.x2 as i64),
            y: midpoint(self.y1 as i64, self.y2 as i64),
        }
    }
}

fn midpoint(a: i64, b: i64) -> i64 {
    // the halved i128 sum always fits back into i64
    (a as i128 + b as i128).div_euclid(2) as i64
}

impl From<[f64; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [f64; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// What the tracker consumes: a box and a class label, already filtered.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub label: String,
}

impl Detection {
    pub fn new(bbox: BoundingBox, label: impl Into<String>) -> Self {
        Self { bbox, label: label.into() }
    }
}

/// One detection as written by the detector stage, before boundary filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub bbox: BoundingBox,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl DetectionRecord {
    /// Missing scores are treated as certain.
    pub fn score(&self) -> f32 {
        self.score.unwrap_or(1.0)
    }

    pub fn into_detection(self) -> Detection {
        Detection { bbox: self.bbox, label: self.label }
    }
}

/// One line of a detections file: every detection of a single frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<u64>,
    #[serde(default)]
    pub detections: Vec<DetectionRecord>,
}
