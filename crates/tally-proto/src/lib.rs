pub mod detection;
pub mod report;

pub use detection::{BoundingBox, Detection, DetectionRecord, FrameRecord, Point};
pub use report::CountSnapshot;
