pub mod doctor;
pub mod pipeline;
pub mod routes;

pub use pipeline::{FramePipeline, FrameSummary, PipelineConfig, PipelineError};
pub use routes::{update_counting, ClassTally, RouteTally, TallyError};
