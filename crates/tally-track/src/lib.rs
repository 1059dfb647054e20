pub mod doctor;
pub mod object;
pub mod tracker;

pub use object::TrackedObject;
pub use tracker::{Tracker, TrackerConfig};
