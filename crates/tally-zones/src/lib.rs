pub mod doctor;
pub mod geometry;
pub mod transition;
mod zone;

pub use transition::update_zone;
pub use zone::{Zone, ZoneConfig, ZoneSet};
