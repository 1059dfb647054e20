use tally_track::TrackedObject;
use tracing::debug;

use crate::zone::ZoneConfig;

/// Advances the zone state of one object by one frame.
///
/// The dwell counter restarts whenever the centroid is outside every zone or
/// sits in a different zone than on the previous frame. A zone is recorded once
/// the counter reaches `min_frames_to_enter_zone`, unless it was recorded before:
/// an object that leaves a zone and comes back never records it a second time.
///
/// A direct move from one zone into a neighbouring one restarts the count
/// rather than carrying the old zone's frames over into the new one.
pub fn update_zone(obj: &mut TrackedObject, cfg: &ZoneConfig) {
    let Some(zone) = cfg.zones.locate(obj.centroid) else {
        obj.zone_dwell_count = 0;
        obj.current_zone = None;
        return;
    };

    if obj.current_zone.as_deref() != Some(zone.name.as_str()) {
        obj.zone_dwell_count = 0;
        obj.current_zone = Some(zone.name.clone());
    }
    obj.zone_dwell_count += 1;

    if obj.zone_dwell_count >= cfg.min_frames_to_enter_zone
        && !obj.zones_visited.contains(&zone.name)
        && obj.zones_passed.last() != Some(&zone.name)
    {
        obj.zones_passed.push(zone.name.clone());
        obj.zones_visited.insert(zone.name.clone());
        debug!(id = obj.id, zone = %zone.name, visits = obj.zones_passed.len(), "zone entered");
    }
}
