use anyhow::Result;
use std::collections::BTreeSet;

use crate::zone::ZoneConfig;

pub fn check_zones(cfg: &ZoneConfig) -> Result<()> {
    anyhow::ensure!(cfg.min_frames_to_enter_zone >= 1, "zones.min_frames_to_enter_zone must be >= 1");
    anyhow::ensure!(!cfg.zones.is_empty(), "zones: at least one [[zones.zone]] is required");

    let mut seen = BTreeSet::new();
    for z in cfg.zones.iter() {
        anyhow::ensure!(!z.name.trim().is_empty(), "zones: zone name must not be empty");
        anyhow::ensure!(!z.name.contains("->"), "zone {:?}: name must not contain \"->\"", z.name);
        anyhow::ensure!(seen.insert(z.name.as_str()), "zone {:?} defined twice", z.name);
        anyhow::ensure!(z.polygon.len() >= 3, "zone {:?}: polygon must have >= 3 points", z.name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::{Zone, ZoneSet};
    use tally_proto::Point;

    fn tri(name: &str) -> Zone {
        Zone::new(name, vec![Point::new(0, 0), Point::new(10, 0), Point::new(0, 10)])
    }

    fn cfg(zones: Vec<Zone>) -> ZoneConfig {
        ZoneConfig { min_frames_to_enter_zone: 3, zones: ZoneSet::new(zones) }
    }

    #[test]
    fn accepts_valid() {
        assert!(check_zones(&cfg(vec![tri("Rua 1"), tri("Rua 2")])).is_ok());
    }

    #[test]
    fn rejects_bad_zones() {
        assert!(check_zones(&cfg(vec![])).is_err());
        assert!(check_zones(&cfg(vec![tri("A"), tri("A")])).is_err());
        assert!(check_zones(&cfg(vec![tri("A->B")])).is_err());
        assert!(check_zones(&cfg(vec![tri(" ")])).is_err());
        assert!(check_zones(&cfg(vec![Zone::new("L", vec![Point::new(0, 0), Point::new(1, 1)])])).is_err());

        let mut c = cfg(vec![tri("A")]);
        c.min_frames_to_enter_zone = 0;
        assert!(check_zones(&c).is_err());
    }
}
