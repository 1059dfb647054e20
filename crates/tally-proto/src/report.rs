use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Both tallies as they stood after `frame` finished processing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountSnapshot {
    pub frame: u64,
    pub active_tracks: usize,
    /// "origin->destination" -> vehicles
    pub routes: BTreeMap<String, u64>,
    /// class label -> vehicles, every configured class present
    pub classes: BTreeMap<String, u64>,
}

impl CountSnapshot {
    pub fn total_routes(&self) -> u64 {
        self.routes.values().sum()
    }

    /// Routes by descending count, ties by name.
    pub fn top_routes(&self, n: usize) -> Vec<(&str, u64)> {
        let mut v: Vec<(&str, u64)> = self.routes.iter().map(|(k, c)| (k.as_str(), *c)).collect();
        v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        v.truncate(n);
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_routes_orders_by_count_then_name() {
        let mut s = CountSnapshot::default();
        s.routes.insert("B->A".into(), 2);
        s.routes.insert("A->B".into(), 2);
        s.routes.insert("C->A".into(), 5);
        s.routes.insert("A->C".into(), 1);

        let top = s.top_routes(3);
        assert_eq!(top, vec![("C->A", 5), ("A->B", 2), ("B->A", 2)]);
        assert_eq!(s.total_routes(), 10);
    }
}
