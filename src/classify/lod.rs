use serde::{Deserialize, Serialize};

/// Sentinel detail level meaning "no LOD selected". Instances with an empty
/// table report this forever; callers treat it as "no LOD switching".
pub const LOD_NONE: u32 = u32::MAX;

/// One threshold of a LOD table: `level` applies once the viewpoint distance
/// reaches `min_distance`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodEntry {
    pub min_distance: f32,
    pub level: u32,
}

/// Ordered (min distance, level) thresholds, authored by content tooling.
///
/// Entries are assumed sorted by ascending `min_distance`; selection relies
/// on the order and never sorts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LodTable {
    entries: Vec<LodEntry>,
}

impl LodTable {
    pub fn new(entries: Vec<LodEntry>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Convenience constructor from `(min_distance, level)` pairs.
    pub fn from_pairs(pairs: &[(f32, u32)]) -> Self {
        Self {
            entries: pairs
                .iter()
                .map(|&(min_distance, level)| LodEntry {
                    min_distance,
                    level,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Picks the level whose `min_distance` is the tightest lower bound on
    /// `distance`: the largest threshold not exceeding it. No qualifying
    /// entry yields [`LOD_NONE`].
    pub fn select(&self, distance: f32) -> u32 {
        let mut best = LOD_NONE;
        let mut best_min = f32::NEG_INFINITY;
        for entry in &self.entries {
            if entry.min_distance <= distance && entry.min_distance >= best_min {
                best_min = entry.min_distance;
                best = entry.level;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LodTable {
        LodTable::from_pairs(&[(0.0, 0), (10.0, 1), (25.0, 2)])
    }

    #[test]
    fn selection_tracks_distance_thresholds() {
        let t = table();
        assert_eq!(t.select(5.0), 0);
        assert_eq!(t.select(12.0), 1);
        assert_eq!(t.select(30.0), 2);
        assert_eq!(t.select(9.999), 0);
    }

    #[test]
    fn threshold_is_inclusive() {
        let t = table();
        assert_eq!(t.select(10.0), 1);
        assert_eq!(t.select(25.0), 2);
    }

    #[test]
    fn distance_below_every_threshold_is_sentinel() {
        let t = LodTable::from_pairs(&[(5.0, 0), (20.0, 1)]);
        assert_eq!(t.select(1.0), LOD_NONE);
    }

    #[test]
    fn empty_table_always_reports_sentinel() {
        let t = LodTable::empty();
        assert_eq!(t.select(0.0), LOD_NONE);
        assert_eq!(t.select(1000.0), LOD_NONE);
    }
}
