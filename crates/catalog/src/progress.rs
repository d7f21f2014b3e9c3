//! Collected/total aggregates for presentation.
//!
//! Always computed straight from the store; callers recompute whenever their
//! view becomes visible again instead of holding on to an old report.

use std::fmt;

use crate::model::{SubZone, Zone};
use crate::store::CatalogStore;

/// `collected / total` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub collected: usize,
    pub total: usize,
}

impl Tally {
    pub fn new(collected: usize, total: usize) -> Self {
        Self { collected, total }
    }

    /// Completion in `[0, 1]`; an empty tally counts as complete.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.collected as f32 / self.total as f32
        }
    }

    pub fn is_complete(&self) -> bool {
        self.collected >= self.total
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.collected, self.total)
    }
}

impl std::ops::Add for Tally {
    type Output = Tally;

    fn add(self, rhs: Tally) -> Tally {
        Tally::new(self.collected + rhs.collected, self.total + rhs.total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubZoneProgress {
    pub sub_zone: SubZone,
    pub tally: Tally,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneProgress {
    pub zone: Zone,
    pub sub_zones: Vec<SubZoneProgress>,
}

impl ZoneProgress {
    pub fn tally(&self) -> Tally {
        self.sub_zones.iter().map(|s| s.tally).fold(Tally::default(), |a, b| a + b)
    }
}

/// Per-zone, per-sub-zone and global progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressReport {
    pub zones: Vec<ZoneProgress>,
    /// Straight from `count_total_*`, not summed.
    pub global: Tally,
}

impl ProgressReport {
    pub fn compute(store: &dyn CatalogStore) -> Self {
        let zones = store
            .list_zones()
            .into_iter()
            .map(|zone| {
                let sub_zones = store
                    .list_sub_zones(zone.id)
                    .into_iter()
                    .map(|sub_zone| {
                        let tally = Tally::new(
                            store.count_collected(sub_zone.id),
                            store.count_treasures(sub_zone.id),
                        );
                        SubZoneProgress { sub_zone, tally }
                    })
                    .collect();
                ZoneProgress { zone, sub_zones }
            })
            .collect();
        let global = Tally::new(store.count_total_collected(), store.count_total_treasures());
        Self { zones, global }
    }

    /// Sum of sub-zone tallies.
    pub fn summed(&self) -> Tally {
        self.zones.iter().map(ZoneProgress::tally).fold(Tally::default(), |a, b| a + b)
    }

    /// Sub-zone sums agree with the global counts.
    pub fn is_consistent(&self) -> bool {
        self.summed() == self.global
    }

    pub fn sub_zone(&self, id: u32) -> Option<&SubZoneProgress> {
        self.zones
            .iter()
            .flat_map(|z| z.sub_zones.iter())
            .find(|s| s.sub_zone.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCatalog;
    use crate::model::Treasure;

    fn catalog() -> MemoryCatalog {
        let c = MemoryCatalog::new();
        c.insert_zone(Zone::new(1, "W15", "Engineering Hall"));
        c.insert_zone(Zone::new(2, "N4", "Library"));
        c.insert_sub_zone(SubZone::new(7, 1, "Lab")).unwrap();
        c.insert_sub_zone(SubZone::new(8, 2, "Stacks")).unwrap();
        c.insert_sub_zone(SubZone::new(9, 2, "Reading Room")).unwrap();
        c.insert_treasure(Treasure::new(1, 7, "Brass Compass")).unwrap();
        c.insert_treasure(Treasure::new(2, 7, "Old Key").collected(true)).unwrap();
        c.insert_treasure(Treasure::new(3, 8, "Silver Spoon")).unwrap();
        c
    }

    #[test]
    fn report_matches_store() {
        let c = catalog();
        let report = ProgressReport::compute(&c);
        assert_eq!(report.global, Tally::new(1, 3));
        assert_eq!(report.sub_zone(7).unwrap().tally, Tally::new(1, 2));
        assert_eq!(report.sub_zone(9).unwrap().tally, Tally::new(0, 0));
        assert_eq!(report.zones[1].tally(), Tally::new(0, 1));
        assert!(report.is_consistent());
    }

    #[test]
    fn recompute_sees_new_collections() {
        use crate::store::CatalogStore;
        let c = catalog();
        let before = ProgressReport::compute(&c);
        c.mark_collected(3).unwrap();
        let after = ProgressReport::compute(&c);
        assert_eq!(before.global, Tally::new(1, 3));
        assert_eq!(after.global, Tally::new(2, 3));
        assert!(after.is_consistent());
    }

    #[test]
    fn tally_formatting_and_fraction() {
        assert_eq!(Tally::new(3, 10).to_string(), "3 / 10");
        assert_eq!(Tally::new(0, 0).fraction(), 1.0);
        assert!((Tally::new(1, 4).fraction() - 0.25).abs() < f32::EPSILON);
        assert!(!Tally::new(1, 4).is_complete());
        assert!(Tally::new(4, 4).is_complete());
    }
}
