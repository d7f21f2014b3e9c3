//! The catalog store contract.

use rand::seq::SliceRandom;
use rand::RngCore;

use crate::error::Result;
use crate::model::{SubZone, SubZoneId, Treasure, TreasureId, Zone, ZoneId};

/// Read side plus the single collection mutator.
///
/// Readers never fault: a foreign key with no rows behind it yields an empty
/// list or a zero count. Implementations are shared between sessions, so every
/// method takes `&self`.
pub trait CatalogStore: Send + Sync {
    fn list_zones(&self) -> Vec<Zone>;

    fn list_sub_zones(&self, zone_id: ZoneId) -> Vec<SubZone>;

    fn list_treasures(&self, sub_zone_id: SubZoneId) -> Vec<Treasure>;

    fn treasure(&self, id: TreasureId) -> Option<Treasure>;

    /// Exact, case-sensitive name match. The first row by id wins on duplicates.
    fn treasure_by_name(&self, name: &str) -> Option<Treasure>;

    /// Uncollected treasures in id order, optionally limited to one sub-zone.
    fn uncollected(&self, scope: Option<SubZoneId>) -> Vec<Treasure>;

    fn count_treasures(&self, sub_zone_id: SubZoneId) -> usize;

    fn count_collected(&self, sub_zone_id: SubZoneId) -> usize;

    fn count_total_treasures(&self) -> usize;

    fn count_total_collected(&self) -> usize;

    /// Set `is_collected = true`. Idempotent; an unknown id is a no-op.
    fn mark_collected(&self, id: TreasureId) -> Result<()>;

    /// Uniform pick among [`CatalogStore::uncollected`].
    fn random_uncollected(&self, scope: Option<SubZoneId>, rng: &mut dyn RngCore) -> Option<Treasure> {
        self.uncollected(scope).choose(rng).cloned()
    }
}
