//! In-memory relational catalog with an optional RON snapshot on disk.
//!
//! Three tables keyed by id, foreign keys checked on insert, cascade on
//! delete. Iteration is always in ascending id order so listings are stable.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};
use crate::model::{SubZone, SubZoneId, Treasure, TreasureId, Zone, ZoneId};
use crate::store::CatalogStore;

#[derive(Debug, Default)]
struct Tables {
    zones: BTreeMap<ZoneId, Zone>,
    sub_zones: BTreeMap<SubZoneId, SubZone>,
    treasures: BTreeMap<TreasureId, Treasure>,
    /// Rows changed since the last successful flush.
    dirty: bool,
}

/// On-disk form: plain row lists in id order.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    zones: Vec<Zone>,
    #[serde(default)]
    sub_zones: Vec<SubZone>,
    #[serde(default)]
    treasures: Vec<Treasure>,
}

impl Tables {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut tables = Tables::default();
        for zone in snapshot.zones {
            tables.zones.insert(zone.id, zone);
        }
        for sub in snapshot.sub_zones {
            if tables.zones.contains_key(&sub.zone_id) {
                tables.sub_zones.insert(sub.id, sub);
            } else {
                log::warn!("Dropping orphaned sub-zone {} (zone {} missing)", sub.id, sub.zone_id);
            }
        }
        for treasure in snapshot.treasures {
            if tables.sub_zones.contains_key(&treasure.sub_zone_id) {
                tables.treasures.insert(treasure.id, treasure);
            } else {
                log::warn!(
                    "Dropping orphaned treasure {} (sub-zone {} missing)",
                    treasure.id,
                    treasure.sub_zone_id
                );
            }
        }
        tables
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            zones: self.zones.values().cloned().collect(),
            sub_zones: self.sub_zones.values().cloned().collect(),
            treasures: self.treasures.values().cloned().collect(),
        }
    }

    fn remove_sub_zone(&mut self, id: SubZoneId) -> bool {
        if self.sub_zones.remove(&id).is_none() {
            return false;
        }
        self.treasures.retain(|_, t| t.sub_zone_id != id);
        self.dirty = true;
        true
    }

    fn remove_zone(&mut self, id: ZoneId) -> bool {
        if self.zones.remove(&id).is_none() {
            return false;
        }
        let children: Vec<SubZoneId> = self
            .sub_zones
            .values()
            .filter(|s| s.zone_id == id)
            .map(|s| s.id)
            .collect();
        for sub in children {
            self.remove_sub_zone(sub);
        }
        self.dirty = true;
        true
    }
}

/// The catalog store used by the game.
///
/// Constructed once by the host and shared as `Arc<dyn CatalogStore>`.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    tables: RwLock<Tables>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryCatalog {
    /// Empty catalog with no backing file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a catalog backed by `path`. A missing file starts an empty catalog.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let tables = match std::fs::read_to_string(&path) {
            Ok(data) => {
                let snapshot: Snapshot = ron::from_str(&data).map_err(|e| CatalogError::Snapshot {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                let tables = Tables::from_snapshot(snapshot);
                log::info!(
                    "Loaded catalog from {:?}: {} zones, {} sub-zones, {} treasures",
                    path,
                    tables.zones.len(),
                    tables.sub_zones.len(),
                    tables.treasures.len()
                );
                tables
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No catalog at {:?}, starting empty", path);
                Tables::default()
            }
            Err(source) => return Err(CatalogError::Io { path, source }),
        };
        Ok(Self {
            tables: RwLock::new(tables),
            snapshot_path: Some(path),
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// True when no zone rows exist.
    pub fn is_empty(&self) -> bool {
        self.tables.read().zones.is_empty()
    }

    /// Insert or replace a zone. Replacing cascades to the old row's sub-zones.
    pub fn insert_zone(&self, zone: Zone) {
        let mut tables = self.tables.write();
        tables.remove_zone(zone.id);
        tables.zones.insert(zone.id, zone);
        tables.dirty = true;
    }

    /// Insert or replace a sub-zone. Replacing cascades to the old row's treasures.
    pub fn insert_sub_zone(&self, sub_zone: SubZone) -> Result<()> {
        let mut tables = self.tables.write();
        if !tables.zones.contains_key(&sub_zone.zone_id) {
            return Err(CatalogError::MissingZone {
                sub_zone_id: sub_zone.id,
                zone_id: sub_zone.zone_id,
            });
        }
        tables.remove_sub_zone(sub_zone.id);
        tables.sub_zones.insert(sub_zone.id, sub_zone);
        tables.dirty = true;
        Ok(())
    }

    /// Insert or replace a treasure.
    pub fn insert_treasure(&self, treasure: Treasure) -> Result<()> {
        let mut tables = self.tables.write();
        if !tables.sub_zones.contains_key(&treasure.sub_zone_id) {
            return Err(CatalogError::MissingSubZone {
                treasure_id: treasure.id,
                sub_zone_id: treasure.sub_zone_id,
            });
        }
        tables.treasures.insert(treasure.id, treasure);
        tables.dirty = true;
        Ok(())
    }

    /// Delete a zone and, transitively, its sub-zones and treasures.
    pub fn delete_zone(&self, id: ZoneId) -> bool {
        self.tables.write().remove_zone(id)
    }

    /// Delete a sub-zone and its treasures.
    pub fn delete_sub_zone(&self, id: SubZoneId) -> bool {
        self.tables.write().remove_sub_zone(id)
    }

    /// Write pending changes to the snapshot file, if one is configured.
    pub fn flush(&self) -> Result<()> {
        let mut tables = self.tables.write();
        self.flush_locked(&mut tables)
    }

    fn flush_locked(&self, tables: &mut Tables) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            tables.dirty = false;
            return Ok(());
        };
        if !tables.dirty {
            return Ok(());
        }
        let body = ron::ser::to_string_pretty(&tables.to_snapshot(), ron::ser::PrettyConfig::default())
            .map_err(|e| CatalogError::Snapshot {
                path: path.clone(),
                message: e.to_string(),
            })?;
        write_atomically(path, body.as_bytes())?;
        tables.dirty = false;
        log::debug!("Catalog flushed to {:?}", path);
        Ok(())
    }
}

/// Write to `<path>.tmp` then rename over `path`.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes).map_err(|source| CatalogError::Io {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl CatalogStore for MemoryCatalog {
    fn list_zones(&self) -> Vec<Zone> {
        self.tables.read().zones.values().cloned().collect()
    }

    fn list_sub_zones(&self, zone_id: ZoneId) -> Vec<SubZone> {
        self.tables
            .read()
            .sub_zones
            .values()
            .filter(|s| s.zone_id == zone_id)
            .cloned()
            .collect()
    }

    fn list_treasures(&self, sub_zone_id: SubZoneId) -> Vec<Treasure> {
        self.tables
            .read()
            .treasures
            .values()
            .filter(|t| t.sub_zone_id == sub_zone_id)
            .cloned()
            .collect()
    }

    fn treasure(&self, id: TreasureId) -> Option<Treasure> {
        self.tables.read().treasures.get(&id).cloned()
    }

    fn treasure_by_name(&self, name: &str) -> Option<Treasure> {
        self.tables
            .read()
            .treasures
            .values()
            .find(|t| t.name == name)
            .cloned()
    }

    fn uncollected(&self, scope: Option<SubZoneId>) -> Vec<Treasure> {
        self.tables
            .read()
            .treasures
            .values()
            .filter(|t| !t.is_collected && scope.map_or(true, |s| t.sub_zone_id == s))
            .cloned()
            .collect()
    }

    fn count_treasures(&self, sub_zone_id: SubZoneId) -> usize {
        self.tables
            .read()
            .treasures
            .values()
            .filter(|t| t.sub_zone_id == sub_zone_id)
            .count()
    }

    fn count_collected(&self, sub_zone_id: SubZoneId) -> usize {
        self.tables
            .read()
            .treasures
            .values()
            .filter(|t| t.sub_zone_id == sub_zone_id && t.is_collected)
            .count()
    }

    fn count_total_treasures(&self) -> usize {
        self.tables.read().treasures.len()
    }

    fn count_total_collected(&self) -> usize {
        self.tables.read().treasures.values().filter(|t| t.is_collected).count()
    }

    fn mark_collected(&self, id: TreasureId) -> Result<()> {
        let mut tables = self.tables.write();
        match tables.treasures.get_mut(&id) {
            Some(treasure) if !treasure.is_collected => {
                treasure.is_collected = true;
                tables.dirty = true;
                log::info!("Treasure {} marked collected", id);
            }
            Some(_) => {}
            None => log::debug!("mark_collected: no treasure with id {}", id),
        }
        // Also retries a flush that failed on an earlier call.
        self.flush_locked(&mut tables)
    }
}
