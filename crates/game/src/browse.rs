//! Catalog browser: zone sections with per-sub-zone progress, and the
//! treasure list behind each sub-zone.
//!
//! Progress is recomputed from the store every time the view becomes
//! visible, so a collection made in a hunt shows up on return.

use std::path::PathBuf;
use std::sync::Arc;

use catalog::{CatalogStore, ProgressReport, SubZoneId, Tally, Treasure};

use crate::prefs::Preferences;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogRow {
    /// Section start for one zone.
    Header { code: String },
    SubZone {
        id: SubZoneId,
        title: String,
        image_ref: Option<String>,
        tally: Tally,
    },
}

impl CatalogRow {
    /// Progress column text, `None` for headers.
    pub fn progress_label(&self) -> Option<String> {
        match self {
            CatalogRow::Header { .. } => None,
            CatalogRow::SubZone { tally, .. } => Some(tally.to_string()),
        }
    }
}

/// One sub-zone's treasures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreasureList {
    pub title: String,
    pub tally: Tally,
    pub treasures: Vec<Treasure>,
}

pub struct CatalogBrowser {
    store: Arc<dyn CatalogStore>,
    prefs: Preferences,
    prefs_path: Option<PathBuf>,
    report: ProgressReport,
    rows: Vec<CatalogRow>,
}

impl CatalogBrowser {
    pub fn new(store: Arc<dyn CatalogStore>, prefs: Preferences, prefs_path: Option<PathBuf>) -> Self {
        let mut browser = Self {
            store,
            prefs,
            prefs_path,
            report: ProgressReport { zones: Vec::new(), global: Tally::default() },
            rows: Vec::new(),
        };
        browser.on_visible();
        browser
    }

    /// Re-read every count from the store.
    pub fn on_visible(&mut self) {
        self.report = ProgressReport::compute(self.store.as_ref());
        self.rows = self
            .report
            .zones
            .iter()
            .flat_map(|z| {
                std::iter::once(CatalogRow::Header { code: z.zone.code.clone() }).chain(z.sub_zones.iter().map(|s| {
                    CatalogRow::SubZone {
                        id: s.sub_zone.id,
                        title: s.sub_zone.name.clone(),
                        image_ref: s.sub_zone.image_ref.clone(),
                        tally: s.tally,
                    }
                }))
            })
            .collect();
        if !self.report.is_consistent() {
            log::warn!(
                "Progress drifted: sub-zones sum to {}, store reports {}",
                self.report.summed(),
                self.report.global
            );
        }
    }

    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    pub fn report(&self) -> &ProgressReport {
        &self.report
    }

    /// Row index of the zone's header, for tab jumps.
    pub fn section_index(&self, code: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| matches!(r, CatalogRow::Header { code: c } if c == code))
    }

    pub fn total_progress(&self) -> Tally {
        self.report.global
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    /// Open a sub-zone's list and make it the hunt scope.
    pub fn open_sub_zone(&mut self, id: SubZoneId) -> Option<TreasureList> {
        let (code, progress) = self
            .report
            .zones
            .iter()
            .find_map(|z| z.sub_zones.iter().find(|s| s.sub_zone.id == id).map(|s| (&z.zone.code, s)))?;
        let list = TreasureList {
            title: format!("{} > {}", code, progress.sub_zone.name),
            tally: Tally::new(self.store.count_collected(id), self.store.count_treasures(id)),
            treasures: self.store.list_treasures(id),
        };

        self.prefs.last_sub_zone_id = Some(id);
        if let Some(path) = &self.prefs_path {
            if let Err(e) = self.prefs.save(path) {
                log::warn!("Could not save scope selection to {:?}: {}", path, e);
            }
        }
        Some(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{MemoryCatalog, SubZone, Zone};

    fn store() -> Arc<MemoryCatalog> {
        let c = MemoryCatalog::new();
        c.insert_zone(Zone::new(1, "W15", "Engineering Hall"));
        c.insert_zone(Zone::new(2, "N4", "Library"));
        c.insert_sub_zone(SubZone::new(7, 1, "Lab").with_image("lab.png")).unwrap();
        c.insert_sub_zone(SubZone::new(8, 2, "Stacks")).unwrap();
        c.insert_treasure(Treasure::new(1, 7, "Brass Compass")).unwrap();
        c.insert_treasure(Treasure::new(2, 7, "Old Key").collected(true)).unwrap();
        c.insert_treasure(Treasure::new(3, 8, "Silver Spoon")).unwrap();
        Arc::new(c)
    }

    #[test]
    fn rows_are_sectioned_by_zone() {
        let browser = CatalogBrowser::new(store(), Preferences::default(), None);
        let rows = browser.rows();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], CatalogRow::Header { code: "W15".into() });
        assert_eq!(rows[1].progress_label().as_deref(), Some("1 / 2"));
        assert_eq!(browser.section_index("N4"), Some(2));
        assert_eq!(browser.section_index("X1"), None);
        assert_eq!(browser.total_progress(), Tally::new(1, 3));
    }

    #[test]
    fn on_visible_picks_up_collections() {
        let store = store();
        let mut browser = CatalogBrowser::new(store.clone(), Preferences::default(), None);
        store.mark_collected(1).unwrap();
        assert_eq!(browser.total_progress(), Tally::new(1, 3));
        browser.on_visible();
        assert_eq!(browser.total_progress(), Tally::new(2, 3));
        assert_eq!(browser.rows()[1].progress_label().as_deref(), Some("2 / 2"));
    }

    #[test]
    fn opening_a_sub_zone_sets_the_scope() {
        let path = std::env::temp_dir().join(format!("browse-prefs-{}.ron", std::process::id()));
        let mut browser = CatalogBrowser::new(store(), Preferences::default(), Some(path.clone()));
        let list = browser.open_sub_zone(7).unwrap();
        assert_eq!(list.title, "W15 > Lab");
        assert_eq!(list.tally, Tally::new(1, 2));
        assert_eq!(list.treasures.len(), 2);
        assert_eq!(browser.preferences().last_sub_zone_id, Some(7));
        assert_eq!(Preferences::load(&path).last_sub_zone_id, Some(7));
        let _ = std::fs::remove_file(&path);

        assert!(browser.open_sub_zone(99).is_none());
        assert_eq!(browser.preferences().last_sub_zone_id, Some(7));
    }
}
