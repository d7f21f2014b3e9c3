//! Seed document import.
//!
//! The bundled document is JSON shaped like
//! `{zones: [{id, code, name, subZones: [{id, name, imageUrl, treasures: [..]}]}]}`
//! and is imported verbatim, once, on first run.

use std::path::Path;

use serde::Deserialize;

use crate::error::{CatalogError, Result};
use crate::memory::MemoryCatalog;
use crate::model::{SubZone, Treasure, Zone};

#[derive(Debug, Clone, Deserialize)]
pub struct SeedDocument {
    pub zones: Vec<SeedZone>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedZone {
    pub id: u32,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub sub_zones: Vec<SeedSubZone>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSubZone {
    pub id: u32,
    pub name: String,
    #[serde(default, alias = "imageUrl")]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub treasures: Vec<SeedTreasure>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedTreasure {
    pub id: u32,
    pub name: String,
    #[serde(default, alias = "imageUrl")]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub is_collected: bool,
}

/// Row counts written by [`SeedDocument::import_into`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub zones: usize,
    pub sub_zones: usize,
    pub treasures: usize,
}

impl SeedDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Insert every row (replace semantics) and flush once at the end.
    pub fn import_into(&self, catalog: &MemoryCatalog) -> Result<SeedSummary> {
        let mut summary = SeedSummary::default();
        for zone in &self.zones {
            catalog.insert_zone(Zone::new(zone.id, zone.code.clone(), zone.name.clone()));
            summary.zones += 1;

            for sub in &zone.sub_zones {
                catalog.insert_sub_zone(SubZone {
                    id: sub.id,
                    zone_id: zone.id,
                    name: sub.name.clone(),
                    image_ref: sub.image_ref.clone(),
                })?;
                summary.sub_zones += 1;

                for t in &sub.treasures {
                    catalog.insert_treasure(Treasure {
                        id: t.id,
                        sub_zone_id: sub.id,
                        name: t.name.clone(),
                        image_ref: t.image_ref.clone(),
                        is_collected: t.is_collected,
                    })?;
                    summary.treasures += 1;
                }
            }
        }
        catalog.flush()?;
        log::info!(
            "Seeded catalog: {} zones, {} sub-zones, {} treasures",
            summary.zones,
            summary.sub_zones,
            summary.treasures
        );
        Ok(summary)
    }
}
