//! Catalog records.

use serde::{Deserialize, Serialize};

pub type ZoneId = u32;
pub type SubZoneId = u32;
pub type TreasureId = u32;

/// A building or area, e.g. code `W15`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub code: String,
    pub name: String,
}

/// A room or section inside a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubZone {
    pub id: SubZoneId,
    pub zone_id: ZoneId,
    pub name: String,
    #[serde(default)]
    pub image_ref: Option<String>,
}

/// The collectible unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasure {
    pub id: TreasureId,
    pub sub_zone_id: SubZoneId,
    pub name: String,
    #[serde(default)]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub is_collected: bool,
}

impl Zone {
    pub fn new(id: ZoneId, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
            name: name.into(),
        }
    }
}

impl SubZone {
    pub fn new(id: SubZoneId, zone_id: ZoneId, name: impl Into<String>) -> Self {
        Self {
            id,
            zone_id,
            name: name.into(),
            image_ref: None,
        }
    }

    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }
}

impl Treasure {
    pub fn new(id: TreasureId, sub_zone_id: SubZoneId, name: impl Into<String>) -> Self {
        Self {
            id,
            sub_zone_id,
            name: name.into(),
            image_ref: None,
            is_collected: false,
        }
    }

    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    pub fn collected(mut self, is_collected: bool) -> Self {
        self.is_collected = is_collected;
        self
    }
}
