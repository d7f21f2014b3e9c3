use std::path::PathBuf;

use thiserror::Error;

use crate::model::{SubZoneId, ZoneId};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot {path:?} is unreadable: {message}")]
    Snapshot { path: PathBuf, message: String },

    #[error("seed document is invalid: {0}")]
    Seed(#[from] serde_json::Error),

    #[error("sub-zone {sub_zone_id} references missing zone {zone_id}")]
    MissingZone { sub_zone_id: SubZoneId, zone_id: ZoneId },

    #[error("treasure {treasure_id} references missing sub-zone {sub_zone_id}")]
    MissingSubZone { treasure_id: u32, sub_zone_id: SubZoneId },
}

pub type Result<T> = std::result::Result<T, CatalogError>;
