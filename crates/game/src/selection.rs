//! Which treasure a session offers.

use catalog::{CatalogStore, SubZoneId, Treasure};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::notice::Notice;
use crate::prefs::Preferences;

/// What scoped selection does once its sub-zone is fully collected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeFallback {
    /// End the session with a "nothing left here" notice.
    #[default]
    Abort,
    /// Widen to the whole catalog.
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionPolicy {
    ByName(String),
    GlobalRandom,
    ScopedRandom {
        sub_zone_id: SubZoneId,
        fallback: ScopeFallback,
    },
}

/// The treasure a session committed to. A copy; later store writes don't touch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub treasure: Treasure,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionMiss {
    #[error("no treasure named {name:?}")]
    NotFound { name: String },
    #[error("every treasure has been collected")]
    NothingLeft,
    #[error("sub-zone {sub_zone_id} has nothing left to collect")]
    ScopeExhausted { sub_zone_id: SubZoneId },
}

impl SelectionMiss {
    pub fn notice(&self) -> Notice {
        match self {
            SelectionMiss::NotFound { name } => Notice::NotFound { name: name.clone() },
            SelectionMiss::NothingLeft => Notice::NothingLeft,
            SelectionMiss::ScopeExhausted { sub_zone_id } => Notice::ScopeExhausted {
                sub_zone_id: *sub_zone_id,
            },
        }
    }
}

/// The hunt can't be opened at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("no sub-zone chosen yet")]
    NoScopeChosen,
}

impl SelectionPolicy {
    /// Scoped policy from the persisted scope selector.
    pub fn from_preferences(prefs: &Preferences, fallback: ScopeFallback) -> Result<Self, LaunchError> {
        prefs
            .last_sub_zone_id
            .map(|sub_zone_id| SelectionPolicy::ScopedRandom { sub_zone_id, fallback })
            .ok_or(LaunchError::NoScopeChosen)
    }

    pub fn select(&self, store: &dyn CatalogStore, rng: &mut dyn RngCore) -> Result<Selection, SelectionMiss> {
        let treasure = match self {
            SelectionPolicy::ByName(name) => store
                .treasure_by_name(name)
                .ok_or_else(|| SelectionMiss::NotFound { name: name.clone() })?,
            SelectionPolicy::GlobalRandom => store
                .random_uncollected(None, rng)
                .ok_or(SelectionMiss::NothingLeft)?,
            SelectionPolicy::ScopedRandom { sub_zone_id, fallback } => {
                match store.random_uncollected(Some(*sub_zone_id), rng) {
                    Some(t) => t,
                    None => match fallback {
                        ScopeFallback::Abort => {
                            return Err(SelectionMiss::ScopeExhausted {
                                sub_zone_id: *sub_zone_id,
                            })
                        }
                        ScopeFallback::Global => {
                            log::info!("Sub-zone {} exhausted, widening to whole catalog", sub_zone_id);
                            store
                                .random_uncollected(None, rng)
                                .ok_or(SelectionMiss::NothingLeft)?
                        }
                    },
                }
            }
        };
        log::info!("Selected treasure {} ({:?}) via {:?}", treasure.id, treasure.name, self);
        Ok(Selection { treasure })
    }
}
