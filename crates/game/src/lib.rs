//! Treasure hunt session logic: which treasure to offer, where to place it,
//! and the spawn/collection lifecycle around it.

pub mod bootstrap;
pub mod browse;
pub mod config;
pub mod notice;
pub mod placement;
pub mod prefs;
pub mod scene;
pub mod selection;
pub mod session;

#[cfg(test)]
mod testing;

pub use bootstrap::ensure_seeded;
pub use browse::{CatalogBrowser, CatalogRow, TreasureList};
pub use config::{GameConfig, PlacementConfig, SessionConfig};
pub use notice::{LogNotifier, Notice, NoticeLength, Notifier, RevealCard};
pub use placement::{PlacementEngine, PlacementError};
pub use prefs::Preferences;
pub use scene::{Scene, SceneHandle, WorldScene};
pub use selection::{LaunchError, ScopeFallback, Selection, SelectionMiss, SelectionPolicy};
pub use session::{
    AbortReason, PhaseKind, Session, SessionContext, SessionError, SessionOutcome, SpawnAttempt,
    SpawnRecord,
};
