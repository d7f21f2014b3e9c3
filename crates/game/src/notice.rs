//! User-facing notices and the UI collaborator that shows them.

use catalog::Treasure;

/// Shown when a treasure has no image of its own.
pub const FALLBACK_IMAGE: &str = "treasure_placeholder.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLength {
    Short,
    Long,
}

/// What the player sees after collecting: name, id line and picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealCard {
    pub name: String,
    pub id_label: String,
    pub image_ref: String,
}

impl RevealCard {
    pub fn new(treasure: &Treasure) -> Self {
        Self {
            name: treasure.name.clone(),
            id_label: format!("ID: {}", treasure.id),
            image_ref: treasure
                .image_ref
                .clone()
                .unwrap_or_else(|| FALLBACK_IMAGE.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// One per not-ready gate poll.
    StillAcquiring,
    TreasureSpotted,
    NothingLeft,
    NotFound { name: String },
    ScopeExhausted { sub_zone_id: u32 },
    TrackingTimedOut,
    Revealed(RevealCard),
    /// The host should close the hunt screen.
    CloseHost,
    /// Hunt launched before any sub-zone was chosen.
    ChooseScopeFirst,
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::StillAcquiring => "Move phone slowly to find a surface...".to_string(),
            Notice::TreasureSpotted => "Treasure spotted! Tap it to collect.".to_string(),
            Notice::NothingLeft => "You have found every treasure!".to_string(),
            Notice::NotFound { name } => format!("Treasure \"{}\" not found", name),
            Notice::ScopeExhausted { .. } => "Everything in this area has been found!".to_string(),
            Notice::TrackingTimedOut => "Could not find a surface. Try again later.".to_string(),
            Notice::Revealed(card) => format!("You found {} ({})", card.name, card.id_label),
            Notice::CloseHost => "Closing".to_string(),
            Notice::ChooseScopeFirst => "Pick an area in the catalog first".to_string(),
        }
    }

    pub fn length(&self) -> NoticeLength {
        match self {
            Notice::StillAcquiring | Notice::TreasureSpotted | Notice::CloseHost => NoticeLength::Short,
            _ => NoticeLength::Long,
        }
    }
}

/// UI collaborator. Calls come from the session task; implementations must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes every notice to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.length() {
            NoticeLength::Short => log::info!("[notice] {}", notice.message()),
            NoticeLength::Long => log::info!("[notice, long] {}", notice.message()),
        }
    }
}
