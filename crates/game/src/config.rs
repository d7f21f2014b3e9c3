//! Game configuration (session timing, placement, model, data files). Loaded from config.ron at startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use engine_core::ModelInstance;
use serde::{Deserialize, Serialize};

use crate::selection::ScopeFallback;

/// Session lifecycle timing and policy knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Delay after session start before selecting, to let the scene settle.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Readiness gate poll interval.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Give up on tracking after this long. `None` waits until cancelled.
    #[serde(default)]
    pub tracking_timeout_ms: Option<u64>,
    /// Time between the collection write and the reveal card (open animation).
    #[serde(default = "default_reveal_delay_ms")]
    pub reveal_delay_ms: u64,
    /// How long a terminal notice stays up before the host is asked to close.
    #[serde(default = "default_terminal_notice_ms")]
    pub terminal_notice_ms: u64,
    /// First backoff after a failed collection write; doubles up to `write_retry_max_ms`.
    #[serde(default = "default_write_retry_ms")]
    pub write_retry_ms: u64,
    #[serde(default = "default_write_retry_max_ms")]
    pub write_retry_max_ms: u64,
    /// What scoped selection does when its sub-zone has nothing left.
    #[serde(default)]
    pub scope_fallback: ScopeFallback,
    /// Ask the host to close once the player acknowledges the reveal.
    #[serde(default = "default_true")]
    pub close_host_on_done: bool,
}

fn default_settle_delay_ms() -> u64 {
    3000
}
fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_reveal_delay_ms() -> u64 {
    1000
}
fn default_terminal_notice_ms() -> u64 {
    2000
}
fn default_write_retry_ms() -> u64 {
    250
}
fn default_write_retry_max_ms() -> u64 {
    8000
}
fn default_true() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            tracking_timeout_ms: None,
            reveal_delay_ms: default_reveal_delay_ms(),
            terminal_notice_ms: default_terminal_notice_ms(),
            write_retry_ms: default_write_retry_ms(),
            write_retry_max_ms: default_write_retry_max_ms(),
            scope_fallback: ScopeFallback::default(),
            close_host_on_done: default_true(),
        }
    }
}

impl SessionConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn tracking_timeout(&self) -> Option<Duration> {
        self.tracking_timeout_ms.map(Duration::from_millis)
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    pub fn terminal_notice(&self) -> Duration {
        Duration::from_millis(self.terminal_notice_ms)
    }

    /// Backoff before retry number `attempt` (1-based).
    pub fn write_backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let ms = self.write_retry_ms.saturating_mul(1u64 << shift);
        Duration::from_millis(ms.min(self.write_retry_max_ms.max(self.write_retry_ms)))
    }

    /// No settle, reveal or terminal delays.
    pub fn immediate() -> Self {
        Self {
            settle_delay_ms: 0,
            reveal_delay_ms: 0,
            terminal_notice_ms: 0,
            ..Self::default()
        }
    }
}

/// Local offset of the collectible from the viewer, in metres.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Centre of the lateral draw.
    #[serde(default)]
    pub offset_x: f32,
    /// Below the viewer.
    #[serde(default = "default_offset_y")]
    pub offset_y: f32,
    /// In front of the viewer (negative Z is forward).
    #[serde(default = "default_offset_z")]
    pub offset_z: f32,
    /// `dx` is drawn from `[offset_x - jitter, offset_x + jitter)`.
    #[serde(default = "default_lateral_jitter")]
    pub lateral_jitter: f32,
}

fn default_offset_y() -> f32 {
    -0.5
}
fn default_offset_z() -> f32 {
    -0.8
}
fn default_lateral_jitter() -> f32 {
    0.3
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: default_offset_y(),
            offset_z: default_offset_z(),
            lateral_jitter: default_lateral_jitter(),
        }
    }
}

/// Where the catalog snapshot, preferences and seed document live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_catalog_path")]
    pub catalog: PathBuf,
    #[serde(default = "default_preferences_path")]
    pub preferences: PathBuf,
    /// Seed document; the bundled one is used when unset.
    #[serde(default)]
    pub seed: Option<PathBuf>,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("treasure.ron")
}
fn default_preferences_path() -> PathBuf {
    PathBuf::from("prefs.ron")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            catalog: default_catalog_path(),
            preferences: default_preferences_path(),
            seed: None,
        }
    }
}

/// Persistent game settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub placement: PlacementConfig,
    /// Model spawned for every treasure.
    #[serde(default)]
    pub model: ModelInstance,
    #[serde(default)]
    pub data: DataConfig,
}

impl GameConfig {
    /// `config.ron` in the current directory.
    pub fn path() -> PathBuf {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("config.ron")
    }

    /// Load config from `config.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    pub fn load_from(path: &Path) -> Self {
        if let Ok(data) = std::fs::read_to_string(path) {
            match ron::from_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    /// Save current config to `config.ron`. Logs on error.
    pub fn save(&self) {
        self.save_to(&Self::path());
    }

    pub fn save_to(&self, path: &Path) {
        match ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            Ok(s) => {
                if let Err(e) = std::fs::write(path, s) {
                    log::warn!("Could not write config to {:?}: {}", path, e);
                }
            }
            Err(e) => log::warn!("Could not serialize config: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: GameConfig = ron::from_str("(session: (tracking_timeout_ms: Some(30000)))").unwrap();
        assert_eq!(cfg.session.tracking_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(cfg.session.poll_interval(), Duration::from_secs(1));
        assert_eq!(cfg.session.scope_fallback, ScopeFallback::Abort);
        assert_eq!(cfg.placement.offset_z, -0.8);
        assert_eq!(cfg.model.model_ref, "treasure_chest.glb");
    }

    #[test]
    fn default_has_no_tracking_timeout() {
        assert!(GameConfig::default().session.tracking_timeout().is_none());
    }

    #[test]
    fn config_round_trips_through_ron() {
        let mut cfg = GameConfig::default();
        cfg.session.scope_fallback = ScopeFallback::Global;
        let text = ron::ser::to_string_pretty(&cfg, ron::ser::PrettyConfig::default()).unwrap();
        let back: GameConfig = ron::from_str(&text).unwrap();
        assert_eq!(back.session.scope_fallback, ScopeFallback::Global);
        assert_eq!(back.data.catalog, PathBuf::from("treasure.ron"));
    }

    #[test]
    fn write_backoff_doubles_and_caps() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.write_backoff(1), Duration::from_millis(250));
        assert_eq!(cfg.write_backoff(2), Duration::from_millis(500));
        assert_eq!(cfg.write_backoff(4), Duration::from_millis(2000));
        assert_eq!(cfg.write_backoff(40), Duration::from_millis(8000));
    }

    #[test]
    fn saved_file_loads_back() {
        let path = std::env::temp_dir().join(format!("game-config-saved-{}.ron", std::process::id()));
        let mut cfg = GameConfig::default();
        cfg.session.tracking_timeout_ms = Some(45_000);
        cfg.data.catalog = PathBuf::from("hunt.ron");
        cfg.save_to(&path);

        let back = GameConfig::load_from(&path);
        assert_eq!(back.session.tracking_timeout(), Some(Duration::from_secs(45)));
        assert_eq!(back.data.catalog, PathBuf::from("hunt.ron"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn default_path_is_config_ron() {
        assert!(GameConfig::path().ends_with("config.ron"));
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!("game-config-{}.ron", std::process::id()));
        std::fs::write(&path, "(session: oops").unwrap();
        let cfg = GameConfig::load_from(&path);
        assert_eq!(cfg.session.settle_delay_ms, 3000);
        let _ = std::fs::remove_file(&path);
    }
}
