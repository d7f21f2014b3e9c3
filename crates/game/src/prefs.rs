//! Small persisted player state: first-run flag and the scope selector.

use std::path::Path;

use catalog::SubZoneId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Seed import has run.
    #[serde(default)]
    pub initialized: bool,
    /// Sub-zone last opened in the catalog browser.
    #[serde(default)]
    pub last_sub_zone_id: Option<SubZoneId>,
}

impl Preferences {
    /// Missing or unreadable file gives defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(data) => ron::from_str(&data).unwrap_or_else(|e| {
                log::warn!("Invalid preferences at {:?}: {}, using defaults", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let s = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("prefs-{}.ron", std::process::id()));
        let prefs = Preferences { initialized: true, last_sub_zone_id: Some(7) };
        prefs.save(&path).unwrap();
        assert_eq!(Preferences::load(&path), prefs);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_first_run() {
        let prefs = Preferences::load(Path::new("/nonexistent/prefs.ron"));
        assert!(!prefs.initialized);
        assert!(prefs.last_sub_zone_id.is_none());
    }
}
