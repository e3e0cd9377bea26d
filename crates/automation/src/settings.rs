use parking_lot::RwLock;
use queue_pilot_client::models::ChampionId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Champion selection preferences. Zero ids are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub pick: Option<ChampionId>,
    #[serde(default)]
    pub ban: Option<ChampionId>,
}

impl AutomationSettings {
    pub fn new(enabled: bool, pick: Option<ChampionId>, ban: Option<ChampionId>) -> Self {
        Self {
            enabled,
            pick: pick.filter(|id| *id > 0),
            ban: ban.filter(|id| *id > 0),
        }
    }

    pub fn normalized(self) -> Self {
        Self::new(self.enabled, self.pick, self.ban)
    }
}

#[derive(Debug, Default)]
struct SettingsState {
    client_path: Option<PathBuf>,
    auto_accept: bool,
    selection: AutomationSettings,
}

/// Settings shared between the pollers and whoever edits them. Readers
/// always see a whole value, never a half-applied update.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<SettingsState>>,
}

impl SharedSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client_path(&self) -> Option<PathBuf> {
        self.inner.read().client_path.clone()
    }

    /// Returns whether the stored path changed. Quotes and surrounding
    /// whitespace are stripped; an empty path clears the setting.
    pub fn set_client_path(&self, path: Option<PathBuf>) -> bool {
        let path = path.and_then(|p| normalize_path(&p.to_string_lossy()));
        let mut state = self.inner.write();
        if state.client_path == path {
            return false;
        }
        state.client_path = path;
        true
    }

    pub fn auto_accept(&self) -> bool {
        self.inner.read().auto_accept
    }

    pub fn set_auto_accept(&self, enabled: bool) {
        self.inner.write().auto_accept = enabled;
    }

    pub fn selection(&self) -> AutomationSettings {
        self.inner.read().selection.clone()
    }

    pub fn set_selection(&self, selection: AutomationSettings) {
        self.inner.write().selection = selection.normalized();
    }
}

pub fn normalize_path(raw: &str) -> Option<PathBuf> {
    let cleaned = raw.trim().replace('"', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(PathBuf::from(cleaned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_ids_are_unset() {
        let settings = AutomationSettings::new(true, Some(0), Some(157));
        assert_eq!(settings.pick, None);
        assert_eq!(settings.ban, Some(157));
    }

    #[test]
    fn test_client_path_normalization() {
        let settings = SharedSettings::new();
        assert!(settings.set_client_path(Some(PathBuf::from(
            "  \"C:\\Riot Games\\Riot Client\\RiotClientServices.exe\" "
        ))));
        assert_eq!(
            settings.client_path(),
            Some(PathBuf::from("C:\\Riot Games\\Riot Client\\RiotClientServices.exe"))
        );
        assert!(!settings.set_client_path(Some(PathBuf::from(
            "C:\\Riot Games\\Riot Client\\RiotClientServices.exe"
        ))));
        assert!(settings.set_client_path(Some(PathBuf::from("  "))));
        assert_eq!(settings.client_path(), None);
    }

    #[test]
    fn test_clones_share_state() {
        let settings = SharedSettings::new();
        let other = settings.clone();
        other.set_auto_accept(true);
        other.set_selection(AutomationSettings::new(true, Some(103), None));
        assert!(settings.auto_accept());
        assert_eq!(settings.selection().pick, Some(103));
    }
}
