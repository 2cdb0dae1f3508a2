//! User preferences persisted in the key→value store.

mod theme;

pub use theme::Theme;

use std::sync::Arc;

use tracing::info;

use crate::magnet::MagnetValidator;
use crate::speed::ClientSettings;
use crate::storage::{keys, KvStore, KvStoreExt, StorageError};

/// Most recent searches kept.
pub const SEARCH_HISTORY_LIMIT: usize = 10;

/// Typed access to the persisted preferences.
pub struct Preferences {
    store: Arc<dyn KvStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Custom validation patterns, in order. Empty means the default rule.
    pub fn custom_patterns(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .store
            .get_json::<Vec<String>>(keys::CUSTOM_PATTERNS)?
            .unwrap_or_default())
    }

    /// Replace the custom patterns; lines are trimmed and blanks dropped.
    pub fn set_custom_patterns<S: AsRef<str>>(&self, lines: &[S]) -> Result<Vec<String>, StorageError> {
        let patterns: Vec<String> = lines
            .iter()
            .map(|l| l.as_ref().trim())
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        self.store.set_json(keys::CUSTOM_PATTERNS, &patterns)?;
        info!(count = patterns.len(), "Custom magnet patterns saved");
        Ok(patterns)
    }

    /// Validator for the currently active rule.
    pub fn validator(&self) -> Result<MagnetValidator, StorageError> {
        Ok(MagnetValidator::new(&self.custom_patterns()?))
    }

    pub fn client_settings(&self) -> Result<ClientSettings, StorageError> {
        Ok(self
            .store
            .get_json::<ClientSettings>(keys::CLIENT_SETTINGS)?
            .unwrap_or_default())
    }

    pub fn set_client_settings(&self, settings: &ClientSettings) -> Result<(), StorageError> {
        let normalized = settings.normalized();
        self.store.set_json(keys::CLIENT_SETTINGS, &normalized)?;
        info!(kind = normalized.kind.as_str(), "Torrent client settings saved");
        Ok(())
    }

    pub fn theme(&self) -> Result<Theme, StorageError> {
        Ok(self.store.get_json::<Theme>(keys::THEME)?.unwrap_or_default())
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), StorageError> {
        match theme {
            Theme::System => self.store.remove(keys::THEME),
            other => self.store.set_json(keys::THEME, &other),
        }
    }

    /// Advance to the next theme in the cycle and return it.
    pub fn toggle_theme(&self) -> Result<Theme, StorageError> {
        let next = self.theme()?.next();
        self.set_theme(next)?;
        Ok(next)
    }

    /// Recent keywords, most recent first.
    pub fn search_history(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .store
            .get_json::<Vec<String>>(keys::SEARCH_HISTORY)?
            .unwrap_or_default())
    }

    pub fn push_search_history(&self, keyword: &str) -> Result<Vec<String>, StorageError> {
        let history = push_history(self.search_history()?, keyword);
        self.store.set_json(keys::SEARCH_HISTORY, &history)?;
        Ok(history)
    }

    pub fn clear_search_history(&self) -> Result<(), StorageError> {
        self.store.remove(keys::SEARCH_HISTORY)
    }
}

/// Move `keyword` to the front, dropping duplicates and overflow.
fn push_history(mut history: Vec<String>, keyword: &str) -> Vec<String> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return history;
    }
    history.retain(|k| k != keyword);
    history.insert(0, keyword.to_string());
    history.truncate(SEARCH_HISTORY_LIMIT);
    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speed::ClientKind;
    use crate::storage::MemoryKvStore;

    fn prefs() -> Preferences {
        Preferences::new(Arc::new(MemoryKvStore::new()))
    }

    #[test]
    fn test_push_history_dedupes_and_caps() {
        let mut history = Vec::new();
        for i in 0..12 {
            history = push_history(history, &format!("kw{}", i));
        }
        assert_eq!(history.len(), SEARCH_HISTORY_LIMIT);
        assert_eq!(history[0], "kw11");
        assert_eq!(history[9], "kw2");

        let history = push_history(history, "kw5");
        assert_eq!(history[0], "kw5");
        assert_eq!(history.iter().filter(|k| *k == "kw5").count(), 1);
        assert_eq!(history.len(), SEARCH_HISTORY_LIMIT);
    }

    #[test]
    fn test_push_history_ignores_blank() {
        let history = push_history(vec!["a".to_string()], "   ");
        assert_eq!(history, vec!["a".to_string()]);
    }

    #[test]
    fn test_search_history_persisted() {
        let prefs = prefs();
        prefs.push_search_history("ubuntu").unwrap();
        prefs.push_search_history("debian").unwrap();
        prefs.push_search_history("ubuntu").unwrap();
        assert_eq!(prefs.search_history().unwrap(), vec!["ubuntu", "debian"]);

        prefs.clear_search_history().unwrap();
        assert!(prefs.search_history().unwrap().is_empty());
    }

    #[test]
    fn test_custom_patterns_trimmed() {
        let prefs = prefs();
        let saved = prefs
            .set_custom_patterns(&["  ^magnet:  ", "", "   ", "^ed2k:"])
            .unwrap();
        assert_eq!(saved, vec!["^magnet:", "^ed2k:"]);
        assert_eq!(prefs.custom_patterns().unwrap(), saved);
        assert!(prefs.validator().unwrap().is_valid("ED2K://x"));
    }

    #[test]
    fn test_default_validator_without_patterns() {
        let prefs = prefs();
        assert!(!prefs.validator().unwrap().uses_custom_patterns());
    }

    #[test]
    fn test_theme_cycle() {
        let prefs = prefs();
        assert_eq!(prefs.theme().unwrap(), Theme::System);
        assert_eq!(prefs.toggle_theme().unwrap(), Theme::Dark);
        assert_eq!(prefs.toggle_theme().unwrap(), Theme::Light);
        assert_eq!(prefs.toggle_theme().unwrap(), Theme::System);
        assert_eq!(prefs.theme().unwrap(), Theme::System);
    }

    #[test]
    fn test_client_settings_round_trip() {
        let prefs = prefs();
        assert!(!prefs.client_settings().unwrap().is_configured());

        prefs
            .set_client_settings(&ClientSettings {
                kind: ClientKind::Transmission,
                url: "  http://localhost:9091/transmission/rpc ".to_string(),
                token: " user:pass ".to_string(),
            })
            .unwrap();

        let settings = prefs.client_settings().unwrap();
        assert_eq!(settings.kind, ClientKind::Transmission);
        assert_eq!(settings.url, "http://localhost:9091/transmission/rpc");
        assert_eq!(settings.token, "user:pass");
    }
}
