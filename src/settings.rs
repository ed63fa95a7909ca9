//! Patch preferences
//!
//! Persisted in the same key-value store as the snapshots, under their own
//! key. Missing fields fall back to defaults so older settings still load.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::storage::KeyValueStore;

/// Patch settings/preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Namespace prepended to snapshot date keys
    pub storage_prefix: String,

    // === History strip ===
    /// Days scanned backward for thumbnails
    pub history_lookback_days: u32,
    /// Maximum thumbnails shown
    pub history_max_entries: usize,

    // === Saving ===
    /// Save automatically when the page is hidden or closed
    pub autosave: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_prefix: STORAGE_PREFIX.to_string(),

            history_lookback_days: HISTORY_LOOKBACK_DAYS,
            history_max_entries: HISTORY_MAX_ENTRIES,

            autosave: true,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "patch_settings";

    /// Load settings from the store, defaults on absence or corruption
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        match store.get_item(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from storage");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring unreadable settings: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::error!("Failed to read settings: {}", e),
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to the store; failures are logged
    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> bool {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize settings: {}", e);
                return false;
            }
        };
        match store.set_item(Self::STORAGE_KEY, &json) {
            Ok(()) => {
                log::info!("Settings saved");
                true
            }
            Err(e) => {
                log::error!("Failed to save settings: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.storage_prefix, "patch-pattern:");
        assert_eq!(settings.history_lookback_days, 10);
        assert_eq!(settings.history_max_entries, 5);
        assert!(settings.autosave);
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let settings = Settings {
            history_max_entries: 3,
            autosave: false,
            ..Settings::default()
        };
        assert!(settings.save(&mut store));
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let mut store = MemoryStore::new();
        store
            .set_item(Settings::STORAGE_KEY, r#"{"history_lookback_days": 30}"#)
            .unwrap();
        let settings = Settings::load(&store);
        assert_eq!(settings.history_lookback_days, 30);
        assert_eq!(settings.history_max_entries, HISTORY_MAX_ENTRIES);
        assert!(settings.autosave);
    }

    #[test]
    fn test_corrupt_or_unavailable_falls_back() {
        let mut store = MemoryStore::new();
        store.set_item(Settings::STORAGE_KEY, "{{{").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());
        assert_eq!(Settings::load(&MemoryStore::unavailable()), Settings::default());
        assert!(!Settings::default().save(&mut MemoryStore::unavailable()));
    }
}
