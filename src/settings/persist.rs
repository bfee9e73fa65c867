//! Reading and writing the settings slot.

use super::model::UserSettings;
use super::normalize::normalize;
use crate::config;
use crate::storage::{Storage, StorageError};

/// Load settings from storage, repairing whatever is found there.
///
/// Missing, unreadable or unparsable data yields `defaults`.
pub fn load_settings(storage: &dyn Storage, defaults: &UserSettings) -> UserSettings {
    let contents = match storage.get_item(config::STORAGE_KEY) {
        Ok(Some(contents)) => contents,
        Ok(None) => return defaults.clone(),
        Err(e) => {
            log::warn!("Failed to read saved settings: {}", e);
            return defaults.clone();
        }
    };

    match serde_json::from_str::<serde_json::Value>(&contents) {
        Ok(raw) => normalize(defaults, Some(&raw)),
        Err(e) => {
            log::warn!("Saved settings are not valid JSON, using defaults: {}", e);
            defaults.clone()
        }
    }
}

/// Write the full settings object to storage
pub fn save_settings(storage: &dyn Storage, settings: &UserSettings) -> Result<(), StorageError> {
    let contents = serde_json::to_string(settings)?;
    storage.set_item(config::STORAGE_KEY, &contents)?;
    log::debug!("Settings saved ({} bytes)", contents.len());
    Ok(())
}

pub fn clear_settings(storage: &dyn Storage) -> Result<(), StorageError> {
    storage.remove_item(config::STORAGE_KEY)?;
    log::info!("Saved settings cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, SqliteStorage};

    #[test]
    fn test_load_missing_returns_defaults() {
        let storage = MemoryStorage::new();
        let defaults = UserSettings::default();
        assert_eq!(load_settings(&storage, &defaults), defaults);
    }

    #[test]
    fn test_load_garbage_returns_defaults() {
        let storage = MemoryStorage::new();
        storage.set_item(config::STORAGE_KEY, "{not json").unwrap();
        let defaults = UserSettings::default();
        assert_eq!(load_settings(&storage, &defaults), defaults);
    }

    #[test]
    fn test_save_then_load() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let mut settings = UserSettings::default();
        settings.show_seconds = false;
        settings.search_history = vec!["glib".into()];

        save_settings(&storage, &settings).unwrap();
        assert_eq!(load_settings(&storage, &UserSettings::default()), settings);
    }

    #[test]
    fn test_load_repairs_stored_value() {
        let storage = MemoryStorage::new();
        storage
            .set_item(config::STORAGE_KEY, r#"{"selectedEngine":"Gone","searchEngines":[]}"#)
            .unwrap();

        let defaults = UserSettings::default();
        let loaded = load_settings(&storage, &defaults);
        assert_eq!(loaded.search_engines, defaults.search_engines);
        assert_eq!(loaded.selected_engine, defaults.search_engines[0].name);
    }

    #[test]
    fn test_clear() {
        let storage = MemoryStorage::new();
        save_settings(&storage, &UserSettings::default()).unwrap();
        clear_settings(&storage).unwrap();
        assert_eq!(storage.get_item(config::STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_save_over_quota_fails() {
        let storage = MemoryStorage::with_quota(64);
        let err = save_settings(&storage, &UserSettings::default()).unwrap_err();
        assert!(err.is_quota_exceeded());
    }
}
