use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::app::infrastructure::error::{AppError, Result};

pub const SETTINGS_KEY: &str = "settings";
pub const DISPLAY_KEY: &str = "display";

/// Durable key/value storage for small JSON blobs. Writes overwrite the
/// whole value; the last write wins.
pub trait Storage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// One `<key>.json` file per key inside a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AppError::Storage(format!("invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        // Write-then-rename: readers never see a partial file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-process storage with no durability.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Storage("storage lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Storage("storage lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Load the dark-mode flag. Missing or corrupt values yield `None`.
pub fn load_display_flag(storage: &dyn Storage) -> Option<bool> {
    match storage.read(DISPLAY_KEY) {
        Ok(Some(raw)) => serde_json::from_str::<bool>(raw.trim()).ok(),
        Ok(None) => None,
        Err(e) => {
            log::debug!("could not read display flag: {}", e);
            None
        }
    }
}

/// Best effort; failures are logged and otherwise ignored.
pub fn save_display_flag(storage: &dyn Storage, dark: bool) {
    if let Err(e) = storage.write(DISPLAY_KEY, if dark { "true" } else { "false" }) {
        log::debug!("could not save display flag: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));
        assert_eq!(storage.read(SETTINGS_KEY).unwrap(), None);

        storage.write(SETTINGS_KEY, r#"{"font_size":20}"#).unwrap();
        assert_eq!(
            storage.read(SETTINGS_KEY).unwrap().as_deref(),
            Some(r#"{"font_size":20}"#)
        );

        storage.write(SETTINGS_KEY, "{}").unwrap();
        assert_eq!(storage.read(SETTINGS_KEY).unwrap().as_deref(), Some("{}"));
        assert!(!dir.path().join("nested/settings.json.tmp").exists());
    }

    #[test]
    fn test_file_storage_rejects_bad_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());
        assert!(storage.write("../escape", "x").is_err());
        assert!(storage.read("").is_err());
    }

    #[test]
    fn test_display_flag() {
        let storage = MemoryStorage::new();
        assert_eq!(load_display_flag(&storage), None);

        save_display_flag(&storage, true);
        assert_eq!(load_display_flag(&storage), Some(true));

        storage.write(DISPLAY_KEY, "not a bool").unwrap();
        assert_eq!(load_display_flag(&storage), None);
    }
}
