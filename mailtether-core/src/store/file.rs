//! File-backed option store.
//!
//! Persists options as a single pretty-printed JSON document. This is the
//! backing the CLI uses so credential state survives between invocations.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{OptionStore, StoreError};

/// Option store persisted to a JSON file on disk.
///
/// The whole document is loaded at construction and rewritten on every
/// mutation. Option records are small, so this stays simple rather than
/// incremental.
pub struct FileOptionStore {
    path: PathBuf,
    options: RwLock<HashMap<String, Value>>,
}

impl FileOptionStore {
    /// Default location: `<config dir>/mailtether/options.json`.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let dirs = directories::ProjectDirs::from("", "", "mailtether")
            .ok_or(StoreError::ConfigDirUnavailable)?;
        Ok(dirs.config_dir().join("options.json"))
    }

    /// Load the store from the default path, creating an empty store if the
    /// file doesn't exist yet.
    pub fn load() -> Result<Self, StoreError> {
        Self::load_from_path(Self::default_path()?)
    }

    /// Load the store from a specific path.
    pub fn load_from_path(path: PathBuf) -> Result<Self, StoreError> {
        let options = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            HashMap::new()
        };

        debug!(path = %path.display(), "loaded option store");

        Ok(Self {
            path,
            options: RwLock::new(options),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn save(&self) -> Result<(), StoreError> {
        let options = self.options.read().map_err(|e| StoreError::BackendError {
            message: format!("lock poisoned: {}", e),
        })?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(&*options)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl std::fmt::Debug for FileOptionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileOptionStore")
            .field("path", &self.path)
            .finish()
    }
}

#[async_trait]
impl OptionStore for FileOptionStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let options = self.options.read().map_err(|e| StoreError::BackendError {
            message: format!("lock poisoned: {}", e),
        })?;
        Ok(options.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        {
            let mut options = self.options.write().map_err(|e| StoreError::BackendError {
                message: format!("lock poisoned: {}", e),
            })?;
            options.insert(key.to_string(), value);
        }
        self.save()
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        {
            let mut options = self.options.write().map_err(|e| StoreError::BackendError {
                message: format!("lock poisoned: {}", e),
            })?;
            options.remove(key);
        }
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_persists_across_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("options.json");

        {
            let store = FileOptionStore::load_from_path(path.clone()).unwrap();
            store
                .set("mailtether/access_token", json!("mm_live_xyz"))
                .await
                .unwrap();
        }

        let reloaded = FileOptionStore::load_from_path(path).unwrap();
        let value = reloaded.get("mailtether/access_token").await.unwrap();
        assert_eq!(value, Some(json!("mm_live_xyz")));
    }

    #[tokio::test]
    async fn test_delete_persists_across_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("options.json");

        {
            let store = FileOptionStore::load_from_path(path.clone()).unwrap();
            store.set("k", json!(1)).await.unwrap();
            store.delete("k").await.unwrap();
        }

        let reloaded = FileOptionStore::load_from_path(path).unwrap();
        assert!(reloaded.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileOptionStore::load_from_path(dir.path().join("absent.json")).unwrap();
        assert!(store.get("anything").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deep").join("options.json");

        let store = FileOptionStore::load_from_path(path.clone()).unwrap();
        store.set("k", json!("v")).await.unwrap();

        assert!(path.exists());
    }
}
