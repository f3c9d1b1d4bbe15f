//! Authoritative configuration document and its on-disk mirror.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::ConfigError;
use crate::sanitize::redact_path;

/// Owns the in-memory configuration document and the local JSON file that
/// mirrors it.
///
/// The document is only ever replaced as a whole. Writers are serialized by
/// `write_gate`, which [`ConfigStore::persisted_snapshot`] also takes so that a
/// publish never copies a file that is halfway through being rewritten.
pub struct ConfigStore {
    local_path: PathBuf,
    fallback_path: PathBuf,
    document: RwLock<Option<Value>>,
    write_gate: Mutex<()>,
}

impl ConfigStore {
    /// Creates an empty store. Nothing is read until [`ConfigStore::load`].
    pub fn new(local_path: impl Into<PathBuf>, fallback_path: impl Into<PathBuf>) -> Self {
        Self {
            local_path: local_path.into(),
            fallback_path: fallback_path.into(),
            document: RwLock::new(None),
            write_gate: Mutex::new(()),
        }
    }

    /// Path of the local persisted copy.
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Path of the shared bootstrap copy.
    pub fn fallback_path(&self) -> &Path {
        &self.fallback_path
    }

    /// Loads the document, bootstrapping the local copy from the fallback
    /// location when the local copy is missing or unreadable.
    pub async fn load(&self) -> Result<(), ConfigError> {
        let _gate = self.write_gate.lock().await;

        match read_document(&self.local_path).await {
            Ok(document) => {
                log::info!("Loaded local {}", redact_path(&self.local_path));
                self.set_document(document);
                return Ok(());
            }
            Err(e) => {
                // The error itself carries the full path.
                let reason = std::error::Error::source(&e)
                    .map_or_else(|| e.to_string(), ToString::to_string);
                log::info!(
                    "No usable local copy of {} ({}), loading from {}",
                    redact_path(&self.local_path),
                    reason,
                    redact_path(&self.fallback_path)
                );
            }
        }

        let document =
            read_document(&self.fallback_path)
                .await
                .map_err(|e| ConfigError::Bootstrap {
                    local: self.local_path.clone(),
                    fallback: self.fallback_path.clone(),
                    reason: e.to_string(),
                })?;

        write_document(&self.local_path, &document).await?;
        log::info!(
            "Loaded {} from fallback location and created local copy",
            redact_path(&self.fallback_path)
        );

        self.set_document(document);
        Ok(())
    }

    /// Returns whether [`ConfigStore::load`] has completed.
    pub fn is_loaded(&self) -> bool {
        self.document
            .read()
            .map(|doc| doc.is_some())
            .unwrap_or_else(|poisoned| poisoned.into_inner().is_some())
    }

    /// Returns a copy of the current document.
    pub fn get(&self) -> Result<Value, ConfigError> {
        let guard = match self.document.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Config document lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        guard.clone().ok_or(ConfigError::NotLoaded)
    }

    /// Replaces the whole document and persists it.
    ///
    /// On a write failure the in-memory document already holds `document`;
    /// the returned [`ConfigError::Write`] tells the caller that disk and
    /// memory have diverged.
    pub async fn replace(&self, document: Value) -> Result<(), ConfigError> {
        let _gate = self.write_gate.lock().await;

        self.set_document(document.clone());
        write_document(&self.local_path, &document).await?;

        log::debug!("Persisted configuration to {}", redact_path(&self.local_path));
        Ok(())
    }

    /// Reads the bytes of the persisted document while no replacement is in
    /// flight.
    pub async fn persisted_snapshot(&self) -> Result<Vec<u8>, ConfigError> {
        let _gate = self.write_gate.lock().await;

        tokio::fs::read(&self.local_path)
            .await
            .map_err(|e| ConfigError::ReadFile {
                path: self.local_path.clone(),
                source: e,
            })
    }

    fn set_document(&self, document: Value) {
        let mut guard = match self.document.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Config document lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        *guard = Some(document);
    }
}

async fn read_document(path: &Path) -> Result<Value, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

    serde_json::from_str(&content).map_err(|e| ConfigError::ParseJson {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Writes pretty-printed JSON next to `path` and renames it into place.
async fn write_document(path: &Path, document: &Value) -> Result<(), ConfigError> {
    let content = serde_json::to_string_pretty(document)?;

    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    tokio::fs::write(&tmp_path, content.as_bytes())
        .await
        .map_err(write_err)?;

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ConfigStore {
        ConfigStore::new(
            dir.path().join("story_remote.json"),
            dir.path().join("shared").join("story_remote.json"),
        )
    }

    #[tokio::test]
    async fn test_get_before_load_is_not_loaded() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert!(!store.is_loaded());
        assert!(matches!(store.get(), Err(ConfigError::NotLoaded)));
    }

    #[tokio::test]
    async fn test_load_prefers_local_copy() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.local_path(), r#"{"version":"local"}"#).unwrap();

        store.load().await.unwrap();
        assert_eq!(store.get().unwrap(), json!({"version": "local"}));
    }

    #[tokio::test]
    async fn test_load_bootstraps_from_fallback() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::create_dir_all(store.fallback_path().parent().unwrap()).unwrap();
        std::fs::write(store.fallback_path(), r#"{"version":"shared"}"#).unwrap();

        store.load().await.unwrap();

        assert_eq!(store.get().unwrap(), json!({"version": "shared"}));
        let local = std::fs::read_to_string(store.local_path()).unwrap();
        assert_eq!(local, "{\n  \"version\": \"shared\"\n}");
    }

    #[tokio::test]
    async fn test_load_replaces_corrupt_local_copy() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.local_path(), "{not json").unwrap();
        std::fs::create_dir_all(store.fallback_path().parent().unwrap()).unwrap();
        std::fs::write(store.fallback_path(), r#"{"version":"shared"}"#).unwrap();

        store.load().await.unwrap();
        assert_eq!(store.get().unwrap(), json!({"version": "shared"}));
    }

    #[tokio::test]
    async fn test_load_fails_without_any_source() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let result = store.load().await;
        assert!(matches!(result, Err(ConfigError::Bootstrap { .. })));
        assert!(!store.is_loaded());
    }

    #[tokio::test]
    async fn test_replace_then_get_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.local_path(), "{}").unwrap();
        store.load().await.unwrap();

        let doc = json!({
            "version": "1.0",
            "lastUpdated": "2024-05-01",
            "storyThemes": [{"category": "Science", "themes": [{"theme": "Space"}]}],
            "aiPrompts": {"storyGeneration": {"generationConfig": {"temperature": 0.8}}}
        });
        store.replace(doc.clone()).await.unwrap();

        assert_eq!(store.get().unwrap(), doc);
        let persisted: Value =
            serde_json::from_slice(&store.persisted_snapshot().await.unwrap()).unwrap();
        assert_eq!(persisted, doc);
    }

    #[tokio::test]
    async fn test_replace_write_failure_keeps_memory() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(
            dir.path().join("missing-dir").join("story_remote.json"),
            dir.path().join("fallback.json"),
        );
        std::fs::write(dir.path().join("fallback.json"), "{}").unwrap();
        // Bootstrap cannot write into a directory that does not exist.
        assert!(store.load().await.is_err());

        let doc = json!({"version": "2.0"});
        let result = store.replace(doc.clone()).await;

        assert!(matches!(result, Err(ConfigError::Write { .. })));
        assert_eq!(store.get().unwrap(), doc);
    }
}
