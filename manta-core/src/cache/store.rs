//! `src/cache/store.rs`
//! ============================================================
//! Persistent key-value store seam for the modified-time cache.
//!
//! The browser front end keeps the cache record in `localStorage`; embedders
//! elsewhere get the same `get`/`set` shape over whatever durable storage
//! they have. Injected as a capability so tests substitute an in-memory
//! store instead of touching disk.

use std::{collections::HashMap, io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use directories::ProjectDirs;
use tokio::{fs, sync::Mutex};
use tracing::debug;

use crate::error::{CoreError, CoreResult};

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> CoreResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> CoreResult<()>;
}

/// One file per key under a store directory, with atomic
/// temp-file-then-rename writes so a crash never leaves a torn record.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store directory under the platform-local data dir.
    pub fn default_dir() -> CoreResult<PathBuf> {
        let dirs = ProjectDirs::from("org", "manta", "Manta")
            .ok_or_else(|| CoreError::store("could not determine data directory"))?;
        Ok(dirs.data_local_dir().join("store"))
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KvStore for JsonFileStore {
    async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        match fs::read_to_string(self.key_path(key)).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::store(e.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CoreError::store(e.to_string()))?;

        let final_path = self.key_path(key);
        let temp_path = final_path.with_extension("json.tmp");

        fs::write(&temp_path, value)
            .await
            .map_err(|e| CoreError::store(e.to_string()))?;
        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            // Do not leave a torn temp record behind alongside the error.
            let _ = fs::remove_file(&temp_path).await;
            return Err(CoreError::store(e.to_string()));
        }

        debug!(
            marker = "KV_STORE",
            operation_type = "set",
            key = key,
            bytes = value.len(),
            path = %final_path.display(),
            "Persisted store record"
        );

        Ok(())
    }
}

/// In-memory store: the test double, and the embedder fallback when no
/// durable storage is available (cache degrades to session-scoped).
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.inner.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.inner
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_round_trip_and_missing_key() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(tmp.path());

        assert_eq!(store.get("folder-modified").await.unwrap(), None);

        store.set("folder-modified", r#"{"/a":"2024"}"#).await.unwrap();
        assert_eq!(
            store.get("folder-modified").await.unwrap().as_deref(),
            Some(r#"{"/a":"2024"}"#)
        );

        // Overwrite goes through the temp file; no .tmp leftovers remain.
        store.set("folder-modified", "{}").await.unwrap();
        assert_eq!(store.get("folder-modified").await.unwrap().as_deref(), Some("{}"));
        assert!(!tmp.path().join("folder-modified.json.tmp").exists());
    }

    #[tokio::test]
    async fn failed_rename_cleans_up_the_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(tmp.path());

        // A non-empty directory squatting on the record path makes the
        // final rename fail after the temp write succeeded.
        std::fs::create_dir_all(tmp.path().join("blocked.json").join("x")).unwrap();

        let err = store.set("blocked", "{}").await.unwrap_err();
        assert!(matches!(err, CoreError::Store { .. }));
        assert!(!tmp.path().join("blocked.json.tmp").exists());
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryStore::new();
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.get("other").await.unwrap(), None);
    }
}
