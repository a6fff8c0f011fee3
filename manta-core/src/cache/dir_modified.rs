//! `src/cache/dir_modified.rs`
//! ============================================================================
//! # `DirModifiedCache`: persisted directory modified-time healing
//!
//! Some backends report a directory's own metadata timestamp instead of the
//! newest timestamp among its descendants. This cache remembers, per
//! directory path, the newest child timestamp ever observed, and patches
//! listing pages with it. Values only move forward: a writer always
//! compares-and-takes-max under the lock, never blind-overwrites, so the
//! monotonic invariant holds when independent traversals interleave.
//!
//! Persistence is best-effort. A store that cannot be read (or a record
//! that does not parse) means a cold cache; a failed write keeps the
//! in-memory value and retries on the next observation. Cache trouble never
//! fails a listing or a traversal.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{SecondsFormat, Utc};
use compact_str::CompactString;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    cache::store::KvStore,
    config::CacheConfig,
    fs::remote_entry::RemoteEntry,
    util::path::join_path,
};

/// Fixed namespace key in the backing store. The whole mapping lives under
/// this one record, mirroring the front end's `localStorage` layout.
pub const STORAGE_KEY: &str = "folder-modified";

#[derive(Default)]
struct CacheState {
    map: BTreeMap<String, CompactString>,
    loaded: bool,
}

pub struct DirModifiedCache {
    store: Arc<dyn KvStore>,
    config: CacheConfig,
    state: Mutex<CacheState>,
}

impl DirModifiedCache {
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_config(store, CacheConfig::default())
    }

    #[must_use]
    pub fn with_config(store: Arc<dyn KvStore>, config: CacheConfig) -> Self {
        Self {
            store,
            config,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Patch directory children whose reported timestamp is older than the
    /// newest one ever observed for them. Files are never altered and a
    /// timestamp is never lowered.
    pub async fn enrich(&self, path: &str, entries: &mut [RemoteEntry]) {
        if !self.config.enabled {
            return;
        }

        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await;

        for entry in entries.iter_mut().filter(|e| e.is_dir) {
            let child_path = join_path(&[path, &entry.name]);
            if let Some(cached) = state.map.get(&child_path)
                && *cached > entry.modified
            {
                debug!(
                    marker = "DIR_MODIFIED_CACHE",
                    operation_type = "enrich",
                    path = %child_path,
                    reported = %entry.modified,
                    healed = %cached,
                    "Healed stale directory timestamp"
                );
                entry.modified = cached.clone();
            }
        }
    }

    /// Record the newest child timestamp for `path` after a page has been
    /// enriched. An empty page is a no-op; an older maximum never wins.
    pub async fn observe(&self, path: &str, entries: &[RemoteEntry]) {
        if !self.config.enabled {
            return;
        }

        let Some(max_modified) = entries
            .iter()
            .map(|e| &e.modified)
            .filter(|m| !m.is_empty())
            .max()
        else {
            return;
        };

        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await;

        let newer = state
            .map
            .get(path)
            .is_none_or(|current| max_modified > current);
        if !newer {
            return;
        }

        state.map.insert(path.to_string(), max_modified.clone());
        self.apply_bound(&mut state);
        self.persist(&state).await;
    }

    /// Last-known value for a directory path, if any. Primarily for
    /// diagnostics and tests.
    pub async fn peek(&self, path: &str) -> Option<CompactString> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await;
        state.map.get(path).cloned()
    }

    pub async fn len(&self) -> usize {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await;
        state.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Lazy first-use load. Any failure degrades to a cold cache.
    async fn ensure_loaded(&self, state: &mut CacheState) {
        if state.loaded {
            return;
        }
        state.loaded = true;

        let record = match self.store.get(STORAGE_KEY).await {
            Ok(Some(record)) => record,
            Ok(None) => return,
            Err(e) => {
                warn!(
                    marker = "DIR_MODIFIED_CACHE",
                    operation_type = "load_failed",
                    error = %e,
                    "Store unavailable, starting with a cold cache"
                );
                return;
            }
        };

        match serde_json::from_str::<BTreeMap<String, CompactString>>(&record) {
            Ok(map) => {
                state.map = map;
                self.apply_ttl(state);
                debug!(
                    marker = "DIR_MODIFIED_CACHE",
                    operation_type = "load",
                    entries = state.map.len(),
                    "Loaded persisted modified-time record"
                );
            }
            Err(e) => {
                let err = crate::error::CoreError::malformed_record(STORAGE_KEY);
                warn!(
                    marker = err.marker(),
                    operation_type = "malformed_record",
                    error = %e,
                    "{err}, starting with a cold cache"
                );
            }
        }
    }

    /// Optional TTL pruning at load time, best-effort: timestamps are
    /// compared as strings against an RFC-3339 cutoff, which is only exact
    /// for backends emitting that format.
    fn apply_ttl(&self, state: &mut CacheState) {
        let Some(ttl) = self.config.ttl else { return };
        let Ok(ttl) = chrono::TimeDelta::from_std(ttl) else {
            return;
        };

        let cutoff = (Utc::now() - ttl).to_rfc3339_opts(SecondsFormat::Secs, true);
        let before = state.map.len();
        state.map.retain(|_, modified| modified.as_str() >= cutoff.as_str());

        if state.map.len() < before {
            debug!(
                marker = "DIR_MODIFIED_CACHE",
                operation_type = "ttl_prune",
                dropped = before - state.map.len(),
                "Dropped expired cache entries"
            );
        }
    }

    /// Optional entry bound: evict the oldest-valued entries first. Off by
    /// default; unbounded growth is the documented baseline behavior.
    fn apply_bound(&self, state: &mut CacheState) {
        let Some(max_entries) = self.config.max_entries else {
            return;
        };

        while state.map.len() > max_entries {
            let oldest = state
                .map
                .iter()
                .min_by(|a, b| a.1.cmp(b.1))
                .map(|(path, _)| path.clone());
            match oldest {
                Some(path) => {
                    state.map.remove(&path);
                }
                None => break,
            }
        }
    }

    async fn persist(&self, state: &CacheState) {
        let record = match serde_json::to_string(&state.map) {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    marker = "DIR_MODIFIED_CACHE",
                    operation_type = "serialize_failed",
                    error = %e,
                    "Could not serialize cache record"
                );
                return;
            }
        };

        if let Err(e) = self.store.set(STORAGE_KEY, &record).await {
            warn!(
                marker = "DIR_MODIFIED_CACHE",
                operation_type = "persist_failed",
                error = %e,
                "Store write failed, keeping in-memory value"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryStore;
    use crate::error::CoreResult;
    use async_trait::async_trait;

    fn cache() -> DirModifiedCache {
        DirModifiedCache::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn observe_is_monotonic() {
        let cache = cache();

        let newer = [RemoteEntry::file("x", 1, "2024-01-01T00:00:00Z")];
        let older = [RemoteEntry::file("x", 1, "2023-01-01T00:00:00Z")];

        cache.observe("/dirA", &newer).await;
        assert_eq!(
            cache.peek("/dirA").await.as_deref(),
            Some("2024-01-01T00:00:00Z")
        );

        cache.observe("/dirA", &older).await;
        assert_eq!(
            cache.peek("/dirA").await.as_deref(),
            Some("2024-01-01T00:00:00Z")
        );
    }

    #[tokio::test]
    async fn empty_page_is_a_no_op() {
        let cache = cache();
        cache.observe("/dirA", &[]).await;
        assert_eq!(cache.peek("/dirA").await, None);

        // Entries with no timestamp do not count either.
        cache.observe("/dirA", &[RemoteEntry::file("x", 1, "")]).await;
        assert_eq!(cache.peek("/dirA").await, None);
    }

    #[tokio::test]
    async fn enrich_heals_stale_directory_rows() {
        let cache = cache();
        cache
            .observe("/dirA/sub", &[RemoteEntry::file("f", 1, "2024-06-01T00:00:00Z")])
            .await;

        let mut page = vec![
            RemoteEntry::dir("sub", "2023-01-01T00:00:00Z"),
            RemoteEntry::file("plain", 7, "2023-01-01T00:00:00Z"),
        ];
        cache.enrich("/dirA", &mut page).await;

        assert_eq!(page[0].modified, "2024-06-01T00:00:00Z");
        // Files are never altered.
        assert_eq!(page[1].modified, "2023-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn enrich_never_lowers_a_newer_listing() {
        let cache = cache();
        cache
            .observe("/dirA/sub", &[RemoteEntry::file("f", 1, "2023-01-01T00:00:00Z")])
            .await;

        let mut page = vec![RemoteEntry::dir("sub", "2025-01-01T00:00:00Z")];
        cache.enrich("/dirA", &mut page).await;
        assert_eq!(page[0].modified, "2025-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn record_survives_across_instances() {
        let store = Arc::new(MemoryStore::new());

        let first = DirModifiedCache::new(store.clone());
        first
            .observe("/dirA", &[RemoteEntry::file("x", 1, "2024-01-01T00:00:00Z")])
            .await;

        let second = DirModifiedCache::new(store);
        assert_eq!(
            second.peek("/dirA").await.as_deref(),
            Some("2024-01-01T00:00:00Z")
        );
    }

    #[tokio::test]
    async fn malformed_record_means_cold_cache() {
        let store = Arc::new(MemoryStore::new());
        store.set(STORAGE_KEY, "not json at all").await.unwrap();

        let cache = DirModifiedCache::new(store);
        assert!(cache.is_empty().await);

        // Still writable after the cold start.
        cache
            .observe("/dirA", &[RemoteEntry::file("x", 1, "2024-01-01T00:00:00Z")])
            .await;
        assert!(cache.peek("/dirA").await.is_some());
    }

    struct FailingStore;

    #[async_trait]
    impl KvStore for FailingStore {
        async fn get(&self, _key: &str) -> CoreResult<Option<String>> {
            Err(crate::error::CoreError::store("storage unavailable"))
        }

        async fn set(&self, _key: &str, _value: &str) -> CoreResult<()> {
            Err(crate::error::CoreError::store("storage unavailable"))
        }
    }

    #[tokio::test]
    async fn store_failures_degrade_without_propagating() {
        let cache = DirModifiedCache::new(Arc::new(FailingStore));

        // Both calls absorb the store error; the in-memory value still works.
        cache
            .observe("/dirA", &[RemoteEntry::file("x", 1, "2024-01-01T00:00:00Z")])
            .await;
        assert_eq!(
            cache.peek("/dirA").await.as_deref(),
            Some("2024-01-01T00:00:00Z")
        );
    }

    #[tokio::test]
    async fn disabled_cache_neither_heals_nor_observes() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(STORAGE_KEY, r#"{"/dirA/sub":"2024-06-01T00:00:00Z"}"#)
            .await
            .unwrap();

        let config = CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        };
        let cache = DirModifiedCache::with_config(store.clone(), config);

        // A stale directory row passes through untouched.
        let mut page = vec![RemoteEntry::dir("sub", "2023-01-01T00:00:00Z")];
        cache.enrich("/dirA", &mut page).await;
        assert_eq!(page[0].modified, "2023-01-01T00:00:00Z");

        // Observations are dropped and nothing new is persisted.
        cache.observe("/dirA", &page).await;
        assert_eq!(
            store.get(STORAGE_KEY).await.unwrap().as_deref(),
            Some(r#"{"/dirA/sub":"2024-06-01T00:00:00Z"}"#)
        );
    }

    #[tokio::test]
    async fn bounded_mode_evicts_oldest_values_first() {
        let config = CacheConfig {
            max_entries: Some(2),
            ..CacheConfig::default()
        };
        let cache = DirModifiedCache::with_config(Arc::new(MemoryStore::new()), config);

        cache
            .observe("/old", &[RemoteEntry::file("x", 1, "2020-01-01T00:00:00Z")])
            .await;
        cache
            .observe("/mid", &[RemoteEntry::file("x", 1, "2022-01-01T00:00:00Z")])
            .await;
        cache
            .observe("/new", &[RemoteEntry::file("x", 1, "2024-01-01T00:00:00Z")])
            .await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.peek("/old").await, None);
        assert!(cache.peek("/new").await.is_some());
    }
}
