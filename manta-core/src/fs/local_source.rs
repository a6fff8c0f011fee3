//! `src/fs/local_source.rs`
//! ============================================================
//! [`ListingSource`] backed by a local directory tree.
//!
//! Serves a directory on the host filesystem through the remote-listing
//! contract: remote path `/a/b` maps onto `<root>/a/b`. This is the in-tree
//! reference backend and the vehicle for integration tests; a production
//! front end swaps in its HTTP-backed source.

use std::{cmp::Ordering, ffi::OsStr, path::PathBuf, time::SystemTime};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use compact_str::CompactString;
use tokio::fs;
use tracing::debug;

use crate::fs::{
    listing::{ListingError, ListingSource},
    remote_entry::RemoteEntry,
};

pub struct LocalListingSource {
    root: PathBuf,
}

impl LocalListingSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a remote path onto the served root.
    fn resolve(&self, path: &str) -> PathBuf {
        let mut resolved = self.root.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            resolved.push(segment);
        }
        resolved
    }

    fn format_modified(modified: SystemTime) -> CompactString {
        let ts: DateTime<Utc> = modified.into();
        CompactString::new(ts.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

#[async_trait]
impl ListingSource for LocalListingSource {
    async fn list(
        &self,
        path: &str,
        _credential: Option<&str>,
    ) -> Result<Vec<RemoteEntry>, ListingError> {
        let dir = self.resolve(path);
        debug!(
            marker = "LOCAL_LISTING",
            operation_type = "list",
            remote_path = path,
            local_path = %dir.display(),
            "Listing local directory"
        );

        let mut read_dir = fs::read_dir(&dir)
            .await
            .map_err(|e| ListingError::new(e.to_string()))?;

        let mut entries: Vec<RemoteEntry> = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| ListingError::new(e.to_string()))?
        {
            let meta = entry
                .metadata()
                .await
                .map_err(|e| ListingError::new(e.to_string()))?;

            let name = entry.path();
            let name = name.file_name().and_then(OsStr::to_str).unwrap_or("");
            let modified = meta
                .modified()
                .map(Self::format_modified)
                .unwrap_or_default();

            entries.push(RemoteEntry {
                name: CompactString::new(name),
                size: if meta.is_dir() { 0 } else { meta.len() },
                is_dir: meta.is_dir(),
                modified,
                path: None,
            });
        }

        // read_dir order is platform-defined; sort directories first, then
        // alphabetically, so pages are deterministic.
        entries.sort_by(|a, b| {
            if a.is_dir && !b.is_dir {
                Ordering::Less
            } else if !a.is_dir && b.is_dir {
                Ordering::Greater
            } else {
                a.name.cmp(&b.name)
            }
        });

        Ok(entries)
    }
}
