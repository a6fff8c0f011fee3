//! `src/traversal/aggregator.rs`
//! ============================================================================
//! # `TreeAggregator`: recursive expansion of a selection into a flat file set
//!
//! Expands a set of selected entries depth-first through the listing
//! backend, accumulating running totals and the ordered flat file list.
//! The expansion is an explicit LIFO worklist rather than async recursion:
//! children are pushed in reverse so pop order reproduces depth-first
//! preorder, which keeps sibling order, root order, and the position of a
//! directory's subtree identical to the recursive formulation while giving
//! cancellation a natural checkpoint between steps.
//!
//! Failure semantics are fail-fast: the first listing failure at any depth
//! aborts the whole run with no partial results and no further listing
//! calls. There is no retry; a caller wishing to retry re-invokes the
//! whole traversal.

use std::sync::Arc;

use compact_str::CompactString;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::{
    cache::dir_modified::DirModifiedCache,
    config::TraversalConfig,
    error::CoreError,
    fs::{listing::ListingSource, remote_entry::RemoteEntry},
    traversal::progress::{ProgressUpdate, RunningTotals, TraversalStatus},
    util::path::join_path,
};

/// The successful outcome of one traversal: final totals plus the ordered,
/// fully path-resolved flat file set.
#[derive(Debug, Clone)]
pub struct Aggregate {
    pub totals: RunningTotals,
    pub files: Vec<RemoteEntry>,
}

impl Aggregate {
    /// Serialize the flat file set as an indented UTF-8 JSON dump, the
    /// downloadable export artifact.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, CoreError> {
        Ok(serde_json::to_vec_pretty(&self.files)?)
    }

    /// Download name for the export artifact, derived from the traversed
    /// path ("/movies/new" → "movies_new.json").
    #[must_use]
    pub fn export_name(base_path: &str) -> String {
        let stem = base_path.trim_matches('/').replace('/', "_");
        if stem.is_empty() {
            "root.json".to_string()
        } else {
            format!("{stem}.json")
        }
    }
}

pub struct TreeAggregator {
    source: Arc<dyn ListingSource>,
    base_path: String,
    credential: Option<CompactString>,
    cache: Option<Arc<DirModifiedCache>>,
    cancel: CancellationToken,
    yield_every: usize,
    progress: Option<UnboundedSender<ProgressUpdate>>,
}

impl TreeAggregator {
    #[must_use]
    pub fn new(source: Arc<dyn ListingSource>, base_path: impl Into<String>) -> Self {
        Self {
            source,
            base_path: base_path.into(),
            credential: None,
            cache: None,
            cancel: CancellationToken::new(),
            yield_every: TraversalConfig::default().yield_every,
            progress: None,
        }
    }

    /// Credential passed through to every listing call, unchanged.
    #[must_use]
    pub fn with_credential(mut self, credential: impl AsRef<str>) -> Self {
        self.credential = Some(CompactString::new(credential.as_ref()));
        self
    }

    /// Attach the modified-time cache; every fetched page is enriched and
    /// observed at the call site.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<DirModifiedCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// External cancellation handle, checked before each expansion step.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: &TraversalConfig) -> Self {
        self.yield_every = config.yield_every.max(1);
        self
    }

    /// Open the progress stream. Snapshots arrive in order and end with
    /// exactly one terminal update.
    pub fn subscribe(&mut self) -> UnboundedReceiver<ProgressUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.progress = Some(tx);
        rx
    }

    /// Spawn the traversal as a background task, returning the progress
    /// stream and the join handle carrying the outcome.
    #[must_use]
    pub fn spawn(
        mut self,
        roots: Vec<RemoteEntry>,
    ) -> (
        UnboundedReceiver<ProgressUpdate>,
        JoinHandle<Result<Aggregate, CoreError>>,
    ) {
        let rx = self.subscribe();
        let handle = tokio::spawn(async move { self.aggregate(roots).await });
        (rx, handle)
    }

    /// Run the whole traversal over the selected roots.
    #[instrument(skip(self, roots), fields(base_path = %self.base_path, roots = roots.len()))]
    pub async fn aggregate(&self, roots: Vec<RemoteEntry>) -> Result<Aggregate, CoreError> {
        let mut totals = RunningTotals::default();

        self.emit(TraversalStatus::Idle, "initializing".to_string(), totals);
        self.emit(
            TraversalStatus::FetchingStructure,
            "fetching folder structure".to_string(),
            totals,
        );

        info!(
            marker = "TRAVERSAL",
            operation_type = "aggregate_start",
            base_path = %self.base_path,
            "Starting tree aggregation"
        );

        let mut files: Vec<RemoteEntry> = Vec::new();

        // (relative prefix under base_path, entry); roots reversed so the
        // LIFO pop order walks them first-to-last.
        let mut worklist: Vec<(CompactString, RemoteEntry)> = roots
            .into_iter()
            .rev()
            .map(|entry| (CompactString::const_new(""), entry))
            .collect();

        let mut steps: usize = 0;

        while let Some((prefix, mut entry)) = worklist.pop() {
            if self.cancel.is_cancelled() {
                warn!(
                    marker = "TRAVERSAL",
                    operation_type = "aggregate_cancelled",
                    base_path = %self.base_path,
                    "Traversal cancelled before next expansion step"
                );
                self.emit(
                    TraversalStatus::Error,
                    CoreError::Cancelled.to_string(),
                    totals,
                );
                return Err(CoreError::Cancelled);
            }

            if entry.is_dir {
                totals.folders += 1;

                let dir_path = join_path(&[&self.base_path, &prefix, &entry.name]);
                let page = self
                    .source
                    .list(&dir_path, self.credential.as_deref())
                    .await;

                let mut children = match page {
                    Ok(children) => children,
                    Err(e) => {
                        let err = CoreError::structure_fetch(&e.message);
                        warn!(
                            marker = "TRAVERSAL",
                            operation_type = "aggregate_listing_failed",
                            path = %dir_path,
                            error = %e,
                            "Listing failed, aborting traversal"
                        );
                        self.emit(TraversalStatus::Error, err.to_string(), totals);
                        return Err(err);
                    }
                };

                if let Some(cache) = &self.cache {
                    cache.enrich(&dir_path, &mut children).await;
                    cache.observe(&dir_path, &children).await;
                }

                let child_prefix = join_path(&[&prefix, &entry.name]);
                for child in children.into_iter().rev() {
                    worklist.push((CompactString::new(&child_prefix), child));
                }

                self.emit(
                    TraversalStatus::FetchingStructure,
                    totals.summary(),
                    totals,
                );
            } else {
                totals.files += 1;
                totals.total_size += entry.size;

                if entry.path.is_none() {
                    entry.path = Some(join_path(&[&self.base_path, &prefix, &entry.name]));
                }
                files.push(entry);
            }

            steps += 1;
            if steps.is_multiple_of(self.yield_every) {
                tokio::task::yield_now().await;
            }
        }

        self.emit(
            TraversalStatus::FetchingFiles,
            "finalizing file list".to_string(),
            totals,
        );

        info!(
            marker = "TRAVERSAL",
            operation_type = "aggregate_success",
            folders = totals.folders,
            files = totals.files,
            total_size = totals.total_size,
            "Tree aggregation completed"
        );

        self.emit(TraversalStatus::Success, totals.summary(), totals);

        Ok(Aggregate { totals, files })
    }

    fn emit(&self, status: TraversalStatus, message: String, totals: RunningTotals) {
        if let Some(tx) = &self.progress {
            // Receiver may have stopped observing; the traversal itself
            // carries on regardless.
            let _ = tx.send(ProgressUpdate {
                status,
                message,
                totals,
            });
        }
    }
}
