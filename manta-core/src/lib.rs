//! manta-core
//! ============================================================================
//! Traversal and metadata-enrichment core for the Manta file-manager front
//! end. Walks a user-selected subset of a remote hierarchy through an
//! injected listing backend, aggregates totals with fail-fast semantics, and
//! heals stale directory timestamps through a persisted modified-time cache.
//!
//! Everything visual (component tree, routing, i18n, styling) lives in the
//! embedding front end; this crate owns the algorithmic surface only.

pub mod error;

pub mod config;

pub mod cache {
    pub mod dir_modified;
    pub use dir_modified::DirModifiedCache;

    pub mod store;
    pub use store::{JsonFileStore, KvStore, MemoryStore};
}

pub mod fs {
    pub mod listing;
    pub use listing::{ListingError, ListingSource};

    pub mod local_source;
    pub use local_source::LocalListingSource;

    pub mod remote_entry;
    pub use remote_entry::RemoteEntry;
}

pub mod traversal {
    pub mod aggregator;
    pub use aggregator::{Aggregate, TreeAggregator};

    pub mod progress;
    pub use progress::{ProgressUpdate, RunningTotals, TraversalStatus};
}

pub mod util {
    pub mod humanize;

    pub mod path;
    pub use path::join_path;
}

pub mod logging;

pub use error::{CoreError, CoreResult};

pub use fs::remote_entry::RemoteEntry;

pub use traversal::{
    aggregator::{Aggregate, TreeAggregator},
    progress::{ProgressUpdate, RunningTotals, TraversalStatus},
};
