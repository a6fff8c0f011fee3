//! `src/fs/listing.rs`
//! ============================================================
//! The listing seam: one request for the immediate children of one
//! directory path on the remote backend.
//!
//! The traversal core is backend-agnostic; anything that can produce a page
//! of [`RemoteEntry`] values implements [`ListingSource`]. Failures are
//! plain human-readable messages, never panics — the backend already turns
//! its transport errors into user-facing text.

use async_trait::async_trait;
use compact_str::CompactString;
use thiserror::Error;

use crate::fs::remote_entry::RemoteEntry;

/// A failed listing call. Carries the backend's message verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ListingError {
    pub message: CompactString,
}

impl ListingError {
    #[must_use]
    pub fn new(message: impl AsRef<str>) -> Self {
        Self {
            message: CompactString::new(message.as_ref()),
        }
    }
}

/// Asynchronous listing backend.
///
/// Contract: immediate children only (non-recursive); the returned order is
/// preserved by callers; a credential for protected paths is passed through
/// unchanged.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn list(
        &self,
        path: &str,
        credential: Option<&str>,
    ) -> Result<Vec<RemoteEntry>, ListingError>;
}
