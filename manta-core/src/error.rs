//! Core error handling module
//!
//! • One unified enum for the traversal and cache layers
//! • `CompactString` payloads keep hot-path errors allocation-light
//! • `#[non_exhaustive]` for forward-compatible extension
//!
//! Propagation policy: a listing failure (`StructureFetch`) is fatal to the
//! whole traversal. Store failures are absorbed by the modified-time cache,
//! which degrades to a cold cache; they only surface to direct store users.

use std::io;

use compact_str::CompactString;
use thiserror::Error;

/// Convenient alias carrying our unified error type
pub type CoreResult<T> = Result<T, CoreError>;

/// Primary error enumeration (grouped by concern)
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CoreError {
    // ────────────────────────────────────────────────────────────
    // Traversal
    // ────────────────────────────────────────────────────────────
    /// The listing backend returned a failure for some path mid-traversal.
    /// The message is surfaced to the caller verbatim behind a fixed marker.
    #[error("structure fetch failed: {message}")]
    StructureFetch { message: CompactString },

    /// The traversal stopped at a cancellation checkpoint before issuing
    /// further listing calls.
    #[error("traversal cancelled")]
    Cancelled,

    // ────────────────────────────────────────────────────────────
    // Persistent key-value store
    // ────────────────────────────────────────────────────────────
    #[error("store operation failed: {message}")]
    Store { message: CompactString },

    #[error("malformed store record under key {key}")]
    MalformedRecord { key: CompactString },

    // ────────────────────────────────────────────────────────────
    // Serialization / IO
    // ────────────────────────────────────────────────────────────
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl CoreError {
    /// Whether this error aborts a traversal (as opposed to degrading
    /// gracefully inside the cache layer).
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::StructureFetch { .. } | Self::Cancelled)
    }

    /// Stable marker string for structured log grouping.
    #[inline]
    #[must_use]
    pub const fn marker(&self) -> &'static str {
        match self {
            Self::StructureFetch { .. } => "ERROR_STRUCTURE_FETCH",
            Self::Cancelled => "ERROR_TRAVERSAL_CANCELLED",
            Self::Store { .. } => "ERROR_STORE",
            Self::MalformedRecord { .. } => "ERROR_MALFORMED_RECORD",
            Self::Serialize(_) => "ERROR_SERIALIZE",
            Self::Io(_) => "ERROR_IO",
        }
    }

    // ────────────────────────────────────────────────────────────
    // Lightweight smart-constructors
    // ────────────────────────────────────────────────────────────
    #[inline]
    #[must_use]
    pub fn structure_fetch(message: &str) -> Self {
        Self::StructureFetch {
            message: CompactString::new(message),
        }
    }

    #[inline]
    #[must_use]
    pub fn store(message: impl AsRef<str>) -> Self {
        Self::Store {
            message: CompactString::new(message.as_ref()),
        }
    }

    #[inline]
    #[must_use]
    pub fn malformed_record(key: &str) -> Self {
        Self::MalformedRecord {
            key: CompactString::new(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_fetch_carries_backend_message_verbatim() {
        let err = CoreError::structure_fetch("permission denied");
        assert_eq!(err.to_string(), "structure fetch failed: permission denied");
        assert!(err.is_fatal());
    }

    #[test]
    fn store_errors_are_not_fatal() {
        assert!(!CoreError::store("disk full").is_fatal());
        assert!(!CoreError::malformed_record("folder-modified").is_fatal());
    }
}
