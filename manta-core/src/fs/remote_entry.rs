//! `src/fs/remote_entry.rs`
//! ============================================================
//! One filesystem node as reported by a listing call.
//!
//! Unlike local metadata structs, timestamps stay in the backend's ISO-8601
//! string form: the modified-time cache compares them lexicographically and
//! never needs a parsed representation. Field order in the serde derive is
//! the export contract and must stay stable.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::util::humanize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Name, unique within its parent listing.
    pub name: CompactString,

    /// Byte length; meaningful only when `is_dir` is false.
    pub size: u64,

    pub is_dir: bool,

    /// ISO-8601 modification timestamp. Lexicographic order is
    /// chronological order for a fixed backend format.
    pub modified: CompactString,

    /// Absolute remote path. Unset on input; the traversal resolves it
    /// before an entry enters the flat file set.
    #[serde(default)]
    pub path: Option<String>,
}

impl RemoteEntry {
    /// Build a file entry as a listing backend would report it.
    #[must_use]
    pub fn file(name: &str, size: u64, modified: &str) -> Self {
        Self {
            name: CompactString::new(name),
            size,
            is_dir: false,
            modified: CompactString::new(modified),
            path: None,
        }
    }

    /// Build a directory entry as a listing backend would report it.
    #[must_use]
    pub fn dir(name: &str, modified: &str) -> Self {
        Self {
            name: CompactString::new(name),
            size: 0,
            is_dir: true,
            modified: CompactString::new(modified),
            path: None,
        }
    }

    /// Human-readable size string.
    #[inline]
    #[must_use]
    pub fn size_human(&self) -> String {
        humanize::size_human(self.size)
    }

    /// Modification timestamp rendered in local time for display.
    #[inline]
    #[must_use]
    pub fn modified_local(&self) -> String {
        humanize::modified_local(&self.modified)
    }
}
