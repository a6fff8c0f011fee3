//! `src/traversal/progress.rs`
//! ============================================================
//! Progress protocol for one traversal invocation.
//!
//! The aggregator publishes `(status, message, totals)` snapshots over a
//! channel instead of mutating ambient UI state, so any binding — web
//! front end, test harness, log sink — observes the same sequence.

use serde::{Deserialize, Serialize};

use crate::util::humanize;

/// Traversal state machine.
///
/// `Idle` is the state before the run starts. `FetchingStructure` covers
/// the whole recursive expansion — the dominant, potentially slow phase.
/// `FetchingFiles` marks the flat list being finalized. `Error` and
/// `Success` are terminal: no update ever follows either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraversalStatus {
    Idle,
    FetchingStructure,
    FetchingFiles,
    Error,
    Success,
}

impl TraversalStatus {
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Error | Self::Success)
    }
}

/// Monotone accumulator owned by a single traversal invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningTotals {
    /// Directories visited, traversal roots included.
    pub folders: u64,

    /// Files encountered.
    pub files: u64,

    /// Sum of file sizes in bytes.
    pub total_size: u64,
}

impl RunningTotals {
    /// One-line display form ("2 files, 1 folders, 30 B").
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} files, {} folders, {}",
            self.files,
            self.folders,
            humanize::size_human(self.total_size)
        )
    }
}

/// One observable snapshot of a running traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub status: TraversalStatus,

    /// Human-readable line for the status display.
    pub message: String,

    pub totals: RunningTotals,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_error_and_success_are_terminal() {
        assert!(TraversalStatus::Error.is_terminal());
        assert!(TraversalStatus::Success.is_terminal());
        assert!(!TraversalStatus::Idle.is_terminal());
        assert!(!TraversalStatus::FetchingStructure.is_terminal());
        assert!(!TraversalStatus::FetchingFiles.is_terminal());
    }

    #[test]
    fn summary_names_counts_and_size() {
        let totals = RunningTotals {
            folders: 1,
            files: 2,
            total_size: 30,
        };
        let line = totals.summary();
        assert!(line.starts_with("2 files, 1 folders"));
        assert!(line.contains('B'));
    }
}
