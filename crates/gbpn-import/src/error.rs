//! Import errors.

use gbpn_core::error::StoreError;
use std::path::PathBuf;

/// Errors from an import run.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("invalid GBPN ID '{0}': expected a non-empty number")]
    InvalidTarget(String),
    #[error("file not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("failed to open source: {0}")]
    Source(#[from] csv::Error),
    /// A row could not be decoded partway through a run.
    #[error("unreadable source row after {processed} committed record(s): {source}")]
    Row {
        processed: usize,
        #[source]
        source: csv::Error,
    },
    /// A record's unit of work failed and was rolled back.
    #[error("failed to import '{place}' after {processed} committed record(s): {source}")]
    Record {
        place: String,
        /// Records fully committed before the failure.
        processed: usize,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ImportError {
    /// Records committed before the run stopped partway through.
    pub fn processed(&self) -> Option<usize> {
        match self {
            Self::Record { processed, .. } | Self::Row { processed, .. } => Some(*processed),
            _ => None,
        }
    }
}
