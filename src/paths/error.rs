//! Content tree failures.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while walking or reading a content tree.
///
/// [`ContentError::MayHaveChanged`] is reported when an archive that was
/// readable when its tree was created has since been rewritten or removed.
/// Retrying against fresh content makes sense for that variant only.
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} may have changed while it was being read")]
    MayHaveChanged { path: PathBuf },

    #[error("Failed to read archive {path}: {reason}")]
    Archive { path: PathBuf, reason: String },

    #[error("Content tree {path} has been closed")]
    Closed { path: PathBuf },

    #[error("Invalid path filter pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl ContentError {
    /// Whether the failure was caused by content changing underneath the reader.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::MayHaveChanged { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
