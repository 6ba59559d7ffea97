//! Sync Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Storage and extraction failures are
//! wrapped with [`or_raise`](exn::ResultExt::or_raise) so the full tree is
//! kept underneath the kinds below.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A sync error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a sync failure.
///
/// ### Per-file (logged, the run continues)
/// - [`ErrorKind::Conversion`]
/// - [`ErrorKind::NotAGeneratedFile`]
///
/// ### Per-mapping (logged, the batch continues)
/// - [`ErrorKind::Storage`]
///
/// ### Whole batch
/// - [`ErrorKind::Fatal`]: stop and try again later.
/// - [`ErrorKind::InProgress`]: another run holds the batch.
/// - [`ErrorKind::InvalidMapping`]: configuration is wrong.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A content store operation (list, read, write, delete) failed.
    #[display("content store operation failed")]
    Storage,
    /// A single source file could not be converted.
    #[display("could not convert source file")]
    Conversion,
    /// Deletion refused: the file has content but no generated-page marker.
    #[display("refusing to delete {}: not a generated index file", _0.display())]
    NotAGeneratedFile(#[error(not(source))] PathBuf),
    /// Extensions or index folder of a mapping are unusable.
    #[display("invalid mapping: {_0}")]
    InvalidMapping(#[error(not(source))] String),
    /// The content service is unavailable; the run was aborted.
    #[display("content service unavailable, run aborted")]
    Fatal,
    /// A batch is already running.
    #[display("a conversion run is already in progress")]
    InProgress,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fatal | Self::InProgress | Self::Storage)
    }

    /// Returns `true` if the whole batch must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal)
    }
}
