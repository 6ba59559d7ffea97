//! Extraction Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Content service failures have their
//! own kinds in [`service::error`](crate::service::error) and are wrapped by
//! the kinds below once they leave the extractor.

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source file could not be read in the form the extractor needs
    /// (vanished since listing, or not valid UTF-8 for text formats). Only
    /// this file is affected.
    #[display("could not read source content")]
    Source,
    /// The index page template failed to compile or render.
    #[display("could not render index page")]
    Template,
    /// The content service kept failing after every retry. Continuing would
    /// only fail again for every remaining file, so the whole run should stop.
    #[display("content service unavailable after {_0} attempts")]
    Fatal(#[error(not(source))] u32),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Only the service outage clears up by itself, and only later.
        matches!(self, Self::Fatal(_))
    }

    /// Returns `true` if the current run must be aborted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_is_distinguished() {
        assert!(ErrorKind::Fatal(3).is_fatal());
        assert!(!ErrorKind::Source.is_fatal());
        assert!(!ErrorKind::Template.is_fatal());
        assert_eq!(ErrorKind::Fatal(3).to_string(), "content service unavailable after 3 attempts");
    }
}
