//! Error types for the [`service`](super) module.

use derive_more::{Display, Error};

/// A content service error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for content service calls.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies a failed content service call.
///
/// ### Transient
/// - [`ErrorKind::Unavailable`]
///
/// ### Permanent (for this request)
/// - [`ErrorKind::Rejected`]
/// - [`ErrorKind::MissingCredential`]
/// - [`ErrorKind::Decode`]
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The service refused this particular request (bad input, payload too
    /// large, invalid key). Sending it again will not help.
    #[display("request rejected: {_0}")]
    Rejected(#[error(not(source))] String),
    /// The service could not be reached, was overloaded or failed internally.
    #[display("service unavailable: {_0}")]
    Unavailable(#[error(not(source))] String),
    /// No credential is configured for the service.
    #[display("no credential configured")]
    MissingCredential,
    /// The service answered with something that could not be understood.
    #[display("could not decode service response: {_0}")]
    Decode(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Human-readable detail of the failure, without the category prefix.
    pub fn detail(&self) -> &str {
        match self {
            Self::Rejected(detail) | Self::Unavailable(detail) | Self::Decode(detail) => detail,
            Self::MissingCredential => "no credential configured",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_is_retryable() {
        assert!(ErrorKind::Unavailable("503".into()).is_retryable());
        assert!(!ErrorKind::Rejected("400".into()).is_retryable());
        assert!(!ErrorKind::MissingCredential.is_retryable());
        assert!(!ErrorKind::Decode("eof".into()).is_retryable());
    }
}
