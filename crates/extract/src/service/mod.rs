//! External content services.
//!
//! A [`ContentService`] takes a prompt plus one binary attachment and answers
//! with free text. The only production implementation is [`GeminiService`];
//! tests script answers with `MockService` (feature `mock`).

pub mod error;
mod gemini;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::gemini::GeminiService;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockService;
use async_trait::async_trait;
use error::Result;

/// One prompt and attachment sent to a [`ContentService`].
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub prompt: &'a str,
    pub mime_type: &'a str,
    pub data: &'a [u8],
}

#[async_trait]
pub trait ContentService: Send + Sync {
    /// Name of the service (used for logging only).
    fn name(&self) -> &str;

    /// Whether a credential is configured. Checked once per mapping before
    /// any file is processed.
    fn has_credential(&self) -> bool;

    /// Send one request and return the raw answer text.
    async fn generate(&self, request: Request<'_>) -> Result<String>;
}
