//! AI-backed extraction for binary attachments (images and PDFs).

use crate::consts::DEFAULT_MAX_ATTACHMENT_MB;
use crate::error::{ErrorKind, Result};
use crate::fragment;
use crate::service::error::ErrorKind as ServiceErrorKind;
use crate::service::{ContentService, Request};
use crate::{Extractor, SourceKind};
use async_trait::async_trait;
use exn::ResultExt;
use indexer_storage::File;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// How often, and how patiently, a transient service failure is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of calls, including the first one.
    pub attempts: u32,
    /// The wait after the n-th failed attempt is `base_delay * n`.
    pub base_delay: Duration,
}
impl RetryPolicy {
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}
impl Default for RetryPolicy {
    fn default() -> Self {
        Self { attempts: 3, base_delay: Duration::from_secs(1) }
    }
}

/// Sends attachment bytes to a [`ContentService`] together with a fixed
/// prompt for the attachment kind.
///
/// Failures are handled in three tiers:
/// 1. attachments over the size limit are answered with a "too large"
///    fragment and never sent,
/// 2. rejected requests are answered with an error fragment, without retry,
/// 3. transient failures are retried; once every attempt is used up the
///    extractor fails with [`ErrorKind::Fatal`].
pub struct AttachmentExtractor {
    kind: SourceKind,
    service: Arc<dyn ContentService>,
    mime_type: &'static str,
    prompt: String,
    max_size_mb: u64,
    retry: RetryPolicy,
}
impl AttachmentExtractor {
    /// Returns `None` for kinds that are not sent to a content service.
    pub fn new(kind: SourceKind, service: Arc<dyn ContentService>) -> Option<Self> {
        let mime_type = kind.mime_type()?;
        Some(Self {
            kind,
            service,
            mime_type,
            prompt: kind.prompt().to_string(),
            max_size_mb: DEFAULT_MAX_ATTACHMENT_MB,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_max_size_mb(mut self, max_size_mb: u64) -> Self {
        self.max_size_mb = max_size_mb;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl Extractor for AttachmentExtractor {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn has_credential(&self) -> bool {
        self.service.has_credential()
    }

    #[instrument(skip_all, fields(path = %source.path().display(), service = self.service.name()))]
    async fn extract(&self, source: &File) -> Result<String> {
        let size_mb = source.size_in_mb();
        if size_mb > self.max_size_mb as f64 {
            tracing::warn!(size_mb, limit_mb = self.max_size_mb, "Attachment too large, not sending");
            return Ok(fragment::too_large(size_mb, self.max_size_mb));
        }

        let data = source.binary_content().await.or_raise(|| ErrorKind::Source)?;
        let request = Request { prompt: &self.prompt, mime_type: self.mime_type, data: &data };
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.service.generate(request).await {
                Ok(text) => return Ok(fragment::answer(&text)),
                Err(err) if err.is_retryable() && attempt < attempts => {
                    let kind: &ServiceErrorKind = &err;
                    let delay = self.retry.delay(attempt);
                    tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, error = %kind, "Content service failed, retrying");
                    tokio::time::sleep(delay).await;
                },
                Err(err) if err.is_retryable() => {
                    let kind: &ServiceErrorKind = &err;
                    tracing::error!(attempt, error = %kind, "Content service failed, giving up");
                    return Err(err).or_raise(|| ErrorKind::Fatal(attempt));
                },
                Err(err) => {
                    let kind: &ServiceErrorKind = &err;
                    tracing::warn!(size_mb, error = %kind, "Content service rejected the request");
                    return Ok(fragment::service_error(kind, size_mb));
                },
            }
        }
    }
}
