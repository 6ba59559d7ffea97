//! Content extraction for indexer.
//!
//! Turns a source file into the Markdown page that mirrors it. Each
//! [`SourceKind`] is handled by an [`Extractor`] producing a body fragment,
//! which a [`PageRenderer`] wraps into the final page (heading, embed link
//! and the generated-file marker). [`Converter`] pairs the two.
//!
//! - `.canvas` documents are parsed locally ([`CanvasExtractor`]).
//! - Images and PDFs are described by an external [`ContentService`]
//!   ([`AttachmentExtractor`]).

mod attachment;
mod canvas;
mod consts;
pub mod error;
mod fragment;
mod kind;
mod page;
pub mod service;

pub use crate::attachment::{AttachmentExtractor, RetryPolicy};
pub use crate::canvas::CanvasExtractor;
pub use crate::consts::{
    CANVAS_INDEX_MARKER, DEFAULT_MAX_ATTACHMENT_MB, IMAGE_INDEX_MARKER, INDEX_MARKERS, PDF_INDEX_MARKER,
};
use crate::error::Result;
pub use crate::kind::{SourceKind, UnknownKind};
pub use crate::page::PageRenderer;
use crate::service::ContentService;
use async_trait::async_trait;
use indexer_storage::File;
use std::sync::Arc;
use tracing::instrument;

/// Turns one source file into a Markdown fragment.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Whether every credential the extractor needs is configured. A mapping
    /// whose extractor lacks one is skipped entirely.
    fn has_credential(&self) -> bool {
        true
    }

    /// Produce the body fragment for `source`.
    ///
    /// Problems the user should see in the generated page (oversized or
    /// rejected attachments, unparseable canvases) are returned as `Ok`
    /// fragments. `Err` is reserved for failures that leave nothing sensible
    /// to write: an unreadable source, or a fatal service outage.
    async fn extract(&self, source: &File) -> Result<String>;
}

/// An [`Extractor`] paired with the page template for its kind.
#[derive(Clone)]
pub struct Converter {
    extractor: Arc<dyn Extractor>,
    page: Arc<PageRenderer>,
}
impl Converter {
    pub fn new(extractor: Arc<dyn Extractor>) -> Result<Self> {
        let page = PageRenderer::new(extractor.kind())?;
        Ok(Self { extractor, page: Arc::new(page) })
    }

    /// Converter for `kind`, backed by `service` when the kind needs one.
    pub fn for_kind(kind: SourceKind, service: Arc<dyn ContentService>, options: AttachmentOptions) -> Result<Self> {
        match AttachmentExtractor::new(kind, service) {
            Some(attachment) => Self::new(Arc::new(
                attachment.with_max_size_mb(options.max_size_mb).with_retry(options.retry),
            )),
            None => Self::new(Arc::new(CanvasExtractor)),
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.extractor.kind()
    }

    pub fn has_credential(&self) -> bool {
        self.extractor.has_credential()
    }

    /// Extract `source` and render the complete index page.
    #[instrument(skip_all, fields(kind = %self.kind(), path = %source.path().display()))]
    pub async fn convert(&self, source: &File) -> Result<String> {
        let fragment = self.extractor.extract(source).await?;
        self.page.render(&source.name, &fragment)
    }
}

/// Tunables for attachment extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentOptions {
    pub max_size_mb: u64,
    pub retry: RetryPolicy,
}
impl Default for AttachmentOptions {
    fn default() -> Self {
        Self { max_size_mb: DEFAULT_MAX_ATTACHMENT_MB, retry: RetryPolicy::default() }
    }
}
