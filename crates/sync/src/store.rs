//! Policy layer over the content store.
//!
//! Backends are plain adapters. [`IndexStore`] adds the two rules the
//! reconciler relies on: writes land whether or not the page already exists,
//! and deletion only ever removes pages that carry a generated-page marker.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use indexer_extract::INDEX_MARKERS;
use indexer_storage::{BackendHandle, File};
use std::path::Path;
use std::sync::Arc;
use tracing::instrument;

#[derive(Clone)]
pub struct IndexStore {
    backend: BackendHandle,
    markers: Arc<[String]>,
}
impl IndexStore {
    /// Store guarding deletions with the standard index page markers.
    pub fn new(backend: BackendHandle) -> Self {
        Self::with_markers(backend, INDEX_MARKERS)
    }

    pub fn with_markers(backend: BackendHandle, markers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { backend, markers: markers.into_iter().map(Into::into).collect() }
    }

    /// Snapshot of every file in the store.
    pub async fn files(&self) -> Result<Vec<File>> {
        File::list_all(&self.backend).await.or_raise(|| ErrorKind::Storage)
    }

    /// Idempotent.
    pub async fn ensure_folder(&self, path: &Path) -> Result<()> {
        self.backend.create_folder(path).await.or_raise(|| ErrorKind::Storage)
    }

    /// Replace the page at `path`, creating it if needed.
    ///
    /// Update is tried first; on any failure the page is created instead. If
    /// that fails too, the create error is returned.
    #[instrument(skip(self, content), fields(path = %path.display(), bytes = content.len()))]
    pub async fn create_or_update(&self, path: &Path, content: &str) -> Result<()> {
        match self.backend.update(path, content.as_bytes()).await {
            Ok(()) => Ok(()),
            Err(update_error) => {
                tracing::debug!(error = ?update_error, "Update failed, creating instead");
                self.backend.create(path, content.as_bytes()).await.or_raise(|| ErrorKind::Storage)
            },
        }
    }

    /// Delete a generated page.
    ///
    /// A file with readable, non-empty content lacking every marker is left
    /// alone and [`NotAGeneratedFile`](ErrorKind::NotAGeneratedFile) returned.
    /// A file that cannot be read has nothing to guard and the delete goes
    /// ahead.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn delete_generated(&self, path: &Path) -> Result<()> {
        match self.backend.read_text(path).await {
            Ok(content) if !content.is_empty() && !self.is_generated(&content) => {
                exn::bail!(ErrorKind::NotAGeneratedFile(path.to_path_buf()));
            },
            Ok(_) => {},
            Err(err) => tracing::debug!(error = ?err, "Page unreadable, deleting without check"),
        }
        self.backend.delete(path).await.or_raise(|| ErrorKind::Storage)
    }

    fn is_generated(&self, content: &str) -> bool {
        self.markers.iter().any(|marker| content.contains(marker.as_str()))
    }
}
