//! File snapshots produced by storage backends.
//!
//! [`FileInfo`] is plain metadata returned from listing and stat operations.
//! [`File`] pairs that metadata with the backend it came from so content can be
//! fetched lazily, as many times as needed, without holding it in memory.

use crate::BackendHandle;
use crate::error::Result;
use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use time::UtcDateTime;

const BYTES_PER_MB: f64 = (1024 * 1024) as f64;

/// File metadata returned by storage backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Relative path from storage root
    pub path: PathBuf,
    /// Last path segment
    pub name: String,
    /// File size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: UtcDateTime,
}
impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: UtcDateTime) -> Self {
        let path = path.into();
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        Self { path, name, size, modified }
    }

    /// Size in mebibytes (`size / 2^20`).
    pub fn size_in_mb(&self) -> f64 {
        self.size as f64 / BYTES_PER_MB
    }

    /// Lossy string form of the path, used for suffix/prefix matching.
    pub fn path_str(&self) -> std::borrow::Cow<'_, str> {
        self.path.to_string_lossy()
    }
}

/// A point-in-time snapshot of a stored file with lazy content accessors.
///
/// Never mutated after construction. Both accessors go back to the backend on
/// every call and fail with [`NotFound`](crate::error::ErrorKind::NotFound)
/// if the file has disappeared since it was listed.
#[derive(Clone)]
pub struct File {
    info: FileInfo,
    backend: BackendHandle,
}
impl File {
    pub fn new(info: FileInfo, backend: BackendHandle) -> Self {
        Self { info, backend }
    }

    /// Snapshot every file in the backend.
    pub async fn list_all(backend: &BackendHandle) -> Result<Vec<File>> {
        let files = backend.list(None).await?;
        Ok(files.into_iter().map(|info| File::new(info, backend.clone())).collect())
    }

    /// Read the file as UTF-8 text.
    pub async fn content(&self) -> Result<String> {
        self.backend.read_text(&self.info.path).await
    }

    /// Read the raw bytes of the file.
    pub async fn binary_content(&self) -> Result<Vec<u8>> {
        self.backend.read(&self.info.path).await
    }

    pub fn path(&self) -> &Path {
        &self.info.path
    }
}
impl Deref for File {
    type Target = FileInfo;
    fn deref(&self) -> &FileInfo {
        &self.info
    }
}
impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File").field("info", &self.info).field("backend", &self.backend.name()).finish()
    }
}
