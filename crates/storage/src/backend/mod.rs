//! Storage backend trait and implementations.
//!
//! [`StorageBackend`] is the only I/O boundary of the system: listing,
//! reading, creating, updating and deleting files, plus creating folders.
//! Backends are pure adapters and make no policy decisions.

mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod ro;

pub use self::local::LocalBackend;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockBackend;
pub use self::ro::ReadOnlyBackend;
use crate::error::{ErrorKind, Result};
use crate::file::FileInfo;
use async_trait::async_trait;
use exn::ResultExt;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

/// Stream of listed files, as returned by [`StorageBackend::list_stream`].
pub type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// Unified interface for content stores.
///
/// All operations are asynchronous and may suspend on I/O. It's a glorified
/// CRUD interface with stricter create/update semantics than a plain `write`:
/// [`create`](Self::create) refuses to overwrite and [`update`](Self::update)
/// refuses to create.
///
/// # Path Handling
/// All paths are relative to the store root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations should
/// enforce this validation.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use indexer_storage::{backend::StorageBackend, error::Result};
///
/// async fn canvas_count(backend: &dyn StorageBackend) -> Result<usize> {
///     let files = backend.list(None).await?;
///     Ok(files.iter().filter(|f| f.name.ends_with(".canvas")).count())
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend (used for logging only).
    fn name(&self) -> &str;

    /// List all files matching an optional prefix, recursively.
    ///
    /// Default implementation of this method is to collect all the results
    /// from [`list_stream()`](Self::list_stream) into a [`Vec`] before
    /// returning. Ordering is insignificant.
    async fn list(&self, prefix: Option<&Path>) -> Result<Vec<FileInfo>> {
        self.list_stream(prefix).try_collect().await
    }

    /// Stream file metadata matching an optional prefix.
    ///
    /// Only files are yielded; folders are descended into but never reported.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::TryStreamExt;
    /// # use indexer_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// let mut stream = backend.list_stream(None);
    /// while let Some(info) = stream.try_next().await? {
    ///     println!("{}: {} bytes", info.path.display(), info.size);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a>;

    /// Check if a file exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read file contents as raw bytes.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Read file contents as UTF-8 text.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist or is not text-readable.
    async fn read_text(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path).await?;
        String::from_utf8(bytes).or_raise(|| ErrorKind::NotFound(path.to_path_buf()))
    }

    /// Create a folder (and any missing parents).
    ///
    /// Idempotent: succeeds if the folder already exists. Fails with
    /// [`InvalidPath`](crate::error::ErrorKind::InvalidPath) on an invalid
    /// path or when a file occupies the location.
    async fn create_folder(&self, path: &Path) -> Result<()>;

    /// Create a new file.
    ///
    /// Fails with [`AlreadyExists`](crate::error::ErrorKind::AlreadyExists)
    /// if the path is occupied. Parent folders are created as needed.
    ///
    /// ```no_run
    /// use std::path::Path;
    /// # use indexer_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// backend.create(Path::new("index/Board.canvas.md"), b"# Board.canvas").await?;
    /// # Ok(())
    /// # }
    /// ```
    async fn create(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Replace the contents of an existing file.
    ///
    /// Fails with [`NotFound`](crate::error::ErrorKind::NotFound) if the path
    /// is absent.
    async fn update(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Delete a file.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist. Never touches any other path.
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Get file metadata without reading contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn stat(&self, path: &Path) -> Result<FileInfo>;
}
