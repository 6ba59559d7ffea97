//! In-memory storage backend for testing.

use super::FileInfoStream;
use crate::error::{ErrorKind, Result};
use crate::file::FileInfo;
use crate::path::validate as validate_path;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use time::{Duration, UtcDateTime};
use tokio::sync::RwLock;

use crate::StorageBackend;

#[derive(Default)]
struct State {
    files: HashMap<PathBuf, (UtcDateTime, Vec<u8>)>,
    folders: HashSet<PathBuf>,
    denied: HashSet<PathBuf>,
    tick: i64,
}
impl State {
    /// Every mutation gets a strictly later timestamp than the one before, so
    /// "modified after" comparisons never tie by accident.
    fn next_timestamp(&mut self, epoch: UtcDateTime) -> UtcDateTime {
        self.tick += 1;
        epoch + Duration::seconds(self.tick)
    }

    fn add_ancestors(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if !ancestor.as_os_str().is_empty() {
                self.folders.insert(ancestor.to_path_buf());
            }
        }
    }

    fn check_denied(&self, path: &Path) -> Result<()> {
        match self.denied.contains(path) {
            true => exn::bail!(ErrorKind::PermissionDenied(path.to_path_buf())),
            false => Ok(()),
        }
    }
}

/// In-memory storage backend for testing.
///
/// Files and folders are stored behind a [`RwLock`], so all trait methods can
/// operate on `&self` without external synchronisation. Timestamps come from
/// a logical clock: each write moves it forward by one second.
pub struct MockBackend {
    name: String,
    epoch: UtcDateTime,
    state: RwLock<State>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let epoch = UtcDateTime::now();
        let mut state = State::default();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                panic!("MockBackend::with_files: invalid path {}", path.display());
            };
            let modified = state.next_timestamp(epoch);
            state.add_ancestors(&validated);
            state.files.insert(validated, (modified, data.into()));
        }
        Self {
            name: "mock".to_string(),
            epoch,
            state: RwLock::new(state),
        }
    }

    /// Insert or overwrite a file regardless of create/update rules, stamping
    /// it with the next clock tick.
    pub async fn put(&self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) -> Result<()> {
        let path = validate_path(path)?;
        let mut state = self.state.write().await;
        let modified = state.next_timestamp(self.epoch);
        state.add_ancestors(&path);
        state.files.insert(path, (modified, data.into()));
        Ok(())
    }

    /// Bump a file's modification time to the next clock tick without
    /// touching its contents.
    pub async fn touch(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = validate_path(path)?;
        let mut state = self.state.write().await;
        let modified = state.next_timestamp(self.epoch);
        let (timestamp, _) = state.files.get_mut(&path).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.clone())))?;
        *timestamp = modified;
        Ok(())
    }

    /// Force a file's modification time.
    pub async fn set_modified(&self, path: impl AsRef<Path>, modified: UtcDateTime) -> Result<()> {
        let path = validate_path(path)?;
        let mut state = self.state.write().await;
        let (timestamp, _) = state.files.get_mut(&path).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.clone())))?;
        *timestamp = modified;
        Ok(())
    }

    /// Make every create, update and delete of `path` fail with
    /// [`PermissionDenied`](ErrorKind::PermissionDenied).
    pub async fn deny(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = validate_path(path)?;
        self.state.write().await.denied.insert(path);
        Ok(())
    }

    /// Every file path currently stored, sorted.
    pub async fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.state.read().await.files.keys().cloned().collect();
        paths.sort();
        paths
    }

    fn file_info(path: &Path, size: u64, modified: UtcDateTime) -> FileInfo {
        FileInfo::new(path, size, modified)
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        let validated_prefix = match prefix.map(validate_path).transpose() {
            Ok(pfx) => pfx,
            Err(e) => return Box::pin(futures::stream::once(async { Err(e) })),
        };

        Box::pin(stream! {
            // Snapshot under the read lock and drop it before yielding.
            let entries: Vec<(PathBuf, UtcDateTime, u64)> = {
                let guard = self.state.read().await;
                guard
                    .files
                    .iter()
                    .filter(|(path, _)| validated_prefix.as_ref().is_none_or(|pfx| path.starts_with(pfx)))
                    .map(|(path, (modified, data))| (path.clone(), *modified, data.len() as u64))
                    .collect()
            };
            for (path, modified, size) in entries {
                yield Ok(Self::file_info(&path, size, modified));
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = validate_path(path)?;
        let state = self.state.read().await;
        Ok(state.files.contains_key(&path) || state.folders.contains(&path))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        let (_modified, data) =
            self.state.read().await.files.get(&path).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))?;
        Ok(data)
    }

    async fn create_folder(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        let mut state = self.state.write().await;
        if path.ancestors().any(|ancestor| state.files.contains_key(ancestor)) {
            exn::bail!(ErrorKind::InvalidPath(path));
        }
        state.add_ancestors(&path);
        state.folders.insert(path);
        Ok(())
    }

    async fn create(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        let mut state = self.state.write().await;
        state.check_denied(&path)?;
        if state.files.contains_key(&path) || state.folders.contains(&path) {
            exn::bail!(ErrorKind::AlreadyExists(path));
        }
        let modified = state.next_timestamp(self.epoch);
        state.add_ancestors(&path);
        state.files.insert(path, (modified, data.to_vec()));
        Ok(())
    }

    async fn update(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        let mut state = self.state.write().await;
        state.check_denied(&path)?;
        if !state.files.contains_key(&path) {
            exn::bail!(ErrorKind::NotFound(path));
        }
        let modified = state.next_timestamp(self.epoch);
        state.files.insert(path, (modified, data.to_vec()));
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        let mut state = self.state.write().await;
        state.check_denied(&path)?;
        state.files.remove(&path).map(|_| ()).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        let path = validate_path(path)?;
        let guard = self.state.read().await;
        let (modified, data) =
            guard.files.get(&path).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path.clone())))?;
        Ok(Self::file_info(&path, data.len() as u64, *modified))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_read() {
        let backend = MockBackend::default();
        backend.create(Path::new("index/a.png.md"), b"hello").await.unwrap();
        assert_eq!(backend.read(Path::new("index/a.png.md")).await.unwrap(), b"hello");
        assert!(backend.exists(Path::new("index")).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_existing_fails() {
        let backend = MockBackend::with_files([("a.md", "one")]);
        let err = backend.create(Path::new("a.md"), b"two").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyExists(_)));
        assert_eq!(backend.read(Path::new("a.md")).await.unwrap(), b"one");
    }

    #[tokio::test]
    async fn test_update_missing_fails() {
        let backend = MockBackend::default();
        let err = backend.update(Path::new("a.md"), b"data").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        assert!(backend.paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_writes_advance_clock() {
        let backend = MockBackend::with_files([("a.png", "png")]);
        let source = backend.stat(Path::new("a.png")).await.unwrap();
        backend.create(Path::new("index/a.png.md"), b"md").await.unwrap();
        let converted = backend.stat(Path::new("index/a.png.md")).await.unwrap();
        assert!(converted.modified > source.modified);

        backend.touch("a.png").await.unwrap();
        let touched = backend.stat(Path::new("a.png")).await.unwrap();
        assert!(touched.modified > converted.modified);

        backend.update(Path::new("index/a.png.md"), b"md2").await.unwrap();
        let updated = backend.stat(Path::new("index/a.png.md")).await.unwrap();
        assert!(updated.modified > touched.modified);
    }

    #[tokio::test]
    async fn test_set_modified() {
        let backend = MockBackend::with_files([("a.png", "png")]);
        let when = UtcDateTime::now() + Duration::days(1);
        backend.set_modified("a.png", when).await.unwrap();
        assert_eq!(backend.stat(Path::new("a.png")).await.unwrap().modified, when);
        assert!(backend.set_modified("b.png", when).await.is_err());
    }

    #[tokio::test]
    async fn test_create_folder() {
        let backend = MockBackend::with_files([("notes.md", "text")]);
        backend.create_folder(Path::new("index")).await.unwrap();
        backend.create_folder(Path::new("index")).await.unwrap();
        assert!(backend.exists(Path::new("index")).await.unwrap());
        assert!(backend.list(None).await.unwrap().iter().all(|f| f.path != Path::new("index")));

        let err = backend.create_folder(Path::new("notes.md")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
        let err = backend.create_folder(Path::new("notes.md/sub")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_deny() {
        let backend = MockBackend::with_files([("index/a.png.md", "md")]);
        backend.deny("index/a.png.md").await.unwrap();
        let err = backend.delete(Path::new("index/a.png.md")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::PermissionDenied(_)));
        assert!(backend.update(Path::new("index/a.png.md"), b"x").await.is_err());
        assert_eq!(backend.read(Path::new("index/a.png.md")).await.unwrap(), b"md");
    }

    #[tokio::test]
    async fn test_delete() {
        let backend = MockBackend::with_files([("file.md", "data")]);
        backend.delete(Path::new("file.md")).await.unwrap();
        assert!(!backend.exists(Path::new("file.md")).await.unwrap());
        let err = backend.delete(Path::new("file.md")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_stat() {
        let backend = MockBackend::with_files([("scans/report.pdf", "12345")]);
        let info = backend.stat(Path::new("scans/report.pdf")).await.unwrap();
        assert_eq!(info.path, PathBuf::from("scans/report.pdf"));
        assert_eq!(info.name, "report.pdf");
        assert_eq!(info.size, 5);
    }

    #[tokio::test]
    async fn test_list_with_prefix() {
        let backend = MockBackend::with_files([
            ("index/a.png.md", "a"),
            ("index/b.png.md", "b"),
            ("photos/c.png", "c"),
        ]);
        let files = backend.list(Some(Path::new("index"))).await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(backend.list(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let backend = MockBackend::default();
        assert!(backend.read(Path::new("../etc/passwd")).await.is_err());
        assert!(backend.create(Path::new("../escape"), b"bad").await.is_err());
        assert!(backend.create_folder(Path::new("../escape")).await.is_err());
    }

    #[test]
    #[should_panic(expected = "invalid path")]
    fn test_with_files_panics_on_bad_path() {
        MockBackend::with_files([("../escape", "bad")]);
    }
}
