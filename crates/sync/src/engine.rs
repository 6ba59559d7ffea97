//! The reconciliation engine for a single mapping.
//!
//! One [`Reconciler::run`] walks through:
//! 1. make sure the index folder exists,
//! 2. list the store once and split the listing ([`Inventory`]),
//! 3. compute the [`Plan`],
//! 4. delete orphans and convert missing/stale sources side by side,
//! 5. return a [`Report`].
//!
//! Per-file failures are logged and left out of the report. A fatal
//! extractor failure stops the run: no further conversions are started, those
//! already in flight are allowed to finish their writes, and the error is
//! returned to the caller.

use crate::error::{ErrorKind, Result};
use crate::mapping::Mapping;
use crate::plan::{Inventory, Plan};
use crate::report::Report;
use crate::store::IndexStore;
use exn::ResultExt;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use indexer_extract::Converter;
use indexer_storage::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Create,
    Update,
}

/// Keeps the generated pages of one [`Mapping`] in step with their sources.
#[derive(Clone)]
pub struct Reconciler {
    store: IndexStore,
    mapping: Mapping,
    converter: Converter,
    concurrency: usize,
}
impl Reconciler {
    pub fn new(store: IndexStore, mapping: Mapping, converter: Converter) -> Self {
        Self { store, mapping, converter, concurrency: 1 }
    }

    /// Maximum number of conversions in flight at once (at least one).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    #[instrument(skip_all, fields(mapping = %self.mapping))]
    pub async fn run(&self) -> Result<Report> {
        self.store.ensure_folder(self.mapping.index_folder()).await?;
        let inventory = Inventory::partition(&self.mapping, self.store.files().await?);
        let plan = Plan::new(&self.mapping, &inventory);
        tracing::debug!(
            sources = inventory.sources.len(),
            converted = inventory.converted.len(),
            orphans = plan.orphans.len(),
            missing = plan.missing.len(),
            stale = plan.stale.len(),
            "Planned reconciliation"
        );

        let (removed, converted) = futures::join!(self.remove_orphans(&plan.orphans), self.convert_all(&plan));
        let (created, modified) = converted?;

        Ok(Report {
            mapping: self.mapping.to_string(),
            source_extension: self.mapping.source_extension().to_string(),
            target_extension: self.mapping.target_extension().to_string(),
            index_folder: self.mapping.index_folder().to_path_buf(),
            created,
            modified,
            removed,
            total_sources: inventory.sources.len(),
        })
    }

    /// Guarded delete of every orphan, all at once. Failures are logged and
    /// excluded from the result.
    async fn remove_orphans(&self, orphans: &[File]) -> Vec<PathBuf> {
        let results = join_all(orphans.iter().map(|page| async move {
            let result = self.store.delete_generated(page.path()).await;
            (page, result)
        }))
        .await;

        let mut removed = Vec::with_capacity(results.len());
        for (page, result) in results {
            match result {
                Ok(()) => removed.push(page.path().to_path_buf()),
                Err(err) if matches!(&*err, ErrorKind::NotAGeneratedFile(_)) => {
                    tracing::warn!(path = %page.path().display(), mapping = %self.mapping, "Not a generated page, leaving it alone");
                },
                Err(err) => {
                    tracing::error!(path = %page.path().display(), mapping = %self.mapping, error = ?err, "Failed to remove orphaned page");
                },
            }
        }
        removed
    }

    /// Convert missing sources, then stale ones, with bounded concurrency.
    /// Returns the names of created and modified sources.
    ///
    /// After a fatal failure no new conversion is started, but the stream is
    /// drained: dropping a conversion mid-write could leave a truncated page
    /// that looks newer than its source and would never be regenerated.
    async fn convert_all(&self, plan: &Plan) -> Result<(Vec<String>, Vec<String>)> {
        let aborted = AtomicBool::new(false);
        let jobs = plan
            .missing
            .iter()
            .map(|source| (Action::Create, source))
            .chain(plan.stale.iter().map(|source| (Action::Update, source)));
        let mut results = stream::iter(jobs)
            .take_while(|_| futures::future::ready(!aborted.load(Ordering::Acquire)))
            .map(|(action, source)| async move { (action, source, self.convert(source).await) })
            .buffer_unordered(self.concurrency);

        let mut created = Vec::new();
        let mut modified = Vec::new();
        let mut fatal = None;
        while let Some((action, source, result)) = results.next().await {
            match result {
                Ok(()) if action == Action::Create => created.push(source.name.clone()),
                Ok(()) => modified.push(source.name.clone()),
                Err(err) if err.is_fatal() => {
                    if fatal.is_none() {
                        tracing::error!(path = %source.path().display(), mapping = %self.mapping, "Content service unavailable, aborting run");
                        aborted.store(true, Ordering::Release);
                        fatal = Some(err);
                    }
                },
                Err(err) => {
                    tracing::error!(
                        path = %source.path().display(),
                        size_mb = source.size_in_mb(),
                        mapping = %self.mapping,
                        error = ?err,
                        "Failed to convert file"
                    );
                },
            }
        }
        match fatal {
            Some(err) => Err(err),
            None => Ok((created, modified)),
        }
    }

    async fn convert(&self, source: &File) -> Result<()> {
        let page = match self.converter.convert(source).await {
            Ok(page) => page,
            Err(err) => {
                let kind = if err.is_fatal() { ErrorKind::Fatal } else { ErrorKind::Conversion };
                return Err(err).or_raise(|| kind);
            },
        };
        let target = self.mapping.target_path(&source.name);
        self.store.create_or_update(&target, &page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexer_extract::service::MockService;
    use indexer_extract::service::error::ErrorKind as ServiceErrorKind;
    use indexer_extract::{AttachmentOptions, IMAGE_INDEX_MARKER, RetryPolicy, SourceKind};
    use indexer_storage::backend::{FileInfoStream, MockBackend};
    use indexer_storage::error::Result as StorageResult;
    use indexer_storage::{FileInfo, StorageBackend};
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    fn options() -> AttachmentOptions {
        AttachmentOptions { retry: RetryPolicy { attempts: 2, base_delay: Duration::ZERO }, ..Default::default() }
    }

    fn reconciler(backend: &Arc<MockBackend>, kind: SourceKind, service: &Arc<MockService>) -> Reconciler {
        let converter = Converter::for_kind(kind, service.clone(), options()).unwrap();
        let mapping = Mapping::for_kind("index", kind, None).unwrap();
        Reconciler::new(IndexStore::new(backend.clone()), mapping, converter)
    }

    #[tokio::test]
    async fn test_creates_missing_pages() {
        let backend = Arc::new(MockBackend::with_files([("a.png", "png"), ("photos/b.png", "png")]));
        let service = Arc::new(MockService::answering("An image."));
        let report = reconciler(&backend, SourceKind::Png, &service).run().await.unwrap();

        let mut created = report.created.clone();
        created.sort();
        assert_eq!(created, ["a.png", "b.png"]);
        assert_eq!(report.total_sources, 2);
        assert!(backend.read_text(Path::new("index/b.png.md")).await.unwrap().contains("An image."));
    }

    #[tokio::test]
    async fn test_second_run_is_noop() {
        let backend = Arc::new(MockBackend::with_files([("a.png", "png")]));
        let service = Arc::new(MockService::answering("An image."));
        let reconciler = reconciler(&backend, SourceKind::Png, &service);
        reconciler.run().await.unwrap();
        let report = reconciler.run().await.unwrap();
        assert!(report.is_noop());
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_touched_source_is_regenerated() {
        let backend = Arc::new(MockBackend::with_files([("a.png", "png")]));
        let service = Arc::new(MockService::answering("v2").then_script([Ok("v1".to_string())]));
        let reconciler = reconciler(&backend, SourceKind::Png, &service);
        reconciler.run().await.unwrap();
        backend.touch("a.png").await.unwrap();

        let report = reconciler.run().await.unwrap();
        assert_eq!(report.modified, ["a.png"]);
        assert!(report.created.is_empty());
        assert!(backend.read_text(Path::new("index/a.png.md")).await.unwrap().contains("v2"));
    }

    #[tokio::test]
    async fn test_per_file_failure_is_isolated() {
        // Invalid UTF-8 makes the canvas unreadable as text.
        let backend = Arc::new(MockBackend::with_files([
            ("Good.canvas", b"{}".to_vec()),
            ("Broken.canvas", vec![0xff, 0xfe, 0xfd]),
        ]));
        let service = Arc::new(MockService::answering("unused"));
        let report = reconciler(&backend, SourceKind::Canvas, &service).run().await.unwrap();
        assert_eq!(report.created, ["Good.canvas"]);
        assert_eq!(report.total_sources, 2);
        assert!(!backend.exists(Path::new("index/Broken.canvas.md")).await.unwrap());
    }

    #[tokio::test]
    async fn test_fatal_aborts_run() {
        let backend = Arc::new(MockBackend::with_files([("a.png", "png"), ("b.png", "png")]));
        let service = Arc::new(MockService::failing(ServiceErrorKind::Unavailable("down".into())));
        let err = reconciler(&backend, SourceKind::Png, &service).run().await.unwrap_err();
        assert!(err.is_fatal());
        // Concurrency of one: the second file is never started.
        assert_eq!(service.calls(), 2);
        assert_eq!(backend.paths().await.len(), 2);
    }

    /// Creates pages in two steps (empty file, then content) with a yield in
    /// between, like a filesystem `create_new` followed by a write.
    struct TwoStepCreate(Arc<MockBackend>);

    #[async_trait::async_trait]
    impl StorageBackend for TwoStepCreate {
        fn name(&self) -> &str {
            self.0.name()
        }

        fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
            self.0.list_stream(prefix)
        }

        async fn exists(&self, path: &Path) -> StorageResult<bool> {
            self.0.exists(path).await
        }

        async fn read(&self, path: &Path) -> StorageResult<Vec<u8>> {
            self.0.read(path).await
        }

        async fn create_folder(&self, path: &Path) -> StorageResult<()> {
            self.0.create_folder(path).await
        }

        async fn create(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
            self.0.create(path, b"").await?;
            for _ in 0..4 {
                tokio::task::yield_now().await;
            }
            self.0.update(path, data).await
        }

        async fn update(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
            self.0.update(path, data).await
        }

        async fn delete(&self, path: &Path) -> StorageResult<()> {
            self.0.delete(path).await
        }

        async fn stat(&self, path: &Path) -> StorageResult<FileInfo> {
            self.0.stat(path).await
        }
    }

    #[tokio::test]
    async fn test_fatal_lets_in_flight_writes_finish() {
        let inner = Arc::new(MockBackend::with_files([("a.png", "png"), ("b.png", "png")]));
        let service = Arc::new(
            MockService::failing(ServiceErrorKind::Unavailable("down".into())).then_script([Ok("An image.".to_string())]),
        );
        let options = AttachmentOptions { retry: RetryPolicy { attempts: 1, base_delay: Duration::ZERO }, ..Default::default() };
        let converter = Converter::for_kind(SourceKind::Png, service.clone(), options).unwrap();
        let mapping = Mapping::for_kind("index", SourceKind::Png, None).unwrap();
        let reconciler = Reconciler::new(IndexStore::new(Arc::new(TwoStepCreate(inner.clone()))), mapping, converter)
            .with_concurrency(2);

        let err = reconciler.run().await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(service.calls(), 2);

        // The conversion that succeeded wrote its whole page, not an empty one.
        let pages: Vec<_> = inner.paths().await.into_iter().filter(|path| path.starts_with("index")).collect();
        assert_eq!(pages.len(), 1);
        let page = inner.read_text(&pages[0]).await.unwrap();
        assert!(page.contains(IMAGE_INDEX_MARKER));
        assert!(page.contains("An image."));
    }

    #[tokio::test]
    async fn test_orphans_removed_and_guarded() {
        let backend = Arc::new(MockBackend::with_files([("a.png", "png")]));
        let service = Arc::new(MockService::answering("An image."));
        let reconciler = reconciler(&backend, SourceKind::Png, &service);
        reconciler.run().await.unwrap();

        backend.delete(Path::new("a.png")).await.unwrap();
        backend.put("index/mine.png.md", "hand written").await.unwrap();
        let report = reconciler.run().await.unwrap();
        assert_eq!(report.removed, [PathBuf::from("index/a.png.md")]);
        assert_eq!(backend.paths().await, [PathBuf::from("index/mine.png.md")]);
    }

    #[tokio::test]
    async fn test_blocked_index_folder_is_storage_error() {
        let backend = Arc::new(MockBackend::with_files([("index", "a file where the folder should be")]));
        let service = Arc::new(MockService::answering("unused"));
        let err = reconciler(&backend, SourceKind::Png, &service).run().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Storage));
        assert!(!err.is_fatal());
    }
}
