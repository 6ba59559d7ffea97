//! Batch runs over every configured mapping.

use crate::engine::Reconciler;
use crate::error::{ErrorKind, Result};
use crate::report::BatchReport;
use indexer_extract::SourceKind;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::instrument;

/// Held for the duration of a batch; clears the flag when dropped, whether
/// the batch finished, failed, or its future was dropped mid-way.
struct RunGuard<'a>(&'a AtomicBool);
impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).ok().map(|_| Self(flag))
    }
}
impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs the reconcilers of a batch one after another.
///
/// At most one batch runs at a time per `Indexer`; a second [`run`](Self::run)
/// while one is in flight fails with [`InProgress`](ErrorKind::InProgress)
/// instead of waiting.
pub struct Indexer {
    reconcilers: Vec<Reconciler>,
    running: AtomicBool,
}
impl Indexer {
    pub fn new(reconcilers: impl IntoIterator<Item = Reconciler>) -> Self {
        Self { reconcilers: reconcilers.into_iter().collect(), running: AtomicBool::new(false) }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run every mapping.
    pub async fn run(&self) -> Result<BatchReport> {
        self.run_kinds(&[]).await
    }

    /// Run the mappings whose converter handles one of `kinds`, in batch
    /// order. An empty slice selects every mapping.
    ///
    /// Mappings without a credential are skipped and a mapping failing with a
    /// non-fatal error is recorded as failed; both leave the rest of the batch
    /// running. A [`Fatal`](ErrorKind::Fatal) error ends the batch at once and
    /// is returned.
    #[instrument(skip_all, fields(mappings = self.reconcilers.len()))]
    pub async fn run_kinds(&self, kinds: &[SourceKind]) -> Result<BatchReport> {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            tracing::warn!("A conversion run is already in progress");
            exn::bail!(ErrorKind::InProgress);
        };

        let mut batch = BatchReport::default();
        let selected = self
            .reconcilers
            .iter()
            .filter(|reconciler| kinds.is_empty() || kinds.contains(&reconciler.converter().kind()));
        for reconciler in selected {
            let mapping = reconciler.mapping().to_string();
            if !reconciler.converter().has_credential() {
                tracing::warn!(%mapping, "No credential configured, skipping mapping");
                batch.skipped.push(mapping);
                continue;
            }
            match reconciler.run().await {
                Ok(report) => {
                    tracing::info!(
                        %mapping,
                        created = report.created.len(),
                        modified = report.modified.len(),
                        removed = report.removed.len(),
                        total = report.total_sources,
                        "\n{report}"
                    );
                    batch.reports.push(report);
                },
                Err(err) if err.is_fatal() => {
                    tracing::error!(%mapping, error = ?err, "Aborting batch, try again later");
                    return Err(err);
                },
                Err(err) => {
                    tracing::error!(%mapping, error = ?err, "Mapping failed");
                    batch.failed.push(mapping);
                },
            }
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::Mapping;
    use crate::store::IndexStore;
    use async_trait::async_trait;
    use indexer_extract::error::Result as ExtractResult;
    use indexer_extract::{Converter, Extractor};
    use indexer_storage::File;
    use indexer_storage::backend::MockBackend;
    use std::sync::Arc;

    /// Canvas extractor that gives up its turn before answering.
    struct Yielding;

    #[async_trait]
    impl Extractor for Yielding {
        fn kind(&self) -> SourceKind {
            SourceKind::Canvas
        }

        async fn extract(&self, _source: &File) -> ExtractResult<String> {
            tokio::task::yield_now().await;
            Ok("body".to_string())
        }
    }

    fn indexer(backend: Arc<MockBackend>) -> Indexer {
        let mapping = Mapping::for_kind("index", SourceKind::Canvas, None).unwrap();
        let converter = Converter::new(Arc::new(Yielding)).unwrap();
        Indexer::new([Reconciler::new(IndexStore::new(backend), mapping, converter)])
    }

    #[tokio::test]
    async fn test_concurrent_run_is_refused() {
        let backend = Arc::new(MockBackend::with_files([("Board.canvas", "{}")]));
        let indexer = indexer(backend);

        let (first, second) = tokio::join!(indexer.run(), indexer.run());
        assert_eq!(first.unwrap().reports[0].created, ["Board.canvas"]);
        assert!(matches!(&*second.unwrap_err(), ErrorKind::InProgress));
        assert!(!indexer.is_running());

        // The flag is released once the first batch ends.
        assert!(indexer.run().await.unwrap().reports[0].is_noop());
    }

    #[tokio::test]
    async fn test_kind_filter() {
        let backend = Arc::new(MockBackend::with_files([("Board.canvas", "{}")]));
        let indexer = indexer(backend);
        let batch = indexer.run_kinds(&[SourceKind::Pdf]).await.unwrap();
        assert!(batch.reports.is_empty());
        let batch = indexer.run_kinds(&[SourceKind::Canvas]).await.unwrap();
        assert_eq!(batch.reports.len(), 1);
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let flag = AtomicBool::new(false);
        let guard = RunGuard::acquire(&flag);
        assert!(guard.is_some());
        assert!(RunGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(RunGuard::acquire(&flag).is_some());
    }
}
