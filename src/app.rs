//! Wiring from configuration to a ready [`Indexer`].

use derive_more::{Display, Error};
use exn::ResultExt;
use indexer_config::Config;
use indexer_extract::service::{ContentService, GeminiService};
use indexer_extract::{Converter, SourceKind};
use indexer_storage::BackendHandle;
use indexer_storage::backend::{LocalBackend, ReadOnlyBackend};
use indexer_sync::{IndexStore, Indexer, Mapping, Reconciler};
use std::path::Path;
use std::sync::Arc;

pub type Result<T> = std::result::Result<T, exn::Exn<ErrorKind>>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("no vault root configured: set `root` or pass --root")]
    MissingRoot,
    #[display("could not open vault at {}", _0.display())]
    Store(#[error(not(source))] std::path::PathBuf),
    #[display("could not set up the {_0} mapping")]
    Mapping(#[error(not(source))] SourceKind),
}

/// Load the configuration, with `--root` taking precedence over every layer.
pub fn load_config(explicit: Option<&Path>, root: Option<&Path>) -> Result<Config> {
    let mut config = Config::load(explicit).or_raise(|| ErrorKind::Config)?;
    if let Some(root) = root {
        config.root = Some(root.to_path_buf());
    }
    Ok(config)
}

/// The vault backend, wrapped read-only for a dry run.
pub fn backend(config: &Config, dry_run: bool) -> Result<BackendHandle> {
    let root = config.root.as_deref().ok_or_else(|| exn::Exn::from(ErrorKind::MissingRoot))?;
    let root = std::path::absolute(root).or_raise(|| ErrorKind::Store(root.to_path_buf()))?;
    let local: BackendHandle =
        Arc::new(LocalBackend::new("vault", &root).or_raise(|| ErrorKind::Store(root.clone()))?);
    if dry_run {
        let read_only: BackendHandle = Arc::new(ReadOnlyBackend::new(local));
        return Ok(read_only);
    }
    Ok(local)
}

/// The content service shared by every attachment mapping.
pub fn service(config: &Config) -> Arc<dyn ContentService> {
    Arc::new(GeminiService::new(config.api_key.clone()).with_model(&config.model))
}

/// One reconciler per configured kind, in batch order.
pub fn reconcilers(config: &Config, backend: BackendHandle, service: Arc<dyn ContentService>) -> Result<Vec<Reconciler>> {
    let store = IndexStore::new(backend);
    config
        .kinds
        .iter()
        .map(|&kind| -> Result<Reconciler> {
            let mapping = Mapping::for_kind(&config.index_folder, kind, config.target_extension(kind))
                .or_raise(|| ErrorKind::Mapping(kind))?;
            let converter = Converter::for_kind(kind, service.clone(), config.attachment_options())
                .or_raise(|| ErrorKind::Mapping(kind))?;
            Ok(Reconciler::new(store.clone(), mapping, converter).with_concurrency(config.concurrency))
        })
        .collect()
}

pub fn indexer(config: &Config, dry_run: bool) -> Result<Indexer> {
    let backend = backend(config, dry_run)?;
    Ok(Indexer::new(reconcilers(config, backend, service(config))?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexer_extract::CANVAS_INDEX_MARKER;
    use std::fs;
    use tempfile::TempDir;

    fn config(root: &Path) -> Config {
        Config { root: Some(root.to_path_buf()), api_key: None, ..Config::default() }
    }

    #[tokio::test]
    async fn test_canvas_runs_without_credential() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Board.canvas"), r#"{"nodes":[{"type":"text","text":"hello"}]}"#).unwrap();
        fs::write(dir.path().join("scan.pdf"), "%PDF").unwrap();

        let batch = indexer(&config(dir.path()), false).unwrap().run().await.unwrap();
        assert_eq!(batch.reports.len(), 1);
        assert_eq!(batch.skipped.len(), 4);
        let page = fs::read_to_string(dir.path().join("index/Board.canvas.md")).unwrap();
        assert!(page.contains(CANVAS_INDEX_MARKER));
        assert!(!dir.path().join("index/scan.pdf.md").exists());
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Board.canvas"), "{}").unwrap();

        let batch = indexer(&config(dir.path()), true).unwrap().run().await.unwrap();
        assert_eq!(batch.reports[0].created, ["Board.canvas"]);
        assert!(!dir.path().join("index").exists());
    }

    #[test]
    fn test_missing_root() {
        let Err(err) = backend(&Config::default(), false) else {
            panic!("a backend without a root");
        };
        assert!(matches!(&*err, ErrorKind::MissingRoot));
    }

    #[test]
    fn test_canvas_postfix_is_applied() {
        let dir = TempDir::new().unwrap();
        let config = Config { canvas_postfix: ".md".to_string(), kinds: vec![SourceKind::Canvas], ..config(dir.path()) };
        let backend = backend(&config, false).unwrap();
        let reconcilers = reconcilers(&config, backend, service(&config)).unwrap();
        assert_eq!(reconcilers.len(), 1);
        assert_eq!(reconcilers[0].mapping().target_extension(), ".md");
    }
}
