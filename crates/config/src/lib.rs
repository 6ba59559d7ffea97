//! Configuration for indexer.
//!
//! Settings are layered with `figment`, later layers winning:
//! 1. built-in defaults,
//! 2. `indexer.{toml,yaml,json}` in the platform config directory,
//! 3. an explicit file (format picked by extension, TOML otherwise),
//! 4. `INDEXER_*` environment variables, nested with `__`
//!    (`INDEXER_RETRY__ATTEMPTS=5`),
//! 5. `GOOGLE_API_KEY`, then `GEMINI_API_KEY`, for the service credential.
//!
//! A loaded [`Config`] has been validated and is not changed afterwards.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use indexer_extract::service::GeminiService;
use indexer_extract::{AttachmentOptions, DEFAULT_MAX_ATTACHMENT_MB, RetryPolicy, SourceKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "indexer";
pub const ENV_PREFIX: &str = "INDEXER_";
/// Checked in order; the last one set wins.
const CREDENTIAL_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

pub const DEFAULT_INDEX_FOLDER: &str = "index";
pub const DEFAULT_CANVAS_POSTFIX: &str = ".canvas.md";
pub const DEFAULT_MODEL: &str = GeminiService::DEFAULT_MODEL;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Calls per attachment before the content service is declared down.
    pub attempts: u32,
    /// Wait after the n-th failure is `base_delay_ms * n`.
    pub base_delay_ms: u64,
}
impl Default for RetryConfig {
    fn default() -> Self {
        Self { attempts: 3, base_delay_ms: 1000 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory of the notes vault.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Folder, relative to the root, holding the generated pages.
    pub index_folder: PathBuf,
    /// Run the batch when started without a command.
    pub run_on_start: bool,
    /// Target extension for canvas pages.
    pub canvas_postfix: String,
    /// Content service credential. Attachment kinds are skipped without one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub max_attachment_mb: u64,
    pub retry: RetryConfig,
    /// Conversions in flight at once within a mapping.
    pub concurrency: usize,
    /// Enabled source kinds.
    pub kinds: Vec<SourceKind>,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            index_folder: PathBuf::from(DEFAULT_INDEX_FOLDER),
            run_on_start: true,
            canvas_postfix: DEFAULT_CANVAS_POSTFIX.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_attachment_mb: DEFAULT_MAX_ATTACHMENT_MB,
            retry: RetryConfig::default(),
            concurrency: 1,
            kinds: SourceKind::ALL.to_vec(),
        }
    }
}

impl Config {
    /// Load and validate the layered configuration.
    ///
    /// # Errors
    ///
    /// [`Load`](ErrorKind::Load) if `explicit` does not exist or a source
    /// fails to parse, [`Invalid`](ErrorKind::Invalid) if the merged values
    /// are unusable.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::from_figment(&Self::figment(explicit)?)
    }

    /// The layered providers, without extracting anything.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(dirs) = ProjectDirs::from("", "", APP_NAME) {
            let dir = dirs.config_dir();
            tracing::debug!(dir = %dir.display(), "Looking for user configuration");
            figment = figment
                .merge(Toml::file_exact(dir.join(format!("{APP_NAME}.toml"))))
                .merge(Yaml::file_exact(dir.join(format!("{APP_NAME}.yaml"))))
                .merge(Json::file_exact(dir.join(format!("{APP_NAME}.json"))));
        }

        if let Some(path) = explicit {
            if !path.is_file() {
                exn::bail!(ErrorKind::Load);
            }
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
                Some("json") => figment.merge(Json::file_exact(path)),
                _ => figment.merge(Toml::file_exact(path)),
            };
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        for var in CREDENTIAL_VARS {
            figment = figment.merge(Env::raw().only(&[var]).map(|_| "api_key".into()));
        }
        Ok(figment)
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()
    }

    /// Check and normalize: the index folder is made canonical, blank
    /// credentials are dropped and kinds are put in batch order.
    pub fn validate(mut self) -> Result<Self> {
        self.index_folder = indexer_storage::validate_path(&self.index_folder)
            .or_raise(|| ErrorKind::Invalid(format!("index folder `{}`", self.index_folder.display())))?;
        // Hidden folders are never listed, so their pages would look missing on every run.
        if self.index_folder.iter().any(|part| part.to_string_lossy().starts_with('.')) {
            exn::bail!(ErrorKind::Invalid(format!(
                "index folder `{}` must not be hidden",
                self.index_folder.display()
            )));
        }
        if self.canvas_postfix.is_empty() || self.canvas_postfix == SourceKind::Canvas.source_extension() {
            exn::bail!(ErrorKind::Invalid(format!(
                "canvas postfix `{}` must differ from `.canvas`",
                self.canvas_postfix
            )));
        }
        if self.model.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("model must not be empty".to_string()));
        }
        if self.retry.attempts == 0 {
            exn::bail!(ErrorKind::Invalid("retry.attempts must be at least 1".to_string()));
        }
        if self.concurrency == 0 {
            exn::bail!(ErrorKind::Invalid("concurrency must be at least 1".to_string()));
        }
        self.api_key = self.api_key.filter(|key| !key.trim().is_empty());
        self.kinds.sort();
        self.kinds.dedup();
        Ok(self)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy { attempts: self.retry.attempts, base_delay: Duration::from_millis(self.retry.base_delay_ms) }
    }

    pub fn attachment_options(&self) -> AttachmentOptions {
        AttachmentOptions { max_size_mb: self.max_attachment_mb, retry: self.retry_policy() }
    }

    /// Target extension override for `kind`, if any.
    pub fn target_extension(&self, kind: SourceKind) -> Option<&str> {
        match kind {
            SourceKind::Canvas => Some(self.canvas_postfix.as_str()),
            _ => None,
        }
    }
}
