//! Content store gateway for indexer.
//!
//! A store is any hierarchical collection of files (a notes vault on disk, an
//! in-memory map in tests). Everything above this crate talks to it through
//! the [`StorageBackend`] trait and the [`File`] snapshots it produces.

pub mod backend;
pub mod error;
pub mod file;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::file::{File, FileInfo};
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
