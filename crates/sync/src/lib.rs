//! Reconciliation of sources with their generated index pages.
//!
//! For each [`Mapping`] a [`Reconciler`] lists the store once, works out which
//! pages are missing, stale or orphaned ([`Plan`]), and brings the index folder
//! back in step. [`Indexer`] runs a batch of mappings and makes sure only one
//! batch is ever in flight.

mod engine;
pub mod error;
mod mapping;
mod orchestrator;
mod plan;
mod report;
mod store;

pub use crate::engine::Reconciler;
pub use crate::mapping::Mapping;
pub use crate::orchestrator::Indexer;
pub use crate::plan::{Inventory, Plan, missing, orphans, stale};
pub use crate::report::{BatchReport, Report};
pub use crate::store::IndexStore;
