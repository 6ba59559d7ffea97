//! Classification of a store listing and the resulting reconciliation plan.
//!
//! Everything here is pure: it reads one immutable snapshot of the store and
//! decides what should happen, without touching the store.

use crate::mapping::Mapping;
use indexer_storage::File;
use std::collections::{HashMap, HashSet};

/// A store listing split into the two sets a [`Mapping`] cares about.
///
/// The sets never overlap: [`Mapping::new`] rejects target extensions that
/// end with the source extension. Everything else in the listing is dropped.
#[derive(Debug, Default)]
pub struct Inventory {
    pub sources: Vec<File>,
    pub converted: Vec<File>,
}
impl Inventory {
    pub fn partition(mapping: &Mapping, files: impl IntoIterator<Item = File>) -> Self {
        let mut inventory = Self::default();
        for file in files {
            if mapping.is_converted(&file) {
                inventory.converted.push(file);
            } else if mapping.is_source(&file) {
                inventory.sources.push(file);
            }
        }
        inventory
    }
}

/// What a run has to do: three disjoint sets of files.
#[derive(Debug, Default)]
pub struct Plan {
    /// Generated pages whose source is gone.
    pub orphans: Vec<File>,
    /// Sources without a generated page.
    pub missing: Vec<File>,
    /// Sources modified at or after their generated page.
    pub stale: Vec<File>,
}
impl Plan {
    pub fn new(mapping: &Mapping, inventory: &Inventory) -> Self {
        Self {
            orphans: orphans(mapping, inventory),
            missing: missing(mapping, inventory),
            stale: stale(mapping, inventory),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.orphans.is_empty() && self.missing.is_empty() && self.stale.is_empty()
    }
}

/// Generated pages keyed by the name of the source they belong to. When two
/// pages claim the same source name the one listed last wins.
fn converted_by_source<'a>(mapping: &Mapping, inventory: &'a Inventory) -> HashMap<String, &'a File> {
    inventory.converted.iter().map(|file| (mapping.source_name_of(&file.name), file)).collect()
}

pub fn orphans(mapping: &Mapping, inventory: &Inventory) -> Vec<File> {
    let sources: HashSet<&str> = inventory.sources.iter().map(|file| file.name.as_str()).collect();
    inventory
        .converted
        .iter()
        .filter(|file| !sources.contains(mapping.source_name_of(&file.name).as_str()))
        .cloned()
        .collect()
}

pub fn missing(mapping: &Mapping, inventory: &Inventory) -> Vec<File> {
    let converted = converted_by_source(mapping, inventory);
    inventory.sources.iter().filter(|file| !converted.contains_key(&file.name)).cloned().collect()
}

/// A tie in modification time counts as stale: reconverting is cheaper than
/// keeping a page that may predate its source.
pub fn stale(mapping: &Mapping, inventory: &Inventory) -> Vec<File> {
    let converted = converted_by_source(mapping, inventory);
    inventory
        .sources
        .iter()
        .filter(|file| converted.get(&file.name).is_some_and(|page| file.modified >= page.modified))
        .cloned()
        .collect()
}
