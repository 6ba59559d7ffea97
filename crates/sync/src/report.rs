use std::fmt;
use std::path::{Path, PathBuf};

/// Outcome of one reconciliation run.
///
/// Only successes are listed; files that failed were logged and left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Label of the mapping (see [`Mapping`](crate::Mapping)'s `Display`).
    pub mapping: String,
    pub source_extension: String,
    pub target_extension: String,
    pub index_folder: PathBuf,
    /// Names of sources whose page was created.
    pub created: Vec<String>,
    /// Names of sources whose page was regenerated.
    pub modified: Vec<String>,
    /// Paths of orphaned pages that were deleted.
    pub removed: Vec<PathBuf>,
    /// Number of sources found in the listing.
    pub total_sources: usize,
}
impl Report {
    pub fn processed(&self) -> usize {
        self.created.len() + self.modified.len() + self.removed.len()
    }

    pub fn is_noop(&self) -> bool {
        self.processed() == 0
    }

    fn short_source<'a>(&self, name: &'a str) -> &'a str {
        name.strip_suffix(self.source_extension.as_str()).unwrap_or(name)
    }

    fn short_removed(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.index_folder).unwrap_or(path);
        let relative = relative.to_string_lossy();
        relative.strip_suffix(self.target_extension.as_str()).unwrap_or(&relative).to_string()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Conversion of {} completed", self.mapping)?;
        writeln!(f, "Total files processed {}/{}", self.processed(), self.total_sources)?;
        writeln!(f, "Created files {}", self.created.len())?;
        for name in &self.created {
            writeln!(f, "  - {}", self.short_source(name))?;
        }
        writeln!(f, "Modified files {}", self.modified.len())?;
        for name in &self.modified {
            writeln!(f, "  - {}", self.short_source(name))?;
        }
        write!(f, "Deleted files {}", self.removed.len())?;
        for path in &self.removed {
            write!(f, "\n  - {}", self.short_removed(path))?;
        }
        Ok(())
    }
}

/// Outcome of a whole batch: one [`Report`] per mapping that ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub reports: Vec<Report>,
    /// Mappings skipped because their extractor has no credential.
    pub skipped: Vec<String>,
    /// Mappings that failed with a non-fatal error (listing, folder creation).
    pub failed: Vec<String>,
}
impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, report) in self.reports.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{report}")?;
        }
        for mapping in &self.skipped {
            writeln!(f, "Skipped {mapping}: no credential configured")?;
        }
        for mapping in &self.failed {
            writeln!(f, "Failed {mapping}: see log for details")?;
        }
        Ok(())
    }
}
