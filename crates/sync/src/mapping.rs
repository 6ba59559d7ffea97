//! Source to index page naming.
//!
//! A [`Mapping`] ties one source extension to one target extension inside an
//! index folder. Sources and generated pages are matched by file name alone:
//! `photos/Foo.png` corresponds to `index/Foo.png.md` no matter which folder
//! the source lives in.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use indexer_extract::SourceKind;
use indexer_storage::{FileInfo, validate_path};
use std::fmt;
use std::path::{Path, PathBuf};

/// One (source extension, target extension) pair and the folder the
/// generated pages live in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    index_folder: PathBuf,
    source_extension: String,
    target_extension: String,
}
impl Mapping {
    /// # Errors
    ///
    /// [`InvalidMapping`](ErrorKind::InvalidMapping) if the index folder is
    /// not a valid store path, either extension is empty, the extensions are
    /// equal, or generated pages would themselves look like sources.
    pub fn new(
        index_folder: impl AsRef<Path>,
        source_extension: impl Into<String>,
        target_extension: impl Into<String>,
    ) -> Result<Self> {
        let index_folder = index_folder.as_ref();
        let index_folder = validate_path(index_folder)
            .or_raise(|| ErrorKind::InvalidMapping(format!("index folder `{}`", index_folder.display())))?;
        let source_extension = source_extension.into();
        let target_extension = target_extension.into();
        if source_extension.is_empty() || target_extension.is_empty() {
            exn::bail!(ErrorKind::InvalidMapping("extensions must not be empty".to_string()));
        }
        if source_extension == target_extension {
            exn::bail!(ErrorKind::InvalidMapping(format!(
                "target extension `{target_extension}` equals the source extension"
            )));
        }
        if target_extension.ends_with(&source_extension) {
            exn::bail!(ErrorKind::InvalidMapping(format!(
                "target extension `{target_extension}` would be picked up as a `{source_extension}` source"
            )));
        }
        Ok(Self { index_folder, source_extension, target_extension })
    }

    /// Mapping for a [`SourceKind`], with an optional override of its target
    /// extension.
    pub fn for_kind(index_folder: impl AsRef<Path>, kind: SourceKind, target_extension: Option<&str>) -> Result<Self> {
        let target = target_extension.unwrap_or(kind.default_target_extension());
        Self::new(index_folder, kind.source_extension(), target)
    }

    pub fn index_folder(&self) -> &Path {
        &self.index_folder
    }

    pub fn source_extension(&self) -> &str {
        &self.source_extension
    }

    pub fn target_extension(&self) -> &str {
        &self.target_extension
    }

    /// Any file whose path ends with the source extension, wherever it lives.
    pub fn is_source(&self, file: &FileInfo) -> bool {
        file.path_str().ends_with(&self.source_extension)
    }

    /// Files inside the index folder ending with the target extension.
    pub fn is_converted(&self, file: &FileInfo) -> bool {
        file.path.starts_with(&self.index_folder) && file.path_str().ends_with(&self.target_extension)
    }

    /// Where the page for a source named `source_name` is written.
    pub fn target_path(&self, source_name: &str) -> PathBuf {
        let base = source_name.strip_suffix(self.source_extension.as_str()).unwrap_or(source_name);
        self.index_folder.join(format!("{base}{}", self.target_extension))
    }

    /// Name of the source a generated page named `converted_name` belongs to.
    pub fn source_name_of(&self, converted_name: &str) -> String {
        let base = converted_name.strip_suffix(self.target_extension.as_str()).unwrap_or(converted_name);
        format!("{base}{}", self.source_extension)
    }
}
impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}/*{}", self.source_extension, self.index_folder.display(), self.target_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::UtcDateTime;

    fn info(path: &str) -> FileInfo {
        FileInfo::new(path, 0, UtcDateTime::now())
    }

    fn png() -> Mapping {
        Mapping::new("index", ".png", ".png.md").unwrap()
    }

    #[rstest]
    #[case("", ".png", ".png.md")]
    #[case("../outside", ".png", ".png.md")]
    #[case("index", "", ".png.md")]
    #[case("index", ".png", "")]
    #[case("index", ".png", ".png")]
    #[case("index", ".canvas", ".md.canvas")]
    fn test_invalid(#[case] folder: &str, #[case] source: &str, #[case] target: &str) {
        let err = Mapping::new(folder, source, target).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidMapping(_)));
    }

    #[test]
    fn test_index_folder_is_normalized() {
        let mapping = Mapping::new("./index/", ".png", ".png.md").unwrap();
        assert_eq!(mapping.index_folder(), Path::new("index"));
    }

    #[test]
    fn test_for_kind() {
        let mapping = Mapping::for_kind("index", SourceKind::Canvas, None).unwrap();
        assert_eq!(mapping.target_extension(), ".canvas.md");
        let mapping = Mapping::for_kind("index", SourceKind::Canvas, Some(".md")).unwrap();
        assert_eq!(mapping.target_extension(), ".md");
        assert_eq!(mapping.target_path("Board.canvas"), Path::new("index/Board.md"));
    }

    #[rstest]
    #[case("a.png", true)]
    #[case("photos/deep/a.png", true)]
    #[case("index/a.png.md", false)]
    #[case("a.PNG", false)]
    #[case("a.jpg", false)]
    fn test_is_source(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(png().is_source(&info(path)), expected);
    }

    #[rstest]
    #[case("index/a.png.md", true)]
    #[case("index/sub/a.png.md", true)]
    #[case("a.png.md", false)]
    #[case("indexed/a.png.md", false)]
    #[case("index/a.jpg.md", false)]
    #[case("index/notes.md", false)]
    fn test_is_converted(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(png().is_converted(&info(path)), expected);
    }

    #[test]
    fn test_naming_round_trip() {
        let mapping = png();
        assert_eq!(mapping.target_path("Foo.png"), Path::new("index/Foo.png.md"));
        assert_eq!(mapping.source_name_of("Foo.png.md"), "Foo.png");
        assert_eq!(mapping.target_path("my.photo.png"), Path::new("index/my.photo.png.md"));
        assert_eq!(mapping.source_name_of("my.photo.png.md"), "my.photo.png");
    }

    #[test]
    fn test_display() {
        assert_eq!(png().to_string(), ".png -> index/*.png.md");
    }
}
