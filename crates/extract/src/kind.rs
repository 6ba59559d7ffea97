use crate::consts::{IMAGE_PROMPT, PDF_PROMPT};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Every kind of source file that can be mirrored into an index page.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[display("canvas")]
    Canvas,
    #[display("pdf")]
    Pdf,
    #[display("png")]
    Png,
    #[display("jpg")]
    Jpg,
    #[display("jpeg")]
    Jpeg,
}

impl SourceKind {
    /// All kinds, in the order a batch processes them.
    pub const ALL: [SourceKind; 5] = [Self::Canvas, Self::Pdf, Self::Png, Self::Jpg, Self::Jpeg];

    /// File extension (with leading dot) identifying sources of this kind.
    pub fn source_extension(&self) -> &'static str {
        match self {
            Self::Canvas => ".canvas",
            Self::Pdf => ".pdf",
            Self::Png => ".png",
            Self::Jpg => ".jpg",
            Self::Jpeg => ".jpeg",
        }
    }

    /// Extension given to generated index pages unless configured otherwise.
    pub fn default_target_extension(&self) -> &'static str {
        match self {
            Self::Canvas => ".canvas.md",
            Self::Pdf => ".pdf.md",
            Self::Png => ".png.md",
            Self::Jpg => ".jpg.md",
            Self::Jpeg => ".jpeg.md",
        }
    }

    /// MIME type sent to the content service; `None` for kinds parsed locally.
    pub fn mime_type(&self) -> Option<&'static str> {
        match self {
            Self::Canvas => None,
            Self::Pdf => Some("application/pdf"),
            Self::Png => Some("image/png"),
            Self::Jpg | Self::Jpeg => Some("image/jpeg"),
        }
    }

    pub(crate) fn prompt(&self) -> &'static str {
        match self {
            Self::Pdf => PDF_PROMPT,
            _ => IMAGE_PROMPT,
        }
    }

    /// Whether conversion calls out to the content service.
    pub fn is_attachment(&self) -> bool {
        self.mime_type().is_some()
    }
}

#[derive(Debug, Display, Error)]
#[display("unknown source kind `{_0}` (expected one of: canvas, pdf, png, jpg, jpeg)")]
pub struct UnknownKind(#[error(not(source))] String);

impl FromStr for SourceKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().trim_start_matches('.').to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.to_string() == needle).ok_or_else(|| UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("canvas", SourceKind::Canvas)]
    #[case("PDF", SourceKind::Pdf)]
    #[case(".png", SourceKind::Png)]
    #[case(" jpg ", SourceKind::Jpg)]
    #[case("jpeg", SourceKind::Jpeg)]
    fn test_parse(#[case] input: &str, #[case] expected: SourceKind) {
        assert_eq!(input.parse::<SourceKind>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "gif".parse::<SourceKind>().unwrap_err();
        assert!(err.to_string().contains("`gif`"));
    }

    #[rstest]
    #[case(SourceKind::Canvas, ".canvas", ".canvas.md", None)]
    #[case(SourceKind::Pdf, ".pdf", ".pdf.md", Some("application/pdf"))]
    #[case(SourceKind::Png, ".png", ".png.md", Some("image/png"))]
    #[case(SourceKind::Jpg, ".jpg", ".jpg.md", Some("image/jpeg"))]
    #[case(SourceKind::Jpeg, ".jpeg", ".jpeg.md", Some("image/jpeg"))]
    fn test_kind_table(
        #[case] kind: SourceKind,
        #[case] source: &str,
        #[case] target: &str,
        #[case] mime: Option<&str>,
    ) {
        assert_eq!(kind.source_extension(), source);
        assert_eq!(kind.default_target_extension(), target);
        assert_eq!(kind.mime_type(), mime);
        assert_eq!(kind.is_attachment(), mime.is_some());
    }

    #[test]
    fn test_batch_order() {
        let names: Vec<_> = SourceKind::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["canvas", "pdf", "png", "jpg", "jpeg"]);
    }
}
