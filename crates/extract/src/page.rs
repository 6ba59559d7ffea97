//! Index page templates.
//!
//! Every generated page starts with the source name as a heading, an embed or
//! wiki-link back to the source, and the marker description identifying the
//! page as generated. The extractor fragment goes last. Templates are compiled
//! once with [upon] and reused for every file of the same kind.
//!
//! | Variable      | Description                                  |
//! |---------------|----------------------------------------------|
//! | `name`        | Source file name (last path segment)         |
//! | `description` | Marker text for this kind of page            |
//! | `content`     | Fragment produced by the extractor           |

use crate::SourceKind;
use crate::consts::{CANVAS_INDEX_MARKER, IMAGE_INDEX_MARKER, PDF_INDEX_MARKER};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use upon::{Engine, Template};

const CANVAS_TEMPLATE: &str = "# {{ name }}\n\n[[{{ name }}]]\n\n{{ description }}\n\n{{ content }}";
const IMAGE_TEMPLATE: &str =
    "# {{ name }}\n\n![[{{ name }}|500]]\n\n{{ description }}\n\n# Image Content\n\n{{ content }}\n";
const PDF_TEMPLATE: &str = "# {{ name }}\n\n![[{{ name }}]]\n\n{{ description }}\n\n# PDF Content\n\n{{ content }}\n";

/// Compiled page template for one [`SourceKind`].
pub struct PageRenderer {
    engine: Engine<'static>,
    template: Template<'static>,
    description: &'static str,
}
impl PageRenderer {
    pub fn new(kind: SourceKind) -> Result<Self> {
        let (source, description) = match kind {
            SourceKind::Canvas => (CANVAS_TEMPLATE, CANVAS_INDEX_MARKER),
            SourceKind::Pdf => (PDF_TEMPLATE, PDF_INDEX_MARKER),
            SourceKind::Png | SourceKind::Jpg | SourceKind::Jpeg => (IMAGE_TEMPLATE, IMAGE_INDEX_MARKER),
        };
        let engine = Engine::new();
        // Compile the template early so we can fail-fast in construction.
        let template = engine.compile(source).or_raise(|| ErrorKind::Template)?;
        Ok(Self { engine, template, description })
    }

    /// Wrap an extractor fragment into a full page for `name`.
    pub fn render(&self, name: &str, content: &str) -> Result<String> {
        self.template
            .render(
                &self.engine,
                upon::value! {
                    name: name,
                    description: self.description,
                    content: content,
                },
            )
            .to_string()
            .or_raise(|| ErrorKind::Template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::INDEX_MARKERS;

    #[test]
    fn test_canvas_page() {
        let page = PageRenderer::new(SourceKind::Canvas).unwrap();
        let rendered = page.render("Test.canvas", "# Cards\n\n```\nhello\n```\n\n").unwrap();
        assert_eq!(
            rendered,
            format!("# Test.canvas\n\n[[Test.canvas]]\n\n{CANVAS_INDEX_MARKER}\n\n# Cards\n\n```\nhello\n```\n\n")
        );
    }

    #[test]
    fn test_canvas_page_without_content() {
        let page = PageRenderer::new(SourceKind::Canvas).unwrap();
        let rendered = page.render("Empty.canvas", "").unwrap();
        assert_eq!(rendered, format!("# Empty.canvas\n\n[[Empty.canvas]]\n\n{CANVAS_INDEX_MARKER}\n\n"));
    }

    #[test]
    fn test_image_page() {
        let page = PageRenderer::new(SourceKind::Png).unwrap();
        let rendered = page.render("a.png", "A cat.").unwrap();
        assert_eq!(
            rendered,
            format!("# a.png\n\n![[a.png|500]]\n\n{IMAGE_INDEX_MARKER}\n\n# Image Content\n\nA cat.\n")
        );
    }

    #[test]
    fn test_pdf_page_carries_marker() {
        let page = PageRenderer::new(SourceKind::Pdf).unwrap();
        let rendered = page.render("report.pdf", "Summary").unwrap();
        assert!(rendered.starts_with("# report.pdf\n\n![[report.pdf]]\n\n"));
        assert!(rendered.contains(PDF_INDEX_MARKER));
        assert!(rendered.ends_with("# PDF Content\n\nSummary\n"));
    }

    #[test]
    fn test_every_page_is_recognisable() {
        for kind in SourceKind::ALL {
            let page = PageRenderer::new(kind).unwrap();
            let rendered = page.render("x", "{{ not a template }}").unwrap();
            assert!(INDEX_MARKERS.iter().any(|marker| rendered.contains(marker)), "{kind}");
            assert!(rendered.contains("{{ not a template }}"));
        }
    }
}
