//! Fixed text shared by the extractors and page templates.

/// Marker carried by every generated canvas index page.
pub const CANVAS_INDEX_MARKER: &str = "This index file enables Obsidian and its plugins to manage canvas files effectively. It ensures alias files for canvases appear in graphs and allows plugins compatible only with MD files to access these files.";

/// Marker carried by every generated image index page.
pub const IMAGE_INDEX_MARKER: &str = "This index file enables Obsidian and its plugins to manage image files effectively. It ensures image files appear in graphs and allows plugins compatible only with MD files to access these files.";

/// Marker carried by every generated PDF index page.
pub const PDF_INDEX_MARKER: &str = "This index file enables Obsidian and its plugins to manage PDF files effectively. It ensures PDF files appear in graphs and allows plugins compatible only with MD files to access these files.";

/// All markers; a file containing any of them is a generated index page.
pub const INDEX_MARKERS: [&str; 3] = [CANVAS_INDEX_MARKER, IMAGE_INDEX_MARKER, PDF_INDEX_MARKER];

pub(crate) const PDF_PROMPT: &str = "Extract and summarize the content of this PDF. Provide the complete text and a brief summary. If the PDF contains images, include descriptions of them and the full text they contain.";
pub(crate) const IMAGE_PROMPT: &str =
    "Extract and summarize the content of this image. Provide the complete text and a brief summary.";

/// Substituted when the content service answers with nothing.
pub(crate) const EMPTY_ANSWER: &str = "No content found";

/// Upper bound on attachment size sent to the content service.
pub const DEFAULT_MAX_ATTACHMENT_MB: u64 = 30;
