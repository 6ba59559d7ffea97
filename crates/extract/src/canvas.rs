//! Canvas document rendering.
//!
//! A canvas is a loosely structured JSON document with a top-level `nodes`
//! array. Only four node shapes matter here:
//!
//! | Node type | Field  | Section     | Rendered as            |
//! |-----------|--------|-------------|------------------------|
//! | `text`    | `text` | Cards       | fenced code block      |
//! | `file`    | `file` | Notes       | `![[basename]]`        |
//! | `link`    | `url`  | Web Pages   | `![Web Page](url)`     |
//! | `file`    | `file` | Medias      | `![[path\|500]]`       |
//!
//! File nodes pointing at a Markdown note (extension `md`, or none at all) go
//! to Notes; every other file node is a media embed. Anything that does not
//! parse degrades to an empty body instead of failing.

use crate::error::{ErrorKind, Result};
use crate::{Extractor, SourceKind};
use async_trait::async_trait;
use exn::ResultExt;
use indexer_storage::File;
use serde_json::Value;
use tracing::instrument;

const ITEM_SEPARATOR: &str = "\n\n<br/>\n\n";

/// Extractor for `.canvas` documents; works entirely offline.
#[derive(Debug, Default, Clone, Copy)]
pub struct CanvasExtractor;

#[async_trait]
impl Extractor for CanvasExtractor {
    fn kind(&self) -> SourceKind {
        SourceKind::Canvas
    }

    #[instrument(skip_all, fields(path = %source.path().display()))]
    async fn extract(&self, source: &File) -> Result<String> {
        let content = source.content().await.or_raise(|| ErrorKind::Source)?;
        Ok(render(&content))
    }
}

/// Render the section blocks for a canvas document.
///
/// Returns an empty string for empty, malformed or node-less input.
pub fn render(content: &str) -> String {
    let Some(nodes) = parse_nodes(content) else {
        return String::new();
    };

    let cards = elements(&nodes, "text", "text");
    let (notes, medias): (Vec<_>, Vec<_>) =
        elements(&nodes, "file", "file").into_iter().partition(|path| is_note(path));
    let notes: Vec<_> = notes.iter().map(|path| note_name(path)).collect();
    let mut web_pages = elements(&nodes, "link", "url");
    web_pages.sort();

    let mut out = String::new();
    out.push_str(&block("Cards", &cards, "\n\n", |card| format!("```\n{card}\n```")));
    out.push_str(&block("Notes", &notes, ITEM_SEPARATOR, |note| format!("![[{note}]]")));
    out.push_str(&block("Web Pages", &web_pages, ITEM_SEPARATOR, |url| format!("![Web Page]({url})")));
    out.push_str(&block("Medias", &medias, ITEM_SEPARATOR, |media| format!("![[{media}|500]]")));
    out
}

fn parse_nodes(content: &str) -> Option<Vec<Value>> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(mut root)) => match root.remove("nodes") {
            Some(Value::Array(nodes)) => Some(nodes),
            _ => None,
        },
        Ok(_) => None,
        Err(err) => {
            tracing::debug!(error = %err, "canvas is not valid JSON");
            None
        },
    }
}

/// String values of `field` for every node of `node_type`. Non-string values
/// become empty strings so the node is still counted.
fn elements(nodes: &[Value], node_type: &str, field: &str) -> Vec<String> {
    nodes
        .iter()
        .filter(|node| node.get("type").and_then(Value::as_str) == Some(node_type))
        .map(|node| node.get(field).and_then(Value::as_str).unwrap_or_default().to_string())
        .collect()
}

/// Everything after the last dot counts as the extension; a path without a
/// dot is its own extension, so `Ideas` embeds as media.
fn is_note(path: &str) -> bool {
    let extension = path.rsplit('.').next().unwrap_or_default();
    extension.is_empty() || extension == "md"
}

fn note_name(path: &str) -> String {
    let stem = path.strip_suffix(".md").unwrap_or(path);
    match stem.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => path.to_string(),
    }
}

fn block(header: &str, items: &[impl AsRef<str>], separator: &str, render: impl Fn(&str) -> String) -> String {
    if items.is_empty() {
        return String::new();
    }
    let body = items.iter().map(|item| render(item.as_ref())).collect::<Vec<_>>().join(separator);
    format!("# {header}\n\n{body}\n\n")
}
