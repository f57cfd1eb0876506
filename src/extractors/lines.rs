// src/extractors/lines.rs
//! Rebuilds visual lines from the positioned text fragments of one page.

use serde::{Deserialize, Serialize};

/// Appended after every rendered page; also the separator for page-text input.
pub const PAGE_END_MARKER: &str = "---PAGE_END---";

/// A text fragment as placed on the page by the PDF text layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedToken {
    pub text: String,
    /// Horizontal position; only used to order fragments inside a line.
    #[serde(default)]
    pub x: f32,
    pub y: f32,
}

impl PositionedToken {
    pub fn new(text: impl Into<String>, x: f32, y: f32) -> Self {
        Self { text: text.into(), x, y }
    }
}

/// One visual row of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Vertical coordinate of the fragment that opened the line.
    pub y: f32,
    pub text: String,
}

/// Groups a page's tokens into lines.
///
/// Tokens are consumed in stream order. A token joins the open line when its
/// vertical coordinate is within `tolerance` of the line's anchor (the first
/// token's coordinate); otherwise the line is closed and a new one started.
/// Fragments are concatenated without a separator, left to right by `x`
/// (ties keep stream order).
pub fn reconstruct_lines(tokens: &[PositionedToken], tolerance: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current: Vec<&PositionedToken> = Vec::new();
    let mut anchor_y = 0.0_f32;

    for token in tokens {
        if !current.is_empty() && (token.y - anchor_y).abs() > tolerance {
            lines.push(assemble_line(anchor_y, &mut current));
        }
        if current.is_empty() {
            anchor_y = token.y;
        }
        current.push(token);
    }
    if !current.is_empty() {
        lines.push(assemble_line(anchor_y, &mut current));
    }

    lines
}

fn assemble_line(y: f32, fragments: &mut Vec<&PositionedToken>) -> Line {
    // sort_by is stable, so equal x keeps arrival order
    fragments.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
    let text = fragments.iter().map(|t| t.text.as_str()).collect::<String>();
    fragments.clear();
    Line { y, text }
}

/// The page's lines joined by line breaks.
pub fn page_text(lines: &[Line]) -> String {
    lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders a whole document as text, each page terminated by [`PAGE_END_MARKER`].
pub fn render_document(pages: &[Vec<Line>]) -> String {
    pages
        .iter()
        .map(|lines| format!("{}\n{}", page_text(lines), PAGE_END_MARKER))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Splits rendered document text back into per-page text blocks.
///
/// Whatever trails the last marker is kept as a page only if it holds text.
pub fn split_pages(document: &str) -> Vec<String> {
    let mut pages: Vec<String> = document
        .split(PAGE_END_MARKER)
        .map(|p| p.trim_matches('\n').to_string())
        .collect();
    if pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}
