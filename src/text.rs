//! Paragraph handling for the reading pane: splitting raw input into
//! paragraphs, rendering them as escaped HTML and importing plain-text
//! files.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextError {
    #[error("only plain-text (.txt) files can be imported: {0}")]
    UnsupportedFile(PathBuf),
    #[error("failed to read {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
}

/// Splits `text` into paragraphs on blank lines, collapsing whitespace
/// runs inside each paragraph.
pub fn extract_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(join_words(&current));
                current.clear();
            }
            continue;
        }
        current.push(line);
    }
    if !current.is_empty() {
        paragraphs.push(join_words(&current));
    }

    paragraphs
}

fn join_words(lines: &[&str]) -> String {
    lines
        .iter()
        .flat_map(|line| line.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders paragraphs as a sequence of `<p>` elements with markup-significant
/// characters escaped.
pub fn render_html(paragraphs: &[String]) -> String {
    paragraphs
        .iter()
        .map(|paragraph| format!("<p>{}</p>", escape_html(paragraph)))
        .collect()
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Reads a plain-text file for display. Anything without a `.txt`
/// extension is rejected before touching the filesystem.
pub fn import_text_file(path: &Path) -> Result<String, TextError> {
    let is_txt = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("txt"))
        .unwrap_or(false);
    if !is_txt {
        return Err(TextError::UnsupportedFile(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|err| TextError::Io(path.to_path_buf(), err))
}
