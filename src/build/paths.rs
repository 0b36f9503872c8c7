//! Path and name conversion utilities.
//!
//! This module handles conversions between:
//! - Source file paths (markdown files inside the documents directory)
//! - Document names (what listings show and URLs are built from)
//! - Output file paths (where the `build` command writes pages)

use std::path::{Component, Path, PathBuf};

/// Extension of document source files.
pub const MARKDOWN_EXTENSION: &str = "md";

/// Convert a source path, relative to the documents directory, to a document
/// name. Returns `None` for anything that is not a markdown file.
///
/// # Examples
/// ```ignore
/// document_name("installation.md") => Some("installation")
/// document_name("guides/setup.md") => Some("guides/setup")
/// document_name("readme.markdown") => None
/// ```
pub fn document_name(relative: &Path) -> Option<String> {
    if relative.extension()? != MARKDOWN_EXTENSION {
        return None;
    }

    let stem = relative.with_extension("");
    let parts: Vec<_> = stem
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

/// The source file of a document.
pub fn source_path(documents_dir: &Path, name: &str) -> PathBuf {
    documents_dir.join(format!("{name}.{MARKDOWN_EXTENSION}"))
}

/// Where the `build` command writes a document.
///
/// An empty URL suffix falls back to `.html` so pages never end up without
/// an extension on disk.
pub fn output_path(output_dir: &Path, name: &str, url_file_suffix: &str) -> PathBuf {
    let suffix = if url_file_suffix.is_empty() {
        ".html"
    } else {
        url_file_suffix
    };
    output_dir.join(format!("{name}{suffix}"))
}
