//! Template inclusion.
//!
//! Replaces `<template>` elements with an HTML fragment read from the
//! templates directory:
//!
//! ```html
//! <template file="note.html" kind="warning" heading="false"></template>
//! ```
//!
//! Every `{{key}}` token in the fragment is replaced by the value of the
//! `key` attribute. The first element of the fragment's body takes the place
//! of the `<template>` element, or becomes the first child of the page body
//! when `heading` is true.

use std::io;
use std::path::{Component, Path, PathBuf};

use markup5ever_rcdom::{Handle, RcDom};

use crate::build::pipeline::dom;
use crate::build::pipeline::{Disposition, SpecialNode, TransformContext, TransformError};

/// Attribute naming the fragment file.
pub const FILE_ATTRIBUTE: &str = "file";

/// Attribute moving the fragment to the top of the page.
pub const HEADING_ATTRIBUTE: &str = "heading";

// =============================================================================
// Template sources
// =============================================================================

/// Source of template fragments, looked up by the `file` attribute.
pub trait TemplateStore: Send + Sync {
    /// Read the raw text of a template.
    fn read(&self, name: &str) -> io::Result<String>;
}

/// Reads templates from a directory on disk.
#[derive(Debug, Clone)]
pub struct FsTemplateStore {
    dir: PathBuf,
}

impl FsTemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TemplateStore for FsTemplateStore {
    fn read(&self, name: &str) -> io::Result<String> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "template path must stay inside the templates directory",
            ));
        }
        std::fs::read_to_string(self.dir.join(relative))
    }
}

// =============================================================================
// Handler
// =============================================================================

/// Expands `<template>` elements.
pub struct TemplateNode;

impl SpecialNode for TemplateNode {
    fn tag(&self) -> &'static str {
        "template"
    }

    fn handle(
        &self,
        node: &Handle,
        dom: &RcDom,
        ctx: &TransformContext,
    ) -> Result<Disposition, TransformError> {
        let attrs = dom::attributes(node);

        let file = attrs
            .iter()
            .find(|(key, _)| key == FILE_ATTRIBUTE)
            .map(|(_, value)| value.clone())
            .ok_or(TransformError::MissingTemplateFile)?;

        let raw = ctx
            .templates
            .read(&file)
            .map_err(|source| TransformError::TemplateFileReadError {
                file: PathBuf::from(&file),
                source,
            })?;

        let rendered = substitute(
            &raw,
            attrs.iter().filter(|(key, _)| key != FILE_ATTRIBUTE),
        );

        let fragment = dom::parse(&rendered).map_err(|e| match e {
            TransformError::HtmlParseError(io) => TransformError::TemplateParseError(io),
            other => other,
        })?;

        // Parsing wraps the fragment in <html><head></head><body>..., so the
        // template itself is the first child of the body
        let payload = dom::find_element(&fragment.document, "body")
            .and_then(|body| dom::children(&body).into_iter().next())
            .ok_or_else(|| TransformError::InvalidTemplateOutput { file: file.clone() })?;

        let is_heading = attrs
            .iter()
            .find(|(key, _)| key == HEADING_ATTRIBUTE)
            .is_some_and(|(_, value)| parse_bool(value) == Some(true));

        if is_heading {
            let body =
                dom::find_element(&dom.document, "body").ok_or(TransformError::MissingBodyNode)?;
            dom::prepend_child(dom, &body, &payload);
        } else if !dom::insert_before(dom, node, &payload) {
            return Err(TransformError::InvalidTemplateOutput { file });
        }
        dom::remove(dom, node);

        Ok(Disposition::Consumed)
    }
}

/// Replace every `{{key}}` token with its value, one key at a time in
/// attribute order.
fn substitute<'a>(raw: &str, values: impl Iterator<Item = &'a (String, String)>) -> String {
    values.fold(raw.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{{{key}}}}}"), value)
    })
}

/// Boolean parsing with the usual spellings of true and false.
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// In-memory template store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryTemplateStore(std::collections::HashMap<String, String>);

#[cfg(test)]
impl MemoryTemplateStore {
    pub fn with(mut self, name: &str, contents: &str) -> Self {
        self.0.insert(name.to_string(), contents.to_string());
        self
    }
}

#[cfg(test)]
impl TemplateStore for MemoryTemplateStore {
    fn read(&self, name: &str) -> io::Result<String> {
        self.0
            .get(name)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::SiteConfig;

    fn expand(html: &str, store: &MemoryTemplateStore) -> Result<String, TransformError> {
        let config = SiteConfig::default();
        let ctx = TransformContext::new(&config, None, store);
        let dom = dom::parse(html).unwrap();
        let node = dom::find_element(&dom.document, "template").unwrap();
        TemplateNode.handle(&node, &dom, &ctx)?;
        let body = dom::find_element(&dom.document, "body").unwrap();
        dom::render_node(&body)
    }

    #[test]
    fn test_template_replaces_node_in_place() {
        let store = MemoryTemplateStore::default().with("note.html", "<aside>{{text}}</aside>");

        let html = expand(
            r#"<p>before</p><template file="note.html" text="Careful"></template><p>after</p>"#,
            &store,
        )
        .unwrap();

        assert_eq!(
            html,
            "<body><p>before</p><aside>Careful</aside><p>after</p></body>"
        );
    }

    #[test]
    fn test_every_token_occurrence_is_replaced() {
        let store = MemoryTemplateStore::default()
            .with("t.html", r#"<div class="{{kind}}"><b>{{kind}}</b>{{msg}} {{unknown}}</div>"#);

        let html = expand(
            r#"<p>x</p><template file="t.html" kind="info" msg="hi"></template>"#,
            &store,
        )
        .unwrap();

        assert_eq!(
            html,
            r#"<body><p>x</p><div class="info"><b>info</b>hi {{unknown}}</div></body>"#
        );
    }

    #[test]
    fn test_heading_template_moves_to_top_of_body() {
        let store = MemoryTemplateStore::default().with("header.html", "<header>{{title}}</header>");

        let html = expand(
            r#"<p>intro</p><div><section><template file="header.html" heading="true" title="Top"></template></section></div>"#,
            &store,
        )
        .unwrap();

        assert_eq!(
            html,
            "<body><header>Top</header><p>intro</p><div><section></section></div></body>"
        );
    }

    #[test]
    fn test_heading_false_or_garbage_stays_in_place() {
        let store = MemoryTemplateStore::default().with("h.html", "<header>h</header>");

        for value in ["false", "0", "yes", ""] {
            let html = expand(
                &format!(r#"<p>intro</p><template file="h.html" heading="{value}"></template>"#),
                &store,
            )
            .unwrap();
            assert_eq!(html, "<body><p>intro</p><header>h</header></body>", "heading={value}");
        }
    }

    #[test]
    fn test_missing_file_attribute() {
        let store = MemoryTemplateStore::default();
        let err = expand(r#"<template heading="true"></template>"#, &store).unwrap_err();
        assert!(matches!(err, TransformError::MissingTemplateFile));
    }

    #[test]
    fn test_unreadable_file() {
        let store = MemoryTemplateStore::default();
        let err = expand(r#"<template file="missing.html"></template>"#, &store).unwrap_err();
        assert!(matches!(err, TransformError::TemplateFileReadError { .. }));
    }

    #[test]
    fn test_empty_template_is_invalid() {
        let store = MemoryTemplateStore::default().with("empty.html", "");
        let err = expand(r#"<template file="empty.html"></template>"#, &store).unwrap_err();
        assert!(matches!(err, TransformError::InvalidTemplateOutput { .. }));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("T"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("False"), Some(false));
        assert_eq!(parse_bool("yes"), None);
    }

    #[test]
    fn test_fs_store_reads_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("partials")).unwrap();
        std::fs::write(dir.path().join("partials/a.html"), "<p>a</p>").unwrap();

        let store = FsTemplateStore::new(dir.path());
        assert_eq!(store.read("partials/a.html").unwrap(), "<p>a</p>");
        assert!(store.read("missing.html").is_err());
    }

    #[test]
    fn test_fs_store_refuses_to_escape_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsTemplateStore::new(dir.path().join("templates"));
        std::fs::write(dir.path().join("secret.html"), "secret").unwrap();

        let err = store.read("../secret.html").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(store.read("/etc/passwd").is_err());
    }
}
