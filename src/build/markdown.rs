//! Markdown rendering to a complete HTML page.

use std::collections::HashSet;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};

use crate::config::MarkdownConfig;

#[derive(thiserror::Error, Debug)]
pub enum MarkdownError {
    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),
}

const PAGE_START: &str = r#"<!DOCTYPE html><html><head><meta charset="utf-8"></head><body>"#;
const PAGE_END: &str = "</body></html>";

/// Resolve the configured extension names to parser options.
pub fn parser_options(markdown_config: &MarkdownConfig) -> Result<Options, MarkdownError> {
    let mut options = Options::empty();
    for extension in &markdown_config.extensions {
        match extension.as_str() {
            "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
            "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
            "gfm" => options.insert(Options::ENABLE_GFM),
            "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
            "smart_punctuation" => options.insert(Options::ENABLE_SMART_PUNCTUATION),
            "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
            "tables" => options.insert(Options::ENABLE_TABLES),
            "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
            other => return Err(MarkdownError::InvalidExtension(other.to_string())),
        }
    }
    Ok(options)
}

/// Render markdown to a complete HTML page.
///
/// The page has a `<head>` with only a charset declaration; the title and
/// stylesheets are added by the transformer.
pub fn render_page(markdown: &str, markdown_config: &MarkdownConfig) -> Result<String, MarkdownError> {
    let options = parser_options(markdown_config)?;
    let mut events: Vec<Event> = Parser::new_ext(markdown, options).collect();
    assign_heading_ids(&mut events);

    let mut page = String::with_capacity(markdown.len() * 2 + PAGE_START.len() + PAGE_END.len());
    page.push_str(PAGE_START);
    html::push_html(&mut page, events.into_iter());
    page.push_str(PAGE_END);
    Ok(page)
}

/// Give every heading without an explicit id one derived from its text.
fn assign_heading_ids(events: &mut [Event]) {
    // Explicit ids win over generated ones
    let mut used_ids: HashSet<String> = events
        .iter()
        .filter_map(|event| match event {
            Event::Start(Tag::Heading { id: Some(id), .. }) => Some(id.to_string()),
            _ => None,
        })
        .collect();

    for start in 0..events.len() {
        if !matches!(events[start], Event::Start(Tag::Heading { id: None, .. })) {
            continue;
        }

        let mut text = String::new();
        for event in &events[start + 1..] {
            match event {
                Event::End(TagEnd::Heading(_)) => break,
                Event::Text(t) | Event::Code(t) => text.push_str(t),
                _ => {}
            }
        }

        let base_id = slugify(&text);
        let mut id = base_id.clone();
        let mut suffix = 1;
        while used_ids.contains(&id) {
            id = format!("{}-{}", base_id, suffix);
            suffix += 1;
        }
        used_ids.insert(id.clone());

        if let Event::Start(Tag::Heading { id: slot, .. }) = &mut events[start] {
            *slot = Some(id.into());
        }
    }
}

/// Convert a string to a slug suitable for use as an HTML id.
fn slugify(s: &str) -> String {
    s.to_lowercase()
        .replace(' ', "-")
        .replace(|c: char| !c.is_alphanumeric() && c != '-', "")
}
