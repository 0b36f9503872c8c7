//! Configuration type definitions.
//!
//! This module contains all the data structures used in the lightsites
//! configuration file. These types are pure data - no I/O or complex logic.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// Site configuration
// =============================================================================

/// The whole site configuration.
///
/// Read-only for the lifetime of a refresh and shared between documents, so
/// it is passed explicitly to everything that needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Address the HTTP server binds to
    pub listen_addr: String,
    /// Seconds between two scans of the documents directory
    pub refresh_interval_secs: u64,
    pub directories: DirectoriesConfig,
    pub routing: RoutingConfig,
    /// Stylesheets linked from every page, relative to `routing.assets_prefix`
    pub css_imports: Vec<String>,
    pub body: BodyConfig,
    pub markdown: MarkdownConfig,
    pub watch: WatchConfig,
    /// Attribute injection rules, keyed by tag name
    pub rules: TagRules,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let mut rules = TagRules::default();
        rules.insert(
            "table",
            "class",
            "table table-bordered table-striped table-hover table-sm",
        );
        rules.insert("img", "style", "max-width: 100%;");

        Self {
            listen_addr: "0.0.0.0:8099".to_string(),
            refresh_interval_secs: 30 * 60,
            directories: DirectoriesConfig::default(),
            routing: RoutingConfig::default(),
            css_imports: vec!["bootstrap.min.css".to_string(), "custom.css".to_string()],
            body: BodyConfig::default(),
            markdown: MarkdownConfig::default(),
            watch: WatchConfig::default(),
            rules,
        }
    }
}

// =============================================================================
// Directories
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoriesConfig {
    /// Static files served under `routing.assets_prefix`
    pub assets: PathBuf,
    /// Markdown sources (`*.md`, searched recursively)
    pub documents: PathBuf,
    /// HTML fragments referenced by `<template file="...">`
    pub templates: PathBuf,
}

impl Default for DirectoriesConfig {
    fn default() -> Self {
        Self {
            assets: PathBuf::from("./src/assets"),
            documents: PathBuf::from("./src/content"),
            templates: PathBuf::from("./src/templates"),
        }
    }
}

// =============================================================================
// Routing
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// URL prefix rendered documents are served under (leading and trailing slash)
    pub route_prefix: String,
    /// URL prefix static assets are served under (leading and trailing slash)
    pub assets_prefix: String,
    /// Suffix appended to document names in URLs, e.g. ".html"
    pub url_file_suffix: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            route_prefix: "/content/".to_string(),
            assets_prefix: "/assets/".to_string(),
            url_file_suffix: ".html".to_string(),
        }
    }
}

impl RoutingConfig {
    /// The URL a document is served at.
    pub fn document_url(&self, name: &str) -> String {
        format!("{}{}{}", self.route_prefix, name, self.url_file_suffix)
    }
}

// =============================================================================
// Body layout
// =============================================================================

/// Class names of the grid every page body is wrapped in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub container_class: String,
    pub row_class: String,
    pub col_class: String,
    /// Class of the `<div>` wrapped around every table
    pub table_responsive_class: String,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            container_class: "container".to_string(),
            row_class: "row".to_string(),
            col_class: "col-lg-12".to_string(),
            table_responsive_class: "table-responsive".to_string(),
        }
    }
}

// =============================================================================
// Markdown configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markdown_extensions")]
    pub extensions: Vec<String>,
}

fn default_markdown_extensions() -> Vec<String> {
    vec![
        "definition_lists".to_string(),
        "footnotes".to_string(),
        "heading_attributes".to_string(),
        "smart_punctuation".to_string(),
        "strikethrough".to_string(),
        "tables".to_string(),
        "tasklists".to_string(),
    ]
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
        }
    }
}

// =============================================================================
// Watch configuration
// =============================================================================

/// Configuration for refreshing on file changes, on top of the periodic scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Refresh as soon as documents or templates change
    #[serde(default = "default_watch_enabled")]
    pub enabled: bool,
    /// Use polling-based watcher instead of native file system events.
    /// Useful for network filesystems, Docker volumes, or other situations
    /// where native events are unreliable.
    #[serde(default)]
    pub poll: bool,
    /// Poll interval in milliseconds (only used if poll=true).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Debounce timeout in milliseconds.
    /// Changes within this window are batched together.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_watch_enabled() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: default_watch_enabled(),
            poll: false,
            poll_interval_ms: default_poll_interval_ms(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

// =============================================================================
// Attribute injection rules
// =============================================================================

/// Per-tag attribute injection rules.
///
/// YAML format:
/// ```yaml
/// rules:
///   table:
///     class: table table-sm
///   img:
///     style: "max-width: 100%;"
///     loading: lazy
/// ```
///
/// The attributes of one tag keep the order they are written in, so a tag
/// with several rules always renders its attributes the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagRules(BTreeMap<String, AttributeRules>);

impl TagRules {
    /// The rules for one tag, in configured order. Empty if the tag has none.
    pub fn for_tag(&self, tag: &str) -> &[(String, String)] {
        self.0.get(tag).map(|r| r.0.as_slice()).unwrap_or_default()
    }

    /// Add (or replace) the value injected into `key` on every `tag` element.
    pub fn insert(&mut self, tag: &str, key: &str, value: &str) {
        self.0.entry(tag.to_string()).or_default().set(key, value);
    }
}

/// Ordered `(attribute, value)` pairs for a single tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeRules(Vec<(String, String)>);

impl AttributeRules {
    fn set(&mut self, key: &str, value: &str) {
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.0.push((key.to_string(), value.to_string())),
        }
    }
}

impl Serialize for AttributeRules {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AttributeRules {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = AttributeRules;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of attribute names to values")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut rules = AttributeRules::default();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    rules.set(&key, &value);
                }
                Ok(rules)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}
