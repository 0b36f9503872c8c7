//! Pipeline context for sharing state across passes.

use crate::build::pipeline::stages::TemplateStore;
use crate::config::SiteConfig;

/// Shared, read-only context for the transformation of one document.
///
/// Everything in here may be shared between documents processed in parallel;
/// the tree being rewritten is never part of it.
pub struct TransformContext<'a> {
    /// Site configuration (rules, class names, routing)
    pub config: &'a SiteConfig,

    /// Names of all documents of the site, in discovery order.
    ///
    /// `None` when the document is rendered outside of a library, in which
    /// case `<directory>` elements cannot be expanded.
    pub siblings: Option<&'a [String]>,

    /// Where `<template file="...">` fragments are read from
    pub templates: &'a dyn TemplateStore,
}

impl<'a> TransformContext<'a> {
    /// Create a new transformation context.
    pub fn new(
        config: &'a SiteConfig,
        siblings: Option<&'a [String]>,
        templates: &'a dyn TemplateStore,
    ) -> Self {
        Self {
            config,
            siblings,
            templates,
        }
    }
}
