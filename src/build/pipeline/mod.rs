//! HTML transformation pipeline.
//!
//! The transformer rewrites the HTML page produced from a markdown document
//! into the page that is served:
//! 1. Metadata extraction (`<attributes>` markers, mandatory title)
//! 2. Special-node passes (template, directory, table), each drained fully
//!    before the next one starts
//! 3. Decoration (body grid, head title and stylesheets, attribute rules)
//!
//! Between two handler calls the tree is rendered and reparsed, so a handler
//! is free to restructure any part of the tree it was given.

mod attributes;
mod context;
pub mod dom;
mod error;
pub mod rules;
pub mod stages;

use std::collections::BTreeMap;

use markup5ever_rcdom::{Handle, RcDom};

pub use attributes::{TITLE_ATTRIBUTE, extract_attributes};
pub use context::TransformContext;
pub use error::TransformError;

use stages::{DirectoryNode, TableNode, TemplateNode};

/// Upper bound on the nodes one pass may handle.
pub const MAX_SPECIAL_NODES: usize = 10_000;

/// What became of the node a handler was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The node was removed or replaced.
    Consumed,
    /// The node is still in the tree and must be skipped from now on.
    Retained,
}

/// A handler for one kind of special element.
///
/// The handler receives the first unhandled element of its tag in a freshly
/// parsed tree and may edit that tree in any way, provided it never moves
/// other elements of its own tag ahead of the one it was given.
pub trait SpecialNode: Send + Sync {
    /// Tag name this handler drains.
    fn tag(&self) -> &'static str;

    /// Rewrite the tree around `node`.
    fn handle(
        &self,
        node: &Handle,
        dom: &RcDom,
        ctx: &TransformContext,
    ) -> Result<Disposition, TransformError>;
}

/// Result of transforming one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    /// The final page
    pub html: String,
    /// Attributes collected from the `<attributes>` markers
    pub attributes: BTreeMap<String, String>,
}

impl TransformOutput {
    /// The document title, non-empty for every successful run.
    pub fn title(&self) -> &str {
        self.attributes
            .get(TITLE_ATTRIBUTE)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// The page transformer.
///
/// The default transformer drains: template → directory → table.
pub struct Transformer {
    handlers: Vec<Box<dyn SpecialNode>>,
    limit: usize,
}

impl Transformer {
    /// Create a transformer without special-node handlers.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            limit: MAX_SPECIAL_NODES,
        }
    }

    /// Create the default transformer with the standard handlers.
    pub fn default_transformer() -> Self {
        let mut transformer = Self::new();
        transformer.add_handler(TemplateNode);
        transformer.add_handler(DirectoryNode);
        transformer.add_handler(TableNode);
        transformer
    }

    /// Add a handler, drained after the ones already added.
    pub fn add_handler<S: SpecialNode + 'static>(&mut self, handler: S) -> &mut Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Change the number of nodes one pass may handle.
    #[cfg(test)]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Tags of the handlers, in drain order.
    #[cfg(test)]
    pub fn handler_tags(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.tag()).collect()
    }

    /// Transform one page.
    pub fn run(&self, html: &str, ctx: &TransformContext) -> Result<TransformOutput, TransformError> {
        let tree = dom::parse(html)?;
        let attributes = extract_attributes(&tree)?;
        let mut text = dom::render(&tree)?;

        for handler in &self.handlers {
            text = self.drain(handler.as_ref(), text, ctx)?;
        }

        let tree = dom::parse(&text)?;
        let title = attributes
            .get(TITLE_ATTRIBUTE)
            .map(String::as_str)
            .unwrap_or_default();
        rules::decorate(&tree, ctx.config, title);

        Ok(TransformOutput {
            html: dom::render(&tree)?,
            attributes,
        })
    }

    /// Hand every element of the handler's tag to it, one per parse.
    fn drain(
        &self,
        handler: &dyn SpecialNode,
        mut text: String,
        ctx: &TransformContext,
    ) -> Result<String, TransformError> {
        let tag = handler.tag();
        let mut skip = 0;
        let mut handled = 0;

        loop {
            let tree = dom::parse(&text)?;
            let Some(node) = dom::find_nth_element(&tree.document, tag, skip) else {
                tracing::trace!(tag, handled, "pass complete");
                return Ok(text);
            };
            if handled == self.limit {
                return Err(TransformError::SpecialNodeLimit {
                    tag,
                    limit: self.limit,
                });
            }

            let disposition = handler
                .handle(&node, &tree, ctx)
                .map_err(|e| TransformError::special_node(tag, e))?;
            if disposition == Disposition::Retained {
                skip += 1;
            }
            handled += 1;

            text = dom::render(&tree)?;
        }
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Self::default_transformer()
    }
}
