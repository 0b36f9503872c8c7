//! Site directory listing.
//!
//! Replaces `<directory></directory>` with a `<ul>` linking every document of
//! the site.

use markup5ever_rcdom::{Handle, RcDom};

use crate::build::pipeline::dom;
use crate::build::pipeline::{Disposition, SpecialNode, TransformContext, TransformError};

const LINK_REL: &str = "noopener noreferrer";

/// Expands `<directory>` elements.
pub struct DirectoryNode;

impl SpecialNode for DirectoryNode {
    fn tag(&self) -> &'static str {
        "directory"
    }

    fn handle(
        &self,
        node: &Handle,
        dom: &RcDom,
        ctx: &TransformContext,
    ) -> Result<Disposition, TransformError> {
        let siblings = ctx.siblings.ok_or(TransformError::DirectoryNotInitialized)?;
        if dom::parent(node).is_none() {
            return Err(TransformError::NoParentForDirectoryNode);
        }

        let list = dom::create_element(dom, "ul", &[]);
        // Hidden documents are reachable but never listed
        for name in siblings.iter().filter(|name| !name.starts_with('.')) {
            let href = ctx.config.routing.document_url(name);
            let link = dom::create_element(dom, "a", &[("href", &href), ("rel", LINK_REL)]);
            dom::append_text(dom, &link, name);

            let item = dom::create_element(dom, "li", &[]);
            dom::append_child(dom, &item, &link);
            dom::append_child(dom, &list, &item);
        }

        dom::insert_before(dom, node, &list);
        dom::remove(dom, node);
        Ok(Disposition::Consumed)
    }
}
