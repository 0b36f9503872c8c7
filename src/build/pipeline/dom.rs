//! HTML tree adapter.
//!
//! Parses HTML text into an `RcDom` and serializes it back, plus the handful
//! of tree queries and edits the transformation passes need. Every edit goes
//! through the `TreeSink` implementation of `RcDom` so parent back-references
//! stay consistent.

use std::rc::Rc;

use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, TreeSink};
use html5ever::{Attribute, LocalName, ParseOpts, QualName, ns, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

use super::error::TransformError;

/// Parse a complete HTML document.
///
/// The HTML5 algorithm never rejects input; the only failure mode is an I/O
/// error from the byte reader.
pub fn parse(html: &str) -> Result<RcDom, TransformError> {
    parse_document(RcDom::default(), ParseOpts::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(TransformError::HtmlParseError)
}

/// Render a whole document back to HTML text.
pub fn render(dom: &RcDom) -> Result<String, TransformError> {
    serialize_with(&dom.document, TraversalScope::ChildrenOnly(None))
}

/// Render a single node including its own start and end tags.
#[cfg(test)]
pub fn render_node(node: &Handle) -> Result<String, TransformError> {
    serialize_with(node, TraversalScope::IncludeNode)
}

fn serialize_with(node: &Handle, scope: TraversalScope) -> Result<String, TransformError> {
    let mut buf = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: scope,
        ..Default::default()
    };
    serialize(&mut buf, &SerializableHandle::from(node.clone()), opts)
        .map_err(|e| TransformError::HtmlRenderError(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| TransformError::HtmlRenderError(e.to_string()))
}

// =============================================================================
// Queries
// =============================================================================

/// The local tag name of an element, or `None` for non-element nodes.
pub fn tag_name(node: &Handle) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(&*name.local),
        _ => None,
    }
}

/// Whether `node` is an element with the given tag name.
pub fn is_element(node: &Handle, tag: &str) -> bool {
    tag_name(node) == Some(tag)
}

/// Snapshot of a node's children.
///
/// Taking a copy lets callers edit the tree while iterating.
pub fn children(node: &Handle) -> Vec<Handle> {
    node.children.borrow().clone()
}

/// The parent of `node`, if it is attached to one.
pub fn parent(node: &Handle) -> Option<Handle> {
    let weak = node.parent.take();
    let parent = weak.as_ref().and_then(|w| w.upgrade());
    node.parent.set(weak);
    parent
}

/// First element with the given tag name, in pre-order.
pub fn find_element(root: &Handle, tag: &str) -> Option<Handle> {
    find_nth_element(root, tag, 0)
}

/// The `n`th (zero-based) element with the given tag name, in pre-order.
pub fn find_nth_element(root: &Handle, tag: &str, n: usize) -> Option<Handle> {
    let mut remaining = n;
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        if is_element(&node, tag) {
            if remaining == 0 {
                return Some(node);
            }
            remaining -= 1;
        }
        // Reverse so the leftmost child is visited first
        stack.extend(node.children.borrow().iter().rev().cloned());
    }
    None
}

/// All attributes of an element as owned `(key, value)` pairs, in source order.
pub fn attributes(node: &Handle) -> Vec<(String, String)> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .map(|a| (a.name.local.to_string(), a.value.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Value of a single attribute.
pub fn get_attribute(node: &Handle, key: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref() == key)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

// =============================================================================
// Edits
// =============================================================================

/// Create a detached HTML element.
pub fn create_element(dom: &RcDom, tag: &str, attrs: &[(&str, &str)]) -> Handle {
    let name = QualName::new(None, ns!(html), LocalName::from(tag));
    let attrs = attrs
        .iter()
        .map(|(key, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(*key)),
            value: StrTendril::from(*value),
        })
        .collect();
    dom.create_element(name, attrs, ElementFlags::default())
}

/// Append a text node (merged into a trailing text node if there is one).
pub fn append_text(dom: &RcDom, parent: &Handle, text: &str) {
    dom.append(parent, NodeOrText::AppendText(StrTendril::from(text)));
}

/// Move `child` to the end of `parent`'s children.
pub fn append_child(dom: &RcDom, parent: &Handle, child: &Handle) {
    dom.remove_from_parent(child);
    dom.append(parent, NodeOrText::AppendNode(child.clone()));
}

/// Move `node` to just before `sibling`.
///
/// Returns `false` (leaving the tree untouched) if `sibling` has no parent.
pub fn insert_before(dom: &RcDom, sibling: &Handle, node: &Handle) -> bool {
    if parent(sibling).is_none() || Rc::ptr_eq(sibling, node) {
        return false;
    }
    dom.append_before_sibling(sibling, NodeOrText::AppendNode(node.clone()));
    true
}

/// Make `node` the first child of `parent`.
pub fn prepend_child(dom: &RcDom, parent: &Handle, node: &Handle) {
    let first = parent.children.borrow().first().cloned();
    match first {
        Some(first) if !Rc::ptr_eq(&first, node) => {
            insert_before(dom, &first, node);
        }
        Some(_) => {}
        None => append_child(dom, parent, node),
    }
}

/// Detach `node` from its parent. A no-op for detached nodes.
pub fn remove(dom: &RcDom, node: &Handle) {
    dom.remove_from_parent(node);
}

/// Move every child of `from` to the end of `to`, preserving order.
pub fn reparent_children(dom: &RcDom, from: &Handle, to: &Handle) {
    dom.reparent_children(from, to);
}

/// Set an attribute, replacing any existing value.
pub fn set_attribute(node: &Handle, key: &str, value: &str) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let mut attrs = attrs.borrow_mut();
        match attrs.iter_mut().find(|a| a.name.local.as_ref() == key) {
            Some(existing) => existing.value = StrTendril::from(value),
            None => attrs.push(Attribute {
                name: QualName::new(None, ns!(), LocalName::from(key)),
                value: StrTendril::from(value),
            }),
        }
    }
}
