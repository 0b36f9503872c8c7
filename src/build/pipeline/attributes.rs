//! Document metadata extraction.
//!
//! Documents carry their metadata in a marker element:
//!
//! ```html
//! <attributes title="Getting Started" author="jo"></attributes>
//! ```
//!
//! Every marker is removed from the tree and its attributes are collected
//! into a map. A non-empty `title` is mandatory.

use std::collections::BTreeMap;

use markup5ever_rcdom::{Handle, RcDom};

use super::dom;
use super::error::TransformError;

/// Tag name of the metadata marker element.
pub const ATTRIBUTES_TAG: &str = "attributes";

/// The mandatory metadata key.
pub const TITLE_ATTRIBUTE: &str = "title";

/// Remove every metadata marker from `dom` and return the merged attributes.
///
/// Markers are visited in document order and later markers overwrite earlier
/// ones on key collisions. The title that wins must be non-empty.
pub fn extract_attributes(dom: &RcDom) -> Result<BTreeMap<String, String>, TransformError> {
    let mut attributes = BTreeMap::new();
    collect(dom, &dom.document, &mut attributes);

    let has_title = attributes
        .get(TITLE_ATTRIBUTE)
        .is_some_and(|title| !title.is_empty());
    if !has_title {
        return Err(TransformError::MissingTitleAttribute);
    }
    Ok(attributes)
}

fn collect(dom: &RcDom, node: &Handle, attributes: &mut BTreeMap<String, String>) {
    if dom::is_element(node, ATTRIBUTES_TAG) {
        attributes.extend(dom::attributes(node));
        dom::remove(dom, node);
        return;
    }

    for child in dom::children(node) {
        collect(dom, &child, attributes);
    }
}
