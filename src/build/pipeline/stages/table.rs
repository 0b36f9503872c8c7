//! Responsive tables.
//!
//! Every `<table>` is wrapped in a `<div>` with the configured responsive
//! class and gets the `table` rules.

use markup5ever_rcdom::{Handle, RcDom};

use crate::build::pipeline::rules::apply_rules;
use crate::build::pipeline::{Disposition, SpecialNode, TransformContext, TransformError, dom};

/// Wraps `<table>` elements. The table stays in the tree.
pub struct TableNode;

impl SpecialNode for TableNode {
    fn tag(&self) -> &'static str {
        "table"
    }

    fn handle(
        &self,
        node: &Handle,
        dom: &RcDom,
        ctx: &TransformContext,
    ) -> Result<Disposition, TransformError> {
        let wrapper = dom::create_element(
            dom,
            "div",
            &[("class", &ctx.config.body.table_responsive_class)],
        );
        if !dom::insert_before(dom, node, &wrapper) {
            return Err(TransformError::NoParentForTableNode);
        }
        dom::append_child(dom, &wrapper, node);
        apply_rules(node, ctx.config.rules.for_tag("table"));

        Ok(Disposition::Retained)
    }
}
