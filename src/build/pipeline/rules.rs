//! Final decoration pass.
//!
//! One recursive walk over the reparsed tree that:
//! - wraps the body content in the configured grid,
//! - adds the page title and stylesheet links to the head,
//! - injects the configured attributes into every other element.

use markup5ever_rcdom::{Handle, RcDom};

use super::dom;
use crate::config::SiteConfig;

/// Inject `rules` into `node`, in order.
///
/// A value for an attribute the element already has is appended to it,
/// separated by a space; any other attribute is added.
pub fn apply_rules(node: &Handle, rules: &[(String, String)]) {
    for (key, value) in rules {
        match dom::get_attribute(node, key) {
            Some(existing) => dom::set_attribute(node, key, &format!("{existing} {value}")),
            None => dom::set_attribute(node, key, value),
        }
    }
}

/// Decorate a whole document. `title` is used when the head has none.
pub fn decorate(dom: &RcDom, config: &SiteConfig, title: &str) {
    walk(dom, &dom.document, config, title);
}

fn walk(dom: &RcDom, node: &Handle, config: &SiteConfig, title: &str) {
    match dom::tag_name(node) {
        Some("body") => wrap_body(dom, node, config),
        Some("head") => decorate_head(dom, node, config, title),
        // Tables got their rules when they were wrapped
        Some("table") => {}
        Some(tag) => apply_rules(node, config.rules.for_tag(tag)),
        None => {}
    }

    for child in dom::children(node) {
        walk(dom, &child, config, title);
    }
}

/// Move the body content into `container > row > col`.
fn wrap_body(dom: &RcDom, body: &Handle, config: &SiteConfig) {
    let classes = &config.body;
    let container = dom::create_element(dom, "div", &[("class", &classes.container_class)]);
    let row = dom::create_element(dom, "div", &[("class", &classes.row_class)]);
    let col = dom::create_element(dom, "div", &[("class", &classes.col_class)]);

    dom::reparent_children(dom, body, &col);
    dom::append_child(dom, &row, &col);
    dom::append_child(dom, &container, &row);
    dom::append_child(dom, body, &container);
}

fn decorate_head(dom: &RcDom, head: &Handle, config: &SiteConfig, title: &str) {
    if dom::find_element(head, "title").is_none() {
        let element = dom::create_element(dom, "title", &[]);
        dom::append_text(dom, &element, title);
        dom::append_child(dom, head, &element);
    }

    for import in &config.css_imports {
        let href = format!("{}{}", config.routing.assets_prefix, import);
        let link = dom::create_element(
            dom,
            "link",
            &[
                ("href", &href),
                ("rel", "stylesheet"),
                ("crossorigin", "anonymous"),
            ],
        );
        dom::append_child(dom, head, &link);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::TagRules;

    fn bare_config() -> SiteConfig {
        SiteConfig {
            css_imports: Vec::new(),
            rules: TagRules::default(),
            ..SiteConfig::default()
        }
    }

    fn decorated(html: &str, config: &SiteConfig) -> String {
        let dom = dom::parse(html).unwrap();
        decorate(&dom, config, "Doc");
        dom::render(&dom).unwrap()
    }

    #[test]
    fn test_empty_body_gets_the_grid() {
        let html = decorated("<title>t</title><body></body>", &bare_config());
        assert!(html.contains(
            r#"<body><div class="container"><div class="row"><div class="col-lg-12"></div></div></div></body>"#
        ));
    }

    #[test]
    fn test_body_children_move_into_the_grid_in_order() {
        let html = decorated("<title>t</title><h1>A</h1><p>B</p>text", &bare_config());
        assert!(html.contains(
            r#"<body><div class="container"><div class="row"><div class="col-lg-12"><h1>A</h1><p>B</p>text</div></div></div></body>"#
        ));
    }

    #[test]
    fn test_head_gets_title_and_stylesheets() {
        let config = SiteConfig {
            rules: TagRules::default(),
            ..SiteConfig::default()
        };
        let html = decorated(r#"<head><meta charset="utf-8"></head><body></body>"#, &config);
        assert!(html.starts_with(concat!(
            r#"<html><head><meta charset="utf-8"><title>Doc</title>"#,
            r#"<link href="/assets/bootstrap.min.css" rel="stylesheet" crossorigin="anonymous">"#,
            r#"<link href="/assets/custom.css" rel="stylesheet" crossorigin="anonymous">"#,
            "</head>"
        )));
    }

    #[test]
    fn test_existing_title_is_kept() {
        let html = decorated("<head><title>Mine</title></head>", &bare_config());
        assert!(html.starts_with("<html><head><title>Mine</title></head>"));
    }

    #[test]
    fn test_rules_append_to_existing_attribute() {
        let mut config = bare_config();
        config.rules.insert("img", "class", "img-fluid");
        config.rules.insert("img", "loading", "lazy");

        let html = decorated(r#"<title>t</title><img class="photo" src="a.png">"#, &config);

        assert!(html.contains(r#"<img class="photo img-fluid" src="a.png" loading="lazy">"#));
    }

    #[test]
    fn test_tag_without_rules_is_untouched() {
        let mut config = bare_config();
        config.rules.insert("img", "class", "img-fluid");

        let html = decorated(r#"<title>t</title><p class="lead">x</p>"#, &config);

        assert!(html.contains(r#"<p class="lead">x</p>"#));
    }

    #[test]
    fn test_tables_are_skipped_but_their_content_is_not() {
        let mut config = bare_config();
        config.rules.insert("table", "class", "table");
        config.rules.insert("td", "class", "cell");

        let html = decorated("<title>t</title><table><tr><td>1</td></tr></table>", &config);

        assert!(html.contains(r#"<table><tbody><tr><td class="cell">1</td></tr></tbody></table>"#));
    }

    #[test]
    fn test_body_is_wrapped_exactly_once() {
        let dom = dom::parse("<p>x</p>").unwrap();
        decorate(&dom, &bare_config(), "Doc");
        let body = dom::find_element(&dom.document, "body").unwrap();
        assert_eq!(dom::children(&body).len(), 1);
        let title = dom::find_element(&dom.document, "title").unwrap();
        assert_eq!(dom::render_node(&title).unwrap(), "<title>Doc</title>");
    }
}
