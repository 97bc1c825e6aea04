//! Token interpreter: builds a DOM subtree from a selector.
//!
//! The builder keeps a node stack indexed by nesting depth. Depth 0 is the
//! top-level fragment and depth 1 starts as a placeholder container, so a
//! nesting marker of depth `d` always appends under the most recent node
//! opened at depth `d`, and the node it opens becomes depth `d + 1`.

use std::collections::BTreeMap;

use super::tokenizer::{tokenize, AttributeOperator, AttributeToken, Token};
use crate::dom::{Document, DomError, NodeId};

/// Build the subtree described by `selector` in `doc`.
///
/// Returns the single top-level node when there is exactly one, otherwise
/// the fragment holding all top-level siblings. Unreadable text ends the
/// selector early and is otherwise ignored.
pub fn create_element(doc: &Document, selector: &str) -> Result<NodeId, DomError> {
    let mut builder = TreeBuilder::new(doc)?;
    for token in tokenize(selector) {
        builder.apply(token)?;
    }
    Ok(builder.finish())
}

struct TreeBuilder<'a> {
    doc: &'a Document,
    /// Open node per depth; depth 0 is the root fragment.
    nest: BTreeMap<usize, NodeId>,
    root: NodeId,
    /// Node that new siblings are attached under.
    fragment: NodeId,
    /// Node that id/class/attribute tokens apply to.
    current: NodeId,
    depth: usize,
    /// Set until a child marker descends; while set, replacing the current
    /// node also records it at `depth + 1`.
    first: bool,
}

impl<'a> TreeBuilder<'a> {
    fn new(doc: &'a Document) -> Result<Self, DomError> {
        let root = doc.create_fragment();
        let seed = doc.create_element(&doc.config().container_tag)?;
        doc.append_child(root, seed)?;
        Ok(Self {
            doc,
            nest: BTreeMap::from([(0, root), (1, seed)]),
            root,
            fragment: root,
            current: seed,
            depth: 0,
            first: true,
        })
    }

    fn apply(&mut self, token: Token) -> Result<(), DomError> {
        match token {
            Token::Tag(name) => {
                let element = self.doc.create_element(&name)?;
                self.replace_current(element)
            }
            Token::Id(id) => self.on_element(|doc, node| doc.set_attribute(node, "id", &id)),
            Token::Class(class) => self.on_element(|doc, node| {
                let joined = match doc.get_attribute(node, "class") {
                    Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
                    _ => class.clone(),
                };
                doc.set_attribute(node, "class", &joined)
            }),
            Token::Attribute(attr) => self.set_attribute(attr),
            Token::Nest(depth) => self.nest_at(depth),
            Token::Child => self.descend(),
            Token::Text(text) => {
                let node = self.doc.create_text(text);
                self.replace_current(node)
            }
        }
    }

    fn set_attribute(&mut self, attr: AttributeToken) -> Result<(), DomError> {
        if !matches!(attr.operator, None | Some(AttributeOperator::Equals)) {
            tracing::debug!(
                name = %attr.name,
                operator = ?attr.operator,
                "attribute operator ignored, setting literal value"
            );
        }
        self.on_element(|doc, node| doc.set_attribute(node, &attr.name, &attr.value))
    }

    /// Apply `f` to the current node when it is an element; text nodes
    /// silently take no attributes.
    fn on_element(
        &self,
        f: impl FnOnce(&Document, NodeId) -> Result<(), DomError>,
    ) -> Result<(), DomError> {
        if self.doc.is_element(self.current) {
            f(self.doc, self.current)
        } else {
            tracing::trace!(node = ?self.current, "no element to decorate");
            Ok(())
        }
    }

    /// Swap the current node for `new` at the same position.
    fn replace_current(&mut self, new: NodeId) -> Result<(), DomError> {
        let old = self.current;
        if let Some(parent) = self.doc.parent(old) {
            self.doc.replace_child(parent, new, old)?;
        } else {
            self.doc.append_child(self.fragment, new)?;
        }
        for entry in self.nest.values_mut() {
            if *entry == old {
                *entry = new;
            }
        }
        if self.first {
            self.nest.insert(self.depth + 1, new);
        }
        self.current = new;
        self.doc.remove_node(old);
        Ok(())
    }

    /// Nesting marker: open a container under the node recorded at `depth`.
    fn nest_at(&mut self, depth: usize) -> Result<(), DomError> {
        let Some(&parent) = self.nest.get(&depth) else {
            tracing::debug!(depth, "no open node at nesting depth");
            return Ok(());
        };
        if !self.doc.with_node(parent, |data| data.is_container()).unwrap_or(false) {
            tracing::debug!(depth, "nesting under a text node ignored");
            return Ok(());
        }
        let container = self.doc.create_element(&self.doc.config().container_tag)?;
        self.doc.append_child(parent, container)?;
        self.nest.insert(depth + 1, container);
        self.depth = depth;
        self.fragment = parent;
        self.current = container;
        self.first = true;
        Ok(())
    }

    /// Child marker: open a container inside the current node and move into
    /// it.
    fn descend(&mut self) -> Result<(), DomError> {
        if !self.doc.is_element(self.current) {
            tracing::debug!(node = ?self.current, "child marker after text ignored");
            return Ok(());
        }
        let container = self.doc.create_element(&self.doc.config().container_tag)?;
        self.doc.append_child(self.current, container)?;
        self.fragment = self.current;
        self.current = container;
        self.first = false;
        Ok(())
    }

    fn finish(self) -> NodeId {
        let top = self.doc.children(self.root);
        match top.as_slice() {
            [only] => {
                let only = *only;
                // Detaching can't fail: `only` is a child of `root`.
                let _ = self.doc.remove_child(self.root, only);
                self.doc.remove_node(self.root);
                only
            }
            _ => self.root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DocumentConfig;
    use pretty_assertions::assert_eq;

    fn build(selector: &str) -> (Document, NodeId) {
        let doc = Document::new();
        let node = create_element(&doc, selector).unwrap();
        (doc, node)
    }

    fn html(selector: &str) -> String {
        let (doc, node) = build(selector);
        doc.outer_html(node)
    }

    #[test]
    fn empty_selector_yields_placeholder() {
        assert_eq!(html(""), "<div></div>");
    }

    #[test]
    fn tag_id_classes_attribute() {
        let (doc, node) = build("button#save.btn.primary[type=submit]");
        assert_eq!(doc.tag_name(node).as_deref(), Some("button"));
        assert_eq!(doc.id(node).as_deref(), Some("save"));
        assert_eq!(doc.class_list(node), vec!["btn", "primary"]);
        assert_eq!(doc.get_attribute(node, "type").as_deref(), Some("submit"));
    }

    #[test]
    fn id_without_tag_decorates_placeholder() {
        assert_eq!(html("#x.y"), r#"<div id="x" class="y"></div>"#);
    }

    #[test]
    fn classes_are_not_deduplicated() {
        let (doc, node) = build("i.a.a");
        assert_eq!(doc.get_attribute(node, "class").as_deref(), Some("a a"));
    }

    #[test]
    fn bare_attribute_is_empty_string() {
        let (doc, node) = build("input[disabled]");
        assert_eq!(doc.get_attribute(node, "disabled").as_deref(), Some(""));
    }

    #[test]
    fn non_exact_operator_sets_literal_value() {
        let (doc, node) = build("a[href^=https]");
        assert_eq!(doc.get_attribute(node, "href").as_deref(), Some("https"));
    }

    #[test]
    fn child_marker_nests_one_level() {
        let (doc, node) = build("div span");
        assert_eq!(doc.tag_name(node).as_deref(), Some("div"));
        let kids = doc.children(node);
        assert_eq!(kids.len(), 1);
        assert_eq!(doc.tag_name(kids[0]).as_deref(), Some("span"));
    }

    #[test]
    fn chained_child_markers() {
        assert_eq!(html("ul li a"), "<ul><li><a></a></li></ul>");
    }

    #[test]
    fn nesting_markers_follow_tab_depth() {
        assert_eq!(
            html("nav\n\tul\n\t\tli\n\t\tli\n\tfooter"),
            "<nav><ul><li></li><li></li></ul><footer></footer></nav>"
        );
    }

    #[test]
    fn depth_zero_marker_makes_top_level_sibling() {
        let (doc, node) = build("header\nmain");
        assert!(doc.is_fragment(node));
        assert_eq!(doc.outer_html(node), "<header></header><main></main>");
    }

    #[test]
    fn nest_uses_nearest_previous_parent_depth() {
        // The second `b` opens under the second `a`, not the first.
        assert_eq!(
            html("root\n\ta\n\t\tb\n\ta\n\t\tb"),
            "<root><a><b></b></a><a><b></b></a></root>"
        );
    }

    #[test]
    fn text_replaces_current_node() {
        assert_eq!(html("p\n\t\"hello\""), "<p>hello</p>");
        assert_eq!(html("\"just text\""), "just text");
    }

    #[test]
    fn bare_identifier_after_nest_is_an_element() {
        assert_eq!(html("ui-card\n\ttitle"), "<ui-card><title></title></ui-card>");
    }

    #[test]
    fn text_then_tag_keeps_stack_consistent() {
        assert_eq!(html("\"x\"p\n\ti"), "<p><i></i></p>");
    }

    #[test]
    fn nest_deeper_than_open_depth_is_ignored() {
        assert_eq!(html("a\n\t\t\tb"), "<b></b>");
    }

    #[test]
    fn malformed_tail_is_dropped() {
        assert_eq!(html("section.main > p"), r#"<section class="main"><div></div></section>"#);
        assert_eq!(html("p[title=x"), "<p></p>");
    }

    #[test]
    fn attributes_after_text_are_ignored() {
        assert_eq!(html("\"x\"#id"), "x");
    }

    #[test]
    fn placeholders_do_not_leak() {
        let (doc, _node) = build("ul li a");
        assert_eq!(doc.node_count(), 3);
    }

    #[test]
    fn custom_container_tag() {
        let doc = Document::with_config(DocumentConfig::new().with_container_tag("span"));
        let node = create_element(&doc, "#x").unwrap();
        assert_eq!(doc.outer_html(node), r#"<span id="x"></span>"#);
    }
}
