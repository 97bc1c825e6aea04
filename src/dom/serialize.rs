//! HTML serialization of subtrees, for assertions and snapshots.

use std::fmt::Write;

use super::document::Document;
use super::node::{NodeId, NodeKind};
use super::tree::Dom;

impl Document {
    /// Serialize `node` and its subtree as HTML.
    ///
    /// Attributes come out in insertion order; inline style (which this
    /// host keeps apart from attributes) is emitted as a trailing `style`
    /// attribute. Fragments serialize as their children. Properties are
    /// not serialized.
    pub fn outer_html(&self, node: NodeId) -> String {
        self.with_dom(|dom| {
            let mut out = String::new();
            write_node(dom, node, &mut out);
            out
        })
    }

    /// Serialize only the children of `node`.
    pub fn inner_html(&self, node: NodeId) -> String {
        self.with_dom(|dom| {
            let mut out = String::new();
            for &child in dom.children(node) {
                write_node(dom, child, &mut out);
            }
            out
        })
    }
}

fn write_node(dom: &Dom, node: NodeId, out: &mut String) {
    let Some(data) = dom.get(node) else {
        return;
    };
    match &data.kind {
        NodeKind::Text(text) => out.push_str(&escape(text, false)),
        NodeKind::Fragment => {
            for &child in dom.children(node) {
                write_node(dom, child, out);
            }
        }
        NodeKind::Element(el) => {
            out.push('<');
            out.push_str(&el.tag_name);
            for (name, value) in &el.attributes {
                if value.is_empty() {
                    let _ = write!(out, " {name}");
                } else {
                    let _ = write!(out, " {name}=\"{}\"", escape(value, true));
                }
            }
            if !el.style.is_empty() {
                let style = el
                    .style
                    .iter()
                    .map(|(k, v)| format!("{k}: {v};"))
                    .collect::<Vec<_>>()
                    .join(" ");
                let _ = write!(out, " style=\"{}\"", escape(&style, true));
            }
            out.push('>');
            for &child in dom.children(node) {
                write_node(dom, child, out);
            }
            let _ = write!(out, "</{}>", el.tag_name);
        }
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' if !attribute => escaped.push_str("&lt;"),
            '>' if !attribute => escaped.push_str("&gt;"),
            '"' if attribute => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use crate::dom::Document;

    #[test]
    fn element_with_attributes_and_text() {
        let doc = Document::new();
        let a = doc.create_element("a").unwrap();
        doc.set_attribute(a, "href", "/x?a=1&b=\"2\"").unwrap();
        doc.set_attribute(a, "hidden", "").unwrap();
        let t = doc.create_text("1 < 2");
        doc.append_child(a, t).unwrap();
        insta::assert_snapshot!(
            doc.outer_html(a),
            @r#"<a href="/x?a=1&amp;b=&quot;2&quot;" hidden>1 &lt; 2</a>"#
        );
    }

    #[test]
    fn style_is_trailing_attribute() {
        let doc = Document::new();
        let div = doc.create_element("div").unwrap();
        doc.set_attribute(div, "id", "box").unwrap();
        doc.set_style_property(div, "color", "red").unwrap();
        doc.set_style_property(div, "width", "10px").unwrap();
        assert_eq!(
            doc.outer_html(div),
            r#"<div id="box" style="color: red; width: 10px;"></div>"#
        );
    }

    #[test]
    fn fragment_serializes_children() {
        let doc = Document::new();
        let frag = doc.create_fragment();
        let a = doc.create_element("i").unwrap();
        let b = doc.create_text("x");
        doc.append_child(frag, a).unwrap();
        doc.append_child(frag, b).unwrap();
        assert_eq!(doc.outer_html(frag), "<i></i>x");
        assert_eq!(doc.inner_html(frag), "<i></i>x");
    }
}
