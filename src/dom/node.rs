//! Node types: NodeId, NodeData, ElementData.

use indexmap::IndexMap;
use slotmap::new_key_type;

use crate::reactive::Value;

new_key_type! {
    /// Unique identifier for a DOM node. Copy, lightweight (u64).
    ///
    /// Two handles refer to the same node exactly when the ids are equal.
    pub struct NodeId;
}

/// What kind of node this is, with its kind-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
    Fragment,
}

/// Data associated with a single DOM node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub kind: NodeKind,
}

impl NodeData {
    pub fn element(tag_name: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Element(ElementData::new(tag_name)),
        }
    }

    pub fn text(data: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Text(data.into()),
        }
    }

    pub fn fragment() -> Self {
        Self {
            kind: NodeKind::Fragment,
        }
    }

    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self.kind, NodeKind::Fragment)
    }

    /// Whether this node may have children (elements and fragments).
    pub fn is_container(&self) -> bool {
        !matches!(self.kind, NodeKind::Text(_))
    }
}

/// Element payload: tag name, attributes, inline style, properties.
///
/// `id` and `class` are ordinary attributes; the class list is a view over
/// the `class` attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Lower-cased local name (e.g. `div`, `ui-card`).
    pub tag_name: String,
    pub attributes: IndexMap<String, String>,
    pub style: IndexMap<String, String>,
    pub properties: IndexMap<String, Value>,
}

impl ElementData {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            attributes: IndexMap::new(),
            style: IndexMap::new(),
            properties: IndexMap::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// Class tokens in attribute order.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    /// Check whether this element has a given class token.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Add a class token. No-op if already present.
    pub fn add_class(&mut self, class: &str) -> bool {
        if self.has_class(class) {
            return false;
        }
        let mut tokens: Vec<&str> = self.classes().collect();
        tokens.push(class);
        let joined = tokens.join(" ");
        self.attributes.insert("class".to_owned(), joined);
        true
    }

    /// Remove a class token. No-op if not present.
    pub fn remove_class(&mut self, class: &str) -> bool {
        if !self.has_class(class) {
            return false;
        }
        let joined = self
            .classes()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.attributes.insert("class".to_owned(), joined);
        true
    }
}

/// Whether `class` is a single class token: non-empty, no ASCII whitespace.
pub(crate) fn is_valid_class_token(class: &str) -> bool {
    !class.is_empty() && !class.contains(|c: char| c.is_ascii_whitespace())
}

/// Whether `name` is acceptable as an element or attribute name.
///
/// Mirrors the host's name check loosely: a leading ASCII letter (or `_` /
/// `:` for attributes), then no whitespace, quotes, `=`, `<`, `>` or `/`.
pub(crate) fn is_valid_name(name: &str, attribute: bool) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let first_ok = first.is_ascii_alphabetic() || (attribute && matches!(first, '_' | ':' | '@'));
    first_ok
        && chars.all(|c| {
            !c.is_whitespace() && !matches!(c, '"' | '\'' | '=' | '<' | '>' | '/' | '\0')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_defaults() {
        let data = NodeData::element("DIV");
        let el = data.as_element().unwrap();
        assert_eq!(el.tag_name, "div");
        assert!(el.attributes.is_empty());
        assert!(el.id().is_none());
        assert!(data.is_container());
    }

    #[test]
    fn text_and_fragment() {
        assert_eq!(NodeData::text("hi").as_text(), Some("hi"));
        assert!(!NodeData::text("hi").is_container());
        assert!(NodeData::fragment().is_fragment());
        assert!(NodeData::fragment().as_element().is_none());
    }

    #[test]
    fn class_tokens_come_from_attribute() {
        let mut el = ElementData::new("span");
        el.attributes.insert("class".into(), "  a   b ".into());
        assert_eq!(el.classes().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(el.has_class("b"));
    }

    #[test]
    fn add_class_idempotent() {
        let mut el = ElementData::new("span");
        assert!(el.add_class("foo"));
        assert!(!el.add_class("foo"));
        assert!(el.add_class("bar"));
        assert_eq!(el.attribute("class"), Some("foo bar"));
    }

    #[test]
    fn remove_class() {
        let mut el = ElementData::new("span");
        el.add_class("a");
        el.add_class("b");
        assert!(el.remove_class("a"));
        assert!(!el.remove_class("a"));
        assert_eq!(el.attribute("class"), Some("b"));
    }

    #[test]
    fn name_validation() {
        assert!(is_valid_name("ui-card", false));
        assert!(is_valid_name("h1", false));
        assert!(!is_valid_name("1h", false));
        assert!(!is_valid_name("", false));
        assert!(!is_valid_name("a b", true));
        assert!(is_valid_name("data-x", true));
        assert!(is_valid_name("_private", true));
        assert!(!is_valid_name("_private", false));
    }

    #[test]
    fn node_id_is_copy() {
        fn assert_copy<T: Copy>() {}
        assert_copy::<NodeId>();
    }
}
