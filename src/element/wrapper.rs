//! Lazily materialized element descriptors.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::dom::{Document, DomError, NodeId, WeakDocument};
use crate::reactive::{Binding, ObservableList};
use crate::reflect::{
    reflect_attributes, reflect_children, reflect_class_list, reflect_dataset,
    reflect_properties, reflect_style, Child, ReflectParams,
};

/// What an [`ElementWrapper`] builds its node from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Selector markup, built with [`crate::selector::create_element`].
    Markup(String),
    /// An existing node, adopted as-is.
    Node(NodeId),
}

impl From<&str> for Selector {
    fn from(markup: &str) -> Self {
        Self::Markup(markup.to_owned())
    }
}

impl From<String> for Selector {
    fn from(markup: String) -> Self {
        Self::Markup(markup)
    }
}

impl From<NodeId> for Selector {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

/// Children of an [`ElementWrapper`].
#[derive(Debug, Clone)]
pub enum ChildSource {
    /// Set once when the node is built. An empty list leaves the built
    /// node's children untouched.
    Fixed(Vec<Child>),
    /// Followed for the node's lifetime.
    Live(ObservableList<Child>),
}

impl Default for ChildSource {
    fn default() -> Self {
        Self::Fixed(Vec::new())
    }
}

impl From<Vec<Child>> for ChildSource {
    fn from(children: Vec<Child>) -> Self {
        Self::Fixed(children)
    }
}

impl From<ObservableList<Child>> for ChildSource {
    fn from(children: ObservableList<Child>) -> Self {
        Self::Live(children)
    }
}

struct WrapperState {
    doc: WeakDocument,
    selector: Selector,
    params: ReflectParams,
    children: ChildSource,
}

/// A node descriptor: selector (or node), reflection params and children.
///
/// The node is built and wired on the first call to
/// [`element`](Self::element) and cached in the document's weak
/// wrapper→node association; later calls return the same node. Clones share
/// the cache entry. Once every clone is dropped the entry is released, while
/// the node and its bindings live on in the document.
#[derive(Clone)]
pub struct ElementWrapper {
    state: Rc<WrapperState>,
}

impl ElementWrapper {
    pub fn new(
        doc: &Document,
        selector: impl Into<Selector>,
        params: ReflectParams,
        children: impl Into<ChildSource>,
    ) -> Self {
        Self {
            state: Rc::new(WrapperState {
                doc: doc.downgrade(),
                selector: selector.into(),
                params,
                children: children.into(),
            }),
        }
    }

    /// Wrapper with no params or children.
    pub fn from_selector(doc: &Document, selector: impl Into<Selector>) -> Self {
        Self::new(doc, selector, ReflectParams::default(), ChildSource::default())
    }

    pub fn selector(&self) -> &Selector {
        &self.state.selector
    }

    pub fn params(&self) -> &ReflectParams {
        &self.state.params
    }

    /// The wrapper's node, built and wired on first access.
    ///
    /// Reflectors are wired in order: attributes, dataset, style, children,
    /// class list, properties. Their bindings are retained by the document
    /// for the node's lifetime. If wiring fails, every binding made so far
    /// is dropped, a node built from markup is removed, and the error is
    /// returned; the next call tries again.
    pub fn element(&self) -> Result<NodeId, DomError> {
        let doc = self.state.doc.upgrade().ok_or(DomError::DocumentDropped)?;
        let key = self.cache_key();
        if let Some(node) = doc.cached_node(&key) {
            if doc.contains(node) {
                return Ok(node);
            }
        }

        let node = match &self.state.selector {
            Selector::Markup(markup) => doc.build(markup)?,
            Selector::Node(node) if doc.contains(*node) => *node,
            Selector::Node(node) => return Err(DomError::NotFound(*node)),
        };
        let bindings = match self.wire(&doc, node) {
            Ok(bindings) => bindings,
            Err(error) => {
                if matches!(self.state.selector, Selector::Markup(_)) {
                    doc.remove_node(node);
                }
                return Err(error);
            }
        };
        let count = bindings.len();
        for binding in bindings {
            doc.retain_binding(node, binding);
        }
        doc.cache_node(&key, node);
        tracing::debug!(?node, selector = ?self.state.selector, bindings = count, "element built");
        Ok(node)
    }

    /// Whether the node has been built and is still in the document.
    pub fn is_built(&self) -> bool {
        self.state.doc.upgrade().is_some_and(|doc| {
            doc.cached_node(&self.cache_key())
                .is_some_and(|node| doc.contains(node))
        })
    }

    fn cache_key(&self) -> Rc<dyn Any> {
        self.state.clone()
    }

    fn wire(&self, doc: &Document, node: NodeId) -> Result<Vec<Binding>, DomError> {
        let params = &self.state.params;
        let mut bindings = Vec::new();
        if let Some(attributes) = &params.attributes {
            bindings.push(reflect_attributes(doc, node, attributes)?);
        }
        if let Some(dataset) = &params.dataset {
            bindings.push(reflect_dataset(doc, node, dataset)?);
        }
        if let Some(style) = &params.style {
            bindings.push(reflect_style(doc, node, style)?);
        }
        match &self.state.children {
            ChildSource::Fixed(children) if children.is_empty() => {}
            ChildSource::Fixed(children) => {
                let list = ObservableList::from_vec(children.clone());
                bindings.push(reflect_children(doc, node, &list)?);
            }
            ChildSource::Live(list) => bindings.push(reflect_children(doc, node, list)?),
        }
        if let Some(classes) = &params.class_list {
            bindings.push(reflect_class_list(doc, node, classes)?);
        }
        if let Some(properties) = &params.properties {
            bindings.push(reflect_properties(doc, node, properties)?);
        }
        Ok(bindings)
    }
}

impl fmt::Debug for ElementWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementWrapper")
            .field("selector", &self.state.selector)
            .field("built", &self.is_built())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{ObservableMap, ObservableSet, Value};

    #[test]
    fn element_is_built_once() {
        let doc = Document::new();
        let attrs: ObservableMap = [("title", "t")].into_iter().collect();
        let classes = ObservableSet::new();
        let wrapper = ElementWrapper::new(
            &doc,
            "section.panel",
            ReflectParams::new()
                .with_attributes(attrs.clone())
                .with_class_list(classes.clone()),
            ChildSource::default(),
        );
        assert!(!wrapper.is_built());

        let first = wrapper.element().unwrap();
        let second = wrapper.element().unwrap();
        assert_eq!(first, second);
        assert!(wrapper.is_built());
        assert_eq!(attrs.subscriber_count(), 1);
        assert_eq!(doc.binding_count(first), 2);
        assert_eq!(doc.get_attribute(first, "title").as_deref(), Some("t"));
    }

    #[test]
    fn clones_share_the_node() {
        let doc = Document::new();
        let wrapper = ElementWrapper::from_selector(&doc, "p");
        let clone = wrapper.clone();
        assert_eq!(wrapper.element().unwrap(), clone.element().unwrap());
    }

    #[test]
    fn separate_wrappers_build_separate_nodes() {
        let doc = Document::new();
        let a = ElementWrapper::from_selector(&doc, "p");
        let b = ElementWrapper::from_selector(&doc, "p");
        assert_ne!(a.element().unwrap(), b.element().unwrap());
    }

    #[test]
    fn adopts_existing_node() {
        let doc = Document::new();
        let node = doc.create_element("input").unwrap();
        let props: ObservableMap = [("value", "x")].into_iter().collect();
        let wrapper = ElementWrapper::new(
            &doc,
            node,
            ReflectParams::new().with_properties(props),
            ChildSource::default(),
        );
        assert_eq!(wrapper.element().unwrap(), node);
        assert_eq!(doc.property(node, "value"), Some(Value::from("x")));
    }

    #[test]
    fn missing_node_is_an_error() {
        let doc = Document::new();
        let node = doc.create_element("i").unwrap();
        doc.remove_node(node);
        let wrapper = ElementWrapper::from_selector(&doc, node);
        assert_eq!(wrapper.element(), Err(DomError::NotFound(node)));
    }

    #[test]
    fn empty_fixed_children_keep_markup_subtree() {
        let doc = Document::new();
        let wrapper = ElementWrapper::from_selector(&doc, "ul li");
        let node = wrapper.element().unwrap();
        assert_eq!(doc.outer_html(node), "<ul><li></li></ul>");
    }

    #[test]
    fn fixed_children_replace_markup_subtree() {
        let doc = Document::new();
        let inner = ElementWrapper::from_selector(&doc, "b");
        let wrapper = ElementWrapper::new(
            &doc,
            "p span",
            ReflectParams::new(),
            vec![Child::from("x"), Child::from(&inner)],
        );
        let node = wrapper.element().unwrap();
        assert_eq!(doc.outer_html(node), "<p>x<b></b></p>");
    }

    #[test]
    fn live_children_follow_list() {
        let doc = Document::new();
        let list = ObservableList::from_vec(vec![Child::from("a")]);
        let wrapper = ElementWrapper::new(&doc, "div", ReflectParams::new(), list.clone());
        let node = wrapper.element().unwrap();
        list.push(Child::from("b"));
        assert_eq!(doc.inner_html(node), "ab");
    }

    #[test]
    fn removed_node_is_rebuilt() {
        let doc = Document::new();
        let attrs = ObservableMap::new();
        let wrapper = ElementWrapper::new(
            &doc,
            "div",
            ReflectParams::new().with_attributes(attrs.clone()),
            ChildSource::default(),
        );
        let first = wrapper.element().unwrap();
        doc.remove_node(first);
        assert_eq!(attrs.subscriber_count(), 0);
        assert!(!wrapper.is_built());

        let second = wrapper.element().unwrap();
        assert_ne!(first, second);
        assert_eq!(attrs.subscriber_count(), 1);
    }

    #[test]
    fn failed_wiring_rolls_back() {
        let doc = Document::new();
        let attrs: ObservableMap = [("ok", "1")].into_iter().collect();
        let style = ObservableMap::new();
        let bad: ObservableMap = [("bad name", "x")].into_iter().collect();
        let wrapper = ElementWrapper::new(
            &doc,
            "div",
            ReflectParams::new()
                .with_attributes(attrs.clone())
                .with_style(style.clone())
                .with_dataset(bad),
            ChildSource::default(),
        );
        assert!(matches!(wrapper.element(), Err(DomError::InvalidCharacter(_))));
        assert_eq!(attrs.subscriber_count(), 0);
        assert_eq!(style.subscriber_count(), 0);
        assert_eq!(doc.node_count(), 0);
    }

    #[test]
    fn dropped_wrapper_releases_cache_entry() {
        let doc = Document::new();
        let wrapper = ElementWrapper::from_selector(&doc, "div");
        let node = wrapper.element().unwrap();
        assert_eq!(doc.cached_wrapper_count(), 1);
        drop(wrapper);
        assert_eq!(doc.cached_wrapper_count(), 0);
        assert!(doc.contains(node));
    }

    #[test]
    fn dropped_document_is_reported() {
        let doc = Document::new();
        let wrapper = ElementWrapper::from_selector(&doc, "div");
        drop(doc);
        assert_eq!(wrapper.element(), Err(DomError::DocumentDropped));
    }
}
