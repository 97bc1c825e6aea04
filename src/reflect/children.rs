//! One-way children reflection from an observable list.
//!
//! Every list change rebuilds the node's children from scratch: the old
//! children are detached, each entry is resolved to a node, and the
//! resolved nodes are appended in order. A fragment that has been emptied
//! into a parent is rebuilt in place there instead.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::dom::document::Delivery;
use crate::dom::{Document, DomError, NodeId};
use crate::element::ElementWrapper;
use crate::reactive::{Binding, Observable, ObservableList};

/// One entry of a children list.
#[derive(Clone)]
pub enum Child {
    /// Becomes a new text node.
    Text(String),
    /// An existing node, appended as-is.
    Node(NodeId),
    /// A wrapper, resolved through [`ElementWrapper::element`].
    Element(ElementWrapper),
    /// Skipped.
    Empty,
}

impl fmt::Debug for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Self::Element(wrapper) => f.debug_tuple("Element").field(wrapper).finish(),
            Self::Empty => f.write_str("Empty"),
        }
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<NodeId> for Child {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<ElementWrapper> for Child {
    fn from(wrapper: ElementWrapper) -> Self {
        Self::Element(wrapper)
    }
}

impl From<&ElementWrapper> for Child {
    fn from(wrapper: &ElementWrapper) -> Self {
        Self::Element(wrapper.clone())
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(child: Option<T>) -> Self {
        child.map_or(Self::Empty, Into::into)
    }
}

/// A list entry resolved to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// Created for this entry. Removed from the document once a later
    /// update no longer uses it.
    Owned(NodeId),
    /// Owned elsewhere; only detached when replaced.
    Shared(NodeId),
    /// A fragment, standing for [`Document::fragment_contents`]. The
    /// contents are shared.
    Fragment(NodeId),
    Skipped,
}

impl Resolved {
    /// `Shared`, or `Fragment` when `node` is a fragment.
    pub fn shared(doc: &Document, node: NodeId) -> Self {
        if doc.is_fragment(node) {
            Self::Fragment(node)
        } else {
            Self::Shared(node)
        }
    }
}

/// Default entry resolution: text becomes an owned text node, nodes and
/// wrappers are shared, fragments stand for their contents, and
/// [`Child::Empty`] and dead nodes are skipped.
pub fn resolve_child(doc: &Document, child: &Child) -> Result<Resolved, DomError> {
    Ok(match child {
        Child::Text(text) => Resolved::Owned(doc.create_text(text.as_str())),
        Child::Node(node) if doc.contains(*node) => Resolved::shared(doc, *node),
        Child::Node(node) => {
            tracing::debug!(?node, "child node no longer in document, skipped");
            Resolved::Skipped
        }
        Child::Element(wrapper) => Resolved::shared(doc, wrapper.element()?),
        Child::Empty => Resolved::Skipped,
    })
}

/// Mirror `children` as the children of `node`.
pub fn reflect_children(
    doc: &Document,
    node: NodeId,
    children: &ObservableList<Child>,
) -> Result<Binding, DomError> {
    reflect_children_with(doc, node, children, resolve_child)
}

/// Mirror `items` as the children of `node`, resolving each entry with
/// `resolver`.
///
/// `node` may be an element or a fragment. Resolution errors during the
/// initial build are returned; during later updates they are logged and the
/// children are left as they were.
pub fn reflect_children_with<T, F>(
    doc: &Document,
    node: NodeId,
    items: &ObservableList<T>,
    resolver: F,
) -> Result<Binding, DomError>
where
    T: Clone + 'static,
    F: Fn(&Document, &T) -> Result<Resolved, DomError> + 'static,
{
    match doc.with_node(node, |data| data.is_container()) {
        Some(true) => {}
        Some(false) => return Err(DomError::NotAnElement(node)),
        None => return Err(DomError::NotFound(node)),
    }

    let owned = Rc::new(RefCell::new(Vec::new()));
    replace_children(doc, node, &items.snapshot(), &resolver, &owned)?;

    let weak = doc.downgrade();
    let subscription = items.subscribe(move |change| {
        let Some(doc) = weak.upgrade() else {
            return;
        };
        if let Err(error) = replace_children(&doc, node, &change.items, &resolver, &owned) {
            tracing::warn!(?node, op = ?change.op, %error, "children reflection failed");
        }
    });
    let mut binding = Binding::new("children");
    binding.track_subscription(items, subscription);
    Ok(binding)
}

fn replace_children<T>(
    doc: &Document,
    node: NodeId,
    items: &[T],
    resolver: &impl Fn(&Document, &T) -> Result<Resolved, DomError>,
    owned: &RefCell<Vec<NodeId>>,
) -> Result<(), DomError> {
    let mut next = Vec::with_capacity(items.len());
    let mut next_owned = Vec::new();
    let mut fragments = Vec::new();
    for item in items {
        match resolver(doc, item) {
            Ok(Resolved::Owned(child)) => {
                next.push(child);
                next_owned.push(child);
            }
            Ok(Resolved::Shared(child)) => next.push(child),
            Ok(Resolved::Fragment(fragment)) => {
                let contents = doc.fragment_contents(fragment);
                fragments.push((fragment, next.len(), contents.len()));
                next.extend(contents);
            }
            Ok(Resolved::Skipped) => {}
            Err(error) => {
                discard(doc, next_owned);
                return Err(error);
            }
        }
    }

    // An emptied fragment is rebuilt where its nodes were delivered.
    let delivery = doc
        .delivery(node)
        .filter(|_| doc.children(node).is_empty());
    let host = delivery.as_ref().map_or(node, |delivery| delivery.parent);

    // Validate before clearing so a bad entry leaves the old children.
    let cycle = next
        .iter()
        .copied()
        .find(|&child| doc.with_dom(|dom| dom.is_inclusive_descendant(host, child)));
    if let Some(child) = cycle {
        discard(doc, next_owned);
        return Err(DomError::HierarchyRequest { parent: host, child });
    }

    let base = match delivery {
        Some(delivery) => splice(doc, node, delivery, &next)?,
        None => {
            if doc.children(node) != next {
                doc.clear_children(node)?;
                for &child in &next {
                    doc.append_child(node, child)?;
                }
            }
            0
        }
    };
    for (fragment, start, len) in fragments {
        let nodes = next[start..start + len].to_vec();
        doc.record_delivery(fragment, Delivery { parent: host, index: base + start, nodes });
    }

    let stale = owned.replace(next_owned);
    for child in stale {
        if !next.contains(&child) && doc.parent(child).is_none() {
            doc.remove_node(child);
        }
    }
    tracing::trace!(?node, ?host, children = next.len(), "children replaced");
    Ok(())
}

/// Swap the nodes `fragment` delivered into its parent for `next`, at the
/// same position. Returns that position.
fn splice(
    doc: &Document,
    fragment: NodeId,
    delivery: Delivery,
    next: &[NodeId],
) -> Result<usize, DomError> {
    let parent = delivery.parent;
    let previous: Vec<NodeId> = delivery
        .nodes
        .into_iter()
        .filter(|&child| doc.parent(child) == Some(parent))
        .collect();
    let siblings = doc.children(parent);
    let index = previous
        .first()
        .and_then(|first| siblings.iter().position(|c| c == first))
        .unwrap_or(delivery.index.min(siblings.len()));

    if previous != next {
        for &child in &previous {
            doc.remove_child(parent, child)?;
        }
        for (offset, &child) in next.iter().enumerate() {
            doc.insert_child(parent, child, index + offset)?;
        }
    }
    doc.record_delivery(fragment, Delivery { parent, index, nodes: next.to_vec() });
    Ok(index)
}

fn discard(doc: &Document, nodes: Vec<NodeId>) {
    for node in nodes {
        doc.remove_node(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ChildSource, ElementWrapper};
    use crate::reflect::ReflectParams;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolves_text_nodes_and_wrappers_in_order() {
        let doc = Document::new();
        let parent = doc.create_element("ul").unwrap();
        let text = doc.create_text("given");
        let wrapper = ElementWrapper::new(&doc, "li.item", ReflectParams::new(), ChildSource::default());
        let list = ObservableList::from_vec(vec![
            Child::from("a"),
            Child::from(text),
            Child::from(&wrapper),
            Child::Empty,
        ]);
        let _binding = reflect_children(&doc, parent, &list).unwrap();

        let kids = doc.children(parent);
        assert_eq!(kids.len(), 3);
        assert_eq!(doc.text(kids[0]).as_deref(), Some("a"));
        assert_eq!(kids[1], text);
        assert_eq!(kids[2], wrapper.element().unwrap());
    }

    #[test]
    fn every_change_is_a_full_replace() {
        let doc = Document::new();
        let parent = doc.create_element("p").unwrap();
        let kept = doc.create_element("b").unwrap();
        let list = ObservableList::from_vec(vec![Child::from("x"), Child::from(kept)]);
        let _binding = reflect_children(&doc, parent, &list).unwrap();
        let first_text = doc.children(parent)[0];

        list.replace(vec![Child::from("y")]);
        assert_eq!(doc.inner_html(parent), "y");
        assert!(!doc.contains(first_text), "owned text node is discarded");
        assert!(doc.contains(kept), "shared node is only detached");
        assert_eq!(doc.parent(kept), None);

        list.push(Child::from("z"));
        assert_eq!(doc.inner_html(parent), "yz");
    }

    #[test]
    fn initial_build_wipes_existing_children() {
        let doc = Document::new();
        let parent = doc.build("div span").unwrap();
        let list = ObservableList::from_vec(vec![Child::from("only")]);
        let _binding = reflect_children(&doc, parent, &list).unwrap();
        assert_eq!(doc.outer_html(parent), "<div>only</div>");
    }

    #[test]
    fn dead_node_is_skipped() {
        let doc = Document::new();
        let parent = doc.create_element("div").unwrap();
        let gone = doc.create_element("i").unwrap();
        doc.remove_node(gone);
        let list = ObservableList::from_vec(vec![Child::from(gone), Child::from("t")]);
        let _binding = reflect_children(&doc, parent, &list).unwrap();
        assert_eq!(doc.inner_html(parent), "t");
    }

    #[test]
    fn ancestor_as_child_is_an_error() {
        let doc = Document::new();
        let outer = doc.build("div p").unwrap();
        let inner = doc.children(outer)[0];
        let list = ObservableList::from_vec(vec![Child::from(outer)]);
        assert!(matches!(
            reflect_children(&doc, inner, &list),
            Err(DomError::HierarchyRequest { .. })
        ));
    }

    #[test]
    fn failed_update_leaves_children() {
        let doc = Document::new();
        let outer = doc.build("div p").unwrap();
        let inner = doc.children(outer)[0];
        let list = ObservableList::from_vec(vec![Child::from("ok")]);
        let _binding = reflect_children(&doc, inner, &list).unwrap();
        list.replace(vec![Child::from(outer)]);
        assert_eq!(doc.inner_html(inner), "ok");
    }

    #[test]
    fn custom_resolver() {
        let doc = Document::new();
        let ul = doc.create_element("ul").unwrap();
        let list = ObservableList::from_vec(vec![1, 2]);
        let _binding = reflect_children_with(&doc, ul, &list, |doc, n: &i32| {
            let li = doc.create_element("li")?;
            let text = doc.create_text(n.to_string());
            doc.append_child(li, text)?;
            Ok(Resolved::Owned(li))
        })
        .unwrap();
        assert_eq!(doc.inner_html(ul), "<li>1</li><li>2</li>");
        list.remove(0);
        assert_eq!(doc.inner_html(ul), "<li>2</li>");
        // ul + one li + its text
        assert_eq!(doc.node_count(), 3);
    }

    #[test]
    fn fragment_entry_keeps_its_nodes_across_updates() {
        let doc = Document::new();
        let parent = doc.create_element("div").unwrap();
        let fragment = doc.build("a\nb").unwrap();
        assert!(doc.is_fragment(fragment));
        let list = ObservableList::from_vec(vec![Child::from(fragment)]);
        let _binding = reflect_children(&doc, parent, &list).unwrap();
        assert_eq!(doc.inner_html(parent), "<a></a><b></b>");

        list.push(Child::from("x"));
        assert_eq!(doc.inner_html(parent), "<a></a><b></b>x");
        list.insert(0, Child::from("y"));
        assert_eq!(doc.inner_html(parent), "y<a></a><b></b>x");

        list.replace(vec![Child::from("z")]);
        assert_eq!(doc.inner_html(parent), "z");
        let [a, b] = doc.fragment_contents(fragment)[..] else {
            panic!("fragment contents lost");
        };
        assert_eq!(doc.parent(a), None);
        assert_eq!(doc.tag_name(b).as_deref(), Some("b"));
    }

    #[test]
    fn text_parent_is_rejected() {
        let doc = Document::new();
        let text = doc.create_text("x");
        let list = ObservableList::<Child>::new();
        assert_eq!(
            reflect_children(&doc, text, &list).unwrap_err(),
            DomError::NotAnElement(text)
        );
    }
}
