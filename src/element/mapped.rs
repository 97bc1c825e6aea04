//! Observable lists projected into DOM nodes.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::dom::{Document, DomError, NodeId, WeakDocument};
use crate::reactive::{Binding, ObservableList};
use crate::reflect::{reflect_children_with, resolve_child, Child, Resolved};

type Transform<T> = dyn Fn(&Document, &T) -> Result<Child, DomError>;

/// Projects every item of an observable list through a transform.
///
/// [`element`](Self::element) returns a fragment holding the projected
/// nodes, rebuilt whenever the list changes. Once the fragment has been
/// appended into a parent, changes rebuild the items in place there.
/// [`mount`](Self::mount) projects into an element directly.
///
/// Nodes the transform returns as [`Child::Node`] or [`Child::Text`]
/// belong to the collection and are removed from the document once a later
/// change drops them. Wrappers are shared and only detached.
pub struct MappedCollection<T: Clone + 'static> {
    doc: WeakDocument,
    source: ObservableList<T>,
    transform: Rc<Transform<T>>,
    fragment: Cell<Option<NodeId>>,
}

impl<T: Clone + 'static> MappedCollection<T> {
    pub fn new(
        doc: &Document,
        source: ObservableList<T>,
        transform: impl Fn(&Document, &T) -> Result<Child, DomError> + 'static,
    ) -> Self {
        Self {
            doc: doc.downgrade(),
            source,
            transform: Rc::new(transform),
            fragment: Cell::new(None),
        }
    }

    pub fn source(&self) -> &ObservableList<T> {
        &self.source
    }

    /// The projection fragment, built on first access.
    pub fn element(&self) -> Result<NodeId, DomError> {
        let doc = self.doc.upgrade().ok_or(DomError::DocumentDropped)?;
        if let Some(fragment) = self.fragment.get().filter(|&f| doc.contains(f)) {
            return Ok(fragment);
        }
        let fragment = doc.create_fragment();
        match self.bind(&doc, fragment) {
            Ok(binding) => doc.retain_binding(fragment, binding),
            Err(error) => {
                doc.remove_node(fragment);
                return Err(error);
            }
        }
        self.fragment.set(Some(fragment));
        tracing::debug!(?fragment, items = self.source.len(), "mapped collection built");
        Ok(fragment)
    }

    /// Project the list as the children of `parent`, replacing whatever
    /// children it had. The projection lasts as long as the returned binding.
    pub fn mount(&self, parent: NodeId) -> Result<Binding, DomError> {
        let doc = self.doc.upgrade().ok_or(DomError::DocumentDropped)?;
        self.bind(&doc, parent)
    }

    fn bind(&self, doc: &Document, node: NodeId) -> Result<Binding, DomError> {
        let transform = Rc::clone(&self.transform);
        reflect_children_with(doc, node, &self.source, move |doc, item| {
            Ok(match transform(doc, item)? {
                Child::Node(node) if doc.contains(node) && !doc.is_fragment(node) => {
                    Resolved::Owned(node)
                }
                other => resolve_child(doc, &other)?,
            })
        })
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for MappedCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedCollection")
            .field("source", &self.source)
            .field("fragment", &self.fragment.get())
            .finish()
    }
}
