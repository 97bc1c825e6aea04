//! The shared document handle.
//!
//! [`Document`] owns the node arena and the per-document side tables:
//! event listeners, attribute mutation observers, bindings retained per
//! node, and the weak wrapper→node association. Every method borrows its
//! table only for the duration of the call; listener, observer and store
//! callbacks always run with no borrow held, so they may freely call back
//! into the document.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::SecondaryMap;

use super::error::DomError;
use super::node::{is_valid_class_token, is_valid_name, ElementData, NodeData, NodeId, NodeKind};
use super::tree::Dom;
use crate::config::DocumentConfig;
use crate::element::registry::WeakKeyMap;
use crate::event::listener::{bubble_path, Event, ListenerId, ListenerRegistry};
use crate::event::mutation::{MutationRecord, MutationRegistry, ObserverId};
use crate::reactive::{Binding, Value};

/// Upper bound on observer delivery rounds per flush; observers that keep
/// mutating each other's attributes are cut off here.
const MAX_FLUSH_ROUNDS: usize = 64;

/// Where a fragment's children went when it was emptied into a parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Delivery {
    pub parent: NodeId,
    pub index: usize,
    pub nodes: Vec<NodeId>,
}

pub(crate) struct DocumentInner {
    config: DocumentConfig,
    dom: RefCell<Dom>,
    listeners: RefCell<ListenerRegistry>,
    mutations: RefCell<MutationRegistry>,
    bindings: RefCell<SecondaryMap<NodeId, Vec<Binding>>>,
    deliveries: RefCell<SecondaryMap<NodeId, Delivery>>,
    wrappers: RefCell<WeakKeyMap<dyn Any, NodeId>>,
}

/// Cloneable handle to a document. Clones share the same tree.
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

/// Non-owning document handle, captured by store subscriptions so they do
/// not keep the document alive.
#[derive(Clone)]
pub struct WeakDocument {
    inner: Weak<DocumentInner>,
}

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        self.inner.upgrade().map(|inner| Document { inner })
    }
}

impl fmt::Debug for WeakDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakDocument")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::default())
    }

    pub fn with_config(config: DocumentConfig) -> Self {
        Self {
            inner: Rc::new(DocumentInner {
                config,
                dom: RefCell::new(Dom::new()),
                listeners: RefCell::new(ListenerRegistry::default()),
                mutations: RefCell::new(MutationRegistry::default()),
                bindings: RefCell::new(SecondaryMap::new()),
                deliveries: RefCell::new(SecondaryMap::new()),
                wrappers: RefCell::new(WeakKeyMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.inner.config
    }

    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether both handles refer to the same document.
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Read-only access to the node arena.
    pub fn with_dom<R>(&self, f: impl FnOnce(&Dom) -> R) -> R {
        f(&self.inner.dom.borrow())
    }

    // -----------------------------------------------------------------------
    // Node creation
    // -----------------------------------------------------------------------

    pub fn create_element(&self, tag_name: &str) -> Result<NodeId, DomError> {
        if !is_valid_name(tag_name, false) {
            return Err(DomError::InvalidCharacter(tag_name.to_owned()));
        }
        Ok(self.inner.dom.borrow_mut().insert(NodeData::element(tag_name)))
    }

    pub fn create_text(&self, data: impl Into<String>) -> NodeId {
        self.inner.dom.borrow_mut().insert(NodeData::text(data))
    }

    pub fn create_fragment(&self) -> NodeId {
        self.inner.dom.borrow_mut().insert(NodeData::fragment())
    }

    /// Build a subtree from a selector string.
    ///
    /// See [`crate::selector::create_element`].
    pub fn build(&self, selector: &str) -> Result<NodeId, DomError> {
        crate::selector::create_element(self, selector)
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    pub fn contains(&self, node: NodeId) -> bool {
        self.inner.dom.borrow().contains(node)
    }

    /// Run `f` against a node's data, if the node exists.
    pub fn with_node<R>(&self, node: NodeId, f: impl FnOnce(&NodeData) -> R) -> Option<R> {
        self.inner.dom.borrow().get(node).map(f)
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.with_node(node, NodeData::is_element).unwrap_or(false)
    }

    pub fn is_fragment(&self, node: NodeId) -> bool {
        self.with_node(node, NodeData::is_fragment).unwrap_or(false)
    }

    /// Lower-cased tag name of an element.
    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        self.with_node(node, |data| data.as_element().map(|el| el.tag_name.clone()))
            .flatten()
    }

    /// Data of a text node.
    pub fn text(&self, node: NodeId) -> Option<String> {
        self.with_node(node, |data| data.as_text().map(str::to_owned))
            .flatten()
    }

    /// Concatenated data of all text nodes under `node`, in tree order.
    pub fn text_content(&self, node: NodeId) -> String {
        let dom = self.inner.dom.borrow();
        dom.walk_depth_first(node)
            .into_iter()
            .filter_map(|id| dom.get(id).and_then(NodeData::as_text))
            .collect()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.dom.borrow().parent(node)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner.dom.borrow().children(node).to_vec()
    }

    /// Number of nodes in the arena, attached or not.
    pub fn node_count(&self) -> usize {
        self.inner.dom.borrow().len()
    }

    pub fn query_by_id(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        self.inner.dom.borrow().query_by_id(scope, id)
    }

    pub fn query_by_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.inner.dom.borrow().query_by_class(scope, class)
    }

    pub fn query_by_tag(&self, scope: NodeId, tag_name: &str) -> Vec<NodeId> {
        self.inner.dom.borrow().query_by_tag(scope, tag_name)
    }

    // -----------------------------------------------------------------------
    // Tree mutation
    // -----------------------------------------------------------------------

    /// Append `child` under `parent`, moving it from any previous parent.
    /// Appending a fragment moves the fragment's children instead, and
    /// remembers where they went (see [`fragment_contents`](Self::fragment_contents)).
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insertion(parent, child)?;
        let mut dom = self.inner.dom.borrow_mut();
        let delivery = dom
            .get(child)
            .is_some_and(NodeData::is_fragment)
            .then(|| Delivery {
                parent,
                index: dom.children(parent).len(),
                nodes: dom.children(child).to_vec(),
            })
            .filter(|delivery| !delivery.nodes.is_empty());
        dom.append_child(parent, child);
        drop(dom);
        if let Some(delivery) = delivery {
            self.record_delivery(child, delivery);
        }
        Ok(())
    }

    /// Insert `child` at `index` among the children of `parent`, moving it
    /// from any previous parent. An index past the end appends.
    pub fn insert_child(&self, parent: NodeId, child: NodeId, index: usize) -> Result<(), DomError> {
        self.check_insertion(parent, child)?;
        let mut dom = self.inner.dom.borrow_mut();
        if dom.get(child).is_some_and(NodeData::is_fragment) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        dom.insert_child(parent, child, index);
        Ok(())
    }

    /// Put `new` where `old` sits under `parent`. `old` is detached, not
    /// removed from the arena.
    pub fn replace_child(&self, parent: NodeId, new: NodeId, old: NodeId) -> Result<(), DomError> {
        self.check_insertion(parent, new)?;
        if self.inner.dom.borrow().get(new).is_some_and(NodeData::is_fragment) {
            return Err(DomError::HierarchyRequest { parent, child: new });
        }
        if self.inner.dom.borrow_mut().replace_child(parent, new, old) {
            Ok(())
        } else {
            Err(DomError::NotFound(old))
        }
    }

    /// The nodes a fragment stands for: its children while it has any, and
    /// once it has been emptied into a parent, the delivered nodes that
    /// still exist.
    pub fn fragment_contents(&self, fragment: NodeId) -> Vec<NodeId> {
        let children = self.children(fragment);
        if !children.is_empty() {
            return children;
        }
        let dom = self.inner.dom.borrow();
        self.inner
            .deliveries
            .borrow()
            .get(fragment)
            .map(|delivery| delivery.nodes.iter().copied().filter(|&n| dom.contains(n)).collect())
            .unwrap_or_default()
    }

    /// Where `fragment` last delivered its children, if that parent still
    /// exists.
    pub(crate) fn delivery(&self, fragment: NodeId) -> Option<Delivery> {
        let delivery = self.inner.deliveries.borrow().get(fragment).cloned()?;
        self.contains(delivery.parent).then_some(delivery)
    }

    pub(crate) fn record_delivery(&self, fragment: NodeId, delivery: Delivery) {
        if self.contains(fragment) {
            self.inner.deliveries.borrow_mut().insert(fragment, delivery);
        }
    }

    /// Detach `child` from `parent`.
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let mut dom = self.inner.dom.borrow_mut();
        if dom.parent(child) != Some(parent) {
            return Err(DomError::NotFound(child));
        }
        dom.detach(child);
        Ok(())
    }

    /// Detach every child of `node`, returning them in order.
    pub fn clear_children(&self, node: NodeId) -> Result<Vec<NodeId>, DomError> {
        let mut dom = self.inner.dom.borrow_mut();
        if !dom.contains(node) {
            return Err(DomError::NotFound(node));
        }
        Ok(dom.clear_children(node))
    }

    /// Remove `node` and its subtree from the document for good.
    ///
    /// Tears down everything tied to the removed nodes: retained bindings,
    /// listeners, mutation observers and cached wrapper associations.
    pub fn remove_node(&self, node: NodeId) -> usize {
        let removed = self.inner.dom.borrow_mut().remove(node);
        if removed.is_empty() {
            return 0;
        }
        let mut released = Vec::new();
        {
            let mut bindings = self.inner.bindings.borrow_mut();
            let mut listeners = self.inner.listeners.borrow_mut();
            let mut mutations = self.inner.mutations.borrow_mut();
            let mut deliveries = self.inner.deliveries.borrow_mut();
            for &id in &removed {
                if let Some(list) = bindings.remove(id) {
                    released.extend(list);
                }
                deliveries.remove(id);
                listeners.forget_node(id);
                mutations.forget_node(id);
            }
        }
        self.inner
            .wrappers
            .borrow_mut()
            .retain_values(|cached| !removed.contains(cached));
        tracing::trace!(?node, nodes = removed.len(), bindings = released.len(), "removed subtree");
        // Bindings are dropped here, outside every table borrow.
        drop(released);
        removed.len()
    }

    fn check_insertion(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let dom = self.inner.dom.borrow();
        let parent_data = dom.get(parent).ok_or(DomError::NotFound(parent))?;
        if !dom.contains(child) {
            return Err(DomError::NotFound(child));
        }
        if !parent_data.is_container() || dom.is_inclusive_descendant(parent, child) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Attributes and class list
    // -----------------------------------------------------------------------

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.with_node(node, |data| {
            data.as_element()
                .and_then(|el| el.attribute(name))
                .map(str::to_owned)
        })
        .flatten()
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.get_attribute(node, name).is_some()
    }

    /// Attribute names of an element, in insertion order.
    pub fn attribute_names(&self, node: NodeId) -> Vec<String> {
        self.with_node(node, |data| {
            data.as_element()
                .map(|el| el.attributes.keys().cloned().collect())
                .unwrap_or_default()
        })
        .unwrap_or_default()
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        if !is_valid_name(name, true) {
            return Err(DomError::InvalidCharacter(name.to_owned()));
        }
        let old = self.with_element_mut(node, |el| {
            el.attributes.insert(name.to_owned(), value.to_owned())
        })?;
        self.record_attribute(node, name, old);
        Ok(())
    }

    /// Remove an attribute. Removing an absent attribute is a no-op.
    pub fn remove_attribute(&self, node: NodeId, name: &str) -> Result<(), DomError> {
        let old = self.with_element_mut(node, |el| el.attributes.shift_remove(name))?;
        if old.is_some() {
            self.record_attribute(node, name, old);
        }
        Ok(())
    }

    pub fn id(&self, node: NodeId) -> Option<String> {
        self.get_attribute(node, "id")
    }

    pub fn class_list(&self, node: NodeId) -> Vec<String> {
        self.with_node(node, |data| {
            data.as_element()
                .map(|el| el.classes().map(str::to_owned).collect())
                .unwrap_or_default()
        })
        .unwrap_or_default()
    }

    pub fn class_list_contains(&self, node: NodeId, class: &str) -> bool {
        self.with_node(node, |data| data.as_element().is_some_and(|el| el.has_class(class)))
            .unwrap_or(false)
    }

    /// Add a class token, through the `class` attribute. Empty tokens and
    /// tokens containing whitespace are rejected.
    pub fn class_list_add(&self, node: NodeId, class: &str) -> Result<(), DomError> {
        check_class_token(class)?;
        let old = self.with_element_mut(node, |el| {
            let old = el.attribute("class").map(str::to_owned);
            el.add_class(class).then_some(old)
        })?;
        if let Some(old) = old {
            self.record_attribute(node, "class", old);
        }
        Ok(())
    }

    /// Remove a class token, through the `class` attribute.
    pub fn class_list_remove(&self, node: NodeId, class: &str) -> Result<(), DomError> {
        check_class_token(class)?;
        let old = self.with_element_mut(node, |el| {
            let old = el.attribute("class").map(str::to_owned);
            el.remove_class(class).then_some(old)
        })?;
        if let Some(old) = old {
            self.record_attribute(node, "class", old);
        }
        Ok(())
    }

    fn record_attribute(&self, node: NodeId, name: &str, old_value: Option<String>) {
        let mut mutations = self.inner.mutations.borrow_mut();
        if mutations.is_observed(node) {
            mutations.record(MutationRecord {
                target: node,
                attribute_name: name.to_owned(),
                old_value,
            });
        }
    }

    // -----------------------------------------------------------------------
    // Inline style
    // -----------------------------------------------------------------------

    pub fn style_property(&self, node: NodeId, name: &str) -> Option<String> {
        self.with_node(node, |data| {
            data.as_element().and_then(|el| el.style.get(name).cloned())
        })
        .flatten()
    }

    pub fn set_style_property(&self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.with_element_mut(node, |el| {
            el.style.insert(name.to_owned(), value.to_owned());
        })
    }

    pub fn remove_style_property(&self, node: NodeId, name: &str) -> Result<(), DomError> {
        self.with_element_mut(node, |el| {
            el.style.shift_remove(name);
        })
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    pub fn property(&self, node: NodeId, name: &str) -> Option<Value> {
        self.with_node(node, |data| {
            data.as_element().and_then(|el| el.properties.get(name).cloned())
        })
        .flatten()
    }

    pub fn set_property(&self, node: NodeId, name: &str, value: Value) -> Result<(), DomError> {
        self.with_element_mut(node, |el| {
            el.properties.insert(name.to_owned(), value);
        })
    }

    pub fn remove_property(&self, node: NodeId, name: &str) -> Result<(), DomError> {
        self.with_element_mut(node, |el| {
            el.properties.shift_remove(name);
        })
    }

    fn with_element_mut<R>(
        &self,
        node: NodeId,
        f: impl FnOnce(&mut ElementData) -> R,
    ) -> Result<R, DomError> {
        let mut dom = self.inner.dom.borrow_mut();
        let data = dom.get_mut(node).ok_or(DomError::NotFound(node))?;
        match &mut data.kind {
            NodeKind::Element(el) => Ok(f(el)),
            _ => Err(DomError::NotAnElement(node)),
        }
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    pub fn add_event_listener(
        &self,
        node: NodeId,
        kind: &str,
        listener: impl Fn(&Event) + 'static,
    ) -> Result<ListenerId, DomError> {
        if !self.contains(node) {
            return Err(DomError::NotFound(node));
        }
        Ok(self
            .inner
            .listeners
            .borrow_mut()
            .add(node, kind, Rc::new(listener)))
    }

    pub fn remove_event_listener(&self, node: NodeId, id: ListenerId) -> bool {
        self.inner.listeners.borrow_mut().remove(node, id)
    }

    pub fn listener_count(&self, node: NodeId) -> usize {
        self.inner.listeners.borrow().count(node)
    }

    /// Deliver `event` to its target, then (if it bubbles) to each ancestor.
    pub fn dispatch_event(&self, event: Event) -> Result<(), DomError> {
        let target = event.target;
        let path = {
            let dom = self.inner.dom.borrow();
            if !dom.contains(target) {
                return Err(DomError::NotFound(target));
            }
            if event.bubbles {
                bubble_path(&dom, target)
            } else {
                vec![target]
            }
        };
        tracing::trace!(kind = %event.kind, ?target, path = path.len(), "dispatching event");
        let mut event = event;
        for node in path {
            let callbacks = self.inner.listeners.borrow().matching(node, &event.kind);
            event.current_target = node;
            for callback in callbacks {
                callback(&event);
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Mutation observers
    // -----------------------------------------------------------------------

    /// Watch the attributes of `node`. Records are delivered on
    /// [`flush_mutations`](Self::flush_mutations).
    pub fn observe_attributes(
        &self,
        node: NodeId,
        callback: impl Fn(&[MutationRecord]) + 'static,
    ) -> Result<ObserverId, DomError> {
        if !self.is_element(node) {
            return Err(if self.contains(node) {
                DomError::NotAnElement(node)
            } else {
                DomError::NotFound(node)
            });
        }
        Ok(self
            .inner
            .mutations
            .borrow_mut()
            .observe(node, Rc::new(callback)))
    }

    pub fn disconnect_observer(&self, id: ObserverId) -> bool {
        self.inner.mutations.borrow_mut().disconnect(id)
    }

    /// Records waiting for the next flush.
    pub fn pending_mutations(&self) -> usize {
        self.inner.mutations.borrow().pending()
    }

    /// Deliver queued mutation records until the queue stays empty.
    ///
    /// Returns the number of records delivered.
    pub fn flush_mutations(&self) -> usize {
        let mut delivered = 0;
        for _ in 0..MAX_FLUSH_ROUNDS {
            let batches = self.inner.mutations.borrow_mut().take_batches();
            if batches.is_empty() {
                return delivered;
            }
            for (callback, records) in batches {
                delivered += records.len();
                callback(&records);
            }
        }
        tracing::warn!(
            rounds = MAX_FLUSH_ROUNDS,
            pending = self.pending_mutations(),
            "mutation observers did not settle"
        );
        delivered
    }

    // -----------------------------------------------------------------------
    // Retained bindings
    // -----------------------------------------------------------------------

    /// Keep `binding` alive until `node` is removed or its bindings are
    /// released.
    pub fn retain_binding(&self, node: NodeId, binding: Binding) {
        let mut bindings = self.inner.bindings.borrow_mut();
        if !self.inner.dom.borrow().contains(node) {
            tracing::debug!(?node, binding = binding.label(), "node gone, dropping binding");
            drop(bindings);
            return;
        }
        match bindings.get_mut(node) {
            Some(list) => list.push(binding),
            None => {
                bindings.insert(node, vec![binding]);
            }
        }
    }

    /// Disconnect every binding retained for `node`. Returns how many.
    pub fn release_bindings(&self, node: NodeId) -> usize {
        let released = self.inner.bindings.borrow_mut().remove(node).unwrap_or_default();
        let count = released.len();
        drop(released);
        count
    }

    pub fn binding_count(&self, node: NodeId) -> usize {
        self.inner.bindings.borrow().get(node).map_or(0, Vec::len)
    }

    // -----------------------------------------------------------------------
    // Wrapper association
    // -----------------------------------------------------------------------

    pub(crate) fn cached_node(&self, key: &Rc<dyn Any>) -> Option<NodeId> {
        self.inner.wrappers.borrow().get(key).copied()
    }

    pub(crate) fn cache_node(&self, key: &Rc<dyn Any>, node: NodeId) {
        self.inner.wrappers.borrow_mut().insert(key, node);
    }

    /// Live entries in the wrapper→node association after pruning dead keys.
    pub fn cached_wrapper_count(&self) -> usize {
        let mut wrappers = self.inner.wrappers.borrow_mut();
        wrappers.prune();
        wrappers.len()
    }
}

fn check_class_token(class: &str) -> Result<(), DomError> {
    if is_valid_class_token(class) {
        Ok(())
    } else {
        Err(DomError::InvalidCharacter(class.to_owned()))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.node_count())
            .field("config", &self.inner.config)
            .finish()
    }
}
