//! Reflection engine: keeps DOM node facets in sync with observable stores.
//!
//! Every reflector applies the store's current contents when it is bound,
//! then follows change notifications. Store→DOM writes only happen when the
//! DOM's current value differs from the incoming one, which is what stops
//! the two-way reflectors (attributes, properties) from looping.
//!
//! | Reflector | Store → DOM | DOM → Store |
//! |---|---|---|
//! | [`reflect_attributes`] | set / remove attribute | mutation observer |
//! | [`reflect_dataset`] | `data-*` attributes | mutation observer |
//! | [`reflect_properties`] | set / remove property | change event listener |
//! | [`reflect_style`] | set / remove style property | none |
//! | [`reflect_class_list`] | add / remove class | none |
//! | [`reflect_children`] | full replace of children | none |
//!
//! Each reflector returns a [`Binding`](crate::reactive::Binding); dropping
//! it tears the wiring down.

pub mod attributes;
pub mod children;
pub mod class_list;
pub mod properties;
pub mod style;

pub use attributes::{reflect_attributes, reflect_dataset};
pub use children::{reflect_children, reflect_children_with, resolve_child, Child, Resolved};
pub use class_list::reflect_class_list;
pub use properties::reflect_properties;
pub use style::reflect_style;

use crate::dom::{Document, DomError, NodeId};
use crate::reactive::{ObservableMap, ObservableSet};

/// Store slices wired onto one element by an
/// [`ElementWrapper`](crate::element::ElementWrapper).
///
/// Cloning copies the handles; the stores themselves stay shared.
#[derive(Debug, Clone, Default)]
pub struct ReflectParams {
    pub class_list: Option<ObservableSet>,
    pub attributes: Option<ObservableMap>,
    pub dataset: Option<ObservableMap>,
    pub properties: Option<ObservableMap>,
    pub style: Option<ObservableMap>,
}

impl ReflectParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class_list(mut self, classes: ObservableSet) -> Self {
        self.class_list = Some(classes);
        self
    }

    pub fn with_attributes(mut self, attributes: ObservableMap) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub fn with_dataset(mut self, dataset: ObservableMap) -> Self {
        self.dataset = Some(dataset);
        self
    }

    pub fn with_properties(mut self, properties: ObservableMap) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn with_style(mut self, style: ObservableMap) -> Self {
        self.style = Some(style);
        self
    }

    /// Whether no slice is set.
    pub fn is_empty(&self) -> bool {
        self.class_list.is_none()
            && self.attributes.is_none()
            && self.dataset.is_none()
            && self.properties.is_none()
            && self.style.is_none()
    }
}

/// Fail unless `node` is a live element.
pub(crate) fn require_element(doc: &Document, node: NodeId) -> Result<(), DomError> {
    if doc.is_element(node) {
        Ok(())
    } else if doc.contains(node) {
        Err(DomError::NotAnElement(node))
    } else {
        Err(DomError::NotFound(node))
    }
}
