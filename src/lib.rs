//! # weft
//!
//! Selector-built DOM trees with reactive reflection.
//!
//! weft turns a compact, indentation-sensitive selector string into a live
//! DOM subtree, and keeps the nodes of that subtree in sync with observable
//! stores: attributes and form properties in both directions, inline style,
//! class lists and children from store to DOM.
//!
//! ```
//! use weft::prelude::*;
//!
//! let doc = Document::new();
//! let attributes: ObservableMap = [("title", "Hello")].into_iter().collect();
//! let card = ElementWrapper::new(
//!     &doc,
//!     "ui-card.card#main[role=\"group\"]\n\t\"title\"",
//!     ReflectParams::new().with_attributes(attributes.clone()),
//!     ChildSource::default(),
//! );
//! let node = card.element().unwrap();
//! attributes.set("title", "Updated");
//! assert_eq!(doc.get_attribute(node, "title").as_deref(), Some("Updated"));
//! ```
//!
//! ## Core Systems
//!
//! - **[`selector`]** — logos tokenizer and depth-stack tree builder
//! - **[`dom`]** — slotmap-backed host DOM behind a shared [`Document`](dom::Document)
//! - **[`event`]** — bubbling event listeners, batched attribute mutation observers
//! - **[`reactive`]** — observable maps, sets and lists; scoped [`Binding`](reactive::Binding)s
//! - **[`reflect`]** — the reflectors that bind stores to node facets
//! - **[`element`]** — lazily built element wrappers and mapped collections
//! - **[`config`]** — per-document settings

// Foundation
pub mod config;

// Host DOM
pub mod dom;
pub mod event;

// Reactivity
pub mod reactive;
pub mod reflect;

// Construction
pub mod element;
pub mod selector;

/// The types most callers need.
pub mod prelude {
    pub use crate::config::DocumentConfig;
    pub use crate::dom::{Document, DomError, NodeId};
    pub use crate::element::{ChildSource, ElementWrapper, MappedCollection, Selector};
    pub use crate::event::{Event, MutationRecord};
    pub use crate::reactive::{
        Binding, KeyedStore, Observable, ObservableList, ObservableMap, ObservableSet, Value,
    };
    pub use crate::reflect::{Child, ReflectParams};
}
