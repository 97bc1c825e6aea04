//! Host DOM: slotmap-backed node arena behind a shared [`Document`] handle.

pub mod document;
pub mod error;
pub mod node;
pub mod query;
pub mod serialize;
pub mod tree;

pub use document::{Document, WeakDocument};
pub use error::DomError;
pub use node::{ElementData, NodeData, NodeId, NodeKind};
pub use tree::Dom;
