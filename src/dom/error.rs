//! Host DOM errors.

use super::node::NodeId;

/// Errors raised by host tree operations.
///
/// These mirror the exceptions a browser DOM throws; selector parsing never
/// produces them for text it cannot read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("invalid character in name {0:?}")]
    InvalidCharacter(String),
    #[error("node {0:?} does not exist")]
    NotFound(NodeId),
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
    #[error("cannot insert {child:?} under {parent:?}")]
    HierarchyRequest { parent: NodeId, child: NodeId },
    #[error("the document has been dropped")]
    DocumentDropped,
}
