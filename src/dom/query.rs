//! DOM queries: by id, class, tag name; generic predicate matching.
//!
//! Queries are scoped to the subtree under a given node and return matches in
//! document (pre-order) order, the start node included.

use super::node::{ElementData, NodeId};
use super::tree::Dom;

impl Dom {
    /// Find the first element under `scope` whose `id` attribute matches.
    pub fn query_by_id(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        self.query_all(scope, |el| el.id() == Some(id)).into_iter().next()
    }

    /// Find all elements under `scope` that have the given class token.
    pub fn query_by_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.query_all(scope, |el| el.has_class(class))
    }

    /// Find all elements under `scope` with the given tag name
    /// (case-insensitive).
    pub fn query_by_tag(&self, scope: NodeId, tag_name: &str) -> Vec<NodeId> {
        let wanted = tag_name.to_ascii_lowercase();
        self.query_all(scope, |el| el.tag_name == wanted)
    }

    /// Find all elements under `scope` matching an arbitrary predicate.
    pub fn query_all(&self, scope: NodeId, predicate: impl Fn(&ElementData) -> bool) -> Vec<NodeId> {
        self.walk_depth_first(scope)
            .into_iter()
            .filter(|&id| {
                self.get(id)
                    .and_then(|data| data.as_element())
                    .is_some_and(&predicate)
            })
            .collect()
    }
}
