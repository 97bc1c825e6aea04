//! Tree operations: insert, append, replace, detach, remove, walk.

use std::collections::VecDeque;

use slotmap::{SecondaryMap, SlotMap};

use super::node::{NodeData, NodeId};

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

/// The node arena behind a [`Document`](super::Document).
///
/// All nodes live in a single `SlotMap`. Parent/child relationships are stored
/// in secondary maps so that node removal is O(subtree size) and lookup is O(1).
/// Nodes may exist detached (no parent), like freshly created host nodes.
pub struct Dom {
    pub(crate) nodes: SlotMap<NodeId, NodeData>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
}

impl Dom {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
        }
    }

    /// Insert a detached node.
    pub fn insert(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        id
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// A child that already has a parent is moved. A fragment child is not
    /// attached itself; its children are moved over in order and the
    /// fragment is left empty.
    ///
    /// # Panics
    ///
    /// Panics (debug) if either node does not exist.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.nodes.contains_key(parent), "parent does not exist");
        debug_assert!(self.nodes.contains_key(child), "child does not exist");

        if self.nodes[child].is_fragment() {
            let moved = self.children.get_mut(child).map(std::mem::take).unwrap_or_default();
            for node in moved {
                self.parent.remove(node);
                self.attach(parent, node, None);
            }
            return;
        }

        self.detach(child);
        self.attach(parent, child, None);
    }

    /// Insert `child` at `index` among the children of `parent`, moving it
    /// from any previous parent. An index past the end appends.
    pub fn insert_child(&mut self, parent: NodeId, child: NodeId, index: usize) {
        debug_assert!(!self.nodes[child].is_fragment(), "fragments are appended, not inserted");
        self.detach(child);
        self.attach(parent, child, Some(index));
    }

    /// Replace `old` (a child of `parent`) with `new`, keeping its position.
    ///
    /// Returns `false` and leaves the tree untouched if `old` is not a child
    /// of `parent`.
    pub fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) -> bool {
        if self.parent.get(old) != Some(&parent) {
            return false;
        }
        if new == old {
            return true;
        }
        self.detach(new);
        let Some(index) = self.index_in_parent(parent, old) else {
            return false;
        };
        self.detach(old);
        self.attach(parent, new, Some(index));
        true
    }

    /// Detach `node` from its parent, if it has one. The subtree stays in
    /// the arena.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(old_parent) = self.parent.remove(node) {
            if let Some(siblings) = self.children.get_mut(old_parent) {
                siblings.retain(|&c| c != node);
            }
        }
    }

    /// Detach every child of `node`, returning them in their former order.
    pub fn clear_children(&mut self, node: NodeId) -> Vec<NodeId> {
        let kids = self
            .children
            .get_mut(node)
            .map(std::mem::take)
            .unwrap_or_default();
        for &child in &kids {
            self.parent.remove(child);
        }
        kids
    }

    /// Remove a node and all its descendants from the arena.
    ///
    /// Returns the ids that were removed (the node first, then descendants
    /// breadth-first), or an empty vec if the node didn't exist.
    pub fn remove(&mut self, id: NodeId) -> Vec<NodeId> {
        if !self.nodes.contains_key(id) {
            return Vec::new();
        }
        self.detach(id);

        let mut removed = Vec::new();
        let mut to_remove = VecDeque::new();
        to_remove.push_back(id);

        while let Some(current) = to_remove.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                to_remove.extend(kids);
            }
            self.parent.remove(current);
            if self.nodes.remove(current).is_some() {
                removed.push(current);
            }
        }

        removed
    }

    /// Get the parent of a node, if it has one.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Get the children of a node. Returns an empty slice if the node has no children
    /// or does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Walk from `id` up to the topmost ancestor, collecting ancestor ids.
    ///
    /// The returned vec does **not** include `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    /// Whether `node` is `ancestor` or lies beneath it.
    pub fn is_inclusive_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        node == ancestor || self.ancestors(node).contains(&ancestor)
    }

    /// Immutable access to a node's data.
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    /// Mutable access to a node's data.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id)
    }

    /// Number of nodes in the arena (attached or not).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            // Push children in reverse so the first child is visited first.
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    fn index_in_parent(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, at: Option<usize>) {
        self.parent.insert(child, parent);
        if let Some(siblings) = self.children.get_mut(parent) {
            match at {
                Some(index) => siblings.insert(index.min(siblings.len()), child),
                None => siblings.push(child),
            }
        }
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a small test tree:
    /// ```text
    ///       root
    ///      /    \
    ///    a        b
    ///   / \
    ///  c   d
    /// ```
    fn build_tree() -> (Dom, NodeId, NodeId, NodeId, NodeId, NodeId) {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::element("main"));
        let a = dom.insert(NodeData::element("section"));
        let b = dom.insert(NodeData::element("aside"));
        let c = dom.insert(NodeData::element("button"));
        let d = dom.insert(NodeData::text("label"));
        dom.append_child(root, a);
        dom.append_child(root, b);
        dom.append_child(a, c);
        dom.append_child(a, d);
        (dom, root, a, b, c, d)
    }

    #[test]
    fn insert_is_detached() {
        let mut dom = Dom::new();
        let id = dom.insert(NodeData::element("div"));
        assert_eq!(dom.parent(id), None);
        assert!(dom.children(id).is_empty());
    }

    #[test]
    fn parent_relationship() {
        let (dom, root, a, _b, c, _d) = build_tree();
        assert_eq!(dom.parent(a), Some(root));
        assert_eq!(dom.parent(c), Some(a));
        assert_eq!(dom.parent(root), None);
    }

    #[test]
    fn children_list() {
        let (dom, root, a, b, c, d) = build_tree();
        assert_eq!(dom.children(root), &[a, b]);
        assert_eq!(dom.children(a), &[c, d]);
        assert!(dom.children(c).is_empty());
    }

    #[test]
    fn append_moves_existing_child() {
        let (mut dom, root, a, b, c, d) = build_tree();
        dom.append_child(b, c);
        assert_eq!(dom.parent(c), Some(b));
        assert_eq!(dom.children(a), &[d]);
        assert_eq!(dom.ancestors(c), vec![b, root]);
    }

    #[test]
    fn append_fragment_moves_its_children() {
        let mut dom = Dom::new();
        let parent = dom.insert(NodeData::element("ul"));
        let frag = dom.insert(NodeData::fragment());
        let x = dom.insert(NodeData::element("li"));
        let y = dom.insert(NodeData::element("li"));
        dom.append_child(frag, x);
        dom.append_child(frag, y);

        dom.append_child(parent, frag);
        assert_eq!(dom.children(parent), &[x, y]);
        assert!(dom.children(frag).is_empty());
        assert_eq!(dom.parent(frag), None);
        assert_eq!(dom.parent(x), Some(parent));
    }

    #[test]
    fn replace_child_keeps_position() {
        let (mut dom, root, a, b, _c, _d) = build_tree();
        let z = dom.insert(NodeData::element("nav"));
        assert!(dom.replace_child(root, z, a));
        assert_eq!(dom.children(root), &[z, b]);
        assert_eq!(dom.parent(a), None);
        assert!(dom.contains(a));
    }

    #[test]
    fn replace_child_rejects_non_child() {
        let (mut dom, root, _a, _b, c, _d) = build_tree();
        let z = dom.insert(NodeData::element("nav"));
        assert!(!dom.replace_child(root, z, c));
        assert_eq!(dom.parent(z), None);
    }

    #[test]
    fn clear_children_detaches() {
        let (mut dom, _root, a, _b, c, d) = build_tree();
        assert_eq!(dom.clear_children(a), vec![c, d]);
        assert!(dom.children(a).is_empty());
        assert_eq!(dom.parent(c), None);
        assert!(dom.contains(d));
    }

    #[test]
    fn remove_subtree() {
        let (mut dom, root, a, b, c, d) = build_tree();
        let removed = dom.remove(a);
        assert_eq!(removed, vec![a, c, d]);
        assert!(!dom.contains(c));
        assert_eq!(dom.children(root), &[b]);
        assert_eq!(dom.len(), 2);
    }

    #[test]
    fn remove_nonexistent() {
        let mut dom = Dom::new();
        let id = dom.insert(NodeData::element("x"));
        dom.remove(id);
        assert!(dom.remove(id).is_empty());
        assert!(dom.is_empty());
    }

    #[test]
    fn inclusive_descendant() {
        let (dom, root, a, b, c, _d) = build_tree();
        assert!(dom.is_inclusive_descendant(c, root));
        assert!(dom.is_inclusive_descendant(a, a));
        assert!(!dom.is_inclusive_descendant(c, b));
    }

    #[test]
    fn walk_depth_first() {
        let (dom, root, a, b, c, d) = build_tree();
        assert_eq!(dom.walk_depth_first(root), vec![root, a, c, d, b]);
    }

    #[test]
    fn insert_child_at_index() {
        let (mut dom, root, a, b, _c, _d) = build_tree();
        let z = dom.insert(NodeData::element("nav"));
        dom.insert_child(root, z, 1);
        assert_eq!(dom.children(root), &[a, z, b]);
        dom.insert_child(root, a, 9);
        assert_eq!(dom.children(root), &[z, b, a]);
    }
}
