//! Event listeners and bubble path computation.
//!
//! [`ListenerRegistry`] is the per-document side table of listeners keyed by
//! node. Dispatch itself lives on [`Document`](crate::dom::Document), which
//! uses [`bubble_path`] to walk an event from its target up through the
//! ancestors.

use std::rc::Rc;

use slotmap::SecondaryMap;

use crate::dom::node::NodeId;
use crate::dom::tree::Dom;

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A dispatched event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event type, e.g. `"change"`.
    pub kind: String,
    /// The node the event was dispatched at.
    pub target: NodeId,
    /// The node whose listener is currently running.
    pub current_target: NodeId,
    /// Whether the event continues to ancestors after the target.
    pub bubbles: bool,
}

impl Event {
    /// A bubbling event of `kind` aimed at `target`.
    pub fn new(kind: impl Into<String>, target: NodeId) -> Self {
        Self {
            kind: kind.into(),
            target,
            current_target: target,
            bubbles: true,
        }
    }

    /// Same event, confined to the target (builder).
    pub fn non_bubbling(mut self) -> Self {
        self.bubbles = false;
        self
    }
}

/// Handle returned by listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub(crate) type ListenerFn = Rc<dyn Fn(&Event)>;

struct Listener {
    id: ListenerId,
    kind: String,
    callback: ListenerFn,
}

// ---------------------------------------------------------------------------
// ListenerRegistry
// ---------------------------------------------------------------------------

/// Listeners per node, in registration order.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: u64,
    by_node: SecondaryMap<NodeId, Vec<Listener>>,
}

impl ListenerRegistry {
    pub(crate) fn add(&mut self, node: NodeId, kind: &str, callback: ListenerFn) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        let listener = Listener {
            id,
            kind: kind.to_owned(),
            callback,
        };
        match self.by_node.get_mut(node) {
            Some(list) => list.push(listener),
            None => {
                self.by_node.insert(node, vec![listener]);
            }
        }
        id
    }

    pub(crate) fn remove(&mut self, node: NodeId, id: ListenerId) -> bool {
        let Some(list) = self.by_node.get_mut(node) else {
            return false;
        };
        let before = list.len();
        list.retain(|l| l.id != id);
        list.len() != before
    }

    /// Snapshot the callbacks registered on `node` for `kind`.
    pub(crate) fn matching(&self, node: NodeId, kind: &str) -> Vec<ListenerFn> {
        self.by_node
            .get(node)
            .map(|list| {
                list.iter()
                    .filter(|l| l.kind == kind)
                    .map(|l| Rc::clone(&l.callback))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn count(&self, node: NodeId) -> usize {
        self.by_node.get(node).map_or(0, Vec::len)
    }

    pub(crate) fn forget_node(&mut self, node: NodeId) {
        self.by_node.remove(node);
    }
}

/// Compute the bubble path from `start` up to the topmost ancestor
/// (inclusive).
///
/// Returns `[start, parent, grandparent, ...]`. If `start` does not exist,
/// returns an empty vec.
pub fn bubble_path(dom: &Dom, start: NodeId) -> Vec<NodeId> {
    if !dom.contains(start) {
        return Vec::new();
    }
    let mut path = vec![start];
    path.extend(dom.ancestors(start));
    path
}
