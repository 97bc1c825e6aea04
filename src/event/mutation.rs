//! Attribute mutation observers.
//!
//! Observers watch one element's attributes. Every attribute write or removal
//! on an observed element queues a [`MutationRecord`]; queued records are
//! delivered in per-observer batches when the document flushes, the way a
//! host delivers them at its microtask checkpoint.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use slotmap::SecondaryMap;

use crate::dom::node::NodeId;

/// One observed attribute change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub attribute_name: String,
    /// Attribute value before the change, `None` if it was absent.
    pub old_value: Option<String>,
}

/// Handle returned by observer registration; pass it to
/// [`Document::disconnect_observer`](crate::dom::Document::disconnect_observer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

pub(crate) type ObserverFn = Rc<dyn Fn(&[MutationRecord])>;

struct Observer {
    target: NodeId,
    callback: ObserverFn,
}

/// Observers, their targets and the pending record queue.
#[derive(Default)]
pub(crate) struct MutationRegistry {
    next_id: u64,
    observers: HashMap<ObserverId, Observer>,
    by_node: SecondaryMap<NodeId, Vec<ObserverId>>,
    queue: VecDeque<(ObserverId, MutationRecord)>,
}

impl MutationRegistry {
    pub(crate) fn observe(&mut self, target: NodeId, callback: ObserverFn) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.insert(id, Observer { target, callback });
        match self.by_node.get_mut(target) {
            Some(ids) => ids.push(id),
            None => {
                self.by_node.insert(target, vec![id]);
            }
        }
        id
    }

    /// Stop an observer and drop its undelivered records.
    pub(crate) fn disconnect(&mut self, id: ObserverId) -> bool {
        let Some(observer) = self.observers.remove(&id) else {
            return false;
        };
        if let Some(ids) = self.by_node.get_mut(observer.target) {
            ids.retain(|&o| o != id);
        }
        self.queue.retain(|(o, _)| *o != id);
        true
    }

    /// Queue `record` for every observer of its target.
    pub(crate) fn record(&mut self, record: MutationRecord) {
        let Some(ids) = self.by_node.get(record.target) else {
            return;
        };
        for &id in ids {
            self.queue.push_back((id, record.clone()));
        }
    }

    pub(crate) fn is_observed(&self, node: NodeId) -> bool {
        self.by_node.get(node).is_some_and(|ids| !ids.is_empty())
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Drain the queue into per-observer batches, first-queued observer
    /// first.
    pub(crate) fn take_batches(&mut self) -> Vec<(ObserverFn, Vec<MutationRecord>)> {
        let mut order: Vec<ObserverId> = Vec::new();
        let mut grouped: HashMap<ObserverId, Vec<MutationRecord>> = HashMap::new();
        for (id, record) in self.queue.drain(..) {
            grouped
                .entry(id)
                .or_insert_with(|| {
                    order.push(id);
                    Vec::new()
                })
                .push(record);
        }
        order
            .into_iter()
            .filter_map(|id| {
                let records = grouped.remove(&id)?;
                let observer = self.observers.get(&id)?;
                Some((Rc::clone(&observer.callback), records))
            })
            .collect()
    }

    /// Disconnect every observer of `node`.
    pub(crate) fn forget_node(&mut self, node: NodeId) {
        if let Some(ids) = self.by_node.remove(node) {
            for id in ids {
                self.observers.remove(&id);
                self.queue.retain(|(o, _)| *o != id);
            }
        }
    }
}
