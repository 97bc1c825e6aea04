//! Observable string set, the store behind class-list reflection.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexSet;

use super::store::{Observable, SubscriptionId, Subscribers};

/// Membership change of an [`ObservableSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetChange {
    Added(String),
    Removed(String),
}

struct SetInner {
    members: RefCell<IndexSet<String>>,
    subscribers: Subscribers<SetChange>,
}

/// Insertion-ordered set of strings that notifies on membership changes.
#[derive(Clone)]
pub struct ObservableSet {
    inner: Rc<SetInner>,
}

impl ObservableSet {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SetInner {
                members: RefCell::new(IndexSet::new()),
                subscribers: Subscribers::new(),
            }),
        }
    }

    /// Add a member. Returns `false` (no notification) if already present.
    pub fn insert(&self, member: impl Into<String>) -> bool {
        let member = member.into();
        if !self.inner.members.borrow_mut().insert(member.clone()) {
            return false;
        }
        self.inner.subscribers.notify(&SetChange::Added(member));
        true
    }

    /// Remove a member. Returns `false` (no notification) if absent.
    pub fn remove(&self, member: &str) -> bool {
        if !self.inner.members.borrow_mut().shift_remove(member) {
            return false;
        }
        self.inner
            .subscribers
            .notify(&SetChange::Removed(member.to_owned()));
        true
    }

    /// Add if absent, remove if present. Returns the new membership.
    pub fn toggle(&self, member: &str) -> bool {
        if self.contains(member) {
            self.remove(member);
            false
        } else {
            self.insert(member);
            true
        }
    }

    pub fn contains(&self, member: &str) -> bool {
        self.inner.members.borrow().contains(member)
    }

    /// Remove every member, notifying once per removal.
    pub fn clear(&self) {
        let drained: Vec<String> = self.inner.members.borrow_mut().drain(..).collect();
        for member in drained {
            self.inner.subscribers.notify(&SetChange::Removed(member));
        }
    }

    /// Snapshot of the members in insertion order.
    pub fn members(&self) -> Vec<String> {
        self.inner.members.borrow().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.members.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.members.borrow().is_empty()
    }
}

impl Default for ObservableSet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObservableSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.inner.members.borrow().iter()).finish()
    }
}

impl<S: Into<String>> FromIterator<S> for ObservableSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let set = ObservableSet::new();
        set.inner
            .members
            .borrow_mut()
            .extend(iter.into_iter().map(Into::into));
        set
    }
}

impl Observable for ObservableSet {
    type Change = SetChange;

    fn subscribe(&self, callback: impl Fn(&SetChange) + 'static) -> SubscriptionId {
        self.inner.subscribers.add(Rc::new(callback))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_remove_notify() {
        let set = ObservableSet::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_c = log.clone();
        set.subscribe(move |change| log_c.borrow_mut().push(change.clone()));

        assert!(set.insert("active"));
        assert!(!set.insert("active"));
        assert!(set.remove("active"));
        assert!(!set.remove("active"));

        assert_eq!(
            *log.borrow(),
            vec![
                SetChange::Added("active".into()),
                SetChange::Removed("active".into()),
            ]
        );
    }

    #[test]
    fn toggle() {
        let set = ObservableSet::new();
        assert!(set.toggle("open"));
        assert!(set.contains("open"));
        assert!(!set.toggle("open"));
        assert!(set.is_empty());
    }

    #[test]
    fn clear_removes_each_member() {
        let set: ObservableSet = ["a", "b"].into_iter().collect();
        let removed = Rc::new(RefCell::new(Vec::new()));
        let removed_c = removed.clone();
        set.subscribe(move |change| {
            if let SetChange::Removed(m) = change {
                removed_c.borrow_mut().push(m.clone());
            }
        });
        set.clear();
        assert_eq!(*removed.borrow(), vec!["a", "b"]);
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn members_in_insertion_order() {
        let set: ObservableSet = ["z", "a"].into_iter().collect();
        set.insert("m");
        assert_eq!(set.members(), vec!["z", "a", "m"]);
    }
}
