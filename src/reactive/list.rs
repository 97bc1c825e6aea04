//! Observable ordered list, the source for children reflection and mapped
//! collections.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::store::{Observable, SubscriptionId, Subscribers};

/// What happened to the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOp {
    Push,
    Insert(usize),
    Remove(usize),
    Set(usize),
    Replace,
    Clear,
}

/// Notification for an [`ObservableList`]: the operation plus the full
/// contents after it was applied.
#[derive(Debug, Clone)]
pub struct ListChange<T> {
    pub op: ListOp,
    pub items: Vec<T>,
}

struct ListInner<T: 'static> {
    items: RefCell<Vec<T>>,
    subscribers: Subscribers<ListChange<T>>,
}

/// A `Vec`-like list that notifies subscribers after every mutation.
pub struct ObservableList<T: Clone + 'static> {
    inner: Rc<ListInner<T>>,
}

impl<T: Clone + 'static> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> ObservableList<T> {
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            inner: Rc::new(ListInner {
                items: RefCell::new(items),
                subscribers: Subscribers::new(),
            }),
        }
    }

    pub fn push(&self, item: T) {
        self.inner.items.borrow_mut().push(item);
        self.emit(ListOp::Push);
    }

    /// Insert at `index`, clamped to the current length.
    pub fn insert(&self, index: usize, item: T) {
        let index = {
            let mut items = self.inner.items.borrow_mut();
            let index = index.min(items.len());
            items.insert(index, item);
            index
        };
        self.emit(ListOp::Insert(index));
    }

    /// Remove and return the item at `index`, if any.
    pub fn remove(&self, index: usize) -> Option<T> {
        let removed = {
            let mut items = self.inner.items.borrow_mut();
            (index < items.len()).then(|| items.remove(index))
        };
        if removed.is_some() {
            self.emit(ListOp::Remove(index));
        }
        removed
    }

    /// Overwrite the item at `index`, returning the previous one.
    pub fn set(&self, index: usize, item: T) -> Option<T> {
        let previous = {
            let mut items = self.inner.items.borrow_mut();
            items
                .get_mut(index)
                .map(|slot| std::mem::replace(slot, item))
        };
        if previous.is_some() {
            self.emit(ListOp::Set(index));
        }
        previous
    }

    /// Swap in entirely new contents.
    pub fn replace(&self, items: Vec<T>) {
        *self.inner.items.borrow_mut() = items;
        self.emit(ListOp::Replace);
    }

    pub fn clear(&self) {
        self.inner.items.borrow_mut().clear();
        self.emit(ListOp::Clear);
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.items.borrow().get(index).cloned()
    }

    /// Clone of the current contents.
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.items.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    fn emit(&self, op: ListOp) {
        let change = ListChange {
            op,
            items: self.snapshot(),
        };
        self.inner.subscribers.notify(&change);
    }
}

impl<T: Clone + 'static> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.items.borrow().iter()).finish()
    }
}

impl<T: Clone + 'static> FromIterator<T> for ObservableList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: Clone + 'static> Observable for ObservableList<T> {
    type Change = ListChange<T>;

    fn subscribe(&self, callback: impl Fn(&ListChange<T>) + 'static) -> SubscriptionId {
        self.inner.subscribers.add(Rc::new(callback))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.remove(id)
    }
}
