//! Observable keyed stores.
//!
//! Stores are explicit publish/subscribe objects: every write that changes a
//! value notifies subscribers synchronously with a [`KeyChange`]. Callbacks run
//! after the store has released its internal borrows, so a subscriber may
//! write back into the same store.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::value::Value;

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

/// Handle identifying one subscription on one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Anything whose changes can be subscribed to.
pub trait Observable: Clone + 'static {
    /// Payload delivered to subscribers on each change.
    type Change: 'static;

    /// Register `callback`; it runs synchronously after every change.
    fn subscribe(&self, callback: impl Fn(&Self::Change) + 'static) -> SubscriptionId;

    /// Remove a subscription. Returns `false` if it was already gone.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// Subscriber list shared by the store implementations.
pub(crate) struct Subscribers<C: 'static> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(SubscriptionId, Rc<dyn Fn(&C)>)>>,
}

impl<C: 'static> Subscribers<C> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            entries: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn add(&self, callback: Rc<dyn Fn(&C)>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.entries.borrow_mut().push((id, callback));
        id
    }

    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(sid, _)| *sid != id);
        entries.len() != before
    }

    /// Call every subscriber in registration order.
    ///
    /// The list is snapshotted first; subscriptions added or removed by a
    /// callback take effect from the next change.
    pub(crate) fn notify(&self, change: &C) {
        let snapshot: Vec<Rc<dyn Fn(&C)>> = self
            .entries
            .borrow()
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for cb in snapshot {
            cb(change);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

impl<C: 'static> Default for Subscribers<C> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// KeyedStore
// ---------------------------------------------------------------------------

/// Notification for a single key of a keyed store.
///
/// `None` means the key is absent (deleted or never set).
#[derive(Debug, Clone, PartialEq)]
pub struct KeyChange {
    pub key: String,
    pub value: Option<Value>,
    pub old: Option<Value>,
}

/// A string-keyed observable store: the capability the reflectors consume.
pub trait KeyedStore: Observable<Change = KeyChange> {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value);

    fn delete(&self, key: &str);

    /// Current contents, in insertion order.
    fn entries(&self) -> Vec<(String, Value)>;

    /// Set `key` to `value`, or delete it when `value` is `None`.
    fn assign(&self, key: &str, value: Option<Value>) {
        match value {
            Some(value) => self.set(key, value),
            None => self.delete(key),
        }
    }
}

// ---------------------------------------------------------------------------
// ObservableMap
// ---------------------------------------------------------------------------

struct MapInner {
    values: RefCell<IndexMap<String, Value>>,
    subscribers: Subscribers<KeyChange>,
}

/// Insertion-ordered observable map from string keys to [`Value`]s.
///
/// Cloning is cheap and yields a handle to the same store.
#[derive(Clone)]
pub struct ObservableMap {
    inner: Rc<MapInner>,
}

impl ObservableMap {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(MapInner {
                values: RefCell::new(IndexMap::new()),
                subscribers: Subscribers::new(),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.values.borrow().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.values.borrow().contains_key(key)
    }

    /// Write a value. Returns `true` (and notifies) only if it changed.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        let old = {
            let mut values = self.inner.values.borrow_mut();
            if values.get(key) == Some(&value) {
                return false;
            }
            values.insert(key.to_owned(), value.clone())
        };
        self.inner.subscribers.notify(&KeyChange {
            key: key.to_owned(),
            value: Some(value),
            old,
        });
        true
    }

    /// Remove a key. Returns `true` (and notifies) only if it was present.
    pub fn delete(&self, key: &str) -> bool {
        let old = self.inner.values.borrow_mut().shift_remove(key);
        match old {
            Some(old) => {
                self.inner.subscribers.notify(&KeyChange {
                    key: key.to_owned(),
                    value: None,
                    old: Some(old),
                });
                true
            }
            None => false,
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.values.borrow().keys().cloned().collect()
    }

    pub fn entries(&self) -> Vec<(String, Value)> {
        self.inner
            .values
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.values.borrow().is_empty()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

impl Default for ObservableMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObservableMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.inner.values.borrow().iter())
            .finish()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ObservableMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = ObservableMap::new();
        {
            let mut values = map.inner.values.borrow_mut();
            for (k, v) in iter {
                values.insert(k.into(), v.into());
            }
        }
        map
    }
}

impl Observable for ObservableMap {
    type Change = KeyChange;

    fn subscribe(&self, callback: impl Fn(&KeyChange) + 'static) -> SubscriptionId {
        self.inner.subscribers.add(Rc::new(callback))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.remove(id)
    }
}

impl KeyedStore for ObservableMap {
    fn get(&self, key: &str) -> Option<Value> {
        ObservableMap::get(self, key)
    }

    fn set(&self, key: &str, value: Value) {
        ObservableMap::set(self, key, value);
    }

    fn delete(&self, key: &str) {
        ObservableMap::delete(self, key);
    }

    fn entries(&self) -> Vec<(String, Value)> {
        ObservableMap::entries(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(map: &ObservableMap) -> Rc<RefCell<Vec<KeyChange>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_c = log.clone();
        map.subscribe(move |change| log_c.borrow_mut().push(change.clone()));
        log
    }

    #[test]
    fn set_and_get() {
        let map = ObservableMap::new();
        assert!(map.set("title", "hello"));
        assert_eq!(map.get("title"), Some(Value::from("hello")));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn set_notifies_with_old_value() {
        let map = ObservableMap::new();
        let log = recorder(&map);
        map.set("n", 1);
        map.set("n", 2);
        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].old, Some(Value::from(1)));
        assert_eq!(log[1].value, Some(Value::from(2)));
    }

    #[test]
    fn equal_write_is_silent() {
        let map = ObservableMap::new();
        let log = recorder(&map);
        map.set("a", "x");
        assert!(!map.set("a", "x"));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn delete_notifies_absent_value() {
        let map: ObservableMap = [("a", "x")].into_iter().collect();
        let log = recorder(&map);
        assert!(map.delete("a"));
        assert!(!map.delete("a"));
        let log = log.borrow();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].value, None);
        assert_eq!(log[0].old, Some(Value::from("x")));
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let map = ObservableMap::new();
        let count = Rc::new(Cell::new(0));
        let count_c = count.clone();
        let id = map.subscribe(move |_| count_c.set(count_c.get() + 1));
        map.set("a", 1);
        assert!(map.unsubscribe(id));
        assert!(!map.unsubscribe(id));
        map.set("a", 2);
        assert_eq!(count.get(), 1);
        assert_eq!(map.subscriber_count(), 0);
    }

    #[test]
    fn subscriber_may_write_back() {
        let map = ObservableMap::new();
        let handle = map.clone();
        map.subscribe(move |change| {
            if change.key == "celsius" {
                if let Some(c) = change.value.as_ref().and_then(Value::as_f64) {
                    handle.set("fahrenheit", c * 9.0 / 5.0 + 32.0);
                }
            }
        });
        map.set("celsius", 100);
        assert_eq!(map.get("fahrenheit"), Some(Value::Number(212.0)));
    }

    #[test]
    fn entries_keep_insertion_order() {
        let map: ObservableMap = [("b", 1), ("a", 2), ("c", 3)].into_iter().collect();
        map.delete("a");
        assert_eq!(map.keys(), vec!["b", "c"]);
    }

    #[test]
    fn assign_none_deletes() {
        let map: ObservableMap = [("k", "v")].into_iter().collect();
        KeyedStore::assign(&map, "k", None);
        assert!(!map.contains_key("k"));
        KeyedStore::assign(&map, "k", Some(Value::Bool(true)));
        assert_eq!(map.get("k"), Some(Value::Bool(true)));
    }
}
