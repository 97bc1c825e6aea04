//! Weak-keyed association map.
//!
//! Keys are held by [`Weak`] reference and compared by identity, values are
//! held strongly. An entry stops resolving as soon as its key's last strong
//! reference is dropped, and is physically removed on the next
//! [`prune`](WeakKeyMap::prune) or insert.

use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

pub struct WeakKeyMap<K: ?Sized, V> {
    entries: HashMap<usize, (Weak<K>, V)>,
}

fn address<K: ?Sized>(key: &Rc<K>) -> usize {
    Rc::as_ptr(key) as *const () as usize
}

impl<K: ?Sized, V> WeakKeyMap<K, V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Value associated with `key`, if the entry is still live.
    pub fn get(&self, key: &Rc<K>) -> Option<&V> {
        let (weak, value) = self.entries.get(&address(key))?;
        let alive = weak.upgrade().is_some_and(|k| Rc::ptr_eq(&k, key));
        alive.then_some(value)
    }

    /// Associate `value` with `key`, returning the previous live value.
    pub fn insert(&mut self, key: &Rc<K>, value: V) -> Option<V> {
        self.prune();
        self.entries
            .insert(address(key), (Rc::downgrade(key), value))
            .map(|(_, old)| old)
    }

    pub fn remove(&mut self, key: &Rc<K>) -> Option<V> {
        self.get(key)?;
        self.entries.remove(&address(key)).map(|(_, v)| v)
    }

    /// Drop entries whose value fails `keep`.
    pub fn retain_values(&mut self, mut keep: impl FnMut(&V) -> bool) {
        self.entries.retain(|_, (_, v)| keep(v));
    }

    /// Remove entries whose key has been dropped. Returns how many went.
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, (weak, _)| weak.strong_count() > 0);
        before - self.entries.len()
    }

    /// Number of stored entries, dead ones included until pruned.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: ?Sized, V> Default for WeakKeyMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ?Sized, V: fmt::Debug> fmt::Debug for WeakKeyMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakKeyMap")
            .field("entries", &self.entries.len())
            .finish()
    }
}
