//! Scoped teardown for reflection wiring.

use std::fmt;

use super::store::{Observable, SubscriptionId};

/// Owns the teardown of one reflector's subscriptions, listeners and
/// observers.
///
/// Dropping a binding disconnects it. Keep it alive for as long as the
/// reflection should run, typically by handing it to
/// [`Document::retain_binding`](crate::dom::Document::retain_binding) so it
/// shares the lifetime of the node it drives.
#[must_use = "dropping a Binding disconnects it immediately"]
pub struct Binding {
    label: &'static str,
    teardown: Vec<Box<dyn FnOnce()>>,
}

impl Binding {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            teardown: Vec::new(),
        }
    }

    /// Register a teardown action, run once on disconnect.
    pub fn on_disconnect(&mut self, f: impl FnOnce() + 'static) {
        self.teardown.push(Box::new(f));
    }

    /// Register removal of subscription `id` from `store`.
    pub fn track_subscription<S: Observable>(&mut self, store: &S, id: SubscriptionId) {
        let store = store.clone();
        self.on_disconnect(move || {
            store.unsubscribe(id);
        });
    }

    /// Which reflector produced this binding.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Run all teardown actions now.
    pub fn disconnect(self) {
        drop(self);
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        if self.teardown.is_empty() {
            return;
        }
        tracing::trace!(binding = self.label, actions = self.teardown.len(), "disconnecting");
        // Reverse order: listeners and observers go before the subscriptions
        // they write into.
        while let Some(action) = self.teardown.pop() {
            action();
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("label", &self.label)
            .field("actions", &self.teardown.len())
            .finish()
    }
}
