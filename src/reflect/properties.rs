//! Two-way property reflection.
//!
//! Store writes assign element properties. The document's change event
//! (`change` by default) copies the configured form properties from the
//! event target back into the store.

use crate::dom::{Document, DomError, NodeId};
use crate::reactive::{Binding, KeyChange, KeyedStore, Value};

use super::require_element;

/// Reflect every key of `store` as a property of `node`, and write form
/// properties back on change events.
///
/// On each change event dispatched at or bubbling through `node`, every name
/// in [`DocumentConfig::form_properties`](crate::config::DocumentConfig) is
/// read from the event target and assigned into the store; a property the
/// target lacks deletes the key.
pub fn reflect_properties<S: KeyedStore>(
    doc: &Document,
    node: NodeId,
    store: &S,
) -> Result<Binding, DomError> {
    require_element(doc, node)?;
    for (key, value) in store.entries() {
        apply(doc, node, &key, Some(&value))?;
    }

    let mut binding = Binding::new("properties");

    let weak = doc.downgrade();
    let subscription = store.subscribe(move |change: &KeyChange| {
        let Some(doc) = weak.upgrade() else {
            return;
        };
        if let Err(error) = apply(&doc, node, &change.key, change.value.as_ref()) {
            tracing::warn!(?node, property = %change.key, %error, "property reflection failed");
        }
    });
    binding.track_subscription(store, subscription);

    let weak = doc.downgrade();
    let target = store.clone();
    let names = doc.config().form_properties.clone();
    let listener = doc.add_event_listener(node, &doc.config().change_event, move |event| {
        let Some(doc) = weak.upgrade() else {
            return;
        };
        for name in &names {
            let current = doc.property(event.target, name);
            if target.get(name) != current {
                target.assign(name, current);
            }
        }
    })?;
    let weak = doc.downgrade();
    binding.on_disconnect(move || {
        if let Some(doc) = weak.upgrade() {
            doc.remove_event_listener(node, listener);
        }
    });

    tracing::debug!(?node, "properties bound");
    Ok(binding)
}

fn apply(doc: &Document, node: NodeId, name: &str, value: Option<&Value>) -> Result<(), DomError> {
    let current = doc.property(node, name);
    match value {
        Some(value) if current.as_ref() != Some(value) => {
            doc.set_property(node, name, value.clone())
        }
        Some(_) => Ok(()),
        None if current.is_some() => doc.remove_property(node, name),
        None => Ok(()),
    }
}
