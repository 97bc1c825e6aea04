//! One-way inline style reflection.

use crate::dom::{Document, DomError, NodeId};
use crate::reactive::{Binding, KeyChange, KeyedStore, Value};

use super::require_element;

/// Reflect every key of `store` as an inline style property of `node`.
///
/// Keys are CSS property names (`background-color`). A `Null` value or a
/// deleted key removes the property. Style edits made on the element are not
/// written back.
pub fn reflect_style<S: KeyedStore>(
    doc: &Document,
    node: NodeId,
    store: &S,
) -> Result<Binding, DomError> {
    require_element(doc, node)?;
    for (key, value) in store.entries() {
        apply(doc, node, &key, Some(&value))?;
    }

    let weak = doc.downgrade();
    let subscription = store.subscribe(move |change: &KeyChange| {
        let Some(doc) = weak.upgrade() else {
            return;
        };
        if let Err(error) = apply(&doc, node, &change.key, change.value.as_ref()) {
            tracing::warn!(?node, property = %change.key, %error, "style reflection failed");
        }
    });
    let mut binding = Binding::new("style");
    binding.track_subscription(store, subscription);
    Ok(binding)
}

fn apply(doc: &Document, node: NodeId, name: &str, value: Option<&Value>) -> Result<(), DomError> {
    let current = doc.style_property(node, name);
    match value.and_then(Value::to_attribute) {
        Some(value) if current.as_deref() != Some(value.as_str()) => {
            doc.set_style_property(node, name, &value)
        }
        Some(_) => Ok(()),
        None if current.is_some() => doc.remove_style_property(node, name),
        None => Ok(()),
    }
}
