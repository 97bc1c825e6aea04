//! Two-way attribute reflection.
//!
//! Store writes become `set_attribute` / `remove_attribute` calls; attribute
//! mutations on the element, delivered by a mutation observer, are written
//! back into the store.

use crate::dom::{Document, DomError, NodeId};
use crate::reactive::{Binding, KeyChange, KeyedStore, Value};

use super::require_element;

/// How store keys map to attribute names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyMapping {
    /// Key and attribute name are the same.
    Identity,
    /// `fooBar` ↔ `data-foo-bar`.
    Dataset,
}

impl KeyMapping {
    fn attribute_name(self, key: &str) -> String {
        match self {
            Self::Identity => key.to_owned(),
            Self::Dataset => {
                let mut name = String::with_capacity(key.len() + 5);
                name.push_str("data-");
                for c in key.chars() {
                    if c.is_ascii_uppercase() {
                        name.push('-');
                        name.push(c.to_ascii_lowercase());
                    } else {
                        name.push(c);
                    }
                }
                name
            }
        }
    }

    /// Store key for an attribute, or `None` if the attribute is outside
    /// this mapping.
    fn store_key(self, attribute: &str) -> Option<String> {
        match self {
            Self::Identity => Some(attribute.to_owned()),
            Self::Dataset => {
                let rest = attribute.strip_prefix("data-")?;
                let mut key = String::with_capacity(rest.len());
                let mut chars = rest.chars().peekable();
                while let Some(c) = chars.next() {
                    match chars.peek() {
                        Some(next) if c == '-' && next.is_ascii_lowercase() => {
                            key.push(next.to_ascii_uppercase());
                            chars.next();
                        }
                        _ => key.push(c),
                    }
                }
                Some(key)
            }
        }
    }
}

/// Reflect every key of `store` as an attribute of `node`, both ways.
///
/// A `Null` value or a deleted key removes the attribute. Changing or
/// removing an attribute on the element writes the new value (or a delete)
/// back into the store once mutations are flushed.
pub fn reflect_attributes<S: KeyedStore>(
    doc: &Document,
    node: NodeId,
    store: &S,
) -> Result<Binding, DomError> {
    reflect_mapped(doc, node, store, KeyMapping::Identity, "attributes")
}

/// Like [`reflect_attributes`], but keys are dataset names: `userId` is
/// reflected as the `data-user-id` attribute. Attributes without the
/// `data-` prefix are not written back.
pub fn reflect_dataset<S: KeyedStore>(
    doc: &Document,
    node: NodeId,
    store: &S,
) -> Result<Binding, DomError> {
    reflect_mapped(doc, node, store, KeyMapping::Dataset, "dataset")
}

fn reflect_mapped<S: KeyedStore>(
    doc: &Document,
    node: NodeId,
    store: &S,
    mapping: KeyMapping,
    label: &'static str,
) -> Result<Binding, DomError> {
    require_element(doc, node)?;
    for (key, value) in store.entries() {
        apply(doc, node, &mapping.attribute_name(&key), Some(&value))?;
    }

    let mut binding = Binding::new(label);

    let weak = doc.downgrade();
    let subscription = store.subscribe(move |change: &KeyChange| {
        let Some(doc) = weak.upgrade() else {
            return;
        };
        let name = mapping.attribute_name(&change.key);
        if let Err(error) = apply(&doc, node, &name, change.value.as_ref()) {
            tracing::warn!(?node, attribute = %name, %error, "attribute reflection failed");
        }
    });
    binding.track_subscription(store, subscription);

    let weak = doc.downgrade();
    let target = store.clone();
    let observer = doc.observe_attributes(node, move |records| {
        let Some(doc) = weak.upgrade() else {
            return;
        };
        for record in records {
            let Some(key) = mapping.store_key(&record.attribute_name) else {
                continue;
            };
            let current = doc.get_attribute(record.target, &record.attribute_name);
            let stored = target.get(&key).and_then(|v| v.to_attribute());
            if stored != current {
                tracing::trace!(?node, %key, "writing attribute back to store");
                target.assign(&key, current.map(Value::Text));
            }
        }
    })?;
    let weak = doc.downgrade();
    binding.on_disconnect(move || {
        if let Some(doc) = weak.upgrade() {
            doc.disconnect_observer(observer);
        }
    });

    tracing::debug!(?node, binding = label, "attributes bound");
    Ok(binding)
}

fn apply(doc: &Document, node: NodeId, name: &str, value: Option<&Value>) -> Result<(), DomError> {
    let current = doc.get_attribute(node, name);
    match value.and_then(Value::to_attribute) {
        Some(value) if current.as_deref() != Some(value.as_str()) => {
            doc.set_attribute(node, name, &value)
        }
        Some(_) => Ok(()),
        None if current.is_some() => doc.remove_attribute(node, name),
        None => Ok(()),
    }
}
