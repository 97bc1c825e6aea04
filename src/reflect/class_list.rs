//! One-way class list reflection from a set store.

use crate::dom::{Document, DomError, NodeId};
use crate::reactive::{Binding, Observable, ObservableSet, SetChange};

use super::require_element;

/// Keep the class list of `node` in step with the members of `classes`.
///
/// Existing classes on the element that are not in the set are left alone;
/// only membership changes of the set are mirrored.
pub fn reflect_class_list(
    doc: &Document,
    node: NodeId,
    classes: &ObservableSet,
) -> Result<Binding, DomError> {
    require_element(doc, node)?;
    for class in classes.members() {
        if !doc.class_list_contains(node, &class) {
            doc.class_list_add(node, &class)?;
        }
    }

    let weak = doc.downgrade();
    let subscription = classes.subscribe(move |change| {
        let Some(doc) = weak.upgrade() else {
            return;
        };
        let result = match change {
            SetChange::Added(class) if !doc.class_list_contains(node, class) => {
                doc.class_list_add(node, class)
            }
            SetChange::Removed(class) if doc.class_list_contains(node, class) => {
                doc.class_list_remove(node, class)
            }
            _ => Ok(()),
        };
        if let Err(error) = result {
            tracing::warn!(?node, ?change, %error, "class list reflection failed");
        }
    });
    let mut binding = Binding::new("class_list");
    binding.track_subscription(classes, subscription);
    Ok(binding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_drives_class_list() {
        let doc = Document::new();
        let el = doc.build("button.btn").unwrap();
        let classes: ObservableSet = ["primary"].into_iter().collect();
        let _binding = reflect_class_list(&doc, el, &classes).unwrap();
        assert_eq!(doc.class_list(el), vec!["btn", "primary"]);

        classes.insert("active");
        assert!(doc.class_list_contains(el, "active"));
        classes.remove("active");
        assert!(!doc.class_list_contains(el, "active"));
        classes.toggle("busy");
        assert_eq!(doc.class_list(el), vec!["btn", "primary", "busy"]);
    }

    #[test]
    fn clear_removes_members_only() {
        let doc = Document::new();
        let el = doc.build("i.icon").unwrap();
        let classes: ObservableSet = ["a", "b"].into_iter().collect();
        let _binding = reflect_class_list(&doc, el, &classes).unwrap();
        classes.clear();
        assert_eq!(doc.class_list(el), vec!["icon"]);
    }

    #[test]
    fn malformed_tokens_never_reach_the_attribute() {
        let doc = Document::new();
        let el = doc.build("p.note").unwrap();
        let bad: ObservableSet = ["two words"].into_iter().collect();
        assert_eq!(
            reflect_class_list(&doc, el, &bad).unwrap_err(),
            DomError::InvalidCharacter("two words".into())
        );

        let classes = ObservableSet::new();
        let _binding = reflect_class_list(&doc, el, &classes).unwrap();
        classes.insert("a b");
        classes.insert("");
        assert_eq!(doc.get_attribute(el, "class").as_deref(), Some("note"));
        classes.remove("a b");
        assert_eq!(doc.class_list(el), vec!["note"]);
    }
}
