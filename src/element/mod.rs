//! Element descriptors and list projections built on the reflection engine.
//!
//! - [`ElementWrapper`] — selector (or node) + params + children, built and
//!   wired once, cached in the document's weak wrapper→node association.
//! - [`MappedCollection`] — an observable list projected through a
//!   transform.
//! - [`WeakKeyMap`](registry::WeakKeyMap) — the identity-keyed weak map
//!   behind the association.

pub mod mapped;
pub mod registry;
pub mod wrapper;

pub use mapped::MappedCollection;
pub use wrapper::{ChildSource, ElementWrapper, Selector};
