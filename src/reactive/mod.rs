//! Observable stores: keyed maps, string sets, ordered lists.
//!
//! The reflectors consume only the [`Observable`] / [`KeyedStore`]
//! capability; the concrete stores here are the ones the crate ships.
//!
//! - [`ObservableMap`] — keyed values (attributes, style, properties, dataset).
//! - [`ObservableSet`] — membership (class lists).
//! - [`ObservableList`] — ordered entries (children, mapped collections).
//! - [`Binding`] — scoped teardown of whatever a reflector wired up.

pub mod binding;
pub mod list;
pub mod set;
pub mod store;
pub mod value;

pub use binding::Binding;
pub use list::{ListChange, ListOp, ObservableList};
pub use set::{ObservableSet, SetChange};
pub use store::{KeyChange, KeyedStore, Observable, ObservableMap, SubscriptionId};
pub use value::Value;
