//! Event system: listeners with bubbling, attribute mutation observers.

pub mod listener;
pub mod mutation;

pub use listener::{bubble_path, Event, ListenerId};
pub use mutation::{MutationRecord, ObserverId};
