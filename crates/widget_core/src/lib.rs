//! Reactive toggle widgets over an abstract render tree.
//!
//! Every widget owns a typed value, a render subtree it builds and mutates
//! itself, and an [`Emitter`] through which it publishes change notifications.
//! Composite widgets subscribe to their children explicitly.

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod async_group;
pub mod attributes;
pub mod emitter;
pub mod item_group;
pub mod render;
pub mod source;
pub mod toggle;

pub use async_group::{AsyncGroupWidget, PopulateError, PopulationStatus};
pub use attributes::Attributes;
pub use emitter::{Emitter, Subscription};
pub use item_group::ItemGroupWidget;
pub use render::{NodeKind, RenderNode, Widget};
pub use source::{HttpPairSource, MissingPairSource, PairSource, SourceError, StaticPairSource};
pub use toggle::ToggleWidget;

/// Locks widget state, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
