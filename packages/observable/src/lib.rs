//! # Editron Observable
//!
//! Event plumbing owned by individual services.
//!
//! - [`BubblingObservable`]: subscriptions keyed by document [`Pointer`]. An
//!   observer registered with `bubbling = true` also hears notifications raised
//!   anywhere below its pointer, so a container editor needs one subscription
//!   instead of one per descendant.
//! - [`Emitter`]: keyed signals (`beforeValidation`, `focus`, …) scoped to the
//!   instance that owns it.
//!
//! Both hand out subscription tokens; removing an observer never relies on
//! callback identity. Callbacks are collected before they are invoked, so a
//! callback may subscribe or unsubscribe while a notification is in flight.

mod bubbling;
mod emitter;

pub use bubbling::{BubblingObservable, ObserverId};
pub use emitter::{Emitter, ListenerId};

pub use editron_pointer::Pointer;
