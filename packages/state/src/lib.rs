//! # Editron State
//!
//! Minimal dispatch-based store shared by the editor services.
//!
//! The store is split into named slices. Each slice is written only by the
//! reducers registered for it; a dispatched [`Action`] is handed to every
//! reducer, in registration order, and the reducer's return value becomes the
//! slice's next state. Slice state is plain JSON so that services can keep
//! their own typed views over it.
//!
//! ```rust,ignore
//! let store = Store::new();
//! store.register("counter", |state, action| {
//!     let current = state.and_then(Value::as_i64).unwrap_or(0);
//!     match action.kind.as_str() {
//!         "INCREMENT" => json!(current + 1),
//!         _ => json!(current),
//!     }
//! });
//! store.dispatch(&Action::new("INCREMENT"));
//! assert_eq!(store.get("counter"), Some(json!(1)));
//! ```

mod action;

pub use action::Action;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Slice '{slice}' does not match the requested type: {source}")]
    SliceType {
        slice: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Pure reduction `(prior slice state, action) -> next slice state`.
///
/// `None` is passed while the slice has no state yet; reducers answer it with
/// their default.
pub type Reducer = Rc<dyn Fn(Option<&Value>, &Action) -> Value>;

/// Token returned by [`Store::register`], consumed by [`Store::unregister`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReducerId(u64);

struct Registration {
    id: ReducerId,
    slice: String,
    reducer: Reducer,
}

#[derive(Default)]
struct StoreInner {
    registrations: Vec<Registration>,
    slices: BTreeMap<String, Value>,
    next_id: u64,
}

/// Shared handle to the store; clones refer to the same state
#[derive(Clone, Default)]
pub struct Store {
    inner: Rc<RefCell<StoreInner>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a reducer for `slice`.
    ///
    /// The reducer runs once with [`Action::init`] so the slice has a value
    /// right away. Registering several reducers for one slice is allowed; all
    /// of them run on dispatch, later registrations seeing earlier results.
    pub fn register<F>(&self, slice: impl Into<String>, reducer: F) -> ReducerId
    where
        F: Fn(Option<&Value>, &Action) -> Value + 'static,
    {
        let slice = slice.into();
        let reducer: Reducer = Rc::new(reducer);
        let initial = reducer(self.get(&slice).as_ref(), &Action::init());

        let mut inner = self.inner.borrow_mut();
        let id = ReducerId(inner.next_id);
        inner.next_id += 1;
        inner.slices.insert(slice.clone(), initial);

        debug!(slice = %slice, reducer = id.0, "Registered reducer");
        inner.registrations.push(Registration { id, slice, reducer });
        id
    }

    /// Remove a registration. The slice's state is dropped together with its
    /// last reducer. Returns `false` for unknown registrations.
    pub fn unregister(&self, slice: &str, id: ReducerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.registrations.len();
        inner
            .registrations
            .retain(|r| !(r.id == id && r.slice == slice));
        let removed = inner.registrations.len() != before;

        if removed && !inner.registrations.iter().any(|r| r.slice == slice) {
            inner.slices.remove(slice);
        }
        debug!(slice, reducer = id.0, removed, "Unregistered reducer");
        removed
    }

    /// Hand `action` to every reducer, synchronously and in registration order.
    ///
    /// Reducers may read the store but must not dispatch themselves.
    pub fn dispatch(&self, action: &Action) {
        let registrations: Vec<(String, Reducer)> = self
            .inner
            .borrow()
            .registrations
            .iter()
            .map(|r| (r.slice.clone(), r.reducer.clone()))
            .collect();

        for (slice, reducer) in &registrations {
            let next = reducer(self.get(slice).as_ref(), action);
            self.inner.borrow_mut().slices.insert(slice.clone(), next);
        }
        trace!(action = %action.kind, reducers = registrations.len(), "Dispatched action");
    }

    /// Current state of one slice
    pub fn get(&self, slice: &str) -> Option<Value> {
        self.inner.borrow().slices.get(slice).cloned()
    }

    /// Full `{slice: state}` mapping
    pub fn get_all(&self) -> Value {
        let inner = self.inner.borrow();
        let map: Map<String, Value> = inner
            .slices
            .iter()
            .map(|(slice, state)| (slice.clone(), state.clone()))
            .collect();
        Value::Object(map)
    }

    /// Typed read of a slice
    pub fn select<T: DeserializeOwned>(&self, slice: &str) -> Result<Option<T>, StoreError> {
        let inner = self.inner.borrow();
        match inner.slices.get(slice) {
            None => Ok(None),
            Some(state) => T::deserialize(state)
                .map(Some)
                .map_err(|source| StoreError::SliceType {
                    slice: slice.to_string(),
                    source,
                }),
        }
    }

    /// Number of registrations across all slices
    pub fn reducer_count(&self) -> usize {
        self.inner.borrow().registrations.len()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Store")
            .field("slices", &inner.slices)
            .field("reducers", &inner.registrations.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn test_register_initializes_slice() {
        let store = Store::new();
        store.register("A", |_, _| json!({ "id": "A" }));

        assert_eq!(store.get("A"), Some(json!({ "id": "A" })));
    }

    #[test]
    fn test_reducer_receives_none_before_first_state() {
        let store = Store::new();
        let saw_none = Rc::new(Cell::new(false));
        let flag = saw_none.clone();
        store.register("A", move |state, _| {
            if state.is_none() {
                flag.set(true);
            }
            json!([])
        });

        assert!(saw_none.get());
    }

    #[test]
    fn test_unregister_drops_slice_with_last_reducer() {
        let store = Store::new();
        let first = store.register("A", |_, _| json!(1));
        let second = store.register("A", |_, _| json!(2));

        assert!(store.unregister("A", first));
        assert_eq!(store.get("A"), Some(json!(2)));
        assert!(store.unregister("A", second));
        assert_eq!(store.get("A"), None);
        assert!(!store.unregister("A", second));
    }

    #[test]
    fn test_reducer_can_read_other_slices() {
        let store = Store::new();
        store.register("A", |state, action| {
            let current = state.and_then(Value::as_i64).unwrap_or(0);
            if action.is("INCREMENT") {
                json!(current + 1)
            } else {
                json!(current)
            }
        });
        let reader = store.clone();
        store.register("B", move |_, _| reader.get("A").unwrap_or(Value::Null));

        store.dispatch(&Action::new("INCREMENT"));

        assert_eq!(store.get("A"), Some(json!(1)));
        assert_eq!(store.get("B"), Some(json!(1)));
    }

    #[test]
    fn test_select_reports_type_mismatch() {
        let store = Store::new();
        store.register("A", |_, _| json!("text"));

        assert!(store.select::<Vec<String>>("A").is_err());
        assert_eq!(store.select::<String>("A").unwrap(), Some("text".to_string()));
        assert_eq!(store.select::<String>("missing").unwrap(), None);
    }
}
