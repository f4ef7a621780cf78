//! The edited JSON document and its change notifications

use crate::errors::DataError;
use crate::patch::Patch;
use editron_observable::{BubblingObservable, ObserverId};
use editron_pointer::Pointer;
use serde_json::Value;
use std::cell::RefCell;
use tracing::debug;

/// Delivered to data observers when the value at `pointer` changes.
///
/// `patch` is set when an array changed by positional operations; a plain
/// overwrite carries none.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub pointer: Pointer,
    pub patch: Option<Patch>,
}

pub type DataCallback = Box<dyn Fn(&ChangeEvent)>;

/// Source of document data for the editors
pub trait DataSource {
    fn get(&self, pointer: &Pointer) -> Option<Value>;

    /// Overwrite the value at `pointer`
    fn set(&self, pointer: &Pointer, value: Value) -> Result<(), DataError>;

    /// Apply positional operations to the array at `pointer`
    fn apply_patch(&self, pointer: &Pointer, patch: Patch) -> Result<(), DataError>;

    fn observe(&self, pointer: &Pointer, callback: DataCallback, bubbling: bool) -> ObserverId;

    fn remove_observer(&self, pointer: &Pointer, id: ObserverId) -> bool;
}

/// [`DataSource`] over an owned `serde_json::Value`
pub struct DataStore {
    value: RefCell<Value>,
    observer: BubblingObservable<ChangeEvent>,
}

impl DataStore {
    pub fn new(value: Value) -> Self {
        Self {
            value: RefCell::new(value),
            observer: BubblingObservable::unbuffered(),
        }
    }

    pub fn insert_item(&self, pointer: &Pointer, index: usize, value: Value) -> Result<(), DataError> {
        self.apply_patch(pointer, Patch::new().insert(index, value))
    }

    pub fn remove_item(&self, pointer: &Pointer, index: usize) -> Result<(), DataError> {
        self.apply_patch(pointer, Patch::new().remove(index))
    }

    pub fn move_item(&self, pointer: &Pointer, from: usize, to: usize) -> Result<(), DataError> {
        self.apply_patch(pointer, Patch::new().move_item(from, to))
    }

    pub fn observer_count(&self) -> usize {
        self.observer.observer_count()
    }

    fn write(&self, pointer: &Pointer, value: Value) -> Result<(), DataError> {
        let mut root = self.value.borrow_mut();
        let Some(parent) = pointer.parent() else {
            *root = value;
            return Ok(());
        };
        let key = pointer.last_segment().unwrap_or_default();
        match root.pointer_mut(parent.to_json_pointer()) {
            Some(Value::Object(map)) => {
                map.insert(key, value);
                Ok(())
            }
            Some(Value::Array(list)) => {
                let index = key
                    .parse::<usize>()
                    .map_err(|_| DataError::NotAContainer(parent.clone()))?;
                if index < list.len() {
                    list[index] = value;
                } else if index == list.len() {
                    list.push(value);
                } else {
                    return Err(DataError::IndexOutOfBounds {
                        pointer: pointer.clone(),
                        index,
                    });
                }
                Ok(())
            }
            Some(_) => Err(DataError::NotAContainer(parent)),
            None => Err(DataError::Missing(parent)),
        }
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new(Value::Null)
    }
}

impl DataSource for DataStore {
    fn get(&self, pointer: &Pointer) -> Option<Value> {
        self.value.borrow().pointer(pointer.to_json_pointer()).cloned()
    }

    fn set(&self, pointer: &Pointer, value: Value) -> Result<(), DataError> {
        self.write(pointer, value)?;
        debug!(pointer = %pointer, "Data set");
        self.observer.notify(
            pointer,
            &ChangeEvent {
                pointer: pointer.clone(),
                patch: None,
            },
        );
        Ok(())
    }

    fn apply_patch(&self, pointer: &Pointer, patch: Patch) -> Result<(), DataError> {
        {
            let mut root = self.value.borrow_mut();
            match root.pointer_mut(pointer.to_json_pointer()) {
                Some(Value::Array(list)) => patch.apply(list, Value::clone)?,
                Some(_) => return Err(DataError::NotAnArray(pointer.clone())),
                None => return Err(DataError::Missing(pointer.clone())),
            }
        }
        debug!(pointer = %pointer, ops = patch.ops().len(), "Data patched");
        self.observer.notify(
            pointer,
            &ChangeEvent {
                pointer: pointer.clone(),
                patch: Some(patch),
            },
        );
        Ok(())
    }

    fn observe(&self, pointer: &Pointer, callback: DataCallback, bubbling: bool) -> ObserverId {
        self.observer.observe(pointer, callback, bubbling)
    }

    fn remove_observer(&self, pointer: &Pointer, id: ObserverId) -> bool {
        self.observer.remove_observer(pointer, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::rc::Rc;

    fn p(s: &str) -> Pointer {
        Pointer::parse(s).unwrap()
    }

    #[test]
    fn test_get_and_set_nested_values() {
        let data = DataStore::new(json!({ "list": [{ "name": "a" }] }));

        data.set(&p("#/list/0/name"), json!("b")).unwrap();
        data.set(&p("#/title"), json!("t")).unwrap();

        assert_eq!(data.get(&p("#/list/0/name")), Some(json!("b")));
        assert_eq!(data.get(&p("#/title")), Some(json!("t")));
        assert_eq!(data.get(&p("#/missing")), None);
    }

    #[test]
    fn test_set_into_missing_parent_fails() {
        let data = DataStore::new(json!({}));
        assert_eq!(
            data.set(&p("#/a/b"), json!(1)),
            Err(DataError::Missing(p("#/a")))
        );
    }

    #[test]
    fn test_array_operations_notify_with_patch() {
        let data = DataStore::new(json!({ "list": [1, 2, 3] }));
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        data.observe(
            &p("#/list"),
            Box::new(move |event: &ChangeEvent| sink.borrow_mut().push(event.clone())),
            false,
        );

        data.insert_item(&p("#/list"), 1, json!(9)).unwrap();
        data.move_item(&p("#/list"), 0, 3).unwrap();
        data.remove_item(&p("#/list"), 0).unwrap();

        assert_eq!(data.get(&p("#/list")), Some(json!([2, 3, 1])));
        assert_eq!(events.borrow().len(), 3);
        assert_eq!(
            events.borrow()[0].patch,
            Some(Patch::new().insert(1, json!(9)))
        );
    }

    #[test]
    fn test_rejected_patch_leaves_data_and_observers_alone() {
        let data = DataStore::new(json!({ "list": [1] }));
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        data.observe(&p("#/list"), Box::new(move |_: &ChangeEvent| *counter.borrow_mut() += 1), false);

        assert!(data.remove_item(&p("#/list"), 4).is_err());
        assert!(matches!(
            data.insert_item(&p("#"), 0, json!(1)),
            Err(DataError::NotAnArray(_))
        ));

        assert_eq!(data.get(&p("#/list")), Some(json!([1])));
        assert_eq!(*calls.borrow(), 0);
    }
}
