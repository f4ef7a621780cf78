use editron_pointer::Pointer;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;

/// Token for a registered observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

struct ObserverEntry<E> {
    id: ObserverId,
    callback: Rc<dyn Fn(&E)>,
    bubbling: bool,
}

/// Pointer-keyed observer registry with ancestor bubbling.
///
/// Delivered events are also buffered per pointer until cleared, so late
/// readers can ask for everything raised within a scope.
pub struct BubblingObservable<E> {
    observers: RefCell<HashMap<Pointer, Vec<ObserverEntry<E>>>>,
    events: RefCell<HashMap<Pointer, Vec<E>>>,
    buffered: bool,
    next_id: Cell<u64>,
}

impl<E: Clone> BubblingObservable<E> {
    pub fn new() -> Self {
        Self {
            observers: RefCell::new(HashMap::new()),
            events: RefCell::new(HashMap::new()),
            buffered: true,
            next_id: Cell::new(0),
        }
    }

    /// An observable that delivers events without keeping them
    pub fn unbuffered() -> Self {
        Self {
            buffered: false,
            ..Self::new()
        }
    }

    /// Register `callback` at `pointer`. With `bubbling` it also fires for
    /// notifications raised at any descendant of `pointer`.
    pub fn observe<F>(&self, pointer: &Pointer, callback: F, bubbling: bool) -> ObserverId
    where
        F: Fn(&E) + 'static,
    {
        let id = ObserverId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        self.observers
            .borrow_mut()
            .entry(pointer.clone())
            .or_default()
            .push(ObserverEntry {
                id,
                callback: Rc::new(callback),
                bubbling,
            });
        id
    }

    /// Deregister an observer. Returns `false` if it was not registered at
    /// `pointer`.
    pub fn remove_observer(&self, pointer: &Pointer, id: ObserverId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let Some(entries) = observers.get_mut(pointer) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            observers.remove(pointer);
        }
        removed
    }

    /// Deliver `event` raised at `pointer`.
    ///
    /// Observers at `pointer` fire first (bubbling or not), then bubbling
    /// observers of each ancestor from the parent up to the root.
    pub fn notify(&self, pointer: &Pointer, event: &E) {
        if self.buffered {
            self.events
                .borrow_mut()
                .entry(pointer.clone())
                .or_default()
                .push(event.clone());
        }

        let callbacks = self.collect(pointer);
        trace!(pointer = %pointer, observers = callbacks.len(), "Notifying observers");
        for callback in callbacks {
            callback(event);
        }
    }

    fn collect(&self, pointer: &Pointer) -> Vec<Rc<dyn Fn(&E)>> {
        let observers = self.observers.borrow();
        let mut callbacks: Vec<Rc<dyn Fn(&E)>> = observers
            .get(pointer)
            .map(|entries| entries.iter().map(|e| e.callback.clone()).collect())
            .unwrap_or_default();

        for ancestor in pointer.ancestors() {
            if let Some(entries) = observers.get(&ancestor) {
                callbacks.extend(
                    entries
                        .iter()
                        .filter(|e| e.bubbling)
                        .map(|e| e.callback.clone()),
                );
            }
        }
        callbacks
    }

    /// Buffered events raised at `pointer`, or within it with `with_children`
    pub fn events(&self, pointer: &Pointer, with_children: bool) -> Vec<E> {
        let events = self.events.borrow();
        if !with_children {
            return events.get(pointer).cloned().unwrap_or_default();
        }
        let mut scoped: Vec<(&Pointer, &Vec<E>)> = events
            .iter()
            .filter(|(location, _)| pointer.contains(location))
            .collect();
        scoped.sort_by(|a, b| a.0.cmp(b.0));
        scoped
            .into_iter()
            .flat_map(|(_, list)| list.iter().cloned())
            .collect()
    }

    /// Drop buffered events at `pointer` and below
    pub fn clear_events(&self, pointer: &Pointer) {
        self.events
            .borrow_mut()
            .retain(|location, _| !pointer.contains(location));
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().values().map(Vec::len).sum()
    }

    /// Drop every observer and buffered event
    pub fn clear(&self) {
        self.observers.borrow_mut().clear();
        self.events.borrow_mut().clear();
    }
}

impl<E: Clone> Default for BubblingObservable<E> {
    fn default() -> Self {
        Self::new()
    }
}
