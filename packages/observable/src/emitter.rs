use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

/// Token for a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<E> = (ListenerId, Rc<dyn Fn(&E)>);

/// Keyed signal emitter owned by a single service instance
pub struct Emitter<K, E> {
    listeners: RefCell<HashMap<K, Vec<Listener<E>>>>,
    next_id: Cell<u64>,
}

impl<K: Eq + Hash + Copy, E> Emitter<K, E> {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
        }
    }

    pub fn on<F>(&self, kind: K, callback: F) -> ListenerId
    where
        F: Fn(&E) + 'static,
    {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push((id, Rc::new(callback)));
        id
    }

    pub fn off(&self, kind: K, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(list) = listeners.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(listener, _)| *listener != id);
        before != list.len()
    }

    pub fn emit(&self, kind: K, event: &E) {
        let callbacks: Vec<Rc<dyn Fn(&E)>> = self
            .listeners
            .borrow()
            .get(&kind)
            .map(|list| list.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default();
        for callback in callbacks {
            callback(event);
        }
    }

    pub fn listener_count(&self, kind: K) -> usize {
        self.listeners.borrow().get(&kind).map_or(0, Vec::len)
    }

    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }
}

impl<K: Eq + Hash + Copy, E> Default for Emitter<K, E> {
    fn default() -> Self {
        Self::new()
    }
}
