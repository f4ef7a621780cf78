//! Current and page pointers of the editor UI.
//!
//! Both pointers live in the store's `ui` slice. The page is the first
//! segment of the current pointer and selects which top-level section is
//! shown. Listeners are told when either changes, when an editor gains or
//! loses focus, and when the current location should be scrolled into view.

use editron_observable::{Emitter, ListenerId};
use editron_pointer::Pointer;
use editron_state::{Action, ReducerId, Store};
use serde_json::{json, Value};
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

pub const UI_SLICE: &str = "ui";
pub const SET_CURRENT_POINTER: &str = "SET_CURRENT_POINTER";
pub const SET_CURRENT_PAGE: &str = "SET_CURRENT_PAGE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationEvent {
    /// The page pointer changed
    Page,
    /// The current pointer changed
    Target,
    /// An editor took focus through [`LocationService::set_current`]
    Focus,
    Blur,
    /// The current location should be brought into view
    Scroll,
}

pub fn ui_reducer(state: Option<&Value>, action: &Action) -> Value {
    let mut state = state
        .cloned()
        .unwrap_or_else(|| json!({ "currentPointer": "#", "currentPage": "#" }));
    let key = match action.kind.as_str() {
        SET_CURRENT_POINTER => "currentPointer",
        SET_CURRENT_PAGE => "currentPage",
        _ => return state,
    };
    if let (Some(map), Some(pointer)) = (state.as_object_mut(), action.payload.as_str()) {
        map.insert(key.to_string(), Value::String(pointer.to_string()));
    }
    state
}

struct Inner {
    store: Store,
    reducer: Cell<Option<ReducerId>>,
    emitter: Emitter<LocationEvent, Pointer>,
}

#[derive(Clone)]
pub struct LocationService {
    inner: Rc<Inner>,
}

impl LocationService {
    pub fn new(store: Store) -> Self {
        let reducer = store.register(UI_SLICE, ui_reducer);
        Self {
            inner: Rc::new(Inner {
                store,
                reducer: Cell::new(Some(reducer)),
                emitter: Emitter::new(),
            }),
        }
    }

    pub fn current(&self) -> Pointer {
        self.read("currentPointer")
    }

    pub fn page(&self) -> Pointer {
        self.read("currentPage")
    }

    /// Jump to `target`: switch page if needed, make it current and request
    /// it be scrolled into view. The root is not a target.
    pub fn goto(&self, target: &Pointer) {
        let Some(first) = target.first_segment() else {
            return;
        };
        let page = Pointer::root().join(first);
        if page != self.page() {
            self.write(SET_CURRENT_PAGE, &page, LocationEvent::Page);
        }
        if *target != self.current() {
            self.write(SET_CURRENT_POINTER, target, LocationEvent::Target);
        }
        self.focus();
    }

    /// Record that the editor at `pointer` took focus
    pub fn set_current(&self, pointer: &Pointer) {
        if *pointer == self.current() {
            return;
        }
        self.write(SET_CURRENT_POINTER, pointer, LocationEvent::Target);
        self.inner.emitter.emit(LocationEvent::Focus, pointer);
    }

    pub fn blur(&self, pointer: &Pointer) {
        self.inner.emitter.emit(LocationEvent::Blur, pointer);
    }

    /// Ask listeners to bring the current pointer into view
    pub fn focus(&self) {
        let current = self.current();
        self.inner.emitter.emit(LocationEvent::Scroll, &current);
    }

    pub fn on<F>(&self, event: LocationEvent, callback: F) -> ListenerId
    where
        F: Fn(&Pointer) + 'static,
    {
        self.inner.emitter.on(event, callback)
    }

    pub fn off(&self, event: LocationEvent, id: ListenerId) -> bool {
        self.inner.emitter.off(event, id)
    }

    pub fn destroy(&self) {
        self.inner.emitter.clear();
        if let Some(reducer) = self.inner.reducer.take() {
            self.inner.store.unregister(UI_SLICE, reducer);
        }
    }

    fn write(&self, kind: &str, pointer: &Pointer, event: LocationEvent) {
        debug!(%pointer, action = kind, "Location change");
        self.inner
            .store
            .dispatch(&Action::with_payload(kind, Value::String(pointer.to_string())));
        self.inner.emitter.emit(event, pointer);
    }

    fn read(&self, key: &str) -> Pointer {
        self.inner
            .store
            .get(UI_SLICE)
            .and_then(|ui| ui.get(key).and_then(Value::as_str).map(str::to_string))
            .and_then(|raw| Pointer::parse(&raw).ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn p(s: &str) -> Pointer {
        Pointer::parse(s).unwrap()
    }

    fn record(location: &LocationService) -> Rc<RefCell<Vec<(LocationEvent, String)>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        for event in [
            LocationEvent::Page,
            LocationEvent::Target,
            LocationEvent::Focus,
            LocationEvent::Blur,
            LocationEvent::Scroll,
        ] {
            let log = log.clone();
            location.on(event, move |pointer| log.borrow_mut().push((event, pointer.to_string())));
        }
        log
    }

    #[test]
    fn test_starts_at_root() {
        let location = LocationService::new(Store::new());
        assert!(location.current().is_root());
        assert!(location.page().is_root());
    }

    #[test]
    fn test_goto_switches_page_and_target() {
        let store = Store::new();
        let location = LocationService::new(store.clone());
        let log = record(&location);

        location.goto(&p("#/settings/theme"));

        assert_eq!(location.page(), p("#/settings"));
        assert_eq!(location.current(), p("#/settings/theme"));
        assert_eq!(store.get(UI_SLICE).unwrap()["currentPage"], json!("#/settings"));
        assert_eq!(
            *log.borrow(),
            vec![
                (LocationEvent::Page, "#/settings".to_string()),
                (LocationEvent::Target, "#/settings/theme".to_string()),
                (LocationEvent::Scroll, "#/settings/theme".to_string()),
            ]
        );
    }

    #[test]
    fn test_goto_within_page_keeps_page() {
        let location = LocationService::new(Store::new());
        location.goto(&p("#/settings/theme"));
        let log = record(&location);

        location.goto(&p("#/settings/font"));

        assert_eq!(log.borrow()[0].0, LocationEvent::Target);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_goto_root_is_ignored() {
        let location = LocationService::new(Store::new());
        let log = record(&location);
        location.goto(&Pointer::root());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_set_current_emits_only_on_change() {
        let location = LocationService::new(Store::new());
        let log = record(&location);

        location.set_current(&p("#/a"));
        location.set_current(&p("#/a"));

        assert_eq!(
            *log.borrow(),
            vec![
                (LocationEvent::Target, "#/a".to_string()),
                (LocationEvent::Focus, "#/a".to_string()),
            ]
        );
    }

    #[test]
    fn test_destroy_releases_slice_and_listeners() {
        let store = Store::new();
        let location = LocationService::new(store.clone());
        let log = record(&location);

        location.destroy();
        location.blur(&p("#/a"));

        assert!(log.borrow().is_empty());
        assert_eq!(store.get(UI_SLICE), None);
    }
}
