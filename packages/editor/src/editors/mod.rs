//! Editor instances.
//!
//! An [`EditorHandle`] owns one DOM node and the view of one document
//! location. It listens to three sources, each through a subscription token
//! released on [`EditorHandle::destroy`]:
//!
//! - data changes at its pointer (value refresh, child rebuild or patch)
//! - validation issues at its pointer; containers also see their descendants'
//! - the start and end of every validation pass
//!
//! Callbacks hold weak references to both the editor and the controller, so
//! subscriptions never keep an editor alive.

mod array;
mod object;

use crate::controller::{Controller, WeakController};
use crate::data::ChangeEvent;
use crate::dom::NodeId;
use crate::errors::{EditorError, EditorResult};
use crate::render::{ArrayControls, EditorKind, ViewModel};
use editron_observable::{ListenerId, ObserverId};
use editron_pointer::Pointer;
use editron_validation::{ErrorRecord, ValidationEvent};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::debug;

use array::apply_patch;

const CHILDREN_SELECTOR: &str = ".editron-container__children";

#[derive(Default)]
struct Subscriptions {
    data: Option<ObserverId>,
    errors: Option<ObserverId>,
    reset: Option<ListenerId>,
    sync: Option<ListenerId>,
}

pub(crate) struct EditorState {
    pointer: Pointer,
    kind: EditorKind,
    node: NodeId,
    /// Container element holding the children's nodes
    items: Option<NodeId>,
    view: ViewModel,
    children: Vec<EditorHandle>,
    controller: WeakController,
    subscriptions: Subscriptions,
    destroyed: bool,
}

/// Shared handle to a live editor
#[derive(Clone)]
pub struct EditorHandle {
    state: Rc<RefCell<EditorState>>,
}

/// Non-owning reference kept by the controller's instance registry
#[derive(Clone)]
pub(crate) struct WeakEditor(Weak<RefCell<EditorState>>);

impl WeakEditor {
    pub(crate) fn upgrade(&self) -> Option<EditorHandle> {
        self.0.upgrade().map(|state| EditorHandle { state })
    }

    pub(crate) fn is(&self, handle: &EditorHandle) -> bool {
        Weak::ptr_eq(&self.0, &Rc::downgrade(&handle.state))
    }
}

impl std::fmt::Debug for EditorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EditorHandle")
            .field("pointer", &state.pointer)
            .field("kind", &state.kind)
            .field("node", &state.node)
            .field("children", &state.children.len())
            .field("destroyed", &state.destroyed)
            .finish()
    }
}

impl EditorHandle {
    pub(crate) fn create(ctrl: &Controller, pointer: &Pointer) -> EditorResult<Self> {
        let schema = ctrl.schema().get(pointer);
        let kind = EditorKind::of(&schema);
        let (node, items) = {
            let mut dom = ctrl.dom_mut();
            let node = dom.create_element(kind.selector());
            let items = if kind.is_container() {
                let items = dom.create_element(CHILDREN_SELECTOR);
                dom.append_child(node, items)?;
                Some(items)
            } else {
                None
            };
            (node, items)
        };

        let text = |key: &str| schema.get(key).and_then(Value::as_str).map(str::to_string);
        let view = ViewModel {
            pointer: pointer.clone(),
            id: pointer.to_id(&ctrl.config().id_prefix),
            kind,
            title: text("title"),
            description: text("description"),
            value: Value::Null,
            errors: Vec::new(),
            nested_errors: false,
            disabled: false,
            controls: None,
        };
        let handle = EditorHandle {
            state: Rc::new(RefCell::new(EditorState {
                pointer: pointer.clone(),
                kind,
                node,
                items,
                view,
                children: Vec::new(),
                controller: ctrl.downgrade(),
                subscriptions: Subscriptions::default(),
                destroyed: false,
            })),
        };

        handle.load_errors(ctrl);
        handle.subscribe(ctrl);
        ctrl.register_instance(&handle);
        handle.refresh(ctrl)?;
        debug!(pointer = %pointer, ?kind, "Created editor");
        Ok(handle)
    }

    pub fn pointer(&self) -> Pointer {
        self.state.borrow().pointer.clone()
    }

    pub fn kind(&self) -> EditorKind {
        self.state.borrow().kind
    }

    pub fn node(&self) -> NodeId {
        self.state.borrow().node
    }

    pub fn children(&self) -> Vec<EditorHandle> {
        self.state.borrow().children.clone()
    }

    pub fn child(&self, index: usize) -> Option<EditorHandle> {
        self.state.borrow().children.get(index).cloned()
    }

    pub fn view(&self) -> ViewModel {
        self.state.borrow().view.clone()
    }

    pub fn controls(&self) -> Option<ArrayControls> {
        self.state.borrow().view.controls.clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.borrow().destroyed
    }

    /// Whether both handles refer to the same editor instance
    pub fn ptr_eq(&self, other: &EditorHandle) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub(crate) fn downgrade(&self) -> WeakEditor {
        WeakEditor(Rc::downgrade(&self.state))
    }

    fn controller(&self) -> EditorResult<Controller> {
        let state = self.state.borrow();
        if state.destroyed {
            return Err(EditorError::Detached(state.pointer.clone()));
        }
        state
            .controller
            .upgrade()
            .ok_or_else(|| EditorError::Detached(state.pointer.clone()))
    }

    /// Write `value` to the data at this editor's pointer
    pub fn set_value(&self, value: Value) -> EditorResult<()> {
        let ctrl = self.controller()?;
        ctrl.data().set(&self.pointer(), value)?;
        Ok(())
    }

    /// Make this editor the current location
    pub fn focus(&self) -> EditorResult<()> {
        let ctrl = self.controller()?;
        ctrl.location().set_current(&self.pointer());
        Ok(())
    }

    pub fn blur(&self) -> EditorResult<()> {
        let ctrl = self.controller()?;
        ctrl.location().blur(&self.pointer());
        Ok(())
    }

    /// Enable or disable this editor and everything below it
    pub fn set_active(&self, active: bool) -> EditorResult<()> {
        let ctrl = self.controller()?;
        self.activate(&ctrl, active);
        Ok(())
    }

    /// Move this editor (and its subtree) to `pointer`
    pub fn update_pointer(&self, pointer: &Pointer) -> EditorResult<()> {
        let ctrl = self.controller()?;
        self.relocate(&ctrl, pointer);
        Ok(())
    }

    /// Release the DOM node, every subscription and all children.
    /// Destroying twice is a no-op.
    pub fn destroy(&self) {
        match self.controller() {
            Ok(ctrl) => self.teardown(&ctrl),
            Err(_) => self.state.borrow_mut().destroyed = true,
        }
    }

    pub(crate) fn render(&self, ctrl: &Controller) {
        let (node, view) = {
            let state = self.state.borrow();
            (state.node, state.view.clone())
        };
        ctrl.render(node, &view);
    }

    /// Re-read this editor's data: value editors reload their value,
    /// containers reconcile their children
    pub(crate) fn refresh(&self, ctrl: &Controller) -> EditorResult<()> {
        match self.kind() {
            EditorKind::Value => {
                let value = ctrl.data().get(&self.pointer()).unwrap_or(Value::Null);
                self.state.borrow_mut().view.value = value;
                self.render(ctrl);
                Ok(())
            }
            EditorKind::Object => object::sync(ctrl, self),
            EditorKind::Array => array::sync(ctrl, self),
        }
    }

    /// Point this editor and its descendants at `pointer`.
    ///
    /// Every container renumbers through here: subscriptions are moved to
    /// the new location, the instance registry is updated and children are
    /// rebased recursively.
    pub(crate) fn relocate(&self, ctrl: &Controller, pointer: &Pointer) {
        let previous = self.pointer();
        if previous == *pointer {
            return;
        }
        self.unsubscribe(ctrl);
        {
            let mut state = self.state.borrow_mut();
            state.pointer = pointer.clone();
            state.view.pointer = pointer.clone();
            state.view.id = pointer.to_id(&ctrl.config().id_prefix);
        }
        ctrl.change_pointer(&previous, self);
        self.subscribe(ctrl);

        for child in self.children() {
            if let Some(next) = child.pointer().rebase(&previous, pointer) {
                child.relocate(ctrl, &next);
            }
        }
        self.render(ctrl);
    }

    pub(crate) fn teardown(&self, ctrl: &Controller) {
        let children = {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            std::mem::take(&mut state.children)
        };
        for child in children {
            child.teardown(ctrl);
        }
        self.unsubscribe(ctrl);

        let (pointer, node) = {
            let state = self.state.borrow();
            (state.pointer.clone(), state.node)
        };
        ctrl.dom_mut().remove(node);
        ctrl.remove_instance(&pointer, self);
        debug!(pointer = %pointer, "Destroyed editor");
    }

    fn activate(&self, ctrl: &Controller, active: bool) {
        self.state.borrow_mut().view.disabled = !active;
        for child in self.children() {
            child.activate(ctrl, active);
        }
        if self.kind() == EditorKind::Array {
            array::update_controls(ctrl, self);
        }
        self.render(ctrl);
    }

    fn subscribe(&self, ctrl: &Controller) {
        let (pointer, kind) = {
            let state = self.state.borrow();
            (state.pointer.clone(), state.kind)
        };

        let data = {
            let (editor, controller) = (self.downgrade(), ctrl.downgrade());
            ctrl.data().observe(
                &pointer,
                Box::new(move |event: &ChangeEvent| {
                    if let (Some(editor), Some(ctrl)) = (editor.upgrade(), controller.upgrade()) {
                        editor.on_data_change(&ctrl, event);
                    }
                }),
                false,
            )
        };
        let errors = {
            let (editor, controller) = (self.downgrade(), ctrl.downgrade());
            ctrl.validation().observe(
                &pointer,
                move |record: &ErrorRecord| {
                    if let (Some(editor), Some(ctrl)) = (editor.upgrade(), controller.upgrade()) {
                        editor.on_error(&ctrl, record);
                    }
                },
                kind.is_container(),
            )
        };
        let reset = {
            let (editor, controller) = (self.downgrade(), ctrl.downgrade());
            ctrl.validation().on(ValidationEvent::BeforeValidation, move |_| {
                if let (Some(editor), Some(ctrl)) = (editor.upgrade(), controller.upgrade()) {
                    editor.clear_errors(&ctrl);
                }
            })
        };
        let sync = {
            let (editor, controller) = (self.downgrade(), ctrl.downgrade());
            ctrl.validation().on(ValidationEvent::AfterValidation, move |_| {
                if let (Some(editor), Some(ctrl)) = (editor.upgrade(), controller.upgrade()) {
                    editor.load_errors(&ctrl);
                    editor.render(&ctrl);
                }
            })
        };

        self.state.borrow_mut().subscriptions = Subscriptions {
            data: Some(data),
            errors: Some(errors),
            reset: Some(reset),
            sync: Some(sync),
        };
    }

    fn unsubscribe(&self, ctrl: &Controller) {
        let (pointer, subscriptions) = {
            let mut state = self.state.borrow_mut();
            (state.pointer.clone(), std::mem::take(&mut state.subscriptions))
        };
        if let Some(id) = subscriptions.data {
            ctrl.data().remove_observer(&pointer, id);
        }
        if let Some(id) = subscriptions.errors {
            ctrl.validation().remove_observer(&pointer, id);
        }
        if let Some(id) = subscriptions.reset {
            ctrl.validation().off(ValidationEvent::BeforeValidation, id);
        }
        if let Some(id) = subscriptions.sync {
            ctrl.validation().off(ValidationEvent::AfterValidation, id);
        }
    }

    fn on_data_change(&self, ctrl: &Controller, event: &ChangeEvent) {
        if self.is_destroyed() {
            return;
        }
        let result = match (self.kind(), &event.patch) {
            (EditorKind::Array, Some(patch)) => apply_patch(ctrl, self, patch),
            _ => self.refresh(ctrl),
        };
        if let Err(e) = result {
            panic!("Editor at '{}' diverged from its data: {e}", self.pointer());
        }
    }

    fn on_error(&self, ctrl: &Controller, record: &ErrorRecord) {
        {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                return;
            }
            if record.pointer == state.pointer {
                state.view.errors.push(record.message.clone());
            } else {
                state.view.nested_errors = true;
            }
        }
        self.render(ctrl);
    }

    fn clear_errors(&self, ctrl: &Controller) {
        {
            let mut state = self.state.borrow_mut();
            state.view.errors.clear();
            state.view.nested_errors = false;
        }
        self.render(ctrl);
    }

    /// Take this editor's messages from the stored error list
    fn load_errors(&self, ctrl: &Controller) {
        let (pointer, kind) = {
            let state = self.state.borrow();
            (state.pointer.clone(), state.kind)
        };
        let records = ctrl.validation().get_errors_and_warnings(Some(&pointer), kind.is_container());
        let mut state = self.state.borrow_mut();
        state.view.errors = records
            .iter()
            .filter(|r| r.pointer == pointer)
            .map(|r| r.message.clone())
            .collect();
        state.view.nested_errors = records.iter().any(|r| r.pointer != pointer);
    }
}
