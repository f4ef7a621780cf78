//! Wires the collaborators together and owns every editor.
//!
//! The controller holds the store, the validation and location services, the
//! data and schema sources, the renderer and the DOM arena. Editors reach all
//! of them through a [`WeakController`], so dropping the last [`Controller`]
//! releases everything.

use crate::config::EditronConfig;
use crate::data::{DataSource, DataStore};
use crate::dom::{Dom, NodeId};
use crate::editors::{EditorHandle, WeakEditor};
use crate::errors::{EditorError, EditorResult};
use crate::location::{LocationEvent, LocationService};
use crate::render::{AttributeRenderer, EditorKind, Renderer, ViewModel};
use crate::schema::{JsonSchema, SchemaSource};
use editron_observable::ListenerId;
use editron_pointer::Pointer;
use editron_state::Store;
use editron_validation::{ErrorRecord, ValidationPass, ValidationService, Validator};
use serde_json::Value;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use tracing::{debug, info};

struct Inner {
    store: Store,
    data: Rc<dyn DataSource>,
    schema: Rc<dyn SchemaSource>,
    validation: ValidationService,
    location: LocationService,
    renderer: Rc<dyn Renderer>,
    config: EditronConfig,
    dom: RefCell<Dom>,
    instances: RefCell<HashMap<Pointer, Vec<WeakEditor>>>,
    root: RefCell<Option<EditorHandle>>,
    scroll: Cell<Option<ListenerId>>,
}

#[derive(Clone)]
pub struct Controller {
    inner: Rc<Inner>,
}

#[derive(Clone, Default)]
pub struct WeakController {
    inner: Weak<Inner>,
}

impl WeakController {
    pub fn upgrade(&self) -> Option<Controller> {
        self.inner.upgrade().map(|inner| Controller { inner })
    }
}

/// What a list operation requested through the [`Controller`] did
pub enum ItemChange {
    /// The control is not offered; the data is untouched
    Refused,
    /// Applied. With live validation the pass revalidates the whole list,
    /// since every item after the change point has a new index.
    Applied(Option<ValidationPass>),
}

impl ItemChange {
    pub fn is_applied(&self) -> bool {
        matches!(self, ItemChange::Applied(_))
    }

    pub fn into_pass(self) -> Option<ValidationPass> {
        match self {
            ItemChange::Applied(pass) => pass,
            ItemChange::Refused => None,
        }
    }
}

impl std::fmt::Debug for ItemChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemChange::Refused => f.write_str("Refused"),
            ItemChange::Applied(pass) => f
                .debug_struct("Applied")
                .field("validating", &pass.is_some())
                .finish(),
        }
    }
}

fn no_issues(_schema: &Value, _data: &Value, _pointer: &Pointer) -> Vec<ErrorRecord> {
    Vec::new()
}

pub struct ControllerBuilder {
    schema: Value,
    data: Value,
    data_source: Option<Rc<dyn DataSource>>,
    schema_source: Option<Rc<dyn SchemaSource>>,
    validator: Option<Rc<dyn Validator>>,
    renderer: Rc<dyn Renderer>,
    config: EditronConfig,
    store: Store,
}

impl ControllerBuilder {
    /// Use a custom data source instead of an in-memory [`DataStore`]
    pub fn data_source(mut self, source: Rc<dyn DataSource>) -> Self {
        self.data_source = Some(source);
        self
    }

    /// Use a custom schema lookup instead of [`JsonSchema`]. The root schema
    /// given to the builder is still what the validator sees.
    pub fn schema_source(mut self, source: Rc<dyn SchemaSource>) -> Self {
        self.schema_source = Some(source);
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Rc::new(validator));
        self
    }

    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Rc::new(renderer);
        self
    }

    pub fn config(mut self, config: EditronConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing store; the controller adds its `errors` and `ui`
    /// slices to it
    pub fn store(mut self, store: Store) -> Self {
        self.store = store;
        self
    }

    pub fn build(self) -> Controller {
        let data: Rc<dyn DataSource> = match self.data_source {
            Some(source) => source,
            None => Rc::new(DataStore::new(self.data)),
        };
        let schema: Rc<dyn SchemaSource> = match self.schema_source {
            Some(source) => source,
            None => Rc::new(JsonSchema::new(self.schema.clone())),
        };
        let validator: Rc<dyn Validator> = match self.validator {
            Some(validator) => validator,
            None => Rc::new(no_issues),
        };
        let validation = ValidationService::with_validator(self.store.clone(), self.schema, validator);
        let location = LocationService::new(self.store.clone());

        let inner = Rc::new(Inner {
            store: self.store,
            data,
            schema,
            validation,
            location,
            renderer: self.renderer,
            config: self.config,
            dom: RefCell::new(Dom::new()),
            instances: RefCell::new(HashMap::new()),
            root: RefCell::new(None),
            scroll: Cell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let scroll = inner.location.on(LocationEvent::Scroll, move |pointer| {
            if let Some(inner) = weak.upgrade() {
                Controller { inner }.reveal(pointer);
            }
        });
        inner.scroll.set(Some(scroll));
        Controller { inner }
    }
}

impl Controller {
    pub fn builder(schema: Value, data: Value) -> ControllerBuilder {
        ControllerBuilder {
            schema,
            data,
            data_source: None,
            schema_source: None,
            validator: None,
            renderer: Rc::new(AttributeRenderer),
            config: EditronConfig::default(),
            store: Store::new(),
        }
    }

    pub fn downgrade(&self) -> WeakController {
        WeakController {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    pub fn data(&self) -> &dyn DataSource {
        self.inner.data.as_ref()
    }

    pub fn schema(&self) -> &dyn SchemaSource {
        self.inner.schema.as_ref()
    }

    pub fn validation(&self) -> &ValidationService {
        &self.inner.validation
    }

    pub fn location(&self) -> &LocationService {
        &self.inner.location
    }

    pub fn config(&self) -> &EditronConfig {
        &self.inner.config
    }

    pub fn dom(&self) -> Ref<'_, Dom> {
        self.inner.dom.borrow()
    }

    pub(crate) fn dom_mut(&self) -> RefMut<'_, Dom> {
        self.inner.dom.borrow_mut()
    }

    pub(crate) fn render(&self, node: NodeId, view: &ViewModel) {
        self.inner.renderer.render(&mut self.dom_mut(), node, view);
    }

    /// Build the editor for `pointer` (and its subtree). The caller places
    /// its node.
    pub fn create_editor(&self, pointer: &Pointer) -> EditorResult<EditorHandle> {
        EditorHandle::create(self, pointer)
    }

    /// Build the root editor, replacing any previous one
    pub fn mount(&self) -> EditorResult<EditorHandle> {
        let previous = self.inner.root.borrow_mut().take();
        if let Some(previous) = previous {
            previous.destroy();
        }
        let root = self.create_editor(&Pointer::root())?;
        info!(kind = ?root.kind(), "Mounted root editor");
        *self.inner.root.borrow_mut() = Some(root.clone());
        Ok(root)
    }

    pub fn root(&self) -> Option<EditorHandle> {
        self.inner.root.borrow().clone()
    }

    /// The live editor at `pointer`, if one is mounted
    pub fn editor_at(&self, pointer: &Pointer) -> Option<EditorHandle> {
        self.instances(pointer).into_iter().next()
    }

    pub fn instances(&self, pointer: &Pointer) -> Vec<EditorHandle> {
        self.inner
            .instances
            .borrow()
            .get(pointer)
            .map(|list| {
                list.iter()
                    .filter_map(WeakEditor::upgrade)
                    .filter(|editor| !editor.is_destroyed())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn instance_count(&self) -> usize {
        self.inner.instances.borrow().values().map(Vec::len).sum()
    }

    pub(crate) fn register_instance(&self, editor: &EditorHandle) {
        self.inner
            .instances
            .borrow_mut()
            .entry(editor.pointer())
            .or_default()
            .push(editor.downgrade());
    }

    /// Move `editor` in the registry from `previous` to its current pointer
    pub(crate) fn change_pointer(&self, previous: &Pointer, editor: &EditorHandle) {
        self.remove_instance(previous, editor);
        self.register_instance(editor);
    }

    pub(crate) fn remove_instance(&self, pointer: &Pointer, editor: &EditorHandle) {
        let mut instances = self.inner.instances.borrow_mut();
        if let Some(list) = instances.get_mut(pointer) {
            list.retain(|weak| !weak.is(editor));
            if list.is_empty() {
                instances.remove(pointer);
            }
        }
    }

    fn array_editor(&self, pointer: &Pointer) -> EditorResult<EditorHandle> {
        let editor = self
            .editor_at(pointer)
            .ok_or_else(|| EditorError::NoEditor(pointer.clone()))?;
        if editor.kind() != EditorKind::Array {
            return Err(EditorError::NotAnArray(pointer.clone()));
        }
        Ok(editor)
    }

    /// Add an item to the list at `pointer`; see [`EditorHandle::add_item`]
    pub fn add_item(&self, pointer: &Pointer, index: usize) -> EditorResult<ItemChange> {
        let applied = self.array_editor(pointer)?.add_item(index)?;
        Ok(self.item_change(pointer, applied))
    }

    pub fn remove_item(&self, pointer: &Pointer, index: usize) -> EditorResult<ItemChange> {
        let applied = self.array_editor(pointer)?.remove_item(index)?;
        Ok(self.item_change(pointer, applied))
    }

    pub fn move_item(&self, pointer: &Pointer, from: usize, to: usize) -> EditorResult<ItemChange> {
        let applied = self.array_editor(pointer)?.move_item(from, to)?;
        Ok(self.item_change(pointer, applied))
    }

    fn item_change(&self, pointer: &Pointer, applied: bool) -> ItemChange {
        if !applied {
            return ItemChange::Refused;
        }
        if self.config().validation.live_validation {
            return ItemChange::Applied(Some(self.validate(pointer)));
        }
        ItemChange::Applied(None)
    }

    /// Write a value. With live validation enabled the returned pass
    /// revalidates the written location.
    pub fn set_value(&self, pointer: &Pointer, value: Value) -> EditorResult<Option<ValidationPass>> {
        self.data().set(pointer, value)?;
        if self.config().validation.live_validation {
            return Ok(Some(self.validate(pointer)));
        }
        Ok(None)
    }

    /// Validate the current data within `pointer`
    pub fn validate(&self, pointer: &Pointer) -> ValidationPass {
        let data = self.data().get(&Pointer::root()).unwrap_or(Value::Null);
        self.validation().validate(&data, pointer)
    }

    /// Hand the node of the editor at `pointer` to the renderer's focus hook
    fn reveal(&self, pointer: &Pointer) {
        let Some(editor) = self.editor_at(pointer) else {
            debug!(pointer = %pointer, "No editor to focus");
            return;
        };
        let node = editor.node();
        self.inner.renderer.focus(&mut self.dom_mut(), node);
    }

    /// Destroy every editor, stop validation and release the store slices
    pub fn destroy(&self) {
        let root = self.inner.root.borrow_mut().take();
        if let Some(root) = root {
            root.destroy();
        }
        let detached: Vec<WeakEditor> = self
            .inner
            .instances
            .borrow_mut()
            .drain()
            .flat_map(|(_, list)| list)
            .collect();
        for editor in detached.iter().filter_map(WeakEditor::upgrade) {
            editor.destroy();
        }
        if let Some(scroll) = self.inner.scroll.take() {
            self.inner.location.off(LocationEvent::Scroll, scroll);
        }
        self.inner.validation.destroy();
        self.inner.location.destroy();
        info!("Controller destroyed");
    }
}
