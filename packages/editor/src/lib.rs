//! # Editron Editor
//!
//! Schema-driven form editing on top of the store, observable and validation
//! crates.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ DataSource: JSON document + change events   │
//! └─────────────────────────────────────────────┘
//!                     ↓ set / patch
//! ┌─────────────────────────────────────────────┐
//! │ editors: one EditorHandle per pointer       │
//! │  - value, object and array variants         │
//! │  - array children reconciled by patch       │
//! │  - errors via bubbling observers            │
//! └─────────────────────────────────────────────┘
//!                     ↓ render
//! ┌─────────────────────────────────────────────┐
//! │ Renderer: ViewModel → Dom node              │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The [`Controller`] owns every collaborator and the editor registry. It is
//! single threaded; all reconciliation happens synchronously inside the data
//! change notification.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use editron_editor::{Controller, Pointer};
//! use serde_json::json;
//!
//! let controller = Controller::builder(
//!     json!({ "type": "object", "properties": { "list": { "type": "array", "items": { "type": "string" } } } }),
//!     json!({ "list": ["a", "b"] }),
//! )
//! .build();
//! let root = controller.mount()?;
//!
//! let list = Pointer::parse("#/list")?;
//! controller.add_item(&list, 1)?;
//! controller.validate(&Pointer::root()).await;
//! ```

mod config;
mod controller;
mod data;
mod dom;
mod editors;
mod errors;
mod location;
mod patch;
mod render;
mod schema;

pub use config::{ArrayOptions, EditronConfig, ValidationOptions, DEFAULT_CONFIG_NAME};
pub use controller::{Controller, ControllerBuilder, ItemChange, WeakController};
pub use data::{ChangeEvent, DataCallback, DataSource, DataStore};
pub use dom::{Dom, Element, NodeId};
pub use editors::EditorHandle;
pub use errors::{DataError, DomError, EditorError, EditorResult, PatchError};
pub use location::{ui_reducer, LocationEvent, LocationService, SET_CURRENT_PAGE, SET_CURRENT_POINTER, UI_SLICE};
pub use patch::{Patch, PatchOp};
pub use render::{ArrayControls, AttributeRenderer, EditorKind, Renderer, ViewModel};
pub use schema::{schema_type, template, JsonSchema, SchemaSource};

// Re-export common types for convenience
pub use editron_pointer::Pointer;
pub use editron_state::Store;
pub use editron_validation::{ErrorRecord, PassOutcome, Severity, ValidationPass, ValidationService, Validator};
