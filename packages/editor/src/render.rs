//! What an editor shows, and the seam that paints it into the DOM

use crate::dom::{Dom, NodeId};
use editron_pointer::Pointer;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorKind {
    Value,
    Object,
    Array,
}

impl EditorKind {
    /// Pick the editor for a schema: by `type`, else by the keywords present
    pub fn of(schema: &Value) -> Self {
        match crate::schema::schema_type(schema) {
            Some("object") => EditorKind::Object,
            Some("array") => EditorKind::Array,
            Some(_) => EditorKind::Value,
            None if schema.get("properties").is_some() => EditorKind::Object,
            None if schema.get("items").is_some() => EditorKind::Array,
            None => EditorKind::Value,
        }
    }

    pub fn is_container(&self) -> bool {
        !matches!(self, EditorKind::Value)
    }

    pub(crate) fn selector(&self) -> &'static str {
        match self {
            EditorKind::Value => ".editron-value",
            EditorKind::Object => ".editron-container.editron-container--object",
            EditorKind::Array => ".editron-container.editron-container--array",
        }
    }
}

/// Add/remove/move affordances of an array editor, recomputed after every
/// change to its length
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayControls {
    pub add: bool,
    pub insert: bool,
    pub remove: bool,
    pub move_items: bool,
    pub show_index: bool,
    pub length: usize,
    pub min_items: usize,
    pub max_items: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub pointer: Pointer,
    pub id: String,
    pub kind: EditorKind,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Current data; only tracked by value editors
    pub value: Value,
    /// Messages reported exactly at this editor's pointer
    pub errors: Vec<String>,
    /// Set when a descendant of a container has issues
    pub nested_errors: bool,
    pub disabled: bool,
    pub controls: Option<ArrayControls>,
}

/// Paints view models into the DOM
pub trait Renderer {
    fn render(&self, dom: &mut Dom, node: NodeId, view: &ViewModel);

    /// Bring `node` into view and give it input focus
    fn focus(&self, _dom: &mut Dom, _node: NodeId) {}
}

/// Reflects view state into element attributes and classes
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeRenderer;

impl Renderer for AttributeRenderer {
    fn render(&self, dom: &mut Dom, node: NodeId, view: &ViewModel) {
        dom.set_attribute(node, "id", view.id.clone());
        dom.set_attribute(node, "data-pointer", view.pointer.as_str());
        if let Some(title) = &view.title {
            dom.set_attribute(node, "title", title.clone());
        }
        if !view.kind.is_container() {
            dom.set_attribute(node, "value", display_value(&view.value));
        }
        dom.toggle_class(node, "has-error", !view.errors.is_empty());
        dom.toggle_class(node, "has-nested-error", view.nested_errors);
        dom.toggle_class(node, "is-disabled", view.disabled);
    }

    fn focus(&self, dom: &mut Dom, node: NodeId) {
        dom.set_attribute(node, "data-focused", "true");
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
