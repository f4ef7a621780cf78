use super::EditorHandle;
use crate::controller::Controller;
use crate::errors::EditorResult;
use editron_pointer::Pointer;
use serde_json::Value;
use tracing::debug;

/// Property names shown for the object at `pointer`: schema properties in
/// schema order, then any further keys found in the data
fn property_keys(ctrl: &Controller, pointer: &Pointer) -> Vec<String> {
    let schema = ctrl.schema().get(pointer);
    let mut keys: Vec<String> = schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|properties| properties.keys().cloned().collect())
        .unwrap_or_default();
    if let Some(Value::Object(data)) = ctrl.data().get(pointer) {
        for key in data.keys() {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
    }
    keys
}

/// Keep the children when the key set is unchanged and refresh them,
/// otherwise rebuild
pub(super) fn sync(ctrl: &Controller, handle: &EditorHandle) -> EditorResult<()> {
    let pointer = handle.pointer();
    let keys = property_keys(ctrl, &pointer);
    let current: Vec<String> = handle
        .children()
        .iter()
        .filter_map(|child| child.pointer().last_segment())
        .collect();

    if keys != current {
        return rebuild(ctrl, handle, &pointer, keys);
    }
    for child in handle.children() {
        child.refresh(ctrl)?;
    }
    handle.render(ctrl);
    Ok(())
}

fn rebuild(ctrl: &Controller, handle: &EditorHandle, pointer: &Pointer, keys: Vec<String>) -> EditorResult<()> {
    let (items, previous) = {
        let mut state = handle.state.borrow_mut();
        (state.items, std::mem::take(&mut state.children))
    };
    for child in previous {
        child.teardown(ctrl);
    }

    let mut children = Vec::with_capacity(keys.len());
    for key in &keys {
        let child = ctrl.create_editor(&pointer.join(key))?;
        if let Some(items) = items {
            ctrl.dom_mut().append_child(items, child.node())?;
        }
        children.push(child);
    }
    handle.state.borrow_mut().children = children;
    debug!(pointer = %pointer, properties = keys.len(), "Rebuilt object editor");
    handle.render(ctrl);
    Ok(())
}
