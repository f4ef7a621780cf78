//! Array editors and the child reconciler.
//!
//! A patched array keeps the editors of items that survive the patch. They
//! are renumbered and their nodes reordered in place; only inserted items get
//! new editors and only removed items lose theirs. Without a patch the
//! children are rebuilt from the data.

use super::{EditorHandle, EditorState};
use crate::controller::Controller;
use crate::errors::{EditorError, EditorResult};
use crate::patch::Patch;
use crate::render::{ArrayControls, EditorKind};
use crate::schema::template;
use editron_pointer::Pointer;
use serde_json::Value;
use tracing::{debug, instrument};

/// A child position after the patch: a surviving editor, or a new item
/// waiting for one
enum Slot {
    Live(EditorHandle),
    Inserted,
}

/// Reconcile the children of `handle` with `patch`.
///
/// The patch is checked against the current children before anything is
/// touched; a patch that does not fit returns an error and leaves the
/// editor as it was.
#[instrument(skip_all, fields(pointer = %handle.pointer(), ops = patch.ops().len()))]
pub(crate) fn apply_patch(ctrl: &Controller, handle: &EditorHandle, patch: &Patch) -> EditorResult<()> {
    let (pointer, items, original) = {
        let state = handle.state.borrow();
        (state.pointer.clone(), state.items, state.children.clone())
    };
    let Some(items) = items.filter(|_| handle.kind() == EditorKind::Array) else {
        return Err(EditorError::NotAnArray(pointer));
    };

    let mut slots: Vec<Slot> = original.iter().cloned().map(Slot::Live).collect();
    patch.apply(&mut slots, |_| Slot::Inserted)?;

    // Stored issues are keyed by pointer; they follow their items before any
    // editor is created at a shifted index
    let moved: Vec<(Pointer, Pointer)> = slots
        .iter()
        .enumerate()
        .filter_map(|(index, slot)| match slot {
            Slot::Live(child) => Some((child.pointer(), pointer.join(index))),
            Slot::Inserted => None,
        })
        .filter(|(previous, next)| previous != next)
        .collect();
    let dropped: Vec<Pointer> = original
        .iter()
        .filter(|old| {
            !slots
                .iter()
                .any(|slot| matches!(slot, Slot::Live(child) if child.ptr_eq(old)))
        })
        .map(EditorHandle::pointer)
        .collect();
    if !moved.is_empty() || !dropped.is_empty() {
        ctrl.validation().rebase_errors(&moved, &dropped);
    }

    let mut children = Vec::with_capacity(slots.len());
    let mut created = 0;
    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Slot::Live(child) => children.push(child),
            Slot::Inserted => {
                children.push(ctrl.create_editor(&pointer.join(index))?);
                created += 1;
            }
        }
    }
    let survivors: Vec<&EditorHandle> = children
        .iter()
        .filter(|child| original.iter().any(|old| old.ptr_eq(child)))
        .collect();

    let removed: Vec<&EditorHandle> = original
        .iter()
        .filter(|old| !children.iter().any(|child| child.ptr_eq(old)))
        .collect();
    for child in &removed {
        child.teardown(ctrl);
    }

    // Focus follows the item it was in, judged by the pointers before renumbering
    let focused = ctrl.location().current();
    let follow = children.iter().enumerate().find_map(|(index, child)| {
        if !survivors.iter().any(|s| s.ptr_eq(child)) {
            return None;
        }
        let previous = child.pointer();
        let next = pointer.join(index);
        if previous == next {
            return None;
        }
        focused.rebase(&previous, &next)
    });
    if let Some(next) = follow {
        debug!(from = %focused, to = %next, "Rewriting focus");
        ctrl.location().set_current(&next);
    }

    for (index, child) in children.iter().enumerate() {
        child.relocate(ctrl, &pointer.join(index));
    }

    let mut reordered = 0;
    {
        let mut dom = ctrl.dom_mut();
        for (index, child) in children.iter().enumerate() {
            let node = child.node();
            let occupant = dom.children(items).get(index).copied();
            if occupant == Some(node) {
                continue;
            }
            match occupant {
                Some(reference) => dom.insert_before(items, node, reference)?,
                None => dom.append_child(items, node)?,
            }
            reordered += 1;
        }
    }

    let destroyed = removed.len();
    handle.state.borrow_mut().children = children;
    update_controls(ctrl, handle);
    if !dropped.is_empty() {
        reload_error_flags(ctrl, handle);
    }
    handle.render(ctrl);
    debug!(created, destroyed, moved = reordered, "Reconciled array");
    Ok(())
}

/// Refresh children in place while the length is unchanged, else rebuild
pub(super) fn sync(ctrl: &Controller, handle: &EditorHandle) -> EditorResult<()> {
    let length = item_count(ctrl, handle);
    let children = handle.children();
    if children.len() != length {
        return rebuild(ctrl, handle);
    }
    for child in &children {
        child.refresh(ctrl)?;
    }
    update_controls(ctrl, handle);
    handle.render(ctrl);
    Ok(())
}

/// Destroy every child and create one fresh editor per data item
#[instrument(skip_all, fields(pointer = %handle.pointer()))]
pub(super) fn rebuild(ctrl: &Controller, handle: &EditorHandle) -> EditorResult<()> {
    let (pointer, items, previous) = {
        let mut state = handle.state.borrow_mut();
        (state.pointer.clone(), state.items, std::mem::take(&mut state.children))
    };
    for child in &previous {
        child.teardown(ctrl);
    }
    if let Some(items) = items {
        ctrl.dom_mut().clear_children(items);
    }

    let length = item_count(ctrl, handle);
    let mut children = Vec::with_capacity(length);
    for index in 0..length {
        let child = ctrl.create_editor(&pointer.join(index))?;
        if let Some(items) = items {
            ctrl.dom_mut().append_child(items, child.node())?;
        }
        children.push(child);
    }
    handle.state.borrow_mut().children = children;
    update_controls(ctrl, handle);
    handle.render(ctrl);
    debug!(destroyed = previous.len(), created = length, "Rebuilt array editor");
    Ok(())
}

/// Removed items take their issues with them; the array and its ancestors
/// re-read which issues still lie below them
fn reload_error_flags(ctrl: &Controller, handle: &EditorHandle) {
    handle.load_errors(ctrl);
    for ancestor in handle.pointer().ancestors() {
        for editor in ctrl.instances(&ancestor) {
            editor.load_errors(ctrl);
            editor.render(ctrl);
        }
    }
}

fn item_count(ctrl: &Controller, handle: &EditorHandle) -> usize {
    ctrl.data()
        .get(&handle.pointer())
        .as_ref()
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

/// Recompute which controls are offered from the schema's item bounds and
/// the current length
pub(super) fn update_controls(ctrl: &Controller, handle: &EditorHandle) {
    let schema = ctrl.schema().get(&handle.pointer());
    let options = &ctrl.config().array;
    let bound = |key: &str| schema.get(key).and_then(Value::as_u64).map(|n| n as usize);
    let min_items = bound("minItems").unwrap_or(0);
    let max_items = bound("maxItems");

    let (node, controls) = {
        let mut state = handle.state.borrow_mut();
        let EditorState { children, view, node, .. } = &mut *state;
        let length = children.len();
        let enabled = !view.disabled;
        let add = enabled && options.add && max_items.map_or(true, |max| length < max);
        let controls = ArrayControls {
            add,
            insert: add && options.insert,
            remove: enabled && options.remove && length > min_items,
            move_items: enabled && options.move_items,
            show_index: options.show_index,
            length,
            min_items,
            max_items,
        };
        view.controls = Some(controls.clone());
        (*node, controls)
    };

    let mut dom = ctrl.dom_mut();
    dom.toggle_class(node, "has-add-disabled", !controls.add);
    dom.toggle_class(node, "has-remove-disabled", !controls.remove);
}

impl EditorHandle {
    fn array_controller(&self) -> EditorResult<(Controller, ArrayControls)> {
        let ctrl = self.controller()?;
        match self.controls() {
            Some(controls) if self.kind() == EditorKind::Array => Ok((ctrl, controls)),
            _ => Err(EditorError::NotAnArray(self.pointer())),
        }
    }

    /// Insert a new item built from the item schema at `index`.
    ///
    /// Returns `Ok(false)` without touching the data when adding (or, below
    /// the end, inserting) is not offered.
    pub fn add_item(&self, index: usize) -> EditorResult<bool> {
        let (ctrl, controls) = self.array_controller()?;
        let allowed = if index >= controls.length {
            controls.add
        } else {
            controls.insert
        };
        if !allowed {
            return Ok(false);
        }
        let pointer = self.pointer();
        let index = index.min(controls.length);
        let item = template(&ctrl.schema().get(&pointer.join(index)));
        ctrl.data().apply_patch(&pointer, Patch::new().insert(index, item))?;
        Ok(true)
    }

    /// Remove the item at `index`. Returns `Ok(false)` when removal is not
    /// enabled.
    pub fn remove_item(&self, index: usize) -> EditorResult<bool> {
        let (ctrl, controls) = self.array_controller()?;
        if !controls.remove {
            return Ok(false);
        }
        ctrl.data().apply_patch(&self.pointer(), Patch::new().remove(index))?;
        Ok(true)
    }

    pub fn move_item(&self, from: usize, to: usize) -> EditorResult<bool> {
        let (ctrl, controls) = self.array_controller()?;
        if !controls.move_items {
            return Ok(false);
        }
        ctrl.data()
            .apply_patch(&self.pointer(), Patch::new().move_item(from, to))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PatchError;
    use serde_json::json;

    fn strings() -> Controller {
        Controller::builder(
            json!({ "type": "array", "items": { "type": "string" } }),
            json!(["a", "b"]),
        )
        .build()
    }

    #[test]
    fn test_patch_that_does_not_fit_leaves_children_untouched() {
        let ctrl = strings();
        let root = ctrl.mount().unwrap();
        let before = root.children();

        let err = apply_patch(&ctrl, &root, &Patch::new().remove(0).move_item(0, 3)).unwrap_err();

        assert!(matches!(
            err,
            EditorError::Patch(PatchError::OutOfBounds { op: "move", index: 3, len: 1 })
        ));
        let after = root.children();
        assert_eq!(after.len(), 2);
        assert!(after.iter().zip(&before).all(|(a, b)| a.ptr_eq(b)));
        assert!(before.iter().all(|child| !child.is_destroyed()));
    }

    #[test]
    fn test_only_array_editors_take_patches() {
        let ctrl = Controller::builder(json!({ "type": "object" }), json!({})).build();
        let root = ctrl.mount().unwrap();

        let err = apply_patch(&ctrl, &root, &Patch::new().insert(0, json!(1))).unwrap_err();

        assert!(matches!(err, EditorError::NotAnArray(_)));
    }

    #[test]
    fn test_children_of_root_array_are_indexed_from_root() {
        let ctrl = strings();
        let root = ctrl.mount().unwrap();

        let pointers: Vec<String> = root.children().iter().map(|c| c.pointer().to_string()).collect();

        assert_eq!(pointers, vec!["#/0", "#/1"]);
        assert_eq!(root.controls().map(|c| c.length), Some(2));
    }
}
