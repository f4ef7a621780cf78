//! Array reconciliation: handle reuse, renumbering, DOM order and focus

use editron_editor::{Controller, DataSource, DataStore, EditorHandle, Patch, Pointer};
use serde_json::{json, Value};
use std::rc::Rc;

fn p(s: &str) -> Pointer {
    Pointer::parse(s).unwrap()
}

fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "list": {
                "type": "array",
                "minItems": 1,
                "maxItems": 4,
                "items": {
                    "type": "object",
                    "properties": { "name": { "type": "string", "default": "new" } }
                }
            }
        }
    })
}

fn items(count: usize) -> Value {
    let list: Vec<Value> = (0..count).map(|i| json!({ "name": format!("item-{i}") })).collect();
    json!({ "list": list })
}

struct Fixture {
    controller: Controller,
    data: Rc<DataStore>,
    list: EditorHandle,
}

fn setup(count: usize) -> Fixture {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let data = Rc::new(DataStore::new(items(count)));
    let controller = Controller::builder(schema(), Value::Null)
        .data_source(data.clone())
        .build();
    controller.mount().unwrap();
    let list = controller.editor_at(&p("#/list")).unwrap();
    Fixture { controller, data, list }
}

fn pointers(editors: &[EditorHandle]) -> Vec<String> {
    editors.iter().map(|e| e.pointer().to_string()).collect()
}

/// Nodes in the list's child container, in document order
fn dom_order(fixture: &Fixture) -> Vec<editron_editor::NodeId> {
    let dom = fixture.controller.dom();
    let first = fixture.list.child(0).unwrap().node();
    let container = dom.parent(first).unwrap();
    dom.children(container).to_vec()
}

fn nodes(editors: &[EditorHandle]) -> Vec<editron_editor::NodeId> {
    editors.iter().map(EditorHandle::node).collect()
}

#[test]
fn test_insert_creates_one_handle_and_renumbers_the_rest() {
    let fixture = setup(3);
    let before = fixture.list.children();
    let moves = fixture.controller.dom().moves();

    fixture
        .data
        .apply_patch(&p("#/list"), Patch::new().insert(1, json!({ "name": "x" })))
        .unwrap();

    let after = fixture.list.children();
    assert_eq!(after.len(), 4);
    assert!(after[0].ptr_eq(&before[0]));
    assert!(after[2].ptr_eq(&before[1]));
    assert!(after[3].ptr_eq(&before[2]));
    assert!(!before.iter().any(|old| old.ptr_eq(&after[1])));
    assert!(before.iter().all(|old| !old.is_destroyed()));

    assert_eq!(pointers(&after), vec!["#/list/0", "#/list/1", "#/list/2", "#/list/3"]);
    assert_eq!(after[2].child(0).unwrap().pointer(), p("#/list/2/name"));
    assert_eq!(after[1].child(0).unwrap().view().value, json!("x"));
    assert_eq!(dom_order(&fixture), nodes(&after));
    assert_eq!(fixture.controller.dom().moves(), moves);
}

#[test]
fn test_remove_destroys_only_the_removed_handle() {
    let fixture = setup(3);
    let before = fixture.list.children();

    fixture.data.remove_item(&p("#/list"), 0).unwrap();

    let after = fixture.list.children();
    assert!(before[0].is_destroyed());
    assert!(after[0].ptr_eq(&before[1]));
    assert!(after[1].ptr_eq(&before[2]));
    assert_eq!(pointers(&after), vec!["#/list/0", "#/list/1"]);
    assert_eq!(dom_order(&fixture), vec![before[1].node(), before[2].node()]);
    assert!(!fixture.controller.dom().contains(before[0].node()));
}

#[test]
fn test_move_reorders_nodes_with_a_single_move() {
    let fixture = setup(3);
    let before = fixture.list.children();
    let moves = fixture.controller.dom().moves();

    fixture.data.move_item(&p("#/list"), 2, 0).unwrap();

    let after = fixture.list.children();
    assert!(after[0].ptr_eq(&before[2]));
    assert!(after[1].ptr_eq(&before[0]));
    assert!(after[2].ptr_eq(&before[1]));
    assert_eq!(dom_order(&fixture), nodes(&after));
    assert_eq!(fixture.controller.dom().moves(), moves + 1);
    assert_eq!(after[0].child(0).unwrap().view().value, json!("item-2"));
}

#[test]
fn test_focus_follows_the_moved_item() {
    let fixture = setup(3);
    let location = fixture.controller.location();
    location.set_current(&p("#/list/1/name"));
    let focused = fixture.list.child(1).unwrap().child(0).unwrap();

    fixture.data.move_item(&p("#/list"), 1, 0).unwrap();

    assert_eq!(location.current(), p("#/list/0/name"));
    assert!(fixture
        .controller
        .editor_at(&p("#/list/0/name"))
        .unwrap()
        .ptr_eq(&focused));
}

#[test]
fn test_focus_in_removed_item_is_left_alone() {
    let fixture = setup(3);
    let location = fixture.controller.location();
    location.set_current(&p("#/list/0/name"));

    fixture.data.remove_item(&p("#/list"), 0).unwrap();

    assert_eq!(location.current(), p("#/list/0/name"));
}

#[test]
fn test_registry_tracks_renumbered_editors() {
    let fixture = setup(2);
    let count = fixture.controller.instance_count();
    let second = fixture.list.child(1).unwrap();

    fixture.data.insert_item(&p("#/list"), 0, json!({ "name": "first" })).unwrap();

    assert!(fixture.controller.editor_at(&p("#/list/2")).unwrap().ptr_eq(&second));
    assert_eq!(fixture.controller.instances(&p("#/list/1")).len(), 1);
    assert_eq!(fixture.controller.instance_count(), count + 2);
}

#[test]
fn test_overwrite_without_patch_rebuilds_children() {
    let fixture = setup(3);
    let before = fixture.list.children();

    fixture
        .data
        .set(&p("#/list"), json!([{ "name": "a" }, { "name": "b" }]))
        .unwrap();

    let after = fixture.list.children();
    assert_eq!(after.len(), 2);
    assert!(before.iter().all(EditorHandle::is_destroyed));
    assert!(!after.iter().any(|child| before.iter().any(|old| old.ptr_eq(child))));
    assert_eq!(dom_order(&fixture), nodes(&after));
}

#[test]
fn test_overwrite_with_same_length_keeps_children() {
    let fixture = setup(2);
    let before = fixture.list.children();

    fixture
        .data
        .set(&p("#/list"), json!([{ "name": "a" }, { "name": "b" }]))
        .unwrap();

    let after = fixture.list.children();
    assert!(after.iter().zip(&before).all(|(a, b)| a.ptr_eq(b)));
    assert_eq!(after[1].child(0).unwrap().view().value, json!("b"));
}

#[test]
fn test_controls_follow_item_bounds() {
    let fixture = setup(3);
    let list_node = fixture.list.node();

    assert!(fixture.controller.add_item(&p("#/list"), 3).unwrap().is_applied());
    let controls = fixture.list.controls().unwrap();
    assert!(!controls.add);
    assert!(fixture.controller.dom().has_class(list_node, "has-add-disabled"));
    assert_eq!(fixture.data.get(&p("#/list/3/name")), Some(json!("new")));

    assert!(!fixture.controller.add_item(&p("#/list"), 0).unwrap().is_applied());
    assert_eq!(fixture.list.children().len(), 4);

    for _ in 0..3 {
        assert!(fixture.controller.remove_item(&p("#/list"), 0).unwrap().is_applied());
    }
    let controls = fixture.list.controls().unwrap();
    assert!(controls.add);
    assert!(!controls.remove);
    assert!(!fixture.controller.remove_item(&p("#/list"), 0).unwrap().is_applied());
    assert!(fixture.controller.dom().has_class(list_node, "has-remove-disabled"));
    assert!(!fixture.controller.dom().has_class(list_node, "has-add-disabled"));
}

#[test]
fn test_disabled_array_offers_no_controls() {
    let fixture = setup(2);

    fixture.list.set_active(false).unwrap();

    let controls = fixture.list.controls().unwrap();
    assert!(!controls.add && !controls.remove && !controls.move_items);
    assert!(fixture.list.child(0).unwrap().view().disabled);
    assert!(!fixture.list.move_item(0, 1).unwrap());

    fixture.list.set_active(true).unwrap();
    assert!(fixture.list.move_item(0, 1).unwrap());
}

#[test]
fn test_destroyed_editors_stop_listening() {
    let fixture = setup(3);
    assert_eq!(fixture.data.observer_count(), fixture.controller.instance_count());
    let root = fixture.controller.root().unwrap();
    let first = fixture.list.child(0).unwrap().child(0).unwrap();
    let value = first.view().value;

    root.destroy();

    assert_eq!(fixture.data.observer_count(), 0);
    assert_eq!(fixture.controller.validation().observer_count(), 0);
    assert_eq!(fixture.controller.instance_count(), 0);
    fixture.data.set(&p("#/list/0/name"), json!("changed")).unwrap();
    fixture.data.remove_item(&p("#/list"), 0).unwrap();
    assert_eq!(first.view().value, value);
    assert!(first.set_value(json!("again")).is_err());
}
