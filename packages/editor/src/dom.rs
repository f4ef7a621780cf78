//! In-memory element tree the editors render into.
//!
//! Nodes live in an arena keyed by [`NodeId`]. A node keeps its identity
//! while it is moved around, which is what lets the array reconciler reorder
//! existing editors instead of re-rendering them. Every placement of a node
//! that already has a parent is counted in [`Dom::moves`].

use crate::errors::DomError;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub tag: String,
    pub classes: BTreeSet<String>,
    pub attributes: BTreeMap<String, String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Default)]
pub struct Dom {
    nodes: HashMap<NodeId, Element>,
    next_id: u32,
    moves: usize,
}

impl Dom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element from a selector such as `div.a.b` or `.a.b`
    pub fn create_element(&mut self, selector: &str) -> NodeId {
        let mut parts = selector.split('.');
        let tag = match parts.next() {
            Some(tag) if !tag.is_empty() => tag.to_string(),
            _ => "div".to_string(),
        };
        let classes = parts.filter(|c| !c.is_empty()).map(str::to_string).collect();

        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Element {
                tag,
                classes,
                attributes: BTreeMap::new(),
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        self.nodes.get(&node)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|e| e.parent)
    }

    /// Children of `node`, in document order. Unknown nodes have none.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes.get(&node).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        self.detach(child);
        self.element_mut(parent)?.children.push(child);
        self.element_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Place `child` directly before `reference`, which must be a child of
    /// `parent`
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> Result<(), DomError> {
        if child == reference {
            return Ok(());
        }
        self.check_insert(parent, child)?;
        if self.parent(reference) != Some(parent) {
            return Err(DomError::NotAChild {
                parent: parent.0,
                child: reference.0,
            });
        }
        self.detach(child);
        let siblings = &mut self.element_mut(parent)?.children;
        let index = siblings.iter().position(|&n| n == reference).unwrap_or(siblings.len());
        siblings.insert(index, child);
        self.element_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Remove `node` and its subtree. Returns false if the node is unknown.
    pub fn remove(&mut self, node: NodeId) -> bool {
        if !self.contains(node) {
            return false;
        }
        self.unlink(node);
        self.drop_subtree(node);
        true
    }

    pub fn clear_children(&mut self, node: NodeId) {
        let children = match self.nodes.get_mut(&node) {
            Some(element) => std::mem::take(&mut element.children),
            None => return,
        };
        for child in children {
            self.drop_subtree(child);
        }
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        if let Some(element) = self.nodes.get_mut(&node) {
            element.attributes.insert(name.to_string(), value.into());
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes.get(&node)?.attributes.get(name).map(String::as_str)
    }

    pub fn toggle_class(&mut self, node: NodeId, class: &str, on: bool) {
        if let Some(element) = self.nodes.get_mut(&node) {
            if on {
                element.classes.insert(class.to_string());
            } else {
                element.classes.remove(class);
            }
        }
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes.get(&node).is_some_and(|e| e.classes.contains(class))
    }

    /// Placements of nodes that were already attached somewhere
    pub fn moves(&self) -> usize {
        self.moves
    }

    pub fn reset_moves(&mut self) {
        self.moves = 0;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn element_mut(&mut self, node: NodeId) -> Result<&mut Element, DomError> {
        self.nodes.get_mut(&node).ok_or(DomError::UnknownNode(node.0))
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        for node in [parent, child] {
            if !self.contains(node) {
                return Err(DomError::UnknownNode(node.0));
            }
        }
        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return Err(DomError::Cycle(child.0));
            }
            cursor = self.parent(node);
        }
        Ok(())
    }

    /// Unlink `node` from its parent, counting the move
    fn detach(&mut self, node: NodeId) {
        if self.unlink(node) {
            self.moves += 1;
        }
    }

    fn unlink(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.nodes.get_mut(&node).and_then(|e| e.parent.take()) else {
            return false;
        };
        if let Some(element) = self.nodes.get_mut(&parent) {
            element.children.retain(|&n| n != node);
        }
        true
    }

    fn drop_subtree(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(next) = stack.pop() {
            if let Some(element) = self.nodes.remove(&next) {
                stack.extend(element.children);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_element_parses_selector() {
        let mut dom = Dom::new();
        let node = dom.create_element(".editron-container.editron-container--array");
        let element = dom.element(node).unwrap();

        assert_eq!(element.tag, "div");
        assert!(dom.has_class(node, "editron-container--array"));
        assert_eq!(element.classes.len(), 2);
    }

    #[test]
    fn test_insert_before_reorders_and_counts_moves() {
        let mut dom = Dom::new();
        let list = dom.create_element("ul");
        let a = dom.create_element("li");
        let b = dom.create_element("li");
        dom.append_child(list, a).unwrap();
        dom.append_child(list, b).unwrap();
        assert_eq!(dom.moves(), 0);

        dom.insert_before(list, b, a).unwrap();

        assert_eq!(dom.children(list), &[b, a]);
        assert_eq!(dom.moves(), 1);
    }

    #[test]
    fn test_insert_before_foreign_reference_fails() {
        let mut dom = Dom::new();
        let list = dom.create_element("ul");
        let other = dom.create_element("ul");
        let a = dom.create_element("li");
        let b = dom.create_element("li");
        dom.append_child(other, b).unwrap();

        let err = dom.insert_before(list, a, b).unwrap_err();

        assert!(matches!(err, DomError::NotAChild { .. }));
        assert_eq!(dom.parent(a), None);
    }

    #[test]
    fn test_remove_drops_subtree() {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        let child = dom.create_element("div");
        let grandchild = dom.create_element("span");
        dom.append_child(root, child).unwrap();
        dom.append_child(child, grandchild).unwrap();

        assert!(dom.remove(child));

        assert!(dom.children(root).is_empty());
        assert!(!dom.contains(grandchild));
        assert!(!dom.remove(child));
    }

    #[test]
    fn test_cannot_append_into_own_subtree() {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        let child = dom.create_element("div");
        dom.append_child(root, child).unwrap();

        assert_eq!(dom.append_child(child, root), Err(DomError::Cycle(root.0)));
    }

    #[test]
    fn test_toggle_class_and_attributes() {
        let mut dom = Dom::new();
        let node = dom.create_element("div");
        dom.toggle_class(node, "has-add-disabled", true);
        dom.set_attribute(node, "id", "editron-#/list");

        assert!(dom.has_class(node, "has-add-disabled"));
        assert_eq!(dom.attribute(node, "id"), Some("editron-#/list"));

        dom.toggle_class(node, "has-add-disabled", false);
        assert!(!dom.has_class(node, "has-add-disabled"));
    }
}
