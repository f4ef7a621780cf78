//! Positional list patches
//!
//! A patch is an ordered list of insert, remove and move operations. Each
//! operation's indices refer to the list as left by the operations before it.
//! The same patch drives both the data array and the array editor's children,
//! which is what keeps the two in step.

use crate::errors::PatchError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Insert { index: usize, value: Value },
    Remove { index: usize },
    Move { from: usize, to: usize },
}

impl PatchOp {
    fn name(&self) -> &'static str {
        match self {
            PatchOp::Insert { .. } => "insert",
            PatchOp::Remove { .. } => "remove",
            PatchOp::Move { .. } => "move",
        }
    }

    /// Check the operation against a list of `len` items and return the new
    /// length
    fn check(&self, len: usize) -> Result<usize, PatchError> {
        let out_of_bounds = |index| PatchError::OutOfBounds {
            op: self.name(),
            index,
            len,
        };
        match *self {
            PatchOp::Insert { index, .. } if index > len => Err(out_of_bounds(index)),
            PatchOp::Insert { .. } => Ok(len + 1),
            PatchOp::Remove { index } if index >= len => Err(out_of_bounds(index)),
            PatchOp::Remove { .. } => Ok(len - 1),
            PatchOp::Move { from, .. } if from >= len => Err(out_of_bounds(from)),
            PatchOp::Move { to, .. } if to >= len => Err(out_of_bounds(to)),
            PatchOp::Move { .. } => Ok(len),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch {
    ops: Vec<PatchOp>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, index: usize, value: Value) -> Self {
        self.ops.push(PatchOp::Insert { index, value });
        self
    }

    pub fn remove(mut self, index: usize) -> Self {
        self.ops.push(PatchOp::Remove { index });
        self
    }

    pub fn move_item(mut self, from: usize, to: usize) -> Self {
        self.ops.push(PatchOp::Move { from, to });
        self
    }

    pub fn ops(&self) -> &[PatchOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Verify every operation fits a list that starts with `len` items.
    /// Returns the final length.
    pub fn check(&self, len: usize) -> Result<usize, PatchError> {
        self.ops.iter().try_fold(len, |len, op| op.check(len))
    }

    /// Apply the patch to `list`, building inserted items with `make`.
    ///
    /// The whole patch is checked first, so a patch that does not fit leaves
    /// `list` untouched.
    pub fn apply<T>(&self, list: &mut Vec<T>, mut make: impl FnMut(&Value) -> T) -> Result<(), PatchError> {
        self.check(list.len())?;
        for op in &self.ops {
            match op {
                PatchOp::Insert { index, value } => list.insert(*index, make(value)),
                PatchOp::Remove { index } => {
                    list.remove(*index);
                }
                PatchOp::Move { from, to } => {
                    let item = list.remove(*from);
                    list.insert(*to, item);
                }
            }
        }
        Ok(())
    }
}

impl From<Vec<PatchOp>> for Patch {
    fn from(ops: Vec<PatchOp>) -> Self {
        Patch { ops }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_remove_and_move() {
        let mut list = vec!["a", "b", "c"];
        let patch = Patch::new()
            .insert(1, json!("x"))
            .remove(3)
            .move_item(0, 2);

        patch.apply(&mut list, |_| "new").unwrap();

        assert_eq!(list, vec!["new", "b", "a"]);
    }

    #[test]
    fn test_move_to_front() {
        let mut list = vec![0, 1, 2];
        Patch::new().move_item(2, 0).apply(&mut list, |_| 9).unwrap();
        assert_eq!(list, vec![2, 0, 1]);
    }

    #[test]
    fn test_out_of_bounds_leaves_list_untouched() {
        let mut list = vec![1, 2];
        let patch = Patch::new().remove(0).remove(1);

        let err = patch.apply(&mut list, |_| 0).unwrap_err();

        assert_eq!(
            err,
            PatchError::OutOfBounds {
                op: "remove",
                index: 1,
                len: 1
            }
        );
        assert_eq!(list, vec![1, 2]);
    }

    #[test]
    fn test_insert_at_end_is_allowed() {
        assert_eq!(Patch::new().insert(2, json!(null)).check(2), Ok(3));
        assert!(Patch::new().insert(3, json!(null)).check(2).is_err());
    }

    #[test]
    fn test_serializes_as_op_list() {
        let patch = Patch::new().insert(0, json!({ "a": 1 })).move_item(1, 0);
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!([
                { "op": "insert", "index": 0, "value": { "a": 1 } },
                { "op": "move", "from": 1, "to": 0 }
            ])
        );
    }
}
