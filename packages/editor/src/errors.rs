//! Error types for the editor

use editron_pointer::Pointer;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Patch error: {0}")]
    Patch(#[from] PatchError),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("No editor is mounted at '{0}'")]
    NoEditor(Pointer),

    #[error("Editor at '{0}' is not an array editor")]
    NotAnArray(Pointer),

    #[error("Editor at '{0}' is destroyed or its controller is gone")]
    Detached(Pointer),
}

pub type EditorResult<T> = Result<T, EditorError>;

/// A patch that does not fit the list it is applied to
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("{op} index {index} is out of bounds for a list of {len}")]
    OutOfBounds {
        op: &'static str,
        index: usize,
        len: usize,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("No value at '{0}'")]
    Missing(Pointer),

    #[error("Value at '{0}' cannot hold children")]
    NotAContainer(Pointer),

    #[error("Value at '{0}' is not an array")]
    NotAnArray(Pointer),

    #[error("Index {index} is out of bounds at '{pointer}'")]
    IndexOutOfBounds { pointer: Pointer, index: usize },

    #[error(transparent)]
    Patch(#[from] PatchError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Unknown node {0}")]
    UnknownNode(u32),

    #[error("Node {child} is not a child of node {parent}")]
    NotAChild { parent: u32, child: u32 },

    #[error("Cannot insert node {0} into itself or its own subtree")]
    Cycle(u32),
}
