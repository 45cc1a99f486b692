//! Layout error types

use thiserror::Error;

use crate::tree::{ItemKey, LayoutItemId};

/// Layout-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// Recalculation requested for an item already being recalculated
    #[error("Reentrant recalculation of {0:?}")]
    Reentrant(LayoutItemId),

    /// The tree does not contain this item
    #[error("Unknown layout item {0:?}")]
    UnknownItem(LayoutItemId),

    /// The driver already has a child with this identity
    #[error("Driver {parent:?} already contains {key:?}")]
    DuplicateChild { parent: LayoutItemId, key: ItemKey },

    /// The item is not a child of this driver
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild {
        parent: LayoutItemId,
        child: LayoutItemId,
    },

    /// Inserting the child would make an item its own ancestor
    #[error("Inserting {child:?} under {parent:?} would create a cycle")]
    Cycle {
        parent: LayoutItemId,
        child: LayoutItemId,
    },

    /// The item has no driver and cannot own children
    #[error("Layout item {0:?} is not a driver")]
    NoDriver(LayoutItemId),

    /// The constraint solver rejected the input
    #[error("Layout solver error: {0}")]
    Solver(String),
}

impl From<taffy::TaffyError> for LayoutError {
    fn from(err: taffy::TaffyError) -> Self {
        Self::Solver(err.to_string())
    }
}

/// Result type for layout operations
pub type Result<T> = std::result::Result<T, LayoutError>;
