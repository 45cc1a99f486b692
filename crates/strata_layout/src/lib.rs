//! Strata Layout Engine
//!
//! Deferred, batched layout recalculation over a tree of items and drivers.
//!
//! Items carry an optional [`LayoutModifier`] (their flex child style); drivers
//! additionally own an ordered child list and a [`LayoutController`]. Changes
//! only schedule work: every scheduled item is climbed to its recalculation
//! root, and each distinct root is laid out once when the frame's late-update
//! phase calls [`LayoutTree::on_late_update`].
//!
//! # Example
//!
//! ```rust
//! use strata_core::Size;
//! use strata_layout::{FlexController, LayoutModifier, LayoutTree};
//!
//! let mut tree = LayoutTree::new();
//! let root = tree.create_driver(Some(FlexController::row().gap(8.0).boxed()));
//! tree.set_available_space(root, Size::new(200.0, 50.0)).unwrap();
//!
//! let icon = tree.create_item();
//! let label = tree.create_item();
//! tree.add_child(root, icon).unwrap();
//! tree.add_child(root, label).unwrap();
//! tree.set_modifier(icon, Some(LayoutModifier::new().w(32.0))).unwrap();
//! tree.set_modifier(label, Some(LayoutModifier::new().flex_1())).unwrap();
//!
//! // Nothing is computed until the late update
//! assert_eq!(tree.rect(label).unwrap().width(), 0.0);
//!
//! assert_eq!(tree.on_late_update().unwrap(), 1);
//! assert_eq!(tree.rect(label).unwrap().x(), 40.0);
//! assert_eq!(tree.rect(label).unwrap().width(), 160.0);
//! ```

pub mod controller;
pub mod error;
pub mod modifier;
pub mod pass;
pub mod tree;

pub use controller::{FlexController, LayoutController};
pub use error::{LayoutError, Result};
pub use modifier::LayoutModifier;
pub use pass::LayoutPass;
pub use tree::{
    ItemKey, ItemKind, LayoutEvent, LayoutItemId, LayoutTree, RecalcState, RectTarget,
};

// Style enums used by the builders
pub use taffy::{AlignItems, AlignSelf, FlexDirection, FlexWrap, JustifyContent};
