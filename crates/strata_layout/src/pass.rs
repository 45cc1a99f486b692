//! Recalculation passes
//!
//! A [`LayoutPass`] is the view of the tree a controller gets while it lays
//! out one driver. It exposes the driver's in-layout children and their
//! modifiers, applies geometry, and runs nested passes for child drivers.

use strata_core::{Rect, Size};

use crate::error::{LayoutError, Result};
use crate::modifier::LayoutModifier;
use crate::tree::{LayoutItemId, LayoutTree, RecalcState};

pub struct LayoutPass<'a> {
    tree: &'a mut LayoutTree,
    driver: LayoutItemId,
    root: bool,
}

impl<'a> LayoutPass<'a> {
    pub(crate) fn new(tree: &'a mut LayoutTree, driver: LayoutItemId, root: bool) -> Self {
        Self { tree, driver, root }
    }

    /// Driver being laid out
    pub fn driver(&self) -> LayoutItemId {
        self.driver
    }

    /// Whether this pass owns the driver's own size
    pub fn is_root(&self) -> bool {
        self.root
    }

    /// Space the driver lays its children out in
    ///
    /// Root passes use the driver's available space when one was set, nested
    /// passes the size the parent just assigned.
    pub fn constraint(&self) -> Result<Size> {
        let item = self.tree.item(self.driver)?;
        Ok(match (self.root, item.available) {
            (true, Some(available)) => available,
            _ => item.rect.size,
        })
    }

    /// Children taking part in layout, in order
    pub fn children(&self) -> Result<Vec<LayoutItemId>> {
        let item = self.tree.item(self.driver)?;
        let driver = item
            .driver
            .as_ref()
            .ok_or(LayoutError::NoDriver(self.driver))?;
        Ok(driver
            .children
            .values()
            .copied()
            .filter(|child| {
                self.tree
                    .items
                    .get(*child)
                    .is_some_and(|item| item.within_layout)
            })
            .collect())
    }

    pub fn modifier(&self, id: LayoutItemId) -> Result<Option<&LayoutModifier>> {
        Ok(self.tree.item(id)?.modifier.as_ref())
    }

    pub fn has_controller(&self, id: LayoutItemId) -> Result<bool> {
        Ok(self.tree.item(id)?.has_controller())
    }

    pub fn rect(&self, id: LayoutItemId) -> Result<Rect> {
        Ok(self.tree.item(id)?.rect)
    }

    /// Apply the driver's computed size; ignored by nested passes
    pub fn apply_own_size(&mut self, size: Size) -> Result<()> {
        if !self.root {
            return Ok(());
        }
        let rect = self.tree.item(self.driver)?.rect.with_size(size);
        self.tree.apply_rect(self.driver, rect)
    }

    /// Apply a child's rectangle, relative to the driver
    pub fn apply(&mut self, child: LayoutItemId, rect: Rect) -> Result<()> {
        self.ensure_child(child)?;
        self.tree.apply_rect(child, rect)
    }

    /// Run a child driver's controller inside this pass
    ///
    /// Fails with [`LayoutError::Reentrant`] when `id` is already being
    /// recalculated.
    pub fn recalculate(&mut self, id: LayoutItemId) -> Result<()> {
        if self.tree.item(id)?.recalc == RecalcState::Recalculating {
            tracing::warn!("LayoutPass: rejected reentrant recalculation of {:?}", id);
            return Err(LayoutError::Reentrant(id));
        }
        self.ensure_child(id)?;
        self.tree.run_pass(id, false).map(|_| ())
    }

    fn ensure_child(&self, child: LayoutItemId) -> Result<()> {
        if self.tree.item(child)?.parent == Some(self.driver) {
            Ok(())
        } else {
            Err(LayoutError::NotAChild {
                parent: self.driver,
                child,
            })
        }
    }
}
