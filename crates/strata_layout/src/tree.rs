//! Layout tree management
//!
//! Items live in an arena keyed by [`LayoutItemId`]. An item becomes a
//! driver once it can own children; a driver may carry one
//! [`LayoutController`] that turns its children into geometry.
//!
//! Structural changes never lay out inline. They mark the affected item
//! scheduled, and [`LayoutTree::on_late_update`] flushes all scheduled items
//! once per frame. Each flush resolves a scheduled item to its recalculation
//! root (the topmost ancestor reachable through items that have a modifier
//! and sit under a controller) and runs one pass per distinct root.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::{IndexMap, IndexSet};
use slotmap::{new_key_type, SlotMap};
use strata_core::{Observers, Rect, Size, Subscription};

use crate::controller::LayoutController;
use crate::error::{LayoutError, Result};
use crate::modifier::LayoutModifier;
use crate::pass::LayoutPass;

new_key_type! {
    pub struct LayoutItemId;
}

static NEXT_ITEM_KEY: AtomicU64 = AtomicU64::new(1);

/// Driver-agnostic identity of a layout item
///
/// Proxies share the key of the item they stand for, so a driver never
/// holds the same underlying item twice.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ItemKey(u64);

impl ItemKey {
    fn unique() -> Self {
        Self(NEXT_ITEM_KEY.fetch_add(1, Ordering::Relaxed))
    }

    pub fn to_raw(self) -> u64 {
        self.0
    }
}

/// Recalculation state of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecalcState {
    #[default]
    Clean,
    Scheduled,
    Recalculating,
}

/// Change notifications raised by the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutEvent {
    ModifierUpdated(LayoutItemId),
    ChildrenUpdated(LayoutItemId),
    Recalculated(LayoutItemId),
}

/// Render boundary: receives computed rectangles
pub trait RectTarget {
    /// `rect` is relative to the item's parent
    fn apply_rect(&self, item: LayoutItemId, rect: Rect);
}

/// What an arena entry stands for, resolved once at insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Plain,
    /// Stand-in for another item; inserting it inserts the underlying item
    Proxy(LayoutItemId),
}

pub(crate) struct Driver {
    pub(crate) children: IndexMap<ItemKey, LayoutItemId>,
    pub(crate) controller: Option<Box<dyn LayoutController>>,
}

pub(crate) struct LayoutItem {
    pub(crate) key: ItemKey,
    pub(crate) kind: ItemKind,
    pub(crate) parent: Option<LayoutItemId>,
    pub(crate) modifier: Option<LayoutModifier>,
    pub(crate) driver: Option<Driver>,
    pub(crate) within_layout: bool,
    pub(crate) rect: Rect,
    pub(crate) available: Option<Size>,
    pub(crate) recalc: RecalcState,
    pub(crate) target: Option<Rc<dyn RectTarget>>,
}

impl LayoutItem {
    fn new(key: ItemKey, kind: ItemKind) -> Self {
        Self {
            key,
            kind,
            parent: None,
            modifier: None,
            driver: None,
            within_layout: true,
            rect: Rect::default(),
            available: None,
            recalc: RecalcState::Clean,
            target: None,
        }
    }

    pub(crate) fn has_controller(&self) -> bool {
        self.driver
            .as_ref()
            .is_some_and(|driver| driver.controller.is_some())
    }
}

pub struct LayoutTree {
    pub(crate) items: SlotMap<LayoutItemId, LayoutItem>,
    pending: IndexSet<LayoutItemId>,
    events: Observers<LayoutEvent>,
}

impl LayoutTree {
    pub fn new() -> Self {
        Self {
            items: SlotMap::with_key(),
            pending: IndexSet::new(),
            events: Observers::new(),
        }
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// Create a detached plain item
    pub fn create_item(&mut self) -> LayoutItemId {
        self.items.insert(LayoutItem::new(ItemKey::unique(), ItemKind::Plain))
    }

    /// Create an item that owns children, optionally with a controller
    pub fn create_driver(&mut self, controller: Option<Box<dyn LayoutController>>) -> LayoutItemId {
        let id = self.create_item();
        if let Some(item) = self.items.get_mut(id) {
            item.driver = Some(Driver {
                children: IndexMap::new(),
                controller,
            });
        }
        id
    }

    /// Create a stand-in for `of`, sharing its identity
    pub fn create_proxy(&mut self, of: LayoutItemId) -> Result<LayoutItemId> {
        let target = self.resolve(of)?;
        let key = self.item(target)?.key;
        Ok(self.items.insert(LayoutItem::new(key, ItemKind::Proxy(target))))
    }

    /// Remove an item and its whole subtree
    pub fn destroy(&mut self, id: LayoutItemId) -> Result<()> {
        let target = self.resolve(id)?;
        if let Some(parent) = self.item(target)?.parent {
            self.remove_child(parent, target)?;
        }
        self.destroy_subtree(target);
        if id != target {
            self.items.remove(id);
        }
        Ok(())
    }

    fn destroy_subtree(&mut self, id: LayoutItemId) {
        let children: Vec<LayoutItemId> = self
            .items
            .get(id)
            .and_then(|item| item.driver.as_ref())
            .map(|driver| driver.children.values().copied().collect())
            .unwrap_or_default();
        for child in children {
            self.destroy_subtree(child);
        }
        self.items.remove(id);
        self.pending.shift_remove(&id);
    }

    pub fn contains(&self, id: LayoutItemId) -> bool {
        self.items.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn key(&self, id: LayoutItemId) -> Result<ItemKey> {
        Ok(self.item(id)?.key)
    }

    pub fn kind(&self, id: LayoutItemId) -> Result<ItemKind> {
        Ok(self.item(id)?.kind)
    }

    pub fn parent(&self, id: LayoutItemId) -> Result<Option<LayoutItemId>> {
        Ok(self.item(self.resolve(id)?)?.parent)
    }

    pub(crate) fn item(&self, id: LayoutItemId) -> Result<&LayoutItem> {
        self.items.get(id).ok_or(LayoutError::UnknownItem(id))
    }

    pub(crate) fn item_mut(&mut self, id: LayoutItemId) -> Result<&mut LayoutItem> {
        self.items.get_mut(id).ok_or(LayoutError::UnknownItem(id))
    }

    /// Underlying item of a proxy, or the item itself
    pub fn resolve(&self, id: LayoutItemId) -> Result<LayoutItemId> {
        match self.item(id)?.kind {
            ItemKind::Plain => Ok(id),
            ItemKind::Proxy(target) => {
                self.item(target)?;
                Ok(target)
            }
        }
    }

    // =========================================================================
    // Drivers
    // =========================================================================

    /// Let an existing item own children
    pub fn make_driver(&mut self, id: LayoutItemId) -> Result<()> {
        let id = self.resolve(id)?;
        let item = self.item_mut(id)?;
        if item.driver.is_none() {
            item.driver = Some(Driver {
                children: IndexMap::new(),
                controller: None,
            });
        }
        Ok(())
    }

    /// Install or replace the driver's controller
    pub fn set_controller(
        &mut self,
        id: LayoutItemId,
        controller: Option<Box<dyn LayoutController>>,
    ) -> Result<()> {
        let id = self.resolve(id)?;
        let driver = self.driver_mut(id)?;
        driver.controller = controller;
        self.schedule_recalculation(id)
    }

    pub fn has_controller(&self, id: LayoutItemId) -> Result<bool> {
        Ok(self.item(self.resolve(id)?)?.has_controller())
    }

    fn driver_mut(&mut self, id: LayoutItemId) -> Result<&mut Driver> {
        self.item_mut(id)?
            .driver
            .as_mut()
            .ok_or(LayoutError::NoDriver(id))
    }

    /// Children in order
    pub fn children(&self, parent: LayoutItemId) -> Result<Vec<LayoutItemId>> {
        let parent = self.resolve(parent)?;
        let driver = self
            .item(parent)?
            .driver
            .as_ref()
            .ok_or(LayoutError::NoDriver(parent))?;
        Ok(driver.children.values().copied().collect())
    }

    /// Append a child
    pub fn add_child(&mut self, parent: LayoutItemId, child: LayoutItemId) -> Result<()> {
        self.insert_child(parent, child, None)
    }

    /// Insert a child at `index` (appends when `None` or out of range)
    ///
    /// Proxies are resolved to the item they stand for. A child already owned
    /// by another driver is moved.
    pub fn insert_child(
        &mut self,
        parent: LayoutItemId,
        child: LayoutItemId,
        index: Option<usize>,
    ) -> Result<()> {
        let parent = self.resolve(parent)?;
        let child = self.resolve(child)?;
        let key = self.item(child)?.key;

        let driver = self.driver_mut(parent)?;
        if driver.children.contains_key(&key) {
            return Err(LayoutError::DuplicateChild { parent, key });
        }
        if self.is_ancestor_or_self(child, parent)? {
            return Err(LayoutError::Cycle { parent, child });
        }

        if let Some(previous) = self.item(child)?.parent {
            tracing::trace!("LayoutTree: moving {:?} from {:?} to {:?}", child, previous, parent);
            self.remove_child(previous, child)?;
        }

        let driver = self.driver_mut(parent)?;
        let at = index.unwrap_or(driver.children.len()).min(driver.children.len());
        driver.children.shift_insert(at, key, child);
        self.item_mut(child)?.parent = Some(parent);

        self.events.emit(&LayoutEvent::ChildrenUpdated(parent));
        self.schedule_recalculation(parent)
    }

    fn is_ancestor_or_self(&self, ancestor: LayoutItemId, mut id: LayoutItemId) -> Result<bool> {
        loop {
            if id == ancestor {
                return Ok(true);
            }
            match self.item(id)?.parent {
                Some(parent) => id = parent,
                None => return Ok(false),
            }
        }
    }

    pub fn remove_child(&mut self, parent: LayoutItemId, child: LayoutItemId) -> Result<()> {
        let parent = self.resolve(parent)?;
        let child = self.resolve(child)?;
        let key = self.item(child)?.key;

        let driver = self.driver_mut(parent)?;
        if driver.children.shift_remove(&key).is_none() {
            return Err(LayoutError::NotAChild { parent, child });
        }
        self.item_mut(child)?.parent = None;

        self.events.emit(&LayoutEvent::ChildrenUpdated(parent));
        self.schedule_recalculation(parent)
    }

    // =========================================================================
    // Item attributes
    // =========================================================================

    pub fn modifier(&self, id: LayoutItemId) -> Result<Option<&LayoutModifier>> {
        Ok(self.item(self.resolve(id)?)?.modifier.as_ref())
    }

    /// Replace the item's modifier
    pub fn set_modifier(&mut self, id: LayoutItemId, modifier: Option<LayoutModifier>) -> Result<()> {
        let id = self.resolve(id)?;
        self.item_mut(id)?.modifier = modifier;
        self.events.emit(&LayoutEvent::ModifierUpdated(id));
        self.schedule_recalculation(id)
    }

    pub fn is_within_layout(&self, id: LayoutItemId) -> Result<bool> {
        Ok(self.item(self.resolve(id)?)?.within_layout)
    }

    /// Include or exclude the item from its parent's layout
    pub fn set_within_layout(&mut self, id: LayoutItemId, within: bool) -> Result<()> {
        let id = self.resolve(id)?;
        let item = self.item_mut(id)?;
        if item.within_layout == within {
            return Ok(());
        }
        item.within_layout = within;
        let scheduled = item.parent.unwrap_or(id);
        self.schedule_recalculation(scheduled)
    }

    /// Constraint used when the item is recalculated as a root
    pub fn set_available_space(&mut self, id: LayoutItemId, size: Size) -> Result<()> {
        let id = self.resolve(id)?;
        self.item_mut(id)?.available = Some(size);
        self.schedule_recalculation(id)
    }

    /// Attach the render-side receiver of the item's rectangles
    pub fn set_target(&mut self, id: LayoutItemId, target: Rc<dyn RectTarget>) -> Result<()> {
        let id = self.resolve(id)?;
        self.item_mut(id)?.target = Some(target);
        Ok(())
    }

    /// Last rectangle applied to the item, relative to its parent
    pub fn rect(&self, id: LayoutItemId) -> Result<Rect> {
        Ok(self.item(self.resolve(id)?)?.rect)
    }

    pub fn recalc_state(&self, id: LayoutItemId) -> Result<RecalcState> {
        Ok(self.item(self.resolve(id)?)?.recalc)
    }

    pub(crate) fn apply_rect(&mut self, id: LayoutItemId, rect: Rect) -> Result<()> {
        let item = self.item_mut(id)?;
        item.rect = rect;
        if let Some(target) = item.target.clone() {
            target.apply_rect(id, rect);
        }
        Ok(())
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn subscribe<F: Fn(&LayoutEvent) + 'static>(&self, callback: F) -> Subscription {
        self.events.subscribe(callback)
    }

    // =========================================================================
    // Recalculation
    // =========================================================================

    /// Mark the item for recalculation at the next late update
    ///
    /// Scheduling an item that is already scheduled does nothing.
    pub fn schedule_recalculation(&mut self, id: LayoutItemId) -> Result<()> {
        let id = self.resolve(id)?;
        let item = self.item_mut(id)?;
        if item.recalc == RecalcState::Clean {
            item.recalc = RecalcState::Scheduled;
            self.pending.insert(id);
            tracing::trace!("LayoutTree: scheduled {:?}", id);
        }
        Ok(())
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Topmost ancestor reached by climbing while the current item has a
    /// modifier and its parent has a controller
    pub fn recalculation_root(&self, id: LayoutItemId) -> Result<LayoutItemId> {
        let mut current = self.resolve(id)?;
        loop {
            let item = self.item(current)?;
            let Some(parent) = item.parent else {
                return Ok(current);
            };
            if item.modifier.is_none() || !self.item(parent)?.has_controller() {
                return Ok(current);
            }
            current = parent;
        }
    }

    /// Flush scheduled recalculations
    ///
    /// Runs at most one pass per recalculation root and returns how many
    /// passes ran. A failing pass does not stop the remaining roots; the
    /// first error is returned once every root has run.
    pub fn on_late_update(&mut self) -> Result<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let scheduled: Vec<LayoutItemId> = self.pending.drain(..).collect();
        let mut first_error = None;
        let mut roots = IndexSet::new();
        for id in scheduled {
            let Some(item) = self.items.get_mut(id) else {
                continue;
            };
            item.recalc = RecalcState::Clean;
            match self.recalculation_root(id) {
                Ok(root) => {
                    roots.insert(root);
                }
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }

        let mut passes = 0;
        for root in roots {
            match self.run_pass(root, true) {
                Ok(true) => passes += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!("LayoutTree: recalculation of {:?} failed: {}", root, err);
                    first_error.get_or_insert(err);
                }
            }
        }
        tracing::debug!("LayoutTree: late update ran {} pass(es)", passes);
        match first_error {
            Some(err) => Err(err),
            None => Ok(passes),
        }
    }

    /// Recalculate `id` as a root immediately
    pub fn recalculate_now(&mut self, id: LayoutItemId) -> Result<()> {
        let id = self.resolve(id)?;
        if self.item(id)?.recalc == RecalcState::Scheduled {
            self.pending.shift_remove(&id);
            self.item_mut(id)?.recalc = RecalcState::Clean;
        }
        self.run_pass(id, true).map(|_| ())
    }

    /// Run the item's controller
    ///
    /// `root` passes apply the driver's own size; nested passes only lay out
    /// children, since the parent is mid-way through assigning the driver's
    /// geometry. Returns whether a controller ran.
    pub(crate) fn run_pass(&mut self, id: LayoutItemId, root: bool) -> Result<bool> {
        let item = self.item_mut(id)?;
        if item.recalc == RecalcState::Recalculating {
            tracing::warn!("LayoutTree: rejected reentrant recalculation of {:?}", id);
            return Err(LayoutError::Reentrant(id));
        }
        let Some(mut controller) = item
            .driver
            .as_mut()
            .and_then(|driver| driver.controller.take())
        else {
            tracing::trace!("LayoutTree: {:?} has no controller, nothing to lay out", id);
            return Ok(false);
        };
        let was_scheduled = item.recalc == RecalcState::Scheduled;
        item.recalc = RecalcState::Recalculating;
        if was_scheduled {
            self.pending.shift_remove(&id);
        }

        let result = {
            let mut pass = LayoutPass::new(self, id, root);
            controller.layout(&mut pass)
        };

        if let Some(item) = self.items.get_mut(id) {
            item.recalc = RecalcState::Clean;
            if let Some(driver) = item.driver.as_mut() {
                driver.controller.get_or_insert(controller);
            }
        }

        if result.is_ok() {
            tracing::trace!("LayoutTree: recalculated {:?} (root={})", id, root);
            self.events.emit(&LayoutEvent::Recalculated(id));
        }
        result.map(|_| true)
    }
}

impl Default for LayoutTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LayoutTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutTree")
            .field("items", &self.items.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Controller counting its passes; places children in a row of 10x10 cells
    struct Counting {
        passes: Rc<Cell<u32>>,
        own: Size,
    }

    impl LayoutController for Counting {
        fn layout(&mut self, pass: &mut LayoutPass<'_>) -> Result<()> {
            self.passes.set(self.passes.get() + 1);
            pass.apply_own_size(self.own)?;
            for (i, child) in pass.children()?.into_iter().enumerate() {
                pass.apply(child, Rect::new(i as f32 * 10.0, 0.0, 10.0, 10.0))?;
                if pass.has_controller(child)? {
                    pass.recalculate(child)?;
                }
            }
            Ok(())
        }
    }

    fn counting(own: Size) -> (Box<dyn LayoutController>, Rc<Cell<u32>>) {
        let passes = Rc::new(Cell::new(0));
        let controller = Counting {
            passes: Rc::clone(&passes),
            own,
        };
        (Box::new(controller), passes)
    }

    #[test]
    fn test_scheduling_is_idempotent() {
        let mut tree = LayoutTree::new();
        let (controller, passes) = counting(Size::new(100.0, 10.0));
        let root = tree.create_driver(Some(controller));
        tree.on_late_update().unwrap();
        passes.set(0);

        tree.schedule_recalculation(root).unwrap();
        tree.schedule_recalculation(root).unwrap();
        assert_eq!(tree.recalc_state(root), Ok(RecalcState::Scheduled));

        assert_eq!(tree.on_late_update(), Ok(1));
        assert_eq!(passes.get(), 1);
        assert_eq!(tree.recalc_state(root), Ok(RecalcState::Clean));
        assert_eq!(tree.on_late_update(), Ok(0));
    }

    #[test]
    fn test_changes_batch_into_one_pass() {
        let mut tree = LayoutTree::new();
        let (controller, passes) = counting(Size::new(100.0, 10.0));
        let root = tree.create_driver(Some(controller));
        let a = tree.create_item();
        let b = tree.create_item();

        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();
        tree.set_modifier(a, Some(LayoutModifier::new().w(5.0))).unwrap();

        assert_eq!(tree.on_late_update(), Ok(1));
        assert_eq!(passes.get(), 1);
        assert_eq!(tree.rect(b), Ok(Rect::new(10.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn test_recalculation_root_climbs_controlled_ancestors() {
        let mut tree = LayoutTree::new();
        let (outer_controller, outer_passes) = counting(Size::new(100.0, 10.0));
        let (inner_controller, inner_passes) = counting(Size::new(999.0, 999.0));
        let outer = tree.create_driver(Some(outer_controller));
        let inner = tree.create_driver(Some(inner_controller));
        let leaf = tree.create_item();

        tree.add_child(outer, inner).unwrap();
        tree.add_child(inner, leaf).unwrap();
        tree.set_modifier(inner, Some(LayoutModifier::new())).unwrap();
        tree.set_modifier(leaf, Some(LayoutModifier::new())).unwrap();
        tree.on_late_update().unwrap();

        assert_eq!(tree.recalculation_root(leaf), Ok(outer));
        outer_passes.set(0);
        inner_passes.set(0);

        tree.set_modifier(leaf, Some(LayoutModifier::new().w(1.0))).unwrap();
        assert_eq!(tree.on_late_update(), Ok(1));
        assert_eq!(outer_passes.get(), 1);
        assert_eq!(inner_passes.get(), 1);

        // Nested pass must not overwrite the size the parent assigned
        assert_eq!(tree.rect(inner), Ok(Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert_eq!(tree.rect(outer).unwrap().size, Size::new(100.0, 10.0));
    }

    #[test]
    fn test_failed_root_does_not_drop_other_roots() {
        struct Failing;
        impl LayoutController for Failing {
            fn layout(&mut self, _pass: &mut LayoutPass<'_>) -> Result<()> {
                Err(LayoutError::Solver("rejected".into()))
            }
        }

        let mut tree = LayoutTree::new();
        let failing = tree.create_driver(Some(Box::new(Failing)));
        let (controller, passes) = counting(Size::new(50.0, 10.0));
        let good = tree.create_driver(Some(controller));
        let child = tree.create_item();
        tree.schedule_recalculation(failing).unwrap();
        tree.add_child(good, child).unwrap();

        assert_eq!(tree.on_late_update(), Err(LayoutError::Solver("rejected".into())));
        assert_eq!(passes.get(), 1);
        assert_eq!(tree.recalc_state(good), Ok(RecalcState::Clean));
        assert_eq!(tree.recalc_state(failing), Ok(RecalcState::Clean));
        assert_eq!(tree.rect(child), Ok(Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(!tree.has_pending());
    }

    #[test]
    fn test_nested_pass_clears_pending_schedule() {
        let mut tree = LayoutTree::new();
        let (outer_controller, outer_passes) = counting(Size::new(100.0, 10.0));
        let (inner_controller, inner_passes) = counting(Size::ZERO);
        let outer = tree.create_driver(Some(outer_controller));
        let inner = tree.create_driver(Some(inner_controller));
        tree.add_child(outer, inner).unwrap();
        tree.on_late_update().unwrap();
        outer_passes.set(0);
        inner_passes.set(0);

        tree.schedule_recalculation(inner).unwrap();
        tree.recalculate_now(outer).unwrap();
        assert_eq!(inner_passes.get(), 1);
        assert_eq!(tree.recalc_state(inner), Ok(RecalcState::Clean));
        assert!(!tree.has_pending());

        assert_eq!(tree.on_late_update(), Ok(0));
        assert_eq!(inner_passes.get(), 1);
        assert_eq!(outer_passes.get(), 1);
    }

    #[test]
    fn test_item_without_modifier_is_its_own_root() {
        let mut tree = LayoutTree::new();
        let (outer_controller, _) = counting(Size::ZERO);
        let (inner_controller, _) = counting(Size::ZERO);
        let outer = tree.create_driver(Some(outer_controller));
        let inner = tree.create_driver(Some(inner_controller));
        tree.add_child(outer, inner).unwrap();

        assert_eq!(tree.recalculation_root(inner), Ok(inner));
    }

    #[test]
    fn test_reentrant_recalculation_fails() {
        struct SelfRecalc;
        impl LayoutController for SelfRecalc {
            fn layout(&mut self, pass: &mut LayoutPass<'_>) -> Result<()> {
                let me = pass.driver();
                pass.recalculate(me)
            }
        }

        let mut tree = LayoutTree::new();
        let root = tree.create_driver(Some(Box::new(SelfRecalc)));
        assert_eq!(tree.recalculate_now(root), Err(LayoutError::Reentrant(root)));
        assert_eq!(tree.recalc_state(root), Ok(RecalcState::Clean));
        assert_eq!(tree.has_controller(root), Ok(true));
    }

    #[test]
    fn test_proxy_shares_identity() {
        let mut tree = LayoutTree::new();
        let root = tree.create_driver(None);
        let item = tree.create_item();
        let proxy = tree.create_proxy(item).unwrap();

        assert_eq!(tree.key(proxy), tree.key(item));
        tree.add_child(root, proxy).unwrap();
        assert_eq!(tree.children(root), Ok(vec![item]));

        let key = tree.key(item).unwrap();
        assert_eq!(
            tree.add_child(root, item),
            Err(LayoutError::DuplicateChild { parent: root, key })
        );
    }

    #[test]
    fn test_structure_errors() {
        let mut tree = LayoutTree::new();
        let root = tree.create_driver(None);
        let leaf = tree.create_item();
        let other = tree.create_item();

        assert_eq!(tree.add_child(leaf, other), Err(LayoutError::NoDriver(leaf)));
        assert_eq!(
            tree.remove_child(root, leaf),
            Err(LayoutError::NotAChild {
                parent: root,
                child: leaf
            })
        );

        tree.add_child(root, leaf).unwrap();
        assert_eq!(
            tree.add_child(leaf, root),
            Err(LayoutError::NoDriver(leaf))
        );
        let inner = tree.create_driver(None);
        tree.add_child(root, inner).unwrap();
        assert_eq!(
            tree.add_child(inner, root),
            Err(LayoutError::Cycle {
                parent: inner,
                child: root
            })
        );

        tree.destroy(leaf).unwrap();
        assert_eq!(tree.children(root), Ok(vec![inner]));
        assert_eq!(tree.rect(leaf), Err(LayoutError::UnknownItem(leaf)));
    }

    #[test]
    fn test_insert_at_index_and_reparent() {
        let mut tree = LayoutTree::new();
        let first = tree.create_driver(None);
        let second = tree.create_driver(None);
        let a = tree.create_item();
        let b = tree.create_item();
        let c = tree.create_item();

        tree.add_child(first, a).unwrap();
        tree.add_child(first, b).unwrap();
        tree.insert_child(first, c, Some(0)).unwrap();
        assert_eq!(tree.children(first), Ok(vec![c, a, b]));

        tree.add_child(second, a).unwrap();
        assert_eq!(tree.children(first), Ok(vec![c, b]));
        assert_eq!(tree.parent(a), Ok(Some(second)));
    }

    #[test]
    fn test_events() {
        let mut tree = LayoutTree::new();
        let (controller, _) = counting(Size::ZERO);
        let root = tree.create_driver(Some(controller));
        let child = tree.create_item();

        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let _sub = tree.subscribe(move |event| l.borrow_mut().push(*event));

        tree.add_child(root, child).unwrap();
        tree.set_modifier(child, None).unwrap();
        tree.on_late_update().unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                LayoutEvent::ChildrenUpdated(root),
                LayoutEvent::ModifierUpdated(child),
                LayoutEvent::Recalculated(root),
            ]
        );
    }

    #[test]
    fn test_excluded_children_are_skipped() {
        let mut tree = LayoutTree::new();
        let (controller, _) = counting(Size::ZERO);
        let root = tree.create_driver(Some(controller));
        let hidden = tree.create_item();
        let shown = tree.create_item();
        tree.add_child(root, hidden).unwrap();
        tree.add_child(root, shown).unwrap();
        tree.set_within_layout(hidden, false).unwrap();

        tree.on_late_update().unwrap();
        assert_eq!(tree.rect(shown), Ok(Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert_eq!(tree.rect(hidden), Ok(Rect::default()));
    }

    #[test]
    fn test_rect_target_receives_geometry() {
        struct Recorder(RefCell<Vec<(LayoutItemId, Rect)>>);
        impl RectTarget for Recorder {
            fn apply_rect(&self, item: LayoutItemId, rect: Rect) {
                self.0.borrow_mut().push((item, rect));
            }
        }

        let mut tree = LayoutTree::new();
        let (controller, _) = counting(Size::new(50.0, 10.0));
        let root = tree.create_driver(Some(controller));
        let child = tree.create_item();
        tree.add_child(root, child).unwrap();

        let recorder = Rc::new(Recorder(RefCell::new(Vec::new())));
        tree.set_target(child, recorder.clone()).unwrap();
        tree.on_late_update().unwrap();

        assert_eq!(
            *recorder.0.borrow(),
            vec![(child, Rect::new(0.0, 0.0, 10.0, 10.0))]
        );
    }
}
