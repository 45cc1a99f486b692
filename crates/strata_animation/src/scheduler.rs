//! Animation scheduler
//!
//! The scheduler drives per-frame updates for objects registered with it:
//! shared animated values, sequential animations, or anything implementing
//! [`FrameUpdate`]. It is ticked once per frame by the host integration with
//! the frame delta:
//!
//! ```rust
//! use strata_animation::{AnimationConfig, AnimationContext};
//!
//! let ctx = AnimationContext::new();
//! let opacity = ctx.shared_value(0.0_f32, AnimationConfig::new().seconds(0.2)).unwrap();
//!
//! opacity.set_value(1.0);
//! assert!(ctx.scheduler().has_active_animations());
//!
//! ctx.tick(0.2);
//! assert_eq!(opacity.current(), 1.0);
//! ```
//!
//! The scheduler only keeps weak references. Dropping the last handle to a
//! registered object unregisters it at the next tick.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a registration inside the scheduler
    pub struct FrameUpdateId;
}

/// Something advanced once per frame
pub trait FrameUpdate {
    /// Advance by `dt` seconds
    fn frame_update(&self, dt: f32);

    /// Whether the object still wants frames
    fn is_active(&self) -> bool;
}

/// Internal state of the animation scheduler
struct SchedulerInner {
    entries: SlotMap<FrameUpdateId, Weak<dyn FrameUpdate>>,
    frame: u64,
}

/// Ticks every registered [`FrameUpdate`]
///
/// Cloning yields another owner of the same scheduler.
#[derive(Clone)]
pub struct AnimationScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                entries: SlotMap::with_key(),
                frame: 0,
            })),
        }
    }

    /// Get a handle to this scheduler for passing to components
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Register an object for per-frame updates
    pub fn register(&self, target: Weak<dyn FrameUpdate>) -> FrameUpdateId {
        self.inner.borrow_mut().entries.insert(target)
    }

    pub fn unregister(&self, id: FrameUpdateId) -> bool {
        self.inner.borrow_mut().entries.remove(id).is_some()
    }

    /// Tick all registered objects
    ///
    /// Registrations made from inside an update are picked up next frame.
    /// Returns true if anything is still active.
    pub fn tick(&self, dt: f32) -> bool {
        let live: Vec<Rc<dyn FrameUpdate>> = {
            let mut inner = self.inner.borrow_mut();
            inner.frame += 1;
            inner.entries.retain(|_, weak| weak.strong_count() > 0);
            inner.entries.values().filter_map(Weak::upgrade).collect()
        };

        tracing::trace!("AnimationScheduler: tick dt={} targets={}", dt, live.len());
        for target in &live {
            if target.is_active() {
                target.frame_update(dt);
            }
        }

        live.iter().any(|target| target.is_active())
    }

    /// Check if any registered object is still animating
    pub fn has_active_animations(&self) -> bool {
        self.inner
            .borrow()
            .entries
            .values()
            .filter_map(Weak::upgrade)
            .any(|target| target.is_active())
    }

    /// Number of registrations whose target is still alive
    pub fn registered_count(&self) -> usize {
        self.inner
            .borrow()
            .entries
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Frames ticked so far
    pub fn frame(&self) -> u64 {
        self.inner.borrow().frame
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AnimationScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("AnimationScheduler")
            .field("entries", &inner.entries.len())
            .field("frame", &inner.frame)
            .finish()
    }
}

/// A weak handle to the animation scheduler
///
/// This is passed to components that need to register animations.
/// It won't prevent the scheduler from being dropped.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<RefCell<SchedulerInner>>,
}

impl SchedulerHandle {
    /// Register an object; `None` if the scheduler is gone
    pub fn register(&self, target: Weak<dyn FrameUpdate>) -> Option<FrameUpdateId> {
        self.inner
            .upgrade()
            .map(|inner| inner.borrow_mut().entries.insert(target))
    }

    pub fn unregister(&self, id: FrameUpdateId) {
        if let Some(inner) = self.inner.upgrade() {
            inner.borrow_mut().entries.remove(id);
        }
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}
