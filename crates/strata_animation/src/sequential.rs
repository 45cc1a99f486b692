//! Sequential (composite) animations
//!
//! A [`SequentialAnimation`] groups shared animations that start together.
//! It owns none of the animated values; `play` runs a start callback that
//! typically retargets them, and the group then reports:
//!
//! - finished only once every child has finished;
//! - progress as the minimum child progress.
//!
//! Children that a scheduler already ticks are left to it; the group only
//! advances the rest.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use strata_core::{Observers, Subscription};

use crate::scheduler::{FrameUpdate, FrameUpdateId, SchedulerHandle};
use crate::value::SharedAnimation;

pub struct SequentialAnimation {
    children: Vec<Rc<dyn SharedAnimation>>,
    on_start: RefCell<Option<Box<dyn Fn()>>>,
    playing: Cell<bool>,
    finished: Cell<bool>,
    finished_events: Observers<()>,
    registration: RefCell<Option<(SchedulerHandle, FrameUpdateId)>>,
}

impl SequentialAnimation {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            on_start: RefCell::new(None),
            playing: Cell::new(false),
            finished: Cell::new(false),
            finished_events: Observers::new(),
            registration: RefCell::new(None),
        }
    }

    /// Add a child
    pub fn with<A: SharedAnimation + 'static>(mut self, child: A) -> Self {
        self.children.push(Rc::new(child));
        self
    }

    /// Add a child already behind an `Rc`
    pub fn with_shared(mut self, child: Rc<dyn SharedAnimation>) -> Self {
        self.children.push(child);
        self
    }

    /// Callback run by every [`play`](Self::play)
    pub fn on_start<F: Fn() + 'static>(self, callback: F) -> Self {
        *self.on_start.borrow_mut() = Some(Box::new(callback));
        self
    }

    /// Share the group and tick it from the scheduler behind `handle`
    pub fn register(self, handle: &SchedulerHandle) -> Rc<Self> {
        let group = Rc::new(self);
        let target: Rc<dyn FrameUpdate> = group.clone();
        match handle.register(Rc::downgrade(&target)) {
            Some(id) => *group.registration.borrow_mut() = Some((handle.clone(), id)),
            None => tracing::warn!("SequentialAnimation: scheduler dropped, group must be updated manually"),
        }
        group
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_playing(&self) -> bool {
        self.playing.get()
    }

    /// Start (or restart) the group
    pub fn play(&self) {
        self.finished.set(false);
        self.playing.set(true);
        if let Some(callback) = self.on_start.borrow().as_ref() {
            callback();
        }
        tracing::trace!("SequentialAnimation: playing {} children", self.children.len());
    }

    pub fn on_finished<F: Fn() + 'static>(&self, callback: F) -> Subscription {
        self.finished_events.subscribe(move |_| callback())
    }

    fn complete(&self) {
        self.playing.set(false);
        self.finished.set(true);
        self.finished_events.emit(&());
    }
}

impl SharedAnimation for SequentialAnimation {
    fn update(&self, dt: f32) {
        if !self.playing.get() {
            return;
        }
        for child in self.children.iter().filter(|child| !child.is_scheduled()) {
            child.update(dt);
        }
        if self.children.iter().all(|child| child.is_finished()) {
            self.complete();
        }
    }

    fn is_finished(&self) -> bool {
        self.finished.get()
    }

    /// Slowest child's progress; an empty group is complete
    fn progress(&self) -> f32 {
        self.children
            .iter()
            .map(|child| child.progress())
            .reduce(f32::min)
            .unwrap_or(1.0)
    }

    fn finish(&self) {
        for child in &self.children {
            child.finish();
        }
        self.complete();
    }

    fn finish_to_end(&self) {
        for child in &self.children {
            child.finish_to_end();
        }
        self.complete();
    }

    fn is_scheduled(&self) -> bool {
        self.registration.borrow().is_some()
    }
}

impl FrameUpdate for SequentialAnimation {
    fn frame_update(&self, dt: f32) {
        self.update(dt);
    }

    fn is_active(&self) -> bool {
        self.playing.get()
    }
}

impl Default for SequentialAnimation {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SequentialAnimation {
    fn drop(&mut self) {
        if let Some((handle, id)) = self.registration.get_mut().take() {
            handle.unregister(id);
        }
    }
}

impl fmt::Debug for SequentialAnimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequentialAnimation")
            .field("children", &self.children.len())
            .field("playing", &self.playing.get())
            .field("finished", &self.finished.get())
            .finish()
    }
}
