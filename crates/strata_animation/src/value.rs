//! Animated values
//!
//! An [`AnimatedValue`] is an observable container whose writes start an
//! interpolation from wherever the value currently is toward the new target.
//! It does not advance on its own; the owner calls [`AnimatedValue::update`]
//! once per frame, or wraps it in a [`SharedAnimatedValue`] registered with
//! the [`AnimationScheduler`](crate::AnimationScheduler).
//!
//! At every point `current == lerp(start, end, curve(progress))`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use strata_core::{Observers, Subscription};

use crate::config::{AnimationConfig, AnimationDuration};
use crate::easing::Easing;
use crate::error::Result;
use crate::interpolate::SharedInterpolator;
use crate::property::Property;
use crate::scheduler::{FrameUpdate, FrameUpdateId, SchedulerHandle};

/// Listener lists of an animated value
///
/// Kept separate from the value so notifications can be delivered after the
/// value's own borrow is released.
struct ValueEvents<T> {
    change: Observers<T>,
    finish: Observers<T>,
}

impl<T: 'static> ValueEvents<T> {
    fn new() -> Self {
        Self {
            change: Observers::new(),
            finish: Observers::new(),
        }
    }
}

impl<T> Clone for ValueEvents<T> {
    fn clone(&self) -> Self {
        Self {
            change: self.change.clone(),
            finish: self.finish.clone(),
        }
    }
}

/// Notifications produced by one state change, delivered afterwards
#[must_use]
struct Pending<T> {
    changed: Option<T>,
    finished: Option<T>,
}

impl<T> Pending<T> {
    fn none() -> Self {
        Self {
            changed: None,
            finished: None,
        }
    }

    fn deliver(self, events: &ValueEvents<T>)
    where
        T: 'static,
    {
        if let Some(value) = self.changed {
            events.change.emit(&value);
        }
        if let Some(value) = self.finished {
            events.finish.emit(&value);
        }
    }
}

/// State of an animated value without its listeners
struct ValueState<T> {
    start: T,
    end: T,
    current: T,
    progress: f32,
    elapsed: f32,
    settled: bool,
    duration: AnimationDuration,
    curve: Easing,
    interpolator: SharedInterpolator<T>,
}

impl<T: Clone> ValueState<T> {
    fn set_value(&mut self, value: T) -> bool {
        if self.interpolator.equals(&value, &self.end) {
            return false;
        }
        self.start = self.current.clone();
        self.end = value;
        self.elapsed = 0.0;
        self.progress = 0.0;
        self.settled = false;
        true
    }

    fn set_value_immediate(&mut self, value: T, silent: bool) -> Pending<T> {
        self.start = value.clone();
        self.end = value.clone();
        self.current = value.clone();
        self.elapsed = 0.0;
        self.progress = 1.0;
        self.settled = true;
        Pending {
            changed: (!silent).then_some(value),
            finished: None,
        }
    }

    fn advance(&mut self, dt: f32) -> Pending<T> {
        if self.settled {
            return Pending::none();
        }

        self.elapsed += dt;
        self.progress = match self.duration {
            AnimationDuration::Seconds(seconds) => {
                AnimationDuration::linear_progress(seconds, self.elapsed)
            }
            AnimationDuration::TimeDeltaFactor(factor) => {
                AnimationDuration::approach(factor, self.progress, dt)
            }
        };

        if self.progress >= 1.0 {
            self.progress = 1.0;
            self.current = self.end.clone();
            self.settled = true;
            Pending {
                changed: Some(self.current.clone()),
                finished: Some(self.current.clone()),
            }
        } else {
            let eased = self.curve.evaluate(self.progress);
            self.current = self.interpolator.lerp(&self.start, &self.end, eased);
            Pending {
                changed: Some(self.current.clone()),
                finished: None,
            }
        }
    }

    /// Halt where the value is now
    fn halt(&mut self) {
        self.start = self.current.clone();
        self.end = self.current.clone();
        self.progress = 1.0;
        self.settled = true;
    }

    fn finish(&mut self) -> Pending<T> {
        if self.settled {
            return Pending::none();
        }
        self.halt();
        Pending {
            changed: None,
            finished: Some(self.current.clone()),
        }
    }

    fn finish_to_end(&mut self) -> Pending<T> {
        if self.settled {
            return Pending::none();
        }
        self.current = self.end.clone();
        self.start = self.end.clone();
        self.progress = 1.0;
        self.settled = true;
        Pending {
            changed: Some(self.current.clone()),
            finished: Some(self.current.clone()),
        }
    }
}

/// A value that animates toward every new target
///
/// Only `duration` and `curve` of the configuration apply; a value always
/// plays one forward run per write.
pub struct AnimatedValue<T> {
    state: ValueState<T>,
    events: ValueEvents<T>,
}

impl<T: Clone + 'static> AnimatedValue<T> {
    /// Value at rest at `initial`
    pub fn new(initial: T, config: &AnimationConfig, interpolator: SharedInterpolator<T>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: ValueState {
                start: initial.clone(),
                end: initial.clone(),
                current: initial,
                progress: 1.0,
                elapsed: 0.0,
                settled: true,
                duration: config.duration,
                curve: config.curve.clone(),
                interpolator,
            },
            events: ValueEvents::new(),
        })
    }

    /// Target value
    pub fn value(&self) -> &T {
        &self.state.end
    }

    /// Interpolated value as of the last update
    pub fn current(&self) -> &T {
        &self.state.current
    }

    pub fn start(&self) -> &T {
        &self.state.start
    }

    pub fn progress(&self) -> f32 {
        self.state.progress
    }

    pub fn is_animating(&self) -> bool {
        !self.state.settled
    }

    /// Retarget, starting from the current interpolated value
    ///
    /// Returns false (and changes nothing) when `value` equals the current
    /// target.
    pub fn set_value(&mut self, value: T) -> bool {
        self.state.set_value(value)
    }

    /// Jump straight to `value`; `silent` skips the change notification
    pub fn set_value_immediate(&mut self, value: T, silent: bool) {
        self.state.set_value_immediate(value, silent).deliver(&self.events);
    }

    /// Advance by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        self.state.advance(dt).deliver(&self.events);
    }

    /// Halt in place without a finish notification
    pub fn stop(&mut self) {
        self.state.halt();
    }

    /// Halt in place and notify finish
    pub fn finish(&mut self) {
        self.state.finish().deliver(&self.events);
    }

    /// Snap to the target and notify finish
    pub fn finish_to_end(&mut self) {
        self.state.finish_to_end().deliver(&self.events);
    }

    pub fn on_change<F: Fn(&T) + 'static>(&self, callback: F) -> Subscription {
        self.events.change.subscribe(callback)
    }

    pub fn on_finish<F: Fn(&T) + 'static>(&self, callback: F) -> Subscription {
        self.events.finish.subscribe(callback)
    }
}

impl<T: fmt::Debug> fmt::Debug for AnimatedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatedValue")
            .field("start", &self.state.start)
            .field("end", &self.state.end)
            .field("current", &self.state.current)
            .field("progress", &self.state.progress)
            .field("settled", &self.state.settled)
            .finish()
    }
}

// ============================================================================
// Shared animations
// ============================================================================

/// An animation driven through a shared handle
///
/// Implemented by [`SharedAnimatedValue`] and
/// [`SequentialAnimation`](crate::SequentialAnimation).
pub trait SharedAnimation {
    fn update(&self, dt: f32);

    fn is_finished(&self) -> bool;

    /// Progress in `[0, 1]`
    fn progress(&self) -> f32;

    /// Halt in place and notify finish
    fn finish(&self);

    /// Jump to the end state and notify finish
    fn finish_to_end(&self);

    /// Whether a scheduler already advances this animation every tick
    fn is_scheduled(&self) -> bool {
        false
    }
}

struct SharedInner<T> {
    state: RefCell<ValueState<T>>,
    events: ValueEvents<T>,
    registration: RefCell<Option<(SchedulerHandle, FrameUpdateId)>>,
}

impl<T: Clone + 'static> SharedInner<T> {
    fn run<F>(&self, f: F)
    where
        F: FnOnce(&mut ValueState<T>) -> Pending<T>,
    {
        let pending = f(&mut *self.state.borrow_mut());
        pending.deliver(&self.events);
    }
}

impl<T: Clone + 'static> FrameUpdate for SharedInner<T> {
    fn frame_update(&self, dt: f32) {
        self.run(|state| state.advance(dt));
    }

    fn is_active(&self) -> bool {
        !self.state.borrow().settled
    }
}

impl<T> Drop for SharedInner<T> {
    fn drop(&mut self) {
        if let Some((handle, id)) = self.registration.get_mut().take() {
            handle.unregister(id);
        }
    }
}

/// Cloneable handle to an animated value observed by many targets
///
/// Listeners may read the value from inside their callbacks. When registered
/// with a scheduler, writes are evaluated on the scheduler's next tick.
pub struct SharedAnimatedValue<T> {
    inner: Rc<SharedInner<T>>,
}

impl<T: Clone + 'static> SharedAnimatedValue<T> {
    /// Unregistered value at rest at `initial`; the owner drives `update`
    pub fn new(initial: T, config: &AnimationConfig, interpolator: SharedInterpolator<T>) -> Result<Self> {
        let AnimatedValue { state, events } = AnimatedValue::new(initial, config, interpolator)?;
        Ok(Self {
            inner: Rc::new(SharedInner {
                state: RefCell::new(state),
                events,
                registration: RefCell::new(None),
            }),
        })
    }

    /// Value ticked by the scheduler behind `handle`
    pub fn registered(
        initial: T,
        config: &AnimationConfig,
        interpolator: SharedInterpolator<T>,
        handle: &SchedulerHandle,
    ) -> Result<Self> {
        let value = Self::new(initial, config, interpolator)?;
        let target: Rc<dyn FrameUpdate> = value.inner.clone();
        if let Some(id) = handle.register(Rc::downgrade(&target)) {
            *value.inner.registration.borrow_mut() = Some((handle.clone(), id));
        } else {
            tracing::warn!("SharedAnimatedValue: scheduler dropped, value must be updated manually");
        }
        Ok(value)
    }

    pub fn is_registered(&self) -> bool {
        self.inner.registration.borrow().is_some()
    }

    pub fn value(&self) -> T {
        self.inner.state.borrow().end.clone()
    }

    pub fn current(&self) -> T {
        self.inner.state.borrow().current.clone()
    }

    pub fn is_animating(&self) -> bool {
        self.inner.is_active()
    }

    pub fn set_value(&self, value: T) -> bool {
        self.inner.state.borrow_mut().set_value(value)
    }

    pub fn set_value_immediate(&self, value: T, silent: bool) {
        self.inner.run(|state| state.set_value_immediate(value, silent));
    }

    pub fn stop(&self) {
        self.inner.state.borrow_mut().halt();
    }

    pub fn on_change<F: Fn(&T) + 'static>(&self, callback: F) -> Subscription {
        self.inner.events.change.subscribe(callback)
    }

    pub fn on_finish<F: Fn(&T) + 'static>(&self, callback: F) -> Subscription {
        self.inner.events.finish.subscribe(callback)
    }

    /// Write every change through `property` while the returned
    /// subscription lives
    pub fn bind(&self, property: Property<T>) -> Subscription {
        self.on_change(move |value| property.set(value.clone()))
    }
}

impl<T: Clone + 'static> SharedAnimation for SharedAnimatedValue<T> {
    fn update(&self, dt: f32) {
        self.inner.frame_update(dt);
    }

    fn is_finished(&self) -> bool {
        !self.inner.is_active()
    }

    fn progress(&self) -> f32 {
        self.inner.state.borrow().progress
    }

    fn finish(&self) {
        self.inner.run(ValueState::finish);
    }

    fn finish_to_end(&self) {
        self.inner.run(ValueState::finish_to_end);
    }

    fn is_scheduled(&self) -> bool {
        self.is_registered()
    }
}

impl<T> Clone for SharedAnimatedValue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedAnimatedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("SharedAnimatedValue")
            .field("end", &state.end)
            .field("current", &state.current)
            .field("progress", &state.progress)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolate::InterpolatorRegistry;
    use crate::property::{PropertyKey, TargetId};
    use crate::scheduler::AnimationScheduler;
    use std::cell::Cell;

    fn value(initial: f32, config: AnimationConfig) -> AnimatedValue<f32> {
        AnimatedValue::new(initial, &config, InterpolatorRegistry::new().get().unwrap()).unwrap()
    }

    #[test]
    fn test_new_value_is_settled() {
        let v = value(3.0, AnimationConfig::new());
        assert!(!v.is_animating());
        assert_eq!(*v.current(), 3.0);
        assert_eq!(v.progress(), 1.0);
    }

    #[test]
    fn test_set_value_interpolates() {
        let mut v = value(0.0, AnimationConfig::new().seconds(1.0));
        assert!(v.set_value(10.0));
        assert!(v.is_animating());

        v.update(0.5);
        assert!((*v.current() - 5.0).abs() < 1e-4);
        v.update(0.5);
        assert_eq!(*v.current(), 10.0);
        assert!(!v.is_animating());
    }

    #[test]
    fn test_set_same_target_is_noop() {
        let mut v = value(0.0, AnimationConfig::new().seconds(1.0));
        v.set_value(10.0);
        v.update(0.5);
        assert!(!v.set_value(10.0));
        assert!((v.progress() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_retarget_mid_flight_is_continuous() {
        let mut v = value(0.0, AnimationConfig::new().seconds(1.0).curve(Easing::EaseInOut));
        v.set_value(100.0);
        v.update(0.5);

        let before = *v.current();
        v.set_value(-50.0);
        let after = *v.current();

        assert!((before - after).abs() < 1e-4);
        assert_eq!(*v.start(), before);
        assert_eq!(v.progress(), 0.0);
    }

    #[test]
    fn test_factor_mode_reaches_exact_target() {
        let mut v = value(0.0, AnimationConfig::new().factor(15.0));
        v.set_value(1.0);
        let mut frames = 0;
        while v.is_animating() && frames < 10_000 {
            v.update(1.0 / 60.0);
            frames += 1;
        }
        assert_eq!(*v.current(), 1.0);
        assert_eq!(v.progress(), 1.0);
    }

    #[test]
    fn test_notifications() {
        let mut v = value(0.0, AnimationConfig::new().seconds(1.0));
        let changes = Rc::new(Cell::new(0));
        let finishes = Rc::new(Cell::new(0));

        let c = Rc::clone(&changes);
        let _a = v.on_change(move |_| c.set(c.get() + 1));
        let f = Rc::clone(&finishes);
        let _b = v.on_finish(move |_| f.set(f.get() + 1));

        v.set_value(1.0);
        v.update(0.5);
        v.update(0.5);
        v.update(0.5);

        assert_eq!(changes.get(), 2);
        assert_eq!(finishes.get(), 1);
    }

    #[test]
    fn test_set_value_immediate_silent() {
        let mut v = value(0.0, AnimationConfig::new().seconds(1.0));
        let changes = Rc::new(Cell::new(0));
        let c = Rc::clone(&changes);
        let _sub = v.on_change(move |_| c.set(c.get() + 1));

        v.set_value(5.0);
        v.update(0.25);
        v.set_value_immediate(8.0, true);

        assert_eq!(changes.get(), 1);
        assert_eq!(*v.current(), 8.0);
        assert_eq!(*v.value(), 8.0);
        assert_eq!(v.progress(), 1.0);
        assert!(!v.is_animating());

        v.set_value_immediate(9.0, false);
        assert_eq!(changes.get(), 2);
    }

    #[test]
    fn test_stop_finish_and_finish_to_end() {
        let finishes = Rc::new(Cell::new(0));

        let mut v = value(0.0, AnimationConfig::new().seconds(1.0));
        let f = Rc::clone(&finishes);
        let _sub = v.on_finish(move |_| f.set(f.get() + 1));

        v.set_value(10.0);
        v.update(0.5);
        v.stop();
        assert!(!v.is_animating());
        assert!((*v.current() - 5.0).abs() < 1e-4);
        assert_eq!(finishes.get(), 0);

        v.set_value(20.0);
        v.update(0.5);
        v.finish();
        assert!((*v.current() - 12.5).abs() < 1e-4);
        assert_eq!(finishes.get(), 1);

        v.set_value(30.0);
        v.finish_to_end();
        assert_eq!(*v.current(), 30.0);
        assert_eq!(finishes.get(), 2);
    }

    #[test]
    fn test_shared_value_scheduled() {
        let scheduler = AnimationScheduler::new();
        let registry = InterpolatorRegistry::new();
        let shared = SharedAnimatedValue::registered(
            0.0_f32,
            &AnimationConfig::new().seconds(1.0),
            registry.get().unwrap(),
            &scheduler.handle(),
        )
        .unwrap();
        assert!(shared.is_registered());

        shared.set_value(4.0);
        assert_eq!(shared.current(), 0.0);

        scheduler.tick(0.5);
        assert!((shared.current() - 2.0).abs() < 1e-4);
        scheduler.tick(0.5);
        assert_eq!(shared.current(), 4.0);
        assert!(!scheduler.has_active_animations());
    }

    #[test]
    fn test_shared_value_drives_many_targets() {
        let registry = InterpolatorRegistry::new();
        let shared =
            SharedAnimatedValue::new(0.0_f32, &AnimationConfig::new().seconds(1.0), registry.get().unwrap())
                .unwrap();

        let a = Rc::new(Cell::new(0.0));
        let b = Rc::new(Cell::new(0.0));
        let _sa = shared.bind(Property::from_cell(PropertyKey::new(TargetId::unique(), "x"), Rc::clone(&a)));
        let _sb = shared.bind(Property::from_cell(PropertyKey::new(TargetId::unique(), "x"), Rc::clone(&b)));

        shared.set_value(1.0);
        shared.update(1.0);
        assert_eq!(a.get(), 1.0);
        assert_eq!(b.get(), 1.0);
    }

    #[test]
    fn test_dropped_binding_stops_writing() {
        let registry = InterpolatorRegistry::new();
        let shared =
            SharedAnimatedValue::new(0.0_f32, &AnimationConfig::new().seconds(1.0), registry.get().unwrap())
                .unwrap();

        let cell = Rc::new(Cell::new(0.0));
        let binding = shared.bind(Property::from_cell(PropertyKey::new(TargetId::unique(), "x"), Rc::clone(&cell)));
        shared.set_value(1.0);
        shared.update(0.5);
        assert_eq!(cell.get(), 0.5);

        drop(binding);
        shared.update(0.5);
        assert_eq!(cell.get(), 0.5);
        assert_eq!(shared.current(), 1.0);
    }

    #[test]
    fn test_shared_listener_can_read_value() {
        let registry = InterpolatorRegistry::new();
        let shared =
            SharedAnimatedValue::new(0.0_f32, &AnimationConfig::new().seconds(1.0), registry.get().unwrap())
                .unwrap();
        let seen = Rc::new(Cell::new(0.0));

        let reader = shared.clone();
        let s = Rc::clone(&seen);
        let _sub = shared.on_change(move |_| s.set(reader.current()));

        shared.set_value(2.0);
        shared.update(0.5);
        assert!((seen.get() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_dropping_shared_value_unregisters() {
        let scheduler = AnimationScheduler::new();
        let registry = InterpolatorRegistry::new();
        let shared = SharedAnimatedValue::registered(
            0.0_f32,
            &AnimationConfig::new(),
            registry.get().unwrap(),
            &scheduler.handle(),
        )
        .unwrap();
        assert_eq!(scheduler.registered_count(), 1);

        drop(shared);
        assert_eq!(scheduler.registered_count(), 0);
    }
}
