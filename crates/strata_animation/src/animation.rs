//! Property animations
//!
//! [`PropertyAnimation`] is the time-driven primitive: it accumulates
//! elapsed time, turns it into progress, applies direction and curve, and
//! writes the resulting value through a bound [`Property`].
//!
//! Lifecycle:
//!
//! ```text
//! Fresh --evaluate--> Running --repeats exhausted--> Finished
//!   ^                    |                              |
//!   +------- reset ------+------------------------------+
//!
//! any --dispose--> Disposed (terminal)
//! ```
//!
//! `reset` is only ever called from outside; the animation never rewinds
//! itself.

use std::fmt;

use crate::config::{AnimationConfig, AnimationDuration};
use crate::error::{AnimationError, Result};
use crate::property::{Property, PropertyKey};
use crate::timeline::Timeline;

/// Observable lifecycle of an animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    /// Created or reset, not yet evaluated
    Fresh,
    /// Evaluated at least once, repeat budget not exhausted
    Running,
    /// Repeat budget exhausted
    Finished,
    /// Explicitly disposed; never runs again
    Disposed,
}

impl AnimationState {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished | Self::Disposed)
    }
}

/// Object-safe interface hosts drive animations through
pub trait Animate {
    /// Identity of the animated slot
    fn key(&self) -> &PropertyKey;

    /// Advance by `dt` seconds and write the new value
    fn evaluate(&mut self, dt: f32);

    /// Rewind to the fresh state without disposing
    fn reset(&mut self);

    /// Stop permanently
    fn dispose(&mut self);

    fn state(&self) -> AnimationState;

    /// Raw progress of the current cycle in `[0, 1]`
    fn progress(&self) -> f32;

    fn is_finished(&self) -> bool {
        self.state().is_finished()
    }
}

/// Animation of one property along one or more timelines
///
/// With several timelines, cycle `n` plays `timelines[n % len]`.
pub struct PropertyAnimation<T> {
    property: Property<T>,
    timelines: Vec<Timeline<T>>,
    config: AnimationConfig,
    elapsed: f32,
    progress: f32,
    cycle: u32,
    state: AnimationState,
}

impl<T: Clone + 'static> PropertyAnimation<T> {
    pub fn new(property: Property<T>, timeline: Timeline<T>, config: AnimationConfig) -> Result<Self> {
        Self::with_timelines(property, vec![timeline], config)
    }

    pub fn with_timelines(
        property: Property<T>,
        timelines: Vec<Timeline<T>>,
        config: AnimationConfig,
    ) -> Result<Self> {
        config.validate()?;
        if timelines.is_empty() {
            return Err(AnimationError::InvalidConfiguration(format!(
                "animation of {} needs at least one timeline",
                property.key()
            )));
        }
        Ok(Self {
            property,
            timelines,
            config,
            elapsed: 0.0,
            progress: 0.0,
            cycle: 0,
            state: AnimationState::Fresh,
        })
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn property(&self) -> &Property<T> {
        &self.property
    }

    /// Completed cycles
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    fn timeline_index(&self) -> usize {
        self.cycle as usize % self.timelines.len()
    }
}

impl<T: Clone + 'static> Animate for PropertyAnimation<T> {
    fn key(&self) -> &PropertyKey {
        self.property.key()
    }

    fn evaluate(&mut self, dt: f32) {
        if self.state.is_finished() {
            return;
        }
        if self.state == AnimationState::Fresh {
            self.state = AnimationState::Running;
            tracing::trace!("PropertyAnimation {}: started", self.property.key());
        }

        self.elapsed += dt;
        let cycle_complete = match self.config.duration {
            AnimationDuration::Seconds(seconds) => {
                self.progress = AnimationDuration::linear_progress(seconds, self.elapsed);
                self.elapsed >= seconds
            }
            AnimationDuration::TimeDeltaFactor(factor) => {
                self.progress = AnimationDuration::approach(factor, self.progress, dt);
                self.progress >= 1.0
            }
        };

        // Direction is resolved against the cycle count before it advances
        let directed = self.config.direction.apply(self.progress, self.cycle);
        let eased = self.config.curve.evaluate(directed);

        let index = self.timeline_index();
        let property = &self.property;
        let timeline = &mut self.timelines[index];
        timeline.begin(|| property.get());
        property.set(timeline.value_at(eased));

        if cycle_complete {
            self.cycle += 1;
            self.elapsed = 0.0;
            if self.config.repeats.is_exhausted(self.cycle) {
                self.state = AnimationState::Finished;
                tracing::debug!(
                    "PropertyAnimation {}: finished after {} cycle(s)",
                    self.property.key(),
                    self.cycle
                );
            } else {
                self.progress = 0.0;
            }
        }
    }

    fn reset(&mut self) {
        if self.state == AnimationState::Disposed {
            return;
        }
        self.elapsed = 0.0;
        self.progress = 0.0;
        self.cycle = 0;
        self.state = AnimationState::Fresh;
        for timeline in &mut self.timelines {
            timeline.rewind();
        }
    }

    fn dispose(&mut self) {
        if self.state != AnimationState::Disposed {
            tracing::debug!("PropertyAnimation {}: disposed", self.property.key());
            self.state = AnimationState::Disposed;
        }
    }

    fn state(&self) -> AnimationState {
        self.state
    }

    fn progress(&self) -> f32 {
        self.progress
    }
}

impl<T> fmt::Debug for PropertyAnimation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyAnimation")
            .field("key", self.property.key())
            .field("state", &self.state)
            .field("cycle", &self.cycle)
            .field("elapsed", &self.elapsed)
            .field("progress", &self.progress)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Direction;
    use crate::easing::Easing;
    use crate::interpolate::InterpolatorRegistry;
    use crate::property::TargetId;
    use std::cell::Cell;
    use std::rc::Rc;

    fn float_property(cell: &Rc<Cell<f32>>) -> Property<f32> {
        Property::from_cell(PropertyKey::new(TargetId::unique(), "value"), Rc::clone(cell))
    }

    fn animation(cell: &Rc<Cell<f32>>, config: AnimationConfig) -> PropertyAnimation<f32> {
        let registry = InterpolatorRegistry::new();
        let timeline = Timeline::new(0.0, 100.0, registry.get().unwrap());
        PropertyAnimation::new(float_property(cell), timeline, config).unwrap()
    }

    #[test]
    fn test_single_evaluate_finishes() {
        let cell = Rc::new(Cell::new(-1.0));
        let curve = Easing::EaseInOut;
        let mut anim = animation(&cell, AnimationConfig::new().seconds(1.0).repeat(1).curve(curve.clone()));
        assert_eq!(anim.state(), AnimationState::Fresh);

        anim.evaluate(1.0);

        assert!(anim.is_finished());
        assert_eq!(anim.state(), AnimationState::Finished);
        assert!((cell.get() - 100.0 * curve.evaluate(1.0)).abs() < 1e-4);
    }

    #[test]
    fn test_reversed_feeds_zero_to_curve() {
        let cell = Rc::new(Cell::new(-1.0));
        let mut anim = animation(
            &cell,
            AnimationConfig::new().seconds(0.5).direction(Direction::Reversed),
        );

        anim.evaluate(0.5);
        assert_eq!(cell.get(), 0.0);
    }

    #[test]
    fn test_alternate_uses_parity_before_increment() {
        let cell = Rc::new(Cell::new(0.0));
        let mut anim = animation(
            &cell,
            AnimationConfig::new().seconds(1.0).repeat(2).direction(Direction::Alternate),
        );

        anim.evaluate(0.25);
        assert!((cell.get() - 25.0).abs() < 1e-4);
        anim.evaluate(0.75);
        assert!((cell.get() - 100.0).abs() < 1e-4);
        assert_eq!(anim.cycle(), 1);
        assert_eq!(anim.state(), AnimationState::Running);

        // Second cycle plays backward
        anim.evaluate(0.25);
        assert!((cell.get() - 75.0).abs() < 1e-4);
        anim.evaluate(0.75);
        assert!(cell.get().abs() < 1e-4);
        assert!(anim.is_finished());
    }

    #[test]
    fn test_finished_is_noop() {
        let cell = Rc::new(Cell::new(0.0));
        let mut anim = animation(&cell, AnimationConfig::new().seconds(1.0));
        anim.evaluate(1.0);
        cell.set(42.0);
        anim.evaluate(0.5);
        assert_eq!(cell.get(), 42.0);
    }

    #[test]
    fn test_endless_never_finishes() {
        let cell = Rc::new(Cell::new(0.0));
        let mut anim = animation(&cell, AnimationConfig::new().seconds(0.1).endless());
        for _ in 0..100 {
            anim.evaluate(0.1);
        }
        assert!(!anim.is_finished());
        assert_eq!(anim.cycle(), 100);
    }

    #[test]
    fn test_reset_and_dispose() {
        let cell = Rc::new(Cell::new(0.0));
        let mut anim = animation(&cell, AnimationConfig::new().seconds(1.0));
        anim.evaluate(1.0);
        assert!(anim.is_finished());

        anim.reset();
        assert_eq!(anim.state(), AnimationState::Fresh);
        assert_eq!(anim.cycle(), 0);
        anim.evaluate(0.5);
        assert!((cell.get() - 50.0).abs() < 1e-4);

        anim.dispose();
        anim.reset();
        assert_eq!(anim.state(), AnimationState::Disposed);
        assert!(anim.is_finished());
    }

    #[test]
    fn test_factor_mode_settles() {
        let cell = Rc::new(Cell::new(0.0));
        let mut anim = animation(&cell, AnimationConfig::new().factor(20.0));
        let mut frames = 0;
        while !anim.is_finished() && frames < 10_000 {
            anim.evaluate(1.0 / 60.0);
            frames += 1;
        }
        assert!(anim.is_finished());
        assert_eq!(cell.get(), 100.0);
    }

    #[test]
    fn test_omitted_from_captures_current_value() {
        let registry = InterpolatorRegistry::new();
        let cell = Rc::new(Cell::new(40.0));
        let mut anim = PropertyAnimation::new(
            float_property(&cell),
            Timeline::to(80.0, registry.get().unwrap()),
            AnimationConfig::new().seconds(1.0),
        )
        .unwrap();

        anim.evaluate(0.5);
        assert!((cell.get() - 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_timeline_per_cycle() {
        let registry = InterpolatorRegistry::new();
        let cell = Rc::new(Cell::new(0.0));
        let mut anim = PropertyAnimation::with_timelines(
            float_property(&cell),
            vec![
                Timeline::new(0.0, 1.0, registry.get().unwrap()),
                Timeline::new(10.0, 20.0, registry.get().unwrap()),
            ],
            AnimationConfig::new().seconds(1.0).repeat(2),
        )
        .unwrap();

        anim.evaluate(1.0);
        assert_eq!(cell.get(), 1.0);
        anim.evaluate(0.5);
        assert_eq!(cell.get(), 15.0);
    }

    #[test]
    fn test_rejects_empty_timelines() {
        let cell = Rc::new(Cell::new(0.0));
        let result = PropertyAnimation::with_timelines(float_property(&cell), vec![], AnimationConfig::new());
        assert!(matches!(result, Err(AnimationError::InvalidConfiguration(_))));
    }

    /// Formats without any bound on `T`
    fn describe<T>(anim: &PropertyAnimation<T>) -> String {
        format!("{anim:?}")
    }

    #[test]
    fn test_debug_shows_key_and_state() {
        let cell = Rc::new(Cell::new(0.0));
        let mut anim = animation(&cell, AnimationConfig::new().seconds(1.0));
        assert!(describe(&anim).contains("Fresh"));

        anim.evaluate(0.5);
        let text = describe(&anim);
        assert!(text.starts_with("PropertyAnimation"));
        assert!(text.contains("Running"));
        assert!(text.contains("value"));
    }
}
