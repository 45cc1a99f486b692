//! Animation context
//!
//! Root object of the animation subsystem: one [`InterpolatorRegistry`] and
//! one [`AnimationScheduler`], constructed once at startup and handed to
//! whatever builds animations. Tests build their own.

use crate::animation::PropertyAnimation;
use crate::config::AnimationConfig;
use crate::error::Result;
use crate::interpolate::{Interpolator, InterpolatorRegistry};
use crate::property::Property;
use crate::scheduler::{AnimationScheduler, SchedulerHandle};
use crate::timeline::Timeline;
use crate::value::{AnimatedValue, SharedAnimatedValue};

#[derive(Debug, Default)]
pub struct AnimationContext {
    registry: InterpolatorRegistry,
    scheduler: AnimationScheduler,
}

impl AnimationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: InterpolatorRegistry) -> Self {
        Self {
            registry,
            scheduler: AnimationScheduler::new(),
        }
    }

    pub fn registry(&self) -> &InterpolatorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut InterpolatorRegistry {
        &mut self.registry
    }

    /// Register or replace the interpolator for `T`
    pub fn add_interpolator<T: 'static, I: Interpolator<T> + 'static>(&mut self, interpolator: I) {
        self.registry.add(interpolator);
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    pub fn handle(&self) -> SchedulerHandle {
        self.scheduler.handle()
    }

    /// Advance everything registered with the scheduler
    pub fn tick(&self, dt: f32) -> bool {
        self.scheduler.tick(dt)
    }

    /// Unshared value the caller updates itself
    pub fn animated_value<T: Clone + 'static>(
        &self,
        initial: T,
        config: AnimationConfig,
    ) -> Result<AnimatedValue<T>> {
        AnimatedValue::new(initial, &config, self.registry.get::<T>()?)
    }

    /// Shared value ticked by this context's scheduler
    pub fn shared_value<T: Clone + 'static>(
        &self,
        initial: T,
        config: AnimationConfig,
    ) -> Result<SharedAnimatedValue<T>> {
        SharedAnimatedValue::registered(
            initial,
            &config,
            self.registry.get::<T>()?,
            &self.scheduler.handle(),
        )
    }

    /// Animation of `property` toward `to`
    ///
    /// With `from` omitted the animation starts from the property's value at
    /// the moment it first runs.
    pub fn animate<T: Clone + 'static>(
        &self,
        property: Property<T>,
        from: Option<T>,
        to: T,
        config: AnimationConfig,
    ) -> Result<PropertyAnimation<T>> {
        let timeline = self.timeline(from, to)?;
        PropertyAnimation::new(property, timeline, config)
    }

    /// Timeline over the registered interpolator for `T`
    pub fn timeline<T: Clone + 'static>(&self, from: Option<T>, to: T) -> Result<Timeline<T>> {
        let interpolator = self.registry.get::<T>()?;
        Ok(match from {
            Some(from) => Timeline::new(from, to, interpolator),
            None => Timeline::to(to, interpolator),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Animate;
    use crate::error::AnimationError;
    use crate::interpolate::FnInterpolator;
    use crate::property::{PropertyKey, TargetId};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_missing_interpolator_fails_at_first_use() {
        let ctx = AnimationContext::new();
        let result = ctx.animated_value(0_i64, AnimationConfig::new());
        assert!(matches!(result, Err(AnimationError::MissingInterpolator { .. })));
    }

    #[test]
    fn test_custom_interpolator() {
        let mut ctx = AnimationContext::new();
        ctx.add_interpolator::<i64, _>(FnInterpolator::new(
            |a: &i64, b: &i64, t| a + ((b - a) as f32 * t).round() as i64,
            |a: &i64, b: &i64| a == b,
        ));

        let mut value = ctx
            .animated_value(0_i64, AnimationConfig::new().seconds(1.0))
            .unwrap();
        value.set_value(10);
        value.update(0.5);
        assert_eq!(*value.current(), 5);
    }

    #[test]
    fn test_animate_property() {
        let ctx = AnimationContext::new();
        let cell = Rc::new(Cell::new(0.0_f32));
        let property = Property::from_cell(PropertyKey::new(TargetId::unique(), "scale"), Rc::clone(&cell));

        let mut anim = ctx
            .animate(property, Some(1.0), 2.0, AnimationConfig::new().seconds(1.0))
            .unwrap();
        anim.evaluate(0.5);
        assert!((cell.get() - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_shared_values_tick_with_context() {
        let ctx = AnimationContext::new();
        let value = ctx.shared_value(0.0_f32, AnimationConfig::new().seconds(0.5)).unwrap();
        value.set_value(1.0);

        assert!(ctx.tick(0.25));
        assert!(!ctx.tick(0.25));
        assert_eq!(value.current(), 1.0);
    }
}
