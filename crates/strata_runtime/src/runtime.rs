//! Frame loop
//!
//! [`Runtime`] owns the animation context, the component animation hosts and
//! the layout tree, and drives them in two phases per frame:
//!
//! 1. [`Runtime::on_update`] advances the [`FrameClock`], ticks the scheduler
//!    (shared values, sequential groups), updates every host and then runs
//!    the update hooks that copy animated values into layout.
//! 2. [`Runtime::on_late_update`] flushes scheduled layout recalculations.
//!
//! Animation writes therefore always land before layout reads them.

use slotmap::{new_key_type, SlotMap};
use strata_animation::{AnimationConfig, AnimationContext, AnimationHost};
use strata_layout::LayoutTree;

use crate::clock::FrameClock;
use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};

new_key_type! {
    /// Handle to an animation host owned by the runtime
    pub struct HostId;
}

/// Callback run at the end of the update phase
pub type UpdateHook = Box<dyn FnMut(&FrameClock, &mut LayoutTree) -> Result<()>>;

/// Summary of one [`Runtime::frame`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStats {
    /// Delta the frame ran with, after clamping
    pub delta: f32,
    /// Whether any scheduler-driven animation is still running
    pub animating: bool,
    /// Layout passes run by the late update
    pub layout_passes: usize,
}

pub struct Runtime {
    config: RuntimeConfig,
    clock: FrameClock,
    animation: AnimationContext,
    hosts: SlotMap<HostId, AnimationHost>,
    layout: LayoutTree,
    hooks: Vec<UpdateHook>,
    animating: bool,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            clock: FrameClock::from_config(&config),
            config,
            animation: AnimationContext::new(),
            hosts: SlotMap::with_key(),
            layout: LayoutTree::new(),
            hooks: Vec::new(),
            animating: false,
        })
    }

    /// Build from a TOML configuration document
    pub fn from_toml(source: &str) -> Result<Self> {
        Self::new(RuntimeConfig::from_toml(source)?)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Configuration for animations built without an explicit one
    pub fn default_animation(&self) -> AnimationConfig {
        self.config.default_animation.clone()
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn animation(&self) -> &AnimationContext {
        &self.animation
    }

    pub fn animation_mut(&mut self) -> &mut AnimationContext {
        &mut self.animation
    }

    pub fn layout(&self) -> &LayoutTree {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut LayoutTree {
        &mut self.layout
    }

    // =========================================================================
    // Hosts and hooks
    // =========================================================================

    pub fn add_host(&mut self, host: AnimationHost) -> HostId {
        self.hosts.insert(host)
    }

    pub fn host(&self, id: HostId) -> Result<&AnimationHost> {
        self.hosts.get(id).ok_or(RuntimeError::UnknownHost(id))
    }

    pub fn host_mut(&mut self, id: HostId) -> Result<&mut AnimationHost> {
        self.hosts.get_mut(id).ok_or(RuntimeError::UnknownHost(id))
    }

    pub fn remove_host(&mut self, id: HostId) -> Result<AnimationHost> {
        self.hosts.remove(id).ok_or(RuntimeError::UnknownHost(id))
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Run `hook` at the end of every update phase, in registration order
    pub fn on_each_update<F>(&mut self, hook: F)
    where
        F: FnMut(&FrameClock, &mut LayoutTree) -> Result<()> + 'static,
    {
        self.hooks.push(Box::new(hook));
    }

    // =========================================================================
    // Frame phases
    // =========================================================================

    /// Animation phase
    ///
    /// The first failing hook aborts the phase and its error is returned.
    pub fn on_update(&mut self, dt: f32) -> Result<()> {
        let dt = self.clock.advance(dt);
        self.animating = self.animation.tick(dt);
        for host in self.hosts.values_mut() {
            host.update(dt);
        }
        for hook in &mut self.hooks {
            hook(&self.clock, &mut self.layout)?;
        }
        tracing::trace!(
            "Runtime: frame {} updated with dt={}",
            self.clock.frame(),
            dt
        );
        Ok(())
    }

    /// Layout phase, reading the delta recorded by the last update
    pub fn on_late_update(&mut self) -> Result<usize> {
        let passes = self.layout.on_late_update()?;
        if passes > 0 {
            tracing::debug!(
                "Runtime: frame {} ran {} layout pass(es), dt={}",
                self.clock.frame(),
                passes,
                self.clock.delta()
            );
        }
        Ok(passes)
    }

    /// One full frame: update strictly before late update
    pub fn frame(&mut self, dt: f32) -> Result<FrameStats> {
        self.on_update(dt)?;
        let layout_passes = self.on_late_update()?;
        Ok(FrameStats {
            delta: self.clock.delta(),
            animating: self.animating,
            layout_passes,
        })
    }

    /// Whether the scheduler still had active work after the last update
    pub fn is_animating(&self) -> bool {
        self.animating
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_hooks_run_in_order_with_clamped_delta() {
        let mut runtime = Runtime::new(RuntimeConfig::new().max_delta(0.05)).unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = Rc::clone(&log);
        runtime.on_each_update(move |clock, _| {
            l.borrow_mut().push(("first", clock.delta()));
            Ok(())
        });
        let l = Rc::clone(&log);
        runtime.on_each_update(move |clock, _| {
            l.borrow_mut().push(("second", clock.delta()));
            Ok(())
        });

        let stats = runtime.frame(1.0).unwrap();
        assert_eq!(stats.delta, 0.05);
        assert_eq!(stats.layout_passes, 0);
        assert_eq!(*log.borrow(), vec![("first", 0.05), ("second", 0.05)]);
    }

    #[test]
    fn test_hook_error_aborts_frame() {
        let mut runtime = Runtime::new(RuntimeConfig::default()).unwrap();
        runtime.on_each_update(|_, _| Err(RuntimeError::InvalidConfig("boom".into())));
        assert!(matches!(
            runtime.frame(0.016),
            Err(RuntimeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_unknown_host() {
        let mut runtime = Runtime::new(RuntimeConfig::default()).unwrap();
        let id = runtime.add_host(AnimationHost::new());
        assert_eq!(runtime.host_count(), 1);
        runtime.remove_host(id).unwrap();
        assert!(matches!(runtime.host(id), Err(RuntimeError::UnknownHost(_))));
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(Runtime::new(RuntimeConfig::new().max_delta(-1.0)).is_err());
    }
}
