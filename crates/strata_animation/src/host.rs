//! Animation host
//!
//! An [`AnimationHost`] belongs to one component and owns three kinds of
//! animations:
//!
//! - **default** animations, which always run until they finish and are then
//!   dropped;
//! - **state animations**, persistent animations that play while the
//!   component is in a matching [`ComponentState`];
//! - **transitions**, one-shot animations played on entering a matching state.
//!   While a transition for a property runs, persistent state animations of
//!   that property are suppressed.
//!
//! State and transition banks are bucketed by [`PropertyKey`]; each bucket
//! maps a registered state to the animation for it. Buckets and entries keep
//! registration order, which is also the tie-break when several registered
//! states are eligible for the current state.
//!
//! The owning component sets the current state with
//! [`AnimationHost::set_state`] and then calls [`AnimationHost::update`] once
//! per frame.

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashSet;
use slotmap::{new_key_type, SlotMap};
use strata_core::ComponentState;

use crate::animation::{Animate, AnimationState};
use crate::error::{AnimationError, Result};
use crate::property::PropertyKey;

new_key_type! {
    /// Handle to an animation tracked by a host
    pub struct AnimationId;
}

/// Which bank an animation belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationRole {
    Default,
    State(ComponentState),
    Transition(ComponentState),
}

struct Tracked {
    animation: Box<dyn Animate>,
    role: AnimationRole,
    paused: bool,
}

/// State-keyed animations of one property
#[derive(Default)]
struct Bucket {
    entries: IndexMap<ComponentState, AnimationId>,
    /// State whose entry last matched; reset when the component state changes
    active: Option<ComponentState>,
}

impl Bucket {
    /// Best entry for `current`: exact, then the first eligible non-default
    /// entry in registration order, then the default entry if `allow_default`
    fn resolve(
        &self,
        current: &ComponentState,
        allow_default: bool,
    ) -> Option<(&ComponentState, AnimationId)> {
        if let Some((state, id)) = self.entries.get_key_value(current) {
            return Some((state, *id));
        }
        let mut found = self
            .entries
            .iter()
            .find(|(state, _)| !state.is_default() && state.is_eligible_for(current));
        if found.is_none() && allow_default {
            found = self.entries.get_key_value(&ComponentState::empty());
        }
        found.map(|(state, id)| (state, *id))
    }
}

type Bank = IndexMap<PropertyKey, Bucket>;

/// Owner of a component's animations
pub struct AnimationHost {
    animations: SlotMap<AnimationId, Tracked>,
    defaults: IndexMap<PropertyKey, AnimationId>,
    state_bank: Bank,
    transition_bank: Bank,
    available_states: IndexSet<ComponentState>,
    state: ComponentState,
    previous_state: ComponentState,
}

impl AnimationHost {
    /// Host that only accepts the default state
    pub fn new() -> Self {
        let mut available_states = IndexSet::new();
        available_states.insert(ComponentState::empty());
        Self {
            animations: SlotMap::with_key(),
            defaults: IndexMap::new(),
            state_bank: IndexMap::new(),
            transition_bank: IndexMap::new(),
            available_states,
            state: ComponentState::empty(),
            previous_state: ComponentState::empty(),
        }
    }

    /// Host accepting `states` in addition to the default state
    pub fn with_states<I>(states: I) -> Self
    where
        I: IntoIterator<Item = ComponentState>,
    {
        let mut host = Self::new();
        for state in states {
            host.declare_state(state);
        }
        host
    }

    /// Allow state animations and transitions for `state`
    pub fn declare_state(&mut self, state: ComponentState) {
        self.available_states.insert(state);
    }

    pub fn available_states(&self) -> impl Iterator<Item = &ComponentState> {
        self.available_states.iter()
    }

    /// Current component state
    pub fn state(&self) -> &ComponentState {
        &self.state
    }

    /// State seen by the previous update
    pub fn previous_state(&self) -> &ComponentState {
        &self.previous_state
    }

    /// Set the state the next update resolves against
    pub fn set_state(&mut self, state: ComponentState) {
        if state != self.state {
            tracing::debug!("AnimationHost: state {} -> {}", self.state, state);
        }
        self.state = state;
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Track an always-running animation
    ///
    /// Replaces a default animation already tracked for the same property.
    pub fn add<A: Animate + 'static>(&mut self, animation: A) -> AnimationId {
        let key = animation.key().clone();
        let id = self.animations.insert(Tracked {
            animation: Box::new(animation),
            role: AnimationRole::Default,
            paused: false,
        });
        if let Some(previous) = self.defaults.insert(key.clone(), id) {
            self.animations.remove(previous);
            tracing::trace!("AnimationHost: replaced default animation for {}", key);
        }
        id
    }

    /// Track a persistent animation played while in `state`
    pub fn add_state_animation<A: Animate + 'static>(
        &mut self,
        state: ComponentState,
        animation: A,
    ) -> Result<AnimationId> {
        self.add_banked(state, animation, false)
    }

    /// Track a one-shot transition played on entering `state`
    pub fn add_transition<A: Animate + 'static>(
        &mut self,
        state: ComponentState,
        animation: A,
    ) -> Result<AnimationId> {
        self.add_banked(state, animation, true)
    }

    fn add_banked<A: Animate + 'static>(
        &mut self,
        state: ComponentState,
        animation: A,
        transition: bool,
    ) -> Result<AnimationId> {
        if !self.available_states.contains(&state) {
            return Err(AnimationError::InvalidConfiguration(format!(
                "state `{state}` is not declared on this host"
            )));
        }

        let key = animation.key().clone();
        let role = if transition {
            AnimationRole::Transition(state.clone())
        } else {
            AnimationRole::State(state.clone())
        };
        let id = self.animations.insert(Tracked {
            animation: Box::new(animation),
            role,
            paused: false,
        });

        let bank = if transition {
            &mut self.transition_bank
        } else {
            &mut self.state_bank
        };
        let bucket = bank.entry(key).or_default();
        if let Some(previous) = bucket.entries.insert(state, id) {
            self.animations.remove(previous);
        }
        Ok(id)
    }

    /// Stop tracking an animation
    pub fn remove(&mut self, id: AnimationId) -> Result<()> {
        let tracked = self
            .animations
            .remove(id)
            .ok_or_else(|| unknown(id))?;
        let key = tracked.animation.key();
        match tracked.role {
            AnimationRole::Default => {
                self.defaults.shift_remove(key);
            }
            AnimationRole::State(state) => detach(&mut self.state_bank, key, &state),
            AnimationRole::Transition(state) => detach(&mut self.transition_bank, key, &state),
        }
        Ok(())
    }

    /// Drop every state animation and transition of a property
    pub fn clear_state_animations(&mut self, key: &PropertyKey) {
        for bank in [&mut self.state_bank, &mut self.transition_bank] {
            if let Some(bucket) = bank.shift_remove(key) {
                for id in bucket.entries.values() {
                    self.animations.remove(*id);
                }
            }
        }
    }

    // =========================================================================
    // Queries and control
    // =========================================================================

    pub fn pause(&mut self, id: AnimationId) -> Result<()> {
        self.tracked_mut(id)?.paused = true;
        Ok(())
    }

    pub fn resume(&mut self, id: AnimationId) -> Result<()> {
        self.tracked_mut(id)?.paused = false;
        Ok(())
    }

    pub fn is_paused(&self, id: AnimationId) -> Result<bool> {
        Ok(self.tracked(id)?.paused)
    }

    pub fn is_finished(&self, id: AnimationId) -> Result<bool> {
        Ok(self.tracked(id)?.animation.is_finished())
    }

    pub fn animation_state(&self, id: AnimationId) -> Result<AnimationState> {
        Ok(self.tracked(id)?.animation.state())
    }

    pub fn role(&self, id: AnimationId) -> Result<&AnimationRole> {
        Ok(&self.tracked(id)?.role)
    }

    pub fn contains(&self, id: AnimationId) -> bool {
        self.animations.contains_key(id)
    }

    /// Number of tracked animations across all banks
    pub fn tracked_count(&self) -> usize {
        self.animations.len()
    }

    fn tracked(&self, id: AnimationId) -> Result<&Tracked> {
        self.animations.get(id).ok_or_else(|| unknown(id))
    }

    fn tracked_mut(&mut self, id: AnimationId) -> Result<&mut Tracked> {
        self.animations.get_mut(id).ok_or_else(|| unknown(id))
    }

    // =========================================================================
    // Per-frame update
    // =========================================================================

    /// Advance every animation by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        self.update_defaults(dt);

        let state_changed = self.state != self.previous_state;
        let transitioning = self.update_transitions(dt, state_changed);
        self.update_state_animations(dt, state_changed, &transitioning);

        self.previous_state = self.state.clone();
    }

    /// Default animations; those already finished are dropped this frame so
    /// callers could observe the finished flag for one frame
    fn update_defaults(&mut self, dt: f32) {
        let mut finished = Vec::new();
        for id in self.defaults.values() {
            let Some(tracked) = self.animations.get_mut(*id) else {
                continue;
            };
            if tracked.paused {
                continue;
            }
            if tracked.animation.is_finished() {
                finished.push(*id);
            } else {
                tracked.animation.evaluate(dt);
            }
        }

        for id in finished {
            if let Some(tracked) = self.animations.remove(id) {
                tracing::trace!(
                    "AnimationHost: purged finished animation for {}",
                    tracked.animation.key()
                );
                self.defaults.shift_remove(tracked.animation.key());
            }
        }
    }

    /// Returns the properties with a transition running this frame
    fn update_transitions(&mut self, dt: f32, state_changed: bool) -> FxHashSet<PropertyKey> {
        let mut transitioning = FxHashSet::default();
        for (key, bucket) in self.transition_bank.iter_mut() {
            if state_changed {
                reset_active(&mut self.animations, bucket);
            }
            if let Some(id) = play_match(&mut self.animations, bucket, &self.state, true, dt) {
                tracing::trace!("AnimationHost: transition {:?} running for {}", id, key);
                transitioning.insert(key.clone());
            }
        }
        transitioning
    }

    fn update_state_animations(
        &mut self,
        dt: f32,
        state_changed: bool,
        transitioning: &FxHashSet<PropertyKey>,
    ) {
        for (key, bucket) in self.state_bank.iter_mut() {
            if state_changed {
                reset_active(&mut self.animations, bucket);
            }
            if transitioning.contains(key) {
                continue;
            }
            // Default entries only play on an exact match here
            play_match(&mut self.animations, bucket, &self.state, false, dt);
        }
    }
}

impl Default for AnimationHost {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AnimationHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationHost")
            .field("tracked", &self.animations.len())
            .field("defaults", &self.defaults.len())
            .field("state_buckets", &self.state_bank.len())
            .field("transition_buckets", &self.transition_bank.len())
            .field("state", &self.state)
            .finish()
    }
}

fn unknown(id: AnimationId) -> AnimationError {
    AnimationError::UnknownAnimation(format!("{id:?} is not tracked by this host"))
}

fn detach(bank: &mut Bank, key: &PropertyKey, state: &ComponentState) {
    if let Some(bucket) = bank.get_mut(key) {
        bucket.entries.shift_remove(state);
        if bucket.active.as_ref() == Some(state) {
            bucket.active = None;
        }
        if bucket.entries.is_empty() {
            bank.shift_remove(key);
        }
    }
}

fn reset_active(animations: &mut SlotMap<AnimationId, Tracked>, bucket: &mut Bucket) {
    let Some(active) = bucket.active.take() else {
        return;
    };
    if let Some(tracked) = bucket
        .entries
        .get(&active)
        .and_then(|id| animations.get_mut(*id))
    {
        tracked.animation.reset();
    }
}

/// Evaluate the bucket entry matching `current`
///
/// Returns the id when an unpaused, unfinished entry was evaluated.
fn play_match(
    animations: &mut SlotMap<AnimationId, Tracked>,
    bucket: &mut Bucket,
    current: &ComponentState,
    allow_default: bool,
    dt: f32,
) -> Option<AnimationId> {
    let (state, id) = bucket.resolve(current, allow_default)?;
    let state = state.clone();
    let tracked = animations.get_mut(id)?;
    bucket.active = Some(state);

    if tracked.paused || tracked.animation.is_finished() {
        return None;
    }
    tracked.animation.evaluate(dt);
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::PropertyAnimation;
    use crate::config::AnimationConfig;
    use crate::interpolate::InterpolatorRegistry;
    use crate::property::{Property, TargetId};
    use crate::timeline::Timeline;
    use std::cell::Cell;
    use std::rc::Rc;
    use strata_core::tags;

    struct Fixture {
        registry: InterpolatorRegistry,
        target: TargetId,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: InterpolatorRegistry::new(),
                target: TargetId::unique(),
            }
        }

        fn animation(
            &self,
            cell: &Rc<Cell<f32>>,
            to: f32,
            config: AnimationConfig,
        ) -> PropertyAnimation<f32> {
            let property = Property::from_cell(PropertyKey::new(self.target, "opacity"), Rc::clone(cell));
            let timeline = Timeline::new(0.0, to, self.registry.get().unwrap());
            PropertyAnimation::new(property, timeline, config).unwrap()
        }
    }

    fn hovered() -> ComponentState {
        ComponentState::from(tags::HOVERED)
    }

    #[test]
    fn test_default_animation_removed_a_frame_after_finishing() {
        let fx = Fixture::new();
        let cell = Rc::new(Cell::new(0.0));
        let mut host = AnimationHost::new();
        let id = host.add(fx.animation(&cell, 1.0, AnimationConfig::new().seconds(1.0)));

        host.update(1.0);
        assert_eq!(host.is_finished(id), Ok(true));
        assert_eq!(cell.get(), 1.0);

        host.update(0.1);
        assert!(!host.contains(id));
        assert_eq!(host.is_finished(id), Err(unknown(id)));
    }

    #[test]
    fn test_default_animation_replaced_for_same_property() {
        let fx = Fixture::new();
        let cell = Rc::new(Cell::new(0.0));
        let mut host = AnimationHost::new();
        let first = host.add(fx.animation(&cell, 1.0, AnimationConfig::new()));
        let second = host.add(fx.animation(&cell, 2.0, AnimationConfig::new()));

        assert!(!host.contains(first));
        assert!(host.contains(second));
        assert_eq!(host.tracked_count(), 1);
    }

    #[test]
    fn test_undeclared_state_rejected() {
        let fx = Fixture::new();
        let cell = Rc::new(Cell::new(0.0));
        let mut host = AnimationHost::new();

        let result = host.add_state_animation(hovered(), fx.animation(&cell, 1.0, AnimationConfig::new()));
        assert!(matches!(result, Err(AnimationError::InvalidConfiguration(_))));

        let default = host.add_transition(ComponentState::empty(), fx.animation(&cell, 1.0, AnimationConfig::new()));
        assert!(default.is_ok());
    }

    #[test]
    fn test_unknown_animation_errors() {
        let fx = Fixture::new();
        let cell = Rc::new(Cell::new(0.0));
        let mut host = AnimationHost::new();
        let id = host.add(fx.animation(&cell, 1.0, AnimationConfig::new()));
        host.remove(id).unwrap();

        assert!(matches!(host.pause(id), Err(AnimationError::UnknownAnimation(_))));
        assert!(matches!(host.resume(id), Err(AnimationError::UnknownAnimation(_))));
        assert!(matches!(host.is_paused(id), Err(AnimationError::UnknownAnimation(_))));
        assert!(matches!(host.remove(id), Err(AnimationError::UnknownAnimation(_))));
    }

    #[test]
    fn test_paused_default_animation_does_not_advance() {
        let fx = Fixture::new();
        let cell = Rc::new(Cell::new(0.0));
        let mut host = AnimationHost::new();
        let id = host.add(fx.animation(&cell, 1.0, AnimationConfig::new().seconds(1.0)));

        host.pause(id).unwrap();
        host.update(0.5);
        assert_eq!(cell.get(), 0.0);
        assert_eq!(host.is_paused(id), Ok(true));

        host.resume(id).unwrap();
        host.update(0.5);
        assert!((cell.get() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_transition_suppresses_state_animation() {
        let fx = Fixture::new();
        let persistent_cell = Rc::new(Cell::new(0.0));
        let transition_cell = Rc::new(Cell::new(0.0));
        let mut host = AnimationHost::with_states([hovered()]);

        let persistent = host
            .add_state_animation(
                hovered(),
                fx.animation(&persistent_cell, 10.0, AnimationConfig::new().seconds(1.0).endless()),
            )
            .unwrap();
        let transition = host
            .add_transition(
                hovered(),
                fx.animation(&transition_cell, 1.0, AnimationConfig::new().seconds(0.5)),
            )
            .unwrap();

        host.set_state(hovered());
        host.update(0.25);
        assert!((transition_cell.get() - 0.5).abs() < 1e-5);
        assert_eq!(persistent_cell.get(), 0.0);
        assert_eq!(host.animation_state(persistent), Ok(AnimationState::Fresh));

        host.update(0.25);
        assert_eq!(host.is_finished(transition), Ok(true));
        assert_eq!(persistent_cell.get(), 0.0);

        host.update(0.25);
        assert!((persistent_cell.get() - 2.5).abs() < 1e-4);
        assert_eq!(host.animation_state(persistent), Ok(AnimationState::Running));
    }

    #[test]
    fn test_state_change_resets_previous_entry() {
        let fx = Fixture::new();
        let cell = Rc::new(Cell::new(0.0));
        let mut host = AnimationHost::with_states([hovered()]);
        let transition = host
            .add_transition(hovered(), fx.animation(&cell, 1.0, AnimationConfig::new().seconds(0.5)))
            .unwrap();

        host.set_state(hovered());
        host.update(0.5);
        assert_eq!(host.is_finished(transition), Ok(true));

        host.set_state(ComponentState::empty());
        host.update(0.1);
        assert_eq!(host.animation_state(transition), Ok(AnimationState::Fresh));
        assert_eq!(host.previous_state(), &ComponentState::empty());

        host.set_state(hovered());
        host.update(0.25);
        assert!((cell.get() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_eligible_match_in_registration_order() {
        let fx = Fixture::new();
        let first = Rc::new(Cell::new(0.0));
        let second = Rc::new(Cell::new(0.0));
        let pressed = ComponentState::from(tags::PRESSED);
        let mut host = AnimationHost::with_states([hovered(), pressed.clone()]);

        host.add_state_animation(hovered(), fx.animation(&first, 1.0, AnimationConfig::new().seconds(1.0)))
            .unwrap();
        host.add_state_animation(pressed, fx.animation(&second, 1.0, AnimationConfig::new().seconds(1.0)))
            .unwrap();

        host.set_state(ComponentState::from([tags::HOVERED, tags::PRESSED]));
        host.update(0.5);
        assert!((first.get() - 0.5).abs() < 1e-5);
        assert_eq!(second.get(), 0.0);
    }

    #[test]
    fn test_default_state_fallback_only_for_transitions() {
        let fx = Fixture::new();
        let other = Fixture::new();
        let persistent_cell = Rc::new(Cell::new(0.0));
        let transition_cell = Rc::new(Cell::new(0.0));
        let mut host = AnimationHost::with_states([hovered()]);
        host.add_state_animation(
            ComponentState::empty(),
            fx.animation(&persistent_cell, 1.0, AnimationConfig::new().seconds(1.0)),
        )
        .unwrap();
        host.add_transition(
            ComponentState::empty(),
            other.animation(&transition_cell, 1.0, AnimationConfig::new().seconds(1.0)),
        )
        .unwrap();

        host.set_state(hovered());
        host.update(0.5);
        assert!((transition_cell.get() - 0.5).abs() < 1e-5);
        assert_eq!(persistent_cell.get(), 0.0);
    }

    #[test]
    fn test_default_state_animation_plays_on_exact_match() {
        let fx = Fixture::new();
        let cell = Rc::new(Cell::new(0.0));
        let mut host = AnimationHost::with_states([hovered()]);
        host.add_state_animation(
            ComponentState::empty(),
            fx.animation(&cell, 1.0, AnimationConfig::new().seconds(1.0)),
        )
        .unwrap();

        host.set_state(hovered());
        host.update(0.5);
        assert_eq!(cell.get(), 0.0);

        host.set_state(ComponentState::empty());
        host.update(0.5);
        assert!((cell.get() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_remove_and_clear_banks() {
        let fx = Fixture::new();
        let cell = Rc::new(Cell::new(0.0));
        let mut host = AnimationHost::with_states([hovered()]);
        let state = host
            .add_state_animation(hovered(), fx.animation(&cell, 1.0, AnimationConfig::new()))
            .unwrap();
        host.add_transition(hovered(), fx.animation(&cell, 1.0, AnimationConfig::new()))
            .unwrap();
        assert_eq!(host.tracked_count(), 2);

        host.remove(state).unwrap();
        assert_eq!(host.tracked_count(), 1);

        host.clear_state_animations(&PropertyKey::new(fx.target, "opacity"));
        assert_eq!(host.tracked_count(), 0);
    }
}
