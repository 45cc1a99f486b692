//! Value interpolation
//!
//! Two layers:
//!
//! - [`Interpolate`]: a trait implemented directly by animatable value types
//!   (`f32`, [`Vec2`], [`Vec3`], [`Color`]).
//! - [`Interpolator`]: a strategy object (lerp + equality) looked up per type
//!   from an [`InterpolatorRegistry`]. The registry ships built-ins for the
//!   types above and accepts runtime overrides; the last registration for a
//!   type wins.
//!
//! The registry is an explicit object owned by the animation context rather
//! than process-wide state, so tests can build their own.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use strata_core::{Color, Vec2, Vec3};

use crate::error::{AnimationError, Result};

/// Default tolerance for equality checks on float-based values
pub const DEFAULT_EPSILON: f32 = 1e-6;

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone {
    /// Linearly interpolate between self and other by factor t (0.0 to 1.0)
    fn lerp(&self, other: &Self, t: f32) -> Self;

    /// Check if two values are approximately equal
    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool;
}

// ============================================================================
// Built-in Interpolate implementations
// ============================================================================

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self - other).abs() < epsilon
    }
}

impl Interpolate for Vec2 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec2::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }
}

impl Interpolate for Vec3 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec3::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.x - other.x).abs() < epsilon
            && (self.y - other.y).abs() < epsilon
            && (self.z - other.z).abs() < epsilon
    }
}

impl Interpolate for Color {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Color::lerp(self, other, t)
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.r - other.r).abs() < epsilon
            && (self.g - other.g).abs() < epsilon
            && (self.b - other.b).abs() < epsilon
            && (self.a - other.a).abs() < epsilon
    }
}

// ============================================================================
// Interpolator strategies
// ============================================================================

/// Per-type interpolation strategy
pub trait Interpolator<T> {
    fn lerp(&self, from: &T, to: &T, t: f32) -> T;

    fn equals(&self, a: &T, b: &T) -> bool;
}

/// Strategy backed by a type's [`Interpolate`] impl
#[derive(Debug, Clone, Copy)]
pub struct LerpInterpolator {
    epsilon: f32,
}

impl LerpInterpolator {
    pub fn new(epsilon: f32) -> Self {
        Self { epsilon }
    }
}

impl Default for LerpInterpolator {
    fn default() -> Self {
        Self::new(DEFAULT_EPSILON)
    }
}

impl<T: Interpolate> Interpolator<T> for LerpInterpolator {
    fn lerp(&self, from: &T, to: &T, t: f32) -> T {
        from.lerp(to, t)
    }

    fn equals(&self, a: &T, b: &T) -> bool {
        a.approx_eq(b, self.epsilon)
    }
}

/// Strategy built from a pair of closures
pub struct FnInterpolator<T> {
    lerp: Box<dyn Fn(&T, &T, f32) -> T>,
    equals: Box<dyn Fn(&T, &T) -> bool>,
}

impl<T> FnInterpolator<T> {
    pub fn new<L, E>(lerp: L, equals: E) -> Self
    where
        L: Fn(&T, &T, f32) -> T + 'static,
        E: Fn(&T, &T) -> bool + 'static,
    {
        Self {
            lerp: Box::new(lerp),
            equals: Box::new(equals),
        }
    }
}

impl<T> Interpolator<T> for FnInterpolator<T> {
    fn lerp(&self, from: &T, to: &T, t: f32) -> T {
        (self.lerp)(from, to, t)
    }

    fn equals(&self, a: &T, b: &T) -> bool {
        (self.equals)(a, b)
    }
}

/// Shared handle to a type's interpolator
pub type SharedInterpolator<T> = Arc<dyn Interpolator<T>>;

/// Type-keyed table of interpolation strategies
///
/// Each slot stores a boxed `SharedInterpolator<T>` keyed by `TypeId::of::<T>()`.
pub struct InterpolatorRegistry {
    builtins: FxHashMap<TypeId, Box<dyn Any>>,
    overrides: FxHashMap<TypeId, Box<dyn Any>>,
}

impl InterpolatorRegistry {
    /// Registry with the built-in float, vector and color interpolators
    pub fn new() -> Self {
        let mut registry = Self {
            builtins: FxHashMap::default(),
            overrides: FxHashMap::default(),
        };
        registry.insert_builtin::<f32>();
        registry.insert_builtin::<Vec2>();
        registry.insert_builtin::<Vec3>();
        registry.insert_builtin::<Color>();
        registry
    }

    fn insert_builtin<T: Interpolate + 'static>(&mut self) {
        let strategy: SharedInterpolator<T> = Arc::new(LerpInterpolator::default());
        self.builtins.insert(TypeId::of::<T>(), Box::new(strategy));
    }

    /// Look up the strategy for `T`
    ///
    /// Overrides win over built-ins. Fails with
    /// [`AnimationError::MissingInterpolator`] when neither exists; no
    /// fallback conversion is attempted.
    pub fn get<T: 'static>(&self) -> Result<SharedInterpolator<T>> {
        let id = TypeId::of::<T>();
        self.overrides
            .get(&id)
            .or_else(|| self.builtins.get(&id))
            .and_then(|slot| slot.downcast_ref::<SharedInterpolator<T>>())
            .cloned()
            .ok_or(AnimationError::MissingInterpolator {
                type_name: type_name::<T>(),
            })
    }

    /// Register or replace the strategy for `T`
    pub fn add<T: 'static, I: Interpolator<T> + 'static>(&mut self, interpolator: I) {
        let strategy: SharedInterpolator<T> = Arc::new(interpolator);
        let replaced = self
            .overrides
            .insert(TypeId::of::<T>(), Box::new(strategy))
            .is_some();
        tracing::debug!(
            "InterpolatorRegistry: registered {} (replaced={})",
            type_name::<T>(),
            replaced
        );
    }

    /// Register a strategy from closures
    pub fn add_fn<T, L, E>(&mut self, lerp: L, equals: E)
    where
        T: 'static,
        L: Fn(&T, &T, f32) -> T + 'static,
        E: Fn(&T, &T) -> bool + 'static,
    {
        self.add::<T, _>(FnInterpolator::new(lerp, equals));
    }

    /// Remove a runtime registration for `T`
    ///
    /// Built-ins cannot be removed; after removing an override of a built-in
    /// type, lookups resolve to the built-in again.
    pub fn remove<T: 'static>(&mut self) -> bool {
        self.overrides.remove(&TypeId::of::<T>()).is_some()
    }

    /// Whether a strategy for `T` resolves
    pub fn contains<T: 'static>(&self) -> bool {
        let id = TypeId::of::<T>();
        self.overrides.contains_key(&id) || self.builtins.contains_key(&id)
    }
}

impl Default for InterpolatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InterpolatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpolatorRegistry")
            .field("builtins", &self.builtins.len())
            .field("overrides", &self.overrides.len())
            .finish()
    }
}
