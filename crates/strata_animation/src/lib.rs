//! Strata Animation System
//!
//! Time-driven property animation for reactive UI components.
//!
//! # Features
//!
//! - **Easing Curves**: linear, exponential, CSS cubic-bezier family, steps, custom
//! - **Interpolators**: per-type lerp + equality strategies with runtime overrides
//! - **Property Animations**: duration or time-delta-factor driven, repeatable,
//!   reversible and alternating
//! - **Timelines**: bind progress to an explicit or captured value range
//! - **Animated Values**: retargetable values that never snap mid-flight
//! - **Animation Hosts**: default, state-keyed and transition animations per component
//! - **Sequential Animations**: groups that finish when their slowest member does
//! - **AnimationContext**: registry + scheduler root, one per application
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use strata_animation::{
//!     AnimationConfig, AnimationContext, AnimationHost, Easing, Property, PropertyKey, TargetId,
//! };
//!
//! let ctx = AnimationContext::new();
//! let opacity = Rc::new(Cell::new(0.0_f32));
//! let property = Property::from_cell(PropertyKey::new(TargetId::unique(), "opacity"), opacity.clone());
//!
//! let fade_in = ctx
//!     .animate(property, Some(0.0), 1.0, AnimationConfig::new().seconds(0.25).curve(Easing::EaseOut))
//!     .unwrap();
//!
//! let mut host = AnimationHost::new();
//! host.add(fade_in);
//! host.update(0.25);
//!
//! assert!((opacity.get() - 1.0).abs() < 1e-4);
//! ```

pub mod animation;
pub mod config;
pub mod context;
pub mod easing;
pub mod error;
pub mod host;
pub mod interpolate;
pub mod property;
pub mod scheduler;
pub mod sequential;
pub mod timeline;
pub mod value;

pub use animation::{Animate, AnimationState, PropertyAnimation};
pub use config::{AnimationConfig, AnimationDuration, Direction, Repeats};
pub use context::AnimationContext;
pub use easing::{AnimationCurve, Easing, StepPosition};
pub use error::{AnimationError, Result};
pub use host::{AnimationHost, AnimationId, AnimationRole};
pub use interpolate::{
    FnInterpolator, Interpolate, Interpolator, InterpolatorRegistry, LerpInterpolator,
    SharedInterpolator,
};
pub use property::{Property, PropertyKey, TargetId};
pub use scheduler::{AnimationScheduler, FrameUpdate, FrameUpdateId, SchedulerHandle};
pub use sequential::SequentialAnimation;
pub use timeline::Timeline;
pub use value::{AnimatedValue, SharedAnimatedValue, SharedAnimation};
