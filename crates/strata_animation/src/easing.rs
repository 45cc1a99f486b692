//! Easing curves
//!
//! Curves map linear progress in `[0, 1]` to eased progress. The built-in
//! curves satisfy `evaluate(0) == 0` and `evaluate(1) == 1`; custom curves
//! supplied through [`AnimationCurve`] are expected to, but it is not enforced.
//!
//! Curves also parse from CSS-like strings, which is how animation
//! configuration files name them:
//!
//! ```rust
//! use strata_animation::Easing;
//!
//! let ease: Easing = "ease-in-out".parse().unwrap();
//! assert!((ease.evaluate(0.5) - 0.5).abs() < 1e-3);
//!
//! let custom: Easing = "cubic-bezier(0.4, 0, 0.2, 1)".parse().unwrap();
//! assert!(custom.evaluate(0.5) > 0.5);
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{AnimationError, Result};

/// Newton-Raphson convergence tolerance on the x axis
const BEZIER_TOLERANCE: f32 = 1e-5;
/// Newton-Raphson iteration cap
const BEZIER_MAX_ITERATIONS: usize = 10;
/// Bisection fallback iteration cap
const BEZIER_BISECT_ITERATIONS: usize = 40;

/// A stateless progress mapping
pub trait AnimationCurve: Send + Sync {
    /// Map progress in `[0, 1]` to eased progress
    fn evaluate(&self, progress: f32) -> f32;
}

impl<F> AnimationCurve for F
where
    F: Fn(f32) -> f32 + Send + Sync,
{
    fn evaluate(&self, progress: f32) -> f32 {
        self(progress)
    }
}

/// Position of the jump for stepped curves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepPosition {
    /// Jump at the start of each interval
    Start,
    /// Jump at the end of each interval
    #[default]
    End,
    /// Jump at both ends
    Both,
    /// No jump at either end
    None,
}

/// Easing curve
#[derive(Clone, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Easing {
    /// No easing
    #[default]
    Linear,
    /// Exponential ease-out, `1 - 2^(-10t)` with the endpoint pinned to 1
    Exponential,
    /// CSS `ease`, `cubic-bezier(0.25, 0.1, 0.25, 1.0)`
    Ease,
    /// CSS `ease-in`, `cubic-bezier(0.42, 0, 1, 1)`
    EaseIn,
    /// CSS `ease-out`, `cubic-bezier(0, 0, 0.58, 1)`
    EaseOut,
    /// CSS `ease-in-out`, `cubic-bezier(0.42, 0, 0.58, 1)`
    EaseInOut,
    /// Custom cubic bezier with control points `(x1, y1)` and `(x2, y2)`
    CubicBezier { x1: f32, y1: f32, x2: f32, y2: f32 },
    /// Discrete jumps
    Steps { count: u32, position: StepPosition },
    /// User-supplied curve
    Custom(Arc<dyn AnimationCurve>),
}

impl Easing {
    /// Evaluate the curve at `t`, clamped to `[0, 1]`
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::Exponential => exponential_out(t),
            Self::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            Self::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Self::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Self::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(*x1, *y1, *x2, *y2, t),
            Self::Steps { count, position } => stepped(*count, *position, t),
            Self::Custom(curve) => curve.evaluate(t),
        }
    }

    /// Custom cubic bezier; x control values must lie in `[0, 1]`
    pub fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
            return Err(AnimationError::MalformedCurve {
                input: format!("cubic-bezier({x1}, {y1}, {x2}, {y2})"),
                reason: "x control points must be in [0, 1]".into(),
            });
        }
        Ok(Self::CubicBezier { x1, y1, x2, y2 })
    }

    /// Stepped curve with at least one step
    pub fn steps(count: u32, position: StepPosition) -> Result<Self> {
        if count == 0 {
            return Err(AnimationError::MalformedCurve {
                input: format!("steps({count})"),
                reason: "step count must be at least 1".into(),
            });
        }
        Ok(Self::Steps { count, position })
    }

    /// Wrap a user curve
    pub fn custom<C: AnimationCurve + 'static>(curve: C) -> Self {
        Self::Custom(Arc::new(curve))
    }
}

impl AnimationCurve for Easing {
    fn evaluate(&self, progress: f32) -> f32 {
        Easing::evaluate(self, progress)
    }
}

impl PartialEq for Easing {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Linear, Self::Linear)
            | (Self::Exponential, Self::Exponential)
            | (Self::Ease, Self::Ease)
            | (Self::EaseIn, Self::EaseIn)
            | (Self::EaseOut, Self::EaseOut)
            | (Self::EaseInOut, Self::EaseInOut) => true,
            (
                Self::CubicBezier { x1, y1, x2, y2 },
                Self::CubicBezier {
                    x1: ox1,
                    y1: oy1,
                    x2: ox2,
                    y2: oy2,
                },
            ) => x1 == ox1 && y1 == oy1 && x2 == ox2 && y2 == oy2,
            (
                Self::Steps { count, position },
                Self::Steps {
                    count: oc,
                    position: op,
                },
            ) => count == oc && position == op,
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(_) => f.write_str("Custom(..)"),
            other => fmt::Display::fmt(other, f),
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("linear"),
            Self::Exponential => f.write_str("exponential"),
            Self::Ease => f.write_str("ease"),
            Self::EaseIn => f.write_str("ease-in"),
            Self::EaseOut => f.write_str("ease-out"),
            Self::EaseInOut => f.write_str("ease-in-out"),
            Self::CubicBezier { x1, y1, x2, y2 } => {
                write!(f, "cubic-bezier({x1}, {y1}, {x2}, {y2})")
            }
            Self::Steps { count, position } => {
                let pos = match position {
                    StepPosition::Start => "start",
                    StepPosition::End => "end",
                    StepPosition::Both => "both",
                    StepPosition::None => "none",
                };
                write!(f, "steps({count}, {pos})")
            }
            Self::Custom(_) => f.write_str("custom"),
        }
    }
}

impl FromStr for Easing {
    type Err = AnimationError;

    fn from_str(input: &str) -> Result<Self> {
        let malformed = |reason: &str| AnimationError::MalformedCurve {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let normalized = input.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "linear" => return Ok(Self::Linear),
            "exponential" | "ease-out-expo" => return Ok(Self::Exponential),
            "ease" => return Ok(Self::Ease),
            "ease-in" => return Ok(Self::EaseIn),
            "ease-out" => return Ok(Self::EaseOut),
            "ease-in-out" => return Ok(Self::EaseInOut),
            _ => {}
        }

        let (name, args) = normalized
            .strip_suffix(')')
            .and_then(|s| s.split_once('('))
            .ok_or_else(|| malformed("unknown curve name"))?;
        let args: Vec<&str> = args.split(',').map(str::trim).collect();

        match name.trim() {
            "cubic-bezier" => {
                if args.len() != 4 {
                    return Err(malformed("cubic-bezier takes exactly 4 numbers"));
                }
                let mut points = [0.0f32; 4];
                for (slot, arg) in points.iter_mut().zip(&args) {
                    *slot = arg
                        .parse::<f32>()
                        .map_err(|_| malformed("control point is not a number"))?;
                }
                Self::cubic_bezier(points[0], points[1], points[2], points[3])
                    .map_err(|_| malformed("x control points must be in [0, 1]"))
            }
            "steps" => {
                let count = args
                    .first()
                    .and_then(|a| a.parse::<u32>().ok())
                    .ok_or_else(|| malformed("step count is not an integer"))?;
                let position = match args.get(1).copied() {
                    None | Some("end") | Some("jump-end") => StepPosition::End,
                    Some("start") | Some("jump-start") => StepPosition::Start,
                    Some("both") | Some("jump-both") => StepPosition::Both,
                    Some("none") | Some("jump-none") => StepPosition::None,
                    Some(_) => return Err(malformed("unknown step position")),
                };
                if args.len() > 2 {
                    return Err(malformed("steps takes at most 2 arguments"));
                }
                Self::steps(count, position).map_err(|_| malformed("step count must be at least 1"))
            }
            _ => Err(malformed("unknown curve name")),
        }
    }
}

impl TryFrom<String> for Easing {
    type Error = AnimationError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

fn exponential_out(t: f32) -> f32 {
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2f32.powf(-10.0 * t)
    }
}

/// Evaluate a cubic bezier timing curve at progress `x`
///
/// Solves `bezier_x(t) == x` with Newton-Raphson (not cached), then returns
/// `bezier_y(t)`.
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, progress: f32) -> f32 {
    if progress <= 0.0 {
        return 0.0;
    }
    if progress >= 1.0 {
        return 1.0;
    }

    let t = solve_bezier_x(x1, x2, progress);
    bezier_y(y1, y2, t)
}

fn solve_bezier_x(x1: f32, x2: f32, target_x: f32) -> f32 {
    let mut t = target_x;

    for _ in 0..BEZIER_MAX_ITERATIONS {
        let x = bezier_x(x1, x2, t) - target_x;
        if x.abs() < BEZIER_TOLERANCE {
            return t;
        }

        let dx = bezier_x_derivative(x1, x2, t);
        if dx.abs() < 1e-6 {
            break;
        }

        t = (t - x / dx).clamp(0.0, 1.0);
    }

    // Newton stalled on a flat segment; x(t) is monotonic for x1, x2 in [0, 1]
    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    t = target_x;
    for _ in 0..BEZIER_BISECT_ITERATIONS {
        let x = bezier_x(x1, x2, t);
        if (x - target_x).abs() < BEZIER_TOLERANCE {
            break;
        }
        if x < target_x {
            lo = t;
        } else {
            hi = t;
        }
        t = (lo + hi) * 0.5;
    }
    t
}

/// x(t) = 3(1-t)²t·x1 + 3(1-t)t²·x2 + t³
#[inline]
fn bezier_x(x1: f32, x2: f32, t: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * x1 + 3.0 * mt * t * t * x2 + t * t * t
}

#[inline]
fn bezier_y(y1: f32, y2: f32, t: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * y1 + 3.0 * mt * t * t * y2 + t * t * t
}

/// dx/dt = 3(1-t)²·x1 + 6(1-t)t·(x2-x1) + 3t²·(1-x2)
#[inline]
fn bezier_x_derivative(x1: f32, x2: f32, t: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * x1 + 6.0 * mt * t * (x2 - x1) + 3.0 * t * t * (1.0 - x2)
}

fn stepped(steps: u32, position: StepPosition, t: f32) -> f32 {
    if steps == 0 {
        return t;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let steps_f = steps as f32;
    match position {
        StepPosition::Start => (t * steps_f).ceil() / steps_f,
        StepPosition::End => (t * steps_f).floor() / steps_f,
        StepPosition::Both => ((t * (steps_f + 1.0)).floor() / (steps_f + 1.0)).min(1.0),
        StepPosition::None => {
            if steps == 1 {
                if t <= 0.0 {
                    0.0
                } else {
                    0.5
                }
            } else {
                ((t * steps_f).floor() / (steps_f - 1.0)).min(1.0)
            }
        }
    }
}
