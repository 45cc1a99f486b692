//! Animation configuration
//!
//! [`AnimationConfig`] carries the recognised options `duration`, `curve`,
//! `repeats` and `direction`. It is built in code with chained setters or
//! deserialized from configuration files:
//!
//! ```rust
//! use strata_animation::{AnimationConfig, Direction, Easing, Repeats};
//!
//! let config = AnimationConfig::new()
//!     .seconds(0.4)
//!     .curve(Easing::EaseOut)
//!     .endless()
//!     .direction(Direction::Alternate);
//!
//! assert_eq!(config.repeats, Repeats::Endless);
//! ```
//!
//! In TOML:
//!
//! ```toml
//! duration = { seconds = 0.4 }
//! curve = "ease-out"
//! repeats = "endless"
//! direction = "alternate"
//! ```

use serde::Deserialize;

use crate::easing::Easing;
use crate::error::{AnimationError, Result};

/// How long one cycle lasts
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationDuration {
    /// Fixed duration: progress is `elapsed / seconds`
    Seconds(f32),
    /// Frame-rate independent exponential smoothing: each tick closes
    /// `1 - e^(-factor * dt)` of the remaining distance
    #[serde(rename = "factor")]
    TimeDeltaFactor(f32),
}

impl AnimationDuration {
    pub fn is_factor(&self) -> bool {
        matches!(self, Self::TimeDeltaFactor(_))
    }

    /// Fixed-duration progress after `elapsed` seconds
    pub(crate) fn linear_progress(seconds: f32, elapsed: f32) -> f32 {
        if seconds <= 0.0 {
            1.0
        } else {
            (elapsed / seconds).clamp(0.0, 1.0)
        }
    }

    /// Exponential approach of `progress` toward 1 over `dt`
    ///
    /// Snaps to exactly 1 once within `FACTOR_SETTLE_EPSILON`.
    pub(crate) fn approach(factor: f32, progress: f32, dt: f32) -> f32 {
        let blend = 1.0 - (-factor * dt).exp();
        let next = progress + (1.0 - progress) * blend;
        if 1.0 - next <= FACTOR_SETTLE_EPSILON {
            1.0
        } else {
            next
        }
    }
}

/// Progress distance from 1 at which factor-mode animations settle
pub const FACTOR_SETTLE_EPSILON: f32 = 1e-6;

impl Default for AnimationDuration {
    fn default() -> Self {
        Self::Seconds(0.3)
    }
}

/// How many cycles to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RepeatsRepr")]
pub enum Repeats {
    Count(u32),
    Endless,
}

impl Repeats {
    /// Sentinel used by integer configuration for endless repetition
    pub const ENDLESS_RAW: i64 = -1;

    /// Convert from the integer form (`-1` means endless)
    pub fn from_raw(raw: i64) -> Result<Self> {
        match raw {
            Self::ENDLESS_RAW => Ok(Self::Endless),
            n if n >= 1 && n <= u32::MAX as i64 => Ok(Self::Count(n as u32)),
            n => Err(AnimationError::InvalidConfiguration(format!(
                "repeat count must be -1 (endless) or at least 1, got {n}"
            ))),
        }
    }

    pub fn is_endless(&self) -> bool {
        matches!(self, Self::Endless)
    }

    /// Whether `cycles` completed cycles exhaust the budget
    pub fn is_exhausted(&self, cycles: u32) -> bool {
        match self {
            Self::Endless => false,
            Self::Count(count) => cycles >= *count,
        }
    }
}

impl Default for Repeats {
    fn default() -> Self {
        Self::Count(1)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RepeatsRepr {
    Raw(i64),
    Named(String),
}

impl TryFrom<RepeatsRepr> for Repeats {
    type Error = AnimationError;

    fn try_from(repr: RepeatsRepr) -> Result<Self> {
        match repr {
            RepeatsRepr::Raw(raw) => Repeats::from_raw(raw),
            RepeatsRepr::Named(name) if name.eq_ignore_ascii_case("endless") => {
                Ok(Repeats::Endless)
            }
            RepeatsRepr::Named(name) => Err(AnimationError::InvalidConfiguration(format!(
                "unknown repeat mode `{name}`"
            ))),
        }
    }
}

/// Playback direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    #[default]
    Forward,
    Reversed,
    /// Forward on even cycles, backward on odd cycles
    Alternate,
    /// Backward on even cycles, forward on odd cycles
    AlternateReversed,
}

impl Direction {
    /// Whether progress plays backward during `cycle`
    ///
    /// Reversal is applied first, then alternation flips it on odd cycles.
    /// `cycle` is the count of cycles completed before the current one.
    pub fn is_reversed(&self, cycle: u32) -> bool {
        let reversed = matches!(self, Self::Reversed | Self::AlternateReversed);
        let alternate = matches!(self, Self::Alternate | Self::AlternateReversed);
        if alternate && cycle % 2 == 1 {
            !reversed
        } else {
            reversed
        }
    }

    /// Apply the direction to raw progress
    pub fn apply(&self, progress: f32, cycle: u32) -> f32 {
        if self.is_reversed(cycle) {
            1.0 - progress
        } else {
            progress
        }
    }
}

/// Builder-style animation configuration
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub duration: AnimationDuration,
    pub curve: Easing,
    pub repeats: Repeats,
    pub direction: Direction,
}

impl AnimationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duration(mut self, duration: AnimationDuration) -> Self {
        self.duration = duration;
        self
    }

    /// Fixed duration in seconds
    pub fn seconds(self, seconds: f32) -> Self {
        self.duration(AnimationDuration::Seconds(seconds))
    }

    /// Exponential smoothing rate
    pub fn factor(self, factor: f32) -> Self {
        self.duration(AnimationDuration::TimeDeltaFactor(factor))
    }

    pub fn curve(mut self, curve: Easing) -> Self {
        self.curve = curve;
        self
    }

    pub fn repeat(mut self, count: u32) -> Self {
        self.repeats = Repeats::Count(count);
        self
    }

    pub fn endless(mut self) -> Self {
        self.repeats = Repeats::Endless;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Reject values no animation can run with
    pub fn validate(&self) -> Result<()> {
        match self.duration {
            AnimationDuration::Seconds(s) if !s.is_finite() || s < 0.0 => {
                return Err(AnimationError::InvalidConfiguration(format!(
                    "duration must be a finite, non-negative number of seconds, got {s}"
                )));
            }
            AnimationDuration::TimeDeltaFactor(f) if !f.is_finite() || f <= 0.0 => {
                return Err(AnimationError::InvalidConfiguration(format!(
                    "time-delta factor must be finite and positive, got {f}"
                )));
            }
            _ => {}
        }
        if self.repeats == Repeats::Count(0) {
            return Err(AnimationError::InvalidConfiguration(
                "repeat count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
