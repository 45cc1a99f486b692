//! Timelines
//!
//! A timeline maps an animation's eased progress onto a concrete
//! `from -> to` range through one interpolator. The animation decides *when*
//! (elapsed time, direction, curve); the timeline decides *what* value that
//! progress means.
//!
//! `from` may be omitted, in which case the timeline captures the property's
//! current value when a run begins and holds it until rewound.

use std::fmt;

use crate::interpolate::SharedInterpolator;

pub struct Timeline<T> {
    from: Option<T>,
    to: T,
    captured: Option<T>,
    interpolator: SharedInterpolator<T>,
}

impl<T: Clone> Timeline<T> {
    /// Explicit `from -> to` range
    pub fn new(from: T, to: T, interpolator: SharedInterpolator<T>) -> Self {
        Self {
            from: Some(from),
            to,
            captured: None,
            interpolator,
        }
    }

    /// Range starting wherever the property is when the run begins
    pub fn to(to: T, interpolator: SharedInterpolator<T>) -> Self {
        Self {
            from: None,
            to,
            captured: None,
            interpolator,
        }
    }

    /// Capture the start value if the timeline has none yet
    pub fn begin(&mut self, current: impl FnOnce() -> T) {
        if self.from.is_none() && self.captured.is_none() {
            self.captured = Some(current());
        }
    }

    /// Forget a captured start value
    pub fn rewind(&mut self) {
        self.captured = None;
    }

    /// Start of the range, if known
    pub fn start(&self) -> Option<&T> {
        self.from.as_ref().or(self.captured.as_ref())
    }

    pub fn target(&self) -> &T {
        &self.to
    }

    /// Value at eased progress `t`
    ///
    /// A timeline whose start was never captured resolves to its target.
    pub fn value_at(&self, t: f32) -> T {
        match self.start() {
            Some(from) => self.interpolator.lerp(from, &self.to, t),
            None => self.to.clone(),
        }
    }

    pub fn interpolator(&self) -> &SharedInterpolator<T> {
        &self.interpolator
    }
}

impl<T: fmt::Debug> fmt::Debug for Timeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("captured", &self.captured)
            .finish()
    }
}
