//! Frame clock
//!
//! The ambient time source of the frame loop. The update phase advances it;
//! the late-update phase only reads the delta it recorded.

use crate::config::RuntimeConfig;

#[derive(Clone, Debug, PartialEq)]
pub struct FrameClock {
    fixed_delta: Option<f32>,
    max_delta: f32,
    delta: f32,
    elapsed: f64,
    frame: u64,
}

impl FrameClock {
    pub fn new(fixed_delta: Option<f32>, max_delta: f32) -> Self {
        Self {
            fixed_delta,
            max_delta,
            delta: 0.0,
            elapsed: 0.0,
            frame: 0,
        }
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(config.fixed_delta, config.max_delta)
    }

    /// Start a new frame and return its delta
    ///
    /// A fixed delta replaces `raw`; otherwise `raw` is clamped to
    /// `[0, max_delta]`, with non-finite values treated as 0.
    pub fn advance(&mut self, raw: f32) -> f32 {
        let dt = match self.fixed_delta {
            Some(fixed) => fixed,
            None if raw.is_finite() => raw.clamp(0.0, self.max_delta),
            None => 0.0,
        };
        if dt < raw && self.fixed_delta.is_none() {
            tracing::trace!("FrameClock: clamped {}s frame to {}s", raw, dt);
        }
        self.delta = dt;
        self.elapsed += f64::from(dt);
        self.frame += 1;
        dt
    }

    /// Delta of the current frame
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Seconds accumulated over all frames
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Frames started so far
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::from_config(&RuntimeConfig::default())
    }
}
