//! Runtime configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! fixed_delta = 0.016
//! max_delta = 0.1
//! log_filter = "strata_layout=debug,info"
//!
//! [default_animation]
//! duration = { seconds = 0.2 }
//! curve = "ease-out"
//! ```

use std::path::Path;

use serde::Deserialize;
use strata_animation::AnimationConfig;

use crate::error::{Result, RuntimeError};

/// Frame loop configuration
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Constant delta used instead of the measured one
    pub fixed_delta: Option<f32>,
    /// Upper bound for a single frame's delta in seconds
    pub max_delta: f32,
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Configuration for animations built without an explicit one
    pub default_animation: AnimationConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            fixed_delta: None,
            max_delta: 0.1,
            log_filter: "info".to_string(),
            default_animation: AnimationConfig::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        tracing::debug!("RuntimeConfig: loading {}", path.display());
        Self::from_toml(&source)
    }

    pub fn fixed_delta(mut self, dt: f32) -> Self {
        self.fixed_delta = Some(dt);
        self
    }

    pub fn max_delta(mut self, dt: f32) -> Self {
        self.max_delta = dt;
        self
    }

    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    pub fn default_animation(mut self, config: AnimationConfig) -> Self {
        self.default_animation = config;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.max_delta.is_finite() && self.max_delta > 0.0) {
            return Err(RuntimeError::InvalidConfig(format!(
                "max_delta must be positive, got {}",
                self.max_delta
            )));
        }
        if let Some(dt) = self.fixed_delta {
            if !(dt.is_finite() && dt > 0.0) {
                return Err(RuntimeError::InvalidConfig(format!(
                    "fixed_delta must be positive, got {dt}"
                )));
            }
        }
        self.default_animation.validate()?;
        Ok(())
    }
}
