//! Error types for strata_runtime

use strata_animation::AnimationError;
use strata_layout::LayoutError;
use thiserror::Error;

/// Errors surfaced by the frame loop and its configuration
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Animation(#[from] AnimationError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Failed to read a configuration file
    #[error("Config I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a configuration file
    #[error("Config parse failed: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration parsed but holds unusable values
    #[error("Invalid runtime config: {0}")]
    InvalidConfig(String),

    /// Failed to install the tracing subscriber
    #[error("Logging initialization failed: {0}")]
    Logging(String),

    /// Unknown animation host
    #[error("Unknown animation host {0:?}")]
    UnknownHost(crate::runtime::HostId),
}

/// Result type for strata_runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
