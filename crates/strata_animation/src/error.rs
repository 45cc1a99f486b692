//! Animation error types

use thiserror::Error;

/// Errors raised by the animation system
///
/// Every variant is a deterministic programming or configuration error;
/// nothing here is retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// Configuration rejected at the call that supplied it
    #[error("Invalid animation configuration: {0}")]
    InvalidConfiguration(String),

    /// The host or scheduler does not track this animation
    #[error("Unknown animation: {0}")]
    UnknownAnimation(String),

    /// No interpolator is registered for the value type
    #[error("No interpolator registered for type `{type_name}`")]
    MissingInterpolator { type_name: &'static str },

    /// A curve description could not be parsed
    #[error("Malformed curve `{input}`: {reason}")]
    MalformedCurve { input: String, reason: String },
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
