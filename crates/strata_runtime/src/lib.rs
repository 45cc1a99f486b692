//! Strata Runtime
//!
//! Frame loop glue for the Strata animation and layout crates.
//!
//! Each frame runs in two phases: the update phase advances animations and
//! lets components push animated values into layout, then the late-update
//! phase recalculates whatever layout those writes invalidated.
//!
//! # Example
//!
//! ```rust
//! use strata_runtime::Runtime;
//!
//! let mut runtime = Runtime::from_toml(
//!     r#"
//!     fixed_delta = 0.016
//!
//!     [default_animation]
//!     duration = { seconds = 0.2 }
//!     curve = "ease-out"
//!     "#,
//! )
//! .unwrap();
//!
//! let stats = runtime.frame(0.5).unwrap();
//! assert_eq!(stats.delta, 0.016);
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod runtime;

pub use clock::FrameClock;
pub use config::RuntimeConfig;
pub use error::{Result, RuntimeError};
pub use runtime::{FrameStats, HostId, Runtime, UpdateHook};

pub use strata_animation;
pub use strata_core;
pub use strata_layout;

use tracing_subscriber::EnvFilter;

/// Install a global `fmt` subscriber
///
/// `RUST_LOG` takes precedence over `filter` when set. Fails if a subscriber
/// is already installed.
pub fn init_logging(filter: &str) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(env_filter) => env_filter,
        Err(_) => {
            EnvFilter::try_new(filter).map_err(|e| RuntimeError::InvalidConfig(e.to_string()))?
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|e| RuntimeError::Logging(e.to_string()))
}
