//! Strata Core
//!
//! Foundational value types shared by the Strata animation and layout crates:
//!
//! - **Geometry**: points, sizes, rectangles, vectors and colors
//! - **Component States**: composable tag sets such as `hovered+pressed`
//! - **Observers**: synchronous, unsubscribe-safe callback lists
//!
//! # Example
//!
//! ```rust
//! use strata_core::{ComponentState, Observers};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let changes = Observers::<ComponentState>::new();
//! let seen = Rc::new(Cell::new(0));
//!
//! let s = Rc::clone(&seen);
//! let _sub = changes.subscribe(move |state| {
//!     if state.contains("hovered") {
//!         s.set(s.get() + 1);
//!     }
//! });
//!
//! changes.emit(&ComponentState::from("hovered"));
//! assert_eq!(seen.get(), 1);
//! ```

pub mod geometry;
pub mod observer;
pub mod state;

pub use geometry::{Color, Point, Rect, Size, Vec2, Vec3};
pub use observer::{Observers, Subscription, SubscriptionKey};
pub use state::{tags, ComponentState};
