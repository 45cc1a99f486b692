//! Component interaction states
//!
//! A [`ComponentState`] is an order-insensitive set of string tags such as
//! `"hovered"` or `"pressed"`. States compose with set operators and are
//! matched against registered states by the animation host:
//!
//! ```rust
//! use strata_core::ComponentState;
//!
//! let hovered = ComponentState::from("hovered");
//! let pressed = ComponentState::from("pressed");
//!
//! let both = &hovered | &pressed;
//! assert!(hovered.is_eligible_for(&both));
//! assert_eq!(&both - &pressed, hovered);
//! ```

use smallvec::SmallVec;
use std::fmt;
use std::ops::{BitOr, BitXor, Sub};
use std::sync::Arc;

/// Well-known tag names
pub mod tags {
    pub const HOVERED: &str = "hovered";
    pub const PRESSED: &str = "pressed";
    pub const FOCUSED: &str = "focused";
    pub const SELECTED: &str = "selected";
    pub const DISABLED: &str = "disabled";
}

/// An order-insensitive set of state tags
///
/// Tags are kept sorted and deduplicated, so equality and hashing compare
/// element sets regardless of insertion order. The empty set is the default
/// state.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentState {
    tags: SmallVec<[Arc<str>; 4]>,
}

impl ComponentState {
    /// The default (empty) state
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a state from any collection of tags
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = Self::default();
        for tag in tags {
            state.insert(tag.as_ref());
        }
        state
    }

    /// Whether this is the default (empty) state
    pub fn is_default(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.position(tag).is_ok()
    }

    /// Iterate tags in sorted order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|t| t.as_ref())
    }

    /// Add a tag; returns false if it was already present
    pub fn insert(&mut self, tag: &str) -> bool {
        match self.position(tag) {
            Ok(_) => false,
            Err(index) => {
                self.tags.insert(index, Arc::from(tag));
                true
            }
        }
    }

    /// Remove a tag; returns false if it was not present
    pub fn remove(&mut self, tag: &str) -> bool {
        match self.position(tag) {
            Ok(index) => {
                self.tags.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    /// Builder-style tag insertion
    pub fn with(mut self, tag: &str) -> Self {
        self.insert(tag);
        self
    }

    pub fn union(&self, other: &ComponentState) -> ComponentState {
        let mut out = self.clone();
        for tag in other.tags.iter() {
            if let Err(index) = out.position(tag) {
                out.tags.insert(index, Arc::clone(tag));
            }
        }
        out
    }

    /// Tags in `self` that are not in `other`
    pub fn difference(&self, other: &ComponentState) -> ComponentState {
        ComponentState {
            tags: self
                .tags
                .iter()
                .filter(|t| !other.contains(t))
                .cloned()
                .collect(),
        }
    }

    pub fn symmetric_difference(&self, other: &ComponentState) -> ComponentState {
        self.difference(other).union(&other.difference(self))
    }

    /// Whether every tag of `self` is active in `active`
    ///
    /// A registered state is eligible for the current state when its tag set
    /// is a subset of the active tags. The default state is eligible for
    /// every state.
    pub fn is_eligible_for(&self, active: &ComponentState) -> bool {
        self.tags.iter().all(|t| active.contains(t))
    }

    /// Whether an equal state appears in `states`
    pub fn represented_in<'a, I>(&self, states: I) -> bool
    where
        I: IntoIterator<Item = &'a ComponentState>,
    {
        states.into_iter().any(|s| s == self)
    }

    fn position(&self, tag: &str) -> Result<usize, usize> {
        self.tags.binary_search_by(|t| t.as_ref().cmp(tag))
    }
}

impl From<&str> for ComponentState {
    fn from(tag: &str) -> Self {
        Self::new([tag])
    }
}

impl<const N: usize> From<[&str; N]> for ComponentState {
    fn from(tags: [&str; N]) -> Self {
        Self::new(tags)
    }
}

impl fmt::Debug for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentState({})", self)
    }
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tags.is_empty() {
            return f.write_str("default");
        }
        for (i, tag) in self.tags.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            f.write_str(tag)?;
        }
        Ok(())
    }
}

impl BitOr for &ComponentState {
    type Output = ComponentState;

    fn bitor(self, rhs: &ComponentState) -> ComponentState {
        self.union(rhs)
    }
}

impl BitOr for ComponentState {
    type Output = ComponentState;

    fn bitor(self, rhs: ComponentState) -> ComponentState {
        self.union(&rhs)
    }
}

impl Sub for &ComponentState {
    type Output = ComponentState;

    fn sub(self, rhs: &ComponentState) -> ComponentState {
        self.difference(rhs)
    }
}

impl Sub for ComponentState {
    type Output = ComponentState;

    fn sub(self, rhs: ComponentState) -> ComponentState {
        self.difference(&rhs)
    }
}

impl BitXor for &ComponentState {
    type Output = ComponentState;

    fn bitxor(self, rhs: &ComponentState) -> ComponentState {
        self.symmetric_difference(rhs)
    }
}

impl BitXor for ComponentState {
    type Output = ComponentState;

    fn bitxor(self, rhs: ComponentState) -> ComponentState {
        self.symmetric_difference(&rhs)
    }
}
