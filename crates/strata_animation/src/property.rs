//! Property accessors
//!
//! Animations mutate component state through explicit typed getter/setter
//! pairs. A [`Property`] couples such a pair with a [`PropertyKey`], the
//! `(target, name)` identity hosts use to keep one animation slot per
//! logical property.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TARGET: AtomicU64 = AtomicU64::new(1);

/// Identity of an animated object
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u64);

impl TargetId {
    /// Allocate a fresh, process-unique id
    pub fn unique() -> Self {
        Self(NEXT_TARGET.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap an id allocated by the caller (e.g. a component handle)
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TargetId({})", self.0)
    }
}

/// `(target, property name)` identity of an animation slot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyKey {
    pub target: TargetId,
    pub name: Cow<'static, str>,
}

impl PropertyKey {
    pub fn new(target: TargetId, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            target,
            name: name.into(),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.target.0, self.name)
    }
}

/// A typed getter/setter pair bound to one property
pub struct Property<T> {
    key: PropertyKey,
    get: Rc<dyn Fn() -> T>,
    set: Rc<dyn Fn(T)>,
}

impl<T: 'static> Property<T> {
    pub fn new<G, S>(key: PropertyKey, get: G, set: S) -> Self
    where
        G: Fn() -> T + 'static,
        S: Fn(T) + 'static,
    {
        Self {
            key,
            get: Rc::new(get),
            set: Rc::new(set),
        }
    }
}

impl<T> Property<T> {
    pub fn key(&self) -> &PropertyKey {
        &self.key
    }

    pub fn get(&self) -> T {
        (self.get)()
    }

    pub fn set(&self, value: T) {
        (self.set)(value)
    }
}

impl<T: Copy + 'static> Property<T> {
    /// Bind a shared `Cell`
    pub fn from_cell(key: PropertyKey, cell: Rc<Cell<T>>) -> Self {
        let reader = Rc::clone(&cell);
        Self::new(key, move || reader.get(), move |value| cell.set(value))
    }
}

impl<T: Clone + 'static> Property<T> {
    /// Bind a shared `RefCell`
    pub fn from_ref_cell(key: PropertyKey, cell: Rc<RefCell<T>>) -> Self {
        let reader = Rc::clone(&cell);
        Self::new(
            key,
            move || reader.borrow().clone(),
            move |value| *cell.borrow_mut() = value,
        )
    }
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            get: Rc::clone(&self.get),
            set: Rc::clone(&self.set),
        }
    }
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property").field("key", &self.key).finish()
    }
}
