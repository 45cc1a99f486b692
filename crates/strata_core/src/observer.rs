//! Observer lists
//!
//! Synchronous, single-threaded change notification. Callbacks run on the
//! thread that raised the event, in subscription order. Subscribing or
//! unsubscribing from inside a callback is allowed: emission iterates over a
//! snapshot, and callbacks removed mid-emission are skipped.
//!
//! A callback stays registered for as long as its [`Subscription`] lives.

use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

new_key_type! {
    /// Key of a single subscription inside an observer list
    pub struct SubscriptionKey;
}

type Callback<T> = Rc<dyn Fn(&T)>;

struct ObserverSlots<T> {
    callbacks: SlotMap<SubscriptionKey, Callback<T>>,
    /// Subscription order (slotmap iteration order is slot order, not insertion order)
    order: Vec<SubscriptionKey>,
}

/// A list of callbacks notified with `&T`
///
/// Cloning an `Observers` yields another handle to the same list.
pub struct Observers<T> {
    slots: Rc<RefCell<ObserverSlots<T>>>,
}

impl<T: 'static> Observers<T> {
    pub fn new() -> Self {
        Self {
            slots: Rc::new(RefCell::new(ObserverSlots {
                callbacks: SlotMap::with_key(),
                order: Vec::new(),
            })),
        }
    }

    /// Register a callback
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        let mut slots = self.slots.borrow_mut();
        let key = slots.callbacks.insert(Rc::new(callback));
        slots.order.push(key);
        let weak: Weak<RefCell<ObserverSlots<T>>> = Rc::downgrade(&self.slots);
        Subscription {
            key,
            remove: Some(Box::new(move |key| {
                if let Some(slots) = weak.upgrade() {
                    let removed = {
                        let mut slots = slots.borrow_mut();
                        slots.order.retain(|k| *k != key);
                        slots.callbacks.remove(key)
                    };
                    // Dropped outside the borrow; the callback may own subscriptions
                    drop(removed);
                }
            })),
        }
    }

    /// Notify every subscriber
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<(SubscriptionKey, Callback<T>)> = {
            let slots = self.slots.borrow();
            slots
                .order
                .iter()
                .filter_map(|k| slots.callbacks.get(*k).map(|cb| (*k, Rc::clone(cb))))
                .collect()
        };

        for (key, callback) in snapshot {
            let still_subscribed = self.slots.borrow().callbacks.contains_key(key);
            if still_subscribed {
                callback(value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every subscriber
    pub fn clear(&self) {
        let removed = {
            let mut slots = self.slots.borrow_mut();
            slots.order.clear();
            std::mem::take(&mut slots.callbacks)
        };
        drop(removed);
    }
}

impl<T: 'static> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Observers<T> {
    fn clone(&self) -> Self {
        Self {
            slots: Rc::clone(&self.slots),
        }
    }
}

impl<T> fmt::Debug for Observers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("subscribers", &self.slots.borrow().callbacks.len())
            .finish()
    }
}

/// Handle returned by [`Observers::subscribe`]
///
/// Dropping the handle removes the callback. Use [`Subscription::detach`]
/// for callbacks that should live as long as the observer list.
#[must_use = "dropping a Subscription removes its callback"]
pub struct Subscription {
    key: SubscriptionKey,
    remove: Option<Box<dyn Fn(SubscriptionKey)>>,
}

impl Subscription {
    pub fn key(&self) -> SubscriptionKey {
        self.key
    }

    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keep the callback registered for the lifetime of the list
    pub fn detach(mut self) {
        self.remove = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove(self.key);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("key", &self.key).finish()
    }
}
