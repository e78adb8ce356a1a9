#![forbid(unsafe_code)]

//! Shared, version-tracked values with change notification.
//!
//! # Design
//!
//! [`Observable<T>`] keeps its value, a version counter and a list of
//! subscriber callbacks in `Rc<RefCell<..>>`. Subscribers are held as `Weak`
//! references; the strong reference lives in the [`Subscription`] returned to
//! the caller, so dropping the subscription is all it takes to unsubscribe.
//! Dead entries are pruned during the next notification.
//!
//! Callbacks run after the interior borrow is released, so a callback may
//! read this observable, set other observables, or subscribe new callbacks.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value,
//!    and once per [`Observable::publish`].
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version bump,
//!    no notifications). `publish` always notifies.
//! 4. A dropped [`Subscription`] is never called again.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Callback<T> = dyn Fn(&T);

struct ObservableInner<T> {
    value: T,
    version: u64,
    subscribers: Vec<Weak<Callback<T>>>,
}

/// A shared value that notifies subscribers when it changes.
///
/// Cloning an `Observable` creates a new handle to the **same** value.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create an observable holding `value` at version 0.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference.
    ///
    /// # Panics
    ///
    /// Panics if `f` sets this same observable (re-entrant borrow).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value. Returns `true` if the value changed and
    /// subscribers were notified.
    pub fn set(&self, value: T) -> bool {
        self.store(value, false)
    }

    /// Store `value` and notify subscribers even if it equals the current
    /// value. The version is bumped on every call.
    pub fn publish(&self, value: T) {
        self.store(value, true);
    }

    fn store(&self, value: T, always: bool) -> bool {
        let callbacks = {
            let mut inner = self.inner.borrow_mut();
            if !always && inner.value == value {
                return false;
            }
            inner.value = value.clone();
            inner.version += 1;
            inner.subscribers.retain(|weak| weak.strong_count() > 0);
            inner
                .subscribers
                .iter()
                .filter_map(Weak::upgrade)
                .collect::<Vec<_>>()
        };
        for callback in callbacks {
            callback(&value);
        }
        true
    }

    /// Modify the value in place through a copy. Notifies only if the result
    /// differs from the current value.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.get();
        f(&mut next);
        self.set(next)
    }

    /// Register a callback invoked with the new value after each change.
    ///
    /// The callback stays registered for as long as the returned
    /// [`Subscription`] is alive.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: Rc<Callback<T>> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        Subscription::new(strong)
    }

    /// Number of notifying mutations.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Whether two handles refer to the same value.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    /// Stable identity of the shared value, for de-duplicating dependencies.
    pub(crate) fn node_id(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }
}

/// RAII guard that keeps a callback, timer, or other graph resource alive.
///
/// Dropping the guard releases what it holds: for a subscriber callback that
/// means it is never invoked again.
pub struct Subscription {
    _guard: Box<dyn Any>,
}

impl Subscription {
    /// Wrap any value whose lifetime should be tied to this subscription.
    #[must_use]
    pub fn new(guard: impl Any) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }

    /// Unsubscribe now. Equivalent to dropping the guard.
    pub fn unsubscribe(self) {}
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
