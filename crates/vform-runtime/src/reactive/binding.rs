#![forbid(unsafe_code)]

//! One-way bindings from a [`Signal`] into an [`Observable`].
//!
//! An [`AssignBinding`] maps every emission of its source and posts the
//! assignment onto a scheduler, so writes to the target happen on the
//! scheduling context rather than inside the emitting node. A binding can
//! skip a fixed number of leading emissions.
//!
//! Assignments that were posted but have not run yet become inert when the
//! binding is dropped: the target is never written after its binding is gone.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use vform_core::SharedScheduler;

use super::observable::{Observable, Subscription};
use super::signal::Signal;

struct AssignState<S, T> {
    label: &'static str,
    target: Observable<T>,
    map: Box<dyn Fn(&S) -> T>,
    skip: u64,
    seen: Cell<u64>,
    scheduler: SharedScheduler,
}

impl<S: 'static, T: Clone + PartialEq + 'static> AssignState<S, T> {
    fn deliver(self: &Rc<Self>, value: &S) {
        let seen = self.seen.get() + 1;
        self.seen.set(seen);
        if seen <= self.skip {
            tracing::trace!(binding = self.label, seen, "skipped leading emission");
            return;
        }
        let mapped = (self.map)(value);
        let weak: Weak<Self> = Rc::downgrade(self);
        self.scheduler.post(Box::new(move || {
            if let Some(state) = weak.upgrade() {
                if state.target.set(mapped) {
                    tracing::trace!(binding = state.label, "output assigned");
                }
            }
        }));
    }
}

/// Keeps `target` assigned from `source`.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use vform_core::ImmediateScheduler;
/// use vform_runtime::reactive::{AssignBinding, Derived, Observable};
///
/// let input = Observable::new(2);
/// let (doubled, _guards) = Derived::from_source("doubled", &input, |v: &i32| v * 2).into_parts();
/// let shown = Observable::new(String::new());
/// let _binding = AssignBinding::new(
///     "shown",
///     &doubled,
///     &shown,
///     0,
///     |v: &i32| v.to_string(),
///     Rc::new(ImmediateScheduler::new()),
/// );
/// assert_eq!(shown.get(), "4");
/// input.set(5);
/// assert_eq!(shown.get(), "10");
/// ```
pub struct AssignBinding {
    guards: Vec<Subscription>,
}

impl AssignBinding {
    /// Bind `target` to `map(source)`, ignoring the first `skip` emissions.
    ///
    /// A value already present on `source` counts as its first emission.
    pub fn new<S, T>(
        label: &'static str,
        source: &Signal<S>,
        target: &Observable<T>,
        skip: u64,
        map: impl Fn(&S) -> T + 'static,
        scheduler: SharedScheduler,
    ) -> Self
    where
        S: Clone + PartialEq + 'static,
        T: Clone + PartialEq + 'static,
    {
        let state = Rc::new(AssignState {
            label,
            target: target.clone(),
            map: Box::new(map),
            skip,
            seen: Cell::new(0),
            scheduler,
        });

        let weak = Rc::downgrade(&state);
        let upstream = source.subscribe(move |value: &S| {
            if let Some(state) = weak.upgrade() {
                state.deliver(value);
            }
        });

        if let Some(current) = source.latest() {
            state.deliver(&current);
        }

        Self {
            guards: vec![upstream, Subscription::new(state)],
        }
    }

    /// Release the guards that keep the binding alive.
    #[must_use]
    pub fn into_guards(self) -> Vec<Subscription> {
        self.guards
    }
}
