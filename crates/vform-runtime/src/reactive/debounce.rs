#![forbid(unsafe_code)]

//! Quiet-period filtering with change deduplication.
//!
//! A [`Debounce<T>`] node forwards an upstream value only after the upstream
//! has been silent for the configured quiet period. Every upstream emission
//! cancels the pending timer and schedules a new one, so of a burst of
//! writes only the last survives. The settled value is then published through
//! a [`Signal`], which drops it if it equals the previous settled value.
//!
//! The upstream value present when the node is created counts as an
//! emission: an untouched input still settles once, after one quiet period.
//!
//! # Invariants
//!
//! 1. At most one timer is pending per node.
//! 2. The value emitted when the timer fires is the last upstream value seen.
//! 3. The first settled value always passes; later ones only if they differ.
//! 4. Dropping the node's guards cancels its pending timer.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use vform_core::{SharedScheduler, TimerHandle};
use web_time::Duration;

use super::observable::Subscription;
use super::signal::{Signal, Source};

struct DebounceCore<T> {
    label: &'static str,
    quiet: Duration,
    scheduler: SharedScheduler,
    timer: RefCell<TimerHandle>,
    output: Signal<T>,
}

impl<T: Clone + PartialEq + 'static> DebounceCore<T> {
    fn restart(self: &Rc<Self>, value: T) {
        let mut previous = self.timer.replace(TimerHandle::inert());
        previous.cancel();

        let weak: Weak<Self> = Rc::downgrade(self);
        let handle = self.scheduler.schedule(
            self.quiet,
            Box::new(move || {
                if let Some(core) = weak.upgrade() {
                    core.settle(value);
                }
            }),
        );
        // An inline scheduler has already run the task; keep whatever it left.
        if handle.is_pending() {
            *self.timer.borrow_mut() = handle;
        }
    }

    fn settle(&self, value: T) {
        if self.output.emit(value) {
            tracing::trace!(node = self.label, "debounced value settled");
        } else {
            tracing::trace!(node = self.label, "settled value unchanged");
        }
    }
}

impl<T> Drop for DebounceCore<T> {
    fn drop(&mut self) {
        self.timer.get_mut().cancel();
    }
}

/// Debounced, deduplicated view of a source.
pub struct Debounce<T> {
    signal: Signal<T>,
    guards: Vec<Subscription>,
}

impl<T: Clone + PartialEq + 'static> Debounce<T> {
    /// Debounce `source` by `quiet` on `scheduler`.
    pub fn new<S: Source<T>>(
        label: &'static str,
        source: &S,
        quiet: Duration,
        scheduler: SharedScheduler,
    ) -> Self {
        let core = Rc::new(DebounceCore {
            label,
            quiet,
            scheduler,
            timer: RefCell::new(TimerHandle::inert()),
            output: Signal::pending(),
        });

        let weak = Rc::downgrade(&core);
        let upstream = source.observe(move |value: &T| {
            if let Some(core) = weak.upgrade() {
                core.restart(value.clone());
            }
        });

        if let Some(initial) = source.latest() {
            core.restart(initial);
        }

        Self {
            signal: core.output.clone(),
            guards: vec![upstream, Subscription::new(core)],
        }
    }

    /// Handle to the settled output.
    #[must_use]
    pub fn signal(&self) -> &Signal<T> {
        &self.signal
    }

    /// Split into the output signal and the guards that keep the node wired.
    #[must_use]
    pub fn into_parts(self) -> (Signal<T>, Vec<Subscription>) {
        (self.signal, self.guards)
    }
}
