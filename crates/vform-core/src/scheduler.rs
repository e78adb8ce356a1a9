#![forbid(unsafe_code)]

//! Single-threaded scheduling contexts.
//!
//! Every reactive node in a vform session runs on exactly one [`Scheduler`].
//! The scheduler is the only place where time enters the system: debounce
//! nodes ask it for delayed re-evaluation, and output bindings post their
//! assignments onto it.
//!
//! Two implementations are provided:
//!
//! - [`EventLoop`]: a cooperative timer queue. Driven either by the real
//!   clock (`run_due`, `run_until_idle`) or by a [`LabClock`] that tests and
//!   replays advance explicitly (`advance`, `advance_to`).
//! - [`ImmediateScheduler`]: runs every task inline, ignoring delays. Useful
//!   for exercising pure graph wiring without any notion of time.
//!
//! # Invariants
//!
//! 1. Tasks run in deadline order; tasks with equal deadlines run in the
//!    order they were scheduled.
//! 2. A cancelled timer never runs.
//! 3. A task scheduled while the loop is running is eligible in the same
//!    pass if its deadline has already been reached.
//! 4. The lab clock observed by a running task equals that task's deadline.
//!
//! # Thread Safety
//!
//! Nothing here is `Send`. A scheduler and everything scheduled on it live on
//! one thread, so no locking is needed.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use web_time::{Duration, Instant};

use crate::clock::{Clock, LabClock};
#[cfg(feature = "tracing")]
use crate::logging::{debug, trace};
#[cfg(not(feature = "tracing"))]
use crate::{debug, trace};

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce()>;

/// Shared handle to a scheduler, as held by reactive nodes.
pub type SharedScheduler = Rc<dyn Scheduler>;

/// A single-threaded execution context that can run work later.
pub trait Scheduler {
    /// Current time on this scheduler's clock.
    fn now(&self) -> Instant;

    /// Run `task` once `delay` has elapsed.
    ///
    /// The returned handle can cancel the task before it runs. Dropping the
    /// handle does not cancel.
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle;

    /// Run `task` as soon as the context is free.
    fn post(&self, task: Task) {
        self.schedule(Duration::ZERO, task).detach();
    }
}

type TimerKey = (Instant, u64);

#[derive(Default)]
struct TimerQueue {
    tasks: BTreeMap<TimerKey, Task>,
    next_seq: u64,
}

impl TimerQueue {
    fn insert(&mut self, deadline: Instant, task: Task) -> TimerKey {
        let key = (deadline, self.next_seq);
        self.next_seq += 1;
        self.tasks.insert(key, task);
        key
    }

    fn pop_due(&mut self, limit: Instant) -> Option<(TimerKey, Task)> {
        let (key, _) = self.tasks.first_key_value()?;
        if key.0 > limit {
            return None;
        }
        self.tasks.pop_first()
    }
}

/// Handle to a scheduled task.
///
/// Handles returned by [`ImmediateScheduler`] are inert: the task has already
/// run by the time the handle exists.
#[derive(Default)]
pub struct TimerHandle {
    slot: Option<(Weak<RefCell<TimerQueue>>, TimerKey)>,
}

impl TimerHandle {
    /// A handle that refers to nothing.
    #[must_use]
    pub fn inert() -> Self {
        Self { slot: None }
    }

    /// Cancel the task if it has not run yet.
    ///
    /// Returns `true` if a pending task was removed. Calling this again, or
    /// after the task ran, is a no-op returning `false`.
    pub fn cancel(&mut self) -> bool {
        let Some((queue, key)) = self.slot.take() else {
            return false;
        };
        match queue.upgrade() {
            Some(queue) => queue.borrow_mut().tasks.remove(&key).is_some(),
            None => false,
        }
    }

    /// Whether the task is still waiting to run.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        match &self.slot {
            Some((queue, key)) => queue
                .upgrade()
                .is_some_and(|q| q.borrow().tasks.contains_key(key)),
            None => false,
        }
    }

    /// Let the task run without keeping a way to cancel it.
    pub fn detach(self) {}
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("pending", &self.is_pending())
            .finish()
    }
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// Cooperative timer queue bound to a [`Clock`].
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use vform_core::{EventLoop, LabClock, Scheduler};
/// use web_time::Duration;
///
/// let clock = LabClock::new();
/// let event_loop = EventLoop::lab(&clock);
/// let fired = Rc::new(Cell::new(false));
/// let flag = Rc::clone(&fired);
/// event_loop
///     .schedule(Duration::from_millis(800), Box::new(move || flag.set(true)))
///     .detach();
///
/// event_loop.advance(Duration::from_millis(799));
/// assert!(!fired.get());
/// event_loop.advance(Duration::from_millis(1));
/// assert!(fired.get());
/// ```
pub struct EventLoop {
    clock: Clock,
    queue: Rc<RefCell<TimerQueue>>,
}

impl EventLoop {
    /// Create an event loop on the given clock.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            queue: Rc::new(RefCell::new(TimerQueue::default())),
        }
    }

    /// Event loop on the real wall clock.
    #[must_use]
    pub fn real() -> Self {
        Self::new(Clock::Real)
    }

    /// Event loop on a lab clock.
    #[must_use]
    pub fn lab(clock: &LabClock) -> Self {
        Self::new(Clock::Lab(clock.clone()))
    }

    /// The loop's time source.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Number of tasks waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().tasks.len()
    }

    /// Deadline of the earliest pending task.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.borrow().tasks.keys().next().map(|key| key.0)
    }

    /// Time until the earliest pending task is due (zero if already due).
    #[must_use]
    pub fn time_until_next(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Run every task whose deadline has been reached. Returns the number of
    /// tasks run.
    pub fn run_due(&self) -> usize {
        let mut ran = 0;
        loop {
            let now = self.clock.now();
            let next = self.queue.borrow_mut().pop_due(now);
            let Some((_, task)) = next else {
                break;
            };
            task();
            ran += 1;
        }
        if ran > 0 {
            trace!(ran, "event loop ran due tasks");
        }
        ran
    }

    /// Run everything due up to `deadline`, moving time forward as it goes.
    ///
    /// On a lab clock this is instantaneous: the clock jumps to each task's
    /// deadline before running it and finally to `deadline`. On the real
    /// clock the calling thread sleeps between tasks.
    pub fn advance_to(&self, deadline: Instant) -> usize {
        let mut ran = 0;
        loop {
            let next = self.next_deadline();
            match next {
                Some(at) if at <= deadline => {
                    self.wait_until(at);
                    ran += self.run_due();
                }
                _ => break,
            }
        }
        self.wait_until(deadline);
        ran + self.run_due()
    }

    /// Advance by `delta` from the current time. See [`advance_to`](Self::advance_to).
    pub fn advance(&self, delta: Duration) -> usize {
        self.advance_to(self.clock.now() + delta)
    }

    /// Run until no task remains, moving time forward as needed.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while let Some(at) = self.next_deadline() {
            self.wait_until(at);
            ran += self.run_due();
        }
        debug!(ran, "event loop idle");
        ran
    }

    fn wait_until(&self, instant: Instant) {
        match &self.clock {
            Clock::Lab(lab) => lab.advance_to(instant),
            Clock::Real => {
                let remaining = instant.saturating_duration_since(Instant::now());
                if !remaining.is_zero() {
                    std::thread::sleep(remaining);
                }
            }
        }
    }
}

impl Scheduler for EventLoop {
    fn now(&self) -> Instant {
        self.clock.now()
    }

    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let deadline = self.clock.now() + delay;
        let key = self.queue.borrow_mut().insert(deadline, task);
        TimerHandle {
            slot: Some((Rc::downgrade(&self.queue), key)),
        }
    }
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("clock", &self.clock)
            .field("pending", &self.pending())
            .finish()
    }
}

// ─── ImmediateScheduler ──────────────────────────────────────────────────────

/// Scheduler that runs every task synchronously at the call site.
///
/// Delays are ignored, so a debounce node on this scheduler forwards every
/// upstream value straight away. Work scheduled from inside a task runs
/// nested inside that task.
#[derive(Debug, Clone, Default)]
pub struct ImmediateScheduler {
    clock: Clock,
}

impl ImmediateScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report time from `clock` instead of the wall clock.
    #[must_use]
    pub fn with_clock(clock: Clock) -> Self {
        Self { clock }
    }
}

impl Scheduler for ImmediateScheduler {
    fn now(&self) -> Instant {
        self.clock.now()
    }

    fn schedule(&self, _delay: Duration, task: Task) -> TimerHandle {
        task();
        TimerHandle::inert()
    }
}
