#![forbid(unsafe_code)]

//! Ownership scope for a reactive graph.
//!
//! A [`Scope`] builds nodes on one scheduler and holds every guard those
//! nodes need to stay wired: upstream subscriptions, node interiors, pending
//! debounce timers and output bindings. [`Scope::dispose`] drops all of them
//! in one step, which detaches the whole graph at once.
//!
//! Handles to signals built in a scope remain readable after disposal; they
//! simply stop changing.

use vform_core::SharedScheduler;
use web_time::Duration;

use super::binding::AssignBinding;
use super::debounce::Debounce;
use super::derived::Derived;
use super::observable::{Observable, Subscription};
use super::signal::{Signal, Source};

/// Builder and owner of a reactive graph.
pub struct Scope {
    scheduler: SharedScheduler,
    guards: Vec<Subscription>,
    disposed: bool,
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("guards", &self.guards.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl Scope {
    /// Create an empty scope scheduling on `scheduler`.
    #[must_use]
    pub fn new(scheduler: SharedScheduler) -> Self {
        Self {
            scheduler,
            guards: Vec::new(),
            disposed: false,
        }
    }

    /// The scheduler nodes in this scope run on.
    #[must_use]
    pub fn scheduler(&self) -> &SharedScheduler {
        &self.scheduler
    }

    /// Take ownership of extra guards. Guards adopted after disposal are
    /// dropped immediately.
    pub fn adopt(&mut self, guards: impl IntoIterator<Item = Subscription>) {
        if self.disposed {
            return;
        }
        self.guards.extend(guards);
    }

    /// Debounced, deduplicated view of `source`.
    pub fn debounce<T, S>(&mut self, label: &'static str, source: &S, quiet: Duration) -> Signal<T>
    where
        T: Clone + PartialEq + 'static,
        S: Source<T>,
    {
        let (signal, guards) =
            Debounce::new(label, source, quiet, self.scheduler.clone()).into_parts();
        self.adopt(guards);
        signal
    }

    /// Node computing `map` over one source.
    pub fn map<A, T, S>(
        &mut self,
        label: &'static str,
        source: &S,
        map: impl Fn(&A) -> T + 'static,
    ) -> Signal<T>
    where
        A: 'static,
        T: Clone + PartialEq + 'static,
        S: Source<A>,
    {
        let (signal, guards) = Derived::from_source(label, source, map).into_parts();
        self.adopt(guards);
        signal
    }

    /// Combine-latest of two sources.
    pub fn combine2<A, B, T, SA, SB>(
        &mut self,
        label: &'static str,
        a: &SA,
        b: &SB,
        map: impl Fn(&A, &B) -> T + 'static,
    ) -> Signal<T>
    where
        A: 'static,
        B: 'static,
        T: Clone + PartialEq + 'static,
        SA: Source<A>,
        SB: Source<B>,
    {
        let (signal, guards) = Derived::from2(label, a, b, map).into_parts();
        self.adopt(guards);
        signal
    }

    /// Assign `map(source)` into `target` on the scheduler, skipping the first
    /// `skip` emissions.
    pub fn assign<S, T>(
        &mut self,
        label: &'static str,
        source: &Signal<S>,
        target: &Observable<T>,
        skip: u64,
        map: impl Fn(&S) -> T + 'static,
    ) where
        S: Clone + PartialEq + 'static,
        T: Clone + PartialEq + 'static,
    {
        let binding =
            AssignBinding::new(label, source, target, skip, map, self.scheduler.clone());
        self.adopt(binding.into_guards());
    }

    /// Number of guards held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// Whether the scope holds no guards.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Whether [`dispose`](Self::dispose) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Drop every guard, detaching the graph. Returns `false` if the scope was
    /// already disposed.
    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        let guards = std::mem::take(&mut self.guards);
        tracing::debug!(guards = guards.len(), "disposing reactive scope");
        drop(guards);
        true
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.dispose();
    }
}
