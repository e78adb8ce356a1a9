#![forbid(unsafe_code)]

//! Eager derived values over one or more [`Source`]s.
//!
//! # Design
//!
//! A [`Derived<T>`] node holds a compute function over the latest values of
//! its sources and publishes the result through a [`Signal<T>`]. Unlike a
//! lazily-pulled cache, the node recomputes the moment any source emits, so
//! readers of the signal never observe a value that is stale relative to the
//! node's inputs.
//!
//! The two-source constructor has combine-latest semantics: nothing is
//! emitted until both sources have a value, after which either source
//! emitting triggers a recomputation with the latest value of the other.
//!
//! # Invariants
//!
//! 1. The compute function runs once per upstream emission, and never while
//!    any source is still without a value.
//! 2. A source passed in more than one slot is subscribed once, so a single
//!    upstream emission causes a single recomputation.
//! 3. Every recomputation is emitted, including one equal to the previous
//!    result. Deduplication happens upstream in [`Debounce`](super::Debounce).
//! 4. Once the node's guards are dropped, upstream emissions no longer reach
//!    it and its signal keeps its last value.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use super::observable::Subscription;
use super::signal::{Signal, Source};

/// Shared interior of a derived node.
struct DerivedNode<T> {
    label: &'static str,
    /// `None` while some source has no value yet.
    compute: Box<dyn Fn() -> Option<T>>,
    output: Signal<T>,
    /// Number of times `compute` produced a value.
    computations: Rc<Cell<u64>>,
}

impl<T: Clone + PartialEq + 'static> DerivedNode<T> {
    fn refresh(&self) {
        let Some(value) = (self.compute)() else {
            return;
        };
        self.computations.set(self.computations.get() + 1);
        tracing::trace!(node = self.label, "derived value recomputed");
        self.output.emit_always(value);
    }
}

/// A value computed from other signals, recomputed on every upstream
/// emission.
///
/// The node stays wired for as long as its guards (see
/// [`into_parts`](Self::into_parts)) are alive.
pub struct Derived<T> {
    signal: Signal<T>,
    computations: Rc<Cell<u64>>,
    guards: Vec<Subscription>,
}

impl<T: Clone + PartialEq + 'static> Derived<T> {
    /// Derive from a single source.
    pub fn from_source<A, S>(
        label: &'static str,
        source: &S,
        map: impl Fn(&A) -> T + 'static,
    ) -> Self
    where
        A: 'static,
        S: Source<A>,
    {
        let s = source.clone();
        Self::wire(
            label,
            Box::new(move || Some(map(&s.latest()?))),
            |node, linker| linker.link(source, node),
        )
    }

    /// Derive from two sources with combine-latest semantics.
    pub fn from2<A, B, SA, SB>(
        label: &'static str,
        a: &SA,
        b: &SB,
        map: impl Fn(&A, &B) -> T + 'static,
    ) -> Self
    where
        A: 'static,
        B: 'static,
        SA: Source<A>,
        SB: Source<B>,
    {
        let (ca, cb) = (a.clone(), b.clone());
        Self::wire(
            label,
            Box::new(move || Some(map(&ca.latest()?, &cb.latest()?))),
            |node, linker| {
                linker.link(a, node);
                linker.link(b, node);
            },
        )
    }

    fn wire(
        label: &'static str,
        compute: Box<dyn Fn() -> Option<T>>,
        link_sources: impl FnOnce(&Weak<DerivedNode<T>>, &mut Linker),
    ) -> Self {
        let computations = Rc::new(Cell::new(0));
        let node = Rc::new(DerivedNode {
            label,
            compute,
            output: Signal::pending(),
            computations: Rc::clone(&computations),
        });

        let mut linker = Linker::default();
        link_sources(&Rc::downgrade(&node), &mut linker);

        // Sources that already hold values produce an immediate result.
        node.refresh();

        let signal = node.output.clone();
        let mut guards = linker.subscriptions;
        guards.push(Subscription::new(node));
        Self {
            signal,
            computations,
            guards,
        }
    }

    /// Handle to the node's output.
    #[must_use]
    pub fn signal(&self) -> &Signal<T> {
        &self.signal
    }

    /// Number of times the compute function has run.
    #[must_use]
    pub fn computations(&self) -> u64 {
        self.computations.get()
    }

    /// Split into the output signal and the guards that keep the node wired.
    #[must_use]
    pub fn into_parts(self) -> (Signal<T>, Vec<Subscription>) {
        (self.signal, self.guards)
    }
}

/// Subscribes a node to its sources, once per distinct source.
#[derive(Default)]
struct Linker {
    seen: Vec<usize>,
    subscriptions: Vec<Subscription>,
}

impl Linker {
    fn link<A, S, T>(&mut self, source: &S, node: &Weak<DerivedNode<T>>)
    where
        A: 'static,
        S: Source<A>,
        T: Clone + PartialEq + 'static,
    {
        let id = source.node_id();
        if self.seen.contains(&id) {
            return;
        }
        self.seen.push(id);
        let node = Weak::clone(node);
        self.subscriptions.push(source.observe(move |_| {
            if let Some(node) = node.upgrade() {
                node.refresh();
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Observable;

    #[test]
    fn single_dep_derived() {
        let source = Observable::new(10);
        let derived = Derived::from_source("double", &source, |v: &i32| v * 2);

        assert_eq!(derived.signal().latest(), Some(20));
        assert_eq!(derived.computations(), 1);

        source.set(5);
        assert_eq!(derived.signal().latest(), Some(10));
        assert_eq!(derived.computations(), 2);
    }

    #[test]
    fn combine_latest_waits_for_all_sources() {
        let a: Signal<i32> = Signal::pending();
        let b: Signal<i32> = Signal::pending();
        let sum = Derived::from2("sum", &a, &b, |x: &i32, y: &i32| x + y);

        a.emit(1);
        assert_eq!(sum.signal().latest(), None);
        assert_eq!(sum.computations(), 0);

        b.emit(2);
        assert_eq!(sum.signal().latest(), Some(3));

        a.emit(10);
        assert_eq!(sum.signal().latest(), Some(12));
    }

    #[test]
    fn repeated_source_subscribed_once() {
        let a: Signal<i32> = Signal::pending();
        let square = Derived::from2("square", &a, &a, |x: &i32, y: &i32| x * y);
        assert_eq!(a.subscriber_count(), 1);

        a.emit(3);
        assert_eq!(square.computations(), 1);
        assert_eq!(square.signal().latest(), Some(9));

        a.emit(-3);
        assert_eq!(square.computations(), 2);
        assert_eq!(square.signal().latest(), Some(9));
    }

    #[test]
    fn equal_results_are_still_emitted() {
        let source = Observable::new(4);
        let parity = Derived::from_source("parity", &source, |v: &i32| v % 2 == 0);
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = parity
            .signal()
            .subscribe(move |v: &bool| seen_clone.borrow_mut().push(*v));
        assert_eq!(parity.signal().emissions(), 1);

        source.set(6);
        source.set(7);
        assert_eq!(parity.computations(), 3);
        assert_eq!(parity.signal().emissions(), 3);
        assert_eq!(*seen.borrow(), vec![true, false]);
    }

    #[test]
    fn chained_nodes_propagate_in_one_pass() {
        let source = Observable::new(String::from("ab"));
        let len = Derived::from_source("len", &source, |s: &String| s.len());
        let long = Derived::from_source("long", len.signal(), |n: &usize| *n >= 3);

        assert_eq!(long.signal().latest(), Some(false));
        source.set("abc".to_string());
        assert_eq!(long.signal().latest(), Some(true));
    }

    #[test]
    fn dropped_guards_detach_node() {
        let source = Observable::new(1);
        let (signal, guards) = Derived::from_source("id", &source, |v: &i32| *v).into_parts();
        assert_eq!(source.subscriber_count(), 1);

        drop(guards);
        assert_eq!(source.subscriber_count(), 0);

        source.set(2);
        assert_eq!(signal.latest(), Some(1));
    }

    #[test]
    fn string_derived() {
        let first = Observable::new("Jane".to_string());
        let last = Observable::new("Doe".to_string());
        let full = Derived::from2("full", &first, &last, |f: &String, l: &String| {
            format!("{f} {l}")
        });
        assert_eq!(full.signal().latest().as_deref(), Some("Jane Doe"));

        last.set("Smith".to_string());
        assert_eq!(full.signal().latest().as_deref(), Some("Jane Smith"));
    }
}
