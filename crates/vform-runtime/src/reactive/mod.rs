#![forbid(unsafe_code)]

//! Reactive data bindings for vform.
//!
//! This module provides the push-based primitives the form graph is built
//! from:
//!
//! - [`Observable`]: a shared, version-tracked value with change notification
//!   via subscriber callbacks.
//! - [`Subscription`]: RAII guard; dropping it releases what it holds.
//! - [`Signal`]: the output of a node, empty until the node first emits.
//! - [`Derived`]: an eagerly recomputed value over one or two sources, with
//!   combine-latest semantics.
//! - [`Debounce`]: quiet-period filter with change deduplication.
//! - [`AssignBinding`]: posts mapped emissions into an `Observable`.
//! - [`Scope`]: builds nodes on one scheduler and owns all their guards.
//! - [`Published`]: read-only view handed to external readers.
//!
//! # Architecture
//!
//! Everything is single-threaded and shares state through `Rc<RefCell<..>>`.
//! Upstream nodes reference their subscribers weakly; the strong references
//! live in guards owned by a [`Scope`], so disposing the scope is the only
//! step needed to detach a graph.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version bump,
//!    no notifications).
//! 4. A derived node is never stale relative to its last observed inputs.
//! 5. After a scope is disposed no node in it emits and no binding writes.

pub mod binding;
pub mod debounce;
pub mod derived;
pub mod observable;
pub mod scope;
pub mod signal;

pub use binding::AssignBinding;
pub use debounce::Debounce;
pub use derived::Derived;
pub use observable::{Observable, Subscription};
pub use scope::Scope;
pub use signal::{Published, Signal, Source};
