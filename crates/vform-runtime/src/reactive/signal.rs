#![forbid(unsafe_code)]

//! Derived-value handles and read-only views.
//!
//! A [`Signal<T>`] is the output of a graph node: it has no value until the
//! node first emits, and from then on always holds the most recent emission.
//! Whether equal consecutive values reach subscribers depends on the node:
//! debounce nodes change-filter their output, derived nodes emit every
//! recomputation.
//!
//! [`Source`] abstracts over anything a node can depend on, which is either a
//! raw [`Observable`] (always has a value) or another node's [`Signal`].
//!
//! [`Published<T>`] is the read-only face of an [`Observable`] handed to
//! external readers: they can read and subscribe, never write.

use super::observable::{Observable, Subscription};

/// Something a graph node can depend on.
pub trait Source<T>: Clone + 'static {
    /// Most recent value, or `None` if nothing has been emitted yet.
    fn latest(&self) -> Option<T>;

    /// Call `callback` with every subsequent value.
    fn observe(&self, callback: impl Fn(&T) + 'static) -> Subscription;

    /// Identity of the underlying storage.
    fn node_id(&self) -> usize;
}

impl<T: Clone + PartialEq + 'static> Source<T> for Observable<T> {
    fn latest(&self) -> Option<T> {
        Some(self.get())
    }

    fn observe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.subscribe(callback)
    }

    fn node_id(&self) -> usize {
        Observable::node_id(self)
    }
}

/// Output of a reactive node.
///
/// Cloning a `Signal` creates a new handle to the same output.
pub struct Signal<T> {
    cell: Observable<Option<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: Clone + PartialEq + std::fmt::Debug + 'static> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("latest", &self.cell.get())
            .field("emissions", &self.cell.version())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    /// A signal that has not emitted yet.
    pub(crate) fn pending() -> Self {
        Self {
            cell: Observable::new(None),
        }
    }

    /// Publish `value`. Returns `false` if it equals the previous emission.
    pub(crate) fn emit(&self, value: T) -> bool {
        self.cell.set(Some(value))
    }

    /// Publish `value` even if it equals the previous emission.
    pub(crate) fn emit_always(&self, value: T) {
        self.cell.publish(Some(value));
    }

    /// Most recent emission.
    #[must_use]
    pub fn latest(&self) -> Option<T> {
        self.cell.get()
    }

    /// Whether the node has emitted at least once.
    #[must_use]
    pub fn has_emitted(&self) -> bool {
        self.cell.with(Option::is_some)
    }

    /// Number of emissions so far.
    #[must_use]
    pub fn emissions(&self) -> u64 {
        self.cell.version()
    }

    /// Call `callback` with every subsequent emission.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.cell.subscribe(move |value| {
            if let Some(value) = value {
                callback(value);
            }
        })
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.cell.subscriber_count()
    }
}

impl<T: Clone + PartialEq + 'static> Source<T> for Signal<T> {
    fn latest(&self) -> Option<T> {
        Signal::latest(self)
    }

    fn observe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.subscribe(callback)
    }

    fn node_id(&self) -> usize {
        self.cell.node_id()
    }
}

/// Read-only view of an [`Observable`].
pub struct Published<T> {
    cell: Observable<T>,
}

impl<T> Clone for Published<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Published<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Published").field(&self.cell).finish()
    }
}

impl<T: Clone + PartialEq + 'static> Published<T> {
    pub(crate) fn new(cell: &Observable<T>) -> Self {
        Self { cell: cell.clone() }
    }

    /// Last assigned value.
    #[must_use]
    pub fn get(&self) -> T {
        self.cell.get()
    }

    /// Access the last assigned value by reference.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.cell.with(f)
    }

    /// Call `callback` after each change.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.cell.subscribe(callback)
    }

    /// Number of changes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.cell.version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn pending_signal_has_no_value() {
        let signal: Signal<bool> = Signal::pending();
        assert!(!signal.has_emitted());
        assert_eq!(signal.latest(), None);
        assert_eq!(signal.emissions(), 0);
    }

    #[test]
    fn emissions_are_change_filtered() {
        let signal = Signal::pending();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = signal.subscribe(move |v: &bool| seen_clone.borrow_mut().push(*v));

        assert!(signal.emit(true));
        assert!(!signal.emit(true));
        assert!(signal.emit(false));

        assert_eq!(*seen.borrow(), vec![true, false]);
        assert_eq!(signal.emissions(), 2);
        assert_eq!(signal.latest(), Some(false));
    }

    #[test]
    fn emit_always_repeats_equal_values() {
        let signal = Signal::pending();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = signal.subscribe(move |v: &u8| seen_clone.borrow_mut().push(*v));

        signal.emit_always(1);
        signal.emit_always(1);
        assert_eq!(*seen.borrow(), vec![1, 1]);
        assert_eq!(signal.emissions(), 2);
    }

    #[test]
    fn observable_source_always_has_value() {
        let obs = Observable::new(String::from("x"));
        assert_eq!(Source::latest(&obs), Some("x".to_string()));
    }

    #[test]
    fn published_reads_through() {
        let cell = Observable::new(false);
        let published = Published::new(&cell);
        assert!(!published.get());
        cell.set(true);
        assert!(published.get());
        assert_eq!(published.version(), 1);
        assert!(published.with(|v| *v));
    }
}
