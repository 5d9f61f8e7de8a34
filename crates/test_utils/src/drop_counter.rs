use std::{
    cell::{Cell, RefCell},
    fmt,
    ops::{Deref, DerefMut},
    rc::Rc,
};

/// Counts the construction and destruction of [`Tracked`] values
///
/// Clones of a `DropCounter` share the same counts, so a counter can be handed to the values it
/// observes while the test keeps its own copy. Each counter is independent of every other
/// counter, so tests running in parallel don't interfere with each other.
#[derive(Clone)]
pub struct DropCounter {
    counts: Rc<Counts>,
}

#[derive(Default)]
struct Counts {
    constructed: Cell<usize>,
    dropped: Cell<usize>,
    // `None` when the counter only counts
    drop_order: Option<RefCell<Vec<String>>>,
}

impl DropCounter {
    /// Returns a new counter with zeroed counts that also records the drop order
    pub fn new() -> Self {
        Self {
            counts: Rc::new(Counts {
                drop_order: Some(RefCell::default()),
                ..Counts::default()
            }),
        }
    }

    /// Returns a new counter that only counts, without recording the drop order
    ///
    /// The counter's memory use stays constant no matter how many values it tracks, which makes
    /// it suitable for benchmarks.
    pub fn counts_only() -> Self {
        Self {
            counts: Rc::default(),
        }
    }

    /// Wraps `value` in a [`Tracked`] that reports to this counter
    pub fn track<T: fmt::Debug>(&self, value: T) -> Tracked<T> {
        self.counts
            .constructed
            .set(self.counts.constructed.get() + 1);

        Tracked {
            value,
            counter: self.clone(),
        }
    }

    /// The number of values that have been created by this counter
    pub fn constructed(&self) -> usize {
        self.counts.constructed.get()
    }

    /// The number of tracked values that have been dropped
    pub fn dropped(&self) -> usize {
        self.counts.dropped.get()
    }

    /// The number of tracked values that are still alive
    pub fn alive(&self) -> usize {
        self.constructed() - self.dropped()
    }

    /// The `Debug` representations of the dropped values, in the order they were dropped
    ///
    /// Always empty for a [`counts_only`](Self::counts_only) counter.
    pub fn drop_order(&self) -> Vec<String> {
        self.counts
            .drop_order
            .as_ref()
            .map(|order| order.borrow().clone())
            .unwrap_or_default()
    }

    fn record_drop<T: fmt::Debug>(&self, value: &T) {
        self.counts.dropped.set(self.counts.dropped.get() + 1);
        if let Some(order) = &self.counts.drop_order {
            order.borrow_mut().push(format!("{value:?}"));
        }
    }
}

impl Default for DropCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DropCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropCounter")
            .field("constructed", &self.constructed())
            .field("dropped", &self.dropped())
            .finish()
    }
}

/// A value that reports its destruction to a [`DropCounter`]
///
/// Created with [`DropCounter::track`].
pub struct Tracked<T: fmt::Debug> {
    value: T,
    counter: DropCounter,
}

impl<T: fmt::Debug> Tracked<T> {
    /// Returns the counter that this value reports to
    pub fn counter(&self) -> &DropCounter {
        &self.counter
    }
}

impl<T: fmt::Debug> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: fmt::Debug> DerefMut for Tracked<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: fmt::Debug + Clone> Clone for Tracked<T> {
    fn clone(&self) -> Self {
        self.counter.track(self.value.clone())
    }
}

impl<T: fmt::Debug + PartialEq> PartialEq for Tracked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: fmt::Debug> fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.value, f)
    }
}

impl<T: fmt::Debug> Drop for Tracked<T> {
    fn drop(&mut self) {
        self.counter.record_drop(&self.value);
    }
}
