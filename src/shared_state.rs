use parking_lot::RwLock;
use tracing::trace;

/// A named reader/writer lock around shared state
///
/// Access is scoped to a closure so a guard can never escape and be held
/// while unrelated work (such as running handlers) happens.
pub(crate) struct SharedState<T> {
    /// The underlying shared state
    inner: RwLock<T>,
    /// Debug name for this shared state (used in logging)
    name: String,
}

impl<T> SharedState<T> {
    /// Create a new SharedState with the given name
    pub fn with_name(value: T, name: impl Into<String>) -> Self {
        Self {
            inner: RwLock::new(value),
            name: name.into(),
        }
    }

    /// Read the value under a shared lock and return the result of `f`
    pub fn with_read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        trace!(name = %self.name, "Acquiring read lock");
        let guard = self.inner.read();
        f(&guard)
    }

    /// Modify the value under an exclusive lock and return the result of `f`
    pub fn with_write<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        trace!(name = %self.name, "Acquiring write lock");
        let mut guard = self.inner.write();
        f(&mut guard)
    }

    /// Replace the inner value, returning the old value
    pub fn replace(&self, value: T) -> T {
        self.with_write(|inner| std::mem::replace(inner, value))
    }
}
