use super::LockGuard;

use std::sync::{Condvar, PoisonError};

/// A condition variable used together with a [`Lock`](super::Lock).
pub(crate) struct Condition {
    inner: Condvar,
}

impl Condition {
    /// Creates a new condition.
    pub(crate) const fn new() -> Self {
        Self {
            inner: Condvar::new(),
        }
    }

    /// Blocks while `condition` holds.
    ///
    /// The lock is released while sleeping and re-acquired before
    /// `condition` is evaluated again, so spurious wake-ups are absorbed.
    pub(crate) fn wait_while<'a, T, F>(
        &self,
        guard: LockGuard<'a, T>,
        condition: F,
    ) -> LockGuard<'a, T>
    where
        F: FnMut(&mut T) -> bool,
    {
        self.inner
            .wait_while(guard, condition)
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Wakes one thread blocked on this condition.
    pub(crate) fn notify_one(&self) {
        self.inner.notify_one();
    }

    /// Wakes every thread blocked on this condition.
    pub(crate) fn notify_all(&self) {
        self.inner.notify_all();
    }
}
