use std::sync::{Mutex, MutexGuard, PoisonError};

/// Guard returned by [`Lock::lock`].
pub(crate) type LockGuard<'a, T> = MutexGuard<'a, T>;

/// A mutual exclusion lock that ignores poisoning.
///
/// The protected state of this crate is always left consistent between
/// statements, so a panic while holding the guard does not invalidate it.
pub(crate) struct Lock<T> {
    inner: Mutex<T>,
}

impl<T> Lock<T> {
    /// Creates a new lock protecting `value`.
    pub(crate) const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Acquires the lock, blocking the current thread until it is free.
    pub(crate) fn lock(&self) -> LockGuard<'_, T> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn lock_survives_poisoning() {
        let lock = Arc::new(Lock::new(1));

        let cloned = lock.clone();
        let result = thread::spawn(move || {
            let mut guard = cloned.lock();
            *guard = 2;
            panic!("poison");
        })
        .join();

        assert!(result.is_err());
        assert_eq!(*lock.lock(), 2);
    }
}
