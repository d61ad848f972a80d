//! Blocking synchronization primitives.
//!
//! The job queue of every descriptor is built from these two types:
//! - [`Lock`], a mutex whose guard stays usable after a panic,
//! - [`Condition`], a condition variable paired with a [`Lock`].
//!
//! Completion callbacks are user code running on worker threads. A
//! panicking callback must not poison the queue for the thread that later
//! closes the descriptor, so both types recover the guard instead of
//! propagating poisoning.

mod condition;
mod lock;

pub(crate) use condition::Condition;
pub(crate) use lock::{Lock, LockGuard};
