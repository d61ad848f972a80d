//! Read-readiness multiplexing.
//!
//! A [`Monitor`] watches many descriptors from a single thread. Each
//! watched descriptor is associated with exactly one [`Observer`]; one
//! observer may watch any number of descriptors.
//!
//! [`Monitor::wait`] blocks in `select(2)` and, once it returns, notifies
//! the observer of every descriptor found readable. Only read readiness is
//! watched.

mod observer;
mod selector;

pub use observer::Observer;
pub use selector::{Monitor, WaitOutcome};
