//! Descriptor ownership and transfers.
//!
//! This module provides [`Descriptor`], the owned OS handle every resource
//! of the crate is built on, together with the machinery behind its
//! asynchronous transfers:
//! - blocking read/write loops that accumulate short transfers,
//! - a FIFO of pending jobs per descriptor,
//! - one lazily started worker thread per descriptor draining that FIFO.
//!
//! The worker never references the [`Descriptor`] itself. It holds the raw
//! number and the shared queue, and the descriptor joins it before
//! releasing the number.

mod descriptor;
mod job;
mod queue;
mod transfer;
mod worker;

pub use descriptor::Descriptor;
pub use queue::WorkerState;
