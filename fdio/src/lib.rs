//! # fdio
//!
//! **fdio** is a small toolkit for input/output over POSIX descriptors:
//! files, FIFOs, pipes and Unix-domain sockets.
//!
//! It offers two ways to move bytes and one way to wait for them:
//!
//! - **Blocking transfers** that loop until the requested byte count is
//!   moved or the stream ends, accumulating short reads and writes
//! - **Asynchronous transfers** queued on a dedicated worker thread per
//!   descriptor, completed through a callback, strictly in submission order
//! - A **readiness monitor** built on `select(2)` that watches many
//!   descriptors from one thread and notifies an observer for each one that
//!   becomes readable
//!
//! Closing or dropping a descriptor always flushes its pending asynchronous
//! jobs first: every queued callback runs before the handle is released.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fdio::{Buffer, Pipe};
//!
//! let pipe = Pipe::new()?;
//!
//! // Queue a read on the worker thread of the read end.
//! pipe.reader().async_read(Buffer::new(5), 5, |buffer, n| {
//!     println!("got {:?}", &buffer.as_slice()[..n]);
//! })?;
//!
//! pipe.write_str("hello")?;
//!
//! // Dropping the pipe waits for the callback.
//! drop(pipe);
//! ```
//!
//! ## Monitoring
//!
//! ```rust,ignore
//! use fdio::{Monitor, Observer, StreamSocketServer};
//!
//! struct Acceptor(StreamSocketServer);
//!
//! impl Observer for Acceptor {
//!     fn data_available(&self, monitor: &mut Monitor, _fd: RawFd) {
//!         let client = self.0.accept().unwrap();
//!         // ...
//!     }
//! }
//!
//! let mut monitor = Monitor::new();
//! let acceptor = Rc::new(Acceptor(StreamSocketServer::bind("/tmp/app.sock")?));
//! monitor.start_monitoring(acceptor.clone(), &acceptor.0)?;
//!
//! loop {
//!     monitor.wait()?;
//! }
//! ```
//!
//! ## Modules
//!
//! - [`fs`]: regular files and named pipes
//! - [`net`]: Unix-domain stream listener
//! - [`logging`]: log output configuration

mod buffer;
mod error;
mod io;
mod monitor;
mod pipe;
mod sync;
mod sys;

pub mod fs;
pub mod logging;
pub mod net;

pub use buffer::Buffer;
pub use error::{Error, Result};
pub use fs::{Fifo, File};
pub use io::{Descriptor, WorkerState};
pub use logging::LoggingBuilder;
pub use monitor::{Monitor, Observer, WaitOutcome};
pub use net::StreamSocketServer;
pub use pipe::Pipe;
