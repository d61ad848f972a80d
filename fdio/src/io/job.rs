use super::transfer::{Transferred, read_full, write_full};
use crate::buffer::Buffer;

use std::fmt;
use std::os::fd::RawFd;
use std::panic::{self, AssertUnwindSafe};
use std::slice;

/// Completion callback of a transfer over a [`Buffer`].
pub(crate) type BufferCallback = Box<dyn FnOnce(Buffer, usize) + Send + 'static>;

/// Completion callback of a read into caller-owned memory.
pub(crate) type ReadRawCallback = Box<dyn FnOnce(*mut u8, usize) + Send + 'static>;

/// Completion callback of a write from caller-owned memory.
pub(crate) type WriteRawCallback = Box<dyn FnOnce(*const u8, usize) + Send + 'static>;

/// Pointer into caller-owned memory carried across to the worker thread.
///
/// The submitter guarantees the memory outlives the job.
pub(crate) struct RawMemory<P>(pub(crate) P);

unsafe impl<P> Send for RawMemory<P> {}

/// Kind of a queued transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JobKind {
    ReadBuffer,
    ReadRaw,
    WriteBuffer,
    WriteRaw,
}

impl JobKind {
    fn op(self) -> &'static str {
        match self {
            JobKind::ReadBuffer | JobKind::ReadRaw => "read",
            JobKind::WriteBuffer | JobKind::WriteRaw => "write",
        }
    }
}

/// One queued asynchronous transfer and its completion callback.
///
/// A job is consumed by [`Job::run`], so it can only execute once and its
/// callback fires exactly once.
pub(crate) enum Job {
    ReadBuffer {
        buffer: Buffer,
        size: usize,
        callback: BufferCallback,
    },
    ReadRaw {
        memory: RawMemory<*mut u8>,
        size: usize,
        callback: ReadRawCallback,
    },
    WriteBuffer {
        buffer: Buffer,
        size: usize,
        callback: BufferCallback,
    },
    WriteRaw {
        memory: RawMemory<*const u8>,
        size: usize,
        callback: WriteRawCallback,
    },
}

impl Job {
    pub(crate) fn kind(&self) -> JobKind {
        match self {
            Job::ReadBuffer { .. } => JobKind::ReadBuffer,
            Job::ReadRaw { .. } => JobKind::ReadRaw,
            Job::WriteBuffer { .. } => JobKind::WriteBuffer,
            Job::WriteRaw { .. } => JobKind::WriteRaw,
        }
    }

    pub(crate) fn size(&self) -> usize {
        match self {
            Job::ReadBuffer { size, .. }
            | Job::ReadRaw { size, .. }
            | Job::WriteBuffer { size, .. }
            | Job::WriteRaw { size, .. } => *size,
        }
    }

    /// Performs the blocking transfer on `fd` and reports to the callback.
    ///
    /// A failed transfer is logged and the callback still runs with the
    /// bytes moved before the failure. A panic raised by the callback is
    /// contained and logged; a panic in the transfer itself is not.
    pub(crate) fn run(self, fd: RawFd) {
        let kind = self.kind();

        match self {
            Job::ReadBuffer {
                mut buffer,
                size,
                callback,
            } => {
                let outcome = read_full(fd, &mut buffer.as_mut_slice()[..size]);
                let bytes = report(fd, kind, outcome);
                complete(fd, kind, || callback(buffer, bytes));
            }

            Job::ReadRaw {
                memory,
                size,
                callback,
            } => {
                let target = unsafe { slice::from_raw_parts_mut(memory.0, size) };
                let outcome = read_full(fd, target);
                let bytes = report(fd, kind, outcome);
                complete(fd, kind, || callback(memory.0, bytes));
            }

            Job::WriteBuffer {
                buffer,
                size,
                callback,
            } => {
                let outcome = write_full(fd, &buffer.as_slice()[..size]);
                let bytes = report(fd, kind, outcome);
                complete(fd, kind, || callback(buffer, bytes));
            }

            Job::WriteRaw {
                memory,
                size,
                callback,
            } => {
                let source = unsafe { slice::from_raw_parts(memory.0, size) };
                let outcome = write_full(fd, source);
                let bytes = report(fd, kind, outcome);
                complete(fd, kind, || callback(memory.0, bytes));
            }
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("kind", &self.kind())
            .field("size", &self.size())
            .finish()
    }
}

/// Hands the outcome to the user callback.
///
/// A panicking callback must not take the worker down: the remaining jobs
/// would never run and the owner would wait forever on close.
fn complete<F: FnOnce()>(fd: RawFd, kind: JobKind, callback: F) {
    if panic::catch_unwind(AssertUnwindSafe(callback)).is_err() {
        tracing::error!(fd, ?kind, "completion callback panicked");
    }
}

fn report(fd: RawFd, kind: JobKind, outcome: Transferred) -> usize {
    match outcome.error {
        None => {
            tracing::debug!(fd, ?kind, bytes = outcome.bytes, "async transfer done");
        }
        Some(err) => {
            tracing::error!(
                fd,
                op = kind.op(),
                bytes = outcome.bytes,
                error = %err,
                "async transfer failed"
            );
        }
    }

    outcome.bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::platform::{sys_close, sys_pipe};

    use std::sync::mpsc;

    #[test]
    fn read_job_hands_buffer_back() {
        let (r, w) = sys_pipe(libc::O_CLOEXEC).unwrap();
        write_full(w, b"hello");

        let (tx, rx) = mpsc::channel();
        let job = Job::ReadBuffer {
            buffer: Buffer::new(8),
            size: 5,
            callback: Box::new(move |buffer, n| tx.send((buffer, n)).unwrap()),
        };

        assert_eq!(job.kind(), JobKind::ReadBuffer);
        job.run(r);

        let (buffer, n) = rx.recv().unwrap();
        assert_eq!(n, 5);
        assert!(buffer.compare(b"hello", 5));

        sys_close(r).unwrap();
        sys_close(w).unwrap();
    }

    #[test]
    fn failed_job_still_calls_back() {
        let (r, w) = sys_pipe(libc::O_CLOEXEC).unwrap();

        let (tx, rx) = mpsc::channel();
        let job = Job::ReadBuffer {
            buffer: Buffer::new(4),
            size: 4,
            callback: Box::new(move |_, n| tx.send(n).unwrap()),
        };

        // Reading the write end fails with EBADF.
        job.run(w);
        assert_eq!(rx.recv().unwrap(), 0);

        sys_close(r).unwrap();
        sys_close(w).unwrap();
    }

    #[test]
    fn panicking_callback_is_contained() {
        let (r, w) = sys_pipe(libc::O_CLOEXEC).unwrap();
        write_full(w, b"x");

        let job = Job::ReadBuffer {
            buffer: Buffer::new(1),
            size: 1,
            callback: Box::new(|_, _| panic!("callback failure")),
        };
        job.run(r);

        sys_close(r).unwrap();
        sys_close(w).unwrap();
    }

    #[test]
    #[should_panic]
    fn oversized_job_is_not_contained() {
        let job = Job::ReadBuffer {
            buffer: Buffer::new(1),
            size: 2,
            callback: Box::new(|_, _| {}),
        };

        // Slicing past the buffer is an internal error and must propagate.
        job.run(-1);
    }
}
