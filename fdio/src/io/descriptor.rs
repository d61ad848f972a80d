use super::job::{Job, RawMemory};
use super::queue::WorkerState;
use super::transfer::{check_capacity, read_full, write_full};
use super::worker::Worker;
use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::sys::platform::{sys_close, sys_dup, sys_dup2};

use std::fmt;
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, RawFd};
use std::sync::OnceLock;

/// An owned POSIX descriptor.
///
/// `Descriptor` owns a raw handle (file, pipe end, FIFO, socket) and
/// closes it when dropped. It offers two transfer styles:
///
/// - **Blocking**: [`read`](Self::read) and [`write`](Self::write) loop on
///   the OS call until the requested count is moved or the stream ends.
/// - **Asynchronous**: [`async_read`](Self::async_read) and
///   [`async_write`](Self::async_write) queue a job on a per-descriptor
///   worker thread and return immediately. The completion callback runs
///   on that thread with the actual byte count.
///
/// Jobs of one descriptor run strictly in submission order. Dropping or
/// [closing](Self::close) the descriptor waits until every queued job has
/// reported to its callback, then releases the handle.
pub struct Descriptor {
    /// Raw handle; `-1` once released.
    fd: RawFd,

    /// Created by the first asynchronous call.
    worker: OnceLock<Worker>,
}

impl Descriptor {
    /// Wraps a handle this crate just obtained from the OS.
    pub(crate) fn from_owned(fd: RawFd) -> Self {
        Self {
            fd,
            worker: OnceLock::new(),
        }
    }

    /// Reads exactly `n` bytes into the front of `buffer`, unless the
    /// stream ends first.
    ///
    /// Blocks the calling thread. Returns the number of bytes read, which
    /// is smaller than `n` only at end of stream.
    ///
    /// # Errors
    ///
    /// - [`Error::BufferTooSmall`] if `buffer` is empty or shorter than
    ///   `n`; the descriptor is not touched.
    /// - [`Error::Transfer`] if `read(2)` fails. The call is not retried.
    pub fn read(&self, buffer: &mut [u8], n: usize) -> Result<usize> {
        check_capacity(n, buffer.len())?;
        read_full(self.fd, &mut buffer[..n]).into_result("read", self.fd)
    }

    /// Writes the first `n` bytes of `buffer`.
    ///
    /// Blocks the calling thread. Returns the number of bytes written,
    /// which is smaller than `n` only if the descriptor stops accepting
    /// data.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read), for `write(2)`.
    pub fn write(&self, buffer: &[u8], n: usize) -> Result<usize> {
        check_capacity(n, buffer.len())?;
        write_full(self.fd, &buffer[..n]).into_result("write", self.fd)
    }

    /// [`read`](Self::read) into a [`Buffer`].
    pub fn read_buffer(&self, buffer: &mut Buffer, n: usize) -> Result<usize> {
        self.read(buffer.as_mut_slice(), n)
    }

    /// [`write`](Self::write) from a [`Buffer`].
    pub fn write_buffer(&self, buffer: &Buffer, n: usize) -> Result<usize> {
        self.write(buffer.as_slice(), n)
    }

    /// Writes a whole string.
    pub fn write_str(&self, s: &str) -> Result<usize> {
        self.write(s.as_bytes(), s.len())
    }

    /// Schedules a read of `n` bytes into `buffer`.
    ///
    /// Returns as soon as the job is queued. `callback` later receives the
    /// buffer back together with the number of bytes actually read, which
    /// may be short (end of stream or a failed `read(2)`).
    ///
    /// # Errors
    ///
    /// - [`Error::BufferTooSmall`] if `buffer` cannot hold `n` bytes.
    /// - [`Error::Spawn`] if the worker thread could not be started.
    ///
    /// In both cases nothing is queued and `callback` is dropped.
    pub fn async_read<F>(&self, buffer: Buffer, n: usize, callback: F) -> Result<()>
    where
        F: FnOnce(Buffer, usize) + Send + 'static,
    {
        check_capacity(n, buffer.len())?;

        self.worker().submit(Job::ReadBuffer {
            buffer,
            size: n,
            callback: Box::new(callback),
        })
    }

    /// Schedules a write of the first `n` bytes of `buffer`.
    ///
    /// See [`async_read`](Self::async_read).
    pub fn async_write<F>(&self, buffer: Buffer, n: usize, callback: F) -> Result<()>
    where
        F: FnOnce(Buffer, usize) + Send + 'static,
    {
        check_capacity(n, buffer.len())?;

        self.worker().submit(Job::WriteBuffer {
            buffer,
            size: n,
            callback: Box::new(callback),
        })
    }

    /// Schedules a read of `n` bytes into caller-owned memory.
    ///
    /// `callback` receives `ptr` back with the number of bytes read.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writes of `n` bytes, and nothing else may
    /// access that memory, until `callback` has been invoked.
    ///
    /// # Errors
    ///
    /// [`Error::BufferTooSmall`] if `ptr` is null or `n` is zero, otherwise
    /// as [`async_read`](Self::async_read).
    pub unsafe fn async_read_raw<F>(&self, ptr: *mut u8, n: usize, callback: F) -> Result<()>
    where
        F: FnOnce(*mut u8, usize) + Send + 'static,
    {
        check_capacity(n, if ptr.is_null() { 0 } else { n })?;

        self.worker().submit(Job::ReadRaw {
            memory: RawMemory(ptr),
            size: n,
            callback: Box::new(callback),
        })
    }

    /// Schedules a write of `n` bytes from caller-owned memory.
    ///
    /// `callback` receives `ptr` back with the number of bytes written.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `n` bytes, and the memory must not
    /// be mutated, until `callback` has been invoked.
    ///
    /// # Errors
    ///
    /// As [`async_read_raw`](Self::async_read_raw).
    pub unsafe fn async_write_raw<F>(&self, ptr: *const u8, n: usize, callback: F) -> Result<()>
    where
        F: FnOnce(*const u8, usize) + Send + 'static,
    {
        check_capacity(n, if ptr.is_null() { 0 } else { n })?;

        self.worker().submit(Job::WriteRaw {
            memory: RawMemory(ptr),
            size: n,
            callback: Box::new(callback),
        })
    }

    /// Current state of the asynchronous worker.
    pub fn worker_state(&self) -> WorkerState {
        self.worker
            .get()
            .map_or(WorkerState::Idle, |worker| worker.state())
    }

    /// Number of queued asynchronous jobs not yet picked up by the worker.
    pub fn pending_jobs(&self) -> usize {
        self.worker.get().map_or(0, |worker| worker.pending())
    }

    /// Creates an independent descriptor for the same open resource
    /// (`dup(2)`).
    ///
    /// The copy has its own, not yet started, worker.
    pub fn try_clone(&self) -> Result<Descriptor> {
        let fd = sys_dup(self.fd).map_err(|e| Error::os("dup", e))?;
        Ok(Self::from_owned(fd))
    }

    /// Makes this descriptor's number refer to the resource of `src`
    /// (`dup2(2)`).
    ///
    /// The number itself does not change, so queued jobs keep targeting
    /// it and will operate on the new resource.
    pub fn duplicate_from(&self, src: &Descriptor) -> Result<()> {
        sys_dup2(src.fd, self.fd).map_err(|e| Error::os("dup2", e))
    }

    /// Drains the worker and closes the handle, reporting the `close(2)`
    /// result.
    ///
    /// Dropping a descriptor does the same but can only log a failure.
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    /// Shutdown sequence: flush and stop the worker, then close the handle.
    fn release(&mut self) -> Result<()> {
        if self.fd < 0 {
            return Ok(());
        }

        if let Some(worker) = self.worker.get() {
            worker.shutdown();
        }

        let fd = self.fd;
        self.fd = -1;

        tracing::trace!(fd, "closing descriptor");
        sys_close(fd).map_err(|e| Error::os("close", e))
    }

    fn worker(&self) -> &Worker {
        self.worker.get_or_init(|| Worker::new(self.fd))
    }
}

impl AsRawFd for Descriptor {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl FromRawFd for Descriptor {
    /// Takes ownership of `fd`.
    ///
    /// # Safety
    ///
    /// `fd` must be an open descriptor not owned by anything else.
    unsafe fn from_raw_fd(fd: RawFd) -> Self {
        Self::from_owned(fd)
    }
}

impl IntoRawFd for Descriptor {
    /// Releases ownership of the handle without closing it.
    ///
    /// Pending asynchronous jobs are drained first.
    fn into_raw_fd(mut self) -> RawFd {
        if let Some(worker) = self.worker.get() {
            worker.shutdown();
        }

        let fd = self.fd;
        self.fd = -1;
        fd
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("fd", &self.fd)
            .field("worker", &self.worker_state())
            .finish()
    }
}

impl Drop for Descriptor {
    /// Drains pending asynchronous jobs, then closes the handle.
    fn drop(&mut self) {
        // Failures are already logged by `Error::os`.
        let _ = self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::platform::sys_pipe;

    fn pipe() -> (Descriptor, Descriptor) {
        let (r, w) = sys_pipe(libc::O_CLOEXEC).unwrap();
        (Descriptor::from_owned(r), Descriptor::from_owned(w))
    }

    #[test]
    fn oversized_request_is_rejected_before_io() {
        // An invalid handle proves the OS is never called.
        let descriptor = Descriptor::from_owned(-1);

        let mut small = [0u8; 4];
        assert!(matches!(
            descriptor.read(&mut small, 5),
            Err(Error::BufferTooSmall {
                requested: 5,
                capacity: 4
            })
        ));

        let mut empty = [0u8; 0];
        assert!(matches!(
            descriptor.read(&mut empty, 0),
            Err(Error::BufferTooSmall { .. })
        ));

        assert!(descriptor.async_read(Buffer::new(2), 3, |_, _| {}).is_err());
        assert_eq!(descriptor.worker_state(), WorkerState::Idle);
    }

    #[test]
    fn null_raw_pointer_is_rejected() {
        let (reader, _writer) = pipe();

        let result = unsafe { reader.async_read_raw(std::ptr::null_mut(), 4, |_, _| {}) };
        assert!(matches!(result, Err(Error::BufferTooSmall { .. })));
        assert_eq!(reader.worker_state(), WorkerState::Idle);
    }

    #[test]
    fn dup_shares_the_resource() {
        let (reader, writer) = pipe();
        let copy = writer.try_clone().unwrap();
        assert_ne!(copy.as_raw_fd(), writer.as_raw_fd());

        copy.write_str("via copy").unwrap();

        let mut buffer = [0u8; 8];
        assert_eq!(reader.read(&mut buffer, 8).unwrap(), 8);
        assert_eq!(&buffer, b"via copy");
    }

    #[test]
    fn duplicate_from_retargets_the_number() {
        let (first_reader, first_writer) = pipe();
        let (second_reader, second_writer) = pipe();

        let number = first_writer.as_raw_fd();
        first_writer.duplicate_from(&second_writer).unwrap();
        assert_eq!(first_writer.as_raw_fd(), number);

        first_writer.write_str("moved").unwrap();
        drop(first_writer);
        drop(second_writer);

        let mut buffer = [0u8; 5];
        assert_eq!(second_reader.read(&mut buffer, 5).unwrap(), 5);
        assert_eq!(&buffer, b"moved");

        // The first pipe lost its only writer.
        assert_eq!(first_reader.read(&mut buffer, 5).unwrap(), 0);
    }

    #[test]
    fn close_reports_success_once() {
        let (reader, writer) = pipe();
        assert!(writer.close().is_ok());
        assert!(reader.close().is_ok());
    }

    #[test]
    fn into_raw_fd_keeps_the_handle_open() {
        let (reader, writer) = pipe();
        let raw = writer.into_raw_fd();

        let writer = unsafe { Descriptor::from_raw_fd(raw) };
        writer.write_str("x").unwrap();

        let mut buffer = [0u8; 1];
        assert_eq!(reader.read(&mut buffer, 1).unwrap(), 1);
    }
}
