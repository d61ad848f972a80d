//! Anonymous pipes.

use crate::error::{Error, Result};
use crate::io::Descriptor;
use crate::sys::platform::sys_pipe;

use libc::c_int;

/// An anonymous pipe: a read end and a write end, each an owned
/// [`Descriptor`].
///
/// Reads and writes on the pipe itself are forwarded to the proper end.
/// Either end can be borrowed, for instance to monitor the read end or to
/// queue asynchronous writes on the write end, or split off with
/// [`into_parts`](Pipe::into_parts) to close one side early.
#[derive(Debug)]
pub struct Pipe {
    reader: Descriptor,
    writer: Descriptor,
}

impl Pipe {
    /// Creates a close-on-exec pipe.
    pub fn new() -> Result<Self> {
        Self::with_flags(libc::O_CLOEXEC)
    }

    /// Creates a pipe with the given `pipe2(2)` flags (`O_CLOEXEC`,
    /// `O_NONBLOCK`).
    pub fn with_flags(flags: c_int) -> Result<Self> {
        let (r, w) = sys_pipe(flags).map_err(|e| Error::os("pipe", e))?;

        tracing::debug!(reader = r, writer = w, "pipe created");

        Ok(Self {
            reader: Descriptor::from_owned(r),
            writer: Descriptor::from_owned(w),
        })
    }

    /// The read end.
    pub fn reader(&self) -> &Descriptor {
        &self.reader
    }

    /// The write end.
    pub fn writer(&self) -> &Descriptor {
        &self.writer
    }

    /// Splits the pipe into `(reader, writer)`.
    pub fn into_parts(self) -> (Descriptor, Descriptor) {
        (self.reader, self.writer)
    }

    /// [`Descriptor::read`] on the read end.
    pub fn read(&self, buffer: &mut [u8], n: usize) -> Result<usize> {
        self.reader.read(buffer, n)
    }

    /// [`Descriptor::write`] on the write end.
    pub fn write(&self, buffer: &[u8], n: usize) -> Result<usize> {
        self.writer.write(buffer, n)
    }

    /// [`Descriptor::write_str`] on the write end.
    pub fn write_str(&self, s: &str) -> Result<usize> {
        self.writer.write_str(s)
    }
}
