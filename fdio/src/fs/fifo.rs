use super::c_path;
use crate::error::{Error, Result};
use crate::io::Descriptor;
use crate::sys::platform::{sys_mkfifo, sys_open, sys_pipe_buf};

use libc::{c_int, mode_t};
use std::ops::Deref;
use std::os::fd::{AsRawFd, RawFd};
use std::path::Path;

/// A named pipe.
///
/// The FIFO node is created once with [`Fifo::create`], then each side
/// opens it with [`Fifo::open`]. Opening blocks until the other side
/// opens too, unless `O_NONBLOCK` is given.
#[derive(Debug)]
pub struct Fifo {
    descriptor: Descriptor,
}

impl Fifo {
    /// Creates the FIFO node at `path` with the given permission bits.
    ///
    /// Fails with an OS error if the path already exists.
    pub fn create<P: AsRef<Path>>(path: P, mode: mode_t) -> Result<()> {
        let path = path.as_ref();
        let c_path = c_path("mkfifo", path)?;

        sys_mkfifo(&c_path, mode).map_err(|e| Error::os("mkfifo", e))?;

        tracing::debug!(path = %path.display(), "fifo created");
        Ok(())
    }

    /// Opens the FIFO at `path` with the given `open(2)` flags.
    pub fn open<P: AsRef<Path>>(path: P, flags: c_int) -> Result<Self> {
        let path = path.as_ref();
        let c_path = c_path("open", path)?;

        tracing::debug!(path = %path.display(), "opening fifo");

        let fd = sys_open(&c_path, flags, 0).map_err(|e| {
            tracing::error!(path = %path.display(), "cannot open fifo");
            Error::os("open", e)
        })?;

        Ok(Self {
            descriptor: Descriptor::from_owned(fd),
        })
    }

    /// Returns the number of bytes a single write is guaranteed to
    /// transfer atomically (`PIPE_BUF`).
    ///
    /// `None` if the system sets no limit.
    pub fn capacity(&self) -> Result<Option<usize>> {
        sys_pipe_buf(self.as_raw_fd()).map_err(|e| Error::os("fpathconf", e))
    }

    /// Gives up the FIFO wrapper, keeping the descriptor open.
    pub fn into_descriptor(self) -> Descriptor {
        self.descriptor
    }
}

impl Deref for Fifo {
    type Target = Descriptor;

    fn deref(&self) -> &Descriptor {
        &self.descriptor
    }
}

impl AsRawFd for Fifo {
    fn as_raw_fd(&self) -> RawFd {
        self.descriptor.as_raw_fd()
    }
}
