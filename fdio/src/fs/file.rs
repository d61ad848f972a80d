use super::c_path;
use crate::error::{Error, Result};
use crate::io::Descriptor;
use crate::sys::platform::{CREATE_FLAGS, CREATE_MODE, sys_lseek, sys_open};

use libc::{SEEK_CUR, SEEK_END, SEEK_SET, c_int, mode_t};
use std::ops::Deref;
use std::os::fd::{AsRawFd, RawFd};
use std::path::Path;

/// A regular file.
///
/// `File` owns the descriptor returned by `open(2)` and exposes it through
/// [`Deref`], so every [`Descriptor`] operation is available:
///
/// ```rust,ignore
/// let file = File::create("out.txt")?;
/// file.write_str("hello")?;
/// assert_eq!(file.len()?, 5);
/// ```
#[derive(Debug)]
pub struct File {
    descriptor: Descriptor,
}

impl File {
    /// Opens `path` with the given `open(2)` flags.
    pub fn open<P: AsRef<Path>>(path: P, flags: c_int) -> Result<Self> {
        Self::open_with_mode(path, flags, 0)
    }

    /// Opens `path` with the given flags and the permission bits used if
    /// `O_CREAT` creates it.
    pub fn open_with_mode<P: AsRef<Path>>(path: P, flags: c_int, mode: mode_t) -> Result<Self> {
        let path = path.as_ref();
        let c_path = c_path("open", path)?;

        let fd = sys_open(&c_path, flags, mode).map_err(|e| {
            tracing::error!(path = %path.display(), "cannot open file");
            Error::os("open", e)
        })?;

        tracing::debug!(fd, path = %path.display(), "file opened");

        Ok(Self {
            descriptor: Descriptor::from_owned(fd),
        })
    }

    /// Creates `path` for reading and writing, truncating it if it exists.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_mode(path, CREATE_FLAGS, CREATE_MODE)
    }

    /// Returns the length of the file in bytes.
    ///
    /// The current offset is left where it was.
    pub fn len(&self) -> Result<u64> {
        let fd = self.as_raw_fd();
        let lseek = |offset: i64, whence: c_int| {
            sys_lseek(fd, offset, whence).map_err(|e| Error::os("lseek", e))
        };

        let current = lseek(0, SEEK_CUR)?;
        let end = lseek(0, SEEK_END)?;
        lseek(current as i64, SEEK_SET)?;

        Ok(end)
    }

    /// Returns `true` if the file holds no bytes.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Gives up the file wrapper, keeping the descriptor open.
    pub fn into_descriptor(self) -> Descriptor {
        self.descriptor
    }
}

impl Deref for File {
    type Target = Descriptor;

    fn deref(&self) -> &Descriptor {
        &self.descriptor
    }
}

impl AsRawFd for File {
    fn as_raw_fd(&self) -> RawFd {
        self.descriptor.as_raw_fd()
    }
}
