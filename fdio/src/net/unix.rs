use crate::error::{Error, Result};
use crate::io::Descriptor;
use crate::sys::platform::{LISTEN_BACKLOG, sys_accept, sys_bind_unix, sys_listen, sys_socket_unix};

use libc::c_int;
use std::ops::Deref;
use std::os::fd::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

/// A listening Unix-domain stream socket.
///
/// The socket file is created by [`bind`](Self::bind). It is not removed
/// when the server is dropped.
#[derive(Debug)]
pub struct StreamSocketServer {
    /// Listening socket.
    descriptor: Descriptor,

    /// Filesystem path the socket is bound to.
    path: PathBuf,
}

impl StreamSocketServer {
    /// Binds a listener to `path`.
    ///
    /// This function:
    /// - creates a close-on-exec `AF_UNIX` stream socket,
    /// - binds it to `path`,
    /// - starts listening with the default backlog.
    pub fn bind<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::bind_with_backlog(path, LISTEN_BACKLOG)
    }

    /// Same as [`bind`](Self::bind) with an explicit pending connection
    /// limit.
    pub fn bind_with_backlog<P: AsRef<Path>>(path: P, backlog: c_int) -> Result<Self> {
        let path = path.as_ref();

        let fd = sys_socket_unix().map_err(|e| Error::os("socket", e))?;

        // Owned from here on: an early return closes it.
        let descriptor = Descriptor::from_owned(fd);

        sys_bind_unix(fd, path).map_err(|e| {
            tracing::error!(path = %path.display(), "cannot bind socket");
            Error::os("bind", e)
        })?;
        sys_listen(fd, backlog).map_err(|e| Error::os("listen", e))?;

        tracing::debug!(fd, path = %path.display(), backlog, "socket listening");

        Ok(Self {
            descriptor,
            path: path.to_path_buf(),
        })
    }

    /// Waits for a client and returns the connected descriptor.
    ///
    /// Blocks the calling thread. Register the server with a
    /// [`Monitor`](crate::Monitor) to learn when a call will not block.
    pub fn accept(&self) -> Result<Descriptor> {
        let fd = sys_accept(self.as_raw_fd()).map_err(|e| Error::os("accept", e))?;
        let client = Descriptor::from_owned(fd);

        tracing::debug!(server = self.as_raw_fd(), client = fd, "connection accepted");
        Ok(client)
    }

    /// Path the socket is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Deref for StreamSocketServer {
    type Target = Descriptor;

    fn deref(&self) -> &Descriptor {
        &self.descriptor
    }
}

impl AsRawFd for StreamSocketServer {
    fn as_raw_fd(&self) -> RawFd {
        self.descriptor.as_raw_fd()
    }
}
