use crate::error::{Error, Result};
use crate::sys::platform::{sys_read, sys_write};

use std::io;
use std::os::fd::RawFd;

/// Outcome of a looping transfer.
///
/// A transfer may stop early (end of stream, a zero-length write) or fail
/// after moving some bytes, so the count is kept next to the error.
pub(crate) struct Transferred {
    /// Bytes actually moved.
    pub(crate) bytes: usize,

    /// Failure that interrupted the loop, if any.
    pub(crate) error: Option<io::Error>,
}

impl Transferred {
    /// Converts the outcome into the synchronous result shape.
    pub(crate) fn into_result(self, op: &'static str, fd: RawFd) -> Result<usize> {
        match self.error {
            None => Ok(self.bytes),
            Some(source) => {
                tracing::error!(
                    fd,
                    op,
                    transferred = self.bytes,
                    error = %source,
                    "transfer failed"
                );
                Err(Error::Transfer {
                    op,
                    fd,
                    transferred: self.bytes,
                    source,
                })
            }
        }
    }
}

/// Reads until `buffer` is full or the descriptor reports end of stream.
///
/// Short reads are accumulated. `EINTR` restarts the current call.
pub(crate) fn read_full(fd: RawFd, buffer: &mut [u8]) -> Transferred {
    let mut done = 0;

    while done < buffer.len() {
        let n = sys_read(fd, &mut buffer[done..]);

        if n == 0 {
            tracing::trace!(fd, bytes = done, "end of stream");
            break;
        }

        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }

            return Transferred {
                bytes: done,
                error: Some(err),
            };
        }

        done += n as usize;
    }

    Transferred {
        bytes: done,
        error: None,
    }
}

/// Writes until all of `buffer` is written or the descriptor accepts no
/// more data.
///
/// A zero-length write ends the loop as a short write.
pub(crate) fn write_full(fd: RawFd, buffer: &[u8]) -> Transferred {
    let mut done = 0;

    while done < buffer.len() {
        let n = sys_write(fd, &buffer[done..]);

        if n == 0 {
            tracing::trace!(fd, bytes = done, "descriptor accepts no more data");
            break;
        }

        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }

            return Transferred {
                bytes: done,
                error: Some(err),
            };
        }

        done += n as usize;
    }

    Transferred {
        bytes: done,
        error: None,
    }
}

/// Rejects a transfer of `requested` bytes over a buffer of `capacity`
/// bytes before the descriptor is touched.
pub(crate) fn check_capacity(requested: usize, capacity: usize) -> Result<()> {
    if capacity == 0 || requested > capacity {
        tracing::error!(requested, capacity, "buffer size not enough");
        return Err(Error::BufferTooSmall {
            requested,
            capacity,
        });
    }

    Ok(())
}
