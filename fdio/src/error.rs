use std::io;
use std::os::fd::RawFd;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by descriptors, resources and the readiness monitor.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The buffer cannot hold the requested transfer.
    ///
    /// Raised before the descriptor is touched. A zero-capacity buffer
    /// always fails this check.
    #[error("buffer of {capacity} bytes cannot serve a {requested}-byte transfer")]
    BufferTooSmall { requested: usize, capacity: usize },

    /// `read(2)` or `write(2)` reported a failure.
    ///
    /// `transferred` holds the bytes moved by earlier calls of the same
    /// transfer.
    #[error("{op} on descriptor {fd} failed after {transferred} bytes")]
    Transfer {
        op: &'static str,
        fd: RawFd,
        transferred: usize,
        #[source]
        source: io::Error,
    },

    /// The descriptor already has an observer.
    #[error("descriptor {0} is already monitored")]
    AlreadyMonitored(RawFd),

    /// The descriptor has no observer.
    #[error("descriptor {0} is not monitored")]
    NotMonitored(RawFd),

    /// The descriptor number cannot be watched by `select(2)`.
    #[error("descriptor {0} is outside the range select() can watch")]
    OutOfRange(RawFd),

    /// The readiness check itself failed.
    #[error("waiting for readiness failed")]
    Wait(#[source] io::Error),

    /// The worker thread of a descriptor could not be spawned.
    #[error("failed to spawn the descriptor worker")]
    Spawn(#[source] io::Error),

    /// Any other OS call (open, pipe, dup, bind, ...) failed.
    #[error("{op} failed")]
    Os {
        op: &'static str,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Logs an OS failure and wraps it.
    pub(crate) fn os(op: &'static str, source: io::Error) -> Self {
        tracing::error!(op, error = %source, "os call failed");
        Self::Os { op, source }
    }

    /// Returns the underlying OS error, if any.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::Transfer { source, .. }
            | Self::Wait(source)
            | Self::Spawn(source)
            | Self::Os { source, .. } => Some(source),
            _ => None,
        }
    }
}
