use super::Observer;
use crate::error::{Error, Result};
use crate::sys::platform::{FdSet, sys_select};

use std::fmt;
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::rc::Rc;
use std::time::Duration;

/// Result of a successful [`Monitor::wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// At least one descriptor was readable; holds the number of
    /// notifications dispatched.
    Ready(usize),

    /// The timeout elapsed before any descriptor became readable.
    TimedOut,
}

/// One watched descriptor and the observer to notify.
#[derive(Clone)]
struct Association {
    fd: RawFd,
    observer: Rc<dyn Observer>,
}

/// A `select(2)` based waiter notifying observers of readable descriptors.
///
/// The monitor does not own the descriptors it watches: it only records
/// their numbers. Callers stop monitoring a descriptor before closing it.
///
/// A monitor belongs to the thread that created it. Dropping it discards
/// every association without notifying anyone.
pub struct Monitor {
    /// Descriptors handed to `select(2)`.
    watched: FdSet,

    /// Highest descriptor in `watched`, `-1` when empty.
    highest: RawFd,

    /// Associations in registration order.
    associations: Vec<Association>,
}

impl Monitor {
    /// Creates a monitor watching nothing.
    pub fn new() -> Self {
        Self {
            watched: FdSet::new(),
            highest: -1,
            associations: Vec::new(),
        }
    }

    /// Starts notifying `observer` when `descriptor` becomes readable.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyMonitored`] if the descriptor already has an
    ///   observer, this one included.
    /// - [`Error::OutOfRange`] if the number cannot be watched by
    ///   `select(2)`.
    ///
    /// The monitor is unchanged on failure.
    pub fn start_monitoring<D>(
        &mut self,
        observer: Rc<dyn Observer>,
        descriptor: &D,
    ) -> Result<()>
    where
        D: AsRawFd + ?Sized,
    {
        let fd = descriptor.as_raw_fd();

        if !(0..FdSet::CAPACITY).contains(&fd) {
            tracing::error!(fd, "descriptor cannot be monitored");
            return Err(Error::OutOfRange(fd));
        }

        if self.watched.contains(fd) {
            tracing::error!(fd, "descriptor already monitored by some observer");
            return Err(Error::AlreadyMonitored(fd));
        }

        self.associations.push(Association { fd, observer });
        self.watched.insert(fd);
        self.highest = self.highest.max(fd);

        tracing::debug!(fd, watched = self.associations.len(), "monitoring started");
        Ok(())
    }

    /// Stops monitoring `descriptor`.
    ///
    /// # Errors
    ///
    /// [`Error::NotMonitored`] if the descriptor was not being watched.
    pub fn stop_monitoring<D>(&mut self, descriptor: &D) -> Result<()>
    where
        D: AsRawFd + ?Sized,
    {
        let fd = descriptor.as_raw_fd();

        if !self.watched.contains(fd) {
            tracing::error!(fd, "descriptor was not monitored");
            return Err(Error::NotMonitored(fd));
        }

        self.associations.retain(|association| association.fd != fd);
        self.watched.remove(fd);

        if fd == self.highest {
            self.highest = self
                .associations
                .iter()
                .map(|association| association.fd)
                .max()
                .unwrap_or(-1);
        }

        tracing::debug!(fd, watched = self.associations.len(), "monitoring stopped");
        Ok(())
    }

    /// Blocks until at least one watched descriptor is readable, then
    /// notifies its observer.
    ///
    /// Observers are called on this thread, in registration order, for
    /// the associations that existed when the wait began. An observer
    /// may start or stop monitoring from its callback:
    /// - a descriptor added during dispatch is first notified by the next
    ///   wait, even if it is already readable,
    /// - a descriptor removed during dispatch is still notified by this
    ///   wait if it was found readable.
    ///
    /// # Errors
    ///
    /// [`Error::Wait`] if `select(2)` fails (including on a signal) or if
    /// nothing is monitored, since such a wait could never return. No
    /// observer is notified.
    pub fn wait(&mut self) -> Result<WaitOutcome> {
        if self.associations.is_empty() {
            tracing::error!("wait without any monitored descriptor");
            return Err(Error::Wait(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no descriptor is monitored",
            )));
        }

        self.wait_inner(None)
    }

    /// Same as [`wait`](Self::wait), giving up after `timeout`.
    ///
    /// Returns [`WaitOutcome::TimedOut`] if nothing became readable in
    /// time. With nothing monitored this simply sleeps for `timeout`.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Result<WaitOutcome> {
        if self.associations.is_empty() {
            tracing::warn!(?timeout, "timed wait without any monitored descriptor");
        }

        self.wait_inner(Some(timeout))
    }

    fn wait_inner(&mut self, timeout: Option<Duration>) -> Result<WaitOutcome> {
        // `select(2)` overwrites the set, and observers may mutate the
        // associations while being notified.
        let mut ready = self.watched;
        let snapshot = self.associations.clone();

        let count = sys_select(self.highest, &mut ready, timeout).map_err(|e| {
            tracing::error!(error = %e, "select() failed");
            Error::Wait(e)
        })?;

        if count == 0 {
            tracing::debug!("wait timed out");
            return Ok(WaitOutcome::TimedOut);
        }

        tracing::debug!(ready = count, "select() returned");

        let mut dispatched = 0;

        for association in snapshot.iter().filter(|a| ready.contains(a.fd)) {
            tracing::trace!(fd = association.fd, "notifying observer");
            association.observer.data_available(self, association.fd);
            dispatched += 1;
        }

        Ok(WaitOutcome::Ready(dispatched))
    }

    /// Returns `true` if `fd` currently has an observer.
    pub fn is_monitored(&self, fd: RawFd) -> bool {
        self.watched.contains(fd)
    }

    /// Number of monitored descriptors.
    pub fn len(&self) -> usize {
        self.associations.len()
    }

    /// Returns `true` if nothing is monitored.
    pub fn is_empty(&self) -> bool {
        self.associations.is_empty()
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fds: Vec<RawFd> = self.associations.iter().map(|a| a.fd).collect();

        f.debug_struct("Monitor")
            .field("highest", &self.highest)
            .field("watched", &fds)
            .finish()
    }
}
