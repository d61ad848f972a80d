use super::job::Job;
use super::queue::{JobQueue, WorkerState};
use crate::error::{Error, Result};

use std::os::fd::RawFd;
use std::sync::Arc;
use std::thread;

/// Background executor of the asynchronous jobs of one descriptor.
///
/// The worker thread only holds the raw descriptor number and the shared
/// queue, never the owning [`Descriptor`](crate::Descriptor). The owner
/// guarantees the number stays open until [`Worker::shutdown`] returns.
///
/// The thread is started lazily by the first [`Worker::submit`] and runs
/// until the owner shuts the worker down:
///
/// ```text
/// Idle --submit--> Running --shutdown--> Draining --exit--> Terminated
///   \________________________shutdown_________________________/
/// ```
pub(crate) struct Worker {
    /// Descriptor the jobs operate on.
    fd: RawFd,

    /// Queue shared with the worker thread.
    queue: Arc<JobQueue>,
}

impl Worker {
    pub(crate) fn new(fd: RawFd) -> Self {
        Self {
            fd,
            queue: Arc::new(JobQueue::new()),
        }
    }

    /// Queues `job`, starting the worker thread on first use.
    ///
    /// Never waits for the job to run.
    pub(crate) fn submit(&self, job: Job) -> Result<()> {
        let fd = self.fd;
        let queue = self.queue.clone();

        let started = self
            .queue
            .start_once(|| {
                thread::Builder::new()
                    .name(format!("fdio-worker-{fd}"))
                    .spawn(move || run(fd, queue))
            })
            .map_err(|e| {
                tracing::error!(fd, error = %e, "cannot start descriptor worker");
                Error::Spawn(e)
            })?;

        if started {
            tracing::debug!(fd, "descriptor worker started");
        }

        tracing::trace!(fd, kind = ?job.kind(), size = job.size(), "job queued");
        self.queue.push(job);

        Ok(())
    }

    /// Flushes every pending job and stops the worker thread.
    ///
    /// Returns once the thread has exited. Jobs already queued all run and
    /// report to their callbacks before this returns.
    ///
    /// Called from one of its own callbacks (the last owner dropped on the
    /// worker thread), the remaining jobs run inline instead and the
    /// thread is detached. It exits after the current callback returns.
    pub(crate) fn shutdown(&self) {
        if !self.queue.request_flush_and_close() {
            return;
        }

        tracing::debug!(fd = self.fd, pending = self.queue.len(), "draining worker");

        if self.queue.on_worker_thread() {
            self.drain_inline();
            return;
        }

        self.queue.wait_empty();

        if let Some(handle) = self.queue.take_thread() {
            if handle.join().is_err() {
                tracing::error!(fd = self.fd, "descriptor worker panicked");
            }
        }

        self.queue.mark_terminated();
        tracing::debug!(fd = self.fd, "descriptor worker terminated");
    }

    /// Runs the pending jobs on the calling worker thread.
    fn drain_inline(&self) {
        while let (Some(job), _) = self.queue.pop() {
            job.run(self.fd);
        }

        self.queue.signal_empty();
        drop(self.queue.take_thread());
        self.queue.mark_terminated();

        tracing::debug!(fd = self.fd, "descriptor worker detached");
    }

    pub(crate) fn state(&self) -> WorkerState {
        self.queue.state()
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Worker thread body.
///
/// 1. Pop a job and run it.
/// 2. On an empty queue report it, then either sleep until the next push
///    or exit if the owner is closing.
fn run(fd: RawFd, queue: Arc<JobQueue>) {
    tracing::trace!(fd, "worker running");
    let _guard = AbandonOnPanic { fd, queue: &queue };

    loop {
        let (job, closing) = queue.pop();

        match job {
            Some(job) => job.run(fd),

            None if !closing => {
                queue.signal_empty();
                queue.wait_not_empty();
            }

            None => {
                queue.signal_empty();
                break;
            }
        }
    }

    tracing::trace!(fd, "worker exiting");
}

/// Releases the owner if the worker thread unwinds.
///
/// Callback panics are contained by the job itself, so unwinding here is
/// an internal failure: it propagates to the joining owner.
struct AbandonOnPanic<'a> {
    fd: RawFd,
    queue: &'a JobQueue,
}

impl Drop for AbandonOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            let dropped = self.queue.abandon();
            tracing::error!(fd = self.fd, dropped, "descriptor worker died");
        }
    }
}
