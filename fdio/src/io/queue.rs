use super::job::Job;
use crate::sync::{Condition, Lock};

use std::collections::VecDeque;
use std::io;
use std::thread::{self, JoinHandle, ThreadId};

/// Lifecycle of the worker attached to a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// No asynchronous call has been made yet; no thread exists.
    Idle,

    /// The worker thread is draining jobs as they arrive.
    Running,

    /// The owner is closing: pending jobs are flushed, new ones are not
    /// expected.
    Draining,

    /// The worker thread has exited, or was never started before close.
    Terminated,
}

/// State shared between the submitting side and the worker thread.
struct Shared {
    /// Pending jobs, oldest first.
    jobs: VecDeque<Job>,

    /// Set once the owner asked to flush and close.
    closing: bool,

    /// `true` once the worker found the queue empty and reported it.
    /// Cleared by every push.
    drained: bool,

    state: WorkerState,

    /// Handle of the worker thread while it runs.
    thread: Option<JoinHandle<()>>,

    /// Identity of the worker thread, kept after the handle is taken.
    worker: Option<ThreadId>,
}

/// Thread-safe FIFO of the pending jobs of one descriptor.
///
/// All mutations happen under one lock. Two conditions coordinate the
/// producer (the descriptor owner) and the consumer (the worker thread):
/// - `not_empty` wakes the worker when a job arrives or close is requested,
/// - `empty` wakes the owner once the worker has drained the queue.
pub(crate) struct JobQueue {
    shared: Lock<Shared>,
    not_empty: Condition,
    empty: Condition,
}

impl JobQueue {
    /// Creates an empty queue in the [`WorkerState::Idle`] state.
    pub(crate) fn new() -> Self {
        Self {
            shared: Lock::new(Shared {
                jobs: VecDeque::new(),
                closing: false,
                drained: true,
                state: WorkerState::Idle,
                thread: None,
                worker: None,
            }),
            not_empty: Condition::new(),
            empty: Condition::new(),
        }
    }

    /// Appends a job and wakes the worker. Never blocks on the worker.
    pub(crate) fn push(&self, job: Job) {
        {
            let mut shared = self.shared.lock();
            shared.jobs.push_back(job);
            shared.drained = false;
        }

        self.not_empty.notify_one();
    }

    /// Removes the oldest job, if any, and returns it with the closing
    /// flag.
    ///
    /// Taking the last job wakes anyone waiting for the queue to empty.
    pub(crate) fn pop(&self) -> (Option<Job>, bool) {
        let mut shared = self.shared.lock();

        let job = shared.jobs.pop_front();
        let closing = shared.closing;
        let now_empty = job.is_some() && shared.jobs.is_empty();

        drop(shared);

        if now_empty {
            self.empty.notify_all();
        }

        (job, closing)
    }

    /// Reports that the worker found nothing to do.
    ///
    /// Harmless when nobody waits.
    pub(crate) fn signal_empty(&self) {
        {
            let mut shared = self.shared.lock();
            if shared.jobs.is_empty() {
                shared.drained = true;
            }
        }

        self.empty.notify_all();
    }

    /// Blocks the worker until a job is pushed or close is requested.
    pub(crate) fn wait_not_empty(&self) {
        let shared = self.shared.lock();
        let _shared = self
            .not_empty
            .wait_while(shared, |s| s.jobs.is_empty() && !s.closing);
    }

    /// Blocks the owner until the worker has drained every job.
    pub(crate) fn wait_empty(&self) {
        let shared = self.shared.lock();
        let _shared = self
            .empty
            .wait_while(shared, |s| !s.jobs.is_empty() || !s.drained);
    }

    /// Sets the closing flag and wakes the worker. Does not wait.
    ///
    /// Returns `true` if a worker thread was running and must be awaited.
    pub(crate) fn request_flush_and_close(&self) -> bool {
        let running = {
            let mut shared = self.shared.lock();
            shared.closing = true;

            match shared.state {
                WorkerState::Running => {
                    shared.state = WorkerState::Draining;
                    true
                }
                WorkerState::Idle => {
                    shared.state = WorkerState::Terminated;
                    false
                }
                WorkerState::Draining | WorkerState::Terminated => false,
            }
        };

        self.not_empty.notify_all();
        running
    }

    /// Starts the worker thread if it has not been started yet.
    ///
    /// The `Idle -> Running` transition and the spawn happen under the
    /// queue lock, so concurrent first calls start exactly one thread.
    /// On spawn failure the queue stays [`WorkerState::Idle`].
    pub(crate) fn start_once<F>(&self, spawn: F) -> io::Result<bool>
    where
        F: FnOnce() -> io::Result<JoinHandle<()>>,
    {
        let mut shared = self.shared.lock();

        match shared.state {
            WorkerState::Idle => {
                let handle = spawn()?;
                shared.worker = Some(handle.thread().id());
                shared.thread = Some(handle);
                shared.state = WorkerState::Running;
                Ok(true)
            }
            WorkerState::Running => Ok(false),
            WorkerState::Draining | WorkerState::Terminated => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "descriptor worker is shutting down",
            )),
        }
    }

    /// Takes the handle of the worker thread for joining.
    pub(crate) fn take_thread(&self) -> Option<JoinHandle<()>> {
        self.shared.lock().thread.take()
    }

    /// Returns `true` when called from the worker thread itself.
    pub(crate) fn on_worker_thread(&self) -> bool {
        self.shared.lock().worker == Some(thread::current().id())
    }

    /// Gives up on the pending jobs after the worker thread died.
    ///
    /// Dropped jobs never report. Later submissions are refused and a
    /// waiting owner is released.
    pub(crate) fn abandon(&self) -> usize {
        let dropped = {
            let mut shared = self.shared.lock();
            let dropped = shared.jobs.drain(..).count();
            shared.closing = true;
            shared.drained = true;
            shared.state = WorkerState::Terminated;
            dropped
        };

        self.empty.notify_all();
        dropped
    }

    /// Records that the worker thread has exited.
    pub(crate) fn mark_terminated(&self) {
        self.shared.lock().state = WorkerState::Terminated;
    }

    pub(crate) fn state(&self) -> WorkerState {
        self.shared.lock().state
    }

    /// Number of jobs waiting to be executed.
    pub(crate) fn len(&self) -> usize {
        self.shared.lock().jobs.len()
    }
}
