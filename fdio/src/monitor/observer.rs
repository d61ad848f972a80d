use super::Monitor;

use std::os::fd::RawFd;

/// A party interested in the readability of one or more descriptors.
///
/// Register an observer with [`Monitor::start_monitoring`]. Every
/// [`Monitor::wait`] that finds one of its descriptors readable calls
/// [`data_available`](Observer::data_available) on the waiting thread.
///
/// The monitor shares observers through [`Rc`](std::rc::Rc), so state an
/// observer updates from the callback lives behind `Cell`/`RefCell`.
///
/// # Example
///
/// ```rust,ignore
/// struct Counter(Cell<usize>);
///
/// impl Observer for Counter {
///     fn data_available(&self, _monitor: &mut Monitor, _fd: RawFd) {
///         self.0.set(self.0.get() + 1);
///     }
/// }
/// ```
pub trait Observer {
    /// Called when `fd` can be read without blocking.
    ///
    /// `monitor` is the monitor running the dispatch. Registrations made
    /// through it take effect from the next wait; descriptors added here
    /// are not notified by the current one.
    fn data_available(&self, monitor: &mut Monitor, fd: RawFd);
}
