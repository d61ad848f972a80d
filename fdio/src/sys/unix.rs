use libc::{
    AF_UNIX, F_GETFD, F_SETFD, FD_CLOEXEC, SOCK_STREAM, _PC_PIPE_BUF, c_char, c_int, fd_set,
    mode_t, off_t, sockaddr, sockaddr_un, socklen_t, timeval,
};
use std::ffi::CStr;
use std::os::fd::RawFd;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::time::Duration;
use std::{io, mem, ptr};

/// Flags used when creating a file: read-write, truncated, close-on-exec.
pub(crate) const CREATE_FLAGS: c_int =
    libc::O_RDWR | libc::O_CREAT | libc::O_TRUNC | libc::O_CLOEXEC;

/// Permission bits of newly created files.
pub(crate) const CREATE_MODE: mode_t = 0o644;

/// Pending connection queue length of listening sockets.
pub(crate) const LISTEN_BACKLOG: c_int = 128;

/// Reads from a file descriptor into the given buffer.
///
/// Returns the number of bytes read, or a negative value on error.
pub(crate) fn sys_read(fd: RawFd, buffer: &mut [u8]) -> isize {
    unsafe { libc::read(fd, buffer.as_mut_ptr() as *mut _, buffer.len()) }
}

/// Writes the buffer to a file descriptor.
///
/// Returns the number of bytes written, or a negative value on error.
pub(crate) fn sys_write(fd: RawFd, buffer: &[u8]) -> isize {
    unsafe { libc::write(fd, buffer.as_ptr() as *const _, buffer.len()) }
}

/// Closes a file descriptor.
pub(crate) fn sys_close(fd: RawFd) -> io::Result<()> {
    let rc = unsafe { libc::close(fd) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Opens a file using `open(2)`.
pub(crate) fn sys_open(path: &CStr, flags: c_int, mode: mode_t) -> io::Result<RawFd> {
    let fd = unsafe { libc::open(path.as_ptr(), flags, mode as libc::c_uint) };
    if fd < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(fd)
    }
}

/// Duplicates a descriptor onto the lowest free number, close-on-exec.
pub(crate) fn sys_dup(fd: RawFd) -> io::Result<RawFd> {
    let new = unsafe { libc::fcntl(fd, libc::F_DUPFD_CLOEXEC, 0) };
    if new < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(new)
    }
}

/// Makes `dst` refer to the same open file as `src`.
pub(crate) fn sys_dup2(src: RawFd, dst: RawFd) -> io::Result<()> {
    let rc = unsafe { libc::dup2(src, dst) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Creates an anonymous pipe and returns `(read_end, write_end)`.
#[cfg(target_os = "linux")]
pub(crate) fn sys_pipe(flags: c_int) -> io::Result<(RawFd, RawFd)> {
    let mut fds = [-1 as c_int; 2];

    let rc = unsafe { libc::pipe2(fds.as_mut_ptr(), flags) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok((fds[0], fds[1]))
}

/// Creates an anonymous pipe and returns `(read_end, write_end)`.
///
/// `pipe2(2)` is not available here, so the supported flags are applied
/// afterwards with `fcntl(2)`.
#[cfg(not(target_os = "linux"))]
pub(crate) fn sys_pipe(flags: c_int) -> io::Result<(RawFd, RawFd)> {
    let mut fds = [-1 as c_int; 2];

    let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    for fd in fds {
        let applied = apply_pipe_flags(fd, flags);
        if let Err(e) = applied {
            unsafe {
                libc::close(fds[0]);
                libc::close(fds[1]);
            }
            return Err(e);
        }
    }

    Ok((fds[0], fds[1]))
}

#[cfg(not(target_os = "linux"))]
fn apply_pipe_flags(fd: RawFd, flags: c_int) -> io::Result<()> {
    if flags & libc::O_NONBLOCK != 0 {
        sys_set_nonblocking(fd)?;
    }

    if flags & libc::O_CLOEXEC != 0 {
        sys_set_cloexec(fd)?;
    }

    Ok(())
}

/// Sets a file descriptor to non-blocking mode.
#[cfg(not(target_os = "linux"))]
fn sys_set_nonblocking(fd: RawFd) -> io::Result<()> {
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }

    let rc = unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

/// Marks a descriptor close-on-exec.
pub(crate) fn sys_set_cloexec(fd: RawFd) -> io::Result<()> {
    let flags = unsafe { libc::fcntl(fd, F_GETFD) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }

    let rc = unsafe { libc::fcntl(fd, F_SETFD, flags | FD_CLOEXEC) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

/// Creates a named pipe using `mkfifo(3)`.
pub(crate) fn sys_mkfifo(path: &CStr, mode: mode_t) -> io::Result<()> {
    let rc = unsafe { libc::mkfifo(path.as_ptr(), mode) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Returns the atomic write limit of a pipe or FIFO.
///
/// `Ok(None)` means the system reports no limit.
pub(crate) fn sys_pipe_buf(fd: RawFd) -> io::Result<Option<usize>> {
    clear_errno();

    let value = unsafe { libc::fpathconf(fd, _PC_PIPE_BUF) };
    if value >= 0 {
        return Ok(Some(value as usize));
    }

    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(0) | None => Ok(None),
        Some(_) => Err(err),
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn clear_errno() {
    unsafe { *libc::__errno_location() = 0 };
}

#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
fn clear_errno() {
    unsafe { *libc::__error() = 0 };
}

// Without a known errno location a `-1` is always reported as an error.
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd"
)))]
fn clear_errno() {}

/// Repositions the file offset and returns the resulting offset.
pub(crate) fn sys_lseek(fd: RawFd, offset: i64, whence: c_int) -> io::Result<u64> {
    let rc = unsafe { libc::lseek(fd, offset as off_t, whence) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(rc as u64)
    }
}

/// Blocks in `select(2)` until one of the descriptors in `readable` can be
/// read without blocking.
///
/// On return `readable` only holds the ready descriptors. `None` as timeout
/// waits forever. Returns the number of ready descriptors, `0` on timeout.
pub(crate) fn sys_select(
    highest: RawFd,
    readable: &mut FdSet,
    timeout: Option<Duration>,
) -> io::Result<usize> {
    let mut tv = timeout.map(|t| timeval {
        tv_sec: t.as_secs() as libc::time_t,
        tv_usec: t.subsec_micros() as libc::suseconds_t,
    });

    let tv_ptr = match tv.as_mut() {
        Some(tv) => tv as *mut timeval,
        None => ptr::null_mut(),
    };

    let rc = unsafe {
        libc::select(
            highest + 1,
            &mut readable.0,
            ptr::null_mut(),
            ptr::null_mut(),
            tv_ptr,
        )
    };

    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(rc as usize)
    }
}

/// Creates a Unix-domain stream socket.
pub(crate) fn sys_socket_unix() -> io::Result<RawFd> {
    let fd = unsafe { libc::socket(AF_UNIX, SOCK_STREAM, 0) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }

    if let Err(e) = sys_set_cloexec(fd) {
        unsafe { libc::close(fd) };
        return Err(e);
    }

    Ok(fd)
}

/// Binds a Unix-domain socket to a filesystem path.
pub(crate) fn sys_bind_unix(fd: RawFd, path: &Path) -> io::Result<()> {
    let (addr, len) = unix_sockaddr(path)?;

    let rc = unsafe { libc::bind(fd, &addr as *const _ as *const sockaddr, len) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Marks a socket as a listening socket.
pub(crate) fn sys_listen(fd: RawFd, backlog: c_int) -> io::Result<()> {
    let rc = unsafe { libc::listen(fd, backlog) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Accepts a pending connection as a close-on-exec descriptor. The peer
/// address is discarded.
#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
pub(crate) fn sys_accept(fd: RawFd) -> io::Result<RawFd> {
    let client = unsafe {
        libc::accept4(fd, ptr::null_mut(), ptr::null_mut(), libc::SOCK_CLOEXEC)
    };
    if client < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(client)
    }
}

/// Accepts a pending connection as a close-on-exec descriptor. The peer
/// address is discarded.
#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
pub(crate) fn sys_accept(fd: RawFd) -> io::Result<RawFd> {
    let client = unsafe { libc::accept(fd, ptr::null_mut(), ptr::null_mut()) };
    if client < 0 {
        return Err(io::Error::last_os_error());
    }

    if let Err(e) = sys_set_cloexec(client) {
        unsafe { libc::close(client) };
        return Err(e);
    }

    Ok(client)
}

/// Builds a `sockaddr_un` for `path`.
fn unix_sockaddr(path: &Path) -> io::Result<(sockaddr_un, socklen_t)> {
    let mut addr: sockaddr_un = unsafe { mem::zeroed() };
    addr.sun_family = AF_UNIX as libc::sa_family_t;

    let bytes = path.as_os_str().as_bytes();

    // One byte is kept for the terminating NUL.
    if bytes.is_empty() || bytes.len() >= addr.sun_path.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "socket path is empty or too long",
        ));
    }

    for (dst, src) in addr.sun_path.iter_mut().zip(bytes) {
        *dst = *src as c_char;
    }

    Ok((addr, mem::size_of::<sockaddr_un>() as socklen_t))
}

/// Returns the current local time, broken down.
pub(crate) fn sys_localtime() -> io::Result<libc::tm> {
    let now = unsafe { libc::time(ptr::null_mut()) };
    let mut tm: libc::tm = unsafe { mem::zeroed() };

    let rc = unsafe { libc::localtime_r(&now, &mut tm) };
    if rc.is_null() {
        Err(io::Error::last_os_error())
    } else {
        Ok(tm)
    }
}

/// A set of descriptor numbers in the layout `select(2)` expects.
#[derive(Clone, Copy)]
pub(crate) struct FdSet(fd_set);

impl FdSet {
    /// Highest descriptor number (exclusive) an `FdSet` can hold.
    pub(crate) const CAPACITY: RawFd = libc::FD_SETSIZE as RawFd;

    /// Creates an empty set.
    pub(crate) fn new() -> Self {
        let mut raw: fd_set = unsafe { mem::zeroed() };
        unsafe { libc::FD_ZERO(&mut raw) };

        Self(raw)
    }

    /// Adds `fd` to the set.
    ///
    /// `fd` must lie in `0..CAPACITY`.
    pub(crate) fn insert(&mut self, fd: RawFd) {
        debug_assert!((0..Self::CAPACITY).contains(&fd));
        unsafe { libc::FD_SET(fd, &mut self.0) };
    }

    /// Removes `fd` from the set.
    pub(crate) fn remove(&mut self, fd: RawFd) {
        debug_assert!((0..Self::CAPACITY).contains(&fd));
        unsafe { libc::FD_CLR(fd, &mut self.0) };
    }

    /// Returns `true` if `fd` is in the set.
    pub(crate) fn contains(&self, fd: RawFd) -> bool {
        if !(0..Self::CAPACITY).contains(&fd) {
            return false;
        }

        unsafe { libc::FD_ISSET(fd, &self.0) }
    }
}
