//! Thin wrappers over the POSIX calls used by the crate.
//!
//! Nothing outside this module calls `libc` directly. The wrappers keep
//! the shape of the underlying syscall: transfer calls return the raw
//! signed count, everything else reports failures as [`std::io::Error`]
//! built from `errno`.

#[cfg(unix)]
pub(crate) mod unix;

#[cfg(unix)]
pub(crate) use unix as platform;
