//! Filesystem resources.
//!
//! This module provides the descriptor-backed filesystem types:
//! - regular files ([`File`]),
//! - named pipes ([`Fifo`]).
//!
//! Both dereference to [`Descriptor`](crate::Descriptor), so blocking and
//! asynchronous transfers as well as monitoring apply to them unchanged.

mod fifo;
mod file;

pub use fifo::Fifo;
pub use file::File;

use crate::error::{Error, Result};

use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// Converts `path` to the NUL terminated form the OS expects.
pub(crate) fn c_path(op: &'static str, path: &Path) -> Result<CString> {
    CString::new(path.as_os_str().as_bytes()).map_err(|e| Error::os(op, io::Error::from(e)))
}
