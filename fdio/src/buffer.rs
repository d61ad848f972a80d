use crate::error::{Error, Result};

use std::ops::{Index, IndexMut};

/// A fixed-size, heap allocated byte buffer.
///
/// `Buffer` is the owned buffer type accepted by the asynchronous
/// transfer calls of [`Descriptor`](crate::Descriptor): the buffer moves
/// into the queued job and comes back through the completion callback.
///
/// The size is set at construction and never changes. Indexing past the
/// end panics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    data: Box<[u8]>,
}

impl Buffer {
    /// Allocates a zeroed buffer of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size].into_boxed_slice(),
        }
    }

    /// Returns the size of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the buffer holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Copies `src` into the front of the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferTooSmall`] if `src` is longer than the buffer.
    /// The buffer is left untouched in that case.
    pub fn fill(&mut self, src: &[u8]) -> Result<usize> {
        if src.len() > self.data.len() {
            return Err(Error::BufferTooSmall {
                requested: src.len(),
                capacity: self.data.len(),
            });
        }

        self.data[..src.len()].copy_from_slice(src);
        Ok(src.len())
    }

    /// Copies the first `n` bytes of `other` into the front of the buffer.
    pub fn fill_from(&mut self, other: &Buffer, n: usize) -> Result<usize> {
        if n > other.len() {
            return Err(Error::BufferTooSmall {
                requested: n,
                capacity: other.len(),
            });
        }

        self.fill(&other.data[..n])
    }

    /// Compares the first `n` bytes of the buffer with the first `n` bytes
    /// of `other`.
    ///
    /// Returns `false` if either side is shorter than `n`.
    pub fn compare(&self, other: &[u8], n: usize) -> bool {
        if n > self.data.len() || n > other.len() {
            return false;
        }

        self.data[..n] == other[..n]
    }
}

impl From<&[u8]> for Buffer {
    fn from(bytes: &[u8]) -> Self {
        Self {
            data: bytes.into(),
        }
    }
}

impl Index<usize> for Buffer {
    type Output = u8;

    fn index(&self, index: usize) -> &u8 {
        &self.data[index]
    }
}

impl IndexMut<usize> for Buffer {
    fn index_mut(&mut self, index: usize) -> &mut u8 {
        &mut self.data[index]
    }
}
