//! In-memory read buffer
//!
//! Decodes 4D row data from bytes that are already in memory. Used for
//! synthetic buffers and anywhere a response has been captured whole.

use bytes::Bytes;

use crate::error::{Error, Result};

use super::BinaryRead;

/// A buffer for reading 4D protocol data from memory
#[derive(Debug, Clone)]
pub struct ReadBuffer {
    /// The underlying byte data
    data: Bytes,
    /// Current read position
    pos: usize,
}

impl ReadBuffer {
    /// Create a new ReadBuffer from bytes
    pub fn new(data: Bytes) -> Self {
        Self { data, pos: 0 }
    }

    /// Create a new ReadBuffer from a byte slice
    pub fn from_slice(data: &[u8]) -> Self {
        Self {
            data: Bytes::copy_from_slice(data),
            pos: 0,
        }
    }

    /// Create a new ReadBuffer from a Vec
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self {
            data: Bytes::from(data),
            pos: 0,
        }
    }

    /// Get the current position in the buffer
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Get the total length of the buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the number of bytes remaining to be read
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Get a slice of the remaining bytes (without advancing position)
    #[inline]
    pub fn remaining_bytes(&self) -> &[u8] {
        &self.data[self.pos..]
    }
}

impl BinaryRead for ReadBuffer {
    fn read_exactly(&mut self, n: usize) -> Result<Bytes> {
        if self.remaining() < n {
            return Err(Error::ShortRead {
                expected: n,
                received: self.remaining(),
            });
        }
        let bytes = self.data.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(bytes)
    }
}

impl From<Bytes> for ReadBuffer {
    fn from(data: Bytes) -> Self {
        Self::new(data)
    }
}

impl From<Vec<u8>> for ReadBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

impl From<&[u8]> for ReadBuffer {
    fn from(data: &[u8]) -> Self {
        Self::from_slice(data)
    }
}
