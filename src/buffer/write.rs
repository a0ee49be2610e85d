//! Write buffer for encoding 4D request headers
//!
//! A request is a command line followed by `key:value` lines, each ending in
//! CRLF, and closed by an empty line.

use bytes::{BufMut, Bytes, BytesMut};

use crate::constants::{Command, CRLF};

/// A buffer for writing 4D request header blocks
#[derive(Debug)]
pub struct WriteBuffer {
    /// The underlying byte buffer
    data: BytesMut,
}

impl WriteBuffer {
    /// Create a new WriteBuffer with default capacity
    pub fn new() -> Self {
        Self {
            data: BytesMut::with_capacity(256),
        }
    }

    /// Create a new WriteBuffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
        }
    }

    /// Get the current length of data in the buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write the first request line: zero-padded request id and command
    pub fn write_command(&mut self, request_id: u16, command: Command) {
        self.data
            .put_slice(format!("{:03} {}", request_id, command.keyword()).as_bytes());
        self.data.put_slice(CRLF.as_bytes());
    }

    /// Write one `key:value` line
    pub fn write_field(&mut self, key: &str, value: impl std::fmt::Display) {
        self.data.put_slice(format!("{}:{}", key, value).as_bytes());
        self.data.put_slice(CRLF.as_bytes());
    }

    /// Get the written bytes as a slice
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Finish the block without the closing empty line
    ///
    /// The transport appends the final CRLF when it sends a frame.
    pub fn freeze(self) -> Bytes {
        self.data.freeze()
    }
}

impl Default for WriteBuffer {
    fn default() -> Self {
        Self::new()
    }
}
