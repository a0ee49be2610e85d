//! Transport layer for 4D connections
//!
//! Blocking byte I/O over a single stream. The protocol is strictly
//! half-duplex: every request is followed by a blocking read of either a
//! header block or an exact number of row bytes.

mod tcp;

pub use tcp::TcpTransport;

use std::io::{self, Read, Write};
use std::time::Duration;

use bytes::{Bytes, BytesMut};

use crate::buffer::BinaryRead;
use crate::constants::{CRLF, HEADER_TERMINATOR, MAX_HEADER_SIZE};
use crate::error::{Error, Result};

/// Size of a single `read()` from the underlying stream
const READ_CHUNK_SIZE: usize = 8192;

/// Buffered transport over any blocking byte stream
///
/// Bytes that arrive after a header terminator stay in the internal buffer and
/// are served to the next `read_exactly`, so a header and the row data that
/// follows it can share one TCP segment.
#[derive(Debug)]
pub struct Transport<S> {
    /// The underlying stream (None once closed)
    stream: Option<S>,
    /// Bytes received but not yet consumed
    read_buf: BytesMut,
    /// Deadline applied to each read, reported back in timeout errors
    read_timeout: Option<Duration>,
}

impl<S: Read + Write> Transport<S> {
    /// Wrap an already connected stream
    pub fn new(stream: S) -> Self {
        Self {
            stream: Some(stream),
            read_buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
            read_timeout: None,
        }
    }

    /// Record the read deadline configured on the stream
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Check if the transport is connected
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Number of received bytes not yet consumed
    pub fn buffered(&self) -> usize {
        self.read_buf.len()
    }

    /// Get a reference to the underlying stream
    pub fn get_ref(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    /// Get mutable access to the underlying stream
    fn stream_mut(&mut self) -> Result<&mut S> {
        self.stream.as_mut().ok_or(Error::ConnectionClosed)
    }

    /// Write a request block followed by the closing CRLF
    pub fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        tracing::trace!(len = frame.len() + CRLF.len(), "sending frame");
        let stream = self.stream_mut()?;
        stream.write_all(frame)?;
        stream.write_all(CRLF.as_bytes())?;
        stream.flush()?;
        Ok(())
    }

    /// Read one header block, terminator included
    ///
    /// Fails with a framing error if the peer closes the stream before the
    /// terminator shows up; a truncated header is never returned.
    pub fn read_until_header_end(&mut self) -> Result<Bytes> {
        let mut scanned: usize = 0;
        loop {
            // Resume a few bytes back so a terminator split across reads is found
            let start = scanned.saturating_sub(HEADER_TERMINATOR.len() - 1);
            if let Some(offset) = find_terminator(&self.read_buf[start..]) {
                let end = start + offset + HEADER_TERMINATOR.len();
                return Ok(self.read_buf.split_to(end).freeze());
            }
            scanned = self.read_buf.len();

            if scanned > MAX_HEADER_SIZE {
                return Err(Error::framing(format!(
                    "header exceeds {} bytes without terminator",
                    MAX_HEADER_SIZE
                )));
            }

            if self.fill()? == 0 {
                return Err(Error::framing(format!(
                    "stream ended after {} bytes without header terminator",
                    self.read_buf.len()
                )));
            }
        }
    }

    /// Close the connection
    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("transport closed");
        }
        self.read_buf.clear();
    }

    /// Pull the next chunk from the stream into the read buffer
    ///
    /// Returns the number of bytes read; zero means the peer closed.
    fn fill(&mut self) -> Result<usize> {
        let timeout = self.read_timeout;
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let stream = self.stream_mut()?;
        let n = loop {
            match stream.read(&mut chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    return Err(Error::Timeout(timeout.unwrap_or_default()));
                }
                Err(e) => return Err(Error::Io(e)),
            }
        };
        self.read_buf.extend_from_slice(&chunk[..n]);
        Ok(n)
    }
}

impl<S: Read + Write> BinaryRead for Transport<S> {
    fn read_exactly(&mut self, n: usize) -> Result<Bytes> {
        while self.read_buf.len() < n {
            if self.fill()? == 0 {
                return Err(Error::ShortRead {
                    expected: n,
                    received: self.read_buf.len(),
                });
            }
        }
        Ok(self.read_buf.split_to(n).freeze())
    }
}

/// Position of the first `\r\n\r\n` in `data`
fn find_terminator(data: &[u8]) -> Option<usize> {
    data.windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}
