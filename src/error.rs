//! Error types for the 4D client
//!
//! This module defines all error types that can occur while talking to a 4D
//! SQL server, from low-level framing problems to rejected logins.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the 4D client
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    // =========================================================================
    // Connection Errors
    // =========================================================================
    /// Could not open the TCP connection
    #[error("could not connect to {address}: {source}")]
    Connection {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Connection closed (by us or by the peer)
    #[error("connection closed")]
    ConnectionClosed,

    /// A previous decode failure left the byte stream unframed
    #[error("connection is unusable after a decode failure")]
    ConnectionBroken,

    /// A read did not complete before the configured deadline
    #[error("read timed out after {0:?}")]
    Timeout(Duration),

    // =========================================================================
    // Framing Errors
    // =========================================================================
    /// Header terminator not found before the stream ended
    #[error("framing error: {0}")]
    Framing(String),

    /// Peer closed the stream in the middle of a fixed-size read
    #[error("short read: expected {expected} bytes, received {received}")]
    ShortRead { expected: usize, received: usize },

    /// Malformed response header
    #[error("protocol error: {0}")]
    Protocol(String),

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// The server rejected the login
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// EXECUTE-STATEMENT was rejected or its response is incomplete
    #[error("statement error: {0}")]
    Statement(String),

    // =========================================================================
    // Row Errors
    // =========================================================================
    /// Row data could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// Cursor was used after `close()`
    #[error("cursor used after close")]
    UseAfterClose,

    /// Cursor was used after a decode error
    #[error("cursor is poisoned by an earlier decode error")]
    CursorPoisoned,

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value or address string
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Error::Decode(message.into())
    }

    /// Create a framing error
    pub fn framing(message: impl Into<String>) -> Self {
        Error::Framing(message.into())
    }

    /// Check if this is a connection-related error
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Error::Connection { .. }
                | Error::ConnectionClosed
                | Error::ConnectionBroken
                | Error::Timeout(_)
                | Error::Io(_)
        )
    }

    /// Check if the connection can no longer be used after this error.
    ///
    /// Anything that may have left unread bytes on the stream counts as fatal:
    /// the next response would be parsed from the middle of this one.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Connection { .. }
                | Error::ConnectionClosed
                | Error::ConnectionBroken
                | Error::Timeout(_)
                | Error::Framing(_)
                | Error::ShortRead { .. }
                | Error::Decode(_)
                | Error::Io(_)
        )
    }
}
