//! 4D SQL protocol constants
//!
//! Request keywords, response header keys and the value-kind tags that drive
//! row decoding.

use std::fmt;
use std::str::FromStr;

/// Default 4D SQL server port
pub const DEFAULT_PORT: u16 = 19812;

/// Protocol version announced at login
pub const PROTOCOL_VERSION: &str = "0.1a";

/// Line terminator for request and response headers
pub const CRLF: &str = "\r\n";

/// Marks the end of every header block
pub const HEADER_TERMINATOR: &[u8; 4] = b"\r\n\r\n";

/// Upper bound for a single response header block
pub const MAX_HEADER_SIZE: usize = 1024 * 1024;

/// Upper bound for one length-prefixed value in row data
pub const MAX_VALUE_SIZE: usize = 256 * 1024 * 1024;

/// Page size hint large enough for the first page to carry the whole result
pub const DEFAULT_FIRST_PAGE_SIZE: u32 = 1_000_000;

/// Image formats the client asks for in EXECUTE-STATEMENT
pub const PREFERRED_IMAGE_TYPES: &str = "png jpg";

/// Output mode requested in EXECUTE-STATEMENT
pub const OUTPUT_MODE: &str = "release";

/// Highest request id before the counter wraps (ids are three digits)
pub const MAX_REQUEST_ID: u16 = 999;

// =============================================================================
// Request Commands
// =============================================================================

/// Commands the client can send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Authenticate the session
    Login,
    /// Run a SQL statement and open a result
    ExecuteStatement,
    /// Release a statement on the server
    CloseStatement,
}

impl Command {
    /// Keyword written after the request id on the first request line
    pub fn keyword(self) -> &'static str {
        match self {
            Command::Login => "LOGIN",
            Command::ExecuteStatement => "EXECUTE-STATEMENT",
            Command::CloseStatement => "CLOSE-STATEMENT",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Request header keys (written as-is, the server matches them case-insensitively)
#[allow(missing_docs)]
pub mod request_key {
    pub const USER_NAME_BASE64: &str = "USER-NAME-BASE64";
    pub const USER_PASSWORD_BASE64: &str = "USER-PASSWORD-BASE64";
    pub const REPLY_WITH_BASE64_TEXT: &str = "REPLY-WITH-BASE64-TEXT";
    pub const PROTOCOL_VERSION: &str = "PROTOCOL-VERSION";
    pub const FIRST_PAGE_SIZE: &str = "FIRST-PAGE-SIZE";
    pub const STATEMENT_BASE64: &str = "STATEMENT-BASE64";
    pub const PREFERRED_IMAGE_TYPES: &str = "PREFERRED-IMAGE-TYPES";
    pub const OUTPUT_MODE: &str = "Output-Mode";
    pub const STATEMENT_ID: &str = "STATEMENT-ID";
}

/// Response header keys, after lower-casing and base64 suffix removal
#[allow(missing_docs)]
pub mod header_key {
    /// Reserved key holding the colon-less status line
    pub const STATUS: &str = "_status";
    /// Suffix marking a base64-encoded value
    pub const BASE64_SUFFIX: &str = "-base64";

    pub const STATEMENT_ID: &str = "statement-id";
    pub const RESULT_TYPE: &str = "result-type";
    pub const ROW_COUNT: &str = "row-count";
    pub const ROW_COUNT_SENT: &str = "row-count-sent";
    pub const COLUMN_ALIASES: &str = "column-aliases";
    pub const COLUMN_TYPES: &str = "column-types";
    pub const COLUMN_UPDATEABILITY: &str = "column-updateability";
    pub const ERROR_CODE: &str = "error-code";
    pub const ERROR_DESCRIPTION: &str = "error-description";
}

/// Per-column status byte preceding every value in a row
pub mod column_status {
    /// Value follows
    pub const PRESENT: u8 = 1;
    /// Server-side error for this value; the rest of the stream is unusable
    pub const ERROR: u8 = 2;
}

// =============================================================================
// Value Kinds
// =============================================================================

/// Column value kind declared in `column-types`
///
/// Controls the binary shape of every value in that column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ValueKind {
    Boolean,
    Byte,
    Word,
    Long,
    Long8,
    Real,
    Float,
    Time,
    Timestamp,
    Duration,
    Text,
    String,
    Blob,
    Image,
    /// A tag this client does not know how to decode
    Unknown(std::string::String),
}

impl ValueKind {
    /// Look up a protocol tag; unrecognized tags become `Unknown`
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "VK_BOOLEAN" => ValueKind::Boolean,
            "VK_BYTE" => ValueKind::Byte,
            "VK_WORD" => ValueKind::Word,
            "VK_LONG" => ValueKind::Long,
            "VK_LONG8" => ValueKind::Long8,
            "VK_REAL" => ValueKind::Real,
            "VK_FLOAT" => ValueKind::Float,
            "VK_TIME" => ValueKind::Time,
            "VK_TIMESTAMP" => ValueKind::Timestamp,
            "VK_DURATION" => ValueKind::Duration,
            "VK_TEXT" => ValueKind::Text,
            "VK_STRING" => ValueKind::String,
            "VK_BLOB" => ValueKind::Blob,
            "VK_IMAGE" => ValueKind::Image,
            other => ValueKind::Unknown(other.to_string()),
        }
    }

    /// Protocol tag for this kind (e.g. `VK_LONG`)
    pub fn tag(&self) -> &str {
        match self {
            ValueKind::Boolean => "VK_BOOLEAN",
            ValueKind::Byte => "VK_BYTE",
            ValueKind::Word => "VK_WORD",
            ValueKind::Long => "VK_LONG",
            ValueKind::Long8 => "VK_LONG8",
            ValueKind::Real => "VK_REAL",
            ValueKind::Float => "VK_FLOAT",
            ValueKind::Time => "VK_TIME",
            ValueKind::Timestamp => "VK_TIMESTAMP",
            ValueKind::Duration => "VK_DURATION",
            ValueKind::Text => "VK_TEXT",
            ValueKind::String => "VK_STRING",
            ValueKind::Blob => "VK_BLOB",
            ValueKind::Image => "VK_IMAGE",
            ValueKind::Unknown(tag) => tag,
        }
    }

    /// Check if this kind is one the decoder understands
    pub fn is_known(&self) -> bool {
        !matches!(self, ValueKind::Unknown(_))
    }
}

impl FromStr for ValueKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(ValueKind::from_tag(s))
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// How to decode the encodings whose meaning on the wire is uncertain
///
/// `Legacy` reproduces the historical client byte for byte: 64-bit values
/// keep only their low 32 bits and `VK_FLOAT` becomes a diagnostic string.
/// `Corrected` decodes full 64-bit integers, IEEE doubles for `VK_REAL` and a
/// floating approximation for `VK_FLOAT`. Neither mode changes how many bytes
/// are consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub enum DecodeMode {
    #[default]
    Legacy,
    Corrected,
}
