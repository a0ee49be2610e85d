//! Response header parsing
//!
//! Every response starts with a text block of CRLF-separated lines. The first
//! line is a status line without a colon; the rest are `key:value` pairs.
//! Keys are case-folded, and keys ending in `-base64` carry a base64 value
//! that is decoded with the suffix removed.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::constants::header_key;
use crate::error::{Error, Result};

/// Outcome reported by a response header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseStatus {
    /// Request accepted
    Ok,
    /// Request rejected by the server
    Error {
        /// Server error code, when one was sent
        code: Option<i64>,
        /// Human-readable description
        description: String,
    },
}

impl ResponseStatus {
    /// Check if the request was accepted
    pub fn is_ok(&self) -> bool {
        matches!(self, ResponseStatus::Ok)
    }
}

/// Parsed response header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeader {
    fields: HashMap<String, String>,
}

impl ResponseHeader {
    /// Parse a raw header block
    ///
    /// Blank lines are skipped; lines are split on the first colon; values are
    /// trimmed. A line with no colon is kept under [`header_key::STATUS`].
    pub fn parse(raw: &str) -> Result<Self> {
        let mut fields = HashMap::new();

        for line in raw.split("\r\n") {
            if line.is_empty() {
                continue;
            }

            let (key, value) = match line.split_once(':') {
                Some((key, value)) => (key.trim().to_ascii_lowercase(), value.trim()),
                None => (header_key::STATUS.to_string(), line.trim()),
            };

            match key.strip_suffix(header_key::BASE64_SUFFIX) {
                Some(stripped) => {
                    let decoded = decode_base64_field(stripped, value)?;
                    fields.insert(stripped.to_string(), decoded);
                }
                None => {
                    fields.insert(key, value.to_string());
                }
            }
        }

        Ok(Self { fields })
    }

    /// Parse a raw header block received as bytes
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| Error::Protocol(format!("header is not valid UTF-8: {}", e)))?;
        Self::parse(text)
    }

    /// Get a field by its lower-case key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Get a field that must be present
    pub fn require(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Get the status line
    pub fn status_line(&self) -> Option<&str> {
        self.get(header_key::STATUS)
    }

    /// Interpret the status line and error fields
    ///
    /// The status line is `<request id> <status>`. A status of `OK` or an
    /// all-zero numeric code is success; `ERROR` (any case), a non-zero code,
    /// or a non-zero `error-code` field is a rejection.
    pub fn status(&self) -> ResponseStatus {
        let error_code = self
            .get(header_key::ERROR_CODE)
            .and_then(|c| c.parse::<i64>().ok());
        let description = self.get(header_key::ERROR_DESCRIPTION);

        let status_word = self
            .status_line()
            .and_then(|line| line.split_whitespace().nth(1));
        let rejected_by_line = match status_word {
            Some(word) if word.eq_ignore_ascii_case("ERROR") => true,
            Some(word) if word.bytes().all(|b| b.is_ascii_digit()) => {
                word.bytes().any(|b| b != b'0')
            }
            _ => false,
        };

        if rejected_by_line || error_code.is_some_and(|c| c != 0) {
            let code = error_code.or_else(|| status_word.and_then(|w| w.parse().ok()));
            ResponseStatus::Error {
                code,
                description: description
                    .or(self.status_line())
                    .unwrap_or("request rejected")
                    .to_string(),
            }
        } else {
            ResponseStatus::Ok
        }
    }

    /// Number of fields, status line included
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the header has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over all fields in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn decode_base64_field(key: &str, value: &str) -> Result<String> {
    let bytes = STANDARD
        .decode(value)
        .map_err(|e| Error::Protocol(format!("invalid base64 in {}: {}", key, e)))?;
    String::from_utf8(bytes)
        .map_err(|e| Error::Protocol(format!("base64 field {} is not UTF-8: {}", key, e)))
}
