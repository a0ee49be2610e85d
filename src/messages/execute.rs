//! EXECUTE-STATEMENT request
//!
//! Submits one SQL statement. The first page of rows comes back right after
//! the response header; `FIRST-PAGE-SIZE` bounds how many rows that page holds.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;

use crate::buffer::WriteBuffer;
use crate::constants::{request_key, Command, OUTPUT_MODE, PREFERRED_IMAGE_TYPES};

/// EXECUTE-STATEMENT request
#[derive(Debug)]
pub struct ExecuteStatementMessage<'a> {
    sql: &'a str,
    first_page_size: u32,
}

impl<'a> ExecuteStatementMessage<'a> {
    /// Create a new execute message
    pub fn new(sql: &'a str, first_page_size: u32) -> Self {
        Self {
            sql,
            first_page_size,
        }
    }

    /// Get the SQL text
    pub fn sql(&self) -> &str {
        self.sql
    }

    /// Build the request block
    pub fn build(&self, request_id: u16) -> Bytes {
        let mut buf = WriteBuffer::with_capacity(256 + self.sql.len() * 4 / 3);
        buf.write_command(request_id, Command::ExecuteStatement);
        buf.write_field(request_key::FIRST_PAGE_SIZE, self.first_page_size);
        buf.write_field(request_key::STATEMENT_BASE64, STANDARD.encode(self.sql));
        buf.write_field(request_key::PREFERRED_IMAGE_TYPES, PREFERRED_IMAGE_TYPES);
        buf.write_field(request_key::OUTPUT_MODE, OUTPUT_MODE);
        buf.freeze()
    }
}
