//! CLOSE-STATEMENT request

use bytes::Bytes;

use crate::buffer::WriteBuffer;
use crate::constants::{request_key, Command};

/// CLOSE-STATEMENT request, releasing a statement on the server
#[derive(Debug)]
pub struct CloseStatementMessage<'a> {
    statement_id: &'a str,
}

impl<'a> CloseStatementMessage<'a> {
    /// Create a new close message
    pub fn new(statement_id: &'a str) -> Self {
        Self { statement_id }
    }

    /// Build the request block
    pub fn build(&self, request_id: u16) -> Bytes {
        let mut buf = WriteBuffer::with_capacity(64);
        buf.write_command(request_id, Command::CloseStatement);
        buf.write_field(request_key::STATEMENT_ID, self.statement_id);
        buf.freeze()
    }
}
