//! LOGIN request
//!
//! Opens the session. Credentials travel base64-encoded and the client asks
//! the server to base64-encode its own text fields as well.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;

use crate::buffer::WriteBuffer;
use crate::constants::{request_key, Command, PROTOCOL_VERSION};

/// LOGIN request
pub struct LoginMessage<'a> {
    username: &'a str,
    password: &'a str,
}

impl<'a> LoginMessage<'a> {
    /// Create a new login message
    pub fn new(username: &'a str, password: &'a str) -> Self {
        Self { username, password }
    }

    /// Build the request block
    pub fn build(&self, request_id: u16) -> Bytes {
        let mut buf = WriteBuffer::new();
        buf.write_command(request_id, Command::Login);
        buf.write_field(request_key::USER_NAME_BASE64, STANDARD.encode(self.username));
        buf.write_field(request_key::USER_PASSWORD_BASE64, STANDARD.encode(self.password));
        buf.write_field(request_key::REPLY_WITH_BASE64_TEXT, "Y");
        buf.write_field(request_key::PROTOCOL_VERSION, PROTOCOL_VERSION);
        buf.freeze()
    }
}

impl std::fmt::Debug for LoginMessage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginMessage")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
