//! Scripted in-memory server for integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Cursor, Read, Write};
use std::rc::Rc;

use fourd_rs::{Config, Connection};

/// Duplex stream that replays canned responses and records requests
#[derive(Debug)]
pub struct ScriptedStream {
    input: Cursor<Vec<u8>>,
    output: Rc<RefCell<Vec<u8>>>,
    max_read: usize,
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len().min(self.max_read);
        self.input.read(&mut buf[..len])
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Handle on everything the client has written
#[derive(Clone)]
pub struct Sent(Rc<RefCell<Vec<u8>>>);

impl Sent {
    pub fn text(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }

    /// Request blocks in the order they were sent
    pub fn requests(&self) -> Vec<String> {
        self.text()
            .split_terminator("\r\n\r\n")
            .map(|r| format!("{}\r\n", r))
            .collect()
    }
}

/// Connection over a scripted stream
pub fn connection(script: Vec<u8>) -> (Connection<ScriptedStream>, Sent) {
    connection_with(script, Config::default(), usize::MAX)
}

/// Connection over a scripted stream with custom config and read size
pub fn connection_with(
    script: Vec<u8>,
    config: Config,
    max_read: usize,
) -> (Connection<ScriptedStream>, Sent) {
    let output = Rc::new(RefCell::new(Vec::new()));
    let stream = ScriptedStream {
        input: Cursor::new(script),
        output: output.clone(),
        max_read,
    };
    (Connection::from_stream(stream, config), Sent(output))
}

/// Builder for a scripted server response stream
#[derive(Default)]
pub struct Script {
    bytes: Vec<u8>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header block; `lines` are joined with CRLF and terminated
    pub fn header(mut self, lines: &[&str]) -> Self {
        for line in lines {
            self.bytes.extend_from_slice(line.as_bytes());
            self.bytes.extend_from_slice(b"\r\n");
        }
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    /// Append a successful login response
    pub fn login_ok(self, id: &str) -> Self {
        self.header(&[&format!("{} OK", id)])
    }

    /// Append a result-set header
    pub fn result_set(
        self,
        id: &str,
        statement_id: u32,
        rows: u32,
        sent: u32,
        aliases: &str,
        types: &str,
        updateability: &str,
    ) -> Self {
        self.header(&[
            &format!("{} OK", id),
            &format!("Statement-ID:{}", statement_id),
            "Result-Type:Result-Set",
            &format!("Row-Count:{}", rows),
            &format!("Row-Count-Sent:{}", sent),
            &format!("Column-Aliases:{}", aliases),
            &format!("Column-Types:{}", types),
            &format!("Column-Updateability:{}", updateability),
        ])
    }

    /// Append a close-statement acknowledgement
    pub fn close_ok(self, id: &str) -> Self {
        self.header(&[&format!("{} OK", id)])
    }

    /// Append raw row bytes
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Append a present column status byte
    pub fn present(self) -> Self {
        self.raw(&[1])
    }

    /// Append a NULL column status byte
    pub fn null(self) -> Self {
        self.raw(&[0])
    }

    pub fn i16(self, value: i16) -> Self {
        self.raw(&value.to_le_bytes())
    }

    pub fn u32(self, value: u32) -> Self {
        self.raw(&value.to_le_bytes())
    }

    pub fn u64(self, value: u64) -> Self {
        self.raw(&value.to_le_bytes())
    }

    /// Append a Pascal string (UTF-16 code unit count, then UTF-16LE)
    pub fn pascal(mut self, value: &str) -> Self {
        let units: Vec<u16> = value.encode_utf16().collect();
        self.bytes.extend_from_slice(&(units.len() as i32).to_le_bytes());
        for unit in units {
            self.bytes.extend_from_slice(&unit.to_le_bytes());
        }
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}
