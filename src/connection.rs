//! 4D SQL connection
//!
//! This module provides the main `Connection` type for talking to a 4D SQL
//! server.
//!
//! # Example
//!
//! ```rust,no_run
//! use fourd_rs::Connection;
//!
//! fn main() -> fourd_rs::Result<()> {
//!     let mut conn = Connection::connect("localhost", 19812)?;
//!     conn.login("Designer", "secret")?;
//!
//!     let mut cursor = conn.execute("SELECT ID, Name FROM Customers")?;
//!     println!("columns: {:?}", cursor.columns()?);
//!     while let Some(row) = cursor.fetch_row()? {
//!         println!("{:?}", row);
//!     }
//!     cursor.close()?;
//!     drop(cursor);
//!
//!     conn.close();
//!     Ok(())
//! }
//! ```

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicU32, Ordering};

use bytes::Bytes;

use crate::config::Config;
use crate::constants::{DecodeMode, MAX_REQUEST_ID};
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::messages::{ExecuteStatementMessage, LoginMessage, ResponseHeader, ResponseStatus};
use crate::row::Row;
use crate::statement::StatementInfo;
use crate::transport::Transport;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// TCP connection established, not logged in
    Connected,
    /// LOGIN accepted
    Authenticated,
    /// A decode or framing failure left the stream at an unknown offset
    Broken,
    /// Connection is closed
    Closed,
}

/// Counter for generating unique connection IDs
static CONNECTION_ID_COUNTER: AtomicU32 = AtomicU32::new(1);

/// A connection to a 4D SQL server.
///
/// The protocol is strictly request/response over one stream, so a
/// connection serves one caller at a time. Every method takes `&mut self`,
/// and a [`Cursor`] borrows the connection mutably for as long as it lives:
/// a second statement cannot be executed while rows of the first one are
/// still on the wire. `Connection` is `Send` when its stream is, but sharing
/// it between threads requires external locking.
///
/// # Example
///
/// ```rust,no_run
/// use fourd_rs::{Config, Connection};
///
/// # fn example() -> fourd_rs::Result<()> {
/// let config: Config = "db.local:19812".parse()?;
/// let config = Config::new(config.host, config.port, "Designer", "secret");
/// let mut conn = Connection::connect_with_config(config)?;
///
/// for row in conn.query_all("SELECT * FROM Invoices")? {
///     println!("{:?}", row);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Connection<S = TcpStream> {
    transport: Transport<S>,
    config: Config,
    state: ConnectionState,
    /// Last request id handed out (0 before the first request)
    request_id: u16,
    /// Header of the accepted LOGIN response
    server_info: Option<ResponseHeader>,
    id: u32,
}

impl Connection<TcpStream> {
    /// Open a TCP connection without logging in
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let mut config = Config::default();
        config.host = host.to_string();
        config.port = port;
        config.validate()?;
        let transport = Transport::connect_with_config(&config)?;
        Ok(Self::from_transport(transport, config))
    }

    /// Open a TCP connection and log in with the configured credentials
    pub fn connect_with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let transport = Transport::connect_with_config(&config)?;
        let mut conn = Self::from_transport(transport, config);

        let username = conn.config.username.clone();
        let password = conn.config.password().to_string();
        conn.login(&username, &password)?;

        Ok(conn)
    }
}

impl<S: Read + Write> Connection<S> {
    /// Run the protocol over an already connected stream
    pub fn from_stream(stream: S, config: Config) -> Self {
        let transport = Transport::new(stream).with_read_timeout(config.read_timeout);
        Self::from_transport(transport, config)
    }

    /// Run the protocol over an existing transport
    pub fn from_transport(transport: Transport<S>, config: Config) -> Self {
        let id = CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(conn_id = id, address = %config, "connection opened");
        Self {
            transport,
            config,
            state: ConnectionState::Connected,
            request_id: 0,
            server_info: None,
            id,
        }
    }

    /// Get the connection ID
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Get the current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Check if the connection is closed
    pub fn is_closed(&self) -> bool {
        self.state == ConnectionState::Closed
    }

    /// Get the connection configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Header of the accepted LOGIN response, once logged in
    pub fn server_info(&self) -> Option<&ResponseHeader> {
        self.server_info.as_ref()
    }

    /// Authenticate the session
    ///
    /// A rejected login leaves the connection usable in the `Connected`
    /// state so it can be retried with other credentials.
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let header = self.request(|id| LoginMessage::new(username, password).build(id))?;

        if let ResponseStatus::Error { code, description } = header.status() {
            tracing::debug!(conn_id = self.id, ?code, "login rejected");
            return Err(Error::Authentication(describe(code, description)));
        }

        self.config.set_username(username);
        self.config.set_password(password);
        self.server_info = Some(header);
        self.state = ConnectionState::Authenticated;
        tracing::debug!(conn_id = self.id, username, "logged in");
        Ok(())
    }

    /// Execute a statement and return a cursor over its first page of rows
    ///
    /// The cursor must be closed (or dropped) before the next request.
    pub fn execute(&mut self, sql: &str) -> Result<Cursor<'_, S>> {
        let message = ExecuteStatementMessage::new(sql, self.config.first_page_size);
        let header = match self.request(|id| message.build(id)) {
            Ok(header) => header,
            Err(e) => {
                // Rows may follow a header that failed to parse
                self.mark_broken();
                return Err(e);
            }
        };

        if let ResponseStatus::Error { code, description } = header.status() {
            tracing::debug!(conn_id = self.id, ?code, "statement rejected");
            return Err(Error::Statement(describe(code, description)));
        }

        let info = match StatementInfo::from_header(&header) {
            Ok(info) => info,
            Err(e) => {
                // Row data may follow a header we could not interpret
                self.mark_broken();
                return Err(e);
            }
        };

        tracing::debug!(
            conn_id = self.id,
            statement_id = %info.id,
            result_type = ?info.result_type,
            row_count = info.row_count,
            row_count_sent = info.row_count_sent,
            columns = info.columns.len(),
            "statement executed"
        );

        Ok(Cursor::new(self, info))
    }

    /// Execute a statement, fetch every row and close it
    pub fn query_all(&mut self, sql: &str) -> Result<Vec<Row>> {
        let mut cursor = self.execute(sql)?;
        let rows = cursor.fetch_all()?;
        cursor.close()?;
        Ok(rows)
    }

    /// Close the connection
    ///
    /// Closing an already closed connection does nothing.
    pub fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        self.transport.close();
        self.state = ConnectionState::Closed;
        tracing::debug!(conn_id = self.id, "connection closed");
    }

    /// Get the next request id (1..=999, then back to 1)
    fn next_request_id(&mut self) -> u16 {
        self.request_id = if self.request_id >= MAX_REQUEST_ID {
            1
        } else {
            self.request_id + 1
        };
        self.request_id
    }

    fn ensure_usable(&self) -> Result<()> {
        match self.state {
            ConnectionState::Closed => Err(Error::ConnectionClosed),
            ConnectionState::Broken => Err(Error::ConnectionBroken),
            ConnectionState::Connected | ConnectionState::Authenticated => Ok(()),
        }
    }

    /// Send one request and read the header of its response
    ///
    /// Any failure that may have desynchronized the stream marks the
    /// connection broken.
    pub(crate) fn request(&mut self, build: impl FnOnce(u16) -> Bytes) -> Result<ResponseHeader> {
        self.ensure_usable()?;
        let request_id = self.next_request_id();
        let frame = build(request_id);

        let result = self.round_trip(&frame);
        if let Err(e) = &result {
            if e.is_fatal() {
                tracing::debug!(conn_id = self.id, request_id, error = %e, "request failed");
                self.mark_broken();
            }
        }
        result
    }

    fn round_trip(&mut self, frame: &[u8]) -> Result<ResponseHeader> {
        self.transport.send_frame(frame)?;
        let raw = self.transport.read_until_header_end()?;
        let header = ResponseHeader::from_bytes(&raw)?;
        tracing::debug!(
            conn_id = self.id,
            status = header.status_line().unwrap_or(""),
            fields = header.len(),
            "response header"
        );
        Ok(header)
    }

    /// Mark the stream as unusable for further requests
    pub(crate) fn mark_broken(&mut self) {
        if self.state != ConnectionState::Closed {
            self.state = ConnectionState::Broken;
        }
    }

    pub(crate) fn transport_mut(&mut self) -> &mut Transport<S> {
        &mut self.transport
    }

    pub(crate) fn decode_mode(&self) -> DecodeMode {
        self.config.decode_mode
    }
}

fn describe(code: Option<i64>, description: String) -> String {
    match code {
        Some(code) => format!("[{}] {}", code, description),
        None => description,
    }
}
