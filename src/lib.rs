#![warn(missing_docs)]

//! # fourd-rs
//!
//! A blocking client for the 4D SQL network protocol.
//!
//! The crate speaks the text-header / binary-row protocol a 4D server exposes
//! on its SQL port: log in, run a statement, walk the rows of the first page
//! and release the statement again.
//!
//! ## Features
//!
//! - **Blocking I/O** - One `std::net::TcpStream`, no runtime required
//! - **Typed rows** - Every column decodes into a closed [`Value`] enum
//! - **Framing safety** - Decode failures poison the cursor and the connection
//!   instead of silently reading from the wrong offset
//! - **Two decode modes** - [`DecodeMode::Legacy`] for byte-for-byte
//!   compatibility with historical clients, [`DecodeMode::Corrected`] for full
//!   64-bit integers and real floating point values
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fourd_rs::{Config, Connection};
//!
//! fn main() -> fourd_rs::Result<()> {
//!     let config = Config::new("localhost", 19812, "Designer", "secret");
//!     let mut conn = Connection::connect_with_config(config)?;
//!
//!     let mut cursor = conn.execute("SELECT ID, Name FROM Customers")?;
//!     while let Some(row) = cursor.fetch_row()? {
//!         let id = row.get_i64(0).unwrap_or(0);
//!         let name = row.get_string(1).unwrap_or("");
//!         println!("Customer {}: {}", id, name);
//!     }
//!     cursor.close()?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Fetching Everything
//!
//! ```rust,no_run
//! use fourd_rs::Connection;
//!
//! # fn example(conn: &mut Connection) -> fourd_rs::Result<()> {
//! let rows = conn.query_all("SELECT * FROM Invoices")?;
//! for row in &rows {
//!     for (column, value) in row.iter() {
//!         println!("{} = {}", column, value);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Cursors
//!
//! A [`Cursor`] borrows its connection mutably, so only one statement can be
//! open per connection at a time. Dropping a cursor closes it; unread rows are
//! drained first so the connection stays usable.
//!
//! ## Error Handling
//!
//! ```rust,no_run
//! use fourd_rs::{Connection, Error};
//!
//! # fn example(conn: &mut Connection) {
//! match conn.execute("SELECT * FROM nonexistent") {
//!     Ok(_cursor) => println!("Success"),
//!     Err(Error::Statement(message)) => println!("Rejected: {}", message),
//!     Err(e) if e.is_fatal() => println!("Connection lost: {}", e),
//!     Err(e) => println!("Error: {}", e),
//! }
//! # }
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events (`debug` for requests and responses,
//! `trace` for each decoded value, `warn` for skipped columns). Install a
//! subscriber in the application to see them.

pub mod buffer;
pub mod config;
pub mod connection;
pub mod constants;
pub mod cursor;
pub mod error;
pub mod messages;
pub mod row;
pub mod statement;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use connection::{Connection, ConnectionState};
pub use constants::{DecodeMode, ValueKind, DEFAULT_PORT};
pub use cursor::{Cursor, CursorState};
pub use error::{Error, Result};
pub use messages::{ResponseHeader, ResponseStatus};
pub use row::{Row, RowDecoder, Timestamp, Value, Warning};
pub use statement::{ColumnInfo, ResultType, StatementInfo};
pub use transport::{TcpTransport, Transport};
