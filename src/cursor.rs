//! Statement cursors
//!
//! A [`Cursor`] walks the first page of rows an EXECUTE-STATEMENT returned
//! and releases the statement on the server when it is closed.
//!
//! ```text
//! Open ──(last row)──▶ Exhausted ──close()──▶ Closed
//!   │                                           ▲
//!   └──(decode error)──▶ Poisoned ──close()─────┘
//! ```

use std::io::{Read, Write};
use std::net::TcpStream;

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::messages::{CloseStatementMessage, ResponseStatus};
use crate::row::{Row, RowDecoder, Warning};
use crate::statement::{ColumnInfo, ResultType, StatementInfo};

/// Cursor lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Rows remain in the first page
    Open,
    /// Every row sent has been decoded
    Exhausted,
    /// CLOSE-STATEMENT has been issued
    Closed,
    /// A row failed to decode; the stream offset is unknown
    Poisoned,
}

/// Cursor over the rows of one executed statement
///
/// Holds the connection exclusively until it is closed or dropped. Dropping
/// an unclosed cursor closes it and logs any failure.
#[derive(Debug)]
pub struct Cursor<'c, S: Read + Write = TcpStream> {
    conn: &'c mut Connection<S>,
    info: StatementInfo,
    state: CursorState,
    warnings: Vec<Warning>,
}

impl<'c, S: Read + Write> Cursor<'c, S> {
    pub(crate) fn new(conn: &'c mut Connection<S>, info: StatementInfo) -> Self {
        let state = if !info.result_type.is_result_set() || info.is_exhausted() {
            CursorState::Exhausted
        } else {
            CursorState::Open
        };
        Self {
            conn,
            info,
            state,
            warnings: Vec::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Check if the cursor has been closed
    pub fn is_closed(&self) -> bool {
        self.state == CursorState::Closed
    }

    /// Statement metadata
    pub fn info(&self) -> &StatementInfo {
        &self.info
    }

    /// Server-assigned statement id
    pub fn statement_id(&self) -> &str {
        &self.info.id
    }

    /// Result type reported by the server
    pub fn result_type(&self) -> &ResultType {
        &self.info.result_type
    }

    /// Total rows the statement produced (affected rows for updates)
    pub fn row_count(&self) -> u64 {
        self.info.row_count
    }

    /// Rows decoded so far
    pub fn rows_consumed(&self) -> u64 {
        self.info.rows_consumed
    }

    /// Column aliases in row order
    pub fn columns(&self) -> Result<Vec<&str>> {
        self.ensure_not_closed()?;
        Ok(self.info.column_names())
    }

    /// Column descriptors in row order
    pub fn column_info(&self) -> Result<&[ColumnInfo]> {
        self.ensure_not_closed()?;
        Ok(&self.info.columns)
    }

    /// Non-fatal conditions met while decoding
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Decode the next row, or `None` once every row sent has been read
    pub fn fetch_row(&mut self) -> Result<Option<Row>> {
        match self.state {
            CursorState::Closed => return Err(Error::UseAfterClose),
            CursorState::Poisoned => return Err(Error::CursorPoisoned),
            CursorState::Exhausted => return Ok(None),
            CursorState::Open => {}
        }

        let row_index = self.info.rows_consumed;
        let decoder = RowDecoder::new(
            &self.info.columns,
            self.info.updateable,
            self.conn.decode_mode(),
        );
        let decoded = decoder.decode_row(self.conn.transport_mut(), row_index, &mut self.warnings);

        match decoded {
            Ok(row) => {
                self.info.rows_consumed += 1;
                if self.info.is_exhausted() {
                    self.state = CursorState::Exhausted;
                }
                Ok(Some(row))
            }
            Err(e) => {
                tracing::warn!(
                    statement_id = %self.info.id,
                    row = row_index,
                    error = %e,
                    "row decode failed, cursor poisoned"
                );
                self.state = CursorState::Poisoned;
                self.conn.mark_broken();
                Err(e)
            }
        }
    }

    /// Decode every remaining row
    pub fn fetch_all(&mut self) -> Result<Vec<Row>> {
        // Row counts come from the server; grow as rows actually arrive
        let mut rows = Vec::new();
        while let Some(row) = self.fetch_row()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Release the statement on the server
    ///
    /// Unread rows are drained first so the next response starts at a header.
    /// The cursor is Closed afterwards even if this fails. A poisoned cursor
    /// sends nothing. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            CursorState::Closed => return Ok(()),
            CursorState::Poisoned => {
                self.state = CursorState::Closed;
                return Ok(());
            }
            CursorState::Open => {
                let remaining = self.info.rows_remaining();
                tracing::debug!(statement_id = %self.info.id, remaining, "draining unread rows");
                while self.fetch_row().map_err(|e| self.closed_with(e))?.is_some() {}
            }
            CursorState::Exhausted => {}
        }

        self.state = CursorState::Closed;
        let statement_id = &self.info.id;
        let header = self
            .conn
            .request(|id| CloseStatementMessage::new(statement_id).build(id))?;

        if let ResponseStatus::Error { code, description } = header.status() {
            tracing::warn!(%statement_id, ?code, %description, "close-statement rejected");
        } else {
            tracing::debug!(%statement_id, "statement closed");
        }
        Ok(())
    }

    fn closed_with(&mut self, error: Error) -> Error {
        self.state = CursorState::Closed;
        error
    }

    fn ensure_not_closed(&self) -> Result<()> {
        if self.state == CursorState::Closed {
            Err(Error::UseAfterClose)
        } else {
            Ok(())
        }
    }
}

impl<S: Read + Write> Drop for Cursor<'_, S> {
    fn drop(&mut self) {
        if self.state != CursorState::Closed {
            if let Err(e) = self.close() {
                tracing::warn!(statement_id = %self.info.id, error = %e, "failed to close cursor on drop");
            }
        }
    }
}
