//! Row data handling for 4D query results
//!
//! This module provides types and functions for:
//! - Decoding row data from the 4D binary row stream
//! - Representing column values in a type-safe manner
//! - Converting 4D timestamps to `chrono` types

use std::fmt;

use bytes::Bytes;
use chrono::{NaiveDate, NaiveDateTime};

use crate::buffer::BinaryRead;
use crate::constants::{column_status, DecodeMode, ValueKind};
use crate::error::{Error, Result};
use crate::statement::ColumnInfo;

const MS_PER_SECOND: u32 = 1000;
const MS_PER_MINUTE: u32 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u32 = 60 * MS_PER_MINUTE;

/// Represents a value from a 4D column.
///
/// Values can be accessed using the various `as_*` methods.
///
/// # Example
///
/// ```rust
/// use fourd_rs::Value;
///
/// fn describe(value: &Value) -> String {
///     match value {
///         Value::Null => "NULL".to_string(),
///         Value::String(s) => format!("String: {}", s),
///         Value::Integer(i) => format!("Integer: {}", i),
///         other => other.to_string(),
///     }
/// }
///
/// assert_eq!(describe(&Value::Integer(42)), "Integer: 42");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value (status byte other than 1)
    Null,
    /// VK_BOOLEAN
    Boolean(bool),
    /// VK_BYTE, VK_WORD, VK_LONG, VK_LONG8, VK_DURATION and legacy VK_REAL
    Integer(i64),
    /// Corrected VK_REAL and VK_FLOAT
    Float(f64),
    /// VK_TIME, VK_TIMESTAMP
    Timestamp(Timestamp),
    /// VK_TEXT, VK_STRING and the legacy VK_FLOAT rendering
    String(String),
    /// VK_BLOB, VK_IMAGE
    Bytes(Bytes),
}

impl Value {
    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as a string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as an integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Boolean(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// Try to get as a float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as bytes
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            Value::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Try to get as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Integer(i) => Some(*i != 0),
            _ => None,
        }
    }

    /// Try to get as a timestamp
    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            Value::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Timestamp(ts) => write!(f, "{}", ts),
            Value::String(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// A VK_TIME or VK_TIMESTAMP value
///
/// The wire carries a calendar date and the milliseconds since midnight.
/// VK_TIME values usually have a zero date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    /// Year
    pub year: u16,
    /// Month (1-12, 0 for a pure time)
    pub month: u8,
    /// Day of month (1-31, 0 for a pure time)
    pub day: u8,
    /// Milliseconds since midnight
    pub millis: u32,
}

impl Timestamp {
    /// Create a timestamp from its wire components
    pub fn new(year: u16, month: u8, day: u8, millis: u32) -> Self {
        Self {
            year,
            month,
            day,
            millis,
        }
    }

    /// Hour of day
    pub fn hour(&self) -> u32 {
        self.millis / MS_PER_HOUR
    }

    /// Minute of hour
    pub fn minute(&self) -> u32 {
        self.millis % MS_PER_HOUR / MS_PER_MINUTE
    }

    /// Second of minute
    pub fn second(&self) -> u32 {
        self.millis % MS_PER_MINUTE / MS_PER_SECOND
    }

    /// Millisecond of second
    pub fn millisecond(&self) -> u32 {
        self.millis % MS_PER_SECOND
    }

    /// Convert to a `chrono` date-time
    ///
    /// Returns `None` for a zero date or an out-of-range time of day.
    pub fn to_naive_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)?
            .and_hms_milli_opt(self.hour(), self.minute(), self.second(), self.millisecond())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:03}",
            self.year,
            self.month,
            self.day,
            self.hour(),
            self.minute(),
            self.second(),
            self.millisecond()
        )
    }
}

/// Non-fatal condition met while decoding rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A column declared a value kind this client cannot decode; the column
    /// was left out of the row
    UnknownValueKind {
        /// Zero-based row number within the result set
        row: u64,
        /// Column alias
        column: String,
        /// The unrecognized tag
        tag: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnknownValueKind { row, column, tag } => {
                write!(f, "row {}: column {} has unknown value kind {}", row, column, tag)
            }
        }
    }
}

/// A row of data from a query result.
///
/// Values are kept in column order together with their aliases. Columns of
/// an unknown value kind are not present.
///
/// # Example
///
/// ```rust,no_run
/// use fourd_rs::Connection;
///
/// # fn example() -> fourd_rs::Result<()> {
/// let mut conn = Connection::connect("localhost", 19812)?;
/// conn.login("Designer", "secret")?;
///
/// for row in conn.query_all("SELECT ID, Name FROM Customers")? {
///     let id = row.get_i64(0).unwrap_or(0);
///     let name = row.get_by_name("name").and_then(|v| v.as_str()).unwrap_or("");
///     println!("{}: {}", id, name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    names: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Create a new row from parallel name and value lists
    pub fn new(names: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    /// Append a column
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.names.push(name.into());
        self.values.push(value);
    }

    /// Get the number of columns in this row
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value by position in the row
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column alias (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        let index = self.names.iter().position(|n| n.eq_ignore_ascii_case(name))?;
        self.values.get(index)
    }

    /// Check if a column alias is present
    pub fn contains(&self, name: &str) -> bool {
        self.get_by_name(name).is_some()
    }

    /// Column aliases in row order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Get all values as a slice
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Iterate over `(alias, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }

    /// Consume the row and return the values
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Try to get a string value by index
    pub fn get_string(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Value::as_str)
    }

    /// Try to get an integer value by index
    pub fn get_i64(&self, index: usize) -> Option<i64> {
        self.get(index).and_then(Value::as_i64)
    }

    /// Try to get a float value by index
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(Value::as_f64)
    }

    /// Check if a column value is NULL
    pub fn is_null(&self, index: usize) -> bool {
        self.get(index).map(Value::is_null).unwrap_or(true)
    }
}

impl std::ops::Index<usize> for Row {
    type Output = Value;

    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}

impl std::ops::Index<&str> for Row {
    type Output = Value;

    fn index(&self, name: &str) -> &Self::Output {
        match self.get_by_name(name) {
            Some(value) => value,
            None => panic!("no column named {:?} in row", name),
        }
    }
}

/// Decoder for rows in the 4D binary row stream
#[derive(Debug)]
pub struct RowDecoder<'a> {
    columns: &'a [ColumnInfo],
    updateable: bool,
    mode: DecodeMode,
}

impl<'a> RowDecoder<'a> {
    /// Create a new row decoder
    pub fn new(columns: &'a [ColumnInfo], updateable: bool, mode: DecodeMode) -> Self {
        Self {
            columns,
            updateable,
            mode,
        }
    }

    /// Decode a single row
    ///
    /// `row` is the zero-based row number, used only for warnings. Any error
    /// leaves the stream at an unknown offset.
    pub fn decode_row<R: BinaryRead>(
        &self,
        buf: &mut R,
        row: u64,
        warnings: &mut Vec<Warning>,
    ) -> Result<Row> {
        if self.updateable {
            // Row marker and record number; neither is exposed
            buf.skip(1)?;
            buf.read_u32_le()?;
        }

        let mut decoded = Row::default();
        for column in self.columns {
            let status = buf.read_ubyte()?;
            if status == column_status::ERROR {
                return Err(Error::decode(format!(
                    "server flagged column {} of row {} as an error",
                    column.alias, row
                )));
            }

            if let ValueKind::Unknown(tag) = &column.kind {
                tracing::warn!(row, column = %column.alias, tag = %tag, "unknown value kind, column skipped");
                warnings.push(Warning::UnknownValueKind {
                    row,
                    column: column.alias.clone(),
                    tag: tag.clone(),
                });
                continue;
            }

            let value = if status == column_status::PRESENT {
                self.decode_value(buf, &column.kind)?
            } else {
                Value::Null
            };
            tracing::trace!(row, column = %column.alias, kind = %column.kind, "decoded value");
            decoded.push(column.alias.clone(), value);
        }

        Ok(decoded)
    }

    /// Decode one value of a known kind
    fn decode_value<R: BinaryRead>(&self, buf: &mut R, kind: &ValueKind) -> Result<Value> {
        Ok(match kind {
            ValueKind::Boolean => Value::Boolean(buf.read_i16_le()? != 0),
            ValueKind::Byte | ValueKind::Word => Value::Integer(buf.read_i16_le()? as i64),
            ValueKind::Long => Value::Integer(buf.read_u32_le()? as i64),
            ValueKind::Long8 | ValueKind::Duration => {
                Value::Integer(buf.read_u64(self.mode)? as i64)
            }
            ValueKind::Real => match self.mode {
                DecodeMode::Legacy => Value::Integer(buf.read_u64(self.mode)? as i64),
                DecodeMode::Corrected => Value::Float(f64::from_bits(buf.read_u64(self.mode)?)),
            },
            ValueKind::Float => self.decode_float(buf)?,
            ValueKind::Time | ValueKind::Timestamp => {
                let year = buf.read_u16_le()?;
                let month = buf.read_ubyte()?;
                let day = buf.read_ubyte()?;
                let millis = buf.read_u32_le()?;
                Value::Timestamp(Timestamp::new(year, month, day, millis))
            }
            ValueKind::Text | ValueKind::String => Value::String(buf.read_pascal_string()?),
            ValueKind::Blob | ValueKind::Image => Value::Bytes(buf.read_blob()?),
            ValueKind::Unknown(tag) => {
                return Err(Error::decode(format!("cannot decode value kind {}", tag)))
            }
        })
    }

    /// Decode a VK_FLOAT: exponent, sign, mantissa size, mantissa bytes
    fn decode_float<R: BinaryRead>(&self, buf: &mut R) -> Result<Value> {
        let exponent = buf.read_u32_le()?;
        let sign = buf.read_ubyte()?;
        let size = buf.read_u32_le()? as usize;
        let mantissa = buf.read_sized(size)?;

        Ok(match self.mode {
            DecodeMode::Legacy => {
                let hex: String = mantissa.iter().map(|b| format!("{:02x}", b)).collect();
                Value::String(format!("float : {} {} ^ {}", sign, hex, exponent))
            }
            DecodeMode::Corrected => {
                let magnitude = mantissa
                    .iter()
                    .rev()
                    .fold(0.0f64, |acc, &b| acc * 256.0 + b as f64);
                let value = magnitude * 2f64.powi(exponent as i32);
                Value::Float(if sign != 0 { -value } else { value })
            }
        })
    }
}
