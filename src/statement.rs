//! Statement metadata
//!
//! Everything the EXECUTE-STATEMENT response header says about a statement:
//! its id, result type, row counts and, for result sets, the column layout
//! that drives row decoding.

use crate::constants::{header_key, ValueKind};
use crate::error::{Error, Result};
use crate::messages::ResponseHeader;

/// Result type reported in `result-type`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultType {
    /// Rows follow the header
    ResultSet,
    /// The statement modified rows; no row data follows
    UpdateCount,
    /// Any other tag, kept verbatim
    Other(String),
}

impl ResultType {
    /// Parse a `result-type` value
    pub fn parse(tag: &str) -> Self {
        match tag.trim() {
            "Result-Set" => ResultType::ResultSet,
            "Update-Count" => ResultType::UpdateCount,
            other => ResultType::Other(other.to_string()),
        }
    }

    /// Check if rows follow the header
    pub fn is_result_set(&self) -> bool {
        matches!(self, ResultType::ResultSet)
    }
}

/// Metadata for one result column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Zero-based position in the row
    pub ordinal: usize,
    /// Display name with surrounding brackets removed
    pub alias: String,
    /// Declared value kind
    pub kind: ValueKind,
    /// Whether the server reports the column as updateable
    pub updateable: bool,
}

impl ColumnInfo {
    /// Create a new column descriptor
    pub fn new(ordinal: usize, alias: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            ordinal,
            alias: alias.into(),
            kind,
            updateable: false,
        }
    }

    /// Set the updateable flag
    pub fn with_updateable(mut self, updateable: bool) -> Self {
        self.updateable = updateable;
        self
    }
}

/// Statement state parsed from an EXECUTE-STATEMENT header
#[derive(Debug, Clone)]
pub struct StatementInfo {
    /// Server-assigned statement id
    pub id: String,
    /// Result type
    pub result_type: ResultType,
    /// Total number of rows the statement produced
    pub row_count: u64,
    /// Rows carried by the first page
    pub row_count_sent: u64,
    /// Rows decoded so far
    pub rows_consumed: u64,
    /// Column layout (empty unless this is a result set)
    pub columns: Vec<ColumnInfo>,
    /// True when any column is updateable; rows then carry an extra prefix
    pub updateable: bool,
}

impl StatementInfo {
    /// Build statement metadata from a response header
    ///
    /// Missing statement-id, result-type, row-count or row-count-sent is a
    /// statement error. Column lists of unequal length are a decode error.
    pub fn from_header(header: &ResponseHeader) -> Result<Self> {
        let id = required(header, header_key::STATEMENT_ID)?.to_string();
        let result_type = ResultType::parse(required(header, header_key::RESULT_TYPE)?);
        let row_count = parse_count(header, header_key::ROW_COUNT)?;
        let row_count_sent = parse_count(header, header_key::ROW_COUNT_SENT)?;

        if row_count_sent > row_count {
            return Err(Error::Statement(format!(
                "server sent {} rows but reported only {}",
                row_count_sent, row_count
            )));
        }

        let columns = if result_type.is_result_set() {
            parse_columns(header)?
        } else {
            Vec::new()
        };
        let updateable = columns.iter().any(|c| c.updateable);

        Ok(Self {
            id,
            result_type,
            row_count,
            row_count_sent,
            rows_consumed: 0,
            columns,
            updateable,
        })
    }

    /// Rows of the first page not yet decoded
    pub fn rows_remaining(&self) -> u64 {
        self.row_count_sent - self.rows_consumed
    }

    /// Check if every row of the first page has been decoded
    pub fn is_exhausted(&self) -> bool {
        self.rows_consumed >= self.row_count_sent
    }

    /// Column aliases in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.alias.as_str()).collect()
    }
}

fn required<'h>(header: &'h ResponseHeader, key: &str) -> Result<&'h str> {
    header
        .require(key)
        .ok_or_else(|| Error::Statement(format!("response is missing {}", key)))
}

fn parse_count(header: &ResponseHeader, key: &str) -> Result<u64> {
    let value = required(header, key)?;
    value
        .parse()
        .map_err(|_| Error::Statement(format!("{} is not a row count: {:?}", key, value)))
}

fn parse_columns(header: &ResponseHeader) -> Result<Vec<ColumnInfo>> {
    let aliases = split_aliases(header.get(header_key::COLUMN_ALIASES).unwrap_or(""));
    let kinds: Vec<&str> = header
        .get(header_key::COLUMN_TYPES)
        .unwrap_or("")
        .split_whitespace()
        .collect();
    let flags: Vec<&str> = header
        .get(header_key::COLUMN_UPDATEABILITY)
        .unwrap_or("")
        .split_whitespace()
        .collect();

    if aliases.len() != kinds.len() || aliases.len() != flags.len() {
        return Err(Error::decode(format!(
            "column metadata mismatch: {} aliases, {} types, {} updateability flags",
            aliases.len(),
            kinds.len(),
            flags.len()
        )));
    }

    Ok(aliases
        .into_iter()
        .zip(kinds)
        .zip(flags)
        .enumerate()
        .map(|(ordinal, ((alias, kind), flag))| {
            ColumnInfo::new(ordinal, alias, ValueKind::from_tag(kind)).with_updateable(flag == "Y")
        })
        .collect())
}

/// Split the `column-aliases` list into bracket-stripped names
///
/// Aliases are space-separated and usually bracketed. A bracketed alias may
/// itself contain spaces (`[First Name]`), so brackets are honoured before
/// whitespace.
pub fn split_aliases(list: &str) -> Vec<String> {
    let mut aliases = Vec::new();
    let mut rest = list.trim_start();

    while !rest.is_empty() {
        let (token, tail) = if let Some(inner) = rest.strip_prefix('[') {
            match inner.find(']') {
                Some(end) => (&inner[..end], &inner[end + 1..]),
                None => (inner, ""),
            }
        } else {
            match rest.find(char::is_whitespace) {
                Some(end) => (&rest[..end], &rest[end..]),
                None => (rest, ""),
            }
        };
        aliases.push(token.trim_matches(|c| c == '[' || c == ']').to_string());
        rest = tail.trim_start();
    }

    aliases
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(text: &str) -> ResponseHeader {
        ResponseHeader::parse(text).unwrap()
    }

    #[test]
    fn test_result_set_header() {
        let info = StatementInfo::from_header(&header(
            "001 OK\r\n\
             Statement-ID:7\r\n\
             Result-Type:Result-Set\r\n\
             Row-Count:10\r\n\
             Row-Count-Sent:10\r\n\
             Column-Aliases:[ID] [Name]\r\n\
             Column-Types:VK_LONG VK_STRING\r\n\
             Column-Updateability:N N\r\n",
        ))
        .unwrap();

        assert_eq!(info.id, "7");
        assert_eq!(info.result_type, ResultType::ResultSet);
        assert_eq!(info.row_count, 10);
        assert_eq!(info.rows_remaining(), 10);
        assert_eq!(info.column_names(), vec!["ID", "Name"]);
        assert_eq!(info.columns[1].kind, ValueKind::String);
        assert_eq!(info.columns[1].ordinal, 1);
        assert!(!info.updateable);
    }

    #[test]
    fn test_updateable_column_marks_statement() {
        let info = StatementInfo::from_header(&header(
            "Statement-ID:1\r\nResult-Type:Result-Set\r\nRow-Count:0\r\nRow-Count-Sent:0\r\n\
             Column-Aliases:[A] [B]\r\nColumn-Types:VK_LONG VK_LONG\r\nColumn-Updateability:N Y\r\n",
        ))
        .unwrap();
        assert!(info.updateable);
        assert!(!info.columns[0].updateable);
        assert!(info.columns[1].updateable);
        assert!(info.is_exhausted());
    }

    #[test]
    fn test_update_count_has_no_columns() {
        let info = StatementInfo::from_header(&header(
            "Statement-ID:2\r\nResult-Type:Update-Count\r\nRow-Count:3\r\nRow-Count-Sent:0\r\n",
        ))
        .unwrap();
        assert_eq!(info.result_type, ResultType::UpdateCount);
        assert!(info.columns.is_empty());
    }

    #[test]
    fn test_missing_statement_id() {
        let result = StatementInfo::from_header(&header(
            "Result-Type:Result-Set\r\nRow-Count:1\r\nRow-Count-Sent:1\r\n",
        ));
        assert!(matches!(result, Err(Error::Statement(_))));
    }

    #[test]
    fn test_missing_row_count_sent() {
        let result = StatementInfo::from_header(&header(
            "Statement-ID:1\r\nResult-Type:Result-Set\r\nRow-Count:1\r\n",
        ));
        assert!(matches!(result, Err(Error::Statement(_))));
    }

    #[test]
    fn test_sent_above_total_rejected() {
        let result = StatementInfo::from_header(&header(
            "Statement-ID:1\r\nResult-Type:Update-Count\r\nRow-Count:1\r\nRow-Count-Sent:2\r\n",
        ));
        assert!(matches!(result, Err(Error::Statement(_))));
    }

    #[test]
    fn test_mismatched_column_lists() {
        let result = StatementInfo::from_header(&header(
            "Statement-ID:1\r\nResult-Type:Result-Set\r\nRow-Count:1\r\nRow-Count-Sent:1\r\n\
             Column-Aliases:[A] [B]\r\nColumn-Types:VK_LONG\r\nColumn-Updateability:N N\r\n",
        ));
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_split_aliases() {
        assert_eq!(split_aliases("[ID] [Name]"), vec!["ID", "Name"]);
        assert_eq!(split_aliases("  [First Name]  plain "), vec!["First Name", "plain"]);
        assert_eq!(split_aliases("COUNT(*)"), vec!["COUNT(*)"]);
        assert!(split_aliases("   ").is_empty());
    }

    #[test]
    fn test_unknown_column_kind_is_kept() {
        let info = StatementInfo::from_header(&header(
            "Statement-ID:1\r\nResult-Type:Result-Set\r\nRow-Count:0\r\nRow-Count-Sent:0\r\n\
             Column-Aliases:[X]\r\nColumn-Types:VK_ARRAY\r\nColumn-Updateability:N\r\n",
        ))
        .unwrap();
        assert_eq!(info.columns[0].kind, ValueKind::Unknown("VK_ARRAY".to_string()));
    }
}
