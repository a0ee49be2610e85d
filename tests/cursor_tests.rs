//! Integration tests for statement execution and cursors
//!
//! Every test runs a full session against a scripted in-memory server.

mod common;

use common::{connection, connection_with, Script};
use fourd_rs::{
    Config, ConnectionState, CursorState, DecodeMode, Error, ResultType, Value, ValueKind,
    Warning,
};

fn customers(script: Script, request_id: &str, statement_id: u32) -> Script {
    script
        .result_set(
            request_id,
            statement_id,
            3,
            3,
            "[ID] [Name]",
            "VK_LONG VK_STRING",
            "N N",
        )
        .present()
        .u32(1)
        .present()
        .pascal("Ann")
        .present()
        .u32(2)
        .null()
        .present()
        .u32(3)
        .present()
        .pascal("Cy")
}

#[test]
fn test_full_session() {
    let script = customers(Script::new().login_ok("001"), "002", 7)
        .close_ok("003")
        .build();
    let (mut conn, sent) = connection(script);

    conn.login("Alice", "secret").unwrap();
    let mut cursor = conn.execute("SELECT ID, Name FROM Customers").unwrap();

    assert_eq!(cursor.statement_id(), "7");
    assert_eq!(cursor.result_type(), &ResultType::ResultSet);
    assert_eq!(cursor.columns().unwrap(), vec!["ID", "Name"]);
    assert_eq!(cursor.column_info().unwrap()[0].kind, ValueKind::Long);

    let first = cursor.fetch_row().unwrap().unwrap();
    assert_eq!(first["ID"], Value::Integer(1));
    assert_eq!(first.get_string(1), Some("Ann"));

    let second = cursor.fetch_row().unwrap().unwrap();
    assert_eq!(second.get_i64(0), Some(2));
    assert!(second.get_by_name("name").unwrap().is_null());

    let third = cursor.fetch_row().unwrap().unwrap();
    assert_eq!(third.get_string(1), Some("Cy"));

    assert!(cursor.fetch_row().unwrap().is_none());
    assert!(cursor.fetch_row().unwrap().is_none());
    assert_eq!(cursor.state(), CursorState::Exhausted);
    assert_eq!(cursor.rows_consumed(), 3);

    cursor.close().unwrap();
    assert!(cursor.is_closed());
    drop(cursor);

    let requests = sent.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].starts_with("001 LOGIN\r\n"));
    assert!(requests[1].starts_with("002 EXECUTE-STATEMENT\r\nFIRST-PAGE-SIZE:1000000\r\n"));
    assert_eq!(requests[2], "003 CLOSE-STATEMENT\r\nSTATEMENT-ID:7\r\n");
    assert_eq!(conn.state(), ConnectionState::Authenticated);
}

#[test]
fn test_close_drains_unread_rows() {
    let script = customers(Script::new(), "001", 1)
        .close_ok("002")
        .result_set("003", 2, 1, 1, "[Total]", "VK_WORD", "N")
        .present()
        .i16(-4)
        .close_ok("004")
        .build();
    let (mut conn, sent) = connection(script);

    let mut cursor = conn.execute("SELECT ID, Name FROM Customers").unwrap();
    cursor.fetch_row().unwrap().unwrap();
    cursor.close().unwrap();
    drop(cursor);

    // The second statement is read from the right offset
    let rows = conn.query_all("SELECT COUNT(*) FROM Orders").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["total"], Value::Integer(-4));
    assert_eq!(sent.requests()[3], "004 CLOSE-STATEMENT\r\nSTATEMENT-ID:2\r\n");
}

#[test]
fn test_drop_closes_cursor() {
    let script = customers(Script::new(), "001", 9).close_ok("002").build();
    let (mut conn, sent) = connection(script);

    {
        let _cursor = conn.execute("SELECT ID, Name FROM Customers").unwrap();
    }

    assert_eq!(sent.requests()[1], "002 CLOSE-STATEMENT\r\nSTATEMENT-ID:9\r\n");
    assert_eq!(conn.state(), ConnectionState::Connected);
}

#[test]
fn test_use_after_close() {
    let script = customers(Script::new(), "001", 1).close_ok("002").build();
    let (mut conn, sent) = connection(script);

    let mut cursor = conn.execute("SELECT ID, Name FROM Customers").unwrap();
    cursor.fetch_all().unwrap();
    cursor.close().unwrap();
    cursor.close().unwrap();

    assert!(matches!(cursor.columns(), Err(Error::UseAfterClose)));
    assert!(matches!(cursor.column_info(), Err(Error::UseAfterClose)));
    assert!(matches!(cursor.fetch_row(), Err(Error::UseAfterClose)));
    drop(cursor);

    // Closing twice sent a single CLOSE-STATEMENT
    assert_eq!(sent.requests().len(), 2);
}

#[test]
fn test_error_status_poisons_cursor_and_connection() {
    let script = Script::new()
        .result_set("001", 3, 2, 2, "[A]", "VK_LONG", "N")
        .raw(&[2])
        .build();
    let (mut conn, sent) = connection(script);

    let mut cursor = conn.execute("SELECT A FROM T").unwrap();
    assert!(matches!(cursor.fetch_row(), Err(Error::Decode(_))));
    assert_eq!(cursor.state(), CursorState::Poisoned);
    assert!(matches!(cursor.fetch_row(), Err(Error::CursorPoisoned)));
    cursor.close().unwrap();
    drop(cursor);

    // No CLOSE-STATEMENT goes out on a desynchronized stream
    assert_eq!(sent.requests().len(), 1);
    assert_eq!(conn.state(), ConnectionState::Broken);
    assert!(matches!(conn.execute("SELECT 1"), Err(Error::ConnectionBroken)));
}

#[test]
fn test_truncated_row_stream() {
    let script = Script::new()
        .result_set("001", 3, 1, 1, "[A]", "VK_LONG8", "N")
        .present()
        .raw(&[1, 2, 3])
        .build();
    let (mut conn, _sent) = connection(script);

    let mut cursor = conn.execute("SELECT A FROM T").unwrap();
    assert!(matches!(
        cursor.fetch_row(),
        Err(Error::ShortRead { expected: 8, received: 3 })
    ));
    drop(cursor);
    assert_eq!(conn.state(), ConnectionState::Broken);
}

#[test]
fn test_update_count() {
    let script = Script::new()
        .header(&[
            "001 OK",
            "Statement-ID:4",
            "Result-Type:Update-Count",
            "Row-Count:12",
            "Row-Count-Sent:0",
        ])
        .close_ok("002")
        .build();
    let (mut conn, sent) = connection(script);

    let mut cursor = conn.execute("UPDATE T SET A = 1").unwrap();
    assert_eq!(cursor.result_type(), &ResultType::UpdateCount);
    assert_eq!(cursor.row_count(), 12);
    assert!(cursor.columns().unwrap().is_empty());
    assert!(cursor.fetch_row().unwrap().is_none());
    cursor.close().unwrap();
    drop(cursor);

    assert_eq!(sent.requests()[1], "002 CLOSE-STATEMENT\r\nSTATEMENT-ID:4\r\n");
}

#[test]
fn test_partial_first_page() {
    let script = Script::new()
        .result_set("001", 5, 100, 1, "[N]", "VK_WORD", "N")
        .present()
        .i16(7)
        .close_ok("002")
        .build();
    let (mut conn, _sent) = connection(script);

    let mut cursor = conn.execute("SELECT N FROM Big").unwrap();
    assert_eq!(cursor.row_count(), 100);
    assert_eq!(cursor.fetch_all().unwrap().len(), 1);
    assert!(cursor.fetch_row().unwrap().is_none());
}

#[test]
fn test_statement_rejected() {
    let script = Script::new()
        .header(&["001 ERROR", "Error-Code:1301", "Error-Description:Syntax error"])
        .build();
    let (mut conn, _sent) = connection(script);

    match conn.execute("SELEC 1") {
        Err(Error::Statement(message)) => assert!(message.contains("Syntax error")),
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
    assert_eq!(conn.state(), ConnectionState::Connected);
}

#[test]
fn test_unknown_value_kind_is_skipped() {
    let script = Script::new()
        .result_set("001", 1, 1, 1, "[X] [Y]", "VK_ARRAY VK_BOOLEAN", "N N")
        .null()
        .present()
        .i16(1)
        .close_ok("002")
        .build();
    let (mut conn, _sent) = connection(script);

    let mut cursor = conn.execute("SELECT X, Y FROM T").unwrap();
    let row = cursor.fetch_row().unwrap().unwrap();
    assert_eq!(row.len(), 1);
    assert!(row.get_by_name("X").is_none());
    assert_eq!(row["Y"], Value::Boolean(true));
    assert_eq!(
        cursor.warnings(),
        &[Warning::UnknownValueKind {
            row: 0,
            column: "X".to_string(),
            tag: "VK_ARRAY".to_string(),
        }]
    );
}

#[test]
fn test_updateable_rows_carry_prefix() {
    let script = Script::new()
        .result_set("001", 1, 2, 2, "[ID] [Name]", "VK_LONG VK_TEXT", "N Y")
        .raw(&[1])
        .u32(100)
        .present()
        .u32(10)
        .present()
        .pascal("one")
        .raw(&[1])
        .u32(101)
        .present()
        .u32(11)
        .present()
        .pascal("two")
        .close_ok("002")
        .build();
    let (mut conn, _sent) = connection(script);

    let rows = conn.query_all("SELECT ID, Name FROM T").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].get_i64(0), Some(11));
    assert_eq!(rows[1].get_string(1), Some("two"));
}

#[test]
fn test_decode_modes_through_cursor() {
    let build = || {
        Script::new()
            .result_set("001", 1, 1, 1, "[Big] [R]", "VK_LONG8 VK_REAL", "N N")
            .present()
            .u64(0x0000_0002_0000_0001)
            .present()
            .u64(0.5f64.to_bits())
            .close_ok("002")
            .build()
    };

    let (mut legacy, _) = connection(build());
    let row = legacy.query_all("SELECT Big, R FROM T").unwrap().remove(0);
    assert_eq!(row["Big"], Value::Integer(1));
    assert_eq!(row["R"], Value::Integer(0));

    let config = Config::default().decode_mode(DecodeMode::Corrected);
    let (mut corrected, _) = connection_with(build(), config, usize::MAX);
    let row = corrected.query_all("SELECT Big, R FROM T").unwrap().remove(0);
    assert_eq!(row["Big"], Value::Integer(0x0000_0002_0000_0001));
    assert_eq!(row["R"], Value::Float(0.5));
}

#[test]
fn test_one_byte_reads() {
    let script = customers(Script::new().login_ok("001"), "002", 7)
        .close_ok("003")
        .build();
    let (mut conn, _sent) = connection_with(script, Config::default(), 1);

    conn.login("Alice", "secret").unwrap();
    let rows = conn.query_all("SELECT ID, Name FROM Customers").unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].get_string(1), Some("Cy"));
}

#[test]
fn test_first_page_size_from_config() {
    let script = Script::new()
        .result_set("001", 1, 0, 0, "[A]", "VK_LONG", "N")
        .close_ok("002")
        .build();
    let (mut conn, sent) =
        connection_with(script, Config::default().first_page_size(250), usize::MAX);

    assert!(conn.query_all("SELECT A FROM T").unwrap().is_empty());
    assert!(sent.requests()[0].contains("FIRST-PAGE-SIZE:250\r\n"));
}

#[test]
fn test_unparseable_header_breaks_connection() {
    let script = Script::new()
        .header(&[
            "001 OK",
            "Statement-ID:1",
            "Result-Type:Result-Set",
            "Row-Count:1",
            "Row-Count-Sent:1",
            "Column-Aliases-BASE64:***",
            "Column-Types:VK_LONG",
            "Column-Updateability:N",
        ])
        .present()
        .u32(42)
        .close_ok("002")
        .build();
    let (mut conn, sent) = connection(script);

    assert!(matches!(conn.execute("SELECT A FROM T"), Err(Error::Protocol(_))));
    assert_eq!(conn.state(), ConnectionState::Broken);

    // The unread row is never taken for the next response header
    assert!(matches!(conn.execute("SELECT 1"), Err(Error::ConnectionBroken)));
    assert_eq!(sent.requests().len(), 1);
}

#[test]
fn test_huge_row_count_does_not_preallocate() {
    let script = Script::new()
        .header(&[
            "001 OK",
            "Statement-ID:1",
            "Result-Type:Result-Set",
            "Row-Count:18446744073709551615",
            "Row-Count-Sent:18446744073709551615",
            "Column-Aliases:[A]",
            "Column-Types:VK_LONG",
            "Column-Updateability:N",
        ])
        .present()
        .u32(1)
        .build();
    let (mut conn, _sent) = connection(script);

    let mut cursor = conn.execute("SELECT A FROM T").unwrap();
    assert_eq!(cursor.row_count(), u64::MAX);
    assert!(matches!(cursor.fetch_all(), Err(Error::ShortRead { .. })));
    assert_eq!(cursor.state(), CursorState::Poisoned);
    drop(cursor);
    assert_eq!(conn.state(), ConnectionState::Broken);
}
