// SPDX-FileCopyrightText: 2026 ABDB Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Statement execution and caller-typed column decoding.
//!
//! Every function prepares one statement, runs it, and finalizes it before
//! returning. Early returns drop the `Statement`, which finalizes it as well,
//! so no path leaks a prepared statement.

use abdb_core::{AbdbError, ColumnInfo, ColumnType, Row, Value};
use rusqlite::types::ValueRef;
use tracing::{debug, warn};

const TABLE_NAMES_SQL: &str =
    "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'";

fn prepare<'c>(
    conn: &'c rusqlite::Connection,
    sql: &str,
) -> Result<rusqlite::Statement<'c>, AbdbError> {
    conn.prepare(sql)
        .map_err(|e| AbdbError::CannotPrepare(e.to_string()))
}

fn finalize(stmt: rusqlite::Statement<'_>) -> Result<(), AbdbError> {
    stmt.finalize()
        .map_err(|e| AbdbError::CannotFinalize(e.to_string()))
}

fn step_err(e: rusqlite::Error) -> AbdbError {
    AbdbError::CannotExecute(e.to_string())
}

/// Run a statement that must complete without producing rows.
pub fn execute(conn: &rusqlite::Connection, sql: &str) -> Result<(), AbdbError> {
    let mut stmt = prepare(conn, sql)?;
    let changed = stmt.execute([]).map_err(step_err)?;
    finalize(stmt)?;
    debug!(changed, "statement executed");
    Ok(())
}

/// Run a query and decode the first `column_types.len()` columns of each row.
///
/// Columns past the end of the result decode as [`Value::Null`], matching
/// what SQLite reports for an out-of-range column.
pub fn select(
    conn: &rusqlite::Connection,
    sql: &str,
    column_types: &[ColumnType],
) -> Result<Vec<Row>, AbdbError> {
    let mut stmt = prepare(conn, sql)?;
    let column_count = stmt.column_count();
    let mut out = Vec::new();
    {
        let mut rows = stmt.query([]).map_err(step_err)?;
        while let Some(row) = rows.next().map_err(step_err)? {
            let mut decoded = Vec::with_capacity(column_types.len());
            for (index, column_type) in column_types.iter().enumerate() {
                if index >= column_count {
                    decoded.push(Value::Null);
                    continue;
                }
                let raw = row.get_ref(index).map_err(step_err)?;
                decoded.push(decode(raw, *column_type));
            }
            out.push(decoded);
        }
    }
    finalize(stmt)?;
    debug!(rows = out.len(), "query selected");
    Ok(out)
}

/// Names of all user tables.
pub fn table_names(conn: &rusqlite::Connection) -> Result<Vec<String>, AbdbError> {
    let mut stmt = prepare(conn, TABLE_NAMES_SQL)?;
    let mut names = Vec::new();
    {
        let mut rows = stmt.query([]).map_err(step_err)?;
        while let Some(row) = rows.next().map_err(step_err)? {
            names.push(text(row.get_ref(0).map_err(step_err)?).unwrap_or_default());
        }
    }
    finalize(stmt)?;
    Ok(names)
}

/// Column name, declared type and not-null flag for each column of `table`.
pub fn table_columns(
    conn: &rusqlite::Connection,
    table: &str,
) -> Result<Vec<ColumnInfo>, AbdbError> {
    let sql = format!("PRAGMA table_info('{}')", table.replace('\'', "''"));
    let mut stmt = prepare(conn, &sql)?;
    let mut columns = Vec::new();
    {
        let mut rows = stmt.query([]).map_err(step_err)?;
        while let Some(row) = rows.next().map_err(step_err)? {
            columns.push(ColumnInfo {
                name: text(row.get_ref(1).map_err(step_err)?).unwrap_or_default(),
                declared_type: text(row.get_ref(2).map_err(step_err)?).unwrap_or_default(),
                not_null: integer(row.get_ref(3).map_err(step_err)?) as i32 != 0,
            });
        }
    }
    finalize(stmt)?;
    Ok(columns)
}

/// Decode one stored value with the caller's declared type.
///
/// Storage-level null is always [`Value::Null`]. Otherwise values are coerced
/// the way SQLite's typed column accessors coerce them.
pub fn decode(raw: ValueRef<'_>, column_type: ColumnType) -> Value {
    if let ValueRef::Null = raw {
        return Value::Null;
    }
    match column_type {
        ColumnType::Bool => Value::Bool(integer(raw) as i32 != 0),
        ColumnType::Float => Value::Float(real(raw)),
        ColumnType::Int => Value::Int(integer(raw) as i32),
        ColumnType::Long => Value::Long(integer(raw)),
        ColumnType::Json => json_object(raw),
        ColumnType::String => Value::String(text(raw).unwrap_or_default()),
    }
}

fn json_object(raw: ValueRef<'_>) -> Value {
    let Some(source) = text(raw) else {
        warn!("cannot parse JSON cell: value is not text");
        return Value::Null;
    };
    match serde_json::from_str::<serde_json::Value>(&source) {
        Ok(serde_json::Value::Object(map)) => Value::Json(map),
        Ok(other) => {
            warn!(json = %source, kind = json_kind(&other), "cannot parse JSON cell: not an object");
            Value::Null
        }
        Err(e) => {
            warn!(json = %source, error = %e, "cannot parse JSON cell");
            Value::Null
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// UTF-8 text of a value; `None` when the bytes are not valid UTF-8.
fn text(raw: ValueRef<'_>) -> Option<String> {
    match raw {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => match std::str::from_utf8(bytes) {
            Ok(s) => Some(s.to_owned()),
            Err(e) => {
                warn!(error = %e, "cannot decode text cell as UTF-8");
                None
            }
        },
    }
}

fn integer(raw: ValueRef<'_>) -> i64 {
    match raw {
        ValueRef::Null => 0,
        ValueRef::Integer(i) => i,
        ValueRef::Real(f) => f as i64,
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            let s = String::from_utf8_lossy(bytes);
            let s = s.trim();
            s.parse::<i64>()
                .or_else(|_| s.parse::<f64>().map(|f| f as i64))
                .unwrap_or(0)
        }
    }
}

fn real(raw: ValueRef<'_>) -> f64 {
    match raw {
        ValueRef::Null => 0.0,
        ValueRef::Integer(i) => i as f64,
        ValueRef::Real(f) => f,
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes)
            .trim()
            .parse::<f64>()
            .unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn conn() -> rusqlite::Connection {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE items (
                id INTEGER PRIMARY KEY NOT NULL,
                flag INTEGER,
                price REAL,
                big INTEGER,
                meta TEXT,
                label TEXT
            );
            INSERT INTO items VALUES (1, 1, 2.5, 9000000000, '{\"k\":1}', 'first');
            INSERT INTO items VALUES (2, 0, NULL, NULL, NULL, NULL);",
        )
        .unwrap();
        conn
    }

    const ALL_TYPES: [ColumnType; 6] = [
        ColumnType::Int,
        ColumnType::Bool,
        ColumnType::Float,
        ColumnType::Long,
        ColumnType::Json,
        ColumnType::String,
    ];

    #[test]
    fn select_on_empty_table_returns_no_rows() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        execute(&conn, "CREATE TABLE t(a INT)").unwrap();
        let rows = select(&conn, "SELECT a FROM t", &[ColumnType::Int]).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn select_decodes_every_declared_type() {
        let conn = conn();
        let rows = select(
            &conn,
            "SELECT id, flag, price, big, meta, label FROM items WHERE id = 1",
            &ALL_TYPES,
        )
        .unwrap();

        let mut meta = serde_json::Map::new();
        meta.insert("k".into(), serde_json::json!(1));
        assert_eq!(
            rows,
            vec![vec![
                Value::Int(1),
                Value::Bool(true),
                Value::Float(2.5),
                Value::Long(9_000_000_000),
                Value::Json(meta),
                Value::String("first".into()),
            ]]
        );
    }

    #[test]
    fn null_cells_decode_to_null_for_every_type() {
        let conn = conn();
        for column_type in ColumnType::ALL {
            let rows = select(&conn, "SELECT label FROM items WHERE id = 2", &[column_type]).unwrap();
            assert_eq!(rows, vec![vec![Value::Null]], "type {column_type}");
        }
    }

    #[test]
    fn zero_flag_is_false_not_null() {
        let conn = conn();
        let rows = select(&conn, "SELECT flag FROM items WHERE id = 2", &[ColumnType::Bool]).unwrap();
        assert_eq!(rows, vec![vec![Value::Bool(false)]]);
    }

    #[test]
    fn int_truncates_to_32_bits_like_sqlite() {
        let conn = conn();
        let rows = select(&conn, "SELECT big FROM items WHERE id = 1", &[ColumnType::Int]).unwrap();
        assert_eq!(rows, vec![vec![Value::Int(9_000_000_000_i64 as i32)]]);
    }

    #[test]
    fn extra_declared_columns_decode_as_null() {
        let conn = conn();
        let rows = select(
            &conn,
            "SELECT id FROM items WHERE id = 1",
            &[ColumnType::Int, ColumnType::String],
        )
        .unwrap();
        assert_eq!(rows, vec![vec![Value::Int(1), Value::Null]]);
    }

    #[test]
    #[traced_test]
    fn malformed_json_cell_becomes_null_with_warning() {
        let conn = conn();
        let rows = select(&conn, "SELECT 'not json'", &[ColumnType::Json]).unwrap();
        assert_eq!(rows, vec![vec![Value::Null]]);
        assert!(logs_contain("cannot parse JSON cell"));
    }

    #[test]
    #[traced_test]
    fn json_array_is_not_an_object() {
        let conn = conn();
        let rows = select(&conn, "SELECT '[1,2]'", &[ColumnType::Json]).unwrap();
        assert_eq!(rows, vec![vec![Value::Null]]);
        assert!(logs_contain("not an object"));
    }

    #[test]
    fn invalid_utf8_string_decodes_as_empty() {
        let conn = conn();
        let rows = select(&conn, "SELECT CAST(x'ff' AS TEXT)", &[ColumnType::String]).unwrap();
        assert_eq!(rows, vec![vec![Value::String(String::new())]]);
    }

    #[test]
    fn numeric_text_coerces_for_numeric_types() {
        let conn = conn();
        let rows = select(
            &conn,
            "SELECT '42', ' 1.5 ', 'abc'",
            &[ColumnType::Long, ColumnType::Float, ColumnType::Int],
        )
        .unwrap();
        assert_eq!(
            rows,
            vec![vec![Value::Long(42), Value::Float(1.5), Value::Int(0)]]
        );
    }

    #[test]
    fn prepare_failure_carries_engine_message() {
        let conn = conn();
        let err = execute(&conn, "SELEC nonsense").unwrap_err();
        match err {
            AbdbError::CannotPrepare(message) => assert!(message.contains("syntax error")),
            other => panic!("expected CannotPrepare, got {other:?}"),
        }
    }

    #[test]
    fn constraint_violation_is_cannot_execute() {
        let conn = conn();
        let err = execute(&conn, "INSERT INTO items (id) VALUES (1)").unwrap_err();
        match err {
            AbdbError::CannotExecute(message) => assert!(message.contains("UNIQUE")),
            other => panic!("expected CannotExecute, got {other:?}"),
        }
    }

    #[test]
    fn execute_rejects_row_producing_statement() {
        let conn = conn();
        assert!(matches!(
            execute(&conn, "SELECT id FROM items"),
            Err(AbdbError::CannotExecute(_))
        ));
    }

    #[test]
    fn runtime_error_while_stepping_is_cannot_execute() {
        let conn = conn();
        let err = select(
            &conn,
            "SELECT abs(-9223372036854775808)",
            &[ColumnType::Long],
        )
        .unwrap_err();
        match err {
            AbdbError::CannotExecute(message) => assert!(message.contains("integer overflow")),
            other => panic!("expected CannotExecute, got {other:?}"),
        }
        assert!(!conn.is_busy());
    }

    #[test]
    fn multiple_statements_are_rejected_at_prepare() {
        let conn = conn();
        let err = execute(&conn, "CREATE TABLE a(x); CREATE TABLE b(y)").unwrap_err();
        assert!(matches!(err, AbdbError::CannotPrepare(_)));
        let names = table_names(&conn).unwrap();
        assert_eq!(names, vec!["items"], "nothing from the batch may run");
    }

    #[test]
    fn unbound_placeholders_are_cannot_execute() {
        let conn = conn();
        let err = execute(&conn, "INSERT INTO items (id) VALUES (?)").unwrap_err();
        assert!(matches!(err, AbdbError::CannotExecute(_)));
    }

    #[test]
    fn statements_are_released_on_every_path() {
        let conn = conn();
        let _ = execute(&conn, "SELEC broken");
        let _ = execute(&conn, "INSERT INTO items (id) VALUES (1)");
        let _ = execute(&conn, "SELECT id FROM items");
        let _ = select(&conn, "SELECT id FROM items", &[ColumnType::Int]).unwrap();
        let _ = select(&conn, "SELECT nope FROM items", &[ColumnType::Int]);

        assert!(!conn.is_busy(), "no statement may be left mid-step");
        conn.close().map_err(|(_, e)| e).unwrap();
    }

    #[test]
    fn table_names_skip_internal_tables() {
        let conn = conn();
        execute(&conn, "CREATE TABLE other (x TEXT)").unwrap();
        execute(&conn, "CREATE TABLE auto (id INTEGER PRIMARY KEY AUTOINCREMENT)").unwrap();

        let mut names = table_names(&conn).unwrap();
        names.sort();
        assert_eq!(names, vec!["auto", "items", "other"]);
    }

    #[test]
    fn table_columns_report_declared_metadata() {
        let conn = conn();
        let columns = table_columns(&conn, "items").unwrap();
        assert_eq!(columns.len(), 6);
        assert_eq!(
            columns[0],
            ColumnInfo {
                name: "id".into(),
                declared_type: "INTEGER".into(),
                not_null: true,
            }
        );
        assert_eq!(columns[4].name, "meta");
        assert!(!columns[4].not_null);
    }

    #[test]
    fn table_columns_escape_quotes_in_table_name() {
        let conn = conn();
        execute(&conn, "CREATE TABLE \"it's\" (v TEXT NOT NULL)").unwrap();
        let columns = table_columns(&conn, "it's").unwrap();
        assert_eq!(columns.len(), 1);
        assert!(columns[0].not_null);
    }

    #[test]
    fn unknown_table_has_no_columns() {
        let conn = conn();
        assert!(table_columns(&conn, "missing").unwrap().is_empty());
    }
}
