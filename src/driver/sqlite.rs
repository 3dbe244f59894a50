//! SQLite driver over `rusqlite`.

use std::collections::HashMap;
use std::mem::ManuallyDrop;

use rusqlite::types::ValueRef;
use rusqlite::Connection;

use crate::driver::{Attribute, Driver, DriverConnection, DriverStatement};
use crate::error::{DbalError, ErrorInfo, Result};
use crate::row::Row;
use crate::types::{ParamTarget, Value};

#[derive(Debug)]
pub struct SqliteDriver;

impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn connect(
        &self,
        rest: &str,
        _username: Option<&str>,
        _password: Option<&str>,
    ) -> Result<Box<dyn DriverConnection>> {
        // DSN remainder: "/path/to/db.sqlite" or ":memory:"
        let conn =
            Connection::open(rest).map_err(|e| DbalError::Connection(e.to_string()))?;

        Ok(Box::new(SqliteConnection {
            conn,
            last_error: None,
            attributes: HashMap::new(),
        }))
    }
}

struct SqliteConnection {
    conn: Connection,
    last_error: Option<ErrorInfo>,
    attributes: HashMap<Attribute, Value>,
}

impl DriverConnection for SqliteConnection {
    fn driver_name(&self) -> &'static str {
        "sqlite"
    }

    fn prepare<'c>(&'c mut self, sql: &str) -> Result<Box<dyn DriverStatement + 'c>> {
        match self.conn.prepare(sql) {
            Ok(stmt) => {
                let columns = stmt.column_names().iter().map(|s| s.to_string()).collect();
                Ok(Box::new(SqliteStatement {
                    stmt,
                    columns,
                    state: CursorState::Pending,
                    affected: 0,
                }))
            }
            Err(e) => {
                let message = e.to_string();
                self.last_error = Some(("HY000".to_string(), None, Some(message.clone())));
                Err(DbalError::Prepare {
                    code: "HY000".to_string(),
                    message,
                })
            }
        }
    }

    fn exec(&mut self, sql: &str) -> Result<u64> {
        self.conn.execute(sql, []).map(|n| n as u64).map_err(|e| {
            self.last_error = Some(("HY000".to_string(), None, Some(e.to_string())));
            DbalError::Execution(e.to_string())
        })
    }

    fn begin_transaction(&mut self) -> Result<()> {
        self.conn
            .execute("BEGIN TRANSACTION", [])
            .map(|_| ())
            .map_err(|e| DbalError::Execution(e.to_string()))
    }

    fn commit(&mut self) -> Result<()> {
        self.conn
            .execute("COMMIT", [])
            .map(|_| ())
            .map_err(|e| DbalError::Execution(e.to_string()))
    }

    fn rollback(&mut self) -> Result<()> {
        self.conn
            .execute("ROLLBACK", [])
            .map(|_| ())
            .map_err(|e| DbalError::Execution(e.to_string()))
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn quote_value(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Real(r) => r.to_string(),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Value::Blob(b) => {
                let mut hex = String::with_capacity(b.len() * 2);
                for byte in b {
                    hex.push_str(&format!("{byte:02X}"));
                }
                format!("X'{hex}'")
            }
        }
    }

    fn last_insert_id(&mut self, _name: Option<&str>) -> Result<String> {
        Ok(self.conn.last_insert_rowid().to_string())
    }

    fn set_attribute(&mut self, attr: Attribute, value: Value) -> Result<()> {
        self.attributes.insert(attr, value);
        Ok(())
    }

    fn get_attribute(&self, attr: Attribute) -> Option<Value> {
        self.attributes.get(&attr).cloned()
    }

    fn error_info(&self) -> ErrorInfo {
        self.last_error
            .clone()
            .unwrap_or_else(|| ("00000".to_string(), None, None))
    }
}

enum CursorState {
    Pending,
    Streaming,
    Done,
}

struct SqliteStatement<'conn> {
    stmt: rusqlite::Statement<'conn>,
    columns: Vec<String>,
    state: CursorState,
    affected: u64,
}

impl DriverStatement for SqliteStatement<'_> {
    fn bind(&mut self, target: ParamTarget<'_>, value: Value) -> Result<()> {
        let index = match target {
            ParamTarget::Positional(i) => i,
            ParamTarget::Named(name) => resolve_named(&self.stmt, name)?,
        };
        self.stmt
            .raw_bind_parameter(index, encode(value))
            .map_err(|e| DbalError::Execution(e.to_string()))
    }

    fn execute(&mut self) -> Result<()> {
        if self.stmt.column_count() == 0 {
            // No result columns: run to completion for the change count.
            let changed = self
                .stmt
                .raw_execute()
                .map_err(|e| DbalError::Execution(e.to_string()))?;
            self.affected = changed as u64;
            self.state = CursorState::Done;
        } else {
            // SQLite executes queries by stepping; arm the cursor and let
            // each next_row pull one native row.
            self.state = CursorState::Streaming;
        }
        Ok(())
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        if !matches!(self.state, CursorState::Streaming) {
            return Ok(None);
        }
        // Rows resets the statement when dropped, which would restart the
        // cursor on the following pull. It only wraps a borrow, so suppress
        // its destructor and keep stepping the same statement handle.
        let mut rows = ManuallyDrop::new(self.stmt.raw_query());
        match rows.next() {
            Ok(Some(row)) => {
                let mut values = Vec::with_capacity(self.columns.len());
                for i in 0..self.columns.len() {
                    let value = row
                        .get_ref(i)
                        .map_err(|e| DbalError::Fetch(e.to_string()))?;
                    values.push(decode(value));
                }
                Ok(Some(Row::from_parts(&self.columns, values)))
            }
            Ok(None) => {
                self.state = CursorState::Done;
                Ok(None)
            }
            Err(e) => {
                self.state = CursorState::Done;
                Err(DbalError::Fetch(e.to_string()))
            }
        }
    }

    fn affected(&self) -> u64 {
        self.affected
    }
}

/// Resolve a named placeholder to its 1-based index, tolerating a missing
/// prefix character in the caller's name.
fn resolve_named(stmt: &rusqlite::Statement<'_>, name: &str) -> Result<usize> {
    let lookup = |n: &str| -> Option<usize> { stmt.parameter_index(n).ok().flatten() };

    if let Some(index) = lookup(name) {
        return Ok(index);
    }
    if !name.starts_with([':', '@', '$']) {
        for prefix in [':', '@', '$'] {
            if let Some(index) = lookup(&format!("{prefix}{name}")) {
                return Ok(index);
            }
        }
    }
    Err(DbalError::UnknownParameter(name.to_string()))
}

fn encode(value: Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(i64::from(b)),
        Value::Integer(n) => rusqlite::types::Value::Integer(n),
        Value::Real(r) => rusqlite::types::Value::Real(r),
        Value::Text(s) => rusqlite::types::Value::Text(s),
        Value::Blob(b) => rusqlite::types::Value::Blob(b),
    }
}

fn decode(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Integer(n),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_connection() -> Box<dyn DriverConnection> {
        SqliteDriver.connect(":memory:", None, None).unwrap()
    }

    #[test]
    fn test_connect_memory() {
        assert!(SqliteDriver.connect(":memory:", None, None).is_ok());
    }

    #[test]
    fn test_exec_create_table() {
        let mut conn = memory_connection();
        let affected = conn
            .exec("CREATE TABLE test (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap();
        assert_eq!(affected, 0);
    }

    #[test]
    fn test_prepare_rejects_malformed_sql() {
        let mut conn = memory_connection();
        let err = conn.prepare("SELEC nonsense").err().unwrap();
        assert!(matches!(err, DbalError::Prepare { .. }));
        assert!(conn.error_info().2.is_some());
    }

    #[test]
    fn test_statement_round_trip() {
        let mut conn = memory_connection();
        conn.exec("CREATE TABLE t (id INTEGER, name TEXT)").unwrap();

        {
            let mut stmt = conn.prepare("INSERT INTO t (id, name) VALUES (?1, ?2)").unwrap();
            stmt.bind(ParamTarget::Positional(1), Value::Integer(1)).unwrap();
            stmt.bind(ParamTarget::Positional(2), Value::Text("ada".to_string()))
                .unwrap();
            stmt.execute().unwrap();
            assert_eq!(stmt.affected(), 1);
        }

        let mut stmt = conn.prepare("SELECT id, name FROM t").unwrap();
        stmt.execute().unwrap();
        let row = stmt.next_row().unwrap().unwrap();
        assert_eq!(row.get("id"), Some(&Value::Integer(1)));
        assert_eq!(row.get("name"), Some(&Value::Text("ada".to_string())));
        assert!(stmt.next_row().unwrap().is_none());
    }

    #[test]
    fn test_named_parameters_tolerate_missing_prefix() {
        let mut conn = memory_connection();
        conn.exec("CREATE TABLE t (id INTEGER)").unwrap();

        let mut stmt = conn.prepare("INSERT INTO t (id) VALUES (:id)").unwrap();
        stmt.bind(ParamTarget::Named("id"), Value::Integer(9)).unwrap();
        stmt.execute().unwrap();
        assert_eq!(stmt.affected(), 1);
    }

    #[test]
    fn test_unknown_named_parameter() {
        let mut conn = memory_connection();
        conn.exec("CREATE TABLE t (id INTEGER)").unwrap();
        let mut stmt = conn.prepare("INSERT INTO t (id) VALUES (:id)").unwrap();
        let err = stmt
            .bind(ParamTarget::Named("missing"), Value::Integer(1))
            .err()
            .unwrap();
        assert!(matches!(err, DbalError::UnknownParameter(_)));
    }

    #[test]
    fn test_quote_escapes_embedded_quotes() {
        let conn = SqliteDriver.connect(":memory:", None, None).unwrap();
        assert_eq!(
            conn.quote_value(&Value::Text("'; DROP TABLE test; --".to_string())),
            "'''; DROP TABLE test; --'"
        );
        assert_eq!(conn.quote_value(&Value::Null), "NULL");
        assert_eq!(conn.quote_value(&Value::Integer(5)), "5");
    }

    #[test]
    fn test_transaction_state_tracks_driver() {
        let mut conn = memory_connection();
        conn.exec("CREATE TABLE t (id INTEGER)").unwrap();

        assert!(!conn.in_transaction());
        conn.begin_transaction().unwrap();
        assert!(conn.in_transaction());
        conn.exec("INSERT INTO t VALUES (1)").unwrap();
        conn.rollback().unwrap();
        assert!(!conn.in_transaction());
    }
}
