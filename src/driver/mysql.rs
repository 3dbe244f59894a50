//! MySQL driver over the `mysql` crate.
//!
//! Partial driver: positional binds only. The binary protocol path for
//! named placeholders is not wired up, so named binds surface
//! [`DbalError::Unsupported`].

use std::collections::HashMap;

use mysql::prelude::Queryable;
use mysql::{Binary, Conn, Opts, OptsBuilder, QueryResult};

use crate::driver::{Attribute, Driver, DriverConnection, DriverStatement};
use crate::error::{DbalError, ErrorInfo, Result};
use crate::row::Row;
use crate::types::{ParamTarget, Value};

#[derive(Debug)]
pub struct MysqlDriver;

impl Driver for MysqlDriver {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn connect(
        &self,
        rest: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<Box<dyn DriverConnection>> {
        // DSN remainder: "host=...;dbname=...;port=..."
        let mut host = "localhost".to_string();
        let mut dbname = None;
        let mut port = 3306u16;
        for part in rest.split(';') {
            if let Some((k, v)) = part.split_once('=') {
                match k.trim() {
                    "host" => host = v.trim().to_string(),
                    "dbname" => dbname = Some(v.trim().to_string()),
                    "port" => port = v.trim().parse().unwrap_or(3306),
                    _ => {}
                }
            }
        }

        let opts: Opts = OptsBuilder::new()
            .ip_or_hostname(Some(host))
            .tcp_port(port)
            .db_name(dbname)
            .user(username.map(str::to_string))
            .pass(password.map(str::to_string))
            .into();
        let conn = Conn::new(opts).map_err(|e| DbalError::Connection(e.to_string()))?;

        Ok(Box::new(MysqlConnection {
            conn,
            in_transaction: false,
            last_error: None,
            attributes: HashMap::new(),
        }))
    }
}

struct MysqlConnection {
    conn: Conn,
    // The wire protocol has no cheap transaction introspection; track the
    // state alongside the delegated calls.
    in_transaction: bool,
    last_error: Option<ErrorInfo>,
    attributes: HashMap<Attribute, Value>,
}

impl DriverConnection for MysqlConnection {
    fn driver_name(&self) -> &'static str {
        "mysql"
    }

    fn prepare<'c>(&'c mut self, sql: &str) -> Result<Box<dyn DriverStatement + 'c>> {
        match self.conn.prep(sql) {
            Ok(stmt) => Ok(Box::new(MysqlStatement {
                state: MysqlState::Pending {
                    conn: &mut self.conn,
                    stmt,
                    bound: Vec::new(),
                },
            })),
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
        self.conn.query_drop(sql).map_err(|e| {
            self.last_error = Some(("HY000".to_string(), None, Some(e.to_string())));
            DbalError::Execution(e.to_string())
        })?;
        Ok(self.conn.affected_rows())
    }

    fn begin_transaction(&mut self) -> Result<()> {
        self.conn
            .query_drop("BEGIN")
            .map_err(|e| DbalError::Execution(e.to_string()))?;
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.conn
            .query_drop("COMMIT")
            .map_err(|e| DbalError::Execution(e.to_string()))?;
        self.in_transaction = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.conn
            .query_drop("ROLLBACK")
            .map_err(|e| DbalError::Execution(e.to_string()))?;
        self.in_transaction = false;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    fn quote_value(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Real(r) => r.to_string(),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Value::Blob(b) => format!("'{}'", String::from_utf8_lossy(b).replace('\'', "''")),
        }
    }

    fn last_insert_id(&mut self, _name: Option<&str>) -> Result<String> {
        Ok(self.conn.last_insert_id().to_string())
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

enum MysqlState<'c> {
    Pending {
        conn: &'c mut Conn,
        stmt: mysql::Statement,
        bound: Vec<(usize, Value)>,
    },
    Streaming {
        result: QueryResult<'c, 'c, 'c, Binary>,
        affected: u64,
    },
    Done {
        affected: u64,
    },
}

struct MysqlStatement<'c> {
    state: MysqlState<'c>,
}

impl DriverStatement for MysqlStatement<'_> {
    fn bind(&mut self, target: ParamTarget<'_>, value: Value) -> Result<()> {
        match &mut self.state {
            MysqlState::Pending { bound, .. } => match target {
                ParamTarget::Positional(index) => {
                    bound.push((index, value));
                    Ok(())
                }
                ParamTarget::Named(_) => Err(DbalError::Unsupported {
                    driver: "mysql",
                    operation: "named parameter binding",
                }),
            },
            _ => Err(DbalError::Execution(
                "statement already executed".to_string(),
            )),
        }
    }

    fn execute(&mut self) -> Result<()> {
        let state = std::mem::replace(&mut self.state, MysqlState::Done { affected: 0 });
        match state {
            MysqlState::Pending {
                conn,
                stmt,
                mut bound,
            } => {
                bound.sort_by_key(|(index, _)| *index);
                let values: Vec<mysql::Value> =
                    bound.into_iter().map(|(_, v)| encode(v)).collect();
                let params = if values.is_empty() {
                    mysql::Params::Empty
                } else {
                    mysql::Params::Positional(values)
                };
                let result = conn
                    .exec_iter(stmt, params)
                    .map_err(|e| DbalError::Execution(e.to_string()))?;
                let affected = result.affected_rows();
                self.state = MysqlState::Streaming { result, affected };
                Ok(())
            }
            other => {
                // Re-execution of a spent handle is not modeled; keep the
                // terminal state.
                self.state = other;
                Ok(())
            }
        }
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        match &mut self.state {
            MysqlState::Streaming { result, affected } => match result.next() {
                Some(Ok(native)) => Ok(Some(decode_row(native))),
                Some(Err(e)) => {
                    let affected = *affected;
                    self.state = MysqlState::Done { affected };
                    Err(DbalError::Fetch(e.to_string()))
                }
                None => {
                    let affected = *affected;
                    self.state = MysqlState::Done { affected };
                    Ok(None)
                }
            },
            _ => Ok(None),
        }
    }

    fn affected(&self) -> u64 {
        match &self.state {
            MysqlState::Pending { .. } => 0,
            MysqlState::Streaming { affected, .. } => *affected,
            MysqlState::Done { affected } => *affected,
        }
    }
}

fn decode_row(native: mysql::Row) -> Row {
    let names: Vec<String> = native
        .columns_ref()
        .iter()
        .map(|c| c.name_str().into_owned())
        .collect();
    let values = native.unwrap().into_iter().map(decode).collect();
    Row::from_parts(&names, values)
}

fn encode(value: Value) -> mysql::Value {
    match value {
        Value::Null => mysql::Value::NULL,
        Value::Bool(b) => mysql::Value::Int(i64::from(b)),
        Value::Integer(n) => mysql::Value::Int(n),
        Value::Real(r) => mysql::Value::Double(r),
        Value::Text(s) => mysql::Value::Bytes(s.into_bytes()),
        Value::Blob(b) => mysql::Value::Bytes(b),
    }
}

fn decode(value: mysql::Value) -> Value {
    match value {
        mysql::Value::NULL => Value::Null,
        mysql::Value::Int(n) => Value::Integer(n),
        mysql::Value::UInt(n) => Value::Integer(n as i64),
        mysql::Value::Float(f) => Value::Real(f64::from(f)),
        mysql::Value::Double(d) => Value::Real(d),
        mysql::Value::Bytes(b) => match String::from_utf8(b) {
            Ok(s) => Value::Text(s),
            Err(e) => Value::Blob(e.into_bytes()),
        },
        mysql::Value::Date(y, mo, d, h, mi, s, _us) => {
            Value::Text(format!("{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}"))
        }
        mysql::Value::Time(neg, days, h, mi, s, _us) => {
            let sign = if neg { "-" } else { "" };
            let hours = u32::from(h) + days * 24;
            Value::Text(format!("{sign}{hours:02}:{mi:02}:{s:02}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_name() {
        assert_eq!(MysqlDriver.name(), "mysql");
    }

    #[test]
    fn test_decode_scalars() {
        assert_eq!(decode(mysql::Value::NULL), Value::Null);
        assert_eq!(decode(mysql::Value::Int(3)), Value::Integer(3));
        assert_eq!(
            decode(mysql::Value::Bytes(b"abc".to_vec())),
            Value::Text("abc".to_string())
        );
        assert_eq!(
            decode(mysql::Value::Date(2026, 8, 7, 12, 30, 0, 0)),
            Value::Text("2026-08-07 12:30:00".to_string())
        );
    }

    #[test]
    fn test_encode_scalars() {
        assert_eq!(encode(Value::Bool(true)), mysql::Value::Int(1));
        assert_eq!(
            encode(Value::Text("x".to_string())),
            mysql::Value::Bytes(b"x".to_vec())
        );
    }
}
