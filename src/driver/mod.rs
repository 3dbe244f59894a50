//! Driver capability interface and the compiled-in driver registry.
//!
//! The traits list exactly the operations the executor needs from a
//! backend. Optional operations have default bodies that fail with
//! [`DbalError::Unsupported`], so a partial driver degrades to a typed
//! error instead of a missing-method lookup at call time.

pub mod mysql;
pub mod sqlite;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{DbalError, ErrorInfo, Result};
use crate::row::Row;
use crate::types::{ParamTarget, Value};

/// A connectable backend known to the registry.
pub trait Driver: Send + Sync {
    /// The DSN prefix and quote-style name, e.g. `"sqlite"`.
    fn name(&self) -> &'static str;

    /// Open a connection from the DSN remainder and optional credentials.
    fn connect(
        &self,
        rest: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<Box<dyn DriverConnection>>;
}

/// Attributes a caller may read or store on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    ErrorMode,
    Case,
    StringifyFetches,
    Timeout,
}

/// One open native connection.
pub trait DriverConnection {
    fn driver_name(&self) -> &'static str;

    /// Prepare a statement. The handle borrows the connection; only one
    /// statement is in flight per connection at a time.
    fn prepare<'c>(&'c mut self, sql: &str) -> Result<Box<dyn DriverStatement + 'c>>;

    /// Non-prepared execution, returning the affected-row count.
    fn exec(&mut self, sql: &str) -> Result<u64>;

    fn begin_transaction(&mut self) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    /// Whether a transaction is open; the native driver is the source of
    /// truth wherever it can report this itself.
    fn in_transaction(&self) -> bool;

    /// Quote a single value for textual interpolation. This is the
    /// driver's escape-and-wrap rule, nothing more.
    fn quote_value(&self, value: &Value) -> String;

    fn last_insert_id(&mut self, _name: Option<&str>) -> Result<String> {
        Err(DbalError::Unsupported {
            driver: self.driver_name(),
            operation: "last_insert_id",
        })
    }

    fn set_attribute(&mut self, _attr: Attribute, _value: Value) -> Result<()> {
        Err(DbalError::Unsupported {
            driver: self.driver_name(),
            operation: "set_attribute",
        })
    }

    fn get_attribute(&self, _attr: Attribute) -> Option<Value> {
        None
    }

    /// SQLSTATE-style triple for the most recent failure on this
    /// connection, `("00000", None, None)` when clean.
    fn error_info(&self) -> ErrorInfo {
        ("00000".to_string(), None, None)
    }
}

/// A prepared statement moving through bind → execute → row pulls.
pub trait DriverStatement {
    /// Bind one value. Positional targets are 1-based here; the executor
    /// has already shifted caller input.
    fn bind(&mut self, target: ParamTarget<'_>, value: Value) -> Result<()>;

    /// Execute the statement. Statements that produce no result columns
    /// run to completion and record their affected-row count; queries arm
    /// the cursor for [`DriverStatement::next_row`].
    fn execute(&mut self) -> Result<()>;

    /// Pull exactly one row from the open cursor, `None` at exhaustion.
    fn next_row(&mut self) -> Result<Option<Row>>;

    /// Rows touched by the execution, for statements that modify data.
    fn affected(&self) -> u64;
}

/// Static registry of compiled-in drivers.
pub struct DriverRegistry {
    drivers: HashMap<&'static str, Arc<dyn Driver>>,
}

impl DriverRegistry {
    /// Registry with every built-in driver present.
    pub fn new() -> Self {
        let mut registry = Self {
            drivers: HashMap::new(),
        };
        registry.register(Arc::new(sqlite::SqliteDriver));
        registry.register(Arc::new(mysql::MysqlDriver));
        registry
    }

    pub fn register(&mut self, driver: Arc<dyn Driver>) {
        self.drivers.insert(driver.name(), driver);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Driver>> {
        self.drivers.get(name).cloned()
    }

    /// Split a DSN of the form `driver:rest`, e.g. `"sqlite::memory:"`
    /// into `("sqlite", ":memory:")`.
    pub fn parse_dsn(dsn: &str) -> Result<(&str, &str)> {
        match dsn.split_once(':') {
            Some((driver, rest)) if !driver.is_empty() => Ok((driver, rest)),
            _ => Err(DbalError::InvalidDsn(dsn.to_string())),
        }
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
