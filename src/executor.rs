//! The profiled executor: a lazily-connected wrapper around one native
//! driver connection, timing every operation that talks to the database.

use std::sync::Arc;

use log::debug;

use crate::driver::{Attribute, Driver, DriverConnection, DriverRegistry, DriverStatement};
use crate::error::{DbalError, ErrorInfo, Result};
use crate::profiler::{NullProfiler, Profiler};
use crate::quote::QuoteStyle;
use crate::row::Row;
use crate::types::{ParamTarget, Params, Value};

/// A statement that has passed through [`Executor::perform`]: prepared,
/// bound and executed. Rows are pulled from it one at a time; dropping it
/// releases the driver cursor.
pub struct Performed<'c> {
    stmt: Box<dyn DriverStatement + 'c>,
}

impl Performed<'_> {
    /// Pull the next row from the open cursor.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        self.stmt.next_row()
    }

    /// Rows touched by the execution (not rows fetched).
    pub fn affected(&self) -> u64 {
        self.stmt.affected()
    }
}

/// The profiled executor. One logical connection per instance, established
/// on first use; every operation is timed through the configured profiler
/// before delegating to the driver.
pub struct Executor {
    driver: Arc<dyn Driver>,
    rest: String,
    username: Option<String>,
    password: Option<String>,
    conn: Option<Box<dyn DriverConnection>>,
    profiler: Arc<dyn Profiler>,
}

impl Executor {
    pub fn builder() -> ExecutorBuilder {
        ExecutorBuilder::new()
    }

    /// Shorthand for a builder carrying only a DSN.
    pub fn open(dsn: impl Into<String>) -> Result<Executor> {
        ExecutorBuilder::new().dsn(dsn).build()
    }

    /// The name of the configured driver.
    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }

    /// Establish the underlying connection if it is not yet open.
    ///
    /// Idempotent: calling this any number of times performs exactly one
    /// connection establishment, and only the establishing call is
    /// profiled.
    pub fn connect(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Ok(());
        }
        self.profiler.start("connect");
        debug!("connecting via '{}' driver", self.driver.name());
        let conn = self.driver.connect(
            &self.rest,
            self.username.as_deref(),
            self.password.as_deref(),
        )?;
        self.conn = Some(conn);
        self.profiler.finish(None, None);
        Ok(())
    }

    fn conn_mut(&mut self) -> Result<&mut (dyn DriverConnection + 'static)> {
        self.connect()?;
        match self.conn.as_mut() {
            Some(conn) => Ok(conn.as_mut()),
            None => Err(DbalError::Connection("connection was not opened".into())),
        }
    }

    /// Prepare, bind and execute a statement: the single choke point for
    /// all parameterized execution.
    pub fn perform(
        &mut self,
        statement: &str,
        params: impl Into<Params>,
    ) -> Result<Performed<'_>> {
        let params = params.into();
        self.connect()?;
        let profiler = Arc::clone(&self.profiler);
        profiler.start("perform");
        debug!("perform: {}", statement_preview(statement));

        let conn = match self.conn.as_mut() {
            Some(conn) => conn,
            None => return Err(DbalError::Connection("connection was not opened".into())),
        };
        let mut stmt = conn.prepare(statement)?;
        bind_params(stmt.as_mut(), &params)?;
        stmt.execute()?;

        profiler.finish(Some(statement), Some(&params));
        Ok(Performed { stmt })
    }

    /// Non-prepared execution of a raw statement, returning the
    /// affected-row count.
    pub fn exec(&mut self, statement: &str) -> Result<u64> {
        let profiler = Arc::clone(&self.profiler);
        let conn = self.conn_mut()?;
        profiler.start("exec");
        debug!("exec: {}", statement_preview(statement));
        let affected = conn.exec(statement)?;
        profiler.finish(Some(statement), None);
        Ok(affected)
    }

    /// Validate a statement against the driver without executing it.
    /// Surfaces the driver's rejection of malformed SQL as
    /// [`DbalError::Prepare`].
    pub fn prepare(&mut self, statement: &str) -> Result<()> {
        let profiler = Arc::clone(&self.profiler);
        let conn = self.conn_mut()?;
        profiler.start("prepare");
        let outcome = conn.prepare(statement).map(|_| ());
        profiler.finish(Some(statement), None);
        outcome
    }

    pub fn begin_transaction(&mut self) -> Result<()> {
        self.transaction_op("beginTransaction", DriverConnection::begin_transaction)
    }

    pub fn commit(&mut self) -> Result<()> {
        self.transaction_op("commit", DriverConnection::commit)
    }

    pub fn roll_back(&mut self) -> Result<()> {
        self.transaction_op("rollBack", DriverConnection::rollback)
    }

    fn transaction_op(
        &mut self,
        name: &str,
        op: fn(&mut (dyn DriverConnection + 'static)) -> Result<()>,
    ) -> Result<()> {
        let profiler = Arc::clone(&self.profiler);
        let conn = self.conn_mut()?;
        profiler.start(name);
        let outcome = op(conn);
        profiler.finish(None, None);
        outcome
    }

    /// Whether the driver reports an open transaction.
    pub fn in_transaction(&mut self) -> Result<bool> {
        let profiler = Arc::clone(&self.profiler);
        let conn = self.conn_mut()?;
        profiler.start("inTransaction");
        let state = conn.in_transaction();
        profiler.finish(None, None);
        Ok(state)
    }

    /// Driver-reported identifier of the most recently inserted row.
    pub fn last_insert_id(&mut self, name: Option<&str>) -> Result<String> {
        self.conn_mut()?.last_insert_id(name)
    }

    /// SQLSTATE-style triple for the most recent failure.
    pub fn error_info(&mut self) -> Result<ErrorInfo> {
        Ok(self.conn_mut()?.error_info())
    }

    pub fn set_attribute(&mut self, attr: Attribute, value: Value) -> Result<()> {
        self.conn_mut()?.set_attribute(attr, value)
    }

    pub fn get_attribute(&mut self, attr: Attribute) -> Result<Option<Value>> {
        Ok(self.conn_mut()?.get_attribute(attr))
    }

    /// Quote one value for textual interpolation, using the driver's
    /// escape rule. Not a substitute for `perform`'s bind-based safety.
    pub fn quote_value(&mut self, value: &Value) -> Result<String> {
        Ok(self.conn_mut()?.quote_value(value))
    }

    /// Quote each value in a sequence and join the results with `", "`.
    pub fn quote_list(&mut self, values: &[Value]) -> Result<String> {
        let conn = self.conn_mut()?;
        let quoted: Vec<String> = values.iter().map(|v| conn.quote_value(v)).collect();
        Ok(quoted.join(", "))
    }

    /// The identifier quote style for a driver name, or for the active
    /// connection's driver when no override is given.
    pub fn quote_names(&mut self, driver: Option<&str>) -> Result<QuoteStyle> {
        let name = match driver {
            Some(name) => name.to_string(),
            None => self.conn_mut()?.driver_name().to_string(),
        };
        Ok(QuoteStyle::for_driver(&name))
    }
}

/// Bind a parameter set, shifting 0-based positional input to the 1-based
/// indices drivers expect and applying the tagged-bool coercion.
fn bind_params(stmt: &mut (dyn DriverStatement + '_), params: &Params) -> Result<()> {
    match params {
        Params::None => Ok(()),
        Params::Positional(values) => {
            for (index, bound) in values.iter().enumerate() {
                stmt.bind(ParamTarget::Positional(index + 1), bound.resolve())?;
            }
            Ok(())
        }
        Params::Named(pairs) => {
            for (name, bound) in pairs {
                stmt.bind(ParamTarget::Named(name), bound.resolve())?;
            }
            Ok(())
        }
    }
}

fn statement_preview(statement: &str) -> String {
    let flat = statement.replace('\n', " ");
    if flat.len() > 80 {
        format!("{}...", &flat[..80])
    } else {
        flat
    }
}

/// Builder for [`Executor`] instances.
pub struct ExecutorBuilder {
    dsn: Option<String>,
    username: Option<String>,
    password: Option<String>,
    profiler: Arc<dyn Profiler>,
    registry: Option<DriverRegistry>,
}

impl ExecutorBuilder {
    fn new() -> Self {
        Self {
            dsn: None,
            username: None,
            password: None,
            profiler: Arc::new(NullProfiler),
            registry: None,
        }
    }

    /// The DSN, e.g. `"sqlite::memory:"` or
    /// `"mysql:host=localhost;dbname=app"`.
    pub fn dsn(mut self, dsn: impl Into<String>) -> Self {
        self.dsn = Some(dsn.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Install a profiler. Without one, profiling is a no-op.
    pub fn profiler(mut self, profiler: Arc<dyn Profiler>) -> Self {
        self.profiler = profiler;
        self
    }

    /// Override the driver registry, e.g. to add a custom driver.
    pub fn registry(mut self, registry: DriverRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Resolve the driver from the DSN. The connection itself is not
    /// established until first use.
    pub fn build(self) -> Result<Executor> {
        let dsn = self
            .dsn
            .ok_or_else(|| DbalError::InvalidDsn(String::new()))?;
        let (driver_name, rest) = DriverRegistry::parse_dsn(&dsn)?;
        let registry = self.registry.unwrap_or_default();
        let driver = registry
            .get(driver_name)
            .ok_or_else(|| DbalError::UnknownDriver(driver_name.to_string()))?;

        Ok(Executor {
            driver,
            rest: rest.to_string(),
            username: self.username,
            password: self.password,
            conn: None,
            profiler: self.profiler,
        })
    }
}
