//! Error taxonomy for the abstraction layer.
//!
//! Driver failures are surfaced immediately with the driver's own message;
//! nothing here retries or translates beyond classification.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DbalError>;

/// SQLSTATE-style error triple: `(sqlstate, native_code, message)`.
pub type ErrorInfo = (String, Option<i64>, Option<String>);

#[derive(Debug, Error)]
pub enum DbalError {
    /// The underlying driver could not be reached when the lazy connection
    /// was first established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The driver rejected a statement at prepare time (malformed SQL or a
    /// driver-level refusal).
    #[error("prepare failed ({code}): {message}")]
    Prepare { code: String, message: String },

    /// Execution-phase driver error, passed through unmodified.
    #[error("execution failed: {0}")]
    Execution(String),

    /// Row-fetch driver error, passed through unmodified.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The DSN named a driver that is not registered.
    #[error("unknown driver '{0}'")]
    UnknownDriver(String),

    /// The DSN did not have the `driver:rest` shape.
    #[error("invalid dsn '{0}'")]
    InvalidDsn(String),

    /// A bound parameter did not match any placeholder in the statement.
    #[error("parameter '{0}' was not matched by the statement")]
    UnknownParameter(String),

    /// The requested operation is not implemented by the active driver.
    #[error("{driver} driver does not support {operation}")]
    Unsupported {
        driver: &'static str,
        operation: &'static str,
    },
}
