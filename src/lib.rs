//! A profiled database abstraction layer with typed fetch shapes.
//!
//! Two cooperating pieces:
//! - **Profiled executor**: wraps one native driver connection; every
//!   operation that talks to the database is timed through a pluggable
//!   profiler before delegating.
//! - **Typed fetch layer**: named retrieval shapes (single row, full
//!   table, column, grouped, unique-by-key, pairs, lazy row-by-row) built
//!   on the same placeholder-bound execution primitive.
//!
//! ```no_run
//! use dbal::{Executor, Params};
//!
//! # fn main() -> dbal::Result<()> {
//! let mut db = Executor::open("sqlite:app.sqlite")?;
//! db.exec("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")?;
//! db.fetch_affected(
//!     "INSERT INTO users (name) VALUES (?)",
//!     Params::positional(["ada"]),
//! )?;
//! let row = db.fetch_one("SELECT * FROM users WHERE id = ?", vec![1])?;
//! println!("{:?}", row.get("name"));
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod error;
pub mod executor;
pub mod fetch;
pub mod profiler;
pub mod quote;
pub mod row;
pub mod stream;
pub mod types;

pub use driver::{Attribute, Driver, DriverConnection, DriverRegistry, DriverStatement};
pub use error::{DbalError, ErrorInfo, Result};
pub use executor::{Executor, ExecutorBuilder, Performed};
pub use fetch::FromRow;
pub use profiler::{MemoryProfiler, NullProfiler, ProfileEntry, Profiler};
pub use quote::QuoteStyle;
pub use row::{Key, Row};
pub use stream::{AssocStream, ColumnStream, ObjectStream, PairStream, RowStream, UniqueStream};
pub use types::{BoundValue, ParamType, Params, Value};
