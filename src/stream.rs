//! Lazy result streams: forward-only, single-pass row sources over an open
//! driver cursor.
//!
//! A stream borrows its executor mutably for its whole life, so no second
//! statement can run until it is drained, finished or dropped. Each `next`
//! pulls exactly one native row.

use std::marker::PhantomData;

use crate::error::Result;
use crate::executor::Performed;
use crate::fetch::FromRow;
use crate::row::{Key, Row};
use crate::types::Value;

/// Lazy sequence of full rows.
pub struct RowStream<'c> {
    performed: Performed<'c>,
    finished: bool,
}

impl<'c> RowStream<'c> {
    pub(crate) fn new(performed: Performed<'c>) -> Self {
        Self {
            performed,
            finished: false,
        }
    }

    /// Pull the next row, `None` at exhaustion.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        if self.finished {
            return Ok(None);
        }
        match self.performed.next_row() {
            Ok(Some(row)) => Ok(Some(row)),
            Ok(None) => {
                self.finished = true;
                Ok(None)
            }
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }

    /// Release the underlying cursor without draining the remainder.
    pub fn finish(self) {
        drop(self);
    }
}

impl Iterator for RowStream<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

/// Lazy `(first-column key, full row)` pairs.
pub struct AssocStream<'c> {
    rows: RowStream<'c>,
}

impl<'c> AssocStream<'c> {
    pub(crate) fn new(rows: RowStream<'c>) -> Self {
        Self { rows }
    }

    pub fn finish(self) {
        self.rows.finish();
    }
}

impl Iterator for AssocStream<'_> {
    type Item = Result<(Key, Row)>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e)),
        };
        Some(Ok((row.key(), row)))
    }
}

/// Lazy single-column values.
pub struct ColumnStream<'c> {
    rows: RowStream<'c>,
    column: usize,
}

impl<'c> ColumnStream<'c> {
    pub(crate) fn new(rows: RowStream<'c>, column: usize) -> Self {
        Self { rows, column }
    }

    pub fn finish(self) {
        self.rows.finish();
    }
}

impl Iterator for ColumnStream<'_> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e)),
        };
        Some(Ok(row.get_index(self.column).cloned().unwrap_or(Value::Null)))
    }
}

/// Lazy decoded value objects.
pub struct ObjectStream<'c, T> {
    rows: RowStream<'c>,
    _marker: PhantomData<fn() -> T>,
}

impl<'c, T> ObjectStream<'c, T> {
    pub(crate) fn new(rows: RowStream<'c>) -> Self {
        Self {
            rows,
            _marker: PhantomData,
        }
    }

    pub fn finish(self) {
        self.rows.finish();
    }
}

impl<T: FromRow> Iterator for ObjectStream<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e)),
        };
        Some(T::from_row(&row))
    }
}

/// Lazy `(first column, second column)` pairs.
pub struct PairStream<'c> {
    rows: RowStream<'c>,
}

impl<'c> PairStream<'c> {
    pub(crate) fn new(rows: RowStream<'c>) -> Self {
        Self { rows }
    }

    pub fn finish(self) {
        self.rows.finish();
    }
}

impl Iterator for PairStream<'_> {
    type Item = Result<(Key, Value)>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e)),
        };
        let value = row.get_index(1).cloned().unwrap_or(Value::Null);
        Some(Ok((row.key(), value)))
    }
}

/// Lazy `(first-column key, remaining row)` pairs.
pub struct UniqueStream<'c> {
    rows: RowStream<'c>,
}

impl<'c> UniqueStream<'c> {
    pub(crate) fn new(rows: RowStream<'c>) -> Self {
        Self { rows }
    }

    pub fn finish(self) {
        self.rows.finish();
    }
}

impl Iterator for UniqueStream<'_> {
    type Item = Result<(Key, Row)>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e)),
        };
        Some(Ok(row.split_key()))
    }
}
