//! The typed fetch layer: named retrieval shapes over `perform`.
//!
//! Every eager shape routes through one drain helper, so a driver-level
//! fetch failure after a successful execute degrades to "no rows" instead
//! of a type-inconsistent result. The lazy `yield_*` variants live in
//! [`crate::stream`] and are constructed here.

use indexmap::IndexMap;
use log::warn;

use crate::error::Result;
use crate::executor::{Executor, Performed};
use crate::row::{Key, Row};
use crate::stream::{
    AssocStream, ColumnStream, ObjectStream, PairStream, RowStream, UniqueStream,
};
use crate::types::{Params, Value};

/// Decode a [`Row`] into a caller-defined value object.
///
/// The decoder sees the finished row, so defaults chosen by the caller's
/// constructor are never clobbered by a later field injection.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(row.clone())
    }
}

impl Executor {
    /// First row of the result, or an empty row when nothing matched.
    pub fn fetch_one(&mut self, statement: &str, params: impl Into<Params>) -> Result<Row> {
        let mut performed = self.perform(statement, params)?;
        let row = match performed.next_row() {
            Ok(Some(row)) => row,
            Ok(None) => Row::new(),
            Err(e) => {
                warn!("fetch after successful execute failed, treating as no rows: {e}");
                Row::new()
            }
        };
        Ok(row)
    }

    /// Every row, in driver order.
    pub fn fetch_all(&mut self, statement: &str, params: impl Into<Params>) -> Result<Vec<Row>> {
        let performed = self.perform(statement, params)?;
        Ok(drain(performed))
    }

    /// Rows keyed by their first column, full row kept, last row wins on
    /// duplicate keys. Callers that need the duplicates use
    /// [`Executor::fetch_all`] or [`Executor::fetch_group`].
    pub fn fetch_assoc(
        &mut self,
        statement: &str,
        params: impl Into<Params>,
    ) -> Result<IndexMap<Key, Row>> {
        let performed = self.perform(statement, params)?;
        let mut keyed = IndexMap::new();
        for row in drain(performed) {
            keyed.insert(row.key(), row);
        }
        Ok(keyed)
    }

    /// One column across all rows.
    pub fn fetch_column(
        &mut self,
        statement: &str,
        params: impl Into<Params>,
        column: usize,
    ) -> Result<Vec<Value>> {
        let performed = self.perform(statement, params)?;
        Ok(drain(performed)
            .into_iter()
            .map(|row| row.get_index(column).cloned().unwrap_or(Value::Null))
            .collect())
    }

    /// First column to all remaining-column rows sharing that key:
    /// duplicate keys collect, nothing is overwritten.
    pub fn fetch_group(
        &mut self,
        statement: &str,
        params: impl Into<Params>,
    ) -> Result<IndexMap<Key, Vec<Row>>> {
        let performed = self.perform(statement, params)?;
        let mut groups: IndexMap<Key, Vec<Row>> = IndexMap::new();
        for row in drain(performed) {
            let (key, rest) = row.split_key();
            groups.entry(key).or_default().push(rest);
        }
        Ok(groups)
    }

    /// First column to second column, one entry per row.
    pub fn fetch_pairs(
        &mut self,
        statement: &str,
        params: impl Into<Params>,
    ) -> Result<IndexMap<Key, Value>> {
        let performed = self.perform(statement, params)?;
        let mut pairs = IndexMap::new();
        for row in drain(performed) {
            let value = row.get_index(1).cloned().unwrap_or(Value::Null);
            pairs.insert(row.key(), value);
        }
        Ok(pairs)
    }

    /// First column to the remainder of the row, last row wins on
    /// duplicate keys: the overwriting counterpart of
    /// [`Executor::fetch_group`].
    pub fn fetch_unique(
        &mut self,
        statement: &str,
        params: impl Into<Params>,
    ) -> Result<IndexMap<Key, Row>> {
        let performed = self.perform(statement, params)?;
        let mut keyed = IndexMap::new();
        for row in drain(performed) {
            let (key, rest) = row.split_key();
            keyed.insert(key, rest);
        }
        Ok(keyed)
    }

    /// First column of the first row, or [`Value::Null`] when no rows
    /// matched.
    pub fn fetch_value(&mut self, statement: &str, params: impl Into<Params>) -> Result<Value> {
        let row = self.fetch_one(statement, params)?;
        Ok(row.get_index(0).cloned().unwrap_or(Value::Null))
    }

    /// First row decoded into `T`, or `None` when nothing matched.
    pub fn fetch_object<T: FromRow>(
        &mut self,
        statement: &str,
        params: impl Into<Params>,
    ) -> Result<Option<T>> {
        let row = self.fetch_one(statement, params)?;
        if row.is_empty() {
            return Ok(None);
        }
        T::from_row(&row).map(Some)
    }

    /// Every row decoded into `T`.
    pub fn fetch_objects<T: FromRow>(
        &mut self,
        statement: &str,
        params: impl Into<Params>,
    ) -> Result<Vec<T>> {
        self.fetch_objects_with(statement, params, T::from_row)
    }

    /// Every row decoded through an explicit decoder function.
    pub fn fetch_objects_with<T, F>(
        &mut self,
        statement: &str,
        params: impl Into<Params>,
        decode: F,
    ) -> Result<Vec<T>>
    where
        F: Fn(&Row) -> Result<T>,
    {
        let performed = self.perform(statement, params)?;
        drain(performed).iter().map(decode).collect()
    }

    /// Rows touched by the statement (not fetched), via `perform`.
    pub fn fetch_affected(&mut self, statement: &str, params: impl Into<Params>) -> Result<u64> {
        let performed = self.perform(statement, params)?;
        Ok(performed.affected())
    }

    /// Lazy row-by-row variant of [`Executor::fetch_all`].
    pub fn yield_all(
        &mut self,
        statement: &str,
        params: impl Into<Params>,
    ) -> Result<RowStream<'_>> {
        Ok(RowStream::new(self.perform(statement, params)?))
    }

    /// Lazy `(key, full row)` variant of [`Executor::fetch_assoc`].
    pub fn yield_assoc(
        &mut self,
        statement: &str,
        params: impl Into<Params>,
    ) -> Result<AssocStream<'_>> {
        Ok(AssocStream::new(self.yield_all(statement, params)?))
    }

    /// Lazy variant of [`Executor::fetch_column`].
    pub fn yield_columns(
        &mut self,
        statement: &str,
        params: impl Into<Params>,
        column: usize,
    ) -> Result<ColumnStream<'_>> {
        Ok(ColumnStream::new(self.yield_all(statement, params)?, column))
    }

    /// Lazy variant of [`Executor::fetch_objects`].
    pub fn yield_objects<T: FromRow>(
        &mut self,
        statement: &str,
        params: impl Into<Params>,
    ) -> Result<ObjectStream<'_, T>> {
        Ok(ObjectStream::new(self.yield_all(statement, params)?))
    }

    /// Lazy variant of [`Executor::fetch_pairs`].
    pub fn yield_pairs(
        &mut self,
        statement: &str,
        params: impl Into<Params>,
    ) -> Result<PairStream<'_>> {
        Ok(PairStream::new(self.yield_all(statement, params)?))
    }

    /// Lazy `(key, remaining row)` variant of [`Executor::fetch_unique`].
    pub fn yield_unique(
        &mut self,
        statement: &str,
        params: impl Into<Params>,
    ) -> Result<UniqueStream<'_>> {
        Ok(UniqueStream::new(self.yield_all(statement, params)?))
    }
}

/// Drain an executed statement eagerly.
///
/// A row-step failure here follows a successful execute, so it is logged
/// and treated as end-of-rows rather than surfaced as a hard failure.
fn drain(mut performed: Performed<'_>) -> Vec<Row> {
    let mut rows = Vec::new();
    loop {
        match performed.next_row() {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => break,
            Err(e) => {
                warn!("fetch after successful execute failed, treating as end of rows: {e}");
                break;
            }
        }
    }
    rows
}
