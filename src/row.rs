//! Result rows and the map-key form of a column value.

use indexmap::IndexMap;

use crate::types::Value;

/// One result row: an insertion-ordered mapping from column name to value.
///
/// Rows are built fresh by every fetch shape and never mutated in place. An
/// empty row is the "no rows matched" result of `fetch_one`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: IndexMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row by zipping column names with decoded values.
    ///
    /// Duplicate column names keep the last value, matching the associative
    /// row semantics of the source drivers.
    pub fn from_parts(names: &[String], values: Vec<Value>) -> Self {
        let mut columns = IndexMap::with_capacity(names.len());
        for (name, value) in names.iter().zip(values) {
            columns.insert(name.clone(), value);
        }
        Self { columns }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.get(name)
    }

    /// Positional access in column order.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.columns.get_index(index).map(|(_, v)| v)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The first column as a map key, for the keyed fetch shapes.
    pub fn key(&self) -> Key {
        match self.get_index(0) {
            Some(value) => Key::from_value(value),
            None => Key::Str(String::new()),
        }
    }

    /// Split into the first-column key and a fresh row holding the
    /// remaining columns.
    pub fn split_key(&self) -> (Key, Row) {
        let key = self.key();
        let rest = self
            .columns
            .iter()
            .skip(1)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        (key, Row { columns: rest })
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Row {
            columns: iter.into_iter().collect(),
        }
    }
}

/// The integer-or-text form a column value takes when used as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Integer(n) => Key::Int(*n),
            Value::Bool(b) => Key::Int(i64::from(*b)),
            Value::Text(s) => Key::Str(s.clone()),
            Value::Real(r) => Key::Str(r.to_string()),
            Value::Null => Key::Str(String::new()),
            Value::Blob(b) => Key::Str(String::from_utf8_lossy(b).into_owned()),
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{n}"),
            Key::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Int(v)
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Str(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Row {
        Row::from_parts(
            &["id".to_string(), "name".to_string()],
            vec![Value::Integer(7), Value::Text("ada".to_string())],
        )
    }

    #[test]
    fn test_ordered_access() {
        let row = sample();
        assert_eq!(row.get("name"), Some(&Value::Text("ada".to_string())));
        assert_eq!(row.get_index(0), Some(&Value::Integer(7)));
        assert_eq!(row.column_names().collect::<Vec<_>>(), vec!["id", "name"]);
    }

    #[test]
    fn test_split_key() {
        let (key, rest) = sample().split_key();
        assert_eq!(key, Key::Int(7));
        assert_eq!(rest.len(), 1);
        assert_eq!(rest.get("name"), Some(&Value::Text("ada".to_string())));
    }

    #[test]
    fn test_empty_row() {
        let row = Row::new();
        assert!(row.is_empty());
        assert_eq!(row.key(), Key::Str(String::new()));
    }
}
