//! Statement input types: scalar values, explicit type tags and the
//! positional/named parameter sets bound through `perform`.

use serde::Serialize;

/// A scalar database value.
///
/// This is the common currency on both sides of a statement: parameters are
/// bound as `Value`s and result columns decode back into them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Truthiness used when a value carries an explicit boolean type tag.
    ///
    /// Mirrors loose scalar-to-boolean conversion: zero, empty text, `"0"`
    /// and null are false, everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Real(r) => *r != 0.0,
            Value::Text(s) => !s.is_empty() && s != "0",
            Value::Blob(b) => !b.is_empty(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(r) => Some(*r),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

/// Explicit parameter type tags, numbered as the source constants are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParamType {
    Null,
    Int,
    Str,
    Lob,
    Bool,
}

impl ParamType {
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(ParamType::Null),
            1 => Some(ParamType::Int),
            2 => Some(ParamType::Str),
            3 => Some(ParamType::Lob),
            5 => Some(ParamType::Bool),
            _ => None,
        }
    }
}

/// A value to bind, optionally carrying an explicit type tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundValue {
    pub value: Value,
    pub ty: Option<ParamType>,
}

impl BoundValue {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            ty: None,
        }
    }

    pub fn typed(value: impl Into<Value>, ty: ParamType) -> Self {
        Self {
            value: value.into(),
            ty: Some(ty),
        }
    }

    /// The value as it goes to the driver.
    ///
    /// A value tagged as boolean is coerced to the text `"1"`/`"0"` so that
    /// drivers without a native boolean bind type receive something they can
    /// store.
    pub fn resolve(&self) -> Value {
        match self.ty {
            Some(ParamType::Bool) => {
                Value::Text(if self.value.is_truthy() { "1" } else { "0" }.to_string())
            }
            Some(ParamType::Null) => Value::Null,
            _ => self.value.clone(),
        }
    }
}

impl From<Value> for BoundValue {
    fn from(value: Value) -> Self {
        BoundValue::new(value)
    }
}

macro_rules! bound_value_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for BoundValue {
                fn from(value: $ty) -> Self {
                    BoundValue::new(value)
                }
            }
        )*
    };
}

bound_value_from!(bool, i32, i64, f64, &str, String, Vec<u8>);

/// The parameter set handed to `perform`.
///
/// Positional input is 0-based; the executor shifts it to the 1-based
/// indices drivers expect. Named keys pass through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub enum Params {
    #[default]
    None,
    Positional(Vec<BoundValue>),
    Named(Vec<(String, BoundValue)>),
}

impl Params {
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<BoundValue>,
    {
        Params::Positional(values.into_iter().map(Into::into).collect())
    }

    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<BoundValue>,
    {
        Params::Named(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Params::None => true,
            Params::Positional(v) => v.is_empty(),
            Params::Named(v) => v.is_empty(),
        }
    }
}

impl<V> From<Vec<V>> for Params
where
    V: Into<BoundValue>,
{
    fn from(values: Vec<V>) -> Self {
        Params::positional(values)
    }
}

impl From<()> for Params {
    fn from(_: ()) -> Self {
        Params::None
    }
}

/// Placeholder target at the driver boundary: a 1-based position or a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamTarget<'a> {
    Positional(usize),
    Named(&'a str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_bool_coerces_to_text() {
        let truthy = BoundValue::typed(true, ParamType::Bool);
        assert_eq!(truthy.resolve(), Value::Text("1".to_string()));

        let falsy = BoundValue::typed(0, ParamType::Bool);
        assert_eq!(falsy.resolve(), Value::Text("0".to_string()));
    }

    #[test]
    fn test_untagged_values_bind_natively() {
        let v = BoundValue::new(true);
        assert_eq!(v.resolve(), Value::Bool(true));

        let n = BoundValue::new(42);
        assert_eq!(n.resolve(), Value::Integer(42));
    }

    #[test]
    fn test_param_type_from_i64() {
        assert_eq!(ParamType::from_i64(1), Some(ParamType::Int));
        assert_eq!(ParamType::from_i64(5), Some(ParamType::Bool));
        assert_eq!(ParamType::from_i64(4), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Text(String::new()).is_truthy());
        assert!(!Value::Text("0".to_string()).is_truthy());
        assert!(Value::Text("00".to_string()).is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(Value::Real(0.5).is_truthy());
    }

    #[test]
    fn test_option_into_value() {
        let some: Value = Some("x").into();
        assert_eq!(some, Value::Text("x".to_string()));
        let none: Value = Option::<i64>::None.into();
        assert_eq!(none, Value::Null);
    }
}
