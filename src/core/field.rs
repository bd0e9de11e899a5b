//! Structured key/value fields attached to log entries
//!
//! This module provides:
//! - `FieldValue`: the value carried by a field
//! - `Field`: one key/value pair, order-preserving inside an entry
//! - `with`, `with_error`, `with_serde`: field constructors

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// Prefix for fields whose key collides with a reserved element
pub const RESERVED_FIELD_PREFIX: &str = "fields.";

/// Value type for structured logging fields
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Json(serde_json::Value),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::UInt(u) => write!(f, "{}", u),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Json(v) => write!(f, "{}", v),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl FieldValue {
    /// Convert to serde_json::Value for JSON serialization
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Int(i) => serde_json::Value::Number((*i).into()),
            FieldValue::UInt(u) => serde_json::Value::Number((*u).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Json(v) => v.clone(),
            FieldValue::Null => serde_json::Value::Null,
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        FieldValue::String(s.clone())
    }
}

macro_rules! impl_from_signed {
    ($($ty:ty),*) => {
        $(impl From<$ty> for FieldValue {
            fn from(i: $ty) -> Self {
                FieldValue::Int(i64::from(i))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($ty:ty),*) => {
        $(impl From<$ty> for FieldValue {
            fn from(u: $ty) -> Self {
                FieldValue::UInt(u64::from(u))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<usize> for FieldValue {
    fn from(u: usize) -> Self {
        FieldValue::UInt(u as u64)
    }
}

impl From<f32> for FieldValue {
    fn from(f: f32) -> Self {
        FieldValue::Float(f64::from(f))
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(v: serde_json::Value) -> Self {
        FieldValue::Json(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

/// A single structured field
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: FieldValue,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Build a generic key/value field
///
/// # Example
///
/// ```
/// use teelog::{with, FieldValue};
///
/// let field = with("foo", "bar");
/// assert_eq!(field.key, "foo");
/// assert_eq!(field.value, FieldValue::String("bar".to_string()));
/// ```
pub fn with(key: impl Into<String>, value: impl Into<FieldValue>) -> Field {
    Field::new(key, value)
}

/// Build a field named `error` carrying the error's message
///
/// # Example
///
/// ```
/// use teelog::with_error;
///
/// let err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
/// let field = with_error(&err);
/// assert_eq!(field.key, "error");
/// assert_eq!(field.value.to_string(), "disk on fire");
/// ```
pub fn with_error<E: std::error::Error + ?Sized>(err: &E) -> Field {
    Field::new("error", err.to_string())
}

/// Build a field from any serializable value
///
/// Values that fail to serialize are recorded as their error message.
pub fn with_serde<T: Serialize + ?Sized>(key: impl Into<String>, value: &T) -> Field {
    let value = serde_json::to_value(value)
        .map(FieldValue::Json)
        .unwrap_or_else(|e| FieldValue::String(format!("<unserializable: {}>", e)));
    Field {
        key: key.into(),
        value,
    }
}

/// Key under which a field is written next to the entry's own elements
///
/// A field named like a reserved element is written as `fields.<key>` so it
/// never replaces the entry's level, message or caller.
pub(crate) fn field_key<'a>(key: &'a str, reserved: &[&str]) -> Cow<'a, str> {
    if reserved.contains(&key) {
        Cow::Owned(format!("{}{}", RESERVED_FIELD_PREFIX, key))
    } else {
        Cow::Borrowed(key)
    }
}
