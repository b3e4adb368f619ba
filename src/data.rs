use std::{fmt, sync::Arc};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::{error::SourceError, record::Group};

/// Capability of a value that knows how to render itself as a plain
/// driver-level value, typically text.
pub trait StorableValue: fmt::Debug + Send + Sync {
    fn to_storable(&self) -> Result<RawValue, SourceError>;
}

/// A cell exactly as the data source produced it.
#[derive(Debug, Clone)]
pub enum RawValue {
    Null,
    /// Untyped wire form; parsed during inference and materialization.
    Bytes(Vec<u8>),
    /// Native string. Never parsed into another type.
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Uuid(Uuid),
    Custom(Arc<dyn StorableValue>),
}

impl RawValue {
    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        RawValue::Bytes(value.into())
    }

    pub fn text(value: impl Into<String>) -> Self {
        RawValue::Text(value.into())
    }

    pub fn custom<T: StorableValue + 'static>(value: T) -> Self {
        RawValue::Custom(Arc::new(value))
    }

    /// Resolves [`RawValue::Custom`] through its storable conversion. The
    /// conversion must yield a plain value; a second custom value is an error.
    pub fn resolve(self) -> Result<RawValue, SourceError> {
        match self {
            RawValue::Custom(inner) => match inner.to_storable()? {
                RawValue::Custom(nested) => Err(format!(
                    "storable conversion of {inner:?} returned another custom value {nested:?}"
                )
                .into()),
                plain => Ok(plain),
            },
            plain => Ok(plain),
        }
    }

    /// Textual rendering for native values outside the inferable set.
    pub(crate) fn native_display(&self) -> Option<String> {
        match self {
            RawValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            RawValue::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            RawValue::Uuid(g) => Some(g.to_string()),
            _ => None,
        }
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        RawValue::Integer(i64::from(value))
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Float(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Boolean(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawValue::Null)
    }
}

/// A stored field value inside a [`crate::record::Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    Group(Group),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Text(s) => s.clone(),
            Value::Group(group) => serde_json::to_string(group).unwrap_or_default(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Value::Group(group) => Some(group),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Group(group) => group.serialize(serializer),
        }
    }
}

pub fn parse_int_literal(value: &str) -> Option<i64> {
    value.parse::<i64>().ok()
}

pub fn parse_float_literal(value: &str) -> Option<f64> {
    value.parse::<f64>().ok()
}

/// Accepts `true` / `false` in any letter case.
pub fn parse_bool_literal(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// First character upper-cased, remainder untouched. Field keys and accessor
/// path segments both go through this before comparison.
pub fn canonical_field_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn decode_blob(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
