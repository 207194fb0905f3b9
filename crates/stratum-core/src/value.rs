//! Dynamic field values.

use crate::hashkey::HashKey;
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A dynamically-typed field value.
///
/// This enum represents every value a mapped record field can hold,
/// including relationship payloads. Scalar variants cover the storable
/// datatypes; `Record`, `Ref`, and `Collection` carry foreign-key fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absent value
    Null,

    /// Boolean value
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit floating point
    Float(f64),

    /// Text string (short or long)
    Text(String),

    /// Timestamp (microseconds since epoch)
    Timestamp(i64),

    /// Enumeration value, as an index into the column datatype's variant list
    Enum(u32),

    /// Opaque serialized object payload
    Opaque(serde_json::Value),

    /// An embedded referenced record (one-to-one field as authored in memory)
    Record(Box<Record>),

    /// A reference materialized from storage as the referenced row's hashkey
    Ref(HashKey),

    /// One-to-many field payload
    Collection(Vec<Record>),
}

impl Value {
    /// Check if this value is null.
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the type name of this value.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::Int(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::Text(_) => "TEXT",
            Value::Timestamp(_) => "TIMESTAMP",
            Value::Enum(_) => "ENUM",
            Value::Opaque(_) => "OPAQUE",
            Value::Record(_) => "RECORD",
            Value::Ref(_) => "REF",
            Value::Collection(_) => "COLLECTION",
        }
    }

    /// Try to convert this value to a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Try to convert this value to an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Timestamp(v) => Some(*v),
            Value::Enum(v) => Some(i64::from(*v)),
            Value::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Try to convert this value to an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to view this value as an embedded record.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// The literal string form of this value, used when folding unmapped
    /// field values into an identity digest and when rendering logs.
    pub fn literal_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Text(s) => s.clone(),
            Value::Timestamp(v) => v.to_string(),
            Value::Enum(v) => v.to_string(),
            Value::Opaque(j) => j.to_string(),
            Value::Record(r) => format!("<{}>", r.class_name()),
            Value::Ref(key) => key.to_string(),
            Value::Collection(items) => format!("<collection:{}>", items.len()),
        }
    }

    /// Compare two values under the evaluation contract shared by all
    /// backends.
    ///
    /// Same-family values compare naturally: numeric variants cross-width,
    /// text lexically, booleans false-before-true, timestamps and enum
    /// indexes numerically. `Null` is equal only to `Null` and unordered
    /// against everything else. Values of unrelated families are unordered,
    /// which makes every comparator evaluate to no-match.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Enum(a), Value::Enum(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Ref(a), Value::Ref(b)) => Some(a.cmp(b)),
            (Value::Opaque(a), Value::Opaque(b)) => (a == b).then_some(Ordering::Equal),
            (Value::Record(a), Value::Record(b)) => (a == b).then_some(Ordering::Equal),
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
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
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

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(Box::new(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
