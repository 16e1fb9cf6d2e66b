//! Structured records handed over by the upstream pipeline.
//!
//! A [`Record`] is either an ordered map of named fields or an ordered
//! sequence of values. Values may nest arbitrarily and strings may carry
//! non-UTF-8 bytes, so [`Value::Bytes`] is kept distinct from
//! [`Value::String`].

use serde::Serialize;
use serde::ser::{self, SerializeMap, SerializeSeq, Serializer};

/// Ordered key/value pairs, preserving the order fields were inserted.
pub type Fields = Vec<(String, Value)>;

/// A single field value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Raw bytes; not necessarily valid UTF-8.
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Map(Fields),
}

/// One event to deliver.
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    Map(Fields),
    Array(Vec<Value>),
}

impl Record {
    /// Start an empty map record.
    pub fn map() -> Self {
        Self::Map(Vec::new())
    }

    /// Append a field to a map record. Array records are returned unchanged.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Self::Map(fields) = &mut self {
            fields.push((key.into(), value.into()));
        }
        self
    }

    /// Build an array record from any sequence of values.
    pub fn array<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Array(values.into_iter().map(Into::into).collect())
    }

    /// Look up the first field named `key` in a map record.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Map(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            Self::Array(_) => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        match record {
            Record::Map(fields) => Self::Map(fields),
            Record::Array(values) => Self::Array(values),
        }
    }
}

fn serialize_fields<S: Serializer>(fields: &Fields, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(fields.len()))?;
    for (k, v) in fields {
        map.serialize_entry(k, v)?;
    }
    map.end()
}

fn serialize_values<S: Serializer>(values: &[Value], serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(values.len()))?;
    for v in values {
        seq.serialize_element(v)?;
    }
    seq.end()
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Nil => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            // JSON has no byte string type; only UTF-8 content survives.
            Self::Bytes(bytes) => match std::str::from_utf8(bytes) {
                Ok(s) => serializer.serialize_str(s),
                Err(err) => Err(<S::Error as ser::Error>::custom(format!(
                    "byte string is not valid UTF-8: {err}"
                ))),
            },
            Self::Array(values) => serialize_values(values, serializer),
            Self::Map(fields) => serialize_fields(fields, serializer),
        }
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Map(fields) => serialize_fields(fields, serializer),
            Self::Array(values) => serialize_values(values, serializer),
        }
    }
}
