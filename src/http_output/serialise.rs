//! Serialization of records into request bodies.
//!
//! Provides URL-encoded form data (the default) and JSON. Custom formats are
//! supplied through [`RecordFormatter`](crate::formatter::RecordFormatter)
//! and bypass this module entirely.

use std::borrow::Cow;

use serde::Serialize;
use thiserror::Error;

use super::url_encoding::push_pair;
use crate::record::{Fields, Record, Value};

/// Content type used for form-encoded bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
/// Content type used for JSON bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Errors raised while turning a record into a request body.
#[derive(Debug, Error)]
pub enum SerialisationError {
    /// Form encoding only supports map records.
    #[error("form serialisation requires a map record, got an array")]
    FormRequiresMap,
    /// JSON encoding failed, e.g. on a non-UTF-8 byte string.
    #[error("JSON serialisation failed: {0}")]
    Json(#[from] serde_json::Error),
    /// A custom formatter rejected the record.
    #[error("formatter {name:?} failed: {message}")]
    Formatter { name: String, message: String },
}

/// Serialised request body together with its content type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    pub body: Vec<u8>,
    pub content_type: Cow<'static, str>,
}

impl Payload {
    /// Serialise any value as a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`SerialisationError::Json`] when `value` cannot be encoded.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, SerialisationError> {
        Ok(Self {
            body: serde_json::to_vec(value)?,
            content_type: Cow::Borrowed(JSON_CONTENT_TYPE),
        })
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn body_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Serialise a map record to `application/x-www-form-urlencoded`.
///
/// Scalars are stringified (integers in decimal), byte strings are
/// percent-encoded byte-wise, and nested maps or arrays are embedded as their
/// JSON text.
///
/// # Errors
///
/// Returns [`SerialisationError::FormRequiresMap`] for array records and
/// [`SerialisationError::Json`] when a nested value cannot be encoded.
pub fn serialise_form(record: &Record) -> Result<Payload, SerialisationError> {
    let Record::Map(fields) = record else {
        return Err(SerialisationError::FormRequiresMap);
    };
    Ok(Payload {
        body: encode_fields(fields)?.into_bytes(),
        content_type: Cow::Borrowed(FORM_CONTENT_TYPE),
    })
}

fn encode_fields(fields: &Fields) -> Result<String, SerialisationError> {
    let mut body = String::new();
    for (key, value) in fields {
        let rendered = form_value(value)?;
        push_pair(&mut body, key, &rendered);
    }
    Ok(body)
}

fn form_value(value: &Value) -> Result<Cow<'_, [u8]>, SerialisationError> {
    let rendered = match value {
        Value::Nil => Cow::Borrowed(&[][..]),
        Value::Bool(b) => Cow::Owned(b.to_string().into_bytes()),
        Value::Integer(i) => Cow::Owned(i.to_string().into_bytes()),
        Value::Float(f) => Cow::Owned(f.to_string().into_bytes()),
        Value::String(s) => Cow::Borrowed(s.as_bytes()),
        Value::Bytes(bytes) => Cow::Borrowed(bytes.as_slice()),
        nested @ (Value::Array(_) | Value::Map(_)) => Cow::Owned(serde_json::to_vec(nested)?),
    };
    Ok(rendered)
}

/// Serialise a record (map or array) to UTF-8 JSON.
///
/// Multi-byte text is written as-is rather than `\u` escaped.
///
/// # Errors
///
/// Returns [`SerialisationError::Json`] when serialization fails.
pub fn serialise_json(record: &Record) -> Result<Payload, SerialisationError> {
    Payload::json(record)
}
