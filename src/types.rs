//! Data types for the key-value client

use serde::de::DeserializeOwned;

use crate::error::Result;

/// Outcome of decoding a stored value.
///
/// Values written through this client are stored as JSON-serialized text,
/// but the remote store may also hold legacy values that were written as
/// plain unquoted strings. Decoding therefore never fails: text that does
/// not parse as JSON passes through as [`Value::Raw`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The stored text parsed as JSON.
    Json(serde_json::Value),
    /// The stored text verbatim; it was not valid JSON.
    Raw(String),
}

impl Value {
    /// Decode the raw text of a stored value.
    pub fn decode(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(json) => Value::Json(json),
            Err(_) => Value::Raw(raw.to_string()),
        }
    }

    /// Deserialize the value into a concrete type.
    ///
    /// Raw (non-JSON) values deserialize as if they were JSON strings, so
    /// `to_typed::<String>()` works for both variants.
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T> {
        let json = match self {
            Value::Json(json) => json.clone(),
            Value::Raw(raw) => serde_json::Value::String(raw.clone()),
        };
        Ok(serde_json::from_value(json)?)
    }

    /// The value as a string slice, if it is a JSON string or raw text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Json(serde_json::Value::String(s)) => Some(s),
            Value::Raw(s) => Some(s),
            Value::Json(_) => None,
        }
    }

    /// Returns true if the stored text did not parse as JSON.
    pub fn is_raw(&self) -> bool {
        matches!(self, Value::Raw(_))
    }
}
