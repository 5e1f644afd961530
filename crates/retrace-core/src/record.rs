//! Tracked record model.
//!
//! Retrace observes records owned by the host application. A record is held as
//! a JSON object so diffs and snapshots work uniformly across record types.
//! The only field Retrace requires is a stable `id`.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::CoreError;

/// A tracked record's state as a JSON object.
pub type Record = Map<String, Value>;

/// Field holding a record's identifier.
pub const ID_FIELD: &str = "id";

/// Identifier of a tracked record.
///
/// Host records use either integer or string keys. Serializes untagged, so
/// `RecordId::Int(1)` is `1` and `RecordId::Text("a".into())` is `"a"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    /// Interpret a JSON value as an identifier.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::MissingId` for `null`, `CoreError::InvalidRecord`
    /// for floats, booleans, arrays and objects.
    pub fn from_value(value: &Value) -> Result<Self, CoreError> {
        match value {
            Value::Null => Err(CoreError::MissingId),
            Value::Number(n) => n.as_i64().map(Self::Int).ok_or_else(|| {
                CoreError::InvalidRecord(format!("id {n} is not an integer"))
            }),
            Value::String(s) => Ok(Self::Text(s.clone())),
            other => Err(CoreError::InvalidRecord(format!(
                "id must be an integer or a string, got {other}"
            ))),
        }
    }

    /// Parse a command-line argument: integers first, anything else as text.
    #[must_use]
    pub fn from_arg(arg: &str) -> Self {
        arg.parse::<i64>()
            .map_or_else(|_| Self::Text(arg.to_string()), Self::Int)
    }

    /// The identifier as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(i) => Value::from(*i),
            Self::Text(s) => Value::String(s.clone()),
        }
    }

    /// Storage key for the `origin` column.
    ///
    /// JSON-encoded so that `1` and `"1"` never collide.
    #[must_use]
    pub fn to_storage_key(&self) -> String {
        self.to_value().to_string()
    }

    /// Inverse of [`RecordId::to_storage_key`].
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidRecord` if the key is not valid JSON or not
    /// an integer/string.
    pub fn from_storage_key(key: &str) -> Result<Self, CoreError> {
        let value: Value = serde_json::from_str(key)
            .map_err(|e| CoreError::InvalidRecord(format!("bad origin key '{key}': {e}")))?;
        Self::from_value(&value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A host type whose updates are tracked.
///
/// `TYPE_NAME` is the registration name; it is lower-cased on registration.
pub trait Tracked: Serialize {
    const TYPE_NAME: &'static str;
}

/// Read the identifier of a record.
///
/// # Errors
///
/// Returns `CoreError::MissingId` when `id` is absent or null, and
/// `CoreError::InvalidRecord` when it has an unsupported type.
pub fn record_id(record: &Record) -> Result<RecordId, CoreError> {
    record
        .get(ID_FIELD)
        .map_or(Err(CoreError::MissingId), RecordId::from_value)
}

/// Serialize a host value into a `Record`.
///
/// # Errors
///
/// Returns `CoreError::InvalidRecord` if the value does not serialize to a
/// JSON object.
pub fn to_record<T: Serialize>(value: &T) -> Result<Record, CoreError> {
    match serde_json::to_value(value).map_err(|e| CoreError::InvalidRecord(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(CoreError::InvalidRecord(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Interpret an arbitrary JSON value as a record.
///
/// # Errors
///
/// Returns `CoreError::InvalidRecord` for non-object values.
pub fn value_to_record(value: Value) -> Result<Record, CoreError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CoreError::InvalidRecord(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}
