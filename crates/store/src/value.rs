//! Stored value types.

use crate::error::{ErrorKind, Result};
use derive_more::Display;
use serde_json::Value as Json;

/// Type tag of a [`Value`], used for type-mismatch reporting and as the
/// on-disk discriminator of the SQLite backend.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    #[display("bool")]
    Bool,
    #[display("int")]
    Int,
    #[display("string")]
    Str,
}
impl ValueKind {
    pub(crate) fn tag(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Str => "string",
        }
    }

    pub(crate) fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "bool" => Some(Self::Bool),
            "int" => Some(Self::Int),
            "string" => Some(Self::Str),
            _ => None,
        }
    }
}

/// A single stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
}
impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Str(_) => ValueKind::Str,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Boolean content of the value stored under `key`, or
    /// [`TypeMismatch`](ErrorKind::TypeMismatch).
    ///
    /// # Examples
    ///
    /// ```
    /// use firstrun_store::Value;
    /// assert!(Value::Bool(true).expect_bool("is_first_run").unwrap());
    /// assert!(Value::Int(1).expect_bool("is_first_run").is_err());
    /// ```
    pub fn expect_bool(&self, key: &str) -> Result<bool> {
        self.as_bool().ok_or_else(|| self.mismatch(key, ValueKind::Bool))
    }

    /// Integer content of the value stored under `key`, or
    /// [`TypeMismatch`](ErrorKind::TypeMismatch).
    pub fn expect_int(&self, key: &str) -> Result<i64> {
        self.as_int().ok_or_else(|| self.mismatch(key, ValueKind::Int))
    }

    fn mismatch(&self, key: &str, expected: ValueKind) -> crate::error::Error {
        exn::Exn::from(ErrorKind::TypeMismatch { key: key.to_string(), expected, found: self.kind() })
    }

    /// Textual encoding used by the SQLite backend: `(kind tag, payload)`.
    pub(crate) fn encode(&self) -> (&'static str, String) {
        let payload = match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Str(s) => s.clone(),
        };
        (self.kind().tag(), payload)
    }

    /// Inverse of [`encode()`](Self::encode). Returns `None` for unknown tags
    /// or payloads that don't parse as their tag says.
    pub(crate) fn decode(tag: &str, payload: &str) -> Option<Self> {
        match ValueKind::from_tag(tag)? {
            ValueKind::Bool => payload.parse().ok().map(Self::Bool),
            ValueKind::Int => payload.parse().ok().map(Self::Int),
            ValueKind::Str => Some(Self::Str(payload.to_string())),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}
impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}
impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}
impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// JSON values that have no [`Value`] counterpart (floats, nulls, arrays,
/// objects) are handed back unchanged.
impl TryFrom<Json> for Value {
    type Error = Json;

    fn try_from(json: Json) -> std::result::Result<Self, Self::Error> {
        match json {
            Json::Bool(b) => Ok(Self::Bool(b)),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Ok(Self::Int(i)),
                None => Err(Json::Number(n)),
            },
            Json::String(s) => Ok(Self::Str(s)),
            other => Err(other),
        }
    }
}
impl From<Value> for Json {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(b) => Json::Bool(b),
            Value::Int(i) => Json::from(i),
            Value::Str(s) => Json::String(s),
        }
    }
}
