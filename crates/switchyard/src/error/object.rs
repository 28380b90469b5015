//! Client-facing error objects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ErrorKind;

/// A structured, serializable error safe to hand to the transport.
///
/// The shape matches the JSON-RPC 2.0 error object. Built-in factories always
/// record the failure category under `data.kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Numeric error code.
    pub code: i64,
    /// Short description safe for clients.
    pub message: String,
    /// Optional structured detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i64 = -32700;
    /// The JSON sent is not a valid request object.
    pub const INVALID_REQUEST: i64 = -32600;
    /// The action does not exist.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Invalid action parameters.
    pub const INVALID_PARAMS: i64 = -32602;
    /// Internal dispatcher error.
    pub const INTERNAL_ERROR: i64 = -32603;
    /// Application-defined failure surfaced on purpose.
    pub const APPLICATION_ERROR: i64 = -32000;

    /// Creates an error object without data.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse_error() -> Self {
        Self::new(Self::PARSE_ERROR, "parse error")
    }

    /// Creates an invalid-request error.
    #[must_use]
    pub fn invalid_request() -> Self {
        Self::new(Self::INVALID_REQUEST, "invalid request")
    }

    /// Creates an action-not-found error.
    #[must_use]
    pub fn method_not_found() -> Self {
        Self::new(Self::METHOD_NOT_FOUND, "action not found")
    }

    /// Creates an invalid-params error.
    #[must_use]
    pub fn invalid_params() -> Self {
        Self::new(Self::INVALID_PARAMS, "invalid params")
    }

    /// Creates the generic internal error used for unclassified failures.
    ///
    /// The result carries only the `internal` kind marker.
    #[must_use]
    pub fn internal_error() -> Self {
        Self::new(Self::INTERNAL_ERROR, "internal error").with_kind(ErrorKind::Internal)
    }

    /// Replaces the structured detail.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Records `kind` under `data.kind`, creating the data object if needed.
    #[must_use]
    pub fn with_kind(self, kind: ErrorKind) -> Self {
        self.with_detail("kind", Value::from(kind.as_str()))
    }

    /// Inserts one field into the data object, creating it if needed.
    ///
    /// Non-object data is preserved under `data.value`.
    #[must_use]
    pub fn with_detail(mut self, key: &str, value: Value) -> Self {
        let mut map = match self.data.take() {
            Some(Value::Object(map)) => map,
            Some(other) => {
                let mut map = serde_json::Map::new();
                map.insert(String::from("value"), other);
                map
            }
            None => serde_json::Map::new(),
        };
        map.insert(key.to_owned(), value);
        self.data = Some(Value::Object(map));
        self
    }

    /// Reads the failure category recorded under `data.kind`.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.data.as_ref()?.get("kind")?.as_str()
    }

    /// Reads one field of the data object.
    #[must_use]
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.data.as_ref()?.get(key)
    }
}
