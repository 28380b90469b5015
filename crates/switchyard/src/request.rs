//! Request decoding for the JSONL transport.
//!
//! Each line carries one JSON-RPC 2.0 request object. Decoding distinguishes
//! text that is not JSON at all from JSON that is not a usable request, since
//! the two map to different protocol error codes.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::error::ErrorObject;

/// Protocol version accepted in the `jsonrpc` member.
pub const JSONRPC_VERSION: &str = "2.0";

/// Failures decoding a request line.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The line contained nothing but whitespace.
    #[error("empty request line")]
    Empty,
    /// The line is not valid JSON.
    #[error("malformed JSON: {0}")]
    Parse(#[source] serde_json::Error),
    /// The line is JSON but not a valid request object.
    #[error("invalid request: {message}")]
    Invalid {
        /// Description of the problem.
        message: String,
    },
}

impl RequestError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Protocol error object reported to the client.
    #[must_use]
    pub fn to_error_object(&self) -> ErrorObject {
        match self {
            Self::Empty | Self::Parse(_) => ErrorObject::parse_error(),
            Self::Invalid { message } => {
                ErrorObject::invalid_request().with_detail("reason", Value::from(message.as_str()))
            }
        }
    }
}

/// A decoded JSON-RPC request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcRequest {
    /// Protocol version marker; `"2.0"` when present.
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Correlation id; absent for notifications. An explicit `null` id is
    /// kept as `Some(Value::Null)` and still answered.
    #[serde(default, deserialize_with = "present_id")]
    pub id: Option<Value>,
    /// Action name to dispatch.
    pub method: String,
    /// Raw parameters; absent and `null` are equivalent.
    #[serde(default)]
    pub params: Option<Value>,
}

impl RpcRequest {
    /// Creates a request for `method` with the given id and parameters.
    pub fn new(method: impl Into<String>, id: Option<Value>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: Some(String::from(JSONRPC_VERSION)),
            id,
            method: method.into(),
            params,
        }
    }

    /// Decodes a JSONL request line.
    ///
    /// Trailing whitespace, including the newline delimiter, is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Empty`] or [`RequestError::Parse`] when the
    /// line is blank or not JSON, and [`RequestError::Invalid`] when it does
    /// not describe a request object.
    pub fn parse(line: &[u8]) -> Result<Self, RequestError> {
        let trimmed = trim_trailing_whitespace(line);
        if trimmed.is_empty() {
            return Err(RequestError::Empty);
        }

        let value: Value = serde_json::from_slice(trimmed).map_err(RequestError::Parse)?;
        if value.is_array() {
            return Err(RequestError::invalid("batch requests are not supported"));
        }
        if !value.is_object() {
            return Err(RequestError::invalid("request must be a JSON object"));
        }

        let request: Self =
            serde_json::from_value(value).map_err(|error| RequestError::invalid(error.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    /// Returns `true` when the request expects no response.
    #[must_use]
    pub const fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    fn validate(&self) -> Result<(), RequestError> {
        if let Some(version) = &self.jsonrpc
            && version != JSONRPC_VERSION
        {
            return Err(RequestError::invalid(format!(
                "unsupported protocol version '{version}'"
            )));
        }
        if self.method.trim().is_empty() {
            return Err(RequestError::invalid("method is empty"));
        }
        match &self.id {
            None | Some(Value::Null | Value::String(_) | Value::Number(_)) => Ok(()),
            Some(_) => Err(RequestError::invalid("id must be a string, number or null")),
        }
    }
}

/// Marks a present `id` member as `Some`, even when its value is `null`.
fn present_id<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn trim_trailing_whitespace(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|byte| !byte.is_ascii_whitespace())
        .map_or(0, |position| position + 1);
    bytes.get(..end).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_named_request() {
        let request = RpcRequest::parse(
            br#"{"jsonrpc":"2.0","id":1,"method":"add","params":{"a":2,"b":3}}"#,
        )
        .expect("parse request");
        assert_eq!(request.method, "add");
        assert_eq!(request.id, Some(json!(1)));
        assert_eq!(request.params, Some(json!({"a": 2, "b": 3})));
        assert!(!request.is_notification());
    }

    #[test]
    fn trailing_newline_is_ignored() {
        let request =
            RpcRequest::parse(b"{\"id\":\"x\",\"method\":\"ping\"}\r\n").expect("parse request");
        assert_eq!(request.method, "ping");
        assert_eq!(request.params, None);
    }

    #[test]
    fn request_without_id_is_a_notification() {
        let request = RpcRequest::parse(br#"{"method":"ping"}"#).expect("parse request");
        assert!(request.is_notification());
    }

    #[test]
    fn null_id_is_not_a_notification() {
        let request =
            RpcRequest::parse(br#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).expect("parse request");
        assert_eq!(request.id, Some(Value::Null));
        assert!(!request.is_notification());
    }

    #[rstest]
    #[case::empty(b"   \n".as_slice())]
    #[case::garbage(b"not json".as_slice())]
    fn unreadable_lines_are_parse_errors(#[case] line: &[u8]) {
        let error = RpcRequest::parse(line).expect_err("line must fail");
        assert_eq!(error.to_error_object().code, ErrorObject::PARSE_ERROR);
    }

    #[rstest]
    #[case::batch(br#"[{"id":1,"method":"add"}]"#.as_slice())]
    #[case::scalar(b"42".as_slice())]
    #[case::missing_method(br#"{"id":1}"#.as_slice())]
    #[case::blank_method(br#"{"id":1,"method":"  "}"#.as_slice())]
    #[case::wrong_version(br#"{"jsonrpc":"1.0","id":1,"method":"add"}"#.as_slice())]
    #[case::object_id(br#"{"id":{"n":1},"method":"add"}"#.as_slice())]
    fn unusable_objects_are_invalid_requests(#[case] line: &[u8]) {
        let error = RpcRequest::parse(line).expect_err("line must fail");
        assert_eq!(error.to_error_object().code, ErrorObject::INVALID_REQUEST);
    }
}
