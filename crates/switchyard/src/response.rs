//! Response encoding for the JSONL transport.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorObject;
use crate::request::JSONRPC_VERSION;

/// A JSON-RPC 2.0 response carrying either a result or an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Protocol version marker, always `"2.0"`.
    pub jsonrpc: String,
    /// Id echoed from the request, or `null` when it could not be read.
    pub id: Value,
    /// Result of a successful dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error of a failed dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl RpcResponse {
    /// Creates a success response.
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: String::from(JSONRPC_VERSION),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Creates an error response.
    #[must_use]
    pub fn failure(id: Value, error: ErrorObject) -> Self {
        Self {
            jsonrpc: String::from(JSONRPC_VERSION),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Returns `true` when the response carries an error.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Writer that frames responses as JSONL.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Creates a writer over the given output stream.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one response line and flushes the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_response(&mut self, response: &RpcResponse) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, response)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    /// Consumes the writer, returning the underlying stream.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
