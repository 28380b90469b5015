//! Line-oriented front end serving JSON-RPC over a byte stream.
//!
//! [`serve`] reads one request per line, dispatches it through a
//! [`BaseHandler`] and writes one response per line until the input ends.
//! Lines are bounded to [`MAX_REQUEST_BYTES`]; an oversized line is consumed
//! and answered with an invalid-request error so the stream stays in sync.
//! Notifications are dispatched but never answered.

use std::io::{self, BufRead, Read, Write};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::ErrorObject;
use crate::handler::BaseHandler;
use crate::request::RpcRequest;
use crate::response::{ResponseWriter, RpcResponse};

/// Tracing target for the stream front end.
const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// Maximum size of a single request line in bytes.
pub const MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Failures that stop the serve loop.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Reading a request line failed.
    #[error("failed to read request: {0}")]
    Read(#[source] io::Error),
    /// Writing a response failed.
    #[error("failed to write response: {0}")]
    Write(#[source] io::Error),
}

/// Counters describing a finished serve loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServeSummary {
    /// Request lines read, excluding blank lines.
    pub requests: usize,
    /// Responses written.
    pub responses: usize,
}

enum Line {
    Complete(Vec<u8>),
    Oversized(usize),
    Eof,
}

/// Serves requests from `input` until it is exhausted.
///
/// # Errors
///
/// Returns a [`ServerError`] when the input cannot be read or a response
/// cannot be written. Protocol-level failures are answered in-band.
pub fn serve<R, W>(mut input: R, output: W, handler: &BaseHandler) -> Result<ServeSummary, ServerError>
where
    R: BufRead,
    W: Write,
{
    let mut writer = ResponseWriter::new(output);
    let mut summary = ServeSummary::default();
    info!(target: SERVER_TARGET, "serving requests");

    loop {
        let response = match read_request_line(&mut input).map_err(ServerError::Read)? {
            Line::Eof => break,
            Line::Oversized(size) => {
                summary.requests += 1;
                warn!(
                    target: SERVER_TARGET,
                    size,
                    limit = MAX_REQUEST_BYTES,
                    "request exceeds size limit"
                );
                Some(RpcResponse::failure(
                    Value::Null,
                    ErrorObject::invalid_request().with_detail(
                        "reason",
                        Value::from(format!("request exceeds {MAX_REQUEST_BYTES} bytes")),
                    ),
                ))
            }
            Line::Complete(bytes) => {
                if bytes.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                summary.requests += 1;
                respond(&bytes, handler)
            }
        };

        if let Some(response) = response {
            writer.write_response(&response).map_err(ServerError::Write)?;
            summary.responses += 1;
        }
    }

    info!(
        target: SERVER_TARGET,
        requests = summary.requests,
        responses = summary.responses,
        "input exhausted"
    );
    Ok(summary)
}

fn respond(line: &[u8], handler: &BaseHandler) -> Option<RpcResponse> {
    let request = match RpcRequest::parse(line) {
        Ok(request) => request,
        Err(error) => {
            warn!(target: SERVER_TARGET, %error, "malformed request");
            return Some(RpcResponse::failure(Value::Null, error.to_error_object()));
        }
    };

    let response = handler.handle_request(&request);
    if request.is_notification() {
        debug!(
            target: SERVER_TARGET,
            method = %request.method,
            "notification handled without response"
        );
        return None;
    }
    Some(response)
}

/// Reads one newline-terminated line, bounded to [`MAX_REQUEST_BYTES`].
fn read_request_line<R: BufRead>(input: &mut R) -> io::Result<Line> {
    let mut buffer = Vec::new();
    let limit = u64::try_from(MAX_REQUEST_BYTES + 1).unwrap_or(u64::MAX);
    let read = input.by_ref().take(limit).read_until(b'\n', &mut buffer)?;
    if read == 0 {
        return Ok(Line::Eof);
    }
    if buffer.len() > MAX_REQUEST_BYTES && buffer.last() != Some(&b'\n') {
        let discarded = discard_line(input)?;
        return Ok(Line::Oversized(buffer.len() + discarded));
    }
    Ok(Line::Complete(buffer))
}

/// Skips the remainder of the current line without buffering it.
fn discard_line<R: BufRead>(input: &mut R) -> io::Result<usize> {
    let mut discarded = 0;
    loop {
        let available = match input.fill_buf() {
            Ok(available) => available,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        };
        if available.is_empty() {
            return Ok(discarded);
        }
        match available.iter().position(|byte| *byte == b'\n') {
            Some(position) => {
                input.consume(position + 1);
                return Ok(discarded + position + 1);
            }
            None => {
                let length = available.len();
                input.consume(length);
                discarded += length;
            }
        }
    }
}
