//! Coercion of raw request values into declared parameter kinds.

use serde_json::{Number, Value};

use super::signature::ParameterKind;

/// Converts `value` into `kind`, returning the original value on failure so
/// the caller can describe what it received.
pub(super) fn coerce(kind: ParameterKind, value: Value) -> Result<Value, Value> {
    match (kind, value) {
        (ParameterKind::Any, value) => Ok(value),
        (ParameterKind::Boolean, Value::Bool(flag)) => Ok(Value::Bool(flag)),
        (ParameterKind::Boolean, Value::String(text)) => parse_bool(&text)
            .map(Value::Bool)
            .ok_or(Value::String(text)),
        (ParameterKind::Integer, Value::Number(number)) if number.is_i64() || number.is_u64() => {
            Ok(Value::Number(number))
        }
        (ParameterKind::Integer, Value::String(text)) => parse_integer(&text)
            .map(Value::Number)
            .ok_or(Value::String(text)),
        (ParameterKind::Number, Value::Number(number)) => Ok(Value::Number(number)),
        (ParameterKind::Number, Value::String(text)) => parse_integer(&text)
            .or_else(|| parse_float(&text))
            .map(Value::Number)
            .ok_or(Value::String(text)),
        (ParameterKind::String, Value::String(text)) => Ok(Value::String(text)),
        (ParameterKind::String, Value::Number(number)) => Ok(Value::String(number.to_string())),
        (ParameterKind::String, Value::Bool(flag)) => Ok(Value::String(flag.to_string())),
        (ParameterKind::Array, value @ Value::Array(_))
        | (ParameterKind::Object, value @ Value::Object(_)) => Ok(value),
        (_, other) => Err(other),
    }
}

/// Names the JSON type of a value for error messages.
pub(super) const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_integer(text: &str) -> Option<Number> {
    let trimmed = text.trim();
    trimmed
        .parse::<i64>()
        .map(Number::from)
        .or_else(|_| trimmed.parse::<u64>().map(Number::from))
        .ok()
}

fn parse_float(text: &str) -> Option<Number> {
    text.trim()
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
}
