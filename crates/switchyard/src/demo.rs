//! Demonstration actions served by the binary.

use std::sync::Arc;

use serde_json::{Value, json};

use switchyard::{
    ApplicationError, Arguments, CallableLoader, DispatchError, ErrorObject, MethodDescriptor,
    ParameterDescriptor, ParameterKind, PublicError, Service, ServiceLoader, Signature,
    extract_response,
};

/// Checked integer arithmetic, exposed as `calc.*`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Calculator;

fn operands() -> Signature {
    Signature::new()
        .with(
            ParameterDescriptor::required("a", ParameterKind::Integer)
                .with_description("left operand"),
        )
        .with(
            ParameterDescriptor::required("b", ParameterKind::Integer)
                .with_description("right operand"),
        )
}

fn overflow() -> DispatchError {
    ApplicationError::from(
        PublicError::new(ErrorObject::APPLICATION_ERROR, "arithmetic overflow")
            .with_data(json!({"kind": "overflow"})),
    )
    .into()
}

impl Service for Calculator {
    fn name(&self) -> &str {
        "calc"
    }

    fn methods(&self) -> Vec<MethodDescriptor> {
        vec![
            MethodDescriptor::new("add", operands()).with_summary("Adds two integers."),
            MethodDescriptor::new("subtract", operands()).with_summary("Subtracts b from a."),
            MethodDescriptor::new("multiply", operands()).with_summary("Multiplies two integers."),
        ]
    }

    fn call(&self, method: &str, arguments: &Arguments) -> Result<Value, DispatchError> {
        let a: i64 = arguments.get("a")?;
        let b: i64 = arguments.get("b")?;
        let outcome = match method {
            "add" => a.checked_add(b),
            "subtract" => a.checked_sub(b),
            "multiply" => a.checked_mul(b),
            other => return Err(DispatchError::unresolvable(format!("calc.{other}"))),
        };
        outcome.map_or_else(|| Err(overflow()), extract_response)
    }
}

/// Largest reply `echo` will build, in bytes.
pub const MAX_ECHO_BYTES: usize = 64 * 1024;

fn echo_too_large() -> ApplicationError {
    PublicError::new(ErrorObject::APPLICATION_ERROR, "echo output too large")
        .with_data(json!({"kind": "too_large", "limit": MAX_ECHO_BYTES}))
        .into()
}

/// Loader for the closure-backed demo actions.
pub fn callables() -> CallableLoader {
    let mut loader = CallableLoader::new();
    loader.add(
        "echo",
        Signature::new()
            .with(ParameterDescriptor::required("message", ParameterKind::String))
            .with(
                ParameterDescriptor::optional("times", ParameterKind::Integer)
                    .with_default(json!(1))
                    .with_description("number of repetitions"),
            ),
        |arguments: &Arguments| -> Result<String, ApplicationError> {
            let message: String = arguments.get("message")?;
            let times: usize = arguments.get("times")?;
            let within_limit = message
                .len()
                .checked_mul(times)
                .is_some_and(|length| length <= MAX_ECHO_BYTES);
            if !within_limit {
                return Err(echo_too_large());
            }
            Ok(message.repeat(times))
        },
    );
    loader
}

/// Loader for the demo services.
pub fn services() -> ServiceLoader {
    ServiceLoader::new().with_service(Arc::new(Calculator))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;
    use switchyard::{HandlerBuilder, Params};

    use super::*;

    fn named(value: Value) -> Params {
        Params::from_value(Some(value)).expect("params")
    }

    #[rstest]
    #[case::add("calc.add", json!({"a": 2, "b": 3}), json!(5))]
    #[case::subtract("calc.subtract", json!([7, 2]), json!(5))]
    #[case::multiply("calc.multiply", json!({"a": "4", "b": 3}), json!(12))]
    #[case::echo("echo", json!({"message": "ab", "times": 2}), json!("abab"))]
    #[case::echo_default("echo", json!({"message": "ab"}), json!("ab"))]
    fn demo_actions_dispatch(#[case] action: &str, #[case] params: Value, #[case] expected: Value) {
        let mut builder = HandlerBuilder::new();
        builder
            .add_callable_handle(callables())
            .and_then(|builder| builder.add_service_handle(services()))
            .expect("register demo");
        let handler = builder.build_handler();

        assert_eq!(handler.handle(action, &named(params)), Ok(expected));
    }

    #[rstest]
    #[case::huge_count(json!({"message": "a", "times": 1_000_000_000_000_000_u64}))]
    #[case::overflowing_length(json!({"message": "ab", "times": u64::MAX}))]
    #[case::just_over(json!({"message": "a", "times": MAX_ECHO_BYTES + 1}))]
    fn oversized_echo_is_refused(#[case] params: Value) {
        let mut builder = HandlerBuilder::new();
        builder.add_callable_handle(callables()).expect("register demo");
        let handler = builder.build_handler();

        let error = handler.handle("echo", &named(params)).expect_err("too large");
        assert_eq!(error.code, ErrorObject::APPLICATION_ERROR);
        assert_eq!(error.kind(), Some("too_large"));
        assert_eq!(error.detail("limit"), Some(&json!(MAX_ECHO_BYTES)));
    }

    #[test]
    fn echo_at_the_limit_is_served() {
        let mut builder = HandlerBuilder::new();
        builder.add_callable_handle(callables()).expect("register demo");
        let handler = builder.build_handler();

        let reply = handler
            .handle("echo", &named(json!({"message": "a", "times": MAX_ECHO_BYTES})))
            .expect("echo");
        assert_eq!(reply.as_str().map(str::len), Some(MAX_ECHO_BYTES));
    }

    #[test]
    fn overflow_is_public() {
        let mut builder = HandlerBuilder::new();
        builder.add_service_handle(services()).expect("register demo");
        let handler = builder.build_handler();

        let error = handler
            .handle("calc.add", &named(json!({"a": i64::MAX, "b": 1})))
            .expect_err("overflow");
        assert_eq!(error.code, ErrorObject::APPLICATION_ERROR);
        assert_eq!(error.message, "arithmetic overflow");
        assert_eq!(error.kind(), Some("overflow"));
    }
}
