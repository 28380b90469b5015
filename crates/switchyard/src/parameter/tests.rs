//! Unit tests for parameter binding and extraction.

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::action::Action;
use crate::error::ErrorKind;
use crate::resolver::{CallableResolver, ClosureResolver};

fn params(value: Value) -> Params {
    Params::from_value(Some(value)).expect("params shape")
}

#[fixture]
fn add_signature() -> Signature {
    Signature::new()
        .with(ParameterDescriptor::required("a", ParameterKind::Integer))
        .with(ParameterDescriptor::required("b", ParameterKind::Integer))
}

#[fixture]
fn greeting_signature() -> Signature {
    Signature::new()
        .with(ParameterDescriptor::required("name", ParameterKind::String))
        .with(ParameterDescriptor::optional("greeting", ParameterKind::String).with_default(json!("hello")))
        .with(ParameterDescriptor::optional("loud", ParameterKind::Boolean))
}

fn strict() -> SignatureParameterResolver {
    SignatureParameterResolver::new(ExtraParameterPolicy::Reject)
}

fn loose() -> SignatureParameterResolver {
    SignatureParameterResolver::new(ExtraParameterPolicy::Ignore)
}

// ---------------------------------------------------------------------------
// Params
// ---------------------------------------------------------------------------

#[rstest]
#[case::absent(None, Params::None)]
#[case::null(Some(Value::Null), Params::None)]
#[case::array(Some(json!([1, 2])), Params::Positional(vec![json!(1), json!(2)]))]
fn params_from_value_accepts_containers(#[case] raw: Option<Value>, #[case] expected: Params) {
    assert_eq!(Params::from_value(raw).expect("params"), expected);
}

#[rstest]
#[case::number(json!(3))]
#[case::string(json!("a"))]
#[case::boolean(json!(true))]
fn params_from_value_rejects_scalars(#[case] raw: Value) {
    let error = Params::from_value(Some(raw)).expect_err("scalar params");
    assert_eq!(error.kind(), ErrorKind::InvalidParams);
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

#[rstest]
fn named_arguments_bind_in_signature_order(add_signature: Signature) {
    let arguments = strict()
        .resolve("add", &add_signature, &params(json!({"b": 3, "a": 2})))
        .expect("bind");
    assert_eq!(arguments.names(), vec!["a", "b"]);
    assert_eq!(arguments.get::<i64>("a").expect("a"), 2);
    assert_eq!(arguments.get::<i64>("b").expect("b"), 3);
}

#[rstest]
fn positional_arguments_bind_by_index(add_signature: Signature) {
    let arguments = strict()
        .resolve("add", &add_signature, &params(json!([2, 3])))
        .expect("bind");
    assert_eq!(arguments.value("a"), Some(&json!(2)));
    assert_eq!(arguments.value("b"), Some(&json!(3)));
}

#[rstest]
fn numeric_strings_are_coerced(add_signature: Signature) {
    let arguments = strict()
        .resolve("add", &add_signature, &params(json!({"a": "2", "b": " 3 "})))
        .expect("bind");
    assert_eq!(arguments.get::<i64>("a").expect("a"), 2);
    assert_eq!(arguments.get::<i64>("b").expect("b"), 3);
}

#[rstest]
fn missing_required_parameter_is_named(add_signature: Signature) {
    let error = strict()
        .resolve("add", &add_signature, &params(json!({"a": 2})))
        .expect_err("missing b");
    assert!(matches!(
        error,
        DispatchError::MissingParameter { ref action, ref parameter }
            if action == "add" && parameter == "b"
    ));
}

#[rstest]
fn absent_params_fail_on_first_required_parameter(add_signature: Signature) {
    let error = strict()
        .resolve("add", &add_signature, &Params::None)
        .expect_err("nothing supplied");
    assert!(matches!(
        error,
        DispatchError::MissingParameter { ref parameter, .. } if parameter == "a"
    ));
}

#[rstest]
#[case::object(json!({"a": {"x": 1}, "b": 3}), "object")]
#[case::float(json!({"a": 1.5, "b": 3}), "number")]
#[case::word(json!({"a": "two", "b": 3}), "string")]
#[case::null(json!({"a": null, "b": 3}), "null")]
fn uncoercible_values_report_the_supplied_type(
    add_signature: Signature,
    #[case] raw: Value,
    #[case] actual_type: &str,
) {
    let error = strict()
        .resolve("add", &add_signature, &params(raw))
        .expect_err("type mismatch");
    match error {
        DispatchError::ParameterType {
            parameter,
            expected,
            actual,
            ..
        } => {
            assert_eq!(parameter, "a");
            assert_eq!(expected, ParameterKind::Integer);
            assert_eq!(actual, actual_type);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[rstest]
fn defaults_fill_absent_and_null_values(greeting_signature: Signature) {
    for raw in [json!({"name": "ada"}), json!({"name": "ada", "greeting": null})] {
        let arguments = strict()
            .resolve("greet", &greeting_signature, &params(raw))
            .expect("bind");
        assert_eq!(arguments.value("greeting"), Some(&json!("hello")));
    }
}

#[rstest]
fn optional_without_default_stays_unbound(greeting_signature: Signature) {
    let arguments = strict()
        .resolve("greet", &greeting_signature, &params(json!({"name": "ada"})))
        .expect("bind");
    assert_eq!(arguments.value("loud"), None);
    assert_eq!(arguments.get_opt::<bool>("loud").expect("loud"), None);
    assert_eq!(arguments.len(), 2);
}

#[rstest]
fn boolean_strings_are_coerced(greeting_signature: Signature) {
    let arguments = strict()
        .resolve(
            "greet",
            &greeting_signature,
            &params(json!({"name": 42, "loud": "TRUE"})),
        )
        .expect("bind");
    assert_eq!(arguments.value("name"), Some(&json!("42")));
    assert_eq!(arguments.value("loud"), Some(&json!(true)));
}

// ---------------------------------------------------------------------------
// Undeclared parameters
// ---------------------------------------------------------------------------

#[rstest]
fn strict_binding_lists_every_named_extra(add_signature: Signature) {
    let error = strict()
        .resolve(
            "add",
            &add_signature,
            &params(json!({"a": 1, "b": 2, "c": 3, "d": 4})),
        )
        .expect_err("extras");
    match error {
        DispatchError::UnexpectedParameter { parameters, .. } => {
            assert_eq!(parameters, vec![String::from("c"), String::from("d")]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[rstest]
fn strict_binding_names_positional_extras_by_index(add_signature: Signature) {
    let error = strict()
        .resolve("add", &add_signature, &params(json!([1, 2, 3])))
        .expect_err("extras");
    match error {
        DispatchError::UnexpectedParameter { parameters, .. } => {
            assert_eq!(parameters, vec![String::from("[2]")]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[rstest]
fn extras_are_reported_before_missing_parameters(add_signature: Signature) {
    let error = strict()
        .resolve("add", &add_signature, &params(json!({"a": 1, "c": 3})))
        .expect_err("extras and missing");
    assert_eq!(error.kind(), ErrorKind::UnexpectedParameter);
}

#[rstest]
fn loose_binding_drops_extras(add_signature: Signature) {
    let arguments = loose()
        .resolve("add", &add_signature, &params(json!({"a": 1, "b": 2, "c": 3})))
        .expect("bind");
    assert_eq!(arguments.names(), vec!["a", "b"]);
}

#[test]
fn default_resolver_is_strict() {
    assert_eq!(
        SignatureParameterResolver::default().policy(),
        ExtraParameterPolicy::Reject
    );
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[test]
fn arguments_report_absence_and_shape_errors() {
    let arguments = Arguments::new().with("a", json!("x"));

    let missing = arguments.get::<i64>("b").expect_err("missing");
    assert!(matches!(
        missing.downcast_ref::<ArgumentError>(),
        Some(ArgumentError::Missing { name }) if name == "b"
    ));

    let shape = arguments.get::<i64>("a").expect_err("shape");
    assert!(matches!(
        shape.downcast_ref::<ArgumentError>(),
        Some(ArgumentError::Shape { name, .. }) if name == "a"
    ));
}

// ---------------------------------------------------------------------------
// Signatures and extraction
// ---------------------------------------------------------------------------

#[test]
fn signature_rejects_duplicate_names() {
    let signature = Signature::new()
        .with(ParameterDescriptor::required("a", ParameterKind::Any))
        .with(ParameterDescriptor::optional("a", ParameterKind::Any));
    let reason = signature.validate().expect_err("duplicate");
    assert!(reason.contains('a'));
}

#[test]
fn defaulted_parameters_are_never_required() {
    let descriptor =
        ParameterDescriptor::required("n", ParameterKind::Integer).with_default(json!(1));
    assert!(!descriptor.is_required());
}

#[rstest]
fn extractor_reports_the_bound_signature(add_signature: Signature) {
    let action = Arc::new(Action::callable("add", add_signature.clone(), |_| Ok(0)));
    let binding = ClosureResolver.resolve(&action).expect("resolve");
    assert_eq!(strict().extract(&binding), add_signature);
}
