//! Unit tests for the error taxonomy and factory chain.

use std::sync::Arc;

use rstest::rstest;
use serde_json::{Value, json};

use super::*;

#[derive(Debug, thiserror::Error)]
#[error("insufficient funds: {balance}")]
struct InsufficientFunds {
    balance: i64,
}

#[derive(Debug, thiserror::Error)]
#[error("database password is hunter2")]
struct LeakyFailure;

fn application(error: impl StdError + Send + Sync + 'static) -> DispatchError {
    DispatchError::Application(ApplicationError::new(error))
}

/// Factory claiming every failure with a fixed code.
struct ClaimEverything(i64);

impl ErrorFactory for ClaimEverything {
    fn supports(&self, _error: &DispatchError) -> bool {
        true
    }

    fn create(&self, _error: &DispatchError) -> ErrorObject {
        ErrorObject::new(self.0, "claimed")
    }
}

// ---------------------------------------------------------------------------
// Built-in classification
// ---------------------------------------------------------------------------

#[rstest]
#[case::not_found(DispatchError::action_not_found("nope"), ErrorObject::METHOD_NOT_FOUND, "action_not_found")]
#[case::missing(DispatchError::missing_parameter("add", "b"), ErrorObject::INVALID_PARAMS, "missing_parameter")]
#[case::type_mismatch(
    DispatchError::parameter_type("add", "a", ParameterKind::Integer, "string"),
    ErrorObject::INVALID_PARAMS,
    "parameter_type"
)]
#[case::unexpected(
    DispatchError::unexpected_parameters("add", vec![String::from("c")]),
    ErrorObject::INVALID_PARAMS,
    "unexpected_parameter"
)]
#[case::invalid_params(DispatchError::invalid_params("bad"), ErrorObject::INVALID_PARAMS, "invalid_params")]
#[case::unresolvable(DispatchError::unresolvable("add"), ErrorObject::INTERNAL_ERROR, "unresolvable_action")]
fn built_in_factories_classify_dispatch_failures(
    #[case] error: DispatchError,
    #[case] code: i64,
    #[case] kind: &str,
) {
    let object = Errors::with_defaults(Vec::new()).translate(&error);
    assert_eq!(object.code, code);
    assert_eq!(object.kind(), Some(kind));
}

#[test]
fn parameter_failures_name_the_parameter() {
    let errors = Errors::with_defaults(Vec::new());

    let missing = errors.translate(&DispatchError::missing_parameter("add", "b"));
    assert_eq!(missing.detail("parameter"), Some(&json!("b")));

    let mismatch = errors.translate(&DispatchError::parameter_type(
        "add",
        "a",
        ParameterKind::Integer,
        "string",
    ));
    assert_eq!(mismatch.detail("expected"), Some(&json!("integer")));
    assert_eq!(mismatch.detail("actual"), Some(&json!("string")));

    let extras = errors.translate(&DispatchError::unexpected_parameters(
        "add",
        vec![String::from("c"), String::from("[3]")],
    ));
    assert_eq!(extras.detail("parameters"), Some(&json!(["c", "[3]"])));
}

#[test]
fn not_found_names_the_action() {
    let object = Errors::with_defaults(Vec::new()).translate(&DispatchError::action_not_found("x"));
    assert_eq!(object.detail("action"), Some(&json!("x")));
}

#[rstest]
#[case::application(application(LeakyFailure))]
#[case::panicked(DispatchError::panicked("add", "database password is hunter2"))]
#[case::extract(DispatchError::ResponseExtract(
    serde_json::from_str::<Value>("{").expect_err("truncated json")
))]
#[case::load(DispatchError::Load(LoadError::failed("database password is hunter2")))]
fn unclassified_failures_collapse_to_generic_internal_error(#[case] error: DispatchError) {
    let object = Errors::with_defaults(Vec::new()).translate(&error);
    assert_eq!(object, ErrorObject::internal_error());
    let rendered = serde_json::to_string(&object).expect("serialize");
    assert!(!rendered.contains("hunter2"));
}

#[test]
fn public_errors_are_surfaced_verbatim() {
    let public = PublicError::new(4001, "quota exceeded").with_data(json!({"limit": 10}));
    let object = Errors::with_defaults(Vec::new()).translate(&application(public));
    assert_eq!(object.code, 4001);
    assert_eq!(object.message, "quota exceeded");
    assert_eq!(object.data, Some(json!({"limit": 10})));
}

// ---------------------------------------------------------------------------
// Chain ordering
// ---------------------------------------------------------------------------

#[test]
fn first_supporting_factory_wins() {
    let errors = Errors::new(vec![
        Arc::new(ClaimEverything(1)),
        Arc::new(ClaimEverything(2)),
    ]);
    assert_eq!(errors.translate(&DispatchError::action_not_found("x")).code, 1);
}

#[test]
fn user_factories_run_before_built_ins() {
    let errors = Errors::with_defaults(vec![Arc::new(ClaimEverything(7))]);
    assert_eq!(errors.len(), 5);
    assert_eq!(errors.translate(&DispatchError::action_not_found("x")).code, 7);
}

#[test]
fn empty_chain_only_falls_back() {
    let errors = Errors::new(Vec::new());
    assert!(errors.is_empty());
    assert_eq!(
        errors.translate(&DispatchError::action_not_found("x")),
        ErrorObject::internal_error()
    );
}

#[test]
fn typed_application_factory_matches_by_downcast() {
    let factory = ApplicationErrorFactory::new(|funds: &InsufficientFunds| {
        ErrorObject::new(1001, "insufficient funds").with_detail("balance", json!(funds.balance))
    });
    let errors = Errors::with_defaults(vec![Arc::new(factory)]);

    let matched = errors.translate(&application(InsufficientFunds { balance: 3 }));
    assert_eq!(matched.code, 1001);
    assert_eq!(matched.detail("balance"), Some(&json!(3)));

    let unmatched = errors.translate(&application(LeakyFailure));
    assert_eq!(unmatched, ErrorObject::internal_error());
}

#[test]
fn opaque_factory_reports_application_failures_without_detail() {
    let errors = Errors::with_defaults(vec![Arc::new(OpaqueApplicationErrorFactory)]);

    let object = errors.translate(&application(LeakyFailure));
    assert_eq!(object.code, ErrorObject::APPLICATION_ERROR);
    assert_eq!(object.kind(), Some("application"));
    let rendered = serde_json::to_string(&object).expect("serialize");
    assert!(!rendered.contains("hunter2"));

    let public = errors.translate(&application(PublicError::new(4001, "quota exceeded")));
    assert_eq!(public.code, 4001);

    let not_found = errors.translate(&DispatchError::action_not_found("x"));
    assert_eq!(not_found.code, ErrorObject::METHOD_NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Error objects
// ---------------------------------------------------------------------------

#[test]
fn error_object_omits_absent_data() {
    let rendered = serde_json::to_value(ErrorObject::new(-1, "x")).expect("serialize");
    assert_eq!(rendered, json!({"code": -1, "message": "x"}));
}

#[test]
fn with_detail_preserves_scalar_data() {
    let object = ErrorObject::new(-1, "x")
        .with_data(json!(5))
        .with_detail("kind", json!("custom"));
    assert_eq!(object.data, Some(json!({"value": 5, "kind": "custom"})));
}

#[test]
fn kinds_render_in_snake_case() {
    assert_eq!(
        DispatchError::action_not_found("x").kind().to_string(),
        "action_not_found"
    );
    assert_eq!(ErrorKind::Internal.as_str(), "internal");
}

#[test]
fn load_errors_name_both_loaders() {
    let error = LoadError::DuplicateAction {
        action: String::from("add"),
        first_loader: 0,
        second_loader: 2,
    };
    assert_eq!(
        error.to_string(),
        "action 'add' is defined by loader 0 and loader 2"
    );
}
