//! Unit tests for the dispatcher.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rstest::{fixture, rstest};
use serde_json::json;

use switchyard_config::{CollisionPolicy, ExtraParameterPolicy};

use super::*;
use crate::error::{ApplicationError, PublicError};
use crate::loader::{CallableLoader, ChainLoader};
use crate::parameter::{ParameterDescriptor, ParameterKind, Signature, SignatureParameterResolver};
use crate::resolver::{CallableResolver, ClosureResolver, ServiceMethodResolver};

#[derive(Debug, thiserror::Error)]
#[error("connection string postgres://admin:secret@db")]
struct SecretFailure;

/// Observer recording every hook it receives.
#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    fn record(&self, entry: String) {
        if let Ok(mut events) = self.events.lock() {
            events.push(entry);
        }
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl DispatchObserver for RecordingObserver {
    fn before_dispatch(&self, event: &DispatchEvent<'_>) -> Result<(), ObserverError> {
        let bound = event.arguments.map_or(0, Arguments::len);
        self.record(format!("before:{}:{bound}", event.action));
        Ok(())
    }

    fn after_dispatch(&self, event: &DispatchEvent<'_>, result: &Value) -> Result<(), ObserverError> {
        self.record(format!("after:{}:{result}", event.action));
        Ok(())
    }

    fn on_error(
        &self,
        event: &DispatchEvent<'_>,
        error: &DispatchError,
        response: &ErrorObject,
    ) -> Result<(), ObserverError> {
        self.record(format!("error:{}:{}:{}", event.action, error.kind(), response.code));
        Ok(())
    }
}

/// Observer whose hooks fail in every possible way.
struct HostileObserver;

impl DispatchObserver for HostileObserver {
    fn before_dispatch(&self, _event: &DispatchEvent<'_>) -> Result<(), ObserverError> {
        Err(ObserverError::new("sink offline"))
    }

    fn after_dispatch(&self, _event: &DispatchEvent<'_>, _result: &Value) -> Result<(), ObserverError> {
        panic!("observer exploded");
    }

    fn on_error(
        &self,
        _event: &DispatchEvent<'_>,
        _error: &DispatchError,
        _response: &ErrorObject,
    ) -> Result<(), ObserverError> {
        panic!("observer exploded while reporting");
    }
}

fn add_signature() -> Signature {
    Signature::new()
        .with(ParameterDescriptor::required("a", ParameterKind::Integer))
        .with(ParameterDescriptor::required("b", ParameterKind::Integer))
}

fn actions() -> CallableLoader {
    let mut loader = CallableLoader::new();
    loader
        .add("add", add_signature(), |args| {
            Ok(args.get::<i64>("a")? + args.get::<i64>("b")?)
        })
        .add("explode", Signature::new(), |_| -> Result<(), ApplicationError> {
            panic!("target exploded")
        })
        .add("leak", Signature::new(), |_| -> Result<(), ApplicationError> {
            Err(ApplicationError::new(SecretFailure))
        })
        .add("quota", Signature::new(), |_| -> Result<(), ApplicationError> {
            Err(PublicError::new(4001, "quota exceeded").into())
        })
        .add("unserializable", Signature::new(), |_| {
            let mut map = HashMap::new();
            map.insert((1, 2), 3);
            Ok(map)
        });
    loader
}

fn handler_with(
    resolvers: Vec<Arc<dyn CallableResolver>>,
    observers: Vec<Arc<dyn DispatchObserver>>,
) -> BaseHandler {
    let registry = ActionRegistry::new(ChainLoader::new(
        vec![Box::new(actions())],
        CollisionPolicy::Reject,
    ));
    BaseHandler::new(
        Arc::new(registry),
        Arc::new(ChainResolver::new(resolvers)),
        Arc::new(SignatureParameterResolver::new(ExtraParameterPolicy::Reject)),
        observers,
        Errors::with_defaults(Vec::new()),
    )
}

#[fixture]
fn recorder() -> Arc<RecordingObserver> {
    Arc::new(RecordingObserver::default())
}

#[fixture]
fn handler(recorder: Arc<RecordingObserver>) -> BaseHandler {
    handler_with(vec![Arc::new(ClosureResolver)], vec![recorder])
}

fn named(value: Value) -> Params {
    Params::from_value(Some(value)).expect("params")
}

// ---------------------------------------------------------------------------
// Successful dispatch
// ---------------------------------------------------------------------------

#[rstest]
#[case::named(json!({"a": 2, "b": 3}))]
#[case::positional(json!([2, 3]))]
#[case::coerced(json!({"a": "2", "b": 3}))]
fn add_returns_the_sum(handler: BaseHandler, #[case] params: Value) {
    assert_eq!(handler.handle("add", &named(params)), Ok(json!(5)));
}

#[rstest]
fn observers_see_before_and_after(recorder: Arc<RecordingObserver>) {
    let handler = handler_with(vec![Arc::new(ClosureResolver)], vec![recorder.clone()]);
    handler
        .handle("add", &named(json!({"a": 2, "b": 3})))
        .expect("dispatch");
    assert_eq!(recorder.events(), vec!["before:add:2", "after:add:5"]);
}

// ---------------------------------------------------------------------------
// Failures at each stage
// ---------------------------------------------------------------------------

#[rstest]
fn unknown_action_is_not_found(recorder: Arc<RecordingObserver>) {
    let handler = handler_with(vec![Arc::new(ClosureResolver)], vec![recorder.clone()]);
    let error = handler
        .handle("missing", &Params::None)
        .expect_err("unknown action");
    assert_eq!(error.code, ErrorObject::METHOD_NOT_FOUND);
    assert_eq!(error.kind(), Some("action_not_found"));
    assert_eq!(recorder.events(), vec!["error:missing:action_not_found:-32601"]);
}

#[rstest]
fn missing_parameter_stops_before_invocation(recorder: Arc<RecordingObserver>) {
    let handler = handler_with(vec![Arc::new(ClosureResolver)], vec![recorder.clone()]);
    let error = handler
        .handle("add", &named(json!({"a": 2})))
        .expect_err("missing b");
    assert_eq!(error.code, ErrorObject::INVALID_PARAMS);
    assert_eq!(error.kind(), Some("missing_parameter"));
    assert_eq!(error.detail("parameter"), Some(&json!("b")));
    assert_eq!(recorder.events(), vec!["error:add:missing_parameter:-32602"]);
}

#[rstest]
fn action_without_resolver_is_unresolvable() {
    let handler = handler_with(vec![Arc::new(ServiceMethodResolver)], Vec::new());
    let error = handler
        .handle("add", &named(json!([1, 2])))
        .expect_err("no resolver");
    assert_eq!(error.code, ErrorObject::INTERNAL_ERROR);
    assert_eq!(error.kind(), Some("unresolvable_action"));
}

#[rstest]
#[case::panic("explode")]
#[case::private_failure("leak")]
#[case::response_extract("unserializable")]
fn internal_failures_are_generic(handler: BaseHandler, #[case] action: &str) {
    let error = handler.handle(action, &Params::None).expect_err("failure");
    assert_eq!(error, ErrorObject::internal_error());
    let rendered = serde_json::to_string(&error).expect("serialize");
    assert!(!rendered.contains("secret"));
    assert!(!rendered.contains("exploded"));
}

#[rstest]
fn panicking_target_reports_on_error(recorder: Arc<RecordingObserver>) {
    let handler = handler_with(vec![Arc::new(ClosureResolver)], vec![recorder.clone()]);
    handler
        .handle("explode", &Params::None)
        .expect_err("panic");
    assert_eq!(
        recorder.events(),
        vec!["before:explode:0", "error:explode:panicked:-32603"]
    );
}

#[rstest]
fn public_errors_reach_the_client(handler: BaseHandler) {
    let error = handler.handle("quota", &Params::None).expect_err("quota");
    assert_eq!(error.code, 4001);
    assert_eq!(error.message, "quota exceeded");
}

// ---------------------------------------------------------------------------
// Observer isolation
// ---------------------------------------------------------------------------

#[rstest]
fn hostile_observers_never_change_the_outcome(recorder: Arc<RecordingObserver>) {
    let handler = handler_with(
        vec![Arc::new(ClosureResolver)],
        vec![Arc::new(HostileObserver), recorder.clone()],
    );

    assert_eq!(
        handler.handle("add", &named(json!([2, 3]))),
        Ok(json!(5))
    );
    let error = handler
        .handle("add", &named(json!([2])))
        .expect_err("missing b");
    assert_eq!(error.kind(), Some("missing_parameter"));
    assert_eq!(
        recorder.events(),
        vec![
            "before:add:2",
            "after:add:5",
            "error:add:missing_parameter:-32602"
        ]
    );
}

// ---------------------------------------------------------------------------
// Protocol envelope
// ---------------------------------------------------------------------------

#[rstest]
fn handle_request_echoes_the_id(handler: BaseHandler) {
    let request = RpcRequest::new("add", Some(json!("req-1")), Some(json!({"a": 2, "b": 3})));
    let response = handler.handle_request(&request);
    assert_eq!(response, RpcResponse::success(json!("req-1"), json!(5)));
}

#[rstest]
fn scalar_params_are_invalid(handler: BaseHandler) {
    let request = RpcRequest::new("add", Some(json!(9)), Some(json!(3)));
    let response = handler.handle_request(&request);

    assert_eq!(response.id, json!(9));
    let error = response.error.expect("error response");
    assert_eq!(error.code, ErrorObject::INVALID_PARAMS);
    assert_eq!(error.kind(), Some("invalid_params"));
}

#[test]
fn stages_render_in_snake_case() {
    assert_eq!(DispatchStage::BindingParameters.to_string(), "binding_parameters");
}

