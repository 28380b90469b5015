//! Request dispatch.
//!
//! [`BaseHandler`] drives one dispatch through four stages: look the action
//! up in the registry, resolve it to a callable, bind the request parameters
//! and invoke the target. A failure at any stage stops the dispatch and is
//! translated by the error chain, so callers only ever see a result value or
//! a client-safe [`ErrorObject`]. Panics inside targets are caught and
//! treated as internal failures.

mod observer;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{DispatchError, ErrorObject, Errors};
use crate::parameter::{Arguments, ParameterResolver, Params};
use crate::registry::ActionRegistry;
use crate::request::RpcRequest;
use crate::resolver::ChainResolver;
use crate::response::RpcResponse;

pub use self::observer::{DispatchEvent, DispatchObserver, ObserverError, TracingObserver};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Stage of a dispatch, reported alongside failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    /// Interpreting the request's params member.
    ReadingParams,
    /// Looking the action up in the registry.
    ResolvingAction,
    /// Turning the action into an invocable binding.
    ResolvingCallable,
    /// Binding request parameters to the signature.
    BindingParameters,
    /// Running the target.
    Invoking,
}

impl DispatchStage {
    /// Returns the `snake_case` label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadingParams => "reading_params",
            Self::ResolvingAction => "resolving_action",
            Self::ResolvingCallable => "resolving_callable",
            Self::BindingParameters => "binding_parameters",
            Self::Invoking => "invoking",
        }
    }
}

impl fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dispatcher wiring the registry, resolvers, binder, observers and error chain.
pub struct BaseHandler {
    registry: Arc<ActionRegistry>,
    resolver: Arc<ChainResolver>,
    parameters: Arc<dyn ParameterResolver>,
    observers: Vec<Arc<dyn DispatchObserver>>,
    errors: Errors,
}

impl BaseHandler {
    /// Creates a handler from its collaborators.
    #[must_use]
    pub fn new(
        registry: Arc<ActionRegistry>,
        resolver: Arc<ChainResolver>,
        parameters: Arc<dyn ParameterResolver>,
        observers: Vec<Arc<dyn DispatchObserver>>,
        errors: Errors,
    ) -> Self {
        Self {
            registry,
            resolver,
            parameters,
            observers,
            errors,
        }
    }

    /// Registry the handler dispatches against.
    #[must_use]
    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    /// Resolver chain used for every dispatch.
    #[must_use]
    pub fn resolver(&self) -> &Arc<ChainResolver> {
        &self.resolver
    }

    /// Dispatches `action` with raw `params`.
    ///
    /// # Errors
    ///
    /// Returns the translated [`ErrorObject`] when any stage fails.
    pub fn handle(&self, action: &str, params: &Params) -> Result<Value, ErrorObject> {
        debug!(
            target: DISPATCH_TARGET,
            action,
            supplied = params.len(),
            "dispatching action"
        );

        let resolved = self
            .registry
            .get(action)
            .map_err(|error| self.fail(action, None, DispatchStage::ResolvingAction, &error))?;
        let binding = self
            .resolver
            .resolve(&resolved)
            .map_err(|error| self.fail(action, None, DispatchStage::ResolvingCallable, &error))?;
        let arguments = self
            .parameters
            .resolve(action, binding.signature(), params)
            .map_err(|error| self.fail(action, None, DispatchStage::BindingParameters, &error))?;

        let event = DispatchEvent {
            action,
            arguments: Some(&arguments),
        };
        self.notify("before_dispatch", |observer| observer.before_dispatch(&event));

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| binding.invoke(&arguments)))
            .unwrap_or_else(|payload| Err(DispatchError::panicked(action, panic_message(&*payload))));

        match outcome {
            Ok(value) => {
                self.notify("after_dispatch", |observer| {
                    observer.after_dispatch(&event, &value)
                });
                debug!(target: DISPATCH_TARGET, action, "action dispatched");
                Ok(value)
            }
            Err(error) => Err(self.fail(
                action,
                Some(&arguments),
                DispatchStage::Invoking,
                &error,
            )),
        }
    }

    /// Dispatches a decoded protocol request and builds its response.
    ///
    /// The response echoes the request id; whether to send it (notifications
    /// carry no id) is the transport's decision.
    #[must_use]
    pub fn handle_request(&self, request: &RpcRequest) -> RpcResponse {
        let id = request.id.clone().unwrap_or(Value::Null);
        let outcome = match Params::from_value(request.params.clone()) {
            Ok(params) => self.handle(&request.method, &params),
            Err(error) => Err(self.fail(
                &request.method,
                None,
                DispatchStage::ReadingParams,
                &error,
            )),
        };
        match outcome {
            Ok(result) => RpcResponse::success(id, result),
            Err(error) => RpcResponse::failure(id, error),
        }
    }

    fn fail(
        &self,
        action: &str,
        arguments: Option<&Arguments>,
        stage: DispatchStage,
        error: &DispatchError,
    ) -> ErrorObject {
        let response = self.errors.translate(error);
        warn!(
            target: DISPATCH_TARGET,
            action,
            stage = %stage,
            kind = %error.kind(),
            code = response.code,
            error = %error,
            "dispatch failed"
        );
        let event = DispatchEvent { action, arguments };
        self.notify("on_error", |observer| observer.on_error(&event, error, &response));
        response
    }

    fn notify<F>(&self, hook: &'static str, call: F)
    where
        F: Fn(&dyn DispatchObserver) -> Result<(), ObserverError>,
    {
        for observer in &self.observers {
            match panic::catch_unwind(AssertUnwindSafe(|| call(observer.as_ref()))) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    warn!(target: DISPATCH_TARGET, hook, %error, "observer failed");
                }
                Err(payload) => {
                    warn!(
                        target: DISPATCH_TARGET,
                        hook,
                        panic = %panic_message(&*payload),
                        "observer panicked"
                    );
                }
            }
        }
    }
}

impl fmt::Debug for BaseHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseHandler")
            .field("registry", &self.registry)
            .field("resolver", &self.resolver)
            .field("observers", &self.observers.len())
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("non-string panic payload"))
}

#[cfg(test)]
mod tests;
