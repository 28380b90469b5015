//! Action values describing the endpoints a dispatcher exposes.
//!
//! An [`Action`] pairs a unique name with the target that services it and the
//! explicit [`Signature`] clients must satisfy. Targets come in two kinds: a
//! plain callable (any closure wrapped as an [`Invocable`]) and a method on a
//! [`Service`] object. Loaders produce actions once, when the registry builds,
//! and nothing mutates them afterwards.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::{ApplicationError, DispatchError};
use crate::parameter::{Arguments, Signature};

/// A directly invocable handle produced by a resolver.
pub trait Invocable: Send + Sync {
    /// Invokes the target with bound arguments.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Application`] when the target fails and
    /// [`DispatchError::ResponseExtract`] when its return value cannot be
    /// represented as JSON.
    fn invoke(&self, arguments: &Arguments) -> Result<Value, DispatchError>;
}

/// Converts a target's return value into the JSON handed back to the transport.
///
/// # Errors
///
/// Returns [`DispatchError::ResponseExtract`] when serialization fails.
pub fn extract_response<R: Serialize>(value: R) -> Result<Value, DispatchError> {
    serde_json::to_value(value).map_err(DispatchError::ResponseExtract)
}

/// Adapts a closure into an [`Invocable`].
pub struct FnInvocable<F> {
    handler: F,
}

impl<F> FnInvocable<F> {
    /// Wraps the given closure.
    pub const fn new(handler: F) -> Self {
        Self { handler }
    }
}

impl<F, R> Invocable for FnInvocable<F>
where
    F: Fn(&Arguments) -> Result<R, ApplicationError> + Send + Sync,
    R: Serialize,
{
    fn invoke(&self, arguments: &Arguments) -> Result<Value, DispatchError> {
        let value = (self.handler)(arguments)?;
        extract_response(value)
    }
}

/// Describes one method a [`Service`] exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    name: String,
    summary: Option<String>,
    signature: Signature,
}

impl MethodDescriptor {
    /// Creates a descriptor for the named method.
    pub fn new(name: impl Into<String>, signature: Signature) -> Self {
        Self {
            name: name.into(),
            summary: None,
            signature,
        }
    }

    /// Attaches a one-line summary used in generated documentation.
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Method name as the service dispatches it.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optional documentation summary.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Parameters the method expects.
    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }
}

/// An object exposing several methods as actions.
///
/// Services describe their own methods explicitly; the
/// [`ServiceLoader`](crate::loader::ServiceLoader) turns each descriptor into an
/// action and the
/// [`ServiceMethodResolver`](crate::resolver::ServiceMethodResolver) routes
/// invocations back through [`Service::call`].
pub trait Service: Send + Sync {
    /// Namespace prepended to every method name, or an empty string for none.
    fn name(&self) -> &str;

    /// Methods this service exposes.
    fn methods(&self) -> Vec<MethodDescriptor>;

    /// Invokes one of the described methods.
    ///
    /// # Errors
    ///
    /// Returns whatever failure the method raises.
    fn call(&self, method: &str, arguments: &Arguments) -> Result<Value, DispatchError>;
}

/// The kind of target an action dispatches to.
#[derive(Clone)]
pub enum ActionTarget {
    /// A plain function or closure.
    Callable(Arc<dyn Invocable>),
    /// A method on a service object.
    Method {
        /// Object owning the method.
        service: Arc<dyn Service>,
        /// Method name passed to [`Service::call`].
        method: String,
    },
}

impl ActionTarget {
    /// Short label used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Callable(_) => "callable",
            Self::Method { .. } => "method",
        }
    }
}

impl fmt::Debug for ActionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callable(_) => f.write_str("Callable(..)"),
            Self::Method { service, method } => f
                .debug_struct("Method")
                .field("service", &service.name())
                .field("method", method)
                .finish(),
        }
    }
}

/// A named endpoint exposed by the dispatcher.
#[derive(Debug, Clone)]
pub struct Action {
    name: String,
    target: ActionTarget,
    summary: Option<String>,
    signature: Signature,
}

impl Action {
    /// Creates an action from its parts.
    pub fn new(name: impl Into<String>, target: ActionTarget, signature: Signature) -> Self {
        Self {
            name: name.into(),
            target,
            summary: None,
            signature,
        }
    }

    /// Creates an action backed by a closure.
    ///
    /// # Examples
    ///
    /// ```
    /// use switchyard::{Action, ParameterDescriptor, ParameterKind, Signature};
    ///
    /// let signature = Signature::new()
    ///     .with(ParameterDescriptor::required("a", ParameterKind::Integer))
    ///     .with(ParameterDescriptor::required("b", ParameterKind::Integer));
    /// let action = Action::callable("add", signature, |args| {
    ///     Ok(args.get::<i64>("a")? + args.get::<i64>("b")?)
    /// });
    /// assert_eq!(action.name(), "add");
    /// ```
    pub fn callable<F, R>(name: impl Into<String>, signature: Signature, handler: F) -> Self
    where
        F: Fn(&Arguments) -> Result<R, ApplicationError> + Send + Sync + 'static,
        R: Serialize + 'static,
    {
        let invocable: Arc<dyn Invocable> = Arc::new(FnInvocable::new(handler));
        Self::new(name, ActionTarget::Callable(invocable), signature)
    }

    /// Creates an action backed by a service method.
    pub fn method(
        name: impl Into<String>,
        service: Arc<dyn Service>,
        descriptor: &MethodDescriptor,
    ) -> Self {
        let target = ActionTarget::Method {
            service,
            method: descriptor.name().to_owned(),
        };
        let action = Self::new(name, target, descriptor.signature().clone());
        match descriptor.summary() {
            Some(summary) => action.with_summary(summary),
            None => action,
        }
    }

    /// Attaches a one-line summary used in generated documentation.
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Unique action name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target the action dispatches to.
    #[must_use]
    pub const fn target(&self) -> &ActionTarget {
        &self.target
    }

    /// Optional documentation summary.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Parameters declared alongside the action.
    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }
}
