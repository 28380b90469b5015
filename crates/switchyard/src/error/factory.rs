//! Error factories and the ordered chain that consults them.

use std::error::Error as StdError;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use super::{DispatchError, ErrorKind, ErrorObject, PublicError};

/// Tracing target for error translation.
const ERRORS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::errors");

/// Classifies a dispatch failure into a client-safe error object.
pub trait ErrorFactory: Send + Sync {
    /// Returns `true` when this factory can classify `error`.
    fn supports(&self, error: &DispatchError) -> bool;

    /// Produces the error object for a failure this factory supports.
    fn create(&self, error: &DispatchError) -> ErrorObject;
}

/// Ordered chain of error factories; the first supporting factory wins.
#[derive(Clone, Default)]
pub struct Errors {
    factories: Vec<Arc<dyn ErrorFactory>>,
}

impl Errors {
    /// Creates a chain consulting `factories` in order.
    #[must_use]
    pub fn new(factories: Vec<Arc<dyn ErrorFactory>>) -> Self {
        Self { factories }
    }

    /// Creates a chain of `factories` followed by the built-in factories.
    #[must_use]
    pub fn with_defaults(mut factories: Vec<Arc<dyn ErrorFactory>>) -> Self {
        factories.extend(Self::default_factories());
        Self::new(factories)
    }

    /// Built-in factories for the dispatcher's own failure categories.
    #[must_use]
    pub fn default_factories() -> Vec<Arc<dyn ErrorFactory>> {
        vec![
            Arc::new(NotFoundErrorFactory),
            Arc::new(ParameterErrorFactory),
            Arc::new(ResolutionErrorFactory),
            Arc::new(PublicErrorFactory),
        ]
    }

    /// Translates a failure, falling back to a generic internal error.
    #[must_use]
    pub fn translate(&self, error: &DispatchError) -> ErrorObject {
        for (position, factory) in self.factories.iter().enumerate() {
            if factory.supports(error) {
                trace!(
                    target: ERRORS_TARGET,
                    kind = %error.kind(),
                    factory = position,
                    "error factory matched"
                );
                return factory.create(error);
            }
        }
        trace!(target: ERRORS_TARGET, kind = %error.kind(), "no error factory matched");
        ErrorObject::internal_error()
    }

    /// Number of factories in the chain, excluding the fallback.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` when only the fallback applies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Errors")
            .field("factories", &self.factories.len())
            .finish()
    }
}

/// Maps unknown action names to "method not found".
#[derive(Debug, Default, Clone, Copy)]
pub struct NotFoundErrorFactory;

impl ErrorFactory for NotFoundErrorFactory {
    fn supports(&self, error: &DispatchError) -> bool {
        matches!(error, DispatchError::ActionNotFound { .. })
    }

    fn create(&self, error: &DispatchError) -> ErrorObject {
        let object = ErrorObject::method_not_found().with_kind(error.kind());
        match error {
            DispatchError::ActionNotFound { action } => {
                object.with_detail("action", Value::from(action.as_str()))
            }
            _ => object,
        }
    }
}

/// Maps binding failures to "invalid params", naming the offending parameters.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParameterErrorFactory;

impl ErrorFactory for ParameterErrorFactory {
    fn supports(&self, error: &DispatchError) -> bool {
        matches!(
            error.kind(),
            ErrorKind::MissingParameter
                | ErrorKind::ParameterType
                | ErrorKind::UnexpectedParameter
                | ErrorKind::InvalidParams
        )
    }

    fn create(&self, error: &DispatchError) -> ErrorObject {
        let object = ErrorObject::invalid_params().with_kind(error.kind());
        match error {
            DispatchError::MissingParameter { parameter, .. } => {
                object.with_detail("parameter", Value::from(parameter.as_str()))
            }
            DispatchError::ParameterType {
                parameter,
                expected,
                actual,
                ..
            } => object
                .with_detail("parameter", Value::from(parameter.as_str()))
                .with_detail("expected", Value::from(expected.as_str()))
                .with_detail("actual", Value::from(actual.as_str())),
            DispatchError::UnexpectedParameter { parameters, .. } => {
                object.with_detail("parameters", Value::from(parameters.clone()))
            }
            DispatchError::InvalidParams { message } => {
                object.with_detail("reason", Value::from(message.as_str()))
            }
            _ => object,
        }
    }
}

/// Maps resolution failures to an internal error naming only the action.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResolutionErrorFactory;

impl ErrorFactory for ResolutionErrorFactory {
    fn supports(&self, error: &DispatchError) -> bool {
        matches!(error, DispatchError::UnresolvableAction { .. })
    }

    fn create(&self, error: &DispatchError) -> ErrorObject {
        let object = ErrorObject::new(ErrorObject::INTERNAL_ERROR, "action could not be resolved")
            .with_kind(error.kind());
        match error {
            DispatchError::UnresolvableAction { action } => {
                object.with_detail("action", Value::from(action.as_str()))
            }
            _ => object,
        }
    }
}

/// Surfaces [`PublicError`] application failures verbatim.
#[derive(Debug, Default, Clone, Copy)]
pub struct PublicErrorFactory;

impl ErrorFactory for PublicErrorFactory {
    fn supports(&self, error: &DispatchError) -> bool {
        error
            .application()
            .is_some_and(|failure| failure.is::<PublicError>())
    }

    fn create(&self, error: &DispatchError) -> ErrorObject {
        let Some(public) = error
            .application()
            .and_then(|failure| failure.downcast_ref::<PublicError>())
        else {
            return ErrorObject::internal_error();
        };
        let object = ErrorObject::new(public.code(), public.message());
        match public.data() {
            Some(data) => object.with_data(data.clone()),
            None => object,
        }
    }
}

/// Opt-in catch-all for application failures.
///
/// Not part of [`Errors::default_factories`]: without it an unclassified
/// application failure is reported as the generic internal error. With it the
/// client learns the failure came from the target (`-32000`, kind
/// `application`) but never sees the underlying message. [`PublicError`]s are
/// left to [`PublicErrorFactory`]. Register it after any typed factories so
/// they still match first.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpaqueApplicationErrorFactory;

impl ErrorFactory for OpaqueApplicationErrorFactory {
    fn supports(&self, error: &DispatchError) -> bool {
        error
            .application()
            .is_some_and(|failure| !failure.is::<PublicError>())
    }

    fn create(&self, error: &DispatchError) -> ErrorObject {
        ErrorObject::new(ErrorObject::APPLICATION_ERROR, "application error").with_kind(error.kind())
    }
}

/// Classifies application failures of one concrete error type.
///
/// # Examples
///
/// ```
/// use switchyard::{ApplicationErrorFactory, ErrorObject};
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("insufficient funds")]
/// struct InsufficientFunds;
///
/// let factory = ApplicationErrorFactory::new(|_: &InsufficientFunds| {
///     ErrorObject::new(1001, "insufficient funds")
/// });
/// # let _ = factory;
/// ```
pub struct ApplicationErrorFactory<E, F> {
    build: F,
    marker: PhantomData<fn(&E)>,
}

impl<E, F> ApplicationErrorFactory<E, F>
where
    E: StdError + 'static,
    F: Fn(&E) -> ErrorObject + Send + Sync,
{
    /// Creates a factory producing objects with `build`.
    pub const fn new(build: F) -> Self {
        Self {
            build,
            marker: PhantomData,
        }
    }
}

impl<E, F> ErrorFactory for ApplicationErrorFactory<E, F>
where
    E: StdError + 'static,
    F: Fn(&E) -> ErrorObject + Send + Sync,
{
    fn supports(&self, error: &DispatchError) -> bool {
        error.application().is_some_and(|failure| failure.is::<E>())
    }

    fn create(&self, error: &DispatchError) -> ErrorObject {
        error
            .application()
            .and_then(|failure| failure.downcast_ref::<E>())
            .map_or_else(ErrorObject::internal_error, |source| (self.build)(source))
    }
}
