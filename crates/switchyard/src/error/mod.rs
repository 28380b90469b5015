//! Error taxonomy and the translation chain to protocol error objects.
//!
//! Every failure raised while resolving, binding or invoking an action is a
//! [`DispatchError`]. The dispatcher never hands one to the transport: the
//! [`Errors`] chain classifies it into a client-safe [`ErrorObject`], and
//! anything no factory claims collapses into a generic internal error that
//! carries none of the original message. Configuration mistakes are reported
//! separately as [`BuildError`] and [`LoadError`].

mod factory;
mod object;

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::parameter::ParameterKind;

pub use self::factory::{
    ApplicationErrorFactory, ErrorFactory, Errors, NotFoundErrorFactory,
    OpaqueApplicationErrorFactory, ParameterErrorFactory, PublicErrorFactory,
    ResolutionErrorFactory,
};
pub use self::object::ErrorObject;

/// Symbolic failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No registered action carries the requested name.
    ActionNotFound,
    /// No resolver in the chain supports the action's target.
    UnresolvableAction,
    /// A required parameter was not supplied.
    MissingParameter,
    /// A supplied value cannot be coerced to its declared kind.
    ParameterType,
    /// The request supplied undeclared parameters under strict binding.
    UnexpectedParameter,
    /// The request's params member has an unusable shape.
    InvalidParams,
    /// The invoked target reported a failure.
    Application,
    /// The target's return value could not be converted to JSON.
    ResponseExtract,
    /// The invoked target panicked.
    Panicked,
    /// The action registry failed to build.
    Load,
    /// Fallback for failures no factory classified.
    Internal,
}

impl ErrorKind {
    /// Returns the canonical `snake_case` representation placed in error data.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ActionNotFound => "action_not_found",
            Self::UnresolvableAction => "unresolvable_action",
            Self::MissingParameter => "missing_parameter",
            Self::ParameterType => "parameter_type",
            Self::UnexpectedParameter => "unexpected_parameter",
            Self::InvalidParams => "invalid_params",
            Self::Application => "application",
            Self::ResponseExtract => "response_extract",
            Self::Panicked => "panicked",
            Self::Load => "load",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures raised during a single dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No registered action carries the requested name.
    #[error("action '{action}' not found")]
    ActionNotFound {
        /// Requested action name.
        action: String,
    },

    /// No resolver in the chain supports the action's target.
    #[error("no resolver supports action '{action}'")]
    UnresolvableAction {
        /// Action that could not be resolved.
        action: String,
    },

    /// A required parameter was not supplied.
    #[error("action '{action}' is missing required parameter '{parameter}'")]
    MissingParameter {
        /// Action being dispatched.
        action: String,
        /// Name of the missing parameter.
        parameter: String,
    },

    /// A supplied value cannot be coerced to its declared kind.
    #[error("parameter '{parameter}' of action '{action}' expects {expected}, got {actual}")]
    ParameterType {
        /// Action being dispatched.
        action: String,
        /// Offending parameter.
        parameter: String,
        /// Declared kind.
        expected: ParameterKind,
        /// JSON type actually supplied.
        actual: String,
    },

    /// The request supplied parameters the signature does not declare.
    #[error("action '{action}' does not accept parameter(s): {}", .parameters.join(", "))]
    UnexpectedParameter {
        /// Action being dispatched.
        action: String,
        /// Undeclared names; positional extras appear as `[index]`.
        parameters: Vec<String>,
    },

    /// The request's params member has an unusable shape.
    #[error("invalid params: {message}")]
    InvalidParams {
        /// Description of the problem.
        message: String,
    },

    /// The invoked target reported a failure.
    #[error("application failure: {0}")]
    Application(#[from] ApplicationError),

    /// The target's return value could not be converted to JSON.
    #[error("failed to extract response: {0}")]
    ResponseExtract(#[source] serde_json::Error),

    /// The invoked target panicked.
    #[error("action '{action}' panicked: {message}")]
    Panicked {
        /// Action being dispatched.
        action: String,
        /// Panic payload, when it was a string.
        message: String,
    },

    /// The action registry failed to build.
    #[error("action registry failed to build: {0}")]
    Load(#[from] LoadError),
}

impl DispatchError {
    /// Returns the symbolic category of this failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ActionNotFound { .. } => ErrorKind::ActionNotFound,
            Self::UnresolvableAction { .. } => ErrorKind::UnresolvableAction,
            Self::MissingParameter { .. } => ErrorKind::MissingParameter,
            Self::ParameterType { .. } => ErrorKind::ParameterType,
            Self::UnexpectedParameter { .. } => ErrorKind::UnexpectedParameter,
            Self::InvalidParams { .. } => ErrorKind::InvalidParams,
            Self::Application(_) => ErrorKind::Application,
            Self::ResponseExtract(_) => ErrorKind::ResponseExtract,
            Self::Panicked { .. } => ErrorKind::Panicked,
            Self::Load(_) => ErrorKind::Load,
        }
    }

    /// Creates an action-not-found error.
    pub fn action_not_found(action: impl Into<String>) -> Self {
        Self::ActionNotFound {
            action: action.into(),
        }
    }

    /// Creates an unresolvable-action error.
    pub fn unresolvable(action: impl Into<String>) -> Self {
        Self::UnresolvableAction {
            action: action.into(),
        }
    }

    /// Creates a missing-parameter error.
    pub fn missing_parameter(action: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::MissingParameter {
            action: action.into(),
            parameter: parameter.into(),
        }
    }

    /// Creates a parameter-type error.
    pub fn parameter_type(
        action: impl Into<String>,
        parameter: impl Into<String>,
        expected: ParameterKind,
        actual: impl Into<String>,
    ) -> Self {
        Self::ParameterType {
            action: action.into(),
            parameter: parameter.into(),
            expected,
            actual: actual.into(),
        }
    }

    /// Creates an unexpected-parameter error.
    pub fn unexpected_parameters(action: impl Into<String>, parameters: Vec<String>) -> Self {
        Self::UnexpectedParameter {
            action: action.into(),
            parameters,
        }
    }

    /// Creates an invalid-params error.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Creates a panic error.
    pub fn panicked(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Panicked {
            action: action.into(),
            message: message.into(),
        }
    }

    /// Returns the wrapped application failure, if any.
    #[must_use]
    pub const fn application(&self) -> Option<&ApplicationError> {
        match self {
            Self::Application(error) => Some(error),
            _ => None,
        }
    }
}

/// Any failure raised by an invoked target.
///
/// The wrapped error is kept for logging and for factories that classify by
/// concrete type through [`ApplicationError::downcast_ref`]; it never reaches
/// the client unless a factory deliberately copies detail out of it.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct ApplicationError {
    source: Box<dyn StdError + Send + Sync + 'static>,
}

impl ApplicationError {
    /// Wraps an arbitrary error or message.
    pub fn new(source: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Returns the wrapped error when it has type `E`.
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.downcast_ref::<E>()
    }

    /// Returns `true` when the wrapped error has type `E`.
    #[must_use]
    pub fn is<E: StdError + 'static>(&self) -> bool {
        self.source.is::<E>()
    }

    /// Consumes the wrapper, returning the original error.
    #[must_use]
    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync + 'static> {
        self.source
    }
}

impl From<PublicError> for ApplicationError {
    fn from(error: PublicError) -> Self {
        Self::new(error)
    }
}

/// An application failure whose details are safe to show clients.
///
/// Targets return it to surface a specific code, message and data; the
/// [`PublicErrorFactory`] copies those fields into the error object verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct PublicError {
    code: i64,
    message: String,
    data: Option<serde_json::Value>,
}

impl PublicError {
    /// Creates a public error with the given code and message.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attaches structured detail.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Protocol error code.
    #[must_use]
    pub const fn code(&self) -> i64 {
        self.code
    }

    /// Client-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Structured detail, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }
}

/// Failures building the action registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Two loaders, or one loader twice, defined the same action name.
    #[error("action '{action}' is defined by loader {first_loader} and loader {second_loader}")]
    DuplicateAction {
        /// Conflicting action name.
        action: String,
        /// Position of the loader that defined the name first.
        first_loader: usize,
        /// Position of the loader that defined it again.
        second_loader: usize,
    },

    /// An action name is empty or padded with whitespace.
    #[error("invalid action name '{name}': {reason}")]
    InvalidActionName {
        /// Offending name.
        name: String,
        /// Why the name was rejected.
        reason: String,
    },

    /// An action declares an inconsistent signature.
    #[error("action '{action}' has an invalid signature: {reason}")]
    InvalidSignature {
        /// Offending action.
        action: String,
        /// Why the signature was rejected.
        reason: String,
    },

    /// A loader could not read its source.
    #[error("loader failed: {message}")]
    Failed {
        /// Description of the failure.
        message: String,
    },
}

impl LoadError {
    /// Creates a loader failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Configuration-time failures returned by the handler builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The handler was already built; its configuration is frozen.
    #[error("the handler has already been built")]
    AlreadyBuilt,
}

#[cfg(test)]
mod tests;
