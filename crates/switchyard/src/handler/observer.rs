//! Observation hooks fired around each dispatch.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::error::{DispatchError, ErrorObject};
use crate::parameter::Arguments;

use super::DISPATCH_TARGET;

/// Failure reported by an observer; logged and otherwise ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("observer failed: {message}")]
pub struct ObserverError {
    message: String,
}

impl ObserverError {
    /// Creates an observer failure.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// What an observer learns about a dispatch.
#[derive(Debug, Clone, Copy)]
pub struct DispatchEvent<'a> {
    /// Requested action name.
    pub action: &'a str,
    /// Bound arguments, once binding succeeded.
    pub arguments: Option<&'a Arguments>,
}

/// Observer notified before and after invocation and on failure.
///
/// Hooks are informational: their results never influence the dispatch
/// outcome, and failures or panics inside them are only logged.
pub trait DispatchObserver: Send + Sync {
    /// Invoked after binding, immediately before the target runs.
    ///
    /// # Errors
    ///
    /// Implementations may report a failure for logging.
    fn before_dispatch(&self, event: &DispatchEvent<'_>) -> Result<(), ObserverError> {
        let _ = event;
        Ok(())
    }

    /// Invoked after the target returned successfully.
    ///
    /// # Errors
    ///
    /// Implementations may report a failure for logging.
    fn after_dispatch(&self, event: &DispatchEvent<'_>, result: &Value) -> Result<(), ObserverError> {
        let _ = (event, result);
        Ok(())
    }

    /// Invoked when any stage of the dispatch failed.
    ///
    /// # Errors
    ///
    /// Implementations may report a failure for logging.
    fn on_error(
        &self,
        event: &DispatchEvent<'_>,
        error: &DispatchError,
        response: &ErrorObject,
    ) -> Result<(), ObserverError> {
        let _ = (event, error, response);
        Ok(())
    }
}

impl<T> DispatchObserver for Arc<T>
where
    T: DispatchObserver + ?Sized,
{
    fn before_dispatch(&self, event: &DispatchEvent<'_>) -> Result<(), ObserverError> {
        (**self).before_dispatch(event)
    }

    fn after_dispatch(&self, event: &DispatchEvent<'_>, result: &Value) -> Result<(), ObserverError> {
        (**self).after_dispatch(event, result)
    }

    fn on_error(
        &self,
        event: &DispatchEvent<'_>,
        error: &DispatchError,
        response: &ErrorObject,
    ) -> Result<(), ObserverError> {
        (**self).on_error(event, error, response)
    }
}

/// Default observer that records dispatch events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TracingObserver {
    /// Builds a new observer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DispatchObserver for TracingObserver {
    fn before_dispatch(&self, event: &DispatchEvent<'_>) -> Result<(), ObserverError> {
        debug!(
            target: DISPATCH_TARGET,
            event = "before_dispatch",
            action = event.action,
            arguments = ?event.arguments.map(Arguments::names),
            "invoking action"
        );
        Ok(())
    }

    fn after_dispatch(&self, event: &DispatchEvent<'_>, _result: &Value) -> Result<(), ObserverError> {
        debug!(
            target: DISPATCH_TARGET,
            event = "after_dispatch",
            action = event.action,
            "action completed"
        );
        Ok(())
    }

    fn on_error(
        &self,
        event: &DispatchEvent<'_>,
        error: &DispatchError,
        response: &ErrorObject,
    ) -> Result<(), ObserverError> {
        debug!(
            target: DISPATCH_TARGET,
            event = "on_error",
            action = event.action,
            kind = %error.kind(),
            code = response.code,
            "action failed"
        );
        Ok(())
    }
}
