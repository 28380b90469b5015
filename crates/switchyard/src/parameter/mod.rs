//! Parameter binding and extraction.
//!
//! Binding turns the raw [`Params`] of a request into the coerced
//! [`Arguments`] an invocable receives; extraction describes the parameters an
//! invocable expects without invoking it, which is what documentation
//! generation relies on. [`SignatureParameterResolver`] implements both halves
//! over explicit [`Signature`] values.
//!
//! Binding rules, applied per declared parameter in order:
//!
//! - a supplied value is coerced to the declared kind, failing with
//!   [`DispatchError::ParameterType`] when that is impossible;
//! - an absent (or `null`) value falls back to the declared default;
//! - an absent required value fails with [`DispatchError::MissingParameter`];
//! - an absent optional value without default is left unbound.
//!
//! Undeclared parameters are checked first and follow the configured
//! [`ExtraParameterPolicy`].

mod arguments;
mod coerce;
mod params;
mod signature;

use serde_json::Value;
use tracing::trace;

use switchyard_config::ExtraParameterPolicy;

use crate::error::DispatchError;
use crate::resolver::CallableBinding;

pub use self::arguments::{ArgumentError, Arguments};
pub use self::params::Params;
pub use self::signature::{ParameterDescriptor, ParameterKind, Signature};

/// Tracing target for parameter binding.
const PARAMETER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::parameter");

/// Binds raw request parameters to an invocable's signature.
pub trait ParameterResolver: Send + Sync {
    /// Produces the argument list for one dispatch of `action`.
    ///
    /// # Errors
    ///
    /// Returns a parameter-category [`DispatchError`] when the request does not
    /// satisfy the signature.
    fn resolve(
        &self,
        action: &str,
        signature: &Signature,
        params: &Params,
    ) -> Result<Arguments, DispatchError>;
}

/// Describes the parameters a resolved invocable expects.
pub trait ParameterExtractor: Send + Sync {
    /// Returns the parameter shape of `binding` without invoking it.
    fn extract(&self, binding: &CallableBinding) -> Signature;
}

/// Signature-driven binder and extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureParameterResolver {
    policy: ExtraParameterPolicy,
}

impl SignatureParameterResolver {
    /// Creates a resolver applying `policy` to undeclared parameters.
    #[must_use]
    pub const fn new(policy: ExtraParameterPolicy) -> Self {
        Self { policy }
    }

    /// Policy applied to undeclared parameters.
    #[must_use]
    pub const fn policy(&self) -> ExtraParameterPolicy {
        self.policy
    }

    fn check_extras(&self, action: &str, extras: Vec<String>) -> Result<(), DispatchError> {
        if extras.is_empty() {
            return Ok(());
        }
        match self.policy {
            ExtraParameterPolicy::Reject => Err(DispatchError::unexpected_parameters(action, extras)),
            ExtraParameterPolicy::Ignore => {
                trace!(
                    target: PARAMETER_TARGET,
                    action,
                    ignored = ?extras,
                    "dropping undeclared parameters"
                );
                Ok(())
            }
        }
    }
}

impl ParameterResolver for SignatureParameterResolver {
    fn resolve(
        &self,
        action: &str,
        signature: &Signature,
        params: &Params,
    ) -> Result<Arguments, DispatchError> {
        let declared = signature.parameters();
        let extras = match params {
            Params::None => Vec::new(),
            Params::Positional(values) => (declared.len()..values.len())
                .map(|index| format!("[{index}]"))
                .collect(),
            Params::Named(map) => map
                .keys()
                .filter(|key| signature.get(key).is_none())
                .cloned()
                .collect(),
        };
        self.check_extras(action, extras)?;

        let mut arguments = Arguments::new();
        for (index, descriptor) in declared.iter().enumerate() {
            let supplied = match params {
                Params::None => None,
                Params::Positional(values) => values.get(index),
                Params::Named(map) => map.get(descriptor.name()),
            };
            if let Some(value) = bind_one(action, descriptor, supplied)? {
                arguments.push(descriptor.name(), value);
            }
        }
        Ok(arguments)
    }
}

impl ParameterExtractor for SignatureParameterResolver {
    fn extract(&self, binding: &CallableBinding) -> Signature {
        binding.signature().clone()
    }
}

fn bind_one(
    action: &str,
    descriptor: &ParameterDescriptor,
    supplied: Option<&Value>,
) -> Result<Option<Value>, DispatchError> {
    let present = supplied.filter(|value| !value.is_null() || descriptor.is_required());
    if let Some(value) = present {
        return coerce::coerce(descriptor.kind(), value.clone())
            .map(Some)
            .map_err(|rejected| {
                DispatchError::parameter_type(
                    action,
                    descriptor.name(),
                    descriptor.kind(),
                    coerce::json_type_name(&rejected),
                )
            });
    }

    if let Some(default) = descriptor.default_value() {
        return Ok(Some(default.clone()));
    }
    if descriptor.is_required() {
        return Err(DispatchError::missing_parameter(action, descriptor.name()));
    }
    Ok(None)
}

#[cfg(test)]
mod tests;
