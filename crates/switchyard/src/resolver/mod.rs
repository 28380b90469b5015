//! Callable resolution for registered actions.
//!
//! A [`CallableResolver`] turns an action into a [`CallableBinding`]: the
//! invocable handle plus the parameter shape used to bind and document it.
//! Different target kinds need different strategies, so resolvers are
//! combined in a [`ChainResolver`] that asks each in registration order and
//! lets the first supporting resolver produce the binding.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{trace, warn};

use crate::action::{Action, ActionTarget, Invocable, Service};
use crate::error::DispatchError;
use crate::parameter::{Arguments, Signature};

/// Tracing target for callable resolution.
const RESOLVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::resolver");

/// A resolved invocable together with its parameter shape.
#[derive(Clone)]
pub struct CallableBinding {
    action: Arc<Action>,
    invocable: Arc<dyn Invocable>,
    signature: Signature,
}

impl CallableBinding {
    /// Creates a binding.
    #[must_use]
    pub fn new(action: Arc<Action>, invocable: Arc<dyn Invocable>, signature: Signature) -> Self {
        Self {
            action,
            invocable,
            signature,
        }
    }

    /// Action this binding was resolved from.
    #[must_use]
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Parameter shape of the invocable.
    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Invokes the bound target.
    ///
    /// # Errors
    ///
    /// Propagates the invocable's failure.
    pub fn invoke(&self, arguments: &Arguments) -> Result<Value, DispatchError> {
        self.invocable.invoke(arguments)
    }
}

impl fmt::Debug for CallableBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallableBinding")
            .field("action", &self.action.name())
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Strategy for turning one kind of action target into a binding.
pub trait CallableResolver: Send + Sync {
    /// Returns `true` when this resolver handles the action's target.
    fn supports(&self, action: &Action) -> bool;

    /// Resolves a supported action.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnresolvableAction`] when the target cannot
    /// be bound after all.
    fn resolve(&self, action: &Arc<Action>) -> Result<CallableBinding, DispatchError>;
}

/// Resolves closure-backed actions.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClosureResolver;

impl CallableResolver for ClosureResolver {
    fn supports(&self, action: &Action) -> bool {
        matches!(action.target(), ActionTarget::Callable(_))
    }

    fn resolve(&self, action: &Arc<Action>) -> Result<CallableBinding, DispatchError> {
        match action.target() {
            ActionTarget::Callable(invocable) => Ok(CallableBinding::new(
                Arc::clone(action),
                Arc::clone(invocable),
                action.signature().clone(),
            )),
            ActionTarget::Method { .. } => Err(DispatchError::unresolvable(action.name())),
        }
    }
}

/// Resolves service-method actions against the service's own description.
///
/// The description is re-read on every resolution and its signature is
/// validated the same way the loader validates it; an invalid signature makes
/// the action unresolvable.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServiceMethodResolver;

impl CallableResolver for ServiceMethodResolver {
    fn supports(&self, action: &Action) -> bool {
        matches!(action.target(), ActionTarget::Method { .. })
    }

    fn resolve(&self, action: &Arc<Action>) -> Result<CallableBinding, DispatchError> {
        let ActionTarget::Method { service, method } = action.target() else {
            return Err(DispatchError::unresolvable(action.name()));
        };
        let descriptor = service
            .methods()
            .into_iter()
            .find(|descriptor| descriptor.name() == method.as_str())
            .ok_or_else(|| DispatchError::unresolvable(action.name()))?;
        if let Err(reason) = descriptor.signature().validate() {
            warn!(
                target: RESOLVER_TARGET,
                action = action.name(),
                %reason,
                "service describes an invalid signature"
            );
            return Err(DispatchError::unresolvable(action.name()));
        }
        let invocable: Arc<dyn Invocable> = Arc::new(BoundMethod {
            service: Arc::clone(service),
            method: method.clone(),
        });
        Ok(CallableBinding::new(
            Arc::clone(action),
            invocable,
            descriptor.signature().clone(),
        ))
    }
}

struct BoundMethod {
    service: Arc<dyn Service>,
    method: String,
}

impl Invocable for BoundMethod {
    fn invoke(&self, arguments: &Arguments) -> Result<Value, DispatchError> {
        self.service.call(&self.method, arguments)
    }
}

/// Ordered chain of resolvers; the first supporting resolver wins.
#[derive(Clone, Default)]
pub struct ChainResolver {
    resolvers: Vec<Arc<dyn CallableResolver>>,
}

impl ChainResolver {
    /// Creates a chain consulting `resolvers` in order.
    #[must_use]
    pub fn new(resolvers: Vec<Arc<dyn CallableResolver>>) -> Self {
        Self { resolvers }
    }

    /// Returns `true` when some resolver supports the action.
    #[must_use]
    pub fn supports(&self, action: &Action) -> bool {
        self.resolvers.iter().any(|resolver| resolver.supports(action))
    }

    /// Resolves an action with the first supporting resolver.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnresolvableAction`] when no resolver
    /// supports the action, or the supporting resolver's failure.
    pub fn resolve(&self, action: &Arc<Action>) -> Result<CallableBinding, DispatchError> {
        let Some((position, resolver)) = self
            .resolvers
            .iter()
            .enumerate()
            .find(|(_, resolver)| resolver.supports(action))
        else {
            return Err(DispatchError::unresolvable(action.name()));
        };
        trace!(
            target: RESOLVER_TARGET,
            action = action.name(),
            target_kind = action.target().kind(),
            resolver = position,
            "resolving action"
        );
        resolver.resolve(action)
    }

    /// Number of resolvers in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Returns `true` when the chain has no resolvers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl fmt::Debug for ChainResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainResolver")
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}
