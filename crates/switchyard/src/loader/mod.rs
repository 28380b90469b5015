//! Action loaders and the chain that merges them.
//!
//! A loader produces actions from one source. The [`ChainLoader`] runs its
//! loaders in registration order and merges their output by name according to
//! the configured [`CollisionPolicy`]: `reject` fails the build naming both
//! loader positions, `last_wins` lets the later definition replace the earlier
//! one while keeping the earlier catalog position. Either way the outcome only
//! depends on the registration order, so it is identical on every run.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use switchyard_config::CollisionPolicy;

use crate::action::{Action, Service};
use crate::error::{ApplicationError, LoadError};
use crate::parameter::{Arguments, Signature};

/// Tracing target for action loading.
const LOADER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::loader");

/// A source of actions.
pub trait ActionLoader: Send + Sync {
    /// Produces this source's actions.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] when the source cannot be read.
    fn load(&self) -> Result<Vec<Action>, LoadError>;
}

/// Loader for explicitly registered closures and actions.
#[derive(Debug, Default, Clone)]
pub struct CallableLoader {
    actions: Vec<Action>,
}

impl CallableLoader {
    /// Creates an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a closure under `name`.
    pub fn add<F, R>(&mut self, name: impl Into<String>, signature: Signature, handler: F) -> &mut Self
    where
        F: Fn(&Arguments) -> Result<R, ApplicationError> + Send + Sync + 'static,
        R: Serialize + 'static,
    {
        self.actions.push(Action::callable(name, signature, handler));
        self
    }

    /// Registers a prepared action.
    pub fn add_action(&mut self, action: Action) -> &mut Self {
        self.actions.push(action);
        self
    }

    /// Number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl ActionLoader for CallableLoader {
    fn load(&self) -> Result<Vec<Action>, LoadError> {
        Ok(self.actions.clone())
    }
}

/// Loader exposing every method a set of services describes.
///
/// Each method becomes an action named `service.method`, or just `method`
/// when the service name is empty.
#[derive(Default, Clone)]
pub struct ServiceLoader {
    services: Vec<Arc<dyn Service>>,
}

impl ServiceLoader {
    /// Creates a loader without services.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a service, returning the extended loader.
    #[must_use]
    pub fn with_service(mut self, service: Arc<dyn Service>) -> Self {
        self.services.push(service);
        self
    }

    /// Adds a service.
    pub fn add_service(&mut self, service: Arc<dyn Service>) -> &mut Self {
        self.services.push(service);
        self
    }
}

impl fmt::Debug for ServiceLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.services.iter().map(|s| s.name()).collect();
        f.debug_struct("ServiceLoader")
            .field("services", &names)
            .finish()
    }
}

impl ActionLoader for ServiceLoader {
    fn load(&self) -> Result<Vec<Action>, LoadError> {
        let mut actions = Vec::new();
        for service in &self.services {
            for descriptor in service.methods() {
                let name = qualified_name(service.name(), descriptor.name());
                actions.push(Action::method(name, Arc::clone(service), &descriptor));
            }
        }
        Ok(actions)
    }
}

fn qualified_name(service: &str, method: &str) -> String {
    if service.is_empty() {
        method.to_owned()
    } else {
        format!("{service}.{method}")
    }
}

/// Actions merged from a loader chain, in catalog order.
#[derive(Debug, Default)]
pub struct ActionCatalog {
    actions: Vec<Arc<Action>>,
    index: HashMap<String, usize>,
}

impl ActionCatalog {
    /// Looks up an action by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<Action>> {
        self.index
            .get(name)
            .and_then(|position| self.actions.get(*position))
    }

    /// Iterates over actions in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Action>> {
        self.actions.iter()
    }

    /// Action names in catalog order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.actions.iter().map(|action| action.name()).collect()
    }

    /// Number of actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` when the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Runs loaders in registration order and merges their actions by name.
pub struct ChainLoader {
    loaders: Vec<Box<dyn ActionLoader>>,
    policy: CollisionPolicy,
}

impl ChainLoader {
    /// Creates a chain over `loaders`, applying `policy` to name collisions.
    #[must_use]
    pub fn new(loaders: Vec<Box<dyn ActionLoader>>, policy: CollisionPolicy) -> Self {
        Self { loaders, policy }
    }

    /// Collision policy in effect.
    #[must_use]
    pub const fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Number of loaders in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    /// Returns `true` when the chain has no loaders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// Runs every loader and merges the results.
    ///
    /// # Errors
    ///
    /// Returns the first [`LoadError`] raised by a loader, an invalid action
    /// name or signature, or a name collision under [`CollisionPolicy::Reject`].
    pub fn load(&self) -> Result<ActionCatalog, LoadError> {
        let mut catalog = ActionCatalog::default();
        let mut origins: Vec<usize> = Vec::new();

        for (position, loader) in self.loaders.iter().enumerate() {
            let actions = loader.load()?;
            debug!(
                target: LOADER_TARGET,
                loader = position,
                count = actions.len(),
                "loader produced actions"
            );
            for action in actions {
                validate(&action)?;
                let existing = catalog.index.get(action.name()).copied();
                let Some(slot) = existing else {
                    catalog
                        .index
                        .insert(action.name().to_owned(), catalog.actions.len());
                    catalog.actions.push(Arc::new(action));
                    origins.push(position);
                    continue;
                };
                let first_loader = origins.get(slot).copied().unwrap_or(position);
                match self.policy {
                    CollisionPolicy::Reject => {
                        return Err(LoadError::DuplicateAction {
                            action: action.name().to_owned(),
                            first_loader,
                            second_loader: position,
                        });
                    }
                    CollisionPolicy::LastWins => {
                        warn!(
                            target: LOADER_TARGET,
                            action = action.name(),
                            replaced = first_loader,
                            by = position,
                            "action redefined by a later loader"
                        );
                        if let (Some(entry), Some(origin)) =
                            (catalog.actions.get_mut(slot), origins.get_mut(slot))
                        {
                            *entry = Arc::new(action);
                            *origin = position;
                        }
                    }
                }
            }
        }

        Ok(catalog)
    }
}

impl fmt::Debug for ChainLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainLoader")
            .field("loaders", &self.loaders.len())
            .field("policy", &self.policy)
            .finish()
    }
}

fn validate(action: &Action) -> Result<(), LoadError> {
    let name = action.name();
    if name.is_empty() {
        return Err(LoadError::InvalidActionName {
            name: name.to_owned(),
            reason: String::from("name is empty"),
        });
    }
    if name.trim() != name {
        return Err(LoadError::InvalidActionName {
            name: name.to_owned(),
            reason: String::from("name has surrounding whitespace"),
        });
    }
    action
        .signature()
        .validate()
        .map_err(|reason| LoadError::InvalidSignature {
            action: name.to_owned(),
            reason,
        })
}
