//! Lazily built, immutable action catalog.
//!
//! The [`ActionRegistry`] runs its [`ChainLoader`] the first time any caller
//! needs an action and caches the outcome for the registry's lifetime.
//! Concurrent first callers block on the same initialisation, so the loaders
//! run exactly once; a failed build is cached too, which keeps every later
//! lookup consistent with the first one.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, error};

use crate::action::Action;
use crate::error::{DispatchError, LoadError};
use crate::loader::{ActionCatalog, ChainLoader};

/// Tracing target for registry operations.
const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Authoritative catalog of actions keyed by name.
#[derive(Debug)]
pub struct ActionRegistry {
    loader: ChainLoader,
    snapshot: OnceCell<Result<Arc<ActionCatalog>, LoadError>>,
}

impl ActionRegistry {
    /// Creates a registry that will build from `loader` on first use.
    #[must_use]
    pub const fn new(loader: ChainLoader) -> Self {
        Self {
            loader,
            snapshot: OnceCell::new(),
        }
    }

    /// Builds the catalog, or returns the cached outcome of the first build.
    ///
    /// # Errors
    ///
    /// Returns the [`LoadError`] raised by the loader chain.
    pub fn build(&self) -> Result<Arc<ActionCatalog>, LoadError> {
        self.snapshot
            .get_or_init(|| {
                debug!(
                    target: REGISTRY_TARGET,
                    loaders = self.loader.len(),
                    policy = %self.loader.policy(),
                    "building action registry"
                );
                match self.loader.load() {
                    Ok(catalog) => {
                        debug!(
                            target: REGISTRY_TARGET,
                            actions = catalog.len(),
                            "action registry built"
                        );
                        Ok(Arc::new(catalog))
                    }
                    Err(load_error) => {
                        error!(
                            target: REGISTRY_TARGET,
                            error = %load_error,
                            "action registry failed to build"
                        );
                        Err(load_error)
                    }
                }
            })
            .clone()
    }

    /// Looks up an action by name, building the catalog if needed.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ActionNotFound`] when no action has the name,
    /// or [`DispatchError::Load`] when the catalog failed to build.
    pub fn get(&self, name: &str) -> Result<Arc<Action>, DispatchError> {
        let catalog = self.build()?;
        catalog
            .get(name)
            .cloned()
            .ok_or_else(|| DispatchError::action_not_found(name))
    }

    /// Returns `true` when a name is registered, building the catalog if needed.
    ///
    /// # Errors
    ///
    /// Returns the [`LoadError`] raised by the loader chain.
    pub fn contains(&self, name: &str) -> Result<bool, LoadError> {
        Ok(self.build()?.get(name).is_some())
    }

    /// All actions in catalog order, building the catalog if needed.
    ///
    /// # Errors
    ///
    /// Returns the [`LoadError`] raised by the loader chain.
    pub fn actions(&self) -> Result<Vec<Arc<Action>>, LoadError> {
        Ok(self.build()?.iter().cloned().collect())
    }

    /// Number of registered actions, building the catalog if needed.
    ///
    /// # Errors
    ///
    /// Returns the [`LoadError`] raised by the loader chain.
    pub fn len(&self) -> Result<usize, LoadError> {
        Ok(self.build()?.len())
    }

    /// Returns `true` when no action is registered, building the catalog if needed.
    ///
    /// # Errors
    ///
    /// Returns the [`LoadError`] raised by the loader chain.
    pub fn is_empty(&self) -> Result<bool, LoadError> {
        Ok(self.build()?.is_empty())
    }

    /// Returns `true` once a build has run, successfully or not.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.snapshot.get().is_some()
    }
}
