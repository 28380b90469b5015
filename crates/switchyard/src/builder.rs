//! One-shot assembly of a dispatcher from its collaborators.
//!
//! [`HandlerBuilder`] collects loaders, resolvers, error factories, observers
//! and the parameter binder, then wires them into a [`BaseHandler`] the first
//! time [`HandlerBuilder::build_handler`] is called. The built handler is
//! cached and the configuration frozen: later registration attempts fail with
//! [`BuildError::AlreadyBuilt`] instead of silently diverging from the handler
//! already in use.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use switchyard_config::{CollisionPolicy, Config, ExtraParameterPolicy};

use crate::doc::DocExtractor;
use crate::error::{BuildError, ErrorFactory, Errors};
use crate::handler::{BaseHandler, DispatchObserver, TracingObserver};
use crate::loader::{ActionLoader, CallableLoader, ChainLoader, ServiceLoader};
use crate::parameter::{ParameterExtractor, ParameterResolver, SignatureParameterResolver};
use crate::registry::ActionRegistry;
use crate::resolver::{CallableResolver, ChainResolver, ClosureResolver, ServiceMethodResolver};

/// Tracing target for handler assembly.
const BUILDER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::builder");

/// Collaborators shared between the handler and the doc extractor.
struct Built {
    handler: Arc<BaseHandler>,
    extractor: Arc<dyn ParameterExtractor>,
    doc: Option<Arc<DocExtractor>>,
}

/// Builder for [`BaseHandler`] and [`DocExtractor`].
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use switchyard::{
///     CallableLoader, HandlerBuilder, ParameterDescriptor, ParameterKind, Params, Signature,
/// };
///
/// # fn main() -> Result<(), switchyard::BuildError> {
/// let mut calculator = CallableLoader::new();
/// calculator.add(
///     "add",
///     Signature::new()
///         .with(ParameterDescriptor::required("a", ParameterKind::Integer))
///         .with(ParameterDescriptor::required("b", ParameterKind::Integer)),
///     |args| Ok(args.get::<i64>("a")? + args.get::<i64>("b")?),
/// );
///
/// let mut builder = HandlerBuilder::new();
/// builder.add_callable_handle(calculator)?;
/// let handler = builder.build_handler();
///
/// let params = Params::Named(serde_json::from_value(json!({"a": 2, "b": 3})).unwrap_or_default());
/// assert_eq!(handler.handle("add", &params), Ok(json!(5)));
/// # Ok(())
/// # }
/// ```
pub struct HandlerBuilder {
    loaders: Vec<Box<dyn ActionLoader>>,
    resolvers: Vec<Arc<dyn CallableResolver>>,
    closure_resolver_added: bool,
    service_resolver_added: bool,
    factories: Vec<Arc<dyn ErrorFactory>>,
    default_factories: bool,
    observers: Vec<Arc<dyn DispatchObserver>>,
    parameter_resolver: Option<Arc<dyn ParameterResolver>>,
    parameter_extractor: Option<Arc<dyn ParameterExtractor>>,
    collision_policy: CollisionPolicy,
    extra_parameters: ExtraParameterPolicy,
    built: Option<Built>,
}

impl Default for HandlerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerBuilder {
    /// Creates a builder with strict default policies and the tracing observer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            loaders: Vec::new(),
            resolvers: Vec::new(),
            closure_resolver_added: false,
            service_resolver_added: false,
            factories: Vec::new(),
            default_factories: true,
            observers: vec![Arc::new(TracingObserver::new())],
            parameter_resolver: None,
            parameter_extractor: None,
            collision_policy: CollisionPolicy::default(),
            extra_parameters: ExtraParameterPolicy::default(),
            built: None,
        }
    }

    /// Creates a builder seeded with the policies from `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::new();
        builder.collision_policy = config.collision_policy();
        builder.extra_parameters = config.extra_parameters();
        builder
    }

    fn ensure_open(&self) -> Result<(), BuildError> {
        if self.built.is_some() {
            return Err(BuildError::AlreadyBuilt);
        }
        Ok(())
    }

    /// Appends an action loader.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::AlreadyBuilt`] once the handler exists.
    pub fn add_action_loader(
        &mut self,
        loader: impl ActionLoader + 'static,
    ) -> Result<&mut Self, BuildError> {
        self.ensure_open()?;
        self.loaders.push(Box::new(loader));
        Ok(self)
    }

    /// Appends a callable resolver.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::AlreadyBuilt`] once the handler exists.
    pub fn add_callable_resolver(
        &mut self,
        resolver: Arc<dyn CallableResolver>,
    ) -> Result<&mut Self, BuildError> {
        self.ensure_open()?;
        self.resolvers.push(resolver);
        Ok(self)
    }

    /// Registers closure actions together with the resolver that binds them.
    ///
    /// The [`ClosureResolver`] is appended only once however many callable
    /// loaders are added.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::AlreadyBuilt`] once the handler exists.
    pub fn add_callable_handle(&mut self, loader: CallableLoader) -> Result<&mut Self, BuildError> {
        self.ensure_open()?;
        if !self.closure_resolver_added {
            self.resolvers.push(Arc::new(ClosureResolver));
            self.closure_resolver_added = true;
        }
        self.loaders.push(Box::new(loader));
        Ok(self)
    }

    /// Registers service actions together with the resolver that binds them.
    ///
    /// The [`ServiceMethodResolver`] is appended only once however many
    /// service loaders are added.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::AlreadyBuilt`] once the handler exists.
    pub fn add_service_handle(&mut self, loader: ServiceLoader) -> Result<&mut Self, BuildError> {
        self.ensure_open()?;
        if !self.service_resolver_added {
            self.resolvers.push(Arc::new(ServiceMethodResolver));
            self.service_resolver_added = true;
        }
        self.loaders.push(Box::new(loader));
        Ok(self)
    }

    /// Appends an error factory; user factories run before the built-ins.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::AlreadyBuilt`] once the handler exists.
    pub fn add_error_factory(
        &mut self,
        factory: Arc<dyn ErrorFactory>,
    ) -> Result<&mut Self, BuildError> {
        self.ensure_open()?;
        self.factories.push(factory);
        Ok(self)
    }

    /// Drops the built-in error factories, leaving only user factories and
    /// the generic fallback.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::AlreadyBuilt`] once the handler exists.
    pub fn without_default_error_factories(&mut self) -> Result<&mut Self, BuildError> {
        self.ensure_open()?;
        self.default_factories = false;
        Ok(self)
    }

    /// Appends a dispatch observer.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::AlreadyBuilt`] once the handler exists.
    pub fn add_observer(
        &mut self,
        observer: Arc<dyn DispatchObserver>,
    ) -> Result<&mut Self, BuildError> {
        self.ensure_open()?;
        self.observers.push(observer);
        Ok(self)
    }

    /// Replaces the parameter binder.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::AlreadyBuilt`] once the handler exists.
    pub fn set_parameter_resolver(
        &mut self,
        resolver: Arc<dyn ParameterResolver>,
    ) -> Result<&mut Self, BuildError> {
        self.ensure_open()?;
        self.parameter_resolver = Some(resolver);
        Ok(self)
    }

    /// Replaces the parameter extractor used for documentation.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::AlreadyBuilt`] once the handler exists.
    pub fn set_parameter_extractor(
        &mut self,
        extractor: Arc<dyn ParameterExtractor>,
    ) -> Result<&mut Self, BuildError> {
        self.ensure_open()?;
        self.parameter_extractor = Some(extractor);
        Ok(self)
    }

    /// Sets the policy for action names defined more than once.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::AlreadyBuilt`] once the handler exists.
    pub fn set_collision_policy(
        &mut self,
        policy: CollisionPolicy,
    ) -> Result<&mut Self, BuildError> {
        self.ensure_open()?;
        self.collision_policy = policy;
        Ok(self)
    }

    /// Sets the policy for undeclared parameters used by the default binder.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::AlreadyBuilt`] once the handler exists.
    pub fn set_extra_parameters(
        &mut self,
        policy: ExtraParameterPolicy,
    ) -> Result<&mut Self, BuildError> {
        self.ensure_open()?;
        self.extra_parameters = policy;
        Ok(self)
    }

    /// Returns `true` once the handler has been built.
    #[must_use]
    pub const fn is_built(&self) -> bool {
        self.built.is_some()
    }

    /// Builds the handler, or returns the one built earlier.
    ///
    /// The registry is not populated here; loaders run on the first dispatch.
    pub fn build_handler(&mut self) -> Arc<BaseHandler> {
        Arc::clone(&self.built().handler)
    }

    /// Builds the doc extractor, building the handler first when needed.
    ///
    /// The extractor shares the handler's registry and resolver chain and is
    /// cached like the handler.
    pub fn build_doc_extractor(&mut self) -> Arc<DocExtractor> {
        let built = self.built();
        if let Some(doc) = &built.doc {
            return Arc::clone(doc);
        }
        let doc = Arc::new(DocExtractor::new(
            Arc::clone(built.handler.registry()),
            Arc::clone(built.handler.resolver()),
            Arc::clone(&built.extractor),
        ));
        built.doc = Some(Arc::clone(&doc));
        doc
    }

    fn built(&mut self) -> &mut Built {
        let built = match self.built.take() {
            Some(built) => built,
            None => self.assemble(),
        };
        self.built.insert(built)
    }

    fn assemble(&mut self) -> Built {
        let default_binder = SignatureParameterResolver::new(self.extra_parameters);
        let parameters = self
            .parameter_resolver
            .take()
            .unwrap_or_else(|| Arc::new(default_binder));
        let extractor = self
            .parameter_extractor
            .take()
            .unwrap_or_else(|| Arc::new(default_binder));
        let errors = if self.default_factories {
            Errors::with_defaults(std::mem::take(&mut self.factories))
        } else {
            Errors::new(std::mem::take(&mut self.factories))
        };

        debug!(
            target: BUILDER_TARGET,
            loaders = self.loaders.len(),
            resolvers = self.resolvers.len(),
            factories = errors.len(),
            observers = self.observers.len(),
            collision_policy = %self.collision_policy,
            extra_parameters = %self.extra_parameters,
            "building handler"
        );

        let loader = ChainLoader::new(std::mem::take(&mut self.loaders), self.collision_policy);
        let registry = Arc::new(ActionRegistry::new(loader));
        let resolver = Arc::new(ChainResolver::new(std::mem::take(&mut self.resolvers)));
        let handler = Arc::new(BaseHandler::new(
            registry,
            resolver,
            parameters,
            std::mem::take(&mut self.observers),
            errors,
        ));

        Built {
            handler,
            extractor,
            doc: None,
        }
    }
}

impl fmt::Debug for HandlerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBuilder")
            .field("loaders", &self.loaders.len())
            .field("resolvers", &self.resolvers.len())
            .field("factories", &self.factories.len())
            .field("observers", &self.observers.len())
            .field("collision_policy", &self.collision_policy)
            .field("extra_parameters", &self.extra_parameters)
            .field("built", &self.is_built())
            .finish_non_exhaustive()
    }
}
