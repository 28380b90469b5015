//! Action dispatch engine for JSON-RPC style services.
//!
//! Applications register named actions, either plain closures or methods on
//! [`Service`] objects, each with an explicit [`Signature`]. A
//! [`BaseHandler`] then dispatches requests by name:
//!
//! 1. the [`ActionRegistry`] looks the action up, building itself from the
//!    registered loaders on first use;
//! 2. the [`ChainResolver`] turns the action into an invocable binding;
//! 3. the [`ParameterResolver`] binds and coerces the request parameters;
//! 4. the target runs, guarded against panics.
//!
//! Every failure is translated by the [`Errors`] chain into a client-safe
//! [`ErrorObject`]; nothing a target raises reaches the client unless an
//! [`ErrorFactory`] deliberately exposes it. [`HandlerBuilder`] wires the
//! pieces together and [`DocExtractor`] describes the registered actions
//! without invoking them.
//!
//! The [`server`] module serves a handler over any line-oriented byte
//! stream, and the `switchyard` binary uses it to serve stdin and stdout.

mod action;
mod bootstrap;
mod builder;
mod doc;
mod error;
mod handler;
mod loader;
mod parameter;
mod registry;
mod request;
mod resolver;
mod response;
pub mod server;
pub mod telemetry;

pub use action::{
    Action, ActionTarget, FnInvocable, Invocable, MethodDescriptor, Service, extract_response,
};
pub use bootstrap::{
    BootstrapError, Bootstrapped, ConfigLoader, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use builder::HandlerBuilder;
pub use doc::{
    ActionDescription, DocExtractor, ParameterDescription, SMD_ENVELOPE, SMD_TRANSPORT,
    ServiceDescription,
};
pub use error::{
    ApplicationError, ApplicationErrorFactory, BuildError, DispatchError, ErrorFactory, ErrorKind,
    ErrorObject, Errors, LoadError, NotFoundErrorFactory, OpaqueApplicationErrorFactory,
    ParameterErrorFactory,
    PublicError, PublicErrorFactory, ResolutionErrorFactory,
};
pub use handler::{
    BaseHandler, DispatchEvent, DispatchObserver, DispatchStage, ObserverError, TracingObserver,
};
pub use loader::{ActionCatalog, ActionLoader, CallableLoader, ChainLoader, ServiceLoader};
pub use parameter::{
    ArgumentError, Arguments, ParameterDescriptor, ParameterExtractor, ParameterKind,
    ParameterResolver, Params, Signature, SignatureParameterResolver,
};
pub use registry::ActionRegistry;
pub use request::{JSONRPC_VERSION, RequestError, RpcRequest};
pub use resolver::{
    CallableBinding, CallableResolver, ChainResolver, ClosureResolver, ServiceMethodResolver,
};
pub use response::{ResponseWriter, RpcResponse};
pub use server::{MAX_REQUEST_BYTES, ServeSummary, ServerError, serve};
pub use telemetry::{TelemetryError, TelemetryHandle};

pub use switchyard_config::{CollisionPolicy, Config, ExtraParameterPolicy, LogFormat};

#[cfg(test)]
mod tests;
