//! Service description generation.
//!
//! [`DocExtractor`] walks every registered action, resolves it exactly as a
//! dispatch would and asks the [`ParameterExtractor`] for its parameter shape.
//! Nothing is invoked. The output is a Service Mapping Description: a JSON
//! document listing each action with its parameters, keyed in sorted order so
//! repeated runs produce identical bytes.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::DispatchError;
use crate::parameter::{ParameterDescriptor, ParameterExtractor, ParameterKind, Signature};
use crate::registry::ActionRegistry;
use crate::resolver::ChainResolver;

/// Tracing target for documentation generation.
const DOC_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::doc");

/// Transport advertised in generated descriptions.
pub const SMD_TRANSPORT: &str = "POST";

/// Envelope advertised in generated descriptions.
pub const SMD_ENVELOPE: &str = "JSON-RPC-2.0";

/// Machine-readable description of every registered action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescription {
    /// Transport clients should use.
    pub transport: String,
    /// Request envelope clients should use.
    pub envelope: String,
    /// Actions keyed by name.
    pub services: BTreeMap<String, ActionDescription>,
}

impl ServiceDescription {
    /// Renders the description as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns the serialization error, which only arises for non-finite
    /// default values.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Description of one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescription {
    /// One-line summary, when the action carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parameters in signature order.
    pub parameters: Vec<ParameterDescription>,
}

/// Description of one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescription {
    /// Parameter name.
    pub name: String,
    /// Declared kind.
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    /// Whether the parameter may be omitted.
    pub optional: bool,
    /// Value used when the parameter is omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&ParameterDescriptor> for ParameterDescription {
    fn from(descriptor: &ParameterDescriptor) -> Self {
        Self {
            name: descriptor.name().to_owned(),
            kind: descriptor.kind(),
            optional: !descriptor.is_required(),
            default: descriptor.default_value().cloned(),
            description: descriptor.description().map(str::to_owned),
        }
    }
}

fn describe_parameters(signature: &Signature) -> Vec<ParameterDescription> {
    signature
        .parameters()
        .iter()
        .map(ParameterDescription::from)
        .collect()
}

/// Produces service descriptions from a registry without invoking anything.
pub struct DocExtractor {
    registry: Arc<ActionRegistry>,
    resolver: Arc<ChainResolver>,
    extractor: Arc<dyn ParameterExtractor>,
}

impl DocExtractor {
    /// Creates an extractor sharing the dispatcher's collaborators.
    #[must_use]
    pub fn new(
        registry: Arc<ActionRegistry>,
        resolver: Arc<ChainResolver>,
        extractor: Arc<dyn ParameterExtractor>,
    ) -> Self {
        Self {
            registry,
            resolver,
            extractor,
        }
    }

    /// Describes every registered action.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Load`] when the registry fails to build and
    /// [`DispatchError::UnresolvableAction`] when some action cannot be
    /// resolved.
    pub fn extract(&self) -> Result<ServiceDescription, DispatchError> {
        let mut services = BTreeMap::new();
        for action in self.registry.actions()? {
            let binding = self.resolver.resolve(&action)?;
            let signature = self.extractor.extract(&binding);
            services.insert(
                action.name().to_owned(),
                ActionDescription {
                    description: action.summary().map(str::to_owned),
                    parameters: describe_parameters(&signature),
                },
            );
        }
        debug!(target: DOC_TARGET, actions = services.len(), "service description built");
        Ok(ServiceDescription {
            transport: String::from(SMD_TRANSPORT),
            envelope: String::from(SMD_ENVELOPE),
            services,
        })
    }
}

impl fmt::Debug for DocExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocExtractor")
            .field("registry", &self.registry)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}
