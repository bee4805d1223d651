use thiserror::Error;

use crate::core::models::ids::NodeId;

/// Failures raised by a provider's own computation (including wrapped I/O).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while resolving or reading a feature.
///
/// Every variant aborts the `get` that produced it; the resolver never retries and never
/// substitutes a default value.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("No provider is registered for feature '{kind}'")]
    Unresolvable { kind: &'static str },

    #[error("Cyclic dependency detected: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("Type mismatch for feature '{kind}': expected {expected}, found {found}")]
    TypeMismatch {
        kind: &'static str,
        expected: String,
        found: String,
    },

    #[error("Feature '{kind}' has not been computed for this node")]
    NotComputed { kind: &'static str },

    #[error(
        "Feature '{kind}' is claimed by several providers ({}) and no default is bound",
        .candidates.join(", ")
    )]
    Ambiguous {
        kind: &'static str,
        candidates: Vec<String>,
    },

    #[error("Provider '{provider}' does not declare feature '{kind}' as an output")]
    UndeclaredOutput {
        provider: String,
        kind: &'static str,
    },

    #[error("Provider '{provider}' wrote to {node:?}, outside of its target {target:?}")]
    OutOfScope {
        provider: String,
        target: NodeId,
        node: NodeId,
    },

    #[error("Node {0:?} does not exist in this structure")]
    NodeNotFound(NodeId),

    #[error("Provider '{provider}' failed: {source}")]
    Computation {
        provider: String,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors raised by the registration phase of a provider registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("The provider registry is sealed; '{0}' cannot be registered")]
    Sealed(String),

    #[error("The provider registry must be sealed before features are resolved")]
    NotSealed,

    #[error("A provider named '{0}' is already registered")]
    DuplicateProvider(String),

    #[error("Provider '{0}' does not declare any produced feature")]
    NothingProduced(String),

    #[error("Unknown feature kind '{0}'")]
    UnknownFeature(String),

    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("Provider '{provider}' does not produce feature '{kind}'")]
    NotAProducer { provider: String, kind: String },
}
