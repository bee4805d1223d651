use super::context::ComputeContext;
use super::error::FeatureError;
use crate::core::models::ids::{NodeId, NodeKind};
use crate::features::kind::{FeatureKey, FeatureKind};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Where a provider's values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderOrigin {
    /// Derived from the structure itself or from curated annotations.
    #[default]
    Annotation,
    /// Produced by a predictive model.
    Prediction,
}

impl fmt::Display for ProviderOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderOrigin::Annotation => write!(f, "annotation"),
            ProviderOrigin::Prediction => write!(f, "prediction"),
        }
    }
}

/// The executable part of a provider.
///
/// `compute` receives a node of the provider's scope or a coarser one, and writes results
/// for that node and the descendants it covers through the context. Implemented for
/// every matching closure.
pub trait FeatureProvider: Send + Sync {
    fn compute(&self, ctx: &mut ComputeContext<'_>, node: NodeId) -> Result<(), FeatureError>;
}

impl<F> FeatureProvider for F
where
    F: Fn(&mut ComputeContext<'_>, NodeId) -> Result<(), FeatureError> + Send + Sync,
{
    fn compute(&self, ctx: &mut ComputeContext<'_>, node: NodeId) -> Result<(), FeatureError> {
        self(ctx, node)
    }
}

/// Everything the registry needs to know about one provider.
///
/// ```ignore
/// let descriptor = ProviderDescriptor::from_fn("secondary-structure", NodeKind::Chain, |ctx, chain| {
///     for group in ctx.structure().groups_under(chain) {
///         ctx.set::<SecondaryStructure>(group.into(), 'C')?;
///     }
///     Ok(())
/// })
/// .produces::<SecondaryStructure>()
/// .requires::<ChainSequence>();
/// ```
#[derive(Clone)]
pub struct ProviderDescriptor {
    name: String,
    scope: NodeKind,
    produces: Vec<FeatureKey>,
    requires: Vec<FeatureKey>,
    origin: ProviderOrigin,
    priority: i32,
    entry: Arc<dyn FeatureProvider>,
}

impl ProviderDescriptor {
    /// Describes a provider implemented by a type.
    ///
    /// # Arguments
    ///
    /// * `name` - Unique provider name, used for overrides and diagnostics.
    /// * `scope` - The most specific node kind the provider processes in one execution.
    /// * `entry` - The computation itself.
    pub fn new(name: &str, scope: NodeKind, entry: impl FeatureProvider + 'static) -> Self {
        Self {
            name: name.to_string(),
            scope,
            produces: Vec::new(),
            requires: Vec::new(),
            origin: ProviderOrigin::default(),
            priority: 0,
            entry: Arc::new(entry),
        }
    }

    /// Describes a provider implemented by a closure.
    pub fn from_fn<F>(name: &str, scope: NodeKind, entry: F) -> Self
    where
        F: Fn(&mut ComputeContext<'_>, NodeId) -> Result<(), FeatureError> + Send + Sync + 'static,
    {
        Self::new(name, scope, entry)
    }

    pub fn produces<K: FeatureKind>(mut self) -> Self {
        let key = FeatureKey::of::<K>();
        if !self.produces.contains(&key) {
            self.produces.push(key);
        }
        self
    }

    /// Declares an input. Requirements are resolved in declaration order.
    pub fn requires<K: FeatureKind>(mut self) -> Self {
        let key = FeatureKey::of::<K>();
        if !self.requires.contains(&key) {
            self.requires.push(key);
        }
        self
    }

    pub fn origin(mut self, origin: ProviderOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> NodeKind {
        self.scope
    }

    pub fn produced_kinds(&self) -> &[FeatureKey] {
        &self.produces
    }

    pub fn required_kinds(&self) -> &[FeatureKey] {
        &self.requires
    }

    pub fn provider_origin(&self) -> ProviderOrigin {
        self.origin
    }

    pub fn provider_priority(&self) -> i32 {
        self.priority
    }

    pub fn is_producer_of(&self, key: &FeatureKey) -> bool {
        self.produces.contains(key)
    }

    pub(crate) fn entry(&self) -> &dyn FeatureProvider {
        self.entry.as_ref()
    }
}

impl fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("produces", &self.produces)
            .field("requires", &self.requires)
            .field("origin", &self.origin)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}
