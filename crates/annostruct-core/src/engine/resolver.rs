use super::config::EngineConfig;
use super::context::{ComputeContext, commit};
use super::error::{FeatureError, RegistryError};
use super::progress::{ResolutionEvent, ResolutionReporter};
use super::registry::{Catalogue, ProviderInfo, ProviderRegistry, RegisteredProvider, SelectionPolicy};
use crate::core::models::ids::{NodeId, NodeKind};
use crate::core::models::structure::Structure;
use crate::features::kind::{FeatureKey, FeatureKind, ProviderId};
use crate::features::store::FeatureStore;
use itertools::Itertools;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, trace};

/// One entry of the in-progress stack: a provider running on a target node.
pub(crate) type Frame = (ProviderId, NodeId);

/// Turns feature requests into provider executions.
///
/// A resolver works on a frozen snapshot of a sealed [`ProviderRegistry`] and can be shared
/// freely; all mutable state lives in the [`Structure`] being annotated and in the call
/// stack of one request.
///
/// For a request of kind `K` on node `N`:
///
/// 1. a value already cached on `N` is returned as is;
/// 2. otherwise a provider is selected (explicit name, configured override, registry
///    binding, declared default, tie-break);
/// 3. the provider runs on `N`, or on the ancestor of `N` at the provider's scope when `N`
///    is finer, unless it already completed there or on an ancestor; when `N` is coarser,
///    scope nodes below `N` that are already covered are left alone and only the remaining
///    ones run;
/// 4. its requirements are resolved first, in declaration order, on that same target;
/// 5. its writes are committed together once it succeeds.
#[derive(Debug)]
pub struct Resolver {
    catalogue: Arc<Catalogue>,
    config: EngineConfig,
    overrides: HashMap<FeatureKey, usize>,
    reporter: ResolutionReporter,
}

impl Resolver {
    /// Builds a resolver over a sealed registry.
    ///
    /// # Arguments
    ///
    /// * `registry` - The provider catalogue. It must be sealed.
    /// * `config` - Selection policy and per-kind provider overrides.
    ///
    /// # Errors
    ///
    /// Fails with [`RegistryError::NotSealed`] for an open registry, with the registry
    /// errors of any override that names an unknown kind or provider, and, when
    /// `validate_plans` is set, with the first cycle or ambiguity found in any plan.
    pub fn new(registry: &ProviderRegistry, config: EngineConfig) -> Result<Self, FeatureError> {
        if !registry.is_sealed() {
            return Err(RegistryError::NotSealed.into());
        }
        let catalogue = registry.snapshot();

        let mut overrides = HashMap::new();
        for (kind, provider) in config.overrides.iter().sorted() {
            overrides.extend(catalogue.resolve_override(kind, provider)?);
        }

        let resolver = Self {
            catalogue,
            config,
            overrides,
            reporter: ResolutionReporter::new(),
        };
        if resolver.config.validate_plans {
            let features = resolver.catalogue.supported_features();
            for &key in &features {
                resolver.plan(key)?;
            }
            debug!(features = features.len(), "Validated provider plans.");
        }
        Ok(resolver)
    }

    pub fn with_reporter(mut self, reporter: ResolutionReporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Providers to run, in order, to compute `key` under this resolver's policy.
    pub fn plan(&self, key: FeatureKey) -> Result<Vec<ProviderInfo>, FeatureError> {
        self.catalogue.plan(key, self.policy())
    }

    /// Returns the value of `K` on `node`, computing it if necessary.
    ///
    /// # Errors
    ///
    /// Any resolution failure, or [`FeatureError::NotComputed`] when the selected provider
    /// ran but wrote nothing for this node.
    pub fn get<K: FeatureKind>(
        &self,
        structure: &mut Structure,
        node: impl Into<NodeId>,
    ) -> Result<Arc<K::Value>, FeatureError> {
        let node = node.into();
        self.resolve(structure, node, FeatureKey::of::<K>(), None)?;
        Self::store_of(structure, node)?.get::<K>()
    }

    /// Like [`get`](Self::get), but computes `K` with the named provider.
    ///
    /// A value cached by another provider does not count; the named provider runs unless it
    /// already completed on the target.
    pub fn get_with<K: FeatureKind>(
        &self,
        structure: &mut Structure,
        node: impl Into<NodeId>,
        provider: &str,
    ) -> Result<Arc<K::Value>, FeatureError> {
        let node = node.into();
        self.resolve(structure, node, FeatureKey::of::<K>(), Some(provider))?;
        Self::store_of(structure, node)?.get::<K>()
    }

    /// Returns the list of `K` on `node` in insertion order, computing it if necessary.
    /// A node the provider did not annotate yields an empty list.
    pub fn get_list<K: FeatureKind>(
        &self,
        structure: &mut Structure,
        node: impl Into<NodeId>,
    ) -> Result<Vec<Arc<K::Value>>, FeatureError> {
        let node = node.into();
        let key = FeatureKey::of::<K>();
        self.resolve(structure, node, key, None)?;
        Self::list_or_empty::<K::Value>(structure, node, key)
    }

    /// Dynamic variant of [`get`](Self::get): the expected value type is checked at runtime.
    pub fn get_as<T: Send + Sync + 'static>(
        &self,
        structure: &mut Structure,
        node: impl Into<NodeId>,
        key: FeatureKey,
    ) -> Result<Arc<T>, FeatureError> {
        let node = node.into();
        self.resolve(structure, node, key, None)?;
        Self::store_of(structure, node)?.get_as::<T>(key)
    }

    /// Runs the provider of `key` over every node of its scope below `node`.
    ///
    /// # Return
    ///
    /// The number of provider executions; targets the provider already covered are skipped.
    #[instrument(skip_all, name = "annotation_pass", fields(kind = %key))]
    pub fn annotate(
        &self,
        structure: &mut Structure,
        node: impl Into<NodeId>,
        key: FeatureKey,
    ) -> Result<usize, FeatureError> {
        let node = node.into();
        Self::store_of(structure, node)?;
        let provider = self.catalogue.select(key, None, self.policy())?;
        let scope = provider.descriptor.scope();
        let targets = if node.kind() <= scope {
            vec![Self::execution_target(structure, node, scope)?]
        } else {
            structure.descendants(node, scope)
        };

        let mut executed = 0;
        for target in targets {
            if Self::is_covered(structure, provider.id, target)? {
                continue;
            }
            let mut stack = Vec::new();
            self.run(structure, provider, target, &mut stack)?;
            executed += 1;
        }
        info!(
            provider = provider.name(),
            executed, "Annotation pass complete."
        );
        Ok(executed)
    }

    #[instrument(level = "debug", skip_all, fields(kind = %key, node = ?node))]
    fn resolve(
        &self,
        structure: &mut Structure,
        node: NodeId,
        key: FeatureKey,
        explicit: Option<&str>,
    ) -> Result<(), FeatureError> {
        let mut stack = Vec::new();
        self.ensure(structure, node, key, explicit, &mut stack)
    }

    /// Makes sure `key` has been computed for `node`, running its provider if needed.
    pub(crate) fn ensure(
        &self,
        structure: &mut Structure,
        node: NodeId,
        key: FeatureKey,
        explicit: Option<&str>,
        stack: &mut Vec<Frame>,
    ) -> Result<(), FeatureError> {
        if explicit.is_none() && Self::store_of(structure, node)?.contains_key(&key) {
            trace!(kind = key.name(), node = ?node, "Feature cache hit.");
            self.reporter.report(ResolutionEvent::CacheHit {
                kind: key.name(),
                node,
            });
            return Ok(());
        }

        let provider = self.catalogue.select(key, explicit, self.policy())?;
        let scope = provider.descriptor.scope();
        if node.kind() > scope {
            return self.cover(structure, provider, node, stack);
        }
        let target = Self::execution_target(structure, node, scope)?;
        self.run(structure, provider, target, stack)
    }

    /// Runs a provider over `node`, which is coarser than the provider's scope.
    ///
    /// The subtree is annotated in one pass unless some scope nodes below `node` are already
    /// covered, in which case the provider runs on each remaining scope node instead.
    fn cover(
        &self,
        structure: &mut Structure,
        provider: &RegisteredProvider,
        node: NodeId,
        stack: &mut Vec<Frame>,
    ) -> Result<(), FeatureError> {
        let units = structure.descendants(node, provider.descriptor.scope());
        let mut remaining = Vec::with_capacity(units.len());
        for &unit in &units {
            if !Self::is_covered(structure, provider.id, unit)? {
                remaining.push(unit);
            }
        }

        if remaining.len() == units.len() {
            return self.run(structure, provider, node, stack);
        }
        if remaining.is_empty() {
            trace!(provider = provider.name(), "Provider already covers every scope node.");
            self.reporter.report(ResolutionEvent::AlreadyComputed {
                provider: provider.name().to_string(),
                target: node,
            });
            return Ok(());
        }

        debug!(
            provider = provider.name(),
            remaining = remaining.len(),
            covered = units.len() - remaining.len(),
            "Completing a partially covered subtree."
        );
        for unit in remaining {
            self.run(structure, provider, unit, stack)?;
        }
        Ok(())
    }

    fn run(
        &self,
        structure: &mut Structure,
        provider: &RegisteredProvider,
        target: NodeId,
        stack: &mut Vec<Frame>,
    ) -> Result<(), FeatureError> {
        if Self::is_covered(structure, provider.id, target)? {
            trace!(provider = provider.name(), "Provider already completed on target.");
            self.reporter.report(ResolutionEvent::AlreadyComputed {
                provider: provider.name().to_string(),
                target,
            });
            return Ok(());
        }

        let frame = (provider.id, target);
        if let Some(start) = stack.iter().position(|&entry| entry == frame) {
            let cycle = stack[start..]
                .iter()
                .chain(std::iter::once(&frame))
                .map(|&entry| self.frame_label(entry))
                .collect();
            return Err(FeatureError::CyclicDependency { cycle });
        }

        stack.push(frame);
        let result = self.execute(structure, provider, target, stack);
        stack.pop();
        result
    }

    #[instrument(level = "debug", skip_all, fields(provider = provider.name(), target = ?target))]
    fn execute(
        &self,
        structure: &mut Structure,
        provider: &RegisteredProvider,
        target: NodeId,
        stack: &mut Vec<Frame>,
    ) -> Result<(), FeatureError> {
        for &requirement in provider.descriptor.required_kinds() {
            self.ensure(structure, target, requirement, None, stack)?;
        }

        self.reporter.report(ResolutionEvent::ProviderStart {
            provider: provider.name().to_string(),
            target,
        });
        let mut ctx = ComputeContext::new(self, structure, stack, provider, target);
        let outcome = provider.descriptor.entry().compute(&mut ctx, target);
        let pending = ctx.into_pending();

        if let Err(error) = outcome {
            debug!(%error, "Provider failed; its writes are discarded.");
            self.reporter.report(ResolutionEvent::ProviderFailed {
                provider: provider.name().to_string(),
                target,
            });
            return Err(error);
        }

        let writes = commit(structure, pending)?;
        let scope = provider.descriptor.scope();
        let mut covered = vec![target];
        if target.kind() > scope {
            covered.extend(structure.descendants(target, scope));
        }
        for node in covered {
            Self::store_of_mut(structure, node)?.mark_completed(provider.id);
        }
        debug!(writes, "Provider finished.");
        self.reporter.report(ResolutionEvent::ProviderFinish {
            provider: provider.name().to_string(),
            target,
            writes,
        });
        Ok(())
    }

    fn policy(&self) -> SelectionPolicy<'_> {
        SelectionPolicy {
            overrides: &self.overrides,
            tie_break: self.config.tie_break,
            preferred_origin: self.config.preferred_origin,
        }
    }

    fn frame_label(&self, (id, node): Frame) -> String {
        let name = self
            .catalogue
            .provider(id)
            .map(RegisteredProvider::name)
            .unwrap_or("<unknown>");
        format!("{}@{}", name, node.kind())
    }

    /// Whether `provider` completed on `node` or on one of its ancestors.
    fn is_covered(
        structure: &Structure,
        provider: ProviderId,
        node: NodeId,
    ) -> Result<bool, FeatureError> {
        if Self::store_of(structure, node)?.has_completed(provider) {
            return Ok(true);
        }
        Ok(structure.ancestors(node).any(|ancestor| {
            structure
                .feature_store(ancestor)
                .is_some_and(|store| store.has_completed(provider))
        }))
    }

    /// The node a provider of the given scope runs on to cover `node`.
    fn execution_target(
        structure: &Structure,
        node: NodeId,
        scope: NodeKind,
    ) -> Result<NodeId, FeatureError> {
        if node.kind() < scope {
            structure
                .ancestor_or_self(node, scope)
                .ok_or(FeatureError::NodeNotFound(node))
        } else {
            Ok(node)
        }
    }

    pub(crate) fn store_of(structure: &Structure, node: NodeId) -> Result<&FeatureStore, FeatureError> {
        structure
            .feature_store(node)
            .ok_or(FeatureError::NodeNotFound(node))
    }

    fn store_of_mut(
        structure: &mut Structure,
        node: NodeId,
    ) -> Result<&mut FeatureStore, FeatureError> {
        structure
            .feature_store_mut(node)
            .ok_or(FeatureError::NodeNotFound(node))
    }

    pub(crate) fn list_or_empty<T: Send + Sync + 'static>(
        structure: &Structure,
        node: NodeId,
        key: FeatureKey,
    ) -> Result<Vec<Arc<T>>, FeatureError> {
        match Self::store_of(structure, node)?.get_list_as::<T>(key) {
            Err(FeatureError::NotComputed { .. }) => Ok(Vec::new()),
            other => other,
        }
    }
}
