use super::config::{EngineConfig, TieBreak};
use super::error::{FeatureError, RegistryError};
use super::provider::{ProviderDescriptor, ProviderOrigin};
use crate::core::models::ids::NodeKind;
use crate::features::kind::{FeatureKey, FeatureKind, ProviderId};
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, info, trace};

static NEXT_REGISTRY_UID: AtomicU64 = AtomicU64::new(1);
static GLOBAL_REGISTRY: OnceLock<ProviderRegistry> = OnceLock::new();

/// Read-only summary of a registered provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    pub id: ProviderId,
    pub name: String,
    pub scope: NodeKind,
    pub produces: Vec<FeatureKey>,
    pub requires: Vec<FeatureKey>,
    pub origin: ProviderOrigin,
    pub priority: i32,
}

#[derive(Debug, Clone)]
pub(crate) struct RegisteredProvider {
    pub(crate) id: ProviderId,
    pub(crate) descriptor: ProviderDescriptor,
}

impl RegisteredProvider {
    pub(crate) fn name(&self) -> &str {
        self.descriptor.name()
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            id: self.id,
            name: self.descriptor.name().to_string(),
            scope: self.descriptor.scope(),
            produces: self.descriptor.produced_kinds().to_vec(),
            requires: self.descriptor.required_kinds().to_vec(),
            origin: self.descriptor.provider_origin(),
            priority: self.descriptor.provider_priority(),
        }
    }
}

/// The knobs that decide which claimant of a kind is used.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SelectionPolicy<'a> {
    pub(crate) overrides: &'a HashMap<FeatureKey, usize>,
    pub(crate) tie_break: TieBreak,
    pub(crate) preferred_origin: Option<ProviderOrigin>,
}

/// The registered providers and the indexes over them.
#[derive(Debug, Clone, Default)]
pub(crate) struct Catalogue {
    uid: u64,
    providers: Vec<RegisteredProvider>,
    by_name: HashMap<String, usize>,
    /// Claimants per kind, in registration order.
    producers: HashMap<FeatureKey, Vec<usize>>,
    /// Kinds by their declared name; names are not required to be unique.
    kinds_by_name: HashMap<&'static str, Vec<FeatureKey>>,
    bindings: HashMap<FeatureKey, usize>,
}

impl Catalogue {
    pub(crate) fn provider(&self, id: ProviderId) -> Option<&RegisteredProvider> {
        (id.registry == self.uid)
            .then(|| self.providers.get(id.index))
            .flatten()
    }

    pub(crate) fn by_name(&self, name: &str) -> Option<&RegisteredProvider> {
        self.by_name.get(name).map(|&index| &self.providers[index])
    }

    fn index_kind(&mut self, key: FeatureKey) {
        let keys = self.kinds_by_name.entry(key.name()).or_default();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    /// Maps a (kind name, provider name) pair onto concrete bindings.
    pub(crate) fn resolve_override(
        &self,
        kind: &str,
        provider: &str,
    ) -> Result<Vec<(FeatureKey, usize)>, RegistryError> {
        let keys = self
            .kinds_by_name
            .get(kind)
            .ok_or_else(|| RegistryError::UnknownFeature(kind.to_string()))?;
        let &index = self
            .by_name
            .get(provider)
            .ok_or_else(|| RegistryError::UnknownProvider(provider.to_string()))?;
        let descriptor = &self.providers[index].descriptor;
        let bound: Vec<_> = keys
            .iter()
            .filter(|key| descriptor.is_producer_of(key))
            .map(|&key| (key, index))
            .collect();
        if bound.is_empty() {
            return Err(RegistryError::NotAProducer {
                provider: provider.to_string(),
                kind: kind.to_string(),
            });
        }
        Ok(bound)
    }

    /// Picks the provider that computes `key`.
    ///
    /// Order of precedence: an explicitly named provider, a policy override, a registry
    /// binding, the kind's declared default provider, then the tie-break over all claimants.
    pub(crate) fn select(
        &self,
        key: FeatureKey,
        explicit: Option<&str>,
        policy: SelectionPolicy<'_>,
    ) -> Result<&RegisteredProvider, FeatureError> {
        if let Some(name) = explicit {
            let provider = self
                .by_name(name)
                .ok_or_else(|| RegistryError::UnknownProvider(name.to_string()))?;
            if !provider.descriptor.is_producer_of(&key) {
                return Err(RegistryError::NotAProducer {
                    provider: name.to_string(),
                    kind: key.name().to_string(),
                }
                .into());
            }
            return Ok(provider);
        }

        let claimants = match self.producers.get(&key) {
            Some(claimants) if !claimants.is_empty() => claimants,
            _ => return Err(FeatureError::Unresolvable { kind: key.name() }),
        };

        if let Some(&index) = policy.overrides.get(&key).or_else(|| self.bindings.get(&key)) {
            return Ok(&self.providers[index]);
        }

        if let Some(default_name) = key.default_provider() {
            match self.by_name(default_name) {
                Some(provider) if provider.descriptor.is_producer_of(&key) => return Ok(provider),
                _ => debug!(
                    kind = key.name(),
                    default = default_name,
                    "Declared default provider is not registered for this kind; using the tie-break."
                ),
            }
        }

        if claimants.len() == 1 {
            return Ok(&self.providers[claimants[0]]);
        }

        let mut candidates: Vec<usize> = claimants.clone();
        if let Some(origin) = policy.preferred_origin {
            let preferred: Vec<usize> = candidates
                .iter()
                .copied()
                .filter(|&index| self.providers[index].descriptor.provider_origin() == origin)
                .collect();
            if !preferred.is_empty() {
                candidates = preferred;
            }
        }

        let chosen = match policy.tie_break {
            TieBreak::LastRegistered => candidates.last().copied(),
            TieBreak::FirstRegistered => candidates.first().copied(),
            TieBreak::Priority => candidates.iter().copied().reduce(|best, index| {
                let best_priority = self.providers[best].descriptor.provider_priority();
                if self.providers[index].descriptor.provider_priority() <= best_priority {
                    index
                } else {
                    best
                }
            }),
            TieBreak::Reject if candidates.len() == 1 => candidates.first().copied(),
            TieBreak::Reject => {
                return Err(FeatureError::Ambiguous {
                    kind: key.name(),
                    candidates: candidates
                        .iter()
                        .map(|&index| self.providers[index].name().to_string())
                        .collect(),
                });
            }
        };
        chosen
            .map(|index| &self.providers[index])
            .ok_or(FeatureError::Unresolvable { kind: key.name() })
    }

    /// Static execution order for `key`: every provider appears after the providers it
    /// depends on, and exactly once.
    pub(crate) fn plan(
        &self,
        key: FeatureKey,
        policy: SelectionPolicy<'_>,
    ) -> Result<Vec<ProviderInfo>, FeatureError> {
        let mut order = Vec::new();
        let mut done = HashSet::new();
        let mut visiting = Vec::new();
        self.visit(key, policy, &mut visiting, &mut done, &mut order)?;
        Ok(order)
    }

    fn visit(
        &self,
        key: FeatureKey,
        policy: SelectionPolicy<'_>,
        visiting: &mut Vec<usize>,
        done: &mut HashSet<usize>,
        order: &mut Vec<ProviderInfo>,
    ) -> Result<(), FeatureError> {
        let provider = self.select(key, None, policy)?;
        let index = provider.id.index;
        if done.contains(&index) {
            return Ok(());
        }
        if let Some(start) = visiting.iter().position(|&i| i == index) {
            let cycle = visiting[start..]
                .iter()
                .chain(std::iter::once(&index))
                .map(|&i| self.providers[i].name().to_string())
                .collect();
            return Err(FeatureError::CyclicDependency { cycle });
        }

        visiting.push(index);
        for &requirement in provider.descriptor.required_kinds() {
            self.visit(requirement, policy, visiting, done, order)?;
        }
        visiting.pop();

        done.insert(index);
        order.push(provider.info());
        Ok(())
    }

    pub(crate) fn supported_features(&self) -> Vec<FeatureKey> {
        self.providers
            .iter()
            .flat_map(|provider| provider.descriptor.produced_kinds().iter().copied())
            .unique()
            .collect()
    }
}

/// Catalogue of feature providers with a two-phase lifecycle.
///
/// Providers are registered during start-up (concurrently if need be); [`seal`](Self::seal)
/// then freezes the catalogue, after which only lookups are allowed and
/// [`Resolver`](super::resolver::Resolver)s can be built over it.
#[derive(Debug)]
pub struct ProviderRegistry {
    catalogue: RwLock<Arc<Catalogue>>,
    sealed: AtomicBool,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        let catalogue = Catalogue {
            uid: NEXT_REGISTRY_UID.fetch_add(1, Ordering::Relaxed),
            ..Catalogue::default()
        };
        Self {
            catalogue: RwLock::new(Arc::new(catalogue)),
            sealed: AtomicBool::new(false),
        }
    }

    /// The process-wide registry, created empty on first use.
    pub fn global() -> &'static ProviderRegistry {
        GLOBAL_REGISTRY.get_or_init(ProviderRegistry::new)
    }

    /// Adds a provider to the catalogue.
    ///
    /// # Arguments
    ///
    /// * `descriptor` - The provider's declarations and entry point.
    ///
    /// # Return
    ///
    /// The id of the new provider.
    ///
    /// # Errors
    ///
    /// Fails if the registry is sealed, if the name is taken, or if the descriptor declares
    /// no output.
    pub fn register(&self, descriptor: ProviderDescriptor) -> Result<ProviderId, RegistryError> {
        let mut guard = self
            .catalogue
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if self.sealed.load(Ordering::Acquire) {
            return Err(RegistryError::Sealed(descriptor.name().to_string()));
        }
        if guard.by_name.contains_key(descriptor.name()) {
            return Err(RegistryError::DuplicateProvider(descriptor.name().to_string()));
        }
        if descriptor.produced_kinds().is_empty() {
            return Err(RegistryError::NothingProduced(descriptor.name().to_string()));
        }

        let catalogue = Arc::make_mut(&mut guard);
        let index = catalogue.providers.len();
        let id = ProviderId::new(catalogue.uid, index);
        for &key in descriptor.produced_kinds() {
            catalogue.producers.entry(key).or_default().push(index);
            catalogue.index_kind(key);
        }
        for &key in descriptor.required_kinds() {
            catalogue.index_kind(key);
        }
        catalogue
            .by_name
            .insert(descriptor.name().to_string(), index);
        debug!(
            provider = descriptor.name(),
            scope = %descriptor.scope(),
            produces = %descriptor.produced_kinds().iter().join(", "),
            "Registered feature provider."
        );
        catalogue.providers.push(RegisteredProvider { id, descriptor });
        Ok(id)
    }

    /// Makes `provider` the default producer of `K`, taking precedence over the kind's
    /// declared default and over the tie-break.
    pub fn bind_default<K: FeatureKind>(&self, provider: &str) -> Result<(), RegistryError> {
        self.bind(K::NAME, provider)
    }

    /// Applies the overrides of a configuration as registry bindings.
    pub fn apply_config(&self, config: &EngineConfig) -> Result<(), RegistryError> {
        for (kind, provider) in config.overrides.iter().sorted() {
            self.bind(kind, provider)?;
        }
        Ok(())
    }

    fn bind(&self, kind: &str, provider: &str) -> Result<(), RegistryError> {
        let mut guard = self
            .catalogue
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if self.sealed.load(Ordering::Acquire) {
            return Err(RegistryError::Sealed(provider.to_string()));
        }
        let bindings = guard.resolve_override(kind, provider)?;
        let catalogue = Arc::make_mut(&mut guard);
        for (key, index) in bindings {
            trace!(kind, provider, "Bound default provider.");
            catalogue.bindings.insert(key, index);
        }
        Ok(())
    }

    /// Ends the registration phase. Sealing twice is a no-op.
    pub fn seal(&self) {
        let guard = self
            .catalogue
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if !self.sealed.swap(true, Ordering::AcqRel) {
            info!(
                providers = guard.providers.len(),
                features = guard.producers.len(),
                "Provider registry sealed."
            );
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    pub(crate) fn snapshot(&self) -> Arc<Catalogue> {
        Arc::clone(
            &self
                .catalogue
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// All providers in registration order.
    pub fn providers(&self) -> Vec<ProviderInfo> {
        self.snapshot()
            .providers
            .iter()
            .map(RegisteredProvider::info)
            .collect()
    }

    pub fn provider_by_name(&self, name: &str) -> Option<ProviderInfo> {
        self.snapshot().by_name(name).map(RegisteredProvider::info)
    }

    /// Every kind at least one provider produces, in registration order.
    pub fn supported_features(&self) -> Vec<FeatureKey> {
        self.snapshot().supported_features()
    }

    /// The provider that would compute `K` with the default policy.
    pub fn resolve_provider<K: FeatureKind>(&self) -> Result<ProviderInfo, FeatureError> {
        let overrides = HashMap::new();
        self.snapshot()
            .select(FeatureKey::of::<K>(), None, default_policy(&overrides))
            .map(RegisteredProvider::info)
    }

    /// Providers to run, in order, to compute `key` with the default policy.
    ///
    /// # Errors
    ///
    /// Fails with [`FeatureError::CyclicDependency`] if the requirements loop, and with the
    /// selection errors of any kind on the way.
    pub fn plan(&self, key: FeatureKey) -> Result<Vec<ProviderInfo>, FeatureError> {
        let overrides = HashMap::new();
        self.snapshot().plan(key, default_policy(&overrides))
    }
}

fn default_policy(overrides: &HashMap<FeatureKey, usize>) -> SelectionPolicy<'_> {
    SelectionPolicy {
        overrides,
        tie_break: TieBreak::default(),
        preferred_origin: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::NodeId;
    use crate::engine::context::ComputeContext;

    struct Alpha;
    impl FeatureKind for Alpha {
        type Value = u32;
        const NAME: &'static str = "Alpha";
    }

    struct Beta;
    impl FeatureKind for Beta {
        type Value = u32;
        const NAME: &'static str = "Beta";
    }

    struct Gamma;
    impl FeatureKind for Gamma {
        type Value = u32;
        const NAME: &'static str = "Gamma";
        const DEFAULT_PROVIDER: Option<&'static str> = Some("gamma-canonical");
    }

    fn noop(_: &mut ComputeContext<'_>, _: NodeId) -> Result<(), FeatureError> {
        Ok(())
    }

    fn provider(name: &str) -> ProviderDescriptor {
        ProviderDescriptor::from_fn(name, NodeKind::Structure, noop)
    }

    fn names(infos: &[ProviderInfo]) -> Vec<&str> {
        infos.iter().map(|info| info.name.as_str()).collect()
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn registration_is_rejected_after_sealing() {
            let registry = ProviderRegistry::new();
            registry.register(provider("a").produces::<Alpha>()).unwrap();
            registry.seal();
            registry.seal();

            assert!(registry.is_sealed());
            assert_eq!(
                registry.register(provider("b").produces::<Beta>()),
                Err(RegistryError::Sealed("b".to_string()))
            );
            assert_eq!(
                registry.bind_default::<Alpha>("a"),
                Err(RegistryError::Sealed("a".to_string()))
            );
        }

        #[test]
        fn duplicate_names_and_empty_outputs_are_rejected() {
            let registry = ProviderRegistry::new();
            registry.register(provider("a").produces::<Alpha>()).unwrap();

            assert_eq!(
                registry.register(provider("a").produces::<Beta>()),
                Err(RegistryError::DuplicateProvider("a".to_string()))
            );
            assert_eq!(
                registry.register(provider("empty")),
                Err(RegistryError::NothingProduced("empty".to_string()))
            );
        }

        #[test]
        fn ids_are_unique_across_registries() {
            let first = ProviderRegistry::new();
            let second = ProviderRegistry::new();
            let a = first.register(provider("a").produces::<Alpha>()).unwrap();
            let b = second.register(provider("a").produces::<Alpha>()).unwrap();
            assert_eq!(a.index(), b.index());
            assert_ne!(a, b);
        }

        #[test]
        fn global_registry_is_a_single_instance() {
            assert!(std::ptr::eq(
                ProviderRegistry::global(),
                ProviderRegistry::global()
            ));
        }
    }

    mod selection {
        use super::*;

        fn select_name(catalogue: &Catalogue, key: FeatureKey, policy: SelectionPolicy<'_>) -> String {
            catalogue.select(key, None, policy).unwrap().name().to_string()
        }

        #[test]
        fn unclaimed_kind_is_unresolvable() {
            let registry = ProviderRegistry::new();
            assert!(matches!(
                registry.resolve_provider::<Alpha>(),
                Err(FeatureError::Unresolvable { kind: "Alpha" })
            ));
        }

        #[test]
        fn tie_break_policies_pick_the_expected_claimant() {
            let registry = ProviderRegistry::new();
            registry.register(provider("low").produces::<Alpha>().priority(1)).unwrap();
            registry.register(provider("mid").produces::<Alpha>().priority(0)).unwrap();
            registry.register(provider("high").produces::<Alpha>().priority(5)).unwrap();
            let catalogue = registry.snapshot();
            let overrides = HashMap::new();
            let key = FeatureKey::of::<Alpha>();
            let policy = |tie_break| SelectionPolicy {
                overrides: &overrides,
                tie_break,
                preferred_origin: None,
            };

            assert_eq!(select_name(&catalogue, key, policy(TieBreak::LastRegistered)), "high");
            assert_eq!(select_name(&catalogue, key, policy(TieBreak::FirstRegistered)), "low");
            assert_eq!(select_name(&catalogue, key, policy(TieBreak::Priority)), "mid");
            match catalogue.select(key, None, policy(TieBreak::Reject)) {
                Err(FeatureError::Ambiguous { kind, candidates }) => {
                    assert_eq!(kind, "Alpha");
                    assert_eq!(candidates, vec!["low", "mid", "high"]);
                }
                other => panic!("expected ambiguity, got {:?}", other.map(|p| p.name().to_string())),
            }
        }

        #[test]
        fn preferred_origin_narrows_the_candidates() {
            let registry = ProviderRegistry::new();
            registry
                .register(provider("annotated").produces::<Alpha>())
                .unwrap();
            registry
                .register(
                    provider("predicted")
                        .produces::<Alpha>()
                        .origin(ProviderOrigin::Prediction),
                )
                .unwrap();
            let catalogue = registry.snapshot();
            let overrides = HashMap::new();
            let policy = SelectionPolicy {
                overrides: &overrides,
                tie_break: TieBreak::LastRegistered,
                preferred_origin: Some(ProviderOrigin::Annotation),
            };
            assert_eq!(
                select_name(&catalogue, FeatureKey::of::<Alpha>(), policy),
                "annotated"
            );
        }

        #[test]
        fn declared_default_beats_tie_break_and_binding_beats_default() {
            let registry = ProviderRegistry::new();
            registry.register(provider("gamma-canonical").produces::<Gamma>()).unwrap();
            registry.register(provider("gamma-other").produces::<Gamma>()).unwrap();
            assert_eq!(registry.resolve_provider::<Gamma>().unwrap().name, "gamma-canonical");

            registry.bind_default::<Gamma>("gamma-other").unwrap();
            assert_eq!(registry.resolve_provider::<Gamma>().unwrap().name, "gamma-other");
        }

        #[test]
        fn missing_declared_default_falls_back_to_the_tie_break() {
            let registry = ProviderRegistry::new();
            registry.register(provider("first").produces::<Gamma>()).unwrap();
            registry.register(provider("second").produces::<Gamma>()).unwrap();
            assert_eq!(registry.resolve_provider::<Gamma>().unwrap().name, "second");
        }

        #[test]
        fn explicit_provider_must_produce_the_kind() {
            let registry = ProviderRegistry::new();
            registry.register(provider("a").produces::<Alpha>()).unwrap();
            let catalogue = registry.snapshot();
            let overrides = HashMap::new();
            let policy = default_policy(&overrides);

            assert_eq!(
                catalogue
                    .select(FeatureKey::of::<Alpha>(), Some("a"), policy)
                    .unwrap()
                    .name(),
                "a"
            );
            assert!(matches!(
                catalogue.select(FeatureKey::of::<Beta>(), Some("a"), policy),
                Err(FeatureError::Registry(RegistryError::NotAProducer { .. }))
            ));
            assert!(matches!(
                catalogue.select(FeatureKey::of::<Alpha>(), Some("zzz"), policy),
                Err(FeatureError::Registry(RegistryError::UnknownProvider(_)))
            ));
        }

        #[test]
        fn apply_config_validates_names() {
            let registry = ProviderRegistry::new();
            registry.register(provider("a").produces::<Alpha>()).unwrap();
            registry.register(provider("b").produces::<Beta>()).unwrap();

            let mut config = EngineConfig::default();
            config.overrides.insert("Alpha".into(), "b".into());
            assert_eq!(
                registry.apply_config(&config),
                Err(RegistryError::NotAProducer {
                    provider: "b".into(),
                    kind: "Alpha".into()
                })
            );

            config.overrides.clear();
            config.overrides.insert("Delta".into(), "a".into());
            assert_eq!(
                registry.apply_config(&config),
                Err(RegistryError::UnknownFeature("Delta".into()))
            );

            config.overrides.clear();
            config.overrides.insert("Alpha".into(), "nobody".into());
            assert_eq!(
                registry.apply_config(&config),
                Err(RegistryError::UnknownProvider("nobody".into()))
            );
        }
    }

    mod planning {
        use super::*;

        #[test]
        fn plan_lists_dependencies_first_and_once() {
            let registry = ProviderRegistry::new();
            registry.register(provider("alpha").produces::<Alpha>()).unwrap();
            registry
                .register(provider("beta").produces::<Beta>().requires::<Alpha>())
                .unwrap();
            registry
                .register(
                    provider("gamma-canonical")
                        .produces::<Gamma>()
                        .requires::<Alpha>()
                        .requires::<Beta>(),
                )
                .unwrap();

            let plan = registry.plan(FeatureKey::of::<Gamma>()).unwrap();
            assert_eq!(names(&plan), vec!["alpha", "beta", "gamma-canonical"]);
        }

        #[test]
        fn plan_reports_cycles_with_the_full_path() {
            let registry = ProviderRegistry::new();
            registry
                .register(provider("p1").produces::<Alpha>().requires::<Beta>())
                .unwrap();
            registry
                .register(provider("p2").produces::<Beta>().requires::<Alpha>())
                .unwrap();

            match registry.plan(FeatureKey::of::<Alpha>()) {
                Err(FeatureError::CyclicDependency { cycle }) => {
                    assert_eq!(cycle, vec!["p1", "p2", "p1"]);
                }
                other => panic!("expected a cycle, got {:?}", other),
            }
        }

        #[test]
        fn introspection_reports_providers_and_features() {
            let registry = ProviderRegistry::new();
            registry.register(provider("a").produces::<Alpha>()).unwrap();
            registry
                .register(provider("ab").produces::<Alpha>().produces::<Beta>())
                .unwrap();

            assert_eq!(names(&registry.providers()), vec!["a", "ab"]);
            assert_eq!(
                registry.supported_features(),
                vec![FeatureKey::of::<Alpha>(), FeatureKey::of::<Beta>()]
            );
            let info = registry.provider_by_name("ab").unwrap();
            assert_eq!(info.produces.len(), 2);
            assert_eq!(info.scope, NodeKind::Structure);
            assert!(registry.provider_by_name("zzz").is_none());
        }
    }
}
