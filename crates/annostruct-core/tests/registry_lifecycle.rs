mod common;

use annostruct::core::models::ids::{NodeId, NodeKind};
use annostruct::engine::config::{ConfigLoadError, EngineConfig, EngineConfigBuilder, TieBreak};
use annostruct::engine::error::{FeatureError, RegistryError};
use annostruct::engine::provider::{ProviderDescriptor, ProviderOrigin};
use annostruct::engine::registry::ProviderRegistry;
use annostruct::engine::resolver::Resolver;
use annostruct::features::kind::{FeatureKey, FeatureKind};
use common::create_test_structure;
use std::io::Write;
use tempfile::NamedTempFile;

struct Label;
impl FeatureKind for Label {
    type Value = String;
    const NAME: &'static str = "Label";
}

struct Preferred;
impl FeatureKind for Preferred {
    type Value = String;
    const NAME: &'static str = "Preferred";
    const DEFAULT_PROVIDER: Option<&'static str> = Some("curated");
}

fn labeller(name: &'static str) -> ProviderDescriptor {
    ProviderDescriptor::from_fn(name, NodeKind::Structure, move |ctx, node| {
        ctx.set::<Label>(node, name.to_string())
    })
    .produces::<Label>()
}

/// Registers "alpha" (priority 5, prediction), "beta" (priority 1) and "gamma" (priority 1).
fn competing_registry() -> ProviderRegistry {
    let registry = ProviderRegistry::new();
    registry
        .register(
            labeller("alpha")
                .priority(5)
                .origin(ProviderOrigin::Prediction),
        )
        .unwrap();
    registry.register(labeller("beta").priority(1)).unwrap();
    registry.register(labeller("gamma").priority(1)).unwrap();
    registry
}

fn label_with(registry: &ProviderRegistry, config: EngineConfig) -> Result<String, FeatureError> {
    registry.seal();
    let resolver = Resolver::new(registry, config)?;
    let mut structure = create_test_structure();
    resolver
        .get::<Label>(&mut structure, NodeId::Structure)
        .map(|label| label.to_string())
}

mod lifecycle {
    use super::*;

    #[test]
    fn registration_is_closed_once_sealed() {
        let registry = ProviderRegistry::new();
        registry.register(labeller("alpha")).unwrap();
        assert!(!registry.is_sealed());

        registry.seal();
        registry.seal();

        assert!(registry.is_sealed());
        assert_eq!(
            registry.register(labeller("beta")),
            Err(RegistryError::Sealed("beta".to_string()))
        );
        assert_eq!(
            registry.bind_default::<Label>("alpha"),
            Err(RegistryError::Sealed("alpha".to_string()))
        );
        assert_eq!(registry.providers().len(), 1);
    }

    #[test]
    fn invalid_registrations_are_rejected() {
        let registry = ProviderRegistry::new();
        registry.register(labeller("alpha")).unwrap();

        assert_eq!(
            registry.register(labeller("alpha")),
            Err(RegistryError::DuplicateProvider("alpha".to_string()))
        );
        assert_eq!(
            registry.register(ProviderDescriptor::from_fn(
                "idle",
                NodeKind::Structure,
                |_ctx, _node| Ok(())
            )),
            Err(RegistryError::NothingProduced("idle".to_string()))
        );
    }

    #[test]
    fn providers_can_be_registered_from_several_threads() {
        let registry = ProviderRegistry::new();
        std::thread::scope(|scope| {
            for name in ["t1", "t2", "t3", "t4"] {
                let registry = &registry;
                scope.spawn(move || registry.register(labeller(name)).unwrap());
            }
        });
        registry.seal();

        let mut names: Vec<String> = registry.providers().into_iter().map(|p| p.name).collect();
        names.sort();
        assert_eq!(names, vec!["t1", "t2", "t3", "t4"]);
    }

    #[test]
    fn global_registry_is_a_single_instance() {
        assert!(std::ptr::eq(ProviderRegistry::global(), ProviderRegistry::global()));
    }
}

mod selection_policy {
    use super::*;

    #[test]
    fn last_registered_claimant_wins_by_default() {
        let registry = competing_registry();
        assert_eq!(label_with(&registry, EngineConfig::default()).unwrap(), "gamma");
    }

    #[test]
    fn first_registered_claimant_can_be_preferred() {
        let registry = competing_registry();
        let config = EngineConfigBuilder::new()
            .tie_break(TieBreak::FirstRegistered)
            .build();
        assert_eq!(label_with(&registry, config).unwrap(), "alpha");
    }

    #[test]
    fn lowest_priority_wins_and_ties_go_to_the_later_registration() {
        let registry = competing_registry();
        let config = EngineConfigBuilder::new().tie_break(TieBreak::Priority).build();
        assert_eq!(label_with(&registry, config).unwrap(), "gamma");
    }

    #[test]
    fn reject_reports_every_candidate() {
        let registry = competing_registry();
        let config = EngineConfigBuilder::new().tie_break(TieBreak::Reject).build();
        match label_with(&registry, config) {
            Err(FeatureError::Ambiguous { kind, candidates }) => {
                assert_eq!(kind, "Label");
                assert_eq!(candidates, vec!["alpha", "beta", "gamma"]);
            }
            other => panic!("expected an ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn preferred_origin_narrows_the_candidates_first() {
        let registry = competing_registry();
        let config = EngineConfigBuilder::new()
            .tie_break(TieBreak::Reject)
            .preferred_origin(ProviderOrigin::Prediction)
            .build();
        assert_eq!(label_with(&registry, config).unwrap(), "alpha");
    }

    #[test]
    fn configured_override_beats_the_tie_break() {
        let registry = competing_registry();
        let config = EngineConfigBuilder::new()
            .tie_break(TieBreak::Reject)
            .override_provider("Label", "beta")
            .build();
        assert_eq!(label_with(&registry, config).unwrap(), "beta");
    }

    #[test]
    fn registry_binding_beats_the_tie_break() {
        let registry = competing_registry();
        registry.bind_default::<Label>("alpha").unwrap();
        assert_eq!(label_with(&registry, EngineConfig::default()).unwrap(), "alpha");
        assert_eq!(registry.resolve_provider::<Label>().unwrap().name, "alpha");
    }

    #[test]
    fn declared_default_is_used_when_registered() {
        let registry = ProviderRegistry::new();
        for name in ["curated", "predicted"] {
            registry
                .register(
                    ProviderDescriptor::from_fn(name, NodeKind::Structure, move |ctx, node| {
                        ctx.set::<Preferred>(node, name.to_string())
                    })
                    .produces::<Preferred>(),
                )
                .unwrap();
        }
        registry.seal();

        assert_eq!(registry.resolve_provider::<Preferred>().unwrap().name, "curated");
    }

    #[test]
    fn missing_declared_default_falls_back_to_the_tie_break() {
        let registry = ProviderRegistry::new();
        for name in ["first", "second"] {
            registry
                .register(
                    ProviderDescriptor::from_fn(name, NodeKind::Structure, move |ctx, node| {
                        ctx.set::<Preferred>(node, name.to_string())
                    })
                    .produces::<Preferred>(),
                )
                .unwrap();
        }
        registry.seal();

        assert_eq!(registry.resolve_provider::<Preferred>().unwrap().name, "second");
    }
}

mod configuration {
    use super::*;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn config_file_overrides_are_honored() {
        let file = write_config(
            r#"
            tie_break = "first-registered"
            validate_plans = true

            [overrides]
            Label = "beta"
            "#,
        );
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.tie_break, TieBreak::FirstRegistered);
        assert!(config.validate_plans);

        let registry = competing_registry();
        assert_eq!(label_with(&registry, config).unwrap(), "beta");
    }

    #[test]
    fn overrides_naming_unknown_kinds_or_providers_are_rejected() {
        let registry = competing_registry();
        registry.seal();

        let unknown_kind = EngineConfigBuilder::new()
            .override_provider("Colour", "beta")
            .build();
        assert!(matches!(
            Resolver::new(&registry, unknown_kind),
            Err(FeatureError::Registry(RegistryError::UnknownFeature(kind))) if kind == "Colour"
        ));

        let unknown_provider = EngineConfigBuilder::new()
            .override_provider("Label", "delta")
            .build();
        assert!(matches!(
            Resolver::new(&registry, unknown_provider),
            Err(FeatureError::Registry(RegistryError::UnknownProvider(name))) if name == "delta"
        ));
    }

    #[test]
    fn apply_config_turns_overrides_into_bindings() {
        let registry = competing_registry();
        let config = EngineConfigBuilder::new()
            .override_provider("Label", "alpha")
            .build();
        registry.apply_config(&config).unwrap();
        registry.seal();

        assert_eq!(registry.resolve_provider::<Label>().unwrap().name, "alpha");

        let registry = competing_registry();
        let config = EngineConfigBuilder::new()
            .override_provider("Label", "nobody")
            .build();
        assert_eq!(
            registry.apply_config(&config),
            Err(RegistryError::UnknownProvider("nobody".to_string()))
        );
    }

    #[test]
    fn malformed_files_report_their_path() {
        let file = write_config("tie_break = \"coin-flip\"\n");
        match EngineConfig::load(file.path()) {
            Err(ConfigLoadError::Toml { path, .. }) => {
                assert_eq!(path, file.path().to_string_lossy());
            }
            other => panic!("expected a TOML error, got {:?}", other),
        }

        assert!(matches!(
            EngineConfig::load(std::path::Path::new("/definitely/not/here.toml")),
            Err(ConfigLoadError::Io { .. })
        ));
    }
}

mod introspection {
    use super::*;

    struct Upper;
    impl FeatureKind for Upper {
        type Value = String;
        const NAME: &'static str = "Upper";
    }

    fn layered_registry() -> ProviderRegistry {
        let registry = ProviderRegistry::new();
        registry.register(labeller("alpha")).unwrap();
        registry
            .register(
                ProviderDescriptor::from_fn("upper", NodeKind::Chain, |ctx, node| {
                    let label = ctx.get::<Label>(NodeId::Structure)?;
                    ctx.set::<Upper>(node, label.to_uppercase())
                })
                .produces::<Upper>()
                .requires::<Label>(),
            )
            .unwrap();
        registry.seal();
        registry
    }

    #[test]
    fn registry_describes_its_providers() {
        let registry = layered_registry();

        let names: Vec<String> = registry.providers().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["alpha", "upper"]);
        assert_eq!(
            registry.supported_features(),
            vec![FeatureKey::of::<Label>(), FeatureKey::of::<Upper>()]
        );

        let upper = registry.provider_by_name("upper").unwrap();
        assert_eq!(upper.scope, NodeKind::Chain);
        assert_eq!(upper.requires, vec![FeatureKey::of::<Label>()]);
        assert_eq!(upper.origin, ProviderOrigin::Annotation);
        assert!(registry.provider_by_name("lower").is_none());
    }

    #[test]
    fn plans_list_requirements_before_dependents() {
        let registry = layered_registry();
        let plan: Vec<String> = registry
            .plan(FeatureKey::of::<Upper>())
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(plan, vec!["alpha", "upper"]);

        let resolver = Resolver::new(&registry, EngineConfig::default()).unwrap();
        assert_eq!(resolver.plan(FeatureKey::of::<Upper>()).unwrap().len(), 2);
    }

    #[test]
    fn resolving_a_kind_nobody_produces_fails() {
        let registry = layered_registry();
        struct Orphan;
        impl FeatureKind for Orphan {
            type Value = ();
            const NAME: &'static str = "Orphan";
        }
        assert!(matches!(
            registry.resolve_provider::<Orphan>(),
            Err(FeatureError::Unresolvable { kind: "Orphan" })
        ));
    }
}
