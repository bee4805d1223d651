use super::provider::ProviderOrigin;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// How to pick among several providers of one feature kind when no override or declared
/// default applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// The most recently registered provider wins.
    #[default]
    LastRegistered,
    FirstRegistered,
    /// The lowest priority value wins; equal priorities go to the later registration.
    Priority,
    /// Refuse to choose and report the kind as ambiguous.
    Reject,
}

/// Resolver settings.
///
/// ```toml
/// tie_break = "priority"
/// preferred_origin = "annotation"
/// validate_plans = true
///
/// [overrides]
/// SecondaryStructure = "dssp"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub tie_break: TieBreak,
    /// When set, claimants of this origin are preferred before the tie-break is applied.
    pub preferred_origin: Option<ProviderOrigin>,
    /// Check the static plan of every supported feature for cycles when a resolver is built.
    pub validate_plans: bool,
    /// Feature kind name to provider name.
    pub overrides: HashMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tie_break: TieBreak::LastRegistered,
            preferred_origin: None,
            validate_plans: false,
            overrides: HashMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[derive(Default)]
pub struct EngineConfigBuilder {
    tie_break: Option<TieBreak>,
    preferred_origin: Option<ProviderOrigin>,
    validate_plans: Option<bool>,
    overrides: HashMap<String, String>,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = Some(tie_break);
        self
    }
    pub fn preferred_origin(mut self, origin: ProviderOrigin) -> Self {
        self.preferred_origin = Some(origin);
        self
    }
    pub fn validate_plans(mut self, validate: bool) -> Self {
        self.validate_plans = Some(validate);
        self
    }
    pub fn override_provider(mut self, kind: &str, provider: &str) -> Self {
        self.overrides.insert(kind.to_string(), provider.to_string());
        self
    }

    pub fn build(self) -> EngineConfig {
        let defaults = EngineConfig::default();
        EngineConfig {
            tie_break: self.tie_break.unwrap_or(defaults.tie_break),
            preferred_origin: self.preferred_origin,
            validate_plans: self.validate_plans.unwrap_or(defaults.validate_plans),
            overrides: self.overrides,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_document_yields_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.tie_break, TieBreak::LastRegistered);
        assert!(!config.validate_plans);
    }

    #[test]
    fn parses_every_field() {
        let config = EngineConfig::from_toml_str(
            r#"
            tie_break = "first-registered"
            preferred_origin = "prediction"
            validate_plans = true

            [overrides]
            ChainSequence = "chain-sequence"
            "#,
        )
        .unwrap();

        assert_eq!(config.tie_break, TieBreak::FirstRegistered);
        assert_eq!(config.preferred_origin, Some(ProviderOrigin::Prediction));
        assert!(config.validate_plans);
        assert_eq!(
            config.overrides.get("ChainSequence").map(String::as_str),
            Some("chain-sequence")
        );
    }

    #[test]
    fn unknown_fields_and_values_are_rejected() {
        assert!(EngineConfig::from_toml_str("tie_break = \"random\"").is_err());
        assert!(EngineConfig::from_toml_str("threads = 4").is_err());
    }

    #[test]
    fn load_reads_a_file_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "tie_break = \"reject\"").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.tie_break, TieBreak::Reject);
    }

    #[test]
    fn load_reports_io_and_toml_failures_with_the_path() {
        let missing = EngineConfig::load(Path::new("/definitely/not/here.toml"));
        match missing {
            Err(ConfigLoadError::Io { path, .. }) => assert!(path.ends_with("here.toml")),
            other => panic!("expected an I/O error, got {:?}", other),
        }

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "tie_break = ").unwrap();
        assert!(matches!(
            EngineConfig::load(file.path()),
            Err(ConfigLoadError::Toml { .. })
        ));
    }

    #[test]
    fn builder_fills_unset_fields_with_defaults() {
        let config = EngineConfigBuilder::new()
            .tie_break(TieBreak::Priority)
            .override_provider("GroupCentroid", "group-centroid")
            .build();

        assert_eq!(config.tie_break, TieBreak::Priority);
        assert_eq!(config.preferred_origin, None);
        assert!(!config.validate_plans);
        assert_eq!(config.overrides.len(), 1);
    }
}
