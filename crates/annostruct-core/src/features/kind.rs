use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A statically distinguishable kind of feature.
///
/// Each kind is a (usually zero-sized) marker type. The marker's [`TypeId`] is the key
/// under which values are cached, so two modules can never collide on a name by accident.
///
/// ```ignore
/// struct SecondaryStructure;
///
/// impl FeatureKind for SecondaryStructure {
///     type Value = char;
///     const NAME: &'static str = "SecondaryStructure";
///     const DEFAULT_PROVIDER: Option<&'static str> = Some("dssp");
/// }
/// ```
pub trait FeatureKind: 'static {
    /// The type of value stored for this kind.
    type Value: Send + Sync + 'static;

    /// A human-readable name, used in diagnostics and configuration files.
    const NAME: &'static str;

    /// The name of the provider that canonically produces this kind, if any.
    const DEFAULT_PROVIDER: Option<&'static str> = None;
}

/// The type-erased handle of a [`FeatureKind`].
///
/// Equality and hashing only consider the marker's `TypeId`; the name and default provider
/// are carried along for diagnostics and provider selection.
#[derive(Debug, Clone, Copy)]
pub struct FeatureKey {
    type_id: TypeId,
    name: &'static str,
    value_type: &'static str,
    default_provider: Option<&'static str>,
}

impl FeatureKey {
    pub fn of<K: FeatureKind>() -> Self {
        Self {
            type_id: TypeId::of::<K>(),
            name: K::NAME,
            value_type: std::any::type_name::<K::Value>(),
            default_provider: K::DEFAULT_PROVIDER,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type name of the values declared by the kind.
    pub fn value_type(&self) -> &'static str {
        self.value_type
    }

    pub fn default_provider(&self) -> Option<&'static str> {
        self.default_provider
    }
}

impl PartialEq for FeatureKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for FeatureKey {}

impl Hash for FeatureKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Identifies one registered provider.
///
/// The id embeds the identity of the registry that issued it, so execution marks left in a
/// feature store by one registry are never mistaken for those of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId {
    pub(crate) registry: u64,
    pub(crate) index: usize,
}

impl ProviderId {
    pub(crate) fn new(registry: u64, index: usize) -> Self {
        Self { registry, index }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}
