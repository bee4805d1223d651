use super::kind::{FeatureKey, FeatureKind, ProviderId};
use crate::engine::error::FeatureError;
use std::any::{Any, type_name};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// One type-erased feature value together with the name of its concrete type.
#[derive(Clone)]
pub(crate) struct StoredValue {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl StoredValue {
    pub(crate) fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    fn downcast<T: Send + Sync + 'static>(&self, key: &FeatureKey) -> Result<Arc<T>, FeatureError> {
        Arc::clone(&self.value)
            .downcast::<T>()
            .map_err(|_| FeatureError::TypeMismatch {
                kind: key.name(),
                expected: type_name::<T>().to_string(),
                found: self.type_name.to_string(),
            })
    }
}

/// The content of one store entry.
#[derive(Clone)]
pub(crate) enum FeatureSlot {
    Single(StoredValue),
    List(Vec<StoredValue>),
}

impl FeatureSlot {
    fn describe(&self) -> String {
        match self {
            FeatureSlot::Single(value) => value.type_name.to_string(),
            FeatureSlot::List(values) => match values.first() {
                Some(first) => format!("list of {}", first.type_name),
                None => "empty list".to_string(),
            },
        }
    }

    pub(crate) fn single<T: Send + Sync + 'static>(
        &self,
        key: &FeatureKey,
    ) -> Result<Arc<T>, FeatureError> {
        match self {
            FeatureSlot::Single(value) => value.downcast::<T>(key),
            FeatureSlot::List(_) => Err(FeatureError::TypeMismatch {
                kind: key.name(),
                expected: type_name::<T>().to_string(),
                found: self.describe(),
            }),
        }
    }

    pub(crate) fn list<T: Send + Sync + 'static>(
        &self,
        key: &FeatureKey,
    ) -> Result<Vec<Arc<T>>, FeatureError> {
        match self {
            FeatureSlot::List(values) => values.iter().map(|value| value.downcast::<T>(key)).collect(),
            FeatureSlot::Single(_) => Err(FeatureError::TypeMismatch {
                kind: key.name(),
                expected: format!("list of {}", type_name::<T>()),
                found: self.describe(),
            }),
        }
    }

    /// Appends to a list slot; a single-valued slot cannot grow.
    pub(crate) fn push(&mut self, key: &FeatureKey, value: StoredValue) -> Result<(), FeatureError> {
        match self {
            FeatureSlot::List(values) => {
                values.push(value);
                Ok(())
            }
            FeatureSlot::Single(_) => Err(FeatureError::TypeMismatch {
                kind: key.name(),
                expected: format!("list of {}", value.type_name),
                found: self.describe(),
            }),
        }
    }
}

/// The per-node cache of computed feature values.
///
/// Entries are keyed by [`FeatureKey`] and hold either a single value or an ordered list of
/// values. Reads are checked downcasts; writes are reserved to the resolver, which is why the
/// mutating API is crate-private. The store also remembers which providers already ran on
/// its node, so a provider that annotates a whole subtree in one pass is not re-run when one
/// of the nodes it covers lacks a value.
#[derive(Default)]
pub struct FeatureStore {
    entries: HashMap<FeatureKey, FeatureSlot>,
    completed: HashSet<ProviderId>,
}

impl FeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached single value of `K`.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::NotComputed`] if nothing is cached for `K` and
    /// [`FeatureError::TypeMismatch`] if the cached entry is a list.
    pub fn get<K: FeatureKind>(&self) -> Result<Arc<K::Value>, FeatureError> {
        self.get_as::<K::Value>(FeatureKey::of::<K>())
    }

    /// Non-failing probe: the cached single value of `K`, if there is one.
    pub fn get_or_empty<K: FeatureKind>(&self) -> Option<Arc<K::Value>> {
        self.get::<K>().ok()
    }

    /// Reads a single value through a type-erased key, checking the stored type against `T`.
    pub fn get_as<T: Send + Sync + 'static>(&self, key: FeatureKey) -> Result<Arc<T>, FeatureError> {
        match self.entries.get(&key) {
            Some(slot) => slot.single::<T>(&key),
            None => Err(FeatureError::NotComputed { kind: key.name() }),
        }
    }

    /// Returns the values accumulated for `K`, in insertion order.
    pub fn get_list<K: FeatureKind>(&self) -> Result<Vec<Arc<K::Value>>, FeatureError> {
        self.get_list_as::<K::Value>(FeatureKey::of::<K>())
    }

    pub fn get_list_as<T: Send + Sync + 'static>(
        &self,
        key: FeatureKey,
    ) -> Result<Vec<Arc<T>>, FeatureError> {
        match self.entries.get(&key) {
            Some(slot) => slot.list::<T>(&key),
            None => Err(FeatureError::NotComputed { kind: key.name() }),
        }
    }

    pub fn contains<K: FeatureKind>(&self) -> bool {
        self.contains_key(&FeatureKey::of::<K>())
    }

    pub fn contains_key(&self, key: &FeatureKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &FeatureKey> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn set<K: FeatureKind>(&mut self, value: K::Value) {
        self.set_value(FeatureKey::of::<K>(), StoredValue::new(value));
    }

    #[cfg(test)]
    pub(crate) fn append<K: FeatureKind>(&mut self, value: K::Value) -> Result<(), FeatureError> {
        self.append_value(FeatureKey::of::<K>(), StoredValue::new(value))
    }

    #[cfg(test)]
    pub(crate) fn set_value(&mut self, key: FeatureKey, value: StoredValue) {
        self.entries.insert(key, FeatureSlot::Single(value));
    }

    /// Appends to the list stored under `key`, creating it on first use. Duplicates are kept.
    #[cfg(test)]
    pub(crate) fn append_value(
        &mut self,
        key: FeatureKey,
        value: StoredValue,
    ) -> Result<(), FeatureError> {
        self.entries
            .entry(key)
            .or_insert_with(|| FeatureSlot::List(Vec::new()))
            .push(&key, value)
    }

    /// Replaces whatever is stored under `key`.
    pub(crate) fn insert_slot(&mut self, key: FeatureKey, slot: FeatureSlot) {
        self.entries.insert(key, slot);
    }

    pub(crate) fn has_completed(&self, provider: ProviderId) -> bool {
        self.completed.contains(&provider)
    }

    pub(crate) fn mark_completed(&mut self, provider: ProviderId) {
        self.completed.insert(provider);
    }

    /// Drops every cached value and execution mark.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.completed.clear();
    }
}

impl fmt::Debug for FeatureStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureStore")
            .field(
                "entries",
                &self
                    .entries
                    .iter()
                    .map(|(key, slot)| (key.name(), slot.describe()))
                    .collect::<Vec<_>>(),
            )
            .field("completed", &self.completed.len())
            .finish()
    }
}
