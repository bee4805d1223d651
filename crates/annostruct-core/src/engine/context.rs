use super::error::{BoxError, FeatureError};
use super::registry::RegisteredProvider;
use super::resolver::{Frame, Resolver};
use crate::core::models::ids::NodeId;
use crate::core::models::structure::Structure;
use crate::features::kind::{FeatureKey, FeatureKind};
use crate::features::store::{FeatureSlot, StoredValue};
use crate::selection::Selection;
use std::sync::Arc;

/// One buffered write of a running provider.
pub(crate) struct PendingWrite {
    node: NodeId,
    key: FeatureKey,
    slot: FeatureSlot,
}

/// The handle a provider computes through.
///
/// Reads resolve missing inputs recursively, sharing the cycle-detection stack of the
/// resolution that started this provider. Writes are checked and buffered: they become
/// visible in the feature stores only once the provider returns successfully, so a failing
/// provider leaves nothing half-written behind.
pub struct ComputeContext<'a> {
    resolver: &'a Resolver,
    structure: &'a mut Structure,
    stack: &'a mut Vec<Frame>,
    provider: &'a RegisteredProvider,
    target: NodeId,
    pending: Vec<PendingWrite>,
}

impl<'a> ComputeContext<'a> {
    pub(crate) fn new(
        resolver: &'a Resolver,
        structure: &'a mut Structure,
        stack: &'a mut Vec<Frame>,
        provider: &'a RegisteredProvider,
        target: NodeId,
    ) -> Self {
        Self {
            resolver,
            structure,
            stack,
            provider,
            target,
            pending: Vec::new(),
        }
    }

    pub fn structure(&self) -> &Structure {
        &*self.structure
    }

    /// The node this execution covers; every write must land inside its subtree.
    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Starts a selection over the target subtree.
    pub fn select(&self) -> Selection<'_> {
        Selection::within(&*self.structure, self.target)
    }

    /// Reads `K` on `node`, computing it first if needed.
    ///
    /// Values this provider has already written in the current execution are visible here.
    pub fn get<K: FeatureKind>(
        &mut self,
        node: impl Into<NodeId>,
    ) -> Result<Arc<K::Value>, FeatureError> {
        let node = node.into();
        let key = FeatureKey::of::<K>();
        if let Some(slot) = self.pending_slot(node, &key) {
            return slot.single::<K::Value>(&key);
        }
        self.resolver
            .ensure(&mut *self.structure, node, key, None, &mut *self.stack)?;
        Resolver::store_of(&*self.structure, node)?.get::<K>()
    }

    /// Reads the list of `K` on `node`, computing it first if needed. Nodes the provider
    /// left untouched read as an empty list.
    pub fn get_list<K: FeatureKind>(
        &mut self,
        node: impl Into<NodeId>,
    ) -> Result<Vec<Arc<K::Value>>, FeatureError> {
        let node = node.into();
        let key = FeatureKey::of::<K>();
        if let Some(slot) = self.pending_slot(node, &key) {
            return slot.list::<K::Value>(&key);
        }
        self.resolver
            .ensure(&mut *self.structure, node, key, None, &mut *self.stack)?;
        Resolver::list_or_empty::<K::Value>(&*self.structure, node, key)
    }

    /// Reads whatever is available for `K` on `node` without triggering any computation.
    pub fn get_or_empty<K: FeatureKind>(&self, node: impl Into<NodeId>) -> Option<Arc<K::Value>> {
        let node = node.into();
        let key = FeatureKey::of::<K>();
        match self.pending_slot(node, &key) {
            Some(slot) => slot.single::<K::Value>(&key).ok(),
            None => self
                .structure
                .feature_store(node)
                .and_then(|store| store.get_or_empty::<K>()),
        }
    }

    /// Stores the single value of `K` on `node`, replacing an earlier write of this execution.
    pub fn set<K: FeatureKind>(
        &mut self,
        node: impl Into<NodeId>,
        value: K::Value,
    ) -> Result<(), FeatureError> {
        let node = node.into();
        let key = FeatureKey::of::<K>();
        self.check_write(node, &key)?;
        let value = StoredValue::new(value);
        match self.pending_slot_mut(node, &key) {
            Some(FeatureSlot::List(_)) => Err(FeatureError::TypeMismatch {
                kind: key.name(),
                expected: std::any::type_name::<K::Value>().to_string(),
                found: "list".to_string(),
            }),
            Some(slot) => {
                *slot = FeatureSlot::Single(value);
                Ok(())
            }
            None => {
                self.pending.push(PendingWrite {
                    node,
                    key,
                    slot: FeatureSlot::Single(value),
                });
                Ok(())
            }
        }
    }

    /// Appends one value to the list of `K` on `node`.
    ///
    /// The first append of an execution starts a fresh list: a provider that runs again
    /// after invalidation replaces its earlier hits instead of duplicating them.
    pub fn append<K: FeatureKind>(
        &mut self,
        node: impl Into<NodeId>,
        value: K::Value,
    ) -> Result<(), FeatureError> {
        let node = node.into();
        let key = FeatureKey::of::<K>();
        self.check_write(node, &key)?;
        let value = StoredValue::new(value);
        match self.pending_slot_mut(node, &key) {
            Some(slot) => slot.push(&key, value),
            None => {
                self.pending.push(PendingWrite {
                    node,
                    key,
                    slot: FeatureSlot::List(vec![value]),
                });
                Ok(())
            }
        }
    }

    /// Ensures the list of `K` exists on `node`, even if nothing is appended to it.
    pub fn touch_list<K: FeatureKind>(&mut self, node: impl Into<NodeId>) -> Result<(), FeatureError> {
        let node = node.into();
        let key = FeatureKey::of::<K>();
        self.check_write(node, &key)?;
        if self.pending_slot(node, &key).is_none() {
            self.pending.push(PendingWrite {
                node,
                key,
                slot: FeatureSlot::List(Vec::new()),
            });
        }
        Ok(())
    }

    /// Wraps a provider-specific failure.
    pub fn failure(&self, cause: impl Into<BoxError>) -> FeatureError {
        FeatureError::Computation {
            provider: self.provider.name().to_string(),
            source: cause.into(),
        }
    }

    pub(crate) fn into_pending(self) -> Vec<PendingWrite> {
        self.pending
    }

    fn check_write(&self, node: NodeId, key: &FeatureKey) -> Result<(), FeatureError> {
        if !self.provider.descriptor.is_producer_of(key) {
            return Err(FeatureError::UndeclaredOutput {
                provider: self.provider.name().to_string(),
                kind: key.name(),
            });
        }
        if !self.structure.contains(node) {
            return Err(FeatureError::NodeNotFound(node));
        }
        if !self.structure.is_within(node, self.target) {
            return Err(FeatureError::OutOfScope {
                provider: self.provider.name().to_string(),
                target: self.target,
                node,
            });
        }
        Ok(())
    }

    fn pending_slot(&self, node: NodeId, key: &FeatureKey) -> Option<&FeatureSlot> {
        self.pending
            .iter()
            .find(|write| write.node == node && write.key == *key)
            .map(|write| &write.slot)
    }

    fn pending_slot_mut(&mut self, node: NodeId, key: &FeatureKey) -> Option<&mut FeatureSlot> {
        self.pending
            .iter_mut()
            .find(|write| write.node == node && write.key == *key)
            .map(|write| &mut write.slot)
    }
}

/// Publishes the buffered writes of a successful execution, in write order.
///
/// Every target node is checked before anything is written, so the commit is all or nothing.
pub(crate) fn commit(structure: &mut Structure, pending: Vec<PendingWrite>) -> Result<usize, FeatureError> {
    if let Some(missing) = pending.iter().find(|write| !structure.contains(write.node)) {
        return Err(FeatureError::NodeNotFound(missing.node));
    }
    let count = pending.len();
    for write in pending {
        if let Some(store) = structure.feature_store_mut(write.node) {
            store.insert_slot(write.key, write.slot);
        }
    }
    Ok(count)
}
