//! Capability traits shared by the node kinds.
//!
//! Instead of a container class hierarchy, each node kind implements the capabilities it
//! actually has: every node carries a feature store, every non-root node knows its parent,
//! and every non-leaf node lists its children in order.

use super::atom::Atom;
use super::chain::Chain;
use super::group::Group;
use super::ids::{AtomId, ChainId, GroupId, NodeId};
use crate::features::store::FeatureStore;

pub trait HasFeatureStore {
    fn features(&self) -> &FeatureStore;
}

pub trait HasParent {
    type ParentId: Copy + Into<NodeId>;

    fn parent_id(&self) -> Self::ParentId;
}

pub trait HasChildren {
    type ChildId: Copy + Into<NodeId>;

    /// Child ids in file order.
    fn child_ids(&self) -> &[Self::ChildId];

    fn child_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.child_ids().iter().map(|&id| id.into())
    }
}

impl HasFeatureStore for Atom {
    fn features(&self) -> &FeatureStore {
        &self.features
    }
}

impl HasParent for Atom {
    type ParentId = GroupId;

    fn parent_id(&self) -> GroupId {
        self.group_id
    }
}

impl HasFeatureStore for Group {
    fn features(&self) -> &FeatureStore {
        &self.features
    }
}

impl HasParent for Group {
    type ParentId = ChainId;

    fn parent_id(&self) -> ChainId {
        self.chain_id
    }
}

impl HasChildren for Group {
    type ChildId = AtomId;

    fn child_ids(&self) -> &[AtomId] {
        &self.atoms
    }
}

impl HasFeatureStore for Chain {
    fn features(&self) -> &FeatureStore {
        &self.features
    }
}

impl HasChildren for Chain {
    type ChildId = GroupId;

    fn child_ids(&self) -> &[GroupId] {
        &self.groups
    }
}
