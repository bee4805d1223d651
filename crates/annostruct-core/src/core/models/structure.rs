use super::atom::Atom;
use super::chain::{Chain, ChainType};
use super::error::ModelError;
use super::group::Group;
use super::ids::{AtomId, ChainId, GroupId, NodeId, NodeKind};
use super::node::{HasChildren, HasFeatureStore, HasParent};
use crate::features::store::FeatureStore;
use crate::selection::Selection;
use slotmap::SlotMap;
use std::collections::HashMap;

/// One molecular assembly: the root of the containment tree.
///
/// Chains, groups and atoms live in slot-map arenas owned by the structure and refer to
/// each other through typed ids, so ownership flows strictly from the structure downwards
/// while parent lookups stay O(1). Every node carries its own [`FeatureStore`].
///
/// Topology only changes through the mutation primitives (`add_*`, `remove_*`, `clear`),
/// and each of them drops the cached features of the mutated node and of all its ancestors.
#[derive(Debug, Default)]
pub struct Structure {
    identifier: String,
    atoms: SlotMap<AtomId, Atom>,
    groups: SlotMap<GroupId, Group>,
    chains: SlotMap<ChainId, Chain>,
    /// Chains in insertion (file) order.
    chain_order: Vec<ChainId>,
    /// Lookup map for finding chains by their identifier.
    chain_id_map: HashMap<String, ChainId>,
    /// Lookup map for finding groups by chain, residue number and insertion code.
    group_id_map: HashMap<(ChainId, isize, Option<char>), GroupId>,
    features: FeatureStore,
}

impl Structure {
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            ..Self::default()
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn set_identifier(&mut self, identifier: &str) {
        self.identifier = identifier.to_string();
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    /// Chain ids in insertion order.
    pub fn chain_ids(&self) -> &[ChainId] {
        &self.chain_order
    }

    /// Returns an iterator over all chains in insertion order.
    ///
    /// # Return
    ///
    /// An iterator yielding `(ChainId, &Chain)` pairs.
    pub fn chains_iter(&self) -> impl Iterator<Item = (ChainId, &Chain)> {
        self.chain_order
            .iter()
            .filter_map(|&id| self.chains.get(id).map(|chain| (id, chain)))
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// Finds a chain ID by its identifier.
    ///
    /// # Arguments
    ///
    /// * `name` - The chain identifier (e.g., "A").
    ///
    /// # Return
    ///
    /// Returns `Some(ChainId)` if the chain exists, otherwise `None`.
    pub fn find_chain(&self, name: &str) -> Option<ChainId> {
        self.chain_id_map.get(name).copied()
    }

    /// Finds a group ID by its chain, residue number and insertion code.
    ///
    /// # Arguments
    ///
    /// * `chain_id` - The ID of the chain containing the group.
    /// * `residue_number` - The residue sequence number of the group.
    /// * `insertion_code` - The insertion code, `None` for the common case.
    ///
    /// # Return
    ///
    /// Returns `Some(GroupId)` if the group exists, otherwise `None`.
    pub fn find_group(
        &self,
        chain_id: ChainId,
        residue_number: isize,
        insertion_code: Option<char>,
    ) -> Option<GroupId> {
        self.group_id_map
            .get(&(chain_id, residue_number, insertion_code))
            .copied()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        match node {
            NodeId::Structure => true,
            NodeId::Chain(id) => self.chains.contains_key(id),
            NodeId::Group(id) => self.groups.contains_key(id),
            NodeId::Atom(id) => self.atoms.contains_key(id),
        }
    }

    /// Returns the children of a node in order.
    ///
    /// The iterator reads the current topology and can be recreated at any time. Atoms and
    /// unknown nodes have no children.
    pub fn children(&self, node: NodeId) -> Box<dyn Iterator<Item = NodeId> + '_> {
        match node {
            NodeId::Structure => Box::new(self.child_nodes()),
            NodeId::Chain(id) => match self.chains.get(id) {
                Some(chain) => Box::new(chain.child_nodes()),
                None => Box::new(std::iter::empty()),
            },
            NodeId::Group(id) => match self.groups.get(id) {
                Some(group) => Box::new(group.child_nodes()),
                None => Box::new(std::iter::empty()),
            },
            NodeId::Atom(_) => Box::new(std::iter::empty()),
        }
    }

    /// Returns the parent of a node, `None` for the root and for unknown nodes.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        match node {
            NodeId::Structure => None,
            NodeId::Chain(id) => self.chains.contains_key(id).then_some(NodeId::Structure),
            NodeId::Group(id) => self.groups.get(id).map(|group| group.parent_id().into()),
            NodeId::Atom(id) => self.atoms.get(id).map(|atom| atom.parent_id().into()),
        }
    }

    /// Strict ancestors of a node, nearest first.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node), |&current| self.parent(current))
    }

    /// Returns the node itself if it has the requested kind, otherwise its ancestor of that
    /// kind. `None` when the requested kind is finer than the node.
    pub fn ancestor_or_self(&self, node: NodeId, kind: NodeKind) -> Option<NodeId> {
        if !self.contains(node) {
            return None;
        }
        if node.kind() == kind {
            return Some(node);
        }
        self.ancestors(node).find(|ancestor| ancestor.kind() == kind)
    }

    /// Whether `node` is `root` or lies somewhere below it.
    pub fn is_within(&self, node: NodeId, root: NodeId) -> bool {
        self.contains(node)
            && (node == root || self.ancestors(node).any(|ancestor| ancestor == root))
    }

    /// Flattens the subtree below `node` into the strict descendants of the given kind,
    /// in file order.
    pub fn descendants(&self, node: NodeId, kind: NodeKind) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.collect_descendants(node, kind, &mut found);
        found
    }

    fn collect_descendants(&self, node: NodeId, kind: NodeKind, found: &mut Vec<NodeId>) {
        for child in self.children(node) {
            if child.kind() == kind {
                found.push(child);
            } else if child.kind() > kind {
                self.collect_descendants(child, kind, found);
            }
        }
    }

    /// Chains contained in `node` (the chain itself for a chain node).
    pub fn chains_under(&self, node: NodeId) -> Vec<ChainId> {
        match node {
            NodeId::Structure => self.chain_order.clone(),
            NodeId::Chain(id) if self.chains.contains_key(id) => vec![id],
            _ => Vec::new(),
        }
    }

    /// Groups contained in `node` in file order (the group itself for a group node).
    pub fn groups_under(&self, node: NodeId) -> Vec<GroupId> {
        match node {
            NodeId::Group(id) if self.groups.contains_key(id) => vec![id],
            NodeId::Group(_) | NodeId::Atom(_) => Vec::new(),
            _ => self
                .chains_under(node)
                .into_iter()
                .filter_map(|id| self.chains.get(id))
                .flat_map(|chain| chain.groups.iter().copied())
                .collect(),
        }
    }

    /// Atoms contained in `node` in file order (the atom itself for an atom node).
    ///
    /// This is the stable order serialization collaborators rely on.
    pub fn atoms_under(&self, node: NodeId) -> Vec<AtomId> {
        match node {
            NodeId::Atom(id) if self.atoms.contains_key(id) => vec![id],
            NodeId::Atom(_) => Vec::new(),
            _ => self
                .groups_under(node)
                .into_iter()
                .filter_map(|id| self.groups.get(id))
                .flat_map(|group| group.atoms.iter().copied())
                .collect(),
        }
    }

    /// Starts a [`Selection`] over the whole structure.
    pub fn select(&self) -> Selection<'_> {
        Selection::new(self)
    }

    /// The feature store attached to a node, `None` for unknown nodes.
    pub fn feature_store(&self, node: NodeId) -> Option<&FeatureStore> {
        match node {
            NodeId::Structure => Some(&self.features),
            NodeId::Chain(id) => self.chains.get(id).map(|chain| &chain.features),
            NodeId::Group(id) => self.groups.get(id).map(|group| &group.features),
            NodeId::Atom(id) => self.atoms.get(id).map(|atom| &atom.features),
        }
    }

    pub(crate) fn feature_store_mut(&mut self, node: NodeId) -> Option<&mut FeatureStore> {
        match node {
            NodeId::Structure => Some(&mut self.features),
            NodeId::Chain(id) => self.chains.get_mut(id).map(|chain| &mut chain.features),
            NodeId::Group(id) => self.groups.get_mut(id).map(|group| &mut group.features),
            NodeId::Atom(id) => self.atoms.get_mut(id).map(|atom| &mut atom.features),
        }
    }

    /// Adds a new chain to the structure or returns the existing one.
    ///
    /// This method is idempotent; if a chain with the given identifier already exists,
    /// it returns the existing chain ID without creating a duplicate or touching any
    /// cached feature.
    ///
    /// # Arguments
    ///
    /// * `name` - The chain identifier.
    /// * `chain_type` - The type of the chain.
    ///
    /// # Return
    ///
    /// The ID of the chain (new or existing).
    pub fn add_chain(&mut self, name: &str, chain_type: ChainType) -> ChainId {
        if let Some(&existing) = self.chain_id_map.get(name) {
            return existing;
        }
        let chain_id = self.chains.insert(Chain::new(name, chain_type));
        self.chain_id_map.insert(name.to_string(), chain_id);
        self.chain_order.push(chain_id);
        self.invalidate_from(NodeId::Structure);
        chain_id
    }

    /// Adds a group without insertion code to a chain, see [`Self::add_group_with_insertion`].
    pub fn add_group(
        &mut self,
        chain_id: ChainId,
        residue_number: isize,
        name: &str,
    ) -> Result<GroupId, ModelError> {
        self.add_group_with_insertion(chain_id, residue_number, None, name)
    }

    /// Appends a new group to a chain or returns the existing one.
    ///
    /// Groups are keyed by residue number and insertion code within their chain. Adding a
    /// new group invalidates the cached features of the chain and of the structure.
    ///
    /// # Arguments
    ///
    /// * `chain_id` - The ID of the chain to add the group to.
    /// * `residue_number` - The residue sequence number.
    /// * `insertion_code` - The insertion code, if any.
    /// * `name` - The three-letter name of the group.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ChainNotFound`] if the chain does not exist.
    pub fn add_group_with_insertion(
        &mut self,
        chain_id: ChainId,
        residue_number: isize,
        insertion_code: Option<char>,
        name: &str,
    ) -> Result<GroupId, ModelError> {
        let chain = self
            .chains
            .get_mut(chain_id)
            .ok_or(ModelError::ChainNotFound(chain_id))?;
        let key = (chain_id, residue_number, insertion_code);
        if let Some(&existing) = self.group_id_map.get(&key) {
            return Ok(existing);
        }

        let group_id = self
            .groups
            .insert(Group::new(residue_number, insertion_code, name, chain_id));
        chain.groups.push(group_id);
        self.group_id_map.insert(key, group_id);
        self.invalidate_from(NodeId::Chain(chain_id));
        Ok(group_id)
    }

    /// Adds an atom to a group.
    ///
    /// The atom's parent link is set here and never changes afterwards. Adding an atom
    /// invalidates the cached features of the group, its chain and the structure.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::GroupNotFound`] if the group does not exist.
    pub fn add_atom(&mut self, group_id: GroupId, atom: Atom) -> Result<AtomId, ModelError> {
        let atom_id = self
            .insert_atom(group_id, atom)
            .ok_or(ModelError::GroupNotFound(group_id))?;
        self.invalidate_from(NodeId::Group(group_id));
        Ok(atom_id)
    }

    /// Attaches an atom to a group without touching any feature store.
    fn insert_atom(&mut self, group_id: GroupId, mut atom: Atom) -> Option<AtomId> {
        let group = self.groups.get_mut(group_id)?;
        atom.group_id = group_id;
        atom.features.clear();
        let name = atom.name.clone();
        let atom_id = self.atoms.insert(atom);
        group.add_atom(&name, atom_id);
        Some(atom_id)
    }

    /// Removes an atom from its group.
    ///
    /// # Return
    ///
    /// The removed atom, which keeps its raw data but is no longer part of the structure.
    pub fn remove_atom(&mut self, atom_id: AtomId) -> Result<Atom, ModelError> {
        let atom = self
            .atoms
            .remove(atom_id)
            .ok_or(ModelError::AtomNotFound(atom_id))?;
        if let Some(group) = self.groups.get_mut(atom.group_id) {
            group.remove_atom(&atom.name, atom_id);
        }
        self.invalidate_from(NodeId::Group(atom.group_id));
        Ok(atom)
    }

    /// Removes a group together with all of its atoms.
    pub fn remove_group(&mut self, group_id: GroupId) -> Result<Group, ModelError> {
        let mut group = self
            .groups
            .remove(group_id)
            .ok_or(ModelError::GroupNotFound(group_id))?;
        for atom_id in group.clear_atoms() {
            self.atoms.remove(atom_id);
        }
        if let Some(chain) = self.chains.get_mut(group.chain_id) {
            chain.groups.retain(|&id| id != group_id);
        }
        self.group_id_map
            .remove(&(group.chain_id, group.residue_number, group.insertion_code));
        self.invalidate_from(NodeId::Chain(group.chain_id));
        Ok(group)
    }

    /// Removes a chain together with all of its groups and atoms.
    pub fn remove_chain(&mut self, chain_id: ChainId) -> Result<Chain, ModelError> {
        let group_ids = self
            .chains
            .get(chain_id)
            .ok_or(ModelError::ChainNotFound(chain_id))?
            .groups
            .clone();
        for group_id in group_ids {
            self.remove_group(group_id)?;
        }
        let chain = self
            .chains
            .remove(chain_id)
            .ok_or(ModelError::ChainNotFound(chain_id))?;
        self.chain_order.retain(|&id| id != chain_id);
        self.chain_id_map.remove(&chain.name);
        self.invalidate_from(NodeId::Structure);
        Ok(chain)
    }

    /// Removes every child of `node`. Clearing an atom only invalidates its features.
    pub fn clear(&mut self, node: NodeId) -> Result<(), ModelError> {
        if !self.contains(node) {
            return Err(ModelError::NodeNotFound(node));
        }
        match node {
            NodeId::Structure => {
                for chain_id in self.chain_order.clone() {
                    self.remove_chain(chain_id)?;
                }
            }
            NodeId::Chain(id) => {
                let group_ids = self
                    .chains
                    .get(id)
                    .map(|chain| chain.groups.clone())
                    .unwrap_or_default();
                for group_id in group_ids {
                    self.remove_group(group_id)?;
                }
            }
            NodeId::Group(id) => {
                let removed = self
                    .groups
                    .get_mut(id)
                    .map(|group| group.clear_atoms())
                    .unwrap_or_default();
                for atom_id in removed {
                    self.atoms.remove(atom_id);
                }
            }
            NodeId::Atom(_) => {}
        }
        self.invalidate_from(node);
        Ok(())
    }

    /// Drops the cached features of `node` and of all its strict ancestors.
    fn invalidate_from(&mut self, node: NodeId) {
        let mut current = Some(node);
        while let Some(id) = current {
            current = self.parent(id);
            if let Some(store) = self.feature_store_mut(id) {
                store.clear();
            }
        }
    }

    /// Copies the whole structure: same topology and raw data, fresh ids, empty stores.
    pub fn deep_copy(&self) -> Structure {
        self.copy_where(&self.identifier, |_| true)
    }

    /// Copies the nodes accepted by `include`, preserving file order.
    ///
    /// A node is only visited when its parent was accepted, so rejecting a chain drops its
    /// whole subtree. None of the computed features are carried over.
    pub(crate) fn copy_where(&self, identifier: &str, include: impl Fn(NodeId) -> bool) -> Structure {
        let mut copy = Structure::new(identifier);
        for (chain_id, chain) in self.chains_iter() {
            if !include(chain_id.into()) {
                continue;
            }
            let new_chain = copy.add_chain(&chain.name, chain.chain_type);
            for &group_id in &chain.groups {
                let Some(group) = self.groups.get(group_id) else {
                    continue;
                };
                if !include(group_id.into()) {
                    continue;
                }
                let Ok(new_group) = copy.add_group_with_insertion(
                    new_chain,
                    group.residue_number,
                    group.insertion_code,
                    &group.name,
                ) else {
                    continue;
                };
                if let Some(copied) = copy.groups.get_mut(new_group) {
                    copied.kind = group.kind;
                }
                let atoms = group
                    .atoms
                    .iter()
                    .filter(|&&atom_id| include(atom_id.into()))
                    .filter_map(|&atom_id| self.atoms.get(atom_id));
                for atom in atoms {
                    copy.insert_atom(new_group, atom.detached_copy());
                }
            }
        }
        copy
    }
}

impl HasFeatureStore for Structure {
    fn features(&self) -> &FeatureStore {
        &self.features
    }
}

impl HasChildren for Structure {
    type ChildId = ChainId;

    fn child_ids(&self) -> &[ChainId] {
        &self.chain_order
    }
}
