use crate::core::models::atom::Atom;
use crate::core::models::chain::Chain;
use crate::core::models::group::Group;
use crate::core::models::ids::{AtomId, ChainId, GroupId, NodeId};
use crate::core::models::structure::Structure;
use crate::features::store::FeatureStore;
use std::collections::HashSet;

/// The result of a selection, still attached to its source structure.
///
/// A view addresses the same nodes as the source, so features cached through either one
/// are visible through the other. Use [`copy`](Self::copy) for a detached structure.
#[derive(Debug)]
pub struct View<'s> {
    structure: &'s Structure,
    name: String,
    chains: Vec<ChainId>,
    groups: Vec<GroupId>,
    atoms: Vec<AtomId>,
    members: HashSet<NodeId>,
}

impl<'s> View<'s> {
    pub(super) fn new(
        structure: &'s Structure,
        name: String,
        chains: Vec<ChainId>,
        groups: Vec<GroupId>,
        atoms: Vec<AtomId>,
    ) -> Self {
        let members = chains
            .iter()
            .map(|&id| NodeId::from(id))
            .chain(groups.iter().map(|&id| NodeId::from(id)))
            .chain(atoms.iter().map(|&id| NodeId::from(id)))
            .collect();
        Self {
            structure,
            name,
            chains,
            groups,
            atoms,
            members,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &'s Structure {
        self.structure
    }

    pub fn chain_ids(&self) -> &[ChainId] {
        &self.chains
    }

    pub fn group_ids(&self) -> &[GroupId] {
        &self.groups
    }

    pub fn atom_ids(&self) -> &[AtomId] {
        &self.atoms
    }

    pub fn chains(&self) -> impl Iterator<Item = (ChainId, &'s Chain)> + '_ {
        let structure = self.structure;
        self.chains
            .iter()
            .filter_map(move |&id| structure.chain(id).map(|chain| (id, chain)))
    }

    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &'s Group)> + '_ {
        let structure = self.structure;
        self.groups
            .iter()
            .filter_map(move |&id| structure.group(id).map(|group| (id, group)))
    }

    pub fn atoms(&self) -> impl Iterator<Item = (AtomId, &'s Atom)> + '_ {
        let structure = self.structure;
        self.atoms
            .iter()
            .filter_map(move |&id| structure.atom(id).map(|atom| (id, atom)))
    }

    pub fn contains(&self, node: impl Into<NodeId>) -> bool {
        self.members.contains(&node.into())
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The feature store of a node of this view; it is the source node's own store.
    pub fn feature_store(&self, node: impl Into<NodeId>) -> Option<&'s FeatureStore> {
        let node = node.into();
        if self.contains(node) {
            self.structure.feature_store(node)
        } else {
            None
        }
    }

    /// Copies the viewed nodes into a new structure named after the view.
    ///
    /// File order is preserved; the copy gets fresh ids and starts with empty feature stores.
    pub fn copy(&self) -> Structure {
        self.structure
            .copy_where(&self.name, |node| self.members.contains(&node))
    }
}

#[cfg(test)]
mod tests {
    use crate::core::models::atom::{Atom, Element};
    use crate::core::models::chain::ChainType;
    use crate::core::models::ids::NodeId;
    use crate::core::models::structure::Structure;
    use crate::selection::Selection;
    use nalgebra::Point3;

    fn create_test_structure() -> Structure {
        let mut structure = Structure::new("2VIE");
        let chain = structure.add_chain("A", ChainType::Protein);
        for number in 1..=3 {
            let group = structure.add_group(chain, number, "LEU").unwrap();
            for name in ["N", "CA", "C", "O"] {
                let element = name.chars().next().unwrap().to_string().parse::<Element>().unwrap();
                structure
                    .add_atom(group, Atom::new(name, element, Point3::origin()))
                    .unwrap();
            }
        }
        structure
    }

    #[test]
    fn view_exposes_members_in_file_order() {
        let structure = create_test_structure();
        let view = Selection::new(&structure).residue_range(2..=3).as_view();

        let numbers: Vec<_> = view.groups().map(|(_, group)| group.residue_number).collect();
        assert_eq!(numbers, vec![2, 3]);
        assert_eq!(view.atoms().count(), 8);
        assert_eq!(view.chains().count(), 1);
        assert_eq!(view.name(), "2VIE");
        assert!(!view.is_empty());
    }

    #[test]
    fn view_shares_feature_stores_with_the_source() {
        let structure = create_test_structure();
        let view = Selection::new(&structure).residue_number(&[1]).as_view();
        let group = view.group_ids()[0];

        let through_view = view.feature_store(group).unwrap();
        let through_source = structure.feature_store(NodeId::Group(group)).unwrap();
        assert!(std::ptr::eq(through_view, through_source));
        assert!(view.feature_store(NodeId::Structure).is_none());
    }

    #[test]
    fn copy_contains_only_the_viewed_nodes() {
        let structure = create_test_structure();
        let copy = Selection::new(&structure)
            .atom_name(&["CA"])
            .name_container("trace")
            .as_view()
            .copy();

        assert_eq!(copy.identifier(), "trace");
        assert_eq!(copy.group_count(), 3);
        assert_eq!(copy.atom_count(), 3);
        assert!(std::ptr::eq(
            Selection::new(&structure).as_view().source(),
            &structure
        ));
    }
}
