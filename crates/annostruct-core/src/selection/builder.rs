use super::error::SelectionError;
use super::view::View;
use crate::core::models::atom::{Atom, Element};
use crate::core::models::chain::{Chain, ChainType};
use crate::core::models::group::{AminoAcidType, Group};
use crate::core::models::ids::{AtomId, ChainId, GroupId, NodeId, NodeKind};
use crate::core::models::structure::Structure;
use crate::core::utils::geometry::is_within_distance;
use crate::core::utils::identifiers::{
    ALPHA_CARBON_NAME, BETA_CARBON_NAME, is_backbone_atom, is_heavy_atom,
};
use itertools::Itertools;
use nalgebra::Point3;
use std::fmt;
use std::ops::RangeInclusive;

type Predicate<'s, T> = Box<dyn Fn(&T) -> bool + 's>;

struct Criterion<'s, T> {
    test: Predicate<'s, T>,
    description: String,
}

impl<T> Criterion<'_, T> {
    fn accepts(&self, node: &T) -> bool {
        (self.test)(node)
    }
}

/// A fluent query over the nodes below a root.
///
/// Criteria are grouped by level and combined with AND in declaration order; evaluation
/// stops at the first criterion a candidate fails. A candidate group must also lie in a
/// chain that passes the chain criteria, and a candidate atom in a group that passes the
/// group criteria.
pub struct Selection<'s> {
    structure: &'s Structure,
    root: NodeId,
    chain_criteria: Vec<Criterion<'s, Chain>>,
    group_criteria: Vec<Criterion<'s, Group>>,
    atom_criteria: Vec<Criterion<'s, Atom>>,
    negated: bool,
    container_name: Option<String>,
}

impl<'s> Selection<'s> {
    /// Starts a selection over the whole structure.
    pub fn new(structure: &'s Structure) -> Self {
        Self::within(structure, NodeId::Structure)
    }

    /// Starts a selection over the subtree of `root`.
    pub fn within(structure: &'s Structure, root: impl Into<NodeId>) -> Self {
        Self {
            structure,
            root: root.into(),
            chain_criteria: Vec::new(),
            group_criteria: Vec::new(),
            atom_criteria: Vec::new(),
            negated: false,
            container_name: None,
        }
    }

    /// Negates every criterion added until [`negation_mode_leave`](Self::negation_mode_leave).
    pub fn negation_mode_enter(mut self) -> Self {
        self.negated = true;
        self
    }

    pub fn negation_mode_leave(mut self) -> Self {
        self.negated = false;
        self
    }

    /// Names the container produced by [`as_view`](Self::as_view) and
    /// [`as_isolated_structure`](Self::as_isolated_structure). Defaults to the root's name.
    pub fn name_container(mut self, name: &str) -> Self {
        self.container_name = Some(name.to_string());
        self
    }

    // --- Chain criteria ---

    pub fn chain_name(self, names: &[&str]) -> Self {
        let names: Vec<String> = names.iter().map(|name| name.to_string()).collect();
        let description = format!("chain names: [{}]", names.iter().join(", "));
        self.with_chain(
            move |chain| names.iter().any(|name| *name == chain.name),
            description,
        )
    }

    pub fn chain_type(self, chain_type: ChainType) -> Self {
        self.with_chain(
            move |chain| chain.chain_type == chain_type,
            format!("chain type: {}", chain_type),
        )
    }

    pub fn custom_chain(self, predicate: impl Fn(&Chain) -> bool + 's) -> Self {
        self.with_chain(predicate, "custom chain predicate".to_string())
    }

    // --- Group criteria ---

    pub fn residue_number(self, numbers: &[isize]) -> Self {
        let numbers = numbers.to_vec();
        let description = format!("residue numbers: [{}]", numbers.iter().join(", "));
        self.with_group(
            move |group| numbers.contains(&group.residue_number),
            description,
        )
    }

    pub fn residue_range(self, range: RangeInclusive<isize>) -> Self {
        let description = format!("residue range: {}-{}", range.start(), range.end());
        self.with_group(
            move |group| range.contains(&group.residue_number),
            description,
        )
    }

    pub fn group_name(self, names: &[&str]) -> Self {
        let names: Vec<String> = names.iter().map(|name| name.to_string()).collect();
        let description = format!("group names: [{}]", names.iter().join(", "));
        self.with_group(
            move |group| names.iter().any(|name| *name == group.name),
            description,
        )
    }

    pub fn amino_acid(self, types: &[AminoAcidType]) -> Self {
        let types = types.to_vec();
        let description = format!(
            "amino acids: [{}]",
            types.iter().map(AminoAcidType::to_three_letter).join(", ")
        );
        self.with_group(
            move |group| group.amino_acid().is_some_and(|aa| types.contains(&aa)),
            description,
        )
    }

    pub fn amino_acids(self) -> Self {
        self.with_group(Group::is_amino_acid, "amino acids".to_string())
    }

    pub fn nucleotides(self) -> Self {
        self.with_group(Group::is_nucleotide, "nucleotides".to_string())
    }

    pub fn water(self) -> Self {
        self.with_group(Group::is_water, "water".to_string())
    }

    pub fn ligands(self) -> Self {
        self.with_group(Group::is_ligand, "ligands".to_string())
    }

    /// Groups with at least one atom strictly closer than `cutoff` to `center`.
    pub fn group_distance(self, center: Point3<f64>, cutoff: f64) -> Self {
        let structure = self.structure;
        self.with_group(
            move |group| {
                group
                    .atoms()
                    .iter()
                    .filter_map(|&id| structure.atom(id))
                    .any(|atom| is_within_distance(&atom.position, &center, cutoff))
            },
            describe_distance(&center, cutoff),
        )
    }

    pub fn custom_group(self, predicate: impl Fn(&Group) -> bool + 's) -> Self {
        self.with_group(predicate, "custom group predicate".to_string())
    }

    // --- Atom criteria ---

    pub fn atom_name(self, names: &[&str]) -> Self {
        let names: Vec<String> = names.iter().map(|name| name.to_string()).collect();
        let description = format!("atom names: [{}]", names.iter().join(", "));
        self.with_atom(
            move |atom| names.iter().any(|name| *name == atom.name),
            description,
        )
    }

    pub fn element(self, elements: &[Element]) -> Self {
        let elements = elements.to_vec();
        let description = format!("elements: [{}]", elements.iter().join(", "));
        self.with_atom(move |atom| elements.contains(&atom.element), description)
    }

    pub fn alpha_carbons(self) -> Self {
        self.with_atom(
            |atom| atom.name == ALPHA_CARBON_NAME,
            "alpha carbons".to_string(),
        )
    }

    pub fn beta_carbons(self) -> Self {
        self.with_atom(
            |atom| atom.name == BETA_CARBON_NAME,
            "beta carbons".to_string(),
        )
    }

    pub fn backbone(self) -> Self {
        self.with_atom(|atom| is_backbone_atom(&atom.name), "backbone atoms".to_string())
    }

    /// Hydrogens by element; atoms of unknown element are judged by name.
    pub fn hydrogens(self) -> Self {
        self.with_atom(|atom| !is_heavy(atom), "hydrogens".to_string())
    }

    pub fn non_hydrogen(self) -> Self {
        self.with_atom(is_heavy, "non-hydrogen atoms".to_string())
    }

    pub fn serial(self, serials: &[usize]) -> Self {
        let serials = serials.to_vec();
        let description = format!("serials: [{}]", serials.iter().join(", "));
        self.with_atom(move |atom| serials.contains(&atom.serial), description)
    }

    pub fn serial_range(self, range: RangeInclusive<usize>) -> Self {
        let description = format!("serial range: {}-{}", range.start(), range.end());
        self.with_atom(move |atom| range.contains(&atom.serial), description)
    }

    /// Atoms strictly closer than `cutoff` to `center`.
    pub fn atom_distance(self, center: Point3<f64>, cutoff: f64) -> Self {
        self.with_atom(
            move |atom| is_within_distance(&atom.position, &center, cutoff),
            describe_distance(&center, cutoff),
        )
    }

    pub fn custom_atom(self, predicate: impl Fn(&Atom) -> bool + 's) -> Self {
        self.with_atom(predicate, "custom atom predicate".to_string())
    }

    // --- Materializations ---

    /// Matching chains in file order, evaluated lazily.
    pub fn as_filtered_chains(&self) -> impl Iterator<Item = (ChainId, &'s Chain)> + '_ {
        let structure = self.structure;
        let chain_ids = match self.scope(NodeKind::Chain) {
            Some(NodeId::Chain(id)) => vec![id],
            _ => structure.chains_under(self.root),
        };
        chain_ids
            .into_iter()
            .filter_map(move |id| structure.chain(id).map(|chain| (id, chain)))
            .filter(move |(_, chain)| self.chain_criteria.iter().all(|c| c.accepts(chain)))
    }

    /// Matching groups in file order, evaluated lazily.
    pub fn as_filtered_groups(&self) -> impl Iterator<Item = (GroupId, &'s Group)> + '_ {
        let structure = self.structure;
        let only = match self.scope(NodeKind::Group) {
            Some(NodeId::Group(id)) => Some(id),
            _ => None,
        };
        self.as_filtered_chains()
            .flat_map(|(_, chain)| chain.groups().iter().copied())
            .filter(move |&id| only.is_none_or(|only| only == id))
            .filter_map(move |id| structure.group(id).map(|group| (id, group)))
            .filter(move |(_, group)| self.group_criteria.iter().all(|c| c.accepts(group)))
    }

    /// Matching atoms in file order, evaluated lazily.
    pub fn as_filtered_atoms(&self) -> impl Iterator<Item = (AtomId, &'s Atom)> + '_ {
        let structure = self.structure;
        let only = match self.scope(NodeKind::Atom) {
            Some(NodeId::Atom(id)) => Some(id),
            _ => None,
        };
        self.as_filtered_groups()
            .flat_map(|(_, group)| group.atoms().iter().copied())
            .filter(move |&id| only.is_none_or(|only| only == id))
            .filter_map(move |id| structure.atom(id).map(|atom| (id, atom)))
            .filter(move |(_, atom)| self.atom_criteria.iter().all(|c| c.accepts(atom)))
    }

    pub fn as_optional_chain(&self) -> Option<(ChainId, &'s Chain)> {
        self.as_filtered_chains().next()
    }

    pub fn as_optional_group(&self) -> Option<(GroupId, &'s Group)> {
        self.as_filtered_groups().next()
    }

    pub fn as_optional_atom(&self) -> Option<(AtomId, &'s Atom)> {
        self.as_filtered_atoms().next()
    }

    /// The only matching chain.
    ///
    /// # Errors
    ///
    /// [`SelectionError::NoSuchElement`] without a match, [`SelectionError::Ambiguous`] with
    /// more than one.
    pub fn as_chain(&self) -> Result<(ChainId, &'s Chain), SelectionError> {
        self.exactly_one(self.as_filtered_chains(), NodeKind::Chain)
    }

    /// The only matching group; fails like [`as_chain`](Self::as_chain).
    pub fn as_group(&self) -> Result<(GroupId, &'s Group), SelectionError> {
        self.exactly_one(self.as_filtered_groups(), NodeKind::Group)
    }

    /// The only matching atom; fails like [`as_chain`](Self::as_chain).
    pub fn as_atom(&self) -> Result<(AtomId, &'s Atom), SelectionError> {
        self.exactly_one(self.as_filtered_atoms(), NodeKind::Atom)
    }

    /// Materializes the matches as a view on the source structure.
    ///
    /// Containers emptied by a finer criterion are left out: with atom criteria the view
    /// holds only groups and chains that contain a matching atom, and with group criteria
    /// only chains that contain a matching group.
    pub fn as_view(&self) -> View<'s> {
        let structure = self.structure;
        let atoms: Vec<AtomId> = self.as_filtered_atoms().map(|(id, _)| id).collect();
        let groups: Vec<GroupId> = if self.atom_criteria.is_empty() {
            self.as_filtered_groups().map(|(id, _)| id).collect()
        } else {
            atoms
                .iter()
                .filter_map(|&id| structure.atom(id))
                .map(Atom::group_id)
                .dedup()
                .collect()
        };
        let chains: Vec<ChainId> = if self.atom_criteria.is_empty() && self.group_criteria.is_empty()
        {
            self.as_filtered_chains().map(|(id, _)| id).collect()
        } else {
            groups
                .iter()
                .filter_map(|&id| structure.group(id))
                .map(Group::chain_id)
                .dedup()
                .collect()
        };
        View::new(structure, self.container_name(), chains, groups, atoms)
    }

    /// Copies the matches into a new structure with fresh ids and empty feature stores.
    pub fn as_isolated_structure(&self) -> Structure {
        self.as_view().copy()
    }

    fn with_chain(mut self, test: impl Fn(&Chain) -> bool + 's, description: String) -> Self {
        let criterion = self.criterion(test, description);
        self.chain_criteria.push(criterion);
        self
    }

    fn with_group(mut self, test: impl Fn(&Group) -> bool + 's, description: String) -> Self {
        let criterion = self.criterion(test, description);
        self.group_criteria.push(criterion);
        self
    }

    fn with_atom(mut self, test: impl Fn(&Atom) -> bool + 's, description: String) -> Self {
        let criterion = self.criterion(test, description);
        self.atom_criteria.push(criterion);
        self
    }

    fn criterion<T: 's>(
        &self,
        test: impl Fn(&T) -> bool + 's,
        description: String,
    ) -> Criterion<'s, T> {
        if self.negated {
            Criterion {
                test: Box::new(move |node: &T| !test(node)),
                description: format!("NOT: {}", description),
            }
        } else {
            Criterion {
                test: Box::new(test),
                description,
            }
        }
    }

    /// The node of `kind` that bounds the candidates when the root is at or below `kind`.
    fn scope(&self, kind: NodeKind) -> Option<NodeId> {
        if self.root.kind() <= kind {
            self.structure.ancestor_or_self(self.root, kind)
        } else {
            None
        }
    }

    fn exactly_one<T>(
        &self,
        mut matches: impl Iterator<Item = T>,
        kind: NodeKind,
    ) -> Result<T, SelectionError> {
        let Some(first) = matches.next() else {
            return Err(SelectionError::NoSuchElement {
                kind,
                criteria: self.criteria(),
                container: self.container_name(),
            });
        };
        let extra = matches.count();
        if extra > 0 {
            return Err(SelectionError::Ambiguous {
                kind,
                criteria: self.criteria(),
                container: self.container_name(),
                count: extra + 1,
            });
        }
        Ok(first)
    }

    fn criteria(&self) -> String {
        let descriptions = self
            .chain_criteria
            .iter()
            .map(|c| c.description.as_str())
            .chain(self.group_criteria.iter().map(|c| c.description.as_str()))
            .chain(self.atom_criteria.iter().map(|c| c.description.as_str()))
            .join(", ");
        format!("[{}]", descriptions)
    }

    fn container_name(&self) -> String {
        if let Some(name) = &self.container_name {
            return name.clone();
        }
        let structure = self.structure;
        let name = match self.root {
            NodeId::Structure => Some(structure.identifier().to_string()),
            NodeId::Chain(id) => structure.chain(id).map(|chain| chain.name.clone()),
            NodeId::Group(id) => structure.group(id).map(Group::residue_label),
            NodeId::Atom(id) => structure.atom(id).map(|atom| atom.name.clone()),
        };
        name.unwrap_or_default()
    }
}

impl fmt::Debug for Selection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("root", &self.root)
            .field("criteria", &self.criteria())
            .field("negated", &self.negated)
            .finish_non_exhaustive()
    }
}

fn is_heavy(atom: &Atom) -> bool {
    match atom.element {
        Element::Other => is_heavy_atom(&atom.name),
        element => !element.is_hydrogen(),
    }
}

fn describe_distance(center: &Point3<f64>, cutoff: f64) -> String {
    format!(
        "{} A around ({:.3}, {:.3}, {:.3})",
        cutoff, center.x, center.y, center.z
    )
}
