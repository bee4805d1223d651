use super::atom::{Atom, Element};
use super::chain::ChainType;
use super::error::ModelError;
use super::ids::{ChainId, GroupId};
use super::structure::Structure;
use nalgebra::Point3;

/// Streaming construction interface for parsers.
///
/// Records arrive in file order: a chain is started, then groups within it, then atoms
/// within the current group. Calls chain fluently; the first misuse is remembered and
/// reported by [`build`](Self::build), later calls become no-ops.
pub struct StructureBuilder {
    structure: Structure,
    current_chain: Option<ChainId>,
    current_group: Option<GroupId>,
    error: Option<ModelError>,
}

impl StructureBuilder {
    pub fn new(identifier: &str) -> Self {
        Self {
            structure: Structure::new(identifier),
            current_chain: None,
            current_group: None,
            error: None,
        }
    }

    /// Starts (or resumes) the chain with the given identifier.
    pub fn start_chain(&mut self, name: &str, chain_type: ChainType) -> &mut Self {
        if self.error.is_none() {
            self.current_chain = Some(self.structure.add_chain(name, chain_type));
            self.current_group = None;
        }
        self
    }

    /// Starts (or resumes) a group in the current chain.
    pub fn start_group(
        &mut self,
        residue_number: isize,
        insertion_code: Option<char>,
        name: &str,
    ) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        let result = self
            .current_chain
            .ok_or(ModelError::NoCurrentChain("starting a group"))
            .and_then(|chain_id| {
                self.structure.add_group_with_insertion(
                    chain_id,
                    residue_number,
                    insertion_code,
                    name,
                )
            });
        match result {
            Ok(group_id) => self.current_group = Some(group_id),
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Adds an atom to the current group.
    pub fn add_atom(
        &mut self,
        serial: usize,
        name: &str,
        element: Element,
        position: Point3<f64>,
    ) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        let Some(group_id) = self.current_group else {
            self.error = Some(if self.current_chain.is_none() {
                ModelError::NoCurrentChain("adding atoms")
            } else {
                ModelError::NoCurrentGroup(name.to_string())
            });
            return self;
        };
        let atom = Atom::new(name, element, position).with_serial(serial);
        if let Err(e) = self.structure.add_atom(group_id, atom) {
            self.error = Some(e);
        }
        self
    }

    /// Finishes construction.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded while building.
    pub fn build(self) -> Result<Structure, ModelError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.structure),
        }
    }
}
