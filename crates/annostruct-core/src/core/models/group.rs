use super::ids::{AtomId, ChainId};
use crate::core::utils::identifiers;
use crate::features::store::FeatureStore;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AminoAcidType {
    // --- Aliphatic, Nonpolar ---
    Alanine,
    Glycine,
    Isoleucine,
    Leucine,
    Proline,
    Valine,

    // --- Aromatic ---
    Phenylalanine,
    Tryptophan,
    Tyrosine,

    // --- Polar, Uncharged ---
    Asparagine,
    Cysteine,
    Glutamine,
    Serine,
    Threonine,
    Methionine,

    // --- Charged ---
    Arginine,
    Histidine,
    Lysine,
    AsparticAcid,
    GlutamicAcid,
}

impl AminoAcidType {
    pub fn from_three_letter(name: &str) -> Option<Self> {
        identifiers::amino_acid_by_three_letter(name)
    }

    pub fn to_three_letter(&self) -> &'static str {
        match self {
            AminoAcidType::Alanine => "ALA",
            AminoAcidType::Glycine => "GLY",
            AminoAcidType::Isoleucine => "ILE",
            AminoAcidType::Leucine => "LEU",
            AminoAcidType::Proline => "PRO",
            AminoAcidType::Valine => "VAL",
            AminoAcidType::Phenylalanine => "PHE",
            AminoAcidType::Tryptophan => "TRP",
            AminoAcidType::Tyrosine => "TYR",
            AminoAcidType::Asparagine => "ASN",
            AminoAcidType::Cysteine => "CYS",
            AminoAcidType::Glutamine => "GLN",
            AminoAcidType::Serine => "SER",
            AminoAcidType::Threonine => "THR",
            AminoAcidType::Methionine => "MET",
            AminoAcidType::Arginine => "ARG",
            AminoAcidType::Histidine => "HIS",
            AminoAcidType::Lysine => "LYS",
            AminoAcidType::AsparticAcid => "ASP",
            AminoAcidType::GlutamicAcid => "GLU",
        }
    }

    pub fn one_letter_code(&self) -> char {
        match self {
            AminoAcidType::Alanine => 'A',
            AminoAcidType::Glycine => 'G',
            AminoAcidType::Isoleucine => 'I',
            AminoAcidType::Leucine => 'L',
            AminoAcidType::Proline => 'P',
            AminoAcidType::Valine => 'V',
            AminoAcidType::Phenylalanine => 'F',
            AminoAcidType::Tryptophan => 'W',
            AminoAcidType::Tyrosine => 'Y',
            AminoAcidType::Asparagine => 'N',
            AminoAcidType::Cysteine => 'C',
            AminoAcidType::Glutamine => 'Q',
            AminoAcidType::Serine => 'S',
            AminoAcidType::Threonine => 'T',
            AminoAcidType::Methionine => 'M',
            AminoAcidType::Arginine => 'R',
            AminoAcidType::Histidine => 'H',
            AminoAcidType::Lysine => 'K',
            AminoAcidType::AsparticAcid => 'D',
            AminoAcidType::GlutamicAcid => 'E',
        }
    }

    pub fn from_one_letter(code: char) -> Option<Self> {
        match code.to_ascii_uppercase() {
            'A' => Some(AminoAcidType::Alanine),
            'G' => Some(AminoAcidType::Glycine),
            'I' => Some(AminoAcidType::Isoleucine),
            'L' => Some(AminoAcidType::Leucine),
            'P' => Some(AminoAcidType::Proline),
            'V' => Some(AminoAcidType::Valine),
            'F' => Some(AminoAcidType::Phenylalanine),
            'W' => Some(AminoAcidType::Tryptophan),
            'Y' => Some(AminoAcidType::Tyrosine),
            'N' => Some(AminoAcidType::Asparagine),
            'C' => Some(AminoAcidType::Cysteine),
            'Q' => Some(AminoAcidType::Glutamine),
            'S' => Some(AminoAcidType::Serine),
            'T' => Some(AminoAcidType::Threonine),
            'M' => Some(AminoAcidType::Methionine),
            'R' => Some(AminoAcidType::Arginine),
            'H' => Some(AminoAcidType::Histidine),
            'K' => Some(AminoAcidType::Lysine),
            'D' => Some(AminoAcidType::AsparticAcid),
            'E' => Some(AminoAcidType::GlutamicAcid),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid amino acid name: {0}")]
pub struct ParseAminoAcidError(pub String);

impl FromStr for AminoAcidType {
    type Err = ParseAminoAcidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_three_letter(s).ok_or_else(|| ParseAminoAcidError(s.to_string()))
    }
}

impl fmt::Display for AminoAcidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_three_letter())
    }
}

/// What kind of chemical entity a group represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    AminoAcid(AminoAcidType),
    Nucleotide,
    Water,
    Ligand,
}

impl GroupKind {
    /// Classifies a group by its three-letter name. Unknown names are ligands.
    pub fn infer(name: &str) -> Self {
        let name = name.trim();
        if let Some(amino_acid) = AminoAcidType::from_three_letter(name) {
            GroupKind::AminoAcid(amino_acid)
        } else if identifiers::is_water_name(name) {
            GroupKind::Water
        } else if identifiers::is_nucleotide_name(name) {
            GroupKind::Nucleotide
        } else {
            GroupKind::Ligand
        }
    }
}

/// One residue, nucleotide, ligand or water molecule.
#[derive(Debug)]
pub struct Group {
    /// Residue sequence number from the source file.
    pub residue_number: isize,
    pub insertion_code: Option<char>,
    /// Three-letter name of the group (e.g., "ALA", "HOH").
    pub name: String,
    pub kind: GroupKind,
    pub(crate) chain_id: ChainId,
    pub(crate) atoms: Vec<AtomId>,
    atom_name_map: HashMap<String, AtomId>,
    pub(crate) features: FeatureStore,
}

impl Group {
    pub(crate) fn new(
        residue_number: isize,
        insertion_code: Option<char>,
        name: &str,
        chain_id: ChainId,
    ) -> Self {
        Self {
            residue_number,
            insertion_code,
            name: name.to_string(),
            kind: GroupKind::infer(name),
            chain_id,
            atoms: Vec::new(),
            atom_name_map: HashMap::new(),
            features: FeatureStore::new(),
        }
    }

    /// Alternate locations share a name; the first atom registered under a name wins.
    pub(crate) fn add_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.push(atom_id);
        self.atom_name_map
            .entry(atom_name.to_string())
            .or_insert(atom_id);
    }

    pub(crate) fn remove_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.retain(|&id| id != atom_id);
        if self.atom_name_map.get(atom_name) == Some(&atom_id) {
            self.atom_name_map.remove(atom_name);
        }
    }

    pub(crate) fn clear_atoms(&mut self) -> Vec<AtomId> {
        self.atom_name_map.clear();
        std::mem::take(&mut self.atoms)
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    pub fn atom_id_by_name(&self, name: &str) -> Option<AtomId> {
        self.atom_name_map.get(name).copied()
    }

    pub fn features(&self) -> &FeatureStore {
        &self.features
    }

    pub fn amino_acid(&self) -> Option<AminoAcidType> {
        match self.kind {
            GroupKind::AminoAcid(amino_acid) => Some(amino_acid),
            _ => None,
        }
    }

    pub fn is_amino_acid(&self) -> bool {
        matches!(self.kind, GroupKind::AminoAcid(_))
    }

    pub fn is_nucleotide(&self) -> bool {
        matches!(self.kind, GroupKind::Nucleotide)
    }

    pub fn is_water(&self) -> bool {
        matches!(self.kind, GroupKind::Water)
    }

    pub fn is_ligand(&self) -> bool {
        matches!(self.kind, GroupKind::Ligand)
    }

    /// One-letter code of the group, `'X'` for anything that is not a standard amino acid.
    pub fn one_letter_code(&self) -> char {
        self.amino_acid()
            .map(|amino_acid| amino_acid.one_letter_code())
            .unwrap_or('X')
    }

    /// Residue number followed by the insertion code, as printed in structure files.
    pub fn residue_label(&self) -> String {
        match self.insertion_code {
            Some(code) => format!("{}{}", self.residue_number, code),
            None => self.residue_number.to_string(),
        }
    }
}
