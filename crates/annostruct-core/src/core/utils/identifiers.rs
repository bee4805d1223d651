use crate::core::models::group::AminoAcidType;
use phf::{Map, Set, phf_map, phf_set};

pub const ALPHA_CARBON_NAME: &str = "CA";
pub const BETA_CARBON_NAME: &str = "CB";

static BACKBONE_ATOM_NAMES: Set<&'static str> = phf_set! {
    "N", "H", "HN", "CA", "HA", "C", "O", "OXT", "H1", "H2", "H3", "NT",
    "HT1", "HT2", "HT3", "OT1", "OT2", "HC", "HOXT", "HA1", "HA2", "1HA", "2HA",
};

static WATER_NAMES: Set<&'static str> = phf_set! {
    "HOH", "WAT", "H2O", "DOD", "TIP", "TIP3", "SOL",
};

static NUCLEOTIDE_NAMES: Set<&'static str> = phf_set! {
    "A", "C", "G", "U", "I", "DA", "DC", "DG", "DT", "DU", "DI",
};

static AMINO_ACID_NAMES: Map<&'static str, AminoAcidType> = phf_map! {
    "ALA" => AminoAcidType::Alanine,
    "GLY" => AminoAcidType::Glycine,
    "ILE" => AminoAcidType::Isoleucine,
    "LEU" => AminoAcidType::Leucine,
    "PRO" => AminoAcidType::Proline,
    "VAL" => AminoAcidType::Valine,
    "PHE" => AminoAcidType::Phenylalanine,
    "TRP" => AminoAcidType::Tryptophan,
    "TYR" => AminoAcidType::Tyrosine,
    "ASN" => AminoAcidType::Asparagine,
    "CYS" => AminoAcidType::Cysteine,
    "GLN" => AminoAcidType::Glutamine,
    "SER" => AminoAcidType::Serine,
    "THR" => AminoAcidType::Threonine,
    "MET" => AminoAcidType::Methionine,
    "ARG" => AminoAcidType::Arginine,
    "HIS" => AminoAcidType::Histidine,
    "HSE" => AminoAcidType::Histidine,
    "HSD" => AminoAcidType::Histidine,
    "HSP" => AminoAcidType::Histidine,
    "LYS" => AminoAcidType::Lysine,
    "ASP" => AminoAcidType::AsparticAcid,
    "GLU" => AminoAcidType::GlutamicAcid,
};

pub fn is_backbone_atom(atom_name: &str) -> bool {
    BACKBONE_ATOM_NAMES.contains(atom_name.trim())
}

/// Name-based hydrogen test, for atoms whose element could not be determined. Names starting
/// with `H` or `D` (deuterium) are treated as hydrogens.
pub fn is_heavy_atom(atom_name: &str) -> bool {
    let first_char = atom_name
        .trim()
        .chars()
        .next()
        .map(|c| c.to_ascii_uppercase());
    !matches!(first_char, Some('H') | Some('D'))
}

pub fn is_water_name(group_name: &str) -> bool {
    WATER_NAMES.contains(group_name.trim())
}

pub fn is_nucleotide_name(group_name: &str) -> bool {
    NUCLEOTIDE_NAMES.contains(group_name.trim())
}

/// Looks up a standard amino acid by its three-letter code, including histidine
/// protonation-state aliases. Case-sensitive, surrounding whitespace ignored.
pub fn amino_acid_by_three_letter(group_name: &str) -> Option<AminoAcidType> {
    AMINO_ACID_NAMES.get(group_name.trim()).copied()
}
