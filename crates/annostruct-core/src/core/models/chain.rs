use super::ids::GroupId;
use crate::features::store::FeatureStore;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChainType {
    #[default]
    Protein,
    DNA,
    RNA,
    Ligand,
    Water,
    Other,
}

#[derive(Debug, Error)]
#[error("Invalid chain type string")]
pub struct ParseChainTypeError;

impl FromStr for ChainType {
    type Err = ParseChainTypeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "protein" => Ok(ChainType::Protein),
            "dna" => Ok(ChainType::DNA),
            "rna" => Ok(ChainType::RNA),
            "ligand" => Ok(ChainType::Ligand),
            "water" => Ok(ChainType::Water),
            "other" => Ok(ChainType::Other),
            _ => Err(ParseChainTypeError),
        }
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ChainType::Protein => "Protein",
                ChainType::DNA => "DNA",
                ChainType::RNA => "RNA",
                ChainType::Ligand => "Ligand",
                ChainType::Water => "Water",
                ChainType::Other => "Other",
            }
        )
    }
}

#[derive(Debug)]
pub struct Chain {
    pub name: String,                  // Chain identifier (e.g., "A", "B"), unique in its structure
    pub chain_type: ChainType,         // Type of the chain
    pub(crate) groups: Vec<GroupId>,   // Ordered list of groups belonging to this chain
    pub(crate) features: FeatureStore, // Features computed for the chain as a whole
}

impl Chain {
    pub(crate) fn new(name: &str, chain_type: ChainType) -> Self {
        Self {
            name: name.to_string(),
            chain_type,
            groups: Vec::new(),
            features: FeatureStore::new(),
        }
    }

    pub fn groups(&self) -> &[GroupId] {
        &self.groups
    }

    pub fn features(&self) -> &FeatureStore {
        &self.features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_type_parses_case_insensitively() {
        assert_eq!(ChainType::from_str("PROTEIN").unwrap(), ChainType::Protein);
        assert_eq!(ChainType::from_str("dna").unwrap(), ChainType::DNA);
        assert_eq!(ChainType::from_str("Water").unwrap(), ChainType::Water);
        assert!(ChainType::from_str("membrane").is_err());
    }

    #[test]
    fn chain_type_display_matches_variant_names() {
        assert_eq!(ChainType::RNA.to_string(), "RNA");
        assert_eq!(ChainType::Ligand.to_string(), "Ligand");
    }

    #[test]
    fn new_chain_is_empty() {
        let chain = Chain::new("A", ChainType::Protein);
        assert_eq!(chain.name, "A");
        assert!(chain.groups().is_empty());
        assert!(chain.features().is_empty());
    }
}
