use super::sequence::ChainSequence;
use crate::core::models::ids::{GroupId, NodeId, NodeKind};
use crate::engine::context::ComputeContext;
use crate::engine::error::FeatureError;
use crate::engine::provider::{FeatureProvider, ProviderDescriptor};
use crate::features::kind::FeatureKind;
use crate::selection::Selection;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

pub const SEQUENCE_MOTIF_PROVIDER: &str = "sequence-motifs";

/// Motifs recognized by [`SequenceMotifProvider::default`].
pub const STANDARD_MOTIFS: &[&str] = &[
    "GG4", "GA4", "AG4", "GS4", "SG4", "AA4", "IL4", "LI4", "LL4", "VL4", "IL7", "LI7", "LL7",
    "VL7", "VV7", "LV7",
];

/// A sequence motif: two residue types a fixed number of positions apart, written as the two
/// one-letter codes followed by the gap (`GG4` is a glycine, three residues, a glycine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotifDefinition {
    pub start: char,
    pub end: char,
    pub gap: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid motif definition '{0}', expected two residue letters and a gap such as 'GG4'")]
pub struct ParseMotifError(pub String);

impl FromStr for MotifDefinition {
    type Err = ParseMotifError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseMotifError(s.to_string());
        let mut chars = s.trim().chars();
        let start = chars.next().filter(char::is_ascii_alphabetic).ok_or_else(invalid)?;
        let end = chars.next().filter(char::is_ascii_alphabetic).ok_or_else(invalid)?;
        let gap: usize = chars.as_str().parse().map_err(|_| invalid())?;
        if gap == 0 {
            return Err(invalid());
        }
        Ok(Self {
            start: start.to_ascii_uppercase(),
            end: end.to_ascii_uppercase(),
            gap,
        })
    }
}

impl fmt::Display for MotifDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.start, self.end, self.gap)
    }
}

/// One occurrence of a motif in a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceMotif {
    pub definition: MotifDefinition,
    pub chain: String,
    pub start_residue: isize,
    pub end_residue: isize,
    /// The covered one-letter sequence, both ends included.
    pub sequence: String,
}

impl fmt::Display for SequenceMotif {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}:{}-{} {}",
            self.definition, self.chain, self.start_residue, self.end_residue, self.sequence
        )
    }
}

/// Motif hits, list-valued: every group lists the hits covering it and every chain lists all
/// hits found in it, in sequence order.
pub struct SequenceMotifs;

impl FeatureKind for SequenceMotifs {
    type Value = SequenceMotif;
    const NAME: &'static str = "SequenceMotifs";
    const DEFAULT_PROVIDER: Option<&'static str> = Some(SEQUENCE_MOTIF_PROVIDER);
}

#[derive(Debug, Clone)]
pub struct SequenceMotifProvider {
    definitions: Vec<MotifDefinition>,
}

impl Default for SequenceMotifProvider {
    fn default() -> Self {
        let definitions = STANDARD_MOTIFS
            .iter()
            .filter_map(|name| name.parse().ok())
            .collect();
        Self { definitions }
    }
}

impl SequenceMotifProvider {
    pub fn new(definitions: Vec<MotifDefinition>) -> Self {
        Self { definitions }
    }

    pub fn definitions(&self) -> &[MotifDefinition] {
        &self.definitions
    }

    pub fn descriptor(self) -> ProviderDescriptor {
        ProviderDescriptor::new(SEQUENCE_MOTIF_PROVIDER, NodeKind::Chain, self)
            .produces::<SequenceMotifs>()
            .requires::<ChainSequence>()
    }
}

/// Finds every motif occurrence in a run of amino acids.
///
/// `letters` and `numbers` describe the same residues in order. A hit needs matching letters
/// at both ends and residue numbers exactly `gap` apart, so runs interrupted by missing
/// residues never match. Returns `(start index, end index, definition)` triples ordered by
/// start index, then by definition order.
pub fn scan_motifs<'d>(
    letters: &[char],
    numbers: &[isize],
    definitions: &'d [MotifDefinition],
) -> Vec<(usize, usize, &'d MotifDefinition)> {
    let length = letters.len().min(numbers.len());
    let mut hits = Vec::new();
    for start in 0..length {
        for definition in definitions {
            let Some(end) = start.checked_add(definition.gap).filter(|&end| end < length) else {
                continue;
            };
            if letters[start] != definition.start || letters[end] != definition.end {
                continue;
            }
            let expected = isize::try_from(definition.gap)
                .ok()
                .and_then(|gap| numbers[start].checked_add(gap));
            if expected != Some(numbers[end]) {
                continue;
            }
            hits.push((start, end, definition));
        }
    }
    hits
}

impl FeatureProvider for SequenceMotifProvider {
    fn compute(&self, ctx: &mut ComputeContext<'_>, node: NodeId) -> Result<(), FeatureError> {
        for chain_id in ctx.structure().chains_under(node) {
            let sequence = ctx.get::<ChainSequence>(chain_id)?;
            let letters: Vec<char> = sequence.chars().collect();
            let residues: Vec<(GroupId, isize)> = Selection::within(ctx.structure(), chain_id)
                .amino_acids()
                .as_filtered_groups()
                .map(|(id, group)| (id, group.residue_number))
                .collect();
            if residues.len() != letters.len() {
                return Err(ctx.failure(format!(
                    "sequence of length {} does not match {} amino acids",
                    letters.len(),
                    residues.len()
                )));
            }
            let chain_name = ctx
                .structure()
                .chain(chain_id)
                .map(|chain| chain.name.clone())
                .unwrap_or_default();

            ctx.touch_list::<SequenceMotifs>(chain_id)?;
            for &(group_id, _) in &residues {
                ctx.touch_list::<SequenceMotifs>(group_id)?;
            }

            let numbers: Vec<isize> = residues.iter().map(|&(_, number)| number).collect();
            let hits = scan_motifs(&letters, &numbers, &self.definitions);
            for &(start, end, definition) in &hits {
                let motif = SequenceMotif {
                    definition: *definition,
                    chain: chain_name.clone(),
                    start_residue: numbers[start],
                    end_residue: numbers[end],
                    sequence: letters[start..=end].iter().collect(),
                };
                debug!(motif = %motif, "Found sequence motif.");
                for &(group_id, _) in &residues[start..=end] {
                    ctx.append::<SequenceMotifs>(group_id, motif.clone())?;
                }
                ctx.append::<SequenceMotifs>(chain_id, motif)?;
            }
            debug!(chain = %chain_name, hits = hits.len(), "Motif scan complete.");
        }
        Ok(())
    }
}
