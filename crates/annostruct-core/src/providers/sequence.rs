use crate::core::models::ids::{NodeId, NodeKind};
use crate::engine::context::ComputeContext;
use crate::engine::error::FeatureError;
use crate::engine::provider::{FeatureProvider, ProviderDescriptor};
use crate::features::kind::FeatureKind;
use crate::selection::Selection;
use tracing::trace;

pub const CHAIN_SEQUENCE_PROVIDER: &str = "chain-sequence";

/// One-letter amino-acid sequence of a chain. Groups that are not amino acids are skipped.
pub struct ChainSequence;

impl FeatureKind for ChainSequence {
    type Value = String;
    const NAME: &'static str = "ChainSequence";
    const DEFAULT_PROVIDER: Option<&'static str> = Some(CHAIN_SEQUENCE_PROVIDER);
}

#[derive(Debug, Default)]
pub struct ChainSequenceProvider;

impl ChainSequenceProvider {
    pub fn descriptor() -> ProviderDescriptor {
        ProviderDescriptor::new(CHAIN_SEQUENCE_PROVIDER, NodeKind::Chain, Self)
            .produces::<ChainSequence>()
    }
}

impl FeatureProvider for ChainSequenceProvider {
    fn compute(&self, ctx: &mut ComputeContext<'_>, node: NodeId) -> Result<(), FeatureError> {
        for chain_id in ctx.structure().chains_under(node) {
            let sequence: String = Selection::within(ctx.structure(), chain_id)
                .amino_acids()
                .as_filtered_groups()
                .map(|(_, group)| group.one_letter_code())
                .collect();
            trace!(length = sequence.len(), "Derived chain sequence.");
            ctx.set::<ChainSequence>(chain_id, sequence)?;
        }
        Ok(())
    }
}
