//! # Reference Providers
//!
//! Small providers that ship with the engine. They cover the three shapes a provider can
//! take: a chain-level annotator ([`sequence`]), a per-group batch annotator ([`centroid`])
//! and a list-valued annotator with a requirement ([`motif`]).

pub mod centroid;
pub mod motif;
pub mod sequence;

use crate::engine::error::RegistryError;
use crate::engine::registry::ProviderRegistry;
use centroid::GroupCentroidProvider;
use motif::SequenceMotifProvider;
use sequence::ChainSequenceProvider;

/// Registers the reference providers with their default settings.
///
/// # Errors
///
/// Fails if the registry is sealed or already holds a provider with one of their names.
pub fn register_reference_providers(registry: &ProviderRegistry) -> Result<(), RegistryError> {
    registry.register(ChainSequenceProvider::descriptor())?;
    registry.register(GroupCentroidProvider::descriptor())?;
    registry.register(SequenceMotifProvider::default().descriptor())?;
    Ok(())
}
