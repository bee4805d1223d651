//! # annostruct
//!
//! A feature computation engine for hierarchical molecular structures.
//!
//! Structures are trees of chains, groups (residues, ligands, waters) and atoms. Every node
//! carries a typed feature store, and pluggable providers compute features on demand: asking
//! the resolver for a feature runs whatever chain of providers produces it, each exactly once,
//! and caches every value written along the way.
//!
//! ## Architectural Philosophy
//!
//! - **[`core`]: The Foundation.** The arena-backed structural model, its builder and the
//!   chemical vocabularies.
//!
//! - **[`features`]: The Cache.** Feature kinds as marker types and the per-node stores
//!   holding their values.
//!
//! - **[`engine`]: The Logic Core.** Provider declarations, the sealed registry, and the
//!   resolver that plans, memoizes and commits provider executions.
//!
//! - **[`selection`]: The Query Layer.** Fluent filters producing node sequences, views
//!   and detached copies.
//!
//! - **[`providers`]: Reference Providers.** Chain sequences, group centroids and sequence
//!   motifs built on the public provider API.
//!
//! ## Usage
//!
//! ```ignore
//! let registry = ProviderRegistry::new();
//! register_reference_providers(&registry)?;
//! registry.seal();
//!
//! let resolver = Resolver::new(&registry, EngineConfig::default())?;
//! let sequence = resolver.get::<ChainSequence>(&mut structure, chain_id)?;
//! ```

pub mod core;
pub mod engine;
pub mod features;
pub mod providers;
pub mod selection;
