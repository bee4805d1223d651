//! # Engine Module
//!
//! This module turns feature requests into provider executions.
//!
//! ## Overview
//!
//! Providers are described once ([`provider::ProviderDescriptor`]), collected in a
//! [`registry::ProviderRegistry`] and frozen by sealing it. A [`resolver::Resolver`] built over
//! the sealed registry answers `get::<K>(structure, node)` by selecting a provider, resolving
//! its requirements depth-first, running it once on the right scope node and caching every
//! value it writes in the feature stores of the structure.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Tie-break policy, origin preference and provider overrides
//! - **Providers** ([`provider`]) - Provider declarations and the executable entry trait
//! - **Registry** ([`registry`]) - Two-phase provider catalogue with static planning
//! - **Resolution** ([`resolver`], [`context`]) - Memoized, cycle-checked execution
//! - **Progress Monitoring** ([`progress`]) - Optional observation of resolution events
//! - **Error Handling** ([`error`]) - Resolution and registry error types

pub mod config;
pub mod context;
pub mod error;
pub mod progress;
pub mod provider;
pub mod registry;
pub mod resolver;
