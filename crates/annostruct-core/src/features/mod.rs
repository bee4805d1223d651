//! # Features Module
//!
//! Typed feature kinds and the per-node store that caches their values.
//!
//! - [`kind`] - the [`FeatureKind`](kind::FeatureKind) trait, its type-erased
//!   [`FeatureKey`](kind::FeatureKey) and provider ids
//! - [`store`] - the heterogeneous [`FeatureStore`](store::FeatureStore) attached to every node
//!
//! Values are only ever written by the resolver in [`crate::engine`]; client code reads
//! them through the store or asks the resolver to compute them.

pub mod kind;
pub mod store;
