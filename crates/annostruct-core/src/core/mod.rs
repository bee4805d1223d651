//! # Core Module
//!
//! The structural foundation every feature is attached to.
//!
//! - **Molecular Representation** ([`models`]) - Structures, chains, groups and atoms stored in
//!   slot-map arenas, with traversal, mutation and copy primitives
//! - **Shared Utilities** ([`utils`]) - Atom and residue name tables and small geometry helpers

pub mod models;
pub mod utils;
