//! # Core Models Module
//!
//! The structural hierarchy that features are attached to:
//! [`Structure`](structure::Structure) ⊃ [`Chain`](chain::Chain) ⊃
//! [`Group`](group::Group) ⊃ [`Atom`](atom::Atom).
//!
//! All nodes live in slot-map arenas owned by the structure and are addressed by the typed
//! ids in [`ids`]. Parents are looked up through ids, never owned, so the containment tree
//! has a single direction of ownership.
//!
//! ## Key Components
//!
//! - [`atom`] - atoms and the [`Element`](atom::Element) vocabulary
//! - [`group`] - residues, ligands and waters with the amino-acid vocabulary
//! - [`chain`] - chains and their types
//! - [`structure`] - the arena-backed root with traversal and mutation primitives
//! - [`builder`] - streaming construction for parsers
//! - [`node`] - capability traits shared by the node kinds
//! - [`ids`] - typed keys and the node addressing enum
//!
//! ## Usage
//!
//! ```ignore
//! use annostruct::core::models::{structure::Structure, atom::{Atom, Element}};
//!
//! let mut structure = Structure::new("1ABC");
//! let chain_id = structure.add_chain("A", ChainType::Protein);
//! let group_id = structure.add_group(chain_id, 1, "ALA")?;
//!
//! let atom = Atom::new("CA", Element::C, Point3::new(0.0, 0.0, 0.0));
//! structure.add_atom(group_id, atom)?;
//! ```

pub mod atom;
pub mod builder;
pub mod chain;
pub mod error;
pub mod group;
pub mod ids;
pub mod node;
pub mod structure;
