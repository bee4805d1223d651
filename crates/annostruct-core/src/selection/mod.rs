//! # Selection Module
//!
//! Fluent queries over a [`Structure`](crate::core::models::structure::Structure).
//!
//! A [`Selection`] starts at a root node, accumulates chain, group and atom criteria, and
//! materializes into filtered sequences, single required nodes, a [`View`] sharing node
//! identity (and therefore cached features) with the source, or a detached copy with fresh
//! ids and empty feature stores. The source structure is never modified.
//!
//! ```ignore
//! let group = Selection::new(&structure)
//!     .chain_name(&["A"])
//!     .residue_number(&[11])
//!     .as_group()?;
//! ```

mod builder;
mod error;
mod view;

pub use builder::Selection;
pub use error::SelectionError;
pub use view::View;
