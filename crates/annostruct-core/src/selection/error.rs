use crate::core::models::ids::NodeKind;
use thiserror::Error;

/// Errors raised when materializing a selection that must yield exactly one node.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Did not find any {kind} matching {criteria} in '{container}'")]
    NoSuchElement {
        kind: NodeKind,
        criteria: String,
        container: String,
    },

    #[error("Found {count} {kind} nodes matching {criteria} in '{container}', expected exactly one")]
    Ambiguous {
        kind: NodeKind,
        criteria: String,
        container: String,
        count: usize,
    },
}
