use super::ids::{AtomId, ChainId, GroupId, NodeId};
use thiserror::Error;

/// Errors raised by topology accessors and mutation primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Chain {0:?} not found in structure")]
    ChainNotFound(ChainId),

    #[error("Group {0:?} not found in structure")]
    GroupNotFound(GroupId),

    #[error("Atom {0:?} not found in structure")]
    AtomNotFound(AtomId),

    #[error("Node {0:?} not found in structure")]
    NodeNotFound(NodeId),

    #[error("A chain must be started before {0}")]
    NoCurrentChain(&'static str),

    #[error("A group must be started before adding atom '{0}'")]
    NoCurrentGroup(String),
}
