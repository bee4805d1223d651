use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    pub struct AtomId;
    pub struct GroupId;
    pub struct ChainId;
}

/// The level of a node in the containment hierarchy.
///
/// Variants are ordered from the finest to the coarsest level, so `a < b` reads as
/// "`a` is nested below `b`".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Atom,
    Group,
    Chain,
    Structure,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                NodeKind::Atom => "Atom",
                NodeKind::Group => "Group",
                NodeKind::Chain => "Chain",
                NodeKind::Structure => "Structure",
            }
        )
    }
}

/// Addresses any node of a [`Structure`](super::structure::Structure).
///
/// Node identity is key-based: two nodes with identical content but different keys are
/// different nodes, both for feature caching and for dependency tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Structure,
    Chain(ChainId),
    Group(GroupId),
    Atom(AtomId),
}

impl NodeId {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeId::Structure => NodeKind::Structure,
            NodeId::Chain(_) => NodeKind::Chain,
            NodeId::Group(_) => NodeKind::Group,
            NodeId::Atom(_) => NodeKind::Atom,
        }
    }
}

impl From<ChainId> for NodeId {
    fn from(id: ChainId) -> Self {
        NodeId::Chain(id)
    }
}

impl From<GroupId> for NodeId {
    fn from(id: GroupId) -> Self {
        NodeId::Group(id)
    }
}

impl From<AtomId> for NodeId {
    fn from(id: AtomId) -> Self {
        NodeId::Atom(id)
    }
}
