//! Stable node identifiers for the per-function IR arena.
//!
//! Unlike a pointer-chasing AST, every [`IrNode`](crate::node::IrNode) is
//! addressed by a small integer that stays valid for the lifetime of the
//! owning [`IrFunction`](crate::function::IrFunction). An arena of stable
//! indices avoids the ownership cycles that shared mutable node references
//! (producer edges pointing one way, consumer edges the other) would
//! otherwise require.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for a node within one [`IrFunction`](crate::function::IrFunction).
///
/// IDs are assigned in allocation order starting at 0 and are never reused
/// within a function, even across nodes nested inside loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(value: u32) -> Self {
        NodeId(value)
    }
}

impl From<NodeId> for u32 {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Identifier for a [`FusionGroup`](crate::fusion::FusionGroup) within one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_display() {
        assert_eq!(format!("{}", NodeId(7)), "7");
    }

    #[test]
    fn group_id_display() {
        assert_eq!(format!("{}", GroupId(3)), "3");
    }

    #[test]
    fn node_id_from_u32_roundtrip() {
        let id = NodeId::from(42u32);
        assert_eq!(id.0, 42);
        let back: u32 = id.into();
        assert_eq!(back, 42);
    }

    #[test]
    fn serde_roundtrip() {
        let id = NodeId(9);
        let json = serde_json::to_string(&id).unwrap();
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
