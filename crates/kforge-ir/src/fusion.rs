//! [`FusionGroup`] and the pattern tags the fusion planner assigns.

use serde::{Deserialize, Serialize};

use crate::id::{GroupId, NodeId};
use crate::range::LoopRange;

/// Which pattern rule produced a fusion group.
///
/// Ordering of benefit scores is part of the external contract:
/// `AllocElim` (30) > `ElemReduce` (20) > `ElemElem` (10) >
/// `LoadElem` (5) = `ElemStore` (5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FusionTag {
    /// `Alloc -> Store` with a matching `Load` elsewhere; cross-loop
    /// temporary elimination.
    AllocElim,
    /// `Elementwise -> Reduction`.
    ElemReduce,
    /// `Elementwise -> Elementwise`.
    ElemElem,
    /// `Load -> Elementwise` (single-consumer Load).
    LoadElem,
    /// `Elementwise -> Store`.
    ElemStore,
}

impl FusionTag {
    /// The benefit score used to break ties when two candidates claim the
    /// same node.
    pub fn benefit(self) -> u32 {
        match self {
            FusionTag::AllocElim => 30,
            FusionTag::ElemReduce => 20,
            FusionTag::ElemElem => 10,
            FusionTag::LoadElem => 5,
            FusionTag::ElemStore => 5,
        }
    }
}

/// A set of IR nodes slated to emit as a single fused loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionGroup {
    /// Identity of this group, unique within the owning function.
    pub id: GroupId,
    /// The one member at which emission happens; non-root members are
    /// skipped in the Emitter's traversal.
    pub root: NodeId,
    /// Members in topological order.
    pub members: Vec<NodeId>,
    /// Which pattern produced this group.
    pub tag: FusionTag,
    /// The iteration space shared by every member.
    pub range: LoopRange,
    /// Allocation nodes made dead by this fusion.
    pub eliminated_allocs: Vec<NodeId>,
}

impl FusionGroup {
    /// `true` if `id` is a member of this group.
    pub fn contains(&self, id: NodeId) -> bool {
        self.members.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benefit_ordering_matches_contract() {
        assert!(FusionTag::AllocElim.benefit() > FusionTag::ElemReduce.benefit());
        assert!(FusionTag::ElemReduce.benefit() > FusionTag::ElemElem.benefit());
        assert!(FusionTag::ElemElem.benefit() > FusionTag::LoadElem.benefit());
        assert_eq!(FusionTag::LoadElem.benefit(), FusionTag::ElemStore.benefit());
    }

    #[test]
    fn contains_checks_membership() {
        let group = FusionGroup {
            id: GroupId(0),
            root: NodeId(2),
            members: vec![NodeId(0), NodeId(1), NodeId(2)],
            tag: FusionTag::ElemElem,
            range: LoopRange::vectorized("i", "0", "n", "lanes", 4),
            eliminated_allocs: Vec::new(),
        };
        assert!(group.contains(NodeId(1)));
        assert!(!group.contains(NodeId(9)));
    }

    #[test]
    fn serde_roundtrip() {
        let group = FusionGroup {
            id: GroupId(1),
            root: NodeId(4),
            members: vec![NodeId(3), NodeId(4)],
            tag: FusionTag::AllocElim,
            range: LoopRange::scalar("i", "0", "n", "1"),
            eliminated_allocs: vec![NodeId(1)],
        };
        let json = serde_json::to_string(&group).unwrap();
        let back: FusionGroup = serde_json::from_str(&json).unwrap();
        assert_eq!(group, back);
    }
}
