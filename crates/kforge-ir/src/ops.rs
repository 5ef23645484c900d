//! The closed set of operation kinds an [`IrNode`](crate::node::IrNode) can carry.
//!
//! Unlike the two-tier core/structured op split of a general-purpose
//! compiler IR, this IR only ever needs to answer "what kind of dataflow
//! node is this" for fusion purposes, so `OpKind` is a single flat enum
//! rather than a nested core/structured pair.

use serde::{Deserialize, Serialize};

/// The kind of an IR node.
///
/// Kinds are the unit the fusion planner's pattern table matches on:
/// `AllocElim` looks for `Alloc -> Store`, `Elem+Reduce` for
/// `Elementwise -> Reduction`, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
    /// Per-lane map: Add, Sub, Mul, Div, Min, Max, MulAdd, bitwise, compare,
    /// convert, transcendentals lowered to lane-wise intrinsics.
    Elementwise,
    /// Vector-to-scalar: ReduceSum, ReduceMin, ReduceMax, ReduceAnd, ReduceOr.
    Reduction,
    /// Contiguous vector memory read indexed by the enclosing loop.
    Load,
    /// Contiguous vector memory write indexed by the enclosing loop.
    Store,
    /// Sized temporary buffer creation.
    Alloc,
    /// Scalar-to-vector splat.
    Broadcast,
    /// An iteration space plus a body of child nodes.
    Loop,
    /// Cross-module reference requiring name resolution at emit time; may
    /// carry a function-valued argument for higher-order callees.
    Call,
    /// Non-vectorizable arithmetic/compare producing a scalar.
    Scalar,
    /// `if`/`return`/branching. Acts as an opaque fusion barrier.
    Control,
    /// Structural placeholder with no emitted effect.
    Noop,
}

impl OpKind {
    /// `true` for kinds that act as fusion barriers: the planner never
    /// fuses across a `Control` node.
    pub fn is_fusion_barrier(self) -> bool {
        matches!(self, OpKind::Control)
    }

    /// `true` for kinds whose only observable effect is vector memory
    /// traffic, relevant to the `AllocElim` and `Load+Elem`/`Elem+Store`
    /// pattern rules.
    pub fn is_memory(self) -> bool {
        matches!(self, OpKind::Load | OpKind::Store | OpKind::Alloc)
    }

    /// `true` if a node of this kind can itself carry a nested body
    /// (currently only `Loop`).
    pub fn has_children(self) -> bool {
        matches!(self, OpKind::Loop)
    }

    /// `true` if this kind produces no value and is skipped at emission.
    pub fn is_noop(self) -> bool {
        matches!(self, OpKind::Noop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_is_fusion_barrier() {
        assert!(OpKind::Control.is_fusion_barrier());
        assert!(!OpKind::Elementwise.is_fusion_barrier());
    }

    #[test]
    fn memory_kinds() {
        assert!(OpKind::Load.is_memory());
        assert!(OpKind::Store.is_memory());
        assert!(OpKind::Alloc.is_memory());
        assert!(!OpKind::Elementwise.is_memory());
        assert!(!OpKind::Reduction.is_memory());
    }

    #[test]
    fn only_loop_has_children() {
        assert!(OpKind::Loop.has_children());
        assert!(!OpKind::Elementwise.has_children());
        assert!(!OpKind::Call.has_children());
    }

    #[test]
    fn noop_is_noop() {
        assert!(OpKind::Noop.is_noop());
        assert!(!OpKind::Scalar.is_noop());
    }

    #[test]
    fn serde_roundtrip() {
        for kind in [
            OpKind::Elementwise,
            OpKind::Reduction,
            OpKind::Load,
            OpKind::Store,
            OpKind::Alloc,
            OpKind::Broadcast,
            OpKind::Loop,
            OpKind::Call,
            OpKind::Scalar,
            OpKind::Control,
            OpKind::Noop,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            let back: OpKind = serde_json::from_str(&json).unwrap();
            assert_eq!(kind, back);
        }
    }
}
