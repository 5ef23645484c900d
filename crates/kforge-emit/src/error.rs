//! Error type for the emitter.

use thiserror::Error;

use kforge_ir::{GroupId, NodeId};

/// Errors produced while emitting C source from an annotated, fused
/// [`IrFunction`](kforge_ir::IrFunction).
///
/// Emission is the one stage downstream of Build that *can* fail: unlike the
/// Analyzer and Planner (which always degrade to "missed optimization"), a
/// `Loop` node with no range or a fusion group id with no matching
/// [`FusionGroup`](kforge_ir::FusionGroup) is an internal consistency
/// violation the Emitter cannot paper over, since it has nowhere to recover
/// the iteration space or member list from.
#[derive(Debug, Error)]
pub enum EmitError {
    /// A `Loop` node carries no `LoopRange`.
    #[error("loop node {0} has no LoopRange")]
    MissingLoopRange(NodeId),

    /// A node's `group` id has no corresponding entry in `IrFunction::groups`.
    #[error("fusion group {0} referenced by a node but not found in IrFunction::groups")]
    GroupNotFound(GroupId),

    /// An `Alloc` node is missing its `AllocInfo` payload.
    #[error("alloc node {0} has no AllocInfo")]
    MissingAllocInfo(NodeId),
}
