//! Error types for IR construction.
//!
//! Uses `thiserror` for structured, matchable error variants, following the
//! same shape as the rest of this workspace's per-crate error enums.

use thiserror::Error;

use crate::id::NodeId;

/// Errors produced while building an [`IrFunction`](crate::function::IrFunction)
/// from a [`ParsedFunction`](crate::parsed::ParsedFunction).
///
/// These are the one *fatal* class of error in the pipeline: everything
/// downstream (unresolved calls, failed fusion) degrades gracefully instead
/// of aborting.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A right-hand side expression could not be resolved to an IR node.
    #[error("malformed right-hand side in '{context}': {reason}")]
    MalformedExpr { context: String, reason: String },

    /// A for-loop header did not expose an induction variable, start bound,
    /// end bound, and step in a recognizable shape.
    #[error("malformed loop header in '{context}': {reason}")]
    MalformedLoopHeader { context: String, reason: String },

    /// A call expression had an inconsistent number of operands for its
    /// classified op kind (e.g. a binary hwy op called with one argument).
    #[error("inconsistent operand arity for '{callee}': expected {expected}, found {found}")]
    InconsistentArity {
        callee: String,
        expected: usize,
        found: usize,
    },

    /// An assignment referenced an output name with no matching declaration
    /// or prior binding, and no type could be inferred for it.
    #[error("undeclared variable '{name}' in '{context}'")]
    UndeclaredVariable { name: String, context: String },
}

/// Errors raised by [`NodeId`] lookups against an [`IrFunction`](crate::function::IrFunction).
#[derive(Debug, Error)]
pub enum IrError {
    /// A build error occurred while constructing the IR.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// A node id was not found in the function's lookup table.
    #[error("node not found: NodeId({0})", .0 .0)]
    NodeNotFound(NodeId),
}
