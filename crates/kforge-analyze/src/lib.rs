//! Analyzer and Fusion Planner for the kforge code generator.
//!
//! This crate has no fallible boundary of its own: analysis and planning
//! are total functions over any [`IrFunction`](kforge_ir::IrFunction), and
//! an unresolved name or an unfusable candidate is a missed optimization,
//! not an error. Callers that want to observe what was found inspect the
//! returned [`FusionCandidate`]s and [`FusionGroup`]s, or the node flags the
//! planner stamps in place.

pub mod analyzer;
pub mod planner;

pub use analyzer::{analyze, FusionCandidate};
pub use planner::plan;
