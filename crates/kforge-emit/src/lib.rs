//! C emitter for the kforge code generator.
//!
//! `kforge-emit` is the last pipeline stage: it walks an
//! [`IrFunction`](kforge_ir::IrFunction) already annotated by
//! `kforge-analyze`'s planner and renders it as a single C translation unit
//! targeting one [`IntrinsicProfile`] tier. Unlike the analyzer and planner,
//! this stage is fallible -- a fusion group id with no matching group, or a
//! `Loop` node with no range, is an internal consistency violation rather
//! than a missed optimization.

pub mod emitter;
pub mod error;
pub mod profile;

pub use emitter::{emit, emitted_function_name};
pub use error::EmitError;
pub use profile::{
    profile_by_name, Avx2Profile, Avx512Profile, FallbackProfile, FmaArgOrder, IntrinsicProfile,
    NeonProfile,
};
