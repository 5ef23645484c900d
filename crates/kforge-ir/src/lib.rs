//! Core IR data model and Builder for the kforge code generator.
//!
//! `kforge-ir` owns the data the rest of the pipeline (`kforge-analyze`,
//! `kforge-emit`) reads and annotates: [`IrFunction`] and the [`IrNode`]s it
//! contains, plus the Builder that constructs an `IrFunction` from a
//! [`ParsedFunction`].

pub mod builder;
pub mod error;
pub mod function;
pub mod fusion;
pub mod id;
pub mod node;
pub mod ops;
pub mod parsed;
pub mod range;

pub use builder::{build, BuildConfig};
pub use error::{BuildError, IrError};
pub use function::{IrFunction, ParamDescriptor, ParamKind};
pub use fusion::{FusionGroup, FusionTag};
pub use id::{GroupId, NodeId};
pub use node::{AllocInfo, CallInfo, IrNode};
pub use ops::OpKind;
pub use parsed::{Expr, ParsedFunction, Stmt};
pub use range::LoopRange;
