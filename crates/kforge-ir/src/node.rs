//! [`IrNode`], the unit of the per-function dataflow graph.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::id::{GroupId, NodeId};
use crate::ops::OpKind;
use crate::range::LoopRange;

/// Auxiliary data for a [`Call`](OpKind::Call) node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallInfo {
    /// Fully-qualified callee name (e.g. `"algo.Sum"`).
    pub callee: String,
    /// Type arguments in declaration order (empty if the callee is non-generic).
    pub type_args: Vec<String>,
    /// An optional function-valued argument for higher-order combinators
    /// (e.g. the function passed to `apply`).
    pub function_arg: Option<String>,
}

/// Auxiliary data for an [`Alloc`](OpKind::Alloc) node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocInfo {
    /// Size expression, kept as symbolic text (never evaluated by this crate).
    pub size_expr: String,
    /// Element type string (e.g. `"float32"`).
    pub element_type: String,
}

/// One node of a function's dataflow graph.
///
/// Per-kind auxiliary fields (`call`, `alloc`, `children`) are kept on a
/// uniform record rather than pushed into an `OpKind` payload. A uniform
/// record keeps construction and mutation (by the analyzer and planner)
/// simpler than matching through a variant payload at every call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrNode {
    /// Stable identifier, unique within the owning [`IrFunction`](crate::function::IrFunction).
    pub id: NodeId,
    /// The operation this node performs.
    pub kind: OpKind,
    /// Human-readable mnemonic (e.g. `"Add"`, `"ReduceSum"`).
    pub mnemonic: String,

    /// Edges to producer nodes within the same IR, in source order.
    pub inputs: SmallVec<[NodeId; 4]>,
    /// Symbolic input names not yet resolved to a producer node (parameters,
    /// loop induction variables, or forward references), in source order.
    pub input_names: SmallVec<[String; 4]>,
    /// Output variable names this node defines, in source order. Most nodes
    /// define exactly one; destructuring loads may define several.
    pub outputs: SmallVec<[String; 2]>,

    /// This node's own range if it is a [`Loop`](OpKind::Loop), or the
    /// enclosing loop's range copied in by the Analyzer's propagation pass.
    pub range: Option<LoopRange>,

    /// Body of a [`Loop`](OpKind::Loop) node, in source order. Empty for
    /// every other kind.
    pub children: Vec<NodeId>,

    /// Present only on [`Call`](OpKind::Call) nodes.
    pub call: Option<CallInfo>,
    /// Present only on [`Alloc`](OpKind::Alloc) nodes.
    pub alloc: Option<AllocInfo>,

    /// Producer node ids, deduplicated, populated by the Analyzer.
    #[serde(default)]
    pub producers: HashSet<NodeId>,
    /// Consumer node ids, deduplicated, populated by the Analyzer.
    #[serde(default)]
    pub consumers: HashSet<NodeId>,

    /// Fusion group this node belongs to, if any, populated by the Planner.
    pub group: Option<GroupId>,
    /// `true` if this node is the group's emission root.
    #[serde(default)]
    pub is_fusion_root: bool,
    /// `true` if this node (an eliminated `Alloc`, or a dead `Store`/`Load` in
    /// an `AllocElim` group) is skipped at emission.
    #[serde(default)]
    pub is_fusion_eliminated: bool,
}

impl IrNode {
    /// Creates a new, unanalyzed, unfused node of the given kind.
    pub fn new(id: NodeId, kind: OpKind, mnemonic: impl Into<String>) -> Self {
        IrNode {
            id,
            kind,
            mnemonic: mnemonic.into(),
            inputs: SmallVec::new(),
            input_names: SmallVec::new(),
            outputs: SmallVec::new(),
            range: None,
            children: Vec::new(),
            call: None,
            alloc: None,
            producers: HashSet::new(),
            consumers: HashSet::new(),
            group: None,
            is_fusion_root: false,
            is_fusion_eliminated: false,
        }
    }

    /// Builder-style: add an input node edge.
    pub fn with_input(mut self, id: NodeId) -> Self {
        self.inputs.push(id);
        self
    }

    /// Builder-style: add a symbolic (not-yet-resolved) input name.
    pub fn with_input_name(mut self, name: impl Into<String>) -> Self {
        self.input_names.push(name.into());
        self
    }

    /// Builder-style: add an output variable name.
    pub fn with_output(mut self, name: impl Into<String>) -> Self {
        self.outputs.push(name.into());
        self
    }

    /// Builder-style: attach a [`LoopRange`].
    pub fn with_range(mut self, range: LoopRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Builder-style: attach [`Loop`](OpKind::Loop) children.
    pub fn with_children(mut self, children: Vec<NodeId>) -> Self {
        self.children = children;
        self
    }

    /// Builder-style: attach [`CallInfo`].
    pub fn with_call(mut self, call: CallInfo) -> Self {
        self.call = Some(call);
        self
    }

    /// Builder-style: attach [`AllocInfo`].
    pub fn with_alloc(mut self, alloc: AllocInfo) -> Self {
        self.alloc = Some(alloc);
        self
    }

    /// `true` if this node currently belongs to a fusion group.
    pub fn is_fused(&self) -> bool {
        self.group.is_some()
    }

    /// The node's primary output name, if any.
    pub fn primary_output(&self) -> Option<&str> {
        self.outputs.first().map(String::as_str)
    }
}
