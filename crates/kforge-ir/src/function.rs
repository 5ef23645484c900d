//! [`IrFunction`], the function-scoped container for one generator invocation.

use serde::{Deserialize, Serialize};

use crate::error::IrError;
use crate::fusion::FusionGroup;
use crate::id::NodeId;
use crate::node::IrNode;

/// The semantic role of a parameter or return value.
///
/// Modeled as a payload-carrying variant rather than a uniform
/// `flags: (bool, bool, bool)` record: this makes "a slice has an element
/// type, a scalar does not" a compile-time fact instead of a runtime
/// invariant to uphold by convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    /// A contiguous slice parameter/return, with its element type string.
    Slice { element_type: String },
    /// An integer-kinded scalar.
    IntScalar,
    /// A floating-point-kinded scalar.
    FloatScalar,
}

/// One parameter or return descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    /// Parameter or return-value name as written in the source.
    pub name: String,
    /// Type string as written in the source (before generic substitution).
    pub type_string: String,
    /// Semantic role used by the Builder and Emitter.
    pub kind: ParamKind,
}

impl ParamDescriptor {
    pub fn slice(name: impl Into<String>, type_string: impl Into<String>, element_type: impl Into<String>) -> Self {
        ParamDescriptor {
            name: name.into(),
            type_string: type_string.into(),
            kind: ParamKind::Slice {
                element_type: element_type.into(),
            },
        }
    }

    pub fn int_scalar(name: impl Into<String>, type_string: impl Into<String>) -> Self {
        ParamDescriptor {
            name: name.into(),
            type_string: type_string.into(),
            kind: ParamKind::IntScalar,
        }
    }

    pub fn float_scalar(name: impl Into<String>, type_string: impl Into<String>) -> Self {
        ParamDescriptor {
            name: name.into(),
            type_string: type_string.into(),
            kind: ParamKind::FloatScalar,
        }
    }

    pub fn is_slice(&self) -> bool {
        matches!(self.kind, ParamKind::Slice { .. })
    }
}

/// A function-scoped container holding every node the Builder, Analyzer, and
/// Planner created for one generator invocation.
///
/// Nodes live in a flat arena (`nodes: Vec<IrNode>`, index == `NodeId`):
/// stable integer indices stand in for node pointers, which avoids the
/// producer/consumer ownership cycles a shared-reference graph would need
/// and needs no separate graph crate for a single-function IR this small.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrFunction {
    /// Function name, as written in the source (e.g. `"BaseSoftmax"`).
    pub name: String,
    /// Generic type parameters and their constraints, kept as opaque strings.
    pub type_params: Vec<(String, String)>,
    /// Parameter descriptors in declaration order.
    pub params: Vec<ParamDescriptor>,
    /// Return descriptors, same shape as `params`.
    pub returns: Vec<ParamDescriptor>,
    /// Top-level operation nodes (loops and non-nested statements), in
    /// source order. Nodes nested inside a `Loop` are *not* listed here --
    /// they are reachable through that loop's `children` -- but they are
    /// still registered in `nodes`.
    pub top_level: Vec<NodeId>,
    /// Every node created for this function, indexed by `NodeId.0`.
    nodes: Vec<IrNode>,
    /// Fusion groups computed by the Planner. Empty until the Planner runs.
    pub groups: Vec<FusionGroup>,
    /// Resolved concrete element type substituting generic parameters
    /// (e.g. `"float32"`).
    pub element_type: String,
}

impl IrFunction {
    /// Creates an empty function shell with no nodes, params, or returns yet.
    pub fn new(name: impl Into<String>, element_type: impl Into<String>) -> Self {
        IrFunction {
            name: name.into(),
            type_params: Vec::new(),
            params: Vec::new(),
            returns: Vec::new(),
            top_level: Vec::new(),
            nodes: Vec::new(),
            groups: Vec::new(),
            element_type: element_type.into(),
        }
    }

    /// Inserts a node into the arena, assigning it the next available
    /// [`NodeId`] (overwriting whatever id it was constructed with) and
    /// returning that id.
    pub fn insert_node(&mut self, mut node: IrNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        node.id = id;
        self.nodes.push(node);
        id
    }

    /// Inserts a node and appends it to `top_level` in one step.
    pub fn push_top_level(&mut self, node: IrNode) -> NodeId {
        let id = self.insert_node(node);
        self.top_level.push(id);
        id
    }

    /// Looks up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&IrNode> {
        self.nodes.get(id.0 as usize)
    }

    /// Looks up a node by id, returning a structured error if absent.
    pub fn try_node(&self, id: NodeId) -> Result<&IrNode, IrError> {
        self.node(id).ok_or(IrError::NodeNotFound(id))
    }

    /// Mutably looks up a node by id.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut IrNode> {
        self.nodes.get_mut(id.0 as usize)
    }

    /// Iterates every node in the function, including ones nested inside
    /// loops, in allocation (id) order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &IrNode> {
        self.nodes.iter()
    }

    /// Iterates every node mutably, in allocation (id) order.
    pub fn iter_nodes_mut(&mut self) -> impl Iterator<Item = &mut IrNode> {
        self.nodes.iter_mut()
    }

    /// Total number of nodes registered in the function, including children.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Replaces the planner's fusion groups wholesale (used when re-planning
    /// from scratch).
    pub fn set_groups(&mut self, groups: Vec<FusionGroup>) {
        self.groups = groups;
    }

    /// Count of top-level `Loop` nodes before fusion -- the numerator in the
    /// `fused_passes <= original_passes` round-trip check.
    pub fn original_pass_count(&self) -> usize {
        self.top_level
            .iter()
            .filter_map(|id| self.node(*id))
            .filter(|n| n.kind == crate::ops::OpKind::Loop)
            .count()
    }

    /// Count of distinct loops remaining after fusion: every top-level `Loop`
    /// that is either unfused, or is a fusion-group root.
    pub fn fused_pass_count(&self) -> usize {
        self.top_level
            .iter()
            .filter_map(|id| self.node(*id))
            .filter(|n| n.kind == crate::ops::OpKind::Loop)
            .filter(|n| n.group.is_none() || n.is_fusion_root)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::OpKind;

    #[test]
    fn insert_node_assigns_sequential_ids() {
        let mut f = IrFunction::new("BaseAdd", "float32");
        let a = f.insert_node(IrNode::new(NodeId(99), OpKind::Load, "Load"));
        let b = f.insert_node(IrNode::new(NodeId(99), OpKind::Store, "Store"));
        assert_eq!(a, NodeId(0));
        assert_eq!(b, NodeId(1));
        assert_eq!(f.node(a).unwrap().kind, OpKind::Load);
        assert_eq!(f.node_count(), 2);
    }

    #[test]
    fn push_top_level_registers_and_lists() {
        let mut f = IrFunction::new("BaseAdd", "float32");
        let id = f.push_top_level(IrNode::new(NodeId(0), OpKind::Loop, "Loop"));
        assert_eq!(f.top_level, vec![id]);
        assert!(f.node(id).is_some());
    }

    #[test]
    fn try_node_errors_on_missing_id() {
        let f = IrFunction::new("BaseAdd", "float32");
        assert!(f.try_node(NodeId(0)).is_err());
    }

    #[test]
    fn param_descriptor_kinds() {
        let p = ParamDescriptor::slice("xs", "[]float32", "float32");
        assert!(p.is_slice());
        let s = ParamDescriptor::float_scalar("scale", "float32");
        assert!(!s.is_slice());
    }

    #[test]
    fn original_and_fused_pass_counts() {
        let mut f = IrFunction::new("BaseChain", "float32");
        let loop1 = f.push_top_level(IrNode::new(NodeId(0), OpKind::Loop, "Loop"));
        let loop2 = f.push_top_level(IrNode::new(NodeId(0), OpKind::Loop, "Loop"));
        assert_eq!(f.original_pass_count(), 2);
        assert_eq!(f.fused_pass_count(), 2);

        // Fuse loop1 and loop2 into one group rooted at loop2.
        f.node_mut(loop1).unwrap().group = Some(crate::id::GroupId(0));
        f.node_mut(loop2).unwrap().group = Some(crate::id::GroupId(0));
        f.node_mut(loop2).unwrap().is_fusion_root = true;
        assert_eq!(f.fused_pass_count(), 1);
        assert!(f.fused_pass_count() <= f.original_pass_count());
    }

    #[test]
    fn serde_roundtrip() {
        let mut f = IrFunction::new("BaseAdd", "float32");
        f.params.push(ParamDescriptor::slice("xs", "[]float32", "float32"));
        f.push_top_level(IrNode::new(NodeId(0), OpKind::Loop, "Loop"));
        let json = serde_json::to_string(&f).unwrap();
        let back: IrFunction = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, f.name);
        assert_eq!(back.node_count(), f.node_count());
    }
}
