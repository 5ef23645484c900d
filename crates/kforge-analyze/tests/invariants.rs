//! Property tests for the analyzer/planner structural invariants (edge
//! mirroring, range propagation, fusion closure) and idempotence, over small
//! randomly-generated IR shapes rather than hand-picked fixtures.

use std::collections::HashSet;

use proptest::prelude::*;

use kforge_analyze::{analyze, plan};
use kforge_ir::{IrFunction, IrNode, LoopRange, NodeId, OpKind};

fn range_a() -> LoopRange {
    LoopRange::vectorized("i", "0", "size", "lanes", 4)
}

fn range_b() -> LoopRange {
    LoopRange::scalar("i", "0", "size", "1")
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Elem,
    Reduce,
    Load,
    Store,
    Control,
}

fn mnemonic_for(kind: Kind) -> &'static str {
    match kind {
        Kind::Elem => "Add",
        Kind::Reduce => "ReduceSum",
        Kind::Load => "Load",
        Kind::Store => "Store",
        Kind::Control => "If",
    }
}

fn op_kind_for(kind: Kind) -> OpKind {
    match kind {
        Kind::Elem => OpKind::Elementwise,
        Kind::Reduce => OpKind::Reduction,
        Kind::Load => OpKind::Load,
        Kind::Store => OpKind::Store,
        Kind::Control => OpKind::Control,
    }
}

fn kind_strategy() -> impl Strategy<Value = Kind> {
    prop_oneof![
        Just(Kind::Elem),
        Just(Kind::Reduce),
        Just(Kind::Load),
        Just(Kind::Store),
        Just(Kind::Control),
    ]
}

/// Builds a flat (no nested loops) top-level chain: each node optionally
/// consumes the previous node's output, and carries one of two ranges.
fn chain_strategy() -> impl Strategy<Value = Vec<(Kind, bool)>> {
    prop::collection::vec((kind_strategy(), any::<bool>()), 2..7)
}

fn build_chain(spec: &[(Kind, bool)]) -> IrFunction {
    let mut f = IrFunction::new("BaseRandomChain", "float32");
    let mut prev_output: Option<String> = None;
    for (i, &(kind, use_range_a)) in spec.iter().enumerate() {
        let range = if use_range_a { range_a() } else { range_b() };
        let mut node = IrNode::new(NodeId(0), op_kind_for(kind), mnemonic_for(kind))
            .with_output(format!("v{i}"))
            .with_range(range);
        if let Some(prev) = &prev_output {
            node = node.with_input_name(prev.clone());
        }
        f.push_top_level(node);
        prev_output = Some(format!("v{i}"));
    }
    f
}

proptest! {
    /// Edge mirror and fusion closure hold for any chain of randomly chosen
    /// node kinds and ranges.
    #[test]
    fn edge_mirror_and_fusion_closure_hold(spec in chain_strategy()) {
        let mut f = build_chain(&spec);
        let candidates = analyze(&mut f);
        let before = f.original_pass_count();
        plan(&mut f, &candidates);

        // Edge mirror.
        let ids: Vec<NodeId> = f.iter_nodes().map(|n| n.id).collect();
        for &id in &ids {
            let node = f.node(id).unwrap();
            for &p in &node.producers {
                prop_assert!(f.node(p).unwrap().consumers.contains(&id));
            }
            for &c in &node.consumers {
                prop_assert!(f.node(c).unwrap().producers.contains(&id));
            }
        }

        // Fusion closure: every group's members share its range and tag,
        // exactly one is the root, and none is a Control node.
        for group in &f.groups {
            let mut roots = 0;
            for &member in &group.members {
                let node = f.node(member).unwrap();
                prop_assert_eq!(node.group, Some(group.id));
                prop_assert_ne!(node.kind, OpKind::Control);
                if let Some(range) = &node.range {
                    prop_assert!(range.same_space_as(&group.range));
                }
                if node.is_fusion_root {
                    roots += 1;
                }
            }
            prop_assert_eq!(roots, 1);
        }

        // Round-trip fusion stats.
        prop_assert!(f.fused_pass_count() <= before);
    }

    /// Re-running Analyze+Plan on an already-planned function is a no-op:
    /// no new groups, no duplicated edges.
    #[test]
    fn analyze_and_plan_are_idempotent(spec in chain_strategy()) {
        let mut f = build_chain(&spec);
        let first_candidates = analyze(&mut f);
        let first_groups = plan(&mut f, &first_candidates);

        let edges_after_first: Vec<(NodeId, HashSet<NodeId>, HashSet<NodeId>)> =
            f.iter_nodes().map(|n| (n.id, n.producers.clone(), n.consumers.clone())).collect();

        let second_candidates = analyze(&mut f);
        let second_groups = plan(&mut f, &second_candidates);

        prop_assert!(second_groups.is_empty(), "replanning an already-fused function must add no groups");
        prop_assert_eq!(f.groups.len(), first_groups.len());

        for (id, producers, consumers) in edges_after_first {
            let node = f.node(id).unwrap();
            prop_assert_eq!(&node.producers, &producers);
            prop_assert_eq!(&node.consumers, &consumers);
        }
    }
}

/// Builds a single top-level `Loop` whose children are a short chain, some
/// carrying an explicit range already and some left for the Analyzer to
/// propagate into.
fn loop_with_children_strategy() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 1..5)
}

proptest! {
    /// Range propagation: every child of a `Loop` ends up with the loop's
    /// own range, whether or not it already had one.
    #[test]
    fn range_propagates_into_every_loop_child(has_own_range in loop_with_children_strategy()) {
        let mut f = IrFunction::new("BaseRandomLoop", "float32");
        let loop_range = range_a();
        let mut children = Vec::new();
        for (i, &already_ranged) in has_own_range.iter().enumerate() {
            let mut node = IrNode::new(NodeId(0), OpKind::Elementwise, "Add").with_output(format!("c{i}"));
            if already_ranged {
                node = node.with_range(loop_range.clone());
            }
            children.push(f.insert_node(node));
        }
        f.push_top_level(IrNode::new(NodeId(0), OpKind::Loop, "Loop").with_range(loop_range.clone()).with_children(children.clone()));

        analyze(&mut f);

        for &child in &children {
            let node = f.node(child).unwrap();
            prop_assert_eq!(node.range.as_ref(), Some(&loop_range));
        }
    }
}
