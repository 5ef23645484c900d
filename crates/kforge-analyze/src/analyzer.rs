//! The analyzer: builds producer/consumer edges from symbolic names,
//! propagates `LoopRange`s down into loop bodies, and enumerates fusion
//! candidates for the planner.
//!
//! Analysis never fails. An unresolved name, a loop with no range, or an
//! ambiguous definition is a missed optimization opportunity, not an error,
//! so `analyze` returns a plain `Vec`, not a `Result`.

use std::collections::HashMap;

use kforge_ir::{FusionTag, IrFunction, IrNode, NodeId, OpKind};

/// A candidate fusion between two directly-connected nodes, before the
/// Planner resolves conflicts and groups them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FusionCandidate {
    pub producer: NodeId,
    pub consumer: NodeId,
    pub tag: FusionTag,
    pub benefit: u32,
}

/// Runs the Analyzer over `ir`, mutating it in place (clearing and
/// recomputing producer/consumer edges and propagated ranges) and returning
/// the fusion candidates found.
///
/// Idempotent: calling this twice in a row on the same function produces the
/// same edges and the same candidate list.
pub fn analyze(ir: &mut IrFunction) -> Vec<FusionCandidate> {
    tracing::debug!(function = %ir.name, nodes = ir.node_count(), "analyzing IR");
    reset_edges(ir);
    let definitions = collect_definitions(ir);
    apply_use_edges(ir, &definitions);
    propagate_ranges(ir);
    let candidates = enumerate_candidates(ir);
    tracing::debug!(
        function = %ir.name,
        candidates = candidates.len(),
        "fusion candidates enumerated"
    );
    for c in &candidates {
        tracing::trace!(
            producer = c.producer.0,
            consumer = c.consumer.0,
            tag = ?c.tag,
            benefit = c.benefit,
            "fusion candidate"
        );
    }
    candidates
}

/// Clears previously-computed producer/consumer sets so re-running the
/// Analyzer recomputes from scratch instead of accumulating duplicates.
fn reset_edges(ir: &mut IrFunction) {
    for node in ir.iter_nodes_mut() {
        node.producers.clear();
        node.consumers.clear();
    }
}

/// Maps every output variable name to the node that defines it.
///
/// A name redefined by more than one node (e.g. reassignment) keeps the last
/// writer encountered in id order, matching source order since ids are
/// assigned as the Builder visits statements.
fn collect_definitions(ir: &IrFunction) -> HashMap<String, NodeId> {
    let mut definitions = HashMap::new();
    for node in ir.iter_nodes() {
        for name in &node.outputs {
            definitions.insert(name.clone(), node.id);
        }
    }
    definitions
}

/// Resolves every node's `input_names` and `inputs` against `definitions`,
/// recording a mirrored producer/consumer edge for each.
fn apply_use_edges(ir: &mut IrFunction, definitions: &HashMap<String, NodeId>) {
    let mut edges: Vec<(NodeId, NodeId)> = Vec::new();
    for node in ir.iter_nodes() {
        for producer in &node.inputs {
            edges.push((*producer, node.id));
        }
        for name in &node.input_names {
            if let Some(producer) = definitions.get(name) {
                if *producer != node.id {
                    edges.push((*producer, node.id));
                }
            }
        }
    }
    for (producer, consumer) in edges {
        if let Some(p) = ir.node_mut(producer) {
            p.consumers.insert(consumer);
        }
        if let Some(c) = ir.node_mut(consumer) {
            c.producers.insert(producer);
        }
    }
}

/// Walks every top-level `Loop`, giving each child without its own range a
/// clone of the enclosing range, recursively through nested loops.
///
/// The builder already sets this at construction time; this pass is the
/// idempotent safety net the analyzer is responsible for, so a hand-built
/// `IrFunction` (as in a test fixture, or one stitched together by a future
/// tool) that skips that step is still correctly ranged after analysis.
fn propagate_ranges(ir: &mut IrFunction) {
    let top_level = ir.top_level.clone();
    for id in top_level {
        propagate_from(ir, id);
    }
}

fn propagate_from(ir: &mut IrFunction, loop_id: NodeId) {
    let (is_loop, range, children) = match ir.node(loop_id) {
        Some(n) if n.kind == OpKind::Loop => (true, n.range.clone(), n.children.clone()),
        _ => (false, None, Vec::new()),
    };
    if !is_loop {
        return;
    }
    let Some(range) = range else { return };
    for child in children {
        let is_child_loop = ir.node(child).map(|n| n.kind == OpKind::Loop).unwrap_or(false);
        if let Some(node) = ir.node_mut(child) {
            if node.range.is_none() {
                node.range = Some(range.clone());
            }
        }
        if is_child_loop {
            propagate_from(ir, child);
        }
    }
}

/// Looks up the pattern rule for a producer/consumer kind pair, if any.
fn rule_for(producer: &IrNode, consumer: &IrNode) -> Option<FusionTag> {
    match (producer.kind, consumer.kind) {
        (OpKind::Alloc, OpKind::Store) => Some(FusionTag::AllocElim),
        (OpKind::Elementwise, OpKind::Reduction) => Some(FusionTag::ElemReduce),
        (OpKind::Elementwise, OpKind::Elementwise) => Some(FusionTag::ElemElem),
        (OpKind::Load, OpKind::Elementwise) if producer.consumers.len() == 1 => Some(FusionTag::LoadElem),
        (OpKind::Elementwise, OpKind::Store) => Some(FusionTag::ElemStore),
        _ => None,
    }
}

/// Walks every producer/consumer edge and emits a candidate for the ones
/// matching the pattern table, skipping any pair whose ranges do not
/// describe the same iteration space.
fn enumerate_candidates(ir: &IrFunction) -> Vec<FusionCandidate> {
    let mut candidates = Vec::new();
    for consumer in ir.iter_nodes() {
        if consumer.kind.is_fusion_barrier() {
            continue;
        }
        for &producer_id in &consumer.producers {
            let Some(producer) = ir.node(producer_id) else { continue };
            if producer.kind.is_fusion_barrier() {
                continue;
            }
            let Some(tag) = rule_for(producer, consumer) else { continue };
            let ranges_match = match (&producer.range, &consumer.range) {
                (Some(a), Some(b)) => a.same_space_as(b),
                _ => false,
            };
            if !ranges_match {
                continue;
            }
            candidates.push(FusionCandidate {
                producer: producer_id,
                consumer: consumer.id,
                tag,
                benefit: tag.benefit(),
            });
        }
    }
    candidates.sort_by_key(|c| (c.producer.0, c.consumer.0));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use kforge_ir::{IrNode, LoopRange};

    fn range() -> LoopRange {
        LoopRange::vectorized("i", "0", "size", "lanes", 4)
    }

    #[test]
    fn elem_elem_chain_resolves_edges_and_candidate() {
        let mut f = IrFunction::new("BaseChain", "float32");
        let add = f.push_top_level(
            IrNode::new(NodeId(0), OpKind::Elementwise, "Add")
                .with_input_name("a")
                .with_input_name("b")
                .with_output("t")
                .with_range(range()),
        );
        let mul = f.push_top_level(
            IrNode::new(NodeId(0), OpKind::Elementwise, "Mul")
                .with_input_name("t")
                .with_input_name("c")
                .with_output("u")
                .with_range(range()),
        );

        let candidates = analyze(&mut f);

        assert!(f.node(mul).unwrap().producers.contains(&add));
        assert!(f.node(add).unwrap().consumers.contains(&mul));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].tag, FusionTag::ElemElem);
        assert_eq!(candidates[0].benefit, 10);
    }

    #[test]
    fn mismatched_ranges_produce_no_candidate() {
        let mut f = IrFunction::new("BaseChain", "float32");
        let add = f.push_top_level(
            IrNode::new(NodeId(0), OpKind::Elementwise, "Add")
                .with_output("t")
                .with_range(LoopRange::vectorized("i", "0", "size", "lanes", 4)),
        );
        f.push_top_level(
            IrNode::new(NodeId(0), OpKind::Elementwise, "Mul")
                .with_input_name("t")
                .with_output("u")
                .with_range(LoopRange::scalar("i", "0", "size", "1")),
        );

        let candidates = analyze(&mut f);
        assert!(candidates.is_empty());
        // edges still resolve even when fusion is rejected.
        assert!(f.node(add).unwrap().consumers.len() == 1);
    }

    #[test]
    fn control_node_blocks_candidate_even_with_matching_range() {
        let mut f = IrFunction::new("BaseGuard", "float32");
        let add = f.push_top_level(
            IrNode::new(NodeId(0), OpKind::Control, "If")
                .with_output("t")
                .with_range(range()),
        );
        f.push_top_level(
            IrNode::new(NodeId(0), OpKind::Elementwise, "Mul")
                .with_input_name("t")
                .with_output("u")
                .with_range(range()),
        );
        let candidates = analyze(&mut f);
        assert!(candidates.is_empty());
        let _ = add;
    }

    #[test]
    fn load_elem_requires_single_consumer_load() {
        let mut f = IrFunction::new("BaseFanout", "float32");
        let load = f.push_top_level(
            IrNode::new(NodeId(0), OpKind::Load, "Load").with_output("x").with_range(range()),
        );
        f.push_top_level(
            IrNode::new(NodeId(0), OpKind::Elementwise, "Add")
                .with_input_name("x")
                .with_output("y")
                .with_range(range()),
        );
        f.push_top_level(
            IrNode::new(NodeId(0), OpKind::Elementwise, "Sub")
                .with_input_name("x")
                .with_output("z")
                .with_range(range()),
        );

        let candidates = analyze(&mut f);
        assert!(candidates.iter().all(|c| c.tag != FusionTag::LoadElem));
        assert_eq!(f.node(load).unwrap().consumers.len(), 2);
    }

    #[test]
    fn range_propagates_into_loop_children_missing_one() {
        let mut f = IrFunction::new("BaseLoop", "float32");
        let add = f.insert_node(IrNode::new(NodeId(0), OpKind::Elementwise, "Add").with_output("t"));
        f.push_top_level(
            IrNode::new(NodeId(0), OpKind::Loop, "Loop")
                .with_range(range())
                .with_children(vec![add]),
        );
        analyze(&mut f);
        assert_eq!(f.node(add).unwrap().range, Some(range()));
    }

    #[test]
    fn running_analyzer_twice_is_idempotent() {
        let mut f = IrFunction::new("BaseChain", "float32");
        f.push_top_level(
            IrNode::new(NodeId(0), OpKind::Elementwise, "Add")
                .with_output("t")
                .with_range(range()),
        );
        f.push_top_level(
            IrNode::new(NodeId(0), OpKind::Elementwise, "Mul")
                .with_input_name("t")
                .with_output("u")
                .with_range(range()),
        );
        let first = analyze(&mut f);
        let second = analyze(&mut f);
        assert_eq!(first, second);
    }
}
