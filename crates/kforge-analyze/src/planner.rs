//! The fusion planner: turns the analyzer's fusion candidates into concrete
//! [`FusionGroup`]s, stamping nodes in place.
//!
//! Two independent mechanisms feed the final group list:
//!
//! - pairwise fusion, which unions directly-adjacent candidates
//!   (`Elem+Reduce`, `Elem+Elem`, `Load+Elem`, `Elem+Store`) via a
//!   mutual-best-match rule, then connected-component grouping;
//! - cross-loop allocation elimination, which traces an `Alloc` written by
//!   one top-level loop and read by another with the same `LoopRange`, and
//!   is planned first since it is the highest-benefit pattern and claims its
//!   nodes before pairwise fusion can touch them.
//!
//! Like the analyzer, the planner never fails: an unfusable candidate is
//! left alone, not rejected with an error.

use std::collections::{HashMap, HashSet};

use kforge_ir::{FusionGroup, FusionTag, GroupId, IrFunction, LoopRange, NodeId, OpKind};

use crate::analyzer::FusionCandidate;

/// Runs the Planner over `ir`, stamping newly-formed groups onto their
/// member nodes and appending them to `ir.groups`. Returns just the groups
/// added by this call.
///
/// Idempotent: nodes already carrying a `group` are left alone, so a second
/// call with the same (or a re-derived) candidate list adds nothing new.
pub fn plan(ir: &mut IrFunction, candidates: &[FusionCandidate]) -> Vec<FusionGroup> {
    let mut next_group = ir.groups.iter().map(|g| g.id.0).max().map(|m| m + 1).unwrap_or(0);
    let mut added = Vec::new();

    for chain in find_cross_loop_eliminations(ir) {
        let id = GroupId(next_group);
        next_group += 1;
        let dead = chain.dead.clone();
        let group = chain.into_group(id);
        stamp_group(ir, &group);
        for node_id in dead {
            if let Some(node) = ir.node_mut(node_id) {
                node.is_fusion_eliminated = true;
            }
        }
        added.push(group);
    }

    let pairwise = plan_pairwise(ir, candidates, &mut next_group);
    added.extend(pairwise);

    ir.groups.extend(added.clone());
    for group in &added {
        tracing::trace!(
            group = group.id.0,
            root = group.root.0,
            tag = ?group.tag,
            members = group.members.len(),
            "fusion group planned"
        );
    }
    tracing::debug!(function = %ir.name, groups = added.len(), "planning complete");
    added
}

fn stamp_group(ir: &mut IrFunction, group: &FusionGroup) {
    for &member in &group.members {
        if let Some(node) = ir.node_mut(member) {
            node.group = Some(group.id);
            node.is_fusion_root = member == group.root;
        }
    }
    for &alloc in &group.eliminated_allocs {
        if let Some(node) = ir.node_mut(alloc) {
            node.is_fusion_eliminated = true;
        }
    }
}

// --- Cross-loop allocation elimination -------------------------------------

struct EliminationChain {
    loops: Vec<NodeId>,
    dead: Vec<NodeId>,
    eliminated_allocs: Vec<NodeId>,
    range: LoopRange,
}

impl EliminationChain {
    fn into_group(self, id: GroupId) -> FusionGroup {
        let mut members: Vec<NodeId> = self.loops.clone();
        members.extend(self.dead.iter().copied());
        members.extend(self.eliminated_allocs.iter().copied());
        members.sort_by_key(|n| n.0);
        let root = *self.loops.iter().max_by_key(|n| n.0).expect("at least one loop in a chain");
        FusionGroup {
            id,
            root,
            members,
            tag: FusionTag::AllocElim,
            range: self.range,
            eliminated_allocs: self.eliminated_allocs,
        }
    }
}

/// Finds `Alloc -> Store (loop A) ... Load -> ... (loop B)` chains across
/// distinct top-level loops with matching ranges, and follows the chain one
/// hop further when the read loop itself writes another eliminable
/// temporary.
///
/// Already-grouped nodes are skipped so re-running planning is a no-op.
fn find_cross_loop_eliminations(ir: &IrFunction) -> Vec<EliminationChain> {
    let mut chains = Vec::new();
    let mut claimed: HashSet<NodeId> = HashSet::new();

    let alloc_ids: Vec<NodeId> = ir
        .iter_nodes()
        .filter(|n| n.kind == OpKind::Alloc && n.group.is_none())
        .map(|n| n.id)
        .collect();

    for alloc_id in alloc_ids {
        if claimed.contains(&alloc_id) {
            continue;
        }
        let Some(first_hop) = find_write_read_pair(ir, alloc_id, &claimed) else { continue };

        let mut loops = vec![first_hop.write_loop, first_hop.read_loop];
        let mut dead = vec![first_hop.store, first_hop.load];
        let mut allocs = vec![alloc_id];
        let range = first_hop.range.clone();

        let mut frontier = first_hop.read_loop;
        loop {
            let Some(next_alloc) = find_alloc_written_by(ir, frontier, &claimed, &allocs) else { break };
            let Some(hop) = find_write_read_pair(ir, next_alloc, &claimed) else { break };
            if hop.write_loop != frontier || !hop.range.same_space_as(&range) {
                break;
            }
            loops.push(hop.read_loop);
            dead.push(hop.store);
            dead.push(hop.load);
            allocs.push(next_alloc);
            frontier = hop.read_loop;
        }

        for id in loops.iter().chain(dead.iter()).chain(allocs.iter()) {
            claimed.insert(*id);
        }
        chains.push(EliminationChain {
            loops,
            dead,
            eliminated_allocs: allocs,
            range,
        });
    }

    chains
}

struct WriteReadPair {
    write_loop: NodeId,
    read_loop: NodeId,
    store: NodeId,
    load: NodeId,
    range: LoopRange,
}

/// Finds the top-level loop writing `alloc_id` (via a `Store` child whose
/// producers include it) and the distinct top-level loop reading it (via a
/// `Load` child), provided both loops share the same iteration space and
/// neither participant is already claimed.
fn find_write_read_pair(ir: &IrFunction, alloc_id: NodeId, claimed: &HashSet<NodeId>) -> Option<WriteReadPair> {
    let mut write: Option<(NodeId, NodeId)> = None;
    let mut read: Option<(NodeId, NodeId)> = None;

    for &top_id in &ir.top_level {
        let Some(top) = ir.node(top_id) else { continue };
        if top.kind != OpKind::Loop || claimed.contains(&top_id) {
            continue;
        }
        for &child_id in &top.children {
            let Some(child) = ir.node(child_id) else { continue };
            if claimed.contains(&child_id) {
                continue;
            }
            if child.kind == OpKind::Store && child.producers.contains(&alloc_id) && write.is_none() {
                write = Some((top_id, child_id));
            }
            if child.kind == OpKind::Load && child.producers.contains(&alloc_id) && read.is_none() {
                read = Some((top_id, child_id));
            }
        }
    }

    let (write_loop, store) = write?;
    let (read_loop, load) = read?;
    if write_loop == read_loop {
        return None;
    }
    let write_range = ir.node(write_loop)?.range.clone()?;
    let read_range = ir.node(read_loop)?.range.clone()?;
    if !write_range.same_space_as(&read_range) {
        return None;
    }
    Some(WriteReadPair {
        write_loop,
        read_loop,
        store,
        load,
        range: write_range,
    })
}

/// Finds an `Alloc` node (not already part of `known_allocs`) written by a
/// `Store` child of `loop_id`, extending an elimination chain one hop.
fn find_alloc_written_by(ir: &IrFunction, loop_id: NodeId, claimed: &HashSet<NodeId>, known_allocs: &[NodeId]) -> Option<NodeId> {
    let top = ir.node(loop_id)?;
    for &child_id in &top.children {
        let child = ir.node(child_id)?;
        if child.kind != OpKind::Store || claimed.contains(&child_id) {
            continue;
        }
        for &producer in &child.producers {
            let producer_node = ir.node(producer)?;
            if producer_node.kind == OpKind::Alloc && producer_node.group.is_none() && !known_allocs.contains(&producer) {
                return Some(producer);
            }
        }
    }
    None
}

// --- Pairwise (local) fusion ------------------------------------------------

fn plan_pairwise(ir: &mut IrFunction, candidates: &[FusionCandidate], next_group: &mut u32) -> Vec<FusionGroup> {
    let eligible: Vec<FusionCandidate> = candidates
        .iter()
        .copied()
        .filter(|c| c.tag != FusionTag::AllocElim)
        .filter(|c| {
            ir.node(c.producer).map(|n| n.group.is_none()).unwrap_or(false)
                && ir.node(c.consumer).map(|n| n.group.is_none()).unwrap_or(false)
        })
        .collect();

    let selected = resolve_conflicts(&eligible);

    let mut uf = UnionFind::new();
    let mut best_tag: HashMap<NodeId, FusionTag> = HashMap::new();
    for c in &selected {
        uf.union(c.producer, c.consumer);
        let root = uf.find(c.producer);
        let current = best_tag.get(&root).copied();
        if current.map(|t| c.benefit > t.benefit()).unwrap_or(true) {
            best_tag.insert(root, c.tag);
        }
    }

    let mut components: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for c in &selected {
        for &node in &[c.producer, c.consumer] {
            let root = uf.find(node);
            components.entry(root).or_default().push(node);
        }
    }

    let mut groups = Vec::new();
    for (root, mut members) in components {
        members.sort_by_key(|n| n.0);
        members.dedup();
        if members.len() < 2 {
            continue;
        }
        let tag = *best_tag.get(&root).unwrap_or(&FusionTag::ElemElem);
        let Some(range) = members.iter().find_map(|m| ir.node(*m).and_then(|n| n.range.clone())) else {
            continue;
        };
        let root_member = pick_root(ir, &members);
        let topo = topo_sort_subset(ir, &members);
        let id = GroupId(*next_group);
        *next_group += 1;
        let group = FusionGroup {
            id,
            root: root_member,
            members: topo,
            tag,
            range,
            eliminated_allocs: Vec::new(),
        };
        stamp_group(ir, &group);
        groups.push(group);
    }
    groups.sort_by_key(|g| g.id.0);
    groups
}

/// Keeps only edges that are the best choice for both their producer's
/// outgoing slot and their consumer's incoming slot (mutual best match),
/// breaking ties by benefit descending then producer id ascending: the
/// higher-benefit tag wins, ties broken in source order of the producer.
fn resolve_conflicts(candidates: &[FusionCandidate]) -> Vec<FusionCandidate> {
    let mut best_outgoing: HashMap<NodeId, FusionCandidate> = HashMap::new();
    let mut best_incoming: HashMap<NodeId, FusionCandidate> = HashMap::new();

    for c in candidates {
        update_best(&mut best_outgoing, c.producer, *c);
        update_best(&mut best_incoming, c.consumer, *c);
    }

    candidates
        .iter()
        .copied()
        .filter(|c| {
            best_outgoing.get(&c.producer).map(|b| *b == *c).unwrap_or(false)
                && best_incoming.get(&c.consumer).map(|b| *b == *c).unwrap_or(false)
        })
        .collect()
}

fn update_best(map: &mut HashMap<NodeId, FusionCandidate>, key: NodeId, candidate: FusionCandidate) {
    let replace = match map.get(&key) {
        None => true,
        Some(existing) => {
            (candidate.benefit, std::cmp::Reverse(candidate.producer.0)) > (existing.benefit, std::cmp::Reverse(existing.producer.0))
        }
    };
    if replace {
        map.insert(key, candidate);
    }
}

/// Chooses the group's emission root: a `Loop`, `Reduction`, or `Store`
/// member last in source order, falling back to the last member overall.
/// This is typically the member consumed by the function's observable
/// outputs.
fn pick_root(ir: &IrFunction, members: &[NodeId]) -> NodeId {
    members
        .iter()
        .filter(|m| {
            ir.node(**m)
                .map(|n| matches!(n.kind, OpKind::Loop | OpKind::Reduction | OpKind::Store))
                .unwrap_or(false)
        })
        .max_by_key(|m| m.0)
        .copied()
        .unwrap_or_else(|| *members.iter().max_by_key(|m| m.0).expect("non-empty members"))
}

/// Orders `subset` so every member appears after its producers that are
/// also in `subset` (Kahn's algorithm over the Analyzer's producer/consumer
/// edges, restricted to this group).
fn topo_sort_subset(ir: &IrFunction, subset: &[NodeId]) -> Vec<NodeId> {
    let set: HashSet<NodeId> = subset.iter().copied().collect();
    let mut in_degree: HashMap<NodeId, usize> = subset.iter().map(|&n| (n, 0)).collect();
    for &n in subset {
        if let Some(node) = ir.node(n) {
            let count = node.producers.iter().filter(|p| set.contains(p)).count();
            in_degree.insert(n, count);
        }
    }

    let mut ready: Vec<NodeId> = in_degree.iter().filter(|(_, &d)| d == 0).map(|(&n, _)| n).collect();
    ready.sort_by_key(|n| n.0);
    let mut order = Vec::with_capacity(subset.len());
    let mut remaining = in_degree;

    while let Some(n) = ready.pop() {
        order.push(n);
        if let Some(node) = ir.node(n) {
            let mut unlocked = Vec::new();
            for &consumer in &node.consumers {
                if set.contains(&consumer) {
                    if let Some(d) = remaining.get_mut(&consumer) {
                        *d -= 1;
                        if *d == 0 {
                            unlocked.push(consumer);
                        }
                    }
                }
            }
            unlocked.sort_by_key(|n| n.0);
            ready.extend(unlocked);
            ready.sort_by_key(|n| n.0);
        }
    }

    if order.len() != subset.len() {
        // A cycle can't happen from acyclic dataflow edges, but fall back to
        // id order rather than drop members if it somehow does.
        let mut fallback: Vec<NodeId> = subset.to_vec();
        fallback.sort_by_key(|n| n.0);
        return fallback;
    }
    order
}

struct UnionFind {
    parent: HashMap<NodeId, NodeId>,
}

impl UnionFind {
    fn new() -> Self {
        UnionFind { parent: HashMap::new() }
    }

    fn find(&mut self, n: NodeId) -> NodeId {
        let p = *self.parent.entry(n).or_insert(n);
        if p == n {
            n
        } else {
            let root = self.find(p);
            self.parent.insert(n, root);
            root
        }
    }

    fn union(&mut self, a: NodeId, b: NodeId) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            // Smaller id becomes the representative, keeping `find` stable
            // across repeated calls within one `plan` invocation.
            if ra.0 < rb.0 {
                self.parent.insert(rb, ra);
            } else {
                self.parent.insert(ra, rb);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze;
    use kforge_ir::{AllocInfo, IrNode};

    fn range() -> LoopRange {
        LoopRange::vectorized("i", "0", "size", "lanes", 4)
    }

    #[test]
    fn straight_line_chain_fuses_into_one_group() {
        let mut f = IrFunction::new("BaseChain", "float32");
        f.push_top_level(
            IrNode::new(NodeId(0), OpKind::Load, "Load").with_output("x").with_range(range()),
        );
        f.push_top_level(
            IrNode::new(NodeId(0), OpKind::Elementwise, "Add")
                .with_input_name("x")
                .with_output("y")
                .with_range(range()),
        );
        f.push_top_level(
            IrNode::new(NodeId(0), OpKind::Elementwise, "Mul")
                .with_input_name("y")
                .with_output("z")
                .with_range(range()),
        );
        f.push_top_level(
            IrNode::new(NodeId(0), OpKind::Store, "Store")
                .with_input_name("z")
                .with_range(range()),
        );

        let candidates = analyze(&mut f);
        let groups = plan(&mut f, &candidates);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members.len(), 4);
        // Store is last in source order among {Load,Reduction,Store} roots.
        assert_eq!(f.node(groups[0].root).unwrap().kind, OpKind::Store);
        for id in &groups[0].members {
            assert!(f.node(*id).unwrap().is_fused());
        }
    }

    #[test]
    fn cross_loop_allocation_elimination_reduces_pass_count() {
        let mut f = IrFunction::new("BaseSoftmax", "float32");

        let alloc = f.insert_node(
            IrNode::new(NodeId(0), OpKind::Alloc, "AllocFloat32")
                .with_output("shifted")
                .with_alloc(AllocInfo {
                    size_expr: "size".into(),
                    element_type: "float32".into(),
                }),
        );
        let store = f.insert_node(
            IrNode::new(NodeId(0), OpKind::Store, "Store")
                .with_input(alloc)
                .with_input_name("shifted")
                .with_range(range()),
        );
        let write_loop = f.push_top_level(
            IrNode::new(NodeId(0), OpKind::Loop, "Loop")
                .with_range(range())
                .with_children(vec![store]),
        );

        let load = f.insert_node(
            IrNode::new(NodeId(0), OpKind::Load, "Load")
                .with_input(alloc)
                .with_input_name("shifted")
                .with_output("v")
                .with_range(range()),
        );
        let read_loop = f.push_top_level(
            IrNode::new(NodeId(0), OpKind::Loop, "Loop")
                .with_range(range())
                .with_children(vec![load]),
        );

        let candidates = analyze(&mut f);
        let before = f.original_pass_count();
        let groups = plan(&mut f, &candidates);

        let elim: Vec<_> = groups.iter().filter(|g| g.tag == FusionTag::AllocElim).collect();
        assert_eq!(elim.len(), 1);
        assert!(!elim[0].eliminated_allocs.is_empty());
        assert!(f.node(alloc).unwrap().is_fusion_eliminated);
        assert!(f.fused_pass_count() < before);
        let _ = (write_loop, read_loop);
    }

    #[test]
    fn running_planner_twice_does_not_duplicate_groups() {
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
        let candidates = analyze(&mut f);
        let first = plan(&mut f, &candidates);
        assert_eq!(first.len(), 1);
        let second_candidates = analyze(&mut f);
        let second = plan(&mut f, &second_candidates);
        assert!(second.is_empty());
        assert_eq!(f.groups.len(), 1);
    }

    #[test]
    fn unrelated_pair_with_no_rule_match_does_not_fuse() {
        let mut f = IrFunction::new("BaseNoop", "float32");
        f.push_top_level(IrNode::new(NodeId(0), OpKind::Scalar, "Len").with_output("n").with_range(range()));
        f.push_top_level(
            IrNode::new(NodeId(0), OpKind::Elementwise, "Add")
                .with_input_name("n")
                .with_output("y")
                .with_range(range()),
        );
        let candidates = analyze(&mut f);
        let groups = plan(&mut f, &candidates);
        assert!(groups.is_empty());
    }
}
