//! The emitter: turns an analyzed, fused [`IrFunction`] into a single C
//! translation unit.
//!
//! Emission is the one stage downstream of building that can fail (see
//! [`EmitError`](crate::error::EmitError)) -- everything upstream degrades to
//! a missed optimization instead.

use std::collections::HashSet;

use kforge_ir::{FusionGroup, FusionTag, GroupId, IrFunction, IrNode, NodeId, OpKind, ParamKind};

use crate::error::EmitError;
use crate::profile::{FmaArgOrder, IntrinsicProfile};

/// A line-buffered, tab-indented output accumulator.
///
/// Indentation is a counter incremented on loop entry and decremented on
/// exit, with tab characters written at the start of each emitted line.
struct Writer {
    lines: Vec<String>,
    indent: usize,
}

impl Writer {
    fn new() -> Self {
        Writer { lines: Vec::new(), indent: 0 }
    }

    fn line(&mut self, text: &str) {
        let pad = "\t".repeat(self.indent);
        self.lines.push(format!("{pad}{text}"));
    }

    fn raw(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }

    fn indent(&mut self) {
        self.indent += 1;
    }

    fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    fn finish(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

/// Emits `func` as a single C translation unit targeting `profile`.
///
/// Pure and deterministic: no clock, RNG, or filesystem access happens here.
/// Diagnostic context belongs to the ambient logging layer, not this return
/// value.
pub fn emit(func: &IrFunction, profile: &dyn IntrinsicProfile) -> Result<String, EmitError> {
    tracing::debug!(
        function = %func.name,
        tier = profile.tier(),
        nodes = func.node_count(),
        groups = func.groups.len(),
        "emitting C kernel"
    );
    let mut w = Writer::new();
    if !profile.inline_helpers().is_empty() {
        w.raw(profile.inline_helpers());
    }
    w.line(&function_signature(func, profile));
    w.line("{");
    w.indent();
    emit_param_derefs(func, profile, &mut w);
    let mut emitted = HashSet::new();
    emit_sequence(func, &func.top_level, profile, &mut w, &mut emitted)?;
    emit_return_writebacks(func, &mut w);
    w.dedent();
    w.line("}");
    Ok(w.finish())
}

// --- Signature ---------------------------------------------------------

fn function_signature(func: &IrFunction, profile: &dyn IntrinsicProfile) -> String {
    let name = emitted_function_name(&func.name, &func.element_type, profile.tier());
    let params: Vec<String> = func
        .params
        .iter()
        .chain(func.returns.iter())
        .map(|p| param_c_decl(p, profile))
        .collect();
    format!("void {name}({})", params.join(", "))
}

fn param_c_decl(p: &kforge_ir::ParamDescriptor, profile: &dyn IntrinsicProfile) -> String {
    match &p.kind {
        ParamKind::Slice { element_type } => format!("{}* {}", c_type_for(element_type), p.name),
        ParamKind::IntScalar => format!("long* p_{}", p.name),
        ParamKind::FloatScalar => format!("{}* p_{}", profile.scalar_type(), p.name),
    }
}

fn emit_param_derefs(func: &IrFunction, profile: &dyn IntrinsicProfile, w: &mut Writer) {
    for p in func.params.iter().chain(func.returns.iter()) {
        match &p.kind {
            ParamKind::IntScalar => w.line(&format!("long {0} = *p_{0};", p.name)),
            ParamKind::FloatScalar => w.line(&format!("{} {} = *p_{};", profile.scalar_type(), p.name, p.name)),
            ParamKind::Slice { .. } => {}
        }
    }
}

fn emit_return_writebacks(func: &IrFunction, w: &mut Writer) {
    for r in &func.returns {
        match &r.kind {
            ParamKind::IntScalar | ParamKind::FloatScalar => w.line(&format!("*p_{0} = {0};", r.name)),
            ParamKind::Slice { .. } => {}
        }
    }
}

/// Stable naming of the emitted function: strip the leading "Base" prefix,
/// lower-case its first character, append `_c_<elem>_<tier>`. Part of the
/// external contract; downstream dispatch tables bind to this exact symbol.
pub fn emitted_function_name(name: &str, element_type: &str, tier: &str) -> String {
    let stripped = name.strip_prefix("Base").unwrap_or(name);
    let mut chars = stripped.chars();
    let lowered = match chars.next() {
        Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    format!("{lowered}_c_{element_type}_{tier}")
}

// --- Sequencing and fusion-group dispatch -------------------------------

fn emit_sequence(
    func: &IrFunction,
    ids: &[NodeId],
    profile: &dyn IntrinsicProfile,
    w: &mut Writer,
    emitted: &mut HashSet<NodeId>,
) -> Result<(), EmitError> {
    for &id in ids {
        if emitted.contains(&id) {
            continue;
        }
        let node = match func.node(id) {
            Some(n) => n,
            None => continue,
        };
        if node.is_fusion_eliminated {
            emitted.insert(id);
            continue;
        }
        if let Some(gid) = node.group {
            if node.is_fusion_root {
                emit_group(func, gid, profile, w, emitted)?;
            } else {
                emitted.insert(id);
            }
            continue;
        }
        if node.kind == OpKind::Loop {
            emit_loop(func, node, profile, w, emitted)?;
        } else {
            emit_statement(node, func, profile, w)?;
        }
        emitted.insert(id);
    }
    Ok(())
}

fn emit_loop(
    func: &IrFunction,
    node: &IrNode,
    profile: &dyn IntrinsicProfile,
    w: &mut Writer,
    emitted: &mut HashSet<NodeId>,
) -> Result<(), EmitError> {
    let range = node.range.clone().ok_or(EmitError::MissingLoopRange(node.id))?;
    w.line(&loop_header(&range));
    w.line("{");
    w.indent();
    emit_sequence(func, &node.children, profile, w, emitted)?;
    w.dedent();
    w.line("}");
    Ok(())
}

fn loop_header(range: &kforge_ir::LoopRange) -> String {
    if range.is_vectorized {
        format!(
            "for (long {v} = {s}; {v} + {lanes} <= {e}; {v} += {lanes})",
            v = range.induction_var,
            s = range.start,
            e = range.end,
            lanes = range.lanes
        )
    } else {
        format!(
            "for (long {v} = {s}; {v} < {e}; {v} += {step})",
            v = range.induction_var,
            s = range.start,
            e = range.end,
            step = range.step
        )
    }
}

fn emit_group(
    func: &IrFunction,
    gid: GroupId,
    profile: &dyn IntrinsicProfile,
    w: &mut Writer,
    emitted: &mut HashSet<NodeId>,
) -> Result<(), EmitError> {
    let group = func.groups.iter().find(|g| g.id == gid).ok_or(EmitError::GroupNotFound(gid))?;
    tracing::trace!(
        group = gid.0,
        tag = ?group.tag,
        members = group.members.len(),
        "emitting fused group"
    );
    for &id in &group.members {
        emitted.insert(id);
    }
    match group.tag {
        FusionTag::AllocElim => emit_alloc_elim_group(func, group, profile, w),
        FusionTag::ElemReduce => emit_elem_reduce_group(func, group, profile, w),
        FusionTag::ElemElem | FusionTag::LoadElem | FusionTag::ElemStore => emit_flat_fused_group(func, group, profile, w),
    }
}

/// AllocElim: the merged members span real `Loop` nodes sharing one
/// iteration space. Emit one combined loop from the group's range, splicing
/// in each source loop's surviving (non-eliminated) children in order.
///
/// A dead `Store`/`Load` pair shared the same buffer purely to move a value
/// across the loop boundary; now that both loops share one body, that value
/// is already live in scope under the `Store`'s own producer. Each dead
/// `Load` is rebound directly to that forwarded value (instead of emitting
/// a buffer access) so its consumers still resolve -- this is the concrete
/// mechanism behind "skipping" the pair, not a literal no-op.
fn emit_alloc_elim_group(func: &IrFunction, group: &FusionGroup, profile: &dyn IntrinsicProfile, w: &mut Writer) -> Result<(), EmitError> {
    let mut loop_ids: Vec<NodeId> = group
        .members
        .iter()
        .copied()
        .filter(|id| func.node(*id).map(|n| n.kind == OpKind::Loop).unwrap_or(false))
        .collect();
    loop_ids.sort_by_key(|n| n.0);

    let mut forwarded: std::collections::HashMap<String, String> = std::collections::HashMap::new();
    for &loop_id in &loop_ids {
        let Some(loop_node) = func.node(loop_id) else { continue };
        for &child_id in &loop_node.children {
            let Some(child) = func.node(child_id) else { continue };
            if child.kind == OpKind::Store && child.is_fusion_eliminated {
                forwarded.insert(buffer_name(child, func), store_value(child, func));
            }
        }
    }

    w.line(&loop_header(&group.range));
    w.line("{");
    w.indent();
    for loop_id in loop_ids {
        let Some(loop_node) = func.node(loop_id) else { continue };
        for &child_id in &loop_node.children {
            let Some(child) = func.node(child_id) else { continue };
            if child.is_fusion_eliminated {
                if child.kind == OpKind::Load {
                    if let Some(value) = forwarded.get(&buffer_name(child, func)) {
                        w.line(&format!("{} {} = {};", profile.vector_type(), var_name(child), value));
                    }
                }
                continue;
            }
            emit_statement(child, func, profile, w)?;
        }
    }
    w.dedent();
    w.line("}");
    Ok(())
}

/// Elem+Reduce (MapReduce): a vector accumulator seeded with the profile's
/// zero init, updated after each elementwise member inside the fused loop,
/// then a horizontal reduction to a scalar once the loop closes.
fn emit_elem_reduce_group(func: &IrFunction, group: &FusionGroup, profile: &dyn IntrinsicProfile, w: &mut Writer) -> Result<(), EmitError> {
    let acc = format!("_acc{}", group.root.0);
    w.line(&format!("{} {} = {};", profile.vector_type(), acc, profile.zero_init()));
    w.line(&loop_header(&group.range));
    w.line("{");
    w.indent();

    let mut reduction_id = None;
    for &id in &group.members {
        let node = func.try_node_for_group(id, group.id)?;
        if node.is_fusion_eliminated {
            continue;
        }
        match node.kind {
            OpKind::Reduction => reduction_id = Some(id),
            OpKind::Elementwise => {
                emit_statement(node, func, profile, w)?;
                let output = var_name(node);
                let add_intrinsic = profile.intrinsic("Add");
                if !add_intrinsic.is_empty() {
                    w.line(&format!("{acc} = {add_intrinsic}({acc}, {output});"));
                } else {
                    w.line(&format!("{acc} = {acc} + {output};"));
                }
            }
            _ => emit_statement(node, func, profile, w)?,
        }
    }
    w.dedent();
    w.line("}");

    if let Some(rid) = reduction_id {
        let rnode = func.try_node_for_group(rid, group.id)?;
        let output = var_name(rnode);
        let reduce_fn = profile.intrinsic(&rnode.mnemonic);
        let expr = if reduce_fn.is_empty() { acc } else { format!("{reduce_fn}({acc})") };
        w.line(&format!("{} {} = {};", profile.scalar_type(), output, expr));
    }
    Ok(())
}

/// Elem+Elem, Load+Elem, Elem+Store: one loop header from the group's
/// range, members emitted in topological order.
fn emit_flat_fused_group(func: &IrFunction, group: &FusionGroup, profile: &dyn IntrinsicProfile, w: &mut Writer) -> Result<(), EmitError> {
    w.line(&loop_header(&group.range));
    w.line("{");
    w.indent();
    for &id in &group.members {
        let node = func.try_node_for_group(id, group.id)?;
        if node.is_fusion_eliminated {
            continue;
        }
        emit_statement(node, func, profile, w)?;
    }
    w.dedent();
    w.line("}");
    Ok(())
}

// --- Per-kind statement emission ----------------------------------------

fn emit_statement(node: &IrNode, func: &IrFunction, profile: &dyn IntrinsicProfile, w: &mut Writer) -> Result<(), EmitError> {
    match node.kind {
        OpKind::Loop => unreachable!("loops are dispatched by emit_sequence/emit_group"),
        OpKind::Noop => Ok(()),
        OpKind::Elementwise => emit_elementwise(node, func, profile, w),
        OpKind::Reduction => emit_reduction(node, func, profile, w),
        OpKind::Load => emit_load(node, func, profile, w),
        OpKind::Store => emit_store(node, func, profile, w),
        OpKind::Alloc => emit_alloc(node, w),
        OpKind::Broadcast => emit_broadcast(node, func, profile, w),
        OpKind::Call => emit_call(node, w),
        OpKind::Scalar => emit_scalar(node, func, w),
        OpKind::Control => emit_control(node, w),
    }
}

fn emit_elementwise(node: &IrNode, func: &IrFunction, profile: &dyn IntrinsicProfile, w: &mut Writer) -> Result<(), EmitError> {
    if is_base_vec_transcendental(&node.mnemonic) {
        return emit_scalarized_transcendental(node, func, profile, w);
    }

    let output = var_name(node);
    let operands = operand_values(node, func);
    let mnemonic = node.mnemonic.as_str();
    let intrinsic = profile.intrinsic(mnemonic);

    let expr = if !intrinsic.is_empty() {
        let args = reorder_fma_args(mnemonic, operands, profile.fma_arg_order());
        format!("{}({})", intrinsic, args.join(", "))
    } else if let Some(op) = operator_for_mnemonic(mnemonic) {
        binary_or_passthrough(&operands, op)
    } else if mnemonic == "Min" || mnemonic == "Max" {
        libm_minmax_call(mnemonic, &func.element_type, &operands)
    } else if mnemonic == "MulAdd" && operands.len() == 3 {
        format!("({} * {}) + {}", operands[0], operands[1], operands[2])
    } else {
        operands.into_iter().next().unwrap_or_default()
    };

    w.line(&format!("{} {} = {};", profile.vector_type(), output, expr));
    Ok(())
}

fn reorder_fma_args(mnemonic: &str, operands: Vec<String>, order: FmaArgOrder) -> Vec<String> {
    if mnemonic == "MulAdd" && operands.len() == 3 && order == FmaArgOrder::AccFirst {
        vec![operands[2].clone(), operands[0].clone(), operands[1].clone()]
    } else {
        operands
    }
}

fn binary_or_passthrough(operands: &[String], op: &str) -> String {
    if operands.len() >= 2 {
        format!("({} {} {})", operands[0], op, operands[1])
    } else {
        operands.first().cloned().unwrap_or_default()
    }
}

fn libm_minmax_call(mnemonic: &str, element_type: &str, operands: &[String]) -> String {
    let base = if mnemonic == "Min" { "fmin" } else { "fmax" };
    let name = if element_type == "float32" { format!("{base}f") } else { base.to_string() };
    if operands.len() >= 2 {
        format!("{}({}, {})", name, operands[0], operands[1])
    } else {
        operands.first().cloned().unwrap_or_default()
    }
}

fn emit_reduction(node: &IrNode, func: &IrFunction, profile: &dyn IntrinsicProfile, w: &mut Writer) -> Result<(), EmitError> {
    let output = var_name(node);
    let operand = operand_values(node, func).into_iter().next().unwrap_or_default();
    let intrinsic = profile.intrinsic(&node.mnemonic);
    let expr = if intrinsic.is_empty() { operand } else { format!("{intrinsic}({operand})") };
    w.line(&format!("{} {} = {};", profile.scalar_type(), output, expr));
    Ok(())
}

fn emit_load(node: &IrNode, func: &IrFunction, profile: &dyn IntrinsicProfile, w: &mut Writer) -> Result<(), EmitError> {
    let output = var_name(node);
    let ptr = buffer_name(node, func);
    let idx = induction_var(node);
    let load_fn = profile.load_fn();
    let expr = if load_fn.is_empty() {
        format!("{ptr}[{idx}]")
    } else {
        let addr = format!("&{ptr}[{idx}]");
        let addr = if profile.requires_cast() { profile.cast_expr(&addr) } else { addr };
        format!("{load_fn}({addr})")
    };
    w.line(&format!("{} {} = {};", profile.vector_type(), output, expr));
    Ok(())
}

fn emit_store(node: &IrNode, func: &IrFunction, profile: &dyn IntrinsicProfile, w: &mut Writer) -> Result<(), EmitError> {
    let ptr = buffer_name(node, func);
    let idx = induction_var(node);
    let value = store_value(node, func);
    let store_fn = profile.store_fn();
    if store_fn.is_empty() {
        w.line(&format!("{ptr}[{idx}] = {value};"));
    } else {
        let addr = format!("&{ptr}[{idx}]");
        let addr = if profile.requires_cast() { profile.cast_expr(&addr) } else { addr };
        w.line(&format!("{store_fn}({addr}, {value});"));
    }
    Ok(())
}

/// The buffer a `Load`/`Store` reads or writes: when one of its linked
/// producers is itself an `Alloc` node (storing into a local temporary
/// bound by an earlier `tmp := Allocate(...)`), that producer's own output
/// name is the buffer; otherwise the buffer is an outer slice parameter,
/// carried as the node's first symbolic input name (a parameter is never
/// itself a dataflow producer, so it is never resolved through `inputs`).
fn buffer_name(node: &IrNode, func: &IrFunction) -> String {
    for &id in &node.inputs {
        if func.node(id).map(|n| n.kind == OpKind::Alloc).unwrap_or(false) {
            return func.node(id).map(var_name).unwrap_or_default();
        }
    }
    node.input_names.first().cloned().unwrap_or_else(|| "/* unknown ptr */".to_string())
}

/// The value a `Store` writes: the first linked producer that is not the
/// destination `Alloc` itself, falling back to a second recorded symbolic
/// name when the value was never a produced node.
fn store_value(node: &IrNode, func: &IrFunction) -> String {
    for &id in &node.inputs {
        if !func.node(id).map(|n| n.kind == OpKind::Alloc).unwrap_or(false) {
            return func.node(id).map(var_name).unwrap_or_default();
        }
    }
    node.input_names.get(1).or_else(|| node.input_names.first()).cloned().unwrap_or_default()
}

fn induction_var(node: &IrNode) -> String {
    node.range.as_ref().map(|r| r.induction_var.clone()).unwrap_or_else(|| "0".to_string())
}

fn emit_broadcast(node: &IrNode, func: &IrFunction, profile: &dyn IntrinsicProfile, w: &mut Writer) -> Result<(), EmitError> {
    let output = var_name(node);
    let operand = operand_values(node, func).into_iter().next().unwrap_or_default();
    let set_fn = profile.intrinsic("Set");
    let expr = if set_fn.is_empty() { operand } else { format!("{set_fn}({operand})") };
    w.line(&format!("{} {} = {};", profile.vector_type(), output, expr));
    Ok(())
}

fn emit_alloc(node: &IrNode, w: &mut Writer) -> Result<(), EmitError> {
    let info = node.alloc.as_ref().ok_or(EmitError::MissingAllocInfo(node.id))?;
    let output = var_name(node);
    let ctype = c_type_for(&info.element_type);
    w.line(&format!("{} {}[{}];", ctype, output, info.size_expr));
    Ok(())
}

fn emit_call(node: &IrNode, w: &mut Writer) -> Result<(), EmitError> {
    let callee = node.call.as_ref().map(|c| c.callee.clone()).unwrap_or_else(|| node.mnemonic.clone());
    w.line(&format!("// TODO: inline {callee}"));
    Ok(())
}

fn emit_scalar(node: &IrNode, func: &IrFunction, w: &mut Writer) -> Result<(), EmitError> {
    let output = var_name(node);
    let operands = operand_values(node, func);
    let mnemonic = node.mnemonic.as_str();
    let ctype = c_type_for(&func.element_type);

    match mnemonic {
        "Index" => {
            let expr = operands.into_iter().next().unwrap_or_default();
            w.line(&format!("long {output} = {expr};"));
        }
        "Inc" => w.line(&format!("long {} = {} + 1;", output, operands.into_iter().next().unwrap_or_default())),
        "Dec" => w.line(&format!("long {} = {} - 1;", output, operands.into_iter().next().unwrap_or_default())),
        _ => {
            let expr = if let Some(op) = operator_for_mnemonic(mnemonic) {
                binary_or_passthrough(&operands, op)
            } else if operands.len() >= 2 {
                format!("{}({}, {})", mnemonic, operands[0], operands[1])
            } else {
                operands.into_iter().next().unwrap_or_default()
            };
            w.line(&format!("{ctype} {output} = {expr};"));
        }
    }
    Ok(())
}

fn emit_control(node: &IrNode, w: &mut Writer) -> Result<(), EmitError> {
    if node.mnemonic == "Return" {
        w.line("return;");
    }
    // "If" already acted as a fusion barrier; silently dropped at emission.
    Ok(())
}

fn operator_for_mnemonic(mnemonic: &str) -> Option<&'static str> {
    match mnemonic {
        "Add" => Some("+"),
        "Sub" => Some("-"),
        "Mul" => Some("*"),
        "Div" => Some("/"),
        _ => None,
    }
}

// --- Libm scalarization of Base*Vec transcendentals ---------------------

fn is_base_vec_transcendental(mnemonic: &str) -> bool {
    mnemonic.starts_with("Base") && mnemonic.ends_with("Vec")
}

fn libm_name(mnemonic: &str, element_type: &str) -> String {
    let stripped = mnemonic.strip_suffix("Vec").unwrap_or(mnemonic);
    let stripped = stripped.strip_prefix("Base").unwrap_or(stripped);
    let lowered = stripped.to_lowercase();
    if element_type == "float32" {
        format!("{lowered}f")
    } else {
        lowered
    }
}

fn emit_scalarized_transcendental(node: &IrNode, func: &IrFunction, profile: &dyn IntrinsicProfile, w: &mut Writer) -> Result<(), EmitError> {
    let output = var_name(node);
    let operand = operand_values(node, func).into_iter().next().unwrap_or_default();
    let base_name = node.mnemonic.strip_suffix("Vec").unwrap_or(&node.mnemonic);
    let base_name = base_name.strip_prefix("Base").unwrap_or(base_name);
    let is_sigmoid = base_name.eq_ignore_ascii_case("sigmoid");
    let exp_fn = libm_name("BaseExpVec", &func.element_type);
    let call_name = libm_name(&node.mnemonic, &func.element_type);
    let one = if func.element_type == "float32" { "1.0f" } else { "1.0" };

    if profile.lanes() <= 1 {
        let expr = if is_sigmoid {
            format!("{one} / ({one} + {exp_fn}(-({operand})))")
        } else {
            format!("{call_name}({operand})")
        };
        w.line(&format!("{} {} = {};", profile.scalar_type(), output, expr));
        return Ok(());
    }

    let buf = format!("{output}_lanes");
    w.line(&format!("{} {}[{}];", profile.scalar_type(), buf, profile.lanes()));
    let store_fn = profile.store_fn();
    if store_fn.is_empty() {
        w.line(&format!("/* no vector store intrinsic registered for {} */", profile.tier()));
    } else {
        w.line(&format!("{store_fn}({buf}, {operand});"));
    }
    w.line(&format!("for (long _l = 0; _l < {}; _l++)", profile.lanes()));
    w.line("{");
    w.indent();
    let body_expr = if is_sigmoid {
        format!("{one} / ({one} + {exp_fn}(-({buf}[_l])))")
    } else {
        format!("{call_name}({buf}[_l])")
    };
    w.line(&format!("{buf}[_l] = {body_expr};"));
    w.dedent();
    w.line("}");
    let load_fn = profile.load_fn();
    let load_expr = if load_fn.is_empty() { buf.clone() } else { format!("{load_fn}({buf})") };
    w.line(&format!("{} {} = {};", profile.vector_type(), output, load_expr));
    Ok(())
}

// --- Shared helpers -------------------------------------------------------

fn var_name(node: &IrNode) -> String {
    node.primary_output().map(str::to_string).unwrap_or_else(|| format!("_t{}", node.id.0))
}

/// Resolves a node's operand values in source order: each linked producer's
/// primary output if `inputs` is non-empty, otherwise the symbolic
/// `input_names`.
fn operand_values(node: &IrNode, func: &IrFunction) -> Vec<String> {
    if !node.inputs.is_empty() {
        node.inputs
            .iter()
            .map(|id| func.node(*id).map(var_name).unwrap_or_else(|| format!("_t{}", id.0)))
            .collect()
    } else {
        node.input_names.iter().cloned().collect()
    }
}

fn c_type_for(element_type: &str) -> &str {
    match element_type {
        "float32" => "float",
        "float64" => "double",
        "int8" => "int8_t",
        "int16" => "int16_t",
        "int32" => "int32_t",
        "int64" => "int64_t",
        "uint8" => "uint8_t",
        "uint16" => "uint16_t",
        "uint32" => "uint32_t",
        "uint64" => "uint64_t",
        _ => "float",
    }
}

/// Small extension used only by the fused-group emitters, where a missing
/// node id means the group itself is inconsistent rather than a plain
/// lookup miss.
trait TryNodeForGroup {
    fn try_node_for_group(&self, id: NodeId, group: GroupId) -> Result<&IrNode, EmitError>;
}

impl TryNodeForGroup for IrFunction {
    fn try_node_for_group(&self, id: NodeId, group: GroupId) -> Result<&IrNode, EmitError> {
        self.node(id).ok_or(EmitError::GroupNotFound(group))
    }
}
