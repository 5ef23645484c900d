//! The IR builder: walks a [`ParsedFunction`] and produces an [`IrFunction`].

use std::collections::HashMap;

use crate::error::BuildError;
use crate::function::{IrFunction, ParamDescriptor};
use crate::id::NodeId;
use crate::node::{AllocInfo, CallInfo, IrNode};
use crate::ops::OpKind;
use crate::parsed::{Expr, ParsedFunction, Stmt};
use crate::range::LoopRange;

/// Per-invocation configuration the Builder needs beyond the parsed syntax:
/// which concrete element type substitutes generic parameters, and how many
/// lanes a vectorized loop's induction variable advances by for this target.
///
/// One generator invocation targets exactly one tier, so this is fixed for
/// the whole build rather than discovered per-node.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub element_type: String,
    pub lanes: u32,
}

/// A resolved operand: either a direct edge to a producer node already built
/// in this function, or a symbolic name/literal text with no producer node
/// (yet) -- a parameter, a loop induction variable, or a literal.
enum Operand {
    Node(NodeId),
    Name(String),
}

/// Builds an [`IrFunction`] from a [`ParsedFunction`].
pub fn build(parsed: &ParsedFunction, config: &BuildConfig) -> Result<IrFunction, BuildError> {
    tracing::debug!(
        function = %parsed.name,
        params = parsed.params.len(),
        statements = parsed.body.len(),
        "building IR"
    );
    let mut b = Builder::new(parsed, config);
    b.seed_params_and_returns(parsed)?;
    let top_level = b.build_stmts(&parsed.body, None)?;
    b.ir.top_level = top_level;
    tracing::debug!(
        function = %parsed.name,
        nodes = b.ir.node_count(),
        "IR built"
    );
    Ok(b.ir)
}

struct Builder {
    ir: IrFunction,
    config: BuildConfig,
    /// Maps a currently-bound variable name to the node that last defined it.
    bindings: HashMap<String, NodeId>,
}

impl Builder {
    fn new(parsed: &ParsedFunction, config: &BuildConfig) -> Self {
        let mut ir = IrFunction::new(parsed.name.clone(), config.element_type.clone());
        ir.type_params = parsed.type_params.clone();
        Builder {
            ir,
            config: config.clone(),
            bindings: HashMap::new(),
        }
    }

    fn seed_params_and_returns(&mut self, parsed: &ParsedFunction) -> Result<(), BuildError> {
        for (name, type_string) in &parsed.params {
            self.ir.params.push(self.classify_param(name, type_string));
        }
        for (name, type_string) in &parsed.returns {
            self.ir.returns.push(self.classify_param(name, type_string));
        }
        Ok(())
    }

    /// Classifies a parameter/return type string into a [`ParamDescriptor`].
    /// Slices become `slice`, integer-kinded scalars become `int_scalar`,
    /// floating-kinded scalars `float_scalar`. A parameter typed with the
    /// generic parameter `T` adopts the concrete element type.
    fn classify_param(&self, name: &str, type_string: &str) -> ParamDescriptor {
        if let Some(elem) = type_string.strip_prefix("[]") {
            let element_type = if elem == "T" {
                self.config.element_type.clone()
            } else {
                elem.to_string()
            };
            return ParamDescriptor::slice(name, type_string, element_type);
        }
        let concrete = if type_string == "T" {
            self.config.element_type.as_str()
        } else {
            type_string
        };
        if is_float_type(concrete) {
            ParamDescriptor::float_scalar(name, type_string)
        } else {
            ParamDescriptor::int_scalar(name, type_string)
        }
    }

    /// Builds a sequence of statements into a list of created node ids, in
    /// source order. `Block` statements are flattened into the surrounding
    /// sequence rather than producing a node of their own -- `OpKind` has no
    /// "Block" variant; a block is purely a grouping construct.
    fn build_stmts(&mut self, stmts: &[Stmt], range: Option<&LoopRange>) -> Result<Vec<NodeId>, BuildError> {
        let mut ids = Vec::new();
        for stmt in stmts {
            match stmt {
                Stmt::Block(inner) => ids.extend(self.build_stmts(inner, range)?),
                other => {
                    if let Some(id) = self.build_stmt(other, range)? {
                        ids.push(id);
                    }
                }
            }
        }
        Ok(ids)
    }

    fn build_stmt(&mut self, stmt: &Stmt, range: Option<&LoopRange>) -> Result<Option<NodeId>, BuildError> {
        match stmt {
            Stmt::Block(_) => unreachable!("flattened in build_stmts"),

            Stmt::Declare { name, .. } => {
                // A bare declaration with no initializer has no numeric
                // effect yet; just make the name resolvable as "unbound" so
                // that a later assignment is required before use.
                let _ = name;
                Ok(None)
            }

            Stmt::Assign { targets, value, .. } => {
                let node_id = self.build_expr_node(value, range)?;
                if let Some(node) = self.ir.node_mut(node_id) {
                    for target in targets {
                        node.outputs.push(target.clone());
                    }
                }
                for target in targets {
                    self.bindings.insert(target.clone(), node_id);
                }
                Ok(Some(node_id))
            }

            Stmt::CompoundAssign { target, op, value } => {
                let prior = *self
                    .bindings
                    .get(target)
                    .ok_or_else(|| BuildError::UndeclaredVariable {
                        name: target.clone(),
                        context: format!("{}{} ...", target, op),
                    })?;
                let kind = elementwise_or_scalar(range);
                let mnemonic = compound_mnemonic(op);
                let mut node = IrNode::new(NodeId(0), kind, mnemonic).with_input(prior);
                self.apply_operand(&mut node, self.build_operand(value, range)?);
                node.outputs.push(target.clone());
                if let Some(r) = range {
                    node.range = Some(r.clone());
                }
                let id = self.ir.insert_node(node);
                self.bindings.insert(target.clone(), id);
                Ok(Some(id))
            }

            Stmt::IncDec { target, increment } => {
                let prior = *self
                    .bindings
                    .get(target)
                    .ok_or_else(|| BuildError::UndeclaredVariable {
                        name: target.clone(),
                        context: format!("{}{}", target, if *increment { "++" } else { "--" }),
                    })?;
                let kind = elementwise_or_scalar(range);
                let mnemonic = if *increment { "Inc" } else { "Dec" };
                let mut node = IrNode::new(NodeId(0), kind, mnemonic).with_input(prior);
                node.outputs.push(target.clone());
                if let Some(r) = range {
                    node.range = Some(r.clone());
                }
                let id = self.ir.insert_node(node);
                self.bindings.insert(target.clone(), id);
                Ok(Some(id))
            }

            Stmt::For {
                induction_var,
                start,
                end,
                step,
                body,
            } => {
                let step_text = step.as_text();
                let is_vectorized = mentions_lane_width(&step_text);
                let loop_range = LoopRange {
                    induction_var: induction_var.clone(),
                    start: start.as_text(),
                    end: end.as_text(),
                    step: step_text,
                    is_vectorized,
                    lanes: if is_vectorized { self.config.lanes } else { 1 },
                };
                let children = self.build_stmts(body, Some(&loop_range))?;
                let node = IrNode::new(NodeId(0), OpKind::Loop, "Loop")
                    .with_range(loop_range)
                    .with_children(children);
                Ok(Some(self.ir.insert_node(node)))
            }

            Stmt::ForRange { induction_var, end, body } => {
                let loop_range = LoopRange::scalar(induction_var.clone(), "0", end.as_text(), "1");
                let children = self.build_stmts(body, Some(&loop_range))?;
                let node = IrNode::new(NodeId(0), OpKind::Loop, "Loop")
                    .with_range(loop_range)
                    .with_children(children);
                Ok(Some(self.ir.insert_node(node)))
            }

            Stmt::If { cond, .. } => {
                // An opaque fusion barrier: the Builder does not recurse
                // into either branch for optimization purposes.
                let mut node = IrNode::new(NodeId(0), OpKind::Control, "If");
                self.apply_operand(&mut node, self.build_operand(cond, range)?);
                Ok(Some(self.ir.insert_node(node)))
            }

            Stmt::Return { values } => {
                let mut node = IrNode::new(NodeId(0), OpKind::Control, "Return");
                for value in values {
                    let operand = self.build_operand(value, range)?;
                    self.apply_operand(&mut node, operand);
                }
                Ok(Some(self.ir.insert_node(node)))
            }

            Stmt::ExprStmt(expr) => Ok(Some(self.build_expr_node(expr, range)?)),
        }
    }

    /// Builds a node representing the *value* of an expression: used for
    /// assignment right-hand-sides and bare expression statements, where the
    /// expression must have a concrete node identity of its own (so it can
    /// be a producer for later statements).
    fn build_expr_node(&mut self, expr: &Expr, range: Option<&LoopRange>) -> Result<NodeId, BuildError> {
        let id = match expr {
            Expr::Ident(name) => {
                let mut node = IrNode::new(NodeId(0), OpKind::Noop, "Alias");
                self.apply_operand(&mut node, self.resolve_ident(name));
                self.ir.insert_node(node)
            }
            Expr::Literal(text) => {
                let node = IrNode::new(NodeId(0), OpKind::Noop, "Literal").with_input_name(text.clone());
                self.ir.insert_node(node)
            }
            Expr::Index { .. } => {
                let mut node = IrNode::new(NodeId(0), OpKind::Scalar, "Index");
                self.apply_operand(&mut node, Operand::Name(expr.as_text()));
                self.ir.insert_node(node)
            }
            Expr::Binary { op, lhs, rhs } => {
                let kind = elementwise_or_scalar(range);
                let mnemonic = binary_mnemonic(op);
                let mut node = IrNode::new(NodeId(0), kind, mnemonic);
                let lhs_operand = self.build_operand(lhs, range)?;
                let rhs_operand = self.build_operand(rhs, range)?;
                self.apply_operand(&mut node, lhs_operand);
                self.apply_operand(&mut node, rhs_operand);
                if let Some(r) = range {
                    node.range = Some(r.clone());
                }
                self.ir.insert_node(node)
            }
            Expr::Unary { op, operand } => {
                let kind = elementwise_or_scalar(range);
                let mnemonic = unary_mnemonic(op);
                let mut node = IrNode::new(NodeId(0), kind, mnemonic);
                let resolved = self.build_operand(operand, range)?;
                self.apply_operand(&mut node, resolved);
                if let Some(r) = range {
                    node.range = Some(r.clone());
                }
                self.ir.insert_node(node)
            }
            Expr::Call {
                callee,
                type_args,
                args,
                func_arg,
            } => return self.build_call(callee, type_args, args, func_arg.as_deref(), range),
        };
        if let Some(r) = range {
            if self.ir.node(id).and_then(|n| n.range.clone()).is_none() {
                if let Some(node) = self.ir.node_mut(id) {
                    node.range = Some(r.clone());
                }
            }
        }
        Ok(id)
    }

    fn build_call(
        &mut self,
        callee: &str,
        type_args: &[String],
        args: &[Expr],
        func_arg: Option<&str>,
        range: Option<&LoopRange>,
    ) -> Result<NodeId, BuildError> {
        if is_allocator_call(callee) {
            if args.is_empty() {
                return Err(BuildError::InconsistentArity {
                    callee: callee.to_string(),
                    expected: 1,
                    found: 0,
                });
            }
            let element_type = type_args
                .first()
                .cloned()
                .unwrap_or_else(|| self.config.element_type.clone());
            let node = IrNode::new(NodeId(0), OpKind::Alloc, callee).with_alloc(AllocInfo {
                size_expr: args[0].as_text(),
                element_type,
            });
            return Ok(self.ir.insert_node(node));
        }

        if let Some(suffix) = callee.strip_prefix("hwy.") {
            let kind = classify_hwy_op(suffix);
            let mut node = IrNode::new(NodeId(0), kind, suffix);
            for arg in args {
                let operand = self.build_operand(arg, range)?;
                self.apply_operand(&mut node, operand);
            }
            if let Some(r) = range {
                node.range = Some(r.clone());
            }
            return Ok(self.ir.insert_node(node));
        }

        if callee.starts_with("Base") && callee.ends_with("Vec") {
            let mut node = IrNode::new(NodeId(0), OpKind::Elementwise, callee);
            for arg in args {
                let operand = self.build_operand(arg, range)?;
                self.apply_operand(&mut node, operand);
            }
            if let Some(r) = range {
                node.range = Some(r.clone());
            }
            return Ok(self.ir.insert_node(node));
        }

        if callee.starts_with("algo.") {
            let mut node = IrNode::new(NodeId(0), OpKind::Call, callee).with_call(CallInfo {
                callee: callee.to_string(),
                type_args: type_args.to_vec(),
                function_arg: func_arg.map(str::to_string),
            });
            for arg in args {
                let operand = self.build_operand(arg, range)?;
                self.apply_operand(&mut node, operand);
            }
            return Ok(self.ir.insert_node(node));
        }

        if matches!(callee, "len" | "min" | "max") {
            let mut node = IrNode::new(NodeId(0), OpKind::Scalar, callee);
            for arg in args {
                let operand = self.build_operand(arg, range)?;
                self.apply_operand(&mut node, operand);
            }
            return Ok(self.ir.insert_node(node));
        }

        if callee == "copy" {
            let mut node = IrNode::new(NodeId(0), OpKind::Noop, "copy");
            for arg in args {
                let operand = self.build_operand(arg, range)?;
                self.apply_operand(&mut node, operand);
            }
            return Ok(self.ir.insert_node(node));
        }

        if is_scalar_type_name(callee) && args.len() == 1 {
            // A type-name "call" is a numeric conversion; pass through to
            // the argument's own node rather than wrapping it.
            return self.build_expr_node(&args[0], range);
        }

        // Unclassified cross-module call: kept visible for the emitter's
        // `// TODO: inline ...` fallback.
        let mut node = IrNode::new(NodeId(0), OpKind::Call, callee).with_call(CallInfo {
            callee: callee.to_string(),
            type_args: type_args.to_vec(),
            function_arg: func_arg.map(str::to_string),
        });
        for arg in args {
            let operand = self.build_operand(arg, range)?;
            self.apply_operand(&mut node, operand);
        }
        Ok(self.ir.insert_node(node))
    }

    /// Resolves a sub-expression used as an operand of another node, without
    /// necessarily materializing a new node for trivial cases (bare
    /// identifiers and literals).
    fn build_operand(&mut self, expr: &Expr, range: Option<&LoopRange>) -> Result<Operand, BuildError> {
        match expr {
            Expr::Ident(name) => Ok(self.resolve_ident(name)),
            Expr::Literal(text) => Ok(Operand::Name(text.clone())),
            Expr::Index { .. } => Ok(Operand::Name(expr.as_text())),
            _ => Ok(Operand::Node(self.build_expr_node(expr, range)?)),
        }
    }

    fn resolve_ident(&self, name: &str) -> Operand {
        match self.bindings.get(name) {
            Some(&id) => Operand::Node(id),
            None => Operand::Name(name.to_string()),
        }
    }

    fn apply_operand(&self, node: &mut IrNode, operand: Operand) {
        match operand {
            Operand::Node(id) => node.inputs.push(id),
            Operand::Name(name) => node.input_names.push(name),
        }
    }
}

fn elementwise_or_scalar(range: Option<&LoopRange>) -> OpKind {
    if range.map(|r| r.is_vectorized).unwrap_or(false) {
        OpKind::Elementwise
    } else {
        OpKind::Scalar
    }
}

fn mentions_lane_width(step_text: &str) -> bool {
    ["lanes", "MaxLanes", "NumLanes"]
        .iter()
        .any(|needle| step_text.contains(needle))
}

fn is_allocator_call(callee: &str) -> bool {
    callee.contains("Allocate")
}

fn is_scalar_type_name(callee: &str) -> bool {
    matches!(
        callee,
        "float32" | "float64" | "int8" | "int16" | "int32" | "int64" | "uint32" | "uint64" | "int" | "long"
    )
}

fn is_float_type(type_string: &str) -> bool {
    type_string.contains("float")
}

fn classify_hwy_op(suffix: &str) -> OpKind {
    match suffix {
        "ReduceSum" | "ReduceMin" | "ReduceMax" | "ReduceAnd" | "ReduceOr" => OpKind::Reduction,
        "Load" => OpKind::Load,
        "Store" => OpKind::Store,
        "Set" => OpKind::Broadcast,
        _ => OpKind::Elementwise,
    }
}

fn binary_mnemonic(op: &str) -> &'static str {
    match op {
        "+" => "Add",
        "-" => "Sub",
        "*" => "Mul",
        "/" => "Div",
        "<" => "Lt",
        "<=" => "Le",
        ">" => "Gt",
        ">=" => "Ge",
        "==" => "Eq",
        "!=" => "Ne",
        "&" => "And",
        "|" => "Or",
        "^" => "Xor",
        "&&" => "And",
        "||" => "Or",
        _ => "Op",
    }
}

fn unary_mnemonic(op: &str) -> &'static str {
    match op {
        "-" => "Neg",
        "!" => "Not",
        "^" => "Not",
        _ => "UnaryOp",
    }
}

fn compound_mnemonic(op: &str) -> &'static str {
    match op {
        "+=" => "Add",
        "-=" => "Sub",
        "*=" => "Mul",
        "/=" => "Div",
        _ => "Op",
    }
}
