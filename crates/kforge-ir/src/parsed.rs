//! The parser -> builder interface.
//!
//! `ParsedFunction` and its statement/expression tree are ordinary
//! serializable data with no behavior: the parser that produces them is an
//! external collaborator out of scope for this crate. The CLI (`kforge-cli`)
//! reads a `ParsedFunction` from a JSON file; this module exists so that
//! format is a typed contract instead of an ad-hoc `serde_json::Value`.

use serde::{Deserialize, Serialize};

/// A parsed kernel function, as produced by the (out-of-scope) parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedFunction {
    /// Identifier string.
    pub name: String,
    /// Ordered (name, constraint-string) pairs.
    #[serde(default)]
    pub type_params: Vec<(String, String)>,
    /// Ordered (name, type-string) pairs.
    pub params: Vec<(String, String)>,
    /// Ordered (name, type-string) pairs, same shape as `params`.
    pub returns: Vec<(String, String)>,
    /// Structured statement tree for the function body.
    pub body: Vec<Stmt>,
}

/// One statement in a parsed function body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stmt")]
pub enum Stmt {
    /// Single- or multi-value assignment. `declare` distinguishes a fresh
    /// binding (`x := ...`) from rebinding an existing one (`x = ...`); the
    /// Builder treats both the same way except for the type table.
    Assign {
        targets: Vec<String>,
        value: Expr,
        declare: bool,
    },
    /// A bare declaration with no initializer (`var x T`).
    Declare { name: String, type_string: String },
    /// Compound assignment (`+=`, `-=`, `*=`, `/=`).
    CompoundAssign { target: String, op: String, value: Expr },
    /// Increment/decrement (`x++`, `x--`).
    IncDec { target: String, increment: bool },
    /// Classical C-style for-loop: `for init; cond; post { body }`.
    For {
        induction_var: String,
        start: Expr,
        end: Expr,
        step: Expr,
        body: Vec<Stmt>,
    },
    /// Range-over-integer loop: `for i := range n { body }`.
    ForRange {
        induction_var: String,
        end: Expr,
        body: Vec<Stmt>,
    },
    /// `if cond { then } else { otherwise }`. `otherwise` is empty for a
    /// bodyless else.
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
    },
    /// `return expr, expr, ...`.
    Return { values: Vec<Expr> },
    /// An expression evaluated for side effect only.
    ExprStmt(Expr),
    /// An explicit nested block with no loop/if semantics of its own.
    Block(Vec<Stmt>),
}

/// One expression in a parsed function body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expr")]
pub enum Expr {
    /// A bare identifier (parameter, local variable, or loop induction var).
    Ident(String),
    /// A literal, kept as its source text (e.g. `"0"`, `"1.0"`).
    Literal(String),
    /// A binary operator expression.
    Binary { op: String, lhs: Box<Expr>, rhs: Box<Expr> },
    /// A unary operator expression.
    Unary { op: String, operand: Box<Expr> },
    /// A call expression. `type_args` are explicit generic instantiations
    /// (e.g. `hwy.Add[float32]`); `func_arg` is set when one argument is
    /// itself a function reference (for higher-order combinators).
    Call {
        callee: String,
        #[serde(default)]
        type_args: Vec<String>,
        args: Vec<Expr>,
        #[serde(default)]
        func_arg: Option<String>,
    },
    /// Indexing expression (`xs[i]`).
    Index { base: Box<Expr>, index: Box<Expr> },
}

impl Expr {
    /// Renders the expression back to a textual form suitable for use as a
    /// `LoopRange` bound or size expression. This is deliberately a plain
    /// textual reconstruction, not a normalized one -- `LoopRange` equality
    /// depends on two textually-identical bounds producing the same string.
    pub fn as_text(&self) -> String {
        match self {
            Expr::Ident(name) => name.clone(),
            Expr::Literal(text) => text.clone(),
            Expr::Binary { op, lhs, rhs } => format!("{} {} {}", lhs.as_text(), op, rhs.as_text()),
            Expr::Unary { op, operand } => format!("{}{}", op, operand.as_text()),
            Expr::Call { callee, args, .. } => {
                let rendered: Vec<String> = args.iter().map(Expr::as_text).collect();
                format!("{}({})", callee, rendered.join(", "))
            }
            Expr::Index { base, index } => format!("{}[{}]", base.as_text(), index.as_text()),
        }
    }
}
