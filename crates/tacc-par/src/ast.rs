//! The abstract syntax tree.
//!
//! `Expr` and `Stmt` are split into two enums rather than one flat tagged
//! union, since the grammar's own invariants already partition nodes into
//! expression-producing and statement-producing positions.
//! `ArgList`/`ParamList` are not separate node variants: block membership
//! is structural rather than aliased, so they are plain `Vec<Expr>` call
//! arguments and `Vec<Symbol>` function parameters, since every
//! `ParamList` entry is a bare identifier by invariant.
//!
//! `Serialize` is implemented by hand (not derived) for `Expr`/`Stmt`/
//! `Block`, since the wire shapes don't line up one-to-one with
//! convenient Rust field names (`else` is a keyword,
//! `Literal` becomes `IntLiteral` on the wire, `BinaryOp.op` is a bare
//! operator string rather than an enum variant name).

use serde::ser::{Serialize, SerializeMap, Serializer};
use tacc_util::{Span, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

impl UnOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Eq,
    Gt,
    Leq,
    Geq,
    Neq,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Leq => "<=",
            BinOp::Geq => ">=",
            BinOp::Eq => "==",
            BinOp::Neq => "!=",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal {
        value: i64,
        span: Span,
    },
    Variable {
        name: Symbol,
        span: Span,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    /// Invariant: the callee is always a bare identifier, so it is
    /// stored directly as a `Symbol` rather than a boxed `Expr::Variable`.
    Call {
        callee: Symbol,
        args: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Variable { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Call { span, .. } => *span,
        }
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Expr::Literal { value, .. } => {
                let mut m = serializer.serialize_map(Some(2))?;
                m.serialize_entry("type", "IntLiteral")?;
                m.serialize_entry("value", value)?;
                m.end()
            }
            Expr::Variable { name, .. } => {
                let mut m = serializer.serialize_map(Some(2))?;
                m.serialize_entry("type", "Variable")?;
                m.serialize_entry("name", name.as_str())?;
                m.end()
            }
            Expr::Unary { op, operand, .. } => {
                let mut m = serializer.serialize_map(Some(3))?;
                m.serialize_entry("type", "UnaryOp")?;
                m.serialize_entry("op", op.as_str())?;
                m.serialize_entry("operand", operand.as_ref())?;
                m.end()
            }
            Expr::Binary {
                op, left, right, ..
            } => {
                let mut m = serializer.serialize_map(Some(4))?;
                m.serialize_entry("type", "BinaryOp")?;
                m.serialize_entry("op", op.as_str())?;
                m.serialize_entry("left", left.as_ref())?;
                m.serialize_entry("right", right.as_ref())?;
                m.end()
            }
            Expr::Call { callee, args, .. } => {
                let mut m = serializer.serialize_map(Some(3))?;
                m.serialize_entry("type", "Call")?;
                m.serialize_entry("callee", callee.as_str())?;
                m.serialize_entry("args", args)?;
                m.end()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Declaration {
        var: Symbol,
        init: Option<Expr>,
        span: Span,
    },
    Assignment {
        var: Symbol,
        value: Expr,
        span: Span,
    },
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
        span: Span,
    },
    While {
        cond: Expr,
        body: Block,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    Function {
        name: Symbol,
        params: Vec<Symbol>,
        body: Block,
        span: Span,
    },
    /// An expression used as a statement (e.g. `add(1, 2)` on its own
    /// line). Not a distinct node type on the wire: it serializes as
    /// whatever its inner expression serializes as; there is no separate
    /// "expression statement" JSON shape.
    Expr {
        expr: Expr,
        span: Span,
    },
    /// A bare `{ ... }` appearing directly in a statement position (the
    /// grammar's `statement = ... | block` alternative), as opposed to a
    /// `Block` that is structurally part of an `If`/`While`/`Function`
    /// node. Serializes identically to any other `Block`.
    Block(Block),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Declaration { span, .. }
            | Stmt::Assignment { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Function { span, .. }
            | Stmt::Expr { span, .. } => *span,
            Stmt::Block(block) => block.span,
        }
    }
}

impl Serialize for Stmt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Stmt::Declaration { var, init, .. } => {
                let mut m = serializer.serialize_map(Some(3))?;
                m.serialize_entry("type", "Declaration")?;
                m.serialize_entry("var", var.as_str())?;
                m.serialize_entry("value", init)?;
                m.end()
            }
            Stmt::Assignment { var, value, .. } => {
                let mut m = serializer.serialize_map(Some(3))?;
                m.serialize_entry("type", "Assignment")?;
                m.serialize_entry("var", var.as_str())?;
                m.serialize_entry("value", value)?;
                m.end()
            }
            Stmt::If {
                cond,
                then_block,
                else_block,
                ..
            } => {
                let mut m = serializer.serialize_map(Some(4))?;
                m.serialize_entry("type", "If")?;
                m.serialize_entry("cond", cond)?;
                m.serialize_entry("then", then_block)?;
                if let Some(else_block) = else_block {
                    m.serialize_entry("else", else_block)?;
                }
                m.end()
            }
            Stmt::While { cond, body, .. } => {
                let mut m = serializer.serialize_map(Some(3))?;
                m.serialize_entry("type", "While")?;
                m.serialize_entry("cond", cond)?;
                m.serialize_entry("body", body)?;
                m.end()
            }
            Stmt::Return { value, .. } => {
                let mut m = serializer.serialize_map(Some(2))?;
                m.serialize_entry("type", "Return")?;
                m.serialize_entry("expr", value)?;
                m.end()
            }
            Stmt::Function {
                name, params, body, ..
            } => {
                let mut m = serializer.serialize_map(Some(4))?;
                m.serialize_entry("type", "Function")?;
                m.serialize_entry("name", name.as_str())?;
                let param_names: Vec<&str> = params.iter().map(|p| p.as_str()).collect();
                m.serialize_entry("params", &param_names)?;
                m.serialize_entry("body", body)?;
                m.end()
            }
            Stmt::Expr { expr, .. } => expr.serialize(serializer),
            Stmt::Block(block) => block.serialize(serializer),
        }
    }
}

/// A brace-delimited ordered sequence of statements. Every
/// `If.then_block`/`If.else_block` and `Function.body` is a `Block`; a
/// parsed program is itself a root `Block`.
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut m = serializer.serialize_map(Some(2))?;
        m.serialize_entry("type", "Block")?;
        m.serialize_entry("stmts", &self.stmts)?;
        m.end()
    }
}
