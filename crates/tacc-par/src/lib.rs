//! tacc-par - tokens to abstract syntax tree.
//!
//! Public surface: [`ast`]'s node types and [`parser::Parser`].

pub mod ast;
pub mod parser;

pub use ast::{BinOp, Block, Expr, Stmt, UnOp};
pub use parser::{ParseError, Parser};
