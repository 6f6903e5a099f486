//! tacc-tac - AST to three-address code, and TAC to control-flow graph.

pub mod cfg;
pub mod emitter;
pub mod instr;
pub mod operand;

pub use cfg::{build_from_tac, extract_functions, BasicBlock, BlockId, Cfg};
pub use emitter::{Emitter, Program};
pub use instr::{Chain, Instr, InstrId, InstrKind, Op};
pub use operand::Operand;
