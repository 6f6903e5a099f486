//! TAC instructions: an arena of nodes linked by an explicit `next`
//! field, rather than a genuine pointer-based singly linked list.
//!
//! Each instruction logically owns its operands and its successor, but
//! safe Rust has no pointer-aliasing equivalent to that ownership, so
//! (following the sibling `IndexVec`-arena pattern `tacc-util::index_vec`
//! already establishes) this is modeled as an `IndexVec<InstrId, Instr>`
//! arena plus a `next: Option<InstrId>` field on every node. A [`Chain`]
//! is a lightweight `{head, tail}` view into the arena, letting emission
//! concatenate lowered sub-results in O(1) by linking `tail.next` without
//! ever walking the list.

use serde::Serialize;
use tacc_par::{BinOp, UnOp};
use tacc_util::index_vec::Idx;

use crate::operand::Operand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct InstrId(u32);

impl Idx for InstrId {
    fn from_usize(idx: usize) -> Self {
        InstrId(idx as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The operator carried by `BINARY_OP`/`UNARY_OP` instructions. Reuses
/// the AST's own operator enums rather than duplicating a parallel set,
/// since TAC operators are a 1:1 carry-over of the AST operators that
/// produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Bin(BinOp),
    Un(UnOp),
}

impl serde::Serialize for Op {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.to_string().as_str())
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::Bin(op) => f.write_str(op.as_str()),
            Op::Un(op) => f.write_str(op.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstrKind {
    BinaryOp,
    UnaryOp,
    Copy,
    Label,
    Goto,
    Ifz,
    Param,
    Call,
    Return,
    Function,
    EndFunction,
    Define,
}

impl InstrKind {
    /// A terminator ends a basic block: `GOTO`, `IFZ`, `RETURN`, and
    /// `END_FUNCTION` are the only instruction kinds a basic block can end
    /// on.
    pub fn is_terminator(self) -> bool {
        matches!(
            self,
            InstrKind::Goto | InstrKind::Ifz | InstrKind::Return | InstrKind::EndFunction
        )
    }
}

/// One TAC instruction. Operand slots not used by a given `kind` are
/// left `None`.
#[derive(Debug, Clone, Serialize)]
pub struct Instr {
    pub kind: InstrKind,
    pub dst: Option<Operand>,
    pub arg1: Option<Operand>,
    pub arg2: Option<Operand>,
    pub op: Option<Op>,
    pub next: Option<InstrId>,
}

impl Instr {
    pub fn new(kind: InstrKind) -> Self {
        Self {
            kind,
            dst: None,
            arg1: None,
            arg2: None,
            op: None,
            next: None,
        }
    }

    pub fn dst(mut self, dst: Operand) -> Self {
        self.dst = Some(dst);
        self
    }

    pub fn arg1(mut self, arg1: Operand) -> Self {
        self.arg1 = Some(arg1);
        self
    }

    pub fn arg2(mut self, arg2: Operand) -> Self {
        self.arg2 = Some(arg2);
        self
    }

    pub fn op(mut self, op: Op) -> Self {
        self.op = Some(op);
        self
    }
}

/// A `{head, tail}` view into an instruction arena, covering the
/// instructions emitted for one AST node. An empty chain (no
/// instructions emitted) has `head == tail == None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Chain {
    pub head: Option<InstrId>,
    pub tail: Option<InstrId>,
}

impl Chain {
    pub fn empty() -> Self {
        Self {
            head: None,
            tail: None,
        }
    }

    pub fn one(id: InstrId) -> Self {
        Self {
            head: Some(id),
            tail: Some(id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}
