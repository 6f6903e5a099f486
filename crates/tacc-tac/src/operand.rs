//! TAC operands.

use serde::ser::{Serialize, SerializeMap, Serializer};
use tacc_util::Symbol;

/// A value read or written by an [`crate::instr::Instr`]. `TEMP`/`LABEL`
/// carry a plain integer id (drawn from the shared counter in
/// [`crate::emitter::Emitter`]), `VAR` carries the variable's name,
/// `LITERAL` carries its integer value.
///
/// `Serialize` is hand-written (not derived): an internally tagged enum
/// whose variants are bare numbers/strings rather than maps doesn't fit
/// serde's derive cleanly, the same reason `tacc-par::ast` hand-writes
/// its own `Serialize` impls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Temp(u32),
    Var(Symbol),
    Literal(i64),
    Label(u32),
}

impl Serialize for Operand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut m = serializer.serialize_map(Some(2))?;
        match self {
            Operand::Temp(id) => {
                m.serialize_entry("kind", "TEMP")?;
                m.serialize_entry("id", id)?;
            }
            Operand::Var(name) => {
                m.serialize_entry("kind", "VAR")?;
                m.serialize_entry("name", name.as_str())?;
            }
            Operand::Literal(value) => {
                m.serialize_entry("kind", "LITERAL")?;
                m.serialize_entry("value", value)?;
            }
            Operand::Label(id) => {
                m.serialize_entry("kind", "LABEL")?;
                m.serialize_entry("id", id)?;
            }
        }
        m.end()
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Temp(id) => write!(f, "t{id}"),
            Operand::Var(name) => write!(f, "{name}"),
            Operand::Literal(n) => write!(f, "{n}"),
            Operand::Label(id) => write!(f, "L{id}"),
        }
    }
}
