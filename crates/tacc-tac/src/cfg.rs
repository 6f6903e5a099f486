//! Control-flow graph construction.
//!
//! Two complementary builders over the same flat TAC list:
//! [`build_from_tac`] partitions by the classic leader/terminator rule,
//! [`extract_functions`] partitions by `FUNCTION`/`END_FUNCTION` nesting
//! depth. `successors`/`predecessors` wiring is optional in general: an
//! implementation can either wire edges from terminators and fallthroughs
//! or explicitly leave them empty. [`build_from_tac`] wires them (`GOTO`/
//! `IFZ` targets resolved through a label-to-block map, plus fallthrough
//! for non-terminator block ends) since the leader partition already
//! establishes per-block terminators and a label index cheaply.
//! [`extract_functions`]'s blocks are function-granularity, not
//! control-flow-granularity, so wiring edges there has no well-defined
//! meaning beyond plain sequential order; it leaves the fields empty.

use std::collections::HashMap;

use serde::Serialize;
use tacc_util::index_vec::{Idx, IndexVec};

use crate::instr::{Instr, InstrId, InstrKind};
use crate::operand::Operand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BlockId(u32);

impl Idx for BlockId {
    fn from_usize(idx: usize) -> Self {
        BlockId(idx as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub is_entry: bool,
    pub is_exit: bool,
    /// Instruction ids owned by this block, in source order. The
    /// sub-list is cut at the block boundary; since instructions here
    /// live in a shared arena rather than a genuine owned list, cutting
    /// is represented by simply not following `next` past this block's
    /// boundary, rather than by mutating the arena.
    pub instrs: Vec<InstrId>,
    pub successors: Vec<BlockId>,
    pub predecessors: Vec<BlockId>,
}

impl BasicBlock {
    fn new(id: BlockId) -> Self {
        Self {
            id,
            is_entry: false,
            is_exit: false,
            instrs: Vec::new(),
            successors: Vec::new(),
            predecessors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cfg {
    pub blocks: IndexVec<BlockId, BasicBlock>,
}

impl Cfg {
    pub fn empty() -> Self {
        Self {
            blocks: IndexVec::new(),
        }
    }
}

impl Serialize for Cfg {
    /// `IndexVec` itself carries no `Serialize` impl (it is a plain
    /// arena helper in `tacc-util`, not a wire type), so this serializes
    /// the block array directly as a JSON array, matching how every
    /// other ordered collection in this workspace's wire formats is
    /// represented.
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.blocks.as_slice().serialize(serializer)
    }
}

/// Walk the arena from `head` following `next`, collecting ids in
/// source order.
fn walk(arena: &IndexVec<InstrId, Instr>, head: Option<InstrId>) -> Vec<InstrId> {
    let mut ids = Vec::new();
    let mut cur = head;
    while let Some(id) = cur {
        ids.push(id);
        cur = arena[id].next;
    }
    ids
}

/// Leader-based partitioning: a new block starts at the first
/// instruction, immediately after a terminator, and at a `LABEL`. Empty
/// blocks (e.g. two terminators in a row, or a `LABEL` immediately
/// following a terminator) are skipped rather than emitted.
pub fn build_from_tac(arena: &IndexVec<InstrId, Instr>, head: Option<InstrId>) -> Cfg {
    let order = walk(arena, head);
    if order.is_empty() {
        return Cfg::empty();
    }

    let mut cfg = Cfg::empty();
    let mut current: Vec<InstrId> = Vec::new();
    let mut prev_was_terminator = false;

    let flush = |cfg: &mut Cfg, current: &mut Vec<InstrId>, arena: &IndexVec<InstrId, Instr>| {
        if current.is_empty() {
            return;
        }
        let id = cfg.blocks.next_index();
        let mut block = BasicBlock::new(id);
        block.instrs = std::mem::take(current);
        let last = *block.instrs.last().expect("flush only called non-empty");
        block.is_exit = matches!(arena[last].kind, InstrKind::Return | InstrKind::EndFunction);
        cfg.blocks.push(block);
    };

    for (i, &id) in order.iter().enumerate() {
        let is_label = arena[id].kind == InstrKind::Label;
        let starts_new_block = i == 0 || prev_was_terminator || is_label;
        if starts_new_block && !current.is_empty() {
            flush(&mut cfg, &mut current, arena);
        }
        current.push(id);
        prev_was_terminator = arena[id].kind.is_terminator();
    }
    flush(&mut cfg, &mut current, arena);

    if !cfg.blocks.is_empty() {
        let entry_id = BlockId::from_usize(0);
        if let Some(block) = cfg.blocks.get_mut(entry_id) {
            block.is_entry = true;
        }
    }
    wire_edges(&mut cfg, arena);
    cfg
}

/// Second pass over an already-partitioned [`Cfg`]: resolves each
/// block's terminator into `successors`/`predecessors` edges, mirroring
/// them onto both ends. `LABEL` ids are resolved to the block whose
/// first instruction is that label (every `LABEL` is itself a leader,
/// so it always starts some block). A block whose last instruction is
/// not a terminator (the final block in a list with no trailing
/// `RETURN`/`END_FUNCTION`) falls through to the next block in order.
fn wire_edges(cfg: &mut Cfg, arena: &IndexVec<InstrId, Instr>) {
    let mut label_block: HashMap<u32, BlockId> = HashMap::new();
    for block in cfg.blocks.iter() {
        if let Some(&first) = block.instrs.first() {
            if arena[first].kind == InstrKind::Label {
                if let Some(Operand::Label(id)) = arena[first].dst {
                    label_block.insert(id, block.id);
                }
            }
        }
    }

    let block_count = cfg.blocks.len();
    let mut edges: Vec<(BlockId, BlockId)> = Vec::new();
    for (index, block) in cfg.blocks.iter().enumerate() {
        let Some(&last) = block.instrs.last() else {
            continue;
        };
        let instr = &arena[last];
        match instr.kind {
            InstrKind::Goto => {
                if let Some(Operand::Label(id)) = instr.arg1 {
                    if let Some(&target) = label_block.get(&id) {
                        edges.push((block.id, target));
                    }
                }
            }
            InstrKind::Ifz => {
                if let Some(Operand::Label(id)) = instr.arg2 {
                    if let Some(&target) = label_block.get(&id) {
                        edges.push((block.id, target));
                    }
                }
                if index + 1 < block_count {
                    edges.push((block.id, BlockId::from_usize(index + 1)));
                }
            }
            InstrKind::Return | InstrKind::EndFunction => {}
            _ => {
                if index + 1 < block_count {
                    edges.push((block.id, BlockId::from_usize(index + 1)));
                }
            }
        }
    }

    for (from, to) in edges {
        cfg.blocks[from].successors.push(to);
        cfg.blocks[to].predecessors.push(from);
    }
}

/// Function-extraction partitioning: each top-level segment — a
/// top-level `FUNCTION` through its matching `END_FUNCTION`, or a run of
/// global code between functions — becomes one block. `FUNCTION`
/// increments nesting depth, `END_FUNCTION` decrements it.
///
/// A negative depth (an `END_FUNCTION` with no matching `FUNCTION`) is a
/// structural error in the input TAC; recovery is to free the CFG and
/// return empty, so this returns an empty [`Cfg`] rather than panicking
/// or erroring.
pub fn extract_functions(arena: &IndexVec<InstrId, Instr>, head: Option<InstrId>) -> Cfg {
    let order = walk(arena, head);
    if order.is_empty() {
        return Cfg::empty();
    }

    let mut cfg = Cfg::empty();
    let mut current: Vec<InstrId> = Vec::new();
    let mut depth: i32 = 0;

    for &id in &order {
        let kind = arena[id].kind;
        current.push(id);
        match kind {
            InstrKind::Function => depth += 1,
            InstrKind::EndFunction => {
                depth -= 1;
                if depth < 0 {
                    tracing::error!("unmatched END_FUNCTION: freeing CFG, returning empty");
                    return Cfg::empty();
                }
                if depth == 0 {
                    let block_id = cfg.blocks.next_index();
                    let mut block = BasicBlock::new(block_id);
                    block.instrs = std::mem::take(&mut current);
                    block.is_exit = true;
                    cfg.blocks.push(block);
                }
            }
            _ => {}
        }
    }

    // Trailing global code after the last function (or when there were
    // no functions at all) forms its own segment.
    if !current.is_empty() {
        let block_id = cfg.blocks.next_index();
        let mut block = BasicBlock::new(block_id);
        block.instrs = current;
        cfg.blocks.push(block);
    }

    if !cfg.blocks.is_empty() {
        let entry_id = BlockId::from_usize(0);
        if let Some(block) = cfg.blocks.get_mut(entry_id) {
            block.is_entry = true;
        }
    }
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::Emitter;
    use tacc_lex::Lexer;
    use tacc_par::Parser;

    fn emit(src: &str) -> (IndexVec<InstrId, Instr>, Option<InstrId>) {
        let tokens: Vec<_> = Lexer::new(src).collect();
        let mut parser = Parser::new(&tokens, src, "test.txt");
        let block = parser.parse().unwrap();
        let program = Emitter::new().emit(&block);
        (program.instrs, program.head)
    }

    #[test]
    fn leader_partition_reconstructs_original_order() {
        let (arena, head) = emit("if (a < 10) {\na = a + 1\n}\n");
        let cfg = build_from_tac(&arena, head);
        let reconstructed: Vec<InstrId> =
            cfg.blocks.iter().flat_map(|b| b.instrs.clone()).collect();
        assert_eq!(reconstructed, walk(&arena, head));
    }

    #[test]
    fn leader_partition_starts_block_after_terminator_and_at_label() {
        let (arena, head) = emit("if (a < 10) {\na = a + 1\n}\n");
        let cfg = build_from_tac(&arena, head);
        // cond computation+IFZ, then-body, LABEL L(end) as its own block.
        assert_eq!(cfg.blocks.len(), 3);
        assert!(cfg.blocks.as_slice()[0].is_entry);
    }

    #[test]
    fn leader_partition_wires_ifz_target_and_fallthrough() {
        let (arena, head) = emit("if (a < 10) {\na = a + 1\n}\n");
        let cfg = build_from_tac(&arena, head);
        // block 0: cond + IFZ -> L(end); block 1: then-body (falls through);
        // block 2: LABEL(end).
        let b0 = &cfg.blocks.as_slice()[0];
        assert_eq!(b0.successors, vec![BlockId::from_usize(2), BlockId::from_usize(1)]);
        let b1 = &cfg.blocks.as_slice()[1];
        assert_eq!(b1.successors, vec![BlockId::from_usize(2)]);
        let b2 = &cfg.blocks.as_slice()[2];
        assert_eq!(
            b2.predecessors,
            vec![BlockId::from_usize(0), BlockId::from_usize(1)]
        );
    }

    #[test]
    fn leader_partition_wires_while_loop_back_edge() {
        let (arena, head) = emit("while (x) {\nx = x - 1\n}\n");
        let cfg = build_from_tac(&arena, head);
        // block 0: LABEL(start) + cond + IFZ -> L(end) (the label only
        // forces a split at its own start, so it fuses with the
        // following straight-line cond/IFZ code); block 1: body +
        // GOTO(start); block 2: LABEL(end).
        assert_eq!(cfg.blocks.len(), 3);
        let body = &cfg.blocks.as_slice()[1];
        assert_eq!(body.successors, vec![BlockId::from_usize(0)]);
        let start = &cfg.blocks.as_slice()[0];
        assert_eq!(start.predecessors, vec![BlockId::from_usize(1)]);
        assert_eq!(
            start.successors,
            vec![BlockId::from_usize(2), BlockId::from_usize(1)]
        );
    }

    #[test]
    fn function_extraction_groups_whole_function_as_one_block() {
        let (arena, head) = emit("fn add(a, b) {\nreturn a + b\n}\n");
        let cfg = extract_functions(&arena, head);
        assert_eq!(cfg.blocks.len(), 1);
        assert!(cfg.blocks.as_slice()[0].is_exit);
        assert_eq!(cfg.blocks.as_slice()[0].instrs.len(), walk(&arena, head).len());
    }

    #[test]
    fn function_extraction_separates_global_code_from_functions() {
        let (arena, head) = emit("def x = 1\nfn add(a, b) {\nreturn a + b\n}\n");
        let cfg = extract_functions(&arena, head);
        assert_eq!(cfg.blocks.len(), 2);
    }

    #[test]
    fn empty_program_yields_empty_cfg() {
        let (arena, head) = emit("");
        assert!(build_from_tac(&arena, head).blocks.is_empty());
        assert!(extract_functions(&arena, head).blocks.is_empty());
    }
}
