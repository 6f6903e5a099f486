//! AST-to-TAC lowering.
//!
//! One [`Emitter`] lowers exactly one program. It owns the instruction
//! arena and a single counter shared between temporaries and labels,
//! threading `&mut self` through the recursive descent rather than
//! passing the counter by a separate reference.

use tacc_par::ast::{Block, Expr, Stmt};

use crate::instr::{Chain, Instr, InstrId, InstrKind, Op};
use crate::operand::Operand;
use tacc_util::index_vec::IndexVec;

/// The lowered form of a program: every instruction this emitter
/// produced, plus the id of the first one. `None` means the program had
/// no statements at all.
pub struct Program {
    pub instrs: IndexVec<InstrId, Instr>,
    pub head: Option<InstrId>,
}

pub struct Emitter {
    arena: IndexVec<InstrId, Instr>,
    counter: u32,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            arena: IndexVec::new(),
            counter: 0,
        }
    }

    pub fn emit(mut self, program: &Block) -> Program {
        let chain = self.lower_block(program);
        Program {
            instrs: self.arena,
            head: chain.head,
        }
    }

    fn alloc(&mut self) -> u32 {
        let id = self.counter;
        self.counter += 1;
        id
    }

    fn push(&mut self, instr: Instr) -> InstrId {
        self.arena.push(instr)
    }

    /// Link a freshly allocated instruction onto the end of `chain`.
    fn append(&mut self, chain: Chain, id: InstrId) -> Chain {
        match chain.tail {
            Some(tail) => {
                self.arena[tail].next = Some(id);
                Chain {
                    head: chain.head,
                    tail: Some(id),
                }
            }
            None => Chain::one(id),
        }
    }

    /// Splice `b` onto the end of `a` in O(1) using the explicit tail
    /// pointer, rather than walking the list to find the end.
    fn concat(&mut self, a: Chain, b: Chain) -> Chain {
        match (a.tail, b.head) {
            (Some(tail), Some(head)) => {
                self.arena[tail].next = Some(head);
                Chain {
                    head: a.head,
                    tail: b.tail,
                }
            }
            (None, _) => b,
            (_, None) => a,
        }
    }

    fn lower_block(&mut self, block: &Block) -> Chain {
        let mut chain = Chain::empty();
        for stmt in &block.stmts {
            let stmt_chain = self.lower_stmt(stmt);
            chain = self.concat(chain, stmt_chain);
        }
        chain
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> Chain {
        match stmt {
            Stmt::Declaration { var, init, .. } => match init {
                None => {
                    let id = self.push(Instr::new(InstrKind::Define).dst(Operand::Var(*var)));
                    Chain::one(id)
                }
                Some(expr) => {
                    let (chain, operand) = self.lower_operand_bare(expr);
                    let id = self.push(
                        Instr::new(InstrKind::Define)
                            .dst(Operand::Var(*var))
                            .arg1(operand),
                    );
                    self.append(chain, id)
                }
            },
            Stmt::Assignment { var, value, .. } => {
                let (chain, operand) = self.lower_operand_bare(value);
                if chain.is_empty() {
                    let id = self.push(
                        Instr::new(InstrKind::Copy)
                            .dst(Operand::Var(*var))
                            .arg1(operand),
                    );
                    Chain::one(id)
                } else {
                    // Retarget: fuse the assignment into the last
                    // computed instruction instead of emitting an
                    // extra COPY.
                    let tail = chain.tail.expect("non-empty chain has a tail");
                    self.arena[tail].dst = Some(Operand::Var(*var));
                    chain
                }
            }
            Stmt::If {
                cond,
                then_block,
                else_block,
                ..
            } => {
                let (cond_chain, cond_operand) = self.lower_expr(cond);
                let l_then = self.alloc();
                let ifz_id = self.push(
                    Instr::new(InstrKind::Ifz)
                        .arg1(cond_operand)
                        .arg2(Operand::Label(l_then)),
                );
                let mut chain = self.append(cond_chain, ifz_id);

                let then_chain = self.lower_block(then_block);
                chain = self.concat(chain, then_chain);

                match else_block {
                    Some(else_block) => {
                        let l_end = self.alloc();
                        let goto_id =
                            self.push(Instr::new(InstrKind::Goto).arg1(Operand::Label(l_end)));
                        chain = self.append(chain, goto_id);

                        let label_then =
                            self.push(Instr::new(InstrKind::Label).dst(Operand::Label(l_then)));
                        chain = self.append(chain, label_then);

                        let else_chain = self.lower_block(else_block);
                        chain = self.concat(chain, else_chain);

                        let label_end =
                            self.push(Instr::new(InstrKind::Label).dst(Operand::Label(l_end)));
                        chain = self.append(chain, label_end);
                    }
                    None => {
                        let label_then =
                            self.push(Instr::new(InstrKind::Label).dst(Operand::Label(l_then)));
                        chain = self.append(chain, label_then);
                    }
                }
                chain
            }
            Stmt::While { cond, body, .. } => {
                let l_start = self.alloc();
                let label_start =
                    self.push(Instr::new(InstrKind::Label).dst(Operand::Label(l_start)));
                let mut chain = Chain::one(label_start);

                let (cond_chain, cond_operand) = self.lower_expr(cond);
                chain = self.concat(chain, cond_chain);

                let l_end = self.alloc();
                let ifz_id = self.push(
                    Instr::new(InstrKind::Ifz)
                        .arg1(cond_operand)
                        .arg2(Operand::Label(l_end)),
                );
                chain = self.append(chain, ifz_id);

                let body_chain = self.lower_block(body);
                chain = self.concat(chain, body_chain);

                let goto_id =
                    self.push(Instr::new(InstrKind::Goto).arg1(Operand::Label(l_start)));
                chain = self.append(chain, goto_id);

                let label_end =
                    self.push(Instr::new(InstrKind::Label).dst(Operand::Label(l_end)));
                self.append(chain, label_end)
            }
            Stmt::Return { value, .. } => match value {
                None => {
                    let id = self.push(Instr::new(InstrKind::Return));
                    Chain::one(id)
                }
                Some(expr) => {
                    let (chain, operand) = self.lower_expr(expr);
                    let id = self.push(Instr::new(InstrKind::Return).arg1(operand));
                    self.append(chain, id)
                }
            },
            Stmt::Function {
                name, params, body, ..
            } => {
                let fn_id =
                    self.push(Instr::new(InstrKind::Function).arg1(Operand::Var(*name)));
                let mut chain = Chain::one(fn_id);
                for param in params {
                    let id = self.push(Instr::new(InstrKind::Param).arg1(Operand::Var(*param)));
                    chain = self.append(chain, id);
                }
                let body_chain = self.lower_block(body);
                chain = self.concat(chain, body_chain);
                let end_id = self.push(Instr::new(InstrKind::EndFunction));
                self.append(chain, end_id)
            }
            Stmt::Expr { expr, .. } => self.lower_expr(expr).0,
            Stmt::Block(block) => self.lower_block(block),
        }
    }

    /// Fully lower `expr`, always materializing the result in a
    /// temporary — used for `BinaryOp`/`UnaryOp` sub-operands, `Call`
    /// arguments, and `Return` values, none of which get a
    /// bare-literal/variable shortcut.
    fn lower_expr(&mut self, expr: &Expr) -> (Chain, Operand) {
        match expr {
            Expr::Literal { value, .. } => {
                let t = self.alloc();
                let id = self.push(
                    Instr::new(InstrKind::Copy)
                        .dst(Operand::Temp(t))
                        .arg1(Operand::Literal(*value)),
                );
                (Chain::one(id), Operand::Temp(t))
            }
            Expr::Variable { name, .. } => {
                let t = self.alloc();
                let id = self.push(
                    Instr::new(InstrKind::Copy)
                        .dst(Operand::Temp(t))
                        .arg1(Operand::Var(*name)),
                );
                (Chain::one(id), Operand::Temp(t))
            }
            Expr::Unary { op, operand, .. } => {
                let (chain, inner) = self.lower_expr(operand);
                let t = self.alloc();
                let id = self.push(
                    Instr::new(InstrKind::UnaryOp)
                        .dst(Operand::Temp(t))
                        .arg1(inner)
                        .op(Op::Un(*op)),
                );
                (self.append(chain, id), Operand::Temp(t))
            }
            Expr::Binary {
                op, left, right, ..
            } => {
                let (lchain, lop) = self.lower_expr(left);
                let (rchain, rop) = self.lower_expr(right);
                let chain = self.concat(lchain, rchain);
                let t = self.alloc();
                let id = self.push(
                    Instr::new(InstrKind::BinaryOp)
                        .dst(Operand::Temp(t))
                        .arg1(lop)
                        .arg2(rop)
                        .op(Op::Bin(*op)),
                );
                (self.append(chain, id), Operand::Temp(t))
            }
            Expr::Call { callee, args, .. } => {
                let mut chain = Chain::empty();
                for arg in args {
                    let (arg_chain, arg_operand) = self.lower_expr(arg);
                    chain = self.concat(chain, arg_chain);
                    let param_id = self.push(Instr::new(InstrKind::Param).arg1(arg_operand));
                    chain = self.append(chain, param_id);
                }
                let t = self.alloc();
                let call_id = self.push(
                    Instr::new(InstrKind::Call)
                        .dst(Operand::Temp(t))
                        .arg1(Operand::Var(*callee))
                        .arg2(Operand::Literal(args.len() as i64)),
                );
                (self.append(chain, call_id), Operand::Temp(t))
            }
        }
    }

    /// Used only for a `Declaration` initializer or an `Assignment`
    /// value: a bare `Literal`/`Variable` is embedded directly with no
    /// instructions emitted at all (`DEFINE var = literal/var`, or a
    /// direct `COPY` for a bare assignment RHS). Anything else falls
    /// back to the full materializing lowering.
    fn lower_operand_bare(&mut self, expr: &Expr) -> (Chain, Operand) {
        match expr {
            Expr::Literal { value, .. } => (Chain::empty(), Operand::Literal(*value)),
            Expr::Variable { name, .. } => (Chain::empty(), Operand::Var(*name)),
            _ => self.lower_expr(expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tacc_lex::Lexer;
    use tacc_par::Parser;

    fn emit_src(src: &str) -> Program {
        let tokens: Vec<_> = Lexer::new(src).collect();
        let mut parser = Parser::new(&tokens, src, "test.txt");
        let block = parser.parse().unwrap();
        Emitter::new().emit(&block)
    }

    fn kinds(program: &Program) -> Vec<InstrKind> {
        let mut out = Vec::new();
        let mut cur = program.head;
        while let Some(id) = cur {
            out.push(program.instrs[id].kind);
            cur = program.instrs[id].next;
        }
        out
    }

    #[test]
    fn declaration_with_binary_initializer() {
        let program = emit_src("def x = 1 + 2\n");
        assert_eq!(
            kinds(&program),
            vec![
                InstrKind::Copy,
                InstrKind::Copy,
                InstrKind::BinaryOp,
                InstrKind::Define,
            ]
        );
        let last = program.instrs[program.head.unwrap()].next.unwrap();
        let last = program.instrs[last].next.unwrap();
        let last = program.instrs[last].next.unwrap();
        assert_eq!(program.instrs[last].kind, InstrKind::Define);
        assert_eq!(
            program.instrs[last].arg1,
            Some(Operand::Temp(2)),
            "DEFINE should reference the binary op's temp"
        );
    }

    #[test]
    fn assignment_retargets_final_instruction() {
        let program = emit_src("x = x + 1\n");
        // t0 <- x; t1 <- 1; x <- t0 + t1 (retargeted, no extra COPY)
        assert_eq!(
            kinds(&program),
            vec![InstrKind::Copy, InstrKind::Copy, InstrKind::BinaryOp]
        );
        let first = program.head.unwrap();
        let second = program.instrs[first].next.unwrap();
        let third = program.instrs[second].next.unwrap();
        assert!(program.instrs[third].next.is_none());
        assert!(matches!(program.instrs[third].dst, Some(Operand::Var(_))));
    }

    #[test]
    fn bare_assignment_emits_direct_copy() {
        let program = emit_src("x = 5\n");
        assert_eq!(kinds(&program), vec![InstrKind::Copy]);
        let id = program.head.unwrap();
        assert_eq!(program.instrs[id].arg1, Some(Operand::Literal(5)));
    }

    #[test]
    fn function_emits_param_then_body_then_end() {
        let program = emit_src("fn add(a, b) {\nreturn a + b\n}\n");
        assert_eq!(
            kinds(&program),
            vec![
                InstrKind::Function,
                InstrKind::Param,
                InstrKind::Param,
                InstrKind::Copy,
                InstrKind::Copy,
                InstrKind::BinaryOp,
                InstrKind::Return,
                InstrKind::EndFunction,
            ]
        );
    }

    #[test]
    fn call_materializes_each_argument() {
        let program = emit_src("add(1, 2)\n");
        assert_eq!(
            kinds(&program),
            vec![
                InstrKind::Copy,
                InstrKind::Param,
                InstrKind::Copy,
                InstrKind::Param,
                InstrKind::Call,
            ]
        );
    }

    #[test]
    fn while_loop_wires_labels_and_goto() {
        let program = emit_src("while (x) {\nx = x - 1\n}\n");
        assert_eq!(
            kinds(&program),
            vec![
                InstrKind::Label,
                InstrKind::Copy,
                InstrKind::Ifz,
                InstrKind::Copy,
                InstrKind::Copy,
                InstrKind::BinaryOp,
                InstrKind::Goto,
                InstrKind::Label,
            ]
        );
    }
}
