//! Recursive-descent parser with Pratt-style expression parsing.
//!
//! This `Parser` never prints a diagnostic or calls `process::exit`
//! itself: it returns `Result<_, ParseError>` and leaves
//! formatting/printing/exiting to the binary (`tacc-drv`), the workspace's
//! only `std::process::exit` call site.

use thiserror::Error;

use tacc_lex::{Token, TokenKind};
use tacc_util::{diagnostic, Span, Symbol};

use crate::ast::{BinOp, Block, Expr, Stmt, UnOp};

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{file}:{line}:{column}: parse error:")]
pub struct ParseError {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub source_line: String,
    pub expected: TokenKind,
    pub actual: Token,
}

impl ParseError {
    /// Render the stderr diagnostic body (source line, caret, expected
    /// vs. actual token), minus the leading `file:line:col: parse error:`
    /// line (callers prepend that themselves using the `Display` impl
    /// above, since `thiserror` already produces it).
    pub fn render_body(&self) -> String {
        let caret = diagnostic::render_caret(&self.source_line, self.column);
        format!(
            "{caret}\n    Expected token: {:?}\n    Actual token  : {:?} ('{}')",
            self.expected, self.actual.kind, self.actual.lexeme
        )
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;

pub struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
    source: &'a str,
    file_name: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], source: &'a str, file_name: &'a str) -> Self {
        Self {
            tokens,
            position: 0,
            source,
            file_name,
        }
    }

    /// Parse the full token sequence as a program: `statement* EOF`.
    /// Consumes exactly one trailing `EOF`.
    pub fn parse(&mut self) -> Result<Block> {
        let start_span = self.current().map(token_span).unwrap_or(Span::DUMMY);
        let stmts = self.parse_stmts_until_boundary()?;
        let end_span = self.current().map(token_span).unwrap_or(start_span);
        self.expect(TokenKind::Eof)?;
        Ok(Block {
            stmts,
            span: start_span.merge(end_span),
        })
    }

    /// Parse statements until the slice is exhausted or an `EOF` is seen.
    /// Used both by [`Self::parse`] (whose slice ends with `EOF`) and by
    /// sub-parsers over a brace-delimited range (whose slice has no `EOF`
    /// at all) — see [`Self::parse_block`].
    fn parse_stmts_until_boundary(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while self.position < self.tokens.len() && !self.check(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement()? {
                stmts.push(stmt);
            }
        }
        Ok(stmts)
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn current_kind(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn peek_kind(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.position + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    fn advance(&mut self) -> Token {
        let tok = self
            .current()
            .cloned()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, "", 0, 0));
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(kind))
        }
    }

    fn error(&self, expected: TokenKind) -> ParseError {
        let actual = self
            .current()
            .cloned()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, "", 0, 0));
        let source_line = diagnostic::source_line(self.source, actual.line.max(1)).to_string();
        ParseError {
            file: self.file_name.to_string(),
            line: actual.line,
            column: actual.column,
            source_line,
            expected,
            actual,
        }
    }

    // ---- statements ----

    fn parse_statement(&mut self) -> Result<Option<Stmt>> {
        match self.current_kind() {
            TokenKind::Define => self.parse_declaration().map(Some),
            TokenKind::If => self.parse_if().map(Some),
            TokenKind::While => self.parse_while().map(Some),
            TokenKind::Return => self.parse_return().map(Some),
            TokenKind::Function => self.parse_function_def().map(Some),
            TokenKind::BraceOpen => self.parse_block().map(|b| Some(Stmt::Block(b))),
            TokenKind::EndOfLine => {
                self.advance();
                Ok(None)
            }
            TokenKind::Identifier => self.parse_identifier_led_statement().map(Some),
            TokenKind::Number | TokenKind::ParenOpen => self.parse_expr_statement().map(Some),
            TokenKind::Operator if is_prefix_operator(self.current().unwrap()) => {
                self.parse_expr_statement().map(Some)
            }
            _ => Err(self.error(TokenKind::Define)),
        }
    }

    fn parse_declaration(&mut self) -> Result<Stmt> {
        let start = self.expect(TokenKind::Define)?;
        let name_tok = self.expect(TokenKind::Identifier)?;
        let var = Symbol::intern(&name_tok.lexeme);
        self.expect_operator("=")?;
        let init = self.parse_expr(0)?;
        let end = self.expect(TokenKind::EndOfLine)?;
        Ok(Stmt::Declaration {
            var,
            init: Some(init),
            span: token_span(&start).merge(token_span(&end)),
        })
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        let start = self.expect(TokenKind::If)?;
        self.expect(TokenKind::ParenOpen)?;
        let cond = self.parse_expr(0)?;
        self.expect(TokenKind::ParenClose)?;
        let then_block = self.parse_block()?;
        let mut span = token_span(&start).merge(then_block.span);
        let else_block = if self.check(TokenKind::Else) {
            self.advance();
            let block = self.parse_block()?;
            span = span.merge(block.span);
            Some(block)
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_block,
            else_block,
            span,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt> {
        let start = self.expect(TokenKind::While)?;
        self.expect(TokenKind::ParenOpen)?;
        let cond = self.parse_expr(0)?;
        self.expect(TokenKind::ParenClose)?;
        let body = self.parse_block()?;
        let span = token_span(&start).merge(body.span);
        Ok(Stmt::While { cond, body, span })
    }

    fn parse_return(&mut self) -> Result<Stmt> {
        let start = self.expect(TokenKind::Return)?;
        let value = if self.check(TokenKind::EndOfLine) {
            None
        } else {
            Some(self.parse_expr(0)?)
        };
        let end = self.expect(TokenKind::EndOfLine)?;
        Ok(Stmt::Return {
            value,
            span: token_span(&start).merge(token_span(&end)),
        })
    }

    fn parse_function_def(&mut self) -> Result<Stmt> {
        let start = self.expect(TokenKind::Function)?;
        let name_tok = self.expect(TokenKind::Identifier)?;
        let name = Symbol::intern(&name_tok.lexeme);
        let params = self.parse_param_list()?;
        let body = self.parse_block()?;
        let span = token_span(&start).merge(body.span);
        Ok(Stmt::Function {
            name,
            params,
            body,
            span,
        })
    }

    fn parse_param_list(&mut self) -> Result<Vec<Symbol>> {
        self.expect(TokenKind::ParenOpen)?;
        let mut params = Vec::new();
        while !self.check(TokenKind::ParenClose) {
            let tok = self.expect(TokenKind::Identifier)?;
            params.push(Symbol::intern(&tok.lexeme));
            if self.check(TokenKind::Comma) {
                self.advance();
            }
        }
        self.expect(TokenKind::ParenClose)?;
        Ok(params)
    }

    fn parse_arg_list(&mut self) -> Result<Vec<Expr>> {
        self.expect(TokenKind::ParenOpen)?;
        let mut args = Vec::new();
        while !self.check(TokenKind::ParenClose) {
            args.push(self.parse_expr(0)?);
            if self.check(TokenKind::Comma) {
                self.advance();
            }
        }
        self.expect(TokenKind::ParenClose)?;
        Ok(args)
    }

    /// `IDENT` is ambiguous at statement start: a following `=` is an
    /// assignment, a following `(` is a call used as an expression
    /// statement, anything else is a plain expression statement (a bare
    /// variable reference on its own line).
    fn parse_identifier_led_statement(&mut self) -> Result<Stmt> {
        if self.peek_kind(1) == TokenKind::Operator
            && self.tokens[self.position + 1].lexeme == "="
        {
            return self.parse_assignment();
        }
        self.parse_expr_statement()
    }

    fn parse_assignment(&mut self) -> Result<Stmt> {
        let name_tok = self.expect(TokenKind::Identifier)?;
        let var = Symbol::intern(&name_tok.lexeme);
        self.expect_operator("=")?;
        let value = self.parse_expr(0)?;
        let end = self.expect(TokenKind::EndOfLine)?;
        Ok(Stmt::Assignment {
            var,
            value,
            span: token_span(&name_tok).merge(token_span(&end)),
        })
    }

    fn parse_expr_statement(&mut self) -> Result<Stmt> {
        let expr = self.parse_expr(0)?;
        let start_span = expr.span();
        let end = self.expect(TokenKind::EndOfLine)?;
        Ok(Stmt::Expr {
            span: start_span.merge(token_span(&end)),
            expr,
        })
    }

    /// Locates the matching `}` by brace-depth scanning, hands the
    /// strictly-interior token range to a fresh sub-parser that shares
    /// this parser's `source`/`file_name` but borrows only its own
    /// slice of `tokens` as a borrowed view, then advances this parser's
    /// own cursor past the slice's end after the sub-parse completes.
    fn parse_block(&mut self) -> Result<Block> {
        let open = self.expect(TokenKind::BraceOpen)?;
        let inner_start = self.position;
        let mut depth = 1usize;
        let mut i = inner_start;
        while i < self.tokens.len() {
            match self.tokens[i].kind {
                TokenKind::BraceOpen => depth += 1,
                TokenKind::BraceClose => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        if depth != 0 {
            // Unclosed brace: point the diagnostic at the opener.
            self.position = inner_start.saturating_sub(1);
            return Err(self.error(TokenKind::BraceClose));
        }
        let match_index = i;
        let inner_tokens = &self.tokens[inner_start..match_index];
        let mut sub = Parser::new(inner_tokens, self.source, self.file_name);
        let stmts = sub.parse_stmts_until_boundary()?;
        self.position = match_index;
        let close = self.expect(TokenKind::BraceClose)?;
        Ok(Block {
            stmts,
            span: token_span(&open).merge(token_span(&close)),
        })
    }

    // ---- expressions (Pratt) ----

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expr> {
        let mut lhs = self.parse_prefix()?;
        loop {
            let Some(tok) = self.current().cloned() else {
                break;
            };
            let Some((l_bp, r_bp)) = infix_binding_power(&tok) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }
            let Some(op) = token_to_binop(&tok) else {
                return Err(self.error(TokenKind::Operator));
            };
            self.advance();
            let rhs = self.parse_expr(r_bp)?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr> {
        match self.current_kind() {
            TokenKind::Number => {
                let tok = self.advance();
                let value: i64 = tok.lexeme.parse().map_err(|_| ParseError {
                    file: self.file_name.to_string(),
                    line: tok.line,
                    column: tok.column,
                    source_line: diagnostic::source_line(self.source, tok.line).to_string(),
                    expected: TokenKind::Number,
                    actual: tok.clone(),
                })?;
                Ok(Expr::Literal {
                    value,
                    span: token_span(&tok),
                })
            }
            TokenKind::Identifier if self.peek_kind(1) == TokenKind::ParenOpen => {
                let name_tok = self.advance();
                let callee = Symbol::intern(&name_tok.lexeme);
                let args = self.parse_arg_list()?;
                let end_span = self
                    .tokens
                    .get(self.position.saturating_sub(1))
                    .map(token_span)
                    .unwrap_or_else(|| token_span(&name_tok));
                Ok(Expr::Call {
                    callee,
                    args,
                    span: token_span(&name_tok).merge(end_span),
                })
            }
            TokenKind::Identifier => {
                let tok = self.advance();
                Ok(Expr::Variable {
                    name: Symbol::intern(&tok.lexeme),
                    span: token_span(&tok),
                })
            }
            TokenKind::Operator if is_prefix_operator(self.current().unwrap()) => {
                let tok = self.advance();
                let op = match tok.lexeme.as_str() {
                    "-" => UnOp::Neg,
                    "!" => UnOp::Not,
                    _ => unreachable!("is_prefix_operator guards this"),
                };
                let r_bp = match op {
                    UnOp::Neg => 5,
                    UnOp::Not => 6,
                };
                let operand = self.parse_expr(r_bp)?;
                let span = token_span(&tok).merge(operand.span());
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                    span,
                })
            }
            TokenKind::ParenOpen => {
                self.advance();
                let inner = self.parse_expr(0)?;
                self.expect(TokenKind::ParenClose)?;
                Ok(inner)
            }
            _ => Err(self.error(TokenKind::Number)),
        }
    }

    fn expect_operator(&mut self, lexeme: &str) -> Result<Token> {
        if self.check(TokenKind::Operator) && self.current().unwrap().lexeme == lexeme {
            Ok(self.advance())
        } else {
            Err(self.error(TokenKind::Operator))
        }
    }
}

/// `Token` carries only line/column, with no byte-offset field, so
/// `start`/`end` here are a column-relative
/// approximation, not true buffer offsets. `Span::merge` only ever
/// receives its arguments in source order in this module, and ties
/// resolve to the left operand, so the approximation never produces a
/// wrong line/column — only `start`/`end` are inexact across lines.
fn token_span(tok: &Token) -> Span {
    let start = (tok.column.saturating_sub(1)) as usize;
    Span::new(start, start + tok.lexeme.len(), tok.line, tok.column)
}

fn is_prefix_operator(tok: &Token) -> bool {
    tok.kind == TokenKind::Operator && (tok.lexeme == "-" || tok.lexeme == "!")
}

/// Left/right binding powers for each infix operator. Both `OPERATOR` and
/// `COMPARISON` tokens carry operators (comparisons get their own token
/// kind rather than being lexed as plain `OPERATOR`), so both kinds are
/// consulted here. `LOGICAL` tokens (`&&`, `||`) have no entry: they are
/// lexed but this grammar has no production that consumes them.
fn infix_binding_power(tok: &Token) -> Option<(u8, u8)> {
    match tok.kind {
        TokenKind::Operator | TokenKind::Comparison => {}
        _ => return None,
    }
    Some(match tok.lexeme.as_str() {
        "*" | "/" => (7, 8),
        "+" | "-" => (5, 6),
        "<" | ">" | "<=" | ">=" | "==" | "!=" => (3, 4),
        // `=` is right-associative at the lowest precedence in the table,
        // but it is unreachable via this grammar: assignment is parsed at
        // the statement level before any call to `parse_expr` ever sees
        // it as the current token.
        "=" => (1, 2),
        _ => return None,
    })
}

fn token_to_binop(tok: &Token) -> Option<BinOp> {
    Some(match tok.lexeme.as_str() {
        "+" => BinOp::Add,
        "-" => BinOp::Sub,
        "*" => BinOp::Mul,
        "/" => BinOp::Div,
        "<" => BinOp::Lt,
        ">" => BinOp::Gt,
        "<=" => BinOp::Leq,
        ">=" => BinOp::Geq,
        "==" => BinOp::Eq,
        "!=" => BinOp::Neq,
        _ => return None,
    })
}
