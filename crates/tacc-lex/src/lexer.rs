//! The regex-rule-table lexer.
//!
//! Each rule is a `regex::Regex` anchored with `^` (so `find` only ever
//! matches at the very start of the remaining input — the
//! `debug_assert!` below enforces this), compiled once behind a
//! `once_cell::sync::Lazy` table rather than per-call: regex patterns are
//! compiled once at lexer startup and released at shutdown (release here
//! is simply the `Lazy`'s `Drop`, since Rust's ownership model already
//! guarantees it on every exit path). Position tracking (line/column,
//! one-character-at-a-time advance) lives on the cursor fields below.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::token::{Token, TokenKind};

#[derive(Error, Debug)]
pub enum LexerInitError {
    #[error("failed to compile lexer rule for {kind:?}: {source}")]
    BadPattern {
        kind: TokenKind,
        #[source]
        source: regex::Error,
    },
}

/// Rules in priority order: the first rule whose pattern matches at the
/// cursor wins, so multi-character operators (`COMPARISON`, `LOGICAL`)
/// must precede the single-character `OPERATOR` rule. `COMMA` is required
/// by the parser's `param_list`/`arg_list` grammar, so it is matched as
/// its own single-character rule alongside the other single-character
/// delimiters.
const RULE_SOURCES: &[(TokenKind, &str)] = &[
    (TokenKind::ParenOpen, r"^\("),
    (TokenKind::ParenClose, r"^\)"),
    (TokenKind::BraceOpen, r"^\{"),
    (TokenKind::BraceClose, r"^\}"),
    (TokenKind::Comma, r"^,"),
    (TokenKind::Comparison, r"^(==|!=|<=|>=|<|>)"),
    (TokenKind::Logical, r"^(&&|\|\|)"),
    (TokenKind::Identifier, r"^[A-Za-z_][A-Za-z0-9_]*"),
    (TokenKind::Number, r"^[0-9]+"),
    (TokenKind::String, "^\"[^\"]*\""),
    (TokenKind::Operator, r"^[+\-*/=!]"),
    (TokenKind::EndOfLine, r"^\n"),
];

static RULES: Lazy<Vec<(TokenKind, Regex)>> = Lazy::new(|| {
    RULE_SOURCES
        .iter()
        .map(|(kind, pattern)| {
            let regex = Regex::new(pattern)
                .unwrap_or_else(|e| panic!("lexer rule for {kind:?} failed to compile: {e}"));
            (*kind, regex)
        })
        .collect()
});

fn keyword_kind(lexeme: &str) -> Option<TokenKind> {
    // `while` is a keyword alongside the other control-flow words, not
    // a plain identifier.
    Some(match lexeme {
        "def" => TokenKind::Define,
        "fn" => TokenKind::Function,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "return" => TokenKind::Return,
        _ => return None,
    })
}

/// Produces a `Token` stream from a source buffer. Never fails once
/// constructed: unmatched bytes become `UNKNOWN` tokens rather than
/// lexer errors.
pub struct Lexer<'a> {
    source: &'a str,
    position: usize,
    line: u32,
    column: u32,
    emitted_eof: bool,
}

impl<'a> Lexer<'a> {
    /// Forces compilation of the rule table, surfacing `LexerInitError`
    /// on failure instead of panicking. Every pattern here is a
    /// compile-time literal verified by the author, so this path is
    /// unreachable in practice; it is still typed as fallible because
    /// regex source is data, not a language guarantee.
    pub fn compile_rules() -> Result<(), LexerInitError> {
        for (kind, pattern) in RULE_SOURCES {
            if let Err(source) = Regex::new(pattern) {
                return Err(LexerInitError::BadPattern {
                    kind: *kind,
                    source,
                });
            }
        }
        Ok(())
    }

    pub fn new(source: &'a str) -> Self {
        Lazy::force(&RULES);
        Self {
            source,
            position: 0,
            line: 1,
            column: 1,
            emitted_eof: false,
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.position..]
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    /// Advance the cursor by `len` bytes, updating line/column. `\n`
    /// bumps the line and resets the column; everything else advances
    /// the column by one (byte-counted, matching the original C
    /// implementation's column arithmetic rather than grapheme-aware
    /// UTF-8 column counting).
    fn advance(&mut self, len: usize) {
        for b in self.source[self.position..self.position + len].bytes() {
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.position += len;
    }

    /// Skip a run of `[ \t\r]+`. Deliberately excludes `\n`: a newline is
    /// its own `END_OF_LINE` token, so folding it into whitespace-skipping
    /// would make that rule unreachable.
    fn skip_whitespace(&mut self) {
        let mut skip = 0;
        for b in self.rest().bytes() {
            if b == b' ' || b == b'\t' || b == b'\r' {
                skip += 1;
            } else {
                break;
            }
        }
        if skip > 0 {
            self.advance(skip);
        }
    }

    /// Produce the next token. Returns `None` only to let
    /// `impl Iterator` stop after yielding exactly one `EOF`; callers
    /// normally use the `Iterator` impl instead of calling this
    /// directly.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let line = self.line;
        let column = self.column;

        if self.is_at_end() {
            return Token::new(TokenKind::Eof, "", line, column);
        }

        for (kind, regex) in RULES.iter() {
            if let Some(m) = regex.find(self.rest()) {
                debug_assert_eq!(m.start(), 0, "lexer rules must be anchored at the cursor");
                let len = m.end();
                if len == 0 {
                    continue;
                }
                let lexeme = &self.rest()[..len];
                let resolved_kind = if *kind == TokenKind::Identifier {
                    keyword_kind(lexeme).unwrap_or(TokenKind::Identifier)
                } else {
                    *kind
                };
                let text = lexeme.to_string();
                self.advance(len);
                return Token::new(resolved_kind, text, line, column);
            }
        }

        // No rule matched: consume exactly one byte as UNKNOWN. This
        // assumes ASCII for the unknown-byte path; multi-byte UTF-8
        // sequences that match no rule are reported one byte at a time,
        // which is acceptable since the grammar has no valid use for
        // such bytes anyway.
        let byte = self.rest().as_bytes()[0];
        let lexeme = (byte as char).to_string();
        self.advance(1);
        Token::new(TokenKind::Unknown, lexeme, line, column)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }
        let tok = self.next_token();
        if tok.is_eof() {
            self.emitted_eof = true;
        }
        Some(tok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(src: &str) -> Vec<Token> {
        Lexer::new(src).collect()
    }

    #[test]
    fn keyword_separation() {
        let tokens = lex_all("def fn if else while return x");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Define,
                TokenKind::Function,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::While,
                TokenKind::Return,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn longest_match_on_comparison() {
        let tokens = lex_all("a == b");
        assert_eq!(tokens[1].kind, TokenKind::Comparison);
        assert_eq!(tokens[1].lexeme, "==");
    }

    #[test]
    fn round_trip_column_and_lexeme() {
        let src = "x = 42";
        for tok in lex_all(src) {
            if tok.kind == TokenKind::Eof {
                continue;
            }
            let offset = {
                // recompute byte offset from line/col for a single-line source
                (tok.column - 1) as usize
            };
            assert_eq!(&src[offset..offset + tok.lexeme.len()], tok.lexeme);
        }
    }

    #[test]
    fn newline_produces_end_of_line_token() {
        let tokens = lex_all("def x = 1 + 2\n");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Define,
                TokenKind::Identifier,
                TokenKind::Operator,
                TokenKind::Number,
                TokenKind::Operator,
                TokenKind::Number,
                TokenKind::EndOfLine,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unknown_byte_is_isolated() {
        let tokens = lex_all("@");
        assert_eq!(tokens[0].kind, TokenKind::Unknown);
        assert_eq!(tokens[0].lexeme, "@");
    }

    #[test]
    fn line_and_column_advance_across_newlines() {
        let tokens = lex_all("x\ny");
        let y = tokens.iter().find(|t| t.lexeme == "y").unwrap();
        assert_eq!(y.line, 2);
        assert_eq!(y.column, 1);
    }

    // ------------------------------------------------------------------
    // Property-based tests over arbitrary inputs.
    // ------------------------------------------------------------------

    #[test]
    fn property_arbitrary_identifier_strings() {
        use proptest::prelude::*;

        proptest!(|(input in "[A-Za-z_][A-Za-z0-9_]{0,30}")| {
            let tokens = lex_all(&input);
            // exactly one real token plus the trailing EOF.
            prop_assert_eq!(tokens.len(), 2);
            prop_assert!(
                keyword_kind(&input).map(|k| tokens[0].kind == k).unwrap_or(
                    tokens[0].kind == TokenKind::Identifier
                )
            );
        });
    }

    #[test]
    fn property_arbitrary_decimal_number_strings() {
        use proptest::prelude::*;

        proptest!(|(input in "[0-9]{1,12}")| {
            let tokens = lex_all(&input);
            prop_assert_eq!(tokens.len(), 2);
            prop_assert_eq!(tokens[0].kind, TokenKind::Number);
            prop_assert_eq!(&tokens[0].lexeme, &input);
        });
    }

    #[test]
    fn property_arbitrary_string_literals() {
        use proptest::prelude::*;

        proptest!(|(input in "[^\"\\\\\n]{0,40}")| {
            let source = format!("\"{input}\"");
            let tokens = lex_all(&source);
            prop_assert_eq!(tokens.len(), 2);
            prop_assert_eq!(tokens[0].kind, TokenKind::String);
            prop_assert_eq!(&tokens[0].lexeme, &source);
        });
    }

    #[test]
    fn property_roundtrip_column_holds_for_every_token() {
        use proptest::prelude::*;

        proptest!(|(input in "[A-Za-z_][A-Za-z0-9_ ]{0,40}")| {
            for tok in lex_all(&input) {
                if tok.kind == TokenKind::Eof {
                    continue;
                }
                let offset = (tok.column - 1) as usize;
                prop_assert_eq!(&input[offset..offset + tok.lexeme.len()], &tok.lexeme);
            }
        });
    }
}
