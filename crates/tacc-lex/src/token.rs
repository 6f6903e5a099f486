//! Token kinds and the `Token` type itself.

use serde::Serialize;

/// The fixed set of lexical categories. Reclassification of `IDENTIFIER`
/// lexemes into keyword kinds happens in [`crate::lexer::Lexer`]; this
/// enum only names the destination kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    Define,
    Function,
    If,
    Else,
    While,
    Return,
    Identifier,
    Number,
    String,
    Operator,
    Comparison,
    Logical,
    ParenOpen,
    ParenClose,
    BraceOpen,
    BraceClose,
    Comma,
    Unknown,
    EndOfLine,
    Eof,
}

/// One lexical token: its kind, its exact source text, and the 1-based
/// line/column of its first byte.
///
/// The `Serialize` shape is exactly `{"type": ..., "value": ..., "line":
/// ..., "col": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub kind: TokenKind,
    #[serde(rename = "value")]
    pub lexeme: String,
    pub line: u32,
    #[serde(rename = "col")]
    pub column: u32,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
            column,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_spec_shape() {
        let t = Token::new(TokenKind::Define, "def", 1, 1);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["type"], "DEFINE");
        assert_eq!(json["value"], "def");
        assert_eq!(json["line"], 1);
        assert_eq!(json["col"], 1);
    }

    #[test]
    fn paren_open_renders_with_underscore() {
        let json = serde_json::to_value(TokenKind::ParenOpen).unwrap();
        assert_eq!(json, "PAREN_OPEN");
    }

    #[test]
    fn eof_renders_uppercase() {
        let json = serde_json::to_value(TokenKind::Eof).unwrap();
        assert_eq!(json, "EOF");
    }
}
