// SPDX-License-Identifier: MIT

//! Token definition for the [`logos`] scanner.

use std::fmt;

use text_size::TextRange;

/// Raw lexemes produced by the first scanning pass.
///
/// Whitespace is kept so the cooking pass in [`crate::lexer`] can tell
/// adjacent lexemes from separated ones: `field : value` fuses across
/// whitespace, while `-` only negates right after it.
#[derive(logos::Logos, Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum RawKind {
    #[regex(r"[ \t\n\r]+")]
    Whitespace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(":")]
    Colon,

    #[token("-")]
    Minus,

    #[regex(r#""([^"\\]|\\.)*""#, priority = 3)]
    Quoted,

    // An opening quote whose closing partner never arrives.
    #[regex(r#""([^"\\]|\\.)*"#, priority = 2)]
    UnterminatedQuote,

    #[regex(r#"[^ \t\n\r"():-][^ \t\n\r"():]*"#)]
    Word,
}

/// Cooked token kinds handed to the parser.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A bare word or a fused `field:value` fragment.
    String,
    /// The contents of a balanced double-quoted string, escapes resolved.
    QuotedString,
    LParen,
    RParen,
    And,
    Or,
    Not,
    /// Marker token to indicate end of input, not produced by the lexer.
    Eof,
}

impl TokenKind {
    /// Returns true for tokens that can begin a primary expression. After a
    /// complete expression such a token reads as an implicit AND.
    pub fn starts_term(self) -> bool {
        matches!(
            self,
            Self::String | Self::QuotedString | Self::LParen | Self::Not
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A cooked token together with its raw source range.
///
/// `value` is the cooked text: quoted strings are unquoted with escapes
/// resolved, and fused `field:value` fragments are normalized to a single
/// `:` with no surrounding whitespace. `range` always covers the raw source
/// span, quotes and escapes included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub range: TextRange,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, value: impl Into<String>, range: TextRange) -> Self {
        Self {
            kind,
            value: value.into(),
            range,
        }
    }
}
