// SPDX-License-Identifier: MIT

//! Implements the first parsing pass over the token stream.
//!
//! The grammar is parsed by precedence climbing with `OR` binding weaker
//! than `AND`; juxtaposition of two terms ("implicit AND") binds like an
//! explicit `AND`. This pass knows nothing about schemas: every bare word
//! and `field:value` fragment becomes a [`FirstPassExpr::String`] leaf
//! whose interpretation is deferred to the analyzer.

use text_size::{TextRange, TextSize};

use crate::analyze::{ErrorKind, ValidationError};
use crate::lexer::{Token, TokenKind};

const PREC_OR: u8 = 1;
const PREC_AND: u8 = 2;

/// Structure-only expression tree produced by the first pass.
///
/// A `String` leaf may still contain an embedded `:`; splitting it into
/// field and value happens in the second pass, so the same tree can be
/// re-analyzed under a different schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirstPassExpr {
    String {
        value: String,
        range: TextRange,
    },
    And {
        left: Box<FirstPassExpr>,
        right: Box<FirstPassExpr>,
        range: TextRange,
    },
    Or {
        left: Box<FirstPassExpr>,
        right: Box<FirstPassExpr>,
        range: TextRange,
    },
    Not {
        inner: Box<FirstPassExpr>,
        range: TextRange,
    },
}

impl FirstPassExpr {
    pub fn range(&self) -> TextRange {
        match self {
            Self::String { range, .. }
            | Self::And { range, .. }
            | Self::Or { range, .. }
            | Self::Not { range, .. } => *range,
        }
    }
}

pub(crate) struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    pub(crate) fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub(crate) fn current(&self) -> TokenKind {
        self.tokens.get(self.pos).map_or(TokenKind::Eof, |t| t.kind)
    }

    pub(crate) fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Range used for diagnostics at the current position; at end of input
    /// this is an empty range after the last token.
    pub(crate) fn current_range(&self) -> TextRange {
        self.tokens.get(self.pos).map_or_else(
            || {
                let end = self
                    .tokens
                    .last()
                    .map_or_else(|| TextSize::from(0u32), |t| t.range.end());
                TextRange::empty(end)
            },
            |t| t.range,
        )
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    /// Parses an expression at the given minimum binding power, folding
    /// explicit operators and implicit adjacency left-associatively.
    pub(crate) fn parse_expression(
        &mut self,
        min_prec: u8,
    ) -> Result<FirstPassExpr, ValidationError> {
        let mut lhs = self.parse_primary()?;

        loop {
            let (prec, is_and, explicit) = match self.current() {
                TokenKind::And => (PREC_AND, true, true),
                TokenKind::Or => (PREC_OR, false, true),
                kind if kind.starts_term() => (PREC_AND, true, false),
                _ => break,
            };
            if prec < min_prec {
                break;
            }

            // The synthetic node of an implicit AND takes the right-hand
            // token's range; explicit operators take their own.
            let range = self.current_range();
            if explicit {
                self.bump();
            }
            let rhs = self.parse_expression(prec + 1)?;
            lhs = if is_and {
                FirstPassExpr::And {
                    left: Box::new(lhs),
                    right: Box::new(rhs),
                    range,
                }
            } else {
                FirstPassExpr::Or {
                    left: Box::new(lhs),
                    right: Box::new(rhs),
                    range,
                }
            };
        }

        Ok(lhs)
    }

    /// Parses a single primary: a parenthesized expression, a string leaf,
    /// or a negation. `NOT` takes a primary rather than an expression, so
    /// `NOT a AND b` parses as `(NOT a) AND b`.
    fn parse_primary(&mut self) -> Result<FirstPassExpr, ValidationError> {
        match self.current() {
            TokenKind::LParen => {
                self.bump();
                let expr = self.parse_expression(0)?;
                if self.current() != TokenKind::RParen {
                    return Err(ValidationError::new(
                        ErrorKind::ExpectedRParen,
                        self.current_range(),
                    ));
                }
                self.bump();
                Ok(expr)
            }
            TokenKind::String | TokenKind::QuotedString => {
                let (value, range) = {
                    let token = &self.tokens[self.pos];
                    (token.value.clone(), token.range)
                };
                self.bump();
                Ok(FirstPassExpr::String { value, range })
            }
            TokenKind::Not => {
                let range = self.current_range();
                self.bump();
                let inner = self.parse_primary()?;
                Ok(FirstPassExpr::Not {
                    inner: Box::new(inner),
                    range,
                })
            }
            TokenKind::And | TokenKind::Or => {
                let keyword = if self.current() == TokenKind::And {
                    "AND"
                } else {
                    "OR"
                };
                Err(ValidationError::new(
                    ErrorKind::ReservedWord(keyword.to_owned()),
                    self.current_range(),
                ))
            }
            TokenKind::RParen => Err(ValidationError::new(
                ErrorKind::UnexpectedRParen,
                self.current_range(),
            )),
            TokenKind::Eof => Err(ValidationError::new(
                ErrorKind::UnexpectedToken("EOF".to_owned()),
                self.current_range(),
            )),
        }
    }
}
