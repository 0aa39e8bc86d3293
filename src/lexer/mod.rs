// SPDX-License-Identifier: MIT

//! Implements tokenization of the query input.
//!
//! Scanning happens in two layers: a [`logos`]-derived raw pass over
//! single lexemes, and a cooking pass that assembles the composite tokens
//! the grammar works with. Cooking is where `field:value` fragments are
//! fused (tolerating whitespace around the `:`), quoted values are inlined
//! unescaped, keywords are recognized, and a leading `-` becomes `NOT`.

mod token;

use logos::Logos;
use text_size::{TextRange, TextSize};

use crate::analyze::{ErrorKind, ValidationError};
pub(crate) use token::RawKind;
pub use token::{Token, TokenKind};

/// Tokenizes the whole input.
///
/// Empty and whitespace-only input produce an empty token list. The only
/// fatal condition is an unterminated quoted string, reported at the
/// opening quote and spanning every consumed character.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ValidationError> {
    Lexer::new(input).cook()
}

struct RawToken<'a> {
    kind: RawKind,
    text: &'a str,
    range: TextRange,
}

pub(crate) struct Lexer<'a> {
    raw: Vec<RawToken<'a>>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        let mut inner = RawKind::lexer(input);
        let mut raw = Vec::new();
        while let Some(kind) = inner.next() {
            // The rule set is total over the input alphabet; anything it
            // did not claim scans like a word.
            let kind = kind.unwrap_or(RawKind::Word);
            let span = inner.span();
            let range = TextRange::new(
                TextSize::try_from(span.start).unwrap(),
                TextSize::try_from(span.end).unwrap(),
            );
            raw.push(RawToken {
                kind,
                text: inner.slice(),
                range,
            });
        }
        Self { raw, pos: 0 }
    }

    fn cook(mut self) -> Result<Vec<Token>, ValidationError> {
        let mut tokens = Vec::new();
        while self.pos < self.raw.len() {
            match self.raw[self.pos].kind {
                RawKind::Whitespace => self.pos += 1,
                RawKind::LParen => {
                    let tok = &self.raw[self.pos];
                    tokens.push(Token::new(TokenKind::LParen, tok.text, tok.range));
                    self.pos += 1;
                }
                RawKind::RParen => {
                    let tok = &self.raw[self.pos];
                    tokens.push(Token::new(TokenKind::RParen, tok.text, tok.range));
                    self.pos += 1;
                }
                RawKind::Quoted => {
                    let tok = &self.raw[self.pos];
                    tokens.push(Token::new(
                        TokenKind::QuotedString,
                        unescape(tok.text),
                        tok.range,
                    ));
                    self.pos += 1;
                }
                RawKind::UnterminatedQuote => {
                    let tok = &self.raw[self.pos];
                    return Err(ValidationError::new(
                        ErrorKind::UnterminatedString,
                        tok.range,
                    ));
                }
                RawKind::Minus if self.at_negation_position() => {
                    let tok = &self.raw[self.pos];
                    tokens.push(Token::new(TokenKind::Not, tok.text, tok.range));
                    self.pos += 1;
                }
                RawKind::Word | RawKind::Colon | RawKind::Minus => {
                    let composite = self.scan_composite()?;
                    tokens.push(composite);
                }
            }
        }
        Ok(tokens)
    }

    /// `-` negates only at input start or right after whitespace; anywhere
    /// else it is an ordinary word character.
    fn at_negation_position(&self) -> bool {
        self.pos == 0 || self.raw[self.pos - 1].kind == RawKind::Whitespace
    }

    /// Scans a bare word together with everything that fuses onto it: the
    /// run of directly adjacent word/`:`/`-` lexemes, plus a
    /// whitespace-tolerant `field : value` tail. Returns a `String` token
    /// unless the cooked value is an unfused keyword.
    fn scan_composite(&mut self) -> Result<Token, ValidationError> {
        let start = self.raw[self.pos].range.start();
        let mut end = start;
        let mut value = String::new();
        self.take_run(&mut value, &mut end);

        if !value.contains(':') {
            // `field : value` — the colon may be separated by whitespace.
            let after_ws = self.peek_past_whitespace();
            if self.raw.get(after_ws).map(|t| t.kind) == Some(RawKind::Colon) {
                self.pos = after_ws;
                value.push(':');
                end = self.raw[self.pos].range.end();
                self.pos += 1;
                self.take_value(&mut value, &mut end)?;
            }
        } else if value.ends_with(':') {
            self.take_value(&mut value, &mut end)?;
        }

        let kind = keyword_kind(&value).unwrap_or(TokenKind::String);
        Ok(Token::new(kind, value, TextRange::new(start, end)))
    }

    /// Consumes the maximal run of directly adjacent word-ish lexemes.
    /// Consecutive raw tokens are always adjacent in the source, so a run
    /// simply extends while the kind matches.
    fn take_run(&mut self, value: &mut String, end: &mut TextSize) {
        while let Some(tok) = self.raw.get(self.pos) {
            match tok.kind {
                RawKind::Word | RawKind::Colon | RawKind::Minus => {
                    value.push_str(tok.text);
                    *end = tok.range.end();
                    self.pos += 1;
                }
                _ => break,
            }
        }
    }

    /// Consumes the value part of a `field:` fusion, if present: optional
    /// whitespace followed by a bare word or a quoted string. Quoted
    /// contents are inlined unquoted. A bare value cannot start with `:`,
    /// but keeps extending through later colons and dashes.
    fn take_value(&mut self, value: &mut String, end: &mut TextSize) -> Result<(), ValidationError> {
        let after_ws = self.peek_past_whitespace();
        match self.raw.get(after_ws).map(|t| t.kind) {
            Some(RawKind::Word) | Some(RawKind::Minus) => {
                self.pos = after_ws;
                self.take_run(value, end);
            }
            Some(RawKind::Quoted) => {
                self.pos = after_ws;
                let tok = &self.raw[self.pos];
                value.push_str(&unescape(tok.text));
                *end = tok.range.end();
                self.pos += 1;
            }
            Some(RawKind::UnterminatedQuote) => {
                let tok = &self.raw[after_ws];
                return Err(ValidationError::new(
                    ErrorKind::UnterminatedString,
                    tok.range,
                ));
            }
            _ => {}
        }
        Ok(())
    }

    fn peek_past_whitespace(&self) -> usize {
        let mut idx = self.pos;
        while self.raw.get(idx).map(|t| t.kind) == Some(RawKind::Whitespace) {
            idx += 1;
        }
        idx
    }
}

fn keyword_kind(value: &str) -> Option<TokenKind> {
    if value.eq_ignore_ascii_case("AND") {
        Some(TokenKind::And)
    } else if value.eq_ignore_ascii_case("OR") {
        Some(TokenKind::Or)
    } else if value.eq_ignore_ascii_case("NOT") {
        Some(TokenKind::Not)
    } else {
        None
    }
}

/// Resolves the cooked contents of a quoted slice: the surrounding quotes
/// are dropped and a backslash escapes whichever character follows it.
fn unescape(quoted: &str) -> String {
    let inner = quoted
        .strip_prefix('"')
        .map(|s| s.strip_suffix('"').unwrap_or(s))
        .unwrap_or(quoted);
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                value.push(escaped);
            }
        } else {
            value.push(c);
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use expect_test::{expect, Expect};
    use pretty_assertions::assert_eq;

    use super::*;

    fn check(input: &str, expected: Expect) {
        let tokens = tokenize(input).unwrap();
        let dump = tokens
            .iter()
            .map(|t| format!("{}@{:?} {:?}\n", t.kind, t.range, t.value))
            .collect::<String>();
        expected.assert_eq(&dump);
    }

    #[test]
    fn empty_input_has_no_tokens() {
        assert_eq!(tokenize("").unwrap(), vec![]);
        assert_eq!(tokenize("   \t\n").unwrap(), vec![]);
    }

    #[test]
    fn bare_words_and_keywords() {
        check(
            "boots AND leather or not",
            expect![[r#"
                String@0..5 "boots"
                And@6..9 "AND"
                String@10..17 "leather"
                Or@18..20 "or"
                Not@21..24 "not"
            "#]],
        );
    }

    #[test]
    fn fuses_field_and_value() {
        check(
            "color:red",
            expect![[r#"
                String@0..9 "color:red"
            "#]],
        );
    }

    #[test]
    fn fuses_across_whitespace() {
        check(
            "color: red",
            expect![[r#"
                String@0..10 "color:red"
            "#]],
        );
        check(
            "color :red",
            expect![[r#"
                String@0..10 "color:red"
            "#]],
        );
        check(
            "color : red",
            expect![[r#"
                String@0..11 "color:red"
            "#]],
        );
    }

    #[test]
    fn fuses_quoted_values_unquoted() {
        check(
            r#"color:"dark red""#,
            expect![[r#"
                String@0..16 "color:dark red"
            "#]],
        );
    }

    #[test]
    fn keeps_trailing_colon_when_value_is_missing() {
        check(
            "field:",
            expect![[r#"
                String@0..6 "field:"
            "#]],
        );
        check(
            "field: (a)",
            expect![[r#"
                String@0..6 "field:"
                LParen@7..8 "("
                String@8..9 "a"
                RParen@9..10 ")"
            "#]],
        );
    }

    #[test]
    fn value_cannot_start_with_a_colon() {
        check(
            "field: :red",
            expect![[r#"
                String@0..6 "field:"
                String@7..11 ":red"
            "#]],
        );
    }

    #[test]
    fn value_is_never_a_keyword() {
        check(
            "tag:AND",
            expect![[r#"
                String@0..7 "tag:AND"
            "#]],
        );
    }

    #[test]
    fn embedded_colons_extend_the_value() {
        check(
            "path:a:b:c",
            expect![[r#"
                String@0..10 "path:a:b:c"
            "#]],
        );
    }

    #[test]
    fn leading_minus_negates() {
        check(
            "boots -leather",
            expect![[r#"
                String@0..5 "boots"
                Not@6..7 "-"
                String@7..14 "leather"
            "#]],
        );
    }

    #[test]
    fn interior_minus_stays_in_the_word() {
        check(
            "t-shirt",
            expect![[r#"
                String@0..7 "t-shirt"
            "#]],
        );
    }

    #[test]
    fn negative_numbers_fuse_into_the_value() {
        check(
            "price:-5",
            expect![[r#"
                String@0..8 "price:-5"
            "#]],
        );
    }

    #[test]
    fn quoted_strings_resolve_escapes() {
        check(
            r#""say \"hi\" now""#,
            expect![[r#"
                QuotedString@0..16 "say \"hi\" now"
            "#]],
        );
    }

    #[test]
    fn parens_are_their_own_tokens() {
        check(
            "(a OR b)",
            expect![[r#"
                LParen@0..1 "("
                String@1..2 "a"
                Or@3..5 "OR"
                String@6..7 "b"
                RParen@7..8 ")"
            "#]],
        );
    }

    #[test]
    fn unterminated_quote_is_fatal() {
        let err = tokenize(r#""unclosed"#).unwrap_err();
        assert_eq!(err.message, "Unterminated quoted string");
        assert_eq!(err.position, 0);
        assert_eq!(err.length, 9);
    }

    #[test]
    fn unterminated_quote_in_value_position() {
        let err = tokenize(r#"field:"unclosed"#).unwrap_err();
        assert_eq!(err.message, "Unterminated quoted string");
        assert_eq!(err.position, 6);
        assert_eq!(err.length, 9);
    }
}
