// SPDX-License-Identifier: MIT

//! Implements the typed AST for search queries.
//!
//! Every node carries the source span it was parsed from; spans serialize
//! as `{position, length}` so an editor can underline nodes without
//! re-deriving offsets. The [`Display`](fmt::Display) impl produces the
//! canonical textual form, which re-parses to an equivalent tree.

use std::fmt;
use std::str::FromStr;

use serde::de::Deserializer;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use text_size::TextRange;

/// A half-open source span, serialized as `{position, length}`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Span {
    range: TextRange,
}

impl Span {
    pub fn position(&self) -> u32 {
        self.range.start().into()
    }

    pub fn length(&self) -> u32 {
        self.range.len().into()
    }
}

impl From<TextRange> for Span {
    fn from(range: TextRange) -> Self {
        Self { range }
    }
}

impl Serialize for Span {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Span", 2)?;
        state.serialize_field("position", &self.position())?;
        state.serialize_field("length", &self.length())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Span {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            position: u32,
            length: u32,
        }

        let raw = Raw::deserialize(deserializer)?;
        Ok(Self {
            range: TextRange::at(raw.position.into(), raw.length.into()),
        })
    }
}

/// A positioned fragment of the query, e.g. a field name or a field value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    #[serde(rename = "value")]
    pub text: String,
    #[serde(flatten)]
    pub span: Span,
}

impl Ident {
    pub(crate) fn new(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }
}

/// Comparison operator of a range constraint.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeOp {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = "BETWEEN")]
    Between,
}

impl FromStr for RangeOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">" => Ok(Self::GreaterThan),
            ">=" => Ok(Self::GreaterThanOrEqual),
            "<" => Ok(Self::LessThan),
            "<=" => Ok(Self::LessThanOrEqual),
            _ => Err(()),
        }
    }
}

impl RangeOp {
    /// The SQL spelling; identical to the query spelling for comparisons.
    pub(crate) fn sql(self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::Between => "BETWEEN",
        }
    }
}

impl fmt::Display for RangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

/// The typed, schema-checked form of a parsed query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Expression {
    SearchTerm {
        value: String,
        #[serde(flatten)]
        span: Span,
    },
    FieldValue {
        field: Ident,
        value: Ident,
    },
    Range {
        field: Ident,
        operator: RangeOp,
        value: Ident,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value2: Option<Ident>,
    },
    And {
        left: Box<Expression>,
        right: Box<Expression>,
        #[serde(flatten)]
        span: Span,
    },
    Or {
        left: Box<Expression>,
        right: Box<Expression>,
        #[serde(flatten)]
        span: Span,
    },
    Not {
        inner: Box<Expression>,
        #[serde(flatten)]
        span: Span,
    },
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SearchTerm { value, .. } => write_value(f, value),
            Self::FieldValue { field, value } => {
                write!(f, "{}:", field.text)?;
                write_value(f, &value.text)
            }
            Self::Range {
                field,
                operator,
                value,
                value2,
            } => match value2 {
                Some(upper) => {
                    write!(f, "{}:", field.text)?;
                    write_value(f, &value.text)?;
                    f.write_str("..")?;
                    write_value(f, &upper.text)
                }
                None => {
                    write!(f, "{}:{}", field.text, operator)?;
                    write_value(f, &value.text)
                }
            },
            Self::And { left, right, .. } => write!(f, "({left} AND {right})"),
            Self::Or { left, right, .. } => write!(f, "({left} OR {right})"),
            Self::Not { inner, .. } => write!(f, "NOT ({inner})"),
        }
    }
}

/// Writes a term or field value, quoting it whenever it contains
/// whitespace so the canonical form re-tokenizes to the same value.
fn write_value(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    if value.chars().any(char::is_whitespace) {
        write!(f, "\"{}\"", escape_quotes(value))
    } else {
        f.write_str(value)
    }
}

fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
