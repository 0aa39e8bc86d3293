// SPDX-License-Identifier: MIT

//! Implements the main query analysis entry point.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use text_size::TextRange;

use crate::ast::Expression;
use crate::lexer::{tokenize, TokenKind};
use crate::parser::Parser;
use crate::util::FieldIdent;
use crate::{analyzer, validate};

/// Value types a schema field can declare.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(
    target_arch = "wasm32",
    derive(tsify::Tsify),
    tsify(into_wasm_abi, from_wasm_abi)
)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    String,
    Number,
    Date,
}

/// A single field declaration: the canonical name and its value type.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(
    target_arch = "wasm32",
    derive(tsify::Tsify),
    tsify(into_wasm_abi, from_wasm_abi)
)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub name: String,
    pub typ: FieldType,
}

impl FieldSchema {
    pub fn new<S>(name: S, typ: FieldType) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: name.into(),
            typ,
        }
    }
}

/// Case-insensitive lookup table of the declared fields, built once per
/// parse from the caller's schema list and never mutated afterwards.
#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    fields: IndexMap<FieldIdent, FieldSchema>,
}

impl SchemaRegistry {
    pub fn new(schemas: &[FieldSchema]) -> Self {
        let fields = schemas
            .iter()
            .map(|schema| (FieldIdent::new(schema.name.clone()), schema.clone()))
            .collect();
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(&FieldIdent::new(name))
    }
}

/// Closed taxonomy of diagnostics the pipeline can produce.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ErrorKind {
    #[error("Unterminated quoted string")]
    UnterminatedString,
    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),
    #[error("Unexpected \")\"")]
    UnexpectedRParen,
    #[error("Expected RPAREN")]
    ExpectedRParen,
    #[error("{0} is a reserved word")]
    ReservedWord(String),
    #[error("Expected field value")]
    ExpectedFieldValue,
    #[error("Missing field name")]
    MissingFieldName,
    #[error("Invalid characters in field name")]
    InvalidFieldChars,
    #[error("Invalid field: \"{0}\"")]
    InvalidField(String),
    #[error("Invalid numeric value")]
    InvalidNumericValue,
    #[error("Invalid date format")]
    InvalidDateFormat,
    #[error("Invalid range operator")]
    InvalidRangeOperator,
    #[error("Invalid range format")]
    InvalidRangeFormat,
    #[error("Expected range value")]
    ExpectedRangeValue,
}

/// A single diagnostic with its byte-accurate source span.
///
/// `length` includes delimiters (quotes, the `:` of a dangling `field:`)
/// so an editor can underline the exact span.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(
    target_arch = "wasm32",
    derive(tsify::Tsify),
    tsify(into_wasm_abi, from_wasm_abi)
)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub message: String,
    pub position: u32,
    pub length: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ValidationError {
    pub(crate) fn new(kind: ErrorKind, range: TextRange) -> Self {
        Self {
            message: kind.to_string(),
            position: range.start().into(),
            length: range.len().into(),
            field: None,
        }
    }

    pub(crate) fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Outcome of [`parse_search_query`]: either a typed expression tree
/// (`None` for empty input) or the accumulated diagnostics.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SearchQuery {
    Ok { expression: Option<Expression> },
    Error { errors: Vec<ValidationError> },
}

impl SearchQuery {
    /// Unpacks into a plain [`Result`] for Rust callers.
    pub fn into_result(self) -> Result<Option<Expression>, Vec<ValidationError>> {
        match self {
            Self::Ok { expression } => Ok(expression),
            Self::Error { errors } => Err(errors),
        }
    }
}

/// Parses `input` against the declared `schemas`.
///
/// The stages run strictly forward: tokenize, first-pass parse, first-pass
/// validation, schema-aware transformation. Diagnostics accumulate within
/// a stage; a stage that produced any stops the pipeline.
pub fn parse_search_query(input: &str, schemas: &[FieldSchema]) -> SearchQuery {
    let tokens = match tokenize(input) {
        Ok(tokens) => tokens,
        Err(error) => {
            return SearchQuery::Error {
                errors: vec![error],
            }
        }
    };
    if tokens.is_empty() {
        return SearchQuery::Ok { expression: None };
    }

    let mut parser = Parser::new(&tokens);
    let tree = match parser.parse_expression(0) {
        Ok(tree) => tree,
        Err(error) => {
            return SearchQuery::Error {
                errors: vec![error],
            }
        }
    };

    let mut errors = Vec::new();
    if let Some(trailing) = parser.current_token() {
        let kind = match trailing.kind {
            TokenKind::RParen => ErrorKind::UnexpectedRParen,
            _ => ErrorKind::UnexpectedToken(trailing.value.clone()),
        };
        errors.push(ValidationError::new(kind, trailing.range));
    }
    errors.extend(validate::validate(&tree));
    if !errors.is_empty() {
        return SearchQuery::Error { errors };
    }

    match analyzer::transform(&tree, &SchemaRegistry::new(schemas)) {
        Ok(expression) => SearchQuery::Ok {
            expression: Some(expression),
        },
        Err(errors) => SearchQuery::Error { errors },
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn schemas() -> Vec<FieldSchema> {
        vec![
            FieldSchema::new("price", FieldType::Number),
            FieldSchema::new("date", FieldType::Date),
            FieldSchema::new("color", FieldType::String),
            FieldSchema::new("size", FieldType::String),
        ]
    }

    #[test]
    fn empty_input_parses_to_nothing() {
        assert_eq!(
            parse_search_query("", &schemas()),
            SearchQuery::Ok { expression: None }
        );
        assert_eq!(
            parse_search_query("   ", &schemas()),
            SearchQuery::Ok { expression: None }
        );
    }

    #[test]
    fn ok_queries_produce_an_expression() {
        let query = parse_search_query("color:red AND size:large", &schemas());
        let expression = query.into_result().unwrap().unwrap();
        assert_eq!(expression.to_string(), "(color:red AND size:large)");
    }

    #[test]
    fn registry_lookup_is_case_insensitive() {
        let registry = SchemaRegistry::new(&schemas());
        assert_eq!(registry.get("PRICE").map(|s| s.typ), Some(FieldType::Number));
        assert_eq!(registry.get("Color").map(|s| s.typ), Some(FieldType::String));
        assert_eq!(registry.get("missing"), None);
    }

    #[test]
    fn lexical_errors_short_circuit() {
        let errors = parse_search_query("\"unclosed", &schemas())
            .into_result()
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Unterminated quoted string");
        assert_eq!(errors[0].position, 0);
        assert_eq!(errors[0].length, 9);
    }

    #[test]
    fn trailing_tokens_are_reported() {
        let errors = parse_search_query("a b)", &schemas())
            .into_result()
            .unwrap_err();
        assert_eq!(errors[0].message, "Unexpected \")\"");
        assert_eq!((errors[0].position, errors[0].length), (3, 1));
    }

    #[test]
    fn first_pass_errors_keep_the_semantic_stage_out() {
        // `nope` would be an unknown field, but the first-pass problem on
        // `fie*ld` wins.
        let errors = parse_search_query("fie*ld:x nope:1", &schemas())
            .into_result()
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Invalid characters in field name");
    }

    #[test]
    fn semantic_errors_accumulate() {
        let errors = parse_search_query("nope:1 OR price:x", &schemas())
            .into_result()
            .unwrap_err();
        assert_eq!(
            errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>(),
            vec!["Invalid field: \"nope\"", "Invalid numeric value"]
        );
        assert_eq!(errors[0].field.as_deref(), Some("nope"));
    }
}
