// SPDX-License-Identifier: MIT

//! Implements the schema-aware second pass.
//!
//! The first pass only knows strings; this pass splits `field:value`
//! fragments, resolves fields against the schema registry, classifies
//! typed values through the range sub-parser, and produces the typed
//! [`Expression`] AST. Diagnostics accumulate across the whole tree; a
//! failed subtree never stops the walk.

mod range;

use text_size::{TextRange, TextSize};

use crate::analyze::{ErrorKind, FieldType, SchemaRegistry, ValidationError};
use crate::ast::{Expression, Ident, Span};
use crate::parser::FirstPassExpr;

pub(crate) fn transform(
    expr: &FirstPassExpr,
    schemas: &SchemaRegistry,
) -> Result<Expression, Vec<ValidationError>> {
    let mut errors = Vec::new();
    match walk(expr, schemas, &mut errors) {
        Some(typed) if errors.is_empty() => Ok(typed),
        _ => Err(errors),
    }
}

fn walk(
    expr: &FirstPassExpr,
    schemas: &SchemaRegistry,
    errors: &mut Vec<ValidationError>,
) -> Option<Expression> {
    match expr {
        FirstPassExpr::String { value, range } => string_node(value, *range, schemas, errors),
        FirstPassExpr::And { left, right, range } => {
            // Both sides are walked before bailing so their diagnostics
            // both surface.
            let left = walk(left, schemas, errors);
            let right = walk(right, schemas, errors);
            Some(Expression::And {
                left: Box::new(left?),
                right: Box::new(right?),
                span: Span::from(*range),
            })
        }
        FirstPassExpr::Or { left, right, range } => {
            let left = walk(left, schemas, errors);
            let right = walk(right, schemas, errors);
            Some(Expression::Or {
                left: Box::new(left?),
                right: Box::new(right?),
                span: Span::from(*range),
            })
        }
        FirstPassExpr::Not { inner, range } => {
            let inner = walk(inner, schemas, errors)?;
            Some(Expression::Not {
                inner: Box::new(inner),
                span: Span::from(*range),
            })
        }
    }
}

fn string_node(
    value: &str,
    range: TextRange,
    schemas: &SchemaRegistry,
    errors: &mut Vec<ValidationError>,
) -> Option<Expression> {
    let Some((field, raw_value)) = value.split_once(':') else {
        return Some(Expression::SearchTerm {
            value: value.to_owned(),
            span: Span::from(range),
        });
    };

    // Sub-spans are derived from the cooked value; cooking only ever drops
    // characters, so they stay inside the token's raw span.
    let field_range = TextRange::at(range.start(), TextSize::of(field));
    let mut value_start = range.start() + TextSize::of(field) + TextSize::of(':');
    let field_value = strip_quotes(raw_value);
    if field_value.len() != raw_value.len() {
        value_start += TextSize::of('"');
    }
    let value_range = TextRange::at(value_start, TextSize::of(field_value));

    let Some(schema) = schemas.get(field) else {
        errors.push(
            ValidationError::new(ErrorKind::InvalidField(field.to_owned()), field_range)
                .with_field(field),
        );
        return None;
    };

    // The typed AST carries the declared spelling so case variants of the
    // same field produce identical trees.
    let field = Ident::new(schema.name.clone(), Span::from(field_range));
    match schema.typ {
        FieldType::String => Some(Expression::FieldValue {
            field,
            value: Ident::new(field_value, Span::from(value_range)),
        }),
        FieldType::Number | FieldType::Date => {
            range::parse_range(field, schema.typ, field_value, value_range, errors)
        }
    }
}

/// Strips one balanced pair of surrounding double quotes, which can only
/// survive cooking through escaped quotes in a quoted value.
fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::analyze::FieldSchema;
    use crate::lexer::tokenize;
    use crate::parser::Parser;

    fn schemas() -> SchemaRegistry {
        SchemaRegistry::new(&[
            FieldSchema::new("title", FieldType::String),
            FieldSchema::new("price", FieldType::Number),
            FieldSchema::new("date", FieldType::Date),
        ])
    }

    fn transform_input(input: &str) -> Result<Expression, Vec<ValidationError>> {
        let tokens = tokenize(input).unwrap();
        let mut parser = Parser::new(&tokens);
        let expr = parser.parse_expression(0).unwrap();
        transform(&expr, &schemas())
    }

    fn stringified(input: &str) -> String {
        transform_input(input).unwrap().to_string()
    }

    fn messages(input: &str) -> Vec<(String, u32, u32)> {
        transform_input(input)
            .unwrap_err()
            .into_iter()
            .map(|e| (e.message, e.position, e.length))
            .collect()
    }

    #[test]
    fn bare_words_become_search_terms() {
        assert_eq!(stringified("boots"), "boots");
    }

    #[test]
    fn string_fields_become_field_values() {
        assert_eq!(stringified("title:boots"), "title:boots");
    }

    #[test]
    fn field_lookup_ignores_case_and_normalizes() {
        assert_eq!(stringified("TITLE:boots"), "title:boots");
        assert_eq!(stringified("Price:5"), "price:5");
    }

    #[test]
    fn plain_typed_values_are_equalities() {
        assert_eq!(stringified("price:10"), "price:10");
        assert_eq!(stringified("date:2024-02-29"), "date:2024-02-29");
        assert_eq!(
            messages("price:abc"),
            vec![("Invalid numeric value".to_owned(), 6, 3)]
        );
    }

    #[test]
    fn range_shaped_values_on_string_fields_stay_literal() {
        assert_eq!(stringified("title:10..20"), "title:10..20");
    }

    #[test]
    fn comparison_prefixes_parse() {
        assert_eq!(stringified("price:>=10"), "price:>=10");
        assert_eq!(stringified("price:<5"), "price:<5");
        assert_eq!(stringified("date:<2024-06-01"), "date:<2024-06-01");
    }

    #[test]
    fn two_sided_ranges_parse() {
        assert_eq!(stringified("price:10..20"), "price:10..20");
        assert_eq!(
            stringified("date:2024-01-01..2024-12-31"),
            "date:2024-01-01..2024-12-31"
        );
    }

    #[test]
    fn open_ended_ranges_normalize_to_comparisons() {
        assert_eq!(stringified("price:10.."), "price:>=10");
        assert_eq!(stringified("price:..20"), "price:<=20");
    }

    #[test]
    fn unknown_fields_are_reported_with_their_span() {
        assert_eq!(
            messages("nope:1"),
            vec![("Invalid field: \"nope\"".to_owned(), 0, 4)]
        );
    }

    #[test]
    fn invalid_operators_are_reported() {
        assert_eq!(
            messages("price:>>10"),
            vec![("Invalid range operator".to_owned(), 6, 4)]
        );
        assert_eq!(
            messages("price:>=>1"),
            vec![("Invalid range operator".to_owned(), 6, 4)]
        );
    }

    #[test]
    fn missing_range_operand_is_reported() {
        assert_eq!(
            messages("price:>="),
            vec![("Expected range value".to_owned(), 6, 2)]
        );
    }

    #[test]
    fn bare_dots_are_an_invalid_range() {
        assert_eq!(
            messages("price:.."),
            vec![("Invalid range format".to_owned(), 6, 2)]
        );
        assert_eq!(
            messages("price:..."),
            vec![("Invalid range format".to_owned(), 6, 3)]
        );
    }

    #[test]
    fn operands_are_type_checked_individually() {
        assert_eq!(
            messages("price:10..x2"),
            vec![("Invalid numeric value".to_owned(), 10, 2)]
        );
        assert_eq!(
            messages("price:a..b"),
            vec![
                ("Invalid numeric value".to_owned(), 6, 1),
                ("Invalid numeric value".to_owned(), 9, 1),
            ]
        );
    }

    #[test]
    fn dates_must_exist_on_the_calendar() {
        assert_eq!(
            messages("date:2024-02-30"),
            vec![("Invalid date format".to_owned(), 5, 10)]
        );
        assert_eq!(
            messages("date:24-1-1"),
            vec![("Invalid date format".to_owned(), 5, 6)]
        );
    }

    #[test]
    fn errors_accumulate_across_subtrees() {
        assert_eq!(
            messages("nope:1 AND price:x"),
            vec![
                ("Invalid field: \"nope\"".to_owned(), 0, 4),
                ("Invalid numeric value".to_owned(), 17, 1),
            ]
        );
    }
}
