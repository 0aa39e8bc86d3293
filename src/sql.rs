// SPDX-License-Identifier: MIT

//! Implements compilation of parsed queries into SQL predicates.
//!
//! Values never appear in the generated text; every value is pushed onto
//! the bind list and referenced through a numbered `$n` placeholder.
//! Column identifiers come from the caller's trusted configuration (the
//! searchable columns and the declared schema names) and are emitted
//! literally.

use serde::Serialize;

use crate::analyze::{parse_search_query, FieldSchema, FieldType, SchemaRegistry, SearchQuery};
use crate::ast::{Expression, Ident, RangeOp};
use crate::util::parse_decimal;

/// A compiled predicate: SQL text with `$1..$n` placeholders and the bind
/// values in placeholder order.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlQuery {
    pub text: String,
    pub values: Vec<SqlValue>,
}

/// A bind value; serializes untagged, so JS sees `string | number`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Text(String),
    Number(f64),
}

#[derive(Debug, Eq, thiserror::Error, PartialEq)]
pub enum SqlError {
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Compiles a parse result against the searchable columns and schemas.
///
/// An empty query compiles to the always-true predicate `1=1`; a failed
/// parse surfaces its first diagnostic.
pub fn search_query_to_sql(
    query: &SearchQuery,
    searchable_columns: &[String],
    schemas: &[FieldSchema],
) -> Result<SqlQuery, SqlError> {
    match query {
        SearchQuery::Error { errors } => Err(SqlError::Parse(
            errors.first().map(|e| e.message.clone()).unwrap_or_default(),
        )),
        SearchQuery::Ok { expression: None } => Ok(SqlQuery {
            text: "1=1".to_owned(),
            values: Vec::new(),
        }),
        SearchQuery::Ok {
            expression: Some(expression),
        } => {
            let mut compiler = SqlCompiler {
                columns: searchable_columns,
                schemas: SchemaRegistry::new(schemas),
                values: Vec::new(),
            };
            let text = compiler.emit(expression);
            Ok(SqlQuery {
                text,
                values: compiler.values,
            })
        }
    }
}

/// Parses and compiles in one step.
pub fn search_string_to_sql(
    input: &str,
    searchable_columns: &[String],
    schemas: &[FieldSchema],
) -> Result<SqlQuery, SqlError> {
    search_query_to_sql(
        &parse_search_query(input, schemas),
        searchable_columns,
        schemas,
    )
}

struct SqlCompiler<'a> {
    columns: &'a [String],
    schemas: SchemaRegistry,
    values: Vec<SqlValue>,
}

impl SqlCompiler<'_> {
    /// Pushes a bind value and returns its placeholder number.
    fn bind(&mut self, value: SqlValue) -> usize {
        self.values.push(value);
        self.values.len()
    }

    fn bind_number(&mut self, text: &str) -> usize {
        // Operands were validated during analysis; anything else arrives
        // from a hand-built AST and binds as raw text.
        let value = parse_decimal(text)
            .map(SqlValue::Number)
            .unwrap_or_else(|| SqlValue::Text(text.to_owned()));
        self.bind(value)
    }

    fn field_type(&self, field: &Ident) -> Option<FieldType> {
        self.schemas.get(&field.text).map(|schema| schema.typ)
    }

    fn emit(&mut self, expression: &Expression) -> String {
        match expression {
            Expression::SearchTerm { value, .. } => self.emit_term(value),
            Expression::FieldValue { field, value } => self.emit_field_value(field, value),
            Expression::Range {
                field,
                operator,
                value,
                value2,
            } => self.emit_range(field, *operator, value, value2.as_ref()),
            Expression::And { left, right, .. } => {
                let left = self.emit(left);
                let right = self.emit(right);
                format!("({left} AND {right})")
            }
            Expression::Or { left, right, .. } => {
                let left = self.emit(left);
                let right = self.emit(right);
                format!("({left} OR {right})")
            }
            Expression::Not { inner, .. } => {
                let inner = self.emit(inner);
                if inner.starts_with('(') {
                    format!("NOT {inner}")
                } else {
                    format!("NOT ({inner})")
                }
            }
        }
    }

    /// A bare term searches every configured column with one shared
    /// pattern placeholder.
    fn emit_term(&mut self, value: &str) -> String {
        let n = self.bind(SqlValue::Text(like_pattern(value)));
        let predicates = self
            .columns
            .iter()
            .map(|column| format!("{column} ILIKE ${n}"))
            .collect::<Vec<_>>()
            .join(" OR ");
        format!("({predicates})")
    }

    fn emit_field_value(&mut self, field: &Ident, value: &Ident) -> String {
        let column = &field.text;
        match self.field_type(field) {
            Some(FieldType::Date) => {
                let n = self.bind(SqlValue::Text(value.text.clone()));
                format!("{column}::date = ${n}::date")
            }
            Some(FieldType::Number) => {
                let n = self.bind_number(&value.text);
                format!("{column} = ${n}")
            }
            _ if column.to_ascii_lowercase().ends_with("_id") => {
                let n = self.bind(SqlValue::Text(value.text.clone()));
                format!("{column} = ${n}")
            }
            _ => {
                let n = self.bind(SqlValue::Text(like_pattern(&value.text)));
                format!("{column} ILIKE ${n}")
            }
        }
    }

    fn emit_range(
        &mut self,
        field: &Ident,
        operator: RangeOp,
        value: &Ident,
        value2: Option<&Ident>,
    ) -> String {
        let column = &field.text;
        let date = self.field_type(field) == Some(FieldType::Date);
        match (operator, value2) {
            (RangeOp::Between, Some(upper)) if date => {
                let lo = self.bind(SqlValue::Text(value.text.clone()));
                let hi = self.bind(SqlValue::Text(upper.text.clone()));
                format!("{column}::date BETWEEN ${lo}::date AND ${hi}::date")
            }
            (RangeOp::Between, Some(upper)) => {
                let lo = self.bind_number(&value.text);
                let hi = self.bind_number(&upper.text);
                format!("{column} BETWEEN ${lo} AND ${hi}")
            }
            (operator, _) if date => {
                let n = self.bind(SqlValue::Text(value.text.clone()));
                format!("{column}::date {op} ${n}::date", op = operator.sql())
            }
            (operator, _) => {
                let n = self.bind_number(&value.text);
                format!("{column} {op} ${n}", op = operator.sql())
            }
        }
    }
}

/// Builds an `ILIKE` containment pattern.
///
/// `%` and `_` in the value are escaped with a backslash. The backslash
/// itself is not escaped, so a literal backslash directly before `%` or
/// `_` in the value still acts as an escape; known limitation of the
/// emitted dialect form.
fn like_pattern(value: &str) -> String {
    let escaped = value.replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}
