// SPDX-License-Identifier: MIT

//! Implements the first-pass validation sweep.
//!
//! The sweep never aborts: it walks the entire tree and reports every
//! string-level problem it finds, which is what lets an editor underline
//! several mistakes at once.

use text_size::{TextRange, TextSize};

use crate::analyze::{ErrorKind, ValidationError};
use crate::parser::FirstPassExpr;

pub(crate) fn validate(expr: &FirstPassExpr) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    walk(expr, &mut errors);
    errors
}

fn walk(expr: &FirstPassExpr, errors: &mut Vec<ValidationError>) {
    match expr {
        FirstPassExpr::String { value, range } => check_string(value, *range, errors),
        FirstPassExpr::And { left, right, .. } | FirstPassExpr::Or { left, right, .. } => {
            walk(left, errors);
            walk(right, errors);
        }
        FirstPassExpr::Not { inner, .. } => walk(inner, errors),
    }
}

fn check_string(value: &str, range: TextRange, errors: &mut Vec<ValidationError>) {
    if value.ends_with(':') {
        errors.push(ValidationError::new(ErrorKind::ExpectedFieldValue, range));
    } else if value.starts_with(':') {
        errors.push(ValidationError::new(ErrorKind::MissingFieldName, range));
    } else if let Some((field, _)) = value.split_once(':') {
        let field_range = TextRange::at(range.start(), TextSize::of(field));
        if field.eq_ignore_ascii_case("AND") || field.eq_ignore_ascii_case("OR") {
            errors.push(
                ValidationError::new(ErrorKind::ReservedWord(field.to_owned()), field_range)
                    .with_field(field),
            );
        } else if !is_valid_field_name(field) {
            errors.push(ValidationError::new(
                ErrorKind::InvalidFieldChars,
                field_range,
            ));
        }
    } else if value.eq_ignore_ascii_case("AND") || value.eq_ignore_ascii_case("OR") {
        errors.push(ValidationError::new(
            ErrorKind::ReservedWord(value.to_owned()),
            range,
        ));
    }
}

fn is_valid_field_name(field: &str) -> bool {
    !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
