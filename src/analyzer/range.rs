// SPDX-License-Identifier: MIT

//! Implements the range sub-parser for number- and date-typed fields.

use text_size::{TextRange, TextSize};

use crate::analyze::{ErrorKind, FieldType, ValidationError};
use crate::ast::{Expression, Ident, RangeOp, Span};
use crate::util::{is_valid_date, parse_decimal};

/// Interprets the value part of a typed `field:value` pair.
///
/// Recognizes comparison prefixes (`>`, `>=`, `<`, `<=`), two-sided `a..b`
/// ranges, and open-ended `a..` / `..b` ranges; a value without an
/// operator is a plain typed equality. Every operand is validated against
/// the field type before an expression is produced.
pub(super) fn parse_range(
    field: Ident,
    typ: FieldType,
    value: &str,
    value_range: TextRange,
    errors: &mut Vec<ValidationError>,
) -> Option<Expression> {
    if value.starts_with(['<', '>']) {
        let op_len = value
            .chars()
            .take_while(|c| matches!(c, '<' | '>' | '='))
            .count();
        let (op_text, operand) = value.split_at(op_len);
        let Ok(operator) = op_text.parse::<RangeOp>() else {
            errors.push(
                ValidationError::new(ErrorKind::InvalidRangeOperator, value_range)
                    .with_field(&field.text),
            );
            return None;
        };
        if operand.is_empty() {
            errors.push(
                ValidationError::new(ErrorKind::ExpectedRangeValue, value_range)
                    .with_field(&field.text),
            );
            return None;
        }
        let operand_range =
            TextRange::new(value_range.start() + TextSize::of(op_text), value_range.end());
        if !check_operand(typ, operand, operand_range, &field.text, errors) {
            return None;
        }
        return Some(Expression::Range {
            field,
            operator,
            value: Ident::new(operand, Span::from(operand_range)),
            value2: None,
        });
    }

    if value.contains("..") && value.chars().all(|c| c == '.') {
        errors.push(
            ValidationError::new(ErrorKind::InvalidRangeFormat, value_range)
                .with_field(&field.text),
        );
        return None;
    }

    if let Some((lower, upper)) = value.split_once("..") {
        return parse_between(field, typ, lower, upper, value_range, errors);
    }

    // No operator: a typed equality.
    if !check_operand(typ, value, value_range, &field.text, errors) {
        return None;
    }
    Some(Expression::FieldValue {
        field,
        value: Ident::new(value, Span::from(value_range)),
    })
}

fn parse_between(
    field: Ident,
    typ: FieldType,
    lower: &str,
    upper: &str,
    value_range: TextRange,
    errors: &mut Vec<ValidationError>,
) -> Option<Expression> {
    let lower_range = TextRange::at(value_range.start(), TextSize::of(lower));
    let upper_range = TextRange::new(value_range.end() - TextSize::of(upper), value_range.end());

    match (lower.is_empty(), upper.is_empty()) {
        (true, true) => {
            errors.push(
                ValidationError::new(ErrorKind::InvalidRangeFormat, value_range)
                    .with_field(&field.text),
            );
            None
        }
        // `a..` means "at least a", `..b` means "at most b".
        (false, true) => {
            if !check_operand(typ, lower, lower_range, &field.text, errors) {
                return None;
            }
            Some(Expression::Range {
                field,
                operator: RangeOp::GreaterThanOrEqual,
                value: Ident::new(lower, Span::from(lower_range)),
                value2: None,
            })
        }
        (true, false) => {
            if !check_operand(typ, upper, upper_range, &field.text, errors) {
                return None;
            }
            Some(Expression::Range {
                field,
                operator: RangeOp::LessThanOrEqual,
                value: Ident::new(upper, Span::from(upper_range)),
                value2: None,
            })
        }
        (false, false) => {
            let lower_ok = check_operand(typ, lower, lower_range, &field.text, errors);
            let upper_ok = check_operand(typ, upper, upper_range, &field.text, errors);
            if !(lower_ok && upper_ok) {
                return None;
            }
            Some(Expression::Range {
                field,
                operator: RangeOp::Between,
                value: Ident::new(lower, Span::from(lower_range)),
                value2: Some(Ident::new(upper, Span::from(upper_range))),
            })
        }
    }
}

fn check_operand(
    typ: FieldType,
    operand: &str,
    range: TextRange,
    field: &str,
    errors: &mut Vec<ValidationError>,
) -> bool {
    let kind = match typ {
        FieldType::Number if parse_decimal(operand).is_none() => ErrorKind::InvalidNumericValue,
        FieldType::Date if !is_valid_date(operand) => ErrorKind::InvalidDateFormat,
        _ => return true,
    };
    errors.push(ValidationError::new(kind, range).with_field(field));
    false
}
