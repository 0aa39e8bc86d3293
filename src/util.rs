// SPDX-License-Identifier: MIT

//! Implements miscellaneous types and helper.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;

/// A search field identifier.
///
/// Field names compare case-insensitively, matching how they are declared
/// in and looked up from the schema registry.
#[derive(Clone, Debug, Eq)]
pub struct FieldIdent {
    name: String,
}

impl FieldIdent {
    pub fn new<S>(name: S) -> Self
    where
        S: Into<String>,
    {
        Self { name: name.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl From<&str> for FieldIdent {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for FieldIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl PartialEq for FieldIdent {
    fn eq(&self, other: &Self) -> bool {
        self.name.to_lowercase() == other.name.to_lowercase()
    }
}

impl Hash for FieldIdent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_lowercase().hash(state);
    }
}

/// Parses a plain decimal number: optional sign, digits, optional dot and
/// fraction digits. Exponents and bare fractions (`.5`, `1.`) are rejected.
pub(crate) fn parse_decimal(input: &str) -> Option<f64> {
    let digits = input.strip_prefix(['+', '-']).unwrap_or(input);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits, None),
    };
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(frac) = frac_part {
        if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }
    input.parse().ok()
}

/// Checks a calendar date in `YYYY-MM-DD` form.
///
/// The lexical shape is checked first so that `2024-1-1` is rejected even
/// though chrono would accept it.
pub(crate) fn is_valid_date(input: &str) -> bool {
    let bytes = input.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    let digits = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);
    if !digits(0..4) || !digits(5..7) || !digits(8..10) {
        return false;
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_idents_compare_case_insensitively() {
        assert_eq!(FieldIdent::new("Title"), FieldIdent::new("title"));
        assert_ne!(FieldIdent::new("title"), FieldIdent::new("titles"));
    }

    #[test]
    fn accepts_plain_decimals() {
        assert_eq!(parse_decimal("10"), Some(10.0));
        assert_eq!(parse_decimal("-3.25"), Some(-3.25));
        assert_eq!(parse_decimal("+7"), Some(7.0));
    }

    #[test]
    fn rejects_non_decimals() {
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("1e3"), None);
        assert_eq!(parse_decimal(".5"), None);
        assert_eq!(parse_decimal("1."), None);
        assert_eq!(parse_decimal("1.2.3"), None);
    }

    #[test]
    fn validates_calendar_dates() {
        assert!(is_valid_date("2024-01-01"));
        assert!(is_valid_date("2024-02-29"));
        assert!(!is_valid_date("2023-02-29"));
        assert!(!is_valid_date("2024-02-30"));
        assert!(!is_valid_date("2024-1-1"));
        assert!(!is_valid_date("24-01-01"));
    }
}
