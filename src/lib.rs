// SPDX-License-Identifier: MIT

//! Parser and SQL compiler for a human-friendly search query language.
//!
//! Queries mix bare terms, quoted phrases, `field:value` constraints,
//! numeric and date ranges, and `AND`/`OR`/`NOT` combinators. Parsing
//! yields either a typed expression tree or a list of diagnostics with
//! exact source spans; the compiler turns the tree into a parameterized
//! SQL predicate.
//!
//! ```
//! use search_query_compiler::{parse_search_query, FieldSchema, FieldType};
//!
//! let schemas = vec![FieldSchema::new("price", FieldType::Number)];
//! let query = parse_search_query("boots price:10..20", &schemas);
//! let expression = query.into_result().unwrap().unwrap();
//! assert_eq!(expression.to_string(), "(boots AND price:10..20)");
//! ```

mod analyze;
mod analyzer;
mod ast;
mod lexer;
mod parser;
mod sql;
mod util;
mod validate;
mod wasm_bindings;

pub use analyze::*;
pub use ast::{Expression, Ident, RangeOp, Span};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::FirstPassExpr;
pub use sql::*;
pub use util::FieldIdent;
