// SPDX-License-Identifier: MIT

//! Additional functions and types needed for a clean Rust <-> JS interface.

#![cfg(any(target_arch = "wasm32", target_arch = "wasm64"))]

use wasm_bindgen::prelude::*;

use crate::analyze::{parse_search_query, FieldSchema, SearchQuery};
use crate::ast::Expression;
use crate::sql::{search_query_to_sql, search_string_to_sql};

fn schemas_from(value: JsValue) -> Result<Vec<FieldSchema>, JsValue> {
    Ok(serde_wasm_bindgen::from_value(value)?)
}

/// WASM export of [`parse_search_query()`]. Should _never_ be called from
/// other Rust code.
///
/// A second, WASM-specific function is required here, as the only allowed
/// [`Result`] type for returning to JS is [`Result<T, JsValue>`]. The
/// typed [`parse_search_query()`] stays the "normal" entry point for Rust
/// callers; this wrapper only moves the schema list and the result across
/// the JS boundary as plain values.
#[wasm_bindgen(js_name = "parseSearchQuery")]
pub fn js_parse_search_query(input: &str, schemas: JsValue) -> Result<JsValue, JsValue> {
    let schemas = schemas_from(schemas)?;
    Ok(serde_wasm_bindgen::to_value(&parse_search_query(
        input, &schemas,
    ))?)
}

/// WASM export of [`search_query_to_sql()`].
#[wasm_bindgen(js_name = "searchQueryToSql")]
pub fn js_search_query_to_sql(
    query: JsValue,
    searchable_columns: Vec<String>,
    schemas: JsValue,
) -> Result<JsValue, JsValue> {
    let query: SearchQuery = serde_wasm_bindgen::from_value(query)?;
    let schemas = schemas_from(schemas)?;
    match search_query_to_sql(&query, &searchable_columns, &schemas) {
        Ok(sql) => Ok(serde_wasm_bindgen::to_value(&sql)?),
        Err(err) => Err(JsValue::from_str(&err.to_string())),
    }
}

/// WASM export of [`search_string_to_sql()`].
#[wasm_bindgen(js_name = "searchStringToSql")]
pub fn js_search_string_to_sql(
    input: &str,
    searchable_columns: Vec<String>,
    schemas: JsValue,
) -> Result<JsValue, JsValue> {
    let schemas = schemas_from(schemas)?;
    match search_string_to_sql(input, &searchable_columns, &schemas) {
        Ok(sql) => Ok(serde_wasm_bindgen::to_value(&sql)?),
        Err(err) => Err(JsValue::from_str(&err.to_string())),
    }
}

/// WASM export of the canonical stringifier, over an expression value
/// previously returned by [`js_parse_search_query()`].
#[wasm_bindgen(js_name = "stringify")]
pub fn js_stringify(expression: JsValue) -> Result<String, JsValue> {
    let expression: Expression = serde_wasm_bindgen::from_value(expression)?;
    Ok(expression.to_string())
}
