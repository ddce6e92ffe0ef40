//! Presence and type checks on untyped request bodies.
//!
//! Validators return every problem found, in field order, as human-readable
//! messages. An empty list means the payload is acceptable.

use serde_json::{Map, Value};

const BOOK_FIELDS: [&str; 4] = ["titulo", "autor", "categorias", "ano"];
const AUTHOR_FIELDS: [&str; 3] = ["nome", "biografia", "data_nascimento"];

fn as_object(payload: &Value) -> Result<&Map<String, Value>, Vec<String>> {
    payload
        .as_object()
        .ok_or_else(|| vec!["Request body must be a JSON object".to_string()])
}

fn is_non_empty_string(value: &Value) -> bool {
    value.as_str().is_some_and(|s| !s.trim().is_empty())
}

/// Check a string field. Absent fields fail only when `required`;
/// `null` is accepted only when `nullable`.
fn check_string(
    obj: &Map<String, Value>,
    field: &str,
    required: bool,
    nullable: bool,
    errors: &mut Vec<String>,
) {
    match obj.get(field) {
        None if required => errors.push(format!("Field '{}' is required", field)),
        None => {}
        Some(Value::Null) if nullable && !required => {}
        Some(value) if is_non_empty_string(value) => {}
        Some(_) => errors.push(format!("Field '{}' must be a non-empty string", field)),
    }
}

fn check_optional_text(obj: &Map<String, Value>, field: &str, errors: &mut Vec<String>) {
    match obj.get(field) {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => errors.push(format!("Field '{}' must be a string", field)),
    }
}

/// Validate a book payload. With `require_all`, `titulo` and `autor` must be present.
pub fn validate_book_payload(payload: &Value, require_all: bool) -> Vec<String> {
    let obj = match as_object(payload) {
        Ok(obj) => obj,
        Err(errors) => return errors,
    };

    let mut errors = Vec::new();

    check_string(obj, "titulo", require_all, false, &mut errors);
    check_string(obj, "autor", require_all, true, &mut errors);

    match obj.get("categorias") {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) => {
            if !items.iter().all(is_non_empty_string) {
                errors.push("Field 'categorias' must contain only non-empty strings".to_string());
            }
        }
        Some(_) => errors.push("Field 'categorias' must be an array".to_string()),
    }

    match obj.get("ano") {
        None | Some(Value::Null) => {}
        Some(value) if value.as_i64().is_some_and(|y| i32::try_from(y).is_ok()) => {}
        Some(_) => errors.push("Field 'ano' must be an integer".to_string()),
    }

    if !require_all && errors.is_empty() && !BOOK_FIELDS.iter().any(|f| obj.contains_key(*f)) {
        errors.push("No book fields provided".to_string());
    }

    errors
}

/// Validate an author payload. With `require_all`, `nome` must be present.
pub fn validate_author_payload(payload: &Value, require_all: bool) -> Vec<String> {
    let obj = match as_object(payload) {
        Ok(obj) => obj,
        Err(errors) => return errors,
    };

    let mut errors = Vec::new();

    check_string(obj, "nome", require_all, false, &mut errors);
    check_optional_text(obj, "biografia", &mut errors);
    check_optional_text(obj, "data_nascimento", &mut errors);

    if !require_all && errors.is_empty() && !AUTHOR_FIELDS.iter().any(|f| obj.contains_key(*f)) {
        errors.push("No author fields provided".to_string());
    }

    errors
}

/// Validate a category payload: `nome` is mandatory.
pub fn validate_category_payload(payload: &Value) -> Vec<String> {
    let obj = match as_object(payload) {
        Ok(obj) => obj,
        Err(errors) => return errors,
    };

    let mut errors = Vec::new();
    check_string(obj, "nome", true, false, &mut errors);
    errors
}
