//! Typed decoding of stored field maps.
//!
//! The store hands back untyped JSON; these helpers are the boundary
//! where malformed values are rejected instead of propagating upward.
//! Absent and explicit-null are equivalent everywhere (null is the
//! store's tombstone).

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::path::Path;
use crate::infrastructure::ports::{Fields, StoreError};

pub fn req_str(fields: &Fields, key: &str, path: &Path) -> Result<String, StoreError> {
    match fields.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        None | Some(Value::Null) => Err(StoreError::decode(
            path,
            format!("missing required field '{key}'"),
        )),
        Some(other) => Err(type_error(path, key, "string", other)),
    }
}

pub fn opt_str(fields: &Fields, key: &str, path: &Path) -> Result<Option<String>, StoreError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(type_error(path, key, "string", other)),
    }
}

pub fn req_f64(fields: &Fields, key: &str, path: &Path) -> Result<f64, StoreError> {
    match fields.get(key) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| StoreError::decode(path, format!("field '{key}' is not a finite number"))),
        None | Some(Value::Null) => Err(StoreError::decode(
            path,
            format!("missing required field '{key}'"),
        )),
        Some(other) => Err(type_error(path, key, "number", other)),
    }
}

pub fn opt_u64(fields: &Fields, key: &str, path: &Path) -> Result<Option<u64>, StoreError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| StoreError::decode(path, format!("field '{key}' is not a u64"))),
        Some(other) => Err(type_error(path, key, "number", other)),
    }
}

/// Booleans default to false when absent: boolean-map entries and flags
/// are only ever written as `true` or tombstoned away.
pub fn flag(fields: &Fields, key: &str) -> bool {
    matches!(fields.get(key), Some(Value::Bool(true)))
}

pub fn req_datetime(fields: &Fields, key: &str, path: &Path) -> Result<DateTime<Utc>, StoreError> {
    let raw = req_str(fields, key, path)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::decode(path, format!("field '{key}' is not RFC 3339: {e}")))
}

/// Keys of a boolean map whose entries are literally `true`. Tombstoned
/// (null) and malformed entries are skipped.
pub fn true_keys(fields: &Fields) -> impl Iterator<Item = &String> {
    fields
        .iter()
        .filter(|(_, v)| matches!(v, Value::Bool(true)))
        .map(|(k, _)| k)
}

/// Build a `Fields` map from a `json!({...})` literal.
pub fn from_json(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

fn type_error(path: &Path, key: &str, expected: &str, got: &Value) -> StoreError {
    StoreError::decode(
        path,
        format!("field '{key}' expected {expected}, got {got}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Fields {
        from_json(json!({
            "name": "Weaver",
            "gone": null,
            "deleted": true,
            "x": 4.5,
            "actor_1": true,
            "actor_2": false,
        }))
    }

    #[test]
    fn null_and_absent_are_equivalent() {
        let p = Path::new("cards/card_1");
        assert_eq!(opt_str(&sample(), "gone", &p).ok(), Some(None));
        assert_eq!(opt_str(&sample(), "missing", &p).ok(), Some(None));
        assert!(req_str(&sample(), "gone", &p).is_err());
    }

    #[test]
    fn wrong_types_are_rejected_not_coerced() {
        let p = Path::new("cards/card_1");
        assert!(req_str(&sample(), "x", &p).is_err());
        assert!(req_f64(&sample(), "name", &p).is_err());
    }

    #[test]
    fn true_keys_skips_false_and_null() {
        let keys: Vec<_> = true_keys(&sample()).cloned().collect();
        assert!(keys.contains(&"actor_1".to_string()));
        assert!(!keys.contains(&"actor_2".to_string()));
        assert!(!keys.contains(&"gone".to_string()));
    }
}
