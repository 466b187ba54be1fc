//! Shape checks over raw JSON input.
//!
//! Readers never stop at the first problem: every defect is pushed onto the
//! caller's error list and the reader returns `None` for the affected value.

use chrono::NaiveDate;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::validation::{ConstraintRule, FieldShape, ValidationError};

/// Date layout used by usage snapshots.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Field access over one JSON object, tracking the object's path.
pub(crate) struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    prefix: String,
}

impl<'a> FieldReader<'a> {
    /// Opens `value` as an object, recording a mismatch against `path` otherwise.
    pub(crate) fn open(
        value: &'a Value,
        path: &str,
        shape: FieldShape,
        errors: &mut Vec<ValidationError>,
    ) -> Option<Self> {
        match value {
            Value::Object(object) => Some(Self {
                object,
                prefix: path.to_string(),
            }),
            _ => {
                let field = if path.is_empty() { "$" } else { path };
                errors.push(ValidationError::mismatch(field, shape));
                None
            }
        }
    }

    /// Path of `key` inside this object.
    pub(crate) fn path(&self, key: &str) -> String {
        join_path(&self.prefix, key)
    }

    /// Present, non-null value of `key`. A JSON `null` counts as absent.
    pub(crate) fn get(&self, key: &str) -> Option<&'a Value> {
        self.object.get(key).filter(|v| !v.is_null())
    }

    pub(crate) fn required<T>(
        &self,
        key: &str,
        errors: &mut Vec<ValidationError>,
        read: impl FnOnce(&'a Value, &str, &mut Vec<ValidationError>) -> Option<T>,
    ) -> Option<T> {
        let path = self.path(key);
        match self.get(key) {
            Some(value) => read(value, &path, errors),
            None => {
                errors.push(ValidationError::missing(path));
                None
            }
        }
    }

    pub(crate) fn optional<T>(
        &self,
        key: &str,
        errors: &mut Vec<ValidationError>,
        read: impl FnOnce(&'a Value, &str, &mut Vec<ValidationError>) -> Option<T>,
    ) -> Option<T> {
        let value = self.get(key)?;
        read(value, &self.path(key), errors)
    }
}

pub(crate) fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

pub(crate) fn read_string(
    value: &Value,
    path: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        _ => {
            errors.push(ValidationError::mismatch(path, FieldShape::String));
            None
        }
    }
}

pub(crate) fn read_uuid(
    value: &Value,
    path: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<Uuid> {
    match value.as_str().map(Uuid::parse_str) {
        Some(Ok(id)) => Some(id),
        _ => {
            errors.push(ValidationError::mismatch(path, FieldShape::Uuid));
            None
        }
    }
}

pub(crate) fn read_date(
    value: &Value,
    path: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<NaiveDate> {
    match value
        .as_str()
        .map(|s| NaiveDate::parse_from_str(s, DATE_FORMAT))
    {
        Some(Ok(date)) => Some(date),
        _ => {
            errors.push(ValidationError::mismatch(path, FieldShape::Date));
            None
        }
    }
}

/// Non-negative integer. A negative integer is a range violation, anything
/// else a shape mismatch.
pub(crate) fn read_count(
    value: &Value,
    path: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let error = if value.is_i64() {
        ValidationError::constraint(
            path,
            ConstraintRule::Range {
                min: Some(0.0),
                max: None,
            },
        )
    } else {
        ValidationError::mismatch(path, FieldShape::Integer)
    };
    errors.push(error);
    None
}

pub(crate) fn read_number(
    value: &Value,
    path: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<f64> {
    match value.as_f64() {
        Some(n) => Some(n),
        None => {
            errors.push(ValidationError::mismatch(path, FieldShape::Number));
            None
        }
    }
}
