//! Entity validation errors.
//!
//! Every rejection produced while constructing an entity is one of four kinds:
//! a missing required field, a constraint violation on a present value, a value
//! of the wrong shape, or a malformed entity reference. Each carries the JSON
//! path of the offending field so the API layer can build a precise response.

use std::fmt;
use std::ops::Deref;

use convert_case::{Case, Casing};
use serde::Serialize;
use thiserror::Error;
use validator::{Validate, ValidationErrorsKind};

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidationError {
    /// A required attribute is absent (or explicitly `null`).
    #[error("missing required field `{field}`")]
    MissingRequiredField { field: String },

    /// A present value violates a declared constraint.
    #[error("field `{field}` violates {rule}")]
    FieldConstraintViolation { field: String, rule: ConstraintRule },

    /// A present value does not have the declared shape.
    #[error("field `{field}` must be {expected}")]
    FieldTypeMismatch { field: String, expected: FieldShape },

    /// A reference does not resolve to a well-formed `{id, type}` pair.
    #[error("field `{field}` is not a valid entity reference: {defect}")]
    InvalidReference { field: String, defect: ReferenceDefect },
}

impl ValidationError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
        }
    }

    pub fn constraint(field: impl Into<String>, rule: ConstraintRule) -> Self {
        Self::FieldConstraintViolation {
            field: field.into(),
            rule,
        }
    }

    pub fn mismatch(field: impl Into<String>, expected: FieldShape) -> Self {
        Self::FieldTypeMismatch {
            field: field.into(),
            expected,
        }
    }

    pub fn reference(field: impl Into<String>, defect: ReferenceDefect) -> Self {
        Self::InvalidReference {
            field: field.into(),
            defect,
        }
    }

    /// Path of the offending field, e.g. `tables[1].type`.
    pub fn field(&self) -> &str {
        match self {
            Self::MissingRequiredField { field }
            | Self::FieldConstraintViolation { field, .. }
            | Self::FieldTypeMismatch { field, .. }
            | Self::InvalidReference { field, .. } => field,
        }
    }
}

/// Declarative constraint that a present value failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum ConstraintRule {
    /// Fewer characters than allowed.
    MinLength { min: u64 },
    /// More characters than allowed.
    MaxLength { max: u64 },
    /// Value does not match the declared pattern.
    Pattern { pattern: String },
    /// Value is not in the declared format (e.g. `uri`).
    Format { format: String },
    /// Numeric value outside the declared bounds.
    Range {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// Attempt to replace an identity that is already assigned.
    Immutable,
}

impl fmt::Display for ConstraintRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinLength { min } => write!(f, "minimum length {min}"),
            Self::MaxLength { max } => write!(f, "maximum length {max}"),
            Self::Pattern { pattern } => write!(f, "pattern `{pattern}`"),
            Self::Format { format } => write!(f, "format `{format}`"),
            Self::Range { min, max } => match (min, max) {
                (Some(min), Some(max)) => write!(f, "range [{min}, {max}]"),
                (Some(min), None) => write!(f, "minimum {min}"),
                (None, Some(max)) => write!(f, "maximum {max}"),
                (None, None) => f.write_str("range"),
            },
            Self::Immutable => f.write_str("immutability"),
        }
    }
}

/// Shape a field is declared to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldShape {
    Object,
    String,
    Uuid,
    Integer,
    Number,
    Date,
    Reference,
    ReferenceList,
    UsageDetails,
    UsageStats,
}

impl fmt::Display for FieldShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Object => "an object",
            Self::String => "a string",
            Self::Uuid => "a UUID string",
            Self::Integer => "an integer",
            Self::Number => "a number",
            Self::Date => "a date (YYYY-MM-DD)",
            Self::Reference => "an entity reference object",
            Self::ReferenceList => "a list of entity references",
            Self::UsageDetails => "a usage details object",
            Self::UsageStats => "a usage stats object",
        };
        f.write_str(text)
    }
}

/// Why a reference failed to resolve to an identifier/type pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "defect", rename_all = "camelCase")]
pub enum ReferenceDefect {
    MissingId,
    EmptyId,
    IdNotString,
    MissingType,
    TypeNotString,
    UnknownType { value: String },
}

impl fmt::Display for ReferenceDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingId => f.write_str("`id` is missing"),
            Self::EmptyId => f.write_str("`id` is empty"),
            Self::IdNotString => f.write_str("`id` must be a string"),
            Self::MissingType => f.write_str("`type` is missing"),
            Self::TypeNotString => f.write_str("`type` must be a string"),
            Self::UnknownType { value } => write!(f, "unknown entity type `{value}`"),
        }
    }
}

/// All violations found in one construction attempt. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Wraps collected violations; `None` when there is nothing to report.
    pub fn from_vec(errors: Vec<ValidationError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    pub fn single(error: ValidationError) -> Self {
        Self(vec![error])
    }

    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }
}

impl Deref for ValidationErrors {
    type Target = [ValidationError];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Flattens `validator` derive output into path-addressed violations.
///
/// Keys are reported in JSON spelling (`usage_summary` becomes `usageSummary`)
/// and sorted by path.
pub(crate) fn flatten_rule_errors(
    errors: &validator::ValidationErrors,
    prefix: &str,
) -> Vec<ValidationError> {
    let mut out = Vec::new();
    collect_rule_errors(errors, prefix, &mut out);
    out.sort_by(|a, b| a.field().cmp(b.field()));
    out
}

/// Runs the declarative rules of `target` and records what fails under `prefix`.
pub(crate) fn check_rules(
    target: &impl Validate,
    prefix: &str,
    errors: &mut Vec<ValidationError>,
) {
    if let Err(rule_errors) = target.validate() {
        errors.extend(flatten_rule_errors(&rule_errors, prefix));
    }
}

/// Rule code for a reference identifier that must not be empty.
pub(crate) const REFERENCE_ID_CODE: &str = "reference_id";

/// Rule code for a value that must not contain a separator character.
pub(crate) const PATTERN_CODE: &str = "pattern";

fn collect_rule_errors(
    errors: &validator::ValidationErrors,
    prefix: &str,
    out: &mut Vec<ValidationError>,
) {
    for (key, kind) in errors.errors() {
        let key = json_key(&key.to_string());
        let path = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };
        match kind {
            ValidationErrorsKind::Field(rule_errors) => {
                out.extend(rule_errors.iter().map(|e| map_rule_error(prefix, &path, e)));
            }
            ValidationErrorsKind::Struct(nested) => collect_rule_errors(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_rule_errors(nested, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

fn map_rule_error(parent: &str, path: &str, error: &validator::ValidationError) -> ValidationError {
    let param_u64 = |name: &str| error.params.get(name).and_then(|v| v.as_u64());
    let param_f64 = |name: &str| error.params.get(name).and_then(|v| v.as_f64());

    let rule = match error.code.as_ref() {
        REFERENCE_ID_CODE => {
            let at = if parent.is_empty() { "$" } else { parent };
            return ValidationError::reference(at, ReferenceDefect::EmptyId);
        }
        "length" => {
            let length = error
                .params
                .get("value")
                .and_then(|v| v.as_str())
                .map(|s| s.chars().count() as u64);
            match (length, param_u64("min"), param_u64("max")) {
                (Some(len), Some(min), _) if len < min => ConstraintRule::MinLength { min },
                (_, _, Some(max)) => ConstraintRule::MaxLength { max },
                (_, min, None) => ConstraintRule::MinLength {
                    min: min.unwrap_or_default(),
                },
            }
        }
        PATTERN_CODE => ConstraintRule::Pattern {
            pattern: error
                .params
                .get("pattern")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
        },
        "url" => ConstraintRule::Format {
            format: "uri".to_string(),
        },
        "range" => ConstraintRule::Range {
            min: param_f64("min"),
            max: param_f64("max"),
        },
        other => ConstraintRule::Format {
            format: other.to_string(),
        },
    };
    ValidationError::constraint(path, rule)
}

/// `snake_case` struct field name to its `camelCase` JSON key.
fn json_key(field: &str) -> String {
    field.to_case(Case::Camel)
}
