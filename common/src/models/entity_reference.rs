//! Weak references between catalog entities.
//!
//! A reference names another entity by `{id, type}` and carries no ownership:
//! the referenced entity lives and is managed elsewhere, and nothing here ever
//! loads it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::validation::{
    check_rules, FieldShape, ReferenceDefect, ValidationError, ValidationErrors,
};
use crate::models::reader::{read_string, FieldReader};

/// Kind of entity a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    /// Database service / cluster hosting databases.
    DatabaseService,
    /// Database inside a service.
    Database,
    /// Schema inside a database.
    DatabaseSchema,
    /// Table inside a database.
    Table,
    /// Individual user.
    User,
    /// Team of users.
    Team,
    /// Search service (ElasticSearch, OpenSearch).
    SearchService,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::DatabaseService,
        EntityKind::Database,
        EntityKind::DatabaseSchema,
        EntityKind::Table,
        EntityKind::User,
        EntityKind::Team,
        EntityKind::SearchService,
    ];

    /// Canonical wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::DatabaseService => "databaseService",
            EntityKind::Database => "database",
            EntityKind::DatabaseSchema => "databaseSchema",
            EntityKind::Table => "table",
            EntityKind::User => "user",
            EntityKind::Team => "team",
            EntityKind::SearchService => "searchService",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity type string that names none of the known kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown entity type `{0}`")]
pub struct UnknownEntityKind(pub String);

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    /// Matches the canonical spelling ASCII case-insensitively, so both
    /// `databaseService` and `DatabaseService` resolve.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| UnknownEntityKind(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for EntityKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Reference to another entity by id and type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntityReference {
    /// Identifier of the referenced entity.
    id: String,

    /// Kind of the referenced entity.
    #[serde(rename = "type")]
    kind: EntityKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    fully_qualified_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,

    /// Link to the referenced resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    href: Option<String>,
}

/// Whatever parsed of a reference, carrying its rules.
#[derive(Debug, Default, Validate)]
struct ReferenceDraft {
    #[validate(length(min = 1, code = "reference_id"))]
    id: Option<String>,

    kind: Option<EntityKind>,

    name: Option<String>,

    fully_qualified_name: Option<String>,

    description: Option<String>,

    display_name: Option<String>,

    #[validate(url)]
    href: Option<String>,
}

impl EntityReference {
    /// Builds a reference from a JSON value, checking shape and rules.
    pub fn construct(input: &Value) -> Result<Self, ValidationErrors> {
        let mut errors = Vec::new();
        let reference = Self::read(input, "", &mut errors);
        match (ValidationErrors::from_vec(errors), reference) {
            (None, Some(reference)) => Ok(reference),
            (Some(errors), _) => Err(errors),
            (None, None) => Err(ValidationErrors::single(ValidationError::mismatch(
                "$",
                FieldShape::Reference,
            ))),
        }
    }

    /// Reads a reference at `path`. The rules run over every field that
    /// parsed, even when `id` or `type` is defective.
    pub(crate) fn read(
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Option<Self> {
        let reader = FieldReader::open(value, path, FieldShape::Reference, errors)?;
        let at = if path.is_empty() { "$" } else { path };

        let id = match reader.get("id") {
            None => {
                errors.push(ValidationError::reference(at, ReferenceDefect::MissingId));
                None
            }
            Some(Value::String(id)) => Some(id.clone()),
            Some(_) => {
                errors.push(ValidationError::reference(at, ReferenceDefect::IdNotString));
                None
            }
        };

        let kind = match reader.get("type") {
            None => {
                errors.push(ValidationError::reference(at, ReferenceDefect::MissingType));
                None
            }
            Some(Value::String(raw)) => match raw.parse::<EntityKind>() {
                Ok(kind) => Some(kind),
                Err(UnknownEntityKind(value)) => {
                    errors.push(ValidationError::reference(
                        at,
                        ReferenceDefect::UnknownType { value },
                    ));
                    None
                }
            },
            Some(_) => {
                errors.push(ValidationError::reference(at, ReferenceDefect::TypeNotString));
                None
            }
        };

        let draft = ReferenceDraft {
            id,
            kind,
            name: reader.optional("name", errors, read_string),
            fully_qualified_name: reader.optional("fullyQualifiedName", errors, read_string),
            description: reader.optional("description", errors, read_string),
            display_name: reader.optional("displayName", errors, read_string),
            href: reader.optional("href", errors, read_string),
        };
        check_rules(&draft, path, errors);

        Some(Self {
            id: draft.id.filter(|id| !id.is_empty())?,
            kind: draft.kind?,
            name: draft.name,
            fully_qualified_name: draft.fully_qualified_name,
            description: draft.description,
            display_name: draft.display_name,
            href: draft.href,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn fully_qualified_name(&self) -> Option<&str> {
        self.fully_qualified_name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }
}

impl<'de> Deserialize<'de> for EntityReference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::construct(&value).map_err(serde::de::Error::custom)
    }
}

/// Reads a JSON array of references. Every item is read and checked; the
/// list is kept only when all of them pass.
pub(crate) fn read_reference_list(
    value: &Value,
    path: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<Vec<EntityReference>> {
    let Value::Array(items) = value else {
        errors.push(ValidationError::mismatch(path, FieldShape::ReferenceList));
        return None;
    };

    let before = errors.len();
    let references: Vec<EntityReference> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| EntityReference::read(item, &format!("{path}[{index}]"), errors))
        .collect();

    (errors.len() == before).then_some(references)
}
