//! Database catalog entity.
//!
//! A `Database` is a catalogued database instance hosted by a database
//! service. Values are only ever produced by [`Database::construct`] (or by
//! deserialization, which goes through it), so every value in hand satisfies
//! the schema:
//!
//! - `name` is 1–64 characters and contains no `.`, the separator used in
//!   fully qualified names;
//! - `service` is always present;
//! - `id`, once assigned, never changes.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::errors::validation::{
    check_rules, ConstraintRule, FieldShape, ValidationError, ValidationErrors,
    PATTERN_CODE,
};
use crate::models::entity_reference::{read_reference_list, EntityReference};
use crate::models::reader::{read_string, read_uuid, FieldReader};
use crate::models::usage::UsageDetails;

/// Pattern every database name must match.
pub const DATABASE_NAME_PATTERN: &str = "^[^.]*$";

/// Maximum length of a database name, in characters.
pub const DATABASE_NAME_MAX_LENGTH: u64 = 64;

/// Validated database entity.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    /// Unique identifier, absent until the record is stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Uuid>,

    /// Name that identifies the database.
    name: String,

    /// `ServiceName.DatabaseName`.
    #[serde(skip_serializing_if = "Option::is_none")]
    fully_qualified_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    /// Link to the resource corresponding to this entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    href: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    owner: Option<EntityReference>,

    /// Database service / cluster hosting this database.
    service: EntityReference,

    /// Latest usage information for this database.
    #[serde(skip_serializing_if = "Option::is_none")]
    usage_summary: Option<UsageDetails>,

    /// References to tables in the database.
    #[serde(skip_serializing_if = "Option::is_none")]
    tables: Option<Vec<EntityReference>>,
}

/// Field-by-field candidate carrying the top-level rules. Absent fields stay
/// `None` so the rules run over whatever did parse; nested values check
/// their own rules as they are read.
#[derive(Debug, Default, Validate)]
struct DatabaseDraft {
    id: Option<Uuid>,

    #[validate(
        length(min = 1, max = 64),
        custom(function = "reject_name_separator")
    )]
    name: Option<String>,

    fully_qualified_name: Option<String>,

    description: Option<String>,

    #[validate(url)]
    href: Option<String>,

    owner: Option<EntityReference>,

    service: Option<EntityReference>,

    usage_summary: Option<UsageDetails>,

    tables: Option<Vec<EntityReference>>,
}

fn reject_name_separator(name: &str) -> Result<(), validator::ValidationError> {
    if name.contains('.') {
        let mut error = validator::ValidationError::new(PATTERN_CODE);
        error.add_param("pattern".into(), &DATABASE_NAME_PATTERN);
        return Err(error);
    }
    Ok(())
}

impl DatabaseDraft {
    fn read(input: &Value, errors: &mut Vec<ValidationError>) -> Self {
        let Some(reader) = FieldReader::open(input, "", FieldShape::Object, errors) else {
            return Self::default();
        };

        Self {
            id: reader.optional("id", errors, read_uuid),
            name: reader.required("name", errors, read_string),
            fully_qualified_name: reader.optional("fullyQualifiedName", errors, read_string),
            description: reader.optional("description", errors, read_string),
            href: reader.optional("href", errors, read_string),
            owner: reader.optional("owner", errors, EntityReference::read),
            service: reader.required("service", errors, EntityReference::read),
            usage_summary: reader.optional("usageSummary", errors, UsageDetails::read),
            tables: reader.optional("tables", errors, read_reference_list),
        }
    }

    fn into_database(self) -> Result<Database, ValidationErrors> {
        let (name, service) = match (self.name, self.service) {
            (Some(name), Some(service)) => (name, service),
            (name, _) => {
                let field = if name.is_none() { "name" } else { "service" };
                return Err(ValidationErrors::single(ValidationError::missing(field)));
            }
        };
        Ok(Database {
            id: self.id,
            name,
            fully_qualified_name: self.fully_qualified_name,
            description: self.description,
            href: self.href,
            owner: self.owner,
            service,
            usage_summary: self.usage_summary,
            tables: self.tables,
        })
    }
}

impl From<Database> for DatabaseDraft {
    fn from(database: Database) -> Self {
        Self {
            id: database.id,
            name: Some(database.name),
            fully_qualified_name: database.fully_qualified_name,
            description: database.description,
            href: database.href,
            owner: database.owner,
            service: Some(database.service),
            usage_summary: database.usage_summary,
            tables: database.tables,
        }
    }
}

impl Database {
    /// Validates structured input and builds a `Database`.
    ///
    /// Every field is checked; the error lists all violations found. JSON
    /// `null` on an optional field is treated as absent and unknown keys are
    /// ignored. No I/O is performed and referenced entities are never loaded.
    pub fn construct(input: &Value) -> Result<Self, ValidationErrors> {
        let mut errors = Vec::new();
        let draft = DatabaseDraft::read(input, &mut errors);
        check_rules(&draft, "", &mut errors);

        if let Some(errors) = ValidationErrors::from_vec(errors) {
            return Err(errors);
        }
        draft.into_database()
    }

    /// Canonical JSON form: camelCase keys, absent optional fields omitted.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Re-runs the top-level rules over this value. Nested values cannot
    /// change after construction and were checked when read.
    pub fn revalidate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        check_rules(&DatabaseDraft::from(self.clone()), "", &mut errors);
        match ValidationErrors::from_vec(errors) {
            Some(errors) => Err(errors),
            None => Ok(()),
        }
    }

    /// Assigns the stable identity. Re-assigning the same id is a no-op;
    /// replacing a different one is rejected.
    pub fn with_id(mut self, id: Uuid) -> Result<Self, ValidationError> {
        match self.id {
            Some(existing) if existing != id => {
                Err(ValidationError::constraint("id", ConstraintRule::Immutable))
            }
            _ => {
                self.id = Some(id);
                Ok(self)
            }
        }
    }

    pub fn with_fully_qualified_name(mut self, fqn: impl Into<String>) -> Self {
        self.fully_qualified_name = Some(fqn.into());
        self
    }

    /// Sets the canonical resource link; it must be an absolute URI.
    pub fn with_href(mut self, href: impl Into<String>) -> Result<Self, ValidationErrors> {
        self.href = Some(href.into());
        self.revalidate()?;
        Ok(self)
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fully_qualified_name(&self) -> Option<&str> {
        self.fully_qualified_name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    pub fn owner(&self) -> Option<&EntityReference> {
        self.owner.as_ref()
    }

    pub fn service(&self) -> &EntityReference {
        &self.service
    }

    pub fn usage_summary(&self) -> Option<&UsageDetails> {
        self.usage_summary.as_ref()
    }

    pub fn tables(&self) -> Option<&[EntityReference]> {
        self.tables.as_deref()
    }
}

impl<'de> Deserialize<'de> for Database {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::construct(&value).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<&Value> for Database {
    type Error = ValidationErrors;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Self::construct(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::validation::ReferenceDefect;
    use crate::models::entity_reference::EntityKind;
    use serde_json::json;

    fn service() -> Value {
        json!({ "id": "svc-1", "type": "DatabaseService" })
    }

    fn full_input() -> Value {
        json!({
            "id": "6a3c1a2e-5b8f-4d37-9d8e-0c1f2b3a4d5e",
            "name": "sales_db",
            "fullyQualifiedName": "mysql_prod.sales_db",
            "description": "Orders and invoices",
            "href": "http://localhost:8585/api/v1/databases/6a3c1a2e-5b8f-4d37-9d8e-0c1f2b3a4d5e",
            "owner": { "id": "team-7", "type": "team", "name": "finance" },
            "service": { "id": "svc-1", "type": "databaseService", "name": "mysql_prod" },
            "usageSummary": {
                "dailyStats": { "count": 42, "percentileRank": 87.5 },
                "monthlyStats": { "count": 900 },
                "date": "2021-09-09"
            },
            "tables": [
                { "id": "t-1", "type": "table", "name": "orders" },
                { "id": "t-2", "type": "table", "name": "invoices" }
            ]
        })
    }

    fn has(errors: &ValidationErrors, expected: &ValidationError) -> bool {
        errors.iter().any(|e| e == expected)
    }

    #[test]
    fn test_minimal_record() {
        let db = Database::construct(&json!({ "name": "sales_db", "service": service() }))
            .unwrap();

        assert_eq!(db.name(), "sales_db");
        assert_eq!(db.service().id(), "svc-1");
        assert_eq!(db.service().kind(), EntityKind::DatabaseService);
        assert!(db.id().is_none());
        assert!(db.owner().is_none());
        assert!(db.tables().is_none());
        assert!(db.description().is_none());

        let out = db.to_value().unwrap();
        let keys: Vec<&str> = out.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"name") && keys.contains(&"service"));
    }

    #[test]
    fn test_name_with_separator_is_rejected() {
        let errors =
            Database::construct(&json!({ "name": "bad.name", "service": service() })).unwrap_err();
        assert_eq!(
            errors.into_vec(),
            vec![ValidationError::constraint(
                "name",
                ConstraintRule::Pattern {
                    pattern: DATABASE_NAME_PATTERN.to_string()
                }
            )]
        );
    }

    #[test]
    fn test_missing_service_is_rejected() {
        let errors = Database::construct(&json!({ "name": "sales_db" })).unwrap_err();
        assert_eq!(errors.into_vec(), vec![ValidationError::missing("service")]);
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let errors =
            Database::construct(&json!({ "name": "", "service": service() })).unwrap_err();
        assert_eq!(
            errors.into_vec(),
            vec![ValidationError::constraint(
                "name",
                ConstraintRule::MinLength { min: 1 }
            )]
        );
    }

    #[test]
    fn test_name_length_bounds() {
        let exact = "a".repeat(64);
        assert!(Database::construct(&json!({ "name": exact, "service": service() })).is_ok());

        let long = "a".repeat(65);
        let errors =
            Database::construct(&json!({ "name": long, "service": service() })).unwrap_err();
        assert_eq!(
            errors.into_vec(),
            vec![ValidationError::constraint(
                "name",
                ConstraintRule::MaxLength {
                    max: DATABASE_NAME_MAX_LENGTH
                }
            )]
        );

        // Length counts characters, not bytes.
        let wide = "é".repeat(64);
        assert!(Database::construct(&json!({ "name": wide, "service": service() })).is_ok());
    }

    #[test]
    fn test_long_dotted_name_reports_both_rules() {
        let name = format!("{}.x", "a".repeat(70));
        let errors =
            Database::construct(&json!({ "name": name, "service": service() })).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(has(
            &errors,
            &ValidationError::constraint("name", ConstraintRule::MaxLength { max: 64 })
        ));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::FieldConstraintViolation {
                rule: ConstraintRule::Pattern { .. },
                ..
            }
        )));
    }

    #[test]
    fn test_null_required_fields_are_missing() {
        let errors =
            Database::construct(&json!({ "name": null, "service": null })).unwrap_err();
        assert_eq!(
            errors.into_vec(),
            vec![
                ValidationError::missing("name"),
                ValidationError::missing("service")
            ]
        );
    }

    #[test]
    fn test_every_violation_is_reported() {
        let errors = Database::construct(&json!({
            "id": "nope",
            "name": "a.b",
            "description": 5,
            "owner": "alice",
            "service": { "id": "svc-1", "type": "spaceship" },
            "tables": { "id": "t-1" },
        }))
        .unwrap_err();

        assert!(has(&errors, &ValidationError::mismatch("id", FieldShape::Uuid)));
        assert!(has(
            &errors,
            &ValidationError::mismatch("description", FieldShape::String)
        ));
        assert!(has(
            &errors,
            &ValidationError::mismatch("owner", FieldShape::Reference)
        ));
        assert!(has(
            &errors,
            &ValidationError::reference(
                "service",
                ReferenceDefect::UnknownType {
                    value: "spaceship".into()
                }
            )
        ));
        assert!(has(
            &errors,
            &ValidationError::mismatch("tables", FieldShape::ReferenceList)
        ));
        assert!(has(
            &errors,
            &ValidationError::constraint(
                "name",
                ConstraintRule::Pattern {
                    pattern: DATABASE_NAME_PATTERN.into()
                }
            )
        ));
        assert_eq!(errors.len(), 6);
    }

    #[test]
    fn test_malformed_service_reference() {
        let errors = Database::construct(&json!({
            "name": "sales_db",
            "service": { "id": "", "type": "databaseService" },
        }))
        .unwrap_err();
        assert_eq!(
            errors.into_vec(),
            vec![ValidationError::reference("service", ReferenceDefect::EmptyId)]
        );
    }

    #[test]
    fn test_nested_rule_paths() {
        let errors = Database::construct(&json!({
            "name": "sales_db",
            "service": service(),
            "href": "relative/path",
            "tables": [
                { "id": "t-1", "type": "table" },
                { "id": "t-2", "type": "table", "href": "::" }
            ],
            "usageSummary": {
                "dailyStats": { "count": 1, "percentileRank": -4 },
                "date": "2021-09-09"
            }
        }))
        .unwrap_err();

        let uri = ConstraintRule::Format {
            format: "uri".into(),
        };
        assert!(has(&errors, &ValidationError::constraint("href", uri.clone())));
        assert!(has(&errors, &ValidationError::constraint("tables[1].href", uri)));
        assert!(has(
            &errors,
            &ValidationError::constraint(
                "usageSummary.dailyStats.percentileRank",
                ConstraintRule::Range {
                    min: Some(0.0),
                    max: Some(100.0)
                }
            )
        ));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_rules_run_beside_shape_defects() {
        let errors = Database::construct(&json!({
            "name": "sales_db",
            "service": { "id": "svc-1", "type": "databaseService", "href": "not a uri" },
            "owner": { "id": "team-7", "href": "also bad" },
            "tables": [
                { "id": "t-1", "type": "table", "href": "bad uri" },
                "t-3"
            ],
            "usageSummary": {
                "dailyStats": { "count": -5 },
                "weeklyStats": "oops",
                "date": "2021-09-09"
            }
        }))
        .unwrap_err();

        let uri = || ConstraintRule::Format {
            format: "uri".into(),
        };
        assert_eq!(
            errors.into_vec(),
            vec![
                ValidationError::reference("owner", ReferenceDefect::MissingType),
                ValidationError::constraint("owner.href", uri()),
                ValidationError::constraint("service.href", uri()),
                ValidationError::constraint(
                    "usageSummary.dailyStats.count",
                    ConstraintRule::Range {
                        min: Some(0.0),
                        max: None
                    }
                ),
                ValidationError::mismatch("usageSummary.weeklyStats", FieldShape::UsageStats),
                ValidationError::constraint("tables[0].href", uri()),
                ValidationError::mismatch("tables[1]", FieldShape::Reference),
            ]
        );
    }

    #[test]
    fn test_non_object_input() {
        let errors = Database::construct(&json!("sales_db")).unwrap_err();
        assert_eq!(
            errors.into_vec(),
            vec![ValidationError::mismatch("$", FieldShape::Object)]
        );
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let db = Database::construct(&json!({
            "name": "sales_db",
            "service": service(),
            "version": 0.1,
        }))
        .unwrap();
        assert!(db.to_value().unwrap().get("version").is_none());
    }

    #[test]
    fn test_round_trip() {
        let db = Database::construct(&full_input()).unwrap();
        let again = Database::construct(&db.to_value().unwrap()).unwrap();
        assert_eq!(db, again);
    }

    #[test]
    fn test_serialized_form_is_normalized_input() {
        let db = Database::construct(&full_input()).unwrap();
        assert_eq!(db.to_value().unwrap(), full_input());

        // The reference kind is normalized to its canonical spelling.
        let minimal =
            Database::construct(&json!({ "name": "sales_db", "service": service() })).unwrap();
        assert_eq!(
            minimal.to_value().unwrap()["service"]["type"],
            json!("databaseService")
        );
    }

    #[test]
    fn test_revalidation_is_idempotent() {
        let db = Database::construct(&full_input()).unwrap();
        assert!(db.revalidate().is_ok());
        let value = db.to_value().unwrap();
        for _ in 0..3 {
            let again = Database::construct(&value).unwrap();
            assert_eq!(again.to_value().unwrap(), value);
        }
    }

    #[test]
    fn test_serde_entry_point_validates() {
        let ok: Database =
            serde_json::from_value(json!({ "name": "sales_db", "service": service() })).unwrap();
        assert_eq!(ok.name(), "sales_db");

        let err = serde_json::from_value::<Database>(json!({ "name": "a.b", "service": service() }))
            .unwrap_err();
        assert!(err.to_string().contains("pattern"));
    }

    #[test]
    fn test_id_is_immutable_once_assigned() {
        let first = Uuid::new_v4();
        let db = Database::construct(&json!({ "name": "sales_db", "service": service() }))
            .unwrap()
            .with_id(first)
            .unwrap();
        assert_eq!(db.id(), Some(first));

        let same = db.clone().with_id(first).unwrap();
        assert_eq!(same.id(), Some(first));

        let err = db.with_id(Uuid::new_v4()).unwrap_err();
        assert_eq!(err, ValidationError::constraint("id", ConstraintRule::Immutable));
    }

    #[test]
    fn test_with_href_checks_uri() {
        let db = Database::construct(&json!({ "name": "sales_db", "service": service() }))
            .unwrap();
        assert!(db.clone().with_href("http://catalog/api/v1/databases/1").is_ok());
        assert!(db.with_href("no scheme").is_err());
    }

    #[test]
    fn test_concurrent_construction() {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                std::thread::spawn(move || {
                    Database::construct(&json!({ "name": format!("db_{i}"), "service": service() }))
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
    }
}
