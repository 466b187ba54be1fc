//! Catalog storage.
//!
//! Stores validated `Database` records keyed by id, with the fully qualified
//! name as a second unique key. Stores never build records themselves: what
//! comes back out has been through `Database::construct`.

mod memory;
mod sqlite;

pub use memory::MemoryRepository;
pub use sqlite::SqliteRepository;

use async_trait::async_trait;
use common::errors::{AppError, AppResult};
use common::models::Database;
use common::utils::FullyQualifiedName;
use uuid::Uuid;

/// List parameters after clamping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Only databases hosted by this service name.
    pub service: Option<String>,
    pub offset: u64,
    pub limit: u32,
}

/// Storage backend for database records.
#[async_trait]
pub trait DatabaseRepository: Send + Sync {
    /// Inserts a stored record; fails with `EntityExists` on a taken id or FQN.
    async fn insert(&self, database: &Database) -> AppResult<()>;

    /// Replaces the record with the same id.
    async fn update(&self, database: &Database) -> AppResult<()>;

    async fn get(&self, id: Uuid) -> AppResult<Option<Database>>;

    async fn get_by_fqn(&self, fqn: &str) -> AppResult<Option<Database>>;

    /// One page ordered by FQN, plus the total number of matches.
    async fn list(&self, filter: &ListFilter) -> AppResult<(Vec<Database>, u64)>;

    /// Removes and returns the record, if present.
    async fn delete(&self, id: Uuid) -> AppResult<Option<Database>>;

    async fn count(&self) -> AppResult<u64>;
}

/// Keys every stored record must carry.
pub(crate) struct StoredKeys {
    pub id: Uuid,
    pub fqn: String,
    pub service_name: Option<String>,
}

impl StoredKeys {
    pub(crate) fn of(database: &Database) -> AppResult<Self> {
        let id = database
            .id()
            .ok_or_else(|| AppError::Internal("record stored without id".into()))?;
        let fqn = database
            .fully_qualified_name()
            .ok_or_else(|| AppError::Internal("record stored without fully qualified name".into()))?
            .to_string();
        Ok(Self {
            id,
            service_name: service_name(database),
            fqn,
        })
    }
}

/// Name of the hosting service: the reference's name, or the first FQN part.
pub(crate) fn service_name(database: &Database) -> Option<String> {
    database
        .service()
        .name()
        .map(str::to_string)
        .or_else(|| {
            database
                .fully_qualified_name()
                .and_then(|fqn| FullyQualifiedName::split(fqn).into_iter().next())
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// Stored-form record as the service would persist it.
    pub(crate) fn stored(service: &str, name: &str) -> Database {
        let id = Uuid::new_v4();
        Database::construct(&json!({
            "id": id.to_string(),
            "name": name,
            "fullyQualifiedName": FullyQualifiedName::build(&[service, name]),
            "service": { "id": format!("{service}-id"), "type": "databaseService", "name": service },
        }))
        .unwrap()
    }

    /// Contract every repository implementation must satisfy.
    pub(crate) async fn exercise_repository(repo: &dyn DatabaseRepository) {
        let a = stored("mysql_prod", "sales");
        let b = stored("mysql_prod", "billing");
        let c = stored("pg_dev", "scratch");
        for db in [&a, &b, &c] {
            repo.insert(db).await.unwrap();
        }
        assert_eq!(repo.count().await.unwrap(), 3);

        // Duplicate id and duplicate FQN are both conflicts, naming the key.
        let a_id = a.id().unwrap().to_string();
        let same_id = Database::construct(&json!({
            "id": a_id,
            "name": "other",
            "fullyQualifiedName": "mysql_prod.other",
            "service": { "id": "mysql_prod-id", "type": "databaseService", "name": "mysql_prod" },
        }))
        .unwrap();
        assert!(matches!(
            repo.insert(&same_id).await,
            Err(AppError::EntityExists(key)) if key == a_id
        ));
        let same_fqn = stored("mysql_prod", "sales");
        assert!(matches!(
            repo.insert(&same_fqn).await,
            Err(AppError::EntityExists(key)) if key == "mysql_prod.sales"
        ));

        assert_eq!(repo.get(a.id().unwrap()).await.unwrap(), Some(a.clone()));
        assert_eq!(
            repo.get_by_fqn("mysql_prod.billing").await.unwrap(),
            Some(b.clone())
        );
        assert_eq!(repo.get(Uuid::new_v4()).await.unwrap(), None);

        let (page, total) = repo
            .list(&ListFilter {
                service: None,
                offset: 0,
                limit: 2,
            })
            .await
            .unwrap();
        assert_eq!(total, 3);
        let names: Vec<&str> = page.iter().map(|d| d.name()).collect();
        assert_eq!(names, ["billing", "sales"]);

        let (page, total) = repo
            .list(&ListFilter {
                service: Some("pg_dev".into()),
                offset: 0,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].name(), "scratch");

        let (page, total) = repo
            .list(&ListFilter {
                service: None,
                offset: 2,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);

        let described = Database::construct(&json!({
            "id": a.id().unwrap().to_string(),
            "name": "sales",
            "fullyQualifiedName": "mysql_prod.sales",
            "description": "orders",
            "service": { "id": "mysql_prod-id", "type": "databaseService", "name": "mysql_prod" },
        }))
        .unwrap();
        repo.update(&described).await.unwrap();
        assert_eq!(
            repo.get(a.id().unwrap())
                .await
                .unwrap()
                .and_then(|d| d.description().map(str::to_string)),
            Some("orders".to_string())
        );

        assert_eq!(repo.delete(c.id().unwrap()).await.unwrap(), Some(c.clone()));
        assert_eq!(repo.delete(c.id().unwrap()).await.unwrap(), None);
        assert_eq!(repo.count().await.unwrap(), 2);

        let missing = stored("nowhere", "ghost");
        assert!(matches!(
            repo.update(&missing).await,
            Err(AppError::DatabaseNotFound(_))
        ));
    }

    #[test]
    fn test_service_name_prefers_reference_name() {
        let db = stored("mysql_prod", "sales");
        assert_eq!(service_name(&db).as_deref(), Some("mysql_prod"));
    }

    #[test]
    fn test_service_name_falls_back_to_fqn() {
        let db = Database::construct(&json!({
            "name": "sales",
            "fullyQualifiedName": "\"prod.eu\".sales",
            "service": { "id": "svc", "type": "databaseService" },
        }))
        .unwrap();
        assert_eq!(service_name(&db).as_deref(), Some("prod.eu"));
    }
}
