//! SQLite-backed catalog store.
//!
//! Records are kept as their canonical JSON body next to the lookup keys and
//! are re-validated through `Database::construct` when read back.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use common::errors::{AppError, AppResult};
use common::models::Database;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{DatabaseRepository, ListFilter, StoredKeys};

/// Store backed by a SQLite database file (or `sqlite::memory:`).
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens the store at `url`, creating the file and table when missing.
    pub async fn connect(url: &str, max_connections: u32, timeout_secs: u64) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::StorageConnection(format!("invalid storage url: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| AppError::StorageConnection(e.to_string()))?;

        let repo = Self { pool };
        repo.ensure_table().await?;
        Ok(repo)
    }

    async fn ensure_table(&self) -> AppResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS catalog_databases (
                id           TEXT NOT NULL PRIMARY KEY,
                fqn          TEXT NOT NULL UNIQUE,
                service_name TEXT,
                body         TEXT NOT NULL,
                updated_at   TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::StorageQuery(format!("failed to create catalog table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_catalog_databases_service
             ON catalog_databases (service_name)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::StorageQuery(format!("failed to create catalog index: {e}")))?;

        tracing::info!("catalog table `catalog_databases` ensured");
        Ok(())
    }

    async fn fetch_one_where(&self, column: &str, key: String) -> AppResult<Option<Database>> {
        let sql = format!("SELECT body FROM catalog_databases WHERE {column} = ?");
        let row: Option<(String,)> = sqlx::query_as(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        row.map(|(body,)| decode(&body)).transpose()
    }
}

fn query_error(error: sqlx::Error) -> AppError {
    AppError::StorageQuery(error.to_string())
}

/// Maps unique-key violations to `EntityExists`, naming the key that collided.
fn write_error(error: sqlx::Error, keys: &StoredKeys) -> AppError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            if db.message().contains("catalog_databases.id") {
                AppError::EntityExists(keys.id.to_string())
            } else {
                AppError::EntityExists(keys.fqn.clone())
            }
        }
        _ => query_error(error),
    }
}

fn encode(database: &Database) -> AppResult<String> {
    Ok(serde_json::to_string(database)?)
}

fn decode(body: &str) -> AppResult<Database> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    Database::try_from(&value)
        .map_err(|e| AppError::Internal(format!("stored record failed validation: {e}")))
}

#[async_trait]
impl DatabaseRepository for SqliteRepository {
    async fn insert(&self, database: &Database) -> AppResult<()> {
        let keys = StoredKeys::of(database)?;
        sqlx::query(
            "INSERT INTO catalog_databases (id, fqn, service_name, body) VALUES (?, ?, ?, ?)",
        )
        .bind(keys.id.to_string())
        .bind(&keys.fqn)
        .bind(&keys.service_name)
        .bind(encode(database)?)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &keys))?;
        Ok(())
    }

    async fn update(&self, database: &Database) -> AppResult<()> {
        let keys = StoredKeys::of(database)?;
        let result = sqlx::query(
            "UPDATE catalog_databases
             SET fqn = ?, service_name = ?, body = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(&keys.fqn)
        .bind(&keys.service_name)
        .bind(encode(database)?)
        .bind(keys.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &keys))?;

        if result.rows_affected() == 0 {
            return Err(AppError::DatabaseNotFound(keys.id.to_string()));
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Database>> {
        self.fetch_one_where("id", id.to_string()).await
    }

    async fn get_by_fqn(&self, fqn: &str) -> AppResult<Option<Database>> {
        self.fetch_one_where("fqn", fqn.to_string()).await
    }

    async fn list(&self, filter: &ListFilter) -> AppResult<(Vec<Database>, u64)> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM catalog_databases WHERE (?1 IS NULL OR service_name = ?1)",
        )
        .bind(&filter.service)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)?;

        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT body FROM catalog_databases
             WHERE (?1 IS NULL OR service_name = ?1)
             ORDER BY fqn
             LIMIT ?2 OFFSET ?3",
        )
        .bind(&filter.service)
        .bind(i64::from(filter.limit))
        .bind(i64::try_from(filter.offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        let page = rows
            .iter()
            .map(|(body,)| decode(body))
            .collect::<AppResult<Vec<_>>>()?;
        Ok((page, u64::try_from(total).unwrap_or_default()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<Option<Database>> {
        let row: Option<(String,)> =
            sqlx::query_as("DELETE FROM catalog_databases WHERE id = ? RETURNING body")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(query_error)?;
        row.map(|(body,)| decode(&body)).transpose()
    }

    async fn count(&self) -> AppResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM catalog_databases")
            .fetch_one(&self.pool)
            .await
            .map_err(query_error)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::tests::{exercise_repository, stored};

    async fn in_memory() -> SqliteRepository {
        // One connection: every SQLite memory connection is its own database.
        SqliteRepository::connect("sqlite::memory:", 1, 5)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_sqlite_repository_contract() {
        exercise_repository(&in_memory().await).await;
    }

    #[tokio::test]
    async fn test_stored_body_is_canonical_json() {
        let repo = in_memory().await;
        let db = stored("mysql_prod", "sales");
        repo.insert(&db).await.unwrap();

        let (body,): (String,) = sqlx::query_as("SELECT body FROM catalog_databases")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value, db.to_value().unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_row_is_an_internal_error() {
        let repo = in_memory().await;
        sqlx::query("INSERT INTO catalog_databases (id, fqn, body) VALUES (?, 'svc.bad', ?)")
            .bind(Uuid::nil().to_string())
            .bind(r#"{"name":"bad.name","service":{"id":"s","type":"databaseService"}}"#)
            .execute(&repo.pool)
            .await
            .unwrap();

        assert!(matches!(
            repo.get(Uuid::nil()).await,
            Err(AppError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_deletes_return_the_record_once() {
        let repo = in_memory().await;
        let db = stored("mysql_prod", "sales");
        repo.insert(&db).await.unwrap();

        let id = db.id().unwrap();
        let (first, second) = tokio::join!(repo.delete(id), repo.delete(id));
        let removed: Vec<Database> = [first.unwrap(), second.unwrap()]
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(removed, vec![db]);
    }

    #[tokio::test]
    async fn test_invalid_url_is_a_connection_error() {
        assert!(matches!(
            SqliteRepository::connect("postgres://nope", 1, 1).await,
            Err(AppError::StorageConnection(_))
        ));
    }
}
