//! 数据库目录服务模块

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use utoipa::IntoParams;
use uuid::Uuid;

use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::models::Database;
use common::response::EntityList;
use common::utils::{FullyQualifiedName, IdGenerator};

use crate::repository::{DatabaseRepository, ListFilter};

/// Collection path of database resources.
pub const COLLECTION_PATH: &str = "/api/v1/databases";

/// Query parameters of the list endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListDatabasesQuery {
    /// Only databases hosted by this service.
    pub service: Option<String>,
    /// Page size (clamped to the configured maximum).
    pub limit: Option<u32>,
    /// Number of entities to skip.
    pub offset: Option<u64>,
}

/// Outcome of a create-or-update call.
#[derive(Debug)]
pub enum Upsert {
    Created(Database),
    Updated(Database),
}

/// 数据库目录服务
pub struct CatalogService {
    repository: Arc<dyn DatabaseRepository>,
    public_url: String,
    default_page_size: u32,
    max_page_size: u32,
}

impl CatalogService {
    /// 创建新的目录服务实例
    pub fn new(repository: Arc<dyn DatabaseRepository>, config: &AppConfig) -> Self {
        Self {
            repository,
            public_url: config.public_url.clone(),
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }

    /// Validates input without storing anything.
    pub fn validate(&self, input: &Value) -> AppResult<Database> {
        Ok(Database::construct(input)?)
    }

    /// 创建数据库实体
    pub async fn create(&self, input: &Value) -> AppResult<Database> {
        let database = Database::construct(input)?;
        let fqn = resolve_fqn(&database)?;

        if self.repository.get_by_fqn(&fqn).await?.is_some() {
            return Err(AppError::EntityExists(fqn));
        }

        let id = database.id().unwrap_or_else(IdGenerator::entity_id);
        let database = self.finalize(database, id, fqn)?;
        self.repository.insert(&database).await?;

        tracing::info!(
            id = %id,
            fqn = database.fully_qualified_name().unwrap_or_default(),
            "数据库实体已创建"
        );
        Ok(database)
    }

    /// Creates the entity, or replaces the one with the same fully qualified
    /// name while keeping its id.
    pub async fn create_or_update(&self, input: &Value) -> AppResult<Upsert> {
        let database = Database::construct(input)?;
        let fqn = resolve_fqn(&database)?;

        let Some(existing) = self.repository.get_by_fqn(&fqn).await? else {
            return self.create(input).await.map(Upsert::Created);
        };

        let id = existing
            .id()
            .ok_or_else(|| AppError::Internal(format!("stored entity `{fqn}` has no id")))?;
        let database = self.finalize(database, id, fqn)?;
        self.repository.update(&database).await?;

        tracing::info!(id = %id, "数据库实体已更新");
        Ok(Upsert::Updated(database))
    }

    /// 根据 ID 获取数据库实体
    pub async fn get(&self, id: &str) -> AppResult<Database> {
        let uuid = parse_id(id)?;
        self.repository
            .get(uuid)
            .await?
            .ok_or_else(|| AppError::DatabaseNotFound(id.to_string()))
    }

    /// 根据全限定名获取数据库实体
    pub async fn get_by_name(&self, fqn: &str) -> AppResult<Database> {
        self.repository
            .get_by_fqn(fqn)
            .await?
            .ok_or_else(|| AppError::DatabaseNotFound(fqn.to_string()))
    }

    /// 分页列出数据库实体
    pub async fn list(&self, query: ListDatabasesQuery) -> AppResult<EntityList<Database>> {
        let filter = ListFilter {
            service: query.service.filter(|s| !s.is_empty()),
            offset: query.offset.unwrap_or(0),
            limit: query
                .limit
                .unwrap_or(self.default_page_size)
                .min(self.max_page_size),
        };
        let (data, total) = self.repository.list(&filter).await?;
        Ok(EntityList::new(data, total, filter.offset, filter.limit))
    }

    /// 根据 ID 删除数据库实体
    pub async fn delete(&self, id: &str) -> AppResult<Database> {
        let uuid = parse_id(id)?;
        let deleted = self
            .repository
            .delete(uuid)
            .await?
            .ok_or_else(|| AppError::DatabaseNotFound(id.to_string()))?;
        tracing::info!(id = %uuid, "数据库实体已删除");
        Ok(deleted)
    }

    /// 根据全限定名删除数据库实体
    pub async fn delete_by_name(&self, fqn: &str) -> AppResult<Database> {
        let existing = self.get_by_name(fqn).await?;
        let id = existing
            .id()
            .ok_or_else(|| AppError::Internal(format!("stored entity `{fqn}` has no id")))?;
        let deleted = self
            .repository
            .delete(id)
            .await?
            .ok_or_else(|| AppError::DatabaseNotFound(fqn.to_string()))?;
        tracing::info!(id = %id, fqn, "数据库实体已删除");
        Ok(deleted)
    }

    pub async fn count(&self) -> AppResult<u64> {
        self.repository.count().await
    }

    fn finalize(&self, database: Database, id: Uuid, fqn: String) -> AppResult<Database> {
        let href = format!("{}{}/{}", self.public_url, COLLECTION_PATH, id);
        Ok(database
            .with_id(id)?
            .with_fully_qualified_name(fqn)
            .with_href(href)?)
    }
}

/// Supplied FQN as-is, else `<service name>.<database name>`.
fn resolve_fqn(database: &Database) -> AppResult<String> {
    if let Some(fqn) = database.fully_qualified_name() {
        return Ok(fqn.to_string());
    }
    match database.service().name() {
        Some(service) => Ok(FullyQualifiedName::build(&[service, database.name()])),
        None => Err(AppError::BadRequest(
            "fullyQualifiedName is required when the service reference has no name".into(),
        )),
    }
}

fn parse_id(id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| AppError::BadRequest(format!("`{id}` is not a valid UUID")))
}
