//! Handler模块

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use common::errors::AppError;
use common::middleware::RequestId;
use common::models::Database;
use common::response::{ApiResponse, EntityList};
use crate::service::{ListDatabasesQuery, Upsert};
use crate::state::AppState;

const SERVICE_NAME: &str = "catalog-service";

type Reply<T> = Json<ApiResponse<T>>;

fn reply<T: Serialize>(data: T, request_id: &RequestId) -> Reply<T> {
    Json(ApiResponse::ok_with_service(data, SERVICE_NAME).with_request_id(request_id.as_str()))
}

/// 分页列出数据库实体
#[utoipa::path(
    get,
    path = "/api/v1/databases",
    tag = "databases",
    params(ListDatabasesQuery),
    responses(
        (status = 200, description = "数据库列表", body = ApiResponse<EntityList<Database>>)
    )
)]
pub async fn list_databases(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<ListDatabasesQuery>,
) -> Result<Reply<EntityList<Database>>, AppError> {
    let data = state.catalog.list(query).await?;
    Ok(reply(data, &request_id))
}

/// 创建数据库实体
#[utoipa::path(
    post,
    path = "/api/v1/databases",
    tag = "databases",
    request_body = Database,
    responses(
        (status = 201, description = "数据库实体已创建", body = ApiResponse<Database>),
        (status = 400, description = "校验失败"),
        (status = 409, description = "全限定名已存在")
    )
)]
pub async fn create_database(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Reply<Database>), AppError> {
    let data = state.catalog.create(&body).await?;
    Ok((StatusCode::CREATED, reply(data, &request_id)))
}

/// 创建或更新数据库实体（按全限定名匹配）
#[utoipa::path(
    put,
    path = "/api/v1/databases",
    tag = "databases",
    request_body = Database,
    responses(
        (status = 200, description = "数据库实体已更新", body = ApiResponse<Database>),
        (status = 201, description = "数据库实体已创建", body = ApiResponse<Database>),
        (status = 400, description = "校验失败")
    )
)]
pub async fn create_or_update_database(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Reply<Database>), AppError> {
    let (status, data) = match state.catalog.create_or_update(&body).await? {
        Upsert::Created(db) => (StatusCode::CREATED, db),
        Upsert::Updated(db) => (StatusCode::OK, db),
    };
    Ok((status, reply(data, &request_id)))
}

/// 校验数据库实体但不保存
#[utoipa::path(
    post,
    path = "/api/v1/databases/validate",
    tag = "databases",
    request_body = Database,
    responses(
        (status = 200, description = "校验通过，返回规范化实体", body = ApiResponse<Database>),
        (status = 400, description = "校验失败")
    )
)]
pub async fn validate_database(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<Value>,
) -> Result<Reply<Database>, AppError> {
    let data = state.catalog.validate(&body)?;
    Ok(reply(data, &request_id))
}

/// 根据 ID 获取数据库实体
#[utoipa::path(
    get,
    path = "/api/v1/databases/{id}",
    tag = "databases",
    params(
        ("id" = String, Path, description = "数据库实体 ID")
    ),
    responses(
        (status = 200, description = "数据库实体", body = ApiResponse<Database>),
        (status = 404, description = "数据库实体未找到")
    )
)]
pub async fn get_database(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Reply<Database>, AppError> {
    let data = state.catalog.get(&id).await?;
    Ok(reply(data, &request_id))
}

/// 根据全限定名获取数据库实体
#[utoipa::path(
    get,
    path = "/api/v1/databases/name/{fqn}",
    tag = "databases",
    params(
        ("fqn" = String, Path, description = "全限定名，例如 mysql_prod.sales_db")
    ),
    responses(
        (status = 200, description = "数据库实体", body = ApiResponse<Database>),
        (status = 404, description = "数据库实体未找到")
    )
)]
pub async fn get_database_by_name(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(fqn): Path<String>,
) -> Result<Reply<Database>, AppError> {
    let data = state.catalog.get_by_name(&fqn).await?;
    Ok(reply(data, &request_id))
}

/// 根据 ID 删除数据库实体
#[utoipa::path(
    delete,
    path = "/api/v1/databases/{id}",
    tag = "databases",
    params(
        ("id" = String, Path, description = "数据库实体 ID")
    ),
    responses(
        (status = 200, description = "已删除的数据库实体", body = ApiResponse<Database>),
        (status = 404, description = "数据库实体未找到")
    )
)]
pub async fn delete_database(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Reply<Database>, AppError> {
    let data = state.catalog.delete(&id).await?;
    Ok(reply(data, &request_id))
}

/// 根据全限定名删除数据库实体
#[utoipa::path(
    delete,
    path = "/api/v1/databases/name/{fqn}",
    tag = "databases",
    params(
        ("fqn" = String, Path, description = "全限定名，例如 mysql_prod.sales_db")
    ),
    responses(
        (status = 200, description = "已删除的数据库实体", body = ApiResponse<Database>),
        (status = 404, description = "数据库实体未找到")
    )
)]
pub async fn delete_database_by_name(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(fqn): Path<String>,
) -> Result<Reply<Database>, AppError> {
    let data = state.catalog.delete_by_name(&fqn).await?;
    Ok(reply(data, &request_id))
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.config.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        databases: state.catalog.count().await?,
    }))
}

/// 健康检查响应
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// 服务名称
    pub service: String,
    /// 服务版本
    pub version: String,
    /// 当前时间戳
    pub timestamp: DateTime<Utc>,
    /// 已登记的数据库实体数
    pub databases: u64,
}
