//! OpenAPI 文档

use axum::Json;
use utoipa::OpenApi;

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "元数据目录服务 API",
        version = "0.1.0",
        description = "数据库实体的校验、存储与查询"
    ),
    paths(
        handlers::list_databases,
        handlers::create_database,
        handlers::create_or_update_database,
        handlers::validate_database,
        handlers::get_database,
        handlers::get_database_by_name,
        handlers::delete_database,
        handlers::delete_database_by_name,
        handlers::health_check,
    ),
    components(schemas(
        common::models::Database,
        common::models::EntityReference,
        common::models::EntityKind,
        common::models::UsageDetails,
        common::models::UsageStats,
        common::response::Paging,
        handlers::HealthResponse,
    )),
    tags(
        (name = "databases", description = "数据库实体端点"),
        (name = "health", description = "健康检查端点")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
