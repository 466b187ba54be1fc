//! 目录服务路由模块

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use common::middleware::request_id_middleware;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::openapi::openapi_json;
use crate::state::AppState;

/// 创建数据库实体路由
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/databases",
            get(handlers::list_databases)
                .post(handlers::create_database)
                .put(handlers::create_or_update_database),
        )
        .route("/api/v1/databases/validate", post(handlers::validate_database))
        .route(
            "/api/v1/databases/name/{fqn}",
            get(handlers::get_database_by_name).delete(handlers::delete_database_by_name),
        )
        .route(
            "/api/v1/databases/{id}",
            get(handlers::get_database).delete(handlers::delete_database),
        )
        .route("/api/health", get(handlers::health_check))
}

/// Full application: routes, API docs and the middleware stack.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
