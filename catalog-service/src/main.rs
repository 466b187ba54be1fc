//! 元数据目录服务
//!
//! 提供数据库实体的目录管理功能，包括：
//! - 实体校验（返回全部字段违规）
//! - 实体的增删改查
//! - SQLite 或内存存储

mod handlers;
mod openapi;
mod repository;
mod routes;
mod service;
mod state;

use anyhow::Context;
use common::config::AppConfig;
use state::AppState;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SERVICE_NAME: &str = "catalog-service";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (if present) before anything else
    load_dotenv();

    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 加载配置
    let config = AppConfig::load_with_service(SERVICE_NAME);

    // 创建应用状态（打开目录存储）
    let state = AppState::new(config.clone())
        .await
        .context("failed to open catalog storage (check CATALOG_STORAGE_URL)")?;

    let app = routes::create_router(state);

    // 启动服务
    let addr = config.bind_address();
    info!(service = SERVICE_NAME, address = %addr, public_url = %config.public_url, "启动服务");

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("绑定地址失败: {addr}"))?;
    axum::serve(listener, app).await.context("服务启动失败")?;
    Ok(())
}

/// Load .env file from the working directory (best-effort, no error if missing).
fn load_dotenv() {
    let Ok(content) = std::fs::read_to_string(".env") else {
        return;
    };
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            // Only set if not already set by the environment
            if std::env::var(key).is_err() {
                std::env::set_var(key, value.trim());
            }
        }
    }
}
