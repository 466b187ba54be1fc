//! Application state for catalog service.

use std::sync::Arc;

use common::config::AppConfig;
use common::errors::AppResult;

use crate::repository::{DatabaseRepository, MemoryRepository, SqliteRepository};
use crate::service::CatalogService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub catalog: Arc<CatalogService>,
}

impl AppState {
    /// Opens the configured store: SQLite when `CATALOG_STORAGE_URL` is set,
    /// in-memory otherwise.
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        let repository: Arc<dyn DatabaseRepository> = match &config.storage_url {
            Some(url) => {
                tracing::info!(url = %url, "使用 SQLite 目录存储");
                Arc::new(
                    SqliteRepository::connect(
                        url,
                        config.max_connections,
                        config.connect_timeout_secs,
                    )
                    .await?,
                )
            }
            None => {
                tracing::warn!("未配置 CATALOG_STORAGE_URL，使用内存存储（重启后数据丢失）");
                Arc::new(MemoryRepository::new())
            }
        };
        Ok(Self::with_repository(config, repository))
    }

    pub fn with_repository(config: AppConfig, repository: Arc<dyn DatabaseRepository>) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(repository, &config)),
            config,
        }
    }
}
