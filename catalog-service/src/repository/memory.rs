//! In-memory catalog store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use common::errors::{AppError, AppResult};
use common::models::Database;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{service_name, DatabaseRepository, ListFilter, StoredKeys};

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryRepository {
    records: RwLock<BTreeMap<Uuid, Database>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DatabaseRepository for MemoryRepository {
    async fn insert(&self, database: &Database) -> AppResult<()> {
        let keys = StoredKeys::of(database)?;
        let mut records = self.records.write().await;

        if records.contains_key(&keys.id) {
            return Err(AppError::EntityExists(keys.id.to_string()));
        }
        if records
            .values()
            .any(|d| d.fully_qualified_name() == Some(keys.fqn.as_str()))
        {
            return Err(AppError::EntityExists(keys.fqn));
        }

        records.insert(keys.id, database.clone());
        Ok(())
    }

    async fn update(&self, database: &Database) -> AppResult<()> {
        let keys = StoredKeys::of(database)?;
        let mut records = self.records.write().await;

        if records.iter().any(|(id, d)| {
            *id != keys.id && d.fully_qualified_name() == Some(keys.fqn.as_str())
        }) {
            return Err(AppError::EntityExists(keys.fqn));
        }
        match records.get_mut(&keys.id) {
            Some(slot) => {
                *slot = database.clone();
                Ok(())
            }
            None => Err(AppError::DatabaseNotFound(keys.id.to_string())),
        }
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Database>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn get_by_fqn(&self, fqn: &str) -> AppResult<Option<Database>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|d| d.fully_qualified_name() == Some(fqn))
            .cloned())
    }

    async fn list(&self, filter: &ListFilter) -> AppResult<(Vec<Database>, u64)> {
        let records = self.records.read().await;
        let mut matching: Vec<&Database> = records
            .values()
            .filter(|d| match &filter.service {
                Some(service) => service_name(d).as_deref() == Some(service.as_str()),
                None => true,
            })
            .collect();
        matching.sort_by(|a, b| a.fully_qualified_name().cmp(&b.fully_qualified_name()));

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(filter.offset).unwrap_or(usize::MAX))
            .take(filter.limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn delete(&self, id: Uuid) -> AppResult<Option<Database>> {
        Ok(self.records.write().await.remove(&id))
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.records.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::tests::exercise_repository;

    #[tokio::test]
    async fn test_memory_repository_contract() {
        exercise_repository(&MemoryRepository::new()).await;
    }
}
