use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{Entity, ListFilter, Page, Repository, apply_patch};
use crate::error::{DbError, DbResult};

/// Process-local repository ordered by id.
#[derive(Debug)]
pub struct MemoryRepository<E> {
    rows: RwLock<BTreeMap<u64, E>>,
    next_id: AtomicU64,
}

impl<E> Default for MemoryRepository<E> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<E: Entity> MemoryRepository<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ## Summary
    /// Returns every stored entity matching `keep`, in id order.
    pub async fn select(&self, keep: impl Fn(&E) -> bool) -> Vec<E> {
        self.rows
            .read()
            .await
            .values()
            .filter(|entity| keep(entity))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    async fn insert(&self, mut entity: E) -> E {
        let mut rows = self.rows.write().await;
        if entity.id() == 0 {
            entity.set_id(self.next_id.fetch_add(1, Ordering::Relaxed));
        } else {
            self.next_id
                .fetch_max(entity.id().saturating_add(1), Ordering::Relaxed);
        }
        rows.insert(entity.id(), entity.clone());
        entity
    }
}

impl<E: Entity> Repository<E> for MemoryRepository<E> {
    fn get_by_id(&self, id: u64) -> BoxFuture<'_, DbResult<Option<E>>> {
        Box::pin(async move { Ok(self.rows.read().await.get(&id).cloned()) })
    }

    fn list(&self, filter: ListFilter, page: Page) -> BoxFuture<'_, DbResult<Vec<E>>> {
        Box::pin(async move {
            Ok(self
                .rows
                .read()
                .await
                .values()
                .filter(|entity| filter.matches(*entity))
                .skip(page.offset)
                .take(page.limit)
                .cloned()
                .collect())
        })
    }

    fn create(&self, entity: E) -> BoxFuture<'_, DbResult<E>> {
        Box::pin(async move {
            let created = self.insert(entity).await;
            tracing::debug!(table = E::TABLE_NAME, id = created.id(), "Entity created");
            Ok(created)
        })
    }

    fn update(&self, id: u64, patch: Map<String, Value>) -> BoxFuture<'_, DbResult<E>> {
        Box::pin(async move {
            let mut rows = self.rows.write().await;
            let current = rows.get(&id).ok_or(DbError::NotFound {
                table: E::TABLE_NAME,
                id,
            })?;
            let patched = apply_patch(current, patch)?;
            rows.insert(id, patched.clone());
            Ok(patched)
        })
    }

    fn delete(&self, id: u64) -> BoxFuture<'_, DbResult<()>> {
        Box::pin(async move {
            self.rows
                .write()
                .await
                .remove(&id)
                .map(|_removed| ())
                .ok_or(DbError::NotFound {
                    table: E::TABLE_NAME,
                    id,
                })
        })
    }
}
