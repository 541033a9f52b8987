use std::marker::PhantomData;
use std::sync::Arc;

use diesel_async::AsyncConnection;
use diesel_async::scoped_futures::ScopedFutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value};

use timeledger_calendar::model::{Offering, ScheduleException, ScheduleRule};

use super::{Entity, ListFilter, Page, Repository, apply_patch};
use crate::db::DbProvider;
use crate::db::map::schedule::{
    db_id, exception_from_row, exception_to_row, map_rows, offering_from_row, offering_to_row,
    rule_from_row, rule_to_row,
};
use crate::db::query::{exception, offering, rule};
use crate::error::{DbError, DbResult};

/// PostgreSQL-backed repository. Ids are assigned by the database, deletes
/// are soft and reads go to the read endpoint.
pub struct PgRepository<E> {
    provider: Arc<dyn DbProvider>,
    entity: PhantomData<fn() -> E>,
}

impl<E> PgRepository<E> {
    #[must_use]
    pub fn new(provider: Arc<dyn DbProvider>) -> Self {
        Self {
            provider,
            entity: PhantomData,
        }
    }
}

impl<E> Clone for PgRepository<E> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.provider))
    }
}

/// Converts a page into `OFFSET`/`LIMIT` values; `usize::MAX` means no limit.
fn page_bounds(page: Page) -> (i64, i64) {
    (
        i64::try_from(page.offset).unwrap_or(i64::MAX),
        i64::try_from(page.limit).unwrap_or(i64::MAX),
    )
}

fn center_filter(filter: ListFilter) -> DbResult<Option<i64>> {
    filter
        .center_id
        .map(|id| db_id("centers", id))
        .transpose()
}

macro_rules! pg_repository {
    ($entity:ty, $query:ident, $from_row:path, $to_row:path) => {
        impl Repository<$entity> for PgRepository<$entity> {
            fn get_by_id(&self, id: u64) -> BoxFuture<'_, DbResult<Option<$entity>>> {
                Box::pin(async move {
                    let id = db_id(<$entity>::TABLE_NAME, id)?;
                    let mut conn = self.provider.get_read_connection().await?;
                    $query::find(&mut conn, id)
                        .await?
                        .map($from_row)
                        .transpose()
                })
            }

            fn list(&self, filter: ListFilter, page: Page) -> BoxFuture<'_, DbResult<Vec<$entity>>> {
                Box::pin(async move {
                    let center_id = center_filter(filter)?;
                    let (offset, limit) = page_bounds(page);
                    let mut conn = self.provider.get_read_connection().await?;
                    let rows = $query::list_page(&mut conn, center_id, offset, limit).await?;
                    map_rows(rows, $from_row)
                })
            }

            fn create(&self, entity: $entity) -> BoxFuture<'_, DbResult<$entity>> {
                Box::pin(async move {
                    let row = $to_row(&entity)?;
                    let mut conn = self.provider.get_connection().await?;
                    let created = $from_row($query::insert(&mut conn, &row).await?)?;
                    tracing::debug!(table = <$entity>::TABLE_NAME, id = created.id, "Entity created");
                    Ok(created)
                })
            }

            fn update(
                &self,
                id: u64,
                patch: Map<String, Value>,
            ) -> BoxFuture<'_, DbResult<$entity>> {
                Box::pin(async move {
                    const TABLE: &str = <$entity>::TABLE_NAME;
                    let db_key = db_id(TABLE, id)?;
                    let mut conn = self.provider.get_connection().await?;

                    conn.transaction::<_, DbError, _>(move |tx| {
                        async move {
                            let current = $query::find(tx, db_key)
                                .await?
                                .ok_or(DbError::NotFound { table: TABLE, id })?;
                            let patched = apply_patch(&$from_row(current)?, patch)?;
                            let row = $to_row(&patched)?;
                            let updated = $query::update(tx, db_key, &row)
                                .await?
                                .ok_or(DbError::NotFound { table: TABLE, id })?;
                            $from_row(updated)
                        }
                        .scope_boxed()
                    })
                    .await
                })
            }

            fn delete(&self, id: u64) -> BoxFuture<'_, DbResult<()>> {
                Box::pin(async move {
                    let db_key = db_id(<$entity>::TABLE_NAME, id)?;
                    let mut conn = self.provider.get_connection().await?;
                    match $query::soft_delete(&mut conn, db_key).await? {
                        0 => Err(DbError::NotFound {
                            table: <$entity>::TABLE_NAME,
                            id,
                        }),
                        _ => Ok(()),
                    }
                })
            }
        }
    };
}

pg_repository!(Offering, offering, offering_from_row, offering_to_row);
pg_repository!(ScheduleRule, rule, rule_from_row, rule_to_row);
pg_repository!(
    ScheduleException,
    exception,
    exception_from_row,
    exception_to_row
);
