//! Query composition for `offerings`.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::schema::offerings;
use crate::model::offering::{NewOfferingRow, OfferingRow};

/// ## Summary
/// Returns a query to find the live offerings of a center.
#[must_use]
pub fn active_for_center(center_id: i64) -> offerings::BoxedQuery<'static, diesel::pg::Pg> {
    offerings::table
        .filter(offerings::center_id.eq(center_id))
        .filter(offerings::deleted_at.is_null())
        .order(offerings::id.asc())
        .into_boxed()
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn list_for_center(
    conn: &mut DbConnection<'_>,
    center_id: i64,
) -> QueryResult<Vec<OfferingRow>> {
    active_for_center(center_id)
        .select(OfferingRow::as_select())
        .load(conn)
        .await
}

#[must_use]
pub fn by_id(id: i64) -> offerings::BoxedQuery<'static, diesel::pg::Pg> {
    offerings::table
        .filter(offerings::id.eq(id))
        .filter(offerings::deleted_at.is_null())
        .into_boxed()
}

/// ## Summary
/// Returns a query over live offerings in id order, optionally scoped to one
/// center.
#[must_use]
pub fn page(
    center_id: Option<i64>,
    offset: i64,
    limit: i64,
) -> offerings::BoxedQuery<'static, diesel::pg::Pg> {
    let mut query = offerings::table
        .filter(offerings::deleted_at.is_null())
        .order(offerings::id.asc())
        .offset(offset)
        .limit(limit)
        .into_boxed();
    if let Some(center_id) = center_id {
        query = query.filter(offerings::center_id.eq(center_id));
    }
    query
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn find(conn: &mut DbConnection<'_>, id: i64) -> QueryResult<Option<OfferingRow>> {
    by_id(id)
        .select(OfferingRow::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn list_page(
    conn: &mut DbConnection<'_>,
    center_id: Option<i64>,
    offset: i64,
    limit: i64,
) -> QueryResult<Vec<OfferingRow>> {
    page(center_id, offset, limit)
        .select(OfferingRow::as_select())
        .load(conn)
        .await
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert(conn: &mut DbConnection<'_>, row: &NewOfferingRow) -> QueryResult<OfferingRow> {
    diesel::insert_into(offerings::table)
        .values(row)
        .returning(OfferingRow::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn update(
    conn: &mut DbConnection<'_>,
    id: i64,
    row: &NewOfferingRow,
) -> QueryResult<Option<OfferingRow>> {
    diesel::update(
        offerings::table
            .filter(offerings::id.eq(id))
            .filter(offerings::deleted_at.is_null()),
    )
    .set(row)
    .returning(OfferingRow::as_returning())
    .get_result(conn)
    .await
    .optional()
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn soft_delete(conn: &mut DbConnection<'_>, id: i64) -> QueryResult<usize> {
    diesel::update(
        offerings::table
            .filter(offerings::id.eq(id))
            .filter(offerings::deleted_at.is_null()),
    )
    .set(offerings::deleted_at.eq(Some(Utc::now())))
    .execute(conn)
    .await
}
