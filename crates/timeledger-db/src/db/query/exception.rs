//! Query composition for `schedule_exceptions`.

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::enums::ExceptionStatus;
use crate::db::schema::schedule_exceptions;
use crate::model::exception::{NewScheduleExceptionRow, ScheduleExceptionRow};

/// ## Summary
/// Returns a query to find the live exceptions of a center dated within
/// `[from, to]`, in any status.
#[must_use]
pub fn in_window(
    center_id: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> schedule_exceptions::BoxedQuery<'static, diesel::pg::Pg> {
    schedule_exceptions::table
        .filter(schedule_exceptions::center_id.eq(center_id))
        .filter(schedule_exceptions::deleted_at.is_null())
        .filter(schedule_exceptions::exception_date.between(from, to))
        .order((
            schedule_exceptions::exception_date.asc(),
            schedule_exceptions::id.asc(),
        ))
        .into_boxed()
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn list_in_window(
    conn: &mut DbConnection<'_>,
    center_id: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> QueryResult<Vec<ScheduleExceptionRow>> {
    in_window(center_id, from, to)
        .select(ScheduleExceptionRow::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Returns a query to find a live exception by ID.
#[must_use]
pub fn by_id(id: i64) -> schedule_exceptions::BoxedQuery<'static, diesel::pg::Pg> {
    schedule_exceptions::table
        .filter(schedule_exceptions::id.eq(id))
        .filter(schedule_exceptions::deleted_at.is_null())
        .into_boxed()
}

/// ## Summary
/// Returns a query over live exceptions in id order, optionally scoped to
/// one center.
#[must_use]
pub fn page(
    center_id: Option<i64>,
    offset: i64,
    limit: i64,
) -> schedule_exceptions::BoxedQuery<'static, diesel::pg::Pg> {
    let mut query = schedule_exceptions::table
        .filter(schedule_exceptions::deleted_at.is_null())
        .order(schedule_exceptions::id.asc())
        .offset(offset)
        .limit(limit)
        .into_boxed();
    if let Some(center_id) = center_id {
        query = query.filter(schedule_exceptions::center_id.eq(center_id));
    }
    query
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn find(
    conn: &mut DbConnection<'_>,
    id: i64,
) -> QueryResult<Option<ScheduleExceptionRow>> {
    by_id(id)
        .select(ScheduleExceptionRow::as_select())
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
) -> QueryResult<Vec<ScheduleExceptionRow>> {
    page(center_id, offset, limit)
        .select(ScheduleExceptionRow::as_select())
        .load(conn)
        .await
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert(
    conn: &mut DbConnection<'_>,
    row: &NewScheduleExceptionRow,
) -> QueryResult<ScheduleExceptionRow> {
    diesel::insert_into(schedule_exceptions::table)
        .values(row)
        .returning(ScheduleExceptionRow::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Overwrites every writable column of a live exception.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn update(
    conn: &mut DbConnection<'_>,
    id: i64,
    row: &NewScheduleExceptionRow,
) -> QueryResult<Option<ScheduleExceptionRow>> {
    diesel::update(
        schedule_exceptions::table
            .filter(schedule_exceptions::id.eq(id))
            .filter(schedule_exceptions::deleted_at.is_null()),
    )
    .set(row)
    .returning(ScheduleExceptionRow::as_returning())
    .get_result(conn)
    .await
    .optional()
}

/// ## Summary
/// Moves a live exception from `from` to `to`. Returns `None` when the
/// exception is missing or no longer in `from`, so concurrent reviews
/// cannot both succeed.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn transition_status(
    conn: &mut DbConnection<'_>,
    id: i64,
    from: ExceptionStatus,
    to: ExceptionStatus,
) -> QueryResult<Option<ScheduleExceptionRow>> {
    diesel::update(
        schedule_exceptions::table
            .filter(schedule_exceptions::id.eq(id))
            .filter(schedule_exceptions::status.eq(from))
            .filter(schedule_exceptions::deleted_at.is_null()),
    )
    .set(schedule_exceptions::status.eq(to))
    .returning(ScheduleExceptionRow::as_returning())
    .get_result(conn)
    .await
    .optional()
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn soft_delete(conn: &mut DbConnection<'_>, id: i64) -> QueryResult<usize> {
    diesel::update(
        schedule_exceptions::table
            .filter(schedule_exceptions::id.eq(id))
            .filter(schedule_exceptions::deleted_at.is_null()),
    )
    .set(schedule_exceptions::deleted_at.eq(Some(Utc::now())))
    .execute(conn)
    .await
}
