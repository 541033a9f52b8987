//! Query composition for `schedule_rules`.
//!
//! The effective range lives in a JSON text column, so window filtering
//! happens after mapping; these queries narrow by tenant, offering and
//! soft deletion. Rules of soft-deleted offerings are left out.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::schema::{offerings, schedule_rules};
use crate::model::rule::{NewScheduleRuleRow, ScheduleRuleRow};

/// ## Summary
/// Returns a query to find the live rules of a center whose offering is live.
#[must_use]
pub fn active_for_center(center_id: i64) -> schedule_rules::BoxedQuery<'static, diesel::pg::Pg> {
    let live_offerings = offerings::table
        .filter(offerings::center_id.eq(center_id))
        .filter(offerings::deleted_at.is_null())
        .select(offerings::id);

    schedule_rules::table
        .filter(schedule_rules::center_id.eq(center_id))
        .filter(schedule_rules::deleted_at.is_null())
        .filter(schedule_rules::offering_id.eq_any(live_offerings))
        .order((
            schedule_rules::offering_id.asc(),
            schedule_rules::weekday.asc(),
            schedule_rules::id.asc(),
        ))
        .into_boxed()
}

/// ## Summary
/// Returns a query to find the live rules of one offering.
#[must_use]
pub fn active_for_offering(
    center_id: i64,
    offering_id: i64,
) -> schedule_rules::BoxedQuery<'static, diesel::pg::Pg> {
    active_for_center(center_id).filter(schedule_rules::offering_id.eq(offering_id))
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn list_for_center(
    conn: &mut DbConnection<'_>,
    center_id: i64,
) -> QueryResult<Vec<ScheduleRuleRow>> {
    active_for_center(center_id)
        .select(ScheduleRuleRow::as_select())
        .load(conn)
        .await
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn list_for_offering(
    conn: &mut DbConnection<'_>,
    center_id: i64,
    offering_id: i64,
) -> QueryResult<Vec<ScheduleRuleRow>> {
    active_for_offering(center_id, offering_id)
        .select(ScheduleRuleRow::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Returns a query to find a live rule by ID.
#[must_use]
pub fn by_id(id: i64) -> schedule_rules::BoxedQuery<'static, diesel::pg::Pg> {
    schedule_rules::table
        .filter(schedule_rules::id.eq(id))
        .filter(schedule_rules::deleted_at.is_null())
        .into_boxed()
}

/// ## Summary
/// Returns a query over live rules in id order, optionally scoped to one
/// center.
#[must_use]
pub fn page(
    center_id: Option<i64>,
    offset: i64,
    limit: i64,
) -> schedule_rules::BoxedQuery<'static, diesel::pg::Pg> {
    let mut query = schedule_rules::table
        .filter(schedule_rules::deleted_at.is_null())
        .order(schedule_rules::id.asc())
        .offset(offset)
        .limit(limit)
        .into_boxed();
    if let Some(center_id) = center_id {
        query = query.filter(schedule_rules::center_id.eq(center_id));
    }
    query
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn find(conn: &mut DbConnection<'_>, id: i64) -> QueryResult<Option<ScheduleRuleRow>> {
    by_id(id)
        .select(ScheduleRuleRow::as_select())
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
) -> QueryResult<Vec<ScheduleRuleRow>> {
    page(center_id, offset, limit)
        .select(ScheduleRuleRow::as_select())
        .load(conn)
        .await
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert(
    conn: &mut DbConnection<'_>,
    row: &NewScheduleRuleRow,
) -> QueryResult<ScheduleRuleRow> {
    diesel::insert_into(schedule_rules::table)
        .values(row)
        .returning(ScheduleRuleRow::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Overwrites every writable column of a live rule. Returns `None` when the
/// rule does not exist or was deleted.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn update(
    conn: &mut DbConnection<'_>,
    id: i64,
    row: &NewScheduleRuleRow,
) -> QueryResult<Option<ScheduleRuleRow>> {
    diesel::update(
        schedule_rules::table
            .filter(schedule_rules::id.eq(id))
            .filter(schedule_rules::deleted_at.is_null()),
    )
    .set(row)
    .returning(ScheduleRuleRow::as_returning())
    .get_result(conn)
    .await
    .optional()
}

/// ## Summary
/// Marks a live rule deleted. Returns the number of rows touched.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn soft_delete(conn: &mut DbConnection<'_>, id: i64) -> QueryResult<usize> {
    diesel::update(
        schedule_rules::table
            .filter(schedule_rules::id.eq(id))
            .filter(schedule_rules::deleted_at.is_null()),
    )
    .set(schedule_rules::deleted_at.eq(Some(Utc::now())))
    .execute(conn)
    .await
}
