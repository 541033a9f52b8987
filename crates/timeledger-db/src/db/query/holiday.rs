//! Query composition for `center_holidays`.

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::schema::center_holidays;
use crate::model::holiday::{CenterHolidayRow, NewCenterHolidayRow};

/// ## Summary
/// Returns a query to find a center's holidays within `[from, to]`.
#[must_use]
pub fn in_window(
    center_id: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> center_holidays::BoxedQuery<'static, diesel::pg::Pg> {
    center_holidays::table
        .filter(center_holidays::center_id.eq(center_id))
        .filter(center_holidays::holiday_date.between(from, to))
        .order(center_holidays::holiday_date.asc())
        .into_boxed()
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn list_in_window(
    conn: &mut DbConnection<'_>,
    center_id: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> QueryResult<Vec<CenterHolidayRow>> {
    in_window(center_id, from, to)
        .select(CenterHolidayRow::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Inserts holidays, skipping any `(center_id, holiday_date)` that already
/// exists. Returns only the rows that were created.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert_skip_existing(
    conn: &mut DbConnection<'_>,
    rows: &[NewCenterHolidayRow<'_>],
) -> QueryResult<Vec<CenterHolidayRow>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    diesel::insert_into(center_holidays::table)
        .values(rows)
        .on_conflict((center_holidays::center_id, center_holidays::holiday_date))
        .do_nothing()
        .returning(CenterHolidayRow::as_returning())
        .get_results(conn)
        .await
}
