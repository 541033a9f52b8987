//! Query composition for `centers`.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::schema::centers;
use crate::model::center::CenterRow;

/// ## Summary
/// Returns a query to select all centers.
#[must_use]
pub fn all() -> centers::BoxedQuery<'static, diesel::pg::Pg> {
    centers::table.into_boxed()
}

/// ## Summary
/// Returns a query to find a live center by ID.
#[must_use]
pub fn by_id(id: i64) -> centers::BoxedQuery<'static, diesel::pg::Pg> {
    all()
        .filter(centers::id.eq(id))
        .filter(centers::deleted_at.is_null())
}

/// ## Summary
/// Loads a live center.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn find(conn: &mut DbConnection<'_>, id: i64) -> QueryResult<Option<CenterRow>> {
    by_id(id)
        .select(CenterRow::as_select())
        .first(conn)
        .await
        .optional()
}
